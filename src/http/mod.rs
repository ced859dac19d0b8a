//! HTTP 层：可取消的重试执行器
//!
//! - `backoff`：退避时长计算与可取消等待
//! - `retry`：执行器、传输抽象与带取消信号的请求

pub mod backoff;
pub mod retry;

pub use backoff::{retry_delay, sleep_with_cancel, WaitOutcome};
pub use retry::{
    is_retryable_status, AttemptResponse, CancellableRequest, HttpTransport, RetryConfig,
    RetryExecutor, DEFAULT_DELAY_UNIT, MAX_ATTEMPTS,
};
