//! Agent Durability - 边缘设备智能体的持久化原语
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型（写入阶段错误、重试错误）
//! - **fs**: 原子文件写入（临时文件 + fsync + rename）
//! - **http**: 可取消的 HTTP 重试执行器与退避计算
//! - **observability**: 日志初始化

pub mod config;
pub mod core;
pub mod fs;
pub mod http;
pub mod observability;

pub use crate::core::{RetryError, WriteError, WritePhase};
pub use crate::fs::{write_file_atomic, write_file_atomic_async};
pub use crate::http::{
    AttemptResponse, CancellableRequest, HttpTransport, RetryConfig, RetryExecutor, MAX_ATTEMPTS,
};
