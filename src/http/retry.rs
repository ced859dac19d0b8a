//! 可取消的 HTTP 重试执行器
//!
//! 最多 3 次尝试（1 次 + 2 次重试）。5xx 与传输错误触发重试，其余状态（含 4xx）立即返回。
//! 请求的取消信号在发送前、请求进行中与两次尝试之间的等待中都生效，触发时返回 `RetryError::Cancelled`，
//! 且不再发起后续尝试。
//! 不会返回给调用方的响应体一律在丢弃前关闭；最终返回的响应由调用方负责。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;

use crate::config::RetrySection;
use crate::core::RetryError;
use crate::http::backoff::{retry_delay, sleep_with_cancel, WaitOutcome};

/// 总尝试次数上限（固定，不可配置）
pub const MAX_ATTEMPTS: u32 = 3;

/// 默认重试时间单位
pub const DEFAULT_DELAY_UNIT: Duration = Duration::from_secs(1);

/// 执行器配置：所有等待时长都是 `delay_unit` 的整数倍
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub delay_unit: Duration,
}

impl RetryConfig {
    pub fn with_delay_unit(delay_unit: Duration) -> Self {
        Self { delay_unit }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            delay_unit: DEFAULT_DELAY_UNIT,
        }
    }
}

impl From<&RetrySection> for RetryConfig {
    fn from(section: &RetrySection) -> Self {
        Self::with_delay_unit(section.delay_unit())
    }
}

/// 单次尝试得到的响应：执行器只关心状态码与释放响应体
pub trait AttemptResponse: Send {
    fn status(&self) -> StatusCode;

    /// 关闭响应体，释放底层连接
    fn close(self);
}

impl AttemptResponse for reqwest::Response {
    fn status(&self) -> StatusCode {
        reqwest::Response::status(self)
    }

    fn close(self) {
        // reqwest 在 drop 时释放 body 与连接
        drop(self);
    }
}

/// 传输抽象：发出一个已构造好的请求
#[async_trait]
pub trait HttpTransport: Send + Sync {
    type Response: AttemptResponse;
    type Error: std::error::Error + Send + Sync + 'static;

    async fn send(&self, request: reqwest::Request) -> Result<Self::Response, Self::Error>;
}

#[async_trait]
impl HttpTransport for reqwest::Client {
    type Response = reqwest::Response;
    type Error = reqwest::Error;

    async fn send(&self, request: reqwest::Request) -> Result<Self::Response, Self::Error> {
        self.execute(request).await
    }
}

/// 带取消信号的请求（方法、URL、头、body 由调用方准备好）
#[derive(Debug)]
pub struct CancellableRequest {
    request: reqwest::Request,
    cancel: CancellationToken,
}

impl CancellableRequest {
    /// 使用一个新的、永不自动触发的取消 token
    pub fn new(request: reqwest::Request) -> Self {
        Self {
            request,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn request(&self) -> &reqwest::Request {
        &self.request
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl From<reqwest::Request> for CancellableRequest {
    fn from(request: reqwest::Request) -> Self {
        Self::new(request)
    }
}

/// 是否为可重试的状态码（仅 5xx）
pub fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error()
}

/// 重试执行器；无内部可变状态，可在多个任务间共享
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// 执行请求，必要时重试
    ///
    /// - 非 5xx 响应：立即返回
    /// - 最后一次仍为 5xx：返回该响应（`Ok`），由调用方检查状态码
    /// - 最后一次为传输错误：`Err(RetryError::Transport)`
    /// - 等待期间取消：关闭上一个响应体，`Err(RetryError::Cancelled)`
    /// - 发送前或请求进行中取消：丢弃该次请求，`Err(RetryError::Cancelled)`
    ///
    /// 请求无法复制（流式 body）时只尝试一次，结果原样返回。
    pub async fn execute<T>(
        &self,
        transport: &T,
        request: CancellableRequest,
    ) -> Result<T::Response, RetryError>
    where
        T: HttpTransport + ?Sized,
    {
        let CancellableRequest { mut request, cancel } = request;
        let mut attempt: u32 = 1;

        loop {
            // 非最后一次发送副本，原请求留给下一次
            let (outgoing, retained) = if attempt >= MAX_ATTEMPTS {
                (request, None)
            } else {
                match request.try_clone() {
                    Some(copy) => (copy, Some(request)),
                    None => (request, None),
                }
            };

            // 已取消则不再发出请求
            if cancel.is_cancelled() {
                tracing::debug!(attempt, "cancelled before sending");
                return Err(RetryError::Cancelled {
                    attempts: attempt - 1,
                });
            }

            // 取消信号同样打断进行中的请求；被打断的尝试不再重试
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(attempt, "in-flight request cancelled");
                    return Err(RetryError::Cancelled { attempts: attempt });
                }
                outcome = transport.send(outgoing) => outcome,
            };

            let Some(next) = retained else {
                return finish(outcome, attempt);
            };

            let failed = match outcome {
                Ok(resp) if !is_retryable_status(resp.status()) => {
                    tracing::debug!(attempt, status = %resp.status(), "request completed");
                    return Ok(resp);
                }
                Ok(resp) => {
                    tracing::debug!(attempt, status = %resp.status(), "server error, will retry");
                    Some(resp)
                }
                Err(e) => {
                    tracing::debug!(attempt, error = %e, "transport error, will retry");
                    None
                }
            };

            // 重试前关闭被丢弃的响应体，避免连接泄漏
            if let Some(resp) = failed {
                resp.close();
            }

            let delay = retry_delay(self.config.delay_unit, attempt);
            tracing::debug!(attempt, delay = ?delay, "waiting before retry");

            if sleep_with_cancel(&cancel, delay).await == WaitOutcome::Cancelled {
                tracing::debug!(attempt, "retry wait cancelled");
                return Err(RetryError::Cancelled { attempts: attempt });
            }

            request = next;
            attempt += 1;
        }
    }
}

/// 最后一次尝试：响应无论状态都交给调用方，传输错误包装后返回
fn finish<R, E>(outcome: Result<R, E>, attempt: u32) -> Result<R, RetryError>
where
    R: AttemptResponse,
    E: std::error::Error + Send + Sync + 'static,
{
    match outcome {
        Ok(resp) => {
            tracing::debug!(attempt, status = %resp.status(), "returning final response");
            Ok(resp)
        }
        Err(e) => Err(RetryError::Transport {
            attempts: attempt,
            source: Box::new(e),
        }),
    }
}
