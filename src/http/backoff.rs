//! 线性退避与可取消等待
//!
//! 第 k 次尝试失败后等待 `unit * k`：1 个单位、2 个单位……
//! 严格递增且至少一个单位；修改 unit 等比缩放全部等待时长。

use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// 第 `attempt` 次（从 1 开始）尝试失败后、下一次尝试前的等待时长
pub fn retry_delay(unit: Duration, attempt: u32) -> Duration {
    unit.saturating_mul(attempt.max(1))
}

/// 可取消等待的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Elapsed,
    Cancelled,
}

/// 等待 `delay` 或取消信号，先到者为准；已取消时立即返回
pub async fn sleep_with_cancel(cancel: &CancellationToken, delay: Duration) -> WaitOutcome {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => WaitOutcome::Cancelled,
        _ = tokio::time::sleep(delay) => WaitOutcome::Elapsed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_retry_delay_is_linear_in_unit() {
        let unit = Duration::from_millis(100);
        assert_eq!(retry_delay(unit, 1), Duration::from_millis(100));
        assert_eq!(retry_delay(unit, 2), Duration::from_millis(200));
        assert!(retry_delay(unit, 2) > retry_delay(unit, 1));
    }

    #[test]
    fn test_retry_delay_scales_with_unit() {
        let fast = Duration::from_millis(1);
        let slow = Duration::from_secs(1);
        assert_eq!(retry_delay(fast, 2) * 1000, retry_delay(slow, 2));
        // attempt 0 按 1 处理，保证至少一个单位
        assert_eq!(retry_delay(slow, 0), slow);
    }

    #[tokio::test]
    async fn test_sleep_elapses_without_cancel() {
        let token = CancellationToken::new();
        let start = Instant::now();
        let outcome = sleep_with_cancel(&token, Duration::from_millis(20)).await;
        assert_eq!(outcome, WaitOutcome::Elapsed);
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_sleep_returns_immediately_when_already_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        let start = Instant::now();
        let outcome = sleep_with_cancel(&token, Duration::from_secs(10)).await;
        assert_eq!(outcome, WaitOutcome::Cancelled);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_sleep_preempted_by_cancel() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });
        let start = Instant::now();
        let outcome = sleep_with_cancel(&token, Duration::from_secs(10)).await;
        assert_eq!(outcome, WaitOutcome::Cancelled);
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
