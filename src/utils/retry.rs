//! 指数退避重试
//!
//! `retry_with_backoff` 接收一个返回 Future 的闭包，失败时按 `RetryPolicy`
//! 等待后重新调用，直到成功或用完尝试次数。

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tracing::warn;

/// 重试策略
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 最多尝试次数（含第一次）
    pub max_attempts: u32,
    /// 第一次失败后的等待时间
    pub initial_delay: Duration,
    /// 每次失败后等待时间的倍数
    pub multiplier: f64,
    /// 单次等待上限（不含抖动）
    pub max_delay: Duration,
    /// 随机抖动上限，为零时不加抖动
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(2),
            multiplier: 2.0,
            max_delay: Duration::from_secs(60),
            jitter: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// 第 `failures` 次失败后的基础等待时间（不含抖动）
    pub fn delay_for(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1).min(32) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let capped = secs.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped.max(0.0))
    }

    fn backoff(&self, failures: u32) -> Duration {
        let base = self.delay_for(failures);
        if self.jitter.is_zero() {
            return base;
        }
        let jitter_ms = rand::thread_rng().gen_range(0..=self.jitter.as_millis() as u64);
        base + Duration::from_millis(jitter_ms)
    }
}

/// 重试耗尽后返回的错误，携带最后一次失败的原因
#[derive(Debug, Error)]
#[error("{label} 在 {attempts} 次尝试后仍然失败: {last}")]
pub struct RetryExhausted<E>
where
    E: std::error::Error + 'static,
{
    pub label: String,
    pub attempts: u32,
    #[source]
    pub last: E,
}

/// 带指数退避的重试
///
/// `op` 每次调用都会产生一次新的尝试。`max_attempts` 为 0 时按 1 处理。
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, RetryExhausted<E>>
where
    E: std::error::Error + Display + 'static,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= max_attempts => {
                return Err(RetryExhausted {
                    label: label.to_string(),
                    attempts: attempt,
                    last: err,
                });
            }
            Err(err) => {
                let delay = policy.backoff(attempt);
                warn!(
                    "🔁 {} 第 {}/{} 次尝试失败: {}，{:.1} 秒后重试",
                    label,
                    attempt,
                    max_attempts,
                    err,
                    delay.as_secs_f64()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, Error)]
    #[error("模拟失败 #{0}")]
    struct FakeError(u32);

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            multiplier: 2.0,
            max_delay: Duration::from_millis(4),
            jitter: Duration::ZERO,
        }
    }

    #[test]
    fn test_default_policy_delays() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(8));
        assert_eq!(policy.delay_for(5), Duration::from_secs(32));
        // 上限 60 秒
        assert_eq!(policy.delay_for(6), Duration::from_secs(60));
        assert_eq!(policy.delay_for(30), Duration::from_secs(60));
    }

    #[test]
    fn test_jitter_stays_within_bound() {
        let policy = RetryPolicy {
            jitter: Duration::from_millis(100),
            ..RetryPolicy::default()
        };
        for _ in 0..50 {
            let delay = policy.backoff(1);
            assert!(delay >= Duration::from_secs(2));
            assert!(delay <= Duration::from_millis(2100));
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result = retry_with_backoff(&fast_policy(5), "测试", move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 3 {
                Err(FakeError(n))
            } else {
                Ok(n)
            }
        })
        .await;

        let value = tokio_test::assert_ok!(result);
        assert_eq!(value, 3);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result: Result<(), _> =
            retry_with_backoff(&fast_policy(5), "测试", move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Err(FakeError(n))
            })
            .await;

        let err = tokio_test::assert_err!(result);
        assert_eq!(err.attempts, 5);
        assert_eq!(err.last.0, 5);
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result: Result<(), _> =
            retry_with_backoff(&fast_policy(0), "测试", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(FakeError(1))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
