//! Retry logic with exponential backoff

use anyhow::Result;
use std::time::Duration;
use tracing::warn;

use crate::errors::{EngineError, EngineResult};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub exponential_base: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 100,
            max_delay_ms: 5000,
            exponential_base: 2.0,
        }
    }
}

pub async fn retry_with_backoff<F, Fut, T>(
    operation: F,
    config: &RetryConfig,
    context: &str,
) -> EngineResult<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay_ms;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt >= config.max_attempts => {
                return Err(EngineError::Network {
                    message: format!("{} failed after {} attempts", context, attempt),
                    source: Some(e),
                    retry_count: attempt,
                });
            }
            Err(e) => {
                warn!(
                    "Attempt {}/{} failed for {}: {}. Retrying in {}ms...",
                    attempt, config.max_attempts, context, e, delay
                );

                tokio::time::sleep(Duration::from_millis(delay)).await;

                delay = (delay as f64 * config.exponential_base) as u64;
                delay = delay.min(config.max_delay_ms);
                let jitter = (delay as f64 * 0.1 * (rand::random::<f64>() - 0.5)) as u64;
                delay = delay.saturating_add(jitter);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn returns_first_success() {
        let calls = AtomicU32::new(0);
        let result = retry_with_backoff(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, anyhow::Error>(7u32)
            },
            &RetryConfig::default(),
            "test op",
        )
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausts_attempts_then_reports_count() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig {
            max_attempts: 3,
            initial_delay_ms: 1,
            max_delay_ms: 2,
            exponential_base: 2.0,
        };
        let result: EngineResult<u32> = retry_with_backoff(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(anyhow::anyhow!("down"))
            },
            &config,
            "test op",
        )
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(EngineError::Network { retry_count, .. }) => assert_eq!(retry_count, 3),
            other => panic!("unexpected result: {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn recovers_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig {
            max_attempts: 5,
            initial_delay_ms: 1,
            max_delay_ms: 2,
            exponential_base: 2.0,
        };
        let result = retry_with_backoff(
            || async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(anyhow::anyhow!("flaky"))
                } else {
                    Ok(n)
                }
            },
            &config,
            "test op",
        )
        .await;
        assert_eq!(result.unwrap(), 2);
    }
}
