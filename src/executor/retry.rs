//! Bounded exponential backoff for transient generation failures.

use crate::error::GenerationError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first call.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_max_attempts() -> u32 {
    4
}

fn default_initial_delay_ms() -> u64 {
    2_000
}

fn default_max_delay_ms() -> u64 {
    60_000
}

fn default_multiplier() -> f64 {
    2.0
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_multiplier(),
        }
    }
}

impl RetryConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("retry.max_attempts must be at least 1".to_string());
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err("retry.multiplier must be >= 1.0".to_string());
        }
        if self.initial_delay_ms > self.max_delay_ms {
            return Err("retry.initial_delay_ms must not exceed retry.max_delay_ms".to_string());
        }
        Ok(())
    }

    /// Delay before retry number `retry` (0-based): `initial * multiplier^retry`, capped.
    pub fn calculate_delay(&self, retry: u32) -> Duration {
        let delay_ms = (self.initial_delay_ms as f64 * self.multiplier.powi(retry as i32))
            .min(self.max_delay_ms as f64) as u64;
        Duration::from_millis(delay_ms)
    }
}

/// Run `attempt` until it succeeds, fails permanently, or attempts run out.
///
/// Returns the final result and the number of attempts made. Cancellation is
/// observed while waiting between attempts, never in the middle of one.
pub async fn retry_with_backoff<T, F, Fut>(
    config: &RetryConfig,
    cancel: &CancellationToken,
    label: &str,
    mut attempt: F,
) -> (Result<T, GenerationError>, u32)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GenerationError>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        let err = match attempt().await {
            Ok(value) => return (Ok(value), attempts),
            Err(err) => err,
        };
        if !err.is_retryable() || attempts >= max_attempts {
            return (Err(err), attempts);
        }

        let delay = config.calculate_delay(attempts - 1);
        warn!(
            unit = label,
            attempt = attempts,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Transient generation failure, backing off"
        );
        tokio::select! {
            _ = cancel.cancelled() => return (Err(GenerationError::Cancelled), attempts),
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
