//! Bounded Retry with Classified Backoff
//!
//! Adapter-level retry for transient upstream failures. Errors are routed by
//! `ErrorCategory`: network/transient/rate-limit failures back off and retry
//! within a small bounded attempt count; auth and bad-request failures are
//! surfaced immediately. Transient failures never escape the adapter layer
//! unless every attempt is exhausted.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::constants::retry as retry_constants;
use crate::types::{ErrorCategory, ErrorClassifier, PlannerError, Result};

/// Retry policy for one adapter call
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum attempts, initial attempt included
    pub max_attempts: u8,
    /// Base delay for exponential backoff
    pub base_delay: Duration,
    /// Cap on the backoff delay
    pub max_delay: Duration,
    /// Backoff multiplier
    pub backoff_factor: f32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: retry_constants::MAX_ATTEMPTS,
            base_delay: Duration::from_millis(retry_constants::BASE_DELAY_MS),
            max_delay: Duration::from_secs(retry_constants::MAX_DELAY_SECS),
            backoff_factor: retry_constants::BACKOFF_FACTOR,
        }
    }
}

impl RetryPolicy {
    /// Policy that tries exactly once (for tests and health probes)
    pub fn no_retries() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}

/// Run an adapter call under the policy, retrying retryable categories.
///
/// The operation is a closure returning a fresh future per attempt. Errors
/// already carrying an `LlmError` use its category; anything else is
/// classified from its message.
pub async fn with_retries<T, F, Fut>(
    policy: &RetryPolicy,
    service: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut delay = policy.base_delay;
    let mut last_error: Option<PlannerError> = None;

    for attempt in 1..=policy.max_attempts.max(1) {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(service, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => {
                let category = match &err {
                    PlannerError::Llm(llm) => llm.category,
                    PlannerError::Timeout { .. } => ErrorCategory::Network,
                    other => ErrorClassifier::classify(&other.to_string(), service).category,
                };

                warn!(
                    service,
                    attempt,
                    max_attempts = policy.max_attempts,
                    %category,
                    error = %err,
                    "Adapter call failed"
                );

                if !category.is_retryable() || attempt == policy.max_attempts {
                    return Err(err);
                }

                let wait = match category {
                    ErrorCategory::RateLimit => match &err {
                        PlannerError::Llm(llm) => llm.recommended_delay(),
                        _ => category.recommended_delay(),
                    },
                    _ => delay + jitter(delay),
                };
                debug!(service, wait_ms = wait.as_millis(), "Backing off before retry");
                sleep(wait).await;

                delay = next_backoff(delay, policy.backoff_factor, policy.max_delay);
                last_error = Some(err);
            }
        }
    }

    // Unreachable for max_attempts >= 1; kept for totality
    Err(last_error.unwrap_or_else(|| {
        PlannerError::Config("retry policy with zero attempts".to_string())
    }))
}

/// Random jitter up to a quarter of the base delay
fn jitter(base: Duration) -> Duration {
    let max_jitter_ms = (base.as_millis() as u64) / 4;
    if max_jitter_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..max_jitter_ms))
}

/// Exponential backoff with cap
fn next_backoff(current: Duration, factor: f32, max: Duration) -> Duration {
    std::cmp::min(Duration::from_secs_f32(current.as_secs_f32() * factor), max)
}
