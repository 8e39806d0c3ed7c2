//! Retry/fallback execution wrapper for pipeline stages
//!
//! Every stage invocation goes through [`execute`], so a transient failure
//! or a single bad record cannot abort the run: failures are retried with
//! exponential backoff, and exhaustion yields the stage's configured
//! fallback instead of propagating. A stage without a fallback opts in to
//! failing loud.

use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::StageError;

/// Log level for per-attempt retry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryLogLevel {
    Debug,
    Info,
    #[default]
    Warn,
}

/// Retry policy for one pipeline stage.
///
/// The budget is `max_retries` total attempts. The delay before attempt
/// `n + 1` is `base_delay * backoff_multiplier^(n - 1)`, giving the default
/// progression 0.5s, 1s, 2s.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub backoff_multiplier: f64,
    pub log_level: RetryLogLevel,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            backoff_multiplier: 2.0,
            log_level: RetryLogLevel::Warn,
        }
    }
}

impl RetryPolicy {
    /// Policy with a given attempt budget and the default backoff.
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Backoff delay after the `attempt`-th failure (1-based).
    fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt as i32 - 1);
        Duration::from_secs_f64(self.base_delay.as_secs_f64() * factor)
    }
}

/// Run `step` under `policy`, returning its value, the fallback, or the
/// last error when no fallback is configured.
///
/// One log record is emitted per failed attempt and one summary record on
/// exhaustion, carrying the error category, message, and attempt count.
/// With `fallback` set this function never returns `Err`.
pub fn execute<T, F>(
    stage: &str,
    policy: &RetryPolicy,
    fallback: Option<T>,
    mut step: F,
) -> Result<T, StageError>
where
    F: FnMut() -> Result<T, StageError>,
{
    let attempts = policy.max_retries.max(1);
    let mut last_err: Option<StageError> = None;

    for attempt in 1..=attempts {
        match step() {
            Ok(value) => {
                if attempt > 1 {
                    info!(stage, attempt, "stage succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => {
                log_attempt(policy.log_level, stage, attempt, attempts, &err);
                let retries_remain = attempt < attempts;
                last_err = Some(err);
                if retries_remain {
                    thread::sleep(policy.delay_after(attempt));
                }
            }
        }
    }

    let err = last_err.expect("at least one attempt was made");
    warn!(
        stage,
        category = err.category(),
        error = %err.message(),
        attempts,
        fallback = fallback.is_some(),
        "stage exhausted its retry budget"
    );

    match fallback {
        Some(value) => Ok(value),
        None => Err(err),
    }
}

fn log_attempt(level: RetryLogLevel, stage: &str, attempt: u32, attempts: u32, err: &StageError) {
    match level {
        RetryLogLevel::Debug => debug!(
            stage,
            category = err.category(),
            error = %err.message(),
            attempt,
            attempts,
            "stage attempt failed"
        ),
        RetryLogLevel::Info => info!(
            stage,
            category = err.category(),
            error = %err.message(),
            attempt,
            attempts,
            "stage attempt failed"
        ),
        RetryLogLevel::Warn => warn!(
            stage,
            category = err.category(),
            error = %err.message(),
            attempt,
            attempts,
            "stage attempt failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Fast policy so tests do not sleep for real.
    fn quick(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
            backoff_multiplier: 1.0,
            log_level: RetryLogLevel::Debug,
        }
    }

    #[test]
    fn first_attempt_success_passes_through() {
        let result = execute("t", &quick(3), Some(0), || Ok(42));
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn transient_failure_is_retried() {
        let calls = Cell::new(0);
        let result = execute("t", &quick(3), None, || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(StageError::insight("flaky"))
            } else {
                Ok("done")
            }
        });
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn exhaustion_returns_fallback() {
        let calls = Cell::new(0);
        let result = execute("t", &quick(3), Some(-1), || {
            calls.set(calls.get() + 1);
            Err(StageError::data("always broken"))
        });
        assert_eq!(result.unwrap(), -1);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn success_past_the_budget_still_falls_back() {
        // The budget is max_retries total attempts: a step that would
        // succeed on attempt 4 never gets that attempt.
        let calls = Cell::new(0);
        let result = execute("t", &quick(3), Some("fallback"), || {
            calls.set(calls.get() + 1);
            if calls.get() >= 4 {
                Ok("too late")
            } else {
                Err(StageError::insight("not yet"))
            }
        });
        assert_eq!(result.unwrap(), "fallback");
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn no_fallback_propagates_last_error() {
        let result: Result<(), _> = execute("t", &quick(2), None, || {
            Err(StageError::evaluator("broken"))
        });
        let err = result.unwrap_err();
        assert_eq!(err.category(), "evaluator");
        assert_eq!(err.message(), "broken");
    }

    #[test]
    fn backoff_delays_follow_the_multiplier() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_millis(500));
        assert_eq!(policy.delay_after(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_after(3), Duration::from_millis(2000));
    }

    #[test]
    fn zero_retries_still_attempts_once() {
        let calls = Cell::new(0);
        let result = execute("t", &quick(0), Some(7), || {
            calls.set(calls.get() + 1);
            Err(StageError::data("no"))
        });
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.get(), 1);
    }
}
