//! Retry/backoff engine
//!
//! Pure wait-time computation plus the async retry loop that drives it. Applied
//! uniformly by the item registries (`registry/*.rs`) to transient failures a plugin
//! signals via [`crate::error::Error::Retryable`].

use std::future::Future;
use std::time::{Duration, Instant};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::Error;

/// Retry policy: `{maxRetries, firstRetryDelay, maxDelay, backoffFactor, jitter}` from
/// spec §3. A provider may supply its own; registries fall back to [`RetryPolicy::default`]
/// when a provider returns none (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the first try. `attempt` counts from 1;
    /// exhaustion is declared once `attempt > max_retries`.
    pub max_retries: u32,
    /// Delay before the first retry, in seconds. May be fractional.
    pub first_retry_delay: f64,
    /// Ceiling on the computed delay, in seconds. `None` disables the cap (spec's `-1`).
    pub max_delay: Option<f64>,
    /// Multiplier applied to the delay on each subsequent attempt.
    pub backoff_factor: f64,
    /// Whether to randomize the wait time within `[0, computed]`.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    /// The host default used when a provider returns no retry policy (spec §6):
    /// `max_retries=5, first_retry_delay=2s, max_delay=300s, backoff_factor=2, jitter=true`.
    fn default() -> Self {
        Self {
            max_retries: 5,
            first_retry_delay: 2.0,
            max_delay: Some(300.0),
            backoff_factor: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Computes the wait time in milliseconds for attempt `n` (`n >= 1`), per spec §4.3:
    ///
    /// ```text
    /// base   = firstRetryDelay * backoffFactor^(n-1)
    /// capped = min(base, maxDelay)     // maxDelay = None disables the cap
    /// ms     = floor(capped * 1000)
    /// if jitter: ms = uniformRandom(0, ms]
    /// ```
    ///
    /// The exponent is applied *before* the cap; the fractional component is truncated
    /// only after scaling to milliseconds.
    #[must_use]
    pub fn wait_time_ms(&self, attempt: u32) -> u64 {
        debug_assert!(attempt >= 1, "attempt is 1-indexed");
        let base = self.first_retry_delay * self.backoff_factor.powi((attempt - 1) as i32);
        let capped = match self.max_delay {
            Some(max_delay) => base.min(max_delay),
            None => base,
        };
        let ms = (capped * 1000.0).floor().max(0.0) as u64;

        if self.jitter && ms > 0 {
            rand::rng().random_range(0..=ms)
        } else {
            ms
        }
    }
}

/// Mutable per-in-flight-operation retry state (spec §3 "Retry context").
#[derive(Debug, Clone)]
pub struct RetryContext {
    /// The policy in effect for this operation.
    pub policy: RetryPolicy,
    /// Attempt number, starting at 1 on the first invocation.
    pub attempt: u32,
    /// Set once `attempt` exceeds `policy.max_retries`.
    pub exceeded_max_retries: bool,
    /// Wall-clock duration of each attempt so far, in call order.
    pub per_attempt_durations: Vec<Duration>,
    /// When the current attempt started.
    pub attempt_start_time: Option<Instant>,
}

impl RetryContext {
    /// Creates a fresh context for a new operation.
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempt: 0,
            exceeded_max_retries: false,
            per_attempt_durations: Vec::new(),
            attempt_start_time: None,
        }
    }

    /// Records the start of a new attempt, incrementing the attempt counter.
    fn begin_attempt(&mut self) {
        self.attempt += 1;
        self.attempt_start_time = Some(Instant::now());
    }

    /// Records the end of the current attempt and returns whether retries are exhausted.
    fn end_attempt_and_check_exhaustion(&mut self) -> bool {
        if let Some(start) = self.attempt_start_time.take() {
            self.per_attempt_durations.push(start.elapsed());
        }
        self.exceeded_max_retries = self.attempt > self.policy.max_retries;
        self.exceeded_max_retries
    }
}

/// The three ways a retry loop can end, distinguishing "ran out of attempts" from "hit a
/// non-retryable error on the first try" so callers can decide whether exhaustion is fatal
/// ([`with_retry`]) or a soft failure ([`with_retry_or_none`]).
enum LoopOutcome<T> {
    Success(T),
    NonRetryable(Error),
    Exhausted(Error),
    Cancelled,
}

/// Drives `operation` under `policy` until it succeeds, fails with a non-retryable error,
/// exhausts `policy.max_retries`, or `cancel` fires during a backoff sleep. Shared by
/// [`with_retry`] and [`with_retry_or_none`], which differ only in how they treat
/// [`LoopOutcome::Exhausted`].
async fn run_retry_loop<F, Fut, T>(
    policy: RetryPolicy,
    name: &str,
    cancel: &CancellationToken,
    mut operation: F,
) -> LoopOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut ctx = RetryContext::new(policy);

    loop {
        ctx.begin_attempt();

        let result = operation().await;
        let exhausted_before_retrying = ctx.end_attempt_and_check_exhaustion();

        match result {
            Ok(value) => return LoopOutcome::Success(value),
            Err(err) if !err.is_retryable() => return LoopOutcome::NonRetryable(err),
            Err(err) => {
                let underlying = err.into_retryable_inner();

                if exhausted_before_retrying {
                    debug!(
                        operation = name,
                        attempts = ctx.attempt,
                        "max retry attempts reached"
                    );
                    return LoopOutcome::Exhausted(underlying);
                }

                let wait_ms = ctx.policy.wait_time_ms(ctx.attempt);
                debug!(
                    operation = name,
                    attempt = ctx.attempt,
                    delay_ms = wait_ms,
                    error = %underlying,
                    "retrying after backoff"
                );

                tokio::select! {
                    () = tokio::time::sleep(Duration::from_millis(wait_ms)) => {}
                    () = cancel.cancelled() => return LoopOutcome::Cancelled,
                }
            }
        }
    }
}

/// Runs `operation` under `policy`, retrying on [`Error::Retryable`] until it succeeds,
/// fails with a non-retryable error, or exhausts `policy.max_retries`.
///
/// On exhaustion, returns the last observed underlying error (unwrapped from its
/// `Retryable` envelope) — see [`with_retry_or_none`] for the data-source "soft failure"
/// variant used by fetch.
///
/// The sleep between attempts observes `cancel`: if it fires first, the loop returns
/// [`Error::Cancelled`] immediately rather than retrying (spec §5, "Cancellation").
///
/// # Errors
///
/// Returns the operation's last error once retries are exhausted or the error is not
/// retryable, or [`Error::Cancelled`] if `cancel` fires during the backoff sleep.
pub async fn with_retry<F, Fut, T>(
    policy: RetryPolicy,
    name: &str,
    cancel: &CancellationToken,
    operation: F,
) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    match run_retry_loop(policy, name, cancel, operation).await {
        LoopOutcome::Success(value) => Ok(value),
        LoopOutcome::NonRetryable(err) | LoopOutcome::Exhausted(err) => Err(err),
        LoopOutcome::Cancelled => Err(Error::Cancelled),
    }
}

/// Like [`with_retry`], but degrades to `Ok(None)` with no error on exhaustion instead of
/// propagating the last error. Used by the data-source registry's `fetch`, where missing
/// data is preferable to aborting a stage-changes pass (spec §4.4.2).
///
/// # Errors
///
/// Returns the operation's last error only if it is non-retryable before exhaustion, or
/// [`Error::Cancelled`] if `cancel` fires during the backoff sleep.
pub async fn with_retry_or_none<F, Fut, T>(
    policy: RetryPolicy,
    name: &str,
    cancel: &CancellationToken,
    operation: F,
) -> Result<Option<T>, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    match run_retry_loop(policy, name, cancel, operation).await {
        LoopOutcome::Success(value) => Ok(Some(value)),
        LoopOutcome::Exhausted(err) => {
            warn!(operation = name, error = %err, "retry exhaustion degraded to no data");
            Ok(None)
        }
        LoopOutcome::NonRetryable(err) => Err(err),
        LoopOutcome::Cancelled => Err(Error::Cancelled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn wait_time_no_jitter_matches_seed_scenario() {
        let policy = RetryPolicy {
            max_retries: 10,
            first_retry_delay: 2.0,
            max_delay: Some(14.0),
            backoff_factor: 1.5,
            jitter: false,
        };
        let expected = [2000, 3000, 4500, 6750, 10125, 14000];
        for (i, &want) in expected.iter().enumerate() {
            let attempt = (i + 1) as u32;
            assert_eq!(policy.wait_time_ms(attempt), want, "attempt {attempt}");
        }
    }

    #[test]
    fn wait_time_with_jitter_is_bounded_by_uncapped_no_jitter_value() {
        let policy = RetryPolicy {
            max_retries: 10,
            first_retry_delay: 3.0,
            max_delay: Some(80.0),
            backoff_factor: 2.0,
            jitter: true,
        };
        let ceilings = [3000u64, 6000, 12000, 24000, 48000];
        for (i, &ceiling) in ceilings.iter().enumerate() {
            let attempt = (i + 1) as u32;
            for _ in 0..50 {
                let ms = policy.wait_time_ms(attempt);
                assert!(ms <= ceiling, "attempt {attempt}: {ms} > {ceiling}");
            }
        }

        // attempt 6 is capped at max_delay regardless of jitter's ceiling.
        for _ in 0..50 {
            assert!(policy.wait_time_ms(6) <= 80_000);
        }
    }

    #[test]
    fn wait_time_respects_monotone_cap() {
        let policy = RetryPolicy {
            max_retries: 20,
            first_retry_delay: 1.0,
            max_delay: Some(10.0),
            backoff_factor: 3.0,
            jitter: false,
        };
        for attempt in 1..=20u32 {
            assert!(policy.wait_time_ms(attempt) <= 10_000);
        }
    }

    #[test]
    fn no_cap_when_max_delay_is_none() {
        let policy = RetryPolicy {
            max_retries: 5,
            first_retry_delay: 1.0,
            max_delay: None,
            backoff_factor: 10.0,
            jitter: false,
        };
        assert_eq!(policy.wait_time_ms(1), 1000);
        assert_eq!(policy.wait_time_ms(2), 10_000);
        assert_eq!(policy.wait_time_ms(3), 100_000);
    }

    #[tokio::test]
    async fn with_retry_returns_immediately_on_success() {
        let policy = RetryPolicy {
            max_retries: 3,
            first_retry_delay: 0.0,
            max_delay: Some(0.0),
            backoff_factor: 1.0,
            jitter: false,
        };
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);

        let result = with_retry(policy, "test-op", &cancel, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, Error>(42) }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn with_retry_does_not_retry_non_retryable_errors() {
        let policy = RetryPolicy::default();
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);

        let result: Result<(), Error> = with_retry(policy, "test-op", &cancel, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::BadInput { failure_reasons: vec![] }) }
        })
        .await;

        assert!(matches!(result, Err(Error::BadInput { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn with_retry_exhausts_and_returns_underlying_error() {
        let policy = RetryPolicy {
            max_retries: 2,
            first_retry_delay: 0.0,
            max_delay: Some(0.0),
            backoff_factor: 1.0,
            jitter: false,
        };
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);

        let result: Result<(), Error> = with_retry(policy, "test-op", &cancel, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::internal("fetch", "timeout").retryable()) }
        })
        .await;

        assert!(matches!(result, Err(Error::Internal { .. })));
        // attempt 1, 2, 3 (initial + 2 retries) before exhaustion on attempt 3 > max_retries=2
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn with_retry_or_none_degrades_to_ok_none_on_exhaustion() {
        let policy = RetryPolicy {
            max_retries: 1,
            first_retry_delay: 0.0,
            max_delay: Some(0.0),
            backoff_factor: 1.0,
            jitter: false,
        };
        let cancel = CancellationToken::new();

        let result: Result<Option<i32>, Error> = with_retry_or_none(policy, "fetch", &cancel, || async {
            Err(Error::internal("fetch", "unavailable").retryable())
        })
        .await;

        assert_eq!(result.unwrap(), None);
    }

    #[tokio::test]
    async fn with_retry_honors_cancellation_during_backoff() {
        let policy = RetryPolicy {
            max_retries: 5,
            first_retry_delay: 30.0,
            max_delay: Some(30.0),
            backoff_factor: 1.0,
            jitter: false,
        };
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result: Result<(), Error> = with_retry(policy, "test-op", &cancel, || async {
            Err(Error::internal("fetch", "timeout").retryable())
        })
        .await;

        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
