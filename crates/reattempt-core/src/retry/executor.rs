//! Retry execution engine
//!
//! This module drives the attempt loop: run the operation, record the
//! failure, ask the stop condition whether another attempt is allowed, wait
//! out the backoff delay, and go again.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::types::RetryPolicy;

use super::backoff::{apply_jitter, Backoff};
use super::classify::{AttemptError, Classify};
use super::error::RetryError;
use super::observer::{NoOpObserver, RetryObserver, TracingObserver};
use super::operation::Operation;
use super::sleeper::{Sleeper, TokioSleeper};

/// Decides whether another attempt is permitted after a failure
///
/// Both variants are evaluated against the zero-based index of the attempt
/// that would run next, which equals the number of attempts made so far. The
/// first attempt (index 0) always runs: neither variant is consulted before
/// it.
#[derive(Clone)]
pub enum StopCondition {
    /// Permit at most this many attempts (at least one always runs)
    MaxAttempts(u32),

    /// Stop as soon as the predicate returns true for the next index
    Predicate(Arc<dyn Fn(u32) -> bool + Send + Sync>),
}

impl StopCondition {
    /// Limit the sequence to `max_attempts` attempts
    pub fn max_attempts(max_attempts: u32) -> Self {
        StopCondition::MaxAttempts(max_attempts)
    }

    /// Stop when `predicate(next_index)` is true
    pub fn predicate<P>(predicate: P) -> Self
    where
        P: Fn(u32) -> bool + Send + Sync + 'static,
    {
        StopCondition::Predicate(Arc::new(predicate))
    }

    /// The predicate used when none is given: stop before the second attempt
    pub fn default_predicate() -> Self {
        Self::predicate(|index| index >= 1)
    }

    /// Whether the attempt at `next_index` must not run
    pub fn should_stop(&self, next_index: u32) -> bool {
        match self {
            StopCondition::MaxAttempts(max_attempts) => next_index >= *max_attempts,
            StopCondition::Predicate(predicate) => predicate(next_index),
        }
    }

    fn terminal_error(&self, duration: Duration, nested: Vec<AttemptError>) -> RetryError {
        match self {
            StopCondition::MaxAttempts(max_attempts) => {
                RetryError::attempts_exceeded(*max_attempts, duration, nested)
            }
            StopCondition::Predicate(_) => RetryError::predicate_violation(duration, nested),
        }
    }
}

impl Default for StopCondition {
    fn default() -> Self {
        StopCondition::MaxAttempts(1)
    }
}

impl fmt::Debug for StopCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopCondition::MaxAttempts(n) => f.debug_tuple("MaxAttempts").field(n).finish(),
            StopCondition::Predicate(_) => f.write_str("Predicate(<fn>)"),
        }
    }
}

/// Retry an operation at most `max_attempts` times
///
/// The first attempt always runs, even for `max_attempts == 0`. Exhaustion
/// yields [`RetryError::AttemptsExceeded`].
///
/// # Example
///
/// ```rust,no_run
/// use reattempt_core::retry::{retry, Backoff, Operation, RetryError};
/// use std::time::Duration;
///
/// async fn example() -> Result<String, RetryError> {
///     let backoff = Backoff::linear(Duration::from_millis(200), Duration::from_secs(2));
///
///     retry(
///         Operation::deferred(|| async { Ok::<_, std::io::Error>("fetched".to_string()) }),
///         4,
///         &backoff,
///     )
///     .await
/// }
/// ```
pub async fn retry<T, E>(
    operation: Operation<'_, T, E>,
    max_attempts: u32,
    backoff: &Backoff,
) -> Result<T, RetryError>
where
    E: Classify,
{
    RetryExecutorBuilder::new()
        .with_max_attempts(max_attempts)
        .with_backoff(*backoff)
        .build()
        .execute(operation)
        .await
}

/// Retry an operation until `predicate` says to stop
///
/// The predicate receives the zero-based index of the attempt that would run
/// next and is never asked about index 0. Stopping yields
/// [`RetryError::PredicateViolation`].
pub async fn retry_with_predicate<T, E, P>(
    operation: Operation<'_, T, E>,
    predicate: P,
    backoff: &Backoff,
) -> Result<T, RetryError>
where
    E: Classify,
    P: Fn(u32) -> bool + Send + Sync + 'static,
{
    RetryExecutorBuilder::new()
        .with_predicate(predicate)
        .with_backoff(*backoff)
        .build()
        .execute(operation)
        .await
}

/// Retry an operation under a configured policy
///
/// Attempts are logged through a [`TracingObserver`] named `name`.
pub async fn retry_with_policy<T, E>(
    name: &str,
    policy: &RetryPolicy,
    operation: Operation<'_, T, E>,
) -> Result<T, RetryError>
where
    E: Classify,
{
    RetryExecutorBuilder::new()
        .with_policy(policy)
        .with_observer(TracingObserver::new(name))
        .build()
        .execute(operation)
        .await
}

/// Builder for configuring a `RetryExecutor`
///
/// # Example
///
/// ```rust
/// use reattempt_core::retry::{Backoff, RetryExecutorBuilder, TracingObserver};
/// use std::time::Duration;
///
/// let executor = RetryExecutorBuilder::new()
///     .with_max_attempts(5)
///     .with_backoff(Backoff::quadratic(Duration::from_millis(100), Duration::from_secs(5)))
///     .with_observer(TracingObserver::new("download"))
///     .build();
/// ```
pub struct RetryExecutorBuilder<O = NoOpObserver> {
    stop: StopCondition,
    backoff: Backoff,
    observer: O,
    sleeper: Arc<dyn Sleeper>,
    jitter: bool,
}

impl Default for RetryExecutorBuilder<NoOpObserver> {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryExecutorBuilder<NoOpObserver> {
    /// Create a builder: one attempt, one second constant backoff, no jitter
    pub fn new() -> Self {
        Self {
            stop: StopCondition::default(),
            backoff: Backoff::default(),
            observer: NoOpObserver,
            sleeper: Arc::new(TokioSleeper),
            jitter: false,
        }
    }
}

impl<O> RetryExecutorBuilder<O> {
    /// Apply attempt limit, backoff and jitter from a policy
    pub fn with_policy(self, policy: &RetryPolicy) -> Self {
        self.with_max_attempts(policy.max_attempts)
            .with_backoff(policy.backoff.to_backoff())
            .with_jitter(policy.jitter)
    }

    /// Permit at most `max_attempts` attempts
    pub fn with_max_attempts(self, max_attempts: u32) -> Self {
        self.with_stop_condition(StopCondition::MaxAttempts(max_attempts))
    }

    /// Stop when `predicate(next_index)` returns true
    pub fn with_predicate<P>(self, predicate: P) -> Self
    where
        P: Fn(u32) -> bool + Send + Sync + 'static,
    {
        self.with_stop_condition(StopCondition::predicate(predicate))
    }

    /// Set the stop condition
    pub fn with_stop_condition(mut self, stop: StopCondition) -> Self {
        self.stop = stop;
        self
    }

    /// Set the backoff strategy
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Set the delay primitive
    pub fn with_sleeper<S>(mut self, sleeper: S) -> Self
    where
        S: Sleeper + 'static,
    {
        self.sleeper = Arc::new(sleeper);
        self
    }

    /// Enable or disable jitter
    ///
    /// Jitter adds up to 25% random variation on top of each delay.
    /// Disabled by default.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Set the observer
    pub fn with_observer<O2>(self, observer: O2) -> RetryExecutorBuilder<O2> {
        RetryExecutorBuilder {
            stop: self.stop,
            backoff: self.backoff,
            observer,
            sleeper: self.sleeper,
            jitter: self.jitter,
        }
    }

    /// Build the executor
    pub fn build(self) -> RetryExecutor<O> {
        RetryExecutor {
            stop: self.stop,
            backoff: self.backoff,
            observer: self.observer,
            sleeper: self.sleeper,
            jitter: self.jitter,
        }
    }
}

/// A retry executor with a stop condition, backoff, and observer
///
/// Executors hold no per-run state; one executor can drive any number of
/// concurrent sequences.
pub struct RetryExecutor<O = NoOpObserver> {
    stop: StopCondition,
    backoff: Backoff,
    observer: O,
    sleeper: Arc<dyn Sleeper>,
    jitter: bool,
}

impl Default for RetryExecutor<NoOpObserver> {
    fn default() -> Self {
        RetryExecutorBuilder::new().build()
    }
}

impl<O> RetryExecutor<O> {
    /// The stop condition
    pub fn stop_condition(&self) -> &StopCondition {
        &self.stop
    }

    /// The backoff strategy
    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    fn delay_for(&self, attempt_index: u32) -> Duration {
        let delay = self.backoff.delay_for(attempt_index);
        if self.jitter {
            apply_jitter(delay)
        } else {
            delay
        }
    }
}

impl<O> RetryExecutor<O>
where
    O: RetryObserver,
{
    /// Execute an operation with retry logic
    ///
    /// Returns the first successful value, or the terminal failure with every
    /// attempt's error in order.
    pub async fn execute<T, E>(&self, operation: Operation<'_, T, E>) -> Result<T, RetryError>
    where
        E: Classify,
    {
        let start = Instant::now();

        let mut attempts = match operation.into_attempts() {
            Ok(attempts) => attempts,
            Err(message) => {
                self.observer.on_rejected(&message);
                return Err(RetryError::invalid_operation(message));
            }
        };

        let mut nested: Vec<AttemptError> = Vec::new();
        let mut attempt_index: u32 = 0;

        while let Some(future) = attempts.next() {
            let attempt = attempt_index.saturating_add(1);
            self.observer.on_attempt_start(attempt);

            match future.await {
                Ok(value) => {
                    self.observer.on_success(attempt, start.elapsed());
                    return Ok(value);
                }
                Err(err) => {
                    let record = err.classify();

                    // The next index equals the number of attempts made so far
                    let next_index = attempt;
                    if !attempts.has_more() || self.stop.should_stop(next_index) {
                        nested.push(record);
                        break;
                    }

                    let delay = self.delay_for(attempt_index);
                    self.observer.on_attempt_failed(attempt, &record, delay);
                    nested.push(record);

                    if !delay.is_zero() {
                        self.sleeper.sleep(delay).await;
                    }

                    attempt_index = next_index;
                }
            }
        }

        let error = self.stop.terminal_error(start.elapsed(), nested);
        if let Some(last) = error.last_error() {
            self.observer.on_exhausted(error.attempts(), last);
        }
        Err(error)
    }
}
