//! Retry observation and logging
//!
//! This module provides the `RetryObserver` trait for monitoring a retry
//! sequence and a `TracingObserver` implementation that logs using the
//! `tracing` crate. Observers only watch; they never influence whether an
//! attempt is retried.

use std::error::Error;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Observer trait for retry events
///
/// Attempt numbers passed to observers are 1-based.
///
/// # Example
///
/// ```rust
/// use reattempt_core::retry::RetryObserver;
/// use std::error::Error;
/// use std::time::Duration;
///
/// struct PrintObserver;
///
/// impl RetryObserver for PrintObserver {
///     fn on_attempt_start(&self, attempt: u32) {
///         println!("attempt {}", attempt);
///     }
///
///     fn on_attempt_failed(&self, attempt: u32, error: &dyn Error, delay: Duration) {
///         println!("attempt {} failed: {}, waiting {:?}", attempt, error, delay);
///     }
///
///     fn on_success(&self, attempt: u32, total_duration: Duration) {
///         println!("done on attempt {} after {:?}", attempt, total_duration);
///     }
///
///     fn on_exhausted(&self, attempts: u32, final_error: &dyn Error) {
///         println!("gave up after {} attempts: {}", attempts, final_error);
///     }
/// }
/// ```
pub trait RetryObserver: Send + Sync {
    /// Called when an attempt is about to start
    ///
    /// # Arguments
    ///
    /// * `attempt` - The attempt number (1-indexed)
    fn on_attempt_start(&self, attempt: u32);

    /// Called when an attempt fails and another attempt will follow `delay`
    ///
    /// # Arguments
    ///
    /// * `attempt` - The attempt number that failed (1-indexed)
    /// * `error` - The normalized failure of that attempt
    /// * `delay` - The delay before the next attempt, zero when none is taken
    fn on_attempt_failed(&self, attempt: u32, error: &dyn Error, delay: Duration);

    /// Called when the operation succeeds
    ///
    /// # Arguments
    ///
    /// * `attempt` - The attempt number that succeeded (1-indexed)
    /// * `total_duration` - Time from the first attempt to the success
    fn on_success(&self, attempt: u32, total_duration: Duration);

    /// Called when the stop condition ends the sequence
    ///
    /// # Arguments
    ///
    /// * `attempts` - Total number of attempts made
    /// * `final_error` - The failure of the final attempt
    fn on_exhausted(&self, attempts: u32, final_error: &dyn Error);

    /// Called when the operation is rejected before any attempt
    ///
    /// # Arguments
    ///
    /// * `reason` - Why the operation cannot be attempted
    fn on_rejected(&self, reason: &str) {
        let _ = reason;
    }
}

/// A no-op observer that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl RetryObserver for NoOpObserver {
    fn on_attempt_start(&self, _attempt: u32) {}

    fn on_attempt_failed(&self, _attempt: u32, _error: &dyn Error, _delay: Duration) {}

    fn on_success(&self, _attempt: u32, _total_duration: Duration) {}

    fn on_exhausted(&self, _attempts: u32, _final_error: &dyn Error) {}
}

/// An observer that logs retry events using the `tracing` crate
///
/// # Log Levels
///
/// - `on_attempt_start`: DEBUG
/// - `on_attempt_failed`: WARN
/// - `on_success`: INFO (if > 1 attempt) or DEBUG (first attempt)
/// - `on_exhausted`: ERROR
/// - `on_rejected`: WARN
#[derive(Debug, Clone)]
pub struct TracingObserver {
    operation: String,
}

impl TracingObserver {
    /// Create a new tracing observer
    ///
    /// `operation` names the retried operation in every log line.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
        }
    }

    /// Get the operation name
    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new("retry")
    }
}

impl RetryObserver for TracingObserver {
    fn on_attempt_start(&self, attempt: u32) {
        tracing::debug!(
            operation = %self.operation,
            attempt = attempt,
            "starting attempt"
        );
    }

    fn on_attempt_failed(&self, attempt: u32, error: &dyn Error, delay: Duration) {
        tracing::warn!(
            operation = %self.operation,
            attempt = attempt,
            error = %error,
            delay_ms = delay.as_millis() as u64,
            "attempt failed, will retry"
        );
    }

    fn on_success(&self, attempt: u32, total_duration: Duration) {
        if attempt > 1 {
            tracing::info!(
                operation = %self.operation,
                attempt = attempt,
                total_duration_ms = total_duration.as_millis() as u64,
                "succeeded after retry"
            );
        } else {
            tracing::debug!(
                operation = %self.operation,
                duration_ms = total_duration.as_millis() as u64,
                "succeeded on first attempt"
            );
        }
    }

    fn on_exhausted(&self, attempts: u32, final_error: &dyn Error) {
        tracing::error!(
            operation = %self.operation,
            attempts = attempts,
            error = %final_error,
            "retry stopped without success"
        );
    }

    fn on_rejected(&self, reason: &str) {
        tracing::warn!(
            operation = %self.operation,
            reason = reason,
            "operation rejected before first attempt"
        );
    }
}

/// An observer that counts retry events
///
/// Useful for testing and metrics collection. Delays announced through
/// `on_attempt_failed` are kept in order.
#[derive(Debug, Default)]
pub struct StatsObserver {
    attempt_starts: AtomicU32,
    failures: AtomicU32,
    successes: AtomicU32,
    exhaustions: AtomicU32,
    rejections: AtomicU32,
    delays: std::sync::Mutex<Vec<Duration>>,
}

impl StatsObserver {
    /// Create a new stats observer
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of attempt starts
    pub fn attempt_starts(&self) -> u32 {
        self.attempt_starts.load(Ordering::SeqCst)
    }

    /// Get the number of failures followed by a retry
    pub fn failures(&self) -> u32 {
        self.failures.load(Ordering::SeqCst)
    }

    /// Get the number of successes
    pub fn successes(&self) -> u32 {
        self.successes.load(Ordering::SeqCst)
    }

    /// Get the number of exhausted sequences
    pub fn exhaustions(&self) -> u32 {
        self.exhaustions.load(Ordering::SeqCst)
    }

    /// Get the number of rejected operations
    pub fn rejections(&self) -> u32 {
        self.rejections.load(Ordering::SeqCst)
    }

    /// Get the announced delays in order
    pub fn delays(&self) -> Vec<Duration> {
        self.delays
            .lock()
            .map(|delays| delays.clone())
            .unwrap_or_default()
    }
}

impl RetryObserver for StatsObserver {
    fn on_attempt_start(&self, _attempt: u32) {
        self.attempt_starts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_attempt_failed(&self, _attempt: u32, _error: &dyn Error, delay: Duration) {
        self.failures.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut delays) = self.delays.lock() {
            delays.push(delay);
        }
    }

    fn on_success(&self, _attempt: u32, _total_duration: Duration) {
        self.successes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_exhausted(&self, _attempts: u32, _final_error: &dyn Error) {
        self.exhaustions.fetch_add(1, Ordering::SeqCst);
    }

    fn on_rejected(&self, _reason: &str) {
        self.rejections.fetch_add(1, Ordering::SeqCst);
    }
}

impl<T: RetryObserver + ?Sized> RetryObserver for Arc<T> {
    fn on_attempt_start(&self, attempt: u32) {
        (**self).on_attempt_start(attempt)
    }

    fn on_attempt_failed(&self, attempt: u32, error: &dyn Error, delay: Duration) {
        (**self).on_attempt_failed(attempt, error, delay)
    }

    fn on_success(&self, attempt: u32, total_duration: Duration) {
        (**self).on_success(attempt, total_duration)
    }

    fn on_exhausted(&self, attempts: u32, final_error: &dyn Error) {
        (**self).on_exhausted(attempts, final_error)
    }

    fn on_rejected(&self, reason: &str) {
        (**self).on_rejected(reason)
    }
}

impl<T: RetryObserver + ?Sized> RetryObserver for Box<T> {
    fn on_attempt_start(&self, attempt: u32) {
        (**self).on_attempt_start(attempt)
    }

    fn on_attempt_failed(&self, attempt: u32, error: &dyn Error, delay: Duration) {
        (**self).on_attempt_failed(attempt, error, delay)
    }

    fn on_success(&self, attempt: u32, total_duration: Duration) {
        (**self).on_success(attempt, total_duration)
    }

    fn on_exhausted(&self, attempts: u32, final_error: &dyn Error) {
        (**self).on_exhausted(attempts, final_error)
    }

    fn on_rejected(&self, reason: &str) {
        (**self).on_rejected(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_noop_observer() {
        let observer = NoOpObserver;
        let error = io::Error::other("test");

        observer.on_attempt_start(1);
        observer.on_attempt_failed(1, &error, Duration::from_millis(100));
        observer.on_success(2, Duration::from_millis(500));
        observer.on_exhausted(3, &error);
        observer.on_rejected("bad shape");
    }

    #[test]
    fn test_stats_observer() {
        let observer = StatsObserver::new();
        let error = io::Error::other("test");

        observer.on_attempt_start(1);
        observer.on_attempt_failed(1, &error, Duration::from_millis(100));
        observer.on_attempt_start(2);
        observer.on_attempt_failed(2, &error, Duration::from_millis(200));
        observer.on_attempt_start(3);
        observer.on_exhausted(3, &error);

        assert_eq!(observer.attempt_starts(), 3);
        assert_eq!(observer.failures(), 2);
        assert_eq!(observer.successes(), 0);
        assert_eq!(observer.exhaustions(), 1);
        assert_eq!(
            observer.delays(),
            vec![Duration::from_millis(100), Duration::from_millis(200)]
        );
    }

    #[test]
    fn test_tracing_observer_creation() {
        assert_eq!(TracingObserver::new("fetch").operation(), "fetch");
        assert_eq!(TracingObserver::default().operation(), "retry");
    }

    #[test]
    fn test_arc_and_box_forward() {
        let stats = Arc::new(StatsObserver::new());
        let boxed: Box<dyn RetryObserver> = Box::new(stats.clone());

        boxed.on_attempt_start(1);
        boxed.on_rejected("nope");

        assert_eq!(stats.attempt_starts(), 1);
        assert_eq!(stats.rejections(), 1);
    }
}
