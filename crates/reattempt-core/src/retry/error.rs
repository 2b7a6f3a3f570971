//! Error types for the retry execution engine
//!
//! A retry sequence ends in one of three failures: the operation could not be
//! attempted at all, the attempt limit was reached, or the caller's stop
//! predicate fired. The last two carry the full failure history.

use std::error::Error;
use std::fmt;
use std::time::Duration;

use super::classify::AttemptError;

/// Terminal failure of a retry sequence
#[derive(Debug)]
pub enum RetryError {
    /// The operation was not retryable in its supplied shape
    ///
    /// Returned before any attempt runs; no delay is incurred.
    InvalidOperation {
        /// Why the operation was rejected
        message: String,
    },

    /// The maximum number of attempts was reached without success
    ///
    /// The first attempt always runs, so a `max_attempts` of 0 still reports
    /// `attempts == 1` while the message reads "Exceeded 0 retry attempts".
    AttemptsExceeded {
        /// The configured limit
        max_attempts: u32,
        /// Number of attempts actually made
        attempts: u32,
        /// Wall-clock time from the first attempt to the final failure
        duration: Duration,
        /// Every attempt's failure, in attempt order
        nested: Vec<AttemptError>,
    },

    /// The stop predicate ended the sequence without success
    PredicateViolation {
        /// Number of attempts actually made
        attempts: u32,
        /// Wall-clock time from the first attempt to the final failure
        duration: Duration,
        /// Every attempt's failure, in attempt order
        nested: Vec<AttemptError>,
    },
}

impl fmt::Display for RetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::InvalidOperation { message } => {
                write!(f, "invalid operation: {}", message)
            }
            RetryError::AttemptsExceeded { max_attempts, .. } => {
                write!(f, "Exceeded {} retry attempts", max_attempts)
            }
            RetryError::PredicateViolation {
                attempts, duration, ..
            } => {
                write!(
                    f,
                    "retry predicate stopped the operation after {} attempts over {:.2}s",
                    attempts,
                    duration.as_secs_f64()
                )
            }
        }
    }
}

impl Error for RetryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.last_error().map(|err| err as &(dyn Error + 'static))
    }
}

impl RetryError {
    /// Create an invalid operation error
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        RetryError::InvalidOperation {
            message: message.into(),
        }
    }

    /// Create an attempts exceeded error
    pub fn attempts_exceeded(max_attempts: u32, duration: Duration, nested: Vec<AttemptError>) -> Self {
        RetryError::AttemptsExceeded {
            max_attempts,
            attempts: attempt_count(&nested),
            duration,
            nested,
        }
    }

    /// Create a predicate violation error
    pub fn predicate_violation(duration: Duration, nested: Vec<AttemptError>) -> Self {
        RetryError::PredicateViolation {
            attempts: attempt_count(&nested),
            duration,
            nested,
        }
    }

    /// Get the number of attempts made
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::InvalidOperation { .. } => 0,
            RetryError::AttemptsExceeded { attempts, .. } => *attempts,
            RetryError::PredicateViolation { attempts, .. } => *attempts,
        }
    }

    /// Get the elapsed time of the sequence
    pub fn duration(&self) -> Duration {
        match self {
            RetryError::InvalidOperation { .. } => Duration::ZERO,
            RetryError::AttemptsExceeded { duration, .. } => *duration,
            RetryError::PredicateViolation { duration, .. } => *duration,
        }
    }

    /// Get the elapsed time of the sequence in whole milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.duration().as_millis() as u64
    }

    /// Get the recorded failures in attempt order
    pub fn nested(&self) -> &[AttemptError] {
        match self {
            RetryError::InvalidOperation { .. } => &[],
            RetryError::AttemptsExceeded { nested, .. } => nested,
            RetryError::PredicateViolation { nested, .. } => nested,
        }
    }

    /// Take ownership of the recorded failures
    pub fn into_nested(self) -> Vec<AttemptError> {
        match self {
            RetryError::InvalidOperation { .. } => Vec::new(),
            RetryError::AttemptsExceeded { nested, .. } => nested,
            RetryError::PredicateViolation { nested, .. } => nested,
        }
    }

    /// The failure of the final attempt, if any attempt ran
    pub fn last_error(&self) -> Option<&AttemptError> {
        self.nested().last()
    }

    /// Check if the operation was rejected before any attempt
    pub fn is_invalid_operation(&self) -> bool {
        matches!(self, RetryError::InvalidOperation { .. })
    }

    /// Check if the attempt limit was reached
    pub fn is_attempts_exceeded(&self) -> bool {
        matches!(self, RetryError::AttemptsExceeded { .. })
    }

    /// Check if the stop predicate ended the sequence
    pub fn is_predicate_violation(&self) -> bool {
        matches!(self, RetryError::PredicateViolation { .. })
    }
}

fn attempt_count(nested: &[AttemptError]) -> u32 {
    u32::try_from(nested.len()).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::classify::Classify;
    use std::io;

    fn failures(count: usize) -> Vec<AttemptError> {
        (0..count)
            .map(|i| io::Error::other(format!("failure {}", i)).classify())
            .collect()
    }

    #[test]
    fn test_attempts_exceeded_error() {
        let err = RetryError::attempts_exceeded(3, Duration::from_secs(2), failures(3));

        assert!(err.is_attempts_exceeded());
        assert!(!err.is_predicate_violation());
        assert!(!err.is_invalid_operation());
        assert_eq!(err.attempts(), 3);
        assert_eq!(err.nested().len(), 3);
        assert_eq!(err.duration_ms(), 2000);
    }

    #[test]
    fn test_predicate_violation_error() {
        let err = RetryError::predicate_violation(Duration::from_millis(1500), failures(2));

        assert!(err.is_predicate_violation());
        assert_eq!(err.attempts(), 2);
        assert_eq!(err.duration_ms(), 1500);
    }

    #[test]
    fn test_invalid_operation_error() {
        let err = RetryError::invalid_operation("needs a zero-argument callable");

        assert!(err.is_invalid_operation());
        assert_eq!(err.attempts(), 0);
        assert_eq!(err.duration(), Duration::ZERO);
        assert!(err.nested().is_empty());
        assert!(err.source().is_none());
    }

    #[test]
    fn test_source_is_last_failure() {
        let err = RetryError::attempts_exceeded(2, Duration::ZERO, failures(2));
        assert_eq!(err.source().unwrap().to_string(), "failure 1");
    }

    #[test]
    fn test_into_nested_preserves_order() {
        let err = RetryError::predicate_violation(Duration::ZERO, failures(3));
        let messages: Vec<String> = err.into_nested().iter().map(|e| e.message()).collect();
        assert_eq!(messages, vec!["failure 0", "failure 1", "failure 2"]);
    }

    #[test]
    fn test_display() {
        let exceeded = RetryError::attempts_exceeded(4, Duration::from_secs(3), failures(4));
        assert_eq!(exceeded.to_string(), "Exceeded 4 retry attempts");

        let violated = RetryError::predicate_violation(Duration::from_millis(5500), failures(3));
        let display = violated.to_string();
        assert!(display.contains("3 attempts"));
        assert!(display.contains("5.50s"));

        let invalid = RetryError::invalid_operation("expects 1 argument");
        assert!(invalid.to_string().contains("expects 1 argument"));
    }

    #[test]
    fn test_zero_limit_reports_the_attempt_that_ran() {
        let err = RetryError::attempts_exceeded(0, Duration::ZERO, failures(1));

        assert_eq!(err.to_string(), "Exceeded 0 retry attempts");
        assert_eq!(err.attempts(), 1);
        assert!(matches!(
            err,
            RetryError::AttemptsExceeded { max_attempts: 0, attempts: 1, .. }
        ));
    }
}
