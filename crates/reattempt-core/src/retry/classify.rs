//! Normalization of per-attempt failures
//!
//! Operations may fail with anything: a structured error, a boxed trait
//! object, or a bare value such as a string. Every failure is turned into an
//! [`AttemptError`] before it is recorded, so the failure history of a retry
//! sequence is always a list of real errors.

use std::error::Error as StdError;
use std::fmt;

/// One recorded failure
///
/// Errors keep their concrete type and can be recovered with
/// [`AttemptError::downcast_ref`]. Raw values are wrapped in a [`RawFailure`].
#[derive(Debug)]
pub struct AttemptError {
    inner: anyhow::Error,
    wrapped: bool,
}

impl AttemptError {
    /// Record a failure that already is an error
    pub fn from_error<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            inner: anyhow::Error::new(error),
            wrapped: false,
        }
    }

    /// Record a raw failure value by its string form
    pub fn from_raw(value: impl fmt::Display) -> Self {
        Self {
            inner: anyhow::Error::new(RawFailure::new(value.to_string())),
            wrapped: true,
        }
    }

    /// Whether the failure was a raw value that had to be wrapped
    pub fn is_wrapped(&self) -> bool {
        self.wrapped
    }

    /// The failure message
    pub fn message(&self) -> String {
        self.inner.to_string()
    }

    /// Borrow the original error as `E`, if that is what it was
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.inner.downcast_ref::<E>()
    }

    /// Unwrap into the underlying `anyhow::Error`
    pub fn into_inner(self) -> anyhow::Error {
        self.inner
    }
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl StdError for AttemptError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source()
    }
}

/// Minimal error wrapping a failure that was not an error value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RawFailure {
    message: String,
}

impl RawFailure {
    /// Wrap a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The wrapped value's string form
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Conversion of an operation's failure into an [`AttemptError`]
///
/// Implemented for the common error carriers and for raw values. Implement it
/// for your own error type with [`AttemptError::from_error`]:
///
/// ```rust
/// use reattempt_core::retry::{AttemptError, Classify};
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("upstream unavailable")]
/// struct Unavailable;
///
/// impl Classify for Unavailable {
///     fn classify(self) -> AttemptError {
///         AttemptError::from_error(self)
///     }
/// }
/// ```
pub trait Classify {
    /// Normalize this failure
    fn classify(self) -> AttemptError;
}

impl Classify for AttemptError {
    fn classify(self) -> AttemptError {
        self
    }
}

impl Classify for anyhow::Error {
    fn classify(self) -> AttemptError {
        AttemptError {
            inner: self,
            wrapped: false,
        }
    }
}

impl Classify for Box<dyn StdError + Send + Sync> {
    fn classify(self) -> AttemptError {
        AttemptError {
            inner: anyhow::anyhow!(self),
            wrapped: false,
        }
    }
}

impl Classify for RawFailure {
    fn classify(self) -> AttemptError {
        AttemptError {
            inner: anyhow::Error::new(self),
            wrapped: true,
        }
    }
}

macro_rules! classify_errors {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Classify for $ty {
                fn classify(self) -> AttemptError {
                    AttemptError::from_error(self)
                }
            }
        )*
    };
}

macro_rules! classify_raw {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Classify for $ty {
                fn classify(self) -> AttemptError {
                    AttemptError::from_raw(self)
                }
            }
        )*
    };
}

classify_errors!(
    std::io::Error,
    std::fmt::Error,
    std::num::ParseIntError,
    std::num::ParseFloatError,
    std::str::Utf8Error,
    std::string::FromUtf8Error,
    tokio::time::error::Elapsed,
    tokio::task::JoinError,
);

classify_raw!(String, &'static str, char, bool, i8, i16, i32, i64, u8, u16, u32, u64, usize, isize, f32, f64);

impl Classify for () {
    fn classify(self) -> AttemptError {
        AttemptError::from_raw("operation failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_passes_through() {
        let record = io::Error::new(io::ErrorKind::TimedOut, "timeout").classify();

        assert!(!record.is_wrapped());
        assert_eq!(record.message(), "timeout");
        let original = record.downcast_ref::<io::Error>().unwrap();
        assert_eq!(original.kind(), io::ErrorKind::TimedOut);
    }

    #[test]
    fn test_anyhow_passes_through() {
        let record = anyhow::anyhow!("boom").context("fetching index").classify();

        assert!(!record.is_wrapped());
        assert_eq!(record.message(), "fetching index");
    }

    #[test]
    fn test_boxed_error_keeps_message() {
        let boxed: Box<dyn StdError + Send + Sync> = Box::new(io::Error::other("disk full"));
        let record = boxed.classify();

        assert!(!record.is_wrapped());
        assert_eq!(record.message(), "disk full");
    }

    #[test]
    fn test_raw_string_is_wrapped() {
        let record = "rejected".classify();

        assert!(record.is_wrapped());
        assert_eq!(record.message(), "rejected");
        assert_eq!(
            record.downcast_ref::<RawFailure>().map(RawFailure::message),
            Some("rejected")
        );
    }

    #[test]
    fn test_raw_number_uses_string_form() {
        assert_eq!(404u16.classify().message(), "404");
        assert_eq!(false.classify().message(), "false");
        assert!(String::from("Foo").classify().is_wrapped());
    }

    #[test]
    fn test_unit_failure_gets_generic_message() {
        let record = ().classify();
        assert!(record.is_wrapped());
        assert_eq!(record.message(), "operation failed");
    }

    #[test]
    fn test_attempt_error_classifies_to_itself() {
        let record = AttemptError::from_raw("once").classify();
        assert!(record.is_wrapped());
        assert_eq!(record.to_string(), "once");
    }
}
