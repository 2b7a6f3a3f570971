//! Retry execution engine
//!
//! Re-invokes a fallible asynchronous operation until it succeeds or a stop
//! condition ends the sequence, waiting between attempts according to a
//! [`Backoff`] strategy and keeping every failure.
//!
//! # Features
//!
//! - Backoff strategies: Constant, Linear, Quadratic, Exponential
//! - Stop conditions: a maximum attempt count or a predicate over the attempt index
//! - Deferred callables and already-running futures as operations
//! - Full failure history on the terminal error
//! - Observable attempts via the `RetryObserver` trait, with `TracingObserver` for logging
//! - Pluggable delay primitive via the `Sleeper` trait
//!
//! # Example
//!
//! ```rust,no_run
//! use reattempt_core::retry::{retry, Backoff, Operation, RetryError};
//!
//! async fn example() -> Result<String, RetryError> {
//!     retry(
//!         Operation::deferred(|| async {
//!             // Your fallible operation here
//!             Ok::<_, std::io::Error>("success".to_string())
//!         }),
//!         3,
//!         &Backoff::default(),
//!     )
//!     .await
//! }
//! ```

mod backoff;
mod classify;
mod error;
mod executor;
mod observer;
mod operation;
mod sleeper;

pub use backoff::Backoff;
pub use classify::{AttemptError, Classify, RawFailure};
pub use error::RetryError;
pub use executor::{
    retry, retry_with_policy, retry_with_predicate, RetryExecutor, RetryExecutorBuilder,
    StopCondition,
};
pub use observer::{NoOpObserver, RetryObserver, StatsObserver, TracingObserver};
pub use operation::Operation;
pub use sleeper::{Sleeper, TokioSleeper, TrackingSleeper};
