//! # reattempt-core
//!
//! Core library for reattempt providing:
//! - The retry engine: attempt loop, stop conditions, failure history
//! - Backoff strategies: constant, linear, quadratic, exponential
//! - Failure normalization for arbitrary error values
//! - Retry policy configuration (reattempt.yaml)

pub mod config;
pub mod error;
pub mod retry;
pub mod types;

pub use config::RetryConfig;
pub use error::{Error, Result};
pub use retry::{retry, retry_with_predicate, Backoff, Operation, RetryError};
