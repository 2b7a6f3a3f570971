//! Type definitions for reattempt configuration

mod policy;

pub use policy::{BackoffConfig, BackoffStrategy, RetryPoliciesConfig, RetryPolicy};
