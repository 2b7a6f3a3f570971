//! Command implementations

pub mod demo;
pub mod exec;
pub mod schedule;

use anyhow::{anyhow, Result};
use std::time::Duration;

/// Convert a seconds argument into a duration
pub(crate) fn secs(name: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value)
        .map_err(|_| anyhow!("--{} must be a non-negative number of seconds, got {}", name, value))
}
