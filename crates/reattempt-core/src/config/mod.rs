//! Configuration loading

mod loader;

pub use loader::{ReattemptConfigFile, RetryConfig};
