//! Configuration file loading and validation

use crate::error::{Error, Result};
use crate::types::{BackoffConfig, BackoffStrategy, RetryPoliciesConfig, RetryPolicy};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

/// Configuration file names to search for
const CONFIG_FILE_NAMES: &[&str] = &["reattempt.yaml", "reattempt.yml"];

/// Contents of a reattempt configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ReattemptConfigFile {
    /// Retry policies
    #[serde(default)]
    pub retry_policies: RetryPoliciesConfig,
}

/// Loaded and validated configuration
#[derive(Debug, Clone, Default)]
pub struct RetryConfig {
    /// The parsed configuration
    pub config: ReattemptConfigFile,

    /// Path the configuration was read from, if any
    pub config_path: Option<Utf8PathBuf>,
}

impl RetryConfig {
    /// Load configuration from the specified path or search for it
    ///
    /// Without a path, the current directory is searched; when no file is
    /// found the built-in defaults are used.
    pub fn load(path: Option<&Utf8Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_file(p),
            None => match Self::find_config(Utf8Path::new(".")) {
                Some(found) => Self::load_file(&found),
                None => {
                    tracing::debug!("no configuration file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    /// Load and validate a specific file
    pub fn load_file(path: &Utf8Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::config_not_found(path.as_str())
            } else {
                Error::Io(e)
            }
        })?;

        let config = Self::parse(&content)?;
        tracing::debug!(path = %path, "loaded configuration");

        Ok(Self {
            config,
            config_path: Some(path.to_owned()),
        })
    }

    /// Parse and validate YAML content
    pub fn parse(content: &str) -> Result<ReattemptConfigFile> {
        let config: ReattemptConfigFile = serde_yaml_ng::from_str(content)?;
        validate(&config)?;
        Ok(config)
    }

    /// Search `dir` for a configuration file
    pub fn find_config(dir: &Utf8Path) -> Option<Utf8PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    }

    /// The configured retry policies
    pub fn retry_policies(&self) -> &RetryPoliciesConfig {
        &self.config.retry_policies
    }

    /// The policy for `operation`, falling back to the default policy
    pub fn policy_for(&self, operation: &str) -> &RetryPolicy {
        self.config.retry_policies.policy_for(operation)
    }
}

fn validate(config: &ReattemptConfigFile) -> Result<()> {
    let policies = &config.retry_policies;
    validate_backoff("default", &policies.default.backoff)?;

    for (name, policy) in &policies.operations {
        validate_backoff(name, &policy.backoff)?;
    }

    Ok(())
}

fn validate_backoff(name: &str, backoff: &BackoffConfig) -> Result<()> {
    for (field, value) in [
        ("base-delay-secs", backoff.base_delay_secs),
        ("max-delay-secs", backoff.max_delay_secs),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(Error::invalid_config(format!(
                "policy '{}': {} must be a non-negative number of seconds, got {}",
                name, field, value
            )));
        }
        if Duration::try_from_secs_f64(value).is_err() {
            return Err(Error::invalid_config(format!(
                "policy '{}': {} is too large to be a delay, got {}",
                name, field, value
            )));
        }
    }

    if backoff.strategy != BackoffStrategy::Constant
        && backoff.max_delay_secs < backoff.base_delay_secs
    {
        return Err(Error::invalid_config(format!(
            "policy '{}': max-delay-secs ({}) is below base-delay-secs ({})",
            name, backoff.max_delay_secs, backoff.base_delay_secs
        )));
    }

    Ok(())
}
