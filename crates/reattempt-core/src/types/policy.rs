//! Retry policy configuration types

use crate::retry::Backoff;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Retry policies: a default plus named per-operation overrides
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct RetryPoliciesConfig {
    /// Policy used when no operation-specific policy exists
    #[serde(default)]
    pub default: RetryPolicy,

    /// Per-operation retry policies
    #[serde(default)]
    pub operations: HashMap<String, RetryPolicy>,
}

impl Default for RetryPoliciesConfig {
    fn default() -> Self {
        let mut operations = HashMap::new();

        // Commands get a few attempts with growing gaps
        operations.insert(
            "exec".to_string(),
            RetryPolicy {
                max_attempts: 3,
                backoff: BackoffConfig {
                    strategy: BackoffStrategy::Linear,
                    base_delay_secs: 1.0,
                    max_delay_secs: 10.0,
                },
                jitter: false,
            },
        );

        Self {
            default: RetryPolicy::default(),
            operations,
        }
    }
}

impl RetryPoliciesConfig {
    /// The policy for `operation`, falling back to the default
    pub fn policy_for(&self, operation: &str) -> &RetryPolicy {
        self.operations.get(operation).unwrap_or(&self.default)
    }
}

/// Retry policy for an operation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct RetryPolicy {
    /// Maximum number of attempts
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay schedule between attempts
    #[serde(default)]
    pub backoff: BackoffConfig,

    /// Add up to 25% random variation to each delay
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff: BackoffConfig::default(),
            jitter: false,
        }
    }
}

/// Serialized form of a [`Backoff`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct BackoffConfig {
    /// Backoff strategy
    #[serde(default)]
    pub strategy: BackoffStrategy,

    /// Delay unit in seconds
    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: f64,

    /// Delay ceiling in seconds (ignored by the constant strategy)
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            strategy: BackoffStrategy::default(),
            base_delay_secs: default_base_delay_secs(),
            max_delay_secs: default_max_delay_secs(),
        }
    }
}

impl BackoffConfig {
    /// Build the backoff value
    ///
    /// Negative or NaN second values are treated as zero and values too large
    /// for a `Duration` saturate; validate the configuration first to reject
    /// them instead.
    pub fn to_backoff(&self) -> Backoff {
        let base = secs_to_duration(self.base_delay_secs);
        let max = secs_to_duration(self.max_delay_secs);

        match self.strategy {
            BackoffStrategy::Constant => Backoff::constant(base),
            BackoffStrategy::Linear => Backoff::linear(base, max),
            BackoffStrategy::Quadratic => Backoff::quadratic(base, max),
            BackoffStrategy::Exponential => Backoff::exponential(base, max),
        }
    }
}

impl From<&Backoff> for BackoffConfig {
    fn from(backoff: &Backoff) -> Self {
        let strategy = match backoff {
            Backoff::Constant { .. } => BackoffStrategy::Constant,
            Backoff::Linear { .. } => BackoffStrategy::Linear,
            Backoff::Quadratic { .. } => BackoffStrategy::Quadratic,
            Backoff::Exponential { .. } => BackoffStrategy::Exponential,
        };

        Self {
            strategy,
            base_delay_secs: backoff.base_delay().as_secs_f64(),
            max_delay_secs: backoff.max_delay().as_secs_f64(),
        }
    }
}

/// Backoff strategy
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BackoffStrategy {
    /// Fixed delay between retries (default)
    #[default]
    Constant,

    /// Delay grows linearly with the attempt index
    Linear,

    /// Delay grows with the square of the attempt index
    Quadratic,

    /// Delay grows with the attempt index raised to itself
    Exponential,
}

fn default_max_attempts() -> u32 {
    1
}
fn default_base_delay_secs() -> f64 {
    1.0
}
fn default_max_delay_secs() -> f64 {
    30.0
}

/// Negative and NaN become zero; values past the `Duration` range saturate
fn secs_to_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(if secs > 0.0 {
        Duration::MAX
    } else {
        Duration::ZERO
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.backoff.strategy, BackoffStrategy::Constant);
        assert_eq!(policy.backoff.to_backoff(), Backoff::default());
        assert!(!policy.jitter);
    }

    #[test]
    fn test_policy_for_falls_back_to_default() {
        let config = RetryPoliciesConfig::default();
        assert_eq!(config.policy_for("exec").max_attempts, 3);
        assert_eq!(config.policy_for("unknown"), &config.default);
    }

    #[test]
    fn test_backoff_config_conversion() {
        let config = BackoffConfig {
            strategy: BackoffStrategy::Exponential,
            base_delay_secs: 0.5,
            max_delay_secs: 8.0,
        };
        let backoff = config.to_backoff();

        assert_eq!(
            backoff,
            Backoff::exponential(Duration::from_millis(500), Duration::from_secs(8))
        );
        assert_eq!(BackoffConfig::from(&backoff), config);
    }

    #[test]
    fn test_negative_seconds_become_zero() {
        let config = BackoffConfig {
            strategy: BackoffStrategy::Constant,
            base_delay_secs: -3.0,
            max_delay_secs: f64::NAN,
        };
        assert_eq!(config.to_backoff().delay_for(2), Duration::ZERO);
    }

    #[test]
    fn test_policy_yaml_uses_kebab_case() {
        let policy = RetryPolicy {
            max_attempts: 4,
            backoff: BackoffConfig {
                strategy: BackoffStrategy::Quadratic,
                base_delay_secs: 1.0,
                max_delay_secs: 20.0,
            },
            jitter: true,
        };
        let yaml = serde_yaml_ng::to_string(&policy).unwrap();

        assert!(yaml.contains("max-attempts: 4"));
        assert!(yaml.contains("strategy: quadratic"));
        assert!(yaml.contains("base-delay-secs: 1.0"));
        assert!(yaml.contains("jitter: true"));
    }

    #[test]
    fn test_policy_yaml_defaults() {
        let policy: RetryPolicy = serde_yaml_ng::from_str("max-attempts: 5\n").unwrap();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.backoff, BackoffConfig::default());
    }

    #[test]
    fn test_strategy_json_names() {
        let json = serde_json::to_value(BackoffStrategy::Exponential).unwrap();
        assert_eq!(json, serde_json::json!("exponential"));

        let parsed: BackoffStrategy = serde_json::from_str("\"linear\"").unwrap();
        assert_eq!(parsed, BackoffStrategy::Linear);
    }

    #[test]
    fn test_oversized_seconds_saturate() {
        let config = BackoffConfig {
            strategy: BackoffStrategy::Linear,
            base_delay_secs: 2.0,
            max_delay_secs: 1e30,
        };
        let backoff = config.to_backoff();

        assert_eq!(backoff.max_delay(), Duration::MAX);
        assert_eq!(backoff.delay_for(3), Duration::from_secs(6));
    }
}
