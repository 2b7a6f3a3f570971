//! Backoff strategies
//!
//! A [`Backoff`] maps the zero-based index of a failed attempt to the delay
//! that precedes the next attempt. Strategies are plain values: computing a
//! delay has no side effects, so one value can be shared across any number of
//! concurrent retry sequences.

use rand::Rng;
use std::time::Duration;

/// Delay schedule between attempts
///
/// # Example
///
/// ```rust
/// use reattempt_core::retry::Backoff;
/// use std::time::Duration;
///
/// let backoff = Backoff::quadratic(Duration::from_secs(1), Duration::from_secs(30));
///
/// assert_eq!(backoff.delay_for(0), Duration::ZERO);
/// assert_eq!(backoff.delay_for(2), Duration::from_secs(4));
/// assert_eq!(backoff.delay_for(9), Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// The same delay after every failure
    Constant {
        /// Delay applied before every retry
        delay: Duration,
    },

    /// `base * index`, capped at `max`
    Linear {
        /// Delay unit
        base: Duration,
        /// Ceiling
        max: Duration,
    },

    /// `base * index^2`, capped at `max`
    Quadratic {
        /// Delay unit
        base: Duration,
        /// Ceiling
        max: Duration,
    },

    /// `base * index^index`, capped at `max`
    ///
    /// The index is raised to its own power rather than to a fixed base, so
    /// this grows much faster than conventional exponential backoff: with a
    /// one second base the fourth retry already waits 256 seconds unless the
    /// ceiling intervenes.
    Exponential {
        /// Delay unit
        base: Duration,
        /// Ceiling
        max: Duration,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff::constant(Duration::from_secs(1))
    }
}

impl Backoff {
    /// Fixed delay between attempts
    pub fn constant(delay: Duration) -> Self {
        Backoff::Constant { delay }
    }

    /// Delay growing linearly with the attempt index
    pub fn linear(base: Duration, max: Duration) -> Self {
        Backoff::Linear { base, max }
    }

    /// Delay growing with the square of the attempt index
    pub fn quadratic(base: Duration, max: Duration) -> Self {
        Backoff::Quadratic { base, max }
    }

    /// Delay growing with the attempt index raised to itself
    pub fn exponential(base: Duration, max: Duration) -> Self {
        Backoff::Exponential { base, max }
    }

    /// The delay unit of this strategy
    pub fn base_delay(&self) -> Duration {
        match *self {
            Backoff::Constant { delay } => delay,
            Backoff::Linear { base, .. }
            | Backoff::Quadratic { base, .. }
            | Backoff::Exponential { base, .. } => base,
        }
    }

    /// The ceiling of this strategy
    ///
    /// A constant strategy has no separate ceiling and reports its delay.
    pub fn max_delay(&self) -> Duration {
        match *self {
            Backoff::Constant { delay } => delay,
            Backoff::Linear { max, .. }
            | Backoff::Quadratic { max, .. }
            | Backoff::Exponential { max, .. } => max,
        }
    }

    /// Short lowercase name of the strategy
    pub fn name(&self) -> &'static str {
        match self {
            Backoff::Constant { .. } => "constant",
            Backoff::Linear { .. } => "linear",
            Backoff::Quadratic { .. } => "quadratic",
            Backoff::Exponential { .. } => "exponential",
        }
    }

    /// Calculate the delay after the failed attempt at `attempt_index`
    ///
    /// `attempt_index` is zero-based: index 0 is the first attempt. Every
    /// strategy except [`Backoff::Constant`] returns zero at index 0.
    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        match *self {
            Backoff::Constant { delay } => delay,
            Backoff::Linear { base, max } => scaled(base, Some(u64::from(attempt_index)), max),
            Backoff::Quadratic { base, max } => {
                let index = u64::from(attempt_index);
                scaled(base, index.checked_mul(index), max)
            }
            Backoff::Exponential { base, max } => {
                if attempt_index == 0 {
                    return Duration::ZERO;
                }
                let factor = u64::from(attempt_index).checked_pow(attempt_index);
                scaled(base, factor, max)
            }
        }
    }

    /// The first `count` delays of this strategy, starting at index 0
    pub fn schedule(&self, count: u32) -> Vec<Duration> {
        (0..count).map(|index| self.delay_for(index)).collect()
    }
}

/// `base * factor` capped at `max`; an overflowing factor saturates to `max`
fn scaled(base: Duration, factor: Option<u64>, max: Duration) -> Duration {
    if base.is_zero() || factor == Some(0) {
        return Duration::ZERO;
    }

    factor
        .and_then(|f| u32::try_from(f).ok())
        .and_then(|f| base.checked_mul(f))
        .map_or(max, |delay| delay.min(max))
}

/// Add up to 25% random variation on top of `delay`
pub(crate) fn apply_jitter(delay: Duration) -> Duration {
    let delay_ms = delay.as_millis() as u64;
    if delay_ms == 0 {
        return delay;
    }

    let jitter_range = delay_ms / 4;
    let jitter_value = rand::rng().random_range(0..=jitter_range);
    delay + Duration::from_millis(jitter_value)
}
