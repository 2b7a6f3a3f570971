//! Delay primitive used between attempts

use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Suspends a retry sequence for the given duration
pub trait Sleeper: Send + Sync {
    /// Resolve after `delay` has elapsed
    fn sleep(&self, delay: Duration) -> BoxFuture<'static, ()>;
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, delay: Duration) -> BoxFuture<'static, ()> {
        tokio::time::sleep(delay).boxed()
    }
}

/// Returns immediately and records every requested delay
///
/// Lets tests assert on a delay schedule without waiting it out.
#[derive(Debug, Clone, Default)]
pub struct TrackingSleeper {
    calls: Arc<Mutex<Vec<Duration>>>,
}

impl TrackingSleeper {
    /// Create a tracking sleeper with no recorded calls
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays requested so far, in order
    pub fn calls(&self) -> Vec<Duration> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Sum of all requested delays
    pub fn total(&self) -> Duration {
        self.calls().into_iter().sum()
    }
}

impl Sleeper for TrackingSleeper {
    fn sleep(&self, delay: Duration) -> BoxFuture<'static, ()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(delay);
        }
        futures::future::ready(()).boxed()
    }
}

impl<T: Sleeper + ?Sized> Sleeper for Arc<T> {
    fn sleep(&self, delay: Duration) -> BoxFuture<'static, ()> {
        (**self).sleep(delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_tracking_sleeper_records_without_waiting() {
        let sleeper = TrackingSleeper::new();
        let start = Instant::now();

        sleeper.sleep(Duration::from_secs(30)).await;
        sleeper.sleep(Duration::from_secs(60)).await;

        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(
            sleeper.calls(),
            vec![Duration::from_secs(30), Duration::from_secs(60)]
        );
        assert_eq!(sleeper.total(), Duration::from_secs(90));
    }

    #[tokio::test]
    async fn test_tokio_sleeper_waits() {
        let start = Instant::now();
        TokioSleeper.sleep(Duration::from_millis(20)).await;
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
