//! Virtualizable clock
//!
//! Every timed pause in the pipeline (ramp steps, round pauses, sampling
//! cadence, batch recovery windows) goes through [`Clock`], so tests can run
//! the full phase machinery without wall-clock delay.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic clock with an async sleep.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Suspend for the given duration.
    async fn sleep(&self, dur: Duration);

    /// Milliseconds since this clock's origin.
    fn now_ms(&self) -> u64;
}

/// Wall-clock implementation backed by tokio time.
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for SystemClock {
    async fn sleep(&self, dur: Duration) {
        tokio::time::sleep(dur).await;
    }

    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Test clock that advances instantly.
///
/// Each `sleep` adds the requested duration to an atomic counter and yields
/// once so concurrently spawned tasks get a chance to run. Several tasks
/// sleeping concurrently advance the counter independently; the pipeline only
/// relies on the clock moving forward, never on exact readings.
pub struct VirtualClock {
    now_ms: AtomicU64,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self {
            now_ms: AtomicU64::new(0),
        }
    }

    /// Advance time without sleeping.
    pub fn advance(&self, dur: Duration) {
        self.now_ms
            .fetch_add(dur.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Default for VirtualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for VirtualClock {
    async fn sleep(&self, dur: Duration) {
        self.advance(dur);
        tokio::task::yield_now().await;
    }

    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_virtual_clock_advances_on_sleep() {
        let clock = VirtualClock::new();
        assert_eq!(clock.now_ms(), 0);
        clock.sleep(Duration::from_millis(250)).await;
        assert_eq!(clock.now_ms(), 250);
        clock.sleep(Duration::from_secs(1)).await;
        assert_eq!(clock.now_ms(), 1250);
    }

    #[tokio::test]
    async fn test_virtual_clock_manual_advance() {
        let clock = VirtualClock::new();
        clock.advance(Duration::from_millis(42));
        assert_eq!(clock.now_ms(), 42);
    }

    #[tokio::test]
    async fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now_ms();
        clock.sleep(Duration::from_millis(5)).await;
        let b = clock.now_ms();
        assert!(b >= a);
    }
}
