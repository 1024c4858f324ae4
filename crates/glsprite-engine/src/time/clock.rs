use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Monotonic time source for the animator.
///
/// `now` is measured from an arbitrary per-clock origin. `wait` blocks for at
/// most `duration` and may return early (spurious wakeups, cancellation).
pub trait Clock: Send + 'static {
    fn now(&self) -> Duration;

    fn wait(&self, duration: Duration) {
        thread::park_timeout(duration);
    }
}

/// Wall-clock time from `Instant`.
#[derive(Debug, Clone, Copy)]
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

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Simulated time. `wait` advances the clock instead of blocking, so loops
/// driven by it run as fast as they can poll.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.nanos.fetch_add(saturating_nanos(by), Ordering::AcqRel);
    }

    pub fn set(&self, now: Duration) {
        self.nanos.store(saturating_nanos(now), Ordering::Release);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::Acquire))
    }

    fn wait(&self, duration: Duration) {
        self.advance(duration);
    }
}

fn saturating_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_is_shared_and_advanced_by_wait() {
        let clock = ManualClock::new();
        let view = clock.clone();

        clock.advance(Duration::from_millis(5));
        view.wait(Duration::from_millis(10));
        assert_eq!(clock.now(), Duration::from_millis(15));

        clock.set(Duration::from_secs(2));
        assert_eq!(view.now(), Duration::from_secs(2));
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
