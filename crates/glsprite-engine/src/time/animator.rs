use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;

use super::{CancellationToken, Clock, SystemClock};

#[derive(Debug, Error)]
pub enum AnimatorError {
    #[error("frame rate must be at least 1 fps (got {fps})")]
    InvalidFrameRate { fps: u32 },

    #[error("failed to spawn animator thread")]
    Spawn(#[from] std::io::Error),
}

/// Fixed-period firing rule.
///
/// Each successful [`poll`](Self::poll) advances the due time by exactly one
/// period, never to `now + period`. A poll that arrives late therefore leaves
/// the schedule behind, and the following polls fire immediately until it has
/// caught up; the long-run rate does not drift.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameSchedule {
    period: Duration,
    next_due: Duration,
}

impl FrameSchedule {
    /// First frame is due at `start`.
    pub fn new(start: Duration, period: Duration) -> Self {
        Self {
            period,
            next_due: start,
        }
    }

    #[inline]
    pub fn period(&self) -> Duration {
        self.period
    }

    #[inline]
    pub fn next_due(&self) -> Duration {
        self.next_due
    }

    /// Returns `true` (at most once per call) when a frame is due at `now`.
    pub fn poll(&mut self, now: Duration) -> bool {
        if now < self.next_due {
            return false;
        }
        self.next_due += self.period;
        true
    }

    /// Time left until the next frame; zero when overdue.
    #[inline]
    pub fn until_due(&self, now: Duration) -> Duration {
        self.next_due.saturating_sub(now)
    }
}

/// Period for a target frame rate, in whole milliseconds.
///
/// Integer division: 60 fps yields 16ms (62.5 fps effective), not 16.67ms.
pub fn frame_period(fps: u32) -> Result<Duration, AnimatorError> {
    if fps == 0 {
        return Err(AnimatorError::InvalidFrameRate { fps });
    }
    Ok(Duration::from_millis(u64::from(1000 / fps)))
}

/// Invokes a callback at a fixed target rate until cancelled.
///
/// The animator only keeps time. Its callback is expected to signal the thread
/// that owns the graphics context (e.g. through an event-loop proxy or a
/// channel) rather than draw itself.
#[derive(Debug)]
pub struct Animator<C: Clock = SystemClock> {
    period: Duration,
    clock: C,
}

impl Animator<SystemClock> {
    pub fn new(fps: u32) -> Result<Self, AnimatorError> {
        Self::with_clock(fps, SystemClock::new())
    }
}

impl<C: Clock> Animator<C> {
    pub fn with_clock(fps: u32, clock: C) -> Result<Self, AnimatorError> {
        Ok(Self {
            period: frame_period(fps)?,
            clock,
        })
    }

    #[inline]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Starts the loop on a background thread with a fresh token.
    pub fn start<F>(self, callback: F) -> Result<AnimationHandle, AnimatorError>
    where
        F: FnMut() + Send + 'static,
    {
        self.start_with_token(CancellationToken::new(), callback)
    }

    /// Starts the loop on a background thread; cancelling `token` (or the
    /// returned handle) stops it.
    pub fn start_with_token<F>(
        self,
        token: CancellationToken,
        callback: F,
    ) -> Result<AnimationHandle, AnimatorError>
    where
        F: FnMut() + Send + 'static,
    {
        let frames = Arc::new(AtomicU64::new(0));
        let thread_token = token.clone();
        let thread_frames = Arc::clone(&frames);
        let period = self.period;

        let thread = thread::Builder::new()
            .name("glsprite-animator".to_string())
            .spawn(move || {
                self.run_counting(&thread_token, &thread_frames, callback);
            })?;

        log::debug!("animator started (period {period:?})");

        Ok(AnimationHandle {
            token,
            thread: Some(thread),
            frames,
        })
    }

    /// Runs the loop on the current thread until `token` is cancelled.
    ///
    /// Returns the number of frames fired. The callback may cancel `token`
    /// itself; no further frame fires after that.
    pub fn run<F>(self, token: &CancellationToken, callback: F) -> u64
    where
        F: FnMut(),
    {
        let frames = AtomicU64::new(0);
        self.run_counting(token, &frames, callback);
        frames.load(Ordering::Acquire)
    }

    fn run_counting<F>(self, token: &CancellationToken, frames: &AtomicU64, mut callback: F)
    where
        F: FnMut(),
    {
        let mut schedule = FrameSchedule::new(self.clock.now(), self.period);

        while !token.is_cancelled() {
            let now = self.clock.now();
            if schedule.poll(now) {
                callback();
                frames.fetch_add(1, Ordering::AcqRel);
                continue;
            }
            self.clock.wait(schedule.until_due(now));
        }

        log::debug!(
            "animator stopped after {} frames",
            frames.load(Ordering::Acquire)
        );
    }
}

/// Owner side of a running animator.
///
/// Dropping the handle cancels the loop without waiting for the thread; use
/// [`stop`](Self::stop) to also join it.
#[derive(Debug)]
pub struct AnimationHandle {
    token: CancellationToken,
    thread: Option<JoinHandle<()>>,
    frames: Arc<AtomicU64>,
}

impl AnimationHandle {
    /// Requests cancellation. A callback already running completes; no new
    /// one starts.
    pub fn cancel(&self) {
        self.token.cancel();
        if let Some(thread) = &self.thread {
            thread.thread().unpark();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn frames_fired(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    /// Cancels and waits for the loop thread to exit. Returns frames fired.
    pub fn stop(mut self) -> u64 {
        self.cancel();
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            log::warn!("animator thread panicked");
        }
        self.frames_fired()
    }
}

impl Drop for AnimationHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::ManualClock;
    use std::sync::Mutex;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn period_truncates_to_whole_milliseconds() {
        assert_eq!(frame_period(60).unwrap(), Duration::from_millis(16));
        assert_eq!(frame_period(30).unwrap(), Duration::from_millis(33));
        assert_eq!(frame_period(1).unwrap(), Duration::from_secs(1));
        assert_eq!(frame_period(2000).unwrap(), Duration::ZERO);
        assert!(matches!(
            frame_period(0),
            Err(AnimatorError::InvalidFrameRate { fps: 0 })
        ));
    }

    #[test]
    fn schedule_fires_63_times_in_a_second_at_60fps() {
        let mut schedule = FrameSchedule::new(Duration::ZERO, frame_period(60).unwrap());
        let fired = (0..1000u64)
            .filter(|&t| schedule.poll(Duration::from_millis(t)))
            .count();
        assert_eq!(fired, 63);
    }

    #[test]
    fn schedule_catches_up_instead_of_resetting() {
        let mut schedule = FrameSchedule::new(Duration::ZERO, 16 * MS);
        assert!(schedule.poll(Duration::ZERO));

        // Stalled for 50ms: three frames are overdue and fire back to back.
        let late = 50 * MS;
        assert!(schedule.poll(late));
        assert!(schedule.poll(late));
        assert!(schedule.poll(late));
        assert!(!schedule.poll(late));
        assert_eq!(schedule.next_due(), 64 * MS);
        assert_eq!(schedule.until_due(late), 14 * MS);
    }

    #[test]
    fn simulated_second_with_instant_polling() {
        let clock = ManualClock::new();
        let animator = Animator::with_clock(60, clock.clone()).unwrap();
        let token = CancellationToken::new();

        let stop = token.clone();
        let fired = animator.run(&token, || {
            if clock.now() + 16 * MS >= Duration::from_secs(1) {
                stop.cancel();
            }
        });

        // Frames at 0, 16, .., 992ms.
        assert_eq!(fired, 63);
    }

    #[test]
    fn stalled_callback_triggers_catch_up() {
        let clock = ManualClock::new();
        let animator = Animator::with_clock(60, clock.clone()).unwrap();
        let token = CancellationToken::new();
        let stamps = Mutex::new(Vec::new());

        let stop = token.clone();
        animator.run(&token, || {
            let mut stamps = stamps.lock().unwrap();
            stamps.push(clock.now());
            if stamps.len() == 1 {
                clock.advance(50 * MS);
            }
            if stamps.len() == 6 {
                stop.cancel();
            }
        });

        let stamps = stamps.into_inner().unwrap();
        assert_eq!(
            stamps,
            vec![
                Duration::ZERO,
                50 * MS,
                50 * MS,
                50 * MS,
                64 * MS,
                80 * MS
            ]
        );
    }

    #[test]
    fn nothing_fires_after_cancellation() {
        let clock = ManualClock::new();
        let animator = Animator::with_clock(60, clock.clone()).unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let fired = animator.run(&token, || panic!("fired after cancel"));
        assert_eq!(fired, 0);
    }

    #[test]
    fn background_thread_stops_on_cancel() {
        let animator = Animator::new(200).unwrap();
        let count = Arc::new(AtomicU64::new(0));
        let seen = Arc::clone(&count);

        let handle = animator
            .start(move || {
                seen.fetch_add(1, Ordering::AcqRel);
            })
            .unwrap();

        thread::sleep(Duration::from_millis(100));
        let fired = handle.stop();
        assert!(fired >= 1);

        let at_stop = count.load(Ordering::Acquire);
        assert_eq!(at_stop, fired);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(count.load(Ordering::Acquire), at_stop);
    }

    #[test]
    fn shared_token_cancels_thread() {
        let token = CancellationToken::new();
        let handle = Animator::new(100)
            .unwrap()
            .start_with_token(token.clone(), || {})
            .unwrap();

        token.cancel();
        assert!(handle.is_cancelled());
        handle.stop();
    }
}
