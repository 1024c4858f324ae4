use std::time::{Duration, Instant};

/// Per-frame timing handed to the scene update.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Clamped seconds since the previous tick.
    pub dt: f32,
    pub now: Instant,
    pub frame_index: u64,
    /// Smoothed frames per second over recent ticks.
    pub fps: f32,
}

/// Measures the cadence frames are actually drawn at.
///
/// The animator decides when a frame is requested; this clock measures when it
/// was drawn, so movement stays proportional to real time when frames are
/// dropped or batched up by catch-up scheduling.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
    fps: f32,
}

/// Weight of the newest sample in the fps average.
const FPS_SMOOTHING: f32 = 0.1;

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            frame_index: 0,
            dt_min,
            dt_max,
            fps: 0.0,
        }
    }

    /// Restarts measurement, e.g. after the surface comes back from a suspend.
    pub fn reset(&mut self) {
        self.last = Instant::now();
        self.fps = 0.0;
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    /// Ticks with an explicit timestamp.
    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);
        self.last = now;

        let dt = dt.as_secs_f32();
        let sample = 1.0 / dt;
        self.fps = if self.frame_index == 0 || self.fps == 0.0 {
            sample
        } else {
            self.fps + (sample - self.fps) * FPS_SMOOTHING
        };

        let ft = FrameTime {
            dt,
            now,
            frame_index: self.frame_index,
            fps: self.fps,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dt_is_clamped() {
        let start = Instant::now();
        let mut clock = FrameClock::with_clamps(Duration::from_millis(1), Duration::from_millis(100));
        clock.last = start;

        let stalled = clock.tick_at(start + Duration::from_secs(3));
        assert!((stalled.dt - 0.1).abs() < 1e-6);

        let tight = clock.tick_at(start + Duration::from_secs(3));
        assert!((tight.dt - 0.001).abs() < 1e-6);
        assert_eq!(tight.frame_index, 1);
    }

    #[test]
    fn fps_converges_on_steady_cadence() {
        let start = Instant::now();
        let mut clock = FrameClock::new();
        clock.last = start;

        let mut last = None;
        for i in 1..=200u64 {
            last = Some(clock.tick_at(start + Duration::from_millis(16 * i)));
        }
        let fps = last.map(|t| t.fps).unwrap_or_default();
        assert!((fps - 62.5).abs() < 0.1, "fps = {fps}");
    }
}
