//! Time subsystem.
//!
//! - [`Animator`]: requests frames at a fixed target rate from its own thread
//! - [`FrameClock`]: measures the cadence frames are drawn at, on the render thread

mod animator;
mod cancel;
mod clock;
mod frame_clock;

pub use animator::{AnimationHandle, Animator, AnimatorError, FrameSchedule, frame_period};
pub use cancel::CancellationToken;
pub use clock::{Clock, ManualClock, SystemClock};
pub use frame_clock::{FrameClock, FrameTime};
