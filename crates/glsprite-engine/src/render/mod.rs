//! Per-frame render handles passed from the runtime to the application.
//!
//! Convention: the fixed-function layer works in window pixels with a
//! bottom-left origin; `gl::WgpuGl` maps that to clip space.

mod ctx;

pub use ctx::RenderTarget;
