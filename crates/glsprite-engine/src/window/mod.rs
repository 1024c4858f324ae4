//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window, wires them to the GPU layer, and
//! accepts redraw requests from other threads through [`RedrawWaker`].

mod runtime;
mod waker;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
pub use waker::{RedrawWaker, RuntimeEvent};
