use winit::event::WindowEvent;
use winit::window::WindowId;

use super::ctx::FrameCtx;
use crate::device::Gpu;
use crate::window::RedrawWaker;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by the demo.
///
/// All callbacks run on the event-loop thread, which owns the graphics
/// context.
pub trait App {
    /// The window and its GPU context exist (again).
    ///
    /// Called once at startup and after every resume following
    /// [`on_suspended`](Self::on_suspended). `waker` requests redraws from any
    /// thread.
    fn on_resumed(&mut self, gpu: &Gpu<'_>, waker: RedrawWaker) -> AppControl;

    /// The window and GPU context were torn down (platform suspend). Every
    /// texture and buffer handle is gone.
    fn on_suspended(&mut self) {}

    fn on_window_event(&mut self, window_id: WindowId, event: &WindowEvent) -> AppControl {
        let _ = (window_id, event);
        AppControl::Continue
    }

    /// Called once per redraw.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// The event loop is shutting down.
    fn on_exit(&mut self) {}
}
