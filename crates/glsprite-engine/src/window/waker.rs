use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use winit::event_loop::EventLoopProxy;

/// Events the runtime accepts from other threads.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    Redraw,
}

/// Cross-thread redraw trigger.
///
/// Wakes coalesce: while one redraw request is queued, further `wake` calls
/// are dropped, so a fast animator cannot flood the event loop.
#[derive(Debug, Clone)]
pub struct RedrawWaker {
    proxy: EventLoopProxy<RuntimeEvent>,
    pending: Arc<AtomicBool>,
}

impl RedrawWaker {
    pub(crate) fn new(proxy: EventLoopProxy<RuntimeEvent>) -> Self {
        Self {
            proxy,
            pending: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Requests a redraw. Returns `false` once the event loop has exited.
    pub fn wake(&self) -> bool {
        if self.pending.swap(true, Ordering::AcqRel) {
            return true;
        }
        if self.proxy.send_event(RuntimeEvent::Redraw).is_err() {
            self.pending.store(false, Ordering::Release);
            return false;
        }
        true
    }

    /// Marks the queued request as consumed.
    pub(crate) fn acknowledge(&self) {
        self.pending.store(false, Ordering::Release);
    }
}
