//! Fixed-function graphics context seam.
//!
//! `Grid` and `Sprite` issue their work through [`GlContext`]. Two contexts ship
//! with the engine:
//! - [`RecordingGl`]: headless, records every call (tests, headless runs)
//! - [`WgpuGl`]: replays the fixed-function stream on a wgpu device

mod context;
mod recording;
mod types;
mod wgpu_backend;

pub use context::GlContext;
pub use recording::{GlCall, RecordedIndices, RecordedSource, RecordingGl};
pub use types::{
    AttribSource, BufferId, BufferTarget, BufferUsage, Capabilities, ClientArray, CoordType,
    GlErrorCode, IndexSource, TextureId,
};
pub use wgpu_backend::WgpuGl;
