//! Rectangular triangle-list meshes.
//!
//! A [`Grid`] owns per-vertex attributes and a fixed index layout, and can move
//! its data into buffer objects on the graphics card ("hardware mode").

mod error;
pub mod fixed;
mod grid;

pub use error::{GridError, ResourceFailure};
pub use grid::{AttribSlice, Grid, HardwareBuffers, Representation, MAX_VERTICES};
