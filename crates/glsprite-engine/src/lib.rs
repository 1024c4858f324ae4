//! glsprite engine crate.
//!
//! Fixed-function sprite rendering: grid meshes with optional buffer objects,
//! sprites drawn by blit or by mesh, and a fixed-rate animator, plus the
//! platform + GPU runtime the demo runs on.

pub mod gl;
pub mod mesh;
pub mod sprite;
pub mod time;

pub mod core;
pub mod device;
pub mod logging;
pub mod render;
pub mod window;
