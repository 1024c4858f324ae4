//! Sprites: textured rectangles drawn by blit or by mesh.

mod renderable;
mod sprite;

pub use renderable::Renderable;
pub use sprite::{quad_grid, Sprite, SpriteError};
