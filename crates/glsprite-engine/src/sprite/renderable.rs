use glam::{Vec2, Vec3};

/// Position, velocity and size of something drawn on screen.
///
/// Pure data. Units are window pixels with the origin at the bottom-left, the
/// convention of the draw-texture blit.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Renderable {
    pub position: Vec3,
    /// Pixels per second.
    pub velocity: Vec3,
    /// `x` is width, `y` is height.
    pub size: Vec2,
}

impl Renderable {
    #[inline]
    pub fn new(position: Vec3, size: Vec2) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            size,
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.size.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.size.y
    }
}
