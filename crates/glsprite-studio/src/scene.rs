//! Bouncing sprites.

use glam::{Vec2, Vec3};

use glsprite_engine::gl::{Capabilities, GlContext, TextureId};
use glsprite_engine::mesh::{Grid, GridError};
use glsprite_engine::sprite::{Renderable, Sprite, SpriteError, quad_grid};

use crate::args::SceneConfig;
use crate::texture::{CHECKER_RESOURCE, CHECKER_SIZE};

/// Sprites moving inside the window, reflecting off its edges.
pub struct Scene {
    sprites: Vec<Sprite>,
    bounds: Vec2,
    use_mesh: bool,
    use_hardware_buffers: bool,
}

impl Scene {
    /// Builds the sprites. `capabilities` is what the context actually offers.
    pub fn build(config: &SceneConfig, capabilities: Capabilities) -> Result<Self, GridError> {
        let bounds = Vec2::new(config.width as f32, config.height as f32);
        let size = Vec2::splat(CHECKER_SIZE as f32);

        let sprites = (0..config.sprite_count)
            .map(|i| {
                let mut sprite = Sprite::new(CHECKER_RESOURCE, capabilities)
                    .with_renderable(initial_state(i, size, bounds));
                if config.use_mesh {
                    sprite.set_grid(Some(quad_grid(
                        size.x,
                        size.y,
                        config.representation,
                        capabilities,
                    )?));
                }
                Ok(sprite)
            })
            .collect::<Result<Vec<_>, GridError>>()?;

        log::info!(
            "scene: {} sprites, {} path{}",
            sprites.len(),
            if config.use_mesh { "mesh" } else { "blit" },
            if config.use_hardware_buffers { " (buffer objects)" } else { "" }
        );

        Ok(Self {
            sprites,
            bounds,
            use_mesh: config.use_mesh,
            use_hardware_buffers: config.use_hardware_buffers,
        })
    }

    pub fn sprites(&self) -> &[Sprite] {
        &self.sprites
    }

    pub fn set_bounds(&mut self, width: u32, height: u32) {
        self.bounds = Vec2::new(width as f32, height as f32);
    }

    /// Points every sprite at the (re-)created sprite texture.
    pub fn set_texture(&mut self, texture: TextureId) {
        for sprite in &mut self.sprites {
            sprite.set_texture(texture);
        }
    }

    /// Moves every mesh into buffer objects when enabled.
    ///
    /// A sprite whose upload fails keeps drawing from client memory. Returns
    /// the number of sprites drawing from buffer objects.
    pub fn upload_buffers(&mut self, gl: &mut (impl GlContext + ?Sized)) -> usize {
        if !self.use_hardware_buffers {
            return 0;
        }
        let mut uploaded = 0;
        for sprite in &mut self.sprites {
            match sprite.generate_hardware_buffers(gl) {
                Ok(()) => uploaded += usize::from(sprite.grid().is_some_and(Grid::using_hardware_buffers)),
                Err(e) => log::warn!("sprite stays in client memory: {e}"),
            }
        }
        log::debug!("{uploaded}/{} sprites in buffer objects", self.sprites.len());
        uploaded
    }

    pub fn update(&mut self, dt: f32) {
        for sprite in &mut self.sprites {
            step(&mut sprite.renderable, dt, self.bounds);
        }
    }

    pub fn draw(&self, gl: &mut (impl GlContext + ?Sized)) -> Result<(), SpriteError> {
        if self.use_mesh {
            Grid::begin_drawing(gl, true, false);
        } else {
            gl.set_texturing(true);
        }

        let drawn = self.sprites.iter().try_for_each(|s| s.draw(&mut *gl));

        if self.use_mesh {
            Grid::end_drawing(gl);
        }
        drawn
    }

    /// Forgets every graphics handle; call [`set_texture`](Self::set_texture)
    /// and [`upload_buffers`](Self::upload_buffers) on the new context.
    pub fn on_context_lost(&mut self) {
        for sprite in &mut self.sprites {
            sprite.on_context_lost();
        }
    }

    pub fn release(&mut self, gl: &mut (impl GlContext + ?Sized)) {
        for sprite in &mut self.sprites {
            sprite.release_hardware_buffers(gl);
        }
    }
}

/// Spreads sprites over the window with varied headings and speeds.
fn initial_state(index: usize, size: Vec2, bounds: Vec2) -> Renderable {
    const GOLDEN_ANGLE: f32 = 2.399_963;

    let span = (bounds - size).max(Vec2::ZERO);
    let t = index as f32;
    let position = Vec2::new(
        (t * 0.618_034).fract() * span.x,
        (t * 0.414_214 + 0.5).fract() * span.y,
    );

    let heading = t * GOLDEN_ANGLE;
    let speed = 60.0 + (t * 37.0) % 120.0;

    let mut r = Renderable::new(position.extend(0.0), size);
    r.velocity = Vec3::new(heading.cos(), heading.sin(), 0.0) * speed;
    r
}

/// Advances `r` by `dt` seconds, reflecting off the edges of `bounds`.
fn step(r: &mut Renderable, dt: f32, bounds: Vec2) {
    let max = (bounds - r.size).max(Vec2::ZERO);
    let mut pos = r.position.truncate() + r.velocity.truncate() * dt;
    let mut vel = r.velocity.truncate();

    for axis in 0..2 {
        if pos[axis] < 0.0 {
            pos[axis] = (-pos[axis]).min(max[axis]);
            vel[axis] = vel[axis].abs();
        } else if pos[axis] > max[axis] {
            pos[axis] = (2.0 * max[axis] - pos[axis]).max(0.0);
            vel[axis] = -vel[axis].abs();
        }
    }

    r.position = pos.extend(r.position.z);
    r.velocity = vel.extend(r.velocity.z);
}
