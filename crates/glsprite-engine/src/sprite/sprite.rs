use thiserror::Error;

use crate::gl::{Capabilities, GlContext, TextureId};
use crate::mesh::{Grid, GridError, Representation};

use super::Renderable;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpriteError {
    /// A sprite without a mesh needs the draw-texture blit; there is no fallback.
    #[error("sprite {resource_id}: no mesh and the context lacks draw-texture support")]
    DrawTextureUnsupported { resource_id: u32 },

    #[error(transparent)]
    Grid(#[from] GridError),
}

/// A textured rectangle.
///
/// Without a grid the sprite is drawn with one draw-texture blit at its
/// position and size. With a grid it is drawn as a mesh translated to its
/// position; the grid's vertices carry the size.
#[derive(Debug, Clone)]
pub struct Sprite {
    resource_id: u32,
    texture: TextureId,
    grid: Option<Grid>,
    capabilities: Capabilities,
    pub renderable: Renderable,
}

impl Sprite {
    /// `resource_id` names the image the texture was created from, so the
    /// host can re-upload it after a context loss.
    pub fn new(resource_id: u32, capabilities: Capabilities) -> Self {
        Self {
            resource_id,
            texture: TextureId::NONE,
            grid: None,
            capabilities,
            renderable: Renderable::default(),
        }
    }

    pub fn with_grid(mut self, grid: Grid) -> Self {
        self.grid = Some(grid);
        self
    }

    pub fn with_renderable(mut self, renderable: Renderable) -> Self {
        self.renderable = renderable;
        self
    }

    #[inline]
    pub fn resource_id(&self) -> u32 {
        self.resource_id
    }

    #[inline]
    pub fn texture(&self) -> TextureId {
        self.texture
    }

    pub fn set_texture(&mut self, texture: TextureId) {
        self.texture = texture;
    }

    pub fn grid(&self) -> Option<&Grid> {
        self.grid.as_ref()
    }

    pub fn set_grid(&mut self, grid: Option<Grid>) {
        self.grid = grid;
    }

    /// Draws with the current texture.
    ///
    /// The caller sets up array and texturing state once per batch
    /// (`Grid::begin_drawing`).
    pub fn draw(&self, gl: &mut (impl GlContext + ?Sized)) -> Result<(), SpriteError> {
        let r = &self.renderable;

        match &self.grid {
            None => {
                if !self.capabilities.draw_texture {
                    return Err(SpriteError::DrawTextureUnsupported {
                        resource_id: self.resource_id,
                    });
                }
                gl.bind_texture(self.texture);
                gl.draw_texture(r.position.x, r.position.y, r.position.z, r.width(), r.height());
            }
            Some(grid) => {
                gl.bind_texture(self.texture);
                gl.push_matrix();
                gl.load_identity();
                gl.translate(r.position.x, r.position.y, r.position.z);

                grid.draw(gl, true, false);

                gl.pop_matrix();
            }
        }
        Ok(())
    }

    /// Moves the mesh (if any) into buffer objects.
    pub fn generate_hardware_buffers(
        &mut self,
        gl: &mut (impl GlContext + ?Sized),
    ) -> Result<(), SpriteError> {
        if let Some(grid) = self.grid.as_mut() {
            grid.generate_hardware_buffers(gl)?;
        }
        Ok(())
    }

    pub fn release_hardware_buffers(&mut self, gl: &mut (impl GlContext + ?Sized)) {
        if let Some(grid) = self.grid.as_mut() {
            grid.release_hardware_buffers(gl);
        }
    }

    /// Drops every handle tied to the lost context.
    ///
    /// The texture must be re-created from `resource_id` and set again with
    /// [`set_texture`](Self::set_texture); buffers regenerate on demand.
    pub fn on_context_lost(&mut self) {
        self.texture = TextureId::NONE;
        if let Some(grid) = self.grid.as_mut() {
            grid.invalidate_hardware_buffers();
        }
    }
}

/// Builds the 2×2 mesh for a `width × height` sprite anchored at its
/// bottom-left corner, with the image upright.
pub fn quad_grid(
    width: f32,
    height: f32,
    representation: Representation,
    capabilities: Capabilities,
) -> Result<Grid, GridError> {
    let mut grid = Grid::new(2, 2, representation, capabilities)?;
    grid.set(0, 0, 0.0, 0.0, 0.0, 0.0, 1.0, None)?;
    grid.set(1, 0, width, 0.0, 0.0, 1.0, 1.0, None)?;
    grid.set(0, 1, 0.0, height, 0.0, 0.0, 0.0, None)?;
    grid.set(1, 1, width, height, 0.0, 1.0, 0.0, None)?;
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};

    use super::*;
    use crate::gl::{GlCall, RecordingGl};
    use crate::mesh::AttribSlice;

    fn placed(sprite: Sprite) -> Sprite {
        sprite.with_renderable(Renderable::new(Vec3::new(10.0, 20.0, 0.0), Vec2::new(64.0, 32.0)))
    }

    #[test]
    fn blit_path_uses_position_and_size() {
        let mut sprite = placed(Sprite::new(7, Capabilities::all()));
        sprite.set_texture(TextureId(3));
        let mut gl = RecordingGl::default();

        sprite.draw(&mut gl).unwrap();

        assert_eq!(
            gl.calls(),
            &[
                GlCall::BindTexture(TextureId(3)),
                GlCall::DrawTexture {
                    x: 10.0,
                    y: 20.0,
                    z: 0.0,
                    width: 64.0,
                    height: 32.0
                },
            ]
        );
    }

    #[test]
    fn blit_without_capability_fails() {
        let caps = Capabilities {
            vertex_buffer_objects: true,
            draw_texture: false,
        };
        let sprite = placed(Sprite::new(7, caps));
        let mut gl = RecordingGl::new(caps);

        let err = sprite.draw(&mut gl).unwrap_err();
        assert_eq!(err, SpriteError::DrawTextureUnsupported { resource_id: 7 });
        assert_eq!(gl.draw_count(), 0);
    }

    #[test]
    fn mesh_path_wraps_grid_draw_in_transform() {
        let caps = Capabilities::core();
        let grid = quad_grid(64.0, 32.0, Representation::Float, caps).unwrap();
        let mut sprite = placed(Sprite::new(1, caps)).with_grid(grid);
        sprite.set_texture(TextureId(9));
        let mut gl = RecordingGl::new(caps);

        sprite.draw(&mut gl).unwrap();

        let calls = gl.calls();
        assert_eq!(calls[0], GlCall::BindTexture(TextureId(9)));
        assert_eq!(calls[1], GlCall::PushMatrix);
        assert_eq!(calls[2], GlCall::LoadIdentity);
        assert_eq!(calls[3], GlCall::Translate(10.0, 20.0, 0.0));
        assert!(matches!(calls[4], GlCall::VertexPointer { .. }));
        assert!(matches!(calls[5], GlCall::TexCoordPointer { .. }));
        assert!(matches!(calls[6], GlCall::DrawElements { count: 6, .. }));
        assert_eq!(calls[7], GlCall::PopMatrix);
        assert_eq!(calls.len(), 8);
        assert_eq!(gl.matrix_depth(), 0);
    }

    #[test]
    fn mesh_path_ignores_missing_blit_support() {
        let caps = Capabilities::core();
        let grid = quad_grid(8.0, 8.0, Representation::Fixed, caps).unwrap();
        let sprite = Sprite::new(2, caps).with_grid(grid);
        let mut gl = RecordingGl::new(caps);

        sprite.draw(&mut gl).unwrap();
        assert_eq!(gl.take_error(), None);
    }

    #[test]
    fn quad_grid_layout() {
        let grid = quad_grid(64.0, 32.0, Representation::Float, Capabilities::all()).unwrap();
        let AttribSlice::Float(pos) = grid.positions() else { panic!("float grid") };
        assert_eq!(
            pos,
            &[0.0, 0.0, 0.0, 64.0, 0.0, 0.0, 0.0, 32.0, 0.0, 64.0, 32.0, 0.0]
        );
        let AttribSlice::Float(uv) = grid.tex_coords() else { panic!("float grid") };
        assert_eq!(uv, &[0.0, 1.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn context_loss_drops_handles() {
        let caps = Capabilities::all();
        let grid = quad_grid(4.0, 4.0, Representation::Float, caps).unwrap();
        let mut sprite = Sprite::new(5, caps).with_grid(grid);
        sprite.set_texture(TextureId(2));
        let mut gl = RecordingGl::new(caps);
        sprite.generate_hardware_buffers(&mut gl).unwrap();
        assert!(sprite.grid().is_some_and(Grid::using_hardware_buffers));

        sprite.on_context_lost();

        assert!(sprite.texture().is_none());
        assert!(!sprite.grid().is_some_and(Grid::using_hardware_buffers));
        assert_eq!(sprite.resource_id(), 5);
    }

    #[test]
    fn release_deletes_grid_buffers() {
        let caps = Capabilities::all();
        let grid = quad_grid(4.0, 4.0, Representation::Float, caps).unwrap();
        let mut sprite = Sprite::new(5, caps).with_grid(grid);
        let mut gl = RecordingGl::new(caps);
        sprite.generate_hardware_buffers(&mut gl).unwrap();

        sprite.release_hardware_buffers(&mut gl);
        assert_eq!(gl.live_buffer_count(), 0);
    }
}
