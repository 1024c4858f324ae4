use super::{
    AttribSource, BufferId, BufferTarget, BufferUsage, Capabilities, ClientArray, CoordType,
    GlErrorCode, IndexSource, TextureId,
};

/// Fixed-function graphics command surface.
///
/// Mirrors the subset of an OpenGL ES 1.x context used by grids and sprites.
/// Implementations are owned by the render thread; nothing here is expected to
/// be callable from another thread.
///
/// Calls that depend on an optional feature (`Capabilities`) must not be issued
/// when the feature is absent. Implementations record `InvalidOperation` when
/// they are.
pub trait GlContext {
    /// Features supported by this context.
    fn capabilities(&self) -> Capabilities;

    /// Binds a 2D texture for subsequent draws.
    fn bind_texture(&mut self, texture: TextureId);

    /// Enables or disables 2D texturing.
    fn set_texturing(&mut self, enabled: bool);

    fn enable_client_state(&mut self, array: ClientArray);
    fn disable_client_state(&mut self, array: ClientArray);

    /// Positions: `size` components per vertex, tightly packed.
    fn vertex_pointer(&mut self, size: usize, ty: CoordType, source: AttribSource<'_>);
    fn tex_coord_pointer(&mut self, size: usize, ty: CoordType, source: AttribSource<'_>);
    fn color_pointer(&mut self, size: usize, ty: CoordType, source: AttribSource<'_>);

    /// Draws `count` `u16` indices as a triangle list.
    fn draw_elements(&mut self, count: usize, indices: IndexSource<'_>);

    fn push_matrix(&mut self);
    fn pop_matrix(&mut self);
    fn load_identity(&mut self);
    fn translate(&mut self, x: f32, y: f32, z: f32);

    /// Allocates a buffer name. Returns `0` on failure.
    fn gen_buffer(&mut self) -> u32;

    /// Binds `buffer` to `target`; `None` unbinds.
    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferId>);

    /// Replaces the contents of the buffer bound to `target`.
    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage);

    fn delete_buffer(&mut self, buffer: BufferId);

    /// Blits the bound texture to window coordinates (draw-texture extension).
    fn draw_texture(&mut self, x: f32, y: f32, z: f32, width: f32, height: f32);

    /// Returns and clears the oldest pending error, if any.
    fn take_error(&mut self) -> Option<GlErrorCode>;
}
