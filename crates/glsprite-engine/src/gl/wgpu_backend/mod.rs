//! `GlContext` on top of wgpu.
//!
//! Calls are interpreted on the CPU (`FixedFunction`) into a batch of
//! clip-space triangles; [`WgpuGl::flush`] uploads the batch and replays it in
//! one render pass, one indexed draw per original draw call.

mod fixed_function;
mod pipeline;

use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::gl::{
    AttribSource, BufferId, BufferTarget, BufferUsage, Capabilities, ClientArray, CoordType,
    GlContext, GlErrorCode, IndexSource, TextureId,
};
use crate::render::RenderTarget;

use fixed_function::FixedFunction;
use pipeline::SpritePipeline;

struct GpuTexture {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// Fixed-function context rendering through a wgpu device.
///
/// Buffer objects are shadowed in client memory; vertex data is gathered per
/// draw, so uploads never stall the GPU. Textures are real wgpu textures.
pub struct WgpuGl {
    device: wgpu::Device,
    queue: wgpu::Queue,

    state: FixedFunction,
    pipeline: SpritePipeline,

    textures: HashMap<TextureId, GpuTexture>,
    next_texture: u32,
    white: GpuTexture,

    warned_missing_texture: bool,
}

impl WgpuGl {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        capabilities: Capabilities,
    ) -> Self {
        let pipeline = SpritePipeline::new(device, surface_format);
        let white = upload_rgba8(device, queue, &pipeline, 1, 1, &[255; 4]);

        log::debug!("wgpu gl context created ({capabilities:?}, {surface_format:?})");

        Self {
            device: device.clone(),
            queue: queue.clone(),
            state: FixedFunction::new(capabilities),
            pipeline,
            textures: HashMap::new(),
            next_texture: 1,
            white,
            warned_missing_texture: false,
        }
    }

    /// Creates a texture from tightly packed RGBA8 rows, top row first.
    pub fn create_texture_rgba8(
        &mut self,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<TextureId, GlErrorCode> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            self.state.record_error(GlErrorCode::InvalidValue);
            return Err(GlErrorCode::InvalidValue);
        }

        let id = TextureId(self.next_texture);
        self.next_texture = self.next_texture.wrapping_add(1).max(1);

        let texture = upload_rgba8(&self.device, &self.queue, &self.pipeline, width, height, pixels);
        self.textures.insert(id, texture);
        Ok(id)
    }

    /// Sets the window size the fixed-function coordinates map onto.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.state.set_viewport(width, height);
    }

    /// Drops every texture and buffer object, as a platform context loss does.
    ///
    /// Callers must regenerate their resources afterwards.
    pub fn lose_context(&mut self) {
        log::debug!(
            "wgpu gl context lost ({} textures, {} buffers)",
            self.textures.len(),
            self.state.live_buffer_count()
        );
        self.textures.clear();
        self.state.drop_buffers();
        self.state.take_batch();
    }

    /// Replays pending draws into `target`, on top of its current contents.
    pub fn flush(&mut self, target: &mut RenderTarget<'_>) {
        let batch = self.state.take_batch();
        if batch.is_empty() {
            self.state.recycle(batch);
            return;
        }

        let vertex_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("glsprite batch vbo"),
            contents: bytemuck::cast_slice(&batch.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("glsprite batch ibo"),
            contents: bytemuck::cast_slice(&batch.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let mut missing_texture = false;
        {
            let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("glsprite sprite pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_pipeline(&self.pipeline.pipeline);
            rpass.set_vertex_buffer(0, vertex_buffer.slice(..));
            rpass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint16);

            for draw in &batch.draws {
                let texture = match self.textures.get(&draw.texture) {
                    Some(t) => t,
                    None => {
                        missing_texture |= !draw.texture.is_none();
                        &self.white
                    }
                };
                rpass.set_bind_group(0, &texture.bind_group, &[]);

                let indices = draw.first_index..draw.first_index + draw.index_count;
                rpass.draw_indexed(indices, draw.base_vertex, 0..1);
            }
        }

        if missing_texture && !self.warned_missing_texture {
            log::warn!("draw referenced an unknown texture; drawing untextured");
            self.warned_missing_texture = true;
        }

        self.state.recycle(batch);
    }
}

fn upload_rgba8(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    pipeline: &SpritePipeline,
    width: u32,
    height: u32,
    pixels: &[u8],
) -> GpuTexture {
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("glsprite texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * 4),
            rows_per_image: Some(height),
        },
        size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = pipeline.bind_texture(device, &view);

    GpuTexture {
        _texture: texture,
        bind_group,
    }
}

impl GlContext for WgpuGl {
    fn capabilities(&self) -> Capabilities {
        self.state.capabilities()
    }

    fn bind_texture(&mut self, texture: TextureId) {
        self.state.bind_texture(texture);
    }

    fn set_texturing(&mut self, enabled: bool) {
        self.state.set_texturing(enabled);
    }

    fn enable_client_state(&mut self, array: ClientArray) {
        self.state.enable_client_state(array);
    }

    fn disable_client_state(&mut self, array: ClientArray) {
        self.state.disable_client_state(array);
    }

    fn vertex_pointer(&mut self, size: usize, ty: CoordType, source: AttribSource<'_>) {
        self.state.vertex_pointer(size, ty, source);
    }

    fn tex_coord_pointer(&mut self, size: usize, ty: CoordType, source: AttribSource<'_>) {
        self.state.tex_coord_pointer(size, ty, source);
    }

    fn color_pointer(&mut self, size: usize, ty: CoordType, source: AttribSource<'_>) {
        self.state.color_pointer(size, ty, source);
    }

    fn draw_elements(&mut self, count: usize, indices: IndexSource<'_>) {
        self.state.draw_elements(count, indices);
    }

    fn push_matrix(&mut self) {
        self.state.push_matrix();
    }

    fn pop_matrix(&mut self) {
        self.state.pop_matrix();
    }

    fn load_identity(&mut self) {
        self.state.load_identity();
    }

    fn translate(&mut self, x: f32, y: f32, z: f32) {
        self.state.translate(x, y, z);
    }

    fn gen_buffer(&mut self) -> u32 {
        self.state.gen_buffer()
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferId>) {
        self.state.bind_buffer(target, buffer);
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        self.state.buffer_data(target, data, usage);
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.state.delete_buffer(buffer);
    }

    fn draw_texture(&mut self, x: f32, y: f32, z: f32, width: f32, height: f32) {
        self.state.draw_texture(x, y, z, width, height);
    }

    fn take_error(&mut self) -> Option<GlErrorCode> {
        self.state.take_error()
    }
}
