use std::collections::{HashMap, VecDeque};

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use crate::gl::{
    AttribSource, BufferId, BufferTarget, BufferUsage, Capabilities, ClientArray, CoordType,
    GlContext, GlErrorCode, IndexSource, TextureId,
};
use crate::mesh::fixed::from_fixed;

/// Vertex as consumed by the sprite pipeline. Positions are already in clip
/// space; the transform stack is applied on the CPU.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(super) struct SpriteVertex {
    pub position: [f32; 4],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl SpriteVertex {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x4, // clip position
        1 => Float32x2, // uv
        2 => Float32x4  // color
    ];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpriteVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// One indexed draw inside a batch.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(super) struct DrawRange {
    /// `TextureId::NONE` samples the white texture.
    pub texture: TextureId,
    pub first_index: u32,
    pub index_count: u32,
    pub base_vertex: i32,
}

/// Geometry accumulated between two flushes.
#[derive(Debug, Default)]
pub(super) struct Batch {
    pub vertices: Vec<SpriteVertex>,
    pub indices: Vec<u16>,
    pub draws: Vec<DrawRange>,
}

impl Batch {
    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.draws.clear();
    }

    fn push(&mut self, texture: TextureId, vertices: &[SpriteVertex], indices: &[u16]) {
        let base_vertex = self.vertices.len() as i32;
        let first_index = self.indices.len() as u32;
        self.vertices.extend_from_slice(vertices);
        self.indices.extend_from_slice(indices);
        self.draws.push(DrawRange {
            texture,
            first_index,
            index_count: indices.len() as u32,
            base_vertex,
        });
    }
}

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const BLIT_INDICES: [u16; 6] = [0, 1, 2, 1, 2, 3];

#[derive(Debug, Clone)]
enum PointerData {
    Client(Vec<u8>),
    Bound { buffer: BufferId, offset: usize },
}

#[derive(Debug, Clone)]
struct Pointer {
    size: usize,
    ty: CoordType,
    data: PointerData,
}

#[derive(Debug, Copy, Clone, Default)]
struct EnabledArrays {
    vertex: bool,
    tex_coord: bool,
    color: bool,
}

/// Client-side half of the wgpu context.
///
/// Interprets the fixed-function call stream: shadows buffer objects, tracks
/// pointers, matrices and texturing state, and turns each draw into clip-space
/// vertices appended to a [`Batch`]. Holds no GPU resources.
#[derive(Debug)]
pub(super) struct FixedFunction {
    capabilities: Capabilities,
    errors: VecDeque<GlErrorCode>,

    next_buffer: u32,
    buffers: HashMap<BufferId, Vec<u8>>,
    bound_array: Option<BufferId>,
    bound_element: Option<BufferId>,

    arrays: EnabledArrays,
    vertex: Option<Pointer>,
    tex_coord: Option<Pointer>,
    color: Option<Pointer>,

    texturing: bool,
    bound_texture: TextureId,

    model_view: Mat4,
    stack: Vec<Mat4>,
    projection: Mat4,

    batch: Batch,
}

impl FixedFunction {
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            errors: VecDeque::new(),
            next_buffer: 1,
            buffers: HashMap::new(),
            bound_array: None,
            bound_element: None,
            arrays: EnabledArrays::default(),
            vertex: None,
            tex_coord: None,
            color: None,
            texturing: false,
            bound_texture: TextureId::NONE,
            model_view: Mat4::IDENTITY,
            stack: Vec::new(),
            projection: Mat4::IDENTITY,
            batch: Batch::default(),
        }
    }

    /// Window-space projection: origin at the bottom-left, one unit per pixel.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.projection =
            Mat4::orthographic_rh(0.0, width.max(1) as f32, 0.0, height.max(1) as f32, -1.0, 1.0);
    }

    #[cfg(test)]
    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    pub fn take_batch(&mut self) -> Batch {
        std::mem::take(&mut self.batch)
    }

    /// Gives back a flushed batch so its allocations are reused.
    pub fn recycle(&mut self, mut batch: Batch) {
        if self.batch.is_empty() {
            batch.clear();
            self.batch = batch;
        }
    }

    pub fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Forgets every buffer object, as a lost context would.
    pub fn drop_buffers(&mut self) {
        self.buffers.clear();
        self.bound_array = None;
        self.bound_element = None;
        self.vertex = None;
        self.tex_coord = None;
        self.color = None;
    }

    pub(super) fn record_error(&mut self, code: GlErrorCode) {
        log::trace!("wgpu gl error: {code}");
        self.errors.push_back(code);
    }

    fn pointer(
        &mut self,
        sizes: std::ops::RangeInclusive<usize>,
        size: usize,
        ty: CoordType,
        source: AttribSource<'_>,
    ) -> Option<Pointer> {
        if !sizes.contains(&size) {
            self.record_error(GlErrorCode::InvalidValue);
            return None;
        }
        let data = match source {
            AttribSource::Client(bytes) => PointerData::Client(bytes.to_vec()),
            AttribSource::Bound { offset } => match self.bound_array {
                Some(buffer) => PointerData::Bound { buffer, offset },
                None => {
                    self.record_error(GlErrorCode::InvalidOperation);
                    return None;
                }
            },
        };
        Some(Pointer { size, ty, data })
    }

    /// Reads the attribute as floats, `size` per vertex.
    fn components(&self, pointer: &Pointer) -> Result<Vec<f32>, GlErrorCode> {
        let bytes: &[u8] = match &pointer.data {
            PointerData::Client(bytes) => bytes,
            PointerData::Bound { buffer, offset } => {
                let data = self
                    .buffers
                    .get(buffer)
                    .ok_or(GlErrorCode::InvalidOperation)?;
                data.get(*offset..).ok_or(GlErrorCode::InvalidValue)?
            }
        };

        let words = bytes.chunks_exact(pointer.ty.size_bytes());
        Ok(match pointer.ty {
            CoordType::Float => words.map(bytemuck::pod_read_unaligned::<f32>).collect(),
            CoordType::Fixed => words
                .map(|w| from_fixed(bytemuck::pod_read_unaligned::<i32>(w)))
                .collect(),
        })
    }

    fn index_data(&self, count: usize, source: IndexSource<'_>) -> Result<Vec<u16>, GlErrorCode> {
        match source {
            IndexSource::Client(indices) => indices
                .get(..count)
                .map(<[u16]>::to_vec)
                .ok_or(GlErrorCode::InvalidValue),
            IndexSource::Bound { offset } => {
                let buffer = self.bound_element.ok_or(GlErrorCode::InvalidOperation)?;
                let data = self
                    .buffers
                    .get(&buffer)
                    .ok_or(GlErrorCode::InvalidOperation)?;
                let bytes = data
                    .get(offset..offset + count * 2)
                    .ok_or(GlErrorCode::InvalidValue)?;
                Ok(bytes
                    .chunks_exact(2)
                    .map(bytemuck::pod_read_unaligned::<u16>)
                    .collect())
            }
        }
    }

    /// Clip-space vertices for every vertex the enabled arrays describe.
    ///
    /// `None` when the vertex array is disabled (nothing is drawn).
    fn assemble(&self, indices: &[u16]) -> Result<Option<Vec<SpriteVertex>>, GlErrorCode> {
        let Some(vertex) = self.vertex.as_ref().filter(|_| self.arrays.vertex) else {
            return Ok(None);
        };
        let positions = self.components(vertex)?;
        let vertex_count = positions.len() / vertex.size;

        if indices.iter().any(|&i| usize::from(i) >= vertex_count) {
            return Err(GlErrorCode::InvalidValue);
        }

        let uvs = match self.tex_coord.as_ref().filter(|_| self.arrays.tex_coord) {
            Some(p) => Some((self.components(p)?, p.size)),
            None => None,
        };
        let colors = match self.color.as_ref().filter(|_| self.arrays.color) {
            Some(p) => Some((self.components(p)?, p.size)),
            None => None,
        };

        let mvp = self.projection * self.model_view;
        let mut out = Vec::with_capacity(vertex_count);
        for v in 0..vertex_count {
            let p = &positions[v * vertex.size..(v + 1) * vertex.size];
            let local = Vec4::new(
                p[0],
                p[1],
                p.get(2).copied().unwrap_or(0.0),
                p.get(3).copied().unwrap_or(1.0),
            );

            // Missing arrays fall back to the current texcoord/color defaults.
            let uv = uvs
                .as_ref()
                .and_then(|(data, size)| data.get(v * size..v * size + 2))
                .map_or([0.0, 0.0], |t| [t[0], t[1]]);
            let color = colors
                .as_ref()
                .and_then(|(data, size)| data.get(v * size..v * size + 4))
                .map_or(WHITE, |c| [c[0], c[1], c[2], c[3]]);

            out.push(SpriteVertex {
                position: (mvp * local).to_array(),
                uv,
                color,
            });
        }
        Ok(Some(out))
    }

    fn current_texture(&self) -> TextureId {
        if self.texturing {
            self.bound_texture
        } else {
            TextureId::NONE
        }
    }

    fn require_vbo(&mut self) -> bool {
        if self.capabilities.vertex_buffer_objects {
            true
        } else {
            self.record_error(GlErrorCode::InvalidOperation);
            false
        }
    }
}

impl GlContext for FixedFunction {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn bind_texture(&mut self, texture: TextureId) {
        self.bound_texture = texture;
    }

    fn set_texturing(&mut self, enabled: bool) {
        self.texturing = enabled;
    }

    fn enable_client_state(&mut self, array: ClientArray) {
        match array {
            ClientArray::Vertex => self.arrays.vertex = true,
            ClientArray::TexCoord => self.arrays.tex_coord = true,
            ClientArray::Color => self.arrays.color = true,
        }
    }

    fn disable_client_state(&mut self, array: ClientArray) {
        match array {
            ClientArray::Vertex => self.arrays.vertex = false,
            ClientArray::TexCoord => self.arrays.tex_coord = false,
            ClientArray::Color => self.arrays.color = false,
        }
    }

    fn vertex_pointer(&mut self, size: usize, ty: CoordType, source: AttribSource<'_>) {
        if let Some(p) = self.pointer(2..=4, size, ty, source) {
            self.vertex = Some(p);
        }
    }

    fn tex_coord_pointer(&mut self, size: usize, ty: CoordType, source: AttribSource<'_>) {
        if let Some(p) = self.pointer(2..=4, size, ty, source) {
            self.tex_coord = Some(p);
        }
    }

    fn color_pointer(&mut self, size: usize, ty: CoordType, source: AttribSource<'_>) {
        if let Some(p) = self.pointer(4..=4, size, ty, source) {
            self.color = Some(p);
        }
    }

    fn draw_elements(&mut self, count: usize, indices: IndexSource<'_>) {
        let index_data = match self.index_data(count, indices) {
            Ok(data) => data,
            Err(code) => return self.record_error(code),
        };
        match self.assemble(&index_data) {
            Ok(Some(vertices)) => {
                let texture = self.current_texture();
                self.batch.push(texture, &vertices, &index_data);
            }
            Ok(None) => {}
            Err(code) => self.record_error(code),
        }
    }

    fn push_matrix(&mut self) {
        self.stack.push(self.model_view);
    }

    fn pop_matrix(&mut self) {
        match self.stack.pop() {
            Some(m) => self.model_view = m,
            None => self.record_error(GlErrorCode::InvalidOperation),
        }
    }

    fn load_identity(&mut self) {
        self.model_view = Mat4::IDENTITY;
    }

    fn translate(&mut self, x: f32, y: f32, z: f32) {
        self.model_view *= Mat4::from_translation(glam::Vec3::new(x, y, z));
    }

    fn gen_buffer(&mut self) -> u32 {
        if !self.require_vbo() {
            return 0;
        }
        let Some(id) = BufferId::new(self.next_buffer) else {
            self.record_error(GlErrorCode::OutOfMemory);
            return 0;
        };
        self.next_buffer = self.next_buffer.wrapping_add(1);
        self.buffers.insert(id, Vec::new());
        id.get()
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferId>) {
        if !self.require_vbo() {
            return;
        }
        if buffer.is_some_and(|b| !self.buffers.contains_key(&b)) {
            return self.record_error(GlErrorCode::InvalidOperation);
        }
        match target {
            BufferTarget::Array => self.bound_array = buffer,
            BufferTarget::ElementArray => self.bound_element = buffer,
        }
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], _usage: BufferUsage) {
        if !self.require_vbo() {
            return;
        }
        let bound = match target {
            BufferTarget::Array => self.bound_array,
            BufferTarget::ElementArray => self.bound_element,
        };
        match bound.and_then(|b| self.buffers.get_mut(&b)) {
            Some(storage) => {
                storage.clear();
                storage.extend_from_slice(data);
            }
            None => self.record_error(GlErrorCode::InvalidOperation),
        }
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if !self.require_vbo() {
            return;
        }
        self.buffers.remove(&buffer);
        if self.bound_array == Some(buffer) {
            self.bound_array = None;
        }
        if self.bound_element == Some(buffer) {
            self.bound_element = None;
        }
    }

    fn draw_texture(&mut self, x: f32, y: f32, z: f32, width: f32, height: f32) {
        if !self.capabilities.draw_texture {
            return self.record_error(GlErrorCode::InvalidOperation);
        }
        if width <= 0.0 || height <= 0.0 {
            return self.record_error(GlErrorCode::InvalidValue);
        }

        // Window coordinates: the model-view stack does not apply.
        let corner = |px: f32, py: f32, u: f32, v: f32| SpriteVertex {
            position: (self.projection * Vec4::new(px, py, z, 1.0)).to_array(),
            uv: [u, v],
            color: WHITE,
        };
        let quad = [
            corner(x, y, 0.0, 1.0),
            corner(x + width, y, 1.0, 1.0),
            corner(x, y + height, 0.0, 0.0),
            corner(x + width, y + height, 1.0, 0.0),
        ];
        let texture = self.bound_texture;
        self.batch.push(texture, &quad, &BLIT_INDICES);
    }

    fn take_error(&mut self) -> Option<GlErrorCode> {
        self.errors.pop_front()
    }
}
