use std::collections::{HashMap, VecDeque};

use super::{
    AttribSource, BufferId, BufferTarget, BufferUsage, Capabilities, ClientArray, CoordType,
    GlContext, GlErrorCode, IndexSource, TextureId,
};

/// One recorded context call.
///
/// Client-memory payloads are summarized (`client_len`) except for indices,
/// which are copied so draw layouts can be inspected after the fact.
#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    BindTexture(TextureId),
    SetTexturing(bool),
    EnableClientState(ClientArray),
    DisableClientState(ClientArray),
    VertexPointer { size: usize, ty: CoordType, source: RecordedSource },
    TexCoordPointer { size: usize, ty: CoordType, source: RecordedSource },
    ColorPointer { size: usize, ty: CoordType, source: RecordedSource },
    DrawElements { count: usize, indices: RecordedIndices },
    PushMatrix,
    PopMatrix,
    LoadIdentity,
    Translate(f32, f32, f32),
    GenBuffer(u32),
    BindBuffer(BufferTarget, Option<BufferId>),
    BufferData { target: BufferTarget, len: usize, usage: BufferUsage },
    DeleteBuffer(BufferId),
    DrawTexture { x: f32, y: f32, z: f32, width: f32, height: f32 },
}

/// Attribute pointer source as it was resolved at call time.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedSource {
    Client { len: usize },
    Bound { buffer: Option<BufferId>, offset: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedIndices {
    Client(Vec<u16>),
    Bound { buffer: Option<BufferId>, offset: usize },
}

/// Headless context that records every call.
///
/// Buffer objects are emulated in memory so uploads can be verified. Failure
/// injection hooks (`fail_buffer_allocation_after`, `inject_error`) exercise
/// the resource-error paths of callers.
#[derive(Debug)]
pub struct RecordingGl {
    capabilities: Capabilities,
    calls: Vec<GlCall>,
    errors: VecDeque<GlErrorCode>,

    next_buffer: u32,
    buffers: HashMap<BufferId, Vec<u8>>,
    bound_array: Option<BufferId>,
    bound_element: Option<BufferId>,
    allocations_left: Option<usize>,

    matrix_depth: usize,
    texturing: bool,
    bound_texture: TextureId,
}

impl RecordingGl {
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            calls: Vec::new(),
            errors: VecDeque::new(),
            next_buffer: 1,
            buffers: HashMap::new(),
            bound_array: None,
            bound_element: None,
            allocations_left: None,
            matrix_depth: 0,
            texturing: false,
            bound_texture: TextureId::NONE,
        }
    }

    pub fn calls(&self) -> &[GlCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Number of `DrawElements` and `DrawTexture` calls recorded.
    pub fn draw_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, GlCall::DrawElements { .. } | GlCall::DrawTexture { .. }))
            .count()
    }

    /// Current contents of a live buffer object.
    pub fn buffer_contents(&self, buffer: BufferId) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(Vec::as_slice)
    }

    pub fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn bound_buffer(&self, target: BufferTarget) -> Option<BufferId> {
        match target {
            BufferTarget::Array => self.bound_array,
            BufferTarget::ElementArray => self.bound_element,
        }
    }

    /// Depth of the model-view stack above the base matrix.
    pub fn matrix_depth(&self) -> usize {
        self.matrix_depth
    }

    pub fn texturing(&self) -> bool {
        self.texturing
    }

    pub fn bound_texture(&self) -> TextureId {
        self.bound_texture
    }

    /// After `n` more successful allocations, `gen_buffer` returns `0`.
    pub fn fail_buffer_allocation_after(&mut self, n: usize) {
        self.allocations_left = Some(n);
    }

    /// Queues an error to be reported by the next `take_error`.
    pub fn inject_error(&mut self, code: GlErrorCode) {
        self.errors.push_back(code);
    }

    /// Forgets every buffer object without recording deletes, as if the
    /// underlying context had been destroyed.
    pub fn lose_context(&mut self) {
        self.buffers.clear();
        self.bound_array = None;
        self.bound_element = None;
        self.bound_texture = TextureId::NONE;
        self.matrix_depth = 0;
        log::debug!("recording context: context lost");
    }

    fn record_error(&mut self, code: GlErrorCode) {
        self.errors.push_back(code);
    }

    fn require_vbo(&mut self) -> bool {
        if !self.capabilities.vertex_buffer_objects {
            self.record_error(GlErrorCode::InvalidOperation);
            return false;
        }
        true
    }

    fn resolve(&self, source: AttribSource<'_>) -> RecordedSource {
        match source {
            AttribSource::Client(bytes) => RecordedSource::Client { len: bytes.len() },
            AttribSource::Bound { offset } => RecordedSource::Bound {
                buffer: self.bound_array,
                offset,
            },
        }
    }
}

impl Default for RecordingGl {
    fn default() -> Self {
        Self::new(Capabilities::all())
    }
}

impl GlContext for RecordingGl {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn bind_texture(&mut self, texture: TextureId) {
        self.bound_texture = texture;
        self.calls.push(GlCall::BindTexture(texture));
    }

    fn set_texturing(&mut self, enabled: bool) {
        self.texturing = enabled;
        self.calls.push(GlCall::SetTexturing(enabled));
    }

    fn enable_client_state(&mut self, array: ClientArray) {
        self.calls.push(GlCall::EnableClientState(array));
    }

    fn disable_client_state(&mut self, array: ClientArray) {
        self.calls.push(GlCall::DisableClientState(array));
    }

    fn vertex_pointer(&mut self, size: usize, ty: CoordType, source: AttribSource<'_>) {
        let source = self.resolve(source);
        self.calls.push(GlCall::VertexPointer { size, ty, source });
    }

    fn tex_coord_pointer(&mut self, size: usize, ty: CoordType, source: AttribSource<'_>) {
        let source = self.resolve(source);
        self.calls.push(GlCall::TexCoordPointer { size, ty, source });
    }

    fn color_pointer(&mut self, size: usize, ty: CoordType, source: AttribSource<'_>) {
        let source = self.resolve(source);
        self.calls.push(GlCall::ColorPointer { size, ty, source });
    }

    fn draw_elements(&mut self, count: usize, indices: IndexSource<'_>) {
        let indices = match indices {
            IndexSource::Client(idx) => {
                if idx.len() < count {
                    self.record_error(GlErrorCode::InvalidValue);
                }
                RecordedIndices::Client(idx.to_vec())
            }
            IndexSource::Bound { offset } => RecordedIndices::Bound {
                buffer: self.bound_element,
                offset,
            },
        };
        self.calls.push(GlCall::DrawElements { count, indices });
    }

    fn push_matrix(&mut self) {
        self.matrix_depth += 1;
        self.calls.push(GlCall::PushMatrix);
    }

    fn pop_matrix(&mut self) {
        match self.matrix_depth.checked_sub(1) {
            Some(depth) => self.matrix_depth = depth,
            None => self.record_error(GlErrorCode::InvalidOperation),
        }
        self.calls.push(GlCall::PopMatrix);
    }

    fn load_identity(&mut self) {
        self.calls.push(GlCall::LoadIdentity);
    }

    fn translate(&mut self, x: f32, y: f32, z: f32) {
        self.calls.push(GlCall::Translate(x, y, z));
    }

    fn gen_buffer(&mut self) -> u32 {
        if !self.require_vbo() {
            self.calls.push(GlCall::GenBuffer(0));
            return 0;
        }

        if let Some(left) = self.allocations_left.as_mut() {
            if *left == 0 {
                self.record_error(GlErrorCode::OutOfMemory);
                self.calls.push(GlCall::GenBuffer(0));
                return 0;
            }
            *left -= 1;
        }

        let raw = self.next_buffer;
        self.next_buffer += 1;
        if let Some(id) = BufferId::new(raw) {
            self.buffers.insert(id, Vec::new());
        }
        self.calls.push(GlCall::GenBuffer(raw));
        raw
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferId>) {
        if self.require_vbo() {
            if buffer.is_some_and(|b| !self.buffers.contains_key(&b)) {
                self.record_error(GlErrorCode::InvalidOperation);
            } else {
                match target {
                    BufferTarget::Array => self.bound_array = buffer,
                    BufferTarget::ElementArray => self.bound_element = buffer,
                }
            }
        }
        self.calls.push(GlCall::BindBuffer(target, buffer));
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        if self.require_vbo() {
            match self.bound_buffer(target).and_then(|b| self.buffers.get_mut(&b)) {
                Some(contents) => *contents = data.to_vec(),
                None => self.record_error(GlErrorCode::InvalidOperation),
            }
        }
        self.calls.push(GlCall::BufferData {
            target,
            len: data.len(),
            usage,
        });
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if self.require_vbo() && self.buffers.remove(&buffer).is_some() {
            if self.bound_array == Some(buffer) {
                self.bound_array = None;
            }
            if self.bound_element == Some(buffer) {
                self.bound_element = None;
            }
        }
        self.calls.push(GlCall::DeleteBuffer(buffer));
    }

    fn draw_texture(&mut self, x: f32, y: f32, z: f32, width: f32, height: f32) {
        if !self.capabilities.draw_texture {
            self.record_error(GlErrorCode::InvalidOperation);
        }
        self.calls.push(GlCall::DrawTexture {
            x,
            y,
            z,
            width,
            height,
        });
    }

    fn take_error(&mut self) -> Option<GlErrorCode> {
        self.errors.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffers_are_emulated_in_memory() {
        let mut gl = RecordingGl::default();
        let raw = gl.gen_buffer();
        let id = BufferId::new(raw).unwrap();

        gl.bind_buffer(BufferTarget::Array, Some(id));
        gl.buffer_data(BufferTarget::Array, &[1, 2, 3], BufferUsage::StaticDraw);

        assert_eq!(gl.buffer_contents(id), Some(&[1u8, 2, 3][..]));
        assert_eq!(gl.take_error(), None);

        gl.delete_buffer(id);
        assert_eq!(gl.live_buffer_count(), 0);
        assert_eq!(gl.bound_buffer(BufferTarget::Array), None);
    }

    #[test]
    fn buffer_calls_without_capability_record_errors() {
        let mut gl = RecordingGl::new(Capabilities::core());
        assert_eq!(gl.gen_buffer(), 0);
        assert_eq!(gl.take_error(), Some(GlErrorCode::InvalidOperation));
    }

    #[test]
    fn allocation_failure_injection() {
        let mut gl = RecordingGl::default();
        gl.fail_buffer_allocation_after(1);
        assert_ne!(gl.gen_buffer(), 0);
        assert_eq!(gl.gen_buffer(), 0);
        assert_eq!(gl.take_error(), Some(GlErrorCode::OutOfMemory));
    }

    #[test]
    fn pop_on_empty_stack_is_an_error() {
        let mut gl = RecordingGl::default();
        gl.push_matrix();
        gl.pop_matrix();
        assert_eq!(gl.take_error(), None);
        gl.pop_matrix();
        assert_eq!(gl.take_error(), Some(GlErrorCode::InvalidOperation));
    }

    #[test]
    fn pointer_records_bound_buffer() {
        let mut gl = RecordingGl::default();
        let id = BufferId::new(gl.gen_buffer()).unwrap();
        gl.bind_buffer(BufferTarget::Array, Some(id));
        gl.vertex_pointer(3, CoordType::Float, AttribSource::Bound { offset: 0 });

        assert_eq!(
            gl.calls().last(),
            Some(&GlCall::VertexPointer {
                size: 3,
                ty: CoordType::Float,
                source: RecordedSource::Bound {
                    buffer: Some(id),
                    offset: 0
                },
            })
        );
    }
}
