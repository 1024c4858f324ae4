use crate::gl::{
    AttribSource, BufferId, BufferTarget, BufferUsage, Capabilities, ClientArray, CoordType,
    GlContext, IndexSource,
};

use super::fixed::to_fixed;
use super::{GridError, ResourceFailure};

/// Upper bound (exclusive) for each dimension and for the vertex count.
///
/// Indices are `u16`, so every vertex must be addressable by one.
pub const MAX_VERTICES: usize = 1 << 16;

const POSITION_COMPONENTS: usize = 3;
const TEX_COORD_COMPONENTS: usize = 2;
const COLOR_COMPONENTS: usize = 4;

/// Numeric representation of vertex attributes, fixed at construction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Representation {
    Float,
    /// Q16.16 fixed point, for devices without fast floating point.
    Fixed,
}

impl Representation {
    #[inline]
    pub fn coord_type(self) -> CoordType {
        match self {
            Representation::Float => CoordType::Float,
            Representation::Fixed => CoordType::Fixed,
        }
    }
}

/// Borrowed view of one attribute array.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum AttribSlice<'a> {
    Float(&'a [f32]),
    Fixed(&'a [i32]),
}

impl<'a> AttribSlice<'a> {
    pub fn len(&self) -> usize {
        match self {
            AttribSlice::Float(v) => v.len(),
            AttribSlice::Fixed(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw native-endian bytes, as handed to the context.
    pub fn as_bytes(&self) -> &'a [u8] {
        match *self {
            AttribSlice::Float(v) => bytemuck::cast_slice(v),
            AttribSlice::Fixed(v) => bytemuck::cast_slice(v),
        }
    }
}

/// Buffer object names of a grid in hardware mode.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HardwareBuffers {
    pub vertex: BufferId,
    pub tex_coord: BufferId,
    pub color: BufferId,
    pub index: BufferId,
}

#[derive(Debug, Clone)]
struct AttribArrays<T> {
    positions: Vec<T>,
    tex_coords: Vec<T>,
    colors: Vec<T>,
}

impl<T: Copy + Default> AttribArrays<T> {
    fn zeroed(vertex_count: usize) -> Self {
        Self {
            positions: vec![T::default(); vertex_count * POSITION_COMPONENTS],
            tex_coords: vec![T::default(); vertex_count * TEX_COORD_COMPONENTS],
            colors: vec![T::default(); vertex_count * COLOR_COMPONENTS],
        }
    }

    fn write(&mut self, vertex: usize, position: [T; 3], tex_coord: [T; 2], color: Option<[T; 4]>) {
        let p = vertex * POSITION_COMPONENTS;
        self.positions[p..p + POSITION_COMPONENTS].copy_from_slice(&position);

        let t = vertex * TEX_COORD_COMPONENTS;
        self.tex_coords[t..t + TEX_COORD_COMPONENTS].copy_from_slice(&tex_coord);

        if let Some(color) = color {
            let c = vertex * COLOR_COMPONENTS;
            self.colors[c..c + COLOR_COMPONENTS].copy_from_slice(&color);
        }
    }
}

#[derive(Debug, Clone)]
enum Attributes {
    Float(AttribArrays<f32>),
    Fixed(AttribArrays<i32>),
}

/// A 2D rectangular mesh of `vertices_across × vertices_down` vertices.
///
/// Draws textured or untextured, from client memory or from buffer objects.
/// Index layout (two triangles per quad cell, fixed winding):
///
/// ```text
///   [0]-----[  1] ...
///    |    /   |
///    |   /    |
///    |  /     |
///   [w]-----[w+1] ...
///    |       |
/// ```
///
/// Cell `(x, y)` with `a = y*w+x`, `b = a+1`, `c = a+w`, `d = c+1` emits
/// `(a, b, c)` then `(b, c, d)`.
///
/// A grid is owned by the render thread. Buffer names are only meaningful for
/// the context that created them; see [`Grid::invalidate_hardware_buffers`].
#[derive(Debug, Clone)]
pub struct Grid {
    width: usize,
    height: usize,
    attributes: Attributes,
    indices: Vec<u16>,
    capabilities: Capabilities,
    hardware: Option<HardwareBuffers>,
}

impl Grid {
    /// Allocates a zeroed grid and computes its index layout.
    ///
    /// `capabilities` decides whether [`generate_hardware_buffers`](Self::generate_hardware_buffers)
    /// may ever switch to buffer objects.
    pub fn new(
        vertices_across: usize,
        vertices_down: usize,
        representation: Representation,
        capabilities: Capabilities,
    ) -> Result<Self, GridError> {
        if vertices_across >= MAX_VERTICES {
            return Err(GridError::InvalidDimension {
                what: "vertices_across",
                value: vertices_across,
            });
        }
        if vertices_down >= MAX_VERTICES {
            return Err(GridError::InvalidDimension {
                what: "vertices_down",
                value: vertices_down,
            });
        }
        let vertex_count = vertices_across * vertices_down;
        if vertex_count >= MAX_VERTICES {
            return Err(GridError::InvalidDimension {
                what: "vertices_across * vertices_down",
                value: vertex_count,
            });
        }

        let attributes = match representation {
            Representation::Float => Attributes::Float(AttribArrays::zeroed(vertex_count)),
            Representation::Fixed => Attributes::Fixed(AttribArrays::zeroed(vertex_count)),
        };

        Ok(Self {
            width: vertices_across,
            height: vertices_down,
            attributes,
            indices: build_indices(vertices_across, vertices_down),
            capabilities,
            hardware: None,
        })
    }

    #[inline]
    pub fn vertices_across(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn vertices_down(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    pub fn representation(&self) -> Representation {
        match self.attributes {
            Attributes::Float(_) => Representation::Float,
            Attributes::Fixed(_) => Representation::Fixed,
        }
    }

    #[inline]
    pub fn is_fixed_point(&self) -> bool {
        self.representation() == Representation::Fixed
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn positions(&self) -> AttribSlice<'_> {
        match &self.attributes {
            Attributes::Float(a) => AttribSlice::Float(&a.positions),
            Attributes::Fixed(a) => AttribSlice::Fixed(&a.positions),
        }
    }

    pub fn tex_coords(&self) -> AttribSlice<'_> {
        match &self.attributes {
            Attributes::Float(a) => AttribSlice::Float(&a.tex_coords),
            Attributes::Fixed(a) => AttribSlice::Fixed(&a.tex_coords),
        }
    }

    pub fn colors(&self) -> AttribSlice<'_> {
        match &self.attributes {
            Attributes::Float(a) => AttribSlice::Float(&a.colors),
            Attributes::Fixed(a) => AttribSlice::Fixed(&a.colors),
        }
    }

    /// Sets the attributes of vertex `(i, j)`.
    ///
    /// Position and texture coordinate are always written; `color` only when
    /// provided. Fixed-point grids store each value as `(v * 65536) as i32`.
    #[allow(clippy::too_many_arguments)]
    pub fn set(
        &mut self,
        i: usize,
        j: usize,
        x: f32,
        y: f32,
        z: f32,
        u: f32,
        v: f32,
        color: Option<[f32; 4]>,
    ) -> Result<(), GridError> {
        if i >= self.width {
            return Err(GridError::IndexOutOfRange {
                axis: "i",
                index: i,
                limit: self.width,
            });
        }
        if j >= self.height {
            return Err(GridError::IndexOutOfRange {
                axis: "j",
                index: j,
                limit: self.height,
            });
        }

        let vertex = self.width * j + i;
        match &mut self.attributes {
            Attributes::Float(a) => a.write(vertex, [x, y, z], [u, v], color),
            Attributes::Fixed(a) => a.write(
                vertex,
                [to_fixed(x), to_fixed(y), to_fixed(z)],
                [to_fixed(u), to_fixed(v)],
                color.map(|c| c.map(to_fixed)),
            ),
        }
        Ok(())
    }

    /// Issues one indexed triangle-list draw for the whole grid.
    ///
    /// Texture coordinates and colors are only sourced when requested. In
    /// hardware mode the array and element-array bindings are cleared after
    /// the draw.
    pub fn draw(&self, gl: &mut (impl GlContext + ?Sized), use_texture: bool, use_color: bool) {
        let ty = self.representation().coord_type();

        match self.hardware {
            None => {
                gl.vertex_pointer(
                    POSITION_COMPONENTS,
                    ty,
                    AttribSource::Client(self.positions().as_bytes()),
                );

                if use_texture {
                    gl.tex_coord_pointer(
                        TEX_COORD_COMPONENTS,
                        ty,
                        AttribSource::Client(self.tex_coords().as_bytes()),
                    );
                }

                if use_color {
                    gl.color_pointer(
                        COLOR_COMPONENTS,
                        ty,
                        AttribSource::Client(self.colors().as_bytes()),
                    );
                }

                gl.draw_elements(self.indices.len(), IndexSource::Client(&self.indices));
            }
            Some(hw) => {
                let at_start = AttribSource::Bound { offset: 0 };

                gl.bind_buffer(BufferTarget::Array, Some(hw.vertex));
                gl.vertex_pointer(POSITION_COMPONENTS, ty, at_start);

                if use_texture {
                    gl.bind_buffer(BufferTarget::Array, Some(hw.tex_coord));
                    gl.tex_coord_pointer(TEX_COORD_COMPONENTS, ty, at_start);
                }

                if use_color {
                    gl.bind_buffer(BufferTarget::Array, Some(hw.color));
                    gl.color_pointer(COLOR_COMPONENTS, ty, at_start);
                }

                gl.bind_buffer(BufferTarget::ElementArray, Some(hw.index));
                gl.draw_elements(self.indices.len(), IndexSource::Bound { offset: 0 });

                gl.bind_buffer(BufferTarget::Array, None);
                gl.bind_buffer(BufferTarget::ElementArray, None);
            }
        }
    }

    /// Sets up client array and texturing state for a batch of grid draws.
    pub fn begin_drawing(gl: &mut (impl GlContext + ?Sized), use_texture: bool, use_color: bool) {
        gl.enable_client_state(ClientArray::Vertex);

        if use_texture {
            gl.enable_client_state(ClientArray::TexCoord);
            gl.set_texturing(true);
        } else {
            gl.disable_client_state(ClientArray::TexCoord);
            gl.set_texturing(false);
        }

        if use_color {
            gl.enable_client_state(ClientArray::Color);
        } else {
            gl.disable_client_state(ClientArray::Color);
        }
    }

    pub fn end_drawing(gl: &mut (impl GlContext + ?Sized)) {
        gl.disable_client_state(ClientArray::Vertex);
    }

    #[inline]
    pub fn using_hardware_buffers(&self) -> bool {
        self.hardware.is_some()
    }

    pub fn hardware_buffers(&self) -> Option<HardwareBuffers> {
        self.hardware
    }

    pub fn vertex_buffer(&self) -> Option<BufferId> {
        self.hardware.map(|hw| hw.vertex)
    }

    pub fn tex_coord_buffer(&self) -> Option<BufferId> {
        self.hardware.map(|hw| hw.tex_coord)
    }

    pub fn color_buffer(&self) -> Option<BufferId> {
        self.hardware.map(|hw| hw.color)
    }

    pub fn index_buffer(&self) -> Option<BufferId> {
        self.hardware.map(|hw| hw.index)
    }

    /// Allocates buffer objects and uploads the current client data.
    ///
    /// No-op when already in hardware mode or when the context has no buffer
    /// objects. On failure every buffer allocated by this call is deleted and
    /// the grid stays in client mode.
    ///
    /// Attribute data is copied at upload time: later [`set`](Self::set) calls
    /// are not reflected until the buffers are released and regenerated.
    pub fn generate_hardware_buffers(
        &mut self,
        gl: &mut (impl GlContext + ?Sized),
    ) -> Result<(), GridError> {
        if self.hardware.is_some() {
            return Ok(());
        }
        if !self.capabilities.vertex_buffer_objects {
            log::debug!("grid: buffer objects unsupported; staying on client arrays");
            return Ok(());
        }

        let mut allocated = Vec::with_capacity(4);
        match self.upload(gl, &mut allocated) {
            Ok(hw) => {
                log::debug!(
                    "grid {}x{}: hardware buffers generated ({:?})",
                    self.width,
                    self.height,
                    hw
                );
                self.hardware = Some(hw);
                Ok(())
            }
            Err(err) => {
                for id in allocated {
                    gl.delete_buffer(id);
                }
                log::warn!("grid {}x{}: {err}", self.width, self.height);
                Err(err)
            }
        }
    }

    fn upload<G: GlContext + ?Sized>(
        &self,
        gl: &mut G,
        allocated: &mut Vec<BufferId>,
    ) -> Result<HardwareBuffers, GridError> {
        let vertex = upload_buffer(gl, BufferTarget::Array, self.positions().as_bytes(), allocated)?;
        let tex_coord =
            upload_buffer(gl, BufferTarget::Array, self.tex_coords().as_bytes(), allocated)?;
        let color = upload_buffer(gl, BufferTarget::Array, self.colors().as_bytes(), allocated)?;
        gl.bind_buffer(BufferTarget::Array, None);

        let index = upload_buffer(
            gl,
            BufferTarget::ElementArray,
            bytemuck::cast_slice(&self.indices),
            allocated,
        )?;
        gl.bind_buffer(BufferTarget::ElementArray, None);

        // Every queued error is consumed; the first one is reported.
        let mut first = None;
        while let Some(code) = gl.take_error() {
            first.get_or_insert(code);
        }
        if let Some(code) = first {
            return Err(GridError::GraphicsResource(ResourceFailure::Context(code)));
        }

        Ok(HardwareBuffers {
            vertex,
            tex_coord,
            color,
            index,
        })
    }

    /// Forgets buffer names without deleting them.
    ///
    /// Call when the context has been lost: the old names no longer refer to
    /// anything, and the next [`generate_hardware_buffers`](Self::generate_hardware_buffers)
    /// allocates fresh ones.
    pub fn invalidate_hardware_buffers(&mut self) {
        if self.hardware.take().is_some() {
            log::debug!("grid {}x{}: hardware buffers invalidated", self.width, self.height);
        }
    }

    /// Deletes the buffer objects (if any) and returns to client mode.
    pub fn release_hardware_buffers(&mut self, gl: &mut (impl GlContext + ?Sized)) {
        let Some(hw) = self.hardware else { return };

        for id in [hw.vertex, hw.tex_coord, hw.color, hw.index] {
            gl.delete_buffer(id);
        }
        self.invalidate_hardware_buffers();
    }
}

/// Allocates one buffer, binds it to `target` and fills it. The binding is left
/// in place for the caller to clear.
fn upload_buffer<G: GlContext + ?Sized>(
    gl: &mut G,
    target: BufferTarget,
    bytes: &[u8],
    allocated: &mut Vec<BufferId>,
) -> Result<BufferId, GridError> {
    let id = BufferId::new(gl.gen_buffer())
        .ok_or(GridError::GraphicsResource(ResourceFailure::NoBufferName))?;
    allocated.push(id);

    gl.bind_buffer(target, Some(id));
    gl.buffer_data(target, bytes, BufferUsage::StaticDraw);
    Ok(id)
}

fn build_indices(width: usize, height: usize) -> Vec<u16> {
    let quads_across = width.saturating_sub(1);
    let quads_down = height.saturating_sub(1);
    let mut indices = Vec::with_capacity(quads_across * quads_down * 6);

    // Every vertex index is < width * height < 65536, so the casts are lossless.
    for y in 0..quads_down {
        for x in 0..quads_across {
            let a = (y * width + x) as u16;
            let b = (y * width + x + 1) as u16;
            let c = ((y + 1) * width + x) as u16;
            let d = ((y + 1) * width + x + 1) as u16;

            indices.extend_from_slice(&[a, b, c, b, c, d]);
        }
    }

    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::{GlCall, GlErrorCode, RecordedIndices, RecordedSource, RecordingGl};

    fn float_grid(w: usize, h: usize) -> Grid {
        Grid::new(w, h, Representation::Float, Capabilities::all()).unwrap()
    }

    fn fixed_grid(w: usize, h: usize) -> Grid {
        Grid::new(w, h, Representation::Fixed, Capabilities::all()).unwrap()
    }

    // ── construction ──────────────────────────────────────────────────────

    #[test]
    fn two_by_two_is_one_quad() {
        let grid = float_grid(2, 2);
        assert_eq!(grid.indices(), &[0, 1, 2, 1, 2, 3]);
    }

    #[test]
    fn three_by_two_layout() {
        let grid = float_grid(3, 2);
        assert_eq!(grid.indices(), &[0, 1, 3, 1, 3, 4, 1, 2, 4, 2, 4, 5]);
    }

    #[test]
    fn two_by_three_layout() {
        let grid = float_grid(2, 3);
        assert_eq!(grid.indices(), &[0, 1, 2, 1, 2, 3, 2, 3, 4, 3, 4, 5]);
    }

    #[test]
    fn index_count_and_bounds() {
        for (w, h) in [(2, 2), (3, 5), (10, 7), (1, 9), (255, 256), (256, 255)] {
            let grid = float_grid(w, h);
            assert_eq!(grid.index_count(), (w - 1) * (h - 1) * 6, "{w}x{h}");
            let max = (w * h - 1) as u16;
            assert!(grid.indices().iter().all(|&i| i <= max), "{w}x{h}");
        }
    }

    #[test]
    fn degenerate_dimensions_have_no_indices() {
        assert_eq!(float_grid(0, 0).index_count(), 0);
        assert_eq!(float_grid(1, 1).index_count(), 0);
        assert_eq!(float_grid(0, 40).index_count(), 0);
    }

    #[test]
    fn buffers_sized_for_vertex_count() {
        let grid = fixed_grid(4, 3);
        assert_eq!(grid.positions().len(), 12 * 3);
        assert_eq!(grid.tex_coords().len(), 12 * 2);
        assert_eq!(grid.colors().len(), 12 * 4);
        assert!(grid.is_fixed_point());
    }

    #[test]
    fn oversize_dimensions_are_rejected() {
        let err = Grid::new(65536, 1, Representation::Float, Capabilities::all()).unwrap_err();
        assert!(matches!(err, GridError::InvalidDimension { what: "vertices_across", .. }));

        let err = Grid::new(1, 70000, Representation::Float, Capabilities::all()).unwrap_err();
        assert!(matches!(err, GridError::InvalidDimension { what: "vertices_down", .. }));

        let err = Grid::new(256, 256, Representation::Fixed, Capabilities::all()).unwrap_err();
        assert_eq!(
            err,
            GridError::InvalidDimension {
                what: "vertices_across * vertices_down",
                value: 65536
            }
        );
    }

    #[test]
    fn largest_grid_fits_u16() {
        let grid = float_grid(65535, 1);
        assert_eq!(grid.vertex_count(), 65535);
        assert_eq!(grid.index_count(), 0);
    }

    // ── set ───────────────────────────────────────────────────────────────

    #[test]
    fn set_writes_float_attributes() {
        let mut grid = float_grid(2, 2);
        grid.set(1, 1, 1.5, 2.5, 3.5, 0.25, 0.75, Some([0.1, 0.2, 0.3, 0.4]))
            .unwrap();

        let AttribSlice::Float(pos) = grid.positions() else { panic!("float grid") };
        assert_eq!(&pos[9..12], &[1.5, 2.5, 3.5]);
        let AttribSlice::Float(uv) = grid.tex_coords() else { panic!("float grid") };
        assert_eq!(&uv[6..8], &[0.25, 0.75]);
        let AttribSlice::Float(col) = grid.colors() else { panic!("float grid") };
        assert_eq!(&col[12..16], &[0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn set_stores_q16_16_in_fixed_mode() {
        let mut grid = fixed_grid(2, 2);
        grid.set(0, 1, 1.0, -0.5, 2.0, 0.25, 1.0, Some([1.0, 0.5, 0.0, 1.0]))
            .unwrap();

        let AttribSlice::Fixed(pos) = grid.positions() else { panic!("fixed grid") };
        assert_eq!(&pos[6..9], &[65536, -32768, 131072]);
        let AttribSlice::Fixed(uv) = grid.tex_coords() else { panic!("fixed grid") };
        assert_eq!(&uv[4..6], &[16384, 65536]);
        let AttribSlice::Fixed(col) = grid.colors() else { panic!("fixed grid") };
        assert_eq!(&col[8..12], &[65536, 32768, 0, 65536]);
    }

    #[test]
    fn color_is_left_alone_when_absent() {
        let mut grid = float_grid(2, 1);
        grid.set(0, 0, 0.0, 0.0, 0.0, 0.0, 0.0, Some([1.0, 1.0, 1.0, 1.0]))
            .unwrap();
        grid.set(0, 0, 5.0, 5.0, 5.0, 1.0, 1.0, None).unwrap();

        let AttribSlice::Float(col) = grid.colors() else { panic!("float grid") };
        assert_eq!(&col[0..4], &[1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn out_of_range_set_fails_without_mutation() {
        let mut grid = float_grid(3, 2);
        let before = grid.positions().as_bytes().to_vec();

        let err = grid.set(3, 0, 9.0, 9.0, 9.0, 9.0, 9.0, None).unwrap_err();
        assert_eq!(
            err,
            GridError::IndexOutOfRange {
                axis: "i",
                index: 3,
                limit: 3
            }
        );
        let err = grid.set(0, 2, 9.0, 9.0, 9.0, 9.0, 9.0, None).unwrap_err();
        assert!(matches!(err, GridError::IndexOutOfRange { axis: "j", .. }));

        assert_eq!(grid.positions().as_bytes(), &before[..]);
    }

    // ── draw ──────────────────────────────────────────────────────────────

    #[test]
    fn client_draw_sources_memory() {
        let grid = float_grid(2, 2);
        let mut gl = RecordingGl::default();
        grid.draw(&mut gl, true, false);

        assert_eq!(
            gl.calls(),
            &[
                GlCall::VertexPointer {
                    size: 3,
                    ty: CoordType::Float,
                    source: RecordedSource::Client { len: 4 * 3 * 4 }
                },
                GlCall::TexCoordPointer {
                    size: 2,
                    ty: CoordType::Float,
                    source: RecordedSource::Client { len: 4 * 2 * 4 }
                },
                GlCall::DrawElements {
                    count: 6,
                    indices: RecordedIndices::Client(vec![0, 1, 2, 1, 2, 3])
                },
            ]
        );
    }

    #[test]
    fn client_draw_with_color_uses_fixed_type() {
        let grid = fixed_grid(2, 2);
        let mut gl = RecordingGl::default();
        grid.draw(&mut gl, false, true);

        assert!(matches!(
            gl.calls()[1],
            GlCall::ColorPointer {
                size: 4,
                ty: CoordType::Fixed,
                ..
            }
        ));
        assert_eq!(gl.calls().len(), 3);
    }

    #[test]
    fn hardware_draw_binds_each_buffer() {
        let mut grid = float_grid(2, 2);
        let mut gl = RecordingGl::default();
        grid.generate_hardware_buffers(&mut gl).unwrap();
        let hw = grid.hardware_buffers().unwrap();
        gl.clear_calls();

        grid.draw(&mut gl, true, true);

        let bound = |buffer| RecordedSource::Bound {
            buffer: Some(buffer),
            offset: 0,
        };
        assert_eq!(
            gl.calls(),
            &[
                GlCall::BindBuffer(BufferTarget::Array, Some(hw.vertex)),
                GlCall::VertexPointer {
                    size: 3,
                    ty: CoordType::Float,
                    source: bound(hw.vertex)
                },
                GlCall::BindBuffer(BufferTarget::Array, Some(hw.tex_coord)),
                GlCall::TexCoordPointer {
                    size: 2,
                    ty: CoordType::Float,
                    source: bound(hw.tex_coord)
                },
                GlCall::BindBuffer(BufferTarget::Array, Some(hw.color)),
                GlCall::ColorPointer {
                    size: 4,
                    ty: CoordType::Float,
                    source: bound(hw.color)
                },
                GlCall::BindBuffer(BufferTarget::ElementArray, Some(hw.index)),
                GlCall::DrawElements {
                    count: 6,
                    indices: RecordedIndices::Bound {
                        buffer: Some(hw.index),
                        offset: 0
                    }
                },
                GlCall::BindBuffer(BufferTarget::Array, None),
                GlCall::BindBuffer(BufferTarget::ElementArray, None),
            ]
        );
    }

    #[test]
    fn hardware_draw_binds_only_requested_arrays() {
        let mut grid = float_grid(2, 2);
        let mut gl = RecordingGl::default();
        grid.generate_hardware_buffers(&mut gl).unwrap();
        let hw = grid.hardware_buffers().unwrap();

        let binds = |gl: &RecordingGl| {
            gl.calls()
                .iter()
                .filter_map(|c| match c {
                    GlCall::BindBuffer(target, buffer) => Some((*target, *buffer)),
                    _ => None,
                })
                .collect::<Vec<_>>()
        };

        gl.clear_calls();
        grid.draw(&mut gl, false, false);
        assert_eq!(
            binds(&gl),
            [
                (BufferTarget::Array, Some(hw.vertex)),
                (BufferTarget::ElementArray, Some(hw.index)),
                (BufferTarget::Array, None),
                (BufferTarget::ElementArray, None),
            ]
        );
        assert!(!gl.calls().iter().any(|c| matches!(
            c,
            GlCall::TexCoordPointer { .. } | GlCall::ColorPointer { .. }
        )));

        gl.clear_calls();
        grid.draw(&mut gl, true, false);
        assert_eq!(
            binds(&gl),
            [
                (BufferTarget::Array, Some(hw.vertex)),
                (BufferTarget::Array, Some(hw.tex_coord)),
                (BufferTarget::ElementArray, Some(hw.index)),
                (BufferTarget::Array, None),
                (BufferTarget::ElementArray, None),
            ]
        );
        assert!(!gl.calls().iter().any(|c| matches!(c, GlCall::ColorPointer { .. })));
    }

    #[test]
    fn begin_and_end_drawing_toggle_state() {
        let mut gl = RecordingGl::default();
        Grid::begin_drawing(&mut gl, true, false);
        assert!(gl.texturing());
        Grid::end_drawing(&mut gl);

        assert_eq!(
            gl.calls(),
            &[
                GlCall::EnableClientState(ClientArray::Vertex),
                GlCall::EnableClientState(ClientArray::TexCoord),
                GlCall::SetTexturing(true),
                GlCall::DisableClientState(ClientArray::Color),
                GlCall::DisableClientState(ClientArray::Vertex),
            ]
        );
    }

    // ── hardware buffer lifecycle ─────────────────────────────────────────

    #[test]
    fn generate_uploads_client_data() {
        let mut grid = fixed_grid(2, 2);
        grid.set(1, 0, 1.0, 0.0, 0.0, 1.0, 0.0, None).unwrap();
        let mut gl = RecordingGl::default();

        grid.generate_hardware_buffers(&mut gl).unwrap();
        assert!(grid.using_hardware_buffers());

        let hw = grid.hardware_buffers().unwrap();
        assert_eq!(gl.buffer_contents(hw.vertex), Some(grid.positions().as_bytes()));
        assert_eq!(gl.buffer_contents(hw.tex_coord), Some(grid.tex_coords().as_bytes()));
        assert_eq!(gl.buffer_contents(hw.color), Some(grid.colors().as_bytes()));
        assert_eq!(
            gl.buffer_contents(hw.index),
            Some(bytemuck::cast_slice::<u16, u8>(grid.indices()))
        );
        assert_eq!(gl.bound_buffer(BufferTarget::Array), None);
        assert_eq!(gl.bound_buffer(BufferTarget::ElementArray), None);
    }

    #[test]
    fn generate_is_idempotent() {
        let mut grid = float_grid(3, 3);
        let mut gl = RecordingGl::default();
        grid.generate_hardware_buffers(&mut gl).unwrap();
        let first = grid.hardware_buffers();
        let calls = gl.calls().len();

        grid.generate_hardware_buffers(&mut gl).unwrap();
        assert_eq!(grid.hardware_buffers(), first);
        assert_eq!(gl.calls().len(), calls);
        assert_eq!(gl.live_buffer_count(), 4);
    }

    #[test]
    fn generate_without_capability_stays_in_client_mode() {
        let mut grid = Grid::new(2, 2, Representation::Float, Capabilities::core()).unwrap();
        let mut gl = RecordingGl::new(Capabilities::core());

        grid.generate_hardware_buffers(&mut gl).unwrap();
        assert!(!grid.using_hardware_buffers());
        assert!(gl.calls().is_empty());
    }

    #[test]
    fn allocation_failure_cleans_up() {
        let mut grid = float_grid(2, 2);
        let mut gl = RecordingGl::default();
        gl.fail_buffer_allocation_after(2);

        let err = grid.generate_hardware_buffers(&mut gl).unwrap_err();
        assert_eq!(err, GridError::GraphicsResource(ResourceFailure::NoBufferName));
        assert!(!grid.using_hardware_buffers());
        assert_eq!(grid.vertex_buffer(), None);
        assert_eq!(gl.live_buffer_count(), 0);
    }

    #[test]
    fn context_error_cleans_up() {
        let mut grid = float_grid(2, 2);
        let mut gl = RecordingGl::default();
        gl.inject_error(GlErrorCode::OutOfMemory);

        let err = grid.generate_hardware_buffers(&mut gl).unwrap_err();
        assert_eq!(
            err,
            GridError::GraphicsResource(ResourceFailure::Context(GlErrorCode::OutOfMemory))
        );
        assert!(!grid.using_hardware_buffers());
        assert_eq!(gl.live_buffer_count(), 0);

        // A later attempt succeeds once the context is healthy.
        grid.generate_hardware_buffers(&mut gl).unwrap();
        assert!(grid.using_hardware_buffers());
    }

    #[test]
    fn failed_generation_drains_every_pending_error() {
        let mut grid = float_grid(2, 2);
        let mut gl = RecordingGl::default();
        gl.inject_error(GlErrorCode::InvalidValue);
        gl.inject_error(GlErrorCode::OutOfMemory);

        let err = grid.generate_hardware_buffers(&mut gl).unwrap_err();
        assert_eq!(
            err,
            GridError::GraphicsResource(ResourceFailure::Context(GlErrorCode::InvalidValue))
        );
        assert_eq!(gl.take_error(), None);
    }

    #[test]
    fn invalidate_forgets_without_deleting() {
        let mut grid = float_grid(2, 2);
        let mut gl = RecordingGl::default();
        grid.generate_hardware_buffers(&mut gl).unwrap();
        gl.clear_calls();

        grid.invalidate_hardware_buffers();
        assert!(!grid.using_hardware_buffers());
        assert_eq!(grid.vertex_buffer(), None);
        assert_eq!(grid.tex_coord_buffer(), None);
        assert_eq!(grid.color_buffer(), None);
        assert_eq!(grid.index_buffer(), None);
        assert!(gl.calls().is_empty());

        // Also fine on a grid that never had buffers.
        let mut fresh = float_grid(2, 2);
        fresh.invalidate_hardware_buffers();
        assert!(!fresh.using_hardware_buffers());
    }

    #[test]
    fn regenerate_after_context_loss() {
        let mut grid = float_grid(2, 2);
        let mut gl = RecordingGl::default();
        grid.generate_hardware_buffers(&mut gl).unwrap();
        let old = grid.hardware_buffers().unwrap();

        gl.lose_context();
        grid.invalidate_hardware_buffers();
        grid.generate_hardware_buffers(&mut gl).unwrap();

        let new = grid.hardware_buffers().unwrap();
        assert_ne!(new.vertex, old.vertex);
        assert_eq!(gl.live_buffer_count(), 4);
    }

    #[test]
    fn release_deletes_four_buffers() {
        let mut grid = float_grid(2, 2);
        let mut gl = RecordingGl::default();
        grid.generate_hardware_buffers(&mut gl).unwrap();
        let hw = grid.hardware_buffers().unwrap();
        gl.clear_calls();

        grid.release_hardware_buffers(&mut gl);
        assert_eq!(
            gl.calls(),
            &[
                GlCall::DeleteBuffer(hw.vertex),
                GlCall::DeleteBuffer(hw.tex_coord),
                GlCall::DeleteBuffer(hw.color),
                GlCall::DeleteBuffer(hw.index),
            ]
        );
        assert!(!grid.using_hardware_buffers());
        assert_eq!(gl.live_buffer_count(), 0);

        gl.clear_calls();
        grid.release_hardware_buffers(&mut gl);
        assert!(gl.calls().is_empty());
    }
}
