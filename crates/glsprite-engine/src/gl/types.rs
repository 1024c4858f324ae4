use std::num::NonZeroU32;

/// Texture handle as seen by the fixed-function layer.
///
/// `TextureId::NONE` unbinds (GL name `0`).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

impl TextureId {
    pub const NONE: TextureId = TextureId(0);

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// Non-zero buffer object name.
///
/// Zero is reserved for "unbound" and is never a valid `BufferId`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BufferId(NonZeroU32);

impl BufferId {
    /// Wraps a raw name returned by `gen_buffer`; `None` for `0`.
    #[inline]
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    #[inline]
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

/// Component type of vertex attribute data.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CoordType {
    /// 32-bit IEEE float.
    Float,
    /// 32-bit signed Q16.16 fixed point.
    Fixed,
}

impl CoordType {
    /// Size of one component in bytes.
    #[inline]
    pub const fn size_bytes(self) -> usize {
        4
    }
}

/// Client-side vertex arrays that can be toggled.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ClientArray {
    Vertex,
    TexCoord,
    Color,
}

/// Buffer binding points.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Per-vertex attribute data.
    Array,
    /// Index data.
    ElementArray,
}

/// Upload usage hint.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    StaticDraw,
}

/// Where an attribute pointer sources its data from.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum AttribSource<'a> {
    /// Bytes in client memory, read at draw time.
    Client(&'a [u8]),
    /// Byte offset into the buffer bound to `BufferTarget::Array` at pointer time.
    Bound { offset: usize },
}

/// Where `draw_elements` reads its `u16` indices from.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum IndexSource<'a> {
    Client(&'a [u16]),
    /// Byte offset into the buffer bound to `BufferTarget::ElementArray`.
    Bound { offset: usize },
}

/// Sticky error codes reported by `GlContext::take_error`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum GlErrorCode {
    InvalidEnum,
    InvalidValue,
    InvalidOperation,
    OutOfMemory,
}

impl std::fmt::Display for GlErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GlErrorCode::InvalidEnum => "invalid enum",
            GlErrorCode::InvalidValue => "invalid value",
            GlErrorCode::InvalidOperation => "invalid operation",
            GlErrorCode::OutOfMemory => "out of memory",
        };
        f.write_str(s)
    }
}

/// Optional features of a graphics context.
///
/// Queried once from the context and handed to grids and sprites at
/// construction; callers never probe the context type at draw time.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Capabilities {
    /// Buffer objects (`gen_buffer`/`bind_buffer`/`buffer_data`/`delete_buffer`).
    pub vertex_buffer_objects: bool,
    /// Screen-space texture blit (`draw_texture`).
    pub draw_texture: bool,
}

impl Capabilities {
    /// Core profile only: client arrays, no extensions.
    pub const fn core() -> Self {
        Self {
            vertex_buffer_objects: false,
            draw_texture: false,
        }
    }

    pub const fn all() -> Self {
        Self {
            vertex_buffer_objects: true,
            draw_texture: true,
        }
    }

    /// Intersection of two capability sets.
    pub const fn restrict(self, other: Capabilities) -> Self {
        Self {
            vertex_buffer_objects: self.vertex_buffer_objects && other.vertex_buffer_objects,
            draw_texture: self.draw_texture && other.draw_texture,
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::all()
    }
}
