use thiserror::Error;

use crate::gl::GlErrorCode;

/// Errors reported by [`Grid`](super::Grid).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// A construction dimension would overflow 16-bit vertex indices.
    #[error("invalid grid dimension: {what} = {value}, must be < 65536")]
    InvalidDimension { what: &'static str, value: usize },

    /// A vertex coordinate lies outside the grid.
    #[error("vertex index out of range: {axis} = {index}, grid has {limit}")]
    IndexOutOfRange {
        axis: &'static str,
        index: usize,
        limit: usize,
    },

    /// The context failed to allocate or fill a buffer object.
    #[error("graphics resource error: {0}")]
    GraphicsResource(ResourceFailure),
}

/// Cause of a [`GridError::GraphicsResource`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum ResourceFailure {
    #[error("buffer allocation returned no name")]
    NoBufferName,
    #[error("context reported {0}")]
    Context(GlErrorCode),
}
