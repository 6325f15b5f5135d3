use alloc::string::String;
use enough::StopReason;

use crate::pixel::PixelFormat;
use crate::rect::Rect;

/// Errors from opening a block source and reading sample blocks.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BlockError {
    #[error("unsupported pixel format: {0:?}")]
    UnsupportedFormat(PixelFormat),

    #[error("component index {index} out of range (source has {count} components)")]
    ComponentIndexOutOfRange { index: usize, count: usize },

    #[error("block source is closed")]
    SourceClosed,

    #[error("rectangle {rect:?} is empty or outside the {width}x{height} image")]
    InvalidRectangle { rect: Rect, width: u32, height: u32 },

    #[error("buffer too small: need {needed} elements, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    #[error("dimensions too large: {width}x{height}")]
    DimensionsTooLarge { width: u32, height: u32 },

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("operation cancelled")]
    Cancelled(StopReason),
}

impl From<StopReason> for BlockError {
    fn from(r: StopReason) -> Self {
        BlockError::Cancelled(r)
    }
}
