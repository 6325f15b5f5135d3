//! # zenblocks
//!
//! Windowed, level-shifted sample reader over in-memory bitmaps.
//!
//! A [`BlockSource`] wraps any [`PixelSource`] (a [`Bitmap`], an
//! `imgref::ImgRef`, or a bitmap-library adapter) and serves per-component
//! `i32` samples for requested rectangles, zero-centered by subtracting
//! `2^(bits - 1)` from every unsigned value. This is the input a
//! wavelet/JPEG 2000 style encoder expects from its image reader.
//!
//! ## Caching
//!
//! One decoded window is kept. A request whose rectangle lies inside it is
//! answered from the cached planes with an offset and stride; any other
//! request decodes all components of the new rectangle at once. Plane
//! buffers are reused when large enough, so sequential same-size tile
//! requests do not allocate.
//!
//! ## Supported Formats
//!
//! 8-bit and 16-bit gray/alpha, two-channel, RGB/BGR (packed, padded and
//! 565/555), RGBA/BGRA (8888, 1010102, 4444, 16161616). Alpha is reported
//! as a component unless the source is [`AlphaMode::Opaque`].
//! Floating-point encodings are rejected at open time.
//!
//! ## Non-Goals
//!
//! - Color transforms, resampling, compression
//! - Writing pixels back to a bitmap
//!
//! ## Usage
//!
//! ```
//! use zenblocks::{Bitmap, BlockSource, PixelFormat, Rect};
//!
//! let pixels = vec![0u8; 64 * 64 * 4];
//! let bitmap = Bitmap::borrowed(&pixels, 64, 64, PixelFormat::Bgra8888)?;
//! let mut src = BlockSource::open(bitmap)?;
//!
//! // First tile decodes; the quarter inside it is served from cache.
//! let red = src.get_reference(0, Rect::new(0, 0, 32, 32))?;
//! assert_eq!(red.get(0, 0), Some(-128));
//! let alpha = src.get_copy(3, Rect::new(8, 8, 16, 16))?;
//! assert_eq!(alpha.len(), 256);
//! assert_eq!(src.decode_count(), 1);
//!
//! src.close();
//! # Ok::<(), zenblocks::BlockError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

mod decode;
mod error;
mod format;
mod limits;
mod pixel;
mod reader;
mod rect;
mod source;
mod window;

#[cfg(feature = "rgb")]
mod typed;

#[cfg(feature = "imgref")]
mod img;

// Re-exports
pub use enough::{Stop, Unstoppable};
pub use error::BlockError;
pub use format::{FormatDescriptor, MAX_COMPONENTS};
pub use limits::Limits;
pub use pixel::{AlphaMode, ChannelOrder, PixelFormat, SourceFormat};
pub use reader::{BlockDataSource, BlockSource, OpenRequest};
pub use rect::Rect;
pub use source::{Bitmap, PixelSource, RawRegion};
pub use window::Block;

#[cfg(feature = "rgb")]
pub use typed::SourcePixel;
