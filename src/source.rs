//! Pixel sources: the bitmap side of a [`BlockSource`](crate::BlockSource).

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::error::BlockError;
use crate::pixel::SourceFormat;
use crate::rect::Rect;

/// Raw interleaved bytes of a rectangular region.
///
/// Row `i` starts at `i * stride` and is `row_bytes` long.
#[derive(Clone, Copy, Debug)]
pub struct RawRegion<'a> {
    data: &'a [u8],
    stride: usize,
    row_bytes: usize,
    height: usize,
}

impl<'a> RawRegion<'a> {
    /// Wrap `data`, checking that it holds `height` rows.
    pub fn new(
        data: &'a [u8],
        stride: usize,
        row_bytes: usize,
        height: usize,
    ) -> Result<Self, BlockError> {
        if height > 0 {
            let needed = stride
                .checked_mul(height - 1)
                .and_then(|n| n.checked_add(row_bytes))
                .ok_or(BlockError::BufferTooSmall {
                    needed: usize::MAX,
                    actual: data.len(),
                })?;
            if data.len() < needed {
                return Err(BlockError::BufferTooSmall {
                    needed,
                    actual: data.len(),
                });
            }
        }
        Ok(Self {
            data,
            stride,
            row_bytes,
            height,
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn row_bytes(&self) -> usize {
        self.row_bytes
    }

    /// Bytes of row `y`, or `None` past the last row.
    pub fn row(&self, y: usize) -> Option<&'a [u8]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.stride;
        self.data.get(start..start + self.row_bytes)
    }
}

/// An image that can hand out raw pixel bytes by region.
///
/// Implemented for [`Bitmap`] and, with the `imgref` feature, for
/// `imgref::ImgRef` of `rgb` pixel types. Bitmap-library adapters implement
/// it to feed a [`BlockSource`](crate::BlockSource).
pub trait PixelSource {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Pixel encoding and alpha treatment of the stored pixels.
    fn format(&self) -> SourceFormat;

    /// Raw bytes for `rect`, row-major, `bytes_per_pixel` apart.
    ///
    /// `rect` has already been checked to lie inside the image.
    fn region(&self, rect: Rect) -> Result<RawRegion<'_>, BlockError>;
}

impl<T: PixelSource + ?Sized> PixelSource for &T {
    fn width(&self) -> u32 {
        (**self).width()
    }

    fn height(&self) -> u32 {
        (**self).height()
    }

    fn format(&self) -> SourceFormat {
        (**self).format()
    }

    fn region(&self, rect: Rect) -> Result<RawRegion<'_>, BlockError> {
        (**self).region(rect)
    }
}

impl<T: PixelSource + ?Sized> PixelSource for Box<T> {
    fn width(&self) -> u32 {
        (**self).width()
    }

    fn height(&self) -> u32 {
        (**self).height()
    }

    fn format(&self) -> SourceFormat {
        (**self).format()
    }

    fn region(&self, rect: Rect) -> Result<RawRegion<'_>, BlockError> {
        (**self).region(rect)
    }
}

/// In-memory bitmap. Pixels may be borrowed (zero-copy) or owned.
#[derive(Clone, Debug)]
pub struct Bitmap<'a> {
    pixels: Cow<'a, [u8]>,
    width: u32,
    height: u32,
    stride: usize,
    format: SourceFormat,
}

impl<'a> Bitmap<'a> {
    /// Borrow tightly packed pixel rows.
    pub fn borrowed(
        data: &'a [u8],
        width: u32,
        height: u32,
        format: impl Into<SourceFormat>,
    ) -> Result<Self, BlockError> {
        let format = format.into();
        let stride = tight_stride(width, height, format)?;
        Self::with_stride(Cow::Borrowed(data), width, height, stride, format)
    }

    /// Take ownership of tightly packed pixel rows.
    pub fn owned(
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: impl Into<SourceFormat>,
    ) -> Result<Bitmap<'static>, BlockError> {
        let format = format.into();
        let stride = tight_stride(width, height, format)?;
        Bitmap::with_stride(Cow::Owned(data), width, height, stride, format)
    }

    /// Pixel rows `stride` bytes apart (padding allowed after each row).
    pub fn with_stride(
        pixels: Cow<'a, [u8]>,
        width: u32,
        height: u32,
        stride: usize,
        format: impl Into<SourceFormat>,
    ) -> Result<Self, BlockError> {
        let format = format.into();
        let row_bytes = tight_stride(width, height, format)?;
        if stride < row_bytes {
            return Err(BlockError::InvalidRectangle {
                rect: Rect::full(width, height),
                width,
                height,
            });
        }
        RawRegion::new(&pixels, stride, row_bytes, height as usize)?;
        Ok(Self {
            pixels,
            width,
            height,
            stride,
            format,
        })
    }

    /// Access the pixel data.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Take ownership of the pixel data (copies if borrowed).
    pub fn into_owned(self) -> Bitmap<'static> {
        Bitmap {
            pixels: Cow::Owned(self.pixels.into_owned()),
            width: self.width,
            height: self.height,
            stride: self.stride,
            format: self.format,
        }
    }

    /// Whether the pixel data is borrowed.
    pub fn is_borrowed(&self) -> bool {
        matches!(self.pixels, Cow::Borrowed(_))
    }
}

impl PixelSource for Bitmap<'_> {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn format(&self) -> SourceFormat {
        self.format
    }

    fn region(&self, rect: Rect) -> Result<RawRegion<'_>, BlockError> {
        let bpp = bytes_per_pixel(self.format)?;
        let start = rect.y as usize * self.stride + rect.x as usize * bpp;
        let data = self
            .pixels
            .get(start..)
            .ok_or(BlockError::BufferTooSmall {
                needed: start,
                actual: self.pixels.len(),
            })?;
        RawRegion::new(
            data,
            self.stride,
            rect.width as usize * bpp,
            rect.height as usize,
        )
    }
}

fn bytes_per_pixel(format: SourceFormat) -> Result<usize, BlockError> {
    format
        .pixel_format
        .bytes_per_pixel()
        .ok_or(BlockError::UnsupportedFormat(format.pixel_format))
}

fn tight_stride(width: u32, height: u32, format: SourceFormat) -> Result<usize, BlockError> {
    (width as usize)
        .checked_mul(bytes_per_pixel(format)?)
        .ok_or(BlockError::DimensionsTooLarge { width, height })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::PixelFormat;
    use alloc::vec;

    #[test]
    fn region_rows_follow_stride() {
        // 3x2 Gray8 with 2 bytes of row padding
        let data = vec![1, 2, 3, 0, 0, 4, 5, 6, 0, 0];
        let bmp = Bitmap::with_stride(Cow::Borrowed(&data[..]), 3, 2, 5, PixelFormat::Gray8)
            .unwrap();
        let region = bmp.region(Rect::new(1, 0, 2, 2)).unwrap();
        assert_eq!(region.row(0), Some(&[2u8, 3][..]));
        assert_eq!(region.row(1), Some(&[5u8, 6][..]));
        assert_eq!(region.row(2), None);
    }

    #[test]
    fn short_buffer_is_rejected() {
        let data = vec![0u8; 11];
        match Bitmap::borrowed(&data, 2, 2, PixelFormat::Rgb24) {
            Err(BlockError::BufferTooSmall { needed, actual }) => {
                assert_eq!(needed, 12);
                assert_eq!(actual, 11);
            }
            other => panic!("expected BufferTooSmall, got {other:?}"),
        }
    }

    #[test]
    fn narrow_stride_is_rejected() {
        let data = vec![0u8; 64];
        let res = Bitmap::with_stride(Cow::Borrowed(&data[..]), 4, 2, 8, PixelFormat::Rgb24);
        assert!(matches!(res, Err(BlockError::InvalidRectangle { .. })));
    }

    #[test]
    fn unknown_format_has_no_layout() {
        let res = Bitmap::borrowed(&[], 0, 0, PixelFormat::Unknown);
        assert!(matches!(
            res,
            Err(BlockError::UnsupportedFormat(PixelFormat::Unknown))
        ));
    }

    #[test]
    fn into_owned_works() {
        let data = vec![7u8, 8, 9];
        let bmp = Bitmap::borrowed(&data, 3, 1, PixelFormat::Gray8).unwrap();
        assert!(bmp.is_borrowed());
        let owned = bmp.into_owned();
        assert!(!owned.is_borrowed());
        assert_eq!(owned.pixels(), &[7, 8, 9]);
    }
}
