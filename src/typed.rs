//! Typed `rgb` pixels as bitmap sources.

use alloc::borrow::Cow;

use crate::error::BlockError;
use crate::pixel::PixelFormat;
use crate::source::Bitmap;

/// An `rgb` pixel type with a fixed [`PixelFormat`].
pub trait SourcePixel: Copy {
    fn pixel_format() -> PixelFormat;
}

impl SourcePixel for rgb::Gray<u8> {
    fn pixel_format() -> PixelFormat {
        PixelFormat::Gray8
    }
}

impl SourcePixel for rgb::Rgb<u8> {
    fn pixel_format() -> PixelFormat {
        PixelFormat::Rgb24
    }
}

impl SourcePixel for rgb::Rgba<u8> {
    fn pixel_format() -> PixelFormat {
        PixelFormat::Rgba8888
    }
}

impl SourcePixel for rgb::alt::BGR<u8> {
    fn pixel_format() -> PixelFormat {
        PixelFormat::Bgr24
    }
}

impl SourcePixel for rgb::alt::BGRA<u8> {
    fn pixel_format() -> PixelFormat {
        PixelFormat::Bgra8888
    }
}

impl<'a> Bitmap<'a> {
    /// Borrow a tightly packed slice of typed pixels (zero-copy).
    pub fn from_pixels<P: SourcePixel>(
        pixels: &'a [P],
        width: u32,
        height: u32,
    ) -> Result<Self, BlockError>
    where
        [P]: rgb::ComponentBytes<u8>,
    {
        use rgb::ComponentBytes;
        Bitmap::with_stride(
            Cow::Borrowed(pixels.as_bytes()),
            width,
            height,
            width as usize * core::mem::size_of::<P>(),
            P::pixel_format(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::BlockSource;
    use crate::rect::Rect;
    use alloc::vec;

    #[test]
    fn bgra_pixels_resolve_blue_first() {
        let px = vec![rgb::alt::BGRA8 { b: 1, g: 2, r: 3, a: 4 }; 4];
        let bmp = Bitmap::from_pixels(&px, 2, 2).unwrap();
        assert!(bmp.is_borrowed());
        let mut src = BlockSource::open(bmp).unwrap();
        assert_eq!(src.component_count(), 4);
        let red = src.get_copy(0, Rect::full(2, 2)).unwrap();
        assert_eq!(red, vec![3 - 128; 4]);
    }

    #[test]
    fn rgb_pixels() {
        let px = vec![rgb::RGB8 { r: 10, g: 20, b: 30 }; 6];
        let mut src = BlockSource::open(Bitmap::from_pixels(&px, 3, 2).unwrap()).unwrap();
        assert_eq!(src.get_copy(2, Rect::new(1, 1, 2, 1)).unwrap(), vec![-98, -98]);
    }
}
