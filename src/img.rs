//! `imgref` integration: strided typed images as pixel sources, and blocks
//! as `ImgRef<i32>` views.

use imgref::ImgRef;

use crate::error::BlockError;
use crate::pixel::SourceFormat;
use crate::rect::Rect;
use crate::source::{PixelSource, RawRegion};
use crate::typed::SourcePixel;
use crate::window::Block;

impl<P: SourcePixel> PixelSource for ImgRef<'_, P>
where
    [P]: rgb::ComponentBytes<u8>,
{
    fn width(&self) -> u32 {
        u32::try_from(imgref::Img::width(self)).unwrap_or(u32::MAX)
    }

    fn height(&self) -> u32 {
        u32::try_from(imgref::Img::height(self)).unwrap_or(u32::MAX)
    }

    fn format(&self) -> SourceFormat {
        P::pixel_format().into()
    }

    fn region(&self, rect: Rect) -> Result<RawRegion<'_>, BlockError> {
        use rgb::ComponentBytes;
        let pixel_size = core::mem::size_of::<P>();
        let buf: &[P] = self.buf();
        let bytes = buf.as_bytes();
        let stride = self.stride() * pixel_size;
        let start = rect.y as usize * stride + rect.x as usize * pixel_size;
        let data = bytes.get(start..).ok_or(BlockError::BufferTooSmall {
            needed: start,
            actual: bytes.len(),
        })?;
        RawRegion::new(
            data,
            stride,
            rect.width as usize * pixel_size,
            rect.height as usize,
        )
    }
}

impl<'a> Block<'a> {
    /// The requested rectangle as a strided `ImgRef`, without copying.
    pub fn as_imgref(&self) -> ImgRef<'a, i32> {
        let samples = self.samples();
        ImgRef::new_stride(
            &samples[self.offset()..],
            self.rect().width as usize,
            self.rect().height as usize,
            self.scan_width(),
        )
    }
}
