//! Open/read/close lifecycle around a pixel source and its cached window.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use enough::{Stop, Unstoppable};
use log::debug;

use crate::error::BlockError;
use crate::format::FormatDescriptor;
use crate::limits::Limits;
use crate::rect::Rect;
use crate::source::PixelSource;
use crate::window::{Block, CachedWindow};

/// Consumer-facing contract of a source of per-component sample blocks.
///
/// Samples are level shifted: an unsigned value `v` with nominal range
/// `b` bits is delivered as `v - 2^(b-1)`.
pub trait BlockDataSource {
    fn image_width(&self) -> u32;

    fn image_height(&self) -> u32;

    fn component_count(&self) -> usize;

    /// Bit depth of `component` before level shifting.
    fn nominal_range_bits(&self, component: usize) -> Result<u8, BlockError>;

    /// Whether `component` was signed in the source.
    fn is_signed(&self, component: usize) -> Result<bool, BlockError>;

    /// Number of fractional bits in `component`'s samples.
    fn fixed_point_position(&self, component: usize) -> Result<u32, BlockError>;

    /// Zero-copy view of `component` over `rect`.
    fn get_reference(&mut self, component: usize, rect: Rect) -> Result<Block<'_>, BlockError>;

    /// Copy of `component` over `rect`, tightly packed, into `out`.
    fn get_copy_into(
        &mut self,
        component: usize,
        rect: Rect,
        out: &mut [i32],
    ) -> Result<(), BlockError> {
        self.get_reference(component, rect)?.copy_to(out)
    }

    /// Copy of `component` over `rect` in a new, tightly packed buffer.
    fn get_copy(&mut self, component: usize, rect: Rect) -> Result<Vec<i32>, BlockError> {
        let len = rect.area().ok_or(BlockError::DimensionsTooLarge {
            width: rect.width,
            height: rect.height,
        })?;
        let mut out = vec![0i32; len];
        self.get_copy_into(component, rect, &mut out)?;
        Ok(out)
    }

    /// Release the underlying source. Later reads fail with
    /// [`BlockError::SourceClosed`].
    fn close(&mut self);
}

/// Builder for opening a [`BlockSource`].
pub struct OpenRequest<'a, S, T = Unstoppable> {
    source: S,
    limits: Option<&'a Limits>,
    stop: T,
}

impl<'a, S: PixelSource> OpenRequest<'a, S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            limits: None,
            stop: Unstoppable,
        }
    }
}

impl<'a, S: PixelSource, T: Stop> OpenRequest<'a, S, T> {
    /// Apply resource limits to the source and every window allocation.
    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Cancellation token checked during every window refill.
    pub fn with_stop<U: Stop>(self, stop: U) -> OpenRequest<'a, S, U> {
        OpenRequest {
            source: self.source,
            limits: self.limits,
            stop,
        }
    }

    /// Resolve the source format and open.
    ///
    /// Fails fast with [`BlockError::UnsupportedFormat`]; no pixels are read.
    pub fn open(self) -> Result<BlockSource<S, T>, BlockError> {
        let descriptor = FormatDescriptor::resolve(self.source.format())?;
        let width = self.source.width();
        let height = self.source.height();
        let limits = self.limits.cloned().unwrap_or_default();
        limits.check_source(width, height)?;
        debug!(
            "open {}x{} {:?}: {} components, bits {:?}",
            width,
            height,
            descriptor.source_format().pixel_format,
            descriptor.component_count(),
            descriptor.bits_per_component()
        );
        Ok(BlockSource {
            source: Some(self.source),
            descriptor,
            width,
            height,
            limits,
            stop: self.stop,
            window: CachedWindow::default(),
            decodes: 0,
        })
    }
}

/// Windowed, level-shifted sample reader over a [`PixelSource`].
///
/// Holds one decoded window. A read whose rectangle lies inside the window
/// is served from it; any other read decodes every component of the new
/// rectangle. Not meant for shared use: reads take `&mut self`, and a
/// returned [`Block`] borrows the source until it is dropped.
///
/// ```
/// use zenblocks::{Bitmap, BlockSource, PixelFormat, Rect};
///
/// let pixels = [10u8, 20, 30].repeat(16);
/// let bitmap = Bitmap::borrowed(&pixels, 4, 4, PixelFormat::Rgb24)?;
/// let mut src = BlockSource::open(bitmap)?;
///
/// let block = src.get_reference(0, Rect::new(0, 0, 2, 2))?;
/// assert_eq!(block.get(1, 1), Some(10 - 128));
/// # Ok::<(), zenblocks::BlockError>(())
/// ```
pub struct BlockSource<S, T = Unstoppable> {
    source: Option<S>,
    descriptor: FormatDescriptor,
    width: u32,
    height: u32,
    limits: Limits,
    stop: T,
    window: CachedWindow,
    decodes: u64,
}

impl<S: PixelSource> BlockSource<S> {
    /// Open with no limits and no cancellation.
    pub fn open(source: S) -> Result<Self, BlockError> {
        OpenRequest::new(source).open()
    }
}

impl<S: PixelSource, T: Stop> BlockSource<S, T> {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn component_count(&self) -> usize {
        self.descriptor.component_count()
    }

    pub fn descriptor(&self) -> &FormatDescriptor {
        &self.descriptor
    }

    pub fn is_open(&self) -> bool {
        self.source.is_some()
    }

    /// Number of window refills so far.
    pub fn decode_count(&self) -> u64 {
        self.decodes
    }

    /// Rectangle currently held in the cache, if any.
    pub fn cached_rect(&self) -> Option<Rect> {
        self.window.rect()
    }

    pub fn nominal_range_bits(&self, component: usize) -> Result<u8, BlockError> {
        self.check_open()?;
        self.check_component(component)?;
        Ok(self.descriptor.bits_per_component()[component])
    }

    /// Always `false`: source pixels are unsigned.
    pub fn is_signed(&self, component: usize) -> Result<bool, BlockError> {
        self.check_open()?;
        self.check_component(component)?;
        Ok(self.descriptor.signed()[component])
    }

    /// Always 0: samples are integers.
    pub fn fixed_point_position(&self, component: usize) -> Result<u32, BlockError> {
        self.check_open()?;
        self.check_component(component)?;
        Ok(0)
    }

    /// Zero-copy view of `component` over `rect`.
    ///
    /// Served from the cached window when it contains `rect`; otherwise
    /// all components of `rect` are decoded first.
    pub fn get_reference(
        &mut self,
        component: usize,
        rect: Rect,
    ) -> Result<Block<'_>, BlockError> {
        let source = self.source.as_ref().ok_or(BlockError::SourceClosed)?;
        self.check_component(component)?;
        self.check_rect(rect)?;

        if !self.window.contains(&rect) {
            self.window
                .refill(source, rect, &self.descriptor, &self.limits, &self.stop)?;
            self.decodes += 1;
        }
        self.window
            .block(component, rect)
            .ok_or(BlockError::ComponentIndexOutOfRange {
                index: component,
                count: self.descriptor.component_count(),
            })
    }

    /// Copy of `component` over `rect` into `out` (`offset = 0`, stride = width).
    pub fn get_copy_into(
        &mut self,
        component: usize,
        rect: Rect,
        out: &mut [i32],
    ) -> Result<(), BlockError> {
        self.get_reference(component, rect)?.copy_to(out)
    }

    /// Copy of `component` over `rect` in a new buffer the caller may mutate.
    pub fn get_copy(&mut self, component: usize, rect: Rect) -> Result<Vec<i32>, BlockError> {
        self.get_reference(component, rect)?.to_vec()
    }

    /// Release the pixel source and the cached planes.
    ///
    /// Returns the source on the first call, `None` afterwards.
    pub fn close(&mut self) -> Option<S> {
        self.window.clear();
        let source = self.source.take();
        if source.is_some() {
            debug!("close {}x{} after {} decodes", self.width, self.height, self.decodes);
        }
        source
    }

    fn check_open(&self) -> Result<(), BlockError> {
        if self.source.is_none() {
            return Err(BlockError::SourceClosed);
        }
        Ok(())
    }

    fn check_component(&self, component: usize) -> Result<(), BlockError> {
        let count = self.descriptor.component_count();
        if component >= count {
            return Err(BlockError::ComponentIndexOutOfRange {
                index: component,
                count,
            });
        }
        Ok(())
    }

    fn check_rect(&self, rect: Rect) -> Result<(), BlockError> {
        if !rect.fits_within(self.width, self.height) {
            return Err(BlockError::InvalidRectangle {
                rect,
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

impl<S: PixelSource, T: Stop> BlockDataSource for BlockSource<S, T> {
    fn image_width(&self) -> u32 {
        self.width
    }

    fn image_height(&self) -> u32 {
        self.height
    }

    fn component_count(&self) -> usize {
        BlockSource::component_count(self)
    }

    fn nominal_range_bits(&self, component: usize) -> Result<u8, BlockError> {
        BlockSource::nominal_range_bits(self, component)
    }

    fn is_signed(&self, component: usize) -> Result<bool, BlockError> {
        BlockSource::is_signed(self, component)
    }

    fn fixed_point_position(&self, component: usize) -> Result<u32, BlockError> {
        BlockSource::fixed_point_position(self, component)
    }

    fn get_reference(&mut self, component: usize, rect: Rect) -> Result<Block<'_>, BlockError> {
        BlockSource::get_reference(self, component, rect)
    }

    fn close(&mut self) {
        BlockSource::close(self);
    }
}

impl<S, T> fmt::Display for BlockSource<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BlockSource: WxH = {}x{}, components = {} ({:?})",
            self.width,
            self.height,
            self.descriptor.component_count(),
            self.descriptor.source_format().pixel_format
        )?;
        if self.source.is_none() {
            f.write_str(", closed")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::{AlphaMode, PixelFormat, SourceFormat};
    use crate::source::Bitmap;
    use alloc::string::ToString;

    fn rgb_flat() -> Bitmap<'static> {
        Bitmap::owned([10u8, 20, 30].repeat(16), 4, 4, PixelFormat::Rgb24).unwrap()
    }

    #[test]
    fn metadata_queries() {
        let src = BlockSource::open(rgb_flat()).unwrap();
        assert_eq!(src.width(), 4);
        assert_eq!(src.height(), 4);
        assert_eq!(src.component_count(), 3);
        assert_eq!(src.nominal_range_bits(2).unwrap(), 8);
        assert!(!src.is_signed(0).unwrap());
        assert_eq!(src.fixed_point_position(1).unwrap(), 0);
        assert!(matches!(
            src.nominal_range_bits(3),
            Err(BlockError::ComponentIndexOutOfRange { index: 3, count: 3 })
        ));
    }

    #[test]
    fn open_fails_fast_on_float() {
        let bmp = Bitmap::owned(vec![0u8; 16], 1, 1, PixelFormat::RgbaF32).unwrap();
        assert!(matches!(
            BlockSource::open(bmp),
            Err(BlockError::UnsupportedFormat(PixelFormat::RgbaF32))
        ));
    }

    #[test]
    fn open_applies_limits() {
        let limits = Limits::none().with_max_pixels(15);
        let res = OpenRequest::new(rgb_flat()).with_limits(&limits).open();
        assert!(matches!(res, Err(BlockError::LimitExceeded(_))));
    }

    #[test]
    fn window_limit_applies_on_read() {
        // 3 planes * 4 samples * 4 bytes fits; 3 * 16 * 4 does not
        let limits = Limits::none().with_max_memory(48);
        let mut src = OpenRequest::new(rgb_flat())
            .with_limits(&limits)
            .open()
            .unwrap();
        assert!(src.get_reference(0, Rect::new(0, 0, 2, 2)).is_ok());
        assert!(matches!(
            src.get_reference(0, Rect::full(4, 4)),
            Err(BlockError::LimitExceeded(_))
        ));
    }

    #[test]
    fn stop_cancels_refill() {
        struct AlwaysStop;
        impl Stop for AlwaysStop {
            fn check(&self) -> Result<(), enough::StopReason> {
                Err(enough::StopReason::Cancelled)
            }
        }
        let mut src = OpenRequest::new(rgb_flat())
            .with_stop(AlwaysStop)
            .open()
            .unwrap();
        assert!(matches!(
            src.get_reference(0, Rect::full(4, 4)),
            Err(BlockError::Cancelled(_))
        ));
        assert_eq!(src.decode_count(), 0);
    }

    #[test]
    fn stop_during_decode_empties_cache() {
        use core::sync::atomic::{AtomicU32, Ordering};

        // passes the first `allowed` checks, then cancels
        struct StopAfter {
            allowed: u32,
            seen: AtomicU32,
        }
        impl Stop for StopAfter {
            fn check(&self) -> Result<(), enough::StopReason> {
                if self.seen.fetch_add(1, Ordering::Relaxed) < self.allowed {
                    Ok(())
                } else {
                    Err(enough::StopReason::Cancelled)
                }
            }
        }

        let bmp = Bitmap::owned(vec![7u8; 4 * 40], 4, 40, PixelFormat::Gray8).unwrap();
        let stop = StopAfter {
            allowed: 4,
            seen: AtomicU32::new(0),
        };
        let mut src = OpenRequest::new(bmp).with_stop(stop).open().unwrap();

        // two checks: before the refill and at row 0
        src.get_reference(0, Rect::new(0, 0, 1, 1)).unwrap();
        assert_eq!(src.decode_count(), 1);
        assert_eq!(src.cached_rect(), Some(Rect::new(0, 0, 1, 1)));

        // passes the refill check and row 0, stops at row 16
        assert!(matches!(
            src.get_reference(0, Rect::full(4, 40)),
            Err(BlockError::Cancelled(enough::StopReason::Cancelled))
        ));
        assert_eq!(src.cached_rect(), None);
        assert_eq!(src.decode_count(), 1);
    }

    #[test]
    fn close_releases_once() {
        let mut src = BlockSource::open(rgb_flat()).unwrap();
        src.get_reference(0, Rect::full(4, 4)).unwrap();
        assert!(src.close().is_some());
        assert!(!src.is_open());
        assert_eq!(src.cached_rect(), None);
        assert!(src.close().is_none());
        assert!(matches!(src.is_signed(0), Err(BlockError::SourceClosed)));
    }

    #[test]
    fn display_summary() {
        let bmp = Bitmap::owned(
            vec![0u8; 8],
            2,
            1,
            SourceFormat::new(PixelFormat::Bgra8888, AlphaMode::Premultiplied),
        )
        .unwrap();
        let mut src = BlockSource::open(bmp).unwrap();
        assert_eq!(
            src.to_string(),
            "BlockSource: WxH = 2x1, components = 4 (Bgra8888)"
        );
        src.close();
        assert!(src.to_string().ends_with(", closed"));
    }
}
