//! Single-slot cache of decoded sample planes.

use alloc::vec;
use alloc::vec::Vec;
use core::mem;

use enough::Stop;
use log::trace;

use crate::decode::decode_window;
use crate::error::BlockError;
use crate::format::FormatDescriptor;
use crate::limits::Limits;
use crate::rect::Rect;
use crate::source::PixelSource;

/// Borrowed view of one component's samples for a requested rectangle.
///
/// Sample `(x, y)` of the rectangle is at `samples()[offset + y * scan_width + x]`.
/// The view lives until the next read or close of the source it came from.
#[derive(Clone, Copy, Debug)]
pub struct Block<'a> {
    data: &'a [i32],
    offset: usize,
    scan_width: usize,
    rect: Rect,
}

impl<'a> Block<'a> {
    /// The whole backing plane, which may extend past the requested rectangle.
    pub fn samples(&self) -> &'a [i32] {
        self.data
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn scan_width(&self) -> usize {
        self.scan_width
    }

    /// The requested rectangle, in source coordinates.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Samples of row `y` of the rectangle.
    pub fn row(&self, y: usize) -> Option<&'a [i32]> {
        if y >= self.rect.height as usize {
            return None;
        }
        let start = self.offset + y * self.scan_width;
        self.data.get(start..start + self.rect.width as usize)
    }

    /// Sample at `(x, y)` relative to the rectangle's top-left corner.
    pub fn get(&self, x: usize, y: usize) -> Option<i32> {
        if x >= self.rect.width as usize {
            return None;
        }
        self.row(y).map(|r| r[x])
    }

    /// Iterate rows top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &'a [i32]> + '_ {
        (0..self.rect.height as usize).filter_map(move |y| self.row(y))
    }

    /// Copy the rectangle into `out`, tightly packed (`offset = 0`, stride = width).
    pub fn copy_to(&self, out: &mut [i32]) -> Result<(), BlockError> {
        let w = self.rect.width as usize;
        let needed = self.rect.area().ok_or(BlockError::DimensionsTooLarge {
            width: self.rect.width,
            height: self.rect.height,
        })?;
        if out.len() < needed {
            return Err(BlockError::BufferTooSmall {
                needed,
                actual: out.len(),
            });
        }
        if self.offset == 0 && self.scan_width == w {
            let src = self.data.get(..needed).ok_or(BlockError::BufferTooSmall {
                needed,
                actual: self.data.len(),
            })?;
            out[..needed].copy_from_slice(src);
        } else {
            for (dst, src) in out.chunks_exact_mut(w).zip(self.rows()) {
                dst.copy_from_slice(src);
            }
        }
        Ok(())
    }

    /// Copy the rectangle into a new tightly packed buffer.
    pub fn to_vec(&self) -> Result<Vec<i32>, BlockError> {
        let mut out = vec![0i32; self.rect.area().unwrap_or(0)];
        self.copy_to(&mut out)?;
        Ok(out)
    }
}

/// The decoded window: one plane per component, all for the same rectangle.
#[derive(Debug, Default)]
pub(crate) struct CachedWindow {
    rect: Rect,
    scan_width: usize,
    /// Empty when nothing is cached. Otherwise one plane per component,
    /// each at least `rect.width * rect.height` long.
    planes: Vec<Vec<i32>>,
}

impl CachedWindow {
    pub(crate) fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    pub(crate) fn rect(&self) -> Option<Rect> {
        (!self.is_empty()).then_some(self.rect)
    }

    /// Whether `rect` can be served without decoding.
    pub(crate) fn contains(&self, rect: &Rect) -> bool {
        !self.is_empty() && self.rect.contains(rect)
    }

    /// View of `component` for `rect`, if the cached window contains it.
    pub(crate) fn block(&self, component: usize, rect: Rect) -> Option<Block<'_>> {
        if !self.contains(&rect) {
            return None;
        }
        let plane = self.planes.get(component)?;
        let dx = (rect.x - self.rect.x) as usize;
        let dy = (rect.y - self.rect.y) as usize;
        Some(Block {
            data: plane,
            offset: dy * self.scan_width + dx,
            scan_width: self.scan_width,
            rect,
        })
    }

    /// Decode every component of `rect` and make it the cached window.
    ///
    /// Existing planes are reused when their capacity covers the new
    /// rectangle. The new window only becomes visible once fully decoded.
    /// A limit error or a stop seen before decoding starts leaves the old
    /// window in place. Any failure during the decode, cancellation
    /// included, leaves the cache empty.
    pub(crate) fn refill<S: PixelSource + ?Sized>(
        &mut self,
        source: &S,
        rect: Rect,
        descriptor: &FormatDescriptor,
        limits: &Limits,
        stop: &dyn Stop,
    ) -> Result<(), BlockError> {
        let components = descriptor.component_count();
        let samples = limits.check_window(components, rect.width, rect.height)?;
        stop.check()?;

        let mut planes = mem::take(&mut self.planes);
        *self = CachedWindow::default();
        planes.resize_with(components, Vec::new);

        let mut grown = 0;
        for plane in planes.iter_mut() {
            if plane.capacity() < samples {
                *plane = vec![0; samples];
                grown += 1;
            } else {
                plane.resize(samples, 0);
            }
        }
        trace!(
            "refill {}x{} at ({}, {}): {} planes, {} grown",
            rect.width, rect.height, rect.x, rect.y, components, grown
        );

        let mut views: Vec<&mut [i32]> = planes.iter_mut().map(|p| &mut p[..]).collect();
        decode_window(source, rect, descriptor, &mut views, stop)?;

        *self = CachedWindow {
            rect,
            scan_width: rect.width as usize,
            planes,
        };
        Ok(())
    }

    /// Drop all planes and release their memory.
    pub(crate) fn clear(&mut self) {
        *self = CachedWindow::default();
    }

    #[cfg(test)]
    pub(crate) fn plane_capacity(&self, component: usize) -> usize {
        self.planes.get(component).map_or(0, Vec::capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::PixelFormat;
    use crate::source::Bitmap;
    use enough::Unstoppable;

    fn gray_ramp(w: u32, h: u32) -> Bitmap<'static> {
        let data: Vec<u8> = (0..w * h).map(|v| v as u8).collect();
        Bitmap::owned(data, w, h, PixelFormat::Gray8).unwrap()
    }

    fn fill(window: &mut CachedWindow, bmp: &Bitmap<'_>, rect: Rect) {
        let desc = FormatDescriptor::resolve(bmp.format()).unwrap();
        window
            .refill(bmp, rect, &desc, &Limits::default(), &Unstoppable)
            .unwrap();
    }

    #[test]
    fn hit_offset_accounts_for_rows_and_columns() {
        let bmp = gray_ramp(8, 8);
        let mut window = CachedWindow::default();
        fill(&mut window, &bmp, Rect::new(2, 1, 5, 6));

        let block = window.block(0, Rect::new(4, 3, 2, 2)).unwrap();
        // (3 - 1) * 5 + (4 - 2)
        assert_eq!(block.offset(), 12);
        assert_eq!(block.scan_width(), 5);
        // source value at (4, 3) is 3 * 8 + 4
        assert_eq!(block.get(0, 0), Some(28 - 128));
        assert_eq!(block.get(1, 1), Some(37 - 128));
    }

    #[test]
    fn miss_block_is_tight() {
        let bmp = gray_ramp(8, 8);
        let mut window = CachedWindow::default();
        let rect = Rect::new(3, 3, 4, 2);
        fill(&mut window, &bmp, rect);
        let block = window.block(0, rect).unwrap();
        assert_eq!(block.offset(), 0);
        assert_eq!(block.scan_width(), 4);
    }

    #[test]
    fn uncontained_request_is_not_served() {
        let bmp = gray_ramp(8, 8);
        let mut window = CachedWindow::default();
        assert!(window.block(0, Rect::new(0, 0, 1, 1)).is_none());
        fill(&mut window, &bmp, Rect::new(0, 0, 4, 4));
        assert!(window.block(0, Rect::new(2, 2, 4, 4)).is_none());
        assert!(window.block(1, Rect::new(0, 0, 2, 2)).is_none());
    }

    #[test]
    fn same_size_refill_reuses_planes() {
        let bmp = gray_ramp(16, 16);
        let mut window = CachedWindow::default();
        fill(&mut window, &bmp, Rect::new(0, 0, 8, 8));
        let cap = window.plane_capacity(0);
        let ptr = window.block(0, Rect::new(0, 0, 8, 8)).unwrap().samples().as_ptr();

        fill(&mut window, &bmp, Rect::new(8, 8, 8, 8));
        assert_eq!(window.plane_capacity(0), cap);
        let block = window.block(0, Rect::new(8, 8, 8, 8)).unwrap();
        assert_eq!(block.samples().as_ptr(), ptr);
        assert_eq!(block.get(0, 0), Some((8 * 16 + 8) as u8 as i32 - 128));
    }

    #[test]
    fn smaller_refill_keeps_capacity_larger_grows() {
        let bmp = gray_ramp(16, 16);
        let mut window = CachedWindow::default();
        fill(&mut window, &bmp, Rect::new(0, 0, 8, 8));
        fill(&mut window, &bmp, Rect::new(0, 0, 2, 2));
        assert!(window.plane_capacity(0) >= 64);
        assert_eq!(window.block(0, Rect::new(0, 0, 2, 2)).unwrap().samples().len(), 4);

        fill(&mut window, &bmp, Rect::new(0, 0, 16, 16));
        assert!(window.plane_capacity(0) >= 256);
    }

    #[test]
    fn failed_refill_leaves_cache_empty() {
        let bmp = gray_ramp(8, 8);
        let mut window = CachedWindow::default();
        fill(&mut window, &bmp, Rect::new(0, 0, 4, 4));
        let desc = FormatDescriptor::resolve(bmp.format()).unwrap();
        let limits = Limits::none().with_max_memory(16);
        let res = window.refill(&bmp, Rect::new(0, 0, 8, 8), &desc, &limits, &Unstoppable);
        assert!(matches!(res, Err(BlockError::LimitExceeded(_))));
        // the limit check runs before the old window is touched
        assert_eq!(window.rect(), Some(Rect::new(0, 0, 4, 4)));

        window.clear();
        assert!(window.is_empty());
        assert_eq!(window.rect(), None);
    }

    #[test]
    fn copy_out_of_wider_window() {
        let bmp = gray_ramp(8, 8);
        let mut window = CachedWindow::default();
        fill(&mut window, &bmp, Rect::full(8, 8));
        let block = window.block(0, Rect::new(1, 2, 3, 2)).unwrap();
        let copy = block.to_vec().unwrap();
        let expected: Vec<i32> = [17, 18, 19, 25, 26, 27].iter().map(|v| v - 128).collect();
        assert_eq!(copy, expected);

        let mut short = [0i32; 5];
        assert!(matches!(
            block.copy_to(&mut short),
            Err(BlockError::BufferTooSmall { needed: 6, actual: 5 })
        ));
    }
}
