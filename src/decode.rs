//! Level-shifting deinterleaver.
//!
//! Reads the raw bytes of a rectangle and writes `raw - 2^(bits - 1)` for
//! every component into its own row-major plane.

use enough::Stop;

use crate::error::BlockError;
use crate::format::{FormatDescriptor, Storage};
use crate::rect::Rect;
use crate::source::PixelSource;

/// Decode all components of `rect` into `planes`.
///
/// `planes` holds one buffer per component, each at least
/// `rect.width * rect.height` long; sample `(x, y)` of the rectangle lands
/// at `y * rect.width + x`.
pub(crate) fn decode_window<S: PixelSource + ?Sized>(
    source: &S,
    rect: Rect,
    descriptor: &FormatDescriptor,
    planes: &mut [&mut [i32]],
    stop: &dyn Stop,
) -> Result<(), BlockError> {
    let fields = descriptor.fields();
    if planes.len() < fields.len() {
        return Err(BlockError::ComponentIndexOutOfRange {
            index: planes.len(),
            count: fields.len(),
        });
    }

    let w = rect.width as usize;
    let h = rect.height as usize;
    let samples = rect.area().ok_or(BlockError::DimensionsTooLarge {
        width: rect.width,
        height: rect.height,
    })?;
    for plane in planes.iter() {
        if plane.len() < samples {
            return Err(BlockError::BufferTooSmall {
                needed: samples,
                actual: plane.len(),
            });
        }
    }

    let bpp = descriptor.bytes_per_pixel();
    let region = source.region(rect)?;
    let row_bytes = w * bpp;
    if region.height() < h || region.row_bytes() < row_bytes {
        return Err(BlockError::BufferTooSmall {
            needed: row_bytes * h,
            actual: region.row_bytes() * region.height(),
        });
    }

    for y in 0..h {
        if y % 16 == 0 {
            stop.check()?;
        }
        let row = region
            .row(y)
            .and_then(|r| r.get(..row_bytes))
            .ok_or(BlockError::BufferTooSmall {
                needed: row_bytes,
                actual: 0,
            })?;
        let start = y * w;

        for (c, field) in fields.iter().enumerate() {
            let level = descriptor.level_shift(c).ok_or(
                BlockError::ComponentIndexOutOfRange {
                    index: c,
                    count: descriptor.component_count(),
                },
            )?;
            let dst = &mut planes[c][start..start + w];
            let shift = u32::from(field.shift);
            let mask = (1u32 << field.bits) - 1;
            match descriptor.storage() {
                Storage::U8 => {
                    let off = field.shift as usize / 8;
                    deinterleave(row, bpp, dst, |px| i32::from(px[off]) - level);
                }
                Storage::U16 => {
                    let off = field.shift as usize / 8;
                    deinterleave(row, bpp, dst, |px| {
                        i32::from(u16::from_le_bytes([px[off], px[off + 1]])) - level
                    });
                }
                Storage::Packed16 => {
                    deinterleave(row, bpp, dst, |px| {
                        let word = u32::from(u16::from_le_bytes([px[0], px[1]]));
                        ((word >> shift) & mask) as i32 - level
                    });
                }
                Storage::Packed32 => {
                    deinterleave(row, bpp, dst, |px| {
                        let word = u32::from_le_bytes([px[0], px[1], px[2], px[3]]);
                        ((word >> shift) & mask) as i32 - level
                    });
                }
            }
        }
    }
    Ok(())
}

#[inline]
fn deinterleave(row: &[u8], bpp: usize, dst: &mut [i32], sample: impl Fn(&[u8]) -> i32) {
    for (out, px) in dst.iter_mut().zip(row.chunks_exact(bpp)) {
        *out = sample(px);
    }
}
