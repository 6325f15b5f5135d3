//! Resolution of a [`SourceFormat`] into per-component layout.
//!
//! Every supported encoding is a fixed lookup: channel positions and bit
//! depths come from a table, never from the byte size of a pixel.

use crate::error::BlockError;
use crate::pixel::{AlphaMode, ChannelOrder, PixelFormat, SourceFormat};

/// Maximum number of components any supported format reports.
pub const MAX_COMPONENTS: usize = 4;

/// Location of one channel inside a pixel.
///
/// `shift` is a bit offset into the little-endian pixel; for byte and
/// 16-bit storage it is always a multiple of 8.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Field {
    pub shift: u8,
    pub bits: u8,
}

const fn f(shift: u8, bits: u8) -> Field {
    Field { shift, bits }
}

const NONE: Field = f(0, 0);

/// How channel values are laid out in a pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Storage {
    /// One byte per channel.
    U8,
    /// One little-endian 16-bit word per channel.
    U16,
    /// Bitfields inside a little-endian 16-bit word.
    Packed16,
    /// Bitfields inside a little-endian 32-bit word.
    Packed32,
}

/// Where the alpha channel sits in a format's field table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AlphaSlot {
    /// No alpha channel.
    Absent,
    /// Last field is alpha; dropped when the source is opaque.
    Trailing,
    /// The single field is alpha.
    Only,
}

/// Per-component layout of a source format. Immutable once resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatDescriptor {
    format: SourceFormat,
    bytes_per_pixel: usize,
    storage: Storage,
    channel_order: ChannelOrder,
    alpha_present: bool,
    component_count: usize,
    fields: [Field; MAX_COMPONENTS],
    bits: [u8; MAX_COMPONENTS],
    signed: [bool; MAX_COMPONENTS],
}

impl FormatDescriptor {
    /// Resolve a source format.
    ///
    /// Fails with [`BlockError::UnsupportedFormat`] for
    /// [`PixelFormat::Unknown`] and every floating-point encoding.
    pub fn resolve(format: impl Into<SourceFormat>) -> Result<Self, BlockError> {
        let format = format.into();
        let pixel_format = format.pixel_format;

        use PixelFormat as P;
        let (storage, table, alpha_slot): (Storage, [Field; MAX_COMPONENTS], AlphaSlot) =
            match pixel_format {
                P::Alpha8 => (Storage::U8, [f(0, 8), NONE, NONE, NONE], AlphaSlot::Only),
                P::Gray8 => (Storage::U8, [f(0, 8), NONE, NONE, NONE], AlphaSlot::Absent),
                P::Alpha16 => (Storage::U16, [f(0, 16), NONE, NONE, NONE], AlphaSlot::Only),
                P::Gray16 => (Storage::U16, [f(0, 16), NONE, NONE, NONE], AlphaSlot::Absent),
                P::Rg88 => (Storage::U8, [f(0, 8), f(8, 8), NONE, NONE], AlphaSlot::Absent),
                P::GrayAlpha88 => (Storage::U8, [f(0, 8), f(8, 8), NONE, NONE], AlphaSlot::Trailing),
                P::Rg1616 => (Storage::U16, [f(0, 16), f(16, 16), NONE, NONE], AlphaSlot::Absent),
                P::Rgb565 => (
                    Storage::Packed16,
                    [f(11, 5), f(5, 6), f(0, 5), NONE],
                    AlphaSlot::Absent,
                ),
                P::Rgb555 => (
                    Storage::Packed16,
                    [f(10, 5), f(5, 5), f(0, 5), NONE],
                    AlphaSlot::Absent,
                ),
                P::Rgb24 | P::Bgr24 | P::Rgb888x | P::Bgr888x => (
                    Storage::U8,
                    [f(0, 8), f(8, 8), f(16, 8), NONE],
                    AlphaSlot::Absent,
                ),
                P::Rgb101010x | P::Bgr101010x => (
                    Storage::Packed32,
                    [f(0, 10), f(10, 10), f(20, 10), NONE],
                    AlphaSlot::Absent,
                ),
                P::Argb4444 => (
                    Storage::Packed16,
                    [f(12, 4), f(8, 4), f(4, 4), f(0, 4)],
                    AlphaSlot::Trailing,
                ),
                P::Rgba8888 | P::Bgra8888 => (
                    Storage::U8,
                    [f(0, 8), f(8, 8), f(16, 8), f(24, 8)],
                    AlphaSlot::Trailing,
                ),
                P::Rgba1010102 | P::Bgra1010102 => (
                    Storage::Packed32,
                    [f(0, 10), f(10, 10), f(20, 10), f(30, 2)],
                    AlphaSlot::Trailing,
                ),
                P::Rgba16161616 => (
                    Storage::U16,
                    [f(0, 16), f(16, 16), f(32, 16), f(48, 16)],
                    AlphaSlot::Trailing,
                ),
                P::Unknown
                | P::RgbaF16
                | P::RgbaF16Clamped
                | P::RgbaF32
                | P::RgF16
                | P::AlphaF16 => return Err(BlockError::UnsupportedFormat(pixel_format)),
            };

        let bytes_per_pixel = pixel_format
            .bytes_per_pixel()
            .ok_or(BlockError::UnsupportedFormat(pixel_format))?;

        let mut fields = table;
        let channel_order = pixel_format.channel_order();
        if channel_order == ChannelOrder::Bgr {
            fields.swap(0, 2);
        }

        let mut component_count = fields.iter().take_while(|fd| fd.bits != 0).count();
        let alpha_present = match alpha_slot {
            AlphaSlot::Absent => false,
            AlphaSlot::Only => format.alpha_mode != AlphaMode::Opaque,
            AlphaSlot::Trailing if format.alpha_mode == AlphaMode::Opaque => {
                component_count -= 1;
                fields[component_count] = NONE;
                false
            }
            AlphaSlot::Trailing => true,
        };

        let mut bits = [0u8; MAX_COMPONENTS];
        for (b, fd) in bits.iter_mut().zip(fields.iter()) {
            *b = fd.bits;
        }

        Ok(Self {
            format,
            bytes_per_pixel,
            storage,
            channel_order,
            alpha_present,
            component_count,
            fields,
            bits,
            signed: [false; MAX_COMPONENTS],
        })
    }

    /// The format this descriptor was resolved from.
    pub fn source_format(&self) -> SourceFormat {
        self.format
    }

    pub fn component_count(&self) -> usize {
        self.component_count
    }

    /// Nominal bit depth of each component, `component_count` long.
    pub fn bits_per_component(&self) -> &[u8] {
        &self.bits[..self.component_count]
    }

    /// Signedness of each component. Source samples are always unsigned.
    pub fn signed(&self) -> &[bool] {
        &self.signed[..self.component_count]
    }

    pub fn channel_order(&self) -> ChannelOrder {
        self.channel_order
    }

    pub fn alpha_present(&self) -> bool {
        self.alpha_present
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.bytes_per_pixel
    }

    /// Value subtracted from raw samples of `component`: `2^(bits - 1)`.
    ///
    /// `None` if `component >= component_count()`.
    pub fn level_shift(&self, component: usize) -> Option<i32> {
        let bits = *self.bits_per_component().get(component)?;
        Some(1i32 << (bits - 1))
    }

    pub(crate) fn storage(&self) -> Storage {
        self.storage
    }

    /// Channel fields in logical component order, `component_count` long.
    pub(crate) fn fields(&self) -> &[Field] {
        &self.fields[..self.component_count]
    }
}
