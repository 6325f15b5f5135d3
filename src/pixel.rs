/// Pixel encoding of a source bitmap.
///
/// Multi-byte words (16-bit channels and packed formats) are little-endian.
/// Packed formats list their channels from the least significant bits up,
/// except the 16-bit `Rgb565`/`Rgb555`/`Argb4444` words, which put red in
/// the high bits.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// No known encoding. Never resolvable.
    Unknown,
    /// Single 8-bit alpha channel.
    Alpha8,
    /// Single 8-bit luminance channel.
    Gray8,
    /// Single 16-bit alpha channel.
    Alpha16,
    /// Single 16-bit luminance channel.
    Gray16,
    /// Two 8-bit channels, red then green.
    Rg88,
    /// 8-bit luminance then 8-bit alpha.
    GrayAlpha88,
    /// Two 16-bit channels, red then green.
    Rg1616,
    /// 16-bit word: red 11..16, green 5..11, blue 0..5.
    Rgb565,
    /// 16-bit word: red 10..15, green 5..10, blue 0..5, top bit unused.
    Rgb555,
    /// 3 bytes, R G B.
    Rgb24,
    /// 3 bytes, B G R.
    Bgr24,
    /// 4 bytes, R G B and a padding byte.
    Rgb888x,
    /// 4 bytes, B G R and a padding byte.
    Bgr888x,
    /// 32-bit word: red 0..10, green 10..20, blue 20..30, 2 bits padding.
    Rgb101010x,
    /// 32-bit word: blue 0..10, green 10..20, red 20..30, 2 bits padding.
    Bgr101010x,
    /// 16-bit word: red 12..16, green 8..12, blue 4..8, alpha 0..4.
    Argb4444,
    /// 4 bytes, R G B A.
    Rgba8888,
    /// 4 bytes, B G R A.
    Bgra8888,
    /// 32-bit word: red 0..10, green 10..20, blue 20..30, alpha 30..32.
    Rgba1010102,
    /// 32-bit word: blue 0..10, green 10..20, red 20..30, alpha 30..32.
    Bgra1010102,
    /// Four 16-bit channels, R G B A.
    Rgba16161616,
    /// Four half-float channels.
    RgbaF16,
    /// Four half-float channels clamped to [0, 1].
    RgbaF16Clamped,
    /// Four 32-bit float channels.
    RgbaF32,
    /// Two half-float channels.
    RgF16,
    /// Single half-float alpha channel.
    AlphaF16,
}

impl PixelFormat {
    /// Bytes per pixel for this encoding, or `None` for [`PixelFormat::Unknown`].
    pub fn bytes_per_pixel(&self) -> Option<usize> {
        Some(match self {
            Self::Unknown => return None,
            Self::Alpha8 | Self::Gray8 => 1,
            Self::Alpha16
            | Self::Gray16
            | Self::Rg88
            | Self::GrayAlpha88
            | Self::Rgb565
            | Self::Rgb555
            | Self::Argb4444
            | Self::AlphaF16 => 2,
            Self::Rgb24 | Self::Bgr24 => 3,
            Self::Rg1616
            | Self::Rgb888x
            | Self::Bgr888x
            | Self::Rgb101010x
            | Self::Bgr101010x
            | Self::Rgba8888
            | Self::Bgra8888
            | Self::Rgba1010102
            | Self::Bgra1010102
            | Self::RgF16 => 4,
            Self::Rgba16161616 | Self::RgbaF16 | Self::RgbaF16Clamped => 8,
            Self::RgbaF32 => 16,
        })
    }

    /// Whether channels are stored as floating point.
    pub fn is_float(&self) -> bool {
        matches!(
            self,
            Self::RgbaF16 | Self::RgbaF16Clamped | Self::RgbaF32 | Self::RgF16 | Self::AlphaF16
        )
    }

    /// Storage order of the color channels.
    pub fn channel_order(&self) -> ChannelOrder {
        match self {
            Self::Bgr24 | Self::Bgr888x | Self::Bgr101010x | Self::Bgra8888 | Self::Bgra1010102 => {
                ChannelOrder::Bgr
            }
            _ => ChannelOrder::Rgb,
        }
    }
}

/// How a source treats its alpha channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AlphaMode {
    /// Alpha bits are present in storage but every pixel is opaque.
    /// The alpha channel is not reported as a component.
    Opaque,
    /// Color channels are premultiplied by alpha.
    Premultiplied,
    /// Color channels are independent of alpha.
    #[default]
    Unpremultiplied,
}

/// Storage order of the color channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelOrder {
    /// Red (or luminance) first.
    Rgb,
    /// Blue first; red and blue are swapped when decoding.
    Bgr,
}

/// Full format of a pixel source: encoding plus alpha treatment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SourceFormat {
    pub pixel_format: PixelFormat,
    pub alpha_mode: AlphaMode,
}

impl SourceFormat {
    pub fn new(pixel_format: PixelFormat, alpha_mode: AlphaMode) -> Self {
        Self {
            pixel_format,
            alpha_mode,
        }
    }

    /// Same encoding with the alpha channel forced opaque.
    pub fn opaque(pixel_format: PixelFormat) -> Self {
        Self::new(pixel_format, AlphaMode::Opaque)
    }
}

impl From<PixelFormat> for SourceFormat {
    fn from(pixel_format: PixelFormat) -> Self {
        Self::new(pixel_format, AlphaMode::default())
    }
}
