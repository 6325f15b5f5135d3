use crate::error::BlockError;

/// Resource limits for opening sources and allocating sample windows.
///
/// All fields default to `None` (no limit).
///
/// ```
/// use zenblocks::Limits;
///
/// let limits = Limits::none()
///     .with_max_pixels(64 * 1024 * 1024)
///     .with_max_memory(256 * 1024 * 1024);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Limits {
    pub max_width: Option<u64>,
    pub max_height: Option<u64>,
    /// Maximum source pixel count (width * height).
    pub max_pixels: Option<u64>,
    /// Maximum bytes held by the cached window, all planes together.
    pub max_memory_bytes: Option<u64>,
}

impl Limits {
    /// No limits (all fields `None`).
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_max_width(mut self, max: u64) -> Self {
        self.max_width = Some(max);
        self
    }

    pub fn with_max_height(mut self, max: u64) -> Self {
        self.max_height = Some(max);
        self
    }

    pub fn with_max_pixels(mut self, max: u64) -> Self {
        self.max_pixels = Some(max);
        self
    }

    pub fn with_max_memory(mut self, bytes: u64) -> Self {
        self.max_memory_bytes = Some(bytes);
        self
    }

    /// Check source dimensions. Called once, when a source is opened.
    pub(crate) fn check_source(&self, width: u32, height: u32) -> Result<(), BlockError> {
        if let Some(max_w) = self.max_width {
            if u64::from(width) > max_w {
                return Err(BlockError::LimitExceeded(alloc::format!(
                    "width {width} exceeds limit {max_w}"
                )));
            }
        }
        if let Some(max_h) = self.max_height {
            if u64::from(height) > max_h {
                return Err(BlockError::LimitExceeded(alloc::format!(
                    "height {height} exceeds limit {max_h}"
                )));
            }
        }
        if let Some(max_px) = self.max_pixels {
            let pixels = u64::from(width) * u64::from(height);
            if pixels > max_px {
                return Err(BlockError::LimitExceeded(alloc::format!(
                    "pixel count {pixels} exceeds limit {max_px}"
                )));
            }
        }
        Ok(())
    }

    /// Check the planes of a `width` x `height` window with `components`
    /// planes of `i32` samples. Returns the per-plane sample count.
    pub(crate) fn check_window(
        &self,
        components: usize,
        width: u32,
        height: u32,
    ) -> Result<usize, BlockError> {
        let samples = (width as usize)
            .checked_mul(height as usize)
            .ok_or(BlockError::DimensionsTooLarge { width, height })?;
        let bytes = samples
            .checked_mul(components)
            .and_then(|n| n.checked_mul(core::mem::size_of::<i32>()))
            .ok_or(BlockError::DimensionsTooLarge { width, height })?;
        if let Some(max_mem) = self.max_memory_bytes {
            if bytes as u64 > max_mem {
                return Err(BlockError::LimitExceeded(alloc::format!(
                    "window of {bytes} bytes exceeds memory limit {max_mem}"
                )));
            }
        }
        Ok(samples)
    }
}
