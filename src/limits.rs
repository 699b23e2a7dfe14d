use crate::LoadError;

/// Resource limits for a load.
///
/// All fields default to `None` (no limit). Checked in
/// [`PngLoader::allocate`](crate::PngLoader::allocate), before the destination
/// is asked to size itself.
#[derive(Clone, Debug, Default)]
pub struct Limits {
    pub max_width: Option<u64>,
    pub max_height: Option<u64>,
    /// Maximum pixel count (width * height).
    pub max_pixels: Option<u64>,
    /// Maximum bytes for the destination buffer plus its palette.
    pub max_memory_bytes: Option<u64>,
}

impl Limits {
    /// Storage cap used by [`decode`](crate::decode): 64 MiB, the same bound
    /// the `png` crate puts on its own allocations.
    pub const DEFAULT_MAX_MEMORY: u64 = 64 * 1024 * 1024;

    /// Limits that only bound buffer plus palette storage.
    pub fn memory(bytes: u64) -> Self {
        Self {
            max_memory_bytes: Some(bytes),
            ..Default::default()
        }
    }

    /// Limits for a device whose textures may not exceed `side` pixels in
    /// either direction.
    pub fn max_texture(side: u32) -> Self {
        Self {
            max_width: Some(u64::from(side)),
            max_height: Some(u64::from(side)),
            ..Default::default()
        }
    }

    /// Check source dimensions.
    pub(crate) fn check(&self, width: u32, height: u32) -> Result<(), LoadError> {
        if let Some(max_w) = self.max_width {
            if u64::from(width) > max_w {
                return Err(LoadError::LimitExceeded(alloc::format!(
                    "width {width} exceeds limit {max_w}"
                )));
            }
        }
        if let Some(max_h) = self.max_height {
            if u64::from(height) > max_h {
                return Err(LoadError::LimitExceeded(alloc::format!(
                    "height {height} exceeds limit {max_h}"
                )));
            }
        }
        if let Some(max_px) = self.max_pixels {
            let pixels = u64::from(width) * u64::from(height);
            if pixels > max_px {
                return Err(LoadError::LimitExceeded(alloc::format!(
                    "pixel count {pixels} exceeds limit {max_px}"
                )));
            }
        }
        Ok(())
    }

    /// Check the combined size of buffer and palette storage.
    pub(crate) fn check_memory(&self, buffer: usize, palette: usize) -> Result<(), LoadError> {
        if let Some(max_mem) = self.max_memory_bytes {
            let total = buffer as u64 + palette as u64;
            if total > max_mem {
                return Err(LoadError::LimitExceeded(alloc::format!(
                    "buffer {buffer} + palette {palette} bytes exceeds memory limit {max_mem}"
                )));
            }
        }
        Ok(())
    }
}
