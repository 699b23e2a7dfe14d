use alloc::vec::Vec;

use crate::pixel::PixelFormat;

/// Colour table for paletted destination buffers.
pub trait DestinationPalette {
    /// `entry_format` is how each colour is stored; `buffer_format` is the
    /// paletted buffer format that decides how many entries exist.
    fn set_pixel_formats(&mut self, entry_format: PixelFormat, buffer_format: PixelFormat);
    /// Returns false when memory is exhausted.
    fn allocate(&mut self) -> bool;
    fn set_single_color_rgba(&mut self, index: usize, r: u8, g: u8, b: u8, a: u8);
}

/// In-memory palette.
#[derive(Clone, Debug)]
pub struct Palette {
    entry_format: PixelFormat,
    entries: usize,
    data: Vec<u8>,
    memory_budget: Option<usize>,
}

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}

impl Palette {
    pub fn new() -> Self {
        Self {
            entry_format: PixelFormat::Rgba8888,
            entries: 0,
            data: Vec::new(),
            memory_budget: None,
        }
    }

    /// A palette whose `allocate` fails past `bytes`.
    pub fn with_memory_budget(bytes: usize) -> Self {
        Self {
            memory_budget: Some(bytes),
            ..Self::new()
        }
    }

    fn entry_bytes(&self) -> usize {
        self.entry_format.pixels_to_bytes(1)
    }

    /// Number of allocated entries.
    pub fn len(&self) -> usize {
        self.data.len() / self.entry_bytes().max(1)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn entry_format(&self) -> PixelFormat {
        self.entry_format
    }

    /// Packed entries, little-endian.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Entry `index` expanded back to RGBA.
    pub fn color(&self, index: usize) -> Option<[u8; 4]> {
        let n = self.entry_bytes();
        let raw = self.data.get(index * n..index * n + n)?;
        let mut le = [0u8; 4];
        le[..n].copy_from_slice(raw);
        Some(self.entry_format.unpack(u32::from_le_bytes(le)))
    }

    /// All entries as typed RGBA pixels.
    #[cfg(feature = "rgb")]
    pub fn colors(&self) -> Vec<rgb::RGBA8> {
        (0..self.len())
            .filter_map(|i| self.color(i))
            .map(|[r, g, b, a]| rgb::RGBA8::new(r, g, b, a))
            .collect()
    }
}

impl DestinationPalette for Palette {
    fn set_pixel_formats(&mut self, entry_format: PixelFormat, buffer_format: PixelFormat) {
        self.entry_format = entry_format;
        self.entries = buffer_format.palette_entries().unwrap_or(0);
    }

    fn allocate(&mut self) -> bool {
        let bytes = self.entries * self.entry_bytes();
        if self.memory_budget.is_some_and(|budget| bytes > budget) {
            return false;
        }
        let mut data = Vec::new();
        if data.try_reserve_exact(bytes).is_err() {
            return false;
        }
        data.resize(bytes, 0);
        self.data = data;
        true
    }

    fn set_single_color_rgba(&mut self, index: usize, r: u8, g: u8, b: u8, a: u8) {
        let n = self.entry_bytes();
        let packed = self.entry_format.pack(r, g, b, a).to_le_bytes();
        match self.data.get_mut(index * n..index * n + n) {
            Some(dst) => dst.copy_from_slice(&packed[..n]),
            None => log::warn!("palette index {index} outside {} entries", self.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_count_follows_buffer_format() {
        let mut pal = Palette::new();
        pal.set_pixel_formats(PixelFormat::Rgba4444, PixelFormat::Palette4Bit);
        assert!(pal.allocate());
        assert_eq!(pal.len(), 16);
        assert_eq!(pal.as_bytes().len(), 32);

        pal.set_pixel_formats(PixelFormat::Rgba8888, PixelFormat::Palette8Bit);
        assert!(pal.allocate());
        assert_eq!(pal.len(), 256);
    }

    #[test]
    fn colors_pack_into_entry_format() {
        let mut pal = Palette::new();
        pal.set_pixel_formats(PixelFormat::Rgba4444, PixelFormat::Palette4Bit);
        assert!(pal.allocate());
        pal.set_single_color_rgba(1, 0xFF, 0x00, 0x80, 0xFF);
        assert_eq!(pal.color(1), Some([0xFF, 0x00, 0x88, 0xFF]));
        assert_eq!(pal.color(0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn out_of_range_index_is_ignored() {
        let mut pal = Palette::new();
        pal.set_pixel_formats(PixelFormat::Rgba8888, PixelFormat::Palette4Bit);
        assert!(pal.allocate());
        pal.set_single_color_rgba(16, 1, 2, 3, 4);
        assert_eq!(pal.color(16), None);
        assert!(pal.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn budget_fails_allocation() {
        let mut pal = Palette::with_memory_budget(100);
        pal.set_pixel_formats(PixelFormat::Rgba8888, PixelFormat::Palette8Bit);
        assert!(!pal.allocate());
    }
}
