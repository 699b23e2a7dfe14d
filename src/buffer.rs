use alloc::vec::Vec;

use crate::pixel::{PixelFormat, SizeBy};

/// Where decoded rows end up.
///
/// The loader calls `set_size`, `set_pixel_format` and `allocate` while
/// negotiating the output, then `copy_from_rect` once per row, then
/// `flip_nibbles` for 4-bit paletted sources.
pub trait DestinationBuffer {
    fn set_size(&mut self, width: u32, height: u32, size_by: SizeBy);
    fn set_pixel_format(&mut self, format: PixelFormat);
    /// Allocate storage for the current size and format. Returns false when
    /// memory is exhausted.
    fn allocate(&mut self) -> bool;
    fn has_palette(&self) -> bool;
    /// Copy a `width`x`height` block from `data`, whose rows are `stride`
    /// bytes apart, to (`x`, `y`).
    fn copy_from_rect(&mut self, data: &[u8], stride: usize, x: u32, y: u32, width: u32, height: u32);
    /// Swap the two halves of every stored byte.
    fn flip_nibbles(&mut self);
}

/// In-memory pixel buffer.
#[derive(Clone, Debug)]
pub struct Buffer {
    source_width: u32,
    source_height: u32,
    width: u32,
    height: u32,
    format: PixelFormat,
    pixels: Vec<u8>,
    memory_budget: Option<usize>,
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Buffer {
    pub fn new() -> Self {
        Self {
            source_width: 0,
            source_height: 0,
            width: 0,
            height: 0,
            format: PixelFormat::Rgba8888,
            pixels: Vec::new(),
            memory_budget: None,
        }
    }

    /// A buffer whose `allocate` fails past `bytes`.
    pub fn with_memory_budget(bytes: usize) -> Self {
        Self {
            memory_budget: Some(bytes),
            ..Self::new()
        }
    }

    /// Storage width in pixels (may exceed the image width).
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width of the image the buffer was sized for.
    pub fn source_width(&self) -> u32 {
        self.source_width
    }

    pub fn source_height(&self) -> u32 {
        self.source_height
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.format
    }

    pub fn bytes_per_row(&self) -> usize {
        self.format.pixels_to_bytes(self.width as usize)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn row(&self, y: u32) -> Option<&[u8]> {
        let bpr = self.bytes_per_row();
        let start = (y as usize).checked_mul(bpr)?;
        self.pixels.get(start..start + bpr)
    }

    /// Zero-copy view of a 32-bit buffer as typed pixels, stride included.
    ///
    /// Returns `None` unless the format is [`PixelFormat::Rgba8888`].
    #[cfg(feature = "imgref")]
    pub fn as_imgref(&self) -> Option<imgref::ImgRef<'_, rgb::RGBA8>> {
        use rgb::AsPixels as _;

        if self.format != PixelFormat::Rgba8888 || self.pixels.is_empty() {
            return None;
        }
        let pixels: &[rgb::RGBA8] = self.pixels.as_pixels();
        Some(imgref::ImgRef::new_stride(
            pixels,
            self.source_width as usize,
            self.source_height as usize,
            self.width as usize,
        ))
    }
}

impl DestinationBuffer for Buffer {
    fn set_size(&mut self, width: u32, height: u32, size_by: SizeBy) {
        self.source_width = width;
        self.source_height = height;
        // Sizes past u32::MAX / 2 + 1 cannot round up; allocate() rejects them.
        let (w, h) = size_by.apply(width, height).unwrap_or((u32::MAX, u32::MAX));
        self.width = w;
        self.height = h;
    }

    fn set_pixel_format(&mut self, format: PixelFormat) {
        self.format = format;
    }

    fn allocate(&mut self) -> bool {
        let Some(bytes) = self.bytes_per_row().checked_mul(self.height as usize) else {
            return false;
        };
        if self.memory_budget.is_some_and(|budget| bytes > budget) {
            log::debug!("buffer of {bytes} bytes exceeds budget {:?}", self.memory_budget);
            return false;
        }
        let mut pixels = Vec::new();
        if pixels.try_reserve_exact(bytes).is_err() {
            return false;
        }
        pixels.resize(bytes, 0);
        self.pixels = pixels;
        true
    }

    fn has_palette(&self) -> bool {
        self.format.is_palette()
    }

    fn copy_from_rect(&mut self, data: &[u8], stride: usize, x: u32, y: u32, width: u32, height: u32) {
        let bpr = self.bytes_per_row();
        let offset = self.format.pixels_to_bytes(x as usize);
        let len = self
            .format
            .pixels_to_bytes(width as usize)
            .min(bpr.saturating_sub(offset));

        for r in 0..height as usize {
            let dy = y as usize + r;
            if dy >= self.height as usize {
                break;
            }
            let Some(src) = data.get(r * stride..r * stride + len) else {
                log::warn!("source row {r} shorter than {len} bytes");
                break;
            };
            let start = dy * bpr + offset;
            if let Some(dst) = self.pixels.get_mut(start..start + len) {
                dst.copy_from_slice(src);
            }
        }
    }

    fn flip_nibbles(&mut self) {
        for b in self.pixels.iter_mut() {
            *b = b.rotate_left(4);
        }
    }
}
