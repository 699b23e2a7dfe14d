/// PNG colour type, as declared in IHDR.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorType {
    Grayscale,
    GrayscaleAlpha,
    Rgb,
    Rgba,
    Paletted,
}

impl ColorType {
    /// Channels per pixel in the source data.
    pub fn channels(&self) -> u8 {
        match self {
            Self::Grayscale | Self::Paletted => 1,
            Self::GrayscaleAlpha => 2,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }

    pub fn has_alpha(&self) -> bool {
        matches!(self, Self::GrayscaleAlpha | Self::Rgba)
    }

    pub fn is_gray(&self) -> bool {
        matches!(self, Self::Grayscale | Self::GrayscaleAlpha)
    }
}

/// Header fields read by the decode session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub width: u32,
    pub height: u32,
    /// Bits per sample: 1, 2, 4, 8 or 16.
    pub bit_depth: u8,
    pub color_type: ColorType,
    pub interlaced: bool,
}

/// What a successful [`PngLoader::probe`](crate::PngLoader::probe) learned
/// about the image.
///
/// Only the loader can build one, so holding an `ImageInfo` proves the probe
/// succeeded.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: ColorType,
    /// Channel count before any output transform.
    pub channels: u8,
    /// PLTE entry count as stored in the file; 0 when not paletted.
    pub palette_size: usize,
    pub interlaced: bool,
}

impl ImageInfo {
    pub(crate) fn new(header: &Header, palette_size: usize) -> Self {
        Self {
            width: header.width,
            height: header.height,
            bit_depth: header.bit_depth,
            color_type: header.color_type,
            channels: header.color_type.channels(),
            palette_size,
            interlaced: header.interlaced,
        }
    }

    pub fn is_paletted(&self) -> bool {
        self.palette_size > 0
    }
}
