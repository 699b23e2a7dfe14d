/// Pixel formats understood by the destination buffer and palette.
///
/// The 16-bit packed formats keep red in the low bits, matching the display's
/// native ABGR ordering. They are stored little-endian.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 4-bit palette index, two pixels per byte.
    Palette4Bit,
    /// 8-bit palette index.
    Palette8Bit,
    /// 32-bit RGBA, bytes in R, G, B, A order.
    Rgba8888,
    /// 16-bit, 4 bits per channel.
    Rgba4444,
    /// 16-bit, 5 bits per colour channel and 1 alpha bit.
    Rgba5551,
    /// 16-bit, no alpha.
    Rgb565,
}

impl PixelFormat {
    pub fn bits_per_pixel(&self) -> u32 {
        match self {
            Self::Palette4Bit => 4,
            Self::Palette8Bit => 8,
            Self::Rgba4444 | Self::Rgba5551 | Self::Rgb565 => 16,
            Self::Rgba8888 => 32,
        }
    }

    /// Bytes needed to hold `pixels` pixels, rounding partial bytes up.
    pub fn pixels_to_bytes(&self, pixels: usize) -> usize {
        match self {
            Self::Palette4Bit => pixels.div_ceil(2),
            _ => pixels * (self.bits_per_pixel() as usize / 8),
        }
    }

    pub fn is_palette(&self) -> bool {
        matches!(self, Self::Palette4Bit | Self::Palette8Bit)
    }

    /// Number of palette entries a buffer in this format can index.
    pub fn palette_entries(&self) -> Option<usize> {
        match self {
            Self::Palette4Bit => Some(16),
            Self::Palette8Bit => Some(256),
            _ => None,
        }
    }

    /// Pack an RGBA colour into this format. Palette formats have no colour
    /// representation and pack to zero.
    pub fn pack(&self, r: u8, g: u8, b: u8, a: u8) -> u32 {
        let (r32, g32, b32, a32) = (u32::from(r), u32::from(g), u32::from(b), u32::from(a));
        match self {
            Self::Rgba8888 => u32::from_le_bytes([r, g, b, a]),
            Self::Rgba4444 => {
                (r32 >> 4) | ((g32 >> 4) << 4) | ((b32 >> 4) << 8) | ((a32 >> 4) << 12)
            }
            Self::Rgba5551 => {
                (r32 >> 3) | ((g32 >> 3) << 5) | ((b32 >> 3) << 10) | ((a32 >> 7) << 15)
            }
            Self::Rgb565 => (r32 >> 3) | ((g32 >> 2) << 5) | ((b32 >> 3) << 11),
            Self::Palette4Bit | Self::Palette8Bit => 0,
        }
    }

    /// Expand a packed value back to 8-bit RGBA, replicating high bits into
    /// the low ones.
    pub fn unpack(&self, v: u32) -> [u8; 4] {
        match self {
            Self::Rgba8888 => v.to_le_bytes(),
            Self::Rgba4444 => {
                let c = |s: u32| ((v >> s) & 0xF) as u8 * 0x11;
                [c(0), c(4), c(8), c(12)]
            }
            Self::Rgba5551 => {
                let c = |s: u32| {
                    let x = ((v >> s) & 0x1F) as u8;
                    (x << 3) | (x >> 2)
                };
                let a = if v & 0x8000 != 0 { 0xFF } else { 0 };
                [c(0), c(5), c(10), a]
            }
            Self::Rgb565 => {
                let r = (v & 0x1F) as u8;
                let g = ((v >> 5) & 0x3F) as u8;
                let b = ((v >> 11) & 0x1F) as u8;
                [(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2), 0xFF]
            }
            Self::Palette4Bit | Self::Palette8Bit => [0; 4],
        }
    }
}

/// How the destination buffer derives its storage dimensions from the
/// image dimensions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SizeBy {
    /// Storage matches the image exactly.
    #[default]
    Exact,
    /// Storage is rounded up to power-of-two sides, as texture units require.
    /// The image occupies the top-left corner.
    PowerOfTwo,
}

impl SizeBy {
    pub fn apply(&self, width: u32, height: u32) -> Option<(u32, u32)> {
        match self {
            Self::Exact => Some((width, height)),
            Self::PowerOfTwo => Some((
                width.checked_next_power_of_two()?,
                height.checked_next_power_of_two()?,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nibble_formats_round_up() {
        assert_eq!(PixelFormat::Palette4Bit.pixels_to_bytes(3), 2);
        assert_eq!(PixelFormat::Palette4Bit.pixels_to_bytes(4), 2);
        assert_eq!(PixelFormat::Palette8Bit.pixels_to_bytes(3), 3);
        assert_eq!(PixelFormat::Rgba8888.pixels_to_bytes(3), 12);
        assert_eq!(PixelFormat::Rgb565.pixels_to_bytes(3), 6);
    }

    #[test]
    fn palette_entry_counts() {
        assert_eq!(PixelFormat::Palette4Bit.palette_entries(), Some(16));
        assert_eq!(PixelFormat::Palette8Bit.palette_entries(), Some(256));
        assert_eq!(PixelFormat::Rgba8888.palette_entries(), None);
    }

    #[test]
    fn pack_4444_keeps_high_nibbles() {
        let v = PixelFormat::Rgba4444.pack(0x12, 0x34, 0x56, 0xFF);
        assert_eq!(v, 0xF531);
        assert_eq!(PixelFormat::Rgba4444.unpack(v), [0x11, 0x33, 0x55, 0xFF]);
    }

    #[test]
    fn pack_8888_is_lossless() {
        let v = PixelFormat::Rgba8888.pack(10, 20, 30, 40);
        assert_eq!(PixelFormat::Rgba8888.unpack(v), [10, 20, 30, 40]);
    }

    #[test]
    fn pack_5551_alpha_threshold() {
        let f = PixelFormat::Rgba5551;
        assert_eq!(f.unpack(f.pack(255, 0, 0, 0x80))[3], 0xFF);
        assert_eq!(f.unpack(f.pack(255, 0, 0, 0x7F))[3], 0);
        let f = PixelFormat::Rgb565;
        assert_eq!(f.unpack(f.pack(255, 255, 255, 0)), [255; 4]);
    }

    #[test]
    fn power_of_two_sizes() {
        assert_eq!(SizeBy::Exact.apply(3, 5), Some((3, 5)));
        assert_eq!(SizeBy::PowerOfTwo.apply(3, 5), Some((4, 8)));
        assert_eq!(SizeBy::PowerOfTwo.apply(64, 1), Some((64, 1)));
        assert_eq!(SizeBy::PowerOfTwo.apply(u32::MAX, 1), None);
    }
}
