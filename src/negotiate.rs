//! Choice of destination formats for a probed image.

use crate::error::LoadError;
use crate::info::ImageInfo;
use crate::pixel::PixelFormat;

/// Storage format and size of the destination palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaletteFormat {
    pub entry_format: PixelFormat,
    /// Entry count after rounding up to what the index width can address.
    pub entries: usize,
}

/// Formats the destination buffer (and palette) are given.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputFormat {
    pub buffer: PixelFormat,
    pub palette: Option<PaletteFormat>,
}

/// Pick the destination formats for `info`.
///
/// | source                     | buffer         | palette entries |
/// |----------------------------|----------------|-----------------|
/// | paletted, 4-bit            | `Palette4Bit`  | 16              |
/// | paletted, 8-bit            | `Palette8Bit`  | 256             |
/// | paletted, other bit depths | `BadFile`      |                 |
/// | anything else              | `Rgba8888`     | none            |
pub fn negotiate(info: &ImageInfo, entry_format: PixelFormat) -> Result<OutputFormat, LoadError> {
    if !info.is_paletted() {
        return Ok(OutputFormat {
            buffer: PixelFormat::Rgba8888,
            palette: None,
        });
    }

    let buffer = match info.bit_depth {
        4 => PixelFormat::Palette4Bit,
        8 => PixelFormat::Palette8Bit,
        bits => {
            log::error!("too many bits per pixel[{bits}] for a palette");
            return Err(LoadError::BadFile(alloc::format!(
                "{bits} bits per pixel is unsupported for a palette"
            )));
        }
    };
    let entries = buffer.palette_entries().unwrap_or(0);
    if info.palette_size > entries {
        log::warn!(
            "palette has {} entries, only the first {entries} are addressable",
            info.palette_size
        );
    }
    Ok(OutputFormat {
        buffer,
        palette: Some(PaletteFormat {
            entry_format,
            entries,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Status;
    use crate::info::{ColorType, Header};

    fn info(bit_depth: u8, color_type: ColorType, palette_size: usize) -> ImageInfo {
        let header = Header {
            width: 8,
            height: 8,
            bit_depth,
            color_type,
            interlaced: false,
        };
        ImageInfo::new(&header, palette_size)
    }

    #[test]
    fn paletted_depths_follow_table() {
        for size in [1usize, 3, 16, 200, 256] {
            for depth in [1u8, 2, 4, 8] {
                let result = negotiate(&info(depth, ColorType::Paletted, size), PixelFormat::Rgba8888);
                match depth {
                    4 => {
                        let out = result.unwrap();
                        assert_eq!(out.buffer, PixelFormat::Palette4Bit);
                        assert_eq!(out.palette.unwrap().entries, 16);
                    }
                    8 => {
                        let out = result.unwrap();
                        assert_eq!(out.buffer, PixelFormat::Palette8Bit);
                        assert_eq!(out.palette.unwrap().entries, 256);
                    }
                    _ => assert_eq!(result.unwrap_err().status(), Status::BadFile),
                }
            }
        }
    }

    #[test]
    fn direct_colour_is_rgba8888() {
        for (depth, ct) in [
            (8, ColorType::Rgb),
            (16, ColorType::Rgba),
            (1, ColorType::Grayscale),
            (16, ColorType::GrayscaleAlpha),
        ] {
            let out = negotiate(&info(depth, ct, 0), PixelFormat::Rgba4444).unwrap();
            assert_eq!(out.buffer, PixelFormat::Rgba8888);
            assert_eq!(out.palette, None);
        }
    }

    #[test]
    fn entry_format_is_passed_through() {
        let out = negotiate(&info(8, ColorType::Paletted, 4), PixelFormat::Rgba4444).unwrap();
        assert_eq!(out.palette.unwrap().entry_format, PixelFormat::Rgba4444);
    }
}
