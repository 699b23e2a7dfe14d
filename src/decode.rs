use std::io::Cursor;

use crate::buffer::{Buffer, DestinationBuffer};
use crate::error::LoadError;
use crate::info::ImageInfo;
use crate::limits::Limits;
use crate::loader::{PngLoader, RowLayout};
use crate::palette::Palette;
use crate::pixel::{PixelFormat, SizeBy};

/// Decoded image in freshly allocated in-memory destinations.
#[derive(Clone, Debug)]
pub struct Decoded {
    pub info: ImageInfo,
    pub buffer: Buffer,
    /// Present for paletted images only.
    pub palette: Option<Palette>,
    pub layout: RowLayout,
}

impl Decoded {
    /// The destination format the image was decoded to.
    pub fn pixel_format(&self) -> PixelFormat {
        self.buffer.pixel_format()
    }

    /// RGBA of the pixel at (`x`, `y`), looking paletted pixels up in the
    /// palette.
    pub fn rgba_at(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.info.width || y >= self.info.height {
            return None;
        }
        let row = self.buffer.row(y)?;
        let x = x as usize;
        match self.buffer.pixel_format() {
            PixelFormat::Palette8Bit => self.palette.as_ref()?.color(usize::from(*row.get(x)?)),
            PixelFormat::Palette4Bit => {
                // nibbles are stored low-first
                let byte = *row.get(x / 2)?;
                let index = if x % 2 == 0 { byte & 0x0F } else { byte >> 4 };
                self.palette.as_ref()?.color(usize::from(index))
            }
            format => {
                let n = format.pixels_to_bytes(1);
                let raw = row.get(x * n..x * n + n)?;
                let mut le = [0u8; 4];
                le[..n].copy_from_slice(raw);
                Some(format.unpack(u32::from_le_bytes(le)))
            }
        }
    }
}

/// Decode PNG bytes into exact-size buffers with 32-bit palette entries.
///
/// Storage is capped at [`Limits::DEFAULT_MAX_MEMORY`]; use [`decode_with`]
/// for other bounds.
pub fn decode(data: &[u8]) -> Result<Decoded, LoadError> {
    decode_with(
        data,
        SizeBy::Exact,
        PixelFormat::Rgba8888,
        Limits::memory(Limits::DEFAULT_MAX_MEMORY),
    )
}

/// Decode PNG bytes with explicit storage sizing, palette entry format and
/// limits.
pub fn decode_with(
    data: &[u8],
    size_by: SizeBy,
    palette_format: PixelFormat,
    limits: Limits,
) -> Result<Decoded, LoadError> {
    let mut loader = PngLoader::new(Cursor::new(data))
        .with_size_by(size_by)
        .with_palette_format(palette_format)
        .with_limits(limits);
    let mut buffer = Buffer::new();
    let mut palette = Palette::new();

    let info = loader.probe()?;
    loader.allocate(&info, &mut buffer, &mut palette)?;
    let layout = loader.decode_into(&info, &mut buffer, &mut palette)?;

    let palette = buffer.has_palette().then_some(palette);
    Ok(Decoded {
        info,
        buffer,
        palette,
        layout,
    })
}
