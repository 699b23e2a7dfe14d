use alloc::vec::Vec;
use std::io::Read;

use crate::buffer::DestinationBuffer;
use crate::error::LoadError;
use crate::info::{ColorType, ImageInfo};
use crate::limits::Limits;
use crate::negotiate::{OutputFormat, negotiate};
use crate::palette::DestinationPalette;
use crate::pixel::{PixelFormat, SizeBy};
use crate::png_session::PngSession;
use crate::session::{DecodeSession, Transform};

/// Row geometry used by the decode loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowLayout {
    pub channels: u8,
    /// Bytes read from the session per row.
    pub stride: usize,
}

/// Settle the row geometry reported by a session after transforms were
/// requested.
///
/// Some libpng versions do not update their channel count or row bytes after
/// an alpha filler is requested, yet emit four bytes per pixel. A reported
/// three-channel layout that still measures three bytes per pixel is taken to
/// be that case and widened to four channels.
pub fn reconcile_row_layout(width: u32, channels: u8, stride: usize) -> RowLayout {
    if channels == 3 && width > 0 && stride / width as usize == 3 {
        let stride = width as usize * 4;
        log::debug!("session reported 3 channels after alpha fill; using 4, rowBytes[{stride}]");
        return RowLayout { channels: 4, stride };
    }
    RowLayout { channels, stride }
}

/// Two-phase PNG loader: [`probe`](Self::probe) the header, then
/// [`allocate`](Self::allocate) and [`decode_into`](Self::decode_into) the
/// caller's destination.
///
/// ```no_run
/// use pngtex::{Buffer, Palette, PngLoader, SizeBy};
///
/// let file = std::fs::File::open("sprite.png")?;
/// let mut loader = PngLoader::new(std::io::BufReader::new(file)).with_size_by(SizeBy::PowerOfTwo);
/// let (mut buffer, mut palette) = (Buffer::new(), Palette::new());
///
/// let info = loader.probe()?;
/// loader.allocate(&info, &mut buffer, &mut palette)?;
/// loader.decode_into(&info, &mut buffer, &mut palette)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct PngLoader<S: DecodeSession> {
    session: Option<S>,
    probed: bool,
    decoded: bool,
    limits: Limits,
    size_by: SizeBy,
    palette_format: PixelFormat,
}

impl<R: Read> PngLoader<PngSession<R>> {
    pub fn new(source: R) -> Self {
        Self::with_session(PngSession::new(source))
    }
}

impl<S: DecodeSession> PngLoader<S> {
    /// Drive an already constructed decode session.
    pub fn with_session(session: S) -> Self {
        Self {
            session: Some(session),
            probed: false,
            decoded: false,
            limits: Limits::default(),
            size_by: SizeBy::Exact,
            palette_format: PixelFormat::Rgba8888,
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_size_by(mut self, size_by: SizeBy) -> Self {
        self.size_by = size_by;
        self
    }

    /// Storage format for palette entries.
    ///
    /// Defaults to [`PixelFormat::Rgba8888`] so palette colours read back
    /// exactly. Displays whose colour lookup table takes packed 16-bit
    /// entries want [`PixelFormat::Rgba4444`], which keeps only the high
    /// nibble of each channel. Paletted formats cannot hold a colour and
    /// fall back to `Rgba8888`.
    pub fn with_palette_format(mut self, format: PixelFormat) -> Self {
        self.palette_format = if format.is_palette() {
            log::warn!("{format:?} cannot store palette colours, using Rgba8888");
            PixelFormat::Rgba8888
        } else {
            format
        };
        self
    }

    fn session(&mut self) -> Result<&mut S, LoadError> {
        self.session
            .as_mut()
            .ok_or_else(|| LoadError::BadFile("loader already closed".into()))
    }

    /// Read the header and report what the image holds.
    pub fn probe(&mut self) -> Result<ImageInfo, LoadError> {
        let session = self.session()?;
        let header = session.read_info().inspect_err(|e| {
            log::error!("failed to get image dimensions: {e}");
        })?;

        let palette_size = if header.color_type == ColorType::Paletted {
            match session.palette() {
                Some(plte) => plte.len() / 3,
                None => {
                    log::error!("paletted image has no valid PLTE chunk");
                    return Err(LoadError::BadFile("paletted image without a PLTE chunk".into()));
                }
            }
        } else {
            0
        };

        let info = ImageInfo::new(&header, palette_size);
        log::debug!(
            "width[{}], height[{}], paletteSize[{}], bitDepth[{}], channels[{}], rowBytes[{}]",
            info.width,
            info.height,
            info.palette_size,
            info.bit_depth,
            info.channels,
            session.row_bytes()
        );
        self.probed = true;
        Ok(info)
    }

    /// Size and format the destination for `info`.
    pub fn allocate<B, P>(
        &self,
        info: &ImageInfo,
        buffer: &mut B,
        palette: &mut P,
    ) -> Result<OutputFormat, LoadError>
    where
        B: DestinationBuffer + ?Sized,
        P: DestinationPalette + ?Sized,
    {
        let format = negotiate(info, self.palette_format)?;

        self.limits.check(info.width, info.height)?;
        let too_large = || LoadError::DimensionsTooLarge {
            width: info.width,
            height: info.height,
        };
        let (w, h) = self.size_by.apply(info.width, info.height).ok_or_else(too_large)?;
        let buffer_bytes = format
            .buffer
            .pixels_to_bytes(w as usize)
            .checked_mul(h as usize)
            .ok_or_else(too_large)?;
        let palette_bytes = format
            .palette
            .map_or(0, |p| p.entries * p.entry_format.pixels_to_bytes(1));
        self.limits.check_memory(buffer_bytes, palette_bytes)?;

        buffer.set_size(info.width, info.height, self.size_by);
        buffer.set_pixel_format(format.buffer);
        if let Some(p) = format.palette {
            palette.set_pixel_formats(p.entry_format, format.buffer);
        }

        if !buffer.allocate() {
            log::error!("failed to allocate buffer");
            return Err(LoadError::OutOfMemory(alloc::format!(
                "buffer of {buffer_bytes} bytes"
            )));
        }
        if buffer.has_palette() && !palette.allocate() {
            log::error!("failed to allocate palette");
            return Err(LoadError::OutOfMemory(alloc::format!(
                "palette of {palette_bytes} bytes"
            )));
        }
        Ok(format)
    }

    /// Decode every row of the probed image into `buffer`, filling `palette`
    /// for paletted sources.
    ///
    /// The buffer contents are unspecified if this fails.
    pub fn decode_into<B, P>(
        &mut self,
        info: &ImageInfo,
        buffer: &mut B,
        palette: &mut P,
    ) -> Result<RowLayout, LoadError>
    where
        B: DestinationBuffer + ?Sized,
        P: DestinationPalette + ?Sized,
    {
        if !self.probed {
            return Err(LoadError::BadFile("decode requested before a successful probe".into()));
        }
        if self.decoded {
            return Err(LoadError::BadFile("image already decoded by this loader".into()));
        }
        self.decoded = true;
        let session = self.session()?;

        session.set_transform(Transform::Strip16);
        if info.is_paletted() {
            let plte = session
                .palette()
                .ok_or_else(|| LoadError::BadFile("PLTE chunk vanished after probe".into()))?;
            let alphas = session.transparency().unwrap_or(&[]);
            for (i, rgb) in plte.chunks_exact(3).enumerate() {
                let alpha = alphas.get(i).copied().unwrap_or(0xFF);
                palette.set_single_color_rgba(i, rgb[0], rgb[1], rgb[2], alpha);
            }
        } else {
            if info.color_type == ColorType::Grayscale && info.bit_depth < 8 {
                session.set_transform(Transform::ExpandGray);
            }
            if session.transparency().is_some() {
                session.set_transform(Transform::TrnsToAlpha);
            }
            if info.color_type.is_gray() {
                session.set_transform(Transform::GrayToRgb);
            }
            session.set_transform(Transform::AddAlpha { filler: 0xFF });
        }

        let layout = reconcile_row_layout(info.width, session.channels(), session.row_bytes());
        log::debug!("rowBytes[{}], channels[{}]", layout.stride, layout.channels);
        if layout.stride == 0 {
            return Err(LoadError::BadFile("session reports empty rows".into()));
        }

        let mut line = Vec::new();
        if line.try_reserve_exact(layout.stride).is_err() {
            log::error!("couldn't allocate line");
            return Err(LoadError::OutOfMemory(alloc::format!(
                "row of {} bytes",
                layout.stride
            )));
        }
        line.resize(layout.stride, 0u8);

        for y in 0..info.height {
            session.read_row(&mut line).inspect_err(|e| {
                log::error!("row {y}: {e}");
            })?;
            buffer.copy_from_rect(&line, layout.stride, 0, y, info.width, 1);
        }
        drop(line);
        session.read_end()?;

        // PNG packs the leftmost pixel in the high nibble; the display reads
        // it from the low one.
        if info.is_paletted() && info.bit_depth == 4 {
            buffer.flip_nibbles();
        }
        log::debug!("succeeded in loading image");
        Ok(layout)
    }

    /// Probe, allocate and decode in one call.
    pub fn load<B, P>(&mut self, buffer: &mut B, palette: &mut P) -> Result<ImageInfo, LoadError>
    where
        B: DestinationBuffer + ?Sized,
        P: DestinationPalette + ?Sized,
    {
        let info = self.probe()?;
        self.allocate(&info, buffer, palette)?;
        self.decode_into(&info, buffer, palette)?;
        Ok(info)
    }

    /// Release the decode session. Safe to call more than once.
    pub fn close(&mut self) {
        if self.session.take().is_some() {
            log::trace!("decode session released");
        }
    }
}

impl<S: DecodeSession> Drop for PngLoader<S> {
    fn drop(&mut self) {
        self.close();
    }
}
