//! [`DecodeSession`] backed by the `png` crate.

use alloc::format;
use alloc::vec;
use alloc::vec::Vec;
use std::io::Read;

use png::{BitDepth, Decoder, DecodingError, Reader, Transformations};

use crate::error::LoadError;
use crate::info::{ColorType, Header};
use crate::session::{DecodeSession, Transform};
use crate::transform::{RowPlan, TransformSet};

/// Decode session over any byte source.
///
/// The stream is opened with the `png` crate's identity transform, so rows
/// arrive exactly as stored; the [`Transform`]s requested through
/// [`DecodeSession::set_transform`] are applied here, row by row.
///
/// Interlaced images are de-interlaced into a full frame on the first
/// [`read_row`](DecodeSession::read_row) and served from memory afterwards.
pub struct PngSession<R: Read> {
    source: Option<R>,
    reader: Option<Reader<R>>,
    header: Option<Header>,
    palette: Option<Vec<u8>>,
    trns: Option<Vec<u8>>,
    transforms: TransformSet,
    plan: Option<RowPlan>,
    /// De-interlaced frame and its stored row size.
    frame: Option<(Vec<u8>, usize)>,
    scratch: Vec<u8>,
    next_row: u32,
}

impl<R: Read> PngSession<R> {
    pub fn new(source: R) -> Self {
        Self {
            source: Some(source),
            reader: None,
            header: None,
            palette: None,
            trns: None,
            transforms: TransformSet::default(),
            plan: None,
            frame: None,
            scratch: Vec::new(),
            next_row: 0,
        }
    }

    fn plan(&self) -> Option<RowPlan> {
        let header = self.header.as_ref()?;
        Some(RowPlan::new(header, self.transforms, self.trns.as_deref()))
    }

    fn reader(&mut self) -> Result<&mut Reader<R>, LoadError> {
        self.reader
            .as_mut()
            .ok_or_else(|| LoadError::BadFile("decode session is not open".into()))
    }

    /// Fetch the next stored row into `self.scratch`.
    fn next_raw_row(&mut self, header: &Header) -> Result<(), LoadError> {
        if header.interlaced {
            if self.frame.is_none() {
                let reader = self.reader()?;
                let mut buf = vec![0u8; reader.output_buffer_size()];
                let out = reader.next_frame(&mut buf).map_err(fatal)?;
                log::trace!("de-interlaced {} bytes, line size {}", buf.len(), out.line_size);
                self.frame = Some((buf, out.line_size));
            }
            let Some((frame, line)) = self.frame.as_ref() else {
                return Err(LoadError::Fatal("interlaced frame missing".into()));
            };
            let start = self.next_row as usize * line;
            let row = frame
                .get(start..start + line)
                .ok_or_else(|| LoadError::Fatal(format!("row {} past end of image", self.next_row)))?;
            self.scratch.clear();
            self.scratch.extend_from_slice(row);
            return Ok(());
        }

        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| LoadError::BadFile("decode session is not open".into()))?;
        let Some(row) = reader.next_row().map_err(fatal)? else {
            return Err(LoadError::Fatal(format!("row {} past end of image", self.next_row)));
        };
        let data = row.data();
        self.scratch.clear();
        self.scratch.extend_from_slice(data);
        Ok(())
    }
}

impl<R: Read> DecodeSession for PngSession<R> {
    fn read_info(&mut self) -> Result<Header, LoadError> {
        let source = self
            .source
            .take()
            .ok_or_else(|| LoadError::BadFile("decode session already opened".into()))?;

        let mut decoder = Decoder::new(source);
        decoder.set_transformations(Transformations::IDENTITY);
        let reader = decoder.read_info().map_err(bad_file)?;

        let info = reader.info();
        let header = Header {
            width: info.width,
            height: info.height,
            bit_depth: match info.bit_depth {
                BitDepth::One => 1,
                BitDepth::Two => 2,
                BitDepth::Four => 4,
                BitDepth::Eight => 8,
                BitDepth::Sixteen => 16,
            },
            color_type: match info.color_type {
                png::ColorType::Grayscale => ColorType::Grayscale,
                png::ColorType::GrayscaleAlpha => ColorType::GrayscaleAlpha,
                png::ColorType::Rgb => ColorType::Rgb,
                png::ColorType::Rgba => ColorType::Rgba,
                png::ColorType::Indexed => ColorType::Paletted,
            },
            interlaced: info.interlaced,
        };
        let palette = info
            .palette
            .as_ref()
            .filter(|p| !p.is_empty() && p.len() % 3 == 0)
            .map(|p| p.to_vec());
        let trns = info.trns.as_ref().map(|t| t.to_vec());

        if header.color_type == ColorType::Paletted {
            if let Some(p) = &palette {
                let entries = p.len() / 3;
                if entries > 1 << header.bit_depth {
                    log::warn!(
                        "PLTE has {entries} entries but {}-bit indices reach only {}",
                        header.bit_depth,
                        1 << header.bit_depth
                    );
                }
                if let Some(t) = &trns {
                    if t.len() > entries {
                        log::warn!("tRNS has {} entries for a {entries}-entry palette", t.len());
                    }
                }
            }
        }

        self.header = Some(header);
        self.palette = palette;
        self.trns = trns;
        self.reader = Some(reader);
        Ok(header)
    }

    fn channels(&self) -> u8 {
        self.plan().map_or(0, |p| p.channels())
    }

    fn palette(&self) -> Option<&[u8]> {
        self.palette.as_deref()
    }

    fn transparency(&self) -> Option<&[u8]> {
        self.trns.as_deref()
    }

    fn set_transform(&mut self, transform: Transform) {
        if self.plan.is_some() {
            log::warn!("ignoring {transform:?} requested after rows were read");
            return;
        }
        self.transforms.insert(transform);
    }

    fn row_bytes(&self) -> usize {
        self.plan().map_or(0, |p| p.row_bytes())
    }

    fn read_row(&mut self, row: &mut [u8]) -> Result<(), LoadError> {
        let header = self
            .header
            .ok_or_else(|| LoadError::BadFile("read_row before read_info".into()))?;
        if self.next_row >= header.height {
            return Err(LoadError::Fatal(format!(
                "row {} past end of {}-row image",
                self.next_row, header.height
            )));
        }
        if self.plan.is_none() {
            self.plan = self.plan();
        }

        self.next_raw_row(&header)?;
        if let Some(plan) = &self.plan {
            plan.apply(&self.scratch, row);
        }
        self.next_row += 1;
        Ok(())
    }

    fn read_end(&mut self) -> Result<(), LoadError> {
        let reader = self.reader()?;
        reader.finish().map_err(fatal)?;
        self.frame = None;
        Ok(())
    }
}

fn bad_file(e: DecodingError) -> LoadError {
    LoadError::BadFile(format!("{e}"))
}

fn fatal(e: DecodingError) -> LoadError {
    log::error!("PNG decode error: {e}");
    LoadError::Fatal(format!("{e}"))
}
