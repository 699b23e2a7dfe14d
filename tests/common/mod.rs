//! PNG fixture builder.
//!
//! Writes chunks by hand so tests can produce files an encoder would refuse
//! to: interlaced layouts, paletted images without PLTE, truncated streams.

#![allow(dead_code)]

use std::io::Write;

use flate2::Crc;
use flate2::Compression;
use flate2::write::ZlibEncoder;

pub const GRAY: u8 = 0;
pub const RGB: u8 = 2;
pub const PALETTE: u8 = 3;
pub const GRAY_ALPHA: u8 = 4;
pub const RGBA: u8 = 6;

pub struct PngBuilder {
    width: u32,
    height: u32,
    bit_depth: u8,
    color_type: u8,
    interlaced: bool,
    plte: Option<Vec<u8>>,
    trns: Option<Vec<u8>>,
    scanlines: Vec<u8>,
}

impl PngBuilder {
    pub fn new(width: u32, height: u32, bit_depth: u8, color_type: u8) -> Self {
        Self {
            width,
            height,
            bit_depth,
            color_type,
            interlaced: false,
            plte: None,
            trns: None,
            scanlines: Vec::new(),
        }
    }

    pub fn palette(mut self, rgb: &[u8]) -> Self {
        self.plte = Some(rgb.to_vec());
        self
    }

    pub fn trns(mut self, data: &[u8]) -> Self {
        self.trns = Some(data.to_vec());
        self
    }

    /// Stored rows, each prefixed with filter type 0.
    pub fn rows(mut self, rows: &[&[u8]]) -> Self {
        for row in rows {
            self.scanlines.push(0);
            self.scanlines.extend_from_slice(row);
        }
        self
    }

    /// Mark as Adam7 interlaced. `rows` must then hold the reduced images
    /// pass by pass.
    pub fn interlaced(mut self) -> Self {
        self.interlaced = true;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

        let mut ihdr = Vec::new();
        ihdr.extend_from_slice(&self.width.to_be_bytes());
        ihdr.extend_from_slice(&self.height.to_be_bytes());
        ihdr.extend_from_slice(&[
            self.bit_depth,
            self.color_type,
            0,
            0,
            u8::from(self.interlaced),
        ]);
        chunk(&mut out, b"IHDR", &ihdr);

        if let Some(plte) = &self.plte {
            chunk(&mut out, b"PLTE", plte);
        }
        if let Some(trns) = &self.trns {
            chunk(&mut out, b"tRNS", trns);
        }

        let mut z = ZlibEncoder::new(Vec::new(), Compression::default());
        z.write_all(&self.scanlines).unwrap();
        chunk(&mut out, b"IDAT", &z.finish().unwrap());
        chunk(&mut out, b"IEND", &[]);
        out
    }
}

pub fn chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    let mut crc = Crc::new();
    crc.update(kind);
    crc.update(data);
    out.extend_from_slice(&crc.sum().to_be_bytes());
}

/// 2x2 opaque RGB checker used by several tests.
pub fn rgb_2x2() -> PngBuilder {
    PngBuilder::new(2, 2, 8, RGB).rows(&[&[255, 0, 0, 0, 255, 0], &[0, 0, 255, 40, 50, 60]])
}
