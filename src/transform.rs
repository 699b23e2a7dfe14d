//! Per-row output transforms applied by [`PngSession`](crate::PngSession).
//!
//! Rows come out of the `png` crate in their stored layout. This module turns
//! one stored row into the layout the requested [`Transform`]s describe.

use crate::info::{ColorType, Header};
use crate::session::Transform;

/// Scale factors that widen 1, 2 and 4-bit samples to the full 0..=255 range.
const EXPAND_SCALE: [u8; 5] = [0, 0xFF, 0x55, 0, 0x11];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TransformSet {
    pub strip_16: bool,
    pub expand_gray: bool,
    pub trns_to_alpha: bool,
    pub gray_to_rgb: bool,
    pub filler: Option<u8>,
}

impl TransformSet {
    pub(crate) fn insert(&mut self, t: Transform) {
        match t {
            Transform::Strip16 => self.strip_16 = true,
            Transform::ExpandGray => self.expand_gray = true,
            Transform::TrnsToAlpha => self.trns_to_alpha = true,
            Transform::GrayToRgb => self.gray_to_rgb = true,
            Transform::AddAlpha { filler } => self.filler = Some(filler),
        }
    }
}

/// Output layout for one header and transform set.
#[derive(Clone, Debug)]
pub(crate) struct RowPlan {
    width: usize,
    depth: u8,
    color: ColorType,
    set: TransformSet,
    /// tRNS colour key as 1 (gray) or 3 (RGB) samples at source depth.
    key: Option<[u16; 3]>,
}

impl RowPlan {
    pub(crate) fn new(header: &Header, set: TransformSet, trns: Option<&[u8]>) -> Self {
        // 16-bit keys stay big-endian pairs, shallower keys are one byte per sample
        let wide = header.bit_depth == 16;
        let key_sample = |t: &[u8], i: usize| -> Option<u16> {
            if wide {
                t.get(i * 2..i * 2 + 2).map(|b| u16::from_be_bytes([b[0], b[1]]))
            } else {
                t.get(i).copied().map(u16::from)
            }
        };
        let key = match (header.color_type, trns) {
            (ColorType::Grayscale, Some(t)) => key_sample(t, 0).map(|g| [g, g, g]),
            (ColorType::Rgb, Some(t)) => {
                match (key_sample(t, 0), key_sample(t, 1), key_sample(t, 2)) {
                    (Some(r), Some(g), Some(b)) => Some([r, g, b]),
                    _ => None,
                }
            }
            _ => None,
        };
        Self {
            width: header.width as usize,
            depth: header.bit_depth,
            color: header.color_type,
            set,
            key,
        }
    }

    /// Stored row size, without the filter byte.
    pub(crate) fn raw_row_bytes(&self) -> usize {
        let bits = self.width * usize::from(self.color.channels()) * usize::from(self.depth);
        bits.div_ceil(8)
    }

    fn adds_alpha(&self) -> bool {
        !self.color.has_alpha()
            && (self.set.filler.is_some() || (self.set.trns_to_alpha && self.key.is_some()))
    }

    /// Whether rows are handed out exactly as stored.
    fn passthrough(&self) -> bool {
        if self.color == ColorType::Paletted {
            return true;
        }
        let strips = self.depth == 16 && self.set.strip_16;
        let widens = self.depth < 8 && self.set.expand_gray;
        let to_rgb = self.color.is_gray() && self.set.gray_to_rgb;
        !(strips || widens || to_rgb || self.adds_alpha())
    }

    fn out_sample_bytes(&self) -> usize {
        if self.depth == 16 && !self.set.strip_16 { 2 } else { 1 }
    }

    fn color_channels_out(&self) -> usize {
        match self.color {
            ColorType::Grayscale | ColorType::GrayscaleAlpha if self.set.gray_to_rgb => 3,
            ColorType::Grayscale | ColorType::GrayscaleAlpha | ColorType::Paletted => 1,
            ColorType::Rgb | ColorType::Rgba => 3,
        }
    }

    pub(crate) fn channels(&self) -> u8 {
        if self.passthrough() {
            return self.color.channels();
        }
        let alpha = self.color.has_alpha() || self.adds_alpha();
        (self.color_channels_out() + usize::from(alpha)) as u8
    }

    pub(crate) fn row_bytes(&self) -> usize {
        if self.passthrough() {
            return self.raw_row_bytes();
        }
        self.width * usize::from(self.channels()) * self.out_sample_bytes()
    }

    /// Transform one stored row into `out`. `out` shorter than
    /// [`row_bytes`](Self::row_bytes) receives a truncated row.
    pub(crate) fn apply(&self, raw: &[u8], out: &mut [u8]) {
        if self.passthrough() {
            let n = raw.len().min(out.len());
            out[..n].copy_from_slice(&raw[..n]);
            return;
        }

        let src_channels = usize::from(self.color.channels());
        let color_in = if self.color.is_gray() { 1 } else { 3 };
        let max = if self.depth == 16 { 0xFFFF } else { (1u16 << self.depth) - 1 };
        let mut w = SampleWriter {
            out,
            pos: 0,
            wide: self.out_sample_bytes() == 2,
        };

        for x in 0..self.width {
            let base = x * src_channels;
            let mut px = [0u16; 4];
            for (c, s) in px.iter_mut().enumerate().take(src_channels) {
                *s = sample_at(raw, base + c, self.depth);
            }

            let alpha = if self.color.has_alpha() {
                Some(self.widen(px[color_in]))
            } else if self.set.trns_to_alpha && self.key.is_some() {
                let keyed = self.key.is_some_and(|k| px[..color_in] == k[..color_in]);
                Some(if keyed { 0 } else { self.widen(max) })
            } else {
                self.set.filler.map(|f| {
                    if w.wide { u16::from(f) * 257 } else { u16::from(f) }
                })
            };

            if color_in == 1 {
                let g = self.widen(px[0]);
                let reps = if self.set.gray_to_rgb { 3 } else { 1 };
                for _ in 0..reps {
                    w.push(g);
                }
            } else {
                for &s in &px[..3] {
                    w.push(self.widen(s));
                }
            }
            if let Some(a) = alpha {
                w.push(a);
            }
        }
    }

    /// Bring a source sample to the output sample width.
    fn widen(&self, v: u16) -> u16 {
        match self.depth {
            16 if self.set.strip_16 => v >> 8,
            16 | 8 => v,
            d => v * u16::from(EXPAND_SCALE[usize::from(d)]),
        }
    }
}

struct SampleWriter<'a> {
    out: &'a mut [u8],
    pos: usize,
    wide: bool,
}

impl SampleWriter<'_> {
    fn push(&mut self, v: u16) {
        if self.wide {
            if let Some(dst) = self.out.get_mut(self.pos..self.pos + 2) {
                dst.copy_from_slice(&v.to_be_bytes());
            }
            self.pos += 2;
        } else {
            if let Some(dst) = self.out.get_mut(self.pos) {
                *dst = v as u8;
            }
            self.pos += 1;
        }
    }
}

/// Read sample `idx` of a packed row at `depth` bits per sample.
fn sample_at(raw: &[u8], idx: usize, depth: u8) -> u16 {
    match depth {
        16 => {
            let i = idx * 2;
            match raw.get(i..i + 2) {
                Some(b) => u16::from_be_bytes([b[0], b[1]]),
                None => 0,
            }
        }
        8 => raw.get(idx).copied().map_or(0, u16::from),
        d => {
            let per_byte = usize::from(8 / d);
            let byte = raw.get(idx / per_byte).copied().unwrap_or(0);
            let shift = 8 - d * (1 + (idx % per_byte) as u8);
            u16::from((byte >> shift) & ((1u8 << d) - 1))
        }
    }
}
