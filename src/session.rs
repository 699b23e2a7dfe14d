//! The seam between the loader and the PNG decode library.
//!
//! [`PngLoader`](crate::PngLoader) drives a session through a fixed sequence:
//! `read_info`, palette/transparency queries, `set_transform` requests,
//! `channels`/`row_bytes`, one `read_row` per image row, then `read_end`.
//! [`PngSession`](crate::PngSession) is the implementation backed by the
//! `png` crate; other implementations are useful for exercising the loader
//! against decode libraries with different bookkeeping.

use crate::error::LoadError;
use crate::info::Header;

/// Output transforms a session can be asked to apply before rows are read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transform {
    /// Reduce 16-bit samples to their high byte.
    Strip16,
    /// Widen 1, 2 and 4-bit grayscale samples to 8 bits.
    ExpandGray,
    /// Turn a tRNS colour key into a real alpha channel.
    TrnsToAlpha,
    /// Replicate grayscale samples into R, G and B.
    GrayToRgb,
    /// Append an alpha sample with value `filler` to pixels that have none.
    AddAlpha { filler: u8 },
}

/// A decode session bound to one byte stream.
///
/// Any method returning [`LoadError::Fatal`] leaves the session unusable; the
/// caller must abandon the load.
pub trait DecodeSession {
    /// Read the signature and every chunk up to the first image data chunk.
    fn read_info(&mut self) -> Result<Header, LoadError>;

    /// Channels per output pixel, as the session currently reports it.
    fn channels(&self) -> u8;

    /// PLTE contents as RGB triples, or `None` when the chunk is absent or
    /// invalid.
    fn palette(&self) -> Option<&[u8]>;

    /// tRNS contents: one alpha per palette entry for paletted images,
    /// otherwise a colour key with one sample per channel. Samples are single
    /// bytes below 16 bits and big-endian pairs at 16 bits. `None` when absent.
    fn transparency(&self) -> Option<&[u8]>;

    /// Request an output transform. Requests after the first row are ignored.
    fn set_transform(&mut self, transform: Transform);

    /// Bytes per output row, as the session currently reports it.
    fn row_bytes(&self) -> usize;

    /// Decode the next row into `row`.
    fn read_row(&mut self, row: &mut [u8]) -> Result<(), LoadError>;

    /// Consume everything after the image data.
    fn read_end(&mut self) -> Result<(), LoadError>;
}
