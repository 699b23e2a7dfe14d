//! # pngtex
//!
//! Two-phase PNG loader for memory-constrained handheld displays.
//!
//! A [`PngLoader`] first probes the header, then negotiates a destination
//! format, then streams decoded rows one at a time into a caller-owned
//! [`DestinationBuffer`]. Sources are reconciled into three targets:
//!
//! - **4-bit paletted** → [`PixelFormat::Palette4Bit`] with a 16-entry palette
//! - **8-bit paletted** → [`PixelFormat::Palette8Bit`] with a 256-entry palette
//! - **everything else** (grayscale, truecolor, with or without alpha, 16-bit)
//!   → [`PixelFormat::Rgba8888`], 8 bits per channel, alpha synthesized when
//!   the source has none
//!
//! Bitstream decoding (inflate, filters, CRCs) is done by the `png` crate
//! through [`PngSession`]; any other [`DecodeSession`] can be plugged in.
//!
//! ## Non-Goals
//!
//! - Encoding
//! - Animated PNG
//! - Gamma or colour management
//!
//! ## Usage
//!
//! ```no_run
//! use pngtex::{Buffer, Palette, PngLoader, Status};
//!
//! let data: &[u8] = &[]; // your PNG bytes
//!
//! let mut loader = PngLoader::new(std::io::Cursor::new(data));
//! let (mut buffer, mut palette) = (Buffer::new(), Palette::new());
//!
//! // Probe without decoding
//! let info = loader.probe()?;
//! println!("{}x{} {:?}", info.width, info.height, info.color_type);
//!
//! loader.allocate(&info, &mut buffer, &mut palette)?;
//! loader.decode_into(&info, &mut buffer, &mut palette)?;
//!
//! // Or all at once into fresh buffers
//! match pngtex::decode(data) {
//!     Ok(decoded) => println!("{:?}", decoded.pixel_format()),
//!     Err(e) if e.status() == Status::OutOfMemory => {}
//!     Err(e) => return Err(e),
//! }
//! # Ok::<(), pngtex::LoadError>(())
//! ```

#![forbid(unsafe_code)]

extern crate alloc;

mod buffer;
mod error;
mod info;
mod limits;
mod negotiate;
mod palette;
mod pixel;
mod png_session;
mod session;
mod transform;

mod decode;
mod loader;

// Re-exports
pub use buffer::{Buffer, DestinationBuffer};
pub use decode::{Decoded, decode, decode_with};
pub use error::{LoadError, Status};
pub use info::{ColorType, Header, ImageInfo};
pub use limits::Limits;
pub use loader::{PngLoader, RowLayout, reconcile_row_layout};
pub use negotiate::{OutputFormat, PaletteFormat, negotiate};
pub use palette::{DestinationPalette, Palette};
pub use pixel::{PixelFormat, SizeBy};
pub use png_session::PngSession;
pub use session::{DecodeSession, Transform};
