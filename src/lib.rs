//! A pure-Rust PNG decoder producing flat RGBA buffers.
//!
//! Parsing is eager and happens once:
//!
//! ```no_run
//! # fn main() -> Result<(), png_rgba_decoder::DecodeError> {
//! let bytes = std::fs::read("image.png").unwrap();
//! let decoder = png_rgba_decoder::PngDecoder::new(&bytes)?;
//! let image = decoder.decode()?;
//! assert_eq!(image.data.len(), image.width as usize * image.height as usize * 4);
//! # Ok(())
//! # }
//! ```

mod chunk;
mod compositor;
mod decoder;
mod error;
mod filter;
mod header;
mod interlace;
mod palette;

pub use crate::{
    chunk::ChunkType,
    decoder::{DecoderOptions, PngDecoder},
    error::{DecodeError, FormatError, UnsupportedFeature},
    filter::FilterType,
    header::{BitDepth, ColorType, CompressionMethod, FilterMethod, InterlaceMethod, PngHeader},
    palette::{Background, Palette, Transparency},
};

/// Decoded pixels, row-major, R, G, B, A for every pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbaImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Unfiltered scanlines at full resolution, in the image's own pixel format.
/// Samples narrower than a byte stay packed, most significant bits first.
#[derive(Debug, Clone, PartialEq)]
pub struct Scanlines {
    pub width: u32,
    pub height: u32,
    pub bytes_per_row: usize,
    pub data: Vec<u8>,
}

impl Scanlines {
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        let start = y.checked_mul(self.bytes_per_row)?;
        let end = start.checked_add(self.bytes_per_row)?;
        self.data.get(start..end)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks_exact(self.bytes_per_row.max(1))
    }
}

/// Parses and decodes in one go.
pub fn decode(bytes: &[u8]) -> Result<(PngHeader, Vec<u8>), DecodeError> {
    let decoder = PngDecoder::new(bytes)?;
    let image = decoder.decode()?;

    Ok((decoder.header().clone(), image.data))
}
