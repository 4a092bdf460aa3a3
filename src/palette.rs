use crate::{
    chunk::Chunk,
    error::FormatError,
    header::{ColorType, PngHeader},
};

/// Indexed-color entries from the PLTE chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    entries: Vec<[u8; 3]>,
}

impl Palette {
    pub(crate) fn from_chunk(chunk: &Chunk) -> Result<Self, FormatError> {
        let len = chunk.data.len();
        if len == 0 || len % 3 != 0 || len > 256 * 3 {
            return Err(FormatError::InvalidPaletteLength(len));
        }

        let entries = chunk.data.chunks_exact(3).map(|rgb| [rgb[0], rgb[1], rgb[2]]).collect();

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[[u8; 3]] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Contents of the tRNS chunk, interpreted for the image's color type.
#[derive(Debug, Clone, PartialEq)]
pub enum Transparency {
    /// Alpha for the first N palette entries.
    IndexedAlpha(Vec<u8>),
    /// Grayscale sample value that is fully transparent.
    GraySampleKey(u16),
    /// RGB sample values that are fully transparent.
    RgbSampleKey(u16, u16, u16),
}

impl Transparency {
    /// Returns `Ok(None)` for color types that carry their own alpha channel,
    /// which have no use for a tRNS chunk.
    pub(crate) fn from_chunk(
        chunk: &Chunk,
        header: &PngHeader,
        palette: Option<&Palette>,
    ) -> Result<Option<Self>, FormatError> {
        let data = chunk.data;
        let invalid_length = || FormatError::InvalidTransparencyLength(data.len());

        let transparency = match header.color_type {
            ColorType::Palette => {
                let palette_len = palette.map(Palette::len).unwrap_or(0);
                if data.len() > palette_len {
                    return Err(invalid_length());
                }

                Transparency::IndexedAlpha(data.to_vec())
            },
            ColorType::Grayscale => match data {
                [high, low] => Transparency::GraySampleKey(u16::from_be_bytes([*high, *low])),
                _ => return Err(invalid_length()),
            },
            ColorType::Rgb => match data {
                [r0, r1, g0, g1, b0, b1] => Transparency::RgbSampleKey(
                    u16::from_be_bytes([*r0, *r1]),
                    u16::from_be_bytes([*g0, *g1]),
                    u16::from_be_bytes([*b0, *b1]),
                ),
                _ => return Err(invalid_length()),
            },
            ColorType::GrayscaleAlpha | ColorType::RgbAlpha => return Ok(None),
        };

        Ok(Some(transparency))
    }
}

/// Suggested background color from the bKGD chunk. Informational only.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Background {
    PaletteIndex(u8),
    Gray(u16),
    Rgb(u16, u16, u16),
}

impl Background {
    pub(crate) fn from_chunk(chunk: &Chunk, color_type: ColorType) -> Option<Self> {
        match (color_type, chunk.data) {
            (ColorType::Palette, [index]) => Some(Background::PaletteIndex(*index)),
            (ColorType::Grayscale | ColorType::GrayscaleAlpha, [high, low]) => {
                Some(Background::Gray(u16::from_be_bytes([*high, *low])))
            },
            (ColorType::Rgb | ColorType::RgbAlpha, [r0, r1, g0, g1, b0, b1]) => Some(Background::Rgb(
                u16::from_be_bytes([*r0, *r1]),
                u16::from_be_bytes([*g0, *g1]),
                u16::from_be_bytes([*b0, *b1]),
            )),
            _ => None,
        }
    }
}

/// Builds the 256-entry RGBA lookup table used to composite indexed pixels.
/// Entries past the palette are opaque black; entries past the tRNS alpha
/// list are opaque.
pub(crate) fn expand_palette(
    palette: &Palette,
    transparency: Option<&Transparency>,
) -> Vec<[u8; 4]> {
    let alpha: &[u8] = match transparency {
        Some(Transparency::IndexedAlpha(alpha)) => alpha,
        Some(_) | None => &[],
    };

    (0..256)
        .map(|idx| {
            let [r, g, b] = palette.entries.get(idx).copied().unwrap_or([0, 0, 0]);
            let a = *alpha.get(idx).unwrap_or(&255);
            [r, g, b, a]
        })
        .collect()
}
