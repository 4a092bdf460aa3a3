use crate::{
    chunk::{read_u32, Chunk},
    error::{DecodeError, FormatError, UnsupportedFeature},
};
use core::convert::{TryFrom, TryInto};
use num_enum::TryFromPrimitive;

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, TryFromPrimitive)]
pub enum BitDepth {
    One = 1,
    Two = 2,
    Four = 4,
    Eight = 8,
    Sixteen = 16,
}

impl BitDepth {
    pub fn bits(self) -> usize {
        self as usize
    }
}

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, TryFromPrimitive)]
pub enum ColorType {
    Grayscale = 0,
    Rgb = 2,
    Palette = 3,
    GrayscaleAlpha = 4,
    RgbAlpha = 6,
}

impl ColorType {
    /// Color channels, not counting alpha.
    pub fn channel_count(&self) -> usize {
        match self {
            ColorType::Grayscale | ColorType::Palette | ColorType::GrayscaleAlpha => 1,
            ColorType::Rgb | ColorType::RgbAlpha => 3,
        }
    }

    /// Whether the pixel data carries an explicit alpha sample.
    pub fn has_alpha(&self) -> bool {
        matches!(self, ColorType::GrayscaleAlpha | ColorType::RgbAlpha)
    }

    /// Samples stored per pixel, alpha included.
    pub fn sample_multiplier(&self) -> usize {
        self.channel_count() + self.has_alpha() as usize
    }

    fn supports(&self, bit_depth: BitDepth) -> bool {
        match self {
            ColorType::Grayscale => true,
            ColorType::Palette => bit_depth != BitDepth::Sixteen,
            ColorType::Rgb | ColorType::GrayscaleAlpha | ColorType::RgbAlpha => {
                matches!(bit_depth, BitDepth::Eight | BitDepth::Sixteen)
            },
        }
    }
}

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, TryFromPrimitive)]
pub enum CompressionMethod {
    Deflate = 0,
}

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, TryFromPrimitive)]
pub enum FilterMethod {
    Adaptive = 0,
}

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, TryFromPrimitive)]
pub enum InterlaceMethod {
    None = 0,
    Adam7 = 1,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PngHeader {
    pub width: u32,
    pub height: u32,
    pub bit_depth: BitDepth,
    pub color_type: ColorType,
    pub compression_method: CompressionMethod,
    pub filter_method: FilterMethod,
    pub interlace_method: InterlaceMethod,
}

impl PngHeader {
    pub(crate) fn from_chunk(chunk: &Chunk) -> Result<Self, DecodeError> {
        if chunk.data.len() != 13 {
            return Err(FormatError::InvalidHeaderLength(chunk.data.len()).into());
        }

        let (width, offset) = read_u32(chunk.data, 0)?;
        let (height, offset) = read_u32(chunk.data, offset)?;
        let fields = &chunk.data[offset..];
        let (bit_depth, color_type) = (fields[0], fields[1]);
        let (compression_method, filter_method, interlace_method) = (fields[2], fields[3], fields[4]);

        if width == 0 || height == 0 {
            return Err(FormatError::InvalidDimensions { width, height }.into());
        }

        let header = PngHeader {
            width,
            height,
            bit_depth: TryFrom::try_from(bit_depth)
                .map_err(|_| UnsupportedFeature::InvalidBitDepth(bit_depth))?,
            color_type: TryFrom::try_from(color_type)
                .map_err(|_| UnsupportedFeature::InvalidColorType(color_type))?,
            compression_method: TryFrom::try_from(compression_method)
                .map_err(|_| UnsupportedFeature::InvalidCompressionMethod(compression_method))?,
            filter_method: TryFrom::try_from(filter_method)
                .map_err(|_| UnsupportedFeature::InvalidFilterMethod(filter_method))?,
            interlace_method: TryFrom::try_from(interlace_method)
                .map_err(|_| UnsupportedFeature::InvalidInterlaceMethod(interlace_method))?,
        };

        if !header.color_type.supports(header.bit_depth) {
            return Err(UnsupportedFeature::InvalidColorTypeBitDepthCombination {
                color_type,
                bit_depth,
            }
            .into());
        }

        Ok(header)
    }

    pub fn bits_per_pixel(&self) -> usize {
        self.bit_depth.bits() * self.color_type.sample_multiplier()
    }

    /// Bytes spanned by one whole pixel, at least 1. This is the stride of the
    /// "left" neighbour during filter reconstruction.
    pub fn bytes_per_pixel(&self) -> usize {
        ((self.bits_per_pixel() + 7) / 8).max(1)
    }

    /// Reconstructed (unfiltered) bytes in a scanline `width` pixels wide.
    pub fn bytes_per_scanline(&self, width: u32) -> Result<usize, DecodeError> {
        let bytes = (width as u64 * self.bits_per_pixel() as u64 + 7) / 8;
        bytes.try_into().map_err(|_| self.too_large())
    }

    /// Length of the RGBA output buffer.
    pub fn rgba_len(&self) -> Result<usize, DecodeError> {
        let len = self.width as u64 * self.height as u64 * 4;
        len.try_into().map_err(|_| self.too_large())
    }

    pub(crate) fn too_large(&self) -> DecodeError {
        UnsupportedFeature::ImageTooLarge { width: self.width, height: self.height }.into()
    }
}
