use crate::{
    chunk::{read_chunk, read_signature, ChunkType},
    compositor::composite,
    error::{DecodeError, FormatError},
    filter::{defilter, FilterType},
    header::{ColorType, InterlaceMethod, PngHeader},
    interlace::{scatter_pass, Pass, ADAM7_PASSES},
    palette::{expand_palette, Background, Palette, Transparency},
    RgbaImage, Scanlines,
};
use log::{debug, trace, warn};
use miniz_oxide::inflate::{decompress_to_vec_zlib_with_limit, TINFLStatus};
use std::{sync::OnceLock, time::Instant};

/// Knobs for [`PngDecoder::with_options`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecoderOptions {
    /// Check every chunk's CRC-32 and reject mismatches. Off by default; the
    /// checksums are skipped otherwise.
    pub verify_checksums: bool,
    /// Reject images whose RGBA output would be larger than this many bytes.
    pub max_image_bytes: Option<usize>,
}

/// A parsed PNG stream, ready to be decoded.
///
/// All chunk parsing happens once, in [`PngDecoder::new`]. The decode methods
/// only read the parsed state, so they can be called any number of times and
/// from several threads at once.
#[derive(Debug)]
pub struct PngDecoder {
    header: PngHeader,
    palette: Option<Palette>,
    transparency: Option<Transparency>,
    background: Option<Background>,
    compressed_data: Vec<u8>,
    expanded_palette: OnceLock<Vec<[u8; 4]>>,
}

impl PngDecoder {
    pub fn new(bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::with_options(bytes, &DecoderOptions::default())
    }

    pub fn with_options(bytes: &[u8], options: &DecoderOptions) -> Result<Self, DecodeError> {
        let now = Instant::now();
        let verify_crc = options.verify_checksums;

        let offset = read_signature(bytes)?;

        let (header_chunk, mut offset) = read_chunk(bytes, offset, verify_crc)?;
        if header_chunk.chunk_type != ChunkType::ImageHeader {
            return Err(FormatError::HeaderChunkNotFirst.into());
        }

        let header = PngHeader::from_chunk(&header_chunk)?;
        debug!(
            "PNG header: {}x{} {:?} {:?} {:?}",
            header.width, header.height, header.color_type, header.bit_depth, header.interlace_method
        );

        let rgba_len = header.rgba_len()?;
        if options.max_image_bytes.map_or(false, |limit| rgba_len > limit) {
            return Err(header.too_large());
        }

        let mut palette = None;
        let mut transparency = None;
        let mut seen_transparency = false;
        let mut background = None;
        let mut compressed_data = Vec::new();
        let mut image_data_chunks = 0usize;

        loop {
            if offset >= bytes.len() {
                return Err(FormatError::MissingImageEnd.into());
            }

            let (chunk, next_offset) = read_chunk(bytes, offset, verify_crc)?;
            trace!("chunk {:?}: {} bytes, crc {:08x}", chunk.chunk_type, chunk.data.len(), chunk.crc);

            match chunk.chunk_type {
                ChunkType::ImageHeader => return Err(FormatError::DuplicateHeader.into()),
                ChunkType::Palette => {
                    if image_data_chunks > 0 {
                        return Err(FormatError::PaletteAfterImageData.into());
                    }
                    if palette.is_some() {
                        return Err(FormatError::DuplicatePalette.into());
                    }

                    palette = Some(Palette::from_chunk(&chunk)?);
                },
                ChunkType::Transparency => {
                    if image_data_chunks > 0 {
                        return Err(FormatError::TransparencyAfterImageData.into());
                    }
                    if seen_transparency {
                        return Err(FormatError::DuplicateTransparency.into());
                    }
                    if header.color_type == ColorType::Palette && palette.is_none() {
                        return Err(FormatError::TransparencyBeforePalette.into());
                    }

                    seen_transparency = true;
                    transparency = Transparency::from_chunk(&chunk, &header, palette.as_ref())?;
                },
                ChunkType::Background => {
                    background = Background::from_chunk(&chunk, header.color_type);
                    if background.is_none() {
                        warn!("ignoring bKGD chunk of {} bytes", chunk.data.len());
                    }
                },
                ChunkType::ImageData => {
                    compressed_data.extend_from_slice(chunk.data);
                    image_data_chunks += 1;
                },
                ChunkType::ImageEnd => break,
                ChunkType::Unknown(tag) => {
                    if chunk.chunk_type.is_critical() {
                        warn!("skipping unknown critical chunk {:?}", String::from_utf8_lossy(&tag));
                    }
                },
            }

            offset = next_offset;
        }

        if image_data_chunks == 0 {
            return Err(FormatError::MissingImageData.into());
        }

        debug!(
            "parsed {} IDAT chunks ({} compressed bytes) in {:?}",
            image_data_chunks,
            compressed_data.len(),
            now.elapsed()
        );

        Ok(Self {
            header,
            palette,
            transparency,
            background,
            compressed_data,
            expanded_palette: OnceLock::new(),
        })
    }

    pub fn header(&self) -> &PngHeader {
        &self.header
    }

    pub fn palette(&self) -> Option<&Palette> {
        self.palette.as_ref()
    }

    pub fn transparency(&self) -> Option<&Transparency> {
        self.transparency.as_ref()
    }

    pub fn background(&self) -> Option<Background> {
        self.background
    }

    /// Size of the concatenated IDAT payload.
    pub fn compressed_len(&self) -> usize {
        self.compressed_data.len()
    }

    /// Decodes to 8-bit RGBA.
    pub fn decode(&self) -> Result<RgbaImage, DecodeError> {
        let palette = match self.header.color_type {
            ColorType::Palette => Some(self.expanded_palette()?),
            _ => None,
        };

        let scanlines = self.decode_pixels()?;

        let now = Instant::now();
        // For now, output data is always RGBA, 1 byte per channel.
        let mut output_rgba = vec![0u8; self.header.rgba_len()?];
        composite(&self.header, &scanlines, palette, self.transparency.as_ref(), &mut output_rgba);
        trace!("compositing took {:?}", now.elapsed());

        Ok(RgbaImage { width: self.header.width, height: self.header.height, data: output_rgba })
    }

    /// Decodes to unfiltered, deinterlaced scanlines in the image's own
    /// pixel format.
    pub fn decode_pixels(&self) -> Result<Scanlines, DecodeError> {
        let header = &self.header;
        let bytes_per_row = header.bytes_per_scanline(header.width)?;
        let output_len =
            bytes_per_row.checked_mul(header.height as usize).ok_or_else(|| header.too_large())?;

        let filtered_len = self.filtered_len()?;

        let now = Instant::now();
        let scanline_data =
            match decompress_to_vec_zlib_with_limit(&self.compressed_data, filtered_len) {
                Ok(data) => data,
                // The stream holds more than the image needs; only the first
                // `filtered_len` bytes are scanlines.
                Err(err) if err.status == TINFLStatus::HasMoreOutput && err.output.len() >= filtered_len => {
                    debug!("ignoring image data past the last scanline");
                    err.output
                },
                Err(err) => return Err(DecodeError::Decompress(err.status)),
            };
        debug!("decompressed {} bytes in {:?}", scanline_data.len(), now.elapsed());

        if scanline_data.len() < filtered_len {
            return Err(FormatError::TruncatedImageData {
                expected: filtered_len,
                actual: scanline_data.len(),
            }
            .into());
        }

        let now = Instant::now();
        let data = match header.interlace_method {
            InterlaceMethod::None => {
                let (data, _) = reconstruct_pass(header, &Pass::FULL, &scanline_data, 0)?;
                data
            },
            InterlaceMethod::Adam7 => {
                let mut data = vec![0u8; output_len];
                let mut offset = 0;

                for pass in ADAM7_PASSES.iter() {
                    let (pass_width, pass_height) = pass.dimensions(header.width, header.height);

                    // Skip empty passes.
                    if pass_width == 0 || pass_height == 0 {
                        continue;
                    }

                    let (pass_pixels, next_offset) =
                        reconstruct_pass(header, pass, &scanline_data, offset)?;
                    scatter_pass(
                        pass,
                        &pass_pixels,
                        pass_width,
                        header.bytes_per_scanline(pass_width)?,
                        &mut data,
                        bytes_per_row,
                        header.bits_per_pixel(),
                    );
                    offset = next_offset;
                }

                data
            },
        };
        trace!("reconstruction took {:?}", now.elapsed());

        Ok(Scanlines { width: header.width, height: header.height, bytes_per_row, data })
    }

    fn expanded_palette(&self) -> Result<&[[u8; 4]], DecodeError> {
        let palette = self.palette.as_ref().ok_or(DecodeError::MissingPalette)?;

        Ok(self.expanded_palette.get_or_init(|| expand_palette(palette, self.transparency.as_ref())))
    }

    /// Length of the decompressed stream: every non-empty pass's rows, each
    /// with its leading filter-type byte.
    fn filtered_len(&self) -> Result<usize, DecodeError> {
        let header = &self.header;
        let passes: &[Pass] = match header.interlace_method {
            InterlaceMethod::None => &[Pass::FULL],
            InterlaceMethod::Adam7 => &ADAM7_PASSES,
        };

        passes.iter().try_fold(0usize, |total, pass| -> Result<usize, DecodeError> {
            let (pass_width, pass_height) = pass.dimensions(header.width, header.height);
            if pass_width == 0 || pass_height == 0 {
                return Ok(total);
            }

            header
                .bytes_per_scanline(pass_width)?
                .checked_add(1)
                .and_then(|row| row.checked_mul(pass_height as usize))
                .and_then(|pass_len| total.checked_add(pass_len))
                .ok_or_else(|| header.too_large())
        })
    }
}

/// Reconstructs one pass (the whole image when not interlaced) whose filtered
/// rows start at `offset` in `scanline_data`. Returns the unfiltered pixel rows
/// and the offset just past the pass.
fn reconstruct_pass(
    header: &PngHeader,
    pass: &Pass,
    scanline_data: &[u8],
    offset: usize,
) -> Result<(Vec<u8>, usize), DecodeError> {
    let (pass_width, pass_height) = pass.dimensions(header.width, header.height);
    let bytes_per_scanline = header.bytes_per_scanline(pass_width)?;
    let bytes_per_pixel = header.bytes_per_pixel();

    let mut pixels = vec![0u8; bytes_per_scanline * pass_height as usize];
    let zero_scanline = vec![0u8; bytes_per_scanline];
    let mut offset = offset;

    for y in 0..pass_height as usize {
        let raw_end = offset + 1 + bytes_per_scanline;
        let raw = scanline_data.get(offset..raw_end).ok_or(FormatError::TruncatedImageData {
            expected: raw_end,
            actual: scanline_data.len(),
        })?;

        let filter_type = FilterType::from_tag(raw[0])?;

        let (previous, current) = pixels.split_at_mut(y * bytes_per_scanline);
        let current_scanline = &mut current[..bytes_per_scanline];
        current_scanline.copy_from_slice(&raw[1..]);

        let last_scanline =
            if y == 0 { &zero_scanline[..] } else { &previous[(y - 1) * bytes_per_scanline..] };
        defilter(filter_type, bytes_per_pixel, current_scanline, last_scanline);

        offset = raw_end;
    }

    Ok((pixels, offset))
}
