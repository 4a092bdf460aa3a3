use crate::error::FormatError;
use crc32fast::Hasher;

pub const PNG_MAGIC_BYTES: &[u8] = &[137, 80, 78, 71, 13, 10, 26, 10];

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ChunkType {
    ImageHeader,
    Palette,
    Transparency,
    Background,
    ImageData,
    ImageEnd,
    Unknown([u8; 4]),
}

impl ChunkType {
    pub fn from_bytes(bytes: &[u8; 4]) -> Self {
        match bytes {
            b"IHDR" => ChunkType::ImageHeader,
            b"PLTE" => ChunkType::Palette,
            b"tRNS" => ChunkType::Transparency,
            b"bKGD" => ChunkType::Background,
            b"IDAT" => ChunkType::ImageData,
            b"IEND" => ChunkType::ImageEnd,
            unknown_chunk_type => ChunkType::Unknown(*unknown_chunk_type),
        }
    }

    /// Critical chunks have an uppercase first letter.
    pub fn is_critical(&self) -> bool {
        match self {
            ChunkType::Unknown(tag) => tag[0].is_ascii_uppercase(),
            ChunkType::Transparency | ChunkType::Background => false,
            _ => true,
        }
    }
}

#[derive(Debug)]
pub struct Chunk<'a> {
    pub chunk_type: ChunkType,
    pub data: &'a [u8],
    pub crc: u32,
}

/// Reads a big-endian u32 at `offset`, returning it with the offset just past it.
pub fn read_u32(bytes: &[u8], offset: usize) -> Result<(u32, usize), FormatError> {
    let end = offset.checked_add(4).ok_or(FormatError::MissingBytes)?;
    let field = bytes.get(offset..end).ok_or(FormatError::MissingBytes)?;

    Ok((u32::from_be_bytes([field[0], field[1], field[2], field[3]]), end))
}

/// Checks the fixed signature, returning the offset of the first chunk.
pub fn read_signature(bytes: &[u8]) -> Result<usize, FormatError> {
    if bytes.len() < PNG_MAGIC_BYTES.len() {
        return Err(FormatError::MissingBytes);
    }

    if &bytes[0..PNG_MAGIC_BYTES.len()] != PNG_MAGIC_BYTES {
        return Err(FormatError::InvalidMagicBytes);
    }

    Ok(PNG_MAGIC_BYTES.len())
}

/// Reads the chunk record starting at `offset`, returning it with the offset
/// of the next record.
pub fn read_chunk(
    bytes: &[u8],
    offset: usize,
    verify_crc: bool,
) -> Result<(Chunk<'_>, usize), FormatError> {
    let (length, type_offset) = read_u32(bytes, offset)?;
    let length = length as usize;

    let data_offset = type_offset.checked_add(4).ok_or(FormatError::MissingBytes)?;
    let crc_offset = data_offset.checked_add(length).ok_or(FormatError::MissingBytes)?;
    let (crc, next_offset) = read_u32(bytes, crc_offset)?;

    let chunk_type = ChunkType::from_bytes(&[
        bytes[type_offset],
        bytes[type_offset + 1],
        bytes[type_offset + 2],
        bytes[type_offset + 3],
    ]);

    if verify_crc {
        // The checksum covers the chunk type and the data, not the length.
        let mut hasher = Hasher::new();
        hasher.update(&bytes[type_offset..crc_offset]);

        if crc != hasher.finalize() {
            return Err(FormatError::IncorrectChunkCrc);
        }
    }

    Ok((Chunk { chunk_type, data: &bytes[data_offset..crc_offset], crc }, next_offset))
}
