use miniz_oxide::inflate::TINFLStatus;
use thiserror::Error;

/// Everything that can go wrong while parsing or decoding a PNG stream.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// The chunk stream is corrupt, truncated, or out of order.
    #[error("malformed PNG stream: {0}")]
    Format(#[from] FormatError),

    /// The stream is well formed but asks for something this decoder won't do.
    #[error("unsupported PNG feature: {0}")]
    Unsupported(#[from] UnsupportedFeature),

    /// The zlib stream assembled from the image data chunks failed to inflate.
    #[error("failed to decompress image data: {0:?}")]
    Decompress(TINFLStatus),

    /// Palette expansion was requested for an indexed image without a palette chunk.
    #[error("indexed-color image has no palette")]
    MissingPalette,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormatError {
    #[error("invalid PNG signature")]
    InvalidMagicBytes,
    #[error("unexpected end of input")]
    MissingBytes,
    #[error("the first chunk is not IHDR")]
    HeaderChunkNotFirst,
    #[error("more than one IHDR chunk")]
    DuplicateHeader,
    #[error("IHDR chunk must hold 13 bytes, found {0}")]
    InvalidHeaderLength(usize),
    #[error("image dimensions {width}x{height} must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("chunk checksum mismatch")]
    IncorrectChunkCrc,
    #[error("more than one PLTE chunk")]
    DuplicatePalette,
    #[error("PLTE chunk appears after image data")]
    PaletteAfterImageData,
    #[error("PLTE chunk length {0} is not a non-zero multiple of 3 up to 768")]
    InvalidPaletteLength(usize),
    #[error("more than one tRNS chunk")]
    DuplicateTransparency,
    #[error("tRNS chunk appears before PLTE")]
    TransparencyBeforePalette,
    #[error("tRNS chunk appears after image data")]
    TransparencyAfterImageData,
    #[error("tRNS chunk length {0} does not fit the color type")]
    InvalidTransparencyLength(usize),
    #[error("no IDAT chunk")]
    MissingImageData,
    #[error("no IEND chunk")]
    MissingImageEnd,
    #[error("image data holds {actual} bytes, expected {expected}")]
    TruncatedImageData { expected: usize, actual: usize },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnsupportedFeature {
    #[error("bit depth {0}")]
    InvalidBitDepth(u8),
    #[error("color type {0}")]
    InvalidColorType(u8),
    #[error("bit depth {bit_depth} with color type {color_type}")]
    InvalidColorTypeBitDepthCombination { color_type: u8, bit_depth: u8 },
    #[error("compression method {0}")]
    InvalidCompressionMethod(u8),
    #[error("filter method {0}")]
    InvalidFilterMethod(u8),
    #[error("filter type {0}")]
    InvalidFilterType(u8),
    #[error("interlace method {0}")]
    InvalidInterlaceMethod(u8),
    // The width/height specified in the image contains too many
    // bytes to address with a usize on this platform, or more than
    // the configured limit.
    #[error("image of {width}x{height} pixels is too large")]
    ImageTooLarge { width: u32, height: u32 },
}
