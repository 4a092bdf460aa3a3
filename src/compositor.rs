use crate::{
    header::{BitDepth, ColorType, PngHeader},
    palette::Transparency,
    Scanlines,
};

#[inline(always)]
fn u16_to_u8(val: u16) -> u8 {
    (val >> 8) as u8
}

/// Reads the `index`th sample of a scanline at its native precision.
#[inline(always)]
fn read_sample(scanline: &[u8], index: usize, bit_depth: BitDepth) -> u16 {
    match bit_depth {
        BitDepth::Sixteen => {
            let offset = index * 2;
            u16::from_be_bytes([scanline[offset], scanline[offset + 1]])
        },
        BitDepth::Eight => scanline[index] as u16,
        BitDepth::One | BitDepth::Two | BitDepth::Four => {
            let bits = bit_depth.bits();
            let bit_offset = index * bits;
            let shift = 8 - bits - bit_offset % 8;
            let mask = (1u8 << bits) - 1;
            ((scanline[bit_offset / 8] >> shift) & mask) as u16
        },
    }
}

/// Scales a sample to 8 bits. Low bit depths replicate their bits so that the
/// maximum sample maps to 255.
#[inline(always)]
fn scale_to_u8(sample: u16, bit_depth: BitDepth) -> u8 {
    match bit_depth {
        BitDepth::One => sample as u8 * 255,
        BitDepth::Two => sample as u8 * 85,
        BitDepth::Four => sample as u8 * 17,
        BitDepth::Eight => sample as u8,
        BitDepth::Sixteen => u16_to_u8(sample),
    }
}

/// Turns reconstructed scanlines into packed RGBA, 1 byte per channel.
/// `palette` must be the expanded RGBA table whenever the image is indexed.
pub(crate) fn composite(
    header: &PngHeader,
    scanlines: &Scanlines,
    palette: Option<&[[u8; 4]]>,
    transparency: Option<&Transparency>,
    output_rgba: &mut [u8],
) {
    let width = header.width as usize;
    let bit_depth = header.bit_depth;

    let (gray_key, rgb_key) = match transparency {
        Some(Transparency::GraySampleKey(key)) => (Some(*key), None),
        Some(Transparency::RgbSampleKey(r, g, b)) => (None, Some((*r, *g, *b))),
        Some(Transparency::IndexedAlpha(_)) | None => (None, None),
    };
    let key_alpha = |matches: bool| if matches { 0 } else { 255 };

    for (scanline, output_scanline) in scanlines.rows().zip(output_rgba.chunks_exact_mut(width * 4)) {
        for (x, output_pixel) in output_scanline.chunks_exact_mut(4).enumerate() {
            let pixel = match header.color_type {
                ColorType::Grayscale => {
                    let sample = read_sample(scanline, x, bit_depth);
                    let gray = scale_to_u8(sample, bit_depth);
                    [gray, gray, gray, key_alpha(gray_key == Some(sample))]
                },
                ColorType::Rgb => {
                    let r = read_sample(scanline, x * 3, bit_depth);
                    let g = read_sample(scanline, x * 3 + 1, bit_depth);
                    let b = read_sample(scanline, x * 3 + 2, bit_depth);

                    [
                        scale_to_u8(r, bit_depth),
                        scale_to_u8(g, bit_depth),
                        scale_to_u8(b, bit_depth),
                        key_alpha(rgb_key == Some((r, g, b))),
                    ]
                },
                ColorType::Palette => {
                    let idx = read_sample(scanline, x, bit_depth) as usize;
                    palette.and_then(|table| table.get(idx)).copied().unwrap_or([0, 0, 0, 255])
                },
                ColorType::GrayscaleAlpha => {
                    let gray = scale_to_u8(read_sample(scanline, x * 2, bit_depth), bit_depth);
                    let alpha = scale_to_u8(read_sample(scanline, x * 2 + 1, bit_depth), bit_depth);
                    [gray, gray, gray, alpha]
                },
                ColorType::RgbAlpha => [
                    scale_to_u8(read_sample(scanline, x * 4, bit_depth), bit_depth),
                    scale_to_u8(read_sample(scanline, x * 4 + 1, bit_depth), bit_depth),
                    scale_to_u8(read_sample(scanline, x * 4 + 2, bit_depth), bit_depth),
                    scale_to_u8(read_sample(scanline, x * 4 + 3, bit_depth), bit_depth),
                ],
            };

            output_pixel.copy_from_slice(&pixel);
        }
    }
}
