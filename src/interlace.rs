//! Adam7 pass geometry.
//!
//! Adam7 Interlacing Pattern
//! 1 6 4 6 2 6 4 6
//! 7 7 7 7 7 7 7 7
//! 5 6 5 6 5 6 5 6
//! 7 7 7 7 7 7 7 7
//! 3 6 4 6 3 6 4 6
//! 7 7 7 7 7 7 7 7
//! 5 6 5 6 5 6 5 6
//! 7 7 7 7 7 7 7 7

#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct Pass {
    pub x_start: u32,
    pub y_start: u32,
    pub x_step: u32,
    pub y_step: u32,
}

impl Pass {
    const fn new(x_start: u32, y_start: u32, x_step: u32, y_step: u32) -> Self {
        Self { x_start, y_start, x_step, y_step }
    }

    /// A non-interlaced image is a single pass covering every pixel.
    pub const FULL: Pass = Pass::new(0, 0, 1, 1);

    /// Pixel dimensions of this pass's sub-image, zero when the image is too
    /// small for the pass to contain any pixel.
    pub fn dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        let span = |size: u32, start: u32, step: u32| {
            if size <= start {
                0
            } else {
                (size - start + step - 1) / step
            }
        };

        (span(width, self.x_start, self.x_step), span(height, self.y_start, self.y_step))
    }
}

pub(crate) const ADAM7_PASSES: [Pass; 7] = [
    Pass::new(0, 0, 8, 8),
    Pass::new(4, 0, 8, 8),
    Pass::new(0, 4, 4, 8),
    Pass::new(2, 0, 4, 4),
    Pass::new(0, 2, 2, 4),
    Pass::new(1, 0, 2, 2),
    Pass::new(0, 1, 1, 2),
];

/// Copies every pixel of a reconstructed pass sub-image into its place in the
/// full-resolution scanline buffer. Sub-byte pixels are moved bit by bit.
pub(crate) fn scatter_pass(
    pass: &Pass,
    pass_pixels: &[u8],
    pass_width: u32,
    pass_stride: usize,
    output: &mut [u8],
    output_stride: usize,
    bits_per_pixel: usize,
) {
    for (row, pass_scanline) in pass_pixels.chunks_exact(pass_stride).enumerate() {
        let y = pass.y_start as usize + row * pass.y_step as usize;
        let output_scanline = &mut output[y * output_stride..(y + 1) * output_stride];

        for col in 0..pass_width as usize {
            let x = pass.x_start as usize + col * pass.x_step as usize;

            if bits_per_pixel >= 8 {
                let bytes_per_pixel = bits_per_pixel / 8;
                let src = &pass_scanline[col * bytes_per_pixel..(col + 1) * bytes_per_pixel];
                output_scanline[x * bytes_per_pixel..(x + 1) * bytes_per_pixel].copy_from_slice(src);
            } else {
                let mask = (1u8 << bits_per_pixel) - 1;

                let src_bit = col * bits_per_pixel;
                let src_shift = 8 - bits_per_pixel - src_bit % 8;
                let value = (pass_scanline[src_bit / 8] >> src_shift) & mask;

                let dst_bit = x * bits_per_pixel;
                let dst_shift = 8 - bits_per_pixel - dst_bit % 8;
                let byte = &mut output_scanline[dst_bit / 8];
                *byte = (*byte & !(mask << dst_shift)) | (value << dst_shift);
            }
        }
    }
}
