use crate::error::UnsupportedFeature;
use core::convert::TryFrom;
use num_enum::TryFromPrimitive;

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, TryFromPrimitive)]
pub enum FilterType {
    None = 0,
    Sub = 1,
    Up = 2,
    Average = 3,
    Paeth = 4,
}

impl FilterType {
    pub(crate) fn from_tag(tag: u8) -> Result<Self, UnsupportedFeature> {
        FilterType::try_from(tag).map_err(|_| UnsupportedFeature::InvalidFilterType(tag))
    }
}

/// Undoes `filter_type` on `current_scanline` in place. `last_scanline` is the
/// already reconstructed row above, all zeroes for the first row of a pass.
/// `bpp` is the byte stride between a byte and its "left" neighbour.
pub(crate) fn defilter(
    filter_type: FilterType,
    bpp: usize,
    current_scanline: &mut [u8],
    last_scanline: &[u8],
) {
    // Monomorphize the common strides so the inner loops unroll.
    match bpp {
        1 => defilter_with_stride(filter_type, 1, current_scanline, last_scanline),
        2 => defilter_with_stride(filter_type, 2, current_scanline, last_scanline),
        3 => defilter_with_stride(filter_type, 3, current_scanline, last_scanline),
        4 => defilter_with_stride(filter_type, 4, current_scanline, last_scanline),
        6 => defilter_with_stride(filter_type, 6, current_scanline, last_scanline),
        8 => defilter_with_stride(filter_type, 8, current_scanline, last_scanline),
        _ => defilter_with_stride(filter_type, bpp, current_scanline, last_scanline),
    }
}

#[inline(always)]
fn defilter_with_stride(
    filter_type: FilterType,
    bpp: usize,
    current_scanline: &mut [u8],
    last_scanline: &[u8],
) {
    let len = current_scanline.len().min(last_scanline.len());
    let current_scanline = &mut current_scanline[..len];
    let last_scanline = &last_scanline[..len];
    let bpp = bpp.min(len);

    match filter_type {
        FilterType::None => {},
        FilterType::Sub => {
            for x in bpp..len {
                current_scanline[x] = current_scanline[x].wrapping_add(current_scanline[x - bpp]);
            }
        },
        FilterType::Up => {
            for (current, above) in current_scanline.iter_mut().zip(last_scanline) {
                *current = current.wrapping_add(*above);
            }
        },
        FilterType::Average => {
            for (current, above) in current_scanline[..bpp].iter_mut().zip(last_scanline) {
                *current = current.wrapping_add(*above / 2);
            }

            for x in bpp..len {
                let left = current_scanline[x - bpp] as u16;
                let above = last_scanline[x] as u16;
                current_scanline[x] = current_scanline[x].wrapping_add(((left + above) / 2) as u8);
            }
        },
        FilterType::Paeth => {
            // With no left or upper-left neighbour the predictor is always "up".
            for (current, above) in current_scanline[..bpp].iter_mut().zip(last_scanline) {
                *current = current.wrapping_add(*above);
            }

            for x in bpp..len {
                let predictor = paeth_predictor(
                    current_scanline[x - bpp] as i16,
                    last_scanline[x] as i16,
                    last_scanline[x - bpp] as i16,
                );
                current_scanline[x] = current_scanline[x].wrapping_add(predictor);
            }
        },
    }
}

#[inline(always)]
fn paeth_predictor(a: i16, b: i16, c: i16) -> u8 {
    // a = left pixel
    // b = above pixel
    // c = upper left
    let p = a + b - c;
    let pa = (p - a).abs();
    let pb = (p - b).abs();
    let pc = (p - c).abs();

    let first = pa <= pb && pa <= pc;
    let first_bitmask = first as u8 * 255u8;

    let second = !first && pb <= pc;
    let second_bitmask = second as u8 * 255u8;

    let third = !first && !second;
    let third_bitmask = third as u8 * 255u8;

    (first_bitmask & a as u8) | (second_bitmask & b as u8) | (third_bitmask & c as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_filter_tag_is_unsupported() {
        assert_eq!(FilterType::from_tag(4), Ok(FilterType::Paeth));
        assert_eq!(FilterType::from_tag(5), Err(UnsupportedFeature::InvalidFilterType(5)));
    }

    #[test]
    fn sub_recovers_original_bytes() {
        let original = [10u8, 20, 30, 250, 5, 60, 7, 255, 0];
        let bpp = 3;

        let mut filtered = original;
        for x in bpp..original.len() {
            filtered[x] = original[x].wrapping_sub(original[x - bpp]);
        }

        defilter(FilterType::Sub, bpp, &mut filtered, &[0; 9]);
        assert_eq!(filtered, original);
    }

    #[test]
    fn up_and_average_use_row_above() {
        let above = [100u8, 200, 50, 70];

        let mut row = [1u8, 100, 0, 0];
        defilter(FilterType::Up, 1, &mut row, &above);
        assert_eq!(row, [101, 44, 50, 70]);

        // first byte: 3 + 100/2, then raw + (left + up) / 2
        let mut row = [3u8, 0, 0, 1];
        defilter(FilterType::Average, 1, &mut row, &above);
        assert_eq!(row, [53, 126, 88, 80]);
    }

    #[test]
    fn first_row_sees_zero_history() {
        let zeroes = [0u8; 4];

        let mut row = [5u8, 6, 7, 8];
        defilter(FilterType::Paeth, 1, &mut row, &zeroes);
        // Only the left neighbour is non-zero, so Paeth degrades to Sub.
        assert_eq!(row, [5, 11, 18, 26]);

        let mut row = [5u8, 6, 7, 8];
        defilter(FilterType::Average, 2, &mut row, &zeroes);
        assert_eq!(row, [5, 6, 9, 11]);
    }

    #[test]
    fn paeth_ties_prefer_left_then_up() {
        // pa == pb == pc
        assert_eq!(paeth_predictor(9, 9, 9), 9);
        // pa == pb < pc
        assert_eq!(paeth_predictor(10, 10, 5), 10);
        // pb == pc < pa: up wins over upper-left
        assert_eq!(paeth_predictor(13, 4, 10), 4);
        // clear winners
        assert_eq!(paeth_predictor(0, 100, 100), 0);
        assert_eq!(paeth_predictor(100, 0, 100), 0);
        assert_eq!(paeth_predictor(10, 20, 12), 20);
        assert_eq!(paeth_predictor(10, 20, 15), 15);

        let mut row = [0u8, 1];
        defilter(FilterType::Paeth, 1, &mut row, &[7, 7]);
        // x = 1: left = 7, up = 7, upper-left = 7
        assert_eq!(row, [7, 8]);
    }

    #[test]
    fn wide_pixels_use_full_pixel_stride() {
        let above = [1u8, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];
        let mut row = [0u8; 12];
        row[6] = 1;

        defilter(FilterType::Sub, 6, &mut row, &above);
        assert_eq!(row, [0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0]);

        let mut row = [0u8; 12];
        defilter(FilterType::Paeth, 6, &mut row, &above);
        // The second pixel predicts from the row above, not from its left neighbour.
        assert_eq!(row, [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
    }
}
