//! A tiny PNG writer for building test streams byte by byte.

#![allow(dead_code)]

use crc32fast::Hasher;

pub const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

const ADAM7: [(usize, usize, usize, usize); 7] =
    [(0, 0, 8, 8), (4, 0, 8, 8), (0, 4, 4, 8), (2, 0, 4, 4), (0, 2, 2, 4), (1, 0, 2, 2), (0, 1, 1, 2)];

pub fn chunk(tag: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut hasher = Hasher::new();
    hasher.update(tag);
    hasher.update(data);

    let mut out = (data.len() as u32).to_be_bytes().to_vec();
    out.extend_from_slice(tag);
    out.extend_from_slice(data);
    out.extend_from_slice(&hasher.finalize().to_be_bytes());
    out
}

pub fn ihdr(width: u32, height: u32, bit_depth: u8, color_type: u8, interlace: u8) -> Vec<u8> {
    let mut data = width.to_be_bytes().to_vec();
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&[bit_depth, color_type, 0, 0, interlace]);
    chunk(b"IHDR", &data)
}

pub fn idat(filtered: &[u8]) -> Vec<u8> {
    chunk(b"IDAT", &miniz_oxide::deflate::compress_to_vec_zlib(filtered, 6))
}

pub fn iend() -> Vec<u8> {
    chunk(b"IEND", &[])
}

pub fn png(chunks: &[Vec<u8>]) -> Vec<u8> {
    let mut out = SIGNATURE.to_vec();
    for chunk in chunks {
        out.extend_from_slice(chunk);
    }
    out
}

pub fn samples_per_pixel(color_type: u8) -> usize {
    match color_type {
        0 | 3 => 1,
        4 => 2,
        2 => 3,
        6 => 4,
        _ => panic!("bad color type {}", color_type),
    }
}

/// Deterministic pseudo-random samples that fit in `bit_depth` bits.
pub fn samples(count: usize, bit_depth: u8, seed: u32) -> Vec<u16> {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    let mask = if bit_depth == 16 { 0xffff } else { (1u32 << bit_depth) - 1 };

    (0..count)
        .map(|_| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12345);
            ((state >> 8) & mask) as u16
        })
        .collect()
}

/// Packs samples into a scanline, most significant bits first.
pub fn pack_row(samples: &[u16], bit_depth: u8) -> Vec<u8> {
    match bit_depth {
        16 => samples.iter().flat_map(|s| s.to_be_bytes().to_vec()).collect(),
        8 => samples.iter().map(|&s| s as u8).collect(),
        bits => {
            let bits = bits as usize;
            let mut row = vec![0u8; (samples.len() * bits + 7) / 8];
            for (i, &sample) in samples.iter().enumerate() {
                let bit = i * bits;
                row[bit / 8] |= (sample as u8) << (8 - bits - bit % 8);
            }
            row
        },
    }
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).abs();
    let pb = (p - b as i16).abs();
    let pc = (p - c as i16).abs();

    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

/// Applies `filter_type` to `row`, returning it prefixed with the filter tag.
pub fn filter_row(filter_type: u8, bpp: usize, row: &[u8], prev: &[u8]) -> Vec<u8> {
    let mut out = vec![filter_type];

    for i in 0..row.len() {
        let left = if i >= bpp { row[i - bpp] } else { 0 };
        let up = prev[i];
        let upper_left = if i >= bpp { prev[i - bpp] } else { 0 };

        let predictor = match filter_type {
            0 => 0,
            1 => left,
            2 => up,
            3 => ((left as u16 + up as u16) / 2) as u8,
            4 => paeth(left, up, upper_left),
            _ => panic!("bad filter type {}", filter_type),
        };

        out.push(row[i].wrapping_sub(predictor));
    }

    out
}

/// Filters consecutive rows, cycling through `filters`.
pub fn filter_rows(rows: &[Vec<u8>], bpp: usize, filters: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut prev = vec![0u8; rows.first().map_or(0, |row| row.len())];

    for (y, row) in rows.iter().enumerate() {
        out.extend(filter_row(filters[y % filters.len()], bpp, row, &prev));
        prev = row.clone();
    }

    out
}

/// A test image described as one sample vector per pixel, row-major.
pub struct Image {
    pub width: usize,
    pub height: usize,
    pub bit_depth: u8,
    pub color_type: u8,
    pub pixels: Vec<Vec<u16>>,
}

impl Image {
    pub fn random(width: usize, height: usize, bit_depth: u8, color_type: u8, seed: u32) -> Self {
        let spp = samples_per_pixel(color_type);
        let all = samples(width * height * spp, bit_depth, seed);
        let pixels = all.chunks(spp).map(|pixel| pixel.to_vec()).collect();

        Image { width, height, bit_depth, color_type, pixels }
    }

    pub fn bpp(&self) -> usize {
        ((self.bit_depth as usize * samples_per_pixel(self.color_type) + 7) / 8).max(1)
    }

    fn packed_rows(&self, xs: &[usize], ys: &[usize]) -> Vec<Vec<u8>> {
        ys.iter()
            .map(|&y| {
                let samples: Vec<u16> =
                    xs.iter().flat_map(|&x| self.pixels[y * self.width + x].clone()).collect();
                pack_row(&samples, self.bit_depth)
            })
            .collect()
    }

    /// Unfiltered full-resolution scanlines.
    pub fn scanlines(&self) -> Vec<u8> {
        let xs: Vec<usize> = (0..self.width).collect();
        let ys: Vec<usize> = (0..self.height).collect();
        self.packed_rows(&xs, &ys).concat()
    }

    /// The filtered (pre-compression) stream for the given interlace method.
    pub fn filtered(&self, interlace: u8, filters: &[u8]) -> Vec<u8> {
        if interlace == 0 {
            let xs: Vec<usize> = (0..self.width).collect();
            let ys: Vec<usize> = (0..self.height).collect();
            return filter_rows(&self.packed_rows(&xs, &ys), self.bpp(), filters);
        }

        let mut out = Vec::new();
        for &(x_start, y_start, x_step, y_step) in ADAM7.iter() {
            let xs: Vec<usize> = (x_start..self.width).step_by(x_step).collect();
            let ys: Vec<usize> = (y_start..self.height).step_by(y_step).collect();
            if xs.is_empty() || ys.is_empty() {
                continue;
            }

            out.extend(filter_rows(&self.packed_rows(&xs, &ys), self.bpp(), filters));
        }
        out
    }

    pub fn to_png(&self, interlace: u8, filters: &[u8], extra_chunks: &[Vec<u8>]) -> Vec<u8> {
        let mut chunks =
            vec![ihdr(self.width as u32, self.height as u32, self.bit_depth, self.color_type, interlace)];
        chunks.extend(extra_chunks.iter().cloned());
        chunks.push(idat(&self.filtered(interlace, filters)));
        chunks.push(iend());
        png(&chunks)
    }
}
