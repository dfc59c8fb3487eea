//! Luminance binarization
//!
//! Block-based local thresholding for images of at least 40x40 pixels and a
//! global histogram threshold for anything smaller. The local pass computes a
//! black point per 8x8 block and thresholds each block against the average of
//! its 5x5 block neighbourhood, which copes with shadows and gradients across
//! a handheld capture.

use crate::constants::{
    BLOCK_SIZE, BLOCK_SIZE_POWER, LUMINANCE_BITS, LUMINANCE_BUCKETS, MINIMUM_DIMENSION,
    MIN_DYNAMIC_RANGE,
};
use crate::error::ScanError;
use crate::luminance::LuminanceSource;

const LUMINANCE_SHIFT: usize = 8 - LUMINANCE_BITS;

/// A packed 1-bit image; set bits are black
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMatrix {
    width: usize,
    height: usize,
    row_words: usize,
    bits: Vec<u32>,
}

impl BitMatrix {
    /// An all-white matrix
    pub fn new(width: usize, height: usize) -> Self {
        let row_words = width.div_ceil(32);
        Self {
            width,
            height,
            row_words,
            bits: vec![0; row_words * height],
        }
    }

    /// Width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether the pixel at `(x, y)` is black
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        let word = self.bits[y * self.row_words + x / 32];
        (word >> (x % 32)) & 1 != 0
    }

    /// Mark the pixel at `(x, y)` black
    #[inline]
    pub fn set(&mut self, x: usize, y: usize) {
        self.bits[y * self.row_words + x / 32] |= 1 << (x % 32);
    }

    /// Number of black pixels
    pub fn count_black(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }
}

/// Binarize a luminance window
///
/// Fails with [`ScanError::NotFound`] when a small image has no usable
/// contrast.
pub fn binarize(source: &LuminanceSource<'_>) -> Result<BitMatrix, ScanError> {
    let (width, height) = (source.width(), source.height());
    if width >= MINIMUM_DIMENSION && height >= MINIMUM_DIMENSION {
        Ok(hybrid(source))
    } else {
        global_histogram(source)
    }
}

fn hybrid(source: &LuminanceSource<'_>) -> BitMatrix {
    let (width, height) = (source.width(), source.height());
    let luminances = source.matrix();

    let sub_width = width.div_ceil(BLOCK_SIZE);
    let sub_height = height.div_ceil(BLOCK_SIZE);
    let black_points = black_points(&luminances, sub_width, sub_height, width, height);

    let mut matrix = BitMatrix::new(width, height);
    let max_y_offset = height - BLOCK_SIZE;
    let max_x_offset = width - BLOCK_SIZE;
    for y in 0..sub_height {
        let y_offset = (y << BLOCK_SIZE_POWER).min(max_y_offset);
        let top = cap(y, sub_height - 3);
        for x in 0..sub_width {
            let x_offset = (x << BLOCK_SIZE_POWER).min(max_x_offset);
            let left = cap(x, sub_width - 3);
            let mut sum = 0u32;
            for row in &black_points[top - 2..=top + 2] {
                sum += row[left - 2..=left + 2].iter().sum::<u32>();
            }
            let threshold = sum / 25;
            threshold_block(&luminances, x_offset, y_offset, threshold, width, &mut matrix);
        }
    }
    matrix
}

#[inline]
fn cap(value: usize, max: usize) -> usize {
    if value < 2 {
        2
    } else {
        value.min(max)
    }
}

fn threshold_block(
    luminances: &[u8],
    x_offset: usize,
    y_offset: usize,
    threshold: u32,
    stride: usize,
    matrix: &mut BitMatrix,
) {
    for y in y_offset..y_offset + BLOCK_SIZE {
        let row = &luminances[y * stride..];
        for x in x_offset..x_offset + BLOCK_SIZE {
            if u32::from(row[x]) <= threshold {
                matrix.set(x, y);
            }
        }
    }
}

/// Black point per block: the mean, or a darker estimate for flat blocks
fn black_points(
    luminances: &[u8],
    sub_width: usize,
    sub_height: usize,
    width: usize,
    height: usize,
) -> Vec<Vec<u32>> {
    let max_y_offset = height - BLOCK_SIZE;
    let max_x_offset = width - BLOCK_SIZE;
    let mut points = vec![vec![0u32; sub_width]; sub_height];

    for y in 0..sub_height {
        let y_offset = (y << BLOCK_SIZE_POWER).min(max_y_offset);
        for x in 0..sub_width {
            let x_offset = (x << BLOCK_SIZE_POWER).min(max_x_offset);
            let mut sum = 0u32;
            let mut min = u32::from(u8::MAX);
            let mut max = 0u32;
            for yy in 0..BLOCK_SIZE {
                let start = (y_offset + yy) * width + x_offset;
                for &px in &luminances[start..start + BLOCK_SIZE] {
                    let px = u32::from(px);
                    sum += px;
                    min = min.min(px);
                    max = max.max(px);
                }
            }

            let mut average = sum >> (BLOCK_SIZE_POWER * 2);
            if max - min <= MIN_DYNAMIC_RANGE {
                // Flat block: assume it is background unless the neighbours
                // say it sits inside a dark region.
                average = min / 2;
                if y > 0 && x > 0 {
                    let neighbours = (points[y - 1][x]
                        + 2 * points[y][x - 1]
                        + points[y - 1][x - 1])
                        / 4;
                    if min < neighbours {
                        average = neighbours;
                    }
                }
            }
            points[y][x] = average;
        }
    }
    points
}

fn global_histogram(source: &LuminanceSource<'_>) -> Result<BitMatrix, ScanError> {
    let (width, height) = (source.width(), source.height());
    let mut buckets = [0u32; LUMINANCE_BUCKETS];
    for y in 1..5 {
        let row = source.row(height * y / 5);
        for &px in &row[width / 5..width * 4 / 5] {
            buckets[usize::from(px) >> LUMINANCE_SHIFT] += 1;
        }
    }
    let black_point = estimate_black_point(&buckets)?;

    let mut matrix = BitMatrix::new(width, height);
    for y in 0..height {
        for (x, &px) in source.row(y).iter().enumerate() {
            if u32::from(px) < black_point {
                matrix.set(x, y);
            }
        }
    }
    Ok(matrix)
}

/// Valley between the two tallest, well-separated histogram peaks
fn estimate_black_point(buckets: &[u32; LUMINANCE_BUCKETS]) -> Result<u32, ScanError> {
    let mut max_bucket_count = 0;
    let mut first_peak = 0usize;
    let mut first_peak_size = 0;
    for (x, &count) in buckets.iter().enumerate() {
        if count > first_peak_size {
            first_peak = x;
            first_peak_size = count;
        }
        max_bucket_count = max_bucket_count.max(count);
    }

    let mut second_peak = 0usize;
    let mut second_peak_score = 0u64;
    for (x, &count) in buckets.iter().enumerate() {
        let distance = x.abs_diff(first_peak) as u64;
        let score = u64::from(count) * distance * distance;
        if score > second_peak_score {
            second_peak = x;
            second_peak_score = score;
        }
    }

    if first_peak > second_peak {
        core::mem::swap(&mut first_peak, &mut second_peak);
    }
    if second_peak - first_peak <= LUMINANCE_BUCKETS / 16 {
        return Err(ScanError::NotFound);
    }

    let mut best_valley = second_peak - 1;
    let mut best_valley_score = -1i64;
    for x in (first_peak + 1..second_peak).rev() {
        let from_first = (x - first_peak) as i64;
        let score = from_first
            * from_first
            * (second_peak - x) as i64
            * i64::from(max_bucket_count - buckets[x]);
        if score > best_valley_score {
            best_valley = x;
            best_valley_score = score;
        }
    }
    Ok((best_valley << LUMINANCE_SHIFT) as u32)
}
