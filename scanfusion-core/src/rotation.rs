//! Luminance plane rotation
//!
//! Rotates a single-plane, row-major byte buffer by a multiple of 90 degrees
//! clockwise. Every rotation other than 0 is a full remap into a new buffer of
//! the same length; 90 and 270 swap the width and height.

use crate::error::ScanError;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Clockwise rotation in quarter turns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    /// No rotation
    Deg0,
    /// 90 degrees clockwise
    Deg90,
    /// 180 degrees
    Deg180,
    /// 270 degrees clockwise (90 counter-clockwise)
    Deg270,
}

impl Rotation {
    /// Parse a sensor rotation hint
    ///
    /// Only 0, 90, 180 and 270 are recognised. Anything else returns `None`
    /// and callers treat it as "leave the buffer as is".
    pub const fn from_degrees(degrees: i32) -> Option<Rotation> {
        match degrees {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            270 => Some(Rotation::Deg270),
            _ => None,
        }
    }

    /// Clockwise angle in degrees
    pub const fn degrees(self) -> i32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Rotation that undoes this one
    pub const fn inverse(self) -> Rotation {
        match self {
            Rotation::Deg0 => Rotation::Deg0,
            Rotation::Deg90 => Rotation::Deg270,
            Rotation::Deg180 => Rotation::Deg180,
            Rotation::Deg270 => Rotation::Deg90,
        }
    }

    /// Whether width and height trade places
    pub const fn swaps_dimensions(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

/// A single luminance plane with its dimensions
///
/// Only [`LumaPlane::new`] builds one from outside this module, so the buffer
/// always covers `width * height` pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LumaPlane {
    // Row-major; may be longer than width * height
    data: Bytes,
    width: usize,
    height: usize,
}

impl LumaPlane {
    /// Wrap a buffer, checking it covers `width * height` pixels
    pub fn new(data: Bytes, width: usize, height: usize) -> Result<Self, ScanError> {
        if width == 0 || height == 0 {
            return Err(ScanError::InvalidDimensions(width, height));
        }
        let expected = width
            .checked_mul(height)
            .ok_or(ScanError::InvalidDimensions(width, height))?;
        if data.len() < expected {
            return Err(ScanError::PlaneTooSmall {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Pixels per row
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.height
    }

    /// The whole buffer, trailing bytes included
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Exactly `width * height` row-major pixels
    pub fn pixels(&self) -> &[u8] {
        &self.data[..self.width * self.height]
    }

    /// Give up the buffer, trailing bytes included
    pub fn into_data(self) -> Bytes {
        self.data
    }

    /// Pixel at column `x`, row `y`
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    /// Rotate clockwise; `Deg0` returns `self` without copying
    pub fn rotate(self, rotation: Rotation) -> LumaPlane {
        if rotation == Rotation::Deg0 {
            return self;
        }

        let (w, h) = (self.width, self.height);
        let src = &self.data[..];
        let mut dst = vec![0u8; src.len()];

        match rotation {
            Rotation::Deg0 => unreachable!("handled above"),
            Rotation::Deg90 => {
                for y in 0..h {
                    let row = &src[y * w..(y + 1) * w];
                    for (x, &px) in row.iter().enumerate() {
                        dst[x * h + (h - y - 1)] = px;
                    }
                }
            }
            Rotation::Deg180 => {
                for y in 0..h {
                    let row = &src[y * w..(y + 1) * w];
                    for (x, &px) in row.iter().enumerate() {
                        dst[w * (h - y - 1) + (w - x - 1)] = px;
                    }
                }
            }
            Rotation::Deg270 => {
                for y in 0..h {
                    for x in 0..w {
                        dst[y + x * h] = src[y * w + (w - x - 1)];
                    }
                }
            }
        }

        // Bytes past width * height are not image data; keep them at the tail.
        let used = w * h;
        dst[used..].copy_from_slice(&src[used..]);

        let (width, height) = if rotation.swaps_dimensions() {
            (h, w)
        } else {
            (w, h)
        };
        LumaPlane {
            data: Bytes::from(dst),
            width,
            height,
        }
    }
}

/// Rotate a luminance buffer by `degrees` clockwise
///
/// Values other than 0/90/180/270 leave the buffer untouched.
pub fn rotate(
    data: Bytes,
    width: usize,
    height: usize,
    degrees: i32,
) -> Result<LumaPlane, ScanError> {
    let plane = LumaPlane::new(data, width, height)?;
    Ok(match Rotation::from_degrees(degrees) {
        Some(rotation) => plane.rotate(rotation),
        None => plane,
    })
}
