//! Fuzzing entry points for scanfusion-core
//!
//! To use with cargo-fuzz:
//! 1. Install cargo-fuzz: cargo install cargo-fuzz
//! 2. Run fuzzer: cargo fuzz run fuzz_rotate
//!
//! Each entry point reads a small header from the input (dimensions, angle
//! or crop window) and treats the rest as luminance bytes.

use bytes::Bytes;
use scanfusion_core::{
    binarize::binarize, geometry::PixelWindow, luminance::LuminanceSource, rotate, LumaPlane,
};

/// `[w, h, rest..]` as a luma plane of at most 64x64
fn plane(data: &[u8]) -> Option<(LumaPlane, &[u8])> {
    let (&w, rest) = data.split_first()?;
    let (&h, rest) = rest.split_first()?;
    let (width, height) = (usize::from(w % 64) + 1, usize::from(h % 64) + 1);
    let pixels = rest.get(..width * height)?;
    let tail = &rest[width * height..];
    let plane = LumaPlane::new(Bytes::copy_from_slice(pixels), width, height).ok()?;
    Some((plane, tail))
}

pub fn fuzz_rotate(data: &[u8]) {
    let Some((&angle, rest)) = data.split_first() else {
        return;
    };
    let degrees = i32::from(angle as i8) * 45;
    if let Some((plane, _)) = plane(rest) {
        let (width, height) = (plane.width(), plane.height());
        // Should never panic, and must keep every pixel
        if let Ok(rotated) = rotate(plane.into_data(), width, height, degrees) {
            assert_eq!(rotated.width() * rotated.height(), width * height);
        }
    }
}

pub fn fuzz_binarize(data: &[u8]) {
    if let Some((plane, _)) = plane(data) {
        if let Ok(matrix) = binarize(&LuminanceSource::full(&plane)) {
            assert_eq!((matrix.width(), matrix.height()), (plane.width(), plane.height()));
        }
    }
}

pub fn fuzz_crop(data: &[u8]) {
    let Some((plane, tail)) = plane(data) else {
        return;
    };
    let &[left, top, width, height, ..] = tail else {
        return;
    };
    let window = PixelWindow {
        left: i64::from(left as i8),
        top: i64::from(top as i8),
        width: i64::from(width as i8),
        height: i64::from(height as i8),
    };
    // Out-of-bounds windows are errors, never panics
    if let Ok(source) = LuminanceSource::cropped(&plane, window) {
        let _ = source.matrix();
        let _ = binarize(&source);
    }
}
