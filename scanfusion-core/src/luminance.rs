//! Windowed luminance sources

use crate::error::ScanError;
use crate::geometry::PixelWindow;
use crate::rotation::LumaPlane;
use std::borrow::Cow;

/// A read-only view of a crop window inside a luminance plane
///
/// Coordinates passed to [`LuminanceSource::row`] and
/// [`LuminanceSource::pixel`] are relative to the window.
#[derive(Debug, Clone, Copy)]
pub struct LuminanceSource<'a> {
    data: &'a [u8],
    data_width: usize,
    left: usize,
    top: usize,
    width: usize,
    height: usize,
}

impl<'a> LuminanceSource<'a> {
    /// Window the whole plane
    pub fn full(plane: &'a LumaPlane) -> Self {
        Self {
            data: plane.data(),
            data_width: plane.width(),
            left: 0,
            top: 0,
            width: plane.width(),
            height: plane.height(),
        }
    }

    /// Window `plane` to `window`, which must lie entirely inside it
    pub fn cropped(plane: &'a LumaPlane, window: PixelWindow) -> Result<Self, ScanError> {
        let fits = window.left >= 0
            && window.top >= 0
            && window.width > 0
            && window.height > 0
            && window
                .left
                .checked_add(window.width)
                .is_some_and(|right| right <= plane.width() as i64)
            && window
                .top
                .checked_add(window.height)
                .is_some_and(|bottom| bottom <= plane.height() as i64);
        if !fits {
            return Err(ScanError::CropOutOfBounds {
                left: window.left,
                top: window.top,
                width: window.width,
                height: window.height,
                data_width: plane.width(),
                data_height: plane.height(),
            });
        }
        Ok(Self {
            data: plane.data(),
            data_width: plane.width(),
            left: window.left as usize,
            top: window.top as usize,
            width: window.width as usize,
            height: window.height as usize,
        })
    }

    /// Window width
    pub fn width(&self) -> usize {
        self.width
    }

    /// Window height
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row `y` of the window
    pub fn row(&self, y: usize) -> &'a [u8] {
        let start = (self.top + y) * self.data_width + self.left;
        &self.data[start..start + self.width]
    }

    /// Pixel at window coordinates
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.data[(self.top + y) * self.data_width + self.left + x]
    }

    /// The whole window as one row-major buffer
    ///
    /// Borrowed when the window spans full rows, copied otherwise.
    pub fn matrix(&self) -> Cow<'a, [u8]> {
        let area = self.width * self.height;
        if self.width == self.data_width {
            let start = self.top * self.data_width;
            return Cow::Borrowed(&self.data[start..start + area]);
        }
        let mut out = Vec::with_capacity(area);
        for y in 0..self.height {
            out.extend_from_slice(self.row(y));
        }
        Cow::Owned(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn plane_4x3() -> LumaPlane {
        // 0  1  2  3
        // 4  5  6  7
        // 8  9 10 11
        LumaPlane::new(Bytes::from((0u8..12).collect::<Vec<_>>()), 4, 3).unwrap()
    }

    fn window(left: i64, top: i64, width: i64, height: i64) -> PixelWindow {
        PixelWindow {
            left,
            top,
            width,
            height,
        }
    }

    #[test]
    fn test_cropped_rows_and_pixels() {
        let plane = plane_4x3();
        let src = LuminanceSource::cropped(&plane, window(1, 1, 2, 2)).unwrap();
        assert_eq!((src.width(), src.height()), (2, 2));
        assert_eq!(src.row(0), &[5, 6]);
        assert_eq!(src.row(1), &[9, 10]);
        assert_eq!(src.pixel(1, 0), 6);
        assert_eq!(&src.matrix()[..], &[5, 6, 9, 10]);
    }

    #[test]
    fn test_full_width_matrix_is_borrowed() {
        let plane = plane_4x3();
        let src = LuminanceSource::cropped(&plane, window(0, 1, 4, 2)).unwrap();
        assert!(matches!(src.matrix(), Cow::Borrowed(_)));
        assert_eq!(&src.matrix()[..], &[4, 5, 6, 7, 8, 9, 10, 11]);
        assert_eq!(LuminanceSource::full(&plane).matrix().len(), 12);
    }

    #[test]
    fn test_crop_must_fit() {
        let plane = plane_4x3();
        for w in [
            window(-1, 0, 2, 2),
            window(3, 0, 2, 2),
            window(0, 2, 2, 2),
            window(0, 0, 0, 2),
            window(i64::MAX, 0, 2, 2),
            window(0, 1, 2, i64::MAX),
        ] {
            assert!(matches!(
                LuminanceSource::cropped(&plane, w),
                Err(ScanError::CropOutOfBounds { .. })
            ));
        }
    }
}
