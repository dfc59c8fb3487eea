//! Captured camera frames

use crate::constants::{LUMA_PLANE_INDEX, YUV_PLANE_COUNT};
use crate::error::ScanError;
use crate::rotation::LumaPlane;
use bytes::{Bytes, BytesMut};
use core::fmt;
use serde::{Deserialize, Serialize};

/// Pixel layout reported by the camera source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    /// Three planes, 4:2:0 chroma subsampling
    Yuv420_888,
    /// Three planes, 4:2:2 chroma subsampling
    Yuv422_888,
    /// Three planes, no chroma subsampling
    Yuv444_888,
    /// Single interleaved RGBA plane
    Rgba8888,
    /// Compressed JPEG bytes
    Jpeg,
    /// Any other source-specific layout
    Other(u32),
}

impl PixelFormat {
    /// Whether this is a three-plane YUV layout with a separate Y plane
    pub const fn is_planar_yuv(self) -> bool {
        matches!(
            self,
            PixelFormat::Yuv420_888 | PixelFormat::Yuv422_888 | PixelFormat::Yuv444_888
        )
    }
}

/// One byte plane of a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plane {
    /// Plane bytes
    pub data: Bytes,
    /// Bytes between the starts of consecutive rows
    pub row_stride: usize,
    /// Bytes between horizontally adjacent samples
    pub pixel_stride: usize,
}

impl Plane {
    /// Tightly packed plane (`pixel_stride == 1`)
    pub fn packed(data: Bytes, row_stride: usize) -> Self {
        Self {
            data,
            row_stride,
            pixel_stride: 1,
        }
    }
}

type ReleaseHook = Box<dyn FnOnce() + Send>;

/// An immutable captured image
///
/// A frame owns its planes for the duration of one analysis. Dropping it
/// releases the underlying capture buffer: the hook registered with
/// [`Frame::on_release`] runs exactly once, on whichever path the frame is
/// dropped.
pub struct Frame {
    width: usize,
    height: usize,
    format: PixelFormat,
    rotation_degrees: i32,
    planes: Vec<Plane>,
    release: Option<ReleaseHook>,
}

impl Frame {
    /// Create a frame from its planes
    pub fn new(
        width: usize,
        height: usize,
        format: PixelFormat,
        rotation_degrees: i32,
        planes: Vec<Plane>,
    ) -> Self {
        Self {
            width,
            height,
            format,
            rotation_degrees,
            planes,
            release: None,
        }
    }

    /// Build a 4:2:0 frame around an existing luminance plane
    ///
    /// The chroma planes are filled with neutral grey; they are never read by
    /// the decode path.
    pub fn from_luma(width: usize, height: usize, rotation_degrees: i32, luma: Bytes) -> Self {
        let chroma_w = width.div_ceil(2);
        let chroma_len = chroma_w * height.div_ceil(2);
        let chroma = Bytes::from(vec![128u8; chroma_len]);

        Self::new(
            width,
            height,
            PixelFormat::Yuv420_888,
            rotation_degrees,
            vec![
                Plane::packed(luma, width),
                Plane::packed(chroma.clone(), chroma_w),
                Plane::packed(chroma, chroma_w),
            ],
        )
    }

    /// Register a hook that runs when the frame is released
    ///
    /// Registering again replaces the previous hook.
    pub fn on_release(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.release = Some(Box::new(hook));
        self
    }

    /// Width in sensor pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in sensor pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixel layout
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Clockwise rotation hint supplied by the sensor
    pub fn rotation_degrees(&self) -> i32 {
        self.rotation_degrees
    }

    /// All planes
    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    /// Extract the luminance plane as a flat, tightly packed buffer
    ///
    /// Only three-plane YUV layouts are accepted. When the Y plane's row
    /// stride equals the width the plane's bytes are shared, not copied.
    pub fn luma_plane(&self) -> Result<LumaPlane, ScanError> {
        if !self.format.is_planar_yuv() || self.planes.len() != YUV_PLANE_COUNT {
            return Err(ScanError::UnsupportedPixelFormat {
                format: self.format,
                planes: self.planes.len(),
            });
        }
        let plane = &self.planes[LUMA_PLANE_INDEX];
        let (w, h) = (self.width, self.height);

        if plane.pixel_stride <= 1 && plane.row_stride == w {
            return LumaPlane::new(plane.data.clone(), w, h);
        }

        let pixel_stride = plane.pixel_stride.max(1);
        let needed = if w == 0 || h == 0 {
            0
        } else {
            (h - 1) * plane.row_stride + (w - 1) * pixel_stride + 1
        };
        if plane.data.len() < needed {
            return Err(ScanError::PlaneTooSmall {
                expected: needed,
                actual: plane.data.len(),
            });
        }

        let mut packed = BytesMut::with_capacity(w * h);
        for y in 0..h {
            let row = &plane.data[y * plane.row_stride..];
            packed.extend((0..w).map(|x| row[x * pixel_stride]));
        }
        LumaPlane::new(packed.freeze(), w, h)
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        if let Some(hook) = self.release.take() {
            hook();
        }
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("rotation_degrees", &self.rotation_degrees)
            .field("planes", &self.planes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_release_runs_once_on_drop() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();
        let frame = Frame::from_luma(4, 2, 0, Bytes::from(vec![0u8; 8])).on_release(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(released.load(Ordering::SeqCst), 0);
        drop(frame);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_luma_plane_shares_packed_bytes() {
        let luma = Bytes::from((0u8..12).collect::<Vec<_>>());
        let ptr = luma.as_ptr();
        let frame = Frame::from_luma(4, 3, 90, luma);
        let plane = frame.luma_plane().unwrap();
        assert_eq!((plane.width(), plane.height()), (4, 3));
        assert_eq!(plane.data().as_ptr(), ptr);
        assert_eq!(frame.planes().len(), 3);
    }

    #[test]
    fn test_luma_plane_compacts_strided_rows() {
        // 3x2 image with a row stride of 5
        let data = Bytes::from_static(&[1, 2, 3, 0, 0, 4, 5, 6, 0, 0]);
        let frame = Frame::new(
            3,
            2,
            PixelFormat::Yuv420_888,
            0,
            vec![
                Plane::packed(data, 5),
                Plane::packed(Bytes::from_static(&[128, 128]), 2),
                Plane::packed(Bytes::from_static(&[128, 128]), 2),
            ],
        );
        let plane = frame.luma_plane().unwrap();
        assert_eq!(plane.pixels(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_non_yuv_frames_rejected() {
        let frame = Frame::new(
            2,
            2,
            PixelFormat::Rgba8888,
            0,
            vec![Plane::packed(Bytes::from(vec![0u8; 16]), 8)],
        );
        assert_eq!(
            frame.luma_plane().unwrap_err(),
            ScanError::UnsupportedPixelFormat {
                format: PixelFormat::Rgba8888,
                planes: 1
            }
        );

        // Right format, wrong plane count
        let frame = Frame::new(
            2,
            2,
            PixelFormat::Yuv420_888,
            0,
            vec![Plane::packed(Bytes::from(vec![0u8; 4]), 2)],
        );
        assert!(frame.luma_plane().is_err());
    }
}
