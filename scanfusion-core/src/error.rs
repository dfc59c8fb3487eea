//! Error types for ScanFusion operations

use crate::frame::PixelFormat;

/// Errors that can occur while preparing or decoding a frame
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScanError {
    /// The frame's pixel layout cannot be consumed by the engine
    #[error("Unsupported pixel format: {format:?} with {planes} plane(s)")]
    UnsupportedPixelFormat {
        /// The pixel format reported by the source.
        format: PixelFormat,
        /// Number of planes carried by the frame.
        planes: usize,
    },

    /// A byte plane is shorter than its declared dimensions require
    #[error("Plane too small: expected at least {expected} bytes, got {actual}")]
    PlaneTooSmall {
        /// Bytes required by width * height.
        expected: usize,
        /// Bytes actually present.
        actual: usize,
    },

    /// Width or height is zero
    #[error("Invalid dimensions: {0}x{1}")]
    InvalidDimensions(usize, usize),

    /// Crop rectangle does not fit inside the image data
    #[error("Crop rectangle ({left}, {top}, {width}x{height}) does not fit within {data_width}x{data_height}")]
    CropOutOfBounds {
        /// Crop origin x.
        left: i64,
        /// Crop origin y.
        top: i64,
        /// Crop width.
        width: i64,
        /// Crop height.
        height: i64,
        /// Width of the underlying image.
        data_width: usize,
        /// Height of the underlying image.
        data_height: usize,
    },

    /// No symbol was located in the image
    #[error("No symbol found")]
    NotFound,

    /// A symbol was located but its contents could not be decoded
    #[error("Malformed symbol: {0}")]
    Malformed(String),

    /// The decode engine failed for a reason of its own
    #[error("Engine error: {0}")]
    Engine(String),

    /// A shared resource is already bound elsewhere
    #[error("Resource conflict: {0}")]
    ResourceConflict(String),

    /// A worker thread could not be started
    #[error("Failed to spawn worker thread: {0}")]
    Spawn(String),

    /// Configuration failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ScanError {
    /// Whether this error is a per-frame decode miss that analyzers swallow
    ///
    /// Transient errors never reach the `on_decoded` listener; the frame is
    /// simply treated as containing no symbols.
    pub fn is_transient(&self) -> bool {
        !matches!(
            self,
            ScanError::ResourceConflict(_) | ScanError::Spawn(_) | ScanError::InvalidConfig(_)
        )
    }
}

impl From<std::io::Error> for ScanError {
    fn from(err: std::io::Error) -> Self {
        ScanError::Spawn(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_errors_are_transient() {
        assert!(ScanError::NotFound.is_transient());
        assert!(ScanError::Malformed("bad ecc".into()).is_transient());
        assert!(ScanError::Engine("boom".into()).is_transient());
        assert!(ScanError::UnsupportedPixelFormat {
            format: PixelFormat::Rgba8888,
            planes: 1
        }
        .is_transient());
    }

    #[test]
    fn test_binding_errors_are_not_transient() {
        assert!(!ScanError::ResourceConflict("worker".into()).is_transient());
        assert!(!ScanError::InvalidConfig("no formats".into()).is_transient());
        assert!(!ScanError::Spawn("out of threads".into()).is_transient());
    }

    #[test]
    fn test_crop_error_message() {
        let err = ScanError::CropOutOfBounds {
            left: 10,
            top: 20,
            width: 100,
            height: 50,
            data_width: 64,
            data_height: 64,
        };
        assert_eq!(
            err.to_string(),
            "Crop rectangle (10, 20, 100x50) does not fit within 64x64"
        );
    }
}
