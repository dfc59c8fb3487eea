//! Decode engine interfaces
//!
//! Two engine shapes exist. A [`SymbolDetector`] scans a whole frame
//! asynchronously and reports every symbol it finds with a bounding box. A
//! [`CroppedDecoder`] synchronously decodes a single symbol from an already
//! cropped and binarized image. An [`EngineFactory`] builds either one for a
//! configured format list, and a [`CapabilityProbe`] decides which one a
//! pipeline uses.

use crate::binarize::BitMatrix;
use crate::error::ScanError;
use crate::format::{DetectorFormat, ReaderFormat};
use crate::frame::Frame;
use crate::geometry::{Decode, Rect, Sensor};

/// One symbol reported by a [`SymbolDetector`]
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Decoded payload, if the engine produced one
    pub raw_value: Option<String>,
    /// Engine-native symbology
    pub format: DetectorFormat,
    /// Bounding box in upright frame coordinates
    pub bounding_box: Option<Rect<Sensor>>,
}

/// Outcome of a whole-frame detection
pub type DetectionResult = Result<Vec<Detection>, ScanError>;

/// Completion callback; receives the frame back together with the result
pub type DetectCallback = Box<dyn FnOnce(Frame, DetectionResult) + Send>;

/// Whole-frame, callback-driven recognizer
pub trait SymbolDetector: Send + Sync {
    /// Start recognition over `frame` without blocking the caller
    ///
    /// Implementations call `done` exactly once, possibly from another
    /// thread, and hand the frame back with the result so the caller decides
    /// when it is released.
    fn detect(&self, frame: Frame, done: DetectCallback);
}

/// A single decode produced by a [`CroppedDecoder`]
#[derive(Debug, Clone, PartialEq)]
pub struct ReadResult {
    /// Decoded text, if any
    pub text: Option<String>,
    /// Engine-native symbology
    pub format: ReaderFormat,
    /// Symbol bounds in crop coordinates
    pub bounds: Option<Rect<Decode>>,
}

/// Synchronous single-symbol decoder over a binarized crop
pub trait CroppedDecoder: Send + Sync {
    /// Decode one symbol
    ///
    /// Returns [`ScanError::NotFound`] when nothing is located and
    /// [`ScanError::Malformed`] when a symbol is located but unreadable.
    fn decode(&self, bitmap: &BitMatrix) -> Result<ReadResult, ScanError>;
}

/// Builds engines for a configured format subset
pub trait EngineFactory {
    /// Whole-frame engine restricted to `formats`
    fn detector(&self, formats: &[DetectorFormat]) -> Result<Box<dyn SymbolDetector>, ScanError>;

    /// Pre-cropped engine restricted to `formats`
    fn decoder(&self, formats: &[ReaderFormat]) -> Result<Box<dyn CroppedDecoder>, ScanError>;
}

/// Reports whether the pre-cropped engine's platform prerequisite is present
pub trait CapabilityProbe {
    /// `true` selects the pre-cropped strategy, `false` the whole-frame one
    fn cropped_engine_available(&self) -> bool;
}

/// A probe with a fixed answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticProbe(pub bool);

impl CapabilityProbe for StaticProbe {
    fn cropped_engine_available(&self) -> bool {
        self.0
    }
}

impl<F> CapabilityProbe for F
where
    F: Fn() -> bool,
{
    fn cropped_engine_available(&self) -> bool {
        self()
    }
}
