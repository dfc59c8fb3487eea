//! Decode strategies
//!
//! Both strategies consume a [`Frame`] plus the scan window and report the
//! symbols found through a callback, releasing the frame on every path.
//!
//! - [`WholeFrameAnalyzer`] runs its engine over the entire frame and keeps
//!   only symbols whose bounding box, mapped into view space, lies fully
//!   inside the scan window.
//! - [`CroppedAnalyzer`] crops the upright luminance plane to the scan window
//!   before decoding, so no containment check happens afterwards.
//!
//! A code straddling the window edge is therefore dropped by the first and
//! may still be read by the second.

use crate::binarize::binarize;
use crate::engine::{
    CapabilityProbe, CroppedDecoder, Detection, EngineFactory, SymbolDetector,
};
use crate::error::ScanError;
use crate::format::{detector_formats, reader_formats, Format};
use crate::frame::Frame;
use crate::geometry::{Decode, Rect, Sensor, View, ViewSize, ViewTransform};
use crate::luminance::LuminanceSource;
use crate::rotation::Rotation;
use serde::{Deserialize, Serialize};

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// Where a symbol's bounding box lives
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SymbolBounds {
    /// Upright frame coordinates (whole-frame strategy)
    Sensor(Rect<Sensor>),
    /// Crop-local coordinates (pre-cropped strategy)
    Decode(Rect<Decode>),
}

/// A successfully decoded symbol
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSymbol {
    /// Payload; empty when the engine reported none
    pub raw_value: String,
    /// Symbology, when the engine could name one
    pub format: Option<Format>,
    /// Bounding box, when the engine reported one
    pub bounding_box: Option<SymbolBounds>,
}

/// Receives the symbols of one analyzed frame
pub type SymbolsCallback = Box<dyn FnOnce(Vec<DecodedSymbol>) + Send>;

/// Which strategy a pipeline runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineKind {
    /// Whole frame, then containment filter
    WholeFrame,
    /// Crop to the scan window, then decode
    Cropped,
}

/// Whole-frame + post-filter strategy
pub struct WholeFrameAnalyzer {
    detector: Box<dyn SymbolDetector>,
}

impl WholeFrameAnalyzer {
    /// Wrap a whole-frame engine
    pub fn new(detector: Box<dyn SymbolDetector>) -> Self {
        Self { detector }
    }

    /// Start analysis; `done` runs once the engine completes
    ///
    /// Engine failures are reported as an empty symbol list. The frame is
    /// released right after `done` returns.
    pub fn analyze(
        &self,
        frame: Frame,
        scan_window: Rect<View>,
        view: ViewSize,
        done: SymbolsCallback,
    ) {
        let transform = ViewTransform::new(frame.width(), frame.height(), view);
        self.detector.detect(
            frame,
            Box::new(move |frame, result| {
                let symbols = match result {
                    Ok(detections) => within_window(detections, &transform, &scan_window),
                    Err(e) => {
                        #[cfg(feature = "logging")]
                        if e.is_transient() {
                            debug!("Whole-frame detection failed: {}", e);
                        } else {
                            warn!("Whole-frame engine unavailable: {}", e);
                        }
                        Vec::new()
                    }
                };
                done(symbols);
                drop(frame);
            }),
        );
    }
}

/// Keep detections whose view-space box lies fully inside `scan_window`
fn within_window(
    detections: Vec<Detection>,
    transform: &ViewTransform,
    scan_window: &Rect<View>,
) -> Vec<DecodedSymbol> {
    detections
        .into_iter()
        .filter_map(|d| {
            let bounds = d.bounding_box?;
            if !scan_window.contains(&transform.sensor_to_view(&bounds)) {
                return None;
            }
            Some(DecodedSymbol {
                raw_value: d.raw_value.unwrap_or_default(),
                format: d.format.to_format(),
                bounding_box: Some(SymbolBounds::Sensor(bounds)),
            })
        })
        .collect()
}

/// Pre-cropped decode strategy
pub struct CroppedAnalyzer {
    decoder: Box<dyn CroppedDecoder>,
}

impl CroppedAnalyzer {
    /// Wrap a pre-cropped engine
    pub fn new(decoder: Box<dyn CroppedDecoder>) -> Self {
        Self { decoder }
    }

    /// Decode synchronously, calling `done` before the frame is released
    ///
    /// Every failure (unsupported pixel format, crop outside the frame, no
    /// symbol, unreadable symbol) yields an empty list.
    pub fn analyze(
        &self,
        frame: Frame,
        scan_window: Rect<View>,
        view: ViewSize,
        done: SymbolsCallback,
    ) {
        let symbols = match self.decode(&frame, &scan_window, view) {
            Ok(symbol) => vec![symbol],
            Err(e @ (ScanError::UnsupportedPixelFormat { .. } | ScanError::CropOutOfBounds { .. })) => {
                #[cfg(feature = "logging")]
                warn!("Skipping frame: {}", e);
                Vec::new()
            }
            Err(e) => {
                #[cfg(feature = "logging")]
                debug!("Barcode not found: {}", e);
                Vec::new()
            }
        };
        done(symbols);
        drop(frame);
    }

    /// Run the crop-rotate-binarize-decode chain on one frame
    pub fn decode(
        &self,
        frame: &Frame,
        scan_window: &Rect<View>,
        view: ViewSize,
    ) -> Result<DecodedSymbol, ScanError> {
        let luma = frame.luma_plane()?;
        let transform = ViewTransform::new(frame.width(), frame.height(), view);
        let crop = transform.view_to_sensor(scan_window);

        let upright = match Rotation::from_degrees(frame.rotation_degrees()) {
            Some(rotation) => luma.rotate(rotation),
            None => luma,
        };
        let source = LuminanceSource::cropped(&upright, crop.to_pixel_window())?;
        let bitmap = binarize(&source)?;
        let read = self.decoder.decode(&bitmap)?;

        Ok(DecodedSymbol {
            raw_value: read.text.unwrap_or_default(),
            format: Some(read.format.to_format()),
            bounding_box: read.bounds.map(SymbolBounds::Decode),
        })
    }
}

/// The strategy a pipeline selected at construction
pub enum Analyzer {
    /// Whole-frame + post-filter
    WholeFrame(WholeFrameAnalyzer),
    /// Pre-cropped decode
    Cropped(CroppedAnalyzer),
}

impl Analyzer {
    /// Pick a strategy using `probe` and build its engine for `formats`
    pub fn select(
        probe: &dyn CapabilityProbe,
        engines: &dyn EngineFactory,
        formats: &[Format],
    ) -> Result<Self, ScanError> {
        if probe.cropped_engine_available() {
            let decoder = engines.decoder(&reader_formats(formats))?;
            Ok(Analyzer::Cropped(CroppedAnalyzer::new(decoder)))
        } else {
            let detector = engines.detector(&detector_formats(formats))?;
            Ok(Analyzer::WholeFrame(WholeFrameAnalyzer::new(detector)))
        }
    }

    /// Which strategy this is
    pub fn kind(&self) -> EngineKind {
        match self {
            Analyzer::WholeFrame(_) => EngineKind::WholeFrame,
            Analyzer::Cropped(_) => EngineKind::Cropped,
        }
    }

    /// Analyze one frame with the selected strategy
    pub fn analyze(
        &self,
        frame: Frame,
        scan_window: Rect<View>,
        view: ViewSize,
        done: SymbolsCallback,
    ) {
        match self {
            Analyzer::WholeFrame(a) => a.analyze(frame, scan_window, view, done),
            Analyzer::Cropped(a) => a.analyze(frame, scan_window, view, done),
        }
    }
}
