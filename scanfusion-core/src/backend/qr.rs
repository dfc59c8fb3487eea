//! QR engines built on `rqrr`
//!
//! Both engines only understand QR codes. Any other enabled symbology is
//! accepted in the configuration but never reported.

use super::{bounds_of, upright_luma, DetectorWorker};
use crate::binarize::BitMatrix;
use crate::engine::{
    CroppedDecoder, DetectCallback, Detection, DetectionResult, EngineFactory, ReadResult,
    SymbolDetector,
};
use crate::error::ScanError;
use crate::format::{DetectorFormat, ReaderFormat};
use crate::frame::Frame;
use rqrr::PreparedImage;

#[cfg(feature = "logging")]
use tracing::debug;

/// Whole-frame QR detector running on its own worker thread
pub struct QrDetector {
    worker: DetectorWorker,
}

impl QrDetector {
    /// Start a detector for `formats`; an empty list enables everything
    pub fn new(formats: &[DetectorFormat]) -> Result<Self, ScanError> {
        let qr_enabled = formats.is_empty() || formats.contains(&DetectorFormat::QrCode);
        let worker = DetectorWorker::spawn("scanfusion-qr-detector", move |frame| {
            if qr_enabled {
                detect_qr(frame)
            } else {
                Ok(Vec::new())
            }
        })?;
        Ok(Self { worker })
    }
}

impl SymbolDetector for QrDetector {
    fn detect(&self, frame: Frame, done: DetectCallback) {
        self.worker.submit(frame, done);
    }
}

fn detect_qr(frame: &Frame) -> DetectionResult {
    let upright = upright_luma(frame)?;
    let mut image =
        PreparedImage::prepare_from_greyscale(upright.width(), upright.height(), |x, y| {
            upright.pixel(x, y)
        });
    let grids = image.detect_grids();

    #[cfg(feature = "logging")]
    debug!("Detector located {} grid(s)", grids.len());

    let detections = grids
        .iter()
        .filter_map(|grid| {
            let (_, content) = grid.decode().ok()?;
            Some(Detection {
                raw_value: Some(content),
                format: DetectorFormat::QrCode,
                bounding_box: Some(bounds_of(corners(&grid.bounds))),
            })
        })
        .collect();
    Ok(detections)
}

fn corners(points: &[rqrr::Point; 4]) -> impl Iterator<Item = (f32, f32)> + '_ {
    points.iter().map(|p| (p.x as f32, p.y as f32))
}

/// Pre-cropped QR decoder
#[derive(Debug, Clone)]
pub struct QrReader {
    qr_enabled: bool,
}

impl QrReader {
    /// Reader for `formats`; an empty list enables everything
    pub fn new(formats: &[ReaderFormat]) -> Self {
        Self {
            qr_enabled: formats.is_empty() || formats.contains(&ReaderFormat::QrCode),
        }
    }
}

impl CroppedDecoder for QrReader {
    fn decode(&self, bitmap: &BitMatrix) -> Result<ReadResult, ScanError> {
        if !self.qr_enabled {
            return Err(ScanError::NotFound);
        }
        let mut image =
            PreparedImage::prepare_from_bitmap(bitmap.width(), bitmap.height(), |x, y| {
                bitmap.get(x, y)
            });
        let grids = image.detect_grids();
        let grid = grids.first().ok_or(ScanError::NotFound)?;
        let (_, content) = grid
            .decode()
            .map_err(|e| ScanError::Malformed(format!("{e:?}")))?;

        Ok(ReadResult {
            text: Some(content),
            format: ReaderFormat::QrCode,
            bounds: Some(bounds_of(corners(&grid.bounds))),
        })
    }
}

/// [`EngineFactory`] producing [`QrDetector`] and [`QrReader`]
#[derive(Debug, Clone, Copy, Default)]
pub struct QrEngines;

impl EngineFactory for QrEngines {
    fn detector(&self, formats: &[DetectorFormat]) -> Result<Box<dyn SymbolDetector>, ScanError> {
        Ok(Box::new(QrDetector::new(formats)?))
    }

    fn decoder(&self, formats: &[ReaderFormat]) -> Result<Box<dyn CroppedDecoder>, ScanError> {
        Ok(Box::new(QrReader::new(formats)))
    }
}
