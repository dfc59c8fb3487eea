//! Multi-format engines built on `rxing`
//!
//! `rxing` reads every symbology in the catalog, so the enabled format list
//! decides what gets reported. The whole-frame detector can only name what
//! [`DetectorFormat`] covers; MaxiCode, RSS and UPC/EAN extensions are left
//! to the pre-cropped reader.

use super::{bounds_of, upright_luma, DetectorWorker};
use crate::binarize::BitMatrix;
use crate::engine::{
    CroppedDecoder, DetectCallback, Detection, DetectionResult, EngineFactory, ReadResult,
    SymbolDetector,
};
use crate::error::ScanError;
use crate::format::{DetectorFormat, Format, ReaderFormat};
use crate::frame::Frame;
use rxing::common::HybridBinarizer;
use rxing::{
    BarcodeFormat, BinaryBitmap, Exceptions, Luma8LuminanceSource, MultiFormatReader, RXingResult,
    Reader,
};

#[cfg(feature = "logging")]
use tracing::debug;

/// Whole-frame multi-format detector running on its own worker thread
pub struct MultiDetector {
    worker: DetectorWorker,
}

impl MultiDetector {
    /// Start a detector for `formats`; an empty list enables everything
    pub fn new(formats: &[DetectorFormat]) -> Result<Self, ScanError> {
        let enabled = formats.to_vec();
        let worker = DetectorWorker::spawn("scanfusion-multi-detector", move |frame| {
            detect_any(frame, &enabled)
        })?;
        Ok(Self { worker })
    }
}

impl SymbolDetector for MultiDetector {
    fn detect(&self, frame: Frame, done: DetectCallback) {
        self.worker.submit(frame, done);
    }
}

fn detect_any(frame: &Frame, enabled: &[DetectorFormat]) -> DetectionResult {
    let upright = upright_luma(frame)?;
    let result = match read_luma(upright.pixels().to_vec(), upright.width(), upright.height()) {
        Ok(result) => result,
        Err(ScanError::NotFound) => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let Some(format) = catalog_format(result.getBarcodeFormat()).and_then(Format::to_detector_format)
    else {
        return Ok(Vec::new());
    };
    if !(enabled.is_empty() || enabled.contains(&format)) {
        #[cfg(feature = "logging")]
        debug!("Detector skipped disabled format {:?}", format);
        return Ok(Vec::new());
    }

    Ok(vec![Detection {
        raw_value: Some(result.getText().to_string()),
        format,
        bounding_box: Some(bounds_of(points(&result))),
    }])
}

/// Pre-cropped multi-format decoder
#[derive(Debug, Clone)]
pub struct MultiReader {
    enabled: Vec<ReaderFormat>,
}

impl MultiReader {
    /// Reader for `formats`; an empty list enables everything
    pub fn new(formats: &[ReaderFormat]) -> Self {
        Self {
            enabled: formats.to_vec(),
        }
    }
}

impl CroppedDecoder for MultiReader {
    fn decode(&self, bitmap: &BitMatrix) -> Result<ReadResult, ScanError> {
        let (width, height) = (bitmap.width(), bitmap.height());
        let luma: Vec<u8> = (0..height)
            .flat_map(|y| (0..width).map(move |x| if bitmap.get(x, y) { 0 } else { 255 }))
            .collect();
        let result = read_luma(luma, width, height)?;

        let format = catalog_format(result.getBarcodeFormat())
            .map(Format::to_reader_format)
            .ok_or(ScanError::NotFound)?;
        if !(self.enabled.is_empty() || self.enabled.contains(&format)) {
            return Err(ScanError::NotFound);
        }

        Ok(ReadResult {
            text: Some(result.getText().to_string()),
            format,
            bounds: Some(bounds_of(points(&result))),
        })
    }
}

/// [`EngineFactory`] producing [`MultiDetector`] and [`MultiReader`]
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiEngines;

impl EngineFactory for MultiEngines {
    fn detector(&self, formats: &[DetectorFormat]) -> Result<Box<dyn SymbolDetector>, ScanError> {
        Ok(Box::new(MultiDetector::new(formats)?))
    }

    fn decoder(&self, formats: &[ReaderFormat]) -> Result<Box<dyn CroppedDecoder>, ScanError> {
        Ok(Box::new(MultiReader::new(formats)))
    }
}

fn read_luma(luma: Vec<u8>, width: usize, height: usize) -> Result<RXingResult, ScanError> {
    let source = Luma8LuminanceSource::new(luma, width as u32, height as u32);
    let mut bitmap = BinaryBitmap::new(HybridBinarizer::new(source));
    MultiFormatReader::default()
        .decode(&mut bitmap)
        .map_err(|e| match e {
            Exceptions::NotFoundException(_) => ScanError::NotFound,
            other => ScanError::Malformed(format!("{other:?}")),
        })
}

fn points(result: &RXingResult) -> impl Iterator<Item = (f32, f32)> + '_ {
    result.getPoints().iter().map(|p| (p.x, p.y))
}

fn catalog_format(native: &BarcodeFormat) -> Option<Format> {
    Some(match native {
        BarcodeFormat::AZTEC => Format::Aztec,
        BarcodeFormat::CODABAR => Format::Codabar,
        BarcodeFormat::CODE_39 => Format::Code39,
        BarcodeFormat::CODE_93 => Format::Code93,
        BarcodeFormat::CODE_128 => Format::Code128,
        BarcodeFormat::DATA_MATRIX => Format::DataMatrix,
        BarcodeFormat::EAN_8 => Format::Ean8,
        BarcodeFormat::EAN_13 => Format::Ean13,
        BarcodeFormat::ITF => Format::Itf,
        BarcodeFormat::MAXICODE => Format::Maxicode,
        BarcodeFormat::PDF_417 => Format::Pdf417,
        BarcodeFormat::QR_CODE => Format::QrCode,
        BarcodeFormat::RSS_14 => Format::Rss14,
        BarcodeFormat::RSS_EXPANDED => Format::RssExpanded,
        BarcodeFormat::UPC_A => Format::UpcA,
        BarcodeFormat::UPC_E => Format::UpcE,
        BarcodeFormat::UPC_EAN_EXTENSION => Format::UpcEanExtension,
        _ => return None,
    })
}
