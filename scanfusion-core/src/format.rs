//! Symbology catalog
//!
//! [`Format`] is the engine-agnostic enumeration callers configure. Each decode
//! engine has its own native identifier type: [`DetectorFormat`] for the
//! whole-frame engine and [`ReaderFormat`] for the pre-cropped engine.
//!
//! The whole-frame engine cannot detect MaxiCode, RSS-14, RSS Expanded or
//! UPC/EAN extensions. Those map to [`DetectorFormat::Unknown`] instead of
//! failing, and callers must not rely on that engine reporting them.

use crate::constants::DETECTOR_FORMAT_UNKNOWN;
use crate::error::ScanError;
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

/// Barcode symbology, in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Format {
    /// Aztec 2D
    #[serde(rename = "AZTEC")]
    Aztec,
    /// Codabar 1D
    #[serde(rename = "CODABAR")]
    Codabar,
    /// Code 39 1D
    #[serde(rename = "CODE_39")]
    Code39,
    /// Code 93 1D
    #[serde(rename = "CODE_93")]
    Code93,
    /// Code 128 1D
    #[serde(rename = "CODE_128")]
    Code128,
    /// Data Matrix 2D
    #[serde(rename = "DATA_MATRIX")]
    DataMatrix,
    /// EAN-8 1D
    #[serde(rename = "EAN_8")]
    Ean8,
    /// EAN-13 1D
    #[serde(rename = "EAN_13")]
    Ean13,
    /// Interleaved 2 of 5
    #[serde(rename = "ITF")]
    Itf,
    /// MaxiCode 2D
    #[serde(rename = "MAXICODE")]
    Maxicode,
    /// PDF417 stacked
    #[serde(rename = "PDF_417")]
    Pdf417,
    /// QR Code 2D
    #[serde(rename = "QR_CODE")]
    QrCode,
    /// RSS-14 (GS1 DataBar)
    #[serde(rename = "RSS_14")]
    Rss14,
    /// RSS Expanded (GS1 DataBar Expanded)
    #[serde(rename = "RSS_EXPANDED")]
    RssExpanded,
    /// UPC-A 1D
    #[serde(rename = "UPC_A")]
    UpcA,
    /// UPC-E 1D
    #[serde(rename = "UPC_E")]
    UpcE,
    /// UPC/EAN 2- or 5-digit extension
    #[serde(rename = "UPC_EAN_EXTENSION")]
    UpcEanExtension,
}

/// Every symbology in declaration order
const ALL_FORMATS: [Format; 17] = [
    Format::Aztec,
    Format::Codabar,
    Format::Code39,
    Format::Code93,
    Format::Code128,
    Format::DataMatrix,
    Format::Ean8,
    Format::Ean13,
    Format::Itf,
    Format::Maxicode,
    Format::Pdf417,
    Format::QrCode,
    Format::Rss14,
    Format::RssExpanded,
    Format::UpcA,
    Format::UpcE,
    Format::UpcEanExtension,
];

impl Format {
    /// All symbologies in declaration order; the default "scan for everything" set
    pub fn all() -> &'static [Format] {
        &ALL_FORMATS
    }

    /// Canonical upper-case name, e.g. `QR_CODE`
    pub const fn name(self) -> &'static str {
        match self {
            Format::Aztec => "AZTEC",
            Format::Codabar => "CODABAR",
            Format::Code39 => "CODE_39",
            Format::Code93 => "CODE_93",
            Format::Code128 => "CODE_128",
            Format::DataMatrix => "DATA_MATRIX",
            Format::Ean8 => "EAN_8",
            Format::Ean13 => "EAN_13",
            Format::Itf => "ITF",
            Format::Maxicode => "MAXICODE",
            Format::Pdf417 => "PDF_417",
            Format::QrCode => "QR_CODE",
            Format::Rss14 => "RSS_14",
            Format::RssExpanded => "RSS_EXPANDED",
            Format::UpcA => "UPC_A",
            Format::UpcE => "UPC_E",
            Format::UpcEanExtension => "UPC_EAN_EXTENSION",
        }
    }

    /// Native identifier for the whole-frame engine
    ///
    /// Returns `None` for symbologies that engine cannot detect.
    pub const fn to_detector_format(self) -> Option<DetectorFormat> {
        match self {
            Format::Aztec => Some(DetectorFormat::Aztec),
            Format::Codabar => Some(DetectorFormat::Codabar),
            Format::Code39 => Some(DetectorFormat::Code39),
            Format::Code93 => Some(DetectorFormat::Code93),
            Format::Code128 => Some(DetectorFormat::Code128),
            Format::DataMatrix => Some(DetectorFormat::DataMatrix),
            Format::Ean8 => Some(DetectorFormat::Ean8),
            Format::Ean13 => Some(DetectorFormat::Ean13),
            Format::Itf => Some(DetectorFormat::Itf),
            Format::Pdf417 => Some(DetectorFormat::Pdf417),
            Format::QrCode => Some(DetectorFormat::QrCode),
            Format::UpcA => Some(DetectorFormat::UpcA),
            Format::UpcE => Some(DetectorFormat::UpcE),
            Format::Maxicode | Format::Rss14 | Format::RssExpanded | Format::UpcEanExtension => {
                None
            }
        }
    }

    /// Native identifier for the pre-cropped engine (total)
    pub const fn to_reader_format(self) -> ReaderFormat {
        match self {
            Format::Aztec => ReaderFormat::Aztec,
            Format::Codabar => ReaderFormat::Codabar,
            Format::Code39 => ReaderFormat::Code39,
            Format::Code93 => ReaderFormat::Code93,
            Format::Code128 => ReaderFormat::Code128,
            Format::DataMatrix => ReaderFormat::DataMatrix,
            Format::Ean8 => ReaderFormat::Ean8,
            Format::Ean13 => ReaderFormat::Ean13,
            Format::Itf => ReaderFormat::Itf,
            Format::Maxicode => ReaderFormat::Maxicode,
            Format::Pdf417 => ReaderFormat::Pdf417,
            Format::QrCode => ReaderFormat::QrCode,
            Format::Rss14 => ReaderFormat::Rss14,
            Format::RssExpanded => ReaderFormat::RssExpanded,
            Format::UpcA => ReaderFormat::UpcA,
            Format::UpcE => ReaderFormat::UpcE,
            Format::UpcEanExtension => ReaderFormat::UpcEanExtension,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace('-', "_");
        Format::all()
            .iter()
            .copied()
            .find(|f| f.name() == wanted)
            .ok_or_else(|| ScanError::InvalidConfig(format!("unknown barcode format: {s}")))
    }
}

/// Whole-frame engine format identifiers
///
/// The discriminants are the engine's native bit-flag codes; `Unknown` is the
/// sentinel for symbologies outside its capability set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum DetectorFormat {
    /// Unsupported / unknown symbology
    Unknown = DETECTOR_FORMAT_UNKNOWN,
    /// Code 128
    Code128 = 1,
    /// Code 39
    Code39 = 2,
    /// Code 93
    Code93 = 4,
    /// Codabar
    Codabar = 8,
    /// Data Matrix
    DataMatrix = 16,
    /// EAN-13
    Ean13 = 32,
    /// EAN-8
    Ean8 = 64,
    /// ITF
    Itf = 128,
    /// QR Code
    QrCode = 256,
    /// UPC-A
    UpcA = 512,
    /// UPC-E
    UpcE = 1024,
    /// PDF417
    Pdf417 = 2048,
    /// Aztec
    Aztec = 4096,
}

impl DetectorFormat {
    /// Native integer code
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Map back to the engine-agnostic symbology
    pub const fn to_format(self) -> Option<Format> {
        match self {
            DetectorFormat::Unknown => None,
            DetectorFormat::Code128 => Some(Format::Code128),
            DetectorFormat::Code39 => Some(Format::Code39),
            DetectorFormat::Code93 => Some(Format::Code93),
            DetectorFormat::Codabar => Some(Format::Codabar),
            DetectorFormat::DataMatrix => Some(Format::DataMatrix),
            DetectorFormat::Ean13 => Some(Format::Ean13),
            DetectorFormat::Ean8 => Some(Format::Ean8),
            DetectorFormat::Itf => Some(Format::Itf),
            DetectorFormat::QrCode => Some(Format::QrCode),
            DetectorFormat::UpcA => Some(Format::UpcA),
            DetectorFormat::UpcE => Some(Format::UpcE),
            DetectorFormat::Pdf417 => Some(Format::Pdf417),
            DetectorFormat::Aztec => Some(Format::Aztec),
        }
    }
}

/// Pre-cropped engine format identifiers; every [`Format`] has one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReaderFormat {
    /// Aztec
    Aztec,
    /// Codabar
    Codabar,
    /// Code 39
    Code39,
    /// Code 93
    Code93,
    /// Code 128
    Code128,
    /// Data Matrix
    DataMatrix,
    /// EAN-8
    Ean8,
    /// EAN-13
    Ean13,
    /// ITF
    Itf,
    /// MaxiCode
    Maxicode,
    /// PDF417
    Pdf417,
    /// QR Code
    QrCode,
    /// RSS-14
    Rss14,
    /// RSS Expanded
    RssExpanded,
    /// UPC-A
    UpcA,
    /// UPC-E
    UpcE,
    /// UPC/EAN extension
    UpcEanExtension,
}

impl ReaderFormat {
    /// Map back to the engine-agnostic symbology
    pub fn to_format(self) -> Format {
        // Declaration orders match one-to-one.
        Format::all()[self as usize]
    }
}

/// Whole-frame engine identifiers for a configured format list
///
/// Unsupported symbologies become [`DetectorFormat::Unknown`], preserving
/// list positions.
pub fn detector_formats(formats: &[Format]) -> Vec<DetectorFormat> {
    formats
        .iter()
        .map(|f| f.to_detector_format().unwrap_or(DetectorFormat::Unknown))
        .collect()
}

/// Pre-cropped engine identifiers for a configured format list
pub fn reader_formats(formats: &[Format]) -> Vec<ReaderFormat> {
    formats.iter().map(|f| f.to_reader_format()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_in_declaration_order() {
        let all = Format::all();
        assert_eq!(all.len(), 17);
        assert_eq!(all[0], Format::Aztec);
        assert_eq!(all[11], Format::QrCode);
        assert_eq!(all[16], Format::UpcEanExtension);
        assert!(all.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_detector_capability_gap() {
        let unsupported = [
            Format::Maxicode,
            Format::Rss14,
            Format::RssExpanded,
            Format::UpcEanExtension,
        ];
        for format in Format::all() {
            let mapped = format.to_detector_format();
            if unsupported.contains(format) {
                assert_eq!(mapped, None, "{format} should be unsupported");
            } else {
                assert_eq!(mapped.and_then(DetectorFormat::to_format), Some(*format));
            }
        }
    }

    #[test]
    fn test_reader_mapping_is_total() {
        for format in Format::all() {
            assert_eq!(format.to_reader_format().to_format(), *format);
        }
    }

    #[test]
    fn test_detector_formats_keep_sentinel() {
        let mapped = detector_formats(&[Format::QrCode, Format::Maxicode, Format::Ean13]);
        assert_eq!(
            mapped,
            vec![
                DetectorFormat::QrCode,
                DetectorFormat::Unknown,
                DetectorFormat::Ean13
            ]
        );
        assert_eq!(DetectorFormat::Unknown.code(), -1);
        assert_eq!(DetectorFormat::QrCode.code(), 256);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("QR_CODE".parse::<Format>().unwrap(), Format::QrCode);
        assert_eq!("ean-13".parse::<Format>().unwrap(), Format::Ean13);
        assert!("HOLOGRAM".parse::<Format>().is_err());
        for format in Format::all() {
            assert_eq!(format.to_string().parse::<Format>().unwrap(), *format);
        }
    }

    #[test]
    fn test_serde_uses_canonical_names() {
        let json = serde_json::to_string(&[Format::Code128, Format::UpcEanExtension]).unwrap();
        assert_eq!(json, r#"["CODE_128","UPC_EAN_EXTENSION"]"#);
        let back: Vec<Format> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vec![Format::Code128, Format::UpcEanExtension]);
    }
}
