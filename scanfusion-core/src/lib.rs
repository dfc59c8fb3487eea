//! # ScanFusion Core
//!
//! Real-time barcode scanning for live camera frames.
//!
//! ## Modules
//!
//! - `constants`: Cooldown, binarizer and layout constants
//! - `error`: The crate error type
//! - `format`: Barcode format catalog and engine-native mappings
//! - `geometry`: Typed rectangles and the sensor/view transform
//! - `rotation`: In-place luminance rotation by quarter turns
//! - `frame`: Camera frames and their release contract
//! - `luminance`: Cropped luminance views
//! - `binarize`: Luminance to black/white conversion
//! - `engine`: Decode engine traits and the capability probe
//! - `backend`: concrete engines, QR on rqrr (feature `rqrr-backend`) and
//!   multi-format on rxing (feature `rxing-backend`)
//! - `analyzer`: Whole-frame and pre-cropped decode strategies
//! - `schedule`: Delayed tasks on a timer thread or a manual clock
//! - `debounce`: Admission gate and post-detection cooldown
//! - `config`: Pipeline settings
//! - `pipeline`: The façade tying it together
//!
//! ## Example
//!
//! ```no_run
//! use scanfusion_core::{Frame, ScanPipeline, StaticProbe};
//! use bytes::Bytes;
//!
//! let pipeline = ScanPipeline::builder()
//!     .on_decoded(|value| println!("scanned {value}"))
//!     .build_with_qr(&StaticProbe(true))
//!     .unwrap();
//!
//! let frame = Frame::from_luma(640, 480, 90, Bytes::from(vec![0u8; 640 * 480]));
//! pipeline.analyze(frame);
//! ```

#![warn(missing_docs)]

pub mod analyzer;
#[cfg(any(feature = "rqrr-backend", feature = "rxing-backend"))]
pub mod backend;
pub mod binarize;
pub mod config;
pub mod constants;
pub mod debounce;
pub mod engine;
pub mod error;
pub mod format;
pub mod frame;
pub mod geometry;
pub mod luminance;
pub mod pipeline;
pub mod rotation;
pub mod schedule;

// Re-export commonly used types
pub use analyzer::{Analyzer, DecodedSymbol, EngineKind};
pub use config::ScanConfig;
pub use debounce::{Admission, Debouncer, ProcessingState};
pub use engine::{CapabilityProbe, EngineFactory, StaticProbe};
pub use error::ScanError;
pub use format::{DetectorFormat, Format, ReaderFormat};
pub use frame::{Frame, PixelFormat, Plane};
pub use geometry::{Rect, ViewSize, ViewTransform};
pub use pipeline::{AnalysisWorker, ScanPipeline, ScanPipelineBuilder, ScanWindow, SharedWindow};
pub use rotation::{rotate, LumaPlane, Rotation};
pub use schedule::{ManualScheduler, Scheduler, ThreadScheduler};

/// Result type alias for ScanFusion operations
pub type Result<T> = core::result::Result<T, ScanError>;
