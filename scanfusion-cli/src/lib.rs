//! Library entry for scanfusion-cli used by integration tests and embedding.

pub mod commands;

// Re-export commands for convenience
pub use commands::*;

use scanfusion_core::{backend, EngineFactory, EngineKind, StaticProbe};

/// Decode strategy requested on the command line
#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum EngineChoice {
    /// Whole-frame detection filtered to the scan window
    WholeFrame,
    /// Crop to the scan window before decoding
    Cropped,
}

impl EngineChoice {
    /// Capability answer that makes the pipeline select this strategy
    pub fn capability(self) -> StaticProbe {
        StaticProbe(EngineKind::from(self) == EngineKind::Cropped)
    }
}

impl From<EngineChoice> for EngineKind {
    fn from(choice: EngineChoice) -> Self {
        match choice {
            EngineChoice::WholeFrame => EngineKind::WholeFrame,
            EngineChoice::Cropped => EngineKind::Cropped,
        }
    }
}

/// Decoder library behind the engines
#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum BackendChoice {
    /// Every catalog symbology, via rxing
    Multi,
    /// QR codes only, via rqrr
    Qr,
}

impl BackendChoice {
    /// Engine factory for this backend
    pub fn engines(self) -> Box<dyn EngineFactory> {
        match self {
            BackendChoice::Multi => Box::new(backend::MultiEngines),
            BackendChoice::Qr => Box::new(backend::QrEngines),
        }
    }
}
