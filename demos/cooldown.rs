//! Walk through the debounce timeline on a virtual clock

use bytes::Bytes;
use scanfusion_core::{
    binarize::BitMatrix,
    engine::{CroppedDecoder, DetectCallback, EngineFactory, ReadResult, SymbolDetector},
    format::{DetectorFormat, ReaderFormat},
    geometry::{Rect, ViewSize},
    Frame, ManualScheduler, ScanError, ScanPipeline, ScanWindow, StaticProbe,
};
use std::sync::Arc;
use std::time::Duration;

/// Decoder that reads the same ticket on every frame
struct Ticket;

impl CroppedDecoder for Ticket {
    fn decode(&self, _: &BitMatrix) -> Result<ReadResult, ScanError> {
        Ok(ReadResult {
            text: Some("TICKET-0042".into()),
            format: ReaderFormat::QrCode,
            bounds: None,
        })
    }
}

struct NoDetector;

impl SymbolDetector for NoDetector {
    fn detect(&self, frame: Frame, done: DetectCallback) {
        done(frame, Ok(Vec::new()));
    }
}

struct TicketEngines;

impl EngineFactory for TicketEngines {
    fn detector(&self, _: &[DetectorFormat]) -> Result<Box<dyn SymbolDetector>, ScanError> {
        Ok(Box::new(NoDetector))
    }

    fn decoder(&self, _: &[ReaderFormat]) -> Result<Box<dyn CroppedDecoder>, ScanError> {
        Ok(Box::new(Ticket))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("ScanFusion Cooldown Example\n");

    let clock = Arc::new(ManualScheduler::new());
    let pipeline = ScanPipeline::builder()
        .scheduler(clock.clone())
        .scan_window(Arc::new(ScanWindow::new(
            Rect::new(0.0, 0.0, 120.0, 160.0),
            ViewSize::new(120.0, 160.0),
        )))
        .on_decoded(|value| println!("    -> listener: {value}"))
        .build(&StaticProbe(true), &TicketEngines)?;

    // A 30 fps camera pointed at the same ticket for five seconds.
    for tick in 0..150u64 {
        let frame = Frame::from_luma(160, 120, 90, Bytes::from(vec![128u8; 160 * 120]));
        let admission = pipeline.analyze(frame);
        if tick % 15 == 0 {
            println!("t={:>5} ms  {:?}", clock.now().as_millis(), admission);
        }
        clock.advance(Duration::from_micros(33_333));
    }
    Ok(())
}
