//! Integration tests for the frame → admission → decode → listener → cooldown flow

use bytes::Bytes;
use scanfusion_core::{
    binarize::BitMatrix,
    engine::{
        CroppedDecoder, DetectCallback, Detection, EngineFactory, ReadResult, StaticProbe,
        SymbolDetector,
    },
    format::{DetectorFormat, Format, ReaderFormat},
    geometry::{Rect, ViewSize},
    schedule::ManualScheduler,
    Admission, EngineKind, Frame, ScanError, ScanPipeline, ScanWindow,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One symbol placed in the camera's field of view
#[derive(Clone)]
struct Symbol {
    value: &'static str,
    format: Format,
    bounds: Rect<scanfusion_core::geometry::Sensor>,
}

/// Engines that "see" a fixed scene, limited to what their format list can express
struct Scene(Vec<Symbol>);

struct SceneDetector {
    scene: Vec<Symbol>,
    formats: Vec<DetectorFormat>,
}

impl SymbolDetector for SceneDetector {
    fn detect(&self, frame: Frame, done: DetectCallback) {
        let detections = self
            .scene
            .iter()
            .filter_map(|s| {
                let native = s.format.to_detector_format()?;
                self.formats.contains(&native).then(|| Detection {
                    raw_value: Some(s.value.to_string()),
                    format: native,
                    bounding_box: Some(s.bounds),
                })
            })
            .collect();
        done(frame, Ok(detections));
    }
}

struct SceneDecoder {
    scene: Vec<Symbol>,
    formats: Vec<ReaderFormat>,
}

impl CroppedDecoder for SceneDecoder {
    fn decode(&self, _: &BitMatrix) -> Result<ReadResult, ScanError> {
        self.scene
            .iter()
            .find(|s| self.formats.contains(&s.format.to_reader_format()))
            .map(|s| ReadResult {
                text: Some(s.value.to_string()),
                format: s.format.to_reader_format(),
                bounds: None,
            })
            .ok_or(ScanError::NotFound)
    }
}

impl EngineFactory for Scene {
    fn detector(&self, formats: &[DetectorFormat]) -> Result<Box<dyn SymbolDetector>, ScanError> {
        Ok(Box::new(SceneDetector {
            scene: self.0.clone(),
            formats: formats.to_vec(),
        }))
    }

    fn decoder(&self, formats: &[ReaderFormat]) -> Result<Box<dyn CroppedDecoder>, ScanError> {
        Ok(Box::new(SceneDecoder {
            scene: self.0.clone(),
            formats: formats.to_vec(),
        }))
    }
}

struct Harness {
    pipeline: ScanPipeline,
    scheduler: Arc<ManualScheduler>,
    seen: Arc<Mutex<Vec<String>>>,
    released: Arc<AtomicUsize>,
}

impl Harness {
    fn new(cropped: bool, formats: &[Format], scene: Vec<Symbol>) -> Self {
        let scheduler = Arc::new(ManualScheduler::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        // 640x480 sensor rotated 90° into a 480x640 portrait view: scale 1.0.
        let window = ScanWindow::new(
            Rect::new(100.0, 100.0, 380.0, 380.0),
            ViewSize::new(480.0, 640.0),
        );
        let pipeline = ScanPipeline::builder()
            .formats(formats.to_vec())
            .scheduler(scheduler.clone())
            .scan_window(Arc::new(window))
            .on_decoded(move |value| sink.lock().unwrap().push(value.to_string()))
            .build(&StaticProbe(cropped), &Scene(scene))
            .unwrap();
        Self {
            pipeline,
            scheduler,
            seen,
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn frame(&self) -> Frame {
        let counter = self.released.clone();
        let luma: Vec<u8> = (0..640 * 480).map(|i| ((i / 7) % 2 * 255) as u8).collect();
        Frame::from_luma(640, 480, 90, Bytes::from(luma)).on_release(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn feed(&self) -> Admission {
        self.pipeline.analyze(self.frame())
    }

    fn advance_ms(&self, ms: u64) {
        self.scheduler.advance(Duration::from_millis(ms));
    }

    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

fn abc123() -> Symbol {
    Symbol {
        value: "ABC123",
        format: Format::QrCode,
        bounds: Rect::new(150.0, 150.0, 250.0, 250.0),
    }
}

#[test]
fn test_detection_then_cooldown_then_detection() {
    let h = Harness::new(false, &[Format::QrCode], vec![abc123()]);

    assert_eq!(h.feed(), Admission::Admitted);
    assert_eq!(h.seen(), vec!["ABC123"]);

    h.advance_ms(500);
    assert_eq!(h.feed(), Admission::Busy);
    assert_eq!(h.seen().len(), 1);

    h.advance_ms(2600);
    assert_eq!(h.feed(), Admission::Admitted);
    assert_eq!(h.seen(), vec!["ABC123", "ABC123"]);
}

#[test]
fn test_empty_frames_do_not_start_cooldown() {
    let h = Harness::new(false, &[Format::QrCode], Vec::new());

    for _ in 0..10 {
        assert_eq!(h.feed(), Admission::Admitted);
    }
    assert!(h.seen().is_empty());
    assert!(!h.pipeline.is_busy());
    assert_eq!(h.scheduler.pending(), 0);
}

#[test]
fn test_code_outside_window_is_ignored_by_whole_frame() {
    let outside = Symbol {
        value: "OUTSIDE",
        format: Format::QrCode,
        bounds: Rect::new(400.0, 400.0, 470.0, 470.0),
    };
    let h = Harness::new(false, &[Format::QrCode], vec![outside]);
    h.feed();
    assert!(h.seen().is_empty());
    assert!(!h.pipeline.is_busy());
}

#[test]
fn test_only_first_symbol_is_delivered() {
    let second = Symbol {
        value: "SECOND",
        format: Format::QrCode,
        bounds: Rect::new(200.0, 200.0, 300.0, 300.0),
    };
    let h = Harness::new(false, &[Format::QrCode], vec![abc123(), second]);
    h.feed();
    assert_eq!(h.seen(), vec!["ABC123"]);
}

#[test]
fn test_maxicode_only_reaches_the_cropped_engine() {
    let maxicode = Symbol {
        value: "MAXI",
        format: Format::Maxicode,
        bounds: Rect::new(150.0, 150.0, 250.0, 250.0),
    };

    let whole = Harness::new(false, &[Format::Maxicode], vec![maxicode.clone()]);
    assert_eq!(whole.pipeline.engine_kind(), EngineKind::WholeFrame);
    whole.feed();
    assert!(whole.seen().is_empty());

    let cropped = Harness::new(true, &[Format::Maxicode], vec![maxicode]);
    assert_eq!(cropped.pipeline.engine_kind(), EngineKind::Cropped);
    cropped.feed();
    assert_eq!(cropped.seen(), vec!["MAXI"]);
}

#[test]
fn test_disabled_gate_drops_frames_without_decoding() {
    let h = Harness::new(true, &[Format::QrCode], vec![abc123()]);
    h.pipeline.set_scanning_enabled(false);
    assert_eq!(h.feed(), Admission::Disabled);
    assert!(h.seen().is_empty());

    h.pipeline.set_scanning_enabled(true);
    assert_eq!(h.feed(), Admission::Admitted);
    assert_eq!(h.seen(), vec!["ABC123"]);
}

#[test]
fn test_every_frame_released_exactly_once() {
    for cropped in [false, true] {
        let h = Harness::new(cropped, &[Format::QrCode], vec![abc123()]);
        let mut fed = 0;
        for step in 0..40 {
            h.feed();
            fed += 1;
            if step % 10 == 9 {
                h.advance_ms(3000);
            }
            if step == 20 {
                h.pipeline.set_scanning_enabled(false);
            }
            if step == 25 {
                h.pipeline.set_scanning_enabled(true);
            }
        }
        assert_eq!(h.released.load(Ordering::SeqCst), fed);
    }
}

#[test]
fn test_dropping_pipeline_cancels_cooldown() {
    let h = Harness::new(false, &[Format::QrCode], vec![abc123()]);
    h.feed();
    assert_eq!(h.scheduler.pending(), 1);
    let Harness { pipeline, scheduler, .. } = h;
    drop(pipeline);
    assert_eq!(scheduler.pending(), 0);
    assert_eq!(scheduler.advance(Duration::from_millis(5000)), 0);
}

#[cfg(feature = "rqrr-backend")]
#[test]
fn test_qr_backend_handles_blank_frames_asynchronously() {
    use scanfusion_core::schedule::ThreadScheduler;
    use std::time::Instant;

    let released = Arc::new(AtomicUsize::new(0));
    let pipeline = ScanPipeline::builder()
        .formats(vec![Format::QrCode])
        .scheduler(Arc::new(ThreadScheduler::new().unwrap()))
        .on_decoded(|_| {})
        .build_with_qr(&StaticProbe(false))
        .unwrap();

    let counter = released.clone();
    let frame = Frame::from_luma(64, 48, 0, Bytes::from(vec![255u8; 64 * 48])).on_release(
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
        },
    );
    assert_eq!(pipeline.analyze(frame), Admission::Admitted);

    let deadline = Instant::now() + Duration::from_secs(5);
    while released.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(released.load(Ordering::SeqCst), 1);
    while pipeline.is_busy() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!(!pipeline.is_busy());
}
