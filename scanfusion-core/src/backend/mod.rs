//! Concrete decode engines
//!
//! - `qr`: QR codes only, built on `rqrr` (feature `rqrr-backend`)
//! - `multi`: every symbology `rxing` reads (feature `rxing-backend`)
//!
//! Whole-frame detectors run on a thread of their own and hand each frame
//! back through its callback.

use crate::engine::{DetectCallback, DetectionResult};
use crate::error::ScanError;
use crate::frame::Frame;
use crate::geometry::Rect;
use crate::rotation::{LumaPlane, Rotation};
use crossbeam_channel::{unbounded, Sender};
use std::thread::{self, JoinHandle};

#[cfg(feature = "rxing-backend")]
mod multi;
#[cfg(feature = "rqrr-backend")]
mod qr;

#[cfg(feature = "rxing-backend")]
pub use multi::{MultiDetector, MultiEngines, MultiReader};
#[cfg(feature = "rqrr-backend")]
pub use qr::{QrDetector, QrEngines, QrReader};

struct DetectJob {
    frame: Frame,
    done: DetectCallback,
}

/// A detection routine serving frames in order on a dedicated thread
struct DetectorWorker {
    jobs: Option<Sender<DetectJob>>,
    worker: Option<JoinHandle<()>>,
}

impl DetectorWorker {
    fn spawn(
        name: &str,
        detect: impl Fn(&Frame) -> DetectionResult + Send + 'static,
    ) -> Result<Self, ScanError> {
        let (tx, rx) = unbounded::<DetectJob>();
        let worker = thread::Builder::new()
            .name(name.into())
            .spawn(move || {
                for DetectJob { frame, done } in rx {
                    let result = detect(&frame);
                    done(frame, result);
                }
            })?;

        Ok(Self {
            jobs: Some(tx),
            worker: Some(worker),
        })
    }

    fn submit(&self, frame: Frame, done: DetectCallback) {
        let Some(jobs) = &self.jobs else {
            done(frame, Err(ScanError::Engine("detector stopped".into())));
            return;
        };
        if let Err(rejected) = jobs.send(DetectJob { frame, done }) {
            let DetectJob { frame, done } = rejected.into_inner();
            done(frame, Err(ScanError::Engine("detector worker exited".into())));
        }
    }
}

impl Drop for DetectorWorker {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain and exit.
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            if worker.thread().id() != thread::current().id() {
                let _ = worker.join();
            }
        }
    }
}

/// The frame's luminance turned upright by its rotation hint
fn upright_luma(frame: &Frame) -> Result<LumaPlane, ScanError> {
    let luma = frame.luma_plane()?;
    Ok(match Rotation::from_degrees(frame.rotation_degrees()) {
        Some(rotation) => luma.rotate(rotation),
        None => luma,
    })
}

/// Axis-aligned bounds of `points`, at least one pixel on each side
///
/// Linear symbologies report two points on a single scan line; the minimum
/// extent keeps their box non-empty.
fn bounds_of<S>(points: impl IntoIterator<Item = (f32, f32)>) -> Rect<S> {
    let mut edges: Option<(f32, f32, f32, f32)> = None;
    for (x, y) in points {
        edges = Some(match edges {
            None => (x, y, x, y),
            Some((l, t, r, b)) => (l.min(x), t.min(y), r.max(x), b.max(y)),
        });
    }
    match edges {
        Some((l, t, r, b)) => Rect::new(l, t, r.max(l + 1.0), b.max(t + 1.0)),
        None => Rect::new(0.0, 0.0, 0.0, 0.0),
    }
}
