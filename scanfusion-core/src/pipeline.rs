//! Pipeline façade
//!
//! A [`ScanPipeline`] picks its decode strategy once, at construction, from a
//! [`CapabilityProbe`]. Every frame then goes through the debounce admission
//! check, the selected strategy and, for accepted detections, the caller's
//! listener followed by the cooldown.

use crate::analyzer::{Analyzer, DecodedSymbol, EngineKind};
use crate::config::ScanConfig;
use crate::debounce::{Admission, Debouncer};
use crate::engine::{CapabilityProbe, EngineFactory};
use crate::error::ScanError;
use crate::format::Format;
use crate::frame::Frame;
use crate::geometry::{Rect, View, ViewSize};
use crate::schedule::{Scheduler, ThreadScheduler};
use crossbeam_channel::{bounded, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[cfg(feature = "logging")]
use tracing::{debug, error, info};

/// Listener receiving accepted payloads
pub type DecodedListener = Arc<dyn Fn(&str) + Send + Sync>;

/// The visible cut-out and the size of the view it sits in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanWindow {
    /// Cut-out in view coordinates
    pub rect: Rect<View>,
    /// Size of the preview view
    pub view: ViewSize,
}

impl ScanWindow {
    /// A window `rect` inside a view of size `view`
    pub fn new(rect: Rect<View>, view: ViewSize) -> Self {
        Self { rect, view }
    }

    /// Placeholder used before layout: empty rect, zero-sized view
    pub fn unlaid() -> Self {
        Self::new(Rect::new(0.0, 0.0, 0.0, 0.0), ViewSize::default())
    }
}

/// Supplies the current scan window for each frame
pub trait ScanWindowProvider: Send + Sync {
    /// Window to apply to the next frame
    fn scan_window(&self) -> ScanWindow;
}

impl ScanWindowProvider for ScanWindow {
    fn scan_window(&self) -> ScanWindow {
        *self
    }
}

/// A window that can be replaced at any time, e.g. on layout change
#[derive(Debug)]
pub struct SharedWindow {
    current: RwLock<ScanWindow>,
}

impl SharedWindow {
    /// Start with `window`
    pub fn new(window: ScanWindow) -> Self {
        Self {
            current: RwLock::new(window),
        }
    }

    /// Replace the window; applies from the next admitted frame
    pub fn set(&self, window: ScanWindow) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = window;
    }
}

impl ScanWindowProvider for SharedWindow {
    fn scan_window(&self) -> ScanWindow {
        *self.current.read().unwrap_or_else(PoisonError::into_inner)
    }
}

struct PipelineInner {
    analyzer: Analyzer,
    debouncer: Debouncer,
    window: Arc<dyn ScanWindowProvider>,
    listener: DecodedListener,
    config: ScanConfig,
    worker_bound: AtomicBool,
}

impl PipelineInner {
    fn complete(&self, symbols: Vec<DecodedSymbol>) {
        match symbols.into_iter().next() {
            Some(symbol) => {
                #[cfg(feature = "logging")]
                debug!(
                    "Accepted {:?} symbol ({} bytes)",
                    symbol.format,
                    symbol.raw_value.len()
                );
                (self.listener)(&symbol.raw_value);
                self.debouncer.finish_accepted();
            }
            None => self.debouncer.finish_empty(),
        }
    }
}

/// Frames in, at most one decoded value per cooldown out
///
/// Cloning is cheap and shares the same pipeline. The pending cooldown is
/// cancelled when the last clone is dropped.
#[derive(Clone)]
pub struct ScanPipeline {
    inner: Arc<PipelineInner>,
}

impl ScanPipeline {
    /// Start configuring a pipeline
    pub fn builder() -> ScanPipelineBuilder {
        ScanPipelineBuilder::default()
    }

    /// Offer one frame to the pipeline
    ///
    /// Rejected frames are released before this returns. Admitted frames are
    /// released by the strategy once decoding completes, which for the
    /// whole-frame strategy may be after this returns.
    pub fn analyze(&self, frame: Frame) -> Admission {
        let admission = self.inner.debouncer.admit();
        if admission != Admission::Admitted {
            #[cfg(feature = "logging")]
            debug!("Frame rejected: {:?}", admission);
            return admission;
        }

        let window = self.inner.window.scan_window();
        let pipeline: Weak<PipelineInner> = Arc::downgrade(&self.inner);
        self.inner.analyzer.analyze(
            frame,
            window.rect,
            window.view,
            Box::new(move |symbols| {
                if let Some(pipeline) = pipeline.upgrade() {
                    pipeline.complete(symbols);
                }
            }),
        );
        admission
    }

    /// Open or close the scanning gate
    pub fn set_scanning_enabled(&self, enabled: bool) {
        self.inner.debouncer.set_scanning_enabled(enabled);
    }

    /// Current gate value
    pub fn is_scanning_enabled(&self) -> bool {
        self.inner.debouncer.state().is_scanning_enabled()
    }

    /// Whether a decode or cooldown is running
    pub fn is_busy(&self) -> bool {
        self.inner.debouncer.state().is_decode_in_flight()
    }

    /// Strategy chosen at construction
    pub fn engine_kind(&self) -> EngineKind {
        self.inner.analyzer.kind()
    }

    /// Settings the pipeline was built with
    pub fn config(&self) -> &ScanConfig {
        &self.inner.config
    }

    /// Bind a dedicated analysis thread that feeds this pipeline in order
    ///
    /// Only one worker may be bound at a time. A second bind fails with
    /// [`ScanError::ResourceConflict`]; the caller decides whether to drop the
    /// first worker and retry.
    pub fn spawn_worker(&self) -> Result<AnalysisWorker, ScanError> {
        if self
            .inner
            .worker_bound
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            let err = ScanError::ResourceConflict(
                "an analysis worker is already bound to this pipeline".into(),
            );
            #[cfg(feature = "logging")]
            error!("{}", err);
            return Err(err);
        }

        let (tx, rx) = bounded::<Frame>(self.inner.config.worker_queue);
        let pipeline = self.clone();
        let spawned = thread::Builder::new()
            .name("scanfusion-analysis".into())
            .spawn(move || {
                for frame in rx {
                    pipeline.analyze(frame);
                }
            });

        match spawned {
            Ok(thread) => Ok(AnalysisWorker {
                frames: Some(tx),
                thread: Some(thread),
                pipeline: self.clone(),
            }),
            Err(e) => {
                self.inner.worker_bound.store(false, Ordering::SeqCst);
                let err = ScanError::from(e);
                #[cfg(feature = "logging")]
                error!("{}", err);
                Err(err)
            }
        }
    }
}

/// Serialized frame delivery on a dedicated thread
///
/// Frames are analyzed one at a time in submission order. Dropping the worker
/// drains queued frames, stops the thread and unbinds it from the pipeline.
pub struct AnalysisWorker {
    frames: Option<Sender<Frame>>,
    thread: Option<JoinHandle<()>>,
    pipeline: ScanPipeline,
}

impl AnalysisWorker {
    /// Queue a frame, blocking while the queue is full
    ///
    /// Hands the frame back if the worker has stopped.
    pub fn submit(&self, frame: Frame) -> Result<(), Frame> {
        match &self.frames {
            Some(frames) => frames.send(frame).map_err(|e| e.into_inner()),
            None => Err(frame),
        }
    }

    /// Queue a frame without blocking; hands it back when the queue is full
    pub fn try_submit(&self, frame: Frame) -> Result<(), Frame> {
        match &self.frames {
            Some(frames) => frames.try_send(frame).map_err(|e| match e {
                TrySendError::Full(f) | TrySendError::Disconnected(f) => f,
            }),
            None => Err(frame),
        }
    }
}

impl Drop for AnalysisWorker {
    fn drop(&mut self) {
        self.frames.take();
        if let Some(thread) = self.thread.take() {
            if thread.thread().id() != thread::current().id() {
                let _ = thread.join();
            }
        }
        self.pipeline
            .inner
            .worker_bound
            .store(false, Ordering::SeqCst);
    }
}

/// Builder for [`ScanPipeline`]
#[derive(Default)]
pub struct ScanPipelineBuilder {
    config: ScanConfig,
    window: Option<Arc<dyn ScanWindowProvider>>,
    scheduler: Option<Arc<dyn Scheduler>>,
    listener: Option<DecodedListener>,
}

impl ScanPipelineBuilder {
    /// Replace all settings
    pub fn config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    /// Enabled symbologies
    pub fn formats(mut self, formats: impl Into<Vec<Format>>) -> Self {
        self.config.formats = formats.into();
        self
    }

    /// Cooldown after an accepted detection
    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.config.cooldown_ms = cooldown.as_millis() as u64;
        self
    }

    /// Initial state of the scanning gate
    pub fn scanning_enabled(mut self, enabled: bool) -> Self {
        self.config.scanning_enabled = enabled;
        self
    }

    /// Where the scan window comes from; defaults to [`ScanWindow::unlaid`]
    pub fn scan_window(mut self, provider: Arc<dyn ScanWindowProvider>) -> Self {
        self.window = Some(provider);
        self
    }

    /// Scheduler for cooldown timers; defaults to a [`ThreadScheduler`]
    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Listener for accepted payloads (required)
    pub fn on_decoded(mut self, listener: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.listener = Some(Arc::new(listener));
        self
    }

    /// Probe capabilities, build the engine and assemble the pipeline
    ///
    /// # Panics
    ///
    /// Panics if no listener was set with [`ScanPipelineBuilder::on_decoded`].
    pub fn build(
        self,
        probe: &dyn CapabilityProbe,
        engines: &dyn EngineFactory,
    ) -> Result<ScanPipeline, ScanError> {
        let Some(listener) = self.listener else {
            panic!("ScanPipelineBuilder::build called before on_decoded was set");
        };
        self.config.validate()?;

        let scheduler: Arc<dyn Scheduler> = match self.scheduler {
            Some(scheduler) => scheduler,
            None => Arc::new(ThreadScheduler::new()?),
        };
        let analyzer = Analyzer::select(probe, engines, &self.config.formats).map_err(|e| {
            #[cfg(feature = "logging")]
            error!("Failed to create decode engine: {}", e);
            e
        })?;

        #[cfg(feature = "logging")]
        info!(
            "Scan pipeline ready: {:?} strategy, {} format(s), {} ms cooldown",
            analyzer.kind(),
            self.config.formats.len(),
            self.config.cooldown_ms
        );

        let debouncer = Debouncer::new(
            self.config.scanning_enabled,
            self.config.cooldown(),
            scheduler,
        );
        Ok(ScanPipeline {
            inner: Arc::new(PipelineInner {
                analyzer,
                debouncer,
                window: self
                    .window
                    .unwrap_or_else(|| Arc::new(ScanWindow::unlaid())),
                listener,
                config: self.config,
                worker_bound: AtomicBool::new(false),
            }),
        })
    }

    /// [`ScanPipelineBuilder::build`] with the bundled QR engines
    #[cfg(feature = "rqrr-backend")]
    pub fn build_with_qr(self, probe: &dyn CapabilityProbe) -> Result<ScanPipeline, ScanError> {
        self.build(probe, &crate::backend::QrEngines)
    }

    /// [`ScanPipelineBuilder::build`] with the bundled multi-format engines
    #[cfg(feature = "rxing-backend")]
    pub fn build_with_multiformat(
        self,
        probe: &dyn CapabilityProbe,
    ) -> Result<ScanPipeline, ScanError> {
        self.build(probe, &crate::backend::MultiEngines)
    }
}
