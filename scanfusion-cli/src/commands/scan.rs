use crate::{BackendChoice, EngineChoice};
use anyhow::{anyhow, bail, Context, Result};
use bytes::Bytes;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use crossbeam_channel::{bounded, Sender};
use scanfusion_core::{
    geometry::{Rect, View, ViewSize},
    Admission, EngineKind, Format, Frame, ManualScheduler, ScanConfig, ScanPipeline, ScanWindow,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];
const RELEASE_TIMEOUT: Duration = Duration::from_secs(10);

/// Arguments of `scanfusion scan`
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub input: PathBuf,
    pub window: Rect<View>,
    pub view: ViewSize,
    pub rotation: i32,
    pub engine: EngineChoice,
    pub backend: BackendChoice,
    pub formats: Option<Vec<Format>>,
    pub interval_ms: u64,
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

/// One accepted detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanEvent {
    /// Position of the frame in the input sequence
    pub frame: usize,
    /// Virtual time the frame arrived at
    pub time_ms: u64,
    /// Image the frame came from
    pub source: String,
    /// Decoded payload
    pub value: String,
}

/// Parse `left,top,right,bottom`
pub fn parse_window(s: &str) -> Result<Rect<View>, String> {
    let edges = s
        .split(',')
        .map(|v| v.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid window '{s}': {e}"))?;
    match edges[..] {
        [left, top, right, bottom] => Ok(Rect::new(left, top, right, bottom)),
        _ => Err(format!("window '{s}' must have four comma-separated edges")),
    }
}

/// Parse `WIDTHxHEIGHT`
pub fn parse_view(s: &str) -> Result<ViewSize, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("view '{s}' must look like WIDTHxHEIGHT"))?;
    let width = w.trim().parse::<f32>().map_err(|e| format!("invalid view width: {e}"))?;
    let height = h.trim().parse::<f32>().map_err(|e| format!("invalid view height: {e}"))?;
    Ok(ViewSize::new(width, height))
}

/// Parse one format name such as `QR_CODE` or `qr-code`
pub fn parse_format(s: &str) -> Result<Format, String> {
    s.parse::<Format>().map_err(|e| e.to_string())
}

/// Images to feed, in name order
fn collect_inputs(input: &Path) -> Result<Vec<PathBuf>> {
    if !input.is_dir() {
        return Ok(vec![input.to_path_buf()]);
    }
    let mut files: Vec<PathBuf> = fs::read_dir(input)
        .with_context(|| format!("Failed to read input directory: {}", input.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        })
        .collect();
    files.sort();
    if files.is_empty() {
        bail!("No images found in {}", input.display());
    }
    Ok(files)
}

fn load_config(options: &ScanOptions) -> Result<ScanConfig> {
    let mut config = match &options.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            ScanConfig::from_json(&json)
                .with_context(|| format!("Invalid config file: {}", path.display()))?
        }
        None => ScanConfig::default(),
    };
    if let Some(formats) = &options.formats {
        config.formats = formats.clone();
    }
    config.validate().context("Invalid scan settings")?;
    Ok(config)
}

/// Load an image as a luminance frame that signals its release on `released`
fn load_frame(path: &Path, rotation: i32, released: &Sender<()>) -> Result<Frame> {
    let luma = image::open(path)
        .with_context(|| format!("Failed to decode image: {}", path.display()))?
        .into_luma8();
    let (width, height) = (luma.width() as usize, luma.height() as usize);
    let released = released.clone();
    Ok(
        Frame::from_luma(width, height, rotation, Bytes::from(luma.into_raw())).on_release(
            move || {
                let _ = released.send(());
            },
        ),
    )
}

pub fn execute(options: &ScanOptions) -> Result<Vec<ScanEvent>> {
    info!("Scanning input: {}", options.input.display());

    let inputs = collect_inputs(&options.input)?;
    let config = load_config(options)?;

    info!(
        "{} frame(s), {} format(s), {:?} engine, {:?} backend",
        inputs.len(),
        config.formats.len(),
        options.engine,
        options.backend
    );

    let clock = Arc::new(ManualScheduler::new());
    let accepted = Arc::new(Mutex::new(Vec::<String>::new()));
    let sink = accepted.clone();
    let pipeline = ScanPipeline::builder()
        .config(config)
        .scheduler(clock.clone())
        .scan_window(Arc::new(ScanWindow::new(options.window, options.view)))
        .on_decoded(move |value| {
            if let Ok(mut values) = sink.lock() {
                values.push(value.to_string());
            }
        })
        .build(&options.engine.capability(), options.backend.engines().as_ref())
        .context("Failed to build scan pipeline")?;
    if pipeline.engine_kind() != EngineKind::from(options.engine) {
        bail!("Pipeline selected the {:?} engine", pipeline.engine_kind());
    }

    let progress = ProgressBar::new(inputs.len() as u64);
    if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} frames {msg}") {
        progress.set_style(style);
    }

    // Frames are fed one at a time, so at most one release is outstanding.
    let (released_tx, released_rx) = bounded(1);
    let mut events = Vec::new();
    let (mut busy, mut disabled) = (0usize, 0usize);

    for (index, path) in inputs.iter().enumerate() {
        let time_ms = clock.now().as_millis() as u64;
        let frame = load_frame(path, options.rotation, &released_tx)?;

        match pipeline.analyze(frame) {
            Admission::Admitted => {}
            Admission::Busy => busy += 1,
            Admission::Disabled => disabled += 1,
        }
        // The listener has run by the time the frame is released.
        released_rx
            .recv_timeout(RELEASE_TIMEOUT)
            .map_err(|_| anyhow!("Frame {} was not released in time", path.display()))?;

        let values: Vec<String> = accepted
            .lock()
            .map(|mut values| values.drain(..).collect())
            .unwrap_or_default();
        for value in values {
            debug!("Frame {} accepted at {} ms", index, time_ms);
            progress.suspend(|| {
                println!(
                    "{} [{:>6} ms] {}: {}",
                    "✓".green(),
                    time_ms,
                    path.display(),
                    value.bold()
                )
            });
            events.push(ScanEvent {
                frame: index,
                time_ms,
                source: path.display().to_string(),
                value,
            });
        }

        progress.inc(1);
        clock.advance(Duration::from_millis(options.interval_ms));
    }
    progress.finish_and_clear();

    println!("\n=== Scan Results ===");
    println!("Frames fed:        {}", inputs.len());
    println!("Accepted:          {}", events.len().to_string().green());
    println!("Rejected (busy):   {}", busy);
    println!("Rejected (off):    {}", disabled);
    println!();

    if let Some(output_path) = &options.output {
        let json = serde_json::to_string_pretty(&events)
            .with_context(|| "Failed to serialize scan events")?;

        fs::write(output_path, json)
            .with_context(|| format!("Failed to write output file: {}", output_path.display()))?;

        info!("Scan events written to: {}", output_path.display());
    } else if events.is_empty() {
        println!("{} No barcode accepted", "✗".red());
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_window() {
        let rect = parse_window("10, 20,110,220").unwrap();
        assert_eq!(rect, Rect::new(10.0, 20.0, 110.0, 220.0));
        assert!(parse_window("1,2,3").is_err());
        assert!(parse_window("a,b,c,d").is_err());
    }

    #[test]
    fn test_parse_view() {
        assert_eq!(parse_view("480x640").unwrap(), ViewSize::new(480.0, 640.0));
        assert!(parse_view("480").is_err());
    }

    #[test]
    fn test_parse_format() {
        assert_eq!(parse_format("qr-code").unwrap(), Format::QrCode);
        assert!(parse_format("NOPE").is_err());
    }
}
