use std::fs;
use std::path::Path;
use tempfile::tempdir;

use image::{GrayImage, Luma};
use scanfusion_cli::commands::scan::{self, ScanEvent, ScanOptions};
use scanfusion_cli::{BackendChoice, EngineChoice};
use scanfusion_core::geometry::{Rect, ViewSize};
use scanfusion_core::Format;

/// Helper: write a flat grey image
fn write_blank(path: &Path, width: u32, height: u32, value: u8) {
    GrayImage::from_pixel(width, height, Luma([value]))
        .save(path)
        .unwrap();
}

fn options(input: &Path, engine: EngineChoice) -> ScanOptions {
    ScanOptions {
        input: input.to_path_buf(),
        window: Rect::new(0.0, 0.0, 120.0, 160.0),
        view: ViewSize::new(120.0, 160.0),
        rotation: 90,
        engine,
        backend: BackendChoice::Multi,
        formats: None,
        interval_ms: 33,
        config: None,
        output: None,
    }
}

#[test]
fn test_scan_blank_frames_reports_nothing() {
    let dir = tempdir().unwrap();
    for i in 0..3 {
        write_blank(&dir.path().join(format!("frame_{i}.png")), 160, 120, 200);
    }

    for engine in [EngineChoice::WholeFrame, EngineChoice::Cropped] {
        for backend in [BackendChoice::Multi, BackendChoice::Qr] {
            let mut opts = options(dir.path(), engine);
            opts.backend = backend;
            assert!(scan::execute(&opts).unwrap().is_empty());
        }
    }
}

#[test]
fn test_scan_writes_json_output() {
    let dir = tempdir().unwrap();
    let image = dir.path().join("frame.png");
    write_blank(&image, 160, 120, 30);
    let output = dir.path().join("events.json");

    let mut opts = options(&image, EngineChoice::Cropped);
    opts.output = Some(output.clone());
    opts.formats = Some(vec![Format::QrCode]);
    scan::execute(&opts).unwrap();

    let events: Vec<ScanEvent> = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert!(events.is_empty());
}

#[test]
fn test_scan_ignores_non_image_files() {
    let dir = tempdir().unwrap();
    write_blank(&dir.path().join("a.png"), 64, 64, 255);
    fs::write(dir.path().join("notes.txt"), "not an image").unwrap();

    let events = scan::execute(&options(dir.path(), EngineChoice::WholeFrame)).unwrap();
    assert!(events.is_empty());
}

#[test]
fn test_scan_empty_directory_fails() {
    let dir = tempdir().unwrap();
    let result = scan::execute(&options(dir.path(), EngineChoice::WholeFrame));
    assert!(result.is_err());
}

#[test]
fn test_scan_missing_input_fails() {
    let dir = tempdir().unwrap();
    let result = scan::execute(&options(
        &dir.path().join("missing.png"),
        EngineChoice::Cropped,
    ));
    assert!(result.is_err());
}

#[test]
fn test_scan_with_config_file() {
    let dir = tempdir().unwrap();
    let image = dir.path().join("frame.png");
    write_blank(&image, 160, 120, 128);
    let config = dir.path().join("config.json");
    fs::write(
        &config,
        r#"{ "formats": ["QR_CODE", "EAN_13"], "cooldown_ms": 1000 }"#,
    )
    .unwrap();

    let mut opts = options(&image, EngineChoice::WholeFrame);
    opts.config = Some(config);
    assert!(scan::execute(&opts).unwrap().is_empty());
}

#[test]
fn test_scan_rejects_invalid_config() {
    let dir = tempdir().unwrap();
    let image = dir.path().join("frame.png");
    write_blank(&image, 160, 120, 128);
    let config = dir.path().join("config.json");
    fs::write(&config, r#"{ "formats": [] }"#).unwrap();

    let mut opts = options(&image, EngineChoice::WholeFrame);
    opts.config = Some(config);
    assert!(scan::execute(&opts).is_err());
}
