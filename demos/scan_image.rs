//! Scan a still image as if it were a camera frame
//!
//! Usage: `cargo run --example scan_image -- path/to/barcode.png [cropped]`

use bytes::Bytes;
use scanfusion_core::{
    geometry::{Rect, ViewSize},
    Frame, ScanPipeline, ScanWindow, StaticProbe,
};
use crossbeam_channel::unbounded;
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let path = args.next().ok_or("usage: scan_image <image> [cropped]")?;
    let cropped = args.next().as_deref() == Some("cropped");

    println!("ScanFusion Image Scan Example\n");

    let luma = image::open(&path)?.into_luma8();
    let (width, height) = (luma.width() as usize, luma.height() as usize);
    println!("Loaded {path}: {width}x{height}");

    // Rotation 0: the view has the sensor's transposed size for a 1:1 mapping.
    let view = ViewSize::new(height as f32, width as f32);
    let window = ScanWindow::new(Rect::new(0.0, 0.0, width as f32, height as f32), view);

    let (tx, rx) = unbounded();
    let pipeline = ScanPipeline::builder()
        .scan_window(Arc::new(window))
        .on_decoded(move |value| {
            let _ = tx.send(value.to_string());
        })
        .build_with_multiformat(&StaticProbe(cropped))?;
    println!("Strategy: {:?}", pipeline.engine_kind());

    let frame = Frame::from_luma(width, height, 0, Bytes::from(luma.into_raw()));
    pipeline.analyze(frame);

    match rx.recv_timeout(Duration::from_secs(5)) {
        Ok(value) => println!("Decoded: {value}"),
        Err(_) => println!("No barcode found"),
    }
    Ok(())
}
