use anyhow::Result;
use clap::{Parser, Subcommand};
use scanfusion_cli::commands;
use scanfusion_cli::commands::scan::{parse_format, parse_view, parse_window, ScanOptions};
use scanfusion_cli::{BackendChoice, EngineChoice};
use scanfusion_core::geometry::{Rect, View, ViewSize};
use scanfusion_core::Format;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "scanfusion")]
#[command(about = "ScanFusion - Real-time barcode scanning over captured frames", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Feed images through the scan pipeline as camera frames
    Scan {
        /// Image file, or a directory of images fed in name order
        #[arg(short, long)]
        input: PathBuf,

        /// Scan window in view coordinates: left,top,right,bottom
        #[arg(long, value_parser = parse_window, allow_hyphen_values = true)]
        window: Rect<View>,

        /// Preview view size: WIDTHxHEIGHT
        #[arg(long, value_parser = parse_view)]
        view: ViewSize,

        /// Rotation hint of every frame, in degrees clockwise
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        rotation: i32,

        /// Decode strategy
        #[arg(long, value_enum, default_value = "whole-frame")]
        engine: EngineChoice,

        /// Decoder library
        #[arg(long, value_enum, default_value = "multi")]
        backend: BackendChoice,

        /// Enabled formats, comma separated (overrides the config file)
        #[arg(long, value_delimiter = ',', value_parser = parse_format)]
        formats: Option<Vec<Format>>,

        /// Virtual time between frames, in milliseconds
        #[arg(long, default_value = "33")]
        interval_ms: u64,

        /// JSON pipeline configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output JSON file for accepted detections
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List supported formats and their engine identifiers
    Formats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rotate an image's luminance by a quarter-turn multiple
    Rotate {
        /// Input image
        #[arg(short, long)]
        input: PathBuf,

        /// Degrees clockwise; anything but 0/90/180/270 leaves the image as is
        #[arg(short, long, allow_hyphen_values = true)]
        degrees: i32,

        /// Output image (format from extension)
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Execute command
    match cli.command {
        Commands::Scan {
            input,
            window,
            view,
            rotation,
            engine,
            backend,
            formats,
            interval_ms,
            config,
            output,
        } => {
            let options = ScanOptions {
                input,
                window,
                view,
                rotation,
                engine,
                backend,
                formats,
                interval_ms,
                config,
                output,
            };
            commands::scan::execute(&options).map(|_| ())
        }

        Commands::Formats { json } => commands::formats::execute(json),

        Commands::Rotate {
            input,
            degrees,
            output,
        } => commands::rotate::execute(&input, degrees, &output).map(|_| ()),
    }
}
