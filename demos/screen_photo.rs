//! Facial Photo Screening Example
//!
//! This example runs the full screening pipeline over one or more photos:
//! intake validation, letterbox normalization, ONNX inference, and report
//! shaping, with every completed prediction appended to a JSON-lines
//! archive.
//!
//! Usage:
//! ```
//! cargo run --example screen_photo -- --model-path <path_to_model> <image_paths>...
//! ```

use bright_screen::prelude::*;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

/// Command-line arguments for the screening example
#[derive(Parser)]
#[command(name = "screen_photo")]
#[command(about = "Facial Photo Screening Example - classifies facial photos")]
struct Args {
    /// Path to the ONNX model file
    #[arg(short, long)]
    model_path: String,

    /// Image file paths to process
    #[arg(required = true)]
    images: Vec<String>,

    /// User identity recorded with each prediction
    #[arg(short, long, default_value = "demo")]
    user: String,

    /// JSON-lines archive file
    #[arg(short, long, default_value = "predictions.jsonl")]
    archive: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    bright_screen::core::init_tracing();
    let args = Args::parse();

    let config = PipelineConfig::new(&args.model_path);
    let archiver = Arc::new(JsonlArchiver::new(&args.archive));
    let pipeline = ScreeningPipeline::from_config(config, archiver)?;

    for path in &args.images {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("failed to read {}: {}", path, e);
                continue;
            }
        };

        match pipeline.screen(&bytes, path, &args.user) {
            Ok(outcome) => {
                info!(
                    "{}: {} ({})",
                    path, outcome.report.class, outcome.report.confidence_percentage
                );
                for (class, percentage) in &outcome.report.probabilities {
                    info!("  {}: {}", class, percentage);
                }
                if !outcome.archived {
                    info!("  (archive write failed; prediction not recorded)");
                }
            }
            Err(e) => {
                error!("{}: {}", path, e.user_message());
            }
        }
    }

    Ok(())
}
