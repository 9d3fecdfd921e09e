//! Watermark a single image into `<dir>/Modified/`.
//!
//! Usage:
//! ```sh
//! cargo run --example apply_watermark -- photo.jpg white.png black.png
//! ```

use std::env;
use std::path::Path;
use std::process;

use auto_watermark::{ProcessOptions, Status, WatermarkEngine};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        eprintln!("Usage: {} <photo> <light-overlay> <dark-overlay>", args[0]);
        process::exit(1);
    }

    let engine = WatermarkEngine::from_files(Path::new(&args[2]), Path::new(&args[3]))
        .expect("failed to load overlays");
    let opts = ProcessOptions::default();
    let result = engine.process_file(Path::new(&args[1]), &opts);

    match result.status {
        Status::Success(output) => println!("Done: {}", output.display()),
        Status::Skipped(reason) => println!("Skipped: {reason}"),
        Status::Failed(reason) => {
            eprintln!("Error: {reason}");
            process::exit(1);
        }
    }
}
