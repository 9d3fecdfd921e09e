use std::path::PathBuf;
use std::process;

use clap::Parser;

use auto_watermark::{
    collect_images, submit_job, Anchor, ProcessOptions, ProcessResult, Status, WatermarkJob,
    DEFAULT_RATIO,
};

#[derive(Parser)]
#[command(
    name = "auto-watermark",
    about = "Batch-apply a light or dark logo overlay, picked by local brightness",
    version,
    after_help = "Simple usage: auto-watermark photos/ --light white.png --dark black.png\n\n\
                  Results go to <dir>/Modified/ unless --overwrite is given.\n\
                  Anchors: top-left, top, top-right, left, center, right,\n\
                  bottom-left, bottom, bottom-right (or row,col with 0-2)."
)]
struct Cli {
    /// Input images or directories (JPEG and PNG)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Logo used on dark backgrounds (PNG with alpha)
    #[arg(short, long)]
    light: PathBuf,

    /// Logo used on light backgrounds (PNG with alpha)
    #[arg(short, long)]
    dark: PathBuf,

    /// Logo width as a fraction of the photo's shorter side (0-1]
    #[arg(short, long, default_value_t = DEFAULT_RATIO)]
    ratio: f64,

    /// Logo position on the 3x3 grid
    #[arg(short, long, default_value = "bottom-right")]
    anchor: Anchor,

    /// Replace the original files instead of writing to Modified/
    #[arg(long)]
    overwrite: bool,

    /// Process one image at a time
    #[arg(long)]
    sequential: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Error
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .parse_default_env()
        .init();

    let options = ProcessOptions {
        ratio: cli.ratio,
        anchor: cli.anchor,
        overwrite: cli.overwrite,
        parallel: !cli.sequential,
    };
    if let Err(e) = options.validate() {
        eprintln!("Error: {e}");
        process::exit(1);
    }

    let images = collect_images(&cli.inputs);
    if images.is_empty() {
        eprintln!("Error: No JPEG or PNG images found in the given inputs");
        process::exit(1);
    }

    if !cli.quiet {
        eprintln!(
            "Watermarking {} image(s) at {} (ratio {:.2}){}",
            images.len(),
            cli.anchor,
            cli.ratio,
            if cli.overwrite { ", overwriting originals" } else { "" }
        );
        eprintln!();
    }

    let job = WatermarkJob {
        images,
        light_overlay: cli.light,
        dark_overlay: cli.dark,
        options,
    };

    let report = submit_job(&job);
    if let Some(reason) = &report.aborted {
        eprintln!("Fatal: {reason}");
        process::exit(1);
    }

    for r in &report.results {
        print_result(r, cli.quiet);
    }

    if report.results.len() > 1 && !cli.quiet {
        eprintln!();
        eprint!("[Summary] Processed: {}", report.succeeded());
        if report.skipped() > 0 {
            eprint!(", Skipped: {}", report.skipped());
        }
        if report.failed() > 0 {
            eprint!(", Failed: {}", report.failed());
        }
        eprintln!(" (Total: {})", report.results.len());
    }

    if report.failed() > 0 {
        process::exit(1);
    }
}

fn print_result(result: &ProcessResult, quiet: bool) {
    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    match &result.status {
        Status::Success(output) => {
            if !quiet {
                eprintln!("[OK] {filename} -> {}", output.display());
            }
        }
        Status::Skipped(reason) => {
            if !quiet {
                eprintln!("[SKIP] {filename}: {reason}");
            }
        }
        Status::Failed(reason) => eprintln!("[FAIL] {filename}: {reason}"),
    }
}
