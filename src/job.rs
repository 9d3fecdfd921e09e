//! Batch jobs and their reports.

use std::path::PathBuf;

use log::{info, warn};

use crate::engine::{ProcessOptions, ProcessResult, Status, WatermarkEngine};
use crate::error::Result;

/// Everything needed to watermark a batch of photos.
#[derive(Debug, Clone)]
pub struct WatermarkJob {
    /// Photos to process, in processing order.
    pub images: Vec<PathBuf>,
    /// Overlay used on dark regions.
    pub light_overlay: PathBuf,
    /// Overlay used on light regions.
    pub dark_overlay: PathBuf,
    /// Size, anchor and output settings.
    pub options: ProcessOptions,
}

/// Outcome of a batch.
#[derive(Debug, Clone, Default)]
pub struct Report {
    /// One entry per input image, in input order.
    pub results: Vec<ProcessResult>,
    /// Set when the batch aborted before any image was touched.
    pub aborted: Option<String>,
}

impl Report {
    fn abort(reason: String) -> Self {
        Self {
            results: Vec::new(),
            aborted: Some(reason),
        }
    }

    /// Number of images written.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.count(|s| matches!(s, Status::Success(_)))
    }

    /// Number of images skipped.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, Status::Skipped(_)))
    }

    /// Number of images that failed to write.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, Status::Failed(_)))
    }

    /// Whether every image was written and the batch did not abort.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.aborted.is_none() && self.succeeded() == self.results.len()
    }

    fn count(&self, pred: impl Fn(&Status) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.status)).count()
    }
}

impl WatermarkJob {
    /// Check the job parameters and load the overlays.
    ///
    /// # Errors
    ///
    /// Returns the batch-fatal error that would abort [`submit_job`].
    pub fn prepare(&self) -> Result<WatermarkEngine> {
        self.options.validate()?;
        WatermarkEngine::from_files(&self.light_overlay, &self.dark_overlay)
    }
}

/// Run a job to completion.
///
/// Invalid options or an unusable overlay pair abort the batch before any
/// image is read; otherwise every image gets its own result and a failure
/// on one never stops the rest.
#[must_use]
pub fn submit_job(job: &WatermarkJob) -> Report {
    let engine = match job.prepare() {
        Ok(engine) => engine,
        Err(e) => {
            warn!("Batch aborted: {e}");
            return Report::abort(e.to_string());
        }
    };

    let results = engine.process_all(&job.images, &job.options);
    let report = Report {
        results,
        aborted: None,
    };
    info!(
        "Batch done: {} written, {} skipped, {} failed",
        report.succeeded(),
        report.skipped(),
        report.failed()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn result(name: &str, status: Status) -> ProcessResult {
        ProcessResult {
            path: Path::new(name).to_path_buf(),
            status,
        }
    }

    #[test]
    fn report_counts_by_status() {
        let report = Report {
            results: vec![
                result("a.jpg", Status::Success(PathBuf::from("Modified/a.jpg"))),
                result("b.jpg", Status::Skipped("corrupt".to_string())),
                result("c.jpg", Status::Failed("disk full".to_string())),
                result("d.jpg", Status::Success(PathBuf::from("Modified/d.jpg"))),
            ],
            aborted: None,
        };
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn invalid_ratio_aborts_before_loading_overlays() {
        let job = WatermarkJob {
            images: vec![PathBuf::from("whatever.jpg")],
            light_overlay: PathBuf::from("/nonexistent/light.png"),
            dark_overlay: PathBuf::from("/nonexistent/dark.png"),
            options: ProcessOptions {
                ratio: 2.0,
                ..ProcessOptions::default()
            },
        };
        let report = submit_job(&job);
        assert!(report.results.is_empty());
        assert!(report.aborted.unwrap().contains("ratio"));
    }

    #[test]
    fn missing_overlay_aborts_batch() {
        let job = WatermarkJob {
            images: vec![PathBuf::from("whatever.jpg")],
            light_overlay: PathBuf::from("/nonexistent/light.png"),
            dark_overlay: PathBuf::from("/nonexistent/dark.png"),
            options: ProcessOptions::default(),
        };
        let report = submit_job(&job);
        assert!(report.results.is_empty());
        assert!(report.aborted.unwrap().contains("light.png"));
    }
}
