
//! # PID Controller Validation Harness
//!
//! Desktop validation of the embedded motor speed controller before
//! hardware deployment: compiles the firmware for the host, runs it once,
//! captures the control-loop log, and derives step-response metrics.
//!
//! ## Pipeline
//! - **Builder:** firmware sources → host executable (strict warnings,
//!   warnings-as-errors).
//! - **Runner:** executes the artifact once, stdout → durable CSV log,
//!   stderr captured separately.
//! - **LogLoader:** validates the log into typed column series.
//! - **Analyzer/Reporter:** step-response metrics + stdout/CSV/SVG report.
//!
//! Strictly sequential: each stage fully completes (or fails) before the
//! next begins, and any hard failure aborts the run with a stage-distinct
//! exit code. The only hand-off artifacts are the log file and the
//! in-memory series; there is no shared state between stages.

pub mod analysis;
pub mod build;
pub mod config;
pub mod error;
pub mod loader;
pub mod runner;

use std::path::PathBuf;

use log::info;

use crate::analysis::metrics::PerformanceMetrics;
use crate::config::HarnessConfig;
use crate::error::PipelineError;

/// Artifacts produced by one successful pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub artifact: PathBuf,
    pub log_path: PathBuf,
    pub summary_path: PathBuf,
    /// Absent when plotting was disabled.
    pub plot_path: Option<PathBuf>,
    pub metrics: PerformanceMetrics,
}

/// Runs the full pipeline: build → run → load → analyze → report.
///
/// Short-circuits on the first hard failure; no downstream stage is
/// attempted with missing upstream data. Metrics are printed before any
/// report file is written, so a report failure never hides the numbers.
pub fn run_pipeline(cfg: &HarnessConfig) -> Result<PipelineOutcome, PipelineError> {
    build::build_artifact(&cfg.build)?;
    runner::run_artifact(&cfg.build.artifact, &cfg.log_path)?;

    let series = loader::load_log(&cfg.log_path)?;
    info!(
        "loaded {} samples (header {})",
        series.len(),
        if series.header_skipped() {
            "skipped"
        } else {
            "absent"
        }
    );

    let metrics = analysis::metrics::compute_metrics(&series, &cfg.analysis);
    analysis::report::print_summary(&metrics, &series, &cfg.analysis);
    analysis::report::write_summary_csv(&cfg.summary_path, &metrics, &cfg.analysis)?;

    let plot_path = if cfg.no_plot {
        info!("plot rendering disabled");
        None
    } else {
        analysis::report::render_step_response(&cfg.plot_path, &series, &metrics, &cfg.analysis)?;
        Some(cfg.plot_path.clone())
    };

    Ok(PipelineOutcome {
        artifact: cfg.build.artifact.clone(),
        log_path: cfg.log_path.clone(),
        summary_path: cfg.summary_path.clone(),
        plot_path,
        metrics,
    })
}
