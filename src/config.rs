
//! Harness configuration shared between the runner and the analyzer.
//!
//! The sample period, actuation limits, and saturation threshold used to be
//! implicit constants shared by convention with the firmware; they are an
//! explicit structure here so the analysis assumptions are visible at every
//! call site. The period still cannot be verified against the firmware's
//! actual loop rate (the log carries no time field) — a mismatch silently
//! skews the time axis.

use std::path::PathBuf;

use crate::build::BuildSpec;

/// Seconds per control-loop step (10 ms loop, 100 Hz). Must match the
/// firmware's configured loop period.
pub const DEFAULT_SAMPLE_PERIOD_S: f64 = 0.01;

/// Assumed symmetric actuation range of the controller output (duty cycle).
pub const DEFAULT_ACTUATION_LIMIT: f64 = 1.0;

/// |output| at or above this counts as saturated given the ±1.0 range.
pub const DEFAULT_SATURATION_THRESHOLD: f64 = 0.99;

/// Fraction of the final value the response must reach for rise time.
pub const RISE_FRACTION: f64 = 0.90;

/// Half-width of the settling band as a fraction of the final setpoint.
pub const SETTLING_BAND_FRACTION: f64 = 0.05;

/// Analysis-side constants: time axis scaling and metric thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub sample_period_s: f64,
    pub actuation_limit: f64,
    pub saturation_threshold: f64,
    pub rise_fraction: f64,
    pub settling_band_fraction: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            sample_period_s: DEFAULT_SAMPLE_PERIOD_S,
            actuation_limit: DEFAULT_ACTUATION_LIMIT,
            saturation_threshold: DEFAULT_SATURATION_THRESHOLD,
            rise_fraction: RISE_FRACTION,
            settling_band_fraction: SETTLING_BAND_FRACTION,
        }
    }
}

/// Everything one pipeline run needs: what to build, where the log and
/// report artifacts land, and the analysis constants.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub build: BuildSpec,
    pub log_path: PathBuf,
    pub plot_path: PathBuf,
    pub summary_path: PathBuf,
    /// Skip plot rendering (headless/CI runs keep the numeric outputs).
    pub no_plot: bool,
    pub analysis: AnalysisConfig,
}
