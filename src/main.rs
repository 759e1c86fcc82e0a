
//! Validation harness entry point.
//!
//! Single-shot batch tool: compile the firmware for the host, run the
//! simulation once, analyze the captured log, write the report artifacts.
//! Exit codes: 0 success, 2 build, 3 run, 4 parse, 5 report.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::error;

use pid_sim::build::BuildSpec;
use pid_sim::config::{
    AnalysisConfig, DEFAULT_ACTUATION_LIMIT, DEFAULT_SAMPLE_PERIOD_S, DEFAULT_SATURATION_THRESHOLD,
    HarnessConfig, RISE_FRACTION, SETTLING_BAND_FRACTION,
};
use pid_sim::run_pipeline;

/// Platform-appropriate executable name at the build output location.
const ARTIFACT_NAME: &str = if cfg!(windows) { "pid_demo.exe" } else { "pid_demo" };

#[derive(Parser, Debug)]
#[command(
    name = "pid_sim",
    version,
    about = "Desktop validation harness for the PID motor speed controller"
)]
struct Cli {
    /// Firmware source files, compiled in the given order.
    #[arg(long = "source", value_name = "FILE", default_values_os_t = vec![
        PathBuf::from("firmware/src/main.c"),
        PathBuf::from("firmware/src/pid.c"),
        PathBuf::from("firmware/src/motor.c"),
    ])]
    sources: Vec<PathBuf>,

    /// Header search directory (repeatable).
    #[arg(long = "include", value_name = "DIR", default_values_os_t = vec![
        PathBuf::from("firmware/include"),
    ])]
    include_dirs: Vec<PathBuf>,

    /// Directory for the compiled simulation executable.
    #[arg(long, default_value = "build")]
    build_dir: PathBuf,

    /// Compiler program.
    #[arg(long, default_value = "gcc")]
    cc: String,

    /// Captured simulation log.
    #[arg(long, default_value = "sim/log.csv")]
    log: PathBuf,

    /// Rendered step-response figure.
    #[arg(long, default_value = "step_response.svg")]
    plot: PathBuf,

    /// Machine-readable metrics summary.
    #[arg(long, default_value = "metrics_summary.csv")]
    summary: PathBuf,

    /// Seconds per control-loop step. Must match the firmware's loop
    /// period; a mismatch silently skews the time axis.
    #[arg(long, default_value_t = DEFAULT_SAMPLE_PERIOD_S)]
    sample_period: f64,

    /// Assumed symmetric actuation range of the control output.
    #[arg(long, default_value_t = DEFAULT_ACTUATION_LIMIT)]
    actuation_limit: f64,

    /// |output| at or above this counts as saturated.
    #[arg(long, default_value_t = DEFAULT_SATURATION_THRESHOLD)]
    saturation_threshold: f64,

    /// Skip plot rendering (headless/CI runs).
    #[arg(long)]
    no_plot: bool,
}

impl Cli {
    fn into_config(self) -> HarnessConfig {
        HarnessConfig {
            build: BuildSpec {
                compiler: self.cc,
                sources: self.sources,
                include_dirs: self.include_dirs,
                artifact: self.build_dir.join(ARTIFACT_NAME),
                all_warnings: true,
                warnings_as_errors: true,
            },
            log_path: self.log,
            plot_path: self.plot,
            summary_path: self.summary,
            no_plot: self.no_plot,
            analysis: AnalysisConfig {
                sample_period_s: self.sample_period,
                actuation_limit: self.actuation_limit,
                saturation_threshold: self.saturation_threshold,
                rise_fraction: RISE_FRACTION,
                settling_band_fraction: SETTLING_BAND_FRACTION,
            },
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cfg = Cli::parse().into_config();

    println!("{}", "=".repeat(60));
    println!(" PID CONTROLLER SIMULATION HARNESS");
    println!("{}", "=".repeat(60));

    match run_pipeline(&cfg) {
        Ok(outcome) => {
            println!("Simulation complete. Output files:");
            println!("  - {}", outcome.log_path.display());
            println!("  - {}", outcome.summary_path.display());
            if let Some(plot) = &outcome.plot_path {
                println!("  - {}", plot.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{} stage failed: {}", e.stage(), e);
            eprintln!("[FAIL] {} stage: {}", e.stage(), e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}
