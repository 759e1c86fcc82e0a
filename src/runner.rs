
//! Runner stage: executes the built artifact once and captures its output.
//!
//! stdout streams verbatim into the log file; stderr is captured separately
//! for failure reporting and never mixed into the log. The log file handle
//! is scoped to the child's lifetime so the loader always opens a fully
//! released file.

use std::fs::{File, create_dir_all};
use std::path::Path;
use std::process::{Command, Stdio};

use log::{debug, info};

use crate::error::{PipelineError, Stage};

/// Outcome of one artifact execution. Immutable after creation.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Exit code reported by the artifact (0 on the success path).
    pub exit_code: i32,
    /// Captured diagnostic stream, kept out of the log file.
    pub stderr: String,
}

/// Runs `artifact` with no arguments, overwriting `log_path` with its
/// stdout.
///
/// The artifact must already exist — that is checked up front rather than
/// inferred from a spawn failure. On a non-zero exit the partially written
/// log is left in place for postmortem inspection. Execution is synchronous
/// and unbounded; a hung artifact hangs the pipeline.
pub fn run_artifact(artifact: &Path, log_path: &Path) -> Result<ExecutionResult, PipelineError> {
    if !artifact.exists() {
        return Err(PipelineError::ArtifactMissing(artifact.to_path_buf()));
    }

    if let Some(parent) = log_path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent).map_err(|e| PipelineError::io(Stage::Run, e))?;
        }
    }

    info!(
        "running simulation: {} -> {}",
        artifact.display(),
        log_path.display()
    );

    // The handle moves into the child's stdout and is closed by the time
    // output() returns, releasing the log for the loader.
    let output = {
        let log_file = File::create(log_path).map_err(|e| PipelineError::io(Stage::Run, e))?;
        Command::new(artifact)
            .stdout(Stdio::from(log_file))
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| PipelineError::io(Stage::Run, e))?
    };

    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        return Err(PipelineError::ExecutionFailed {
            status: output.status.code().unwrap_or(-1),
            stderr,
        });
    }

    if !stderr.is_empty() {
        debug!("simulation stderr: {}", stderr.trim_end());
    }

    info!("simulation complete: {}", log_path.display());
    Ok(ExecutionResult {
        exit_code: 0,
        stderr,
    })
}
