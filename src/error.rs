
//! Typed failures for the simulation pipeline.
//!
//! Every stage fails with its own variant so the caller can tell build,
//! run, parse, and report failures apart without string matching. Hard
//! failures abort the pipeline; undefined metrics are not errors (they are
//! `None` fields inside `PerformanceMetrics`).

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Pipeline stage a failure belongs to. Drives the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Build,
    Run,
    Parse,
    Report,
}

impl Stage {
    /// Exit code for a failure in this stage. 0 is reserved for success.
    pub fn exit_code(self) -> i32 {
        match self {
            Stage::Build => 2,
            Stage::Run => 3,
            Stage::Parse => 4,
            Stage::Report => 5,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Build => "build",
            Stage::Run => "run",
            Stage::Parse => "parse",
            Stage::Report => "report",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A listed controller source does not exist. Checked before the
    /// toolchain is ever invoked.
    #[error("missing source file: {0}")]
    SourceMissing(PathBuf),

    /// The toolchain ran and exited non-zero. Diagnostics carry both
    /// captured output streams verbatim.
    #[error("toolchain exited with code {status}:\n{diagnostics}")]
    BuildFailed { status: i32, diagnostics: String },

    /// The artifact is absent at execution time (precondition, not inferred
    /// from a spawn failure).
    #[error("artifact not found: {0} (build stage must complete first)")]
    ArtifactMissing(PathBuf),

    /// The artifact ran and exited non-zero. The partial log is left on
    /// disk for postmortem inspection.
    #[error("simulation exited with code {status}:\n{stderr}")]
    ExecutionFailed { status: i32, stderr: String },

    #[error("log file not found: {0}")]
    LogNotFound(PathBuf),

    /// Empty file, bad field count, unparseable number, malformed header,
    /// or non-increasing step index.
    #[error("malformed log: {0}")]
    LogFormat(String),

    /// Defensive post-parse check failed: the table does not hold exactly
    /// four equal-length columns.
    #[error("log table shape invalid: {0}")]
    LogShape(String),

    /// Summary file or plot could not be written. Raised only after the
    /// numeric metrics have already been computed and printed.
    #[error("report output failed: {0}")]
    ReportFailed(String),

    #[error("{stage} stage I/O failure: {source}")]
    Io {
        stage: Stage,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Stage this failure belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::SourceMissing(_) | PipelineError::BuildFailed { .. } => Stage::Build,
            PipelineError::ArtifactMissing(_) | PipelineError::ExecutionFailed { .. } => Stage::Run,
            PipelineError::LogNotFound(_)
            | PipelineError::LogFormat(_)
            | PipelineError::LogShape(_) => Stage::Parse,
            PipelineError::ReportFailed(_) => Stage::Report,
            PipelineError::Io { stage, .. } => *stage,
        }
    }

    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        self.stage().exit_code()
    }

    pub(crate) fn io(stage: Stage, source: std::io::Error) -> Self {
        PipelineError::Io { stage, source }
    }
}
