
//! Builder stage: compiles the controller firmware into a host executable.
//!
//! The toolchain is an opaque collaborator — one synchronous invocation with
//! a fixed flag set, both output streams captured. A non-zero exit is fatal
//! for the run; no partial artifact is handed downstream.

use std::ffi::OsString;
use std::fs::create_dir_all;
use std::path::PathBuf;
use std::process::Command;

use log::info;

use crate::error::{PipelineError, Stage};

/// One compilation request: ordered sources, ordered include dirs, target
/// artifact, diagnostic flags. Argument order is deterministic so repeated
/// builds of the same spec produce the same command line (and link order).
#[derive(Debug, Clone)]
pub struct BuildSpec {
    /// Compiler program, `gcc` by default.
    pub compiler: String,
    /// Source files, passed to the compiler in this order.
    pub sources: Vec<PathBuf>,
    /// Header search paths, passed as `-I<dir>` in this order.
    pub include_dirs: Vec<PathBuf>,
    /// Output executable path. Overwritten if it already exists.
    pub artifact: PathBuf,
    /// `-Wall -Wextra`.
    pub all_warnings: bool,
    /// `-Werror` — warnings in the firmware fail the build.
    pub warnings_as_errors: bool,
}

impl BuildSpec {
    /// Full argument list in invocation order: flags, includes, sources,
    /// `-o <artifact>`.
    pub fn args(&self) -> Vec<OsString> {
        let mut args = Vec::new();
        if self.all_warnings {
            args.push(OsString::from("-Wall"));
            args.push(OsString::from("-Wextra"));
        }
        if self.warnings_as_errors {
            args.push(OsString::from("-Werror"));
        }
        for dir in &self.include_dirs {
            let mut flag = OsString::from("-I");
            flag.push(dir.as_os_str());
            args.push(flag);
        }
        for src in &self.sources {
            args.push(src.as_os_str().to_os_string());
        }
        args.push(OsString::from("-o"));
        args.push(self.artifact.as_os_str().to_os_string());
        args
    }
}

/// Compiles `spec` into its artifact, or fails with the toolchain's
/// diagnostics attached.
///
/// Source existence is a precondition checked here, before any process is
/// spawned — a missing file is a harness configuration error, not a
/// compiler error. The artifact's parent directory is created if absent.
pub fn build_artifact(spec: &BuildSpec) -> Result<(), PipelineError> {
    for src in &spec.sources {
        if !src.exists() {
            return Err(PipelineError::SourceMissing(src.clone()));
        }
    }

    if let Some(parent) = spec.artifact.parent() {
        create_dir_all(parent).map_err(|e| PipelineError::io(Stage::Build, e))?;
    }

    let args = spec.args();
    info!(
        "building firmware: {} {}",
        spec.compiler,
        args.iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    );

    let output = Command::new(&spec.compiler)
        .args(&args)
        .output()
        .map_err(|e| PipelineError::io(Stage::Build, e))?;

    if !output.status.success() {
        let mut diagnostics = String::from_utf8_lossy(&output.stdout).into_owned();
        diagnostics.push_str(&String::from_utf8_lossy(&output.stderr));
        return Err(PipelineError::BuildFailed {
            status: output.status.code().unwrap_or(-1),
            diagnostics,
        });
    }

    info!("build succeeded: {}", spec.artifact.display());
    Ok(())
}
