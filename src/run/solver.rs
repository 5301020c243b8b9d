//! External solver collaborator
//!
//! The solver is opaque: it is pointed at a work directory and a project
//! file and is expected to leave one result file per stage behind.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

use crate::core::logger::Logger;

#[derive(Debug, Error)]
pub enum SolverError {
    #[error("Failed to start solver '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Solver '{program}' exited with {status}")]
    Failed {
        program: String,
        status: String,
        /// Tail of the solver's stderr
        stderr: String,
    },
}

impl SolverError {
    /// Extra context for the failure report
    pub fn detail(&self) -> Option<&str> {
        match self {
            SolverError::Failed { stderr, .. } if !stderr.is_empty() => Some(stderr),
            _ => None,
        }
    }
}

/// Runs a configured project in a work directory
pub trait Solver {
    fn run(
        &self,
        work_dir: &Path,
        project_file: &Path,
        output_files: &[PathBuf],
        logger: &dyn Logger,
    ) -> Result<(), SolverError>;
}

/// Solver command line; the project file name is appended as last argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalSolver {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Lines of stderr kept in a failure report
const STDERR_TAIL_LINES: usize = 20;

impl ExternalSolver {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

impl Solver for ExternalSolver {
    fn run(
        &self,
        work_dir: &Path,
        project_file: &Path,
        output_files: &[PathBuf],
        logger: &dyn Logger,
    ) -> Result<(), SolverError> {
        let project_arg = project_file
            .strip_prefix(work_dir)
            .unwrap_or(project_file)
            .to_path_buf();
        logger.info(&format!(
            "Running {} {} {} in {}",
            self.program,
            self.args.join(" "),
            project_arg.display(),
            work_dir.display()
        ));

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(&project_arg)
            .current_dir(work_dir)
            .output()
            .map_err(|source| SolverError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let lines: Vec<&str> = stderr.lines().collect();
            let tail = lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n");
            return Err(SolverError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: tail,
            });
        }

        for path in output_files.iter().filter(|p| !p.exists()) {
            logger.warn(&format!("Solver did not produce {}", path.display()));
        }
        Ok(())
    }
}
