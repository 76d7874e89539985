//! Runner module - Execution abstraction layer
//!
//! This module provides a unified interface for running one external program:
//! - `ProcessRunner`: spawns the program directly (no shell), feeds stdin,
//!   drains stdout/stderr and enforces a wall-clock timeout
//!
//! The runner module does NOT:
//! - Compare outputs or determine verdicts
//! - Know about languages or compilation
//! - Own the working directory it runs in

pub mod process;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::FailureKind;

/// Command specification for execution
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSpec {
    /// Program path or name
    pub program: String,
    /// Arguments to the program
    pub args: Vec<String>,
    /// Working directory
    pub work_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            work_dir: None,
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(|a| a.into()).collect();
        self
    }

    pub fn with_work_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.work_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Create from a command vector (first element is program, rest are args)
    pub fn from_vec(cmd: &[String]) -> Self {
        let mut iter = cmd.iter();
        let program = iter.next().cloned().unwrap_or_default();
        let args: Vec<String> = iter.cloned().collect();
        Self {
            program,
            args,
            work_dir: None,
        }
    }

    /// Convert to a vector of strings (program + args)
    pub fn to_vec(&self) -> Vec<String> {
        let mut v = vec![self.program.clone()];
        v.extend(self.args.clone());
        v
    }

    /// Space-joined form, for logs only
    pub fn display(&self) -> String {
        self.to_vec().join(" ")
    }
}

/// Limits for one execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLimits {
    /// Wall-clock time limit in milliseconds
    pub time_ms: u64,
}

impl RunLimits {
    pub fn new(time_ms: u64) -> Self {
        Self { time_ms }
    }
}

/// Outcome of a program that exited with code 0
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    /// Wall-clock time from spawn to exit
    pub elapsed_ms: u64,
}

/// Ways a single execution can fail
#[derive(Debug, Error)]
pub enum RunError {
    /// The program was still running when the time limit expired and was killed
    #[error("Time limit of {limit_ms}ms exceeded")]
    Timeout { limit_ms: u64, elapsed_ms: u64 },

    /// The program exited with a non-zero code or was killed by a signal
    #[error("{message}")]
    RuntimeError {
        failure: FailureKind,
        /// stderr, or a generic description when stderr is empty
        message: String,
        stdout: String,
        stderr: String,
        elapsed_ms: u64,
    },

    /// The program could not be started (not installed, not executable, ...)
    #[error("Failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A timed out program could not be terminated
    #[error("Failed to kill process {pid}: {reason}")]
    KillFailed { pid: u32, reason: String },

    #[error("I/O error while running `{program}`: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Runner trait for executing programs
#[async_trait]
pub trait Runner: Send + Sync {
    /// Run a command with the given limits and optional stdin
    async fn run(
        &self,
        cmd: &CommandSpec,
        limits: &RunLimits,
        stdin: Option<&str>,
    ) -> Result<RunOutcome, RunError>;
}

// Re-exports
pub use process::ProcessRunner;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_spec_from_vec() {
        let cmd = CommandSpec::from_vec(&["java".into(), "-cp".into(), "/tmp/x".into(), "Main".into()]);
        assert_eq!(cmd.program, "java");
        assert_eq!(cmd.args, vec!["-cp", "/tmp/x", "Main"]);
        assert_eq!(cmd.display(), "java -cp /tmp/x Main");
    }

    #[test]
    fn test_command_spec_from_empty_vec() {
        let cmd = CommandSpec::from_vec(&[]);
        assert!(cmd.program.is_empty());
        assert!(cmd.args.is_empty());
    }

    #[test]
    fn test_runtime_error_displays_message() {
        let err = RunError::RuntimeError {
            failure: FailureKind::Exited { code: 1 },
            message: "Traceback: boom".into(),
            stdout: String::new(),
            stderr: "Traceback: boom".into(),
            elapsed_ms: 3,
        };
        assert_eq!(err.to_string(), "Traceback: boom");
    }
}
