//! Engine-level errors
//!
//! Only failures that abort a whole run live here. Per-test-case failures
//! (timeouts, crashes, wrong output) become a `TestResult` instead.

use thiserror::Error;

use crate::runner::RunError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// The submitted source did not compile
    #[error("Compilation failed:\n{diagnostics}")]
    Compilation { diagnostics: String },

    /// A compiler or interpreter is not installed or not executable
    #[error("Toolchain `{program}` is not available (install it and make sure it is on PATH): {source}")]
    Toolchain {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A timed out process survived the kill signal; its resources may leak
    #[error("Failed to kill process {pid}: {reason}")]
    KillFailed { pid: u32, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Workspace I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<RunError> for EngineError {
    /// Used where a runner failure cannot be turned into a verdict
    fn from(err: RunError) -> Self {
        match err {
            RunError::Spawn { program, source } => EngineError::Toolchain { program, source },
            RunError::KillFailed { pid, reason } => EngineError::KillFailed { pid, reason },
            RunError::Io { source, .. } => EngineError::Io(source),
            other => EngineError::Io(std::io::Error::other(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_error_becomes_toolchain_error() {
        let err: EngineError = RunError::Spawn {
            program: "g++".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }
        .into();

        assert!(matches!(err, EngineError::Toolchain { ref program, .. } if program == "g++"));
        assert!(err.to_string().contains("install it"));
    }

    #[test]
    fn test_kill_failure_is_preserved() {
        let err: EngineError = RunError::KillFailed {
            pid: 42,
            reason: "EPERM".into(),
        }
        .into();

        assert!(matches!(err, EngineError::KillFailed { pid: 42, .. }));
    }
}
