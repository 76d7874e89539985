//! Compiler module - Source code preparation
//!
//! This module turns submitted source into something runnable:
//! - Writes the source file into a fresh workspace
//! - Compiles it once (compiled languages only)
//! - Hands back an `Artifact` that owns the workspace it lives in
//!
//! Compiler diagnostics are returned as `EngineError::Compilation`; a missing
//! compiler is a toolchain problem, not a compilation error.

use std::path::Path;
use tracing::{debug, info};

use crate::core::FailureKind;
use crate::error::EngineError;
use crate::languages::LanguageConfig;
use crate::runner::{CommandSpec, RunError, RunLimits, Runner};
use crate::workspace::Workspace;

/// Result of a compilation attempt
#[derive(Debug)]
pub struct CompileResult {
    pub success: bool,
    pub message: Option<String>,
}

impl CompileResult {
    fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            success: false,
            message: Some(message),
        }
    }
}

/// Run a compile command with a time limit
pub async fn compile(
    runner: &dyn Runner,
    compile_cmd: &CommandSpec,
    time_limit_ms: u64,
) -> Result<CompileResult, EngineError> {
    if compile_cmd.program.is_empty() {
        return Ok(CompileResult::ok());
    }

    debug!("Compiling with {}", compile_cmd.display());

    let result = runner
        .run(compile_cmd, &RunLimits::new(time_limit_ms), None)
        .await;

    match result {
        Ok(_) => Ok(CompileResult::ok()),
        Err(RunError::RuntimeError {
            failure,
            stdout,
            stderr,
            ..
        }) => {
            let error_msg = if !stderr.trim().is_empty() {
                stderr
            } else if !stdout.trim().is_empty() {
                stdout
            } else {
                match failure {
                    FailureKind::Exited { code } => {
                        format!("Compilation failed with exit code {}", code)
                    }
                    FailureKind::Signaled { .. } => "Compiler crashed".to_string(),
                    FailureKind::SpawnFailed => "Compilation failed".to_string(),
                }
            };
            Ok(CompileResult::failed(error_msg))
        }
        Err(RunError::Timeout { .. }) => {
            Ok(CompileResult::failed("Compilation timed out".to_string()))
        }
        Err(other) => Err(other.into()),
    }
}

/// Compile user-submitted code inside `source_dir`
pub async fn compile_user_code(
    runner: &dyn Runner,
    source_dir: &Path,
    lang_config: &LanguageConfig,
    time_limit_ms: u64,
) -> Result<CompileResult, EngineError> {
    let compile_cmd = match lang_config.compile_command_in(source_dir) {
        Some(cmd) => cmd,
        None => {
            // Interpreted language, no compilation needed
            return Ok(CompileResult::ok());
        }
    };

    compile(runner, &compile_cmd, time_limit_ms).await
}

/// A prepared program: the workspace holding it and how to invoke it.
///
/// The artifact owns its workspace, so the files it points at exist for as
/// long as the artifact does and are removed when it is dropped.
#[derive(Debug)]
pub struct Artifact {
    workspace: Workspace,
    language: String,
    invocation: CommandSpec,
}

impl Artifact {
    pub fn invocation(&self) -> &CommandSpec {
        &self.invocation
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Remove the workspace now and report whether that worked
    pub fn release(self) -> std::io::Result<()> {
        self.workspace.close()
    }
}

/// Write `source` into `workspace` and compile it if the language needs it.
///
/// On failure the workspace is dropped, which removes it.
pub async fn prepare(
    runner: &dyn Runner,
    lang_config: &LanguageConfig,
    source: &str,
    workspace: Workspace,
    compile_time_limit_ms: u64,
) -> Result<Artifact, EngineError> {
    workspace
        .write_file(&lang_config.source_file, source)
        .await?;

    if lang_config.needs_compilation() {
        let result =
            compile_user_code(runner, workspace.path(), lang_config, compile_time_limit_ms)
                .await?;

        if !result.success {
            info!("Compilation failed for {}", lang_config.name);
            return Err(EngineError::Compilation {
                diagnostics: result.message.unwrap_or_default(),
            });
        }
        debug!("Compiled {} in {:?}", lang_config.name, workspace.path());
    }

    let invocation = lang_config.run_command_in(workspace.path());

    Ok(Artifact {
        workspace,
        language: lang_config.name.clone(),
        invocation,
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::languages::LanguageRegistry;
    use crate::runner::ProcessRunner;

    const SHELL_LANGUAGES: &str = r#"
[shell]
source_file = "solution.sh"
run_command = "sh {dir}/solution.sh"

[checked-shell]
source_file = "solution.sh"
compile_command = "sh -n {dir}/solution.sh"
run_command = "sh {dir}/solution.sh"

[missing]
source_file = "main.x"
compile_command = "definitely-not-a-compiler-7f3a {dir}/main.x"
run_command = "{dir}/main"
"#;

    fn registry() -> LanguageRegistry {
        LanguageRegistry::from_toml_str(SHELL_LANGUAGES).unwrap()
    }

    #[tokio::test]
    async fn test_prepare_interpreted() {
        let registry = registry();
        let lang = registry.get("shell").unwrap();
        let workspace = Workspace::acquire().unwrap();

        let artifact = prepare(&ProcessRunner::new(), lang, "echo hi", workspace, 5000)
            .await
            .unwrap();

        assert!(artifact.workspace().path().join("solution.sh").exists());
        assert_eq!(artifact.invocation().program, "sh");
        assert_eq!(artifact.language(), "shell");
    }

    #[tokio::test]
    async fn test_compile_error_carries_diagnostics_and_removes_workspace() {
        let registry = registry();
        let lang = registry.get("checked-shell").unwrap();
        let workspace = Workspace::acquire().unwrap();
        let path = workspace.path().to_path_buf();

        let err = prepare(&ProcessRunner::new(), lang, "if then fi (", workspace, 5000)
            .await
            .unwrap_err();

        match err {
            EngineError::Compilation { diagnostics } => assert!(!diagnostics.is_empty()),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_missing_compiler_is_toolchain_error() {
        let registry = registry();
        let lang = registry.get("missing").unwrap();
        let workspace = Workspace::acquire().unwrap();

        let err = prepare(&ProcessRunner::new(), lang, "", workspace, 5000)
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Toolchain { .. }));
    }

    #[tokio::test]
    async fn test_compile_timeout_is_reported() {
        let cmd = CommandSpec::new("sleep").with_args(["5"]);
        let result = compile(&ProcessRunner::new(), &cmd, 100).await.unwrap();

        assert!(!result.success);
        assert_eq!(result.message.as_deref(), Some("Compilation timed out"));
    }

    #[tokio::test]
    async fn test_silent_compiler_failure_reports_exit_code() {
        let cmd = CommandSpec::new("sh").with_args(["-c", "exit 4"]);
        let result = compile(&ProcessRunner::new(), &cmd, 2000).await.unwrap();

        assert_eq!(
            result.message.as_deref(),
            Some("Compilation failed with exit code 4")
        );
    }

    #[tokio::test]
    async fn test_release_removes_workspace() {
        let registry = registry();
        let lang = registry.get("shell").unwrap();
        let artifact = prepare(
            &ProcessRunner::new(),
            lang,
            "echo hi",
            Workspace::acquire().unwrap(),
            5000,
        )
        .await
        .unwrap();
        let path = artifact.workspace().path().to_path_buf();

        artifact.release().unwrap();

        assert!(!path.exists());
    }
}
