//! Judger module for running submissions against test cases
//!
//! This module handles the core judging logic: preparing the submission once,
//! running it against each test case in order and folding the per-test
//! results into a single verdict.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::checker::{compare_output, normalize_output};
use crate::compiler::{self, Artifact};
use crate::config::EngineConfig;
use crate::core::utils::truncate_preview;
use crate::core::{FailureKind, RunRequest, RunResult, TestCase, TestResult, TestStatus};
use crate::error::EngineError;
use crate::languages::LanguageRegistry;
use crate::runner::{CommandSpec, ProcessRunner, RunError, RunLimits, Runner};
use crate::workspace::Workspace;

/// Time limit for `<tool> --version` probes
const TOOLCHAIN_CHECK_TIMEOUT_MS: u64 = 10_000;

/// Code execution and verdict engine
pub struct Engine {
    runner: Arc<dyn Runner>,
    languages: LanguageRegistry,
    config: EngineConfig,
}

impl Engine {
    /// Engine that runs programs directly on the host
    pub fn new(languages: LanguageRegistry, config: EngineConfig) -> Self {
        Self::with_runner(Arc::new(ProcessRunner::new()), languages, config)
    }

    pub fn with_runner(
        runner: Arc<dyn Runner>,
        languages: LanguageRegistry,
        config: EngineConfig,
    ) -> Self {
        Self {
            runner,
            languages,
            config,
        }
    }

    pub fn languages(&self) -> &LanguageRegistry {
        &self.languages
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Judge a submission.
    ///
    /// Compiles at most once, then evaluates test cases in order and stops at
    /// the first one that does not pass. A compilation failure is a normal
    /// result; only engine faults (unknown language, missing toolchain, a
    /// process that could not be killed, workspace I/O) are errors.
    pub async fn execute(&self, request: &RunRequest) -> Result<RunResult, EngineError> {
        let lang_config = self
            .languages
            .get(&request.language)
            .ok_or_else(|| EngineError::UnsupportedLanguage(request.language.clone()))?;

        let base_time_limit = request.timeout_ms.unwrap_or(self.config.default_timeout_ms);
        if base_time_limit == 0 {
            return Err(EngineError::Config(
                "timeout must be greater than zero".into(),
            ));
        }
        let time_limit_ms = if request.ignore_time_limit_bonus {
            base_time_limit
        } else {
            lang_config.calculate_time_limit(base_time_limit)
        };

        let total = request.test_cases.len();
        info!(
            "Received {} submission with {} test case(s), time limit {}ms",
            lang_config.name, total, time_limit_ms
        );

        let workspace = match &self.config.workspace_root {
            Some(root) => Workspace::acquire_in(root)?,
            None => Workspace::acquire()?,
        };

        let artifact = match compiler::prepare(
            self.runner.as_ref(),
            lang_config,
            &request.source_code,
            workspace,
            self.config.compile_timeout_ms,
        )
        .await
        {
            Ok(artifact) => artifact,
            Err(EngineError::Compilation { diagnostics }) => {
                let result = RunResult::compilation_error(truncate_preview(
                    &diagnostics,
                    self.config.output_preview_limit,
                ));
                info!(
                    "Job summary: language={}, {}",
                    lang_config.name,
                    result.summary(total)
                );
                return Ok(result);
            }
            Err(e) => return Err(e),
        };

        let mut results = Vec::with_capacity(total);
        for (i, test_case) in request.test_cases.iter().enumerate() {
            let result = self
                .evaluate(&artifact, test_case, i + 1, time_limit_ms)
                .await?;
            let passed = result.status.is_passed();
            results.push(result);

            if !passed {
                break;
            }
        }

        if let Err(e) = artifact.release() {
            debug!("Workspace release failed: {}", e);
        }

        let result = RunResult::from_results(results);
        info!(
            "Job summary: language={}, {}, max_time_ms={:?}",
            lang_config.name,
            result.summary(total),
            result.execution_time_ms
        );
        Ok(result)
    }

    /// Run a prepared program against one test case
    pub async fn evaluate(
        &self,
        artifact: &Artifact,
        test_case: &TestCase,
        index: usize,
        time_limit_ms: u64,
    ) -> Result<TestResult, EngineError> {
        let limit = self.config.output_preview_limit;

        let run_result = self
            .runner
            .run(
                artifact.invocation(),
                &RunLimits::new(time_limit_ms),
                Some(&test_case.input),
            )
            .await;

        let result = match run_result {
            Ok(outcome) => {
                if compare_output(&outcome.stdout, &test_case.output) {
                    TestResult {
                        elapsed_ms: Some(outcome.elapsed_ms),
                        ..TestResult::new(index, TestStatus::Passed)
                    }
                } else {
                    TestResult {
                        expected: Some(truncate_preview(&normalize_output(&test_case.output), limit)),
                        actual: Some(truncate_preview(&normalize_output(&outcome.stdout), limit)),
                        elapsed_ms: Some(outcome.elapsed_ms),
                        ..TestResult::new(index, TestStatus::WrongAnswer)
                    }
                }
            }
            Err(RunError::Timeout { elapsed_ms, .. }) => TestResult {
                elapsed_ms: Some(elapsed_ms),
                ..TestResult::new(index, TestStatus::TimeLimitExceeded)
            },
            Err(RunError::RuntimeError {
                failure,
                message,
                elapsed_ms,
                ..
            }) => TestResult {
                actual: Some(truncate_preview(&message, limit)),
                elapsed_ms: Some(elapsed_ms),
                failure: Some(failure),
                ..TestResult::new(index, TestStatus::RuntimeError)
            },
            Err(RunError::Spawn { program, source }) => {
                warn!(
                    "Failed to start {} program `{}`: {}",
                    artifact.language(),
                    program,
                    source
                );
                TestResult {
                    actual: Some(format!("Failed to start `{}`: {}", program, source)),
                    failure: Some(FailureKind::SpawnFailed),
                    ..TestResult::new(index, TestStatus::RuntimeError)
                }
            }
            Err(RunError::Io { program, source }) => {
                warn!("I/O error while running `{}`: {}", program, source);
                TestResult {
                    actual: Some(truncate_preview(&source.to_string(), limit)),
                    ..TestResult::new(index, TestStatus::RuntimeError)
                }
            }
            Err(RunError::KillFailed { pid, reason }) => {
                return Err(EngineError::KillFailed { pid, reason });
            }
        };

        debug!(
            "Test case {}: {} ({:?}ms)",
            result.index, result.status, result.elapsed_ms
        );
        Ok(result)
    }

    /// Verify that every executable a language needs can be started.
    /// Returns the programs that were checked.
    pub async fn check_toolchain(&self, language: &str) -> Result<Vec<String>, EngineError> {
        let lang_config = self
            .languages
            .get(language)
            .ok_or_else(|| EngineError::UnsupportedLanguage(language.to_string()))?;

        let programs = lang_config.toolchain_programs();
        for program in &programs {
            let probe = CommandSpec::new(program.as_str()).with_args(["--version"]);
            match self
                .runner
                .run(&probe, &RunLimits::new(TOOLCHAIN_CHECK_TIMEOUT_MS), None)
                .await
            {
                // the tool exists even if it dislikes `--version`
                Ok(_) | Err(RunError::RuntimeError { .. }) | Err(RunError::Timeout { .. }) => {
                    debug!("Found toolchain program {}", program);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(programs)
    }
}
