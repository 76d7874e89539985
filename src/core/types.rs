//! Plain data exchanged with the embedding caller

use serde::{Deserialize, Serialize};

use super::verdict::{TestStatus, Verdict};

/// One (input, expected output) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    #[serde(alias = "expected_output")]
    pub output: String,
}

impl TestCase {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}

/// A submission to judge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
    pub language: String,
    #[serde(alias = "sourceCode", alias = "code")]
    pub source_code: String,
    #[serde(alias = "testCases")]
    pub test_cases: Vec<TestCase>,
    /// Per-test-case timeout in ms (engine default when absent)
    #[serde(default, alias = "timeoutMs", skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Use the timeout as given, without the language's time-limit scaling
    #[serde(default)]
    pub ignore_time_limit_bonus: bool,
}

impl RunRequest {
    pub fn new(
        language: impl Into<String>,
        source_code: impl Into<String>,
        test_cases: Vec<TestCase>,
    ) -> Self {
        Self {
            language: language.into(),
            source_code: source_code.into(),
            test_cases,
            timeout_ms: None,
            ignore_time_limit_bonus: false,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_ignore_time_limit_bonus(mut self, value: bool) -> Self {
        self.ignore_time_limit_bonus = value;
        self
    }
}

/// Why a program did not produce a comparable output.
/// Spawn failures (missing toolchain) and crashes of the submitted program
/// both render as Runtime Error but need different fixes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    Exited { code: i32 },
    Signaled { signal: String },
    SpawnFailed,
}

/// Result of a single test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// 1-based position of the test case in the request
    pub index: usize,
    pub status: TestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

impl TestResult {
    pub fn new(index: usize, status: TestStatus) -> Self {
        Self {
            index,
            status,
            expected: None,
            actual: None,
            elapsed_ms: None,
            failure: None,
        }
    }
}

/// Result of judging a submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub verdict: Verdict,
    pub results: Vec<TestResult>,
    /// Compiler diagnostics, present on Compilation Error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compile_output: Option<String>,
    /// Slowest test case, reported only for Accepted runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
}

impl RunResult {
    /// Fold ordered test results into a run result.
    /// The verdict is the status of the first non-passed result.
    pub fn from_results(results: Vec<TestResult>) -> Self {
        let verdict = results
            .iter()
            .find_map(|r| r.status.as_verdict())
            .unwrap_or(Verdict::Accepted);

        let execution_time_ms = if verdict.is_accepted() {
            results.iter().filter_map(|r| r.elapsed_ms).max()
        } else {
            None
        };

        Self {
            verdict,
            results,
            compile_output: None,
            execution_time_ms,
        }
    }

    pub fn compilation_error(diagnostics: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::CompilationError,
            results: vec![],
            compile_output: Some(diagnostics.into()),
            execution_time_ms: None,
        }
    }

    /// Number of passed test cases
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.status.is_passed()).count()
    }

    /// One-line summary, e.g. `Wrong Answer (1/3 passed)`
    pub fn summary(&self, total: usize) -> String {
        format!("{} ({}/{} passed)", self.verdict, self.passed(), total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(index: usize, status: TestStatus, elapsed: u64) -> TestResult {
        TestResult {
            elapsed_ms: Some(elapsed),
            ..TestResult::new(index, status)
        }
    }

    #[test]
    fn test_all_passed_is_accepted() {
        let run = RunResult::from_results(vec![
            result(1, TestStatus::Passed, 12),
            result(2, TestStatus::Passed, 40),
        ]);

        assert_eq!(run.verdict, Verdict::Accepted);
        assert_eq!(run.execution_time_ms, Some(40));
        assert_eq!(run.passed(), 2);
    }

    #[test]
    fn test_first_failure_sets_verdict() {
        let run = RunResult::from_results(vec![
            result(1, TestStatus::Passed, 5),
            result(2, TestStatus::TimeLimitExceeded, 2000),
        ]);

        assert_eq!(run.verdict, Verdict::TimeLimitExceeded);
        assert_eq!(run.execution_time_ms, None);
        assert_eq!(run.summary(5), "Time Limit Exceeded (1/5 passed)");
    }

    #[test]
    fn test_empty_results_are_accepted() {
        let run = RunResult::from_results(vec![]);
        assert_eq!(run.verdict, Verdict::Accepted);
        assert!(run.results.is_empty());
    }

    #[test]
    fn test_compilation_error_has_no_results() {
        let run = RunResult::compilation_error("main.cpp:1: error");
        assert_eq!(run.verdict, Verdict::CompilationError);
        assert!(run.results.is_empty());
        assert_eq!(run.compile_output.as_deref(), Some("main.cpp:1: error"));
    }

    #[test]
    fn test_request_accepts_camel_case() {
        let json = r#"{
            "language": "python",
            "sourceCode": "print(input())",
            "testCases": [{"input": "5\n", "output": "5"}],
            "timeoutMs": 1500
        }"#;
        let request: RunRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.language, "python");
        assert_eq!(request.test_cases.len(), 1);
        assert_eq!(request.timeout_ms, Some(1500));
        assert!(!request.ignore_time_limit_bonus);
    }

    #[test]
    fn test_failure_kind_serialization() {
        let failure = FailureKind::Exited { code: 3 };
        let json = serde_json::to_string(&failure).unwrap();
        assert_eq!(json, r#"{"kind":"exited","code":3}"#);
    }
}
