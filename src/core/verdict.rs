use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall outcome of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Accepted,
    #[serde(rename = "Wrong Answer")]
    WrongAnswer,
    #[serde(rename = "Runtime Error")]
    RuntimeError,
    #[serde(rename = "Time Limit Exceeded")]
    TimeLimitExceeded,
    #[serde(rename = "Compilation Error")]
    CompilationError,
}

impl Verdict {
    /// Machine-readable form (snake_case)
    pub fn code(&self) -> &'static str {
        match self {
            Verdict::Accepted => "accepted",
            Verdict::WrongAnswer => "wrong_answer",
            Verdict::RuntimeError => "runtime_error",
            Verdict::TimeLimitExceeded => "time_limit_exceeded",
            Verdict::CompilationError => "compilation_error",
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Accepted => "Accepted",
            Verdict::WrongAnswer => "Wrong Answer",
            Verdict::RuntimeError => "Runtime Error",
            Verdict::TimeLimitExceeded => "Time Limit Exceeded",
            Verdict::CompilationError => "Compilation Error",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of a single test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestStatus {
    Passed,
    #[serde(rename = "Wrong Answer")]
    WrongAnswer,
    #[serde(rename = "Runtime Error")]
    RuntimeError,
    #[serde(rename = "Time Limit Exceeded")]
    TimeLimitExceeded,
    #[serde(rename = "Compilation Error")]
    CompilationError,
}

impl TestStatus {
    pub fn is_passed(&self) -> bool {
        matches!(self, TestStatus::Passed)
    }

    /// Verdict a run takes when this status ends it. `None` for `Passed`.
    pub fn as_verdict(&self) -> Option<Verdict> {
        match self {
            TestStatus::Passed => None,
            TestStatus::WrongAnswer => Some(Verdict::WrongAnswer),
            TestStatus::RuntimeError => Some(Verdict::RuntimeError),
            TestStatus::TimeLimitExceeded => Some(Verdict::TimeLimitExceeded),
            TestStatus::CompilationError => Some(Verdict::CompilationError),
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_verdict() {
            Some(verdict) => fmt::Display::fmt(&verdict, f),
            None => write!(f, "Passed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_display() {
        assert_eq!(Verdict::Accepted.to_string(), "Accepted");
        assert_eq!(Verdict::WrongAnswer.to_string(), "Wrong Answer");
        assert_eq!(
            Verdict::TimeLimitExceeded.to_string(),
            "Time Limit Exceeded"
        );
        assert_eq!(Verdict::CompilationError.code(), "compilation_error");
    }

    #[test]
    fn test_status_maps_to_verdict() {
        assert_eq!(TestStatus::Passed.as_verdict(), None);
        assert_eq!(
            TestStatus::RuntimeError.as_verdict(),
            Some(Verdict::RuntimeError)
        );
        assert_eq!(TestStatus::Passed.to_string(), "Passed");
        assert_eq!(TestStatus::WrongAnswer.to_string(), "Wrong Answer");
    }

    #[test]
    fn test_serde_uses_display_names() {
        let json = serde_json::to_string(&Verdict::TimeLimitExceeded).unwrap();
        assert_eq!(json, "\"Time Limit Exceeded\"");

        let status: TestStatus = serde_json::from_str("\"Runtime Error\"").unwrap();
        assert_eq!(status, TestStatus::RuntimeError);
    }
}
