//! Core data model shared by every stage of a run

pub mod types;
pub mod utils;
pub mod verdict;

pub use types::{FailureKind, RunRequest, RunResult, TestCase, TestResult};
pub use verdict::{TestStatus, Verdict};
