//! Multi-language code execution and verdict engine
//!
//! Compiles a submission once, runs it against ordered test cases with a
//! per-test timeout and reduces the outcomes to a contest-style verdict.

pub mod checker;
pub mod compiler;
pub mod config;
pub mod core;
pub mod error;
pub mod judger;
pub mod languages;
pub mod runner;
pub mod workspace;

pub use crate::config::EngineConfig;
pub use crate::core::{FailureKind, RunRequest, RunResult, TestCase, TestResult, TestStatus, Verdict};
pub use crate::error::EngineError;
pub use crate::judger::Engine;
pub use crate::languages::{LanguageConfig, LanguageRegistry};
pub use crate::runner::{ProcessRunner, Runner};
