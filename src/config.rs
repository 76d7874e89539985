//! Engine configuration
//!
//! Defaults can be overridden from environment variables (a `.env` file is
//! honoured by the binary).

use std::path::PathBuf;

use anyhow::Context;

use crate::error::EngineError;

pub const ENV_TIMEOUT_MS: &str = "VERDICT_TIMEOUT_MS";
pub const ENV_COMPILE_TIMEOUT_MS: &str = "VERDICT_COMPILE_TIMEOUT_MS";
pub const ENV_WORKSPACE_ROOT: &str = "VERDICT_WORKSPACE_ROOT";
pub const ENV_OUTPUT_LIMIT: &str = "VERDICT_OUTPUT_LIMIT";

/// Engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Per-test-case timeout when the request does not set one (default: 2000ms)
    pub default_timeout_ms: u64,
    /// Compile time limit in milliseconds (default: 30000ms = 30s)
    pub compile_timeout_ms: u64,
    /// Parent directory for workspaces (default: system temp dir)
    pub workspace_root: Option<PathBuf>,
    /// Maximum characters of program output/diagnostics kept on results
    pub output_preview_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 2000,
            compile_timeout_ms: 30_000,
            workspace_root: None,
            output_preview_limit: 4096,
        }
    }
}

impl EngineConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup, falling back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        let parse_u64 = |key: &str| -> anyhow::Result<Option<u64>> {
            lookup(key)
                .map(|raw| {
                    raw.trim()
                        .parse::<u64>()
                        .with_context(|| format!("Invalid {}: {}", key, raw))
                })
                .transpose()
        };

        if let Some(value) = parse_u64(ENV_TIMEOUT_MS)? {
            config.default_timeout_ms = value;
        }
        if let Some(value) = parse_u64(ENV_COMPILE_TIMEOUT_MS)? {
            config.compile_timeout_ms = value;
        }
        if let Some(value) = parse_u64(ENV_OUTPUT_LIMIT)? {
            config.output_preview_limit = value as usize;
        }
        if let Some(root) = lookup(ENV_WORKSPACE_ROOT).filter(|r| !r.trim().is_empty()) {
            config.workspace_root = Some(PathBuf::from(root));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.default_timeout_ms == 0 {
            return Err(EngineError::Config(
                "default timeout must be greater than zero".into(),
            ));
        }
        if self.compile_timeout_ms == 0 {
            return Err(EngineError::Config(
                "compile timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.default_timeout_ms, 2000);
        assert_eq!(config.compile_timeout_ms, 30_000);
    }

    #[test]
    fn test_overrides() {
        let config = EngineConfig::from_lookup(lookup(&[
            (ENV_TIMEOUT_MS, "1500"),
            (ENV_COMPILE_TIMEOUT_MS, " 60000 "),
            (ENV_WORKSPACE_ROOT, "/var/tmp/runs"),
            (ENV_OUTPUT_LIMIT, "128"),
        ]))
        .unwrap();

        assert_eq!(config.default_timeout_ms, 1500);
        assert_eq!(config.compile_timeout_ms, 60_000);
        assert_eq!(config.workspace_root, Some(PathBuf::from("/var/tmp/runs")));
        assert_eq!(config.output_preview_limit, 128);
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let err = EngineConfig::from_lookup(lookup(&[(ENV_TIMEOUT_MS, "two seconds")])).unwrap_err();
        assert!(err.to_string().contains(ENV_TIMEOUT_MS));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        assert!(EngineConfig::from_lookup(lookup(&[(ENV_TIMEOUT_MS, "0")])).is_err());
    }
}
