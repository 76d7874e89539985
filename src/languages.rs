//! Language configuration for compilation and execution
//!
//! Every supported language is one row of a TOML table. Adding a language
//! means adding a row; nothing else in the crate branches on language names.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::runner::CommandSpec;

/// Placeholder for the workspace directory inside command templates
pub const DIR_PLACEHOLDER: &str = "{dir}";

/// Configuration for a supported programming language
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageConfig {
    /// Canonical language name (e.g., "cpp")
    pub name: String,
    /// Name of the source file (e.g., "solution.cpp")
    pub source_file: String,
    /// Compile command template (None if not needed)
    pub compile_command: Option<Vec<String>>,
    /// Run command template
    pub run_command: Vec<String>,
    /// Time limit multiplier and bonus: (multiplier, bonus_seconds)
    /// actual_time = base_time * multiplier + bonus
    pub time_limit: Option<(u32, u32)>,
    /// File extensions that identify this language (without the dot)
    pub extensions: Vec<String>,
}

impl LanguageConfig {
    /// Calculate actual time limit based on base time limit
    /// base_time_ms: base time limit in milliseconds (from the request)
    /// Returns: adjusted time limit in milliseconds
    pub fn calculate_time_limit(&self, base_time_ms: u64) -> u64 {
        match self.time_limit {
            Some((multiplier, bonus_seconds)) => {
                base_time_ms
                    .saturating_mul(u64::from(multiplier))
                    .saturating_add(u64::from(bonus_seconds) * 1000)
            }
            None => base_time_ms,
        }
    }

    pub fn needs_compilation(&self) -> bool {
        self.compile_command.is_some()
    }

    /// Compile command with `{dir}` expanded, running inside `dir`
    pub fn compile_command_in(&self, dir: &Path) -> Option<CommandSpec> {
        self.compile_command
            .as_ref()
            .map(|template| expand(template, dir))
    }

    /// Run command with `{dir}` expanded, running inside `dir`
    pub fn run_command_in(&self, dir: &Path) -> CommandSpec {
        expand(&self.run_command, dir)
    }

    /// Executables this language needs on PATH (compiler first, if any)
    pub fn toolchain_programs(&self) -> Vec<String> {
        let mut programs = Vec::new();
        for command in self.compile_command.iter().chain(Some(&self.run_command)) {
            if let Some(program) = command.first() {
                if !program.contains(DIR_PLACEHOLDER) && !programs.contains(program) {
                    programs.push(program.clone());
                }
            }
        }
        programs
    }
}

fn expand(template: &[String], dir: &Path) -> CommandSpec {
    let dir_str = dir.to_string_lossy();
    let tokens: Vec<String> = template
        .iter()
        .map(|token| token.replace(DIR_PLACEHOLDER, &dir_str))
        .collect();
    CommandSpec::from_vec(&tokens).with_work_dir(dir)
}

/// Raw TOML configuration for a language
#[derive(Debug, Deserialize)]
struct RawLanguageConfig {
    source_file: String,
    compile_command: Option<String>,
    run_command: String,
    #[serde(default)]
    time_limit: Vec<String>,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    extensions: Vec<String>,
}

/// Table of language configurations, keyed by name and alias
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    languages: BTreeMap<String, LanguageConfig>,
    aliases: HashMap<String, String>,
}

impl LanguageRegistry {
    /// Built-in table (python, cpp, java, javascript, go)
    pub fn builtin() -> anyhow::Result<Self> {
        let content = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/files/languages.toml"));
        Self::from_toml_str(content).context("Failed to parse built-in languages.toml")
    }

    /// Load a table from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read language config {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse language config {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let raw_configs: HashMap<String, RawLanguageConfig> = toml::from_str(content)?;

        let mut languages = BTreeMap::new();
        let mut aliases = HashMap::new();

        for (name, raw) in raw_configs {
            let name = name.to_lowercase();

            let parse_limit = |raw_limit: Vec<String>| -> anyhow::Result<Option<(u32, u32)>> {
                if raw_limit.is_empty() {
                    return Ok(None);
                }
                if raw_limit.len() != 2 {
                    anyhow::bail!("Invalid time limit for {}: {:?}", name, raw_limit);
                }
                let multiplier = raw_limit[0].parse::<u32>().with_context(|| {
                    format!("Invalid time multiplier for {}: {}", name, raw_limit[0])
                })?;
                let offset = raw_limit[1].parse::<u32>().with_context(|| {
                    format!("Invalid time offset for {}: {}", name, raw_limit[1])
                })?;
                Ok(Some((multiplier, offset)))
            };

            let run_command = into_command(&raw.run_command);
            if run_command.is_empty() {
                anyhow::bail!("Empty run_command for {}", name);
            }
            let compile_command = match raw.compile_command {
                Some(cmd) => {
                    let cmd = into_command(&cmd);
                    if cmd.is_empty() {
                        anyhow::bail!("Empty compile_command for {}", name);
                    }
                    Some(cmd)
                }
                None => None,
            };

            let config = LanguageConfig {
                name: name.clone(),
                source_file: raw.source_file,
                compile_command,
                run_command,
                time_limit: parse_limit(raw.time_limit)?,
                extensions: raw
                    .extensions
                    .iter()
                    .map(|e| e.trim_start_matches('.').to_lowercase())
                    .collect(),
            };

            for alias in raw.aliases {
                aliases.insert(alias.to_lowercase(), name.clone());
            }
            languages.insert(name, config);
        }

        Ok(Self { languages, aliases })
    }

    /// Get language configuration by name or alias
    pub fn get(&self, language: &str) -> Option<&LanguageConfig> {
        let key = language.trim().to_lowercase();
        self.languages.get(&key).or_else(|| {
            self.aliases
                .get(&key)
                .and_then(|name| self.languages.get(name))
        })
    }

    /// Detect the language of a source file from its extension
    pub fn detect(&self, path: impl AsRef<Path>) -> Option<&LanguageConfig> {
        let ext = path.as_ref().extension()?.to_str()?.to_lowercase();
        self.languages
            .values()
            .find(|config| config.extensions.iter().any(|e| *e == ext))
    }

    /// Canonical names of all supported languages, sorted
    pub fn names(&self) -> Vec<String> {
        self.languages.keys().cloned().collect()
    }
}

fn into_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(|s| s.to_string()).collect()
}
