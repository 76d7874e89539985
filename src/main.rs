use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use verdict_engine::{Engine, EngineConfig, LanguageRegistry, RunRequest, RunResult, TestCase};

#[derive(Parser)]
#[command(name = "verdict-engine")]
#[command(about = "Compile and run a submission against test cases and report a verdict", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Judge a source file against a JSON test file
    Run {
        /// Source file to judge
        #[arg(short, long)]
        source: PathBuf,

        /// JSON array of {"input": ..., "output": ...}
        #[arg(short, long)]
        tests: PathBuf,

        /// Language name or alias (detected from the file extension if omitted)
        #[arg(short, long)]
        language: Option<String>,

        /// Per-test-case timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Do not scale the timeout for the language
        #[arg(long, default_value = "false")]
        ignore_time_limit_bonus: bool,

        /// Print the full result as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// List configured languages
    Languages,

    /// Check that a language's compiler/interpreter is installed
    Check {
        /// Language name or alias
        language: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("verdict_engine=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let languages = match std::env::var("LANGUAGES_CONFIG") {
        Ok(path) => {
            let registry = LanguageRegistry::from_file(&path)?;
            info!("Loaded language configurations from {}", path);
            registry
        }
        Err(_) => LanguageRegistry::builtin()?,
    };
    let config = EngineConfig::from_env().context("Failed to load engine configuration")?;
    let engine = Engine::new(languages, config);

    match cli.command {
        Commands::Run {
            source,
            tests,
            language,
            timeout_ms,
            ignore_time_limit_bonus,
            json,
        } => {
            let language = match language {
                Some(language) => language,
                None => engine
                    .languages()
                    .detect(&source)
                    .map(|config| config.name.clone())
                    .with_context(|| {
                        format!(
                            "Cannot detect language of {}; pass --language",
                            source.display()
                        )
                    })?,
            };

            let source_code = tokio::fs::read_to_string(&source)
                .await
                .with_context(|| format!("Failed to read source file {}", source.display()))?;
            let test_cases = load_test_cases(&tests).await?;
            let total = test_cases.len();

            let mut request = RunRequest::new(language, source_code, test_cases)
                .with_ignore_time_limit_bonus(ignore_time_limit_bonus);
            request.timeout_ms = timeout_ms;

            let result = engine.execute(&request).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_summary(&result, total);
            }

            Ok(if result.verdict.is_accepted() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Languages => {
            for name in engine.languages().names() {
                if let Some(config) = engine.languages().get(&name) {
                    let kind = if config.needs_compilation() {
                        "compiled"
                    } else {
                        "interpreted"
                    };
                    println!("{:<10} {:<12} {}", name, kind, config.source_file);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check { language } => {
            let programs = engine.check_toolchain(&language).await?;
            println!("{}: ok ({})", language, programs.join(", "));
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn load_test_cases(path: &Path) -> Result<Vec<TestCase>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read test file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid test file {}", path.display()))
}

fn print_summary(result: &RunResult, total: usize) {
    println!("{}", result.summary(total));

    if let Some(diagnostics) = &result.compile_output {
        println!("{}", diagnostics);
        return;
    }

    for test in &result.results {
        match test.elapsed_ms {
            Some(ms) => println!("  #{:<3} {} ({}ms)", test.index, test.status, ms),
            None => println!("  #{:<3} {}", test.index, test.status),
        }
        if let Some(expected) = &test.expected {
            println!("       expected: {}", expected);
        }
        if let Some(actual) = &test.actual {
            println!("       actual:   {}", actual);
        }
    }
}
