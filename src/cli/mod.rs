//! CLI module for the nullability harness
//!
//! ## Commands
//!
//! - `compile <file>` - Compile a snippet file and check expected diagnostics
//! - `locate <file> <token>` - Print the `LINE:COL` positions of a token
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::config::HarnessConfig;
use crate::diagnostics::ExpectedErrorLocation;
use crate::version::HARNESS_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    /// An expectation did not hold
    pub const FAILURE: ExitCode = ExitCode(1);
    /// The harness could not run the compiler
    pub const INFRASTRUCTURE: ExitCode = ExitCode(2);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }

    /// Create an error for work the harness could not do (exit code 2).
    pub fn infrastructure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::INFRASTRUCTURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Compile Kotlin snippets and assert on their diagnostics
#[derive(Parser, Debug)]
#[command(name = "nullability-harness")]
#[command(version = HARNESS_VERSION)]
#[command(about = "Compile Kotlin snippets and assert on their diagnostics", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile a snippet file and print its diagnostics
    Compile {
        /// Snippet source file
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Classpath entry (repeatable); replaces NULLABILITY_CLASSPATH
        #[arg(long = "classpath", value_name = "PATH")]
        classpath: Vec<PathBuf>,
        /// Compiler executable; replaces NULLABILITY_KOTLINC
        #[arg(long = "kotlinc", value_name = "PATH")]
        kotlinc: Option<PathBuf>,
        /// Compile timeout in seconds
        #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
        timeout: Option<u64>,
        /// Expect exactly one diagnostic at LINE:COL (repeatable)
        #[arg(long = "expect", value_name = "LINE:COL")]
        expect: Vec<ExpectedErrorLocation>,
        /// Expect no diagnostics at all
        #[arg(long = "expect-clean", conflicts_with = "expect")]
        expect_clean: bool,
    },

    /// Print every LINE:COL at which a token occurs in a snippet file
    Locate {
        /// Snippet source file
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Text to search for
        #[arg(value_name = "TOKEN")]
        token: String,
    },
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Command::Compile {
            file,
            classpath,
            kotlinc,
            timeout,
            expect,
            expect_clean,
        } => {
            let config = build_config(HarnessConfig::from_env(), classpath, kotlinc, timeout);
            commands::compile_file(&file, config, &expect, expect_clean)
        }
        Command::Locate { file, token } => commands::locate_token(&file, &token),
    }
}

/// Apply command-line overrides on top of the environment configuration.
fn build_config(
    mut config: HarnessConfig,
    classpath: Vec<PathBuf>,
    kotlinc: Option<PathBuf>,
    timeout: Option<u64>,
) -> HarnessConfig {
    if !classpath.is_empty() {
        config = config.with_classpath(classpath);
    }
    if let Some(kotlinc) = kotlinc {
        config = config.with_compiler(kotlinc);
    }
    if let Some(secs) = timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    config
}

// ============================================================================
// Tests
// ============================================================================
