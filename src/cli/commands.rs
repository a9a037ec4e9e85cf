//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::fs;
use std::path::Path;

use crate::compiler::Harness;
use crate::config::HarnessConfig;
use crate::diagnostics::{self, CompilerErrorReports, ExpectedErrorLocation};
use crate::errors::HarnessError;
use crate::snippet::SourceSnippet;

use super::{CliError, CliResult, ExitCode};

/// Maximum snippet file size (1 MB)
///
/// Snippets are a few dozen lines; anything this large is a wrong path.
const MAX_SOURCE_SIZE: u64 = 1024 * 1024;

/// Read snippet file contents.
///
/// ## Errors
///
/// Returns an infrastructure error if:
/// - The file cannot be read (I/O error)
/// - The file exceeds `MAX_SOURCE_SIZE` (1 MB)
pub fn read_source(file_path: &Path) -> CliResult<String> {
    let metadata = fs::metadata(file_path)
        .map_err(|e| CliError::infrastructure(format!("Cannot access file '{}': {}", file_path.display(), e)))?;

    if metadata.len() > MAX_SOURCE_SIZE {
        return Err(CliError::infrastructure(format!(
            "Snippet file '{}' is too large ({} bytes, max {} bytes)",
            file_path.display(),
            metadata.len(),
            MAX_SOURCE_SIZE
        )));
    }

    fs::read_to_string(file_path)
        .map_err(|e| CliError::infrastructure(format!("Error reading file '{}': {}", file_path.display(), e)))
}

/// Turn a harness failure into a CLI error with the infrastructure exit code.
fn harness_failure(err: HarnessError) -> CliError {
    CliError::infrastructure(format!("{:?}", miette::Report::new(err)))
}

/// Compile a snippet file, print its diagnostics and check expectations.
pub fn compile_file(
    file_path: &Path,
    config: HarnessConfig,
    expected: &[ExpectedErrorLocation],
    expect_clean: bool,
) -> CliResult<ExitCode> {
    let source = read_source(file_path)?;
    let snippet = SourceSnippet::parse(&source);

    let harness = Harness::new(config).map_err(harness_failure)?;
    let reports = harness.compile(&snippet).map_err(harness_failure)?;

    let display_name = file_path.display().to_string();
    for report in &reports {
        diagnostics::print_report(&display_name, &snippet, report);
    }
    println!("{} diagnostic(s)", reports.len());

    let failures = verify_expectations(&reports, expected, expect_clean);
    if failures.is_empty() {
        return Ok(ExitCode::SUCCESS);
    }
    Err(CliError::failure(failures.join("\n")))
}

/// Print every location of `token` in a snippet file.
pub fn locate_token(file_path: &Path, token: &str) -> CliResult<ExitCode> {
    let source = read_source(file_path)?;
    let snippet = SourceSnippet::parse(&source);

    let found = snippet.find_token(token);
    if found.is_empty() {
        return Err(CliError::failure(format!(
            "'{}' does not occur in '{}'",
            token,
            file_path.display()
        )));
    }
    for location in found {
        println!("{}", location);
    }
    Ok(ExitCode::SUCCESS)
}

/// Compare reports against expectations, one message per violated expectation.
///
/// Each expected location must match exactly one report, and no report may be
/// left unaccounted for. With no expectations at all, anything passes.
pub fn verify_expectations(
    reports: &CompilerErrorReports,
    expected: &[ExpectedErrorLocation],
    expect_clean: bool,
) -> Vec<String> {
    let mut failures = Vec::new();

    if expect_clean {
        if !reports.is_empty() {
            failures.push(format!("expected no diagnostics, got {}", reports.len()));
        }
        return failures;
    }
    if expected.is_empty() {
        return failures;
    }

    for location in expected {
        let count = reports.match_count(location);
        if count != 1 {
            failures.push(format!("expected 1 diagnostic at {}, got {}", location, count));
        }
    }
    if reports.len() != expected.len() {
        failures.push(format!(
            "expected {} diagnostic(s) in total, got {}",
            expected.len(),
            reports.len()
        ));
    }
    failures
}
