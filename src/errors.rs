//! Harness infrastructure failures
//!
//! Anything in here means the harness could not produce a trustworthy
//! diagnostic list. Compiler diagnostics about the snippet itself are never
//! reported through this type; they live in
//! [`CompilerErrorReports`](crate::diagnostics::CompilerErrorReports).

use std::path::PathBuf;
use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised when the harness itself is broken or misconfigured.
#[derive(Debug, Error, Diagnostic)]
pub enum HarnessError {
    #[error("no compiler configured")]
    #[diagnostic(
        code(nullability_harness::no_compiler),
        help("set NULLABILITY_KOTLINC or KOTLIN_HOME, or put `kotlinc` on PATH")
    )]
    NoCompiler,

    #[error("failed to start compiler '{program}': {source}")]
    #[diagnostic(code(nullability_harness::spawn))]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("classpath entry does not exist: {}", .0.display())]
    #[diagnostic(
        code(nullability_harness::missing_classpath_entry),
        help("build the library under test first, or fix NULLABILITY_CLASSPATH")
    )]
    MissingClasspathEntry(PathBuf),

    #[error("classpath cannot be joined: {0}")]
    #[diagnostic(code(nullability_harness::invalid_classpath))]
    InvalidClasspath(String),

    #[error("compiler did not finish within {0:?}")]
    #[diagnostic(code(nullability_harness::timeout))]
    Timeout(Duration),

    #[error("compiler crashed ({status}):\n{output}")]
    #[diagnostic(code(nullability_harness::crashed))]
    CompilerCrashed { status: String, output: String },

    #[error("compiler reported a failure without a source location: {0}")]
    #[diagnostic(code(nullability_harness::compiler_message))]
    CompilerMessage(String),

    #[error("malformed compiler output: {0}")]
    #[diagnostic(code(nullability_harness::malformed_output))]
    MalformedOutput(String),

    #[error("diagnostic at {line}:{column} is outside the snippet ({line_count} lines)")]
    #[diagnostic(
        code(nullability_harness::location_out_of_range),
        help("a diagnostic inside the preamble usually means the preamble itself does not compile")
    )]
    LocationOutOfRange {
        line: usize,
        column: usize,
        line_count: usize,
    },

    #[error("diagnostic points into a foreign file: {0}")]
    #[diagnostic(code(nullability_harness::foreign_diagnostic))]
    ForeignDiagnostic(String),

    #[error("invalid snippet: {0}")]
    #[diagnostic(code(nullability_harness::invalid_snippet))]
    InvalidSnippet(String),

    #[error("I/O error: {0}")]
    #[diagnostic(code(nullability_harness::io))]
    Io(#[from] std::io::Error),
}

/// Result type for harness operations.
pub type HarnessResult<T> = Result<T, HarnessError>;
