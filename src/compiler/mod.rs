//! Snippet compilation and diagnostic capture
//!
//! [`Harness::compile`] is the one operation everything else builds on:
//!
//! 1. open a fresh [`CompilationSession`] (temporary source tree)
//! 2. hand the unit to a [`CompilerBackend`]
//! 3. parse the captured output with a [`DiagnosticParser`]
//! 4. map every diagnostic back onto the snippet as authored
//!
//! Compiler diagnostics come back as data. Anything that prevents a trustworthy
//! answer comes back as a [`HarnessError`] instead, so "the compiler accepted
//! the snippet" can never be confused with "the harness did not run".

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod kotlinc;
pub mod unit;

use crate::config::HarnessConfig;
use crate::diagnostics::{
    CompilerErrorReport, CompilerErrorReports, DiagnosticParser, KotlincTextParser, RawDiagnostic, Severity,
};
use crate::errors::{HarnessError, HarnessResult};
use crate::snippet::SourceSnippet;

pub use kotlinc::KotlincBackend;
pub use unit::{CompilationSession, CompilationUnit};

/// Raw result of one compiler run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOutput {
    /// Process exit code, when the backend has one
    pub exit_code: Option<i32>,
    /// Everything the compiler printed
    pub text: String,
}

/// Runs a compiler against one materialized unit.
pub trait CompilerBackend: Send + Sync {
    fn invoke(&self, unit: &CompilationUnit) -> HarnessResult<CompilerOutput>;
}

/// Compiles snippets and returns their diagnostics.
///
/// Holds no mutable state; one harness can serve any number of tests, from any
/// number of threads.
pub struct Harness {
    config: HarnessConfig,
    backend: Box<dyn CompilerBackend>,
    parser: Box<dyn DiagnosticParser>,
}

impl Harness {
    /// Harness backed by `kotlinc` as configured.
    pub fn new(config: HarnessConfig) -> HarnessResult<Self> {
        let backend = KotlincBackend::from_config(&config)?;
        Ok(Self::with_backend(config, backend))
    }

    /// Harness configured from the process environment.
    pub fn from_env() -> HarnessResult<Self> {
        Self::new(HarnessConfig::from_env())
    }

    /// Harness with a custom backend and the default `kotlinc` output parser.
    pub fn with_backend(config: HarnessConfig, backend: impl CompilerBackend + 'static) -> Self {
        Self {
            config,
            backend: Box::new(backend),
            parser: Box::new(KotlincTextParser::new()),
        }
    }

    /// Replace the output parser, for compilers that print a different format.
    pub fn with_parser(mut self, parser: impl DiagnosticParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    /// Configuration this harness compiles with.
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Compile `snippet` and return every located diagnostic, in compiler order.
    #[tracing::instrument(skip_all, fields(lines = snippet.line_count(), package = snippet.package_name().unwrap_or("")))]
    pub fn compile(&self, snippet: &SourceSnippet) -> HarnessResult<CompilerErrorReports> {
        let session = CompilationSession::open(snippet, &self.config)?;
        let output = self.backend.invoke(session.unit())?;
        let raw = self.parser.parse(&output.text)?;
        let reports = map_to_snippet(raw, session.unit(), snippet)?;
        check_consistency(&output, &reports)?;
        session.close()?;

        tracing::info!(reports = reports.len(), "compiled snippet");
        Ok(reports)
    }

    /// Same as [`Harness::compile`]; reads better where no diagnostics are expected.
    pub fn compile_it(&self, snippet: &SourceSnippet) -> HarnessResult<CompilerErrorReports> {
        self.compile(snippet)
    }
}

/// Compile with a harness configured from the environment.
pub fn compile(snippet: &SourceSnippet) -> HarnessResult<CompilerErrorReports> {
    Harness::from_env()?.compile(snippet)
}

/// Alias of [`compile`].
pub fn compile_it(snippet: &SourceSnippet) -> HarnessResult<CompilerErrorReports> {
    compile(snippet)
}

/// Shift compiler positions back onto the snippet and drop what does not belong in the report list.
///
/// Every kept position must fall inside `snippet`: a line that exists and a
/// column no further than one past its last character.
pub fn map_to_snippet(
    raw: Vec<RawDiagnostic>,
    unit: &CompilationUnit,
    snippet: &SourceSnippet,
) -> HarnessResult<CompilerErrorReports> {
    let mut reports = Vec::with_capacity(raw.len());

    for diagnostic in raw {
        let Some(location) = diagnostic.location else {
            if diagnostic.severity == Severity::Error {
                return Err(HarnessError::CompilerMessage(diagnostic.message));
            }
            tracing::warn!(severity = %diagnostic.severity, "compiler: {}", diagnostic.message);
            continue;
        };

        if !unit.is_own_path(&location.path) {
            return Err(HarnessError::ForeignDiagnostic(format!(
                "{}:{}:{}: {}",
                location.path, location.line, location.column, diagnostic.message
            )));
        }

        let out_of_range = || HarnessError::LocationOutOfRange {
            line: location.line,
            column: location.column,
            line_count: unit.line_count,
        };
        let line = location
            .line
            .checked_sub(unit.line_offset)
            .filter(|line| (1..=unit.line_count).contains(line))
            .ok_or_else(out_of_range)?;
        let width = snippet.line(line).map_or(0, |text| text.chars().count());
        if location.column > width + 1 {
            return Err(out_of_range());
        }

        reports.push(CompilerErrorReport::new(
            diagnostic.severity,
            line,
            location.column,
            diagnostic.message,
        ));
    }

    Ok(CompilerErrorReports::new(reports))
}

/// The exit code and the parsed diagnostics must tell the same story.
fn check_consistency(output: &CompilerOutput, reports: &CompilerErrorReports) -> HarnessResult<()> {
    match output.exit_code {
        Some(1) if !reports.has_errors() => Err(HarnessError::MalformedOutput(format!(
            "compiler failed but no error could be parsed from its output:\n{}",
            output.text
        ))),
        Some(0) if reports.has_errors() => Err(HarnessError::MalformedOutput(
            "compiler succeeded but reported errors".to_string(),
        )),
        _ => Ok(()),
    }
}
