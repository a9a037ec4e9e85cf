//! Structured compiler diagnostics and location matching
//!
//! Whatever shape the compiler's own output has, the harness reduces it to a
//! list of [`CompilerErrorReport`]s. Assertions only ever look at those.

pub mod parser;

use std::fmt;
use std::str::FromStr;

use crate::snippet::SourceSnippet;

pub use parser::{DiagnosticParser, KotlincTextParser, RawDiagnostic, RawLocation};

/// Severity of a compiler diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Error,
    StrongWarning,
    Warning,
    Info,
}

impl Severity {
    pub fn is_error(self) -> bool {
        matches!(self, Severity::Error)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::StrongWarning => write!(f, "strong warning"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A `(line, column)` match key, both 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExpectedErrorLocation {
    pub line: usize,
    pub column: usize,
}

impl ExpectedErrorLocation {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for ExpectedErrorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl FromStr for ExpectedErrorLocation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (line, column) = s
            .split_once(':')
            .ok_or_else(|| format!("expected LINE:COL, got '{}'", s))?;
        let parse = |part: &str, what: &str| -> Result<usize, String> {
            match part.trim().parse::<usize>() {
                Ok(0) | Err(_) => Err(format!("{} must be a positive integer, got '{}'", what, part)),
                Ok(n) => Ok(n),
            }
        };
        Ok(Self::new(parse(line, "line")?, parse(column, "column")?))
    }
}

/// One diagnostic, positioned in the snippet as authored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerErrorReport {
    pub severity: Severity,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl CompilerErrorReport {
    pub fn new(severity: Severity, line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            severity,
            line,
            column,
            message: message.into(),
        }
    }

    pub fn error(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, line, column, message)
    }

    pub fn location(&self) -> ExpectedErrorLocation {
        ExpectedErrorLocation::new(self.line, self.column)
    }

    pub fn is_at(&self, location: &ExpectedErrorLocation) -> bool {
        self.line == location.line && self.column == location.column
    }
}

impl fmt::Display for CompilerErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}: {}", self.line, self.column, self.severity, self.message)
    }
}

/// All diagnostics from one compilation, in compiler order.
///
/// Empty means the snippet type-checked cleanly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilerErrorReports {
    reports: Vec<CompilerErrorReport>,
}

impl CompilerErrorReports {
    pub fn new(reports: Vec<CompilerErrorReport>) -> Self {
        Self { reports }
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CompilerErrorReport> {
        self.reports.iter()
    }

    pub fn as_slice(&self) -> &[CompilerErrorReport] {
        &self.reports
    }

    /// Number of reports located exactly at `location`.
    pub fn match_count(&self, location: &ExpectedErrorLocation) -> usize {
        self.reports.iter().filter(|r| r.is_at(location)).count()
    }

    pub fn errors(&self) -> impl Iterator<Item = &CompilerErrorReport> {
        self.reports.iter().filter(|r| r.severity.is_error())
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Distinct locations, sorted.
    pub fn locations(&self) -> Vec<ExpectedErrorLocation> {
        let mut locations: Vec<_> = self.reports.iter().map(CompilerErrorReport::location).collect();
        locations.sort();
        locations.dedup();
        locations
    }
}

impl From<Vec<CompilerErrorReport>> for CompilerErrorReports {
    fn from(reports: Vec<CompilerErrorReport>) -> Self {
        Self::new(reports)
    }
}

impl IntoIterator for CompilerErrorReports {
    type Item = CompilerErrorReport;
    type IntoIter = std::vec::IntoIter<CompilerErrorReport>;

    fn into_iter(self) -> Self::IntoIter {
        self.reports.into_iter()
    }
}

impl<'a> IntoIterator for &'a CompilerErrorReports {
    type Item = &'a CompilerErrorReport;
    type IntoIter = std::slice::Iter<'a, CompilerErrorReport>;

    fn into_iter(self) -> Self::IntoIter {
        self.reports.iter()
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Render a report with a source excerpt and a caret under the offending token.
pub fn format_report(file_name: &str, snippet: &SourceSnippet, report: &CompilerErrorReport, color: bool) -> String {
    let (red, yellow, cyan, bold, reset) = if color {
        ("\x1b[31m", "\x1b[33m", "\x1b[36m", "\x1b[1m", "\x1b[0m")
    } else {
        ("", "", "", "", "")
    };
    let kind_color = if report.severity.is_error() { red } else { yellow };

    let mut out = String::new();
    out.push_str(&format!(
        "{bold}{kind_color}{kind}{reset}{bold}: {message}{reset}\n",
        kind = report.severity,
        message = report.message,
    ));
    out.push_str(&format!(
        "  {cyan}-->{reset} {file}:{line}:{col}\n",
        file = file_name,
        line = report.line,
        col = report.column,
    ));

    let Some(line_text) = snippet.line(report.line) else {
        return out;
    };

    let width = report.line.to_string().len();
    out.push_str(&format!("  {cyan}{:>width$} |{reset}\n", ""));
    if line_text.is_empty() {
        out.push_str(&format!("  {cyan}{:>width$} |{reset}\n", report.line));
    } else {
        out.push_str(&format!("  {cyan}{:>width$} |{reset} {}\n", report.line, line_text));
    }

    let pad = report.column.saturating_sub(1);
    let underline = token_width(line_text, pad);
    out.push_str(&format!(
        "  {cyan}{:>width$} |{reset} {}{kind_color}{}{reset}\n",
        "",
        " ".repeat(pad),
        "^".repeat(underline),
    ));
    out
}

/// Print a report to stderr with color.
pub fn print_report(file_name: &str, snippet: &SourceSnippet, report: &CompilerErrorReport) {
    eprintln!("{}", format_report(file_name, snippet, report, true));
}

/// Width of the identifier-like token starting at character `start`, at least 1.
fn token_width(line: &str, start: usize) -> usize {
    line.chars()
        .skip(start)
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .count()
        .max(1)
}
