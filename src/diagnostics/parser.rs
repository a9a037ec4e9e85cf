//! Compiler output parsing
//!
//! Turns the text a compiler prints into [`RawDiagnostic`]s. Raw diagnostics
//! still carry the compiler's own file path and line numbering; the compiler
//! module maps them back onto the snippet.

use std::sync::LazyLock;

use regex::Regex;

use super::Severity;
use crate::errors::{HarnessError, HarnessResult};

/// Location as printed by the compiler, before any preamble correction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLocation {
    pub path: String,
    pub line: usize,
    pub column: usize,
}

/// One diagnostic line from the compiler, still in the compiler's coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDiagnostic {
    pub severity: Severity,
    /// `None` for messages not tied to a source position
    pub location: Option<RawLocation>,
    pub message: String,
}

/// Turns raw compiler output into diagnostics.
///
/// Empty output must produce an empty list. Output that looks like a
/// diagnostic but cannot be read is an error, never skipped.
pub trait DiagnosticParser: Send + Sync {
    fn parse(&self, output: &str) -> HarnessResult<Vec<RawDiagnostic>>;
}

/// `path:line:col: severity: message`, as printed by the `kotlinc` CLI.
static LOCATED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<path>.+?):(?P<line>\d+):(?P<col>\d+): (?P<sev>error|exception|strong warning|warning|info): (?P<msg>.*)$",
    )
    .expect("INVARIANT: located diagnostic pattern is valid")
});

/// `severity: message` with no location.
static UNLOCATED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<sev>error|exception|strong warning|warning|info|logging): (?P<msg>.*)$")
        .expect("INVARIANT: unlocated diagnostic pattern is valid")
});

/// `e: file:///path:line:col message`, as printed by the Kotlin Gradle plugin.
static GRADLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<sev>[ewi]): (?:file://)?(?P<path>.+?):(?P<line>\d+):(?P<col>\d+) (?P<msg>.*)$")
        .expect("INVARIANT: gradle diagnostic pattern is valid")
});

/// Parser for `kotlinc` command-line output.
///
/// Lines that are neither located nor unlocated diagnostics (the echoed source
/// line, the caret underline, stack frames) are context and are skipped.
/// `logging:` lines are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct KotlincTextParser;

impl KotlincTextParser {
    pub fn new() -> Self {
        Self
    }
}

impl DiagnosticParser for KotlincTextParser {
    fn parse(&self, output: &str) -> HarnessResult<Vec<RawDiagnostic>> {
        let mut diagnostics = Vec::new();

        for line in output.lines() {
            let line = line.trim_end_matches('\r');

            if let Some(caps) = LOCATED.captures(line) {
                diagnostics.push(RawDiagnostic {
                    severity: severity_from_word(&caps["sev"]),
                    location: Some(RawLocation {
                        path: caps["path"].to_string(),
                        line: parse_position(&caps["line"], line)?,
                        column: parse_position(&caps["col"], line)?,
                    }),
                    message: caps["msg"].to_string(),
                });
            } else if let Some(caps) = GRADLE.captures(line) {
                let severity = match &caps["sev"] {
                    "e" => Severity::Error,
                    "w" => Severity::Warning,
                    _ => Severity::Info,
                };
                diagnostics.push(RawDiagnostic {
                    severity,
                    location: Some(RawLocation {
                        path: caps["path"].to_string(),
                        line: parse_position(&caps["line"], line)?,
                        column: parse_position(&caps["col"], line)?,
                    }),
                    message: caps["msg"].to_string(),
                });
            } else if let Some(caps) = UNLOCATED.captures(line) {
                if &caps["sev"] == "logging" {
                    continue;
                }
                diagnostics.push(RawDiagnostic {
                    severity: severity_from_word(&caps["sev"]),
                    location: None,
                    message: caps["msg"].to_string(),
                });
            }
        }

        Ok(diagnostics)
    }
}

fn severity_from_word(word: &str) -> Severity {
    match word {
        "error" | "exception" => Severity::Error,
        "strong warning" => Severity::StrongWarning,
        "warning" => Severity::Warning,
        _ => Severity::Info,
    }
}

/// Line and column numbers are 1-based; zero or overflow means the output is broken.
fn parse_position(digits: &str, line: &str) -> HarnessResult<usize> {
    match digits.parse::<usize>() {
        Ok(0) | Err(_) => Err(HarnessError::MalformedOutput(format!(
            "bad position '{}' in line: {}",
            digits, line
        ))),
        Ok(n) => Ok(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(output: &str) -> Vec<RawDiagnostic> {
        KotlincTextParser::new().parse(output).unwrap()
    }

    #[test]
    fn test_empty_output() {
        assert!(parse("").is_empty());
        assert!(parse("\n\n").is_empty());
    }

    #[test]
    fn test_located_error_with_context_lines() {
        let output = "\
/tmp/.tmpAbc/src/temp/kotlin/test/TestFile.kt:9:28: error: null can not be a value of a non-null type Int
        where { id.isIn(4, null) }
                           ^
";
        let diags = parse(output);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Error);
        assert_eq!(
            diags[0].location,
            Some(RawLocation {
                path: "/tmp/.tmpAbc/src/temp/kotlin/test/TestFile.kt".to_string(),
                line: 9,
                column: 28,
            })
        );
        assert_eq!(diags[0].message, "null can not be a value of a non-null type Int");
    }

    #[test]
    fn test_windows_path_and_crlf() {
        let diags = parse("C:\\tmp\\TestFile.kt:3:7: warning: unused variable\r\n");
        assert_eq!(diags.len(), 1);
        let location = diags[0].location.as_ref().unwrap();
        assert_eq!(location.path, "C:\\tmp\\TestFile.kt");
        assert_eq!((location.line, location.column), (3, 7));
        assert_eq!(diags[0].message, "unused variable");
    }

    #[test]
    fn test_severities() {
        let output = "\
a.kt:1:1: error: e
a.kt:2:1: exception: x
a.kt:3:1: strong warning: s
a.kt:4:1: warning: w
a.kt:5:1: info: i
";
        let severities: Vec<_> = parse(output).into_iter().map(|d| d.severity).collect();
        assert_eq!(
            severities,
            vec![
                Severity::Error,
                Severity::Error,
                Severity::StrongWarning,
                Severity::Warning,
                Severity::Info
            ]
        );
    }

    #[test]
    fn test_unlocated_messages() {
        let output = "\
warning: classpath entry points to a non-existent location: /nope
logging: using Kotlin home directory /opt/kotlin
error: source file or directory not found: Missing.kt
";
        let diags = parse(output);
        assert_eq!(diags.len(), 2);
        assert!(diags.iter().all(|d| d.location.is_none()));
        assert_eq!(diags[0].severity, Severity::Warning);
        assert_eq!(diags[1].severity, Severity::Error);
        assert_eq!(diags[1].message, "source file or directory not found: Missing.kt");
    }

    #[test]
    fn test_gradle_style() {
        let diags = parse("e: file:///work/src/TestFile.kt:10:25 Type mismatch: inferred type is List<Int?>\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Error);
        let location = diags[0].location.as_ref().unwrap();
        assert_eq!(location.path, "/work/src/TestFile.kt");
        assert_eq!((location.line, location.column), (10, 25));
    }

    #[test]
    fn test_zero_position_is_malformed() {
        let result = KotlincTextParser::new().parse("a.kt:0:3: error: bad\n");
        assert!(matches!(result, Err(HarnessError::MalformedOutput(_))));
    }

    #[test]
    fn test_overflowing_position_is_malformed() {
        let result = KotlincTextParser::new().parse("a.kt:99999999999999999999999:3: error: bad\n");
        assert!(matches!(result, Err(HarnessError::MalformedOutput(_))));
    }

    #[test]
    fn test_order_is_preserved() {
        let output = "a.kt:5:1: error: second\na.kt:2:1: error: first\n";
        let lines: Vec<_> = parse(output)
            .into_iter()
            .filter_map(|d| d.location.map(|l| l.line))
            .collect();
        assert_eq!(lines, vec![5, 2]);
    }
}
