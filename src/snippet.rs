//! Source snippets
//!
//! A [`SourceSnippet`] is the synthetic compilation unit handed to the harness:
//! an ordered list of Kotlin source lines. Line and column numbers used in
//! assertions always count from the first line of the snippet as authored.

use std::fmt;
use std::path::PathBuf;

use crate::diagnostics::ExpectedErrorLocation;
use crate::errors::{HarnessError, HarnessResult};

/// One synthetic compilation unit, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSnippet {
    lines: Vec<String>,
}

impl SourceSnippet {
    /// Build a snippet from already-split lines.
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Build a snippet from file contents, one entry per line.
    pub fn parse(text: &str) -> Self {
        Self::new(text.lines())
    }

    /// Build a snippet from an indented multi-line literal.
    ///
    /// A blank first or last line is dropped and the smallest indentation of
    /// the non-blank lines is removed from every line, so fixtures can be
    /// written inline at any nesting depth:
    ///
    /// ```
    /// use nullability_harness::SourceSnippet;
    ///
    /// let snippet = SourceSnippet::from_indented(
    ///     "
    ///     package temp.kotlin.test
    ///
    ///     fun testFunction() {}
    ///     ",
    /// );
    /// assert_eq!(snippet.line_count(), 3);
    /// assert_eq!(snippet.line(3), Some("fun testFunction() {}"));
    /// ```
    pub fn from_indented(text: &str) -> Self {
        let mut lines: Vec<&str> = text.lines().collect();
        // `lines()` swallows a trailing newline, so a literal ending in "\n    " still
        // leaves a whitespace-only last line to drop here.
        if lines.last().is_some_and(|l| l.trim().is_empty()) {
            lines.pop();
        }
        if lines.first().is_some_and(|l| l.trim().is_empty()) {
            lines.remove(0);
        }

        let indent = lines
            .iter()
            .filter(|l| !l.trim().is_empty())
            .map(|l| indent_width(l))
            .min()
            .unwrap_or(0);

        Self::new(lines.into_iter().map(|l| l.chars().skip(indent).collect::<String>()))
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Line text by 1-based line number.
    pub fn line(&self, number: usize) -> Option<&str> {
        number.checked_sub(1).and_then(|i| self.lines.get(i)).map(String::as_str)
    }

    /// Full source text, newline-terminated.
    pub fn text(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }

    /// Package declared by the first non-blank line, if any.
    ///
    /// `None` means the snippet lives in the root package.
    pub fn package_name(&self) -> Option<&str> {
        let first = self.lines.iter().map(|l| l.trim()).find(|l| !l.is_empty())?;
        let rest = first.strip_prefix("package")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let name = rest.trim().trim_end_matches(';').trim_end();
        if name.is_empty() { None } else { Some(name) }
    }

    /// Directory of the snippet relative to a source root, derived from its package.
    ///
    /// Segments must be plain identifiers so the unit can never be written
    /// outside its session directory.
    pub fn package_path(&self) -> HarnessResult<PathBuf> {
        let mut path = PathBuf::new();
        let Some(package) = self.package_name() else {
            return Ok(path);
        };
        for segment in package.split('.') {
            let segment = segment.trim_matches('`');
            let valid = !segment.is_empty()
                && segment.chars().all(|c| c.is_alphanumeric() || c == '_')
                && !segment.starts_with(|c: char| c.is_ascii_digit());
            if !valid {
                return Err(HarnessError::InvalidSnippet(format!(
                    "package '{}' has an invalid segment '{}'",
                    package, segment
                )));
            }
            path.push(segment);
        }
        Ok(path)
    }

    /// Every 1-based location at which `token` starts.
    ///
    /// Columns count characters, matching how the compiler reports them.
    pub fn find_token(&self, token: &str) -> Vec<ExpectedErrorLocation> {
        if token.is_empty() {
            return Vec::new();
        }
        let mut found = Vec::new();
        for (index, line) in self.lines.iter().enumerate() {
            for (byte_offset, _) in line.match_indices(token) {
                let column = line[..byte_offset].chars().count() + 1;
                found.push(ExpectedErrorLocation::new(index + 1, column));
            }
        }
        found
    }
}

impl fmt::Display for SourceSnippet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

impl From<Vec<String>> for SourceSnippet {
    fn from(lines: Vec<String>) -> Self {
        Self { lines }
    }
}

impl From<&[&str]> for SourceSnippet {
    fn from(lines: &[&str]) -> Self {
        Self::new(lines.iter().copied())
    }
}

fn indent_width(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    const IN_VARARGS: &str = r#"
        package temp.kotlin.test

        import examples.kotlin.mybatis3.canonical.PersonDynamicSqlSupport.id
        import examples.kotlin.mybatis3.canonical.PersonDynamicSqlSupport.person
        import org.mybatis.dynamic.sql.util.kotlin.mybatis3.countFrom

        fun testFunction() {
            countFrom(person) {
                where { id.isIn(4, null) }
            }
        }
    "#;

    #[test]
    fn test_from_indented_strips_common_indent() {
        let snippet = SourceSnippet::from_indented(IN_VARARGS);
        assert_eq!(snippet.line_count(), 11);
        assert_eq!(snippet.line(1), Some("package temp.kotlin.test"));
        assert_eq!(snippet.line(2), Some(""));
        assert_eq!(snippet.line(9), Some("        where { id.isIn(4, null) }"));
        assert_eq!(snippet.line(11), Some("}"));
    }

    #[test]
    fn test_from_indented_keeps_relative_indent_of_blank_lines() {
        let snippet = SourceSnippet::from_indented("\n    a\n      \n      b\n");
        assert_eq!(snippet.lines(), &["a", "  ", "  b"]);
    }

    #[test]
    fn test_line_is_one_based() {
        let snippet = SourceSnippet::new(["first", "second"]);
        assert_eq!(snippet.line(0), None);
        assert_eq!(snippet.line(1), Some("first"));
        assert_eq!(snippet.line(3), None);
    }

    #[test]
    fn test_package_name() {
        let snippet = SourceSnippet::from_indented(IN_VARARGS);
        assert_eq!(snippet.package_name(), Some("temp.kotlin.test"));
        assert_eq!(snippet.package_path().unwrap(), PathBuf::from("temp/kotlin/test"));
    }

    #[test]
    fn test_package_name_with_semicolon_and_leading_blank() {
        let snippet = SourceSnippet::new(["", "package a.b;", "fun f() {}"]);
        assert_eq!(snippet.package_name(), Some("a.b"));
    }

    #[test]
    fn test_root_package() {
        let snippet = SourceSnippet::new(["fun f() {}"]);
        assert_eq!(snippet.package_name(), None);
        assert_eq!(snippet.package_path().unwrap(), PathBuf::new());

        let snippet = SourceSnippet::new(["packagex.y"]);
        assert_eq!(snippet.package_name(), None);
    }

    #[test]
    fn test_package_path_rejects_traversal() {
        let snippet = SourceSnippet::new(["package ..etc"]);
        assert!(matches!(snippet.package_path(), Err(HarnessError::InvalidSnippet(_))));

        let snippet = SourceSnippet::new(["package a/b"]);
        assert!(matches!(snippet.package_path(), Err(HarnessError::InvalidSnippet(_))));
    }

    #[test]
    fn test_find_token() {
        let snippet = SourceSnippet::from_indented(IN_VARARGS);
        assert_eq!(snippet.find_token("null"), vec![ExpectedErrorLocation::new(9, 28)]);
        assert!(snippet.find_token("").is_empty());
        assert!(snippet.find_token("absent").is_empty());
    }

    #[test]
    fn test_find_token_counts_characters() {
        let snippet = SourceSnippet::new(["val é = null"]);
        assert_eq!(snippet.find_token("null"), vec![ExpectedErrorLocation::new(1, 9)]);
    }

    #[test]
    fn test_text_is_newline_terminated() {
        let snippet = SourceSnippet::new(["a", "b"]);
        assert_eq!(snippet.text(), "a\nb\n");
        assert_eq!(snippet.to_string(), "a\nb\n");
    }
}
