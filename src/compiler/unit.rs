//! Compilation units and sessions
//!
//! A session owns one temporary directory laid out like a tiny source tree:
//!
//! ```text
//! <tmp>/src/<package path>/<file name>   the snippet (plus preamble)
//! <tmp>/classes/                         compiler output
//! ```
//!
//! Dropping the session removes the directory.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::config::HarnessConfig;
use crate::errors::{HarnessError, HarnessResult};
use crate::snippet::SourceSnippet;

/// A snippet materialized on disk, ready for a compiler backend.
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    /// Absolute path of the source file
    pub source_path: PathBuf,
    /// Source file path relative to the source root (`temp/kotlin/test/TestFile.kt`)
    pub relative_path: PathBuf,
    /// Directory the compiler writes class files into
    pub output_dir: PathBuf,
    /// Number of preamble lines above the snippet
    pub line_offset: usize,
    /// Number of snippet lines as authored
    pub line_count: usize,
}

impl CompilationUnit {
    /// Whether a path printed by the compiler refers to this unit.
    pub fn is_own_path(&self, printed: &str) -> bool {
        let printed = Path::new(printed);
        printed == self.source_path || printed.ends_with(&self.relative_path)
    }

    pub fn file_name(&self) -> String {
        self.relative_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Scoped owner of one compilation unit's files.
#[derive(Debug)]
pub struct CompilationSession {
    dir: TempDir,
    unit: CompilationUnit,
}

impl CompilationSession {
    /// Write `snippet` into a fresh temporary directory.
    pub fn open(snippet: &SourceSnippet, config: &HarnessConfig) -> HarnessResult<Self> {
        if snippet.is_empty() {
            return Err(HarnessError::InvalidSnippet("snippet has no lines".to_string()));
        }
        validate_file_name(&config.file_name)?;

        let dir = tempfile::Builder::new().prefix("nullability-").tempdir()?;

        let relative_path = snippet.package_path()?.join(&config.file_name);
        let source_path = dir.path().join("src").join(&relative_path);
        let output_dir = dir.path().join("classes");

        if let Some(parent) = source_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::create_dir_all(&output_dir)?;

        let mut text = String::new();
        for line in &config.preamble {
            text.push_str(line);
            text.push('\n');
        }
        text.push_str(&snippet.text());
        fs::write(&source_path, text)?;

        tracing::debug!(path = %source_path.display(), "materialized compilation unit");

        Ok(Self {
            dir,
            unit: CompilationUnit {
                source_path,
                relative_path,
                output_dir,
                line_offset: config.preamble.len(),
                line_count: snippet.line_count(),
            },
        })
    }

    pub fn unit(&self) -> &CompilationUnit {
        &self.unit
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the session directory, reporting any failure.
    pub fn close(self) -> HarnessResult<()> {
        self.dir.close()?;
        Ok(())
    }
}

fn validate_file_name(name: &str) -> HarnessResult<()> {
    let path = Path::new(name);
    let plain = path.file_name().is_some_and(|f| f == path.as_os_str());
    if name.is_empty() || !plain || name == "." || name == ".." {
        return Err(HarnessError::InvalidSnippet(format!(
            "unit file name '{}' must be a plain file name",
            name
        )));
    }
    Ok(())
}
