//! Harness configuration
//!
//! Which compiler to run, what to put on its classpath, and how the snippet is
//! wrapped into a compilation unit.

use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the compiler executable.
pub const KOTLINC_ENV: &str = "NULLABILITY_KOTLINC";
/// Environment variable holding the classpath of the library under test.
pub const CLASSPATH_ENV: &str = "NULLABILITY_CLASSPATH";
/// Environment variable overriding the compile timeout, in seconds.
pub const TIMEOUT_ENV: &str = "NULLABILITY_TIMEOUT_SECS";

/// Executable looked up on `$KOTLIN_HOME/bin` and `PATH`.
const COMPILER_NAME: &str = "kotlinc";

/// Unit file name used when none is configured.
pub const DEFAULT_FILE_NAME: &str = "TestFile.kt";
/// kotlinc cold starts are slow; two minutes leaves room for a loaded CI box.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Harness configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Compiler executable (`None` when nothing could be found)
    pub compiler: Option<PathBuf>,
    /// Arguments placed before everything else on the compiler command line
    pub compiler_args: Vec<String>,
    /// Library under test plus its dependencies
    pub classpath: Vec<PathBuf>,
    /// Arguments placed after the harness' own options
    pub extra_args: Vec<String>,
    /// Upper bound on a single compiler run
    pub timeout: Duration,
    /// Lines written above the snippet; diagnostics are shifted back by its length
    pub preamble: Vec<String>,
    /// File name of the materialized unit
    pub file_name: String,
    /// Pass `-no-reflect` to the compiler
    pub no_reflect: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            compiler: None,
            compiler_args: Vec::new(),
            classpath: Vec::new(),
            extra_args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            preamble: Vec::new(),
            file_name: DEFAULT_FILE_NAME.to_string(),
            no_reflect: true,
        }
    }
}

impl HarnessConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self {
            compiler: find_compiler(&lookup),
            ..Self::default()
        };

        if let Some(classpath) = lookup(CLASSPATH_ENV).filter(|cp| !cp.trim().is_empty()) {
            config.classpath = env::split_paths(&classpath)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
        }

        if let Some(raw) = lookup(TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Duration::from_secs(secs),
                _ => tracing::warn!("ignoring invalid {}='{}'", TIMEOUT_ENV, raw),
            }
        }

        config
    }

    /// Set the compiler executable
    pub fn with_compiler(mut self, compiler: impl Into<PathBuf>) -> Self {
        self.compiler = Some(compiler.into());
        self
    }

    /// Set the arguments placed before the harness' own options
    pub fn with_compiler_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.compiler_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the classpath
    pub fn with_classpath<I, P>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.classpath = entries.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_extra_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_preamble<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preamble = lines.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }

    pub fn with_reflect(mut self, reflect: bool) -> Self {
        self.no_reflect = !reflect;
        self
    }
}

/// Find the compiler executable.
///
/// Order: explicit override, then `$KOTLIN_HOME/bin`, then `PATH`. Only
/// executable files count, so a stray non-executable `kotlinc` is skipped.
pub fn find_compiler(lookup: impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    // Explicit override wins even if it does not exist yet; spawning reports that.
    if let Some(explicit) = lookup(KOTLINC_ENV).filter(|s| !s.trim().is_empty()) {
        return Some(PathBuf::from(explicit));
    }

    if let Some(home) = lookup("KOTLIN_HOME") {
        let candidate = executable_in(Path::new(&home).join("bin").as_os_str());
        if candidate.is_some() {
            return candidate;
        }
    }

    let path = lookup("PATH")?;
    executable_in(OsStr::new(&path))
}

/// `kotlinc` (or `kotlinc.bat` via `PATHEXT`) on a search path.
fn executable_in(search_path: &OsStr) -> Option<PathBuf> {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    match which::which_in(COMPILER_NAME, Some(search_path), cwd) {
        Ok(found) => Some(found),
        Err(err) => {
            tracing::debug!(%err, "no {} on {}", COMPILER_NAME, search_path.to_string_lossy());
            None
        }
    }
}
