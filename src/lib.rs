#![forbid(unsafe_code)]
//! Compile-time nullability regression harness
//!
//! Compiles small Kotlin snippets against the classpath of a query-builder
//! library and reports the compiler's diagnostics as structured, located
//! records. Tests then assert that passing `null` where the API forbids it is
//! rejected at the expected line and column, and that the deliberately
//! null-tolerant "when-present" operations compile cleanly.
//!
//! ```no_run
//! use nullability_harness::{ExpectedErrorLocation, Harness, SourceSnippet};
//!
//! let harness = Harness::from_env()?;
//! let snippet = SourceSnippet::from_indented(
//!     r#"
//!     package temp.kotlin.test
//!
//!     fun testFunction(): List<Int> = listOf(4, null)
//!     "#,
//! );
//! let reports = harness.compile(&snippet)?;
//! assert_eq!(reports.match_count(&ExpectedErrorLocation::new(3, 43)), 1);
//! # Ok::<(), nullability_harness::HarnessError>(())
//! ```
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` with `?` / `ok_or` / `map_err`. The `cli` and `compiler` modules
//!   enforce `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **True invariants**: use `.expect("INVARIANT: reason")` with a clear explanation.

pub mod cli;
pub mod compiler;
pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod snippet;
pub mod version;

pub use compiler::{CompilerBackend, CompilerOutput, Harness, KotlincBackend, compile, compile_it};
pub use config::HarnessConfig;
pub use diagnostics::{CompilerErrorReport, CompilerErrorReports, ExpectedErrorLocation, Severity};
pub use errors::{HarnessError, HarnessResult};
pub use snippet::SourceSnippet;
