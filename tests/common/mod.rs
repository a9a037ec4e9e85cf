//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use nullability_harness::{Harness, HarnessConfig, SourceSnippet};
use tempfile::TempDir;

/// Harness for the real-compiler scenarios.
///
/// Those tests are `#[ignore]`d; running them with `--ignored` and no
/// compiler or classpath configured is a setup mistake, not a pass.
pub fn kotlinc_harness() -> Harness {
    let config = HarnessConfig::from_env();
    assert!(
        config.compiler.is_some() && !config.classpath.is_empty(),
        "set NULLABILITY_KOTLINC and NULLABILITY_CLASSPATH to run the kotlinc scenarios"
    );
    Harness::new(config).expect("harness from env")
}

/// A `/bin/sh` script standing in for `kotlinc`.
///
/// The script sees the real command line; the snippet path is its last
/// argument, available as `$src`.
pub struct FakeKotlinc {
    dir: TempDir,
    script: PathBuf,
}

impl FakeKotlinc {
    pub fn new(body: &str) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let script = dir.path().join("fake-kotlinc.sh");
        let text = format!("for src; do :; done\n{}\n", body);
        fs::write(&script, text).expect("write fake compiler");
        Self { dir, script }
    }

    /// Config that runs the script through `sh`, so it needs no exec bit.
    pub fn config(&self) -> HarnessConfig {
        HarnessConfig::new()
            .with_compiler("sh")
            .with_compiler_args([self.script.to_string_lossy().to_string()])
    }

    pub fn harness(&self) -> Harness {
        Harness::new(self.config()).expect("fake harness")
    }

    /// A scratch file next to the script, usable as a classpath entry.
    pub fn scratch_file(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, "").expect("write scratch file");
        path
    }
}

pub fn in_varargs_snippet() -> SourceSnippet {
    SourceSnippet::from_indented(
        r#"
        package temp.kotlin.test

        import examples.kotlin.mybatis3.canonical.PersonDynamicSqlSupport.id
        import examples.kotlin.mybatis3.canonical.PersonDynamicSqlSupport.person
        import org.mybatis.dynamic.sql.util.kotlin.mybatis3.countFrom

        fun testFunction() {
            countFrom(person) {
                where { id.isIn(4, null) }
            }
        }
        "#,
    )
}
