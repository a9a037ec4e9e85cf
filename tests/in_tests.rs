//! `isIn` must reject `null` elements at compile time.
//!
//! Runs against a real `kotlinc` and the DSL classpath, so these are ignored by
//! default. Run with `cargo test -- --ignored` and `NULLABILITY_KOTLINC` plus
//! `NULLABILITY_CLASSPATH` set.

mod common;

use nullability_harness::{ExpectedErrorLocation, SourceSnippet};

fn assert_single_error_at(snippet: &SourceSnippet, line: usize, column: usize) {
    let harness = common::kotlinc_harness();
    let reports = harness.compile(snippet).expect("harness failure");
    assert_eq!(reports.len(), 1, "unexpected diagnostics: {reports:#?}");
    assert_eq!(reports.match_count(&ExpectedErrorLocation::new(line, column)), 1);
}

#[test]
#[ignore = "needs kotlinc + DSL classpath"]
fn test_null_in_varargs_causes_compile_error() {
    let snippet = SourceSnippet::from_indented(
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
    );
    assert_single_error_at(&snippet, 9, 28);
}

#[test]
#[ignore = "needs kotlinc + DSL classpath"]
fn test_null_in_list_causes_compile_error() {
    let snippet = SourceSnippet::from_indented(
        r#"
        package temp.kotlin.test

        import examples.kotlin.mybatis3.canonical.PersonDynamicSqlSupport.id
        import examples.kotlin.mybatis3.canonical.PersonDynamicSqlSupport.person
        import org.mybatis.dynamic.sql.util.kotlin.mybatis3.countFrom

        fun testFunction() {
            val ids = listOf(4, null)
            countFrom(person) {
                where { id isIn ids }
            }
        }
        "#,
    );
    assert_single_error_at(&snippet, 10, 25);
}

#[test]
#[ignore = "needs kotlinc + DSL classpath"]
fn test_null_in_varargs_elements_method_causes_compile_error() {
    let snippet = SourceSnippet::from_indented(
        r#"
        package temp.kotlin.test

        import examples.kotlin.mybatis3.canonical.PersonDynamicSqlSupport.id
        import examples.kotlin.mybatis3.canonical.PersonDynamicSqlSupport.person
        import org.mybatis.dynamic.sql.util.kotlin.mybatis3.countFrom
        import org.mybatis.dynamic.sql.util.kotlin.elements.isIn

        fun testFunction() {
            countFrom(person) {
                where { id (isIn(4, null)) }
            }
        }
        "#,
    );
    assert_single_error_at(&snippet, 10, 29);
}

#[test]
#[ignore = "needs kotlinc + DSL classpath"]
fn test_null_in_list_elements_method_causes_compile_error() {
    let snippet = SourceSnippet::from_indented(
        r#"
        package temp.kotlin.test

        import examples.kotlin.mybatis3.canonical.PersonDynamicSqlSupport.id
        import examples.kotlin.mybatis3.canonical.PersonDynamicSqlSupport.person
        import org.mybatis.dynamic.sql.util.kotlin.mybatis3.countFrom
        import org.mybatis.dynamic.sql.util.kotlin.elements.isIn

        fun testFunction() {
            val ids = listOf(4, null)
            countFrom(person) {
                where { id (isIn(ids)) }
            }
        }
        "#,
    );
    assert_single_error_at(&snippet, 11, 26);
}
