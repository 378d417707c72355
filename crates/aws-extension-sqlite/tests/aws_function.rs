// aws-extension-sqlite/tests/aws_function.rs
// ============================================================================
// Module: Greeting Function Tests
// Description: End-to-end checks for the `aws` scalar function.
// Purpose: Ensure the extension loads and formats values through real SQL.
// ============================================================================

//! ## Overview
//! Opens in-memory sessions, loads the extension through `aws_init`, and
//! runs `aws(...)` as ordinary SQL.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use aws_extension_sqlite::AwsExtension;
use aws_extension_sqlite::Session;
use aws_extension_sqlite::aws_init;
use proptest::prelude::*;
use rusqlite::types::Value;

fn initialized_session() -> Session {
    let session = Session::open_in_memory().expect("in-memory session opens");
    aws_init(&session).expect("aws extension loads");
    session
}

#[test]
fn aws_greets_sam() {
    let session = initialized_session();
    let rows = session.query_rows("SELECT aws('Sam') as value;").expect("query runs");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], Value::Text("Aws Sam 🐥".to_string()));
}

#[test]
fn aws_maps_null_to_null() {
    let session = initialized_session();
    assert_eq!(session.query_scalar("SELECT aws(NULL)").expect("query runs"), Value::Null);
}

#[test]
fn aws_formats_numbers_as_text() {
    let session = initialized_session();
    assert_eq!(
        session.query_scalar("SELECT aws(42)").expect("query runs"),
        Value::Text("Aws 42 🐥".to_string())
    );
}

#[test]
fn aws_formats_reals_like_sqlite_text() {
    let session = initialized_session();
    assert_eq!(
        session.query_scalar("SELECT aws(1.0)").expect("query runs"),
        Value::Text("Aws 1.0 🐥".to_string())
    );
    for literal in ["1.0", "2.5", "-0.000015", "0.1", "1e20", "123456.789"] {
        let sql = format!("SELECT aws({literal}) = 'Aws ' || {literal} || ' 🐥'");
        assert_eq!(session.query_scalar(&sql).expect("query runs"), Value::Integer(1), "{literal}");
    }
}

#[test]
fn aws_rejects_blobs() {
    let session = initialized_session();
    let err = session.query_scalar("SELECT aws(x'00ff')").expect_err("blob rejected");
    assert!(err.to_string().contains("blob"), "unexpected error: {err}");
}

#[test]
fn aws_applies_per_row() {
    let session = initialized_session();
    session
        .connection()
        .execute_batch(
            "CREATE TABLE people(name TEXT); INSERT INTO people VALUES ('Ann'), (NULL), ('Bo');",
        )
        .expect("table created");
    let rows = session.query_rows("SELECT aws(name) FROM people ORDER BY rowid").expect("query runs");
    let values: Vec<Value> = rows.into_iter().map(|mut row| row.remove(0)).collect();
    assert_eq!(
        values,
        vec![
            Value::Text("Aws Ann 🐥".to_string()),
            Value::Null,
            Value::Text("Aws Bo 🐥".to_string()),
        ]
    );
}

#[test]
fn loading_twice_is_a_no_op() {
    let session = initialized_session();
    assert!(session.is_extension_loaded(AwsExtension::NAME));
    aws_init(&session).expect("second init succeeds");
    assert_eq!(
        session.query_scalar("SELECT aws('again')").expect("query runs"),
        Value::Text("Aws again 🐥".to_string())
    );
}

#[test]
fn library_version_matches_sqlite() {
    let session = initialized_session();
    let reported = session.query_scalar("SELECT sqlite_version()").expect("query runs");
    assert_eq!(reported, Value::Text(AwsExtension::library_version().to_string()));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn aws_wraps_any_text(name in "\\PC{0,24}") {
        let session = initialized_session();
        let value = session
            .connection()
            .query_row("SELECT aws(?1)", [&name], |row| row.get::<_, String>(0))
            .expect("query runs");
        prop_assert_eq!(value, format!("Aws {name} 🐥"));
    }
}
