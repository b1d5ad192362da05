#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for persisted state across simulated runs.

mod common;

use common::*;
use gwcore::config::{State, Value};

/// Values saved by one run are read back by the next, transient keys are
/// dropped, and keys come back normalized.
#[test]
fn state_survives_a_restart() {
    let ctx = IntegrationTestContext::new();
    let path = ctx.root_path().join("app.state");

    let mut first = State::new();
    assert!(first.load(&path).unwrap_err().is_warning(), "first run has no file");
    first.set("window-width", 800_i64);
    first.set("window.height", 600_i64);
    first.set("last file", "notes.txt");
    first.set("_session", "scratch");
    first.save("state").unwrap();

    insta::assert_snapshot!(ctx.read_file("app.state"), @r"
    [state]
    last_file=notes.txt
    window_height=600
    window_width=800
    ");

    let mut second = State::new();
    second.load(&path).unwrap();
    assert_eq!(second.peek("window_width"), Some(&Value::from("800")));
    assert_eq!(second.peek("window.height"), Some(&Value::from("600")));
    assert_eq!(second.peek("last_file"), Some(&Value::from("notes.txt")));
    assert!(!second.contains("_session"));
}

/// Loading merges into the existing record instead of replacing it.
#[test]
fn load_merges_over_existing_keys() {
    let ctx = IntegrationTestContext::new();
    let path = ctx.write_file("merge.state", "[state]\ntheme=dark\n");

    let mut state = State::new();
    state.set("theme", "light");
    state.set("zoom", 2_i64);
    state.load(&path).unwrap();

    assert_eq!(state.peek("theme"), Some(&Value::from("dark")));
    assert_eq!(state.peek("zoom"), Some(&Value::Int(2)));
}
