// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use html_report::{
    converter::MODEL_BLOCK_START,
    flusher::{FlushOutcome, ReportFlusher},
    model::Attachment,
};
use pretty_assertions::assert_eq;

/// Writes a report containing `code_names` with a separate flusher, as an
/// earlier run would have.
fn write_previous_run(dir: &ReportDir, code_names: &[&str]) {
    let flusher = ReportFlusher::new(dir.config());
    for code_name in code_names {
        flusher.store().add(entry(code_name));
    }
    assert!(flusher.flush().is_written());
}

#[test]
fn history_comes_before_new_entries() {
    let dir = ReportDir::new();
    write_previous_run(&dir, &["a", "b"]);

    let flusher = ReportFlusher::new(dir.append_config());
    flusher.store().add(entry("c"));
    flusher.store().add(entry("d"));

    let outcome = flusher.flush();
    assert!(
        matches!(outcome, FlushOutcome::Written { entries: 4, .. }),
        "{outcome:?}"
    );
    assert_eq!(reported_code_names(&dir.report_path()), ["a", "b", "c", "d"]);
    assert_eq!(flusher.store().len(), 4, "history is now part of the store");
}

#[test]
fn second_flush_does_not_duplicate_history() {
    let dir = ReportDir::new();
    write_previous_run(&dir, &["a", "b"]);

    let converter = CountingConverter::default();
    let mut builder = ReportFlusher::builder(dir.append_config());
    builder.set_converter(converter.clone());
    let flusher = builder.build();
    flusher.store().add(entry("c"));
    flusher.store().add(entry("d"));

    assert!(flusher.flush().is_written());
    assert!(flusher.flush().is_written());
    assert_eq!(reported_code_names(&dir.report_path()), ["a", "b", "c", "d"]);

    flusher.store().add(entry("e"));
    assert!(flusher.flush().is_written());
    assert_eq!(
        reported_code_names(&dir.report_path()),
        ["a", "b", "c", "d", "e"]
    );
    assert_eq!(converter.calls(), 1, "history is read once");
}

#[test]
fn own_output_is_never_read_back() {
    let dir = ReportDir::new();
    let converter = CountingConverter::default();
    let mut builder = ReportFlusher::builder(dir.append_config());
    builder.set_converter(converter.clone());
    let flusher = builder.build();

    flusher.store().add(entry("a"));
    assert!(flusher.flush().is_written());
    flusher.store().add(entry("b"));
    assert!(flusher.flush().is_written());

    assert_eq!(reported_code_names(&dir.report_path()), ["a", "b"]);
    assert_eq!(converter.calls(), 0);
}

#[test]
fn append_disabled_replaces_history() {
    let dir = ReportDir::new();
    write_previous_run(&dir, &["a", "b"]);

    let flusher = ReportFlusher::new(dir.config());
    flusher.store().add(entry("c"));
    assert!(flusher.flush().is_written());
    assert_eq!(reported_code_names(&dir.report_path()), ["c"]);
}

#[test]
fn shared_code_names_are_kept() {
    let dir = ReportDir::new();
    write_previous_run(&dir, &["login"]);

    let flusher = ReportFlusher::new(dir.append_config());
    flusher.store().add(entry("login"));
    assert!(flusher.flush().is_written());
    assert_eq!(reported_code_names(&dir.report_path()), ["login", "login"]);

    // Removal finds the oldest entry first.
    let outcome = flusher.store().remove_by_key("login");
    assert!(outcome.is_found());
    assert_eq!(outcome.scanned(), 1);
    assert_eq!(flusher.store().len(), 1);
}

#[test]
fn unreadable_history_is_ignored() {
    let dir = ReportDir::new();
    std::fs::create_dir_all(dir.report_path().parent().unwrap()).unwrap();
    std::fs::write(dir.report_path(), "<html><body>hand-written</body></html>").unwrap();

    let flusher = ReportFlusher::new(dir.append_config());
    flusher.store().add(entry("a"));
    assert!(flusher.flush().is_written());
    assert_eq!(reported_code_names(&dir.report_path()), ["a"]);
}

#[test]
fn history_keeps_entry_details() {
    let dir = ReportDir::new();
    {
        let flusher = ReportFlusher::new(dir.config());
        let mut previous = entry("a");
        previous
            .set_description("from the nightly run")
            .add_category("smoke");
        flusher.store().add(previous);
        assert!(flusher.flush().is_written());
    }

    let flusher = ReportFlusher::new(dir.append_config());
    flusher.store().add(entry("b"));
    assert!(flusher.flush().is_written());

    let merged = flusher.store().get(0).expect("history was merged");
    assert_eq!(merged.code_name(), "a");
    assert_eq!(merged.description.as_deref(), Some("from the nightly run"));
    assert_eq!(merged.categories, ["smoke"]);
}

#[test]
fn attachment_markup_does_not_hide_history() {
    let dir = ReportDir::new();
    {
        let flusher = ReportFlusher::new(dir.config());
        let mut previous = entry("a");
        previous.add_attachment(Attachment::new(format!(
            "x'>{MODEL_BLOCK_START}[]</script>.png"
        )));
        flusher.store().add(previous);
        flusher.store().add(entry("b"));
        assert!(flusher.flush().is_written());
    }
    let html = std::fs::read_to_string(dir.report_path()).unwrap();
    assert_eq!(
        html.matches(MODEL_BLOCK_START).count(),
        1,
        "attachment markup is escaped"
    );

    let flusher = ReportFlusher::new(dir.append_config());
    flusher.store().add(entry("c"));
    assert!(flusher.flush().is_written());
    assert_eq!(reported_code_names(&dir.report_path()), ["a", "b", "c"]);

    let merged = flusher.store().get(0).expect("history was merged");
    assert_eq!(
        merged.attachments[0].path,
        format!("x'>{MODEL_BLOCK_START}[]</script>.png")
    );
}
