// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use html_report::{
    errors::{FlushError, TemplateError},
    flusher::{FlushOutcome, ReportFlusher},
    model::Status,
    render::{RenderBindings, TemplatePipeline},
};
use pretty_assertions::assert_eq;
use std::{
    collections::BTreeSet,
    sync::{Mutex, mpsc},
    thread,
    time::Duration,
};

#[test]
fn empty_store_writes_nothing() {
    let dir = ReportDir::new();
    let flusher = ReportFlusher::new(dir.config());

    let outcome = flusher.flush();
    assert!(matches!(outcome, FlushOutcome::Empty), "{outcome:?}");
    assert!(!dir.report_path().exists());
    assert!(!dir.resource_dir().exists());
}

#[test]
fn empty_store_leaves_existing_report_alone() {
    let dir = ReportDir::new();
    std::fs::create_dir_all(dir.report_path().parent().unwrap()).unwrap();
    std::fs::write(dir.report_path(), "previous run").unwrap();

    let flusher = ReportFlusher::new(dir.config());
    assert!(matches!(flusher.flush(), FlushOutcome::Empty));
    assert_eq!(
        std::fs::read_to_string(dir.report_path()).unwrap(),
        "previous run"
    );
}

#[test]
fn writes_entries_in_insertion_order() {
    let dir = ReportDir::new();
    let flusher = ReportFlusher::new(dir.config());
    flusher.store().add(entry("login"));
    let mut checkout = entry("checkout");
    checkout.log(Status::Fail, "total was wrong");
    flusher.store().add(checkout);

    let outcome = flusher.flush();
    let FlushOutcome::Written { path, entries } = outcome else {
        panic!("expected a report to be written, got {outcome:?}");
    };
    assert_eq!(path, dir.report_path());
    assert_eq!(entries, 2);
    assert_eq!(reported_code_names(&path), ["login", "checkout"]);

    let html = std::fs::read_to_string(&path).unwrap();
    assert!(html.contains("total was wrong"));
    assert_eq!(
        file_names(&dir.resource_dir()),
        ["css.css", "extent.css", "extent.js", "icon.css"]
    );
}

#[test]
fn missing_destination_aborts() {
    let dir = ReportDir::new();
    let mut config = dir.config();
    config.clear_file_path();
    let flusher = ReportFlusher::new(config);
    flusher.store().add(entry("a"));

    let outcome = flusher.flush();
    assert!(
        matches!(outcome, FlushOutcome::Aborted(FlushError::MissingDestination)),
        "{outcome:?}"
    );
    assert!(!dir.resource_dir().exists());
}

#[test]
fn staging_happens_once() {
    let dir = ReportDir::new();
    let flusher = ReportFlusher::new(dir.config());
    flusher.store().add(entry("a"));
    assert!(flusher.flush().is_written());

    // Local edits to staged resources survive later flushes.
    let css = dir.resource_dir().join("css.css");
    std::fs::write(&css, "/* customized */").unwrap();
    std::fs::write(dir.resource_dir().join("custom.js"), "").unwrap();

    flusher.store().add(entry("b"));
    assert!(flusher.flush().is_written());
    assert_eq!(std::fs::read_to_string(&css).unwrap(), "/* customized */");
    assert_eq!(
        file_names(&dir.resource_dir()),
        ["css.css", "custom.js", "extent.css", "extent.js", "icon.css"]
    );
}

#[test]
fn existing_resource_dir_is_not_restaged() {
    let dir = ReportDir::new();
    std::fs::create_dir_all(dir.resource_dir()).unwrap();
    std::fs::write(dir.resource_dir().join("extent.css"), "/* mine */").unwrap();

    let flusher = ReportFlusher::new(dir.config());
    flusher.store().add(entry("a"));
    assert!(flusher.flush().is_written());
    assert_eq!(file_names(&dir.resource_dir()), ["extent.css"]);
}

#[test]
fn resource_dir_name_is_configurable() {
    let dir = ReportDir::new();
    let mut config = dir.config();
    config.set_resource_dir_name("assets");
    let flusher = ReportFlusher::new(config);
    flusher.store().add(entry("a"));
    assert!(flusher.flush().is_written());

    let assets = dir.report_path().parent().unwrap().join("assets");
    assert_eq!(file_names(&assets).len(), 4);
    assert!(!dir.resource_dir().exists());
    let html = std::fs::read_to_string(dir.report_path()).unwrap();
    assert!(html.contains("assets/extent.js"));
}

#[test]
fn missing_resource_is_skipped() {
    let dir = ReportDir::new();
    let mut builder = ReportFlusher::builder(dir.config());
    builder.set_bundle(BundleWithout("icon.css"));
    let flusher = builder.build();
    flusher.store().add(entry("a"));

    assert!(flusher.flush().is_written());
    assert_eq!(
        file_names(&dir.resource_dir()),
        ["css.css", "extent.css", "extent.js"]
    );
}

#[test]
fn template_failure_leaves_report_untouched() {
    let dir = ReportDir::new();
    std::fs::create_dir_all(dir.report_path().parent().unwrap()).unwrap();
    let previous = b"<html>previous run</html>\n";
    std::fs::write(dir.report_path(), previous).unwrap();

    let mut builder = ReportFlusher::builder(dir.config());
    builder.set_pipeline(FailingPipeline);
    let flusher = builder.build();
    flusher.store().add(entry("a"));

    let outcome = flusher.flush();
    let FlushOutcome::Aborted(FlushError::Template(error)) = outcome else {
        panic!("expected a template error, got {outcome:?}");
    };
    assert_eq!(error.template(), "index.html");
    assert_eq!(std::fs::read(dir.report_path()).unwrap(), previous);
    assert!(!dir.resource_dir().exists(), "nothing staged after a failed render");
}

#[test]
fn unwritable_destination_aborts() {
    let dir = ReportDir::new();
    // A directory where the report should go.
    std::fs::create_dir_all(dir.report_path()).unwrap();

    let flusher = ReportFlusher::new(dir.config());
    flusher.store().add(entry("a"));

    let outcome = flusher.flush();
    assert!(
        matches!(
            &outcome,
            FlushOutcome::Aborted(FlushError::Write { path, .. }) if *path == dir.report_path()
        ),
        "{outcome:?}"
    );
}

#[test]
fn adds_during_flushes_all_land() {
    const THREADS: usize = 4;
    const PER_THREAD: usize = 50;

    let dir = ReportDir::new();
    let flusher = ReportFlusher::new(dir.config());

    thread::scope(|s| {
        for t in 0..THREADS {
            let flusher = &flusher;
            s.spawn(move || {
                for i in 0..PER_THREAD {
                    flusher.store().add(entry(&format!("t{t}-{i}")));
                }
            });
        }
        s.spawn(|| {
            for _ in 0..10 {
                let outcome = flusher.flush();
                assert!(
                    matches!(outcome, FlushOutcome::Empty | FlushOutcome::Written { .. }),
                    "{outcome:?}"
                );
            }
        });
    });

    let outcome = flusher.flush();
    assert!(
        matches!(outcome, FlushOutcome::Written { entries, .. } if entries == THREADS * PER_THREAD),
        "{outcome:?}"
    );
    let names = reported_code_names(&dir.report_path());
    assert_eq!(names.len(), THREADS * PER_THREAD);
    let unique: BTreeSet<_> = names.iter().collect();
    assert_eq!(unique.len(), names.len(), "no entry appears twice");
}

/// Blocks inside `render` until told to continue.
struct GatedPipeline {
    started: Mutex<mpsc::Sender<()>>,
    proceed: Mutex<mpsc::Receiver<()>>,
    recorder: RecordingPipeline,
}

impl TemplatePipeline for GatedPipeline {
    fn render(&self, template: &str, bindings: &RenderBindings) -> Result<String, TemplateError> {
        self.started.lock().unwrap().send(()).unwrap();
        self.proceed.lock().unwrap().recv().unwrap();
        self.recorder.render(template, bindings)
    }
}

#[test]
fn config_changes_wait_for_next_flush() {
    let dir = ReportDir::new();
    let (started_tx, started_rx) = mpsc::channel();
    let (proceed_tx, proceed_rx) = mpsc::channel();
    let recorder = RecordingPipeline::default();

    let mut builder = ReportFlusher::builder(dir.config());
    builder.set_pipeline(GatedPipeline {
        started: Mutex::new(started_tx),
        proceed: Mutex::new(proceed_rx),
        recorder: recorder.clone(),
    });
    let flusher = builder.build();
    flusher.store().add(entry("a"));

    let elsewhere = dir.report_path().with_file_name("elsewhere.html");
    thread::scope(|s| {
        let handle = s.spawn(|| flusher.flush());

        started_rx.recv().unwrap();
        flusher.configure(|config| {
            config.set_file_path(&elsewhere).set_report_name("Changed");
        });
        // Test threads are not blocked by a running flush.
        flusher.store().add(entry("b"));
        proceed_tx.send(()).unwrap();

        let outcome = handle.join().unwrap();
        assert!(
            matches!(
                &outcome,
                FlushOutcome::Written { path, entries: 1 } if *path == dir.report_path()
            ),
            "{outcome:?}"
        );

        // The second flush picks up the new configuration.
        let second = s.spawn(|| flusher.flush());
        started_rx.recv().unwrap();
        proceed_tx.send(()).unwrap();
        let outcome = second.join().unwrap();
        assert!(
            matches!(&outcome, FlushOutcome::Written { path, entries: 2 } if *path == elsewhere),
            "{outcome:?}"
        );
    });

    let names: Vec<_> = recorder
        .renders()
        .into_iter()
        .map(|render| render.report_name)
        .collect();
    assert_eq!(names, ["Test Report", "Changed"]);
}

#[test]
fn concurrent_flushes_run_one_at_a_time() {
    let dir = ReportDir::new();
    let (started_tx, started_rx) = mpsc::channel();
    let (proceed_tx, proceed_rx) = mpsc::channel();
    let recorder = RecordingPipeline::default();

    let mut builder = ReportFlusher::builder(dir.config());
    builder.set_pipeline(GatedPipeline {
        started: Mutex::new(started_tx),
        proceed: Mutex::new(proceed_rx),
        recorder: recorder.clone(),
    });
    let flusher = builder.build();
    flusher.store().add(entry("a"));

    thread::scope(|s| {
        let first = s.spawn(|| flusher.flush());
        started_rx.recv().unwrap();

        flusher.store().add(entry("b"));
        let second = s.spawn(|| flusher.flush());
        assert_eq!(
            started_rx.recv_timeout(Duration::from_millis(200)),
            Err(mpsc::RecvTimeoutError::Timeout),
            "second flush waits for the first to finish"
        );

        proceed_tx.send(()).unwrap();
        let outcome = first.join().unwrap();
        assert!(
            matches!(outcome, FlushOutcome::Written { entries: 1, .. }),
            "{outcome:?}"
        );

        started_rx.recv().unwrap();
        proceed_tx.send(()).unwrap();
        let outcome = second.join().unwrap();
        assert!(
            matches!(outcome, FlushOutcome::Written { entries: 2, .. }),
            "{outcome:?}"
        );
    });

    let code_names: Vec<_> = recorder
        .renders()
        .into_iter()
        .map(|render| render.code_names)
        .collect();
    assert_eq!(code_names, [vec!["a"], vec!["a", "b"]]);
    assert_eq!(reported_code_names(&dir.report_path()), ["a", "b"]);
}

#[test]
fn resource_dir_failure_leaves_report_untouched() {
    let dir = ReportDir::new();
    std::fs::create_dir_all(dir.report_path().parent().unwrap()).unwrap();
    std::fs::write(dir.report_path(), "previous run").unwrap();
    // A regular file where the resource directory should go.
    std::fs::write(dir.resource_dir(), "not a directory").unwrap();

    let flusher = ReportFlusher::new(dir.config());
    flusher.store().add(entry("a"));

    let outcome = flusher.flush();
    assert!(
        matches!(
            &outcome,
            FlushOutcome::Aborted(FlushError::StageDirCreate { dir: failed, .. })
                if *failed == dir.resource_dir()
        ),
        "{outcome:?}"
    );
    assert_eq!(
        std::fs::read_to_string(dir.report_path()).unwrap(),
        "previous run"
    );

    // Staging is retried once the path is usable.
    std::fs::remove_file(dir.resource_dir()).unwrap();
    assert!(flusher.flush().is_written());
    assert!(dir.resource_dir().is_dir());
    assert_eq!(reported_code_names(&dir.report_path()), ["a"]);
}

#[test]
fn recording_pipeline_sees_what_is_written() {
    let dir = ReportDir::new();
    let recorder = RecordingPipeline::default();
    let mut builder = ReportFlusher::builder(dir.config());
    builder.set_pipeline(recorder.clone());
    let flusher = builder.build();
    flusher.store().add(entry("a"));
    flusher.store().add(entry("b"));

    assert!(flusher.flush().is_written());
    let renders = recorder.renders();
    assert_eq!(renders.len(), 1);
    assert_eq!(renders[0].code_names, ["a", "b"]);
    assert_eq!(reported_code_names(&dir.report_path()), renders[0].code_names);
}
