// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::{Utf8Path, Utf8PathBuf};
use camino_tempfile::Utf8TempDir;
use html_report::{
    config::ReporterConfig,
    converter::{EmbeddedModelConverter, ReportConverter},
    errors::TemplateError,
    model::TestEntry,
    render::{EmbeddedTemplates, RenderBindings, TemplatePipeline},
    resources::{EmbeddedResources, ResourceBundle},
};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

/// A temporary directory with a report destination inside it.
pub(crate) struct ReportDir {
    // Held for its drop.
    _temp: Utf8TempDir,
    root: Utf8PathBuf,
}

impl ReportDir {
    pub(crate) fn new() -> Self {
        let temp = Utf8TempDir::with_prefix("html-report-").expect("temp dir created");
        let root = temp.path().to_owned();
        Self { _temp: temp, root }
    }

    pub(crate) fn report_path(&self) -> Utf8PathBuf {
        self.root.join("out").join("index.html")
    }

    pub(crate) fn resource_dir(&self) -> Utf8PathBuf {
        self.root.join("out").join("extent")
    }

    pub(crate) fn config(&self) -> ReporterConfig {
        let mut config = ReporterConfig::default_config();
        config.set_file_path(self.report_path());
        config
    }

    pub(crate) fn append_config(&self) -> ReporterConfig {
        let mut config = self.config();
        config.set_append_existing(true);
        config
    }
}

pub(crate) fn entry(code_name: &str) -> TestEntry {
    TestEntry::new(code_name, code_name.to_uppercase())
}

/// The code names stored in the report at `path`, in order.
pub(crate) fn reported_code_names(path: &Utf8Path) -> Vec<String> {
    EmbeddedModelConverter
        .parse(path)
        .iter()
        .map(|entry| entry.code_name().to_owned())
        .collect()
}

pub(crate) fn file_names(dir: &Utf8Path) -> Vec<String> {
    let mut names: Vec<_> = dir
        .read_dir_utf8()
        .expect("directory is readable")
        .map(|entry| entry.expect("dir entry").file_name().to_owned())
        .collect();
    names.sort_unstable();
    names
}

/// Renders with the embedded templates, recording what each render saw.
#[derive(Clone, Debug, Default)]
pub(crate) struct RecordingPipeline {
    renders: Arc<Mutex<Vec<RecordedRender>>>,
}

#[derive(Clone, Debug)]
pub(crate) struct RecordedRender {
    pub(crate) code_names: Vec<String>,
    pub(crate) report_name: String,
}

impl RecordingPipeline {
    pub(crate) fn renders(&self) -> Vec<RecordedRender> {
        self.renders.lock().unwrap().clone()
    }
}

impl TemplatePipeline for RecordingPipeline {
    fn render(&self, template: &str, bindings: &RenderBindings) -> Result<String, TemplateError> {
        self.renders.lock().unwrap().push(RecordedRender {
            code_names: bindings
                .report
                .entries
                .iter()
                .map(|entry| entry.code_name.clone())
                .collect(),
            report_name: bindings.report.report_name.clone(),
        });
        EmbeddedTemplates.render(template, bindings)
    }
}

/// Always fails to render.
#[derive(Copy, Clone, Debug)]
pub(crate) struct FailingPipeline;

impl TemplatePipeline for FailingPipeline {
    fn render(&self, template: &str, _bindings: &RenderBindings) -> Result<String, TemplateError> {
        Err(TemplateError::new(template, "template exploded"))
    }
}

/// Wraps the default converter and counts how often it is asked to parse.
#[derive(Clone, Debug, Default)]
pub(crate) struct CountingConverter {
    calls: Arc<AtomicUsize>,
}

impl CountingConverter {
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ReportConverter for CountingConverter {
    fn parse(&self, path: &Utf8Path) -> Vec<TestEntry> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        EmbeddedModelConverter.parse(path)
    }
}

const EMBEDDED: &EmbeddedResources = &EmbeddedResources;

/// The embedded resources, minus one file.
#[derive(Copy, Clone, Debug)]
pub(crate) struct BundleWithout(pub(crate) &'static str);

impl ResourceBundle for BundleWithout {
    fn get(&self, bundle_path: &str) -> Option<&[u8]> {
        if bundle_path == self.0 {
            None
        } else {
            EMBEDDED.get(bundle_path)
        }
    }
}
