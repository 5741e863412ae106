// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turning the collected entries into a report on disk.
//!
//! A flush goes through these steps, stopping at the first failure:
//!
//! 1. **Validating**: the configuration is copied for the duration of the flush
//!    and the destination is resolved.
//! 2. **Merging** (append mode only): entries from an existing report at the
//!    destination are read back and placed ahead of the collected ones. This
//!    happens at most once per destination.
//! 3. **Rendering**: the template pipeline produces the report text.
//! 4. **Staging**: the resource directory next to the destination is populated,
//!    unless it already exists.
//! 5. **Writing**: the report is written through a temporary file and renamed
//!    into place.
//!
//! A failed flush leaves any existing report untouched.

use crate::{
    config::ReporterConfig,
    converter::{EmbeddedModelConverter, ReportConverter},
    errors::{DisplayErrorChain, FlushError, TemplateError},
    merge::AppendMerger,
    render::{EmbeddedTemplates, INDEX_TEMPLATE, RenderBindings, TemplatePipeline},
    resources::{EmbeddedResources, ResourceBundle, StageOutcome, stage_resources},
    store::OrderedStore,
};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::Local;
use debug_ignore::DebugIgnore;
use html_report_model::TestEntry;
use std::{
    collections::HashSet,
    io::Write,
    sync::{Mutex, MutexGuard, PoisonError},
};
use tracing::{debug, error, info};

/// Collects entries from test threads and writes them out as a report.
///
/// `ReportFlusher` is `Send + Sync`: share it by reference or through an `Arc`,
/// and add entries through [`store`](Self::store) from any thread. Only one
/// flush runs at a time; a second caller waits for the first to finish.
#[derive(Debug)]
pub struct ReportFlusher {
    store: OrderedStore<TestEntry>,
    config: Mutex<ReporterConfig>,
    pipeline: DebugIgnore<Box<dyn TemplatePipeline>>,
    converter: DebugIgnore<Box<dyn ReportConverter>>,
    bundle: DebugIgnore<Box<dyn ResourceBundle>>,
    state: Mutex<FlushState>,
}

impl ReportFlusher {
    /// Creates a flusher with the embedded templates, converter and resources.
    pub fn new(config: ReporterConfig) -> Self {
        Self::builder(config).build()
    }

    /// Returns a builder that allows replacing the default collaborators.
    pub fn builder(config: ReporterConfig) -> ReportFlusherBuilder {
        ReportFlusherBuilder::new(config)
    }

    /// The entries collected so far.
    pub fn store(&self) -> &OrderedStore<TestEntry> {
        &self.store
    }

    /// Returns a copy of the current configuration.
    pub fn config(&self) -> ReporterConfig {
        self.lock_config().clone()
    }

    /// Changes the configuration used by subsequent flushes.
    ///
    /// A flush that is already running keeps the configuration it started
    /// with.
    pub fn configure(&self, f: impl FnOnce(&mut ReporterConfig)) {
        f(&mut self.lock_config());
    }

    /// Writes the collected entries to the configured destination.
    ///
    /// This never fails outright: errors are logged and returned as
    /// [`FlushOutcome::Aborted`].
    pub fn flush(&self) -> FlushOutcome {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if self.store.is_empty() {
            debug!("no entries collected, skipping flush");
            return FlushOutcome::Empty;
        }

        match self.flush_impl(&mut state) {
            Ok((path, entries)) => FlushOutcome::Written { path, entries },
            Err(error) => {
                error!("report flush aborted: {}", DisplayErrorChain::new(&error));
                FlushOutcome::Aborted(error)
            }
        }
    }

    fn flush_impl(&self, state: &mut FlushState) -> Result<(Utf8PathBuf, usize), FlushError> {
        debug!("flush: validating configuration");
        let config = self.config();
        let dest = config
            .file_path()
            .ok_or(FlushError::MissingDestination)?
            .to_owned();
        let dest_dir = parent_dir(&dest);

        let entries = if config.append_existing()
            && !state.settled.contains(&dest)
            && dest.is_file()
        {
            debug!("flush: merging existing report at {dest}");
            let parsed = self.converter.parse(&dest);
            state.settled.insert(dest.clone());
            AppendMerger::merge(parsed, &self.store)
        } else {
            self.store.snapshot()
        };

        debug!("flush: rendering {} entries", entries.len());
        let bindings = RenderBindings::new(&entries, &config, Local::now().fixed_offset())
            .map_err(|error| TemplateError::new(INDEX_TEMPLATE, error))?;
        let html = self.pipeline.render(INDEX_TEMPLATE, &bindings)?;

        let resource_dir = dest_dir.join(config.resource_dir_name());
        if !state.staged.contains(&resource_dir) {
            debug!("flush: staging resources into {resource_dir}");
            if let StageOutcome::Staged { copied, missing } =
                stage_resources(&**self.bundle, &resource_dir)?
            {
                debug!(
                    "staged {copied} resources ({} missing from bundle)",
                    missing.len(),
                );
            }
            state.staged.insert(resource_dir);
        }

        debug!("flush: writing {dest}");
        std::fs::create_dir_all(dest_dir).map_err(|error| FlushError::Write {
            path: dest.clone(),
            error,
        })?;
        AtomicFile::new_with_tmpdir(&dest, OverwriteBehavior::AllowOverwrite, dest_dir)
            .write(|file| file.write_all(html.as_bytes()))
            .map_err(|error| FlushError::Write {
                path: dest.clone(),
                error: match error {
                    atomicwrites::Error::Internal(error) | atomicwrites::Error::User(error) => {
                        error
                    }
                },
            })?;
        state.settled.insert(dest.clone());

        info!("wrote report with {} entries to {dest}", entries.len());
        Ok((dest, entries.len()))
    }

    fn lock_config(&self) -> MutexGuard<'_, ReporterConfig> {
        self.config.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Builds a [`ReportFlusher`] with custom collaborators.
#[derive(Debug)]
pub struct ReportFlusherBuilder {
    config: ReporterConfig,
    pipeline: DebugIgnore<Box<dyn TemplatePipeline>>,
    converter: DebugIgnore<Box<dyn ReportConverter>>,
    bundle: DebugIgnore<Box<dyn ResourceBundle>>,
}

impl ReportFlusherBuilder {
    fn new(config: ReporterConfig) -> Self {
        Self {
            config,
            pipeline: DebugIgnore(Box::new(EmbeddedTemplates)),
            converter: DebugIgnore(Box::new(EmbeddedModelConverter)),
            bundle: DebugIgnore(Box::new(EmbeddedResources)),
        }
    }

    /// Sets the template pipeline used to render reports.
    pub fn set_pipeline(&mut self, pipeline: impl TemplatePipeline + 'static) -> &mut Self {
        self.pipeline = DebugIgnore(Box::new(pipeline));
        self
    }

    /// Sets the converter used to read back existing reports in append mode.
    pub fn set_converter(&mut self, converter: impl ReportConverter + 'static) -> &mut Self {
        self.converter = DebugIgnore(Box::new(converter));
        self
    }

    /// Sets the bundle that resources are staged from.
    pub fn set_bundle(&mut self, bundle: impl ResourceBundle + 'static) -> &mut Self {
        self.bundle = DebugIgnore(Box::new(bundle));
        self
    }

    /// Builds the flusher.
    pub fn build(self) -> ReportFlusher {
        ReportFlusher {
            store: OrderedStore::new(),
            config: Mutex::new(self.config),
            pipeline: self.pipeline,
            converter: self.converter,
            bundle: self.bundle,
            state: Mutex::new(FlushState::default()),
        }
    }
}

/// The result of [`ReportFlusher::flush`].
#[derive(Debug)]
#[must_use]
pub enum FlushOutcome {
    /// No entries were collected, so nothing was written.
    Empty,

    /// The report was written.
    Written {
        /// Where the report was written.
        path: Utf8PathBuf,

        /// The number of entries in the report.
        entries: usize,
    },

    /// The flush failed and any existing report was left untouched.
    Aborted(FlushError),
}

impl FlushOutcome {
    /// Returns true if a report was written.
    pub fn is_written(&self) -> bool {
        matches!(self, FlushOutcome::Written { .. })
    }
}

/// Bookkeeping carried across flushes. Guarded by the flush lock.
#[derive(Debug, Default)]
struct FlushState {
    /// Destinations whose history is already part of the store.
    settled: HashSet<Utf8PathBuf>,

    /// Resource directories staged by this flusher.
    staged: HashSet<Utf8PathBuf>,
}

fn parent_dir(path: &Utf8Path) -> &Utf8Path {
    match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    }
}
