// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::{ExpectedError, HtmlReportExitCode, Result},
    output::{OutputContext, OutputOpts, help_styles},
};
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use html_report::{
    config::ReporterConfig,
    flusher::{FlushOutcome, ReportFlusher},
};
use html_report_model::TestEntry;
use owo_colors::OwoColorize;
use std::{num::NonZeroUsize, thread};
use tracing::{debug, info};

/// Render recorded test results into a standalone HTML report.
#[derive(Debug, Parser)]
#[command(name = "html-report", version, styles = help_styles())]
pub struct HtmlReportApp {
    #[command(flatten)]
    output: OutputOpts,

    #[command(subcommand)]
    command: Command,
}

impl HtmlReportApp {
    /// Initializes logging and color support.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Runs the command, returning the process exit code.
    pub fn exec(self, output: OutputContext) -> Result<i32> {
        match self.command {
            Command::Render(opts) => opts.exec(output),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render a JSON list of entries into a report
    Render(RenderOpts),
}

#[derive(Debug, Args)]
struct RenderOpts {
    /// JSON file containing a list of test entries
    #[arg(long, value_name = "PATH")]
    entries: Utf8PathBuf,

    /// Where to write the report [default: `file-path` from the config]
    #[arg(long, short, value_name = "PATH")]
    out: Option<Utf8PathBuf>,

    /// Config file to layer over the defaults
    #[arg(long, value_name = "PATH", env = "HTML_REPORT_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Merge the entries of an existing report at the destination
    #[arg(long)]
    append: bool,

    /// Report heading and document title
    #[arg(long)]
    title: Option<String>,

    /// Number of threads adding entries; order across threads is not kept
    #[arg(long, short = 'j', value_name = "N", default_value = "1")]
    jobs: NonZeroUsize,
}

impl RenderOpts {
    fn exec(self, output: OutputContext) -> Result<i32> {
        let config = self.make_config()?;
        let entries = self.read_entries()?;

        let flusher = ReportFlusher::new(config);
        add_entries(&flusher, entries, self.jobs);

        match flusher.flush() {
            FlushOutcome::Written { path, entries } => {
                let styles = output.stdout_styles();
                println!(
                    "{} {} entries to {}",
                    "Wrote".style(styles.success),
                    entries.style(styles.count),
                    path.style(styles.path),
                );
                Ok(HtmlReportExitCode::OK)
            }
            FlushOutcome::Empty => {
                info!("no entries in {}, nothing written", self.entries);
                Ok(HtmlReportExitCode::OK)
            }
            FlushOutcome::Aborted(err) => Err(ExpectedError::FlushAborted { err }),
        }
    }

    fn make_config(&self) -> Result<ReporterConfig> {
        let mut config = ReporterConfig::from_sources(self.config.as_deref())?;
        if let Some(out) = &self.out {
            config.set_file_path(out);
        }
        if self.append {
            config.set_append_existing(true);
        }
        if let Some(title) = &self.title {
            config.set_document_title(title).set_report_name(title);
        }
        Ok(config)
    }

    fn read_entries(&self) -> Result<Vec<TestEntry>> {
        let json =
            std::fs::read_to_string(&self.entries).map_err(|err| ExpectedError::EntriesRead {
                path: self.entries.clone(),
                err,
            })?;
        serde_json::from_str(&json).map_err(|err| ExpectedError::EntriesParse {
            path: self.entries.clone(),
            err,
        })
    }
}

/// Adds `entries` to the flusher's store, split across `jobs` threads.
fn add_entries(flusher: &ReportFlusher, entries: Vec<TestEntry>, jobs: NonZeroUsize) {
    if entries.is_empty() {
        return;
    }
    let chunk_size = entries.len().div_ceil(jobs.get());
    debug!("adding {} entries in chunks of {chunk_size}", entries.len());

    thread::scope(|s| {
        for chunk in entries.chunks(chunk_size) {
            s.spawn(move || {
                for entry in chunk {
                    flusher.store().add(entry.clone());
                }
            });
        }
    });
}
