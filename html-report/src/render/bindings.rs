// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::config::ReporterConfig;
use chrono::{
    DateTime, FixedOffset, TimeDelta,
    format::{Item, StrftimeItems},
};
use html_report_model::{Attachment, Icon, LogEntry, Status, TestEntry};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::warn;

static RFC3339_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Everything a template can refer to.
///
/// Timestamps are formatted ahead of time with the configured
/// `timestamp-format`, so templates never deal with time zones or locales.
#[derive(Clone, Debug, Serialize)]
#[non_exhaustive]
pub struct RenderBindings {
    /// The report itself.
    pub report: ReportView,

    /// Icon name for each status, keyed by the status name.
    pub icons: IndexMap<&'static str, &'static str>,

    /// Every status, keyed by its upper-case name (`statuses.FAIL == "fail"`).
    pub statuses: IndexMap<String, &'static str>,

    /// The configuration in effect for this render.
    pub config: IndexMap<String, String>,

    /// The entries serialized as JSON, safe to embed inside a `<script>` tag.
    ///
    /// This is what append mode reads back.
    pub model_json: String,
}

impl RenderBindings {
    /// Builds the bindings for `entries`, in order.
    pub fn new(
        entries: &[TestEntry],
        config: &ReporterConfig,
        generated_at: DateTime<FixedOffset>,
    ) -> Result<Self, serde_json::Error> {
        let model_json = escape_script_json(&serde_json::to_string(entries)?);
        let timestamps = TimestampFormatter::new(config.timestamp_format());

        let mut counts = StatusCounts::default();
        let mut categories: Vec<String> = Vec::new();
        for entry in entries {
            counts.record(entry.status);
            for category in &entry.categories {
                if !categories.contains(category) {
                    categories.push(category.clone());
                }
            }
        }

        let report = ReportView {
            document_title: config.document_title().to_owned(),
            report_name: config.report_name().to_owned(),
            theme: config.theme().to_string(),
            encoding: config.encoding().to_owned(),
            resource_dir: config.resource_dir_name().to_owned(),
            generated_at: timestamps.format(&generated_at),
            entries: entries
                .iter()
                .map(|entry| EntryView::new(entry, &timestamps))
                .collect(),
            counts,
            categories,
        };

        Ok(Self {
            report,
            icons: Status::ALL
                .iter()
                .map(|&status| (status.as_str(), Icon::for_status(status)))
                .collect(),
            statuses: Status::ALL
                .iter()
                .map(|status| (status.as_str().to_ascii_uppercase(), status.as_str()))
                .collect(),
            config: config.to_map(),
            model_json,
        })
    }
}

/// Report-level data.
#[derive(Clone, Debug, Serialize)]
#[non_exhaustive]
pub struct ReportView {
    /// The document title.
    pub document_title: String,
    /// The report heading.
    pub report_name: String,
    /// The theme name.
    pub theme: String,
    /// The declared charset.
    pub encoding: String,
    /// The resource directory, relative to the report.
    pub resource_dir: String,
    /// When the report was rendered.
    pub generated_at: String,
    /// The entries, in render order.
    pub entries: Vec<EntryView>,
    /// Totals by outcome.
    pub counts: StatusCounts,
    /// Every category used by any entry, in order of first use.
    pub categories: Vec<String>,
}

/// Totals by outcome.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct StatusCounts {
    /// All entries.
    pub total: usize,
    /// Entries that passed.
    pub passed: usize,
    /// Entries that failed, errored or hit a fatal condition.
    pub failed: usize,
    /// Entries that were skipped.
    pub skipped: usize,
    /// Entries that passed with warnings.
    pub warnings: usize,
    /// Entries whose status is informational only.
    pub others: usize,
}

impl StatusCounts {
    fn record(&mut self, status: Status) {
        self.total += 1;
        match status {
            Status::Pass => self.passed += 1,
            Status::Fail | Status::Fatal | Status::Error => self.failed += 1,
            Status::Skip => self.skipped += 1,
            Status::Warning => self.warnings += 1,
            Status::Info | Status::Debug => self.others += 1,
        }
    }
}

/// A single entry, ready for display.
#[derive(Clone, Debug, Serialize)]
#[non_exhaustive]
pub struct EntryView {
    /// The entry's identifier.
    pub code_name: String,
    /// The display name.
    pub name: String,
    /// The verdict.
    pub status: Status,
    /// The description, if any.
    pub description: Option<String>,
    /// Formatted start time.
    pub started_at: String,
    /// Formatted end time.
    pub ended_at: Option<String>,
    /// Formatted run time.
    pub duration: Option<String>,
    /// Category tags.
    pub categories: Vec<String>,
    /// Log lines.
    pub logs: Vec<LogView>,
    /// Attachments with their embeddable snippets.
    pub attachments: Vec<AttachmentView>,
}

impl EntryView {
    fn new(entry: &TestEntry, timestamps: &TimestampFormatter<'_>) -> Self {
        Self {
            code_name: entry.code_name().to_owned(),
            name: entry.name.clone(),
            status: entry.status,
            description: entry.description.clone(),
            started_at: timestamps.format(&entry.started_at),
            ended_at: entry.ended_at.as_ref().map(|at| timestamps.format(at)),
            duration: entry.duration().map(format_duration),
            categories: entry.categories.clone(),
            logs: entry
                .logs
                .iter()
                .map(|log| LogView::new(log, timestamps))
                .collect(),
            attachments: entry.attachments.iter().map(AttachmentView::new).collect(),
        }
    }
}

/// A log line, ready for display.
#[derive(Clone, Debug, Serialize)]
#[non_exhaustive]
pub struct LogView {
    /// The step's status.
    pub status: Status,
    /// Formatted timestamp.
    pub timestamp: String,
    /// The message.
    pub details: String,
}

impl LogView {
    fn new(log: &LogEntry, timestamps: &TimestampFormatter<'_>) -> Self {
        Self {
            status: log.status,
            timestamp: timestamps.format(&log.timestamp),
            details: log.details.clone(),
        }
    }
}

/// An attachment, ready for display.
#[derive(Clone, Debug, Serialize)]
#[non_exhaustive]
pub struct AttachmentView {
    /// The caption, if any.
    pub title: Option<String>,
    /// The raw path.
    pub path: String,
    /// Thumbnail markup.
    pub source: String,
    /// Icon-link markup.
    pub source_with_icon: String,
}

impl AttachmentView {
    fn new(attachment: &Attachment) -> Self {
        Self {
            title: attachment.title.clone(),
            path: attachment.path.clone(),
            source: attachment.source(),
            source_with_icon: attachment.source_with_icon(),
        }
    }
}

struct TimestampFormatter<'a> {
    format: &'a str,
}

impl<'a> TimestampFormatter<'a> {
    fn new(format: &'a str) -> Self {
        // chrono panics on display if the format is invalid, so check it once
        // up front.
        if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
            warn!("invalid timestamp-format `{format}`, falling back to RFC 3339");
            Self {
                format: RFC3339_FORMAT,
            }
        } else {
            Self { format }
        }
    }

    fn format(&self, timestamp: &DateTime<FixedOffset>) -> String {
        timestamp.format(self.format).to_string()
    }
}

fn format_duration(duration: TimeDelta) -> String {
    let total_ms = duration.num_milliseconds().max(0);
    let (secs, ms) = (total_ms / 1000, total_ms % 1000);
    let (mins, secs) = (secs / 60, secs % 60);
    let (hours, mins) = (mins / 60, mins % 60);
    format!("{hours}h {mins}m {secs}s+{ms}ms")
}

/// Escapes characters that could close a `<script>` element early.
///
/// These characters only occur inside JSON strings, where the `\u` escapes are
/// equivalent.
fn escape_script_json(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            _ => out.push(c),
        }
    }
    out
}
