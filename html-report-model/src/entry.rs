// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{Attachment, Status};
use chrono::{DateTime, FixedOffset, Local, TimeDelta};
use serde::{Deserialize, Serialize};

/// A single test result in the report.
///
/// `code_name` identifies the entry across flushes and runs. It is fixed at
/// construction; everything else may be updated while the test runs.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestEntry {
    code_name: String,

    /// The human-readable name shown in the report.
    pub name: String,

    /// The current verdict.
    pub status: Status,

    /// A free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// When the test started.
    pub started_at: DateTime<FixedOffset>,

    /// When the test finished, if it has.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<FixedOffset>>,

    /// Category tags, in insertion order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,

    /// Log lines recorded against this test.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<LogEntry>,

    /// Captured resources.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl TestEntry {
    /// Creates a new entry that starts now with status [`Status::Pass`].
    pub fn new(code_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self::started_at(code_name, name, Local::now().fixed_offset())
    }

    /// Creates a new entry with an explicit start time.
    pub fn started_at(
        code_name: impl Into<String>,
        name: impl Into<String>,
        started_at: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            code_name: code_name.into(),
            name: name.into(),
            status: Status::Pass,
            description: None,
            started_at,
            ended_at: None,
            categories: Vec::new(),
            logs: Vec::new(),
            attachments: Vec::new(),
        }
    }

    /// The identifier of this entry.
    pub fn code_name(&self) -> &str {
        &self.code_name
    }

    /// Sets the description.
    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a category tag, ignoring duplicates.
    pub fn add_category(&mut self, category: impl Into<String>) -> &mut Self {
        let category = category.into();
        if !self.categories.contains(&category) {
            self.categories.push(category);
        }
        self
    }

    /// Records a log line and escalates the entry's status if `status` is worse.
    pub fn log(&mut self, status: Status, details: impl Into<String>) -> &mut Self {
        self.logs.push(LogEntry {
            status,
            timestamp: Local::now().fixed_offset(),
            details: details.into(),
        });
        self.status = self.status.escalate(status);
        self
    }

    /// Attaches a captured resource.
    pub fn add_attachment(&mut self, attachment: Attachment) -> &mut Self {
        self.attachments.push(attachment);
        self
    }

    /// Marks the entry as finished at `at`.
    pub fn finish(&mut self, at: DateTime<FixedOffset>) -> &mut Self {
        self.ended_at = Some(at);
        self
    }

    /// Time between start and end, if the entry has finished.
    pub fn duration(&self) -> Option<TimeDelta> {
        self.ended_at.map(|ended_at| ended_at - self.started_at)
    }
}

/// A timestamped line of test output.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct LogEntry {
    /// The status of this step.
    pub status: Status,

    /// When the line was recorded.
    pub timestamp: DateTime<FixedOffset>,

    /// The message, which may contain markup.
    pub details: String,
}
