// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt, str::FromStr};
use thiserror::Error;

/// The outcome recorded against a test entry or a single log line.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    /// The test passed.
    Pass,

    /// The test failed an assertion.
    Fail,

    /// The test hit an unrecoverable condition.
    Fatal,

    /// The test errored outside of its assertions.
    Error,

    /// The test passed with warnings.
    Warning,

    /// The test was skipped.
    Skip,

    /// Informational only.
    Info,

    /// Debug output.
    Debug,
}

impl Status {
    /// All statuses, most severe first.
    pub const ALL: [Status; 8] = [
        Status::Fatal,
        Status::Fail,
        Status::Error,
        Status::Warning,
        Status::Skip,
        Status::Pass,
        Status::Debug,
        Status::Info,
    ];

    /// String representations of all known variants.
    pub fn variants() -> &'static [&'static str] {
        &[
            "fatal", "fail", "error", "warning", "skip", "pass", "debug", "info",
        ]
    }

    /// Returns the lowercase name of this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pass => "pass",
            Status::Fail => "fail",
            Status::Fatal => "fatal",
            Status::Error => "error",
            Status::Warning => "warning",
            Status::Skip => "skip",
            Status::Info => "info",
            Status::Debug => "debug",
        }
    }

    /// Ranks statuses so that a worse outcome compares greater.
    ///
    /// `Info` and `Debug` rank below `Pass`, so informational log lines never
    /// downgrade a verdict.
    pub fn severity(self) -> u8 {
        match self {
            Status::Info => 0,
            Status::Debug => 1,
            Status::Pass => 2,
            Status::Skip => 3,
            Status::Warning => 4,
            Status::Error => 5,
            Status::Fail => 6,
            Status::Fatal => 7,
        }
    }

    /// Returns the more severe of `self` and `other`.
    pub fn escalate(self, other: Status) -> Status {
        match self.severity().cmp(&other.severity()) {
            Ordering::Less => other,
            Ordering::Equal | Ordering::Greater => self,
        }
    }
}

impl FromStr for Status {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let val = match s {
            "pass" => Status::Pass,
            "fail" => Status::Fail,
            "fatal" => Status::Fatal,
            "error" => Status::Error,
            "warning" => Status::Warning,
            "skip" => Status::Skip,
            "info" => Status::Info,
            "debug" => Status::Debug,
            other => return Err(StatusParseError::new(other)),
        };
        Ok(val)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned while parsing a [`Status`] value from a string.
#[derive(Clone, Debug, Error)]
#[error(
    "unrecognized status: {input}\n(known values: {})",
    Status::variants().join(", "),
)]
pub struct StatusParseError {
    input: String,
}

impl StatusParseError {
    fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// Maps statuses to the material icon names used by the report template.
#[derive(Copy, Clone, Debug, Default)]
pub struct Icon;

impl Icon {
    /// Returns the icon name for a status.
    pub fn for_status(status: Status) -> &'static str {
        match status {
            Status::Pass => "check_circle",
            Status::Fail => "cancel",
            Status::Fatal => "cancel",
            Status::Error => "error",
            Status::Warning => "warning",
            Status::Skip => "redo",
            Status::Info => "info_outline",
            Status::Debug => "low_priority",
        }
    }
}
