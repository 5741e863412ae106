// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use camino::Utf8PathBuf;
use html_report::errors::{ConfigParseError, FlushError};
use owo_colors::OwoColorize;
use std::error::Error;
use thiserror::Error;
use tracing::error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

/// Process exit codes used by `html-report`.
#[doc(hidden)]
pub enum HtmlReportExitCode {}

impl HtmlReportExitCode {
    /// The report was written, or there was nothing to write.
    pub const OK: i32 = 0;

    /// A flush was attempted and aborted.
    pub const FLUSH_ABORTED: i32 = 1;

    /// The inputs could not be read.
    pub const INPUT_ERROR: i32 = 2;
}

// The #[error()] strings are placeholders: errors are meant to be printed with
// display_to_stderr, which colorizes them.

/// An error that stops the command.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("failed to read entries from {path}")]
    EntriesRead {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("failed to parse entries from {path}")]
    EntriesParse {
        path: Utf8PathBuf,
        #[source]
        err: serde_json::Error,
    },
    #[error("report flush aborted")]
    FlushAborted {
        #[source]
        err: FlushError,
    },
}

impl ExpectedError {
    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::ConfigParseError { .. }
            | Self::EntriesRead { .. }
            | Self::EntriesParse { .. } => HtmlReportExitCode::INPUT_ERROR,
            Self::FlushAborted { .. } => HtmlReportExitCode::FLUSH_ABORTED,
        }
    }

    /// Displays this error to stderr, along with its chain of causes.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error: Option<&dyn Error> = match self {
            Self::ConfigParseError { err } => {
                error!("{err}");
                err.source()
            }
            Self::EntriesRead { path, err } => {
                error!("failed to read entries from {}", path.style(styles.bold));
                Some(err as &dyn Error)
            }
            Self::EntriesParse { path, err } => {
                error!("failed to parse entries from {}", path.style(styles.bold));
                Some(err as &dyn Error)
            }
            Self::FlushAborted { .. } => {
                // The flusher has already logged the full chain.
                None
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
