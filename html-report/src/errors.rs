// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by html-report.

use crate::resources::ResourceKind;
use camino::Utf8PathBuf;
use config::ConfigError;
use std::{error::Error, fmt};
use thiserror::Error;

/// An error that occurred while loading the reporter configuration.
#[derive(Debug, Error)]
#[error(
    "failed to parse html-report config{}",
    .config_file.as_ref().map(|file| format!(" at `{file}`")).unwrap_or_default()
)]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Option<Utf8PathBuf>,
    #[source]
    err: ConfigError,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: Option<Utf8PathBuf>, err: ConfigError) -> Self {
        Self { config_file, err }
    }

    /// The config file that failed to parse, or `None` for the embedded defaults.
    pub fn config_file(&self) -> Option<&Utf8PathBuf> {
        self.config_file.as_ref()
    }
}

/// An index was not valid for the store it was used with.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("index {index} is out of range for a store of length {len}")]
pub struct OutOfRange {
    /// The index that was requested.
    pub index: usize,

    /// The length of the store at the time of the request.
    pub len: usize,
}

/// The template pipeline failed to produce output.
#[derive(Debug, Error)]
#[error("failed to render template `{template}`")]
pub struct TemplateError {
    template: String,
    #[source]
    source: Box<dyn Error + Send + Sync>,
}

impl TemplateError {
    /// Creates a new `TemplateError` for the named template.
    pub fn new(
        template: impl Into<String>,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self {
            template: template.into(),
            source: source.into(),
        }
    }

    /// The name of the template that failed.
    pub fn template(&self) -> &str {
        &self.template
    }
}

/// A resource listed in the manifest is missing from the bundle.
#[derive(Clone, Debug, Error)]
#[error("resource {kind} not found in bundle at `{bundle_path}`")]
pub struct ResourceNotFound {
    kind: ResourceKind,
    bundle_path: &'static str,
}

impl ResourceNotFound {
    pub(crate) fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            bundle_path: kind.bundle_path(),
        }
    }

    /// The kind of resource that was missing.
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }
}

/// The reason a flush did not produce an artifact.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FlushError {
    /// No destination path was configured.
    #[error("no destination path configured (set `file-path`)")]
    MissingDestination,

    /// The template pipeline failed.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The resource directory next to the destination could not be created.
    #[error("error creating resource directory {dir}")]
    StageDirCreate {
        /// The directory.
        dir: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },

    /// A resource could not be copied into the resource directory.
    #[error("error writing resource {file}")]
    StageWrite {
        /// The file being written.
        file: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },

    /// The report could not be written.
    #[error("error writing report to {path}")]
    Write {
        /// The destination path.
        path: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },
}

/// Displays an error along with its chain of sources on one line.
pub struct DisplayErrorChain<E>(E);

impl<E: Error> DisplayErrorChain<E> {
    /// Wraps an error for display.
    pub fn new(error: E) -> Self {
        Self(error)
    }
}

impl<E: Error> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(error) = source {
            write!(f, ": {error}")?;
            source = error.source();
        }
        Ok(())
    }
}
