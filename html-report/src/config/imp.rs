// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::ConfigParseError;
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, File, FileFormat, builder::DefaultState};
use indexmap::IndexMap;
use serde::Deserialize;
use std::{collections::BTreeSet, fmt};
use tracing::warn;

/// Settings that control how and where a report is rendered.
///
/// A flush takes a copy of this configuration when it starts, so changes made
/// while a flush is running apply to the next one.
#[derive(Clone, Debug)]
pub struct ReporterConfig {
    file_path: Option<Utf8PathBuf>,
    append_existing: bool,
    document_title: String,
    report_name: String,
    theme: Theme,
    encoding: String,
    timestamp_format: String,
    resource_dir_name: String,
}

impl ReporterConfig {
    /// The default config, embedded in this crate.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../../default-config.toml");

    /// Loads the default configuration, with `file` layered on top if given.
    ///
    /// Unknown keys are logged and otherwise ignored.
    pub fn from_sources(file: Option<&Utf8Path>) -> Result<Self, ConfigParseError> {
        let mut builder = Self::make_default_config();
        if let Some(file) = file {
            builder = builder.add_source(File::new(file.as_str(), FileFormat::Toml));
        }

        let config_file = file.map(ToOwned::to_owned);
        let config = builder
            .build()
            .map_err(|err| ConfigParseError::new(config_file.clone(), err))?;

        let mut unknown = BTreeSet::new();
        let deserialized: ReporterConfigDeserialize =
            serde_ignored::deserialize(config, |path: serde_ignored::Path| {
                unknown.insert(path.to_string());
            })
            .map_err(|err| ConfigParseError::new(config_file.clone(), err))?;

        if !unknown.is_empty() {
            let source = config_file
                .as_deref()
                .map_or("default config", Utf8Path::as_str);
            let keys: Vec<_> = unknown.into_iter().collect();
            warn!(
                "in {source}, ignoring unknown configuration keys: {}",
                keys.join(", ")
            );
        }

        Ok(deserialized.report.into())
    }

    /// Returns the embedded default configuration.
    pub fn default_config() -> Self {
        Self::from_sources(None).expect("default config is always valid")
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    /// The path the report is written to, if configured.
    pub fn file_path(&self) -> Option<&Utf8Path> {
        self.file_path.as_deref()
    }

    /// Returns true if existing reports are read back and merged.
    pub fn append_existing(&self) -> bool {
        self.append_existing
    }

    /// The document title.
    pub fn document_title(&self) -> &str {
        &self.document_title
    }

    /// The report heading.
    pub fn report_name(&self) -> &str {
        &self.report_name
    }

    /// The visual theme.
    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// The charset declared in the report.
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// The strftime-style format for timestamps.
    pub fn timestamp_format(&self) -> &str {
        &self.timestamp_format
    }

    /// The name of the resource directory next to the report.
    pub fn resource_dir_name(&self) -> &str {
        &self.resource_dir_name
    }

    /// Sets the path the report is written to.
    pub fn set_file_path(&mut self, file_path: impl Into<Utf8PathBuf>) -> &mut Self {
        self.file_path = Some(file_path.into());
        self
    }

    /// Clears the report path.
    pub fn clear_file_path(&mut self) -> &mut Self {
        self.file_path = None;
        self
    }

    /// Enables or disables append mode.
    pub fn set_append_existing(&mut self, append_existing: bool) -> &mut Self {
        self.append_existing = append_existing;
        self
    }

    /// Sets the document title.
    pub fn set_document_title(&mut self, document_title: impl Into<String>) -> &mut Self {
        self.document_title = document_title.into();
        self
    }

    /// Sets the report heading.
    pub fn set_report_name(&mut self, report_name: impl Into<String>) -> &mut Self {
        self.report_name = report_name.into();
        self
    }

    /// Sets the visual theme.
    pub fn set_theme(&mut self, theme: Theme) -> &mut Self {
        self.theme = theme;
        self
    }

    /// Sets the declared charset.
    pub fn set_encoding(&mut self, encoding: impl Into<String>) -> &mut Self {
        self.encoding = encoding.into();
        self
    }

    /// Sets the timestamp format.
    pub fn set_timestamp_format(&mut self, timestamp_format: impl Into<String>) -> &mut Self {
        self.timestamp_format = timestamp_format.into();
        self
    }

    /// Sets the name of the resource directory.
    pub fn set_resource_dir_name(&mut self, resource_dir_name: impl Into<String>) -> &mut Self {
        self.resource_dir_name = resource_dir_name.into();
        self
    }

    /// Returns the configuration as string keys and values, in the order they
    /// appear in the default config.
    ///
    /// `file-path` is omitted when unset.
    pub fn to_map(&self) -> IndexMap<String, String> {
        let mut map = IndexMap::new();
        if let Some(file_path) = &self.file_path {
            map.insert("file-path".to_owned(), file_path.to_string());
        }
        map.insert(
            "append-existing".to_owned(),
            self.append_existing.to_string(),
        );
        map.insert("document-title".to_owned(), self.document_title.clone());
        map.insert("report-name".to_owned(), self.report_name.clone());
        map.insert("theme".to_owned(), self.theme.to_string());
        map.insert("encoding".to_owned(), self.encoding.clone());
        map.insert("timestamp-format".to_owned(), self.timestamp_format.clone());
        map.insert(
            "resource-dir-name".to_owned(),
            self.resource_dir_name.clone(),
        );
        map
    }
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

/// The visual theme of a report.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    /// Light background.
    Standard,

    /// Dark background.
    Dark,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Standard => write!(f, "standard"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ReporterConfigDeserialize {
    report: ReportTableDeserialize,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ReportTableDeserialize {
    #[serde(default)]
    file_path: Option<Utf8PathBuf>,
    append_existing: bool,
    document_title: String,
    report_name: String,
    theme: Theme,
    encoding: String,
    timestamp_format: String,
    resource_dir_name: String,
}

impl From<ReportTableDeserialize> for ReporterConfig {
    fn from(table: ReportTableDeserialize) -> Self {
        Self {
            file_path: table.file_path,
            append_existing: table.append_existing,
            document_title: table.document_title,
            report_name: table.report_name,
            theme: table.theme,
            encoding: table.encoding,
            timestamp_format: table.timestamp_format,
            resource_dir_name: table.resource_dir_name,
        }
    }
}
