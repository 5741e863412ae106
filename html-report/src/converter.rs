// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reading entries back out of a previously rendered report.
//!
//! Every report carries its entries as JSON inside a
//! `<script type="application/json" id="report-model">` element. Append mode
//! parses that block instead of scraping the markup.

use camino::Utf8Path;
use html_report_model::TestEntry;
use std::io;
use tracing::{debug, warn};

/// The opening tag of the embedded model block.
pub const MODEL_BLOCK_START: &str = r#"<script type="application/json" id="report-model">"#;

/// The closing tag of the embedded model block.
pub const MODEL_BLOCK_END: &str = "</script>";

/// Turns an existing report back into entries.
///
/// Conversion never fails: a report that cannot be read produces an empty
/// result, so that a corrupt history does not prevent a new report from being
/// written.
pub trait ReportConverter: Send + Sync {
    /// Parses the report at `path`, returning its entries in order.
    fn parse(&self, path: &Utf8Path) -> Vec<TestEntry>;
}

/// Reads the model block embedded by the default templates.
#[derive(Copy, Clone, Debug, Default)]
pub struct EmbeddedModelConverter;

impl ReportConverter for EmbeddedModelConverter {
    fn parse(&self, path: &Utf8Path) -> Vec<TestEntry> {
        let html = match std::fs::read_to_string(path) {
            Ok(html) => html,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!("no existing report at {path}, nothing to append to");
                return Vec::new();
            }
            Err(error) => {
                warn!("failed to read existing report at {path}: {error}");
                return Vec::new();
            }
        };

        let Some(model) = extract_model(&html) else {
            warn!("existing report at {path} has no embedded model, ignoring it");
            return Vec::new();
        };

        match serde_json::from_str::<Vec<TestEntry>>(model) {
            Ok(entries) => {
                debug!("read {} entries from existing report at {path}", entries.len());
                entries
            }
            Err(error) => {
                warn!("embedded model in {path} is malformed, ignoring it: {error}");
                Vec::new()
            }
        }
    }
}

/// Returns the JSON between the model block's tags.
///
/// The template writes the model block after the entry markup, so the last
/// start tag in the document is the real one.
pub(crate) fn extract_model(html: &str) -> Option<&str> {
    let start = html.rfind(MODEL_BLOCK_START)? + MODEL_BLOCK_START.len();
    let len = html[start..].find(MODEL_BLOCK_END)?;
    Some(html[start..start + len].trim())
}
