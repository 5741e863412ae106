// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};

/// A captured resource (typically a screenshot) attached to a test entry.
///
/// The path is kept as an opaque string and never checked against the
/// filesystem. The markup accessors escape it for use inside attribute values.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct Attachment {
    /// Location of the resource relative to the report.
    pub path: String,

    /// An optional caption.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Attachment {
    /// Creates a new attachment pointing at `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: None,
        }
    }

    /// Sets the caption.
    pub fn set_title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = Some(title.into());
        self
    }

    /// The path as used in URLs, with Windows separators normalized to `/`.
    pub fn url_path(&self) -> String {
        self.path.replace('\\', "/")
    }

    /// A thumbnail that opens the full resource in a lightbox.
    pub fn source(&self) -> String {
        let url = escape_attr(&self.url_path());
        format!("<img data-featherlight='{url}' width='10%' src='{url}' data-src='{url}'>")
    }

    /// A compact icon link that opens the resource in a lightbox.
    pub fn source_with_icon(&self) -> String {
        format!(
            "<a href='#' data-featherlight='{}'><i class='material-icons'>photo</i></a>",
            escape_attr(&self.path)
        )
    }
}

/// Escapes `s` for a quoted HTML attribute value.
fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
