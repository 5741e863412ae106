// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Template rendering for reports.
//!
//! The templates are embedded at compile time to keep the library
//! self-contained. Anything implementing [`TemplatePipeline`] can be used in
//! their place.

mod bindings;

pub use bindings::*;

use crate::errors::TemplateError;
use include_dir::{Dir, include_dir};
use minijinja::{AutoEscape, Environment};
use std::sync::LazyLock;
use tracing::warn;

static TEMPLATE_DIR: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/templates");

/// The template rendered on every flush.
pub static INDEX_TEMPLATE: &str = "index.html";

/// Turns bindings into report text.
pub trait TemplatePipeline: Send + Sync {
    /// Renders the named template.
    fn render(&self, template: &str, bindings: &RenderBindings) -> Result<String, TemplateError>;
}

static ENV: LazyLock<Environment<'static>> = LazyLock::new(|| {
    let mut env = Environment::new();

    env.set_auto_escape_callback(|name| {
        let is_html = std::path::Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("html"));
        if is_html {
            AutoEscape::Html
        } else {
            AutoEscape::None
        }
    });

    for file in TEMPLATE_DIR.files() {
        let Some(name) = file.path().to_str() else {
            continue;
        };
        let Some(contents) = file.contents_utf8() else {
            warn!("embedded template {name} is not valid UTF-8, skipping");
            continue;
        };
        if let Err(error) = env.add_template(name, contents) {
            warn!("embedded template {name} failed to compile: {error}");
        }
    }

    env
});

/// Renders the templates embedded in this crate with minijinja.
#[derive(Copy, Clone, Debug, Default)]
pub struct EmbeddedTemplates;

impl TemplatePipeline for EmbeddedTemplates {
    fn render(&self, template: &str, bindings: &RenderBindings) -> Result<String, TemplateError> {
        let tpl = ENV
            .get_template(template)
            .map_err(|error| TemplateError::new(template, error))?;
        tpl.render(bindings)
            .map_err(|error| TemplateError::new(template, error))
    }
}
