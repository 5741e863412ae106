// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static resources that a rendered report loads from a directory next to it.

use crate::errors::{FlushError, ResourceNotFound};
use camino::Utf8Path;
use include_dir::{Dir, include_dir};
use std::fmt;
use tracing::{debug, warn};

static RESOURCE_DIR: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/resources");

/// The resources a report depends on.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ResourceKind {
    /// Layout stylesheet.
    Stylesheet,

    /// Report-specific stylesheet.
    CoreStylesheet,

    /// Report script (filters, collapsible entries).
    Script,

    /// Icon font stylesheet.
    IconStylesheet,
}

impl ResourceKind {
    /// Every resource that gets staged, in staging order.
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Stylesheet,
        ResourceKind::CoreStylesheet,
        ResourceKind::Script,
        ResourceKind::IconStylesheet,
    ];

    /// The path of this resource inside the bundle.
    pub fn bundle_path(self) -> &'static str {
        match self {
            ResourceKind::Stylesheet => "css.css",
            ResourceKind::CoreStylesheet => "extent.css",
            ResourceKind::Script => "extent.js",
            ResourceKind::IconStylesheet => "icon.css",
        }
    }

    /// The file name this resource is staged under.
    pub fn file_name(self) -> &'static str {
        self.bundle_path()
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Stylesheet => write!(f, "stylesheet"),
            ResourceKind::CoreStylesheet => write!(f, "core stylesheet"),
            ResourceKind::Script => write!(f, "script"),
            ResourceKind::IconStylesheet => write!(f, "icon stylesheet"),
        }
    }
}

/// A source of resource contents, looked up by bundle path.
pub trait ResourceBundle: Send + Sync {
    /// Returns the contents of the resource at `bundle_path`, if present.
    fn get(&self, bundle_path: &str) -> Option<&[u8]>;
}

/// The resources compiled into this crate.
#[derive(Copy, Clone, Debug, Default)]
pub struct EmbeddedResources;

impl ResourceBundle for EmbeddedResources {
    fn get(&self, bundle_path: &str) -> Option<&[u8]> {
        RESOURCE_DIR.get_file(bundle_path).map(|file| file.contents())
    }
}

/// What happened while staging a resource directory.
#[derive(Debug)]
pub(crate) enum StageOutcome {
    /// The directory already existed, so nothing was copied.
    AlreadyPresent,

    /// The directory was created.
    Staged {
        copied: usize,
        missing: Vec<ResourceNotFound>,
    },
}

/// Creates `dir` and copies every manifest entry into it, unless `dir` already
/// exists.
///
/// Entries missing from the bundle are logged and skipped.
pub(crate) fn stage_resources(
    bundle: &dyn ResourceBundle,
    dir: &Utf8Path,
) -> Result<StageOutcome, FlushError> {
    if dir.is_dir() {
        debug!("resource directory {dir} already exists, skipping staging");
        return Ok(StageOutcome::AlreadyPresent);
    }

    std::fs::create_dir_all(dir).map_err(|error| FlushError::StageDirCreate {
        dir: dir.to_owned(),
        error,
    })?;

    let mut copied = 0;
    let mut missing = Vec::new();
    for kind in ResourceKind::ALL {
        let Some(contents) = bundle.get(kind.bundle_path()) else {
            let error = ResourceNotFound::new(kind);
            warn!("{error}, skipping");
            missing.push(error);
            continue;
        };

        let file = dir.join(kind.file_name());
        std::fs::write(&file, contents).map_err(|error| FlushError::StageWrite { file, error })?;
        copied += 1;
    }

    debug!("staged {copied} resources into {dir}");
    Ok(StageOutcome::Staged { copied, missing })
}
