// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration support for html-report.
//!
//! The configuration is read from TOML: the embedded
//! [default config](ReporterConfig::DEFAULT_CONFIG) first, then an optional
//! user file layered on top. All keys live in a `[report]` table.

mod imp;

pub use imp::*;
