// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Data model for [html-report](https://crates.io/crates/html-report).
//!
//! These types are what test code records into a report, and what a rendered
//! report stores so that it can be read back in append mode.

mod entry;
mod media;
mod status;

pub use entry::*;
pub use media::*;
pub use status::*;
