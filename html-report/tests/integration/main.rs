// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for flushing reports to disk.
//!
//! Each test works in its own temporary directory, so they can run in
//! parallel.

mod append;
mod fixtures;
mod flush;
