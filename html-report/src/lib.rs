// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Collects test results from concurrently running tests and renders them into
//! a standalone HTML report.
//!
//! Test threads add [`TestEntry`](html_report_model::TestEntry) values to the
//! [`OrderedStore`](store::OrderedStore) owned by a
//! [`ReportFlusher`](flusher::ReportFlusher). Each call to
//! [`flush`](flusher::ReportFlusher::flush) renders everything collected so far,
//! optionally after merging in the entries of a report written by an earlier
//! run.

pub mod config;
pub mod converter;
pub mod errors;
pub mod flusher;
pub mod merge;
pub mod render;
pub mod resources;
pub mod store;

pub use html_report_model as model;
