// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Merging of previously rendered entries with freshly collected ones.

use crate::store::OrderedStore;
use tracing::debug;

/// Places entries read back from an existing report ahead of new ones.
///
/// The merge is append-only: entries sharing a key with a fresh entry are kept
/// as they are. The parsed entries are spliced into the head of the store, so
/// that the store itself holds the complete history from then on and later
/// flushes do not have to read the old report again.
#[derive(Copy, Clone, Debug, Default)]
pub struct AppendMerger;

impl AppendMerger {
    /// Merges `parsed` ahead of the contents of `fresh`, returning the full
    /// sequence to render.
    pub fn merge<T: Clone>(parsed: Vec<T>, fresh: &OrderedStore<T>) -> Vec<T> {
        if parsed.is_empty() {
            return fresh.snapshot();
        }

        let parsed_len = parsed.len();
        let merged = fresh.prepend_and_snapshot(parsed);
        debug!(
            "merged {parsed_len} parsed entries ahead of {} fresh entries",
            merged.len() - parsed_len,
        );
        merged
    }
}
