// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A thread-safe, insertion-ordered collection of report entities.
//!
//! Test threads append into an [`OrderedStore`] while the flusher reads from
//! it. Every operation acquires the internal lock for its own duration only,
//! so a long render never blocks test threads.
//!
//! Two ways of reading are provided:
//!
//! * [`OrderedStore::snapshot`] copies the whole sequence under a single lock
//!   acquisition. The flusher uses this so that it renders a consistent view.
//! * [`OrderedStore::cursor`] is a live view that re-reads the store on every
//!   step. Removals ahead of the cursor shift later elements towards it, so a
//!   cursor may skip an entity that moved behind it. Use it only where observing
//!   concurrent changes is the point.

use crate::errors::OutOfRange;
use html_report_model::TestEntry;
use std::{
    fmt,
    sync::{Mutex, MutexGuard, PoisonError},
};

/// An entity that can be looked up by a string identifier.
pub trait Keyed {
    /// Returns the identifier of this entity.
    fn key(&self) -> &str;
}

impl Keyed for TestEntry {
    fn key(&self) -> &str {
        self.code_name()
    }
}

/// An append-only, insertion-ordered sequence guarded by a mutex.
///
/// Index `i` refers to the `i`-th entity among those not yet removed; indexes
/// compact after a removal.
pub struct OrderedStore<T> {
    items: Mutex<Vec<T>>,
}

impl<T> OrderedStore<T> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
        }
    }

    // Every critical section leaves the vector in a valid state, so a panic in
    // another thread while holding the lock does not invalidate the data.
    fn lock(&self) -> MutexGuard<'_, Vec<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an entity to the tail.
    pub fn add(&self, item: T) {
        self.lock().push(item);
    }

    /// Returns the number of entities currently in the store.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl<T: Clone> OrderedStore<T> {
    /// Returns the entity at `index`.
    pub fn get(&self, index: usize) -> Result<T, OutOfRange> {
        let items = self.lock();
        items.get(index).cloned().ok_or(OutOfRange {
            index,
            len: items.len(),
        })
    }

    /// Returns the most recently appended entity still present, if any.
    pub fn last(&self) -> Option<T> {
        self.lock().last().cloned()
    }

    /// Copies out the current sequence.
    pub fn snapshot(&self) -> Vec<T> {
        self.lock().clone()
    }

    /// Inserts `items` at the head and returns a snapshot taken under the same
    /// lock acquisition.
    pub fn prepend_and_snapshot(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        let mut guard = self.lock();
        guard.splice(0..0, items);
        guard.clone()
    }

    /// Returns a live cursor over the store, starting at index 0.
    pub fn cursor(&self) -> Cursor<'_, T> {
        Cursor {
            store: self,
            index: 0,
        }
    }
}

impl<T: Keyed> OrderedStore<T> {
    /// Removes the first entity whose key equals `key`.
    ///
    /// Uniqueness of keys is up to the caller: if several entities share `key`,
    /// only the earliest is removed.
    pub fn remove_by_key(&self, key: &str) -> RemovalOutcome<T> {
        let mut items = self.lock();
        let mut visited = Vec::new();
        let position = items.iter().position(|item| {
            visited.push(item.key().to_owned());
            item.key() == key
        });

        let scanned = visited.len();
        match position {
            Some(index) => RemovalOutcome::Found {
                removed: items.remove(index),
                scanned,
                visited,
            },
            None => RemovalOutcome::NotFound { scanned, visited },
        }
    }

    /// Applies `f` to the first entity whose key equals `key`.
    ///
    /// Returns false if no entity matched.
    pub fn update_by_key(&self, key: &str, f: impl FnOnce(&mut T)) -> bool {
        let mut items = self.lock();
        match items.iter_mut().find(|item| item.key() == key) {
            Some(item) => {
                f(item);
                true
            }
            None => false,
        }
    }
}

impl<T> Default for OrderedStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for OrderedStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderedStore")
            .field("items", &*self.lock())
            .finish()
    }
}

/// A live, cursor-based iterator over an [`OrderedStore`].
///
/// Each call to `next` locks the store, checks the current length and returns
/// the entity at the cursor position. It is not a snapshot: see the module
/// documentation.
#[derive(Debug)]
pub struct Cursor<'a, T> {
    store: &'a OrderedStore<T>,
    index: usize,
}

impl<T: Clone> Iterator for Cursor<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let item = self.store.lock().get(self.index).cloned()?;
        self.index += 1;
        Some(item)
    }
}

/// The result of [`OrderedStore::remove_by_key`].
///
/// Besides the removed entity, this carries how far the scan got and which keys
/// it saw along the way. The [`Display`](fmt::Display) output is meant for logs
/// and its format may change.
#[derive(Clone, Debug, PartialEq)]
pub enum RemovalOutcome<T> {
    /// A matching entity was found and removed.
    Found {
        /// The removed entity.
        removed: T,

        /// The number of entities compared, including the match.
        scanned: usize,

        /// The keys compared, in store order.
        visited: Vec<String>,
    },

    /// No entity matched.
    NotFound {
        /// The number of entities compared, which is the whole store.
        scanned: usize,

        /// The keys compared, in store order.
        visited: Vec<String>,
    },
}

impl<T> RemovalOutcome<T> {
    /// Returns true if an entity was removed.
    pub fn is_found(&self) -> bool {
        matches!(self, RemovalOutcome::Found { .. })
    }

    /// Returns the number of entities compared.
    pub fn scanned(&self) -> usize {
        match self {
            RemovalOutcome::Found { scanned, .. } | RemovalOutcome::NotFound { scanned, .. } => {
                *scanned
            }
        }
    }

    /// Consumes the outcome, returning the removed entity if there was one.
    pub fn into_removed(self) -> Option<T> {
        match self {
            RemovalOutcome::Found { removed, .. } => Some(removed),
            RemovalOutcome::NotFound { .. } => None,
        }
    }
}

impl<T> fmt::Display for RemovalOutcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (label, scanned, visited) = match self {
            RemovalOutcome::Found {
                scanned, visited, ..
            } => ("removed", scanned, visited),
            RemovalOutcome::NotFound { scanned, visited } => ("not found", scanned, visited),
        };
        write!(f, "{label} after scanning {scanned}: {}", visited.join(","))
    }
}
