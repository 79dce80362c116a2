//! Undo/redo history over serialized snapshots.
//!
//! The manager stores opaque snapshot strings; it never interprets
//! them. Recording at a cursor that is not at the end truncates the
//! redo branch. The capacity cap evicts the oldest entry and shifts
//! the cursor down with it, so the cursor always addresses the same
//! snapshot it did before eviction.

use crate::config::EngineConfig;

/// Bounded snapshot list with a cursor.
#[derive(Debug)]
pub struct HistoryManager {
    entries: Vec<String>,
    // None only while `entries` is empty.
    cursor: Option<usize>,
    limit: usize,
}

impl HistoryManager {
    /// An empty history retaining at most `limit` snapshots.
    #[must_use]
    pub const fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
            limit,
        }
    }

    /// An empty history sized from the engine configuration.
    #[must_use]
    pub const fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.history_limit)
    }

    /// Number of retained snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no snapshot is retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The cursor position, when any snapshot is retained.
    #[must_use]
    pub const fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// The snapshot at the cursor.
    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.cursor.map(|cursor| self.entries[cursor].as_str())
    }

    /// Whether a step backward exists.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|cursor| cursor > 0)
    }

    /// Whether a step forward exists.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor
            .is_some_and(|cursor| cursor + 1 < self.entries.len())
    }

    /// Record a snapshot at the cursor.
    ///
    /// Returns `false` without mutating when the snapshot is identical
    /// to the entry at the cursor. Otherwise truncates any redo branch,
    /// appends, advances the cursor, and evicts the oldest entry when
    /// over the cap.
    pub fn record(&mut self, serialized: String) -> bool {
        if let Some(cursor) = self.cursor {
            if self.entries[cursor] == serialized {
                return false;
            }
            self.entries.truncate(cursor + 1);
        }
        self.entries.push(serialized);
        let mut cursor = self.cursor.map_or(0, |cursor| cursor + 1);
        if self.entries.len() > self.limit {
            self.entries.remove(0);
            cursor -= 1;
        }
        self.cursor = Some(cursor);
        true
    }

    /// Step the cursor backward, returning the snapshot to restore.
    ///
    /// `None` at the boundary; the cursor never moves past either end.
    pub fn undo(&mut self) -> Option<String> {
        let cursor = self.cursor.filter(|&cursor| cursor > 0)?;
        self.cursor = Some(cursor - 1);
        Some(self.entries[cursor - 1].clone())
    }

    /// Step the cursor forward, returning the snapshot to restore.
    ///
    /// `None` at the boundary.
    pub fn redo(&mut self) -> Option<String> {
        let cursor = self
            .cursor
            .filter(|&cursor| cursor + 1 < self.entries.len())?;
        self.cursor = Some(cursor + 1);
        Some(self.entries[cursor + 1].clone())
    }

    /// Drop every snapshot and reset the cursor.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }
}
