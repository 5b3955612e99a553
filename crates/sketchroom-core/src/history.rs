//! Snapshot-based undo/redo.

use crate::canvas::Document;
use std::collections::VecDeque;

/// Undo/redo history over whole-document snapshots.
///
/// Snapshots are [`Document`]s, which share their element storage, so keeping
/// one per step costs a reference count rather than a deep copy.
#[derive(Debug, Clone)]
pub struct History {
    /// States before the present, oldest first.
    past: Vec<Document>,
    /// The state being displayed and edited.
    present: Document,
    /// Undone states, nearest first.
    future: VecDeque<Document>,
    /// Maximum number of past states to keep (None = unbounded).
    limit: Option<usize>,
}

impl Default for History {
    fn default() -> Self {
        Self::new(Document::new())
    }
}

impl History {
    /// Create a history whose present is `initial`.
    pub fn new(initial: Document) -> Self {
        Self {
            past: Vec::new(),
            present: initial,
            future: VecDeque::new(),
            limit: None,
        }
    }

    /// Create a history that keeps at most `limit` undo steps.
    pub fn with_limit(initial: Document, limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::new(initial)
        }
    }

    /// The current document.
    pub fn present(&self) -> &Document {
        &self.present
    }

    /// Record a new state.
    ///
    /// With `coalesce`, the present is overwritten in place, which is how the
    /// intermediate samples of one drag collapse into a single undo step.
    /// Otherwise the present moves onto the past and the redo branch is
    /// discarded.
    pub fn push(&mut self, document: Document, coalesce: bool) {
        if coalesce {
            self.present = document;
            return;
        }

        let previous = std::mem::replace(&mut self.present, document);
        self.past.push(previous);
        self.future.clear();

        if let Some(limit) = self.limit {
            if self.past.len() > limit {
                let excess = self.past.len() - limit;
                self.past.drain(..excess);
            }
        }
    }

    /// Step back one state. Returns false if there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.past.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.present, previous);
        self.future.push_front(current);
        true
    }

    /// Step forward one undone state. Returns false if there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.future.pop_front() else {
            return false;
        };
        let current = std::mem::replace(&mut self.present, next);
        self.past.push(current);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Number of undo steps available.
    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    /// Number of redo steps available.
    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    /// Swap the present for a state that did not originate locally.
    ///
    /// Past and future are left alone: a remote change is not an undoable
    /// local action.
    pub fn replace_present(&mut self, document: Document) {
        self.present = document;
    }

    /// Start over from `document` with no undo or redo steps.
    pub fn reset(&mut self, document: Document) {
        self.past.clear();
        self.future.clear();
        self.present = document;
    }
}
