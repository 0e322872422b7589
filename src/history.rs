use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Depth of the per-node text history.
pub const TEXT_HISTORY_LIMIT: usize = 10;

/// Bounded undo/redo stacks.
///
/// Used two ways: each node carries a `History<String>` of prior text values
/// (serialized as `undoStack`/`redoStack`), and the canvas-level undo model
/// keeps a `History<Vec<Node>>` of whole-collection snapshots.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredHistory<T>", bound(deserialize = "T: Deserialize<'de>"))]
pub struct History<T> {
    #[serde(rename = "undoStack", default, skip_serializing_if = "VecDeque::is_empty")]
    past: VecDeque<T>,
    #[serde(rename = "redoStack", default, skip_serializing_if = "VecDeque::is_empty")]
    future: VecDeque<T>,
    #[serde(skip, default = "default_max_size")]
    max_size: usize,
}

pub type TextHistory = History<String>;

/// Stacks as found in storage or an import, before the depth limit applies.
#[derive(Deserialize)]
struct StoredHistory<T> {
    #[serde(rename = "undoStack", default = "VecDeque::new")]
    past: VecDeque<T>,
    #[serde(rename = "redoStack", default = "VecDeque::new")]
    future: VecDeque<T>,
}

impl<T> From<StoredHistory<T>> for History<T> {
    fn from(stored: StoredHistory<T>) -> Self {
        let mut history = History {
            past: stored.past,
            future: stored.future,
            max_size: default_max_size(),
        };
        trim(&mut history.past, history.max_size);
        trim(&mut history.future, history.max_size);
        history
    }
}

fn default_max_size() -> usize {
    TEXT_HISTORY_LIMIT
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new(TEXT_HISTORY_LIMIT)
    }
}

impl<T> History<T> {
    pub fn new(max_size: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: VecDeque::new(),
            max_size,
        }
    }

    /// Record a new state. Clears the redo stack.
    pub fn push(&mut self, state: T) {
        self.future.clear();
        self.past.push_back(state);
        trim(&mut self.past, self.max_size);
    }

    /// Undo: move current to future, return previous state.
    pub fn undo(&mut self, current: T) -> Option<T> {
        self.past.pop_back().map(|previous| {
            self.future.push_back(current);
            trim(&mut self.future, self.max_size);
            previous
        })
    }

    /// Redo: move current to past, return next state.
    pub fn redo(&mut self, current: T) -> Option<T> {
        self.future.pop_back().map(|next| {
            self.past.push_back(current);
            trim(&mut self.past, self.max_size);
            next
        })
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.past.len()
    }

    pub fn redo_len(&self) -> usize {
        self.future.len()
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}

// Drops the oldest entries until the stack fits.
fn trim<T>(stack: &mut VecDeque<T>, max_size: usize) {
    while stack.len() > max_size {
        stack.pop_front();
    }
}
