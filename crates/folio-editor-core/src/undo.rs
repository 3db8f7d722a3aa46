//! Undo/redo management for document edits.
//!
//! Provides:
//! - `UndoManager` trait for abstracting undo implementations
//! - `UndoStack` - snapshot-based history over a `Document`
//!
//! Edits here are structural (block splits, kind conversions, mark
//! sweeps), so history records whole-document snapshots rather than
//! character deltas. Documents are small - a post tops out at a few
//! hundred blocks - and snapshots make every mutation invertible for
//! free, including ones added later.

use crate::document::Document;

/// Trait for managing undo/redo over a document.
///
/// Implementations must actually perform the undo/redo, not just track
/// state. For local editing, use `UndoStack`.
pub trait UndoManager {
    /// Check if undo is available.
    fn can_undo(&self) -> bool;

    /// Check if redo is available.
    fn can_redo(&self) -> bool;

    /// Restore the previous snapshot. Returns true if one existed.
    fn undo(&mut self, doc: &mut Document) -> bool;

    /// Re-apply an undone snapshot. Returns true if one existed.
    fn redo(&mut self, doc: &mut Document) -> bool;

    /// Clear all undo/redo history.
    fn clear_history(&mut self);
}

/// Snapshot-based undo history.
///
/// Callers record a checkpoint of the document state *before* each
/// committed mutation; `undo` walks back through those checkpoints.
#[derive(Debug, Clone)]
pub struct UndoStack {
    undo_stack: Vec<Document>,
    redo_stack: Vec<Document>,
    max_steps: usize,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(100)
    }
}

impl UndoStack {
    pub fn new(max_steps: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_steps,
        }
    }

    /// Record the pre-mutation state. Clears the redo stack: a new edit
    /// forks history and the undone branch is gone.
    pub fn checkpoint(&mut self, doc: &Document) {
        self.redo_stack.clear();
        self.undo_stack.push(doc.clone());
        while self.undo_stack.len() > self.max_steps {
            self.undo_stack.remove(0);
        }
    }
}

impl UndoManager for UndoStack {
    fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    fn undo(&mut self, doc: &mut Document) -> bool {
        let Some(snapshot) = self.undo_stack.pop() else {
            return false;
        };
        self.redo_stack.push(std::mem::replace(doc, snapshot));
        true
    }

    fn redo(&mut self, doc: &mut Document) -> bool {
        let Some(snapshot) = self.redo_stack.pop() else {
            return false;
        };
        self.undo_stack.push(std::mem::replace(doc, snapshot));
        true
    }

    fn clear_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
