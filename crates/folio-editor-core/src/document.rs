//! The content model store: an ordered block sequence with mutation
//! primitives.
//!
//! Every mutation leaves the document satisfying the never-empty
//! invariant: a document with no blocks is represented as a single empty
//! paragraph. Mutations are synchronous and single-writer; the document
//! is owned by exactly one editor instance per session.
//!
//! Unknown block ids are caller bugs, not runtime failures. Primitives
//! log at error level and no-op so a release build degrades gracefully;
//! the returned `bool`/`Option` tells the caller it happened.

use smol_str::SmolStr;
use tracing::error;

use crate::block::{Block, BlockId, BlockKind, make_block_id};
use crate::inline::{
    InlineRun, Mark, MarkKind, MarkSet, chars_to_runs, normalize_runs, runs_to_chars,
};
use crate::types::DocRange;

/// How `apply_mark_to_range` treats the mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkAction {
    Add,
    Remove,
    /// If any character in the range lacks the mark, add it to the whole
    /// range; otherwise remove it from the whole range.
    Toggle,
}

/// An ordered sequence of blocks. The editing session's single source of
/// truth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    blocks: Vec<Block>,
    next_id: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// A new document: one empty paragraph.
    pub fn new() -> Self {
        let mut doc = Self {
            blocks: Vec::new(),
            next_id: 0,
        };
        doc.normalize();
        doc
    }

    /// Build a document from `(kind, runs)` pairs, assigning fresh ids.
    ///
    /// Used by the serialization bridge; an empty input normalizes to the
    /// single-empty-paragraph document.
    pub fn from_parts(parts: Vec<(BlockKind, Vec<InlineRun>)>) -> Self {
        let mut doc = Self {
            blocks: Vec::new(),
            next_id: 0,
        };
        for (kind, runs) in parts {
            let id = doc.alloc_id();
            doc.blocks.push(Block::new(id, kind, runs));
        }
        doc.normalize();
        doc
    }

    fn alloc_id(&mut self) -> BlockId {
        let id = make_block_id(self.next_id);
        self.next_id += 1;
        id
    }

    /// Restore the never-empty invariant.
    fn normalize(&mut self) {
        if self.blocks.is_empty() {
            let id = self.alloc_id();
            self.blocks.push(Block::empty_paragraph(id));
        }
    }

    // === Read access ===

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false: the never-empty invariant holds a paragraph here.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| &b.id == id)
    }

    pub fn block_at(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn index_of(&self, id: &BlockId) -> Option<usize> {
        self.blocks.iter().position(|b| &b.id == id)
    }

    /// The id of the first block.
    pub fn first_id(&self) -> BlockId {
        self.blocks[0].id.clone()
    }

    // === Mutation primitives ===

    /// Insert a new block after the anchor. Returns the new block's id,
    /// or `None` (document unchanged) if the anchor does not exist.
    pub fn insert_block_after(
        &mut self,
        anchor: &BlockId,
        kind: BlockKind,
        runs: Vec<InlineRun>,
    ) -> Option<BlockId> {
        let Some(index) = self.index_of(anchor) else {
            error!(block = %anchor, "insert_block_after: unknown anchor block");
            return None;
        };
        let id = self.alloc_id();
        self.blocks
            .insert(index + 1, Block::new(id.clone(), kind, runs));
        Some(id)
    }

    /// Replace a block's kind and runs, keeping its id. No-op (returns
    /// false) if the id is unknown.
    pub fn replace_block(&mut self, id: &BlockId, kind: BlockKind, runs: Vec<InlineRun>) -> bool {
        let Some(index) = self.index_of(id) else {
            error!(block = %id, "replace_block: unknown block");
            return false;
        };
        self.blocks[index] = Block::new(id.clone(), kind, runs);
        true
    }

    /// Remove a block. The invariant re-seeds an empty paragraph when the
    /// last block goes.
    pub fn remove_block(&mut self, id: &BlockId) -> bool {
        let Some(index) = self.index_of(id) else {
            error!(block = %id, "remove_block: unknown block");
            return false;
        };
        self.blocks.remove(index);
        self.normalize();
        true
    }

    /// Move a block to `to_index`, clamped to the valid range. No-op if
    /// the id is unknown.
    pub fn move_block(&mut self, id: &BlockId, to_index: usize) -> bool {
        let Some(from) = self.index_of(id) else {
            error!(block = %id, "move_block: unknown block");
            return false;
        };
        let to = to_index.min(self.blocks.len() - 1);
        let block = self.blocks.remove(from);
        self.blocks.insert(to, block);
        true
    }

    /// Replace the plain text of a block's runs, preserving marks for the
    /// unchanged prefix and suffix (best effort).
    pub fn set_inline_text(&mut self, id: &BlockId, new_text: &str) -> bool {
        let Some(index) = self.index_of(id) else {
            error!(block = %id, "set_inline_text: unknown block");
            return false;
        };
        if !self.blocks[index].kind.is_textual() {
            error!(block = %id, "set_inline_text: block kind carries no text");
            return false;
        }

        let old = runs_to_chars(&self.blocks[index].runs);
        let new_chars: Vec<char> = new_text.chars().collect();

        // Common prefix, then common suffix over the remainder.
        let prefix = old
            .iter()
            .zip(new_chars.iter())
            .take_while(|((a, _), b)| a == *b)
            .count();
        let max_suffix = old.len().min(new_chars.len()) - prefix;
        let suffix = (0..max_suffix)
            .take_while(|i| old[old.len() - 1 - i].0 == new_chars[new_chars.len() - 1 - i])
            .count();

        // Marks for inserted middle chars: inherit from the char left of
        // the edit, else the char the edit replaced, else nothing.
        let middle_marks = if prefix > 0 {
            old[prefix - 1].1.clone()
        } else if prefix < old.len() - suffix.min(old.len()) {
            old[prefix].1.clone()
        } else {
            MarkSet::new()
        };

        let mut rebuilt: Vec<(char, MarkSet)> = Vec::with_capacity(new_chars.len());
        for (i, ch) in new_chars.iter().enumerate() {
            let marks = if i < prefix {
                old[i].1.clone()
            } else if i >= new_chars.len() - suffix {
                old[old.len() - (new_chars.len() - i)].1.clone()
            } else {
                middle_marks.clone()
            };
            rebuilt.push((*ch, marks));
        }

        self.blocks[index].runs = chars_to_runs(&rebuilt);
        true
    }

    /// Toggle a todo block's checkbox. No-op for other kinds.
    pub fn set_checked(&mut self, id: &BlockId, checked: bool) -> bool {
        let Some(index) = self.index_of(id) else {
            error!(block = %id, "set_checked: unknown block");
            return false;
        };
        match &mut self.blocks[index].kind {
            BlockKind::TodoList { checked: c } => {
                *c = checked;
                true
            }
            _ => false,
        }
    }

    /// Set a code block's language attribute. No-op for other kinds.
    pub fn set_code_language(&mut self, id: &BlockId, language: Option<SmolStr>) -> bool {
        let Some(index) = self.index_of(id) else {
            error!(block = %id, "set_code_language: unknown block");
            return false;
        };
        match &mut self.blocks[index].kind {
            BlockKind::Code { language: l } => {
                *l = language;
                true
            }
            _ => false,
        }
    }

    // === Range operations ===

    /// Order a range's endpoints by document position.
    ///
    /// Returns `((start_index, start_offset), (end_index, end_offset))`,
    /// or `None` if either endpoint's block is gone (stale range).
    pub fn ordered_endpoints(&self, range: &DocRange) -> Option<((usize, usize), (usize, usize))> {
        let a = (self.index_of(&range.anchor.block)?, range.anchor.offset);
        let b = (self.index_of(&range.head.block)?, range.head.offset);
        Some(if a <= b { (a, b) } else { (b, a) })
    }

    /// Apply a mark across a range, splitting runs so the mark boundary
    /// is exact. Atomic blocks inside the range are skipped.
    ///
    /// Returns whether any character's marks actually changed; stale
    /// ranges and spans covering no text leave the document untouched.
    pub fn apply_mark_to_range(&mut self, range: &DocRange, mark: &Mark, action: MarkAction) -> bool {
        let Some(((si, so), (ei, eo))) = self.ordered_endpoints(range) else {
            error!("apply_mark_to_range: range references unknown block");
            return false;
        };

        let effective = match action {
            MarkAction::Add => MarkAction::Add,
            MarkAction::Remove => MarkAction::Remove,
            MarkAction::Toggle => {
                if self.range_fully_marked(mark.kind(), (si, so), (ei, eo)) {
                    MarkAction::Remove
                } else {
                    MarkAction::Add
                }
            }
        };

        let mut changed = false;
        for index in si..=ei {
            if !self.blocks[index].kind.is_textual() {
                continue;
            }
            let len = self.blocks[index].len_chars();
            let lo = if index == si { so.min(len) } else { 0 };
            let hi = if index == ei { eo.min(len) } else { len };
            if lo >= hi {
                continue;
            }

            let mut chars = runs_to_chars(&self.blocks[index].runs);
            for (_, marks) in &mut chars[lo..hi] {
                match effective {
                    MarkAction::Add => marks.insert(mark),
                    MarkAction::Remove => marks.remove(mark.kind()),
                    MarkAction::Toggle => unreachable!("toggle resolved above"),
                }
            }
            let runs = chars_to_runs(&chars);
            if runs != self.blocks[index].runs {
                self.blocks[index].runs = runs;
                changed = true;
            }
        }
        changed
    }

    /// Check whether every character in the span carries a mark of the
    /// given kind. Empty spans count as fully marked.
    fn range_fully_marked(
        &self,
        kind: MarkKind,
        (si, so): (usize, usize),
        (ei, eo): (usize, usize),
    ) -> bool {
        for index in si..=ei {
            let block = &self.blocks[index];
            if !block.kind.is_textual() {
                continue;
            }
            let len = block.len_chars();
            let lo = if index == si { so.min(len) } else { 0 };
            let hi = if index == ei { eo.min(len) } else { len };
            if lo >= hi {
                continue;
            }
            let chars = runs_to_chars(&block.runs);
            if chars[lo..hi].iter().any(|(_, marks)| !marks.has(kind)) {
                return false;
            }
        }
        true
    }
}
