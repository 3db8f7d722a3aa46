//! Transient pointer types: positions, ranges, and overlay geometry.
//!
//! These are recomputed on every keystroke or mouse event and never
//! persisted. A position addresses a char offset inside a block; a range
//! spans two positions that may sit in different blocks.

use crate::block::BlockId;

/// A cursor position: block id plus char offset into the block's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPosition {
    pub block: BlockId,
    pub offset: usize,
}

impl TextPosition {
    pub fn new(block: BlockId, offset: usize) -> Self {
        Self { block, offset }
    }

    /// Position at the start of a block.
    pub fn block_start(block: BlockId) -> Self {
        Self { block, offset: 0 }
    }
}

/// A span between two positions.
///
/// The anchor is where the selection started, the head is where the
/// cursor is now; they may be in any document order. Collapsed ranges
/// (anchor == head) are cursor positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocRange {
    pub anchor: TextPosition,
    pub head: TextPosition,
}

impl DocRange {
    pub fn new(anchor: TextPosition, head: TextPosition) -> Self {
        Self { anchor, head }
    }

    /// A collapsed range (cursor only).
    pub fn caret(pos: TextPosition) -> Self {
        Self {
            anchor: pos.clone(),
            head: pos,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }
}

/// An anchor rectangle for positioned overlays (slash menu, floating
/// toolbar). Computed by the host from the live selection; the editor
/// only stores and hands it back.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The point an overlay anchored below this rect should attach to.
    pub fn bottom_left(&self) -> (f64, f64) {
        (self.x, self.y + self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::make_block_id;

    #[test]
    fn test_caret_is_collapsed() {
        let pos = TextPosition::new(make_block_id(0), 3);
        let range = DocRange::caret(pos.clone());
        assert!(range.is_collapsed());
        assert_eq!(range.anchor, pos);
    }

    #[test]
    fn test_span_not_collapsed() {
        let a = TextPosition::new(make_block_id(0), 1);
        let b = TextPosition::new(make_block_id(1), 0);
        assert!(!DocRange::new(a, b).is_collapsed());
    }

    #[test]
    fn test_rect_bottom_left() {
        let rect = Rect::new(10.0, 20.0, 100.0, 16.0);
        assert_eq!(rect.bottom_left(), (10.0, 36.0));
    }
}
