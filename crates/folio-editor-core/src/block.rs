//! Block-level content model: the typed units a document is made of.
//!
//! `BlockKind` is a closed tagged union so the catalog stays exhaustively
//! matchable - adding a kind is a compile-visible change everywhere it is
//! rendered, serialized, or commanded.

use smol_str::{SmolStr, format_smolstr};

use crate::inline::{InlineRun, normalize_runs, runs_text};

/// Stable identifier for a block, assigned at creation.
///
/// Identity survives edits and reordering; it does NOT survive
/// serialization (ids are re-assigned on hydration).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockId(SmolStr);

impl BlockId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generate a block id from a per-document monotonic counter.
pub fn make_block_id(counter: u64) -> BlockId {
    BlockId(format_smolstr!("b-{}", counter))
}

/// Heading depth, 1 through 3.
pub type HeadingLevel = u8;

/// The closed catalog of block kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    Heading { level: HeadingLevel },
    BulletList,
    OrderedList,
    TodoList { checked: bool },
    Quote,
    Code { language: Option<SmolStr> },
    Image { src: SmolStr, alt: SmolStr },
    Video { src: SmolStr },
    Table { rows: u32, cols: u32 },
    Divider,
    Callout,
}

impl BlockKind {
    /// Whether this kind carries inline text runs.
    ///
    /// Media, tables, and dividers are atomic: their payload lives in the
    /// kind's attributes, not in runs.
    pub fn is_textual(&self) -> bool {
        !matches!(
            self,
            Self::Image { .. } | Self::Video { .. } | Self::Table { .. } | Self::Divider
        )
    }
}

/// One structural unit of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub id: BlockId,
    pub kind: BlockKind,
    /// Normalized run collection; empty for atomic kinds and empty blocks.
    pub runs: Vec<InlineRun>,
}

impl Block {
    /// Create a block, normalizing its runs.
    pub fn new(id: BlockId, kind: BlockKind, mut runs: Vec<InlineRun>) -> Self {
        normalize_runs(&mut runs);
        if !kind.is_textual() {
            runs.clear();
        }
        Self { id, kind, runs }
    }

    /// An empty paragraph - the unit the never-empty invariant restores.
    pub fn empty_paragraph(id: BlockId) -> Self {
        Self {
            id,
            kind: BlockKind::Paragraph,
            runs: Vec::new(),
        }
    }

    /// Concatenated plain text of this block's runs.
    pub fn plain_text(&self) -> String {
        runs_text(&self.runs)
    }

    /// Length of the block's text in chars.
    pub fn len_chars(&self) -> usize {
        self.runs.iter().map(|r| r.len_chars()).sum()
    }

    /// True for a textual block with no content.
    pub fn is_empty_text(&self) -> bool {
        self.kind.is_textual() && self.runs.is_empty()
    }
}
