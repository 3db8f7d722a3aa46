//! folio-editor-core: Pure Rust block-editor logic without framework
//! dependencies.
//!
//! This crate provides:
//! - `Document` - the block/run content model and its mutation primitives
//! - `CommandRegistry` - the slash-command catalog and its filter
//! - `SlashTrigger` - the `/`-menu state machine driven by edit notifications
//! - `FormattingToolbar` - selection-anchored inline formatting
//! - `MediaTracker` + `upload_media` - split-phase media insertion
//! - `wire`/`markdown` - canonical JSON persistence with forgiving hydration
//! - `Editor` - one session wiring all of the above together
//!
//! Hosts (web views, native shells) own rendering, focus, and caret
//! geometry; everything here is deterministic state any front-end can
//! drive.

pub mod block;
pub mod commands;
pub mod document;
pub mod editor;
pub mod inline;
pub mod keys;
pub mod markdown;
pub mod media;
pub mod slash;
pub mod toolbar;
pub mod types;
pub mod undo;
pub mod wire;

pub use block::{Block, BlockId, BlockKind, make_block_id};
pub use commands::{Command, CommandAction, CommandOutcome, CommandRegistry};
pub use document::{Document, MarkAction};
pub use editor::{Editor, KeyOutcome};
pub use folio_common::{BlobStore, MediaKind, UploadError};
pub use inline::{InlineRun, Mark, MarkKind, MarkSet};
pub use keys::{Key, Modifiers};
pub use markdown::{from_markdown, to_markdown};
pub use media::{MediaTracker, PendingMedia, insert_from_url, upload_media};
pub use slash::{SlashKeyResult, SlashState, SlashTrigger};
pub use smol_str::SmolStr;
pub use toolbar::FormattingToolbar;
pub use types::{DocRange, Rect, TextPosition};
pub use undo::{UndoManager, UndoStack};
pub use wire::{WIRE_VERSION, deserialize, serialize};
