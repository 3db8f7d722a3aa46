//! The slash-command catalog: a fixed registry of block-insertion
//! commands, plus the filter the menu runs on every keystroke.
//!
//! Commands are static for the process lifetime. Matching is a
//! case-insensitive substring test against the label or the space-joined
//! keywords; result order is declaration order, no relevance scoring.

use tracing::error;

use crate::block::{BlockId, BlockKind};
use crate::document::Document;
use folio_common::MediaKind;

/// What applying a command does to the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandAction {
    /// Replace the anchor block's kind, preserving its inline runs.
    TurnInto(BlockKind),
    /// Insert a fresh block after the anchor, leaving it intact.
    InsertAfter(BlockKind),
    /// Route to the media insertion adapter; no direct mutation.
    InsertMedia(MediaKind),
}

/// A static, registry-defined command descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub label: &'static str,
    pub description: &'static str,
    pub keywords: &'static [&'static str],
    pub action: CommandAction,
}

/// Outcome of applying a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The document was mutated.
    Applied,
    /// The caller must start a media insertion at the anchor block.
    MediaRequested(MediaKind),
    /// The anchor block no longer exists; nothing happened.
    StaleAnchor,
}

/// The process-wide, immutable command catalog.
#[derive(Debug)]
pub struct CommandRegistry {
    commands: Vec<Command>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self {
            commands: default_catalog(),
        }
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All commands in declaration order.
    pub fn all(&self) -> &[Command] {
        &self.commands
    }

    /// Filter the catalog. Empty query returns everything; order is
    /// declaration order among matches. Idempotent.
    pub fn search(&self, query: &str) -> Vec<&Command> {
        if query.is_empty() {
            return self.commands.iter().collect();
        }
        let needle = query.to_lowercase();
        self.commands
            .iter()
            .filter(|cmd| {
                cmd.label.to_lowercase().contains(&needle)
                    || cmd.keywords.join(" ").to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Look up a command by its exact label.
    pub fn get(&self, label: &str) -> Option<&Command> {
        self.commands.iter().find(|cmd| cmd.label == label)
    }

    /// Apply a command at the anchor block.
    pub fn apply(&self, command: &Command, doc: &mut Document, anchor: &BlockId) -> CommandOutcome {
        match &command.action {
            CommandAction::TurnInto(kind) => {
                let Some(block) = doc.block(anchor) else {
                    error!(block = %anchor, command = command.label, "apply: anchor block gone");
                    return CommandOutcome::StaleAnchor;
                };
                let runs = block.runs.clone();
                doc.replace_block(anchor, kind.clone(), runs);
                CommandOutcome::Applied
            }
            CommandAction::InsertAfter(kind) => {
                match doc.insert_block_after(anchor, kind.clone(), Vec::new()) {
                    Some(_) => CommandOutcome::Applied,
                    None => CommandOutcome::StaleAnchor,
                }
            }
            CommandAction::InsertMedia(kind) => CommandOutcome::MediaRequested(*kind),
        }
    }

    /// Apply a command by label.
    ///
    /// An unknown label is a caller bug: loud in development, no-op in
    /// release.
    pub fn apply_by_label(
        &self,
        label: &str,
        doc: &mut Document,
        anchor: &BlockId,
    ) -> CommandOutcome {
        match self.get(label) {
            Some(command) => self.apply(&command.clone(), doc, anchor),
            None => {
                debug_assert!(false, "unknown command label: {label}");
                error!(label, "apply_by_label: unknown command");
                CommandOutcome::StaleAnchor
            }
        }
    }
}

/// The catalog, in menu declaration order.
fn default_catalog() -> Vec<Command> {
    vec![
        Command {
            label: "Text",
            description: "Plain paragraph",
            keywords: &["p", "paragraph", "text"],
            action: CommandAction::TurnInto(BlockKind::Paragraph),
        },
        Command {
            label: "Heading 1",
            description: "Big heading",
            keywords: &["h1", "heading1", "title"],
            action: CommandAction::TurnInto(BlockKind::Heading { level: 1 }),
        },
        Command {
            label: "Heading 2",
            description: "Medium heading",
            keywords: &["h2", "heading2"],
            action: CommandAction::TurnInto(BlockKind::Heading { level: 2 }),
        },
        Command {
            label: "Heading 3",
            description: "Small heading",
            keywords: &["h3", "heading3"],
            action: CommandAction::TurnInto(BlockKind::Heading { level: 3 }),
        },
        Command {
            label: "Bullet List",
            description: "Unordered list",
            keywords: &["ul", "unordered", "bullet", "list"],
            action: CommandAction::TurnInto(BlockKind::BulletList),
        },
        Command {
            label: "Numbered List",
            description: "Ordered list",
            keywords: &["ol", "ordered", "numbered", "list"],
            action: CommandAction::TurnInto(BlockKind::OrderedList),
        },
        Command {
            label: "To-do",
            description: "Task list",
            keywords: &["todo", "task", "checkbox"],
            action: CommandAction::TurnInto(BlockKind::TodoList { checked: false }),
        },
        Command {
            label: "Quote",
            description: "Blockquote",
            keywords: &["quote", "blockquote"],
            action: CommandAction::TurnInto(BlockKind::Quote),
        },
        Command {
            label: "Code",
            description: "Code block",
            keywords: &["code", "codeblock", "snippet"],
            action: CommandAction::TurnInto(BlockKind::Code { language: None }),
        },
        Command {
            label: "Callout",
            description: "Highlighted note",
            keywords: &["callout", "note", "info"],
            action: CommandAction::TurnInto(BlockKind::Callout),
        },
        Command {
            label: "Image",
            description: "Upload or embed an image",
            keywords: &["img", "image", "photo"],
            action: CommandAction::InsertMedia(MediaKind::Image),
        },
        Command {
            label: "Video",
            description: "Upload or embed a video",
            keywords: &["video", "movie"],
            action: CommandAction::InsertMedia(MediaKind::Video),
        },
        Command {
            label: "Table",
            description: "Insert table (3x3)",
            keywords: &["table", "grid"],
            action: CommandAction::InsertAfter(BlockKind::Table { rows: 3, cols: 3 }),
        },
        Command {
            label: "Divider",
            description: "Horizontal rule",
            keywords: &["divider", "hr", "rule"],
            action: CommandAction::InsertAfter(BlockKind::Divider),
        },
    ]
}
