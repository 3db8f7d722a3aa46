//! The editing session: one document plus every interactive collaborator
//! wired together.
//!
//! `Editor` owns the document, caret, selection, command registry, slash
//! trigger, formatting toolbar, media tracker, and undo history, and
//! routes host input through them in a fixed order: the slash menu gets
//! first refusal on keys while it is open, then platform shortcuts, then
//! plain text entry. Hosts feed it characters, keys, caret moves, and
//! selection rectangles; it hands back what (if anything) changed.
//!
//! Every committed mutation records an undo checkpoint and notifies the
//! change listener with the serialized document, so the host can
//! autosave without diffing.

use tracing::{debug, error};

use folio_common::MediaKind;

use crate::block::{BlockId, BlockKind};
use crate::commands::{CommandOutcome, CommandRegistry};
use crate::document::Document;
use crate::inline::{Mark, chars_to_runs, runs_to_chars};
use crate::keys::{Key, Modifiers};
use crate::media::{self, MediaTracker};
use crate::slash::{SlashKeyResult, SlashTrigger};
use crate::toolbar::FormattingToolbar;
use crate::types::{DocRange, Rect, TextPosition};
use crate::undo::{UndoManager, UndoStack};
use crate::wire;

/// What handling a piece of input did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Not ours; the host should apply its default behavior.
    Ignored,
    /// Consumed without mutating the document (menu navigation etc.).
    Handled,
    /// The document was mutated.
    Changed,
    /// The host must start a media pick/upload anchored at this block.
    MediaRequested { anchor: BlockId, kind: MediaKind },
}

/// A complete editing session.
pub struct Editor {
    doc: Document,
    caret: TextPosition,
    selection: Option<DocRange>,
    registry: CommandRegistry,
    slash: SlashTrigger,
    toolbar: FormattingToolbar,
    media: MediaTracker,
    undo: UndoStack,
    on_change: Option<Box<dyn FnMut(&str)>>,
    is_mac: bool,
}

impl Editor {
    pub fn new(is_mac: bool) -> Self {
        let doc = Document::new();
        let caret = TextPosition::block_start(doc.first_id());
        Self {
            doc,
            caret,
            selection: None,
            registry: CommandRegistry::new(),
            slash: SlashTrigger::new(),
            toolbar: FormattingToolbar::new(),
            media: MediaTracker::new(),
            undo: UndoStack::default(),
            on_change: None,
            is_mac,
        }
    }

    /// Replace the session content with persisted input (JSON, Markdown,
    /// or plain text). Resets caret, selection, and history; does not
    /// notify the change listener - loading is not an edit.
    pub fn load(&mut self, input: &str) {
        self.doc = wire::deserialize(input);
        self.caret = TextPosition::block_start(self.doc.first_id());
        self.selection = None;
        self.slash.cancel();
        self.toolbar.selection_changed(None, None);
        self.media = MediaTracker::new();
        self.undo.clear_history();
    }

    /// Register the change listener. Called with the serialized document
    /// after every committed mutation.
    pub fn set_on_change(&mut self, listener: impl FnMut(&str) + 'static) {
        self.on_change = Some(Box::new(listener));
    }

    // === Accessors ===

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn caret(&self) -> &TextPosition {
        &self.caret
    }

    pub fn selection(&self) -> Option<&DocRange> {
        self.selection.as_ref()
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn slash(&self) -> &SlashTrigger {
        &self.slash
    }

    pub fn toolbar(&self) -> &FormattingToolbar {
        &self.toolbar
    }

    pub fn media(&self) -> &MediaTracker {
        &self.media
    }

    /// The canonical serialized form of the current document.
    pub fn serialized(&self) -> String {
        wire::serialize(&self.doc)
    }

    /// Lossy Markdown projection of the current document.
    pub fn export_markdown(&self) -> String {
        crate::markdown::to_markdown(&self.doc)
    }

    fn emit_change(&mut self) {
        if let Some(listener) = self.on_change.as_mut() {
            let serialized = wire::serialize(&self.doc);
            listener(&serialized);
        }
    }

    fn committed(&mut self, before: Document) {
        self.undo.checkpoint(&before);
        self.emit_change();
    }

    // === Caret / selection ===

    /// The host moved the caret (click, arrow keys it handled itself).
    pub fn set_caret(&mut self, pos: TextPosition) {
        self.caret = pos;
        self.selection = None;
        self.toolbar.selection_changed(None, None);
        self.slash.notify_caret_moved(&self.caret);
    }

    /// The host's selection changed. `rect` is the viewport rectangle of
    /// the selected span, used to anchor the formatting toolbar.
    pub fn set_selection(&mut self, selection: Option<DocRange>, rect: Option<Rect>) {
        self.toolbar.selection_changed(selection.as_ref(), rect);
        if let Some(range) = &selection {
            self.caret = range.head.clone();
            self.slash.notify_caret_moved(&self.caret);
        }
        self.selection = selection;
    }

    /// Focus left the editor surface.
    pub fn focus_lost(&mut self) {
        self.slash.notify_focus_lost();
        self.toolbar.selection_changed(None, None);
    }

    /// Record the caret rectangle for the open slash menu.
    pub fn set_slash_menu_anchor(&mut self, rect: Rect) {
        self.slash.set_menu_anchor(rect);
    }

    // === Text entry ===

    /// Insert one character at the caret. Returns false (document
    /// unchanged) when the caret block cannot hold text.
    pub fn insert_char(&mut self, ch: char) -> bool {
        let block_id = self.caret.block.clone();
        let Some(block) = self.doc.block(&block_id) else {
            error!(block = %block_id, "insert_char: caret block gone");
            return false;
        };
        if !block.kind.is_textual() {
            debug!(block = %block_id, "insert_char: caret block holds no text");
            return false;
        }
        let chars: Vec<char> = block.plain_text().chars().collect();
        let offset = self.caret.offset.min(chars.len());
        let prev = if offset == 0 {
            None
        } else {
            chars.get(offset - 1).copied()
        };
        let mut new_text = String::with_capacity(chars.len() + 1);
        new_text.extend(&chars[..offset]);
        new_text.push(ch);
        new_text.extend(&chars[offset..]);

        let before = self.doc.clone();
        if !self.doc.set_inline_text(&block_id, &new_text) {
            return false;
        }
        self.caret = TextPosition::new(block_id.clone(), offset + 1);
        self.slash
            .notify_insert(ch, &TextPosition::new(block_id, offset), prev);
        self.committed(before);
        true
    }

    /// Delete the character before the caret. Returns false at block
    /// start (block merging is the host's default behavior).
    pub fn backspace(&mut self) -> bool {
        let block_id = self.caret.block.clone();
        let Some(block) = self.doc.block(&block_id) else {
            error!(block = %block_id, "backspace: caret block gone");
            return false;
        };
        let chars: Vec<char> = block.plain_text().chars().collect();
        let offset = self.caret.offset.min(chars.len());
        if offset == 0 {
            return false;
        }
        let mut new_text = String::with_capacity(chars.len());
        new_text.extend(&chars[..offset - 1]);
        new_text.extend(&chars[offset..]);

        let before = self.doc.clone();
        if !self.doc.set_inline_text(&block_id, &new_text) {
            return false;
        }
        self.caret = TextPosition::new(block_id.clone(), offset - 1);
        self.slash
            .notify_backspace(&TextPosition::new(block_id, offset - 1));
        self.committed(before);
        true
    }

    /// Split the caret block at the caret: text before stays, text after
    /// moves into a fresh paragraph, caret lands at its start. On a
    /// non-textual block this just opens a paragraph below.
    pub fn split_block(&mut self) -> bool {
        let block_id = self.caret.block.clone();
        let Some(block) = self.doc.block(&block_id) else {
            error!(block = %block_id, "split_block: caret block gone");
            return false;
        };
        let before = self.doc.clone();
        let new_id = if block.kind.is_textual() {
            let chars = runs_to_chars(&block.runs);
            let offset = self.caret.offset.min(chars.len());
            let head = chars_to_runs(&chars[..offset]);
            let tail = chars_to_runs(&chars[offset..]);
            let kind = block.kind.clone();
            self.doc.replace_block(&block_id, kind, head);
            self.doc
                .insert_block_after(&block_id, BlockKind::Paragraph, tail)
        } else {
            self.doc
                .insert_block_after(&block_id, BlockKind::Paragraph, Vec::new())
        };
        let Some(new_id) = new_id else {
            return false;
        };
        self.caret = TextPosition::block_start(new_id);
        self.slash.cancel();
        self.committed(before);
        true
    }

    // === Key routing ===

    /// Route a key press. Order: open slash menu first, then platform
    /// shortcuts, then plain text entry.
    pub fn handle_key(&mut self, key: &Key, mods: Modifiers) -> KeyOutcome {
        if self.slash.is_listening() && mods == Modifiers::NONE {
            let filtered_len = self.slash.filtered(&self.registry).len();
            match self.slash.handle_key(key, filtered_len) {
                SlashKeyResult::Handled => return KeyOutcome::Handled,
                SlashKeyResult::Commit => return self.commit_slash(),
                SlashKeyResult::Cancel => {
                    self.slash.cancel();
                    return KeyOutcome::Handled;
                }
                SlashKeyResult::Ignored => {}
            }
        }

        if mods == Modifiers::primary(self.is_mac)
            && let Key::Character(ch) = key
        {
            match ch.as_str() {
                "b" => return self.shortcut_mark(&Mark::Bold),
                "i" => return self.shortcut_mark(&Mark::Italic),
                "u" => return self.shortcut_mark(&Mark::Underline),
                "z" => {
                    return if self.undo_edit() {
                        KeyOutcome::Changed
                    } else {
                        KeyOutcome::Handled
                    };
                }
                _ => {}
            }
        }
        if mods == Modifiers::primary_shift(self.is_mac)
            && let Key::Character(ch) = key
            && ch.as_str() == "z"
        {
            return if self.redo_edit() {
                KeyOutcome::Changed
            } else {
                KeyOutcome::Handled
            };
        }

        match key {
            Key::Character(text) if mods == Modifiers::NONE || mods == Modifiers::SHIFT => {
                let text = text.clone();
                let mut changed = false;
                for ch in text.chars() {
                    changed |= self.insert_char(ch);
                }
                if changed {
                    KeyOutcome::Changed
                } else {
                    KeyOutcome::Ignored
                }
            }
            Key::Enter if mods == Modifiers::NONE => {
                if self.split_block() {
                    KeyOutcome::Changed
                } else {
                    KeyOutcome::Handled
                }
            }
            Key::Backspace if mods == Modifiers::NONE => {
                if self.backspace() {
                    KeyOutcome::Changed
                } else {
                    KeyOutcome::Ignored
                }
            }
            _ => KeyOutcome::Ignored,
        }
    }

    fn shortcut_mark(&mut self, mark: &Mark) -> KeyOutcome {
        if self.toggle_mark(mark) {
            KeyOutcome::Changed
        } else {
            KeyOutcome::Handled
        }
    }

    /// Commit the highlighted slash command: splice out the `/query`
    /// trigger text, then apply the command at the anchor block. One
    /// undo step covers both.
    fn commit_slash(&mut self) -> KeyOutcome {
        let Some(anchor) = self.slash.anchor().cloned() else {
            self.slash.cancel();
            return KeyOutcome::Handled;
        };
        let query_len = self
            .slash
            .query()
            .map(|q| q.chars().count())
            .unwrap_or_default();
        let filtered = self.slash.filtered(&self.registry);
        let Some(command) = filtered
            .get(self.slash.highlighted().min(filtered.len().saturating_sub(1)))
            .map(|c| (*c).clone())
        else {
            self.slash.cancel();
            return KeyOutcome::Handled;
        };

        let block_id = anchor.block.clone();
        let Some(block) = self.doc.block(&block_id) else {
            self.slash.cancel();
            return KeyOutcome::Handled;
        };
        let chars: Vec<char> = block.plain_text().chars().collect();
        let start = anchor.offset.min(chars.len());
        let end = (anchor.offset + 1 + query_len).min(chars.len());
        let mut spliced = String::with_capacity(chars.len());
        spliced.extend(&chars[..start]);
        spliced.extend(&chars[end..]);

        let before = self.doc.clone();
        let mutated = self.doc.set_inline_text(&block_id, &spliced);
        self.caret = TextPosition::new(block_id.clone(), start);
        let outcome = self.registry.apply(&command, &mut self.doc, &block_id);
        self.slash.close_committed();

        match outcome {
            CommandOutcome::Applied => {
                self.committed(before);
                KeyOutcome::Changed
            }
            CommandOutcome::MediaRequested(kind) => {
                if mutated {
                    self.committed(before);
                }
                KeyOutcome::MediaRequested {
                    anchor: block_id,
                    kind,
                }
            }
            CommandOutcome::StaleAnchor => {
                if mutated {
                    self.committed(before);
                    KeyOutcome::Changed
                } else {
                    KeyOutcome::Handled
                }
            }
        }
    }

    /// Commit a clicked menu item by its index into the filtered list,
    /// the pointer counterpart of Enter: the `/query` trigger text is
    /// spliced out and the command applied.
    pub fn commit_slash_item(&mut self, index: usize) -> KeyOutcome {
        if !self.slash.is_listening() {
            return KeyOutcome::Ignored;
        }
        if index >= self.slash.filtered(&self.registry).len() {
            return KeyOutcome::Handled;
        }
        self.slash.set_highlighted(index);
        self.commit_slash()
    }

    /// Apply a catalog command at the caret block, outside the slash
    /// flow (block handle menus, toolbars).
    pub fn apply_command(&mut self, label: &str) -> KeyOutcome {
        let block_id = self.caret.block.clone();
        let before = self.doc.clone();
        match self.registry.apply_by_label(label, &mut self.doc, &block_id) {
            CommandOutcome::Applied => {
                self.committed(before);
                KeyOutcome::Changed
            }
            CommandOutcome::MediaRequested(kind) => KeyOutcome::MediaRequested {
                anchor: block_id,
                kind,
            },
            CommandOutcome::StaleAnchor => KeyOutcome::Handled,
        }
    }

    // === Formatting ===

    /// Toggle a mark over the current selection. No selection, no edit.
    pub fn toggle_mark(&mut self, mark: &Mark) -> bool {
        let Some(selection) = self.selection.clone() else {
            return false;
        };
        let before = self.doc.clone();
        if self.toolbar.toggle(&mut self.doc, &selection, mark) {
            self.committed(before);
            true
        } else {
            false
        }
    }

    /// Apply a link to the current selection.
    pub fn set_link(&mut self, url: Option<&str>) -> bool {
        let Some(selection) = self.selection.clone() else {
            return false;
        };
        let before = self.doc.clone();
        if self.toolbar.set_link(&mut self.doc, &selection, url) {
            self.committed(before);
            true
        } else {
            false
        }
    }

    /// Apply a text color to the current selection.
    pub fn set_color(&mut self, color: &str) -> bool {
        let Some(selection) = self.selection.clone() else {
            return false;
        };
        let before = self.doc.clone();
        if self.toolbar.set_color(&mut self.doc, &selection, color) {
            self.committed(before);
            true
        } else {
            false
        }
    }

    // === Block operations ===

    /// Move a block to a new index (drag-and-drop reordering).
    pub fn move_block_to(&mut self, id: &BlockId, index: usize) -> bool {
        let before = self.doc.clone();
        if self.doc.move_block(id, index) {
            self.committed(before);
            true
        } else {
            false
        }
    }

    /// Delete a block (block handle menu).
    pub fn remove_block(&mut self, id: &BlockId) -> bool {
        let before = self.doc.clone();
        if self.doc.remove_block(id) {
            if self.doc.block(&self.caret.block).is_none() {
                self.caret = TextPosition::block_start(self.doc.first_id());
            }
            self.committed(before);
            true
        } else {
            false
        }
    }

    /// Flip a to-do block's checkbox.
    pub fn set_checked(&mut self, id: &BlockId, checked: bool) -> bool {
        let before = self.doc.clone();
        if self.doc.set_checked(id, checked) {
            self.committed(before);
            true
        } else {
            false
        }
    }

    /// Change a code block's language tag.
    pub fn set_code_language(&mut self, id: &BlockId, language: Option<&str>) -> bool {
        let before = self.doc.clone();
        if self.doc.set_code_language(id, language.map(Into::into)) {
            self.committed(before);
            true
        } else {
            false
        }
    }

    // === Media ===

    /// Start a media insertion at `anchor`: places a tracked placeholder
    /// block. The host uploads in the background and reports back with
    /// [`Editor::complete_media`] or [`Editor::fail_media`].
    ///
    /// The placeholder is transient state, so the change listener is not
    /// notified until the upload resolves or fails. It still gets an
    /// undo checkpoint; undoing it removes the placeholder and the late
    /// resolution is then discarded as stale.
    pub fn begin_media(
        &mut self,
        anchor: &BlockId,
        kind: MediaKind,
        file_name: &str,
    ) -> Option<BlockId> {
        let before = self.doc.clone();
        let id = self.media.begin(&mut self.doc, anchor, kind, file_name)?;
        self.undo.checkpoint(&before);
        Some(id)
    }

    /// An upload finished; fill its placeholder. Stale completions are
    /// discarded.
    pub fn complete_media(&mut self, block: &BlockId, url: &str) -> bool {
        let before = self.doc.clone();
        if self.media.resolve(&mut self.doc, block, url) {
            self.committed(before);
            true
        } else {
            false
        }
    }

    /// An upload failed; drop its placeholder.
    pub fn fail_media(&mut self, block: &BlockId) -> bool {
        let before = self.doc.clone();
        if self.media.fail(&mut self.doc, block) {
            self.committed(before);
            true
        } else {
            false
        }
    }

    /// Insert already-hosted media by URL at the caret block.
    pub fn insert_media_url(&mut self, kind: MediaKind, url: &str) -> Option<BlockId> {
        let anchor = self.caret.block.clone();
        let before = self.doc.clone();
        let id = media::insert_from_url(&mut self.doc, &anchor, kind, url)?;
        self.committed(before);
        Some(id)
    }

    // === History ===

    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    pub fn undo_edit(&mut self) -> bool {
        if !self.undo.undo(&mut self.doc) {
            return false;
        }
        self.after_history_jump();
        true
    }

    pub fn redo_edit(&mut self) -> bool {
        if !self.undo.redo(&mut self.doc) {
            return false;
        }
        self.after_history_jump();
        true
    }

    fn after_history_jump(&mut self) {
        if self.doc.block(&self.caret.block).is_none() {
            self.caret = TextPosition::block_start(self.doc.first_id());
        }
        self.selection = None;
        self.slash.cancel();
        self.toolbar.selection_changed(None, None);
        self.emit_change();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn type_str(editor: &mut Editor, text: &str) {
        for ch in text.chars() {
            assert!(editor.insert_char(ch));
        }
    }

    #[test]
    fn test_typing_builds_a_paragraph() {
        let mut editor = Editor::new(false);
        type_str(&mut editor, "hello");
        assert_eq!(editor.document().block_at(0).unwrap().plain_text(), "hello");
        assert_eq!(editor.caret().offset, 5);
    }

    #[test]
    fn test_slash_flow_turns_paragraph_into_heading() {
        let mut editor = Editor::new(false);
        type_str(&mut editor, "/head");
        assert!(editor.slash().is_listening());
        assert_eq!(editor.slash().query(), Some("head"));
        assert_eq!(editor.slash().filtered(editor.registry()).len(), 3);

        let outcome = editor.handle_key(&Key::Enter, Modifiers::NONE);
        assert_eq!(outcome, KeyOutcome::Changed);
        assert!(!editor.slash().is_listening());

        let block = editor.document().block_at(0).unwrap();
        assert_eq!(block.kind, BlockKind::Heading { level: 1 });
        // The trigger text is gone.
        assert_eq!(block.plain_text(), "");
    }

    #[test]
    fn test_slash_menu_arrow_selection() {
        let mut editor = Editor::new(false);
        type_str(&mut editor, "/head");
        editor.handle_key(&Key::ArrowDown, Modifiers::NONE);
        let outcome = editor.handle_key(&Key::Enter, Modifiers::NONE);
        assert_eq!(outcome, KeyOutcome::Changed);
        assert_eq!(
            editor.document().block_at(0).unwrap().kind,
            BlockKind::Heading { level: 2 }
        );
    }

    #[test]
    fn test_slash_menu_click_commits_item() {
        let mut editor = Editor::new(false);
        type_str(&mut editor, "before /head");

        // Click the third filtered entry (Heading 3).
        let outcome = editor.commit_slash_item(2);
        assert_eq!(outcome, KeyOutcome::Changed);
        assert!(!editor.slash().is_listening());

        let block = editor.document().block_at(0).unwrap();
        assert_eq!(block.kind, BlockKind::Heading { level: 3 });
        // The trigger text is spliced out; surrounding text survives.
        assert_eq!(block.plain_text(), "before ");
    }

    #[test]
    fn test_slash_click_out_of_range_keeps_menu() {
        let mut editor = Editor::new(false);
        assert_eq!(editor.commit_slash_item(0), KeyOutcome::Ignored);

        type_str(&mut editor, "/head");
        assert_eq!(editor.commit_slash_item(99), KeyOutcome::Handled);
        assert!(editor.slash().is_listening());
    }

    #[test]
    fn test_slash_escape_leaves_text_literal() {
        let mut editor = Editor::new(false);
        type_str(&mut editor, "/head");
        let outcome = editor.handle_key(&Key::Escape, Modifiers::NONE);
        assert_eq!(outcome, KeyOutcome::Handled);
        assert!(!editor.slash().is_listening());
        assert_eq!(editor.document().block_at(0).unwrap().plain_text(), "/head");
    }

    #[test]
    fn test_slash_media_command_requests_upload() {
        let mut editor = Editor::new(false);
        type_str(&mut editor, "/image");
        let outcome = editor.handle_key(&Key::Enter, Modifiers::NONE);
        let KeyOutcome::MediaRequested { anchor, kind } = outcome else {
            panic!("expected a media request, got {outcome:?}");
        };
        assert_eq!(kind, MediaKind::Image);
        // Trigger text was spliced out; the anchor block is intact.
        assert_eq!(editor.document().block(&anchor).unwrap().plain_text(), "");

        let placeholder = editor.begin_media(&anchor, kind, "cat.png").unwrap();
        assert!(editor.media().is_pending(&placeholder));
        assert!(editor.complete_media(&placeholder, "https://cdn/cat.png"));
        assert_eq!(
            editor.document().block(&placeholder).unwrap().kind,
            BlockKind::Image {
                src: "https://cdn/cat.png".into(),
                alt: "cat.png".into()
            }
        );
    }

    #[test]
    fn test_enter_splits_block_at_caret() {
        let mut editor = Editor::new(false);
        type_str(&mut editor, "headtail");
        editor.set_caret(TextPosition::new(editor.document().first_id(), 4));
        let outcome = editor.handle_key(&Key::Enter, Modifiers::NONE);
        assert_eq!(outcome, KeyOutcome::Changed);
        assert_eq!(editor.document().len(), 2);
        assert_eq!(editor.document().block_at(0).unwrap().plain_text(), "head");
        assert_eq!(editor.document().block_at(1).unwrap().plain_text(), "tail");
        assert_eq!(editor.caret().offset, 0);
    }

    #[test]
    fn test_bold_shortcut_over_selection() {
        let mut editor = Editor::new(false);
        type_str(&mut editor, "make this bold");
        let id = editor.document().first_id();
        editor.set_selection(
            Some(DocRange::new(
                TextPosition::new(id.clone(), 5),
                TextPosition::new(id, 9),
            )),
            Some(Rect::new(10.0, 20.0, 40.0, 16.0)),
        );
        assert!(editor.toolbar().is_visible());

        let outcome = editor.handle_key(&Key::character("b"), Modifiers::CTRL);
        assert_eq!(outcome, KeyOutcome::Changed);
        let block = editor.document().block_at(0).unwrap();
        let bolded = block
            .runs
            .iter()
            .find(|r| r.text == "this")
            .expect("a run for the selected word");
        assert!(bolded.marks.bold);
    }

    #[test]
    fn test_cmd_b_on_mac() {
        let mut editor = Editor::new(true);
        type_str(&mut editor, "ab");
        let id = editor.document().first_id();
        editor.set_selection(
            Some(DocRange::new(
                TextPosition::new(id.clone(), 0),
                TextPosition::new(id, 2),
            )),
            None,
        );
        assert_eq!(
            editor.handle_key(&Key::character("b"), Modifiers::META),
            KeyOutcome::Changed
        );
        // Ctrl+B must not double-apply on mac.
        assert_eq!(
            editor.handle_key(&Key::character("b"), Modifiers::CTRL),
            KeyOutcome::Ignored
        );
    }

    #[test]
    fn test_undo_redo_shortcuts() {
        let mut editor = Editor::new(false);
        type_str(&mut editor, "ab");
        assert!(editor.can_undo());

        assert_eq!(
            editor.handle_key(&Key::character("z"), Modifiers::CTRL),
            KeyOutcome::Changed
        );
        assert_eq!(editor.document().block_at(0).unwrap().plain_text(), "a");

        assert_eq!(
            editor.handle_key(&Key::character("z"), Modifiers::CTRL_SHIFT),
            KeyOutcome::Changed
        );
        assert_eq!(editor.document().block_at(0).unwrap().plain_text(), "ab");
    }

    #[test]
    fn test_mark_toggle_over_divider_is_not_an_edit() {
        let count = Rc::new(RefCell::new(0usize));
        let seen = count.clone();
        let mut editor = Editor::new(false);
        editor.load(r#"{"version":1,"blocks":[{"type":"divider"}]}"#);
        editor.set_on_change(move |_| *seen.borrow_mut() += 1);

        let id = editor.document().first_id();
        editor.set_selection(
            Some(DocRange::new(
                TextPosition::new(id.clone(), 0),
                TextPosition::new(id, 1),
            )),
            Some(Rect::new(0.0, 0.0, 10.0, 16.0)),
        );

        assert!(!editor.toggle_mark(&Mark::Bold));
        assert_eq!(*count.borrow(), 0);
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_on_change_fires_per_committed_mutation() {
        let count = Rc::new(RefCell::new(0usize));
        let seen = count.clone();
        let mut editor = Editor::new(false);
        editor.set_on_change(move |_| *seen.borrow_mut() += 1);

        editor.load(r#"{"version":1,"blocks":[]}"#);
        assert_eq!(*count.borrow(), 0, "loading is not an edit");

        type_str(&mut editor, "hi");
        assert_eq!(*count.borrow(), 2);

        // A refused edit does not notify.
        editor.set_caret(TextPosition::block_start(editor.document().first_id()));
        assert!(!editor.backspace());
        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn test_on_change_payload_is_canonical_json() {
        let last = Rc::new(RefCell::new(String::new()));
        let seen = last.clone();
        let mut editor = Editor::new(false);
        editor.set_on_change(move |s| *seen.borrow_mut() = s.to_string());

        type_str(&mut editor, "x");
        assert_eq!(*last.borrow(), editor.serialized());
        assert!(last.borrow().starts_with(r#"{"version":1,"blocks":"#));
    }

    #[test]
    fn test_load_markdown_then_edit() {
        let mut editor = Editor::new(false);
        editor.load("# Title\n\nbody");
        assert_eq!(editor.document().len(), 2);
        assert_eq!(
            editor.document().block_at(0).unwrap().kind,
            BlockKind::Heading { level: 1 }
        );
        assert!(!editor.can_undo());

        editor.set_caret(TextPosition::new(editor.document().first_id(), 5));
        assert!(editor.insert_char('!'));
        assert_eq!(editor.document().block_at(0).unwrap().plain_text(), "Title!");
    }

    #[test]
    fn test_remove_block_moves_caret_off_dead_block() {
        let mut editor = Editor::new(false);
        type_str(&mut editor, "one");
        editor.handle_key(&Key::Enter, Modifiers::NONE);
        type_str(&mut editor, "two");
        let second = editor.caret().block.clone();
        assert!(editor.remove_block(&second));
        let caret_block = editor.caret().block.clone();
        assert!(editor.document().block(&caret_block).is_some());
    }

    #[test]
    fn test_divider_command_keeps_anchor_block() {
        let mut editor = Editor::new(false);
        type_str(&mut editor, "notes");
        editor.set_caret(TextPosition::new(editor.document().first_id(), 5));
        assert_eq!(editor.apply_command("Divider"), KeyOutcome::Changed);
        assert_eq!(editor.document().len(), 2);
        assert_eq!(editor.document().block_at(0).unwrap().plain_text(), "notes");
        assert_eq!(editor.document().block_at(1).unwrap().kind, BlockKind::Divider);
    }
}
