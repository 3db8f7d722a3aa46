//! Slash-command trigger engine.
//!
//! A small state machine: Idle until `/` is typed at a token start
//! (block start or right after whitespace), then Listening while the
//! query accumulates and the menu filters, until a commit (Enter or
//! click) or a cancel (Escape, caret exit, focus loss, whitespace).
//!
//! The engine never mutates the document itself. It tracks where the
//! trigger text lives; the editor deletes `/query` and applies the
//! chosen command on commit.

use tracing::trace;

use crate::commands::{Command, CommandRegistry};
use crate::keys::Key;
use crate::types::{Rect, TextPosition};

/// Trigger engine state.
#[derive(Debug, Clone, PartialEq)]
pub enum SlashState {
    Idle,
    Listening {
        /// Position of the `/` character itself.
        anchor: TextPosition,
        /// Accumulated query text (after the `/`).
        query: String,
        /// Highlighted index into the *filtered* result list.
        highlighted: usize,
        /// Caret rectangle captured when the menu opened.
        menu_anchor: Option<Rect>,
    },
}

/// What the editor should do after feeding a key to a listening engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlashKeyResult {
    /// Not the engine's key; handle it normally.
    Ignored,
    /// Consumed (menu navigation or a no-result Enter).
    Handled,
    /// Commit the highlighted command: delete the trigger text, apply.
    Commit,
    /// Cancel: close the menu, leave the trigger text literal.
    Cancel,
}

/// The slash-command trigger state machine.
#[derive(Debug, Default)]
pub struct SlashTrigger {
    state: SlashState,
}

impl Default for SlashState {
    fn default() -> Self {
        Self::Idle
    }
}

impl SlashTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SlashState {
        &self.state
    }

    pub fn is_listening(&self) -> bool {
        matches!(self.state, SlashState::Listening { .. })
    }

    pub fn query(&self) -> Option<&str> {
        match &self.state {
            SlashState::Listening { query, .. } => Some(query),
            SlashState::Idle => None,
        }
    }

    pub fn anchor(&self) -> Option<&TextPosition> {
        match &self.state {
            SlashState::Listening { anchor, .. } => Some(anchor),
            SlashState::Idle => None,
        }
    }

    pub fn highlighted(&self) -> usize {
        match &self.state {
            SlashState::Listening { highlighted, .. } => *highlighted,
            SlashState::Idle => 0,
        }
    }

    pub fn menu_anchor(&self) -> Option<Rect> {
        match &self.state {
            SlashState::Listening { menu_anchor, .. } => *menu_anchor,
            SlashState::Idle => None,
        }
    }

    /// Move the highlight to a filtered-list index (pointer hover or a
    /// click about to commit).
    pub fn set_highlighted(&mut self, index: usize) {
        if let SlashState::Listening { highlighted, .. } = &mut self.state {
            *highlighted = index;
        }
    }

    /// Record the caret rectangle the host computed when the menu opened.
    pub fn set_menu_anchor(&mut self, rect: Rect) {
        if let SlashState::Listening { menu_anchor, .. } = &mut self.state {
            *menu_anchor = Some(rect);
        }
    }

    /// The commands currently matching the query, in declaration order.
    ///
    /// Idle engines match nothing.
    pub fn filtered<'r>(&self, registry: &'r CommandRegistry) -> Vec<&'r Command> {
        match &self.state {
            SlashState::Listening { query, .. } => registry.search(query),
            SlashState::Idle => Vec::new(),
        }
    }

    /// Inform the engine a character was inserted at `at` (the position
    /// the character now occupies). `prev` is the character immediately
    /// before it, if any.
    pub fn notify_insert(&mut self, ch: char, at: &TextPosition, prev: Option<char>) {
        match &mut self.state {
            SlashState::Idle => {
                let token_start = at.offset == 0 || prev.is_some_and(|c| c.is_whitespace());
                if ch == '/' && token_start {
                    trace!(block = %at.block, offset = at.offset, "slash trigger opened");
                    self.state = SlashState::Listening {
                        anchor: at.clone(),
                        query: String::new(),
                        highlighted: 0,
                        menu_anchor: None,
                    };
                }
            }
            SlashState::Listening {
                anchor,
                query,
                highlighted,
                ..
            } => {
                // Typing outside the token, or breaking it with
                // whitespace, closes the menu without mutation.
                if at.block != anchor.block || ch.is_whitespace() {
                    self.state = SlashState::Idle;
                    trace!("slash trigger cancelled");
                    return;
                }
                query.push(ch);
                *highlighted = 0;
            }
        }
    }

    /// Inform the engine of a backspace that removed the character at
    /// `removed_at`. Deleting the `/` itself cancels.
    pub fn notify_backspace(&mut self, removed_at: &TextPosition) {
        if let SlashState::Listening { anchor, query, highlighted, .. } = &mut self.state {
            if removed_at.block != anchor.block || removed_at.offset <= anchor.offset {
                self.state = SlashState::Idle;
                trace!("slash trigger cancelled");
            } else {
                query.pop();
                *highlighted = 0;
            }
        }
    }

    /// Inform the engine the caret moved. Leaving the `/query` span
    /// cancels without mutation.
    pub fn notify_caret_moved(&mut self, to: &TextPosition) {
        if let SlashState::Listening { anchor, query, .. } = &self.state {
            let span_start = anchor.offset;
            let span_end = anchor.offset + 1 + query.chars().count();
            let inside =
                to.block == anchor.block && to.offset > span_start && to.offset <= span_end;
            if !inside {
                self.cancel();
            }
        }
    }

    /// Focus left the editor: cancel.
    pub fn notify_focus_lost(&mut self) {
        self.cancel();
    }

    /// Close the menu, leaving any typed trigger text as literal text.
    pub fn cancel(&mut self) {
        if self.is_listening() {
            trace!("slash trigger cancelled");
        }
        self.state = SlashState::Idle;
    }

    /// Close after a successful commit.
    pub fn close_committed(&mut self) {
        trace!("slash trigger committed");
        self.state = SlashState::Idle;
    }

    /// Feed a control key while Listening. `filtered_len` is the current
    /// filtered result count.
    pub fn handle_key(&mut self, key: &Key, filtered_len: usize) -> SlashKeyResult {
        let SlashState::Listening { highlighted, .. } = &mut self.state else {
            return SlashKeyResult::Ignored;
        };
        match key {
            Key::ArrowDown => {
                if filtered_len > 0 {
                    *highlighted = (*highlighted + 1) % filtered_len;
                }
                SlashKeyResult::Handled
            }
            Key::ArrowUp => {
                if filtered_len > 0 {
                    *highlighted = (*highlighted + filtered_len - 1) % filtered_len;
                }
                SlashKeyResult::Handled
            }
            Key::Enter => {
                if filtered_len == 0 {
                    // "No results": Enter is a no-op, stay Listening.
                    SlashKeyResult::Handled
                } else {
                    if *highlighted >= filtered_len {
                        *highlighted = 0;
                    }
                    SlashKeyResult::Commit
                }
            }
            Key::Escape => SlashKeyResult::Cancel,
            _ => SlashKeyResult::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::make_block_id;

    fn pos(offset: usize) -> TextPosition {
        TextPosition::new(make_block_id(0), offset)
    }

    #[test]
    fn test_slash_at_block_start_opens() {
        let mut trigger = SlashTrigger::new();
        trigger.notify_insert('/', &pos(0), None);
        assert!(trigger.is_listening());
        assert_eq!(trigger.query(), Some(""));
        assert_eq!(trigger.anchor(), Some(&pos(0)));
    }

    #[test]
    fn test_slash_after_whitespace_opens() {
        let mut trigger = SlashTrigger::new();
        trigger.notify_insert('/', &pos(6), Some(' '));
        assert!(trigger.is_listening());
    }

    #[test]
    fn test_slash_mid_word_stays_idle() {
        let mut trigger = SlashTrigger::new();
        trigger.notify_insert('/', &pos(4), Some('o'));
        assert!(!trigger.is_listening());
    }

    #[test]
    fn test_query_accumulates_and_filters() {
        let registry = CommandRegistry::new();
        let mut trigger = SlashTrigger::new();
        trigger.notify_insert('/', &pos(0), None);
        for (i, ch) in "head".chars().enumerate() {
            trigger.notify_insert(ch, &pos(1 + i), None);
        }
        assert_eq!(trigger.query(), Some("head"));
        let labels: Vec<&str> = trigger
            .filtered(&registry)
            .iter()
            .map(|c| c.label)
            .collect();
        assert_eq!(labels, vec!["Heading 1", "Heading 2", "Heading 3"]);
    }

    #[test]
    fn test_whitespace_cancels() {
        let mut trigger = SlashTrigger::new();
        trigger.notify_insert('/', &pos(0), None);
        trigger.notify_insert(' ', &pos(1), None);
        assert!(!trigger.is_listening());
    }

    #[test]
    fn test_arrow_navigation_wraps() {
        let mut trigger = SlashTrigger::new();
        trigger.notify_insert('/', &pos(0), None);

        assert_eq!(trigger.handle_key(&Key::ArrowUp, 3), SlashKeyResult::Handled);
        assert_eq!(trigger.highlighted(), 2); // wrapped backwards

        assert_eq!(trigger.handle_key(&Key::ArrowDown, 3), SlashKeyResult::Handled);
        assert_eq!(trigger.highlighted(), 0); // wrapped forwards
    }

    #[test]
    fn test_enter_with_no_results_stays_listening() {
        let mut trigger = SlashTrigger::new();
        trigger.notify_insert('/', &pos(0), None);
        assert_eq!(trigger.handle_key(&Key::Enter, 0), SlashKeyResult::Handled);
        assert!(trigger.is_listening());
    }

    #[test]
    fn test_enter_commits() {
        let mut trigger = SlashTrigger::new();
        trigger.notify_insert('/', &pos(0), None);
        assert_eq!(trigger.handle_key(&Key::Enter, 5), SlashKeyResult::Commit);
    }

    #[test]
    fn test_escape_cancels() {
        let mut trigger = SlashTrigger::new();
        trigger.notify_insert('/', &pos(0), None);
        assert_eq!(trigger.handle_key(&Key::Escape, 5), SlashKeyResult::Cancel);
    }

    #[test]
    fn test_backspace_pops_then_cancels() {
        let mut trigger = SlashTrigger::new();
        trigger.notify_insert('/', &pos(0), None);
        trigger.notify_insert('a', &pos(1), None);
        assert_eq!(trigger.query(), Some("a"));

        trigger.notify_backspace(&pos(1));
        assert_eq!(trigger.query(), Some(""));

        // Backspacing over the `/` itself cancels.
        trigger.notify_backspace(&pos(0));
        assert!(!trigger.is_listening());
    }

    #[test]
    fn test_caret_exit_cancels() {
        let mut trigger = SlashTrigger::new();
        trigger.notify_insert('/', &pos(3), Some(' '));
        trigger.notify_insert('a', &pos(4), None);

        // Inside the span: /a covers offsets 3..=5 for the caret.
        trigger.notify_caret_moved(&pos(5));
        assert!(trigger.is_listening());

        // Arrow out to before the slash.
        trigger.notify_caret_moved(&pos(2));
        assert!(!trigger.is_listening());
    }

    #[test]
    fn test_menu_anchor_rect() {
        let mut trigger = SlashTrigger::new();
        trigger.notify_insert('/', &pos(0), None);
        assert_eq!(trigger.menu_anchor(), None);

        trigger.set_menu_anchor(Rect::new(5.0, 10.0, 1.0, 16.0));
        assert_eq!(trigger.menu_anchor(), Some(Rect::new(5.0, 10.0, 1.0, 16.0)));

        trigger.cancel();
        assert_eq!(trigger.menu_anchor(), None);
    }
}
