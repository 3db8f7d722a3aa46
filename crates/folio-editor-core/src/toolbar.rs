//! Floating formatting toolbar controller.
//!
//! Reacts to selection-change events: collapsed selections hide the
//! toolbar, non-empty ones show it anchored at the host-computed
//! selection rectangle. Actions funnel into the document's
//! `apply_mark_to_range` with toggle semantics; mixed-state selections
//! normalize to "add".

use smol_str::SmolStr;
use tracing::debug;

use crate::document::{Document, MarkAction};
use crate::inline::Mark;
use crate::types::{DocRange, Rect};

/// Toolbar visibility state, recomputed on every selection change.
#[derive(Debug, Default)]
pub struct FormattingToolbar {
    visible: bool,
    anchor: Option<Rect>,
}

impl FormattingToolbar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn anchor(&self) -> Option<Rect> {
        self.anchor
    }

    /// Feed a selection change. `rect` is the selection's bounding
    /// rectangle as computed by the host layer; it is only stored while
    /// the selection is non-empty.
    pub fn selection_changed(&mut self, selection: Option<&DocRange>, rect: Option<Rect>) {
        match selection {
            Some(range) if !range.is_collapsed() => {
                self.visible = true;
                self.anchor = rect;
            }
            _ => {
                self.visible = false;
                self.anchor = None;
            }
        }
    }

    /// Toggle a mark over the selection.
    pub fn toggle(&self, doc: &mut Document, selection: &DocRange, mark: &Mark) -> bool {
        doc.apply_mark_to_range(selection, mark, MarkAction::Toggle)
    }

    /// Apply a link to the selection.
    ///
    /// `None` (cancelled prompt) and empty input are no-ops. Anything
    /// else is accepted as an opaque href - no URL validation, by
    /// contract.
    pub fn set_link(&self, doc: &mut Document, selection: &DocRange, url: Option<&str>) -> bool {
        match url {
            None => false,
            Some("") => false,
            Some(href) => {
                debug!(href, "applying link mark");
                doc.apply_mark_to_range(
                    selection,
                    &Mark::Link(SmolStr::new(href)),
                    MarkAction::Add,
                )
            }
        }
    }

    /// Set a named color on the selection.
    pub fn set_color(&self, doc: &mut Document, selection: &DocRange, color: &str) -> bool {
        doc.apply_mark_to_range(
            selection,
            &Mark::Color(SmolStr::new(color)),
            MarkAction::Add,
        )
    }
}
