//! Inline content model: text runs and character-level marks.
//!
//! A block's text is an ordered sequence of `InlineRun`s, each carrying a
//! `MarkSet`. Run collections are kept normalized at all times: no empty
//! runs, and adjacent runs with identical mark sets are coalesced. That
//! canonical form is what makes structural equality meaningful for the
//! round-trip law and the toggle-symmetry property.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A character-level formatting attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Strike,
    Code,
    /// Link with an opaque href. No URL validation - matches source behavior.
    Link(SmolStr),
    /// Named text color.
    Color(SmolStr),
}

impl Mark {
    /// The payload-free discriminant of this mark.
    pub fn kind(&self) -> MarkKind {
        match self {
            Self::Bold => MarkKind::Bold,
            Self::Italic => MarkKind::Italic,
            Self::Underline => MarkKind::Underline,
            Self::Strike => MarkKind::Strike,
            Self::Code => MarkKind::Code,
            Self::Link(_) => MarkKind::Link,
            Self::Color(_) => MarkKind::Color,
        }
    }
}

/// Mark discriminant, used for presence checks independent of payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkKind {
    Bold,
    Italic,
    Underline,
    Strike,
    Code,
    Link,
    Color,
}

/// The set of marks active on a run of text.
///
/// Serialized inline in the wire format; absent fields mean "off", so an
/// unmarked run serializes as an empty object (or is omitted entirely).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkSet {
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub strike: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub code: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<SmolStr>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl MarkSet {
    /// An empty mark set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if no marks are active.
    pub fn is_empty(&self) -> bool {
        !self.bold
            && !self.italic
            && !self.underline
            && !self.strike
            && !self.code
            && self.link.is_none()
            && self.color.is_none()
    }

    /// Check whether a mark of the given kind is active (payload ignored).
    pub fn has(&self, kind: MarkKind) -> bool {
        match kind {
            MarkKind::Bold => self.bold,
            MarkKind::Italic => self.italic,
            MarkKind::Underline => self.underline,
            MarkKind::Strike => self.strike,
            MarkKind::Code => self.code,
            MarkKind::Link => self.link.is_some(),
            MarkKind::Color => self.color.is_some(),
        }
    }

    /// Activate a mark, replacing any existing payload of the same kind.
    pub fn insert(&mut self, mark: &Mark) {
        match mark {
            Mark::Bold => self.bold = true,
            Mark::Italic => self.italic = true,
            Mark::Underline => self.underline = true,
            Mark::Strike => self.strike = true,
            Mark::Code => self.code = true,
            Mark::Link(href) => self.link = Some(href.clone()),
            Mark::Color(name) => self.color = Some(name.clone()),
        }
    }

    /// Deactivate any mark of the given kind.
    pub fn remove(&mut self, kind: MarkKind) {
        match kind {
            MarkKind::Bold => self.bold = false,
            MarkKind::Italic => self.italic = false,
            MarkKind::Underline => self.underline = false,
            MarkKind::Strike => self.strike = false,
            MarkKind::Code => self.code = false,
            MarkKind::Link => self.link = None,
            MarkKind::Color => self.color = None,
        }
    }

    /// Builder-style convenience used heavily in tests.
    pub fn with(mut self, mark: Mark) -> Self {
        self.insert(&mark);
        self
    }
}

/// A run of text with a uniform mark set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineRun {
    pub text: String,
    pub marks: MarkSet,
}

impl InlineRun {
    /// Create a plain (unmarked) run.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: MarkSet::new(),
        }
    }

    /// Create a run with the given marks.
    pub fn marked(text: impl Into<String>, marks: MarkSet) -> Self {
        Self {
            text: text.into(),
            marks,
        }
    }

    /// Length in chars (not bytes).
    pub fn len_chars(&self) -> usize {
        self.text.chars().count()
    }
}

/// Expand runs into one `(char, MarkSet)` pair per character.
///
/// The per-char form is what the range-mutation primitives operate on;
/// `chars_to_runs` folds it back into canonical runs afterwards.
pub fn runs_to_chars(runs: &[InlineRun]) -> Vec<(char, MarkSet)> {
    let mut out = Vec::new();
    for run in runs {
        for ch in run.text.chars() {
            out.push((ch, run.marks.clone()));
        }
    }
    out
}

/// Fold per-char marks back into normalized runs.
///
/// Consecutive chars with equal mark sets share a run; an empty input
/// yields an empty run collection (the canonical empty block content).
pub fn chars_to_runs(chars: &[(char, MarkSet)]) -> Vec<InlineRun> {
    let mut runs: Vec<InlineRun> = Vec::new();
    for (ch, marks) in chars {
        match runs.last_mut() {
            Some(last) if &last.marks == marks => last.text.push(*ch),
            _ => runs.push(InlineRun::marked(ch.to_string(), marks.clone())),
        }
    }
    runs
}

/// Normalize a run collection in place: drop empty runs, merge neighbors
/// with identical mark sets.
pub fn normalize_runs(runs: &mut Vec<InlineRun>) {
    runs.retain(|r| !r.text.is_empty());
    let mut i = 0;
    while i + 1 < runs.len() {
        if runs[i].marks == runs[i + 1].marks {
            let next = runs.remove(i + 1);
            runs[i].text.push_str(&next.text);
        } else {
            i += 1;
        }
    }
}

/// Concatenated plain text of a run collection.
pub fn runs_text(runs: &[InlineRun]) -> String {
    runs.iter().map(|r| r.text.as_str()).collect()
}
