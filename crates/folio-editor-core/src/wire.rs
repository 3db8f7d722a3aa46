//! Serialization bridge: Document <-> persisted string.
//!
//! The canonical wire format is a structured JSON tree
//! (`{"version":1,"blocks":[...]}`). Hydration is forgiving by contract:
//! persisted content may come from an older editor that stored Markdown,
//! or may be corrupt, and it must still open editable. `deserialize`
//! therefore never fails - JSON objects hydrate structurally, anything
//! else goes through the Markdown reader, and plain or malformed text
//! falls out of that as a literal paragraph.
//!
//! Block ids are not serialized; they are re-assigned on hydration.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tracing::warn;

use crate::block::BlockKind;
use crate::document::Document;
use crate::inline::{InlineRun, MarkSet};
use crate::markdown::from_markdown;

/// Current wire format version.
pub const WIRE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct WireDoc {
    version: u32,
    blocks: Vec<WireBlock>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireRun {
    text: String,
    #[serde(default, skip_serializing_if = "MarkSet::is_empty")]
    marks: MarkSet,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireBlock {
    Paragraph {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        runs: Vec<WireRun>,
    },
    Heading {
        level: u8,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        runs: Vec<WireRun>,
    },
    BulletList {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        runs: Vec<WireRun>,
    },
    OrderedList {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        runs: Vec<WireRun>,
    },
    TodoList {
        #[serde(default)]
        checked: bool,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        runs: Vec<WireRun>,
    },
    Quote {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        runs: Vec<WireRun>,
    },
    Code {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<SmolStr>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        runs: Vec<WireRun>,
    },
    Image {
        src: SmolStr,
        #[serde(default, skip_serializing_if = "SmolStr::is_empty")]
        alt: SmolStr,
    },
    Video {
        src: SmolStr,
    },
    Table {
        rows: u32,
        cols: u32,
    },
    Divider,
    Callout {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        runs: Vec<WireRun>,
    },
}

fn to_wire_runs(runs: &[InlineRun]) -> Vec<WireRun> {
    runs.iter()
        .map(|r| WireRun {
            text: r.text.clone(),
            marks: r.marks.clone(),
        })
        .collect()
}

fn from_wire_runs(runs: Vec<WireRun>) -> Vec<InlineRun> {
    runs.into_iter()
        .map(|r| InlineRun::marked(r.text, r.marks))
        .collect()
}

fn to_wire_block(kind: &BlockKind, runs: &[InlineRun]) -> WireBlock {
    let runs = to_wire_runs(runs);
    match kind {
        BlockKind::Paragraph => WireBlock::Paragraph { runs },
        BlockKind::Heading { level } => WireBlock::Heading {
            level: *level,
            runs,
        },
        BlockKind::BulletList => WireBlock::BulletList { runs },
        BlockKind::OrderedList => WireBlock::OrderedList { runs },
        BlockKind::TodoList { checked } => WireBlock::TodoList {
            checked: *checked,
            runs,
        },
        BlockKind::Quote => WireBlock::Quote { runs },
        BlockKind::Code { language } => WireBlock::Code {
            language: language.clone(),
            runs,
        },
        BlockKind::Image { src, alt } => WireBlock::Image {
            src: src.clone(),
            alt: alt.clone(),
        },
        BlockKind::Video { src } => WireBlock::Video { src: src.clone() },
        BlockKind::Table { rows, cols } => WireBlock::Table {
            rows: *rows,
            cols: *cols,
        },
        BlockKind::Divider => WireBlock::Divider,
        BlockKind::Callout => WireBlock::Callout { runs },
    }
}

fn from_wire_block(block: WireBlock) -> (BlockKind, Vec<InlineRun>) {
    match block {
        WireBlock::Paragraph { runs } => (BlockKind::Paragraph, from_wire_runs(runs)),
        WireBlock::Heading { level, runs } => (
            BlockKind::Heading {
                level: level.clamp(1, 3),
            },
            from_wire_runs(runs),
        ),
        WireBlock::BulletList { runs } => (BlockKind::BulletList, from_wire_runs(runs)),
        WireBlock::OrderedList { runs } => (BlockKind::OrderedList, from_wire_runs(runs)),
        WireBlock::TodoList { checked, runs } => {
            (BlockKind::TodoList { checked }, from_wire_runs(runs))
        }
        WireBlock::Quote { runs } => (BlockKind::Quote, from_wire_runs(runs)),
        WireBlock::Code { language, runs } => {
            (BlockKind::Code { language }, from_wire_runs(runs))
        }
        WireBlock::Image { src, alt } => (BlockKind::Image { src, alt }, Vec::new()),
        WireBlock::Video { src } => (BlockKind::Video { src }, Vec::new()),
        WireBlock::Table { rows, cols } => (BlockKind::Table { rows, cols }, Vec::new()),
        WireBlock::Divider => (BlockKind::Divider, Vec::new()),
        WireBlock::Callout { runs } => (BlockKind::Callout, from_wire_runs(runs)),
    }
}

/// Serialize a document to the canonical JSON wire string.
///
/// Deterministic: the same document value always yields the same string.
pub fn serialize(doc: &Document) -> String {
    let wire = WireDoc {
        version: WIRE_VERSION,
        blocks: doc
            .blocks()
            .map(|b| to_wire_block(&b.kind, &b.runs))
            .collect(),
    };
    // Serializing plain structs to a string cannot fail.
    serde_json::to_string(&wire).unwrap_or_default()
}

/// Hydrate a document from persisted content. Never fails.
pub fn deserialize(input: &str) -> Document {
    if input.trim().is_empty() {
        return Document::new();
    }
    match serde_json::from_str::<serde_json::Value>(input) {
        Ok(serde_json::Value::Object(map)) => from_json_object(&map, input),
        _ => from_markdown(input),
    }
}

/// Hydrate from a parsed JSON object.
///
/// An empty object (or version-only envelope, or empty `blocks` array)
/// yields the empty single-empty-paragraph document. An object carrying
/// other content but no `blocks` array is some foreign serialization
/// scheme; it hydrates as a literal paragraph so nothing is lost to the
/// host's next save. Individual blocks that do not match the wire
/// schema degrade to paragraphs carrying their raw JSON text.
fn from_json_object(map: &serde_json::Map<String, serde_json::Value>, raw: &str) -> Document {
    let Some(serde_json::Value::Array(items)) = map.get("blocks") else {
        if map.keys().all(|key| key == "version") {
            return Document::new();
        }
        warn!("json object without a blocks array, keeping literal text");
        return Document::from_parts(vec![(
            BlockKind::Paragraph,
            vec![InlineRun::plain(raw.trim())],
        )]);
    };
    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        match serde_json::from_value::<WireBlock>(item.clone()) {
            Ok(block) => parts.push(from_wire_block(block)),
            Err(err) => {
                warn!(%err, "unrecognized wire block, degrading to paragraph");
                parts.push((
                    BlockKind::Paragraph,
                    vec![InlineRun::plain(item.to_string())],
                ));
            }
        }
    }
    Document::from_parts(parts)
}
