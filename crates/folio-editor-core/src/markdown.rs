//! Markdown ingestion and export.
//!
//! Ingestion exists for legacy persisted content: older documents were
//! stored as Markdown (or plain text), and hydration routes anything
//! that is not a structured JSON object through [`from_markdown`].
//! Plain text with no Markdown structure comes out as literal
//! paragraphs, which is exactly the forgiving behavior hydration wants.
//!
//! Export ([`to_markdown`]) is a convenience projection and is lossy
//! where Markdown has no equivalent: callouts flatten to quotes, colors
//! are dropped, tables keep their shape but not their cells.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use smol_str::SmolStr;

use crate::block::BlockKind;
use crate::document::Document;
use crate::inline::{InlineRun, Mark, MarkKind, MarkSet};

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        // The model only has three heading levels.
        _ => 3,
    }
}

/// Why the currently open block was opened. A block closes only on the
/// matching end tag, so a paragraph nested inside a list item does not
/// terminate the item's block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Opener {
    Paragraph,
    Heading,
    Item,
    Code,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Bullet,
    Ordered,
}

#[derive(Debug, Default)]
struct Reader {
    parts: Vec<(BlockKind, Vec<InlineRun>)>,
    current: Option<(BlockKind, Vec<InlineRun>, Opener)>,
    marks: MarkSet,
    list_stack: Vec<ListKind>,
    quote_depth: usize,
    code_text: String,
    image: Option<(SmolStr, String)>,
    table_cols: u32,
    table_rows: u32,
    in_table: bool,
}

impl Reader {
    fn open(&mut self, kind: BlockKind, opener: Opener) {
        if self.current.is_none() {
            self.current = Some((kind, Vec::new(), opener));
        }
    }

    fn close(&mut self, opener: Opener) {
        let Some((kind, runs, open_as)) = self.current.take() else {
            return;
        };
        if open_as != opener {
            // e.g. a paragraph end inside a list item; keep the block open.
            self.current = Some((kind, runs, open_as));
            return;
        }
        // Empty paragraphs come from blocks that held only out-of-band
        // content (a lone image). Drop them.
        if kind == BlockKind::Paragraph && runs.is_empty() {
            return;
        }
        self.parts.push((kind, runs));
    }

    fn push_text(&mut self, text: &str) {
        if let Some((_, alt)) = self.image.as_mut() {
            alt.push_str(text);
            return;
        }
        if self.in_table {
            return;
        }
        if let Some((BlockKind::Code { .. }, _, _)) = &self.current {
            self.code_text.push_str(text);
            return;
        }
        self.open(BlockKind::Paragraph, Opener::Paragraph);
        if let Some((_, runs, _)) = self.current.as_mut() {
            runs.push(InlineRun::marked(text, self.marks.clone()));
        }
    }

    fn paragraph_kind(&self) -> BlockKind {
        if self.quote_depth > 0 {
            BlockKind::Quote
        } else {
            BlockKind::Paragraph
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Paragraph) => {
                self.open(self.paragraph_kind(), Opener::Paragraph);
            }
            Event::End(TagEnd::Paragraph) => self.close(Opener::Paragraph),

            Event::Start(Tag::Heading { level, .. }) => {
                self.open(
                    BlockKind::Heading {
                        level: heading_level(level),
                    },
                    Opener::Heading,
                );
            }
            Event::End(TagEnd::Heading(_)) => self.close(Opener::Heading),

            Event::Start(Tag::List(start)) => {
                self.list_stack.push(match start {
                    Some(_) => ListKind::Ordered,
                    None => ListKind::Bullet,
                });
            }
            Event::End(TagEnd::List(_)) => {
                self.list_stack.pop();
            }
            Event::Start(Tag::Item) => {
                let kind = match self.list_stack.last() {
                    Some(ListKind::Ordered) => BlockKind::OrderedList,
                    _ => BlockKind::BulletList,
                };
                self.open(kind, Opener::Item);
            }
            Event::End(TagEnd::Item) => self.close(Opener::Item),
            Event::TaskListMarker(checked) => {
                if let Some((kind, _, _)) = self.current.as_mut() {
                    *kind = BlockKind::TodoList { checked };
                }
            }

            Event::Start(Tag::BlockQuote(_)) => self.quote_depth += 1,
            Event::End(TagEnd::BlockQuote(_)) => {
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }

            Event::Start(Tag::CodeBlock(kind)) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) if !info.trim().is_empty() => {
                        Some(SmolStr::new(info.trim()))
                    }
                    _ => None,
                };
                self.code_text.clear();
                self.open(BlockKind::Code { language }, Opener::Code);
            }
            Event::End(TagEnd::CodeBlock) => {
                // The parser reports fenced content with a trailing newline.
                let mut text = std::mem::take(&mut self.code_text);
                if text.ends_with('\n') {
                    text.pop();
                }
                if let Some((_, runs, _)) = self.current.as_mut()
                    && !text.is_empty()
                {
                    runs.push(InlineRun::plain(text));
                }
                self.close(Opener::Code);
            }

            Event::Start(Tag::Image { dest_url, .. }) => {
                self.image = Some((SmolStr::new(dest_url.as_ref()), String::new()));
            }
            Event::End(TagEnd::Image) => {
                if let Some((src, alt)) = self.image.take() {
                    self.parts
                        .push((BlockKind::Image { src, alt: alt.into() }, Vec::new()));
                }
            }

            Event::Start(Tag::Table(alignments)) => {
                self.in_table = true;
                self.table_cols = alignments.len() as u32;
                self.table_rows = 0;
            }
            Event::Start(Tag::TableHead) | Event::Start(Tag::TableRow) => {
                self.table_rows += 1;
            }
            Event::End(TagEnd::Table) => {
                self.in_table = false;
                self.parts.push((
                    BlockKind::Table {
                        rows: self.table_rows,
                        cols: self.table_cols,
                    },
                    Vec::new(),
                ));
            }

            Event::Rule => self.parts.push((BlockKind::Divider, Vec::new())),

            Event::Start(Tag::Strong) => self.marks.insert(&Mark::Bold),
            Event::End(TagEnd::Strong) => self.marks.remove(MarkKind::Bold),
            Event::Start(Tag::Emphasis) => self.marks.insert(&Mark::Italic),
            Event::End(TagEnd::Emphasis) => self.marks.remove(MarkKind::Italic),
            Event::Start(Tag::Strikethrough) => self.marks.insert(&Mark::Strike),
            Event::End(TagEnd::Strikethrough) => self.marks.remove(MarkKind::Strike),
            Event::Start(Tag::Link { dest_url, .. }) => {
                self.marks
                    .insert(&Mark::Link(SmolStr::new(dest_url.as_ref())));
            }
            Event::End(TagEnd::Link) => self.marks.remove(MarkKind::Link),

            Event::Code(text) => {
                self.open(BlockKind::Paragraph, Opener::Paragraph);
                let marks = self.marks.clone().with(Mark::Code);
                if let Some((_, runs, _)) = self.current.as_mut() {
                    runs.push(InlineRun::marked(text.as_ref(), marks));
                }
            }

            Event::Text(text) => self.push_text(text.as_ref()),
            Event::SoftBreak => self.push_text(" "),
            Event::HardBreak => self.push_text("\n"),
            // Raw HTML carries no model structure; keep it as literal text.
            Event::Html(html) | Event::InlineHtml(html) => self.push_text(html.as_ref()),

            _ => {}
        }
    }
}

/// Parse Markdown (or plain text) into a document.
pub fn from_markdown(input: &str) -> Document {
    let options =
        Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS | Options::ENABLE_TABLES;
    let mut reader = Reader::default();
    for event in Parser::new_ext(input, options) {
        reader.event(event);
    }
    // A dangling open block (unterminated input) still counts.
    if let Some((kind, runs, _)) = reader.current.take() {
        reader.parts.push((kind, runs));
    }
    Document::from_parts(reader.parts)
}

fn inline_markdown(runs: &[InlineRun]) -> String {
    let mut out = String::new();
    for run in runs {
        let mut text = run.text.clone();
        if run.marks.has(MarkKind::Code) {
            text = format!("`{text}`");
        }
        if run.marks.has(MarkKind::Bold) {
            text = format!("**{text}**");
        }
        if run.marks.has(MarkKind::Italic) {
            text = format!("*{text}*");
        }
        if run.marks.has(MarkKind::Strike) {
            text = format!("~~{text}~~");
        }
        if run.marks.has(MarkKind::Underline) {
            text = format!("<u>{text}</u>");
        }
        if let Some(href) = &run.marks.link {
            text = format!("[{text}]({href})");
        }
        out.push_str(&text);
    }
    out
}

fn table_markdown(rows: u32, cols: u32) -> String {
    let cols = cols.max(1) as usize;
    let rows = rows.max(1);
    let blank_row = format!("|{}", "  |".repeat(cols));
    let separator = format!("|{}", " --- |".repeat(cols));
    let mut lines = vec![blank_row.clone(), separator];
    for _ in 1..rows {
        lines.push(blank_row.clone());
    }
    lines.join("\n")
}

/// Render a document as Markdown. Lossy for blocks Markdown cannot
/// express; no trailing newline.
pub fn to_markdown(doc: &Document) -> String {
    let mut out = Vec::with_capacity(doc.len());
    for block in doc.blocks() {
        let rendered = match &block.kind {
            BlockKind::Paragraph => inline_markdown(&block.runs),
            BlockKind::Heading { level } => {
                format!(
                    "{} {}",
                    "#".repeat(usize::from(*level)),
                    inline_markdown(&block.runs)
                )
            }
            BlockKind::BulletList => format!("- {}", inline_markdown(&block.runs)),
            BlockKind::OrderedList => format!("1. {}", inline_markdown(&block.runs)),
            BlockKind::TodoList { checked } => {
                let mark = if *checked { "x" } else { " " };
                format!("- [{mark}] {}", inline_markdown(&block.runs))
            }
            BlockKind::Quote | BlockKind::Callout => {
                format!("> {}", inline_markdown(&block.runs))
            }
            BlockKind::Code { language } => {
                let lang = language.as_deref().unwrap_or("");
                format!("```{lang}\n{}\n```", block.plain_text())
            }
            BlockKind::Image { src, alt } => format!("![{alt}]({src})"),
            BlockKind::Video { src } => format!("<video controls src=\"{src}\"></video>"),
            BlockKind::Table { rows, cols } => table_markdown(*rows, *cols),
            BlockKind::Divider => "---".to_string(),
        };
        out.push(rendered);
    }
    out.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(doc: &Document) -> Vec<BlockKind> {
        doc.blocks().map(|b| b.kind.clone()).collect()
    }

    #[test]
    fn test_plain_text_becomes_literal_paragraphs() {
        let doc = from_markdown("just some words");
        assert_eq!(doc.len(), 1);
        let block = doc.block_at(0).unwrap();
        assert_eq!(block.kind, BlockKind::Paragraph);
        assert_eq!(block.plain_text(), "just some words");
    }

    #[test]
    fn test_headings_and_paragraphs() {
        let doc = from_markdown("# One\n\n## Two\n\nbody\n\n#### Deep");
        assert_eq!(
            kinds(&doc),
            vec![
                BlockKind::Heading { level: 1 },
                BlockKind::Heading { level: 2 },
                BlockKind::Paragraph,
                BlockKind::Heading { level: 3 },
            ]
        );
    }

    #[test]
    fn test_lists_become_one_block_per_item() {
        let doc = from_markdown("- alpha\n- beta\n\n1. first\n2. second");
        assert_eq!(
            kinds(&doc),
            vec![
                BlockKind::BulletList,
                BlockKind::BulletList,
                BlockKind::OrderedList,
                BlockKind::OrderedList,
            ]
        );
        assert_eq!(doc.block_at(0).unwrap().plain_text(), "alpha");
        assert_eq!(doc.block_at(3).unwrap().plain_text(), "second");
    }

    #[test]
    fn test_task_list_markers() {
        let doc = from_markdown("- [x] done\n- [ ] open");
        assert_eq!(
            kinds(&doc),
            vec![
                BlockKind::TodoList { checked: true },
                BlockKind::TodoList { checked: false },
            ]
        );
    }

    #[test]
    fn test_quote_and_divider() {
        let doc = from_markdown("> wisdom\n\n---");
        assert_eq!(kinds(&doc), vec![BlockKind::Quote, BlockKind::Divider]);
        assert_eq!(doc.block_at(0).unwrap().plain_text(), "wisdom");
    }

    #[test]
    fn test_fenced_code_keeps_language_and_text() {
        let doc = from_markdown("```rust\nfn main() {}\n```");
        let block = doc.block_at(0).unwrap();
        assert_eq!(
            block.kind,
            BlockKind::Code {
                language: Some("rust".into())
            }
        );
        assert_eq!(block.plain_text(), "fn main() {}");
    }

    #[test]
    fn test_standalone_image_becomes_image_block() {
        let doc = from_markdown("![a cat](https://example.com/cat.png)");
        assert_eq!(doc.len(), 1);
        assert_eq!(
            doc.block_at(0).unwrap().kind,
            BlockKind::Image {
                src: "https://example.com/cat.png".into(),
                alt: "a cat".into(),
            }
        );
    }

    #[test]
    fn test_inline_marks_survive_ingestion() {
        let doc = from_markdown("**bold** and *italic* and `code` and [link](https://x.io)");
        let block = doc.block_at(0).unwrap();
        assert_eq!(block.plain_text(), "bold and italic and code and link");
        let bold = &block.runs[0];
        assert!(bold.marks.has(MarkKind::Bold));
        let link = block.runs.last().unwrap();
        assert_eq!(link.marks.link.as_deref(), Some("https://x.io"));
    }

    #[test]
    fn test_soft_break_joins_with_space() {
        let doc = from_markdown("line one\nline two");
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.block_at(0).unwrap().plain_text(), "line one line two");
    }

    #[test]
    fn test_table_shape_is_recovered() {
        let doc = from_markdown("| a | b |\n| --- | --- |\n| 1 | 2 |\n| 3 | 4 |");
        assert_eq!(kinds(&doc), vec![BlockKind::Table { rows: 3, cols: 2 }]);
    }

    #[test]
    fn test_export_shapes() {
        use crate::inline::Mark;
        let doc = Document::from_parts(vec![
            (
                BlockKind::Heading { level: 2 },
                vec![InlineRun::plain("Title")],
            ),
            (
                BlockKind::Paragraph,
                vec![
                    InlineRun::plain("see "),
                    InlineRun::marked("this", MarkSet::new().with(Mark::Bold)),
                ],
            ),
            (BlockKind::TodoList { checked: true }, vec![InlineRun::plain("ship")]),
            (BlockKind::Divider, vec![]),
        ]);
        assert_eq!(
            to_markdown(&doc),
            "## Title\n\nsee **this**\n\n- [x] ship\n\n---"
        );
    }

    #[test]
    fn test_export_ingest_round_trip_keeps_structure() {
        let doc = from_markdown("# T\n\npara **b**\n\n- item\n\n> q\n\n```\ncode\n```");
        let again = from_markdown(&to_markdown(&doc));
        assert_eq!(kinds(&doc), kinds(&again));
        assert_eq!(
            doc.blocks().map(|b| b.plain_text()).collect::<Vec<_>>(),
            again.blocks().map(|b| b.plain_text()).collect::<Vec<_>>(),
        );
    }
}
