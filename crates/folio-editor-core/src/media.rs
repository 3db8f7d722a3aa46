//! Media insertion: placeholder blocks, upload tracking, and the upload
//! pipeline itself.
//!
//! Insertion is split-phase because uploads are slow and the document
//! must stay editable in the meantime. `begin` puts a placeholder block
//! into the document and records it as pending; the host then runs
//! [`upload_media`] (or its own transfer) and reports back with
//! `resolve` or `fail`. A resolution for a block that is no longer
//! pending, or that the user deleted mid-upload, is discarded silently -
//! late uploads must never resurrect removed content.

use std::collections::HashMap;

use tracing::{debug, warn};
use web_time::Instant;

use folio_common::{BlobStore, MediaKind, UploadError, object_name};

use crate::block::{BlockId, BlockKind};
use crate::document::Document;
use crate::inline::{InlineRun, Mark, MarkSet};

/// An upload in flight, keyed by the placeholder block it will fill.
#[derive(Debug, Clone)]
pub struct PendingMedia {
    pub block: BlockId,
    pub kind: MediaKind,
    pub started: Instant,
}

/// Tracks placeholder blocks awaiting an upload result.
#[derive(Debug, Default)]
pub struct MediaTracker {
    pending: HashMap<BlockId, PendingMedia>,
}

fn placeholder(kind: MediaKind, file_name: &str) -> (BlockKind, Vec<InlineRun>) {
    match kind {
        MediaKind::Image => (
            BlockKind::Image {
                src: "".into(),
                alt: file_name.into(),
            },
            Vec::new(),
        ),
        MediaKind::Video => (BlockKind::Video { src: "".into() }, Vec::new()),
        // Generic files have no dedicated block; they resolve to a
        // paragraph whose text links to the stored object.
        MediaKind::File => (BlockKind::Paragraph, vec![InlineRun::plain(file_name)]),
    }
}

impl MediaTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self, block: &BlockId) -> bool {
        self.pending.contains_key(block)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Insert a placeholder block after `anchor` and start tracking it.
    /// Returns `None` (document unchanged) if the anchor is gone.
    pub fn begin(
        &mut self,
        doc: &mut Document,
        anchor: &BlockId,
        kind: MediaKind,
        file_name: &str,
    ) -> Option<BlockId> {
        let (block_kind, runs) = placeholder(kind, file_name);
        let id = doc.insert_block_after(anchor, block_kind, runs)?;
        self.pending.insert(
            id.clone(),
            PendingMedia {
                block: id.clone(),
                kind,
                started: Instant::now(),
            },
        );
        Some(id)
    }

    /// Fill a placeholder with the uploaded object's URL.
    ///
    /// Returns false without touching the document when the block is not
    /// pending (already resolved, failed, or never begun) or when the
    /// user deleted the placeholder while the upload ran.
    pub fn resolve(&mut self, doc: &mut Document, block: &BlockId, url: &str) -> bool {
        let Some(pending) = self.pending.remove(block) else {
            debug!(block = %block, "media resolve for unknown block, discarding");
            return false;
        };
        let Some(existing) = doc.block(block) else {
            debug!(block = %block, "placeholder deleted during upload, discarding");
            return false;
        };
        match pending.kind {
            MediaKind::Image => {
                let alt = match &existing.kind {
                    BlockKind::Image { alt, .. } => alt.clone(),
                    _ => "".into(),
                };
                doc.replace_block(block, BlockKind::Image { src: url.into(), alt }, Vec::new())
            }
            MediaKind::Video => {
                doc.replace_block(block, BlockKind::Video { src: url.into() }, Vec::new())
            }
            MediaKind::File => {
                let runs = existing
                    .runs
                    .iter()
                    .map(|r| {
                        let mut marks = r.marks.clone();
                        marks.insert(&Mark::Link(url.into()));
                        InlineRun::marked(r.text.clone(), marks)
                    })
                    .collect();
                doc.replace_block(block, BlockKind::Paragraph, runs)
            }
        }
    }

    /// Abort a pending upload, removing its placeholder from the document.
    pub fn fail(&mut self, doc: &mut Document, block: &BlockId) -> bool {
        if self.pending.remove(block).is_none() {
            debug!(block = %block, "media fail for unknown block, discarding");
            return false;
        }
        doc.remove_block(block)
    }
}

/// Insert already-hosted media directly, no upload involved.
///
/// The URL is opaque apart from a non-blank check; anything else is the
/// host's problem.
pub fn insert_from_url(
    doc: &mut Document,
    anchor: &BlockId,
    kind: MediaKind,
    url: &str,
) -> Option<BlockId> {
    let url = url.trim();
    if url.is_empty() {
        warn!("refusing to insert media with a blank url");
        return None;
    }
    let (block_kind, runs) = match kind {
        MediaKind::Image => (
            BlockKind::Image {
                src: url.into(),
                alt: "".into(),
            },
            Vec::new(),
        ),
        MediaKind::Video => (BlockKind::Video { src: url.into() }, Vec::new()),
        MediaKind::File => (
            BlockKind::Paragraph,
            vec![InlineRun::marked(
                url,
                MarkSet::new().with(Mark::Link(url.into())),
            )],
        ),
    };
    doc.insert_block_after(anchor, block_kind, runs)
}

/// Upload media bytes through the host's [`BlobStore`].
///
/// Names the object `{kind}-{unix_millis}-{sanitized_name}` in the
/// bucket for `kind` and returns the stored object's public URL.
pub async fn upload_media<S: BlobStore>(
    store: &S,
    kind: MediaKind,
    file_name: &str,
    bytes: Vec<u8>,
    content_type: &str,
) -> Result<String, UploadError> {
    if bytes.is_empty() {
        return Err(UploadError::EmptyFile);
    }
    let name = object_name(kind, file_name);
    store.upload(kind.bucket(), &name, bytes, content_type).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_anchor() -> (Document, BlockId) {
        let doc = Document::new();
        let anchor = doc.first_id();
        (doc, anchor)
    }

    #[test]
    fn test_begin_inserts_tracked_placeholder() {
        let (mut doc, anchor) = doc_with_anchor();
        let mut tracker = MediaTracker::new();
        let id = tracker
            .begin(&mut doc, &anchor, MediaKind::Image, "cat.png")
            .unwrap();
        assert!(tracker.is_pending(&id));
        assert_eq!(
            doc.block(&id).unwrap().kind,
            BlockKind::Image {
                src: "".into(),
                alt: "cat.png".into()
            }
        );
    }

    #[test]
    fn test_resolve_fills_src_and_clears_pending() {
        let (mut doc, anchor) = doc_with_anchor();
        let mut tracker = MediaTracker::new();
        let id = tracker
            .begin(&mut doc, &anchor, MediaKind::Image, "cat.png")
            .unwrap();
        assert!(tracker.resolve(&mut doc, &id, "https://cdn/c.png"));
        assert!(!tracker.is_pending(&id));
        assert_eq!(
            doc.block(&id).unwrap().kind,
            BlockKind::Image {
                src: "https://cdn/c.png".into(),
                alt: "cat.png".into()
            }
        );
    }

    #[test]
    fn test_stale_resolve_is_discarded() {
        let (mut doc, anchor) = doc_with_anchor();
        let mut tracker = MediaTracker::new();
        let id = tracker
            .begin(&mut doc, &anchor, MediaKind::Image, "cat.png")
            .unwrap();
        assert!(tracker.resolve(&mut doc, &id, "https://cdn/c.png"));
        // Second resolution for the same block: nothing changes.
        assert!(!tracker.resolve(&mut doc, &id, "https://cdn/other.png"));
        assert_eq!(
            doc.block(&id).unwrap().kind,
            BlockKind::Image {
                src: "https://cdn/c.png".into(),
                alt: "cat.png".into()
            }
        );
    }

    #[test]
    fn test_resolve_after_user_deleted_placeholder() {
        let (mut doc, anchor) = doc_with_anchor();
        let mut tracker = MediaTracker::new();
        let id = tracker
            .begin(&mut doc, &anchor, MediaKind::Video, "clip.mp4")
            .unwrap();
        doc.remove_block(&id);
        assert!(!tracker.resolve(&mut doc, &id, "https://cdn/clip.mp4"));
        assert!(doc.block(&id).is_none());
    }

    #[test]
    fn test_fail_removes_placeholder() {
        let (mut doc, anchor) = doc_with_anchor();
        let mut tracker = MediaTracker::new();
        let id = tracker
            .begin(&mut doc, &anchor, MediaKind::Image, "cat.png")
            .unwrap();
        assert!(tracker.fail(&mut doc, &id));
        assert!(doc.block(&id).is_none());
        assert!(!tracker.is_pending(&id));
    }

    #[test]
    fn test_concurrent_uploads_resolve_independently() {
        let (mut doc, anchor) = doc_with_anchor();
        let mut tracker = MediaTracker::new();
        let a = tracker
            .begin(&mut doc, &anchor, MediaKind::Image, "a.png")
            .unwrap();
        let b = tracker
            .begin(&mut doc, &anchor, MediaKind::Image, "b.png")
            .unwrap();
        // b finishes first; a stays pending and its placeholder untouched.
        assert!(tracker.resolve(&mut doc, &b, "https://cdn/b.png"));
        assert!(tracker.is_pending(&a));
        assert_eq!(
            doc.block(&b).unwrap().kind,
            BlockKind::Image {
                src: "https://cdn/b.png".into(),
                alt: "b.png".into()
            }
        );
        assert_eq!(
            doc.block(&a).unwrap().kind,
            BlockKind::Image {
                src: "".into(),
                alt: "a.png".into()
            }
        );
        assert!(tracker.resolve(&mut doc, &a, "https://cdn/a.png"));
        assert_eq!(tracker.pending_count(), 0);
    }

    #[test]
    fn test_file_resolves_to_linked_paragraph() {
        let (mut doc, anchor) = doc_with_anchor();
        let mut tracker = MediaTracker::new();
        let id = tracker
            .begin(&mut doc, &anchor, MediaKind::File, "paper.pdf")
            .unwrap();
        assert!(tracker.resolve(&mut doc, &id, "https://cdn/paper.pdf"));
        let block = doc.block(&id).unwrap();
        assert_eq!(block.plain_text(), "paper.pdf");
        assert_eq!(
            block.runs[0].marks.link.as_deref(),
            Some("https://cdn/paper.pdf")
        );
    }

    #[test]
    fn test_insert_from_url_rejects_blank() {
        let (mut doc, anchor) = doc_with_anchor();
        assert!(insert_from_url(&mut doc, &anchor, MediaKind::Image, "   ").is_none());
        assert_eq!(doc.len(), 1);
        let id = insert_from_url(&mut doc, &anchor, MediaKind::Image, "https://cdn/x.png");
        assert!(id.is_some());
    }

    struct FakeStore {
        fail: bool,
    }

    impl BlobStore for FakeStore {
        async fn upload(
            &self,
            bucket: &'static str,
            name: &str,
            _bytes: Vec<u8>,
            _content_type: &str,
        ) -> Result<String, UploadError> {
            if self.fail {
                return Err(UploadError::store(bucket, "boom"));
            }
            Ok(format!("https://cdn.example.com/{bucket}/{name}"))
        }
    }

    #[tokio::test]
    async fn test_upload_media_names_and_buckets() {
        let store = FakeStore { fail: false };
        let url = upload_media(&store, MediaKind::Video, "my clip.mp4", vec![1, 2], "video/mp4")
            .await
            .unwrap();
        assert!(url.starts_with("https://cdn.example.com/videos/video-"));
        assert!(url.ends_with("-my_clip.mp4"));
    }

    #[tokio::test]
    async fn test_upload_media_rejects_empty_bytes() {
        let store = FakeStore { fail: false };
        let err = upload_media(&store, MediaKind::Image, "x.png", Vec::new(), "image/png")
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::EmptyFile));
    }

    #[tokio::test]
    async fn test_upload_media_propagates_store_errors() {
        let store = FakeStore { fail: true };
        let err = upload_media(&store, MediaKind::Image, "x.png", vec![1], "image/png")
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Store { bucket: "images", .. }));
    }
}
