//! Blob storage collaborator and object naming policy.
//!
//! The editor never talks to a storage backend directly; it is handed a
//! `BlobStore` by the host and derives bucket and object names itself so
//! that every front-end produces the same layout: one bucket per media
//! kind, object names of the form `{kind}-{unix_millis}-{sanitized_name}`.

use web_time::{SystemTime, UNIX_EPOCH};

use crate::error::UploadError;

/// What kind of media an upload carries. Determines the target bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
    File,
}

impl MediaKind {
    /// The bucket this kind of media is stored in.
    pub fn bucket(&self) -> &'static str {
        match self {
            Self::Image => "images",
            Self::Video => "videos",
            Self::File => "files",
        }
    }

    /// Short prefix used in object names.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::File => "file",
        }
    }
}

/// Storage collaborator for media uploads.
///
/// The host supplies the implementation (object store SDK, HTTP client,
/// in-memory fake for tests). On success the returned string is the
/// public URL of the stored object; the editor treats it as opaque.
pub trait BlobStore {
    async fn upload(
        &self,
        bucket: &'static str,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, UploadError>;
}

/// Replace every character outside `[A-Za-z0-9.-]` with `_`.
///
/// Applied to user-supplied file names before they become object names,
/// so that collisions and path tricks reduce to underscore noise.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Build a collision-resistant object name for an upload.
///
/// Format: `{kind}-{unix_millis}-{sanitized_original_name}`.
pub fn object_name(kind: MediaKind, original_name: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("{}-{}-{}", kind.prefix(), millis, sanitize_file_name(original_name))
}
