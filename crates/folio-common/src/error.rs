//! Error types for folio - the editor's recoverable failure taxonomy.
//!
//! Upload failures are the only errors that cross the editor boundary at
//! runtime; everything else is either recovered locally (deserialization
//! falls back to literal text) or is a caller bug surfaced with a debug
//! assertion rather than an error value.

use miette::Diagnostic;

/// Main error type for folio operations.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum FolioError {
    /// Media upload error from the blob-store collaborator
    #[error(transparent)]
    #[diagnostic(transparent)]
    Upload(#[from] UploadError),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serde(String),
}

/// Error returned by the upload collaborator.
///
/// The editor recovers from these locally: the placeholder block is
/// removed and the host raises a transient notification. Nothing here
/// should ever crash an editing session.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum UploadError {
    /// The storage backend rejected or failed the upload.
    #[error("upload to bucket `{bucket}` failed: {message}")]
    #[diagnostic(code(folio::upload::store))]
    Store {
        bucket: &'static str,
        message: String,
    },

    /// Nothing to upload.
    #[error("refusing to upload an empty file")]
    #[diagnostic(
        code(folio::upload::empty),
        help("the file picker or drop handler produced zero bytes")
    )]
    EmptyFile,
}

impl UploadError {
    /// Wrap a backend failure message for the given bucket.
    pub fn store(bucket: &'static str, message: impl Into<String>) -> Self {
        Self::Store {
            bucket,
            message: message.into(),
        }
    }
}
