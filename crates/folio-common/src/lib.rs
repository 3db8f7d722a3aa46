//! folio-common: shared boundary types for the folio content editor.
//!
//! This crate holds what the editor shares with its host application:
//! the error taxonomy and the blob-store collaborator the media adapter
//! uploads through. Nothing here depends on a UI framework or a runtime.

pub mod error;
pub mod store;

pub use error::{FolioError, UploadError};
pub use store::{BlobStore, MediaKind, object_name, sanitize_file_name};
