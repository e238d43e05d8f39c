//! Object storage: the store seam, the GCS client, and the publisher.
//!
//! This module provides:
//! * [`ObjectStore`] — async trait implemented by all storage backends.
//! * [`GcsStore`] — Google Cloud Storage JSON-API implementation
//!   (multipart upload, public-read ACL, bearer auth).
//! * [`Publisher`] — names the object `<source key>.mp3`, attaches record
//!   metadata, and uploads the assembled audio.
//! * [`UploadRequest`] / [`PublishedObject`] — what goes in and what comes
//!   back.
//! * [`StoreError`] / [`PublishError`] — error variants per layer.

pub mod gcs;
pub mod object;
pub mod publish;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use gcs::GcsStore;
pub use object::{ObjectStore, PublishedObject, StoreError, UploadRequest};
pub use publish::{record_metadata, PublishError, Publisher};

#[cfg(test)]
pub use object::{MemoryStore, StoredEntry};
