//! Object-store trait and shared types.
//!
//! [`ObjectStore`] is the seam between the publisher and whatever bucket
//! service actually holds the audio.  It is object-safe and `Send + Sync`
//! so it can live behind an `Arc<dyn ObjectStore>`.
//!
//! [`MemoryStore`] (under `#[cfg(test)]`) keeps uploads in a map so tests
//! can assert on exactly what would have been sent over the wire.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

/// Errors from talking to the object store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The upload did not complete within the configured timeout.
    #[error("object upload timed out")]
    Timeout,

    /// The store answered with a non-success status.
    #[error("object store returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// The store's response could not be parsed.
    #[error("failed to parse object store response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            StoreError::Timeout
        } else {
            StoreError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// UploadRequest / PublishedObject
// ---------------------------------------------------------------------------

/// Everything needed to store one object.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Object name (key) inside the bucket.
    pub name: String,

    /// MIME type served back to readers.
    pub content_type: String,

    /// Whether the object should be world-readable.
    pub public: bool,

    /// String key/value pairs stored alongside the object.
    pub metadata: BTreeMap<String, String>,

    /// The object's bytes.
    pub body: Bytes,
}

/// Outcome of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedObject {
    /// Name the store filed the object under.
    pub name: String,

    /// Stored size in bytes.
    pub size: u64,

    /// Whether the object ended up world-readable.
    pub public: bool,

    /// Metadata that was attached.
    pub metadata: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// ObjectStore trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface to a bucket-style object store.
///
/// # Contract
///
/// - Uploading twice under the same name replaces the object (last write
///   wins); callers rely on this for idempotent re-publication.
/// - `Ok` means the object is durably stored under `request.name`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `request.body` under `request.name` and return what was stored.
    async fn upload(&self, request: UploadRequest) -> Result<PublishedObject, StoreError>;
}

// Compile-time assertion: Box<dyn ObjectStore> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn ObjectStore>) {}
};

// ---------------------------------------------------------------------------
// MemoryStore  (test-only)
// ---------------------------------------------------------------------------

/// What the [`MemoryStore`] recorded for one upload.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct StoredEntry {
    pub content_type: String,
    pub public: bool,
    pub metadata: BTreeMap<String, String>,
    pub body: Bytes,
}

/// In-memory [`ObjectStore`] for tests.  Clones share the same backing map.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct MemoryStore {
    objects: std::sync::Arc<std::sync::Mutex<BTreeMap<String, StoredEntry>>>,
    fail: bool,
}

#[cfg(test)]
impl MemoryStore {
    /// Store that accepts every upload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose every upload fails with an API error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Look up a stored object by name.
    pub fn object(&self, name: &str) -> Option<StoredEntry> {
        self.objects.lock().unwrap().get(name).cloned()
    }

    /// Number of distinct objects stored.
    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[async_trait]
impl ObjectStore for MemoryStore {
    async fn upload(&self, request: UploadRequest) -> Result<PublishedObject, StoreError> {
        if self.fail {
            return Err(StoreError::Api {
                status: 500,
                message: "injected failure".into(),
            });
        }

        let size = request.body.len() as u64;
        let published = PublishedObject {
            name: request.name.clone(),
            size,
            public: request.public,
            metadata: request.metadata.clone(),
        };

        self.objects.lock().unwrap().insert(
            request.name,
            StoredEntry {
                content_type: request.content_type,
                public: request.public,
                metadata: request.metadata,
                body: request.body,
            },
        );

        Ok(published)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
