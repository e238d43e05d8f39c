//! Input document model.
//!
//! [`ContentRecord`] is the unit of work fed into the pipeline: the full text
//! of an article plus the metadata that will travel with the published audio.
//! Records arrive as JSON with camelCase field names, produced by the
//! upstream article extractor.
//!
//! The record's [`source_key`](ContentRecord::source_key) — the SHA-256 hex
//! digest of the source URL — names both the scratch directory used during a
//! run and the final published object, so re-running the same URL always
//! lands on the same object.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ---------------------------------------------------------------------------
// ContentRecord
// ---------------------------------------------------------------------------

/// A document ready for synthesis: identity, text, and optional metadata.
///
/// Only `source_url` and `text` are required; every metadata field is
/// optional and omitted from JSON when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    /// Canonical URL of the source document.  This is the record's identity:
    /// the working area and the published object are both named after its
    /// hash.
    pub source_url: String,

    /// Full plain text to synthesize.
    pub text: String,

    /// Document title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Author byline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Publication date, as the upstream extractor emitted it (ISO-8601
    /// string, not parsed here).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,

    /// Short summary / teaser text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,

    /// URL of the document's lead image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_image_url: Option<String>,
}

impl ContentRecord {
    /// Create a record with no metadata.
    pub fn new(source_url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            text: text.into(),
            title: None,
            author: None,
            published_date: None,
            excerpt: None,
            lead_image_url: None,
        }
    }

    /// Deterministic key for this record: lowercase SHA-256 hex of the
    /// source URL.
    ///
    /// ```
    /// use text_to_podcast::content::ContentRecord;
    ///
    /// let record = ContentRecord::new("https://example.com/a", "hello");
    /// let key = record.source_key();
    /// assert_eq!(key.len(), 64);
    /// assert_eq!(key, record.source_key()); // stable across calls
    /// ```
    pub fn source_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.source_url.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
