//! Publishing the assembled episode.
//!
//! [`Publisher`] names the object after the record's source key, attaches
//! the record's metadata, and hands the bytes to the configured
//! [`ObjectStore`].  The name is fully determined by the source URL, so
//! publishing the same article again overwrites the same object instead of
//! accumulating copies.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tokio::fs;

use crate::content::ContentRecord;

use super::object::{ObjectStore, PublishedObject, StoreError, UploadRequest};

// ---------------------------------------------------------------------------
// PublishError
// ---------------------------------------------------------------------------

/// Errors from the publish step.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The assembled audio file could not be read back.
    #[error("failed to read assembled audio {}: {source}", path.display())]
    ReadAudio {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The object store rejected or failed the upload.
    #[error("upload failed: {0}")]
    Upload(#[from] StoreError),
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

/// Uploads assembled episodes under content-addressed names.
pub struct Publisher {
    store: Arc<dyn ObjectStore>,
}

impl Publisher {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Object name for `record`: `<source key>.mp3`.
    pub fn object_name(record: &ContentRecord) -> String {
        format!("{}.mp3", record.source_key())
    }

    /// Read the audio at `audio_path` and publish it for `record`.
    ///
    /// The object is stored world-readable as `audio/mpeg` with the
    /// record's metadata attached.
    pub async fn publish(
        &self,
        record: &ContentRecord,
        audio_path: &Path,
    ) -> Result<PublishedObject, PublishError> {
        let body = fs::read(audio_path)
            .await
            .map_err(|source| PublishError::ReadAudio {
                path: audio_path.to_path_buf(),
                source,
            })?;

        let request = UploadRequest {
            name: Self::object_name(record),
            content_type: "audio/mpeg".into(),
            public: true,
            metadata: record_metadata(record),
            body: Bytes::from(body),
        };

        log::info!(
            "store: publishing {} ({} bytes)",
            request.name,
            request.body.len()
        );
        Ok(self.store.upload(request).await?)
    }
}

/// Metadata pairs attached to the published object.
///
/// `url` is always present; optional record fields are included only when
/// set, never as empty strings.
pub fn record_metadata(record: &ContentRecord) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    metadata.insert("url".to_string(), record.source_url.clone());

    let optional = [
        ("title", &record.title),
        ("author", &record.author),
        ("excerpt", &record.excerpt),
        ("datePublished", &record.published_date),
        ("leadImageUrl", &record.lead_image_url),
    ];
    for (key, value) in optional {
        if let Some(value) = value {
            metadata.insert(key.to_string(), value.clone());
        }
    }

    metadata
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::object::MemoryStore;
    use tempfile::tempdir;

    fn full_record() -> ContentRecord {
        ContentRecord {
            source_url: "https://example.com/a".into(),
            text: "body".into(),
            title: Some("A Story".into()),
            author: Some("Jane Doe".into()),
            published_date: Some("2020-01-15".into()),
            excerpt: Some("teaser".into()),
            lead_image_url: Some("https://example.com/img.png".into()),
        }
    }

    fn write_audio(dir: &Path, bytes: &[u8]) -> PathBuf {
        let path = dir.join("audio.mp3");
        std::fs::write(&path, bytes).expect("write audio");
        path
    }

    // --- object_name ---

    #[test]
    fn object_name_is_source_key_plus_extension() {
        let record = ContentRecord::new("https://example.com/a", "t");
        let name = Publisher::object_name(&record);
        assert_eq!(name, format!("{}.mp3", record.source_key()));
        assert!(name.ends_with(".mp3"));
        assert_eq!(name.len(), 64 + 4);
    }

    #[test]
    fn object_name_is_idempotent_across_records() {
        let a = ContentRecord::new("https://example.com/a", "first run");
        let b = ContentRecord::new("https://example.com/a", "second run");
        assert_eq!(Publisher::object_name(&a), Publisher::object_name(&b));
    }

    // --- record_metadata ---

    #[test]
    fn metadata_includes_all_present_fields() {
        let metadata = record_metadata(&full_record());
        assert_eq!(metadata.get("url").map(String::as_str), Some("https://example.com/a"));
        assert_eq!(metadata.get("title").map(String::as_str), Some("A Story"));
        assert_eq!(metadata.get("author").map(String::as_str), Some("Jane Doe"));
        assert_eq!(metadata.get("excerpt").map(String::as_str), Some("teaser"));
        assert_eq!(
            metadata.get("datePublished").map(String::as_str),
            Some("2020-01-15")
        );
        assert_eq!(
            metadata.get("leadImageUrl").map(String::as_str),
            Some("https://example.com/img.png")
        );
        assert_eq!(metadata.len(), 6);
    }

    #[test]
    fn absent_fields_are_omitted_not_empty() {
        let record = ContentRecord::new("https://example.com/a", "t");
        let metadata = record_metadata(&record);
        assert_eq!(metadata.len(), 1);
        assert!(metadata.contains_key("url"));
        assert!(!metadata.contains_key("title"));
        assert!(!metadata.contains_key("datePublished"));
    }

    // --- publish ---

    #[tokio::test]
    async fn publish_uploads_the_audio_under_the_hashed_name() {
        let dir = tempdir().expect("temp dir");
        let audio = write_audio(dir.path(), b"EPISODE");
        let store = MemoryStore::new();
        let publisher = Publisher::new(Arc::new(store.clone()));
        let record = full_record();

        let published = publisher.publish(&record, &audio).await.expect("publish");

        assert_eq!(published.name, Publisher::object_name(&record));
        assert_eq!(published.size, 7);
        assert!(published.public);

        let entry = store.object(&published.name).expect("stored");
        assert_eq!(entry.content_type, "audio/mpeg");
        assert!(entry.public);
        assert_eq!(&entry.body[..], b"EPISODE");
        assert_eq!(entry.metadata, record_metadata(&record));
    }

    #[tokio::test]
    async fn publishing_twice_reuses_the_same_name() {
        let dir = tempdir().expect("temp dir");
        let audio = write_audio(dir.path(), b"TAKE-ONE");
        let store = MemoryStore::new();
        let publisher = Publisher::new(Arc::new(store.clone()));
        let record = ContentRecord::new("https://example.com/a", "t");

        let first = publisher.publish(&record, &audio).await.expect("first");
        std::fs::write(&audio, b"TAKE-TWO").expect("rewrite");
        let second = publisher.publish(&record, &audio).await.expect("second");

        assert_eq!(first.name, second.name);
        assert_eq!(store.len(), 1);
        assert_eq!(&store.object(&first.name).unwrap().body[..], b"TAKE-TWO");
    }

    #[tokio::test]
    async fn missing_audio_file_is_a_read_error() {
        let dir = tempdir().expect("temp dir");
        let missing = dir.path().join("never-written.mp3");
        let publisher = Publisher::new(Arc::new(MemoryStore::new()));
        let record = ContentRecord::new("https://example.com/a", "t");

        let err = publisher.publish(&record, &missing).await.unwrap_err();
        assert!(matches!(err, PublishError::ReadAudio { .. }));
    }

    #[tokio::test]
    async fn store_failure_surfaces_as_upload_error() {
        let dir = tempdir().expect("temp dir");
        let audio = write_audio(dir.path(), b"EPISODE");
        let publisher = Publisher::new(Arc::new(MemoryStore::failing()));
        let record = ContentRecord::new("https://example.com/a", "t");

        let err = publisher.publish(&record, &audio).await.unwrap_err();
        assert!(matches!(err, PublishError::Upload(StoreError::Api { .. })));
    }
}
