//! Google Cloud Storage implementation of [`ObjectStore`].
//!
//! Uses the JSON API's multipart upload: one HTTP POST carrying both the
//! object metadata (name, content type, custom key/values) and the payload
//! bytes.  The body is assembled by hand because the API requires
//! `multipart/related`, while off-the-shelf multipart builders emit
//! `multipart/form-data`, which the endpoint rejects.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use sha2::{Digest, Sha256};

use async_trait::async_trait;

use crate::config::StorageConfig;

use super::object::{ObjectStore, PublishedObject, StoreError, UploadRequest};

// ---------------------------------------------------------------------------
// GcsStore
// ---------------------------------------------------------------------------

/// Production object store backed by a GCS bucket.
///
/// All connection details (endpoint, bucket, bearer token) come from
/// [`StorageConfig`], so tests and emulators can point it anywhere.
pub struct GcsStore {
    client: reqwest::Client,
    config: StorageConfig,
}

impl GcsStore {
    /// Build a store from configuration.
    ///
    /// The HTTP client carries the per-request timeout from
    /// `config.timeout_secs` (uploads of long episodes take a while).  A
    /// default client is the last-resort fallback if the builder fails.
    pub fn from_config(config: &StorageConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn upload_url(&self, public: bool) -> String {
        let acl = if public { "&predefinedAcl=publicRead" } else { "" };
        format!(
            "{}/upload/storage/v1/b/{}/o?uploadType=multipart{}",
            self.config.endpoint, self.config.bucket, acl
        )
    }
}

#[async_trait]
impl ObjectStore for GcsStore {
    async fn upload(&self, request: UploadRequest) -> Result<PublishedObject, StoreError> {
        let boundary = body_boundary(&request.body);
        let body = multipart_related_body(&request, &boundary);
        let url = self.upload_url(request.public);

        let mut req = self
            .client
            .post(&url)
            .header(
                "Content-Type",
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body);
        if !self.config.token.is_empty() {
            req = req.bearer_auth(&self.config.token);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&raw)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
                .unwrap_or(raw);
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))?;

        // The API reports size as a decimal string.
        let name = json["name"]
            .as_str()
            .map(str::to_string)
            .unwrap_or(request.name);
        let size = json["size"]
            .as_str()
            .and_then(|s| s.parse().ok())
            .or_else(|| json["size"].as_u64())
            .unwrap_or(request.body.len() as u64);

        log::debug!("store: uploaded {name} ({size} bytes)");
        Ok(PublishedObject {
            name,
            size,
            public: request.public,
            metadata: request.metadata,
        })
    }
}

// ---------------------------------------------------------------------------
// multipart/related assembly
// ---------------------------------------------------------------------------

/// Boundary string for `body`.  Derived from the payload's own hash, so the
/// payload cannot contain it.
fn body_boundary(body: &[u8]) -> String {
    let digest = Sha256::digest(body);
    format!("upload-{}", BASE64.encode(&digest[..12]).replace(['+', '/'], "-"))
}

/// Render the two-part `multipart/related` body: a JSON metadata part
/// followed by the raw payload part.
fn multipart_related_body(request: &UploadRequest, boundary: &str) -> Vec<u8> {
    let object_resource = serde_json::json!({
        "name":        request.name,
        "contentType": request.content_type,
        "metadata":    request.metadata,
    });

    let mut body = Vec::with_capacity(request.body.len() + 512);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(object_resource.to_string().as_bytes());
    body.extend_from_slice(format!("\r\n--{boundary}\r\n").as_bytes());
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", request.content_type).as_bytes());
    body.extend_from_slice(&request.body);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
