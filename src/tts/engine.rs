//! Core speech-synthesis trait and the Google Cloud TTS implementation.
//!
//! # Overview
//!
//! [`SpeechSynthesizer`] is the seam between the pipeline and the external
//! text-to-speech service.  It is object-safe and `Send + Sync` so it can be
//! held behind an `Arc<dyn SpeechSynthesizer>` and called from many tasks at
//! once.
//!
//! [`GoogleTtsEngine`] is the production implementation: it POSTs to the
//! Cloud TTS REST endpoint and decodes the base64 `audioContent` field of
//! the response into MP3 bytes.
//!
//! [`MockSynthesizer`] (under `#[cfg(test)]`) fabricates deterministic bytes
//! from the input text and supports injected delays and failures, so fan-out
//! ordering and error paths are testable without the network.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::Bytes;
use thiserror::Error;

use crate::config::SynthesisConfig;

// ---------------------------------------------------------------------------
// TtsError
// ---------------------------------------------------------------------------

/// Errors that can arise while synthesizing one chunk of text.
#[derive(Debug, Error)]
pub enum TtsError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("synthesis request timed out")]
    Timeout,

    /// The service answered with a non-success status.
    #[error("synthesis service returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// The response body could not be parsed or decoded.
    #[error("failed to parse synthesis response: {0}")]
    Parse(String),

    /// The service returned no audio bytes at all.
    #[error("synthesis returned empty audio")]
    EmptyAudio,
}

impl From<reqwest::Error> for TtsError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TtsError::Timeout
        } else {
            TtsError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechSynthesizer trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface to a text-to-speech backend.
///
/// # Contract
///
/// - `text` is at most the backend's per-request character limit; the
///   chunker upstream guarantees this.
/// - On success the returned bytes are a complete, self-contained MP3
///   stream for exactly `text`.
/// - An empty result is reported as [`TtsError::EmptyAudio`], never as
///   `Ok` with zero bytes.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` and return the MP3 bytes.
    async fn synthesize(&self, text: &str) -> Result<Bytes, TtsError>;
}

// Compile-time assertion: Box<dyn SpeechSynthesizer> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SpeechSynthesizer>) {}
};

// ---------------------------------------------------------------------------
// GoogleTtsEngine
// ---------------------------------------------------------------------------

/// Production synthesizer that calls the Google Cloud TTS REST API.
///
/// All connection details (endpoint, API key, voice selection, audio
/// profile) come from [`SynthesisConfig`]; nothing is hardcoded, so tests
/// and other deployments can point the engine at any compatible server.
pub struct GoogleTtsEngine {
    client: reqwest::Client,
    config: SynthesisConfig,
}

impl GoogleTtsEngine {
    /// Build an engine from configuration.
    ///
    /// The HTTP client carries the per-request timeout from
    /// `config.timeout_secs`.  A default client is used as a last-resort
    /// fallback if the builder fails (should never happen in practice).
    pub fn from_config(config: &SynthesisConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTtsEngine {
    /// `POST {endpoint}/v1/text:synthesize` and decode the base64
    /// `audioContent` field of the JSON response.
    ///
    /// The `X-Goog-Api-Key` header is attached **only** when the configured
    /// key is non-empty, so a keyless local emulator works unchanged.
    async fn synthesize(&self, text: &str) -> Result<Bytes, TtsError> {
        let url = format!("{}/v1/text:synthesize", self.config.endpoint);

        let body = serde_json::json!({
            "input": { "text": text },
            "voice": {
                "languageCode": self.config.voice_language,
                "name":         self.config.voice_name,
                "ssmlGender":   self.config.voice_gender,
            },
            "audioConfig": {
                "audioEncoding":    "MP3",
                "effectsProfileId": self.config.effects_profile,
            }
        });

        let mut req = self.client.post(&url).json(&body);
        if !self.config.api_key.is_empty() {
            req = req.header("X-Goog-Api-Key", &self.config.api_key);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            // Google wraps failures as {"error": {"message": ...}}; fall back
            // to the raw body for anything else.
            let message = serde_json::from_str::<serde_json::Value>(&raw)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
                .unwrap_or(raw);
            return Err(TtsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TtsError::Parse(e.to_string()))?;

        let encoded = json["audioContent"].as_str().ok_or(TtsError::EmptyAudio)?;
        if encoded.is_empty() {
            return Err(TtsError::EmptyAudio);
        }

        let audio = BASE64
            .decode(encoded)
            .map_err(|e| TtsError::Parse(format!("audioContent is not valid base64: {e}")))?;
        if audio.is_empty() {
            return Err(TtsError::EmptyAudio);
        }

        log::debug!("tts: synthesized {} chars into {} bytes", text.chars().count(), audio.len());
        Ok(Bytes::from(audio))
    }
}

// ---------------------------------------------------------------------------
// MockSynthesizer  (test-only)
// ---------------------------------------------------------------------------

/// A test double that derives its "audio" bytes from the input text, so
/// assertions can predict exact output without any network or codec.
///
/// Delays and failures are keyed by substring of the input text; peak
/// concurrency across all clones is recorded so fan-out bounds can be
/// asserted.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct MockSynthesizer {
    delays: Vec<(String, u64)>,
    failures: Vec<String>,
    active: std::sync::Arc<std::sync::atomic::AtomicUsize>,
    peak: std::sync::Arc<std::sync::atomic::AtomicUsize>,
}

#[cfg(test)]
impl MockSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep `millis` before answering any text containing `needle`.
    pub fn delay_when(mut self, needle: &str, millis: u64) -> Self {
        self.delays.push((needle.to_string(), millis));
        self
    }

    /// Fail any text containing `needle`.
    pub fn fail_when(mut self, needle: &str) -> Self {
        self.failures.push(needle.to_string());
        self
    }

    /// Highest number of concurrently running `synthesize` calls observed
    /// across this mock and all of its clones.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// The deterministic bytes this mock returns for `text`.
    pub fn audio_for(text: &str) -> Bytes {
        Bytes::from(format!("[mp3:{text}]"))
    }
}

#[cfg(test)]
#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Bytes, TtsError> {
        use std::sync::atomic::Ordering;

        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let result = async {
            if let Some((_, millis)) = self
                .delays
                .iter()
                .find(|(needle, _)| text.contains(needle.as_str()))
            {
                tokio::time::sleep(std::time::Duration::from_millis(*millis)).await;
            }
            if self
                .failures
                .iter()
                .any(|needle| text.contains(needle.as_str()))
            {
                return Err(TtsError::Api {
                    status: 500,
                    message: "injected failure".into(),
                });
            }
            Ok(Self::audio_for(text))
        }
        .await;

        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(api_key: &str) -> SynthesisConfig {
        SynthesisConfig {
            api_key: api_key.into(),
            ..SynthesisConfig::default()
        }
    }

    // --- GoogleTtsEngine construction ---

    #[test]
    fn from_config_builds_without_panic() {
        let _engine = GoogleTtsEngine::from_config(&make_config(""));
    }

    #[test]
    fn from_config_accepts_real_api_key() {
        let _engine = GoogleTtsEngine::from_config(&make_config("test-key-1234"));
    }

    /// Verify the engine is usable as `dyn SpeechSynthesizer`.
    #[test]
    fn engine_is_object_safe() {
        let engine: Box<dyn SpeechSynthesizer> =
            Box::new(GoogleTtsEngine::from_config(&make_config("")));
        drop(engine);
    }

    // --- TtsError mapping ---

    #[test]
    fn tts_error_display_api_includes_status() {
        let e = TtsError::Api {
            status: 403,
            message: "forbidden".into(),
        };
        let shown = e.to_string();
        assert!(shown.contains("403"));
        assert!(shown.contains("forbidden"));
    }

    #[test]
    fn tts_error_display_empty_audio() {
        assert!(TtsError::EmptyAudio.to_string().contains("empty"));
    }

    // --- MockSynthesizer ---

    #[tokio::test]
    async fn mock_returns_text_derived_bytes() {
        let mock = MockSynthesizer::new();
        let audio = mock.synthesize("hello").await.unwrap();
        assert_eq!(audio, MockSynthesizer::audio_for("hello"));
        assert_eq!(&audio[..], b"[mp3:hello]");
    }

    #[tokio::test]
    async fn mock_fail_when_matches_substring() {
        let mock = MockSynthesizer::new().fail_when("boom");
        assert!(mock.synthesize("this goes boom").await.is_err());
        assert!(mock.synthesize("this is fine").await.is_ok());
    }

    #[tokio::test]
    async fn mock_clones_share_concurrency_counters() {
        let mock = MockSynthesizer::new();
        let clone = mock.clone();
        clone.synthesize("x").await.unwrap();
        assert!(mock.peak_concurrency() >= 1);
    }
}
