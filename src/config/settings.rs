//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across
//! threads.  Every field has a default, and missing sections fall back to
//! those defaults, so a partial (or absent) file still yields a working
//! configuration.

use anyhow::Result;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SynthesisConfig
// ---------------------------------------------------------------------------

/// Settings for the text-to-speech backend and the chunking fan-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Base URL of the TTS REST endpoint.
    pub endpoint: String,
    /// API key sent as `X-Goog-Api-Key`; empty disables the header (local
    /// emulators need none).
    pub api_key: String,
    /// BCP-47 language code of the voice.
    pub voice_language: String,
    /// Full voice name (e.g. `"en-US-Wavenet-F"`).
    pub voice_name: String,
    /// SSML gender hint (`"FEMALE"`, `"MALE"`, `"NEUTRAL"`).
    pub voice_gender: String,
    /// Audio effects profiles applied server-side.
    pub effects_profile: Vec<String>,
    /// Maximum characters per synthesis request; longer documents are
    /// chunked to stay under this.
    pub char_limit: usize,
    /// Maximum synthesis requests in flight at once.
    pub concurrency: usize,
    /// Maximum seconds to wait for one synthesis response.
    pub timeout_secs: u64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://texttospeech.googleapis.com".into(),
            api_key: String::new(),
            voice_language: "en-US".into(),
            voice_name: "en-US-Wavenet-F".into(),
            voice_gender: "FEMALE".into(),
            effects_profile: vec!["headphone-class-device".into()],
            char_limit: 5000,
            concurrency: 8,
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// StorageConfig
// ---------------------------------------------------------------------------

/// Settings for the object-store destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base URL of the storage JSON API.
    pub endpoint: String,
    /// Destination bucket name.
    pub bucket: String,
    /// OAuth bearer token; empty disables the `Authorization` header.
    pub token: String,
    /// Maximum seconds to wait for one upload.
    pub timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://storage.googleapis.com".into(),
            bucket: String::new(),
            token: String::new(),
            timeout_secs: 120,
        }
    }
}

// ---------------------------------------------------------------------------
// WorkspaceConfig
// ---------------------------------------------------------------------------

/// Settings for the on-disk working areas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Root directory for per-run scratch areas.  `None` (or empty) means
    /// the system temp directory.
    pub root: Option<String>,
}

// ---------------------------------------------------------------------------
// Settings  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as TOML.
///
/// # Persistence
///
/// ```rust,no_run
/// use text_to_podcast::config::Settings;
///
/// // Load (returns Default when the file is missing)
/// let settings = Settings::load_from(std::path::Path::new("podcast.toml")).unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// TTS backend and fan-out settings.
    pub synthesis: SynthesisConfig,
    /// Object-store destination settings.
    pub storage: StorageConfig,
    /// Working-area settings.
    pub workspace: WorkspaceConfig,
}

impl Settings {
    /// Load from an explicit path.
    ///
    /// Returns `Ok(Settings::default())` when the file does not exist, so
    /// callers never special-case a missing file.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let settings: Self = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Save to an explicit path, creating parent directories as needed.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Root directory for working areas: the configured one, or the system
    /// temp directory when unset.
    pub fn workspace_root(&self) -> std::path::PathBuf {
        match self.workspace.root.as_deref() {
            Some(root) if !root.is_empty() => std::path::PathBuf::from(root),
            _ => std::env::temp_dir(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
