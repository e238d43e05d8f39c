//! Speech synthesis: the backend seam and the bounded fan-out.
//!
//! This module provides:
//! * [`SpeechSynthesizer`] — async trait implemented by all synthesis backends.
//! * [`GoogleTtsEngine`] — Google Cloud TTS REST implementation.
//! * [`SynthesisPool`] — per-chunk fan-out with a concurrency bound and
//!   index-ordered results.
//! * [`AudioChunk`] — MP3 bytes tagged with their chunk index.
//! * [`TtsError`] / [`SynthesisError`] — error variants for one call and for
//!   the whole fan-out.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use text_to_podcast::chunk::split_text;
//! use text_to_podcast::config::Settings;
//! use text_to_podcast::tts::{GoogleTtsEngine, SynthesisPool};
//!
//! #[tokio::main]
//! async fn main() {
//!     let settings = Settings::default();
//!     let engine = Arc::new(GoogleTtsEngine::from_config(&settings.synthesis));
//!     let pool = SynthesisPool::new(engine, settings.synthesis.concurrency);
//!
//!     let chunks = split_text("a very long article", settings.synthesis.char_limit).unwrap();
//!     let audio = pool.synthesize_all(&chunks).await.unwrap();
//!     println!("{} chunk(s) synthesized", audio.len());
//! }
//! ```

pub mod engine;
pub mod fanout;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use engine::{GoogleTtsEngine, SpeechSynthesizer, TtsError};
pub use fanout::{AudioChunk, SynthesisError, SynthesisPool};

#[cfg(test)]
pub use engine::MockSynthesizer;
