//! text-to-podcast — turn saved articles into podcast episodes.
//!
//! Takes a content record (a source URL plus extracted article text),
//! splits the text into synthesis-sized chunks, fans the chunks out to a
//! text-to-speech backend, stitches the returned MP3 fragments into one
//! file with ffmpeg, and publishes the episode to an object store under a
//! name derived from the source URL.
//!
//! # Modules
//!
//! - [`content`] — the input record and its content-addressed key
//! - [`chunk`] — whitespace-aware text splitting under a character limit
//! - [`workdir`] — per-run scratch directories, keyed by content hash
//! - [`tts`] — the synthesis backend trait, Google TTS client, and the
//!   bounded concurrent fan-out
//! - [`audio`] — chunk file layout and ffmpeg concatenation
//! - [`store`] — the object-store trait, GCS client, and episode publishing
//! - [`pipeline`] — the orchestrator tying the stages together
//! - [`config`] — TOML settings for all of the above

pub mod audio;
pub mod chunk;
pub mod config;
pub mod content;
pub mod pipeline;
pub mod store;
pub mod tts;
pub mod workdir;
