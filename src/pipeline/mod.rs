//! Pipeline orchestrator module for text-to-podcast conversion.
//!
//! This module wires the full text → speech → assembly → storage pipeline
//! and tracks each run through an explicit state machine.
//!
//! # Architecture
//!
//! ```text
//! ContentRecord { sourceUrl, text, metadata }
//!        │
//!        ▼
//! Pipeline::run()  ← async, one record per call
//!        │
//!        ├─ split_text             → chunks within the synthesis limit
//!        ├─ ┌ acquire working area ┐
//!        │  └ synthesize chunks    ┘  concurrent, bounded fan-out
//!        ├─ write chunk files         00000.mp3, 00001.mp3, …
//!        ├─ assemble (ffmpeg -c copy; single chunk passes through)
//!        └─ publish                   <sha256(sourceUrl)>.mp3 in the store
//!        │
//!        ▼
//! release working area            ← unconditional, keyed by content hash
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use text_to_podcast::config::Settings;
//! use text_to_podcast::content::ContentRecord;
//! use text_to_podcast::pipeline::Pipeline;
//! use text_to_podcast::store::GcsStore;
//! use text_to_podcast::tts::GoogleTtsEngine;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::default();
//!     let pipeline = Pipeline::new(
//!         &settings,
//!         Arc::new(GoogleTtsEngine::from_config(&settings.synthesis)),
//!         Arc::new(GcsStore::from_config(&settings.storage)),
//!     );
//!
//!     let record = ContentRecord::new("https://example.com/article", "text to narrate");
//!     let published = pipeline.run(&record).await?;
//!     println!("published {} ({} bytes)", published.name, published.size);
//!     Ok(())
//! }
//! ```

pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use runner::{Pipeline, PipelineError};
pub use state::{FailureKind, PipelineState};
