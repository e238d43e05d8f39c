//! Pipeline orchestrator — drives the full chunk → synthesize → write →
//! assemble → publish run for one record.
//!
//! # Pipeline flow
//!
//! ```text
//! ContentRecord
//!   └─▶ split_text                       (pure, before any IO)
//!         ├─▶ workdirs.acquire(key)  ┐   (concurrent)
//!         └─▶ pool.synthesize_all    ┘
//!               └─▶ write_chunks ──▶ assemble ──▶ publisher.publish
//!                                                     └─▶ PublishedObject
//! finally: workdirs.release(key)          (every exit path)
//! ```
//!
//! Stages short-circuit on the first error; there are no retries.  The
//! working area is released by **key** after the stages settle, success or
//! failure, so a one-sided failure of the concurrent acquire/synthesize
//! pair can never orphan the directory.  A release failure is logged as a
//! warning and never replaces the run's outcome.

use std::sync::Arc;

use thiserror::Error;

use crate::audio::{assemble, write_chunks, ConcatError, WriteError};
use crate::chunk::{split_text, ChunkError};
use crate::config::Settings;
use crate::content::ContentRecord;
use crate::store::{ObjectStore, PublishError, PublishedObject, Publisher};
use crate::tts::{SpeechSynthesizer, SynthesisError, SynthesisPool};
use crate::workdir::{WorkDirError, WorkDirManager};

use super::state::{advance, FailureKind, PipelineState};

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

/// First error of a failed run, tagged by stage.
///
/// Working-area *cleanup* failures never appear here: cleanup is non-fatal
/// and only logged.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The text cannot be split under the configured limit.
    #[error("chunking impossible: {0}")]
    Chunking(#[from] ChunkError),

    /// The working area could not be created.
    #[error("working area setup failed: {0}")]
    AreaSetup(#[from] WorkDirError),

    /// A synthesis request failed; the inner error names the chunk.
    #[error("synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    /// A chunk file could not be written.
    #[error("chunk write failed: {0}")]
    ChunkWrite(#[from] WriteError),

    /// Assembly failed (ffmpeg missing or exited nonzero).
    #[error("concatenation failed: {0}")]
    Concatenation(#[from] ConcatError),

    /// The upload to the object store failed.
    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),
}

impl PipelineError {
    /// The stage this error belongs to.
    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineError::Chunking(_) => FailureKind::Chunking,
            PipelineError::AreaSetup(_) => FailureKind::AreaSetup,
            PipelineError::Synthesis(_) => FailureKind::Synthesis,
            PipelineError::ChunkWrite(_) => FailureKind::ChunkWrite,
            PipelineError::Concatenation(_) => FailureKind::Concatenation,
            PipelineError::Publish(_) => FailureKind::Publish,
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Drives one record from text to published episode.
///
/// Create with [`Pipeline::new`], injecting the synthesis backend and the
/// object store behind their traits so tests can swap in mocks.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use text_to_podcast::config::Settings;
/// use text_to_podcast::content::ContentRecord;
/// use text_to_podcast::pipeline::Pipeline;
/// use text_to_podcast::store::GcsStore;
/// use text_to_podcast::tts::GoogleTtsEngine;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = Settings::default();
/// let pipeline = Pipeline::new(
///     &settings,
///     Arc::new(GoogleTtsEngine::from_config(&settings.synthesis)),
///     Arc::new(GcsStore::from_config(&settings.storage)),
/// );
///
/// let record = ContentRecord::new("https://example.com/a", "article text");
/// let published = pipeline.run(&record).await?;
/// println!("published {}", published.name);
/// # Ok(())
/// # }
/// ```
pub struct Pipeline {
    chunk_limit: usize,
    pool: SynthesisPool,
    workdirs: WorkDirManager,
    publisher: Publisher,
}

impl Pipeline {
    /// Build a pipeline from configuration plus the two external seams.
    pub fn new(
        settings: &Settings,
        engine: Arc<dyn SpeechSynthesizer>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            chunk_limit: settings.synthesis.char_limit,
            pool: SynthesisPool::new(engine, settings.synthesis.concurrency),
            workdirs: WorkDirManager::with_root(settings.workspace_root()),
            publisher: Publisher::new(store),
        }
    }

    /// Run the whole pipeline for one record.
    ///
    /// On success the returned [`PublishedObject`] names the stored episode.
    /// On failure the first stage error comes back and the working area has
    /// already been torn down.
    pub async fn run(&self, record: &ContentRecord) -> Result<PublishedObject, PipelineError> {
        let key = record.source_key();
        let mut state = PipelineState::Start;
        log::info!("pipeline: starting run for {}", record.source_url);

        let outcome = self.run_stages(record, &key, &mut state).await;

        if let Err(e) = &outcome {
            advance(&mut state, PipelineState::Failed(e.kind()));
            log::error!("pipeline: run failed during {}: {e}", e.kind().label());
        }

        // Teardown runs on success and on failure alike; its own failure is
        // reported but never replaces the run's outcome.
        advance(&mut state, PipelineState::CleaningUp);
        if let Err(e) = self.workdirs.release(&key).await {
            log::warn!("pipeline: working-area cleanup failed: {e}");
        }
        advance(&mut state, PipelineState::Done);

        if let Ok(published) = &outcome {
            log::info!(
                "pipeline: published {} ({} bytes)",
                published.name,
                published.size
            );
        }
        outcome
    }

    async fn run_stages(
        &self,
        record: &ContentRecord,
        key: &str,
        state: &mut PipelineState,
    ) -> Result<PublishedObject, PipelineError> {
        // 1. Chunk.  Pure; an impossible text fails before any IO happens.
        let chunks = split_text(&record.text, self.chunk_limit)?;
        log::debug!(
            "pipeline: {} chunk(s) at limit {}",
            chunks.len(),
            self.chunk_limit
        );

        // 2. Working area and synthesis are independent prerequisites of the
        //    write step, so they run concurrently.  join! (not try_join!)
        //    lets both settle; the key-addressed release in run() covers the
        //    case where only one of them succeeded.
        let (area, audio_chunks) = {
            let (area_result, synth_result) = tokio::join!(
                self.workdirs.acquire(key),
                self.pool.synthesize_all(&chunks)
            );
            let area = area_result?;
            advance(state, PipelineState::AreaReady);
            let audio_chunks = synth_result?;
            advance(state, PipelineState::Synthesized);
            (area, audio_chunks)
        };

        // 3. Persist the chunks in index order.
        let files = write_chunks(&area, &audio_chunks).await?;
        advance(state, PipelineState::Written);

        // 4. Assemble into a single MP3 (single chunk passes through as-is).
        let audio_path = assemble(&area, &files).await?;
        advance(state, PipelineState::Assembled);

        // 5. Publish under the content-addressed name.
        let published = self.publisher.publish(record, &audio_path).await?;
        advance(state, PipelineState::Published);

        Ok(published)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::ffmpeg_available;
    use crate::store::MemoryStore;
    use crate::tts::{MockSynthesizer, TtsError};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::path::Path;
    use tempfile::tempdir;

    // -----------------------------------------------------------------------
    // Test doubles and helpers
    // -----------------------------------------------------------------------

    /// Synthesizer that emits one structurally valid MP3 frame per call, so
    /// multi-chunk runs can exercise real ffmpeg concatenation.
    struct FrameSynth;

    #[async_trait]
    impl crate::tts::SpeechSynthesizer for FrameSynth {
        async fn synthesize(&self, _text: &str) -> Result<Bytes, TtsError> {
            Ok(Bytes::from(mp3_frame()))
        }
    }

    /// MPEG-1 Layer III frame header (128 kbit/s, 44.1 kHz) plus zero payload.
    fn mp3_frame() -> Vec<u8> {
        let mut frame = vec![0u8; 417];
        frame[..4].copy_from_slice(&[0xFF, 0xFB, 0x90, 0x00]);
        frame
    }

    fn make_settings(root: &Path, char_limit: usize) -> Settings {
        let mut settings = Settings::default();
        settings.workspace.root = Some(root.display().to_string());
        settings.synthesis.char_limit = char_limit;
        settings.synthesis.concurrency = 4;
        settings
    }

    fn make_pipeline(
        settings: &Settings,
        engine: Arc<dyn crate::tts::SpeechSynthesizer>,
        store: &MemoryStore,
    ) -> Pipeline {
        Pipeline::new(settings, engine, Arc::new(store.clone()))
    }

    fn area_path(settings: &Settings, record: &ContentRecord) -> std::path::PathBuf {
        settings.workspace_root().join(record.source_key())
    }

    // -----------------------------------------------------------------------
    // Success paths
    // -----------------------------------------------------------------------

    /// Whole-pipeline fast path: text fits one chunk, the published bytes
    /// are exactly what the backend synthesized, the object is named after
    /// the URL hash, and the working area is gone afterwards.
    #[tokio::test]
    async fn single_chunk_run_publishes_the_bytes_unchanged() {
        let root = tempdir().expect("temp dir");
        let settings = make_settings(root.path(), 5000);
        let store = MemoryStore::new();
        let pipeline = make_pipeline(&settings, Arc::new(MockSynthesizer::new()), &store);

        let text = "word ".repeat(900); // 4500 chars, one chunk
        let mut record = ContentRecord::new("https://ex.com/1", text.clone());
        record.title = Some("T".into());

        let published = pipeline.run(&record).await.expect("run");

        assert_eq!(published.name, format!("{}.mp3", record.source_key()));
        let entry = store.object(&published.name).expect("stored");
        assert_eq!(entry.body, MockSynthesizer::audio_for(&text));
        assert_eq!(entry.content_type, "audio/mpeg");
        assert!(entry.public);
        assert_eq!(entry.metadata.get("title").map(String::as_str), Some("T"));
        assert_eq!(
            entry.metadata.get("url").map(String::as_str),
            Some("https://ex.com/1")
        );
        assert!(
            !area_path(&settings, &record).exists(),
            "working area must be cleaned up"
        );
    }

    /// Empty text still flows through: one empty chunk, one object.
    #[tokio::test]
    async fn empty_text_still_publishes() {
        let root = tempdir().expect("temp dir");
        let settings = make_settings(root.path(), 5000);
        let store = MemoryStore::new();
        let pipeline = make_pipeline(&settings, Arc::new(MockSynthesizer::new()), &store);
        let record = ContentRecord::new("https://ex.com/empty", "");

        let published = pipeline.run(&record).await.expect("run");

        let entry = store.object(&published.name).expect("stored");
        assert_eq!(entry.body, MockSynthesizer::audio_for(""));
        assert!(!area_path(&settings, &record).exists());
    }

    /// Same URL twice lands on the same object name (second run overwrites).
    #[tokio::test]
    async fn republishing_the_same_url_reuses_the_object_name() {
        let root = tempdir().expect("temp dir");
        let settings = make_settings(root.path(), 5000);
        let store = MemoryStore::new();
        let pipeline = make_pipeline(&settings, Arc::new(MockSynthesizer::new()), &store);

        let first_record = ContentRecord::new("https://ex.com/same", "first text");
        let second_record = ContentRecord::new("https://ex.com/same", "second text");

        let first = pipeline.run(&first_record).await.expect("first run");
        let second = pipeline.run(&second_record).await.expect("second run");

        assert_eq!(first.name, second.name);
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.object(&second.name).unwrap().body,
            MockSynthesizer::audio_for("second text")
        );
    }

    /// Multi-chunk happy path through real ffmpeg.
    #[tokio::test]
    async fn multi_chunk_run_concatenates_into_one_object() {
        if !ffmpeg_available().await {
            eprintln!("skipping: ffmpeg not installed");
            return;
        }

        let root = tempdir().expect("temp dir");
        let settings = make_settings(root.path(), 4);
        let store = MemoryStore::new();
        let pipeline = make_pipeline(&settings, Arc::new(FrameSynth), &store);
        // Splits into "aaa ", "bbb ", "ccc" at limit 4.
        let record = ContentRecord::new("https://ex.com/multi", "aaa bbb ccc");

        let published = pipeline.run(&record).await.expect("run");

        let entry = store.object(&published.name).expect("stored");
        assert!(
            entry.body.len() >= 3 * mp3_frame().len(),
            "all three frames must be carried through"
        );
        assert!(!area_path(&settings, &record).exists());
    }

    // -----------------------------------------------------------------------
    // Failure paths
    // -----------------------------------------------------------------------

    /// A too-long word fails before the working area is ever created.
    #[tokio::test]
    async fn impossible_chunking_fails_before_any_io() {
        let root = tempdir().expect("temp dir");
        let settings = make_settings(root.path(), 4);
        let store = MemoryStore::new();
        let pipeline = make_pipeline(&settings, Arc::new(MockSynthesizer::new()), &store);
        let record = ContentRecord::new("https://ex.com/long", "unsplittable");

        let err = pipeline.run(&record).await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::Chunking);
        assert!(store.is_empty());
        assert!(
            !area_path(&settings, &record).exists(),
            "no working area should ever have been created"
        );
    }

    /// Synthesis failing on the second of three chunks fails the run AND the
    /// working area must be gone afterwards, even though acquisition ran
    /// concurrently and succeeded.
    #[tokio::test]
    async fn synthesis_failure_mid_fanout_still_cleans_up() {
        let root = tempdir().expect("temp dir");
        let settings = make_settings(root.path(), 4);
        let store = MemoryStore::new();
        let mock = MockSynthesizer::new().fail_when("bbb");
        let pipeline = make_pipeline(&settings, Arc::new(mock), &store);
        // Splits into "aaa ", "bbb ", "ccc"; chunk 1 fails.
        let record = ContentRecord::new("https://ex.com/fail", "aaa bbb ccc");

        let err = pipeline.run(&record).await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::Synthesis);
        match err {
            PipelineError::Synthesis(SynthesisError::Chunk { index, .. }) => {
                assert_eq!(index, 1)
            }
            other => panic!("expected chunk-tagged synthesis error, got: {other}"),
        }
        assert!(store.is_empty());
        assert!(
            !area_path(&settings, &record).exists(),
            "working area must be released on failure"
        );
    }

    /// A root that is actually a file makes area setup fail; the run reports
    /// the setup error (not the equally doomed cleanup) and publishes nothing.
    #[tokio::test]
    async fn area_setup_failure_keeps_its_own_error() {
        let root = tempdir().expect("temp dir");
        let occupied = root.path().join("occupied");
        std::fs::write(&occupied, b"not a directory").expect("write");

        let mut settings = make_settings(root.path(), 5000);
        settings.workspace.root = Some(occupied.display().to_string());
        let store = MemoryStore::new();
        let pipeline = make_pipeline(&settings, Arc::new(MockSynthesizer::new()), &store);
        let record = ContentRecord::new("https://ex.com/area", "some text");

        let err = pipeline.run(&record).await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::AreaSetup);
        assert!(store.is_empty());
    }

    /// Chunk bytes that no demuxer accepts fail the assembly stage whether
    /// ffmpeg is installed (nonzero exit) or not (missing binary); cleanup
    /// still runs.
    #[tokio::test]
    async fn concat_failure_surfaces_and_cleans_up() {
        let root = tempdir().expect("temp dir");
        let settings = make_settings(root.path(), 4);
        let store = MemoryStore::new();
        let pipeline = make_pipeline(&settings, Arc::new(MockSynthesizer::new()), &store);
        let record = ContentRecord::new("https://ex.com/garbage", "aaa bbb ccc");

        let err = pipeline.run(&record).await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::Concatenation);
        assert!(store.is_empty());
        assert!(!area_path(&settings, &record).exists());
    }

    /// Upload failure is the run's error; the working area is still gone.
    #[tokio::test]
    async fn publish_failure_still_cleans_up() {
        let root = tempdir().expect("temp dir");
        let settings = make_settings(root.path(), 5000);
        let store = MemoryStore::failing();
        let pipeline = make_pipeline(&settings, Arc::new(MockSynthesizer::new()), &store);
        let record = ContentRecord::new("https://ex.com/upload", "short text");

        let err = pipeline.run(&record).await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::Publish);
        assert!(!area_path(&settings, &record).exists());
    }

    // -----------------------------------------------------------------------
    // Error kind mapping
    // -----------------------------------------------------------------------

    #[test]
    fn every_error_variant_maps_to_its_stage() {
        let chunking: PipelineError = ChunkError::WordTooLong {
            word_chars: 10,
            limit: 5,
        }
        .into();
        assert_eq!(chunking.kind(), FailureKind::Chunking);

        let synthesis: PipelineError = SynthesisError::Task("boom".into()).into();
        assert_eq!(synthesis.kind(), FailureKind::Synthesis);

        let concat: PipelineError = ConcatError::NoInput.into();
        assert_eq!(concat.kind(), FailureKind::Concatenation);
    }
}
