//! Bounded parallel synthesis with order preservation.
//!
//! [`SynthesisPool::synthesize_all`] turns every [`Chunk`] into an
//! independent task tagged with the chunk's index, runs the tasks under a
//! semaphore so at most `concurrency` requests are in flight, and
//! reassembles the results **by index** into a fixed-size slot table.
//! Arrival order never shows through: chunk 2 finishing before chunk 0
//! still yields `[0, 1, 2]`.
//!
//! The first failed task fails the whole fan-out; the remaining tasks are
//! aborted by dropping the join set.

use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::chunk::Chunk;
use crate::tts::engine::{SpeechSynthesizer, TtsError};

// ---------------------------------------------------------------------------
// SynthesisError
// ---------------------------------------------------------------------------

/// Errors from the synthesis fan-out.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// One chunk's synthesis call failed.  Carries the chunk index so the
    /// failure is attributable in logs.
    #[error("synthesis of chunk {index} failed: {source}")]
    Chunk {
        index: usize,
        #[source]
        source: TtsError,
    },

    /// A task ended without producing a result (panic, cancellation, or a
    /// chunk index outside `0..n`).
    #[error("synthesis fan-out failed: {0}")]
    Task(String),
}

// ---------------------------------------------------------------------------
// AudioChunk
// ---------------------------------------------------------------------------

/// Synthesized MP3 bytes for one chunk, tagged with the chunk's index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    /// Index of the source chunk this audio belongs to.
    pub index: usize,

    /// The MP3 bytes.
    pub audio: Bytes,
}

// ---------------------------------------------------------------------------
// SynthesisPool
// ---------------------------------------------------------------------------

/// Fan-out coordinator: one synthesis task per chunk, bounded concurrency,
/// index-ordered results.
pub struct SynthesisPool {
    engine: Arc<dyn SpeechSynthesizer>,
    concurrency: usize,
}

impl SynthesisPool {
    /// Create a pool running at most `concurrency` requests in parallel.
    /// A bound of zero is treated as one.
    pub fn new(engine: Arc<dyn SpeechSynthesizer>, concurrency: usize) -> Self {
        Self {
            engine,
            concurrency: concurrency.max(1),
        }
    }

    /// Synthesize every chunk and return the audio in chunk-index order.
    ///
    /// The input is expected to carry dense indices `0..n` (the chunker's
    /// output always does); anything else is reported as
    /// [`SynthesisError::Task`] rather than silently misordered.
    ///
    /// # Errors
    ///
    /// Returns the first failure and abandons the remaining tasks.
    pub async fn synthesize_all(
        &self,
        chunks: &[Chunk],
    ) -> Result<Vec<AudioChunk>, SynthesisError> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        log::debug!(
            "tts: fanning out {} chunk(s), concurrency {}",
            chunks.len(),
            self.concurrency
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks: JoinSet<Result<AudioChunk, SynthesisError>> = JoinSet::new();

        for chunk in chunks {
            let engine = Arc::clone(&self.engine);
            let semaphore = Arc::clone(&semaphore);
            let index = chunk.index;
            let text = chunk.text.clone();

            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| SynthesisError::Task(e.to_string()))?;

                let audio = engine
                    .synthesize(&text)
                    .await
                    .map_err(|source| SynthesisError::Chunk { index, source })?;

                log::debug!("tts: chunk {index} done ({} bytes)", audio.len());
                Ok(AudioChunk { index, audio })
            });
        }

        // Fixed-size slot table keyed by index; arrival order is irrelevant.
        let mut slots: Vec<Option<AudioChunk>> = (0..chunks.len()).map(|_| None).collect();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(audio_chunk)) => {
                    let index = audio_chunk.index;
                    if index >= slots.len() {
                        return Err(SynthesisError::Task(format!(
                            "chunk index {index} out of range for {} chunks",
                            slots.len()
                        )));
                    }
                    if slots[index].is_some() {
                        return Err(SynthesisError::Task(format!(
                            "duplicate result for chunk {index}"
                        )));
                    }
                    slots[index] = Some(audio_chunk);
                }
                // First failure wins; dropping `tasks` aborts the stragglers.
                Ok(Err(e)) => return Err(e),
                Err(join_err) => return Err(SynthesisError::Task(join_err.to_string())),
            }
        }

        let mut ordered = Vec::with_capacity(slots.len());
        for (index, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(audio_chunk) => ordered.push(audio_chunk),
                None => {
                    return Err(SynthesisError::Task(format!(
                        "no result produced for chunk {index}"
                    )))
                }
            }
        }

        Ok(ordered)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
