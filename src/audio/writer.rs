//! Chunk file writer.
//!
//! Persists synthesized [`AudioChunk`]s into the working area, one file per
//! chunk.  Names are zero-padded (`00000.mp3`, `00001.mp3`, …) so that
//! lexicographic order equals chunk order; the assembler and any human
//! poking at the directory see the same sequence.

use std::path::PathBuf;

use thiserror::Error;
use tokio::fs;

use crate::tts::AudioChunk;
use crate::workdir::WorkingArea;

// ---------------------------------------------------------------------------
// WriteError
// ---------------------------------------------------------------------------

/// Errors from writing chunk files.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Writing one chunk's file failed.  The batch stops here.
    #[error("failed to write chunk {index} to {}: {source}", path.display())]
    Io {
        index: usize,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// write_chunks
// ---------------------------------------------------------------------------

/// File name for chunk `index`.
///
/// Five digits of zero padding keep lexicographic and numeric order
/// identical for any realistic document.
pub fn chunk_file_name(index: usize) -> String {
    format!("{index:05}.mp3")
}

/// Write every chunk into `area` and return the paths in chunk order.
///
/// Stops at the first failed write; the error names the chunk index and
/// path so the failure is attributable.
pub async fn write_chunks(
    area: &WorkingArea,
    chunks: &[AudioChunk],
) -> Result<Vec<PathBuf>, WriteError> {
    let mut paths = Vec::with_capacity(chunks.len());

    for chunk in chunks {
        let path = area.file(&chunk_file_name(chunk.index));
        fs::write(&path, &chunk.audio)
            .await
            .map_err(|source| WriteError::Io {
                index: chunk.index,
                path: path.clone(),
                source,
            })?;
        log::debug!(
            "audio: wrote chunk {} ({} bytes) to {}",
            chunk.index,
            chunk.audio.len(),
            path.display()
        );
        paths.push(path);
    }

    Ok(paths)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
