//! Audio file handling for the synthesis pipeline.
//!
//! This module provides:
//! * [`write_chunks`] / [`chunk_file_name`] — persist synthesized chunks
//!   into the working area under order-preserving names.
//! * [`assemble`] — losslessly join the chunk files into one MP3 (single
//!   file passes through untouched; multiple files go through ffmpeg's
//!   concat demuxer with `-c copy`).
//! * [`ffmpeg_available`] — startup probe for the external binary.
//! * [`WriteError`] / [`ConcatError`] — error variants for each step.

pub mod concat;
pub mod writer;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use concat::{assemble, ffmpeg_available, ConcatError, OUTPUT_FILE};
pub use writer::{chunk_file_name, write_chunks, WriteError};
