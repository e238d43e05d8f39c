//! Lossless text chunking.
//!
//! The synthesis backend rejects requests above a fixed character count, so
//! long documents are split into chunks before fan-out.  [`split_text`] is
//! the single entry point; its contract:
//!
//! * Concatenating the chunk texts in index order reproduces the input
//!   **byte for byte** — no trimming, no collapsed whitespace.
//! * Every chunk holds at most `limit` characters (Unicode scalar values,
//!   not bytes).
//! * A word (maximal run of non-whitespace) is never split across chunks.
//!   Whitespace runs may be split when they alone exceed the remaining
//!   capacity.
//! * Empty input yields exactly one empty chunk, so downstream stages never
//!   see a zero-chunk run.

use thiserror::Error;

// ---------------------------------------------------------------------------
// ChunkError
// ---------------------------------------------------------------------------

/// Errors from the chunker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkError {
    /// A single unbreakable word is longer than the chunk limit, so no
    /// word-preserving split exists.
    #[error("cannot chunk: a {word_chars}-character word exceeds the {limit}-character limit")]
    WordTooLong { word_chars: usize, limit: usize },
}

// ---------------------------------------------------------------------------
// Chunk
// ---------------------------------------------------------------------------

/// One slice of the source text, tagged with its position.
///
/// Indices are dense: a successful split yields indices `0..n` exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based position of this chunk within the document.
    pub index: usize,

    /// The chunk's text.  May be empty only for the single chunk of an
    /// empty document.
    pub text: String,
}

impl Chunk {
    /// Character count (Unicode scalar values) of the chunk text.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

// ---------------------------------------------------------------------------
// split_text
// ---------------------------------------------------------------------------

/// Split `text` into chunks of at most `limit` characters without ever
/// breaking a word.
///
/// # Errors
///
/// [`ChunkError::WordTooLong`] when any single word exceeds `limit` (or when
/// `limit` is zero and the input is non-empty, since nothing fits).
pub fn split_text(text: &str, limit: usize) -> Result<Vec<Chunk>, ChunkError> {
    // An empty document still produces one (empty) chunk so the rest of the
    // pipeline always has a chunk 0 to work with.
    if text.is_empty() {
        return Ok(vec![Chunk {
            index: 0,
            text: String::new(),
        }]);
    }

    // A zero limit can hold nothing at all.
    if limit == 0 {
        return Err(ChunkError::WordTooLong {
            word_chars: text.chars().count(),
            limit,
        });
    }

    let mut chunks: Vec<Chunk> = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for run in runs(text) {
        let run_chars = run.chars().count();
        let is_whitespace = run.chars().next().is_some_and(char::is_whitespace);

        if !is_whitespace {
            // Words move whole.  Start a new chunk when this one is full.
            if run_chars > limit {
                return Err(ChunkError::WordTooLong {
                    word_chars: run_chars,
                    limit,
                });
            }
            if current_chars + run_chars > limit {
                chunks.push(Chunk {
                    index: chunks.len(),
                    text: std::mem::take(&mut current),
                });
                current_chars = 0;
            }
            current.push_str(run);
            current_chars += run_chars;
        } else {
            // Whitespace may be cut wherever capacity runs out; every
            // character is still kept so the round trip stays exact.
            let mut rest = run;
            let mut rest_chars = run_chars;
            while current_chars + rest_chars > limit {
                let take = limit - current_chars;
                let cut = char_boundary(rest, take);
                current.push_str(&rest[..cut]);
                chunks.push(Chunk {
                    index: chunks.len(),
                    text: std::mem::take(&mut current),
                });
                current_chars = 0;
                rest = &rest[cut..];
                rest_chars -= take;
            }
            current.push_str(rest);
            current_chars += rest_chars;
        }
    }

    if !current.is_empty() {
        chunks.push(Chunk {
            index: chunks.len(),
            text: current,
        });
    }

    Ok(chunks)
}

/// Split `text` into maximal runs that are either all-whitespace or
/// all-non-whitespace, preserving every byte.
fn runs(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut rest = text;
    while let Some(first) = rest.chars().next() {
        let is_whitespace = first.is_whitespace();
        let end = rest
            .char_indices()
            .find(|&(_, c)| c.is_whitespace() != is_whitespace)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        out.push(&rest[..end]);
        rest = &rest[end..];
    }
    out
}

/// Byte offset of the `n`-th character of `s` (or `s.len()` when `n` is past
/// the end).
fn char_boundary(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
