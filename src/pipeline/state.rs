//! Pipeline state machine.
//!
//! [`PipelineState`] tracks a run through its stages.  The transitions are
//! strictly linear:
//!
//! ```text
//! Start ──chunk──▶ AreaReady ──▶ Synthesized ──▶ Written ──▶ Assembled
//!                                                              │
//!                                              Published ◀─────┘
//! any stage ──error──▶ Failed(kind)
//! Published / Failed ──▶ CleaningUp ──▶ Done  (cleanup always runs)
//! ```
//!
//! [`FailureKind`] names the stage a run died in; the orchestrator logs it
//! and callers can match on it without parsing error strings.

// ---------------------------------------------------------------------------
// FailureKind
// ---------------------------------------------------------------------------

/// The stage a failed run died in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// A word longer than the chunk limit made chunking impossible.
    Chunking,
    /// The working area could not be created.
    AreaSetup,
    /// A synthesis request failed.
    Synthesis,
    /// A chunk file could not be written.
    ChunkWrite,
    /// ffmpeg concatenation failed or the binary was missing.
    Concatenation,
    /// The upload to the object store failed.
    Publish,
}

impl FailureKind {
    /// Short lowercase name for log lines.
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::Chunking => "chunking",
            FailureKind::AreaSetup => "area-setup",
            FailureKind::Synthesis => "synthesis",
            FailureKind::ChunkWrite => "chunk-write",
            FailureKind::Concatenation => "concatenation",
            FailureKind::Publish => "publish",
        }
    }
}

// ---------------------------------------------------------------------------
// PipelineState
// ---------------------------------------------------------------------------

/// States of a synthesis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Run accepted; nothing has happened yet.
    Start,

    /// The working area exists and is empty.
    AreaReady,

    /// Every chunk has synthesized audio, in index order.
    Synthesized,

    /// All chunk files are on disk in the working area.
    Written,

    /// The single output MP3 exists.
    Assembled,

    /// The object store holds the episode.
    Published,

    /// A stage failed; the run's error carries the detail.
    Failed(FailureKind),

    /// Working-area teardown is in progress.  Entered on success and on
    /// failure alike.
    CleaningUp,

    /// The run is over and the working area is gone (or its removal was
    /// logged as a warning).
    Done,
}

impl PipelineState {
    /// A short human-readable label suitable for log lines.
    pub fn label(&self) -> &'static str {
        match self {
            PipelineState::Start => "Start",
            PipelineState::AreaReady => "AreaReady",
            PipelineState::Synthesized => "Synthesized",
            PipelineState::Written => "Written",
            PipelineState::Assembled => "Assembled",
            PipelineState::Published => "Published",
            PipelineState::Failed(_) => "Failed",
            PipelineState::CleaningUp => "CleaningUp",
            PipelineState::Done => "Done",
        }
    }

    /// Whether the run has reached a resting state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done)
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        PipelineState::Start
    }
}

/// Move `state` to `next`, logging the transition.
pub(crate) fn advance(state: &mut PipelineState, next: PipelineState) {
    log::debug!("pipeline: {} -> {}", state.label(), next.label());
    *state = next;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
