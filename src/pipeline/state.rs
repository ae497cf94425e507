//! Pipeline state machine and shared run state.
//!
//! [`PipelineState`] tracks which stage a run is in. [`RunState`] holds
//! everything a caller may want to report while the run progresses; it is
//! shared through [`SharedState`].

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::analysis::ContentProfile;

// ---------------------------------------------------------------------------
// PipelineState
// ---------------------------------------------------------------------------

/// Stages of one content-to-soundtrack run.
///
/// ```text
/// Idle ──run──▶ Extracting ──content──▶ Analyzing ──profile──▶ Composing ──wav──▶ Done
/// any state ──error──▶ Error
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    /// No run started yet.
    #[default]
    Idle,

    /// Scraping, OCR or novel parsing is running.
    Extracting,

    /// Keywords and tags are being derived.
    Analyzing,

    /// Segments are being generated and stitched.
    Composing,

    /// The soundtrack and all reports are written.
    Done,

    /// The run aborted; see [`RunState::error_message`].
    Error,
}

impl PipelineState {
    /// Returns `true` while a run is in progress.
    ///
    /// ```
    /// use webtoon_music::pipeline::PipelineState;
    ///
    /// assert!(!PipelineState::Idle.is_busy());
    /// assert!(PipelineState::Extracting.is_busy());
    /// assert!(PipelineState::Composing.is_busy());
    /// assert!(!PipelineState::Done.is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            PipelineState::Extracting | PipelineState::Analyzing | PipelineState::Composing
        )
    }

    /// A short human-readable label for progress output.
    pub fn label(&self) -> &'static str {
        match self {
            PipelineState::Idle => "Idle",
            PipelineState::Extracting => "Extracting content",
            PipelineState::Analyzing => "Analyzing",
            PipelineState::Composing => "Composing",
            PipelineState::Done => "Done",
            PipelineState::Error => "Error",
        }
    }
}

// ---------------------------------------------------------------------------
// RunState
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct RunState {
    pub pipeline: PipelineState,

    /// Run directory, once created.
    pub output_dir: Option<PathBuf>,

    /// Profile derived during `Analyzing`.
    pub profile: Option<ContentProfile>,

    /// Final WAV path when `pipeline == Done`.
    pub music_path: Option<PathBuf>,

    /// Error message when `pipeline == Error`.
    pub error_message: Option<String>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// SharedState
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`RunState`].
///
/// Do not hold the lock across `.await` points.
pub type SharedState = Arc<Mutex<RunState>>;

pub fn new_shared_state() -> SharedState {
    Arc::new(Mutex::new(RunState::new()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
