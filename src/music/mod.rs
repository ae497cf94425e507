//! Soundtrack composition.
//!
//! # Architecture
//!
//! ```text
//! ContentProfile ──► prompt::PromptBuilder ──► base prompt + N segment prompts
//!                                                   │
//!                                                   ▼
//!                        AudioBackend (HttpAudioBackend) × N, sequential
//!                                                   │
//!                                 resample ─► stitch::crossfade_append
//!                                                   │
//!                                                   ▼
//!                                 WAV + <stem>_metadata.txt (+ cache)
//! ```

pub mod backend;
pub mod generator;
pub mod prompt;
pub mod resample;
pub mod stitch;
pub mod wav;

use thiserror::Error;

pub use backend::{AudioBackend, GenerationParams, HttpAudioBackend};
pub use generator::MusicGenerator;
pub use prompt::PromptBuilder;
pub use stitch::FadeCurve;
pub use wav::AudioClip;

// ---------------------------------------------------------------------------
// MusicError
// ---------------------------------------------------------------------------

/// Errors that can occur while generating or writing audio.
#[derive(Debug, Error)]
pub enum MusicError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("audio generation timed out")]
    Timeout,

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {body}")]
    Backend { status: u16, body: String },

    /// The returned audio could not be decoded.
    #[error("failed to decode audio: {0}")]
    Decode(String),

    /// The backend returned a clip with no samples.
    #[error("backend returned empty audio")]
    EmptyAudio,

    /// Generation of one segment failed; nothing was cached.
    #[error("segment {index} failed: {source}")]
    Segment {
        index: usize,
        #[source]
        source: Box<MusicError>,
    },

    /// Sample-rate conversion failed.
    #[error("resampling failed: {0}")]
    Resample(String),

    /// WAV encoding failed.
    #[error("failed to encode WAV: {0}")]
    Encode(#[from] hound::Error),

    /// Filesystem error while writing output or cache.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for MusicError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            MusicError::Timeout
        } else {
            MusicError::Request(e.to_string())
        }
    }
}
