//! Run orchestration: input → content → profile → reports → soundtrack.
//!
//! # Architecture
//!
//! ```text
//! PipelineRequest
//!        │
//!        ▼
//! create_output_dir()            output_{kind}_{id}_{timestamp}_{uuid8}/
//!        │
//!        ├─ Extracting   WebtoonExtractor (URL or files) | process_novel_file
//!        ├─ Analyzing    ProfileExtractor ─► keywords_info.txt, chart PNG
//!        ├─ Composing    MusicGenerator ─► generated_music.wav (+ finishing)
//!        └─ Done         summary.txt
//!
//! SharedState (Arc<Mutex<RunState>>) ←── updated at every transition
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use webtoon_music::config::AppConfig;
//! use webtoon_music::pipeline::{new_shared_state, ContentKind, PipelineRequest, PipelineRunner};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::load()?;
//!     let runner = PipelineRunner::from_config(&config, new_shared_state());
//!     let outcome = runner
//!         .run(PipelineRequest::new(ContentKind::Novel, "novel.txt"))
//!         .await?;
//!     println!("{}", outcome.music_path.display());
//!     Ok(())
//! }
//! ```

pub mod runner;
pub mod state;

use std::fmt;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use runner::{Engines, PipelineError, PipelineOutcome, PipelineRunner};
pub use state::{new_shared_state, PipelineState, RunState, SharedState};

/// Default file name of the generated soundtrack.
pub const DEFAULT_OUTPUT_NAME: &str = "generated_music.wav";

/// Longest input identifier embedded in a run directory name.
const MAX_IDENTIFIER_CHARS: usize = 20;

// ---------------------------------------------------------------------------
// ContentKind / PipelineRequest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ContentKind {
    Webtoon,
    Novel,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Webtoon => "webtoon",
            ContentKind::Novel => "novel",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One run of the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub kind: ContentKind,
    /// Webtoon URL, comma-separated image paths, or a novel `.txt` path.
    pub input: String,
    /// File name of the soundtrack; only its last path component is used.
    pub output_name: Option<String>,
    /// Reuse cached extraction results.
    pub use_cache: bool,
}

impl PipelineRequest {
    pub fn new(kind: ContentKind, input: impl Into<String>) -> Self {
        Self {
            kind,
            input: input.into(),
            output_name: None,
            use_cache: false,
        }
    }

    /// The soundtrack's file name inside the run directory.
    pub fn output_file_name(&self) -> String {
        self.output_name
            .as_deref()
            .and_then(|n| Path::new(n).file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_OUTPUT_NAME.to_string())
    }
}

// ---------------------------------------------------------------------------
// Run directory
// ---------------------------------------------------------------------------

/// Short identifier of the input used in the run directory name.
///
/// Webtoons use the last URL path segment without its query; novels use the
/// file name up to the first `.`.
pub fn input_identifier(kind: ContentKind, input: &str) -> String {
    let id = match kind {
        ContentKind::Webtoon => input
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .split('?')
            .next()
            .unwrap_or_default(),
        ContentKind::Novel => Path::new(input)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .split('.')
            .next()
            .unwrap_or_default(),
    };
    id.chars().take(MAX_IDENTIFIER_CHARS).collect()
}

/// Create a fresh `output_{kind}_{identifier}_{YYYYmmdd_HHMMSS}_{uuid8}`
/// directory under `root`.
pub fn create_output_dir(root: &Path, kind: ContentKind, input: &str) -> std::io::Result<PathBuf> {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let unique = uuid::Uuid::new_v4().simple().to_string();
    let dir = root.join(format!(
        "output_{kind}_{}_{timestamp}_{}",
        input_identifier(kind, input),
        &unique[..8]
    ));
    std::fs::create_dir_all(&dir)?;
    log::info!("Created output directory: {}", dir.display());
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn webtoon_identifier_drops_query() {
        assert_eq!(
            input_identifier(
                ContentKind::Webtoon,
                "https://comic.example.com/webtoon/detail?titleId=1&no=2"
            ),
            "detail"
        );
    }

    #[test]
    fn novel_identifier_is_stem_before_first_dot() {
        assert_eq!(
            input_identifier(ContentKind::Novel, "/books/my.novel.txt"),
            "my"
        );
    }

    #[test]
    fn identifier_is_truncated() {
        let id = input_identifier(ContentKind::Novel, "abcdefghijklmnopqrstuvwxyz.txt");
        assert_eq!(id, "abcdefghijklmnopqrst");
        let korean = input_identifier(ContentKind::Novel, &format!("{}.txt", "가".repeat(30)));
        assert_eq!(korean.chars().count(), 20);
    }

    #[test]
    fn output_dir_layout() {
        let root = tempdir().unwrap();
        let dir = create_output_dir(root.path(), ContentKind::Novel, "story.txt").unwrap();
        assert!(dir.is_dir());

        let name = dir.file_name().unwrap().to_str().unwrap().to_string();
        let parts: Vec<&str> = name.split('_').collect();
        // output, novel, story, date, time, uuid8
        assert_eq!(parts.len(), 6);
        assert_eq!(&parts[..3], &["output", "novel", "story"]);
        assert_eq!(parts[3].len(), 8);
        assert_eq!(parts[4].len(), 6);
        assert_eq!(parts[5].len(), 8);
    }

    #[test]
    fn two_runs_get_distinct_dirs() {
        let root = tempdir().unwrap();
        let a = create_output_dir(root.path(), ContentKind::Webtoon, "https://x/ep1").unwrap();
        let b = create_output_dir(root.path(), ContentKind::Webtoon, "https://x/ep1").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn output_file_name_uses_basename() {
        let mut req = PipelineRequest::new(ContentKind::Novel, "a.txt");
        assert_eq!(req.output_file_name(), DEFAULT_OUTPUT_NAME);
        req.output_name = Some("/tmp/elsewhere/theme.wav".into());
        assert_eq!(req.output_file_name(), "theme.wav");
    }

    #[test]
    fn kind_display() {
        assert_eq!(ContentKind::Webtoon.to_string(), "webtoon");
        assert_eq!(ContentKind::Novel.as_str(), "novel");
    }
}
