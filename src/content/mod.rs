//! Content extraction.
//!
//! Turns the user's input into text (and, for webtoons, images) the
//! analysis stage can work with:
//!
//! ```text
//! novel .txt ──► novel::process_novel_file ──► NovelContent
//!
//! webtoon URL ─► scrape::parse_page ─► download ─► imaging::stack_vertically
//!                                                   │
//!                                                   ▼
//!                                          ocr::OcrEngine ──► WebtoonContent
//! ```

pub mod imaging;
pub mod novel;
pub mod ocr;
pub mod scrape;
pub mod webtoon;

use thiserror::Error;

pub use novel::{process_novel_file, Chapter, NovelContent};
pub use ocr::{OcrEngine, OcrError, TesseractOcr};
pub use webtoon::{WebtoonContent, WebtoonExtractor};

// ---------------------------------------------------------------------------
// ContentError
// ---------------------------------------------------------------------------

/// Errors that abort content extraction.
///
/// Per-image problems (a failed download, an unreadable panel, an OCR
/// failure) are logged and skipped; only conditions that leave nothing to
/// analyse surface here.
#[derive(Debug, Error)]
pub enum ContentError {
    /// Novel input with an extension other than `.txt`.
    #[error("unsupported file format: {0}. Only .txt files are supported")]
    UnsupportedFormat(String),

    /// Filesystem error while reading input or writing artifacts.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image could not be decoded or encoded.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// The page could not be fetched.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the client timeout.
    #[error("request timed out")]
    Timeout,

    /// The page contains no candidate images.
    #[error("no images found in the webtoon page")]
    NoImages,
}

impl From<reqwest::Error> for ContentError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ContentError::Timeout
        } else {
            ContentError::Request(e.to_string())
        }
    }
}

/// Extracted content of either kind.
#[derive(Debug, Clone)]
pub enum Content {
    Webtoon(WebtoonContent),
    Novel(NovelContent),
}

impl Content {
    pub fn title(&self) -> &str {
        match self {
            Content::Webtoon(w) => &w.title,
            Content::Novel(n) => &n.title,
        }
    }
}
