//! Novel text processing.
//!
//! Reads a UTF-8 `.txt` file, collapses whitespace and splits it into
//! chapters on common Korean/English chapter markers. Results are memoized
//! under `novels/<sha256(file bytes)>.json`.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ContentError;
use crate::cache::{self, DiskCache};

/// Title given to text that precedes the first chapter marker.
pub const PROLOGUE_TITLE: &str = "서문";

/// Default length of [`NovelContent::preview`].
pub const PREVIEW_CHARS: usize = 1000;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

static CHAPTER_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"제\s*\d+\s*장|Chapter\s*\d+|CHAPTER\s*\d+|\d+\s*장|\d+\.\s").expect("valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    pub content: String,
}

/// A processed novel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NovelContent {
    pub title: String,
    pub full_text: String,
    pub chapters: Vec<Chapter>,
    pub word_count: usize,
}

impl NovelContent {
    /// Build from raw file text.
    pub fn from_text(title: &str, raw: &str) -> Self {
        let full_text = WHITESPACE.replace_all(raw, " ").trim().to_string();
        let chapters = split_chapters(&full_text);
        let word_count = full_text.split_whitespace().count();
        Self {
            title: title.to_string(),
            full_text,
            chapters,
            word_count,
        }
    }

    /// First `limit` characters, with `...` appended when truncated.
    pub fn preview(&self, limit: usize) -> String {
        if self.full_text.chars().count() <= limit {
            return self.full_text.clone();
        }
        let mut out: String = self.full_text.chars().take(limit).collect();
        out.push_str("...");
        out
    }
}

/// Split normalized text into chapters.
///
/// Text before the first marker becomes a [`PROLOGUE_TITLE`] chapter when
/// non-empty; each marker titles the text that follows it up to the next
/// marker.
pub fn split_chapters(text: &str) -> Vec<Chapter> {
    let markers: Vec<_> = CHAPTER_MARKER.find_iter(text).collect();
    if markers.is_empty() {
        return vec![Chapter {
            title: PROLOGUE_TITLE.to_string(),
            content: text.trim().to_string(),
        }];
    }

    let mut chapters = Vec::with_capacity(markers.len() + 1);
    let preamble = text[..markers[0].start()].trim();
    if !preamble.is_empty() {
        chapters.push(Chapter {
            title: PROLOGUE_TITLE.to_string(),
            content: preamble.to_string(),
        });
    }
    for (i, m) in markers.iter().enumerate() {
        let end = markers.get(i + 1).map_or(text.len(), |next| next.start());
        chapters.push(Chapter {
            title: m.as_str().trim().to_string(),
            content: text[m.end()..end].trim().to_string(),
        });
    }
    chapters
}

/// Process a novel file, consulting the cache first when `use_cache`.
pub fn process_novel_file(
    path: &Path,
    use_cache: bool,
    cache: Option<&DiskCache>,
) -> Result<NovelContent, ContentError> {
    log::info!("Processing novel file: {}", path.display());

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    if !ext.eq_ignore_ascii_case("txt") {
        return Err(ContentError::UnsupportedFormat(format!(".{ext}")));
    }

    let bytes = std::fs::read(path)?;
    let hash = cache::content_hash(&bytes);

    let cache = cache.filter(|_| use_cache);
    if let Some(cache) = cache {
        if let Some(hit) = cache.get_json::<NovelContent>(cache::NOVELS, &hash) {
            log::info!("Using cached content for: {}", path.display());
            return Ok(hit);
        }
    }

    let raw = String::from_utf8(bytes)
        .map_err(|e| ContentError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
    let title = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let novel = NovelContent::from_text(&title, &raw);
    log::info!(
        "Novel '{}': {} words, {} chapters",
        novel.title,
        novel.word_count,
        novel.chapters.len()
    );

    if let Some(cache) = cache {
        if let Err(e) = cache.put_json(cache::NOVELS, &hash, &novel) {
            log::warn!("Failed to cache novel: {e}");
        }
    }
    Ok(novel)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn collapses_whitespace() {
        let novel = NovelContent::from_text("t", "  one\n\n two\t three  ");
        assert_eq!(novel.full_text, "one two three");
        assert_eq!(novel.word_count, 3);
    }

    #[test]
    fn no_markers_gives_single_prologue() {
        let chapters = split_chapters("just some text");
        assert_eq!(
            chapters,
            vec![Chapter {
                title: "서문".into(),
                content: "just some text".into()
            }]
        );
    }

    #[test]
    fn preamble_and_marker_titles() {
        let chapters = split_chapters("머리말 제 1 장 시작이다 제 2 장 끝이다");
        assert_eq!(chapters.len(), 3);
        assert_eq!(chapters[0].title, "서문");
        assert_eq!(chapters[0].content, "머리말");
        assert_eq!(chapters[1].title, "제 1 장");
        assert_eq!(chapters[1].content, "시작이다");
        assert_eq!(chapters[2].title, "제 2 장");
        assert_eq!(chapters[2].content, "끝이다");
    }

    #[test]
    fn english_markers_without_preamble() {
        let chapters = split_chapters("Chapter 1 The storm. CHAPTER 2 The calm.");
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].title, "Chapter 1");
        assert_eq!(chapters[0].content, "The storm.");
        assert_eq!(chapters[1].title, "CHAPTER 2");
    }

    #[test]
    fn preview_truncates_with_ellipsis() {
        let novel = NovelContent::from_text("t", &"가".repeat(1200));
        let preview = novel.preview(PREVIEW_CHARS);
        assert_eq!(preview.chars().count(), 1003);
        assert!(preview.ends_with("..."));

        let short = NovelContent::from_text("t", "short");
        assert_eq!(short.preview(PREVIEW_CHARS), "short");
    }

    #[test]
    fn rejects_non_txt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("story.pdf");
        std::fs::write(&path, "x").unwrap();
        let err = process_novel_file(&path, false, None).unwrap_err();
        assert!(matches!(err, ContentError::UnsupportedFormat(ext) if ext == ".pdf"));
    }

    #[test]
    fn accepts_uppercase_extension_and_uses_stem_as_title() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("My Story.TXT");
        std::fs::write(&path, "Once upon a time").unwrap();
        let novel = process_novel_file(&path, false, None).unwrap();
        assert_eq!(novel.title, "My Story");
        assert_eq!(novel.word_count, 4);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = process_novel_file(Path::new("/nonexistent/a.txt"), false, None).unwrap_err();
        assert!(matches!(err, ContentError::Io(_)));
    }

    #[test]
    fn cached_result_is_reused() {
        let dir = tempdir().unwrap();
        let cache = DiskCache::new(dir.path().join("cache"));
        let path = dir.path().join("novel.txt");
        std::fs::write(&path, "first version").unwrap();

        let first = process_novel_file(&path, true, Some(&cache)).unwrap();
        assert_eq!(first.full_text, "first version");

        // Tamper with the cached entry; a hit must return it verbatim.
        let hash = cache::content_hash(b"first version");
        let mut tampered = first.clone();
        tampered.title = "from cache".into();
        cache.put_json(cache::NOVELS, &hash, &tampered).unwrap();

        let second = process_novel_file(&path, true, Some(&cache)).unwrap();
        assert_eq!(second.title, "from cache");

        let fresh = process_novel_file(&path, false, Some(&cache)).unwrap();
        assert_eq!(fresh.title, "novel");
    }
}
