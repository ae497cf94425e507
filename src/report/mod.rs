//! Plain-text artifacts written into each run directory.
//!
//! | File                           | Written when                 |
//! |--------------------------------|------------------------------|
//! | `novel_preview.txt`            | novel input                  |
//! | `keywords_info.txt`            | after profile extraction     |
//! | `keywords_visualization.png`   | after profile extraction     |
//! | `keywords_visualization.txt`   | after profile extraction     |
//! | `summary.txt`                  | after the soundtrack exists  |

pub mod chart;

use std::path::{Path, PathBuf};

use crate::analysis::ContentProfile;
use crate::content::novel::PREVIEW_CHARS;
use crate::content::NovelContent;

pub use chart::keyword_chart;

pub const NOVEL_PREVIEW_FILE: &str = "novel_preview.txt";
pub const KEYWORDS_INFO_FILE: &str = "keywords_info.txt";
pub const KEYWORD_CHART_FILE: &str = "keywords_visualization.png";
pub const SUMMARY_FILE: &str = "summary.txt";

/// Values recorded in `summary.txt`.
#[derive(Debug, Clone)]
pub struct RunSummary<'a> {
    pub content_type: &'a str,
    pub input: &'a str,
    pub music_file: &'a str,
    pub profile: &'a ContentProfile,
}

impl RunSummary<'_> {
    pub fn render(&self, processed_on: chrono::DateTime<chrono::Local>) -> String {
        let p = self.profile;
        format!(
            "Content Type: {}\n\
             Input Source: {}\n\
             Generated Music: {}\n\
             Genre: {}\n\
             Mood: {}\n\
             Era: {}\n\
             Music Style: {}\n\
             Keywords: {}\n\
             Processed on: {}\n",
            self.content_type,
            self.input,
            self.music_file,
            p.genre,
            p.mood,
            p.era,
            p.music_style,
            p.keywords.join(", "),
            processed_on.format("%Y-%m-%d %H:%M:%S"),
        )
    }
}

pub fn keywords_info_text(profile: &ContentProfile) -> String {
    format!(
        "Detected genre: {}\nDetected mood: {}\nDetected era: {}\nSuggested music style: {}\n",
        profile.genre, profile.mood, profile.era, profile.music_style
    )
}

pub fn write_novel_preview(dir: &Path, novel: &NovelContent) -> std::io::Result<PathBuf> {
    let path = dir.join(NOVEL_PREVIEW_FILE);
    std::fs::write(&path, novel.preview(PREVIEW_CHARS))?;
    Ok(path)
}

pub fn write_keywords_info(dir: &Path, profile: &ContentProfile) -> std::io::Result<PathBuf> {
    let path = dir.join(KEYWORDS_INFO_FILE);
    std::fs::write(&path, keywords_info_text(profile))?;
    Ok(path)
}

pub fn write_summary(dir: &Path, summary: &RunSummary<'_>) -> std::io::Result<PathBuf> {
    let path = dir.join(SUMMARY_FILE);
    std::fs::write(&path, summary.render(chrono::Local::now()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn profile() -> ContentProfile {
        ContentProfile {
            keywords: vec!["ocean".into(), "storm".into()],
            genre: "drama".into(),
            mood: "sad".into(),
            era: "modern".into(),
            music_style: "acoustic".into(),
        }
    }

    #[test]
    fn keywords_info_lines() {
        assert_eq!(
            keywords_info_text(&profile()),
            "Detected genre: drama\nDetected mood: sad\nDetected era: modern\n\
             Suggested music style: acoustic\n"
        );
    }

    #[test]
    fn novel_preview_file_is_cut() {
        let dir = tempdir().unwrap();
        let novel = NovelContent::from_text("long", &"가".repeat(PREVIEW_CHARS + 5));
        let path = write_novel_preview(dir.path(), &novel).unwrap();
        let preview = std::fs::read_to_string(path).unwrap();
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), PREVIEW_CHARS + 3);
    }

    #[test]
    fn summary_layout() {
        let p = profile();
        let summary = RunSummary {
            content_type: "novel",
            input: "book.txt",
            music_file: "generated_music.wav",
            profile: &p,
        };
        let when = chrono::Local.with_ymd_and_hms(2024, 3, 1, 9, 5, 7).unwrap();
        let text = summary.render(when);
        assert!(text.starts_with("Content Type: novel\nInput Source: book.txt\n"));
        assert!(text.contains("Keywords: ocean, storm\n"));
        assert!(text.ends_with("Processed on: 2024-03-01 09:05:07\n"));
    }

    #[test]
    fn writes_files() {
        let dir = tempdir().unwrap();
        let info = write_keywords_info(dir.path(), &profile()).unwrap();
        assert!(info.ends_with(KEYWORDS_INFO_FILE));
        assert!(std::fs::read_to_string(info).unwrap().contains("drama"));
    }
}
