//! Keyword and tag extraction for a piece of content.
//!
//! [`ProfileExtractor`] combines three signals into a [`ContentProfile`]:
//! statistical keyphrases of the text, keywords from image analysis
//! (webtoons only) and the dominant lexicon tags with their descriptor
//! words.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analysis::keyphrase::{is_korean_dominant, KeyphraseExtractor};
use crate::analysis::lexicon::{dominant_tags, tag_descriptors};
use crate::analysis::stopwords::{self, ERROR_RELATED};
use crate::analysis::vision::ImageAnalyzer;
use crate::content::{Content, WebtoonContent};

const PADDING_KEYWORDS: &[&str] = &["story", "character", "scene", "emotion", "narrative"];

const FALLBACK_KEYWORDS: &[&str] = &[
    "story",
    "character",
    "narrative",
    "scene",
    "emotion",
    "drama",
    "adventure",
    "fantasy",
    "mystery",
    "journey",
];

static PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));

/// Keywords and dominant tags describing a piece of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentProfile {
    pub keywords: Vec<String>,
    pub genre: String,
    pub mood: String,
    pub era: String,
    pub music_style: String,
}

impl ContentProfile {
    /// Generic profile used when extraction fails.
    pub fn fallback() -> Self {
        Self {
            keywords: FALLBACK_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            genre: "slice_of_life".into(),
            mood: "peaceful".into(),
            era: "modern".into(),
            music_style: "cinematic".into(),
        }
    }
}

fn push_unique(out: &mut Vec<String>, word: &str) {
    if !out.iter().any(|w| w == word) {
        out.push(word.to_string());
    }
}

/// Text to analyse for a webtoon: OCR output, or title and author when the
/// OCR output is empty or looks like an error message.
pub fn webtoon_text(content: &WebtoonContent) -> String {
    let text = content.texts.join(" ");
    let lower = text.to_lowercase();
    if lower.contains("error") || lower.contains("exception") {
        log::info!("Error messages detected in text, using title and author only");
        return format!("{} {}", content.title, content.author);
    }
    if text.trim().is_empty() {
        return format!("{} {}", content.title, content.author);
    }
    text
}

/// The text a profile is built from.
pub fn source_text(content: &Content) -> String {
    match content {
        Content::Webtoon(w) => webtoon_text(w),
        Content::Novel(n) => n.full_text.clone(),
    }
}

// ---------------------------------------------------------------------------
// ProfileExtractor
// ---------------------------------------------------------------------------

pub struct ProfileExtractor {
    analyzer: Option<Arc<dyn ImageAnalyzer>>,
    keyphrases: Arc<dyn KeyphraseExtractor>,
    num_keywords: usize,
}

impl ProfileExtractor {
    /// `analyzer` of `None` disables image keywords.
    pub fn new(
        analyzer: Option<Arc<dyn ImageAnalyzer>>,
        keyphrases: Arc<dyn KeyphraseExtractor>,
        num_keywords: usize,
    ) -> Self {
        Self {
            analyzer,
            keyphrases,
            num_keywords,
        }
    }

    /// Build a profile. Never fails; internal errors yield
    /// [`ContentProfile::fallback`].
    pub async fn extract(&self, content: &Content) -> ContentProfile {
        match self.try_extract(content).await {
            Ok(profile) => profile,
            Err(e) => {
                log::error!("Keyword extraction failed: {e}");
                ContentProfile::fallback()
            }
        }
    }

    async fn try_extract(&self, content: &Content) -> anyhow::Result<ContentProfile> {
        let image_keywords = match content {
            Content::Webtoon(w) => self.image_keywords(w).await,
            Content::Novel(_) => Vec::new(),
        };
        let text = source_text(content).to_lowercase();

        let extractor = Arc::clone(&self.keyphrases);
        let top_n = self.num_keywords;
        let scoring_text = text.clone();
        let phrases = tokio::task::spawn_blocking(move || {
            let (prepared, stop) = if is_korean_dominant(&scoring_text) {
                (scoring_text, stopwords::korean())
            } else {
                (PUNCTUATION.replace_all(&scoring_text, "").into_owned(), stopwords::english())
            };
            extractor.extract(&prepared, stop, top_n)
        })
        .await?;

        let mut keywords: Vec<String> = phrases
            .into_iter()
            .map(|(phrase, _)| phrase)
            .filter(|p| !ERROR_RELATED.iter().any(|err| p.contains(err)))
            .collect();
        keywords.extend(image_keywords);

        let tags = dominant_tags(&text);
        log::info!(
            "Detected genre: {}, mood: {}, era: {}, music style: {}",
            tags.genre,
            tags.mood,
            tags.era,
            tags.music_style
        );
        keywords.extend(tag_descriptors(&tags));

        if keywords.len() < 5 {
            keywords.extend(PADDING_KEYWORDS.iter().map(|s| s.to_string()));
        }

        let mut seen = HashSet::new();
        keywords.retain(|k| seen.insert(k.clone()));
        keywords.truncate(self.num_keywords);

        Ok(ContentProfile {
            keywords,
            genre: tags.genre,
            mood: tags.mood,
            era: tags.era,
            music_style: tags.music_style,
        })
    }

    /// Keywords from every existing group image, or from the combined image
    /// when no group image produced any.
    async fn image_keywords(&self, content: &WebtoonContent) -> Vec<String> {
        let Some(analyzer) = &self.analyzer else {
            return Vec::new();
        };

        let mut out = Vec::new();
        for path in content.group_image_paths.iter().filter(|p| p.exists()) {
            match analyzer.analyze(path).await {
                Ok(kw) => {
                    log::info!("Keywords from group image analysis: {kw:?}");
                    kw.iter().for_each(|k| push_unique(&mut out, k));
                }
                Err(e) => log::warn!("Error in group image analysis: {e}"),
            }
        }

        if out.is_empty() {
            let combined: Option<&PathBuf> = content.combined_image_path.as_ref();
            if let Some(path) = combined.filter(|p| p.exists()) {
                match analyzer.analyze(path).await {
                    Ok(kw) => {
                        log::info!("Keywords from combined image analysis: {kw:?}");
                        out = kw;
                    }
                    Err(e) => log::warn!("Error in combined image analysis: {e}"),
                }
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::keyphrase::StatisticalExtractor;
    use crate::analysis::vision::VisionError;
    use crate::content::NovelContent;
    use async_trait::async_trait;
    use std::path::Path;
    use tempfile::tempdir;

    struct FixedAnalyzer(Vec<String>);

    #[async_trait]
    impl ImageAnalyzer for FixedAnalyzer {
        async fn analyze(&self, _path: &Path) -> Result<Vec<String>, VisionError> {
            Ok(self.0.clone())
        }
    }

    struct PanickingExtractor;

    impl KeyphraseExtractor for PanickingExtractor {
        fn extract(&self, _: &str, _: &HashSet<&'static str>, _: usize) -> Vec<(String, f32)> {
            panic!("model crashed");
        }
    }

    fn novel(text: &str) -> Content {
        Content::Novel(NovelContent::from_text("n", text))
    }

    fn extractor(analyzer: Option<Arc<dyn ImageAnalyzer>>) -> ProfileExtractor {
        ProfileExtractor::new(analyzer, Arc::new(StatisticalExtractor::default()), 15)
    }

    #[tokio::test]
    async fn novel_profile_has_tags_and_descriptors() {
        let text = "The dragon and the wizard used magic. Magic filled the kingdom. \
                    The knight drew his sword at the castle.";
        let profile = extractor(None).extract(&novel(text)).await;

        assert_eq!(profile.genre, "fantasy");
        assert_eq!(profile.era, "medieval");
        assert!(profile.keywords.contains(&"magic".to_string()));
        assert!(profile.keywords.len() <= 15);
        let unique: HashSet<_> = profile.keywords.iter().collect();
        assert_eq!(unique.len(), profile.keywords.len());
    }

    #[tokio::test]
    async fn blank_text_gets_defaults_and_padding() {
        let profile = extractor(None).extract(&novel("")).await;
        assert_eq!(profile.genre, "slice_of_life");
        assert_eq!(profile.mood, "peaceful");
        assert_eq!(profile.era, "modern");
        assert_eq!(profile.music_style, "cinematic");
        // Descriptor words alone already exceed five entries.
        assert!(profile.keywords.contains(&"gentle".to_string()));
        assert_eq!(profile.keywords.len(), 15);
    }

    #[tokio::test]
    async fn error_phrases_are_dropped() {
        let text = "error error error traceback failed missing file missing page sunrise";
        let profile = extractor(None).extract(&novel(text)).await;
        assert!(profile
            .keywords
            .iter()
            .all(|k| !ERROR_RELATED.iter().any(|e| k.contains(e))));
    }

    #[tokio::test]
    async fn truncates_to_num_keywords() {
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
        let profile = ProfileExtractor::new(None, Arc::new(StatisticalExtractor::default()), 4)
            .extract(&novel(text))
            .await;
        assert_eq!(profile.keywords.len(), 4);
    }

    #[tokio::test]
    async fn extractor_panic_yields_fallback() {
        let ex = ProfileExtractor::new(None, Arc::new(PanickingExtractor), 15);
        let profile = ex.extract(&novel("anything")).await;
        assert_eq!(profile, ContentProfile::fallback());
    }

    #[tokio::test]
    async fn webtoon_uses_group_image_keywords() {
        let dir = tempdir().unwrap();
        let group = dir.path().join("group_image_1.jpg");
        std::fs::write(&group, b"stub").unwrap();

        let content = Content::Webtoon(WebtoonContent {
            title: "Title".into(),
            author: "Author".into(),
            group_image_paths: vec![group, dir.path().join("gone.jpg")],
            texts: vec!["a quiet rainy afternoon".into()],
            ..WebtoonContent::default()
        });
        let analyzer: Arc<dyn ImageAnalyzer> =
            Arc::new(FixedAnalyzer(vec!["melancholy_rain".into()]));
        let profile = extractor(Some(analyzer)).extract(&content).await;
        assert!(profile.keywords.contains(&"melancholy_rain".to_string()));
    }

    #[test]
    fn webtoon_text_rejects_error_output() {
        let mut w = WebtoonContent {
            title: "나의 히어로".into(),
            author: "작가".into(),
            texts: vec!["Tesseract Error: no data".into()],
            ..WebtoonContent::default()
        };
        assert_eq!(webtoon_text(&w), "나의 히어로 작가");

        w.texts = vec!["  ".into()];
        assert_eq!(webtoon_text(&w), "나의 히어로 작가");

        w.texts = vec!["안녕".into(), "하세요".into()];
        assert_eq!(webtoon_text(&w), "안녕 하세요");
        assert_eq!(source_text(&Content::Webtoon(w)), "안녕 하세요");
        assert_eq!(source_text(&novel("Once upon a time")), "Once upon a time");
    }
}
