//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.
//! Every section is `#[serde(default)]`, so a partial `settings.toml` only
//! needs to name the values it overrides.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::music::FadeCurve;

// ---------------------------------------------------------------------------
// VisionConfig
// ---------------------------------------------------------------------------

/// Settings for the image-understanding backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// When `false` webtoon images contribute no visual keywords.
    pub enabled: bool,
    /// Base URL of an OpenAI-compatible API (`/v1/chat/completions`).
    pub base_url: String,
    /// API key. Overridden by `OPENAI_API_KEY` or `--api-key`.
    pub api_key: Option<String>,
    /// Vision-capable model identifier.
    pub model: String,
    /// Upper bound on the length of the analysis reply.
    pub max_tokens: u32,
    /// Maximum seconds to wait for one analysis request.
    pub timeout_secs: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.openai.com".into(),
            api_key: None,
            model: "gpt-4o".into(),
            max_tokens: 200,
            timeout_secs: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// OcrConfig
// ---------------------------------------------------------------------------

/// Settings for the Tesseract OCR command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Executable name or absolute path of `tesseract`.
    pub command: String,
    /// Tesseract language list (e.g. `"kor+eng"`).
    pub languages: String,
    /// Luma threshold used to binarize images before recognition.
    pub binarize_threshold: u8,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            command: "tesseract".into(),
            languages: "kor+eng".into(),
            binarize_threshold: 150,
        }
    }
}

// ---------------------------------------------------------------------------
// ScrapeConfig
// ---------------------------------------------------------------------------

/// Settings for downloading webtoon episodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Browser-like User-Agent sent with every request.
    pub user_agent: String,
    /// Images narrower or shorter than this (icons, buttons) are skipped.
    pub min_image_px: u32,
    /// Number of consecutive panels stacked into one group image.
    pub group_size: usize,
    /// Lower bound of the random delay between image downloads.
    pub min_delay_ms: u64,
    /// Upper bound of the random delay between image downloads.
    pub max_delay_ms: u64,
    /// Image hosts that serve actual comic panels.
    pub allowed_hosts: Vec<String>,
    /// Timeout for each page or image request.
    pub timeout_secs: u64,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                .into(),
            min_image_px: 300,
            group_size: 5,
            min_delay_ms: 500,
            max_delay_ms: 1500,
            allowed_hosts: vec![
                "comic.pstatic.net".into(),
                "image-comic.pstatic.net".into(),
            ],
            timeout_secs: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// KeywordConfig
// ---------------------------------------------------------------------------

/// Settings for keyword extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordConfig {
    /// Final number of keywords kept in a profile.
    pub num_keywords: usize,
    /// Maximal-marginal-relevance diversity (0.0 = pure relevance).
    pub diversity: f32,
    /// Longest keyphrase, in words.
    pub max_ngram: usize,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            num_keywords: 15,
            diversity: 0.7,
            max_ngram: 2,
        }
    }
}

// ---------------------------------------------------------------------------
// MusicConfig
// ---------------------------------------------------------------------------

/// Settings for the text-to-audio backend and segment stitching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MusicConfig {
    /// Base URL of the inference service (`{base_url}/models/{model}`).
    pub base_url: String,
    /// Bearer token. Overridden by `HF_API_TOKEN`.
    pub api_token: Option<String>,
    /// Text-to-audio checkpoint.
    pub model: String,
    /// Number of independently generated segments.
    pub segments: usize,
    /// Token budget per segment (about 20 s of audio for 1000 tokens).
    pub max_new_tokens: u32,
    /// Classifier-free guidance scale.
    pub guidance_scale: f32,
    /// Sample rate of the stitched output.
    pub sample_rate: u32,
    /// Overlap between consecutive segments.
    pub crossfade_ms: u32,
    /// Gain curve applied across the overlap.
    pub fade_curve: FadeCurve,
    /// Maximum seconds to wait for one segment.
    pub timeout_secs: u64,
    /// Reuse a previously generated soundtrack for identical tags.
    pub use_cache: bool,
}

impl Default for MusicConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api-inference.huggingface.co".into(),
            api_token: None,
            model: "facebook/musicgen-small".into(),
            segments: 6,
            max_new_tokens: 1000,
            guidance_scale: 3.0,
            sample_rate: 32_000,
            crossfade_ms: 1000,
            fade_curve: FadeCurve::Linear,
            timeout_secs: 300,
            use_cache: true,
        }
    }
}

// ---------------------------------------------------------------------------
// CacheConfig
// ---------------------------------------------------------------------------

/// Location of the on-disk cache.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// `None` uses [`AppPaths::cache_dir`].
    pub dir: Option<PathBuf>,
}

impl CacheConfig {
    /// The effective cache root.
    pub fn resolve_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| AppPaths::new().cache_dir)
    }
}

// ---------------------------------------------------------------------------
// OutputConfig
// ---------------------------------------------------------------------------

/// Where run directories are created and how the final track is finished.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Parent directory of every `output_*` run directory.
    pub root_dir: PathBuf,
    /// Normalize the final track to this loudness (dBFS), if set.
    pub normalize_dbfs: Option<f32>,
    /// Also write a `<stem>_preview.wav` of this many seconds, if set.
    pub preview_secs: Option<u32>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            normalize_dbfs: None,
            preview_secs: None,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use webtoon_music::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub vision: VisionConfig,
    pub ocr: OcrConfig,
    pub scrape: ScrapeConfig,
    pub keywords: KeywordConfig,
    pub music: MusicConfig,
    pub cache: CacheConfig,
    pub output: OutputConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save to an explicit path, creating parent directories as needed.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Fill credentials from the environment when the file leaves them unset.
    ///
    /// `OPENAI_API_KEY` feeds the vision backend, `HF_API_TOKEN` the music
    /// backend. Values already present in the file win.
    pub fn apply_env(&mut self) {
        if self.vision.api_key.is_none() {
            self.vision.api_key = std::env::var("OPENAI_API_KEY").ok();
        }
        if self.music.api_token.is_none() {
            self.music.api_token = std::env::var("HF_API_TOKEN").ok();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original.vision.base_url, loaded.vision.base_url);
        assert_eq!(original.vision.model, loaded.vision.model);
        assert_eq!(original.ocr.languages, loaded.ocr.languages);
        assert_eq!(original.scrape.allowed_hosts, loaded.scrape.allowed_hosts);
        assert_eq!(original.keywords.num_keywords, loaded.keywords.num_keywords);
        assert_eq!(original.music.model, loaded.music.model);
        assert_eq!(original.music.fade_curve, loaded.music.fade_curve);
        assert_eq!(original.output.root_dir, loaded.output.root_dir);
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config.music.segments, 6);
        assert_eq!(config.ocr.command, "tesseract");
    }

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.vision.model, "gpt-4o");
        assert_eq!(cfg.vision.max_tokens, 200);
        assert!(cfg.vision.api_key.is_none());
        assert_eq!(cfg.ocr.binarize_threshold, 150);
        assert_eq!(cfg.scrape.min_image_px, 300);
        assert_eq!(cfg.scrape.group_size, 5);
        assert_eq!(cfg.scrape.timeout_secs, 60);
        assert_eq!(cfg.keywords.num_keywords, 15);
        assert!((cfg.keywords.diversity - 0.7).abs() < f32::EPSILON);
        assert_eq!(cfg.music.model, "facebook/musicgen-small");
        assert_eq!(cfg.music.max_new_tokens, 1000);
        assert_eq!(cfg.music.crossfade_ms, 1000);
        assert!(cfg.music.use_cache);
        assert!(cfg.cache.dir.is_none());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(
            &path,
            "[music]\nsegments = 3\nfade_curve = \"EqualPower\"\n\n[ocr]\nlanguages = \"eng\"\n",
        )
        .unwrap();

        let cfg = AppConfig::load_from(&path).expect("load");
        assert_eq!(cfg.music.segments, 3);
        assert_eq!(cfg.music.fade_curve, FadeCurve::EqualPower);
        assert_eq!(cfg.music.crossfade_ms, 1000);
        assert_eq!(cfg.ocr.languages, "eng");
        assert_eq!(cfg.ocr.command, "tesseract");
        assert_eq!(cfg.vision.model, "gpt-4o");
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.vision.api_key = Some("sk-test".into());
        cfg.music.api_token = Some("hf-test".into());
        cfg.cache.dir = Some(PathBuf::from("/tmp/wm-cache"));
        cfg.output.normalize_dbfs = Some(-18.0);
        cfg.output.preview_secs = Some(20);
        cfg.scrape.timeout_secs = 15;

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.vision.api_key.as_deref(), Some("sk-test"));
        assert_eq!(loaded.music.api_token.as_deref(), Some("hf-test"));
        assert_eq!(loaded.cache.resolve_dir(), PathBuf::from("/tmp/wm-cache"));
        assert_eq!(loaded.output.normalize_dbfs, Some(-18.0));
        assert_eq!(loaded.output.preview_secs, Some(20));
        assert_eq!(loaded.scrape.timeout_secs, 15);
    }

    #[test]
    fn file_credentials_win_over_env() {
        let mut cfg = AppConfig::default();
        cfg.vision.api_key = Some("from-file".into());
        cfg.apply_env();
        assert_eq!(cfg.vision.api_key.as_deref(), Some("from-file"));
    }
}
