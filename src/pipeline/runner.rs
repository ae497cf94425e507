//! Pipeline runner: drives one request from input to soundtrack.
//!
//! # Pipeline flow
//!
//! ```text
//! run(request)
//!   └─▶ create_output_dir                                   [Extracting]
//!         └─▶ webtoon URL   → WebtoonExtractor::extract_url
//!         └─▶ webtoon files → WebtoonExtractor::extract_files
//!         └─▶ novel         → spawn_blocking(process_novel_file) + preview
//!   └─▶ ProfileExtractor::extract → keywords_info.txt + chart [Analyzing]
//!   └─▶ MusicGenerator::generate → optional normalize/preview [Composing]
//!   └─▶ summary.txt                                          [Done]
//! any error ─▶ [Error] with message
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::analysis::{
    source_text, ContentProfile, FallbackAnalyzer, ImageAnalyzer, KeyphraseExtractor, OpenAiVision,
    ProfileExtractor, StatisticalExtractor,
};
use crate::cache::DiskCache;
use crate::config::{AppConfig, OutputConfig};
use crate::content::{
    process_novel_file, Content, ContentError, OcrEngine, TesseractOcr, WebtoonExtractor,
};
use crate::music::stitch::{normalize, preview, PREVIEW_FADE_OUT_MS};
use crate::music::wav::{read_wav, write_wav};
use crate::music::{AudioBackend, HttpAudioBackend, MusicError, MusicGenerator};
use crate::report::{self, RunSummary};

use super::state::{PipelineState, SharedState};
use super::{create_output_dir, ContentKind, PipelineRequest};

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("content extraction failed: {0}")]
    Content(#[from] ContentError),

    #[error("music generation failed: {0}")]
    Music(#[from] MusicError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal / unexpected error (e.g. tokio join failure).
    #[error("internal error: {0}")]
    Internal(String),
}

// ---------------------------------------------------------------------------
// Engines
// ---------------------------------------------------------------------------

/// The external-service seams a runner calls through.
#[derive(Clone)]
pub struct Engines {
    pub ocr: Arc<dyn OcrEngine>,
    pub analyzer: Option<Arc<dyn ImageAnalyzer>>,
    pub keyphrases: Arc<dyn KeyphraseExtractor>,
    pub audio: Arc<dyn AudioBackend>,
}

impl Engines {
    /// Tesseract OCR, the OpenAI-compatible vision client (when enabled and
    /// a key is configured), statistical keyphrases and the HTTP audio
    /// backend.
    pub fn from_config(config: &AppConfig, cache: &DiskCache) -> Self {
        let has_key = config
            .vision
            .api_key
            .as_deref()
            .is_some_and(|k| !k.is_empty());
        let analyzer: Option<Arc<dyn ImageAnalyzer>> = if config.vision.enabled && has_key {
            Some(Arc::new(FallbackAnalyzer::new(OpenAiVision::from_config(
                &config.vision,
                Some(cache.clone()),
            ))))
        } else {
            log::warn!("Image analysis disabled: no vision API key configured");
            None
        };

        Self {
            ocr: Arc::new(TesseractOcr::from_config(&config.ocr)),
            analyzer,
            keyphrases: Arc::new(StatisticalExtractor::new(
                config.keywords.max_ngram,
                config.keywords.diversity,
            )),
            audio: Arc::new(HttpAudioBackend::from_config(&config.music)),
        }
    }
}

// ---------------------------------------------------------------------------
// PipelineOutcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub output_dir: PathBuf,
    pub music_path: PathBuf,
    pub preview_path: Option<PathBuf>,
    pub profile: ContentProfile,
}

// ---------------------------------------------------------------------------
// PipelineRunner
// ---------------------------------------------------------------------------

pub struct PipelineRunner {
    state: SharedState,
    cache: DiskCache,
    output: OutputConfig,
    webtoon: WebtoonExtractor,
    profiles: ProfileExtractor,
    music: MusicGenerator,
}

impl PipelineRunner {
    /// Build a runner with the production engines.
    pub fn from_config(config: &AppConfig, state: SharedState) -> Self {
        let cache = DiskCache::new(config.cache.resolve_dir());
        let engines = Engines::from_config(config, &cache);
        Self::new(config, state, cache, engines)
    }

    pub fn new(config: &AppConfig, state: SharedState, cache: DiskCache, engines: Engines) -> Self {
        let webtoon = WebtoonExtractor::new(
            &config.scrape,
            &config.ocr,
            engines.ocr,
            Some(cache.clone()),
        );
        let profiles = ProfileExtractor::new(
            engines.analyzer,
            engines.keyphrases,
            config.keywords.num_keywords,
        );
        let music = MusicGenerator::new(engines.audio, config.music.clone(), Some(cache.clone()));

        Self {
            state,
            cache,
            output: config.output.clone(),
            webtoon,
            profiles,
            music,
        }
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Run one request end to end. On failure the shared state is left in
    /// [`PipelineState::Error`] with the message.
    pub async fn run(&self, request: PipelineRequest) -> Result<PipelineOutcome, PipelineError> {
        {
            let mut st = self.lock();
            *st = Default::default();
        }
        match self.try_run(&request).await {
            Ok(outcome) => {
                let mut st = self.lock();
                st.pipeline = PipelineState::Done;
                st.music_path = Some(outcome.music_path.clone());
                Ok(outcome)
            }
            Err(e) => {
                self.set_error(e.to_string());
                Err(e)
            }
        }
    }

    async fn try_run(&self, request: &PipelineRequest) -> Result<PipelineOutcome, PipelineError> {
        // ── 1. Content ────────────────────────────────────────────────────
        self.set_pipeline(PipelineState::Extracting);
        let output_dir = create_output_dir(&self.output.root_dir, request.kind, &request.input)?;
        self.lock().output_dir = Some(output_dir.clone());

        let music_path = output_dir.join(request.output_file_name());
        log::info!("Processing {} content from {}", request.kind, request.input);
        log::info!("Output will be saved to: {}", music_path.display());

        let content = self.extract(request, &output_dir).await?;

        // ── 2. Profile ────────────────────────────────────────────────────
        self.set_pipeline(PipelineState::Analyzing);
        let profile = self.profiles.extract(&content).await;
        log::info!("Extracted keywords: {:?}", profile.keywords);
        log::info!("Detected genre: {}", profile.genre);
        log::info!("Detected mood: {}", profile.mood);
        log::info!("Detected era: {}", profile.era);
        log::info!("Suggested music style: {}", profile.music_style);
        self.lock().profile = Some(profile.clone());

        report::write_keywords_info(&output_dir, &profile)?;
        let chart = output_dir.join(report::KEYWORD_CHART_FILE);
        let weights = report::chart::keyword_weights(&profile.keywords, &source_text(&content));
        if let Err(e) = report::keyword_chart(&weights, &chart, Some(&self.cache)) {
            log::warn!("Failed to draw keyword chart: {e}");
        }

        // ── 3. Music ──────────────────────────────────────────────────────
        self.set_pipeline(PipelineState::Composing);
        let music_path = self.music.generate(&profile, &music_path).await?;
        let preview_path = self.finish(&music_path).await?;
        log::info!("Music generated successfully at {}", music_path.display());

        // ── 4. Summary ────────────────────────────────────────────────────
        let file_name = request.output_file_name();
        report::write_summary(
            &output_dir,
            &RunSummary {
                content_type: request.kind.as_str(),
                input: &request.input,
                music_file: &file_name,
                profile: &profile,
            },
        )?;
        log::info!("All output files saved to directory: {}", output_dir.display());

        Ok(PipelineOutcome {
            output_dir,
            music_path,
            preview_path,
            profile,
        })
    }

    async fn extract(
        &self,
        request: &PipelineRequest,
        output_dir: &Path,
    ) -> Result<Content, PipelineError> {
        match request.kind {
            ContentKind::Webtoon if request.input.starts_with("http") => {
                let content = self
                    .webtoon
                    .extract_url(&request.input, request.use_cache, output_dir)
                    .await?;
                Ok(Content::Webtoon(content))
            }
            ContentKind::Webtoon => {
                let files = split_file_list(&request.input);
                let content = self.webtoon.extract_files(&files, output_dir).await?;
                Ok(Content::Webtoon(content))
            }
            ContentKind::Novel => {
                let path = PathBuf::from(&request.input);
                let cache = self.cache.clone();
                let use_cache = request.use_cache;
                let novel = tokio::task::spawn_blocking(move || {
                    process_novel_file(&path, use_cache, Some(&cache))
                })
                .await
                .map_err(|e| PipelineError::Internal(e.to_string()))??;
                report::write_novel_preview(output_dir, &novel)?;
                Ok(Content::Novel(novel))
            }
        }
    }

    /// Apply the configured loudness normalization and write the preview.
    async fn finish(&self, music_path: &Path) -> Result<Option<PathBuf>, PipelineError> {
        let OutputConfig {
            normalize_dbfs,
            preview_secs,
            ..
        } = self.output.clone();
        if normalize_dbfs.is_none() && preview_secs.is_none() {
            return Ok(None);
        }

        let path = music_path.to_path_buf();
        tokio::task::spawn_blocking(move || -> Result<Option<PathBuf>, MusicError> {
            let mut clip = read_wav(&path)?;
            if let Some(target) = normalize_dbfs {
                clip = normalize(&clip, target);
                write_wav(&clip, &path)?;
                log::info!("Normalized soundtrack to {target} dBFS");
            }
            let Some(secs) = preview_secs else {
                return Ok(None);
            };
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let preview_path = path.with_file_name(format!("{stem}_preview.wav"));
            write_wav(&preview(&clip, secs, PREVIEW_FADE_OUT_MS), &preview_path)?;
            log::info!("Wrote {secs}s preview to {}", preview_path.display());
            Ok(Some(preview_path))
        })
        .await
        .map_err(|e| PipelineError::Internal(e.to_string()))?
        .map_err(PipelineError::from)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn lock(&self) -> std::sync::MutexGuard<'_, super::state::RunState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_pipeline(&self, state: PipelineState) {
        log::debug!("pipeline: {}", state.label());
        self.lock().pipeline = state;
    }

    fn set_error(&self, message: String) {
        log::error!("pipeline error: {message}");
        let mut st = self.lock();
        st.pipeline = PipelineState::Error;
        st.error_message = Some(message);
    }
}

/// Split a comma-separated list of image paths, ignoring blank entries.
pub fn split_file_list(input: &str) -> Vec<PathBuf> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::OcrError;
    use crate::music::{AudioClip, GenerationParams};
    use crate::pipeline::state::new_shared_state;
    use async_trait::async_trait;
    use image::{GrayImage, Rgb, RgbImage};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::{tempdir, TempDir};

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    struct FixedOcr(&'static str);

    #[async_trait]
    impl OcrEngine for FixedOcr {
        async fn recognize(&self, _image: &GrayImage) -> Result<String, OcrError> {
            Ok(self.0.to_string())
        }
    }

    /// Half a second of a quiet square wave per call.
    struct MockAudio {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AudioBackend for MockAudio {
        async fn generate(
            &self,
            _prompt: &str,
            _params: &GenerationParams,
        ) -> Result<AudioClip, MusicError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let samples = (0..16_000)
                .map(|i| if (i / 40) % 2 == 0 { 0.1 } else { -0.1 })
                .collect();
            Ok(AudioClip::new(samples, 32_000))
        }
    }

    struct DownAudio;

    #[async_trait]
    impl AudioBackend for DownAudio {
        async fn generate(
            &self,
            _prompt: &str,
            _params: &GenerationParams,
        ) -> Result<AudioClip, MusicError> {
            Err(MusicError::Backend {
                status: 503,
                body: "unavailable".into(),
            })
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn config(root: &Path) -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.output.root_dir = root.join("runs");
        cfg.cache.dir = Some(root.join("cache"));
        cfg.music.segments = 3;
        cfg.music.crossfade_ms = 100;
        cfg
    }

    fn runner(cfg: &AppConfig, audio: Arc<dyn AudioBackend>) -> PipelineRunner {
        let engines = Engines {
            ocr: Arc::new(FixedOcr("the knight draws a sword in the castle")),
            analyzer: None,
            keyphrases: Arc::new(StatisticalExtractor::default()),
            audio,
        };
        let cache = DiskCache::new(cfg.cache.resolve_dir());
        PipelineRunner::new(cfg, new_shared_state(), cache, engines)
    }

    fn novel(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("knight.txt");
        std::fs::write(
            &path,
            "Chapter 1 The knight rode to the castle. A dragon waited with magic fire. \
             Chapter 2 The battle began and the sword clashed against the dragon.",
        )
        .unwrap();
        path
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[test]
    fn file_list_is_trimmed() {
        assert_eq!(
            split_file_list(" a.png, b.jpg ,,"),
            vec![PathBuf::from("a.png"), PathBuf::from("b.jpg")]
        );
    }

    #[tokio::test]
    async fn novel_run_writes_all_artifacts() {
        let dir = tempdir().unwrap();
        let cfg = config(dir.path());
        let audio = Arc::new(MockAudio {
            calls: AtomicUsize::new(0),
        });
        let runner = runner(&cfg, audio.clone());

        let request = PipelineRequest::new(ContentKind::Novel, novel(&dir).to_string_lossy());
        let outcome = runner.run(request).await.unwrap();

        assert_eq!(audio.calls.load(Ordering::SeqCst), 3);
        assert!(outcome.music_path.ends_with("generated_music.wav"));
        assert!(outcome.preview_path.is_none());
        for file in [
            report::NOVEL_PREVIEW_FILE,
            report::KEYWORDS_INFO_FILE,
            report::KEYWORD_CHART_FILE,
            report::SUMMARY_FILE,
            "generated_music.wav",
            "generated_music_metadata.txt",
        ] {
            assert!(outcome.output_dir.join(file).exists(), "missing {file}");
        }
        assert_eq!(outcome.profile.genre, "fantasy");

        // Chart weights come from the novel text.
        let text = std::fs::read_to_string(novel(&dir)).unwrap();
        let weights = report::chart::keyword_weights(&outcome.profile.keywords, &text);
        let legend = std::fs::read_to_string(report::chart::legend_path(
            &outcome.output_dir.join(report::KEYWORD_CHART_FILE),
        ))
        .unwrap();
        assert_eq!(legend, report::chart::render_legend(&weights));
        if let Some((_, w)) = weights.iter().find(|(k, _)| k == "dragon") {
            assert_eq!(*w, 2);
        }

        let summary =
            std::fs::read_to_string(outcome.output_dir.join(report::SUMMARY_FILE)).unwrap();
        assert!(summary.starts_with("Content Type: novel\n"));

        let st = runner.state().lock().unwrap();
        assert_eq!(st.pipeline, PipelineState::Done);
        assert_eq!(st.music_path.as_ref(), Some(&outcome.music_path));
    }

    #[tokio::test]
    async fn webtoon_files_run() {
        let dir = tempdir().unwrap();
        let cfg = config(dir.path());
        let runner = runner(
            &cfg,
            Arc::new(MockAudio {
                calls: AtomicUsize::new(0),
            }),
        );

        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        RgbImage::from_pixel(120, 200, Rgb([200, 200, 200])).save(&a).unwrap();
        RgbImage::from_pixel(100, 150, Rgb([30, 30, 30])).save(&b).unwrap();

        let mut request = PipelineRequest::new(
            ContentKind::Webtoon,
            format!("{},{}", a.display(), b.display()),
        );
        request.output_name = Some("theme.wav".into());
        let outcome = runner.run(request).await.unwrap();

        assert!(outcome.music_path.ends_with("theme.wav"));
        assert!(outcome.output_dir.join("theme_metadata.txt").exists());
        assert!(outcome.output_dir.join("webtoon_info.txt").exists());
        assert!(outcome.profile.keywords.iter().any(|k| k.contains("sword")));
    }

    #[tokio::test]
    async fn finishing_writes_preview() {
        let dir = tempdir().unwrap();
        let mut cfg = config(dir.path());
        cfg.output.normalize_dbfs = Some(-20.0);
        cfg.output.preview_secs = Some(1);
        let runner = runner(
            &cfg,
            Arc::new(MockAudio {
                calls: AtomicUsize::new(0),
            }),
        );

        let outcome = runner
            .run(PipelineRequest::new(
                ContentKind::Novel,
                novel(&dir).to_string_lossy(),
            ))
            .await
            .unwrap();

        let preview_path = outcome.preview_path.unwrap();
        assert!(preview_path.ends_with("generated_music_preview.wav"));
        let full = read_wav(&outcome.music_path).unwrap();
        let prev = read_wav(&preview_path).unwrap();
        assert!(prev.samples.len() <= full.samples.len());
        assert_eq!(prev.samples.len(), 32_000);
    }

    #[tokio::test]
    async fn unsupported_novel_sets_error_state() {
        let dir = tempdir().unwrap();
        let cfg = config(dir.path());
        let runner = runner(
            &cfg,
            Arc::new(MockAudio {
                calls: AtomicUsize::new(0),
            }),
        );

        let pdf = dir.path().join("book.pdf");
        std::fs::write(&pdf, "%PDF").unwrap();
        let err = runner
            .run(PipelineRequest::new(ContentKind::Novel, pdf.to_string_lossy()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Content(ContentError::UnsupportedFormat(_))
        ));

        let st = runner.state().lock().unwrap();
        assert_eq!(st.pipeline, PipelineState::Error);
        assert!(st.error_message.as_deref().unwrap().contains("unsupported"));
    }

    #[tokio::test]
    async fn backend_failure_sets_error_state() {
        let dir = tempdir().unwrap();
        let cfg = config(dir.path());
        let runner = runner(&cfg, Arc::new(DownAudio));

        let err = runner
            .run(PipelineRequest::new(
                ContentKind::Novel,
                novel(&dir).to_string_lossy(),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Music(MusicError::Segment { index: 0, .. })));

        let st = runner.state().lock().unwrap();
        assert_eq!(st.pipeline, PipelineState::Error);
        // Reports written before composing are kept.
        let out = st.output_dir.clone().unwrap();
        assert!(out.join(report::KEYWORDS_INFO_FILE).exists());
        assert!(!out.join(report::SUMMARY_FILE).exists());
    }
}
