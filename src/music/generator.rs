//! Segment-by-segment soundtrack composition.
//!
//! ```text
//! profile ─► cache_key ─► sha256 ─► music/<hash>.wav hit? ─► copy + metadata
//!                                        │ miss
//!                                        ▼
//!                 base prompt ─► segment 1..N ─► resample ─► crossfade
//!                                        │
//!                                        ▼
//!                         output.wav + cache + <stem>_metadata.txt
//! ```
//!
//! Segments are generated strictly in order. A failed segment aborts the
//! composition and leaves the cache untouched.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::backend::{AudioBackend, GenerationParams};
use super::prompt::{cache_key, PromptBuilder};
use super::resample::resample_clip;
use super::stitch::stitch;
use super::wav::write_wav;
use super::MusicError;
use crate::analysis::ContentProfile;
use crate::cache::{self, DiskCache};
use crate::config::MusicConfig;

/// Metadata stored next to a cached soundtrack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicMetadata {
    pub keywords: Vec<String>,
    pub genre: String,
    pub mood: String,
    pub era: String,
    pub music_style: String,
    pub prompt: String,
    pub duration: String,
}

impl MusicMetadata {
    fn new(profile: &ContentProfile, prompt: String, duration: String) -> Self {
        Self {
            keywords: profile.keywords.clone(),
            genre: profile.genre.clone(),
            mood: profile.mood.clone(),
            era: profile.era.clone(),
            music_style: profile.music_style.clone(),
            prompt,
            duration,
        }
    }

    /// Plain-text report written as `<stem>_metadata.txt`.
    pub fn render(&self, from_cache: bool) -> String {
        let mut out = String::new();
        if from_cache {
            out.push_str("Generated Music Metadata (from cache)\n");
        } else {
            out.push_str("Generated Music Metadata\n");
        }
        out.push_str("----------------------\n");
        out.push_str(&format!("Keywords: {}\n", self.keywords.join(", ")));
        out.push_str(&format!("Genre: {}\n", self.genre));
        out.push_str(&format!("Mood: {}\n", self.mood));
        out.push_str(&format!("Era: {}\n", self.era));
        out.push_str(&format!("Music Style: {}\n", self.music_style));
        if !from_cache {
            out.push_str(&format!("Duration: {}\n", self.duration));
        }
        out.push_str(&format!("Base Prompt: {}\n", self.prompt));
        out
    }
}

/// `<dir>/<stem>_metadata.txt` for an output WAV path.
pub fn metadata_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "generated_music".to_string());
    output.with_file_name(format!("{stem}_metadata.txt"))
}

// ---------------------------------------------------------------------------
// MusicGenerator
// ---------------------------------------------------------------------------

pub struct MusicGenerator {
    backend: Arc<dyn AudioBackend>,
    config: MusicConfig,
    prompts: PromptBuilder,
    cache: Option<DiskCache>,
}

impl MusicGenerator {
    pub fn new(
        backend: Arc<dyn AudioBackend>,
        config: MusicConfig,
        cache: Option<DiskCache>,
    ) -> Self {
        let prompts = PromptBuilder::new(config.segments);
        Self {
            backend,
            config,
            prompts,
            cache,
        }
    }

    /// Compose a soundtrack for `profile` and write it to `output`.
    pub async fn generate(
        &self,
        profile: &ContentProfile,
        output: &Path,
    ) -> Result<PathBuf, MusicError> {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let hash = cache::key_hash(&cache_key(profile));

        if let Some(path) = self.try_cached(profile, &hash, output).await? {
            return Ok(path);
        }

        let base = self.prompts.random_base_prompt(profile);
        log::info!("Base prompt: {base}");

        let params = GenerationParams::from_config(&self.config);
        let segment_prompts = self.prompts.segment_prompts(&base);
        let total = segment_prompts.len();
        let mut clips = Vec::with_capacity(total);

        for (index, prompt) in segment_prompts.iter().enumerate() {
            log::info!("Generating segment {}/{total}", index + 1);
            let clip = self
                .backend
                .generate(prompt, &params)
                .await
                .map_err(|e| MusicError::Segment {
                    index,
                    source: Box::new(e),
                })?;
            clips.push(resample_clip(clip, self.config.sample_rate)?);
        }

        let track = stitch(&clips, self.config.crossfade_ms, self.config.fade_curve)?;
        write_wav(&track, output)?;
        log::info!(
            "Wrote {:.1}s soundtrack to {}",
            track.duration_secs(),
            output.display()
        );

        let secs_per_segment = clips
            .first()
            .map(|c| c.duration_secs())
            .unwrap_or_default();
        let duration = self
            .prompts
            .duration_label(secs_per_segment, self.config.crossfade_ms);
        let metadata = MusicMetadata::new(profile, base, duration);

        if self.config.use_cache {
            if let Some(cache) = &self.cache {
                if let Err(e) = store(cache, &hash, output, &metadata) {
                    log::warn!("Failed to cache soundtrack: {e}");
                }
            }
        }

        tokio::fs::write(metadata_path(output), metadata.render(false)).await?;
        Ok(output.to_path_buf())
    }

    /// Copy a cached soundtrack to `output`. The metadata report describes
    /// `profile`; only the base prompt comes from the cached entry.
    async fn try_cached(
        &self,
        profile: &ContentProfile,
        hash: &str,
        output: &Path,
    ) -> Result<Option<PathBuf>, MusicError> {
        if !self.config.use_cache {
            return Ok(None);
        }
        let Some(cache) = &self.cache else {
            return Ok(None);
        };

        let wav = cache.path_for(cache::MUSIC, &format!("{hash}.wav"));
        if !wav.exists() {
            return Ok(None);
        }
        let key = format!("{hash}_metadata");
        let Some(cached) = cache.get_json::<MusicMetadata>(cache::MUSIC, &key) else {
            return Ok(None);
        };

        log::info!("Using cached soundtrack {}", wav.display());
        tokio::fs::copy(&wav, output).await?;
        let metadata = MusicMetadata::new(profile, cached.prompt, cached.duration);
        tokio::fs::write(metadata_path(output), metadata.render(true)).await?;
        Ok(Some(output.to_path_buf()))
    }
}

fn store(
    cache: &DiskCache,
    hash: &str,
    output: &Path,
    metadata: &MusicMetadata,
) -> std::io::Result<()> {
    let dir = cache.ensure_namespace(cache::MUSIC)?;
    std::fs::copy(output, dir.join(format!("{hash}.wav")))?;
    cache.put_json(cache::MUSIC, &format!("{hash}_metadata"), metadata)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
