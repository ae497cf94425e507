//! Webtoon content extraction.
//!
//! ```text
//! extract_url(url)
//!   ├─ cache hit? ── copy cached images into output_dir ──► WebtoonContent
//!   ├─ GET page ─► parse_page ─► filter comic images
//!   ├─ per image: delay ─► download ─► size check ─► flatten ─► save
//!   ├─ groups of `group_size`: stack ─► save ─► binarize ─► OCR
//!   ├─ all images: stack ─► combined_webtoon.jpg ─► binarize ─► OCR
//!   ├─ webtoon_info.txt
//!   └─ cache metadata.json
//! ```
//!
//! Download, decode and OCR failures of individual panels are logged and
//! skipped so one broken image does not lose the episode.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use image::{imageops, RgbImage};
use rand::Rng;
use reqwest::header::USER_AGENT;
use serde::{Deserialize, Serialize};

use super::imaging::{flatten_to_rgb, save_jpeg, stack_vertically};
use super::ocr::{binarize, OcrEngine};
use super::scrape::{is_comic_image, parse_page, UNKNOWN_AUTHOR};
use super::ContentError;
use crate::cache::{self, DiskCache};
use crate::config::{OcrConfig, ScrapeConfig};

pub const UPLOADED_TITLE: &str = "Uploaded Webtoon";
pub const COMBINED_FILE: &str = "combined_webtoon.jpg";
pub const INFO_FILE: &str = "webtoon_info.txt";
const METADATA_KEY: &str = "metadata";
const INFO_SAMPLE_CHARS: usize = 500;

/// Extracted webtoon episode, also the on-disk cache record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebtoonContent {
    pub title: String,
    pub author: String,
    pub image_paths: Vec<PathBuf>,
    pub group_image_paths: Vec<PathBuf>,
    pub combined_image_path: Option<PathBuf>,
    /// Non-blank OCR results, group images first, combined image last.
    pub texts: Vec<String>,
}

/// Result of stacking and recognizing a set of panels.
struct Panels {
    group_image_paths: Vec<PathBuf>,
    combined_image_path: Option<PathBuf>,
    texts: Vec<String>,
}

// ---------------------------------------------------------------------------
// WebtoonExtractor
// ---------------------------------------------------------------------------

pub struct WebtoonExtractor {
    client: reqwest::Client,
    config: ScrapeConfig,
    threshold: u8,
    ocr: Arc<dyn OcrEngine>,
    cache: Option<DiskCache>,
}

impl WebtoonExtractor {
    pub fn new(
        scrape: &ScrapeConfig,
        ocr_config: &OcrConfig,
        ocr: Arc<dyn OcrEngine>,
        cache: Option<DiskCache>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(scrape.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: scrape.clone(),
            threshold: ocr_config.binarize_threshold,
            ocr,
            cache,
        }
    }

    /// Download and process an episode page.
    pub async fn extract_url(
        &self,
        url: &str,
        use_cache: bool,
        output_dir: &Path,
    ) -> Result<WebtoonContent, ContentError> {
        log::info!("Extracting content from webtoon URL: {url}");
        std::fs::create_dir_all(output_dir)?;

        let cache = self.cache.as_ref().filter(|_| use_cache);
        let namespace = format!("{}/{}", cache::WEBTOON, cache::key_hash(url));

        if let Some(cache) = cache {
            if let Some(meta) = cache.get_json::<WebtoonContent>(&namespace, METADATA_KEY) {
                log::info!("Using cached content for: {url}");
                return restore_cached(meta, output_dir);
            }
        }
        let cache_dir = match cache {
            Some(cache) => Some(cache.ensure_namespace(&namespace)?),
            None => None,
        };

        let html = self
            .client
            .get(url)
            .header(USER_AGENT, &self.config.user_agent)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let page = parse_page(&html);
        if page.image_urls.is_empty() {
            return Err(ContentError::NoImages);
        }
        log::info!("Found {} images in the webtoon", page.image_urls.len());

        let mut images = Vec::new();
        let mut image_paths = Vec::new();
        for (i, img_url) in page.image_urls.iter().enumerate() {
            if !is_comic_image(img_url, &self.config.allowed_hosts) {
                continue;
            }
            self.politeness_delay().await;

            let img = match self.download_image(img_url).await {
                Ok(img) => img,
                Err(e) => {
                    log::warn!("Error processing image {}: {e}", i + 1);
                    continue;
                }
            };
            if img.width() < self.config.min_image_px || img.height() < self.config.min_image_px {
                log::info!("Skipping small image {}: {}x{}", i + 1, img.width(), img.height());
                continue;
            }

            let out_path = output_dir.join(format!("webtoon_image_{}.jpg", i + 1));
            let saved = save_jpeg(&img, &out_path).and_then(|_| match &cache_dir {
                Some(dir) => save_jpeg(&img, &dir.join(format!("image_{}.jpg", i + 1))),
                None => Ok(()),
            });
            if let Err(e) = saved {
                log::warn!("Error saving image {}: {e}", i + 1);
                continue;
            }

            log::info!("Processed image {}/{}", i + 1, page.image_urls.len());
            images.push(img);
            image_paths.push(out_path);
        }

        let panels = self.process_panels(&images, output_dir).await;
        let content = WebtoonContent {
            title: page.title,
            author: page.author,
            image_paths,
            group_image_paths: panels.group_image_paths,
            combined_image_path: panels.combined_image_path,
            texts: panels.texts,
        };

        write_info(&content, url, output_dir)?;

        if let (Some(cache), Some(dir)) = (cache, &cache_dir) {
            let record = cache_record(&content, dir)?;
            cache.put_json(&namespace, METADATA_KEY, &record)?;
        }

        Ok(content)
    }

    /// Process local image files. Missing or undecodable files are skipped.
    pub async fn extract_files(
        &self,
        paths: &[PathBuf],
        output_dir: &Path,
    ) -> Result<WebtoonContent, ContentError> {
        std::fs::create_dir_all(output_dir)?;

        let mut images = Vec::new();
        let mut image_paths = Vec::new();
        for path in paths {
            if !path.exists() {
                log::warn!("File not found: {}", path.display());
                continue;
            }
            let loaded = std::fs::read(path)
                .map_err(ContentError::from)
                .and_then(|bytes| {
                    let img = image::load_from_memory(&bytes)?;
                    Ok((cache::content_hash(&bytes), flatten_to_rgb(img)))
                });
            let (hash, img) = match loaded {
                Ok(v) => v,
                Err(e) => {
                    log::warn!("Error processing file {}: {e}", path.display());
                    continue;
                }
            };
            let out_path = output_dir.join(format!("webtoon_{hash}.jpg"));
            if let Err(e) = save_jpeg(&img, &out_path) {
                log::warn!("Error saving {}: {e}", out_path.display());
                continue;
            }
            images.push(img);
            image_paths.push(out_path);
        }

        let panels = self.process_panels(&images, output_dir).await;
        let content = WebtoonContent {
            title: UPLOADED_TITLE.to_string(),
            author: UNKNOWN_AUTHOR.to_string(),
            image_paths,
            group_image_paths: panels.group_image_paths,
            combined_image_path: panels.combined_image_path,
            texts: panels.texts,
        };
        write_info(&content, "local files", output_dir)?;
        Ok(content)
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    async fn politeness_delay(&self) {
        let min = self.config.min_delay_ms.min(self.config.max_delay_ms);
        let ms = rand::thread_rng().gen_range(min..=self.config.max_delay_ms);
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    async fn download_image(&self, url: &str) -> Result<RgbImage, ContentError> {
        let bytes = self
            .client
            .get(url)
            .header(USER_AGENT, &self.config.user_agent)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(flatten_to_rgb(image::load_from_memory(&bytes)?))
    }

    async fn recognize(&self, img: &RgbImage, label: &str) -> Option<String> {
        let binary = binarize(&imageops::grayscale(img), self.threshold);
        match self.ocr.recognize(&binary).await {
            Ok(text) if !text.trim().is_empty() => {
                let sample: String = text.chars().take(100).collect();
                log::info!("Extracted text from {label}: {sample}...");
                Some(text)
            }
            Ok(_) => None,
            Err(e) => {
                log::warn!("OCR error for {label}: {e}");
                None
            }
        }
    }

    async fn process_panels(&self, images: &[RgbImage], output_dir: &Path) -> Panels {
        let mut panels = Panels {
            group_image_paths: Vec::new(),
            combined_image_path: None,
            texts: Vec::new(),
        };

        for (n, group) in images.chunks(self.config.group_size.max(1)).enumerate() {
            let Some(stacked) = stack_vertically(group) else {
                continue;
            };
            let path = output_dir.join(format!("group_image_{}.jpg", n + 1));
            if let Err(e) = save_jpeg(&stacked, &path) {
                log::warn!("Error creating group image {}: {e}", n + 1);
                continue;
            }
            if let Some(text) = self.recognize(&stacked, &format!("group image {}", n + 1)).await {
                panels.texts.push(text);
            }
            panels.group_image_paths.push(path);
        }

        if let Some(combined) = stack_vertically(images) {
            let path = output_dir.join(COMBINED_FILE);
            match save_jpeg(&combined, &path) {
                Ok(()) => {
                    log::info!("Combined image saved to {}", path.display());
                    if let Some(text) = self.recognize(&combined, "combined image").await {
                        panels.texts.push(text);
                    }
                    panels.combined_image_path = Some(path);
                }
                Err(e) => log::warn!("Error combining images: {e}"),
            }
        }
        panels
    }
}

// ---------------------------------------------------------------------------
// Cache helpers
// ---------------------------------------------------------------------------

/// Copy the output images into the cache dir and return a record pointing
/// at the copies.
fn cache_record(content: &WebtoonContent, cache_dir: &Path) -> std::io::Result<WebtoonContent> {
    let mut record = content.clone();
    record.group_image_paths = content
        .group_image_paths
        .iter()
        .map(|p| copy_into(p, cache_dir))
        .collect::<std::io::Result<_>>()?;
    record.combined_image_path = content
        .combined_image_path
        .as_deref()
        .map(|p| copy_into(p, cache_dir))
        .transpose()?;
    record.image_paths = content
        .image_paths
        .iter()
        .filter_map(|p| {
            // webtoon_image_N.jpg was written to the cache as image_N.jpg
            let name = p.file_name()?.to_str()?.strip_prefix("webtoon_")?;
            Some(cache_dir.join(name))
        })
        .collect();
    Ok(record)
}

fn copy_into(src: &Path, dir: &Path) -> std::io::Result<PathBuf> {
    let dest = dir.join(src.file_name().unwrap_or_default());
    std::fs::copy(src, &dest)?;
    Ok(dest)
}

/// Copy a cached episode into `output_dir` with the usual file names.
fn restore_cached(meta: WebtoonContent, output_dir: &Path) -> Result<WebtoonContent, ContentError> {
    let copy_existing = |paths: &[PathBuf], prefix: &str| -> std::io::Result<Vec<PathBuf>> {
        let mut out = Vec::new();
        for (i, src) in paths.iter().filter(|p| p.exists()).enumerate() {
            let dest = output_dir.join(format!("{prefix}_{}.jpg", i + 1));
            std::fs::copy(src, &dest)?;
            out.push(dest);
        }
        Ok(out)
    };

    let image_paths = copy_existing(&meta.image_paths, "webtoon_image")?;
    let group_image_paths = copy_existing(&meta.group_image_paths, "group_image")?;
    let combined_image_path = match meta.combined_image_path.as_deref() {
        Some(src) if src.exists() => {
            let dest = output_dir.join(COMBINED_FILE);
            std::fs::copy(src, &dest)?;
            Some(dest)
        }
        _ => None,
    };

    Ok(WebtoonContent {
        image_paths,
        group_image_paths,
        combined_image_path,
        ..meta
    })
}

/// Write the human-readable `webtoon_info.txt` summary.
pub fn write_info(
    content: &WebtoonContent,
    source: &str,
    output_dir: &Path,
) -> std::io::Result<()> {
    let mut info = format!(
        "Title: {}\nAuthor: {}\nURL: {}\nNumber of images: {}\nNumber of group images: {}\nNumber of text extractions: {}\n",
        content.title,
        content.author,
        source,
        content.image_paths.len(),
        content.group_image_paths.len(),
        content.texts.len(),
    );
    if let Some(first) = content.texts.first() {
        info.push_str("\nSample extracted text:\n");
        if first.chars().count() > INFO_SAMPLE_CHARS {
            info.extend(first.chars().take(INFO_SAMPLE_CHARS));
            info.push_str("...");
        } else {
            info.push_str(first);
        }
    }
    std::fs::write(output_dir.join(INFO_FILE), info)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
