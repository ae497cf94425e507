//! Core `ImageAnalyzer` trait and `OpenAiVision` implementation.
//!
//! `OpenAiVision` sends a webtoon panel to any OpenAI-compatible
//! `/v1/chat/completions` endpoint that accepts image input, then turns the
//! free-text reply into keywords with [`keywords_from_analysis`]. Results are
//! memoized per image content hash under `image_analysis/`.

use std::path::Path;

use async_trait::async_trait;
use base64::prelude::*;
use image::{ColorType, GenericImageView};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::{self, DiskCache};
use crate::config::VisionConfig;

/// Instruction sent with every image.
pub const ANALYSIS_INSTRUCTION: &str =
    "이 웹툰 이미지를 분석해서 감정과 분위기를 나타내는 키워드를 5-10개 추출해주세요.";

/// Returned for images too small to be worth a request.
pub const SMALL_IMAGE_KEYWORDS: &[&str] = &["image", "visual", "graphic"];

const MIN_ANALYSIS_PX: u32 = 100;

const PADDING_KEYWORDS: &[&str] = &["scene", "character", "emotion", "story", "webtoon"];

const EMOTION_TERMS: &[&str] = &[
    "happy", "sad", "angry", "surprised", "scared", "disgusted", "confused", "excited", "worried",
    "nervous", "calm", "relaxed", "tense", "frustrated", "joyful", "depressed", "anxious",
    "content", "disappointed", "embarrassed", "행복", "슬픔", "분노", "놀람", "공포", "혐오",
    "혼란", "흥분", "걱정", "긴장", "평온", "편안", "불안", "좌절", "기쁨", "우울", "만족", "실망",
    "당황",
];

const ACTION_TERMS: &[&str] = &[
    "smiling", "crying", "laughing", "shouting", "running", "walking", "fighting", "hugging",
    "kissing", "talking", "whispering", "sleeping", "eating", "drinking", "웃음", "울음", "달리기",
    "걷기", "싸움", "포옹", "키스", "대화", "속삭임", "잠", "식사",
];

const MOOD_TERMS: &[&str] = &[
    "romantic", "dramatic", "mysterious", "thrilling", "peaceful", "chaotic", "tense", "comical",
    "nostalgic", "dreamy", "nightmarish", "magical", "로맨틱", "드라마틱", "미스터리", "스릴",
    "평화로운", "혼란스러운", "긴장된", "코믹", "향수", "꿈같은", "악몽", "마법",
];

// ---------------------------------------------------------------------------
// VisionError
// ---------------------------------------------------------------------------

/// Errors that can occur during image analysis.
#[derive(Debug, Error)]
pub enum VisionError {
    /// The image file could not be read.
    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),

    /// The image bytes could not be decoded.
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    /// HTTP transport, connection or status error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("vision request timed out")]
    Timeout,

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse vision response: {0}")]
    Parse(String),

    /// The model returned no usable text.
    #[error("vision model returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for VisionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            VisionError::Timeout
        } else {
            VisionError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// ImageAnalyzer trait
// ---------------------------------------------------------------------------

/// Async trait for turning an image into mood/emotion keywords.
#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    async fn analyze(&self, path: &Path) -> Result<Vec<String>, VisionError>;
}

// ---------------------------------------------------------------------------
// Keyword derivation
// ---------------------------------------------------------------------------

/// Pixel layout of the analysed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Luma,
    Rgb,
    Other,
}

impl From<ColorType> for ColorMode {
    fn from(c: ColorType) -> Self {
        match c {
            ColorType::L8 | ColorType::L16 => ColorMode::Luma,
            ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => ColorMode::Rgb,
            _ => ColorMode::Other,
        }
    }
}

fn push_unique(out: &mut Vec<String>, word: &str) {
    if !out.iter().any(|w| w == word) {
        out.push(word.to_string());
    }
}

/// Derive keywords from a model reply and the image geometry.
///
/// Order: matched emotion/action/mood terms, an explicit `keywords:` list
/// from the reply, format and colour hints, then `visual, graphic`. Padded
/// with generic words when fewer than five remain.
pub fn keywords_from_analysis(
    analysis: &str,
    width: u32,
    height: u32,
    color: ColorMode,
) -> Vec<String> {
    let lower = analysis.to_lowercase();
    let mut out = Vec::new();

    for term in EMOTION_TERMS.iter().chain(ACTION_TERMS).chain(MOOD_TERMS) {
        if lower.contains(term) {
            push_unique(&mut out, term);
        }
    }

    let section = lower
        .split("keywords:")
        .nth(1)
        .or_else(|| lower.split("키워드:").nth(1));
    if let Some(section) = section {
        for entry in section.split(',').map(str::trim) {
            if entry.chars().count() > 1 {
                push_unique(&mut out, entry);
            }
        }
    }

    if width > 1000 {
        push_unique(&mut out, "high_resolution");
    }
    let aspect = width as f32 / height.max(1) as f32;
    if aspect > 1.5 {
        push_unique(&mut out, "wide_format");
    } else if aspect < 0.7 {
        push_unique(&mut out, "vertical_format");
    }
    match color {
        ColorMode::Luma => push_unique(&mut out, "black_and_white"),
        ColorMode::Rgb => push_unique(&mut out, "color"),
        ColorMode::Other => {}
    }
    push_unique(&mut out, "visual");
    push_unique(&mut out, "graphic");

    if out.len() < 5 {
        for word in PADDING_KEYWORDS {
            push_unique(&mut out, word);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// OpenAiVision
// ---------------------------------------------------------------------------

/// Cached result of one analysis, stored as `image_analysis/<hash>.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedAnalysis {
    pub keywords: Vec<String>,
    pub analysis: String,
}

/// Calls an OpenAI-compatible chat-completions endpoint with image input.
///
/// The `Authorization: Bearer …` header is attached only when
/// `config.api_key` is a non-empty string.
pub struct OpenAiVision {
    client: reqwest::Client,
    config: VisionConfig,
    cache: Option<DiskCache>,
}

impl OpenAiVision {
    /// Build from config. `cache` of `None` disables memoization.
    pub fn from_config(config: &VisionConfig, cache: Option<DiskCache>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
            cache,
        }
    }

    async fn request(&self, bytes: &[u8], mime: &str) -> Result<String, VisionError> {
        let url = format!("{}/v1/chat/completions", self.config.base_url);
        let data_uri = format!("data:{};base64,{}", mime, BASE64_STANDARD.encode(bytes));

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": ANALYSIS_INSTRUCTION },
                        { "type": "image_url", "image_url": { "url": data_uri } }
                    ]
                }
            ],
            "max_tokens": self.config.max_tokens
        });

        let mut req = self.client.post(&url).json(&body);

        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?.error_for_status()?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| VisionError::Parse(e.to_string()))?;

        let text = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(VisionError::EmptyResponse)?
            .trim()
            .to_string();

        if text.is_empty() {
            return Err(VisionError::EmptyResponse);
        }
        Ok(text)
    }
}

#[async_trait]
impl ImageAnalyzer for OpenAiVision {
    async fn analyze(&self, path: &Path) -> Result<Vec<String>, VisionError> {
        let bytes = tokio::fs::read(path).await?;
        let hash = cache::content_hash(&bytes);

        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get_json::<CachedAnalysis>(cache::IMAGE_ANALYSIS, &hash) {
                log::info!("Using cached image analysis for {}", path.display());
                return Ok(hit.keywords);
            }
        }

        let img = image::load_from_memory(&bytes)?;
        let (width, height) = img.dimensions();
        if width < MIN_ANALYSIS_PX || height < MIN_ANALYSIS_PX {
            log::info!("Image too small for analysis: {width}x{height}");
            return Ok(SMALL_IMAGE_KEYWORDS.iter().map(|s| s.to_string()).collect());
        }

        let mime = image::guess_format(&bytes)
            .map(|f| f.to_mime_type())
            .unwrap_or("image/jpeg");

        log::info!("Analyzing image content: {}", path.display());
        let analysis = self.request(&bytes, mime).await?;
        log::debug!("Image analysis reply: {analysis}");

        let keywords = keywords_from_analysis(&analysis, width, height, img.color().into());

        if let Some(cache) = &self.cache {
            let entry = CachedAnalysis {
                keywords: keywords.clone(),
                analysis,
            };
            if let Err(e) = cache.put_json(cache::IMAGE_ANALYSIS, &hash, &entry) {
                log::warn!("Failed to store image analysis: {e}");
            }
        }

        Ok(keywords)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
