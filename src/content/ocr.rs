//! OCR engine seam.
//!
//! [`TesseractOcr`] shells out to the `tesseract` binary, streaming a PNG
//! encoding of the image on stdin and reading the recognized text from
//! stdout (`tesseract stdin stdout -l <langs>`). Any other recognizer can be
//! plugged in through [`OcrEngine`].

use std::io::Cursor;
use std::process::Stdio;

use async_trait::async_trait;
use image::{GrayImage, ImageFormat, Luma};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::OcrConfig;

// ---------------------------------------------------------------------------
// OcrError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum OcrError {
    /// The OCR command could not be started (not installed, not on PATH).
    #[error("failed to run OCR command '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    /// Pipe error while talking to the child process.
    #[error("OCR process I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The image could not be encoded for the recognizer.
    #[error("failed to encode image for OCR: {0}")]
    Encode(#[from] image::ImageError),

    /// The command exited unsuccessfully.
    #[error("OCR command failed: {0}")]
    Failed(String),
}

// ---------------------------------------------------------------------------
// OcrEngine trait
// ---------------------------------------------------------------------------

/// Recognizes text in a grayscale image.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, image: &GrayImage) -> Result<String, OcrError>;
}

/// Threshold a grayscale image: pixels below `threshold` become black,
/// everything else white.
pub fn binarize(img: &GrayImage, threshold: u8) -> GrayImage {
    let mut out = img.clone();
    for Luma([v]) in out.pixels_mut() {
        *v = if *v < threshold { 0 } else { 255 };
    }
    out
}

// ---------------------------------------------------------------------------
// TesseractOcr
// ---------------------------------------------------------------------------

pub struct TesseractOcr {
    command: String,
    languages: String,
}

impl TesseractOcr {
    pub fn from_config(config: &OcrConfig) -> Self {
        Self {
            command: config.command.clone(),
            languages: config.languages.clone(),
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn recognize(&self, image: &GrayImage) -> Result<String, OcrError> {
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

        let mut child = Command::new(&self.command)
            .args(["stdin", "stdout", "-l", self.languages.as_str()])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| OcrError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&png).await?;
            // Dropping stdin closes the pipe so tesseract sees EOF.
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Failed(stderr.trim().to_string()));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        log::debug!("OCR produced {} chars", text.chars().count());
        Ok(text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
