//! Fallback analyzer — wraps any [`ImageAnalyzer`] and returns generic
//! keywords on error.
//!
//! A missing API key, an unreachable endpoint or an undecodable panel must
//! not abort soundtrack generation; the profile simply gets the generic
//! visual keywords instead.

use std::path::Path;

use async_trait::async_trait;

use crate::analysis::vision::{ImageAnalyzer, VisionError};

/// Keywords returned when the inner analyzer fails.
pub const FALLBACK_KEYWORDS: &[&str] = &["image", "visual", "scene", "character", "emotion"];

/// A transparent wrapper around any [`ImageAnalyzer`] that never returns an
/// error.
pub struct FallbackAnalyzer<A: ImageAnalyzer> {
    inner: A,
}

impl<A: ImageAnalyzer> FallbackAnalyzer<A> {
    pub fn new(inner: A) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<A: ImageAnalyzer + Send + Sync> ImageAnalyzer for FallbackAnalyzer<A> {
    /// This implementation never returns `Err(_)`.
    async fn analyze(&self, path: &Path) -> Result<Vec<String>, VisionError> {
        match self.inner.analyze(path).await {
            Ok(keywords) => Ok(keywords),
            Err(err) => {
                log::warn!(
                    "Image analysis failed for {} ({err}), using generic keywords",
                    path.display()
                );
                Ok(FALLBACK_KEYWORDS.iter().map(|s| s.to_string()).collect())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
