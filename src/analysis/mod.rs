//! Content analysis: keyphrases, lexicon tags and image understanding.
//!
//! # Architecture
//!
//! ```text
//! Content ──► ProfileExtractor ──┬─► KeyphraseExtractor (StatisticalExtractor)
//!                                ├─► lexicon::dominant_tags
//!                                └─► ImageAnalyzer (FallbackAnalyzer<OpenAiVision>)
//!                                        │
//!                                        ▼
//!                                  ContentProfile
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use webtoon_music::analysis::{FallbackAnalyzer, OpenAiVision, ProfileExtractor, StatisticalExtractor};
//! use webtoon_music::config::VisionConfig;
//!
//! let vision = FallbackAnalyzer::new(OpenAiVision::from_config(&VisionConfig::default(), None));
//! let extractor = ProfileExtractor::new(
//!     Some(Arc::new(vision)),
//!     Arc::new(StatisticalExtractor::default()),
//!     15,
//! );
//! ```

pub mod fallback;
pub mod keyphrase;
pub mod lexicon;
pub mod profile;
pub mod stopwords;
pub mod vision;

pub use fallback::FallbackAnalyzer;
pub use keyphrase::{KeyphraseExtractor, StatisticalExtractor};
pub use lexicon::{dominant_tags, DominantTags};
pub use profile::{source_text, ContentProfile, ProfileExtractor};
pub use vision::{ImageAnalyzer, OpenAiVision, VisionError};
