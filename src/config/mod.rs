//! Configuration module.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for each stage,
//! `AppPaths` for cross-platform directories, and TOML persistence via
//! `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AppConfig, CacheConfig, KeywordConfig, MusicConfig, OcrConfig, OutputConfig, ScrapeConfig,
    VisionConfig,
};
