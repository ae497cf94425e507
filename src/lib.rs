//! Webtoon / novel to soundtrack.
//!
//! ```text
//! content ──► analysis ──► music
//!    │            │           │
//!    └──── cache ─┴───────────┘      report ◄── pipeline (orchestration)
//! ```

pub mod analysis;
pub mod cache;
pub mod config;
pub mod content;
pub mod music;
pub mod pipeline;
pub mod report;
