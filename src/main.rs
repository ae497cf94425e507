//! Command-line entry point.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Parse arguments.
//! 3. Load [`AppConfig`] (from `--config` or the platform settings file),
//!    fill credentials from the environment, apply argument overrides.
//! 4. Build the [`PipelineRunner`] and run the single request.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use webtoon_music::{
    config::AppConfig,
    pipeline::{new_shared_state, ContentKind, PipelineRequest, PipelineRunner},
};

/// Generate music based on webtoon or web novel content
#[derive(Parser, Debug)]
#[command(name = "webtoon-music")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Content type
    #[arg(long = "type", value_enum)]
    kind: ContentKind,

    /// URL or comma-separated image files for a webtoon, `.txt` path for a novel
    #[arg(long)]
    input: String,

    /// Output music file name (placed inside the run directory)
    #[arg(long)]
    output: Option<String>,

    /// OpenAI API key for image analysis
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Use cached content if available
    #[arg(long)]
    use_cache: bool,

    /// Settings file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Normalize the soundtrack to this loudness in dBFS
    #[arg(long, allow_hyphen_values = true)]
    normalize: Option<f32>,

    /// Also write a preview of this many seconds
    #[arg(long)]
    preview: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 2. Arguments
    let cli = Cli::parse();

    // 3. Configuration
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => AppConfig::load().unwrap_or_else(|e| {
            log::warn!("Failed to load config ({e}); using defaults");
            AppConfig::default()
        }),
    };
    if let Some(key) = cli.api_key.filter(|k| !k.is_empty()) {
        config.vision.api_key = Some(key);
    }
    config.apply_env();
    if cli.normalize.is_some() {
        config.output.normalize_dbfs = cli.normalize;
    }
    if cli.preview.is_some() {
        config.output.preview_secs = cli.preview;
    }

    // 4. Run
    let runner = PipelineRunner::from_config(&config, new_shared_state());
    let request = PipelineRequest {
        kind: cli.kind,
        input: cli.input,
        output_name: cli.output,
        use_cache: cli.use_cache,
    };

    let outcome = runner.run(request).await.context("pipeline failed")?;

    log::info!("Soundtrack: {}", outcome.music_path.display());
    if let Some(preview) = &outcome.preview_path {
        log::info!("Preview: {}", preview.display());
    }
    log::info!("Output directory: {}", outcome.output_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_novel_invocation() {
        let cli = Cli::try_parse_from([
            "webtoon-music",
            "--type",
            "novel",
            "--input",
            "book.txt",
            "--api-key",
            "sk-x",
            "--use-cache",
            "--normalize",
            "-18",
        ])
        .unwrap();
        assert_eq!(cli.kind, ContentKind::Novel);
        assert_eq!(cli.input, "book.txt");
        assert_eq!(cli.api_key.as_deref(), Some("sk-x"));
        assert!(cli.use_cache);
        assert_eq!(cli.normalize, Some(-18.0));
        assert!(cli.preview.is_none());
    }

    #[test]
    fn rejects_unknown_type() {
        assert!(Cli::try_parse_from(["webtoon-music", "--type", "comic", "--input", "x"]).is_err());
    }
}
