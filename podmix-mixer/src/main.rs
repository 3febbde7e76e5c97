//! podmix - command-line episode assembler
//!
//! Reads a script manifest of synthesized line clips, assembles the episode
//! with the configured mixing settings and writes a single MP3.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use podmix_common::config::load_or_default;
use podmix_mixer::{EpisodeAssembler, MixConfig, Script};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for podmix
#[derive(Parser, Debug)]
#[command(name = "podmix")]
#[command(about = "Assemble a two-speaker podcast episode from per-line clips")]
#[command(version)]
struct Args {
    /// Script manifest (TOML) listing the clips in speaking order
    #[arg(short, long, env = "PODMIX_SCRIPT")]
    script: PathBuf,

    /// Mixing settings file (TOML or JSON)
    #[arg(long, env = "PODMIX_SETTINGS")]
    settings: Option<PathBuf>,

    /// Output MP3 path
    #[arg(short, long, default_value = "episode.mp3")]
    output: PathBuf,

    /// Write the assembly report as JSON to this path
    #[arg(long)]
    report: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let settings = load_or_default(args.settings.as_deref()).context("Failed to load settings")?;

    // RUST_LOG overrides the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "podmix={level},podmix_mixer={level}",
                    level = settings.logging.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Script: {}", args.script.display());

    let config = MixConfig::from_settings(&settings).context("Invalid mixing settings")?;

    let script = Script::load(&args.script)
        .await
        .with_context(|| format!("Failed to load script {}", args.script.display()))?;
    let base_dir = args.script.parent().unwrap_or_else(|| Path::new("."));
    let segments = script
        .read_segments(base_dir)
        .await
        .context("Failed to read segment clips")?;

    info!("Loaded {} segments", segments.len());

    let mut assembler = EpisodeAssembler::new(config).with_progress(|percent| {
        info!("Progress: {}%", percent);
    });
    let episode = assembler
        .assemble(segments)
        .await
        .context("Episode assembly failed")?;

    tokio::fs::write(&args.output, &episode.mp3)
        .await
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    info!(
        "Wrote {} ({} bytes, {:.2}s, {:?} path)",
        args.output.display(),
        episode.mp3.len(),
        episode.report.duration_ms / 1000.0,
        episode.report.path
    );

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&episode.report)
            .context("Failed to serialize assembly report")?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        info!("Report written to {}", path.display());
    }

    Ok(())
}
