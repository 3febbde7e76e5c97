//! Episode script manifests
//!
//! A script lists the synthesized line clips in speaking order:
//!
//! ```toml
//! [[segments]]
//! file = "clips/001.mp3"
//! speaker = "host"
//! text = "Welcome back to the show."
//!
//! [[segments]]
//! file = "clips/002.mp3"
//! speaker = "guest"
//! text = "[laughs] Thanks for having me."
//! overlapping = true
//! ```
//!
//! Relative clip paths resolve against the directory holding the script.

use crate::analysis::{AudioSegment, Speaker};
use crate::error::{Error, Phase, PhaseContext, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    pub segments: Vec<ScriptLine>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptLine {
    pub file: PathBuf,
    pub speaker: Speaker,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub overlapping: bool,
}

impl Script {
    pub fn from_toml(text: &str) -> Result<Self> {
        let script: Script = toml::from_str(text)
            .map_err(|e| Error::Config(format!("Invalid script manifest: {}", e)))?;
        if script.segments.is_empty() {
            return Err(Error::Config("script has no segments".to_string()));
        }
        Ok(script)
    }

    /// Read and parse a manifest file
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::Config(format!("Failed to read script {}: {}", path.display(), e))
        })?;
        Self::from_toml(&text)
    }

    /// Read every clip, resolving relative paths against `base_dir`
    pub async fn read_segments(&self, base_dir: &Path) -> Result<Vec<AudioSegment>> {
        let mut segments = Vec::with_capacity(self.segments.len());
        for (index, line) in self.segments.iter().enumerate() {
            let path = if line.file.is_absolute() {
                line.file.clone()
            } else {
                base_dir.join(&line.file)
            };

            let audio = tokio::fs::read(&path)
                .await
                .map_err(Error::Io)
                .in_phase(Phase::Fetch, format!("segment {} ({})", index, path.display()))?;
            debug!("Read segment {}: {} bytes from {}", index, audio.len(), path.display());

            segments.push(
                AudioSegment::new(audio, line.speaker, line.text.clone())
                    .overlapping(line.overlapping),
            );
        }
        Ok(segments)
    }
}
