//! Episode assembly
//!
//! Ordered script segments go through decode and analysis, pairwise overlap
//! decisions, stitching, intro/outro compositing and MP3 encoding.
//!
//! **Paths** (chosen once per episode):
//! - `Passthrough`: one segment and no music; the input bytes are returned
//!   verbatim
//! - `InMemory`: every segment is decoded into one dialogue track, music is
//!   composited over its edges, the whole track is encoded
//! - `Streaming`: above the large-scale threshold; segments are decoded one
//!   at a time and released to the encoder as soon as they are final, so
//!   peak memory does not grow with episode length
//!
//! Both mixing paths use the same stitcher and encoder, so they produce the
//! same number of samples for the same input.

pub mod in_memory;
pub mod stitch;
pub mod streaming;

use crate::analysis::AudioSegment;
use crate::assets::AssetFetcher;
use crate::audio::decoder::decode_audio;
use crate::audio::types::PcmBuffer;
use crate::config::MixConfig;
use crate::error::{Error, Phase, PhaseContext, Result};
use crate::mix::intro_outro::{IntroStrategy, OutroStrategy};
use serde::Serialize;
use stitch::{PairOverlap, SegmentSilence, StitchSummary};
use tracing::info;

/// Progress callback, receives a percentage (0-100)
pub type ProgressCallback = Box<dyn FnMut(u8) + Send>;

/// How an episode is assembled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyPath {
    Passthrough,
    InMemory,
    Streaming,
}

impl AssemblyPath {
    /// Pick the path for an episode of `segment_count` lines
    pub fn select(segment_count: usize, config: &MixConfig) -> Self {
        if segment_count == 1 && !config.has_music() {
            AssemblyPath::Passthrough
        } else if segment_count > config.large_scale_threshold {
            AssemblyPath::Streaming
        } else {
            AssemblyPath::InMemory
        }
    }
}

/// What an assembly did
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssemblyReport {
    pub path: AssemblyPath,
    pub segments: usize,
    /// One entry per adjacent pair
    pub overlaps: Vec<PairOverlap>,
    /// Edge silence measured on each line before trimming (empty on the
    /// passthrough path)
    pub silences: Vec<SegmentSilence>,
    /// Stereo frames encoded (0 on the passthrough path)
    pub total_samples: usize,
    pub duration_ms: f64,
    /// Timeline removed by overlaps between lines
    pub consumed_overlap_ms: f64,
    /// Where the outro music enters: the nominal position (sum of line
    /// lengths minus the outro's dialogue window) shifted earlier by the
    /// consumed overlap
    pub outro_start_ms: Option<f64>,
}

impl AssemblyReport {
    fn new(
        path: AssemblyPath,
        segments: usize,
        summary: StitchSummary,
        total_samples: usize,
        outro_start: Option<usize>,
        config: &MixConfig,
    ) -> Self {
        Self {
            path,
            segments,
            overlaps: summary.overlaps,
            silences: summary.silences,
            total_samples,
            duration_ms: config.frames_to_ms(total_samples),
            consumed_overlap_ms: config.frames_to_ms(summary.overlap_frames),
            outro_start_ms: outro_start.map(|frames| config.frames_to_ms(frames)),
        }
    }

    fn passthrough() -> Self {
        Self {
            path: AssemblyPath::Passthrough,
            segments: 1,
            overlaps: Vec::new(),
            silences: Vec::new(),
            total_samples: 0,
            duration_ms: 0.0,
            consumed_overlap_ms: 0.0,
            outro_start_ms: None,
        }
    }
}

/// Encoded episode with its assembly report
#[derive(Debug, Clone)]
pub struct AssembledEpisode {
    pub mp3: Vec<u8>,
    pub report: AssemblyReport,
}

/// Decoded music beds paired with their strategies
pub(crate) struct EpisodeMusic<'a> {
    pub intro: Option<(&'a IntroStrategy, PcmBuffer)>,
    pub outro: Option<(&'a OutroStrategy, PcmBuffer)>,
}

impl<'a> EpisodeMusic<'a> {
    fn decode(
        config: &'a MixConfig,
        intro_music: Option<&[u8]>,
        outro_music: Option<&[u8]>,
    ) -> Result<Self> {
        let intro = match &config.intro {
            Some(strategy) => {
                let bytes = intro_music
                    .ok_or_else(|| Error::Config("intro enabled but no intro music given".to_string()))
                    .in_phase(Phase::Mix, "intro")?;
                let bed = decode_audio(bytes, config).in_phase(Phase::Decode, "intro music")?;
                Some((strategy, bed))
            }
            None => None,
        };

        let outro = match &config.outro {
            Some(strategy) => {
                let bytes = outro_music
                    .ok_or_else(|| Error::Config("outro enabled but no outro music given".to_string()))
                    .in_phase(Phase::Mix, "outro")?;
                let bed = decode_audio(bytes, config).in_phase(Phase::Decode, "outro music")?;
                Some((strategy, bed))
            }
            None => None,
        };

        Ok(Self { intro, outro })
    }
}

/// Assembles one episode from its script segments
pub struct EpisodeAssembler {
    config: MixConfig,
    progress: Option<ProgressCallback>,
    forced_path: Option<AssemblyPath>,
}

impl EpisodeAssembler {
    pub fn new(config: MixConfig) -> Self {
        Self {
            config,
            progress: None,
            forced_path: None,
        }
    }

    /// Receive progress percentages (streaming path only)
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: FnMut(u8) + Send + 'static,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Use `path` regardless of segment count (the passthrough fast path
    /// still applies)
    pub fn with_path(mut self, path: AssemblyPath) -> Self {
        self.forced_path = Some(path);
        self
    }

    pub fn config(&self) -> &MixConfig {
        &self.config
    }

    fn path_for(&self, segment_count: usize) -> AssemblyPath {
        match (AssemblyPath::select(segment_count, &self.config), self.forced_path) {
            (AssemblyPath::Passthrough, _) => AssemblyPath::Passthrough,
            (_, Some(forced)) => forced,
            (selected, None) => selected,
        }
    }

    /// Fetch the configured music and assemble the episode.
    pub async fn assemble(&mut self, segments: Vec<AudioSegment>) -> Result<AssembledEpisode> {
        if self.path_for(segments.len()) == AssemblyPath::Passthrough {
            return self.assemble_with_music(segments, None, None);
        }

        let fetcher = AssetFetcher::new(self.config.fetch_timeout)?;

        let intro_music = match self.config.intro {
            Some(_) => Some(
                fetcher
                    .fetch(&self.config.intro_source)
                    .await
                    .in_phase(Phase::Fetch, "intro music")?,
            ),
            None => None,
        };
        let outro_music = match self.config.outro {
            Some(_) => Some(
                fetcher
                    .fetch(&self.config.outro_source)
                    .await
                    .in_phase(Phase::Fetch, "outro music")?,
            ),
            None => None,
        };

        self.assemble_with_music(segments, intro_music.as_deref(), outro_music.as_deref())
    }

    /// Assemble with already-fetched music bytes.
    ///
    /// Music is required for each enabled intro/outro and ignored otherwise.
    pub fn assemble_with_music(
        &mut self,
        mut segments: Vec<AudioSegment>,
        intro_music: Option<&[u8]>,
        outro_music: Option<&[u8]>,
    ) -> Result<AssembledEpisode> {
        if segments.is_empty() {
            return Err(Error::Config("episode has no segments".to_string()));
        }

        let count = segments.len();
        let path = self.path_for(count);
        info!(
            "Assembling {} segments via {:?} path (intro: {}, outro: {})",
            count,
            path,
            self.config.intro.is_some(),
            self.config.outro.is_some()
        );

        let (mp3, report) = match path {
            AssemblyPath::Passthrough => {
                let segment = segments.remove(0);
                (segment.audio, AssemblyReport::passthrough())
            }
            AssemblyPath::InMemory => {
                let music = EpisodeMusic::decode(&self.config, intro_music, outro_music)?;
                in_memory::assemble(segments, music, &self.config)?
            }
            AssemblyPath::Streaming => {
                let music = EpisodeMusic::decode(&self.config, intro_music, outro_music)?;
                streaming::assemble(segments, music, &self.config, self.progress.as_mut())?
            }
        };

        info!(
            "Episode assembled: {} bytes, {:.2}s, {:.0}ms consumed by overlaps",
            mp3.len(),
            report.duration_ms / 1000.0,
            report.consumed_overlap_ms
        );

        Ok(AssembledEpisode { mp3, report })
    }
}
