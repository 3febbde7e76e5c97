//! Per-segment analysis
//!
//! Turns one encoded script line into an [`AnalyzedSegment`]: decoded,
//! edge-trimmed, panned PCM together with the text features and silence
//! measurements the overlap calculator needs.

pub mod silence;
pub mod text;

use crate::audio::decoder::decode_audio;
use crate::audio::types::PcmBuffer;
use crate::config::MixConfig;
use crate::error::{Error, Phase, PhaseContext, Result};
use crate::mix::pan::apply_pan;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use text::TextFeatures;

/// Who speaks a script line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    #[serde(alias = "HOST", alias = "Host")]
    Host,
    #[serde(alias = "GUEST", alias = "Guest")]
    Guest,
}

impl Speaker {
    /// Configured pan position (0.0 left, 1.0 right)
    pub fn pan(&self, config: &MixConfig) -> f32 {
        match self {
            Speaker::Host => config.host_pan,
            Speaker::Guest => config.guest_pan,
        }
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Speaker::Host => write!(f, "host"),
            Speaker::Guest => write!(f, "guest"),
        }
    }
}

/// One synthesized script line as delivered by the speech step
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSegment {
    /// Encoded MP3 or WAV bytes
    pub audio: Vec<u8>,
    pub speaker: Speaker,
    /// Line text, including bracketed emotion tags
    pub text: String,
    /// Explicit annotation: this line is spoken over the previous one
    pub overlapping: bool,
}

impl AudioSegment {
    pub fn new(audio: Vec<u8>, speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            audio,
            speaker,
            text: text.into(),
            overlapping: false,
        }
    }

    /// Mark the line as spoken over the previous one
    pub fn overlapping(mut self, overlapping: bool) -> Self {
        self.overlapping = overlapping;
        self
    }
}

/// Decoded segment with everything the mixer needs to place it
#[derive(Debug, Clone)]
pub struct AnalyzedSegment {
    /// Stereo PCM, trimmed and panned
    pub pcm: PcmBuffer,
    pub speaker: Speaker,
    pub text: String,
    pub features: TextFeatures,
    pub is_overlapping: bool,
    /// Measured before trimming
    pub leading_silence_ms: f64,
    /// Measured before trimming
    pub trailing_silence_ms: f64,
}

impl AnalyzedSegment {
    /// Decode, measure, trim and pan one script line.
    ///
    /// Errors carry the decode or analyze phase and the segment index.
    /// A line that decodes to no audio at all is rejected.
    pub fn analyze(segment: AudioSegment, index: usize, config: &MixConfig) -> Result<Self> {
        let location = format!("segment {}", index);
        let mut pcm = decode_audio(&segment.audio, config).in_phase(Phase::Decode, &location)?;
        drop(segment.audio);

        if pcm.is_empty() {
            return Err(Error::Decode("segment decoded to zero frames".to_string()))
                .in_phase(Phase::Analyze, &location);
        }

        let leading_silence_ms = silence::leading_silence_ms(&pcm, config.silence_threshold);
        let trailing_silence_ms = silence::trailing_silence_ms(&pcm, config.silence_threshold);

        if let Some(keep_ms) = config.max_edge_silence_ms {
            let (start, end) = silence::trim_edges(&mut pcm, config.silence_threshold, keep_ms);
            if start > 0 || end > 0 {
                debug!(
                    "Segment {}: trimmed {} leading and {} trailing silent frames",
                    index, start, end
                );
            }
        }

        apply_pan(&mut pcm, segment.speaker.pan(config));

        let features = TextFeatures::analyze(&segment.text);
        debug!(
            "Segment {} ({}): {:.0}ms, silence {:.0}ms/{:.0}ms, {} words, reaction={}, interrupting={}, question={}, trail_off={}, overlapping={}",
            index,
            segment.speaker,
            pcm.duration_ms(),
            leading_silence_ms,
            trailing_silence_ms,
            features.word_count,
            features.is_short_reaction,
            features.is_interrupting,
            features.is_question,
            features.ends_with_trail_off,
            segment.overlapping
        );

        Ok(Self {
            pcm,
            speaker: segment.speaker,
            text: segment.text,
            features,
            is_overlapping: segment.overlapping,
            leading_silence_ms,
            trailing_silence_ms,
        })
    }

    /// Duration of the (trimmed) PCM in milliseconds
    pub fn duration_ms(&self) -> f64 {
        self.pcm.duration_ms()
    }
}
