//! Mixing settings
//!
//! Serializable configuration for one episode mix. Volumes and pan
//! positions are percentages (0–100); durations are milliseconds.
//!
//! Every field carries a default, and every section is `#[serde(default)]`,
//! so a partial settings document (or an empty one) always deserializes
//! into a complete, usable configuration.
//!
//! The mixing engine converts these values into an immutable runtime
//! configuration (fractions, sample counts) before any audio is touched.

use crate::fade_curves::FadeCurve;
use serde::{Deserialize, Serialize};

/// Top-level mixing settings for one episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixingSettings {
    /// Intro music compositing
    pub intro: IntroSettings,

    /// Outro music compositing
    pub outro: OutroSettings,

    /// Per-speaker stereo placement
    pub stereo: StereoSettings,

    /// Per-category overlap durations between adjacent lines
    pub overlap: OverlapSettings,

    /// Silence detection and edge trimming
    pub silence: SilenceSettings,

    /// Working sample rate, encoder bitrate, resampler choice
    pub output: OutputSettings,

    /// Where default intro/outro music is fetched from
    pub assets: AssetSettings,

    /// Log level for the command-line tool
    pub logging: LoggingSettings,

    /// Segment count above which the memory-bounded streaming path is used
    ///
    /// Default: 40
    pub large_scale_threshold: usize,
}

impl Default for MixingSettings {
    fn default() -> Self {
        Self {
            intro: IntroSettings::default(),
            outro: OutroSettings::default(),
            stereo: StereoSettings::default(),
            overlap: OverlapSettings::default(),
            silence: SilenceSettings::default(),
            output: OutputSettings::default(),
            assets: AssetSettings::default(),
            logging: LoggingSettings::default(),
            large_scale_threshold: 40,
        }
    }
}

impl MixingSettings {
    /// Parse settings from a JSON document
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse settings from a TOML document
    pub fn from_toml(text: &str) -> crate::Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Intro settings (parametric phases plus optional envelope override)
///
/// Parametric timeline:
/// 1. music alone at full volume for `music_solo_ms`
/// 2. music ducks to `bed_volume` while dialogue fades in over
///    `dialogue_fade_in_ms`, then holds at bed for `bed_hold_ms`
/// 3. music fades bed → silence over `fade_out_ms` using `fade_out_curve`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntroSettings {
    /// Default: false
    pub enabled: bool,

    /// Music-only lead before the first line
    ///
    /// Default: 3000 ms
    pub music_solo_ms: u32,

    /// Music volume under dialogue (percent)
    ///
    /// Valid range: [0, 100]
    /// Default: 20
    pub bed_volume: f32,

    /// Dialogue fade-in window (music ducks over the same window)
    ///
    /// Default: 500 ms
    pub dialogue_fade_in_ms: u32,

    /// Time the music holds at bed volume under full dialogue
    ///
    /// Default: 4000 ms
    pub bed_hold_ms: u32,

    /// Music bed → silence fade duration
    ///
    /// Default: 3000 ms
    pub fade_out_ms: u32,

    /// Default: exponential
    pub fade_out_curve: FadeCurve,

    /// Custom intro music: `http(s)://` URL or local file path
    pub source: Option<String>,

    /// Envelope pair; when present it replaces the parametric phases
    pub envelopes: Option<EnvelopePairSettings>,
}

impl Default for IntroSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            music_solo_ms: 3000,
            bed_volume: 20.0,
            dialogue_fade_in_ms: 500,
            bed_hold_ms: 4000,
            fade_out_ms: 3000,
            fade_out_curve: FadeCurve::Exponential,
            source: None,
            envelopes: None,
        }
    }
}

/// Outro settings (parametric phases plus optional envelope override)
///
/// Parametric timeline, anchored on the end of the last line:
/// 1. music rises silence → `bed_volume` over `rise_ms` under full dialogue
/// 2. music holds at bed for `hold_ms`
/// 3. over the final `crossfade_ms` of dialogue, music rises bed → full
///    while dialogue fades to silence
/// 4. music plays alone for `tail_ms`, fading out over its last `final_fade_ms`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutroSettings {
    /// Default: false
    pub enabled: bool,

    /// Default: 2000 ms
    pub rise_ms: u32,

    /// Default: linear
    pub rise_curve: FadeCurve,

    /// Music volume under dialogue (percent)
    ///
    /// Valid range: [0, 100]
    /// Default: 20
    pub bed_volume: f32,

    /// Default: 2000 ms
    pub hold_ms: u32,

    /// Final dialogue fade / music swell window
    ///
    /// Default: 1500 ms
    pub crossfade_ms: u32,

    /// Music-only tail after the last line
    ///
    /// Default: 4000 ms
    pub tail_ms: u32,

    /// Fade applied to the end of the tail
    ///
    /// Default: 1000 ms
    pub final_fade_ms: u32,

    /// Custom outro music: `http(s)://` URL or local file path
    pub source: Option<String>,

    /// Envelope pair; when present it replaces the parametric phases
    pub envelopes: Option<EnvelopePairSettings>,
}

impl Default for OutroSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            rise_ms: 2000,
            rise_curve: FadeCurve::Linear,
            bed_volume: 20.0,
            hold_ms: 2000,
            crossfade_ms: 1500,
            tail_ms: 4000,
            final_fade_ms: 1000,
            source: None,
            envelopes: None,
        }
    }
}

/// Stereo placement per speaker (percent; 0 = hard left, 100 = hard right)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StereoSettings {
    /// Default: 35
    pub host_pan: f32,

    /// Default: 65
    pub guest_pan: f32,
}

impl Default for StereoSettings {
    fn default() -> Self {
        Self {
            host_pan: 35.0,
            guest_pan: 65.0,
        }
    }
}

/// Upper bounds for each overlap category (milliseconds)
///
/// The calculator further caps each value by a fraction of the adjacent
/// segment lengths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlapSettings {
    /// Plain speaker change. Default: 50
    pub speaker_change_ms: u32,

    /// Answer following a question. Default: 100
    pub question_ms: u32,

    /// Interruption (also used after a trailing-off line). Default: 180
    pub interrupt_ms: u32,

    /// Short reaction ("yeah", "right"). Default: 250
    pub reaction_ms: u32,

    /// Explicitly overlapping line. Default: 600
    pub overlapping_ms: u32,

    /// Segments shorter than this never overlap (unless explicitly
    /// flagged overlapping). Default: 300
    pub min_segment_ms: u32,
}

impl Default for OverlapSettings {
    fn default() -> Self {
        Self {
            speaker_change_ms: 50,
            question_ms: 100,
            interrupt_ms: 180,
            reaction_ms: 250,
            overlapping_ms: 600,
            min_segment_ms: 300,
        }
    }
}

/// Silence detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SilenceSettings {
    /// Samples quieter than this are silent
    ///
    /// Default: -40.0 dBFS
    pub threshold_db: f32,

    /// When set, edge silence longer than this is trimmed from each line
    ///
    /// Default: None (no trimming)
    pub max_edge_silence_ms: Option<u32>,
}

impl Default for SilenceSettings {
    fn default() -> Self {
        Self {
            threshold_db: -40.0,
            max_edge_silence_ms: None,
        }
    }
}

/// Resampler choice for sources not at the working rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResampleQuality {
    /// Two-point linear interpolation
    #[default]
    Linear,

    /// Polynomial band-limited resampling (rubato)
    Sinc,
}

/// Output format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Working and output sample rate
    ///
    /// Default: 44100 Hz
    pub sample_rate: u32,

    /// MP3 constant bitrate
    ///
    /// Valid values: 64, 96, 112, 128, 160, 192, 224, 256, 320
    /// Default: 128
    pub bitrate_kbps: u32,

    /// Default: linear
    pub resample: ResampleQuality,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            bitrate_kbps: 128,
            resample: ResampleQuality::Linear,
        }
    }
}

/// Default intro/outro asset location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetSettings {
    /// Default: http://127.0.0.1:3000
    pub base_url: String,

    /// Default: /audio/podcast-intro.mp3
    pub intro_path: String,

    /// Default: /audio/podcast-outro.mp3
    pub outro_path: String,

    /// Per-request timeout
    ///
    /// Default: 15000 ms
    pub fetch_timeout_ms: u64,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            intro_path: "/audio/podcast-intro.mp3".to_string(),
            outro_path: "/audio/podcast-outro.mp3".to_string(),
            fetch_timeout_ms: 15_000,
        }
    }
}

impl AssetSettings {
    /// Full URL of the default intro asset
    pub fn intro_url(&self) -> String {
        join_url(&self.base_url, &self.intro_path)
    }

    /// Full URL of the default outro asset
    pub fn outro_url(&self) -> String {
        join_url(&self.base_url, &self.outro_path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    ///
    /// Default: info
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Gain automation for intro or outro: one curve for music, one for dialogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopePairSettings {
    pub music: EnvelopeSettings,
    pub dialogue: EnvelopeSettings,
}

/// Serialized envelope: breakpoints plus N-1 segment shapes
///
/// An empty `segments` list means every segment is linear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeSettings {
    pub points: Vec<BreakpointSettings>,

    #[serde(default)]
    pub segments: Vec<SegmentSettings>,
}

/// One envelope breakpoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakpointSettings {
    /// Seconds from the start of the intro (or outro) window
    pub time: f64,

    /// Gain, 0.0 to 1.0
    pub volume: f64,
}

/// Shape of the curve between two adjacent breakpoints
///
/// Bezier control points are absolute `[time_seconds, volume]` pairs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SegmentSettings {
    Linear,
    Bezier { cp1: [f64; 2], cp2: [f64; 2] },
}
