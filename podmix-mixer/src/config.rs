//! Runtime mixing configuration
//!
//! `MixConfig` is built once per episode from [`MixingSettings`]: ranges are
//! validated, percentages become fractions, decibels become amplitudes and
//! the intro/outro strategy is chosen. The resulting value is immutable and
//! passed by reference to every stage; no stage reads global state.

use crate::assets::AssetSource;
use crate::error::{Error, Result};
use crate::mix::envelope::EnvelopePair;
use crate::mix::intro_outro::{IntroPhases, IntroStrategy, OutroPhases, OutroStrategy};
use podmix_common::settings::{MixingSettings, OverlapSettings, ResampleQuality};
use std::time::Duration;

/// MP3 bitrates accepted for the output encoder
pub const SUPPORTED_BITRATES_KBPS: &[u32] = &[64, 96, 112, 128, 160, 192, 224, 256, 320];

/// Fractions of adjacent segment lengths that bound each overlap category
///
/// An overlap is the configured duration for its category, further limited
/// by these fractions of the previous (and sometimes current) segment.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapCaps {
    pub overlapping_prev: f64,
    pub overlapping_current: f64,
    pub reaction_prev: f64,
    pub reaction_current: f64,
    pub interrupt_prev: f64,
    pub question_prev: f64,
    pub trail_off_prev: f64,
    pub speaker_change_prev: f64,
}

impl Default for OverlapCaps {
    fn default() -> Self {
        Self {
            overlapping_prev: 0.40,
            overlapping_current: 0.95,
            reaction_prev: 0.30,
            reaction_current: 0.50,
            interrupt_prev: 0.25,
            question_prev: 0.10,
            trail_off_prev: 0.20,
            speaker_change_prev: 0.05,
        }
    }
}

/// Curve constants for the transition mixer
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionShape {
    /// Outgoing gain during a crossfade: (1 - t)^exponent
    pub fade_out_exponent: f32,

    /// Incoming gain during a crossfade: t^exponent
    pub fade_in_exponent: f32,

    /// Edge fade length of an additive overlap, as a fraction of the window
    pub additive_edge_fraction: f32,

    /// Soft limiter is linear below this amplitude, tanh-saturating above
    pub limiter_knee: f32,
}

impl Default for TransitionShape {
    fn default() -> Self {
        Self {
            fade_out_exponent: 1.5,
            fade_in_exponent: 0.8,
            additive_edge_fraction: 0.15,
            limiter_knee: 0.8,
        }
    }
}

/// Immutable per-episode configuration
#[derive(Debug, Clone)]
pub struct MixConfig {
    /// Working and output sample rate (Hz)
    pub sample_rate: u32,

    /// MP3 constant bitrate (kbps)
    pub bitrate_kbps: u32,

    pub resample: ResampleQuality,

    /// Host pan position, 0.0 (left) to 1.0 (right)
    pub host_pan: f32,

    /// Guest pan position, 0.0 (left) to 1.0 (right)
    pub guest_pan: f32,

    /// Per-category overlap durations (milliseconds)
    pub overlap: OverlapSettings,

    pub overlap_caps: OverlapCaps,

    pub transition: TransitionShape,

    /// Linear amplitude below which a sample counts as silent
    pub silence_threshold: f32,

    /// Edge silence kept per line when trimming is enabled
    pub max_edge_silence_ms: Option<u32>,

    /// Intro strategy, `None` when the intro is disabled
    pub intro: Option<IntroStrategy>,

    /// Outro strategy, `None` when the outro is disabled
    pub outro: Option<OutroStrategy>,

    pub intro_source: AssetSource,
    pub outro_source: AssetSource,
    pub fetch_timeout: Duration,

    /// Episodes with more segments than this use the streaming path
    pub large_scale_threshold: usize,
}

impl MixConfig {
    /// Validate settings and build the runtime configuration
    pub fn from_settings(settings: &MixingSettings) -> Result<Self> {
        let output = &settings.output;
        if !(8_000..=192_000).contains(&output.sample_rate) {
            return Err(Error::Config(format!(
                "sample_rate {} out of range [8000, 192000]",
                output.sample_rate
            )));
        }
        if !SUPPORTED_BITRATES_KBPS.contains(&output.bitrate_kbps) {
            return Err(Error::Config(format!(
                "bitrate_kbps {} not one of {:?}",
                output.bitrate_kbps, SUPPORTED_BITRATES_KBPS
            )));
        }
        if settings.silence.threshold_db > 0.0 {
            return Err(Error::Config(format!(
                "silence threshold {} dBFS must not be positive",
                settings.silence.threshold_db
            )));
        }
        if settings.large_scale_threshold == 0 {
            return Err(Error::Config(
                "large_scale_threshold must be at least 1".to_string(),
            ));
        }

        let intro = if settings.intro.enabled {
            Some(match &settings.intro.envelopes {
                Some(pair) => IntroStrategy::Envelope(EnvelopePair::from_settings(pair)?),
                None => IntroStrategy::Parametric(IntroPhases {
                    music_solo_ms: settings.intro.music_solo_ms,
                    bed_volume: percent("intro.bed_volume", settings.intro.bed_volume)?,
                    dialogue_fade_in_ms: settings.intro.dialogue_fade_in_ms,
                    bed_hold_ms: settings.intro.bed_hold_ms,
                    fade_out_ms: settings.intro.fade_out_ms,
                    fade_out_curve: settings.intro.fade_out_curve,
                }),
            })
        } else {
            None
        };

        let outro = if settings.outro.enabled {
            Some(match &settings.outro.envelopes {
                Some(pair) => OutroStrategy::Envelope(EnvelopePair::from_settings(pair)?),
                None => OutroStrategy::Parametric(OutroPhases {
                    rise_ms: settings.outro.rise_ms,
                    rise_curve: settings.outro.rise_curve,
                    bed_volume: percent("outro.bed_volume", settings.outro.bed_volume)?,
                    hold_ms: settings.outro.hold_ms,
                    crossfade_ms: settings.outro.crossfade_ms,
                    tail_ms: settings.outro.tail_ms,
                    final_fade_ms: settings.outro.final_fade_ms,
                }),
            })
        } else {
            None
        };

        let intro_source = match &settings.intro.source {
            Some(source) => AssetSource::parse(source),
            None => AssetSource::Url(settings.assets.intro_url()),
        };
        let outro_source = match &settings.outro.source {
            Some(source) => AssetSource::parse(source),
            None => AssetSource::Url(settings.assets.outro_url()),
        };

        Ok(Self {
            sample_rate: output.sample_rate,
            bitrate_kbps: output.bitrate_kbps,
            resample: output.resample,
            host_pan: percent("stereo.host_pan", settings.stereo.host_pan)?,
            guest_pan: percent("stereo.guest_pan", settings.stereo.guest_pan)?,
            overlap: settings.overlap.clone(),
            overlap_caps: OverlapCaps::default(),
            transition: TransitionShape::default(),
            silence_threshold: db_to_amplitude(settings.silence.threshold_db),
            max_edge_silence_ms: settings.silence.max_edge_silence_ms,
            intro,
            outro,
            intro_source,
            outro_source,
            fetch_timeout: Duration::from_millis(settings.assets.fetch_timeout_ms),
            large_scale_threshold: settings.large_scale_threshold,
        })
    }

    /// Convert milliseconds to a frame count at the working rate
    pub fn ms_to_frames(&self, ms: f64) -> usize {
        (ms * self.sample_rate as f64 / 1000.0).round().max(0.0) as usize
    }

    /// Convert a frame count at the working rate to milliseconds
    pub fn frames_to_ms(&self, frames: usize) -> f64 {
        frames as f64 * 1000.0 / self.sample_rate as f64
    }

    /// Whether any intro or outro music must be composited
    pub fn has_music(&self) -> bool {
        self.intro.is_some() || self.outro.is_some()
    }
}

impl Default for MixConfig {
    fn default() -> Self {
        // Built-in defaults always validate
        match Self::from_settings(&MixingSettings::default()) {
            Ok(config) => config,
            Err(e) => unreachable!("default settings rejected: {}", e),
        }
    }
}

/// Convert a 0–100 percentage setting to a 0.0–1.0 fraction
fn percent(name: &str, value: f32) -> Result<f32> {
    if !(0.0..=100.0).contains(&value) {
        return Err(Error::Config(format!(
            "{} = {} out of range [0, 100]",
            name, value
        )));
    }
    Ok(value / 100.0)
}

/// Convert dBFS to linear amplitude
pub fn db_to_amplitude(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_convert() {
        let config = MixConfig::default();
        assert_eq!(config.sample_rate, 44100);
        assert!((config.host_pan - 0.35).abs() < 1e-6);
        assert!((config.guest_pan - 0.65).abs() < 1e-6);
        assert!((config.silence_threshold - 0.01).abs() < 1e-6);
        assert!(config.intro.is_none());
        assert!(config.outro.is_none());
        assert_eq!(config.large_scale_threshold, 40);
    }

    #[test]
    fn test_out_of_range_percentage_rejected() {
        let mut settings = MixingSettings::default();
        settings.stereo.guest_pan = 140.0;
        assert!(matches!(
            MixConfig::from_settings(&settings),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_unsupported_bitrate_rejected() {
        let mut settings = MixingSettings::default();
        settings.output.bitrate_kbps = 100;
        assert!(MixConfig::from_settings(&settings).is_err());
    }

    #[test]
    fn test_strategy_selected_by_envelope_presence() {
        let mut settings = MixingSettings::default();
        settings.intro.enabled = true;
        settings.outro.enabled = true;
        let config = MixConfig::from_settings(&settings).unwrap();
        assert!(matches!(config.intro, Some(IntroStrategy::Parametric(_))));
        assert!(matches!(config.outro, Some(OutroStrategy::Parametric(_))));

        let json = r#"{
            "intro": {
                "enabled": true,
                "envelopes": {
                    "music": {"points": [{"time": 0.0, "volume": 1.0}, {"time": 2.0, "volume": 0.0}]},
                    "dialogue": {"points": [{"time": 0.0, "volume": 0.0}, {"time": 1.0, "volume": 1.0}]}
                }
            }
        }"#;
        let settings = MixingSettings::from_json(json).unwrap();
        let config = MixConfig::from_settings(&settings).unwrap();
        assert!(matches!(config.intro, Some(IntroStrategy::Envelope(_))));
    }

    #[test]
    fn test_custom_sources() {
        let mut settings = MixingSettings::default();
        settings.intro.source = Some("/music/intro.wav".to_string());
        let config = MixConfig::from_settings(&settings).unwrap();
        assert!(matches!(config.intro_source, AssetSource::File(_)));
        assert_eq!(
            config.outro_source,
            AssetSource::Url("http://127.0.0.1:3000/audio/podcast-outro.mp3".to_string())
        );
    }

    #[test]
    fn test_frame_conversion() {
        let config = MixConfig::default();
        assert_eq!(config.ms_to_frames(1000.0), 44100);
        assert_eq!(config.ms_to_frames(180.0), 7938);
        assert!((config.frames_to_ms(2205) - 50.0).abs() < 1e-9);
    }
}
