//! Intro and outro music compositing
//!
//! Two interchangeable strategies, chosen once when the configuration is
//! built:
//!
//! **Parametric** (fixed phases):
//! - Intro: music alone, then music ducks to the bed level while dialogue
//!   fades in, bed holds under dialogue, then the bed fades to silence
//!   (linear or exponential) while dialogue continues
//! - Outro: music rises from silence to the bed under full dialogue, holds,
//!   then crossfades bed to full as dialogue fades out, followed by a music
//!   tail with a final fade
//!
//! **Envelope**: independent music and dialogue gain curves evaluated per
//! sample. Intro dialogue starts at the dialogue envelope's onset; outro
//! dialogue ends at the dialogue envelope's release.
//!
//! In both strategies the mixed sum passes through a soft limiter that
//! only acts near full scale, and the output always covers the whole
//! dialogue.

use crate::audio::types::PcmBuffer;
use crate::error::Result;
use crate::mix::crossfade::soft_limit;
use crate::mix::envelope::{AudioEnvelope, Breakpoint, CurveSegment, EnvelopePair};
use podmix_common::FadeCurve;
use tracing::debug;

/// Tolerance used when recognising parametric shapes in envelopes
const SHAPE_TOLERANCE: f64 = 1e-6;

/// Music/dialogue sums below this magnitude pass through unchanged
const RENDER_KNEE: f32 = 0.95;

/// Parametric intro phase durations
#[derive(Debug, Clone, PartialEq)]
pub struct IntroPhases {
    /// Music alone before the first line
    pub music_solo_ms: u32,
    /// Bed level under dialogue, 0.0 to 1.0
    pub bed_volume: f32,
    /// Dialogue fade-in while the music ducks to the bed
    pub dialogue_fade_in_ms: u32,
    pub bed_hold_ms: u32,
    /// Bed to silence
    pub fade_out_ms: u32,
    pub fade_out_curve: FadeCurve,
}

impl IntroPhases {
    /// Whole music window
    pub fn window_ms(&self) -> u32 {
        self.music_solo_ms + self.dialogue_window_ms()
    }

    /// Portion of the music window that plays under dialogue
    pub fn dialogue_window_ms(&self) -> u32 {
        self.dialogue_fade_in_ms + self.bed_hold_ms + self.fade_out_ms
    }

    /// Equivalent envelope pair (exact, including exponential fades)
    pub fn to_envelopes(&self) -> Result<EnvelopePair> {
        let bed = self.bed_volume as f64;
        let solo = secs(self.music_solo_ms);
        let ducked = secs(self.music_solo_ms + self.dialogue_fade_in_ms);
        let held = secs(self.music_solo_ms + self.dialogue_fade_in_ms + self.bed_hold_ms);
        let end = secs(self.window_ms());

        let fade_start = Breakpoint::new(held, bed);
        let fade_end = Breakpoint::new(end, 0.0);
        let music = AudioEnvelope::new(
            vec![
                Breakpoint::new(0.0, 1.0),
                Breakpoint::new(solo, 1.0),
                Breakpoint::new(ducked, bed),
                fade_start,
                fade_end,
            ],
            vec![
                CurveSegment::Linear,
                CurveSegment::Linear,
                CurveSegment::Linear,
                CurveSegment::from_fade(self.fade_out_curve, fade_start, fade_end),
            ],
        )?;

        let dialogue = AudioEnvelope::linear(vec![
            Breakpoint::new(0.0, 0.0),
            Breakpoint::new(solo, 0.0),
            Breakpoint::new(ducked, 1.0),
        ])?;

        Ok(EnvelopePair { music, dialogue })
    }

    /// Recover phases from an envelope pair shaped like a parametric intro
    pub fn from_envelopes(pair: &EnvelopePair) -> Option<Self> {
        let music = pair.music.points();
        if music.len() != 5 || pair.dialogue.points().len() != 3 {
            return None;
        }

        let solo = to_ms(music[1].time)?;
        let ducked = to_ms(music[2].time)?;
        let held = to_ms(music[3].time)?;
        let end = to_ms(music[4].time)?;
        let fade_out_curve = match pair.music.segments()[3] {
            CurveSegment::Linear => FadeCurve::Linear,
            CurveSegment::Bezier { .. } => FadeCurve::Exponential,
        };

        let candidate = Self {
            music_solo_ms: solo,
            bed_volume: music[2].volume as f32,
            dialogue_fade_in_ms: ducked.checked_sub(solo)?,
            bed_hold_ms: held.checked_sub(ducked)?,
            fade_out_ms: end.checked_sub(held)?,
            fade_out_curve,
        };

        let rebuilt = candidate.to_envelopes().ok()?;
        rebuilt.approx_eq(pair, SHAPE_TOLERANCE).then_some(candidate)
    }

    /// Music and dialogue gains at `frame` from the start of the intro
    fn gains(&self, frame: usize, sample_rate: u32) -> (f32, f32) {
        let solo = frames(self.music_solo_ms, sample_rate);
        let ducked = frames(self.music_solo_ms + self.dialogue_fade_in_ms, sample_rate);
        let held = frames(
            self.music_solo_ms + self.dialogue_fade_in_ms + self.bed_hold_ms,
            sample_rate,
        );
        let end = frames(self.window_ms(), sample_rate);

        if frame < solo {
            (1.0, 0.0)
        } else if frame < ducked {
            let position = progress(frame, solo, ducked);
            (1.0 + (self.bed_volume - 1.0) * position, position)
        } else if frame < held {
            (self.bed_volume, 1.0)
        } else if frame < end {
            let position = progress(frame, held, end);
            (self.fade_out_curve.ramp(self.bed_volume, 0.0, position), 1.0)
        } else {
            (0.0, 1.0)
        }
    }
}

/// Parametric outro phase durations
#[derive(Debug, Clone, PartialEq)]
pub struct OutroPhases {
    /// Music rise from silence to the bed under the last lines
    pub rise_ms: u32,
    pub rise_curve: FadeCurve,
    /// Bed level, 0.0 to 1.0
    pub bed_volume: f32,
    pub hold_ms: u32,
    /// Bed to full while dialogue fades out
    pub crossfade_ms: u32,
    /// Music after the dialogue ends
    pub tail_ms: u32,
    /// Final fade at the end of the tail
    pub final_fade_ms: u32,
}

impl OutroPhases {
    /// Portion of the music window that plays under dialogue
    pub fn dialogue_window_ms(&self) -> u32 {
        self.rise_ms + self.hold_ms + self.crossfade_ms
    }

    pub fn window_ms(&self) -> u32 {
        self.dialogue_window_ms() + self.tail_ms
    }

    pub fn to_envelopes(&self) -> Result<EnvelopePair> {
        let bed = self.bed_volume as f64;
        let risen = secs(self.rise_ms);
        let held = secs(self.rise_ms + self.hold_ms);
        let crossfaded = secs(self.dialogue_window_ms());
        let fading = secs(self.window_ms() - self.final_fade_ms.min(self.tail_ms));
        let end = secs(self.window_ms());

        let rise_start = Breakpoint::new(0.0, 0.0);
        let rise_end = Breakpoint::new(risen, bed);
        let music = AudioEnvelope::new(
            vec![
                rise_start,
                rise_end,
                Breakpoint::new(held, bed),
                Breakpoint::new(crossfaded, 1.0),
                Breakpoint::new(fading, 1.0),
                Breakpoint::new(end, 0.0),
            ],
            vec![
                CurveSegment::from_fade(self.rise_curve, rise_start, rise_end),
                CurveSegment::Linear,
                CurveSegment::Linear,
                CurveSegment::Linear,
                CurveSegment::Linear,
            ],
        )?;

        let dialogue = AudioEnvelope::linear(vec![
            Breakpoint::new(0.0, 1.0),
            Breakpoint::new(held, 1.0),
            Breakpoint::new(crossfaded, 0.0),
        ])?;

        Ok(EnvelopePair { music, dialogue })
    }

    /// Recover phases from an envelope pair shaped like a parametric outro
    pub fn from_envelopes(pair: &EnvelopePair) -> Option<Self> {
        let music = pair.music.points();
        if music.len() != 6 || pair.dialogue.points().len() != 3 {
            return None;
        }

        let risen = to_ms(music[1].time)?;
        let held = to_ms(music[2].time)?;
        let crossfaded = to_ms(music[3].time)?;
        let fading = to_ms(music[4].time)?;
        let end = to_ms(music[5].time)?;
        let rise_curve = match pair.music.segments()[0] {
            CurveSegment::Linear => FadeCurve::Linear,
            CurveSegment::Bezier { .. } => FadeCurve::Exponential,
        };

        let candidate = Self {
            rise_ms: risen,
            rise_curve,
            bed_volume: music[1].volume as f32,
            hold_ms: held.checked_sub(risen)?,
            crossfade_ms: crossfaded.checked_sub(held)?,
            tail_ms: end.checked_sub(crossfaded)?,
            final_fade_ms: end.checked_sub(fading)?,
        };

        let rebuilt = candidate.to_envelopes().ok()?;
        rebuilt.approx_eq(pair, SHAPE_TOLERANCE).then_some(candidate)
    }
}

/// Intro compositing strategy
#[derive(Debug, Clone, PartialEq)]
pub enum IntroStrategy {
    Parametric(IntroPhases),
    Envelope(EnvelopePair),
}

impl IntroStrategy {
    /// Frames of dialogue the intro music plays under
    pub fn dialogue_window_frames(&self, sample_rate: u32) -> usize {
        match self {
            IntroStrategy::Parametric(phases) => frames(phases.window_ms(), sample_rate)
                .saturating_sub(frames(phases.music_solo_ms, sample_rate)),
            IntroStrategy::Envelope(pair) => seconds_to_frames(pair.end_time(), sample_rate)
                .saturating_sub(seconds_to_frames(pair.dialogue.onset_time(), sample_rate)),
        }
    }
}

/// Outro compositing strategy
#[derive(Debug, Clone, PartialEq)]
pub enum OutroStrategy {
    Parametric(OutroPhases),
    Envelope(EnvelopePair),
}

impl OutroStrategy {
    /// Frames of dialogue the outro music plays under
    pub fn dialogue_window_frames(&self, sample_rate: u32) -> usize {
        match self {
            OutroStrategy::Parametric(phases) => {
                frames(phases.rise_ms, sample_rate)
                    + frames(phases.hold_ms, sample_rate)
                    + frames(phases.crossfade_ms, sample_rate)
            }
            OutroStrategy::Envelope(pair) => {
                seconds_to_frames(pair.dialogue.release_time(), sample_rate)
            }
        }
    }
}

/// Composite intro music under the start of the dialogue.
///
/// # Returns
/// Mixed buffer of `max(intro window, dialogue offset + dialogue length)` frames
pub fn apply_intro(music: &PcmBuffer, dialogue: &PcmBuffer, strategy: &IntroStrategy) -> PcmBuffer {
    let rate = dialogue.sample_rate;

    match strategy {
        IntroStrategy::Parametric(phases) => {
            let offset = frames(phases.music_solo_ms, rate);
            let len = frames(phases.window_ms(), rate).max(offset + dialogue.frames());
            debug!(
                "Parametric intro: {}ms window, dialogue at {}ms, {} frames",
                phases.window_ms(),
                phases.music_solo_ms,
                len
            );
            render(len, music, 0, dialogue, offset as i64, |p| {
                phases.gains(p, rate)
            })
        }
        IntroStrategy::Envelope(pair) => {
            let offset = seconds_to_frames(pair.dialogue.onset_time(), rate);
            let len = seconds_to_frames(pair.end_time(), rate).max(offset + dialogue.frames());
            debug!(
                "Envelope intro: {:.3}s envelope, dialogue onset {:.3}s, {} frames",
                pair.end_time(),
                pair.dialogue.onset_time(),
                len
            );
            render(len, music, 0, dialogue, offset as i64, |p| {
                let t = p as f64 / rate as f64;
                (pair.music.sample(t) as f32, pair.dialogue.sample(t) as f32)
            })
        }
    }
}

/// Composite outro music over the end of the dialogue.
///
/// # Returns
/// Mixed buffer covering the whole dialogue plus the music tail
pub fn apply_outro(music: &PcmBuffer, dialogue: &PcmBuffer, strategy: &OutroStrategy) -> PcmBuffer {
    let rate = dialogue.sample_rate;
    let dialogue_len = dialogue.frames();

    match strategy {
        OutroStrategy::Parametric(phases) => {
            // Phase starts, walked back from the end of the dialogue and clamped at zero
            let crossfade = frames(phases.crossfade_ms, rate);
            let xfade_start = dialogue_len.saturating_sub(crossfade);
            let hold_start = xfade_start.saturating_sub(frames(phases.hold_ms, rate));
            let rise_start = hold_start.saturating_sub(frames(phases.rise_ms, rate));
            let xfade_end = xfade_start + crossfade;
            let tail = frames(phases.tail_ms, rate);
            let fade_start = xfade_end + tail - frames(phases.final_fade_ms, rate).min(tail);
            let len = xfade_end + tail;

            debug!(
                "Parametric outro: music from frame {}, crossfade at {}, {} frames",
                rise_start, xfade_start, len
            );

            let gains = |p: usize| -> (f32, f32) {
                if p < rise_start {
                    (0.0, 1.0)
                } else if p < hold_start {
                    let position = progress(p, rise_start, hold_start);
                    (phases.rise_curve.ramp(0.0, phases.bed_volume, position), 1.0)
                } else if p < xfade_start {
                    (phases.bed_volume, 1.0)
                } else if p < xfade_end {
                    let position = progress(p, xfade_start, xfade_end);
                    (
                        phases.bed_volume + (1.0 - phases.bed_volume) * position,
                        1.0 - position,
                    )
                } else if p < fade_start {
                    (1.0, 0.0)
                } else {
                    (1.0 - progress(p, fade_start, len), 0.0)
                }
            };

            render(len, music, rise_start as i64, dialogue, 0, gains)
        }
        OutroStrategy::Envelope(pair) => {
            let release = seconds_to_frames(pair.dialogue.release_time(), rate) as i64;
            let start = dialogue_len as i64 - release;
            let envelope_end = start + seconds_to_frames(pair.end_time(), rate) as i64;
            let len = (dialogue_len as i64).max(envelope_end).max(0) as usize;

            debug!(
                "Envelope outro: envelope starts at frame {}, release {:.3}s, {} frames",
                start,
                pair.dialogue.release_time(),
                len
            );

            render(len, music, start, dialogue, 0, |p| {
                let t = (p as i64 - start) as f64 / rate as f64;
                (pair.music.sample(t) as f32, pair.dialogue.sample(t) as f32)
            })
        }
    }
}

/// Mix music and dialogue placed at frame offsets with per-frame gains
fn render<F>(
    len: usize,
    music: &PcmBuffer,
    music_offset: i64,
    dialogue: &PcmBuffer,
    dialogue_offset: i64,
    gains: F,
) -> PcmBuffer
where
    F: Fn(usize) -> (f32, f32),
{
    let mut left = Vec::with_capacity(len);
    let mut right = Vec::with_capacity(len);

    for p in 0..len {
        let (music_gain, dialogue_gain) = gains(p);
        let (ml, mr) = frame_at(music, p as i64 - music_offset);
        let (dl, dr) = frame_at(dialogue, p as i64 - dialogue_offset);

        left.push(soft_limit(ml * music_gain + dl * dialogue_gain, RENDER_KNEE));
        right.push(soft_limit(mr * music_gain + dr * dialogue_gain, RENDER_KNEE));
    }

    PcmBuffer::new(left, right, dialogue.sample_rate)
}

fn frame_at(buffer: &PcmBuffer, index: i64) -> (f32, f32) {
    if index < 0 {
        (0.0, 0.0)
    } else {
        buffer.frame_or_silence(index as usize)
    }
}

fn progress(frame: usize, start: usize, end: usize) -> f32 {
    if end <= start {
        1.0
    } else {
        (frame - start) as f32 / (end - start) as f32
    }
}

fn frames(ms: u32, sample_rate: u32) -> usize {
    (ms as f64 * sample_rate as f64 / 1000.0).round() as usize
}

fn seconds_to_frames(seconds: f64, sample_rate: u32) -> usize {
    (seconds * sample_rate as f64).round().max(0.0) as usize
}

fn secs(ms: u32) -> f64 {
    ms as f64 / 1000.0
}

fn to_ms(seconds: f64) -> Option<u32> {
    let ms = (seconds * 1000.0).round();
    (ms.is_finite() && ms >= 0.0 && ms <= u32::MAX as f64).then_some(ms as u32)
}
