//! Memory-bounded assembly for long episodes
//!
//! Segments are decoded, analyzed and stitched one at a time. Audio the
//! stitcher releases is final and goes straight to the encoder, except:
//! - leading dialogue is gathered until it covers the intro's dialogue
//!   window, then composited with the intro music
//! - the most recent dialogue (as much as the outro's dialogue window) is
//!   held back until the script ends, then composited with the outro music
//!
//! Resident audio is bounded by two decoded segments plus the intro and
//! outro windows, independent of episode length. Overlap decisions are the
//! same adjacent-pair decisions the in-memory path makes.

use super::{AssemblyPath, AssemblyReport, EpisodeMusic, ProgressCallback};
use crate::analysis::{AnalyzedSegment, AudioSegment};
use crate::audio::types::PcmBuffer;
use crate::config::MixConfig;
use crate::encode::mp3::Mp3Encoder;
use crate::error::{Phase, PhaseContext, Result};
use crate::mix::intro_outro::{apply_intro, apply_outro, IntroStrategy, OutroStrategy};
use crate::pipeline::stitch::DialogueStitcher;
use tracing::debug;

pub(crate) fn assemble(
    segments: Vec<AudioSegment>,
    music: EpisodeMusic<'_>,
    config: &MixConfig,
    progress: Option<&mut ProgressCallback>,
) -> Result<(Vec<u8>, AssemblyReport)> {
    let count = segments.len();
    let mut progress = Progress::new(progress, count + 2);
    let mut sink = StreamSink::new(config, music)?;
    let mut stitcher = DialogueStitcher::new(config);

    if !sink.has_pending_intro() {
        progress.advance();
    }

    for (index, segment) in segments.into_iter().enumerate() {
        let analyzed = AnalyzedSegment::analyze(segment, index, config)?;
        let released = stitcher.push(analyzed);
        if sink.accept(released)? {
            progress.advance();
        }
        progress.advance();
    }

    let (rest, summary) = stitcher.finish();
    if sink.accept(rest)? {
        progress.advance();
    }

    let (mp3, total, outro_start) = sink.finish()?;
    progress.complete();

    let report = AssemblyReport::new(
        AssemblyPath::Streaming,
        count,
        summary,
        total,
        outro_start,
        config,
    );
    Ok((mp3, report))
}

/// Percent reporting over `intro + segments + outro` units
struct Progress<'a> {
    callback: Option<&'a mut ProgressCallback>,
    done: usize,
    total: usize,
}

impl<'a> Progress<'a> {
    fn new(callback: Option<&'a mut ProgressCallback>, total: usize) -> Self {
        Self {
            callback,
            done: 0,
            total,
        }
    }

    fn advance(&mut self) {
        self.done = (self.done + 1).min(self.total);
        self.emit();
    }

    fn complete(&mut self) {
        self.done = self.total;
        self.emit();
    }

    fn emit(&mut self) {
        if let Some(callback) = self.callback.as_deref_mut() {
            let percent = (self.done * 100 / self.total.max(1)).min(100) as u8;
            callback(percent);
        }
    }
}

/// Intro music waiting for enough dialogue to cover its window
struct PendingIntro<'a> {
    strategy: &'a IntroStrategy,
    bed: PcmBuffer,
    head: PcmBuffer,
    window: usize,
}

/// Routes released dialogue through intro, hold-back and encoder
struct StreamSink<'a> {
    encoder: Mp3Encoder,
    intro: Option<PendingIntro<'a>>,
    outro: Option<(&'a OutroStrategy, PcmBuffer)>,
    outro_window: usize,
    held: PcmBuffer,
    encoded: usize,
}

impl<'a> StreamSink<'a> {
    fn new(config: &MixConfig, music: EpisodeMusic<'a>) -> Result<Self> {
        let encoder = Mp3Encoder::new(config.sample_rate, config.bitrate_kbps)
            .in_phase(Phase::Encode, "episode")?;

        let intro = music.intro.map(|(strategy, bed)| PendingIntro {
            strategy,
            bed,
            head: PcmBuffer::empty(config.sample_rate),
            window: strategy.dialogue_window_frames(config.sample_rate),
        });
        let outro_window = music
            .outro
            .as_ref()
            .map(|(strategy, _)| strategy.dialogue_window_frames(config.sample_rate))
            .unwrap_or(0);

        Ok(Self {
            encoder,
            intro,
            outro: music.outro,
            outro_window,
            held: PcmBuffer::empty(config.sample_rate),
            encoded: 0,
        })
    }

    fn has_pending_intro(&self) -> bool {
        self.intro.is_some()
    }

    /// Take released dialogue; returns true when this completed the intro
    fn accept(&mut self, dialogue: PcmBuffer) -> Result<bool> {
        let Some(pending) = self.intro.as_mut() else {
            self.feed(dialogue)?;
            return Ok(false);
        };

        pending.head.append(&dialogue);
        if pending.head.frames() < pending.window {
            return Ok(false);
        }

        self.release_intro()?;
        Ok(true)
    }

    fn release_intro(&mut self) -> Result<()> {
        if let Some(pending) = self.intro.take() {
            debug!(
                "Intro covered by {} dialogue frames (window {})",
                pending.head.frames(),
                pending.window
            );
            let mixed = apply_intro(&pending.bed, &pending.head, pending.strategy);
            self.feed(mixed)?;
        }
        Ok(())
    }

    /// Hold back the outro window, encode everything before it
    fn feed(&mut self, pcm: PcmBuffer) -> Result<()> {
        self.held.append(&pcm);
        drop(pcm);

        let excess = if self.outro.is_some() {
            self.held.frames().saturating_sub(self.outro_window)
        } else {
            self.held.frames()
        };

        if excess > 0 {
            let keep = self.held.split_off(excess);
            let ready = std::mem::replace(&mut self.held, keep);
            self.encoder
                .push(&ready)
                .in_phase(Phase::Encode, "episode")?;
            self.encoded += ready.frames();
        }
        Ok(())
    }

    /// Apply any outstanding intro, composite the outro and finish encoding.
    ///
    /// # Returns
    /// (MP3 bytes, total frames, outro start frame)
    fn finish(mut self) -> Result<(Vec<u8>, usize, Option<usize>)> {
        // Dialogue shorter than the intro window
        self.release_intro()?;

        let mut outro_start = None;
        if let Some((strategy, bed)) = self.outro.take() {
            let held = std::mem::replace(&mut self.held, PcmBuffer::empty(bed.sample_rate));
            outro_start = Some(self.encoded + held.frames().saturating_sub(self.outro_window));
            let mixed = apply_outro(&bed, &held, strategy);
            self.encoder
                .push(&mixed)
                .in_phase(Phase::Encode, "episode")?;
            self.encoded += mixed.frames();
        } else if !self.held.is_empty() {
            self.encoder
                .push(&self.held)
                .in_phase(Phase::Encode, "episode")?;
            self.encoded += self.held.frames();
        }

        let total = self.encoded;
        let mp3 = self.encoder.finish().in_phase(Phase::Encode, "episode")?;
        Ok((mp3, total, outro_start))
    }
}
