//! Incremental dialogue stitching
//!
//! The stitcher holds one analyzed segment back. When the next segment
//! arrives, the overlap between the two is decided, the held segment is
//! released up to the start of the overlap window, the window is mixed,
//! and the new segment becomes the held one (minus the head already
//! mixed). At most two decoded segments are alive at any time, whatever
//! the episode length.

use crate::analysis::AnalyzedSegment;
use crate::audio::types::PcmBuffer;
use crate::config::MixConfig;
use crate::mix::crossfade::{mix_window, Transition};
use crate::mix::overlap::{calculate_overlap, OverlapRule};
use serde::Serialize;
use tracing::debug;

/// Overlap applied between segment `index - 1` and segment `index`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairOverlap {
    pub index: usize,
    pub rule: OverlapRule,
    /// Overlap the rule asked for
    pub requested_ms: f64,
    /// Overlap actually mixed, after clamping to both segments
    pub frames: usize,
    pub additive: bool,
}

/// Edge silence a segment carried before trimming
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentSilence {
    pub index: usize,
    pub leading_ms: f64,
    pub trailing_ms: f64,
}

/// Totals after the last segment
#[derive(Debug, Clone, Default)]
pub struct StitchSummary {
    pub overlaps: Vec<PairOverlap>,
    /// One entry per segment, in script order
    pub silences: Vec<SegmentSilence>,
    /// Sum of segment lengths before overlapping
    pub raw_frames: usize,
    /// Frames removed from the timeline by overlaps
    pub overlap_frames: usize,
}

struct HeldSegment {
    segment: AnalyzedSegment,
    /// Frames at the head already mixed into the previous window
    consumed: usize,
}

/// Joins analyzed segments in script order
pub struct DialogueStitcher<'a> {
    config: &'a MixConfig,
    held: Option<HeldSegment>,
    summary: StitchSummary,
    next_index: usize,
}

impl<'a> DialogueStitcher<'a> {
    pub fn new(config: &'a MixConfig) -> Self {
        Self {
            config,
            held: None,
            summary: StitchSummary::default(),
            next_index: 0,
        }
    }

    /// Add the next segment.
    ///
    /// # Returns
    /// Audio that is now final: the previously held segment up to the
    /// overlap window, followed by the mixed window. Empty for the first
    /// segment.
    pub fn push(&mut self, segment: AnalyzedSegment) -> PcmBuffer {
        let index = self.next_index;
        self.next_index += 1;
        self.summary.raw_frames += segment.pcm.frames();
        self.summary.silences.push(SegmentSilence {
            index,
            leading_ms: segment.leading_silence_ms,
            trailing_ms: segment.trailing_silence_ms,
        });

        let Some(held) = self.held.take() else {
            self.held = Some(HeldSegment {
                segment,
                consumed: 0,
            });
            return PcmBuffer::empty(self.config.sample_rate);
        };

        let decision = calculate_overlap(&held.segment, &segment, self.config);
        let prev = &held.segment.pcm;
        let available = prev.frames() - held.consumed;
        let overlap = self
            .config
            .ms_to_frames(decision.ms)
            .min(available)
            .min(segment.pcm.frames());

        let transition = if segment.is_overlapping {
            Transition::Additive
        } else {
            Transition::Crossfade
        };

        debug!(
            "Segments {}->{}: {:?} {:.1}ms ({} frames, {:?})",
            index - 1,
            index,
            decision.rule,
            decision.ms,
            overlap,
            transition
        );

        let split = prev.frames() - overlap;
        let mut released = prev.slice(held.consumed, split);
        if overlap > 0 {
            let window = mix_window(
                &prev.slice(split, prev.frames()),
                &segment.pcm.slice(0, overlap),
                transition,
                &self.config.transition,
            );
            released.append(&window);
        }

        self.summary.overlap_frames += overlap;
        self.summary.overlaps.push(PairOverlap {
            index,
            rule: decision.rule,
            requested_ms: decision.ms,
            frames: overlap,
            additive: transition == Transition::Additive,
        });

        self.held = Some(HeldSegment {
            segment,
            consumed: overlap,
        });

        released
    }

    /// Release the held segment and return the totals
    pub fn finish(self) -> (PcmBuffer, StitchSummary) {
        let remaining = match self.held {
            Some(held) => {
                let pcm = held.segment.pcm;
                pcm.slice(held.consumed, pcm.frames())
            }
            None => PcmBuffer::empty(self.config.sample_rate),
        };
        (remaining, self.summary)
    }
}
