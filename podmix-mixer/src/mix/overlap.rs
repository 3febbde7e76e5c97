//! Turn-taking overlap between adjacent lines
//!
//! A pure function of the two neighbouring segments and the configuration.
//! Rules are checked in priority order and the first match wins:
//!
//! | Rule | Condition | Overlap |
//! |---|---|---|
//! | Overlapping | current line is annotated as overlapping | min(overlapping, 40% prev, 95% current) |
//! | TooShort | either line shorter than the minimum length | 0 |
//! | SameSpeaker | no speaker change | 0 |
//! | Reaction | current line is a short reaction | min(reaction, 30% prev, 50% current) |
//! | Interrupt | current line is tagged `[interrupting]` | min(interrupt, 25% prev) |
//! | Question | previous line asks a question | min(question, 10% prev) |
//! | TrailOff | previous line trails off (`...`) | min(interrupt, 20% prev) |
//! | SpeakerChange | any other speaker change | min(speaker_change, 5% prev) |
//!
//! The explicit annotation bypasses the minimum-length gate.

use crate::analysis::AnalyzedSegment;
use crate::config::MixConfig;
use serde::Serialize;

/// Which rule produced an overlap decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapRule {
    Overlapping,
    TooShort,
    SameSpeaker,
    Reaction,
    Interrupt,
    Question,
    TrailOff,
    SpeakerChange,
}

impl OverlapRule {
    /// Priority position, 0 is checked first
    pub fn priority(&self) -> u8 {
        match self {
            OverlapRule::Overlapping => 0,
            OverlapRule::TooShort => 1,
            OverlapRule::SameSpeaker => 2,
            OverlapRule::Reaction => 3,
            OverlapRule::Interrupt => 4,
            OverlapRule::Question => 5,
            OverlapRule::TrailOff => 6,
            OverlapRule::SpeakerChange => 7,
        }
    }
}

/// Overlap chosen for one adjacent pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverlapDecision {
    pub rule: OverlapRule,
    /// Overlap in milliseconds, 0 for a plain butt join
    pub ms: f64,
}

impl OverlapDecision {
    fn new(rule: OverlapRule, ms: f64) -> Self {
        Self {
            rule,
            ms: ms.max(0.0),
        }
    }
}

/// Decide how far `current` starts before `prev` ends.
pub fn calculate_overlap(
    prev: &AnalyzedSegment,
    current: &AnalyzedSegment,
    config: &MixConfig,
) -> OverlapDecision {
    let durations = &config.overlap;
    let caps = &config.overlap_caps;
    let prev_ms = prev.duration_ms();
    let current_ms = current.duration_ms();

    if current.is_overlapping {
        let ms = (durations.overlapping_ms as f64)
            .min(prev_ms * caps.overlapping_prev)
            .min(current_ms * caps.overlapping_current);
        return OverlapDecision::new(OverlapRule::Overlapping, ms);
    }

    let min_segment = durations.min_segment_ms as f64;
    if prev_ms < min_segment || current_ms < min_segment {
        return OverlapDecision::new(OverlapRule::TooShort, 0.0);
    }

    if prev.speaker == current.speaker {
        return OverlapDecision::new(OverlapRule::SameSpeaker, 0.0);
    }

    if current.features.is_short_reaction {
        let ms = (durations.reaction_ms as f64)
            .min(prev_ms * caps.reaction_prev)
            .min(current_ms * caps.reaction_current);
        return OverlapDecision::new(OverlapRule::Reaction, ms);
    }

    if current.features.is_interrupting {
        let ms = (durations.interrupt_ms as f64).min(prev_ms * caps.interrupt_prev);
        return OverlapDecision::new(OverlapRule::Interrupt, ms);
    }

    if prev.features.is_question {
        let ms = (durations.question_ms as f64).min(prev_ms * caps.question_prev);
        return OverlapDecision::new(OverlapRule::Question, ms);
    }

    if prev.features.ends_with_trail_off {
        let ms = (durations.interrupt_ms as f64).min(prev_ms * caps.trail_off_prev);
        return OverlapDecision::new(OverlapRule::TrailOff, ms);
    }

    let ms = (durations.speaker_change_ms as f64).min(prev_ms * caps.speaker_change_prev);
    OverlapDecision::new(OverlapRule::SpeakerChange, ms)
}
