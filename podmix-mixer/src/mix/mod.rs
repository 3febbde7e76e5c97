//! Mixing stages
//!
//! - `overlap`: how far each line starts before the previous one ends
//! - `pan`: constant-power speaker placement
//! - `crossfade`: crossfade and additive transitions, splicing
//! - `envelope`: breakpoint gain curves
//! - `intro_outro`: music compositing at the episode edges

pub mod crossfade;
pub mod envelope;
pub mod intro_outro;
pub mod overlap;
pub mod pan;

pub use crossfade::{splice, Transition};
pub use envelope::{AudioEnvelope, Breakpoint, CurveSegment, EnvelopePair};
pub use intro_outro::{apply_intro, apply_outro, IntroStrategy, OutroStrategy};
pub use overlap::{calculate_overlap, OverlapDecision, OverlapRule};
