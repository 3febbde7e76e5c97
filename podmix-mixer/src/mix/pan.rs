//! Constant-power stereo positioning
//!
//! Pan runs from 0.0 (hard left) to 1.0 (hard right):
//! `left = cos(pan * PI/2)`, `right = sin(pan * PI/2)`, so
//! `left^2 + right^2 = 1` at every position and perceived loudness stays
//! constant as a speaker moves across the field.

use crate::audio::types::PcmBuffer;
use std::f32::consts::FRAC_PI_2;

/// Left/right gains for a pan position (clamped to 0.0..=1.0)
pub fn pan_gains(pan: f32) -> (f32, f32) {
    let angle = pan.clamp(0.0, 1.0) * FRAC_PI_2;
    (angle.cos(), angle.sin())
}

/// Position a voice: downmix to mono, then spread with the pan law.
pub fn apply_pan(pcm: &mut PcmBuffer, pan: f32) {
    let (left_gain, right_gain) = pan_gains(pan);

    for (l, r) in pcm.left.iter_mut().zip(pcm.right.iter_mut()) {
        let mono = (*l + *r) * 0.5;
        *l = mono * left_gain;
        *r = mono * right_gain;
    }
}
