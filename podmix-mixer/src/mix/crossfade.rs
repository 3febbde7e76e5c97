//! Transition mixing between adjacent lines
//!
//! # Crossfade
//!
//! Over an overlap window of `L` frames with `t = i / L`:
//! - outgoing gain `(1 - t)^1.5`
//! - incoming gain `t^0.8`
//!
//! When the two gains sum past 1.0 both are scaled down by their sum, so the
//! join never gets louder than either voice and the incoming speaker
//! dominates early.
//!
//! # Additive overlap
//!
//! Used for lines explicitly annotated as spoken over the previous one. Both
//! voices stay at full level except for short linear edge fades
//! (15% of the window) and the sum passes through [`soft_limit`].
//!
//! # Splice
//!
//! `A[..len - L] + mix(A tail, B head) + B[L..]`

use crate::audio::types::PcmBuffer;
use crate::config::TransitionShape;

/// How two overlapping lines are blended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Crossfade,
    Additive,
}

/// Outgoing and incoming gains at normalized position `t` (0.0..=1.0)
pub fn crossfade_gains(t: f32, shape: &TransitionShape) -> (f32, f32) {
    let t = t.clamp(0.0, 1.0);
    let mut out_gain = (1.0 - t).powf(shape.fade_out_exponent);
    let mut in_gain = t.powf(shape.fade_in_exponent);

    let sum = out_gain + in_gain;
    if sum > 1.0 {
        out_gain /= sum;
        in_gain /= sum;
    }

    (out_gain, in_gain)
}

/// Linear below the knee, tanh saturation above; output never exceeds 1.0
pub fn soft_limit(sample: f32, knee: f32) -> f32 {
    let magnitude = sample.abs();
    if magnitude <= knee {
        return sample;
    }
    let headroom = 1.0 - knee;
    let limited = knee + headroom * ((magnitude - knee) / headroom).tanh();
    limited.copysign(sample)
}

/// Edge-fade gains for an additive overlap at frame `i` of `len`
fn additive_gains(i: usize, len: usize, shape: &TransitionShape) -> (f32, f32) {
    let edge = ((len as f32 * shape.additive_edge_fraction).round() as usize).max(1);

    let in_gain = if i < edge {
        i as f32 / edge as f32
    } else {
        1.0
    };

    let remaining = len - i;
    let out_gain = if remaining <= edge {
        (remaining - 1) as f32 / edge as f32
    } else {
        1.0
    };

    (out_gain, in_gain)
}

/// Blend an outgoing tail with an incoming head of the same length.
///
/// # Arguments
/// * `outgoing` - Last `L` frames of the previous line
/// * `incoming` - First `L` frames of the next line
///
/// # Returns
/// `L` mixed frames (the shorter input decides `L`)
pub fn mix_window(
    outgoing: &PcmBuffer,
    incoming: &PcmBuffer,
    transition: Transition,
    shape: &TransitionShape,
) -> PcmBuffer {
    let len = outgoing.frames().min(incoming.frames());
    let mut left = Vec::with_capacity(len);
    let mut right = Vec::with_capacity(len);

    for i in 0..len {
        let (out_gain, in_gain) = match transition {
            Transition::Crossfade => crossfade_gains(i as f32 / len as f32, shape),
            Transition::Additive => additive_gains(i, len, shape),
        };

        let l = outgoing.left[i] * out_gain + incoming.left[i] * in_gain;
        let r = outgoing.right[i] * out_gain + incoming.right[i] * in_gain;

        match transition {
            Transition::Crossfade => {
                left.push(l);
                right.push(r);
            }
            Transition::Additive => {
                left.push(soft_limit(l, shape.limiter_knee));
                right.push(soft_limit(r, shape.limiter_knee));
            }
        }
    }

    PcmBuffer::new(left, right, outgoing.sample_rate)
}

/// Join two lines with an overlap of `overlap_frames`.
///
/// The overlap is clamped to the length of both inputs. Zero overlap
/// is a plain concatenation.
pub fn splice(
    mut a: PcmBuffer,
    b: &PcmBuffer,
    overlap_frames: usize,
    transition: Transition,
    shape: &TransitionShape,
) -> PcmBuffer {
    let overlap = overlap_frames.min(a.frames()).min(b.frames());
    if overlap == 0 {
        a.append(b);
        return a;
    }

    let tail = a.split_off(a.frames() - overlap);
    let head = b.slice(0, overlap);
    let mixed = mix_window(&tail, &head, transition, shape);

    a.append(&mixed);
    a.append_from(b, overlap);
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_midpoint_gains_follow_exponents() {
        let shape = TransitionShape::default();
        let (out_gain, in_gain) = crossfade_gains(0.5, &shape);
        // 0.5^1.5 and 0.5^0.8 sum to about 0.928, so no renormalisation applies
        assert!((out_gain - 0.353_553).abs() < 1e-4, "out {}", out_gain);
        assert!((in_gain - 0.574_349).abs() < 1e-4, "in {}", in_gain);
        assert!((out_gain + in_gain - 0.927_902).abs() < 1e-4);
    }

    #[test]
    fn test_gain_endpoints() {
        let shape = TransitionShape::default();
        let (out_gain, in_gain) = crossfade_gains(0.0, &shape);
        assert!((out_gain - 1.0).abs() < EPSILON);
        assert!(in_gain.abs() < EPSILON);

        let (out_gain, in_gain) = crossfade_gains(1.0, &shape);
        assert!(out_gain.abs() < EPSILON);
        assert!((in_gain - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_gain_sum_never_exceeds_one() {
        let shape = TransitionShape::default();
        for i in 0..=1000 {
            let (out_gain, in_gain) = crossfade_gains(i as f32 / 1000.0, &shape);
            assert!(out_gain + in_gain <= 1.0 + EPSILON);
        }
    }

    #[test]
    fn test_incoming_dominates_midway() {
        let shape = TransitionShape::default();
        let (out_gain, in_gain) = crossfade_gains(0.5, &shape);
        assert!(in_gain > out_gain);
    }

    #[test]
    fn test_soft_limit() {
        assert_eq!(soft_limit(0.5, 0.8), 0.5);
        assert_eq!(soft_limit(-0.8, 0.8), -0.8);
        let limited = soft_limit(2.0, 0.8);
        assert!(limited > 0.8 && limited < 1.0);
        assert!((soft_limit(-2.0, 0.8) + limited).abs() < EPSILON);
        // Monotonic above the knee
        assert!(soft_limit(1.2, 0.8) < soft_limit(1.5, 0.8));
    }

    #[test]
    fn test_additive_full_scale_never_clips() {
        let shape = TransitionShape::default();
        let a = PcmBuffer::from_mono(vec![1.0; 4410], 44100);
        let b = PcmBuffer::from_mono(vec![-1.0; 4410], 44100);
        let c = PcmBuffer::from_mono(vec![1.0; 4410], 44100);

        let same_sign = mix_window(&a, &c, Transition::Additive, &shape);
        assert!(same_sign.peak() < 1.0);
        // Both voices near full level in the middle of the window
        assert!(same_sign.left[2205] > 0.99);

        let opposite = mix_window(&a, &b, Transition::Additive, &shape);
        assert!(opposite.peak() <= 1.0);
    }

    #[test]
    fn test_additive_edges_are_click_free() {
        let shape = TransitionShape::default();
        let a = PcmBuffer::from_mono(vec![0.5; 100], 44100);
        let b = PcmBuffer::from_mono(vec![0.25; 100], 44100);
        let mixed = mix_window(&a, &b, Transition::Additive, &shape);

        // Starts at the outgoing level, ends at the incoming level
        assert!((mixed.left[0] - 0.5).abs() < EPSILON);
        assert!((mixed.left[99] - 0.25).abs() < EPSILON);
    }

    #[test]
    fn test_splice_length() {
        let shape = TransitionShape::default();
        let a = PcmBuffer::from_mono(vec![0.3; 1000], 44100);
        let b = PcmBuffer::from_mono(vec![0.3; 600], 44100);

        let joined = splice(a.clone(), &b, 200, Transition::Crossfade, &shape);
        assert_eq!(joined.frames(), 1400);

        // Clamped to the shorter input
        let joined = splice(a.clone(), &b, 5000, Transition::Crossfade, &shape);
        assert_eq!(joined.frames(), 1000);

        let joined = splice(a, &b, 0, Transition::Crossfade, &shape);
        assert_eq!(joined.frames(), 1600);
    }

    #[test]
    fn test_splice_keeps_untouched_regions() {
        let shape = TransitionShape::default();
        let a = PcmBuffer::from_mono(vec![0.1; 100], 44100);
        let b = PcmBuffer::from_mono(vec![0.9; 100], 44100);
        let joined = splice(a, &b, 20, Transition::Crossfade, &shape);

        assert!(joined.left[..80].iter().all(|&s| (s - 0.1).abs() < EPSILON));
        assert!(joined.left[100..].iter().all(|&s| (s - 0.9).abs() < EPSILON));
        // Crossfade of constant levels stays between them
        assert!(joined.left[80..100].iter().all(|&s| s <= 0.9 + EPSILON));
    }
}
