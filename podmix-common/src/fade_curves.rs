//! Fade curve implementations for intro/outro music phases
//!
//! Two curve shapes are available for the parametric intro/outro model.
//! Both have an exact cubic-bezier equivalent, so a parametric phase can be
//! converted into an envelope segment without approximation.

use serde::{Deserialize, Serialize};

/// Fade curve types for music phase transitions
///
/// - Linear: Constant rate of change (precise, predictable)
/// - Exponential: Quadratic shape; slow start for fade-in, fast start for fade-out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FadeCurve {
    /// Linear: v(t) = t
    #[default]
    Linear,

    /// Exponential: v(t) = t² (fade-in), v(t) = (1-t)² (fade-out)
    Exponential,
}

impl FadeCurve {
    /// Calculate fade-in multiplier at given position
    ///
    /// # Arguments
    /// * `position` - Normalized position through fade (0.0 to 1.0)
    ///
    /// # Returns
    /// Volume multiplier to apply to sample (0.0 = silence, 1.0 = full volume)
    pub fn calculate_fade_in(&self, position: f32) -> f32 {
        let t = position.clamp(0.0, 1.0);

        match self {
            FadeCurve::Linear => t,
            FadeCurve::Exponential => t * t,
        }
    }

    /// Calculate fade-out multiplier at given position
    ///
    /// # Arguments
    /// * `position` - Normalized position through fade (0.0 to 1.0)
    ///
    /// # Returns
    /// Volume multiplier to apply to sample (1.0 = full volume, 0.0 = silence)
    pub fn calculate_fade_out(&self, position: f32) -> f32 {
        let t = position.clamp(0.0, 1.0);

        match self {
            FadeCurve::Linear => 1.0 - t,
            FadeCurve::Exponential => {
                let inv = 1.0 - t;
                inv * inv
            }
        }
    }

    /// Interpolate from `from` to `to` following this curve's shape.
    ///
    /// Rising transitions use the fade-in shape, falling transitions the
    /// fade-out shape, so an exponential ramp always starts gently when
    /// rising and drops quickly when falling.
    pub fn ramp(&self, from: f32, to: f32, position: f32) -> f32 {
        if to >= from {
            from + (to - from) * self.calculate_fade_in(position)
        } else {
            to + (from - to) * self.calculate_fade_out(position)
        }
    }

    /// Canonical settings string
    pub fn as_str(&self) -> &'static str {
        match self {
            FadeCurve::Linear => "linear",
            FadeCurve::Exponential => "exponential",
        }
    }
}

impl std::fmt::Display for FadeCurve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
