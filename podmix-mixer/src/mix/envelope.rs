//! Breakpoint gain envelopes with linear and cubic-bezier segments
//!
//! An envelope maps time (seconds) to gain (0.0 to 1.0). Between each pair
//! of adjacent breakpoints the curve is either a straight line or a cubic
//! bezier in (time, volume) space with two absolute control points.
//!
//! **Evaluation:**
//! - Before the first breakpoint: the first volume
//! - After the last breakpoint: the last volume
//! - Linear segment: volume interpolated by time fraction
//! - Bezier segment: Newton-Raphson finds the curve parameter `u` whose time
//!   coordinate equals `t` (at most 8 iterations, seeded by the linear
//!   estimate), then the volume cubic is evaluated at `u`

use crate::error::{Error, Result};
use podmix_common::settings::{EnvelopePairSettings, EnvelopeSettings, SegmentSettings};
use podmix_common::FadeCurve;

/// Newton-Raphson iteration limit for bezier time inversion
pub const MAX_NEWTON_ITERATIONS: usize = 8;

/// Convergence tolerance on the time coordinate (seconds)
pub const TIME_TOLERANCE: f64 = 1e-4;

const DERIVATIVE_EPSILON: f64 = 1e-9;

/// Volumes at or below this count as silent for onset/release anchors
const SILENT_VOLUME: f64 = 1e-6;

/// One (time, volume) breakpoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    /// Seconds from the start of the envelope window
    pub time: f64,
    /// Gain, 0.0 to 1.0
    pub volume: f64,
}

impl Breakpoint {
    pub fn new(time: f64, volume: f64) -> Self {
        Self { time, volume }
    }
}

/// Curve shape between two adjacent breakpoints
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurveSegment {
    Linear,
    /// Absolute control points as (time seconds, volume)
    Bezier { cp1: (f64, f64), cp2: (f64, f64) },
}

impl CurveSegment {
    /// Exact curve for a parametric fade between two breakpoints.
    ///
    /// Linear fades stay linear. Exponential fades are quadratic in time,
    /// which a cubic bezier with evenly spaced time controls reproduces
    /// exactly:
    /// - rising `from + (to - from) * u^2`: volumes `[from, from, from + (to - from)/3, to]`
    /// - falling `to + (from - to) * (1 - u)^2`: volumes `[from, to + (from - to)/3, to, to]`
    pub fn from_fade(curve: FadeCurve, start: Breakpoint, end: Breakpoint) -> Self {
        match curve {
            FadeCurve::Linear => CurveSegment::Linear,
            FadeCurve::Exponential => {
                let span = end.time - start.time;
                let t1 = start.time + span / 3.0;
                let t2 = start.time + 2.0 * span / 3.0;
                let (from, to) = (start.volume, end.volume);

                let (v1, v2) = if to >= from {
                    (from, from + (to - from) / 3.0)
                } else {
                    (to + (from - to) / 3.0, to)
                };

                CurveSegment::Bezier {
                    cp1: (t1, v1),
                    cp2: (t2, v2),
                }
            }
        }
    }
}

/// Time-to-gain curve
#[derive(Debug, Clone, PartialEq)]
pub struct AudioEnvelope {
    points: Vec<Breakpoint>,
    /// Always `points.len() - 1` entries
    segments: Vec<CurveSegment>,
}

impl AudioEnvelope {
    /// Build and validate an envelope.
    ///
    /// An empty `segments` list means every segment is linear. Otherwise it
    /// must hold exactly one entry per adjacent breakpoint pair. Bezier
    /// control times are clamped into their segment.
    pub fn new(points: Vec<Breakpoint>, segments: Vec<CurveSegment>) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::Envelope("at least one breakpoint required".to_string()));
        }

        for (i, point) in points.iter().enumerate() {
            if !point.time.is_finite() || !point.volume.is_finite() {
                return Err(Error::Envelope(format!("breakpoint {} is not finite", i)));
            }
            if !(0.0..=1.0).contains(&point.volume) {
                return Err(Error::Envelope(format!(
                    "breakpoint {} volume {} out of range [0, 1]",
                    i, point.volume
                )));
            }
        }

        if let Some(i) = points.windows(2).position(|w| w[1].time < w[0].time) {
            return Err(Error::Envelope(format!(
                "breakpoint {} at {}s is earlier than breakpoint {} at {}s",
                i + 1,
                points[i + 1].time,
                i,
                points[i].time
            )));
        }

        let expected = points.len() - 1;
        let segments = if segments.is_empty() {
            vec![CurveSegment::Linear; expected]
        } else if segments.len() != expected {
            return Err(Error::Envelope(format!(
                "{} breakpoints need {} segments, got {}",
                points.len(),
                expected,
                segments.len()
            )));
        } else {
            segments
                .into_iter()
                .enumerate()
                .map(|(i, segment)| clamp_controls(segment, points[i], points[i + 1], i))
                .collect::<Result<Vec<_>>>()?
        };

        Ok(Self { points, segments })
    }

    /// Envelope with linear segments only
    pub fn linear(points: Vec<Breakpoint>) -> Result<Self> {
        Self::new(points, Vec::new())
    }

    /// Constant gain
    pub fn constant(volume: f64) -> Result<Self> {
        Self::linear(vec![Breakpoint::new(0.0, volume)])
    }

    pub fn from_settings(settings: &EnvelopeSettings) -> Result<Self> {
        let points = settings
            .points
            .iter()
            .map(|p| Breakpoint::new(p.time, p.volume))
            .collect();
        let segments = settings
            .segments
            .iter()
            .map(|s| match s {
                SegmentSettings::Linear => CurveSegment::Linear,
                SegmentSettings::Bezier { cp1, cp2 } => CurveSegment::Bezier {
                    cp1: (cp1[0], cp1[1]),
                    cp2: (cp2[0], cp2[1]),
                },
            })
            .collect();
        Self::new(points, segments)
    }

    pub fn points(&self) -> &[Breakpoint] {
        &self.points
    }

    pub fn segments(&self) -> &[CurveSegment] {
        &self.segments
    }

    /// Time of the last breakpoint
    pub fn end_time(&self) -> f64 {
        self.points[self.points.len() - 1].time
    }

    /// Gain at time `t` (seconds)
    pub fn sample(&self, t: f64) -> f64 {
        let first = self.points[0];
        let last = self.points[self.points.len() - 1];
        if t <= first.time {
            return first.volume;
        }
        if t >= last.time {
            return last.volume;
        }

        // Last breakpoint at or before t; zero-length segments are skipped
        let index = self.points.partition_point(|p| p.time <= t) - 1;
        let a = self.points[index];
        let b = self.points[index + 1];

        let volume = match self.segments[index] {
            CurveSegment::Linear => {
                let fraction = (t - a.time) / (b.time - a.time);
                a.volume + (b.volume - a.volume) * fraction
            }
            CurveSegment::Bezier { cp1, cp2 } => {
                let u = solve_bezier_time(a.time, cp1.0, cp2.0, b.time, t);
                eval_cubic(a.volume, cp1.1, cp2.1, b.volume, u)
            }
        };

        volume.clamp(0.0, 1.0)
    }

    /// Where a voice faded in by this envelope begins: the last breakpoint
    /// of the leading silent run, or the start of the envelope window.
    pub fn onset_time(&self) -> f64 {
        let leading = self
            .points
            .iter()
            .take_while(|p| p.volume <= SILENT_VOLUME)
            .count();
        match leading {
            0 => 0.0,
            n => self.points[n - 1].time,
        }
    }

    /// Where a voice faded out by this envelope ends: the first breakpoint
    /// of the trailing silent run, or the last breakpoint.
    pub fn release_time(&self) -> f64 {
        let trailing = self
            .points
            .iter()
            .rev()
            .take_while(|p| p.volume <= SILENT_VOLUME)
            .count();
        match trailing {
            0 => self.end_time(),
            n => self.points[self.points.len() - n].time,
        }
    }

    /// Structural comparison with a tolerance on every coordinate
    pub fn approx_eq(&self, other: &AudioEnvelope, tolerance: f64) -> bool {
        let close = |a: f64, b: f64| (a - b).abs() <= tolerance;

        self.points.len() == other.points.len()
            && self
                .points
                .iter()
                .zip(&other.points)
                .all(|(a, b)| close(a.time, b.time) && close(a.volume, b.volume))
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (CurveSegment::Linear, CurveSegment::Linear) => true,
                    (
                        CurveSegment::Bezier { cp1: a1, cp2: a2 },
                        CurveSegment::Bezier { cp1: b1, cp2: b2 },
                    ) => {
                        close(a1.0, b1.0) && close(a1.1, b1.1) && close(a2.0, b2.0) && close(a2.1, b2.1)
                    }
                    _ => false,
                })
    }
}

/// Independent music and dialogue gain curves for one intro or outro
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopePair {
    pub music: AudioEnvelope,
    pub dialogue: AudioEnvelope,
}

impl EnvelopePair {
    pub fn from_settings(settings: &EnvelopePairSettings) -> Result<Self> {
        Ok(Self {
            music: AudioEnvelope::from_settings(&settings.music)?,
            dialogue: AudioEnvelope::from_settings(&settings.dialogue)?,
        })
    }

    /// Later of the two final breakpoints
    pub fn end_time(&self) -> f64 {
        self.music.end_time().max(self.dialogue.end_time())
    }

    pub fn approx_eq(&self, other: &EnvelopePair, tolerance: f64) -> bool {
        self.music.approx_eq(&other.music, tolerance)
            && self.dialogue.approx_eq(&other.dialogue, tolerance)
    }
}

fn clamp_controls(
    segment: CurveSegment,
    start: Breakpoint,
    end: Breakpoint,
    index: usize,
) -> Result<CurveSegment> {
    match segment {
        CurveSegment::Linear => Ok(CurveSegment::Linear),
        CurveSegment::Bezier { cp1, cp2 } => {
            for (t, v) in [cp1, cp2] {
                if !t.is_finite() || !(0.0..=1.0).contains(&v) {
                    return Err(Error::Envelope(format!(
                        "segment {} control point ({}, {}) invalid",
                        index, t, v
                    )));
                }
            }
            Ok(CurveSegment::Bezier {
                cp1: (cp1.0.clamp(start.time, end.time), cp1.1),
                cp2: (cp2.0.clamp(start.time, end.time), cp2.1),
            })
        }
    }
}

/// Evaluate a cubic Bezier: B(u) = (1-u)^3*p0 + 3*(1-u)^2*u*p1 + 3*(1-u)*u^2*p2 + u^3*p3
fn eval_cubic(p0: f64, p1: f64, p2: f64, p3: f64, u: f64) -> f64 {
    let inv = 1.0 - u;
    inv * inv * inv * p0 + 3.0 * inv * inv * u * p1 + 3.0 * inv * u * u * p2 + u * u * u * p3
}

/// B'(u) = 3*(1-u)^2*(p1-p0) + 6*(1-u)*u*(p2-p1) + 3*u^2*(p3-p2)
fn eval_cubic_derivative(p0: f64, p1: f64, p2: f64, p3: f64, u: f64) -> f64 {
    let inv = 1.0 - u;
    3.0 * inv * inv * (p1 - p0) + 6.0 * inv * u * (p2 - p1) + 3.0 * u * u * (p3 - p2)
}

/// Find `u` in 0..=1 whose time coordinate is `target`
fn solve_bezier_time(t0: f64, t1: f64, t2: f64, t3: f64, target: f64) -> f64 {
    let span = t3 - t0;
    if span <= 0.0 {
        return 0.0;
    }

    let mut u = ((target - t0) / span).clamp(0.0, 1.0);
    for _ in 0..MAX_NEWTON_ITERATIONS {
        let delta = eval_cubic(t0, t1, t2, t3, u) - target;
        if delta.abs() < TIME_TOLERANCE {
            break;
        }
        let derivative = eval_cubic_derivative(t0, t1, t2, t3, u);
        if derivative.abs() < DERIVATIVE_EPSILON {
            break;
        }
        u = (u - delta / derivative).clamp(0.0, 1.0);
    }
    u
}
