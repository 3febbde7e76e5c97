//! Sample rate conversion to the episode's working rate
//!
//! Two strategies:
//! - **Linear** (default): each output sample interpolates between its two
//!   nearest source samples. Output length is `floor(input_len / ratio)`
//!   where `ratio = input_rate / output_rate`.
//! - **Sinc**: rubato's polynomial `FastFixedIn` resampler, for sources
//!   where aliasing from linear interpolation is audible.

use crate::audio::types::PcmBuffer;
use crate::error::{Error, Result};
use podmix_common::settings::ResampleQuality;
use rubato::{FastFixedIn, PolynomialDegree, Resampler as RubatoResampler};
use tracing::debug;

/// Audio resampler for planar stereo buffers.
pub struct Resampler;

impl Resampler {
    /// Resample a buffer to `output_rate`.
    ///
    /// Returns the input unchanged when it is already at the target rate.
    pub fn resample(
        input: PcmBuffer,
        output_rate: u32,
        quality: ResampleQuality,
    ) -> Result<PcmBuffer> {
        if input.sample_rate == output_rate {
            debug!("Sample rate already at {}Hz, skipping resample", output_rate);
            return Ok(input);
        }

        debug!(
            "Resampling {} frames from {}Hz to {}Hz ({:?})",
            input.frames(),
            input.sample_rate,
            output_rate,
            quality
        );

        if input.is_empty() {
            return Ok(PcmBuffer::empty(output_rate));
        }

        match quality {
            ResampleQuality::Linear => {
                let ratio = input.sample_rate as f64 / output_rate as f64;
                let left = Self::linear(&input.left, ratio);
                let right = Self::linear(&input.right, ratio);
                Ok(PcmBuffer::new(left, right, output_rate))
            }
            ResampleQuality::Sinc => Self::polynomial(input, output_rate),
        }
    }

    /// Linear interpolation of one channel.
    ///
    /// `ratio` is input rate / output rate.
    pub fn linear(input: &[f32], ratio: f64) -> Vec<f32> {
        if input.is_empty() || ratio <= 0.0 {
            return Vec::new();
        }

        let output_len = (input.len() as f64 / ratio).floor() as usize;
        let last = input.len() - 1;
        let mut output = Vec::with_capacity(output_len);

        for i in 0..output_len {
            let position = i as f64 * ratio;
            let index = (position.floor() as usize).min(last);
            let frac = (position - index as f64) as f32;
            let a = input[index];
            let b = input[(index + 1).min(last)];
            output.push(a + (b - a) * frac);
        }

        output
    }

    /// Resample with rubato's polynomial interpolator in one pass.
    fn polynomial(input: PcmBuffer, output_rate: u32) -> Result<PcmBuffer> {
        let input_frames = input.frames();
        let mut resampler = FastFixedIn::<f32>::new(
            output_rate as f64 / input.sample_rate as f64,
            1.0, // max_relative_ratio (no runtime changes)
            PolynomialDegree::Septic,
            input_frames,
            2,
        )
        .map_err(|e| Error::Decode(format!("Failed to create resampler: {}", e)))?;

        let planar_input = vec![input.left, input.right];
        let mut planar_output = resampler
            .process(&planar_input, None)
            .map_err(|e| Error::Decode(format!("Resampling failed: {}", e)))?;

        let right = planar_output.pop().unwrap_or_default();
        let left = planar_output.pop().unwrap_or_default();

        debug!(
            "Resampled {} input frames to {} output frames",
            input_frames,
            left.len()
        );

        Ok(PcmBuffer::new(left, right, output_rate))
    }
}
