//! In-memory WAV generation for pipeline tests
//!
//! Generates deterministic 16-bit WAV buffers with known characteristics:
//! - Silent audio (all zeros)
//! - Sine tones at a given frequency and amplitude
//! - Full-scale square waves for limiter tests

use hound::{SampleFormat, WavSpec, WavWriter};
use std::f32::consts::PI;
use std::io::Cursor;

/// Standard test sample rate (44.1 kHz)
pub const TEST_SAMPLE_RATE: u32 = 44100;

/// Frame count for a duration at `sample_rate`
pub fn frames_for(duration_ms: u64, sample_rate: u32) -> usize {
    (sample_rate as u64 * duration_ms / 1000) as usize
}

fn write_wav<F>(duration_ms: u64, channels: u16, sample_rate: u32, sample: F) -> Vec<u8>
where
    F: Fn(usize) -> f32,
{
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
        for frame in 0..frames_for(duration_ms, sample_rate) {
            let value = (sample(frame).clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            for _ in 0..channels {
                writer.write_sample(value).unwrap();
            }
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// Silent WAV of `duration_ms`
pub fn silent_wav(duration_ms: u64, channels: u16, sample_rate: u32) -> Vec<u8> {
    write_wav(duration_ms, channels, sample_rate, |_| 0.0)
}

/// Sine tone at the standard rate, written to every channel
///
/// # Arguments
/// * `duration_ms` - Duration in milliseconds
/// * `frequency_hz` - Tone frequency (e.g., 440.0 for A4)
/// * `amplitude` - Peak amplitude 0.0-1.0
pub fn sine_wav(duration_ms: u64, frequency_hz: f32, amplitude: f32, channels: u16) -> Vec<u8> {
    sine_wav_at(duration_ms, frequency_hz, amplitude, channels, TEST_SAMPLE_RATE)
}

/// Sine tone at an arbitrary sample rate
pub fn sine_wav_at(
    duration_ms: u64,
    frequency_hz: f32,
    amplitude: f32,
    channels: u16,
    sample_rate: u32,
) -> Vec<u8> {
    write_wav(duration_ms, channels, sample_rate, |frame| {
        let t = frame as f32 / sample_rate as f32;
        amplitude * (2.0 * PI * frequency_hz * t).sin()
    })
}

/// Sine tone framed by digital silence: `lead_ms` before, `tail_ms` after
pub fn padded_sine_wav(lead_ms: u64, tone_ms: u64, tail_ms: u64, frequency_hz: f32, amplitude: f32) -> Vec<u8> {
    let tone_start = frames_for(lead_ms, TEST_SAMPLE_RATE);
    let tone_end = tone_start + frames_for(tone_ms, TEST_SAMPLE_RATE);
    write_wav(lead_ms + tone_ms + tail_ms, 1, TEST_SAMPLE_RATE, |frame| {
        if frame < tone_start || frame >= tone_end {
            return 0.0;
        }
        let t = (frame - tone_start) as f32 / TEST_SAMPLE_RATE as f32;
        amplitude * (2.0 * PI * frequency_hz * t).sin()
    })
}

/// Full-scale square wave (every sample at ±1.0)
pub fn square_wav(duration_ms: u64, frequency_hz: f32) -> Vec<u8> {
    let half_period = (TEST_SAMPLE_RATE as f32 / frequency_hz / 2.0).max(1.0) as usize;
    write_wav(duration_ms, 1, TEST_SAMPLE_RATE, |frame| {
        if (frame / half_period) % 2 == 0 {
            1.0
        } else {
            -1.0
        }
    })
}

/// RMS of `samples[start..end]`, clamped to the slice
pub fn rms(samples: &[f32], start: usize, end: usize) -> f32 {
    let end = end.min(samples.len());
    let start = start.min(end);
    if start == end {
        return 0.0;
    }
    let sum: f32 = samples[start..end].iter().map(|s| s * s).sum();
    (sum / (end - start) as f32).sqrt()
}
