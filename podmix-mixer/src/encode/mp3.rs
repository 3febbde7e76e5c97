//! Constant-bitrate MP3 encoding with output validation
//!
//! PCM is pushed incrementally, converted to clamped 16-bit samples and fed
//! to LAME in whole 1152-frame MPEG frames; any remainder waits for the next
//! push or for [`Mp3Encoder::finish`].
//!
//! `finish` flushes the encoder and validates the result:
//! - output is non-empty
//! - output starts with an MPEG frame sync word or an ID3 tag
//! - output is at least 2x smaller than raw 16-bit stereo PCM (checked only
//!   once enough audio was encoded for frame overhead to be negligible)
//!
//! Encoding valid PCM is deterministic, so any violation is reported as an
//! error rather than passed through.

use crate::audio::types::PcmBuffer;
use crate::error::{Error, Result};
use mp3lame_encoder::{Bitrate, Builder, DualPcm, Encoder, FlushNoGap, Quality};
use tracing::debug;

/// Samples per channel in one MPEG-1 Layer III frame
pub const MP3_FRAME_SAMPLES: usize = 1152;

/// Minimum ratio of raw PCM bytes to encoded bytes
pub const MIN_COMPRESSION_RATIO: f64 = 2.0;

/// Shorter inputs skip the compression check
pub const COMPRESSION_CHECK_MIN_FRAMES: usize = 8 * MP3_FRAME_SAMPLES;

/// Streaming stereo MP3 encoder
pub struct Mp3Encoder {
    encoder: Encoder,
    output: Vec<u8>,
    pending_left: Vec<i16>,
    pending_right: Vec<i16>,
    frames_in: usize,
    bitrate_kbps: u32,
}

impl Mp3Encoder {
    /// Create an encoder for stereo input at `sample_rate`.
    ///
    /// # Arguments
    /// * `sample_rate` - Input and output rate in Hz
    /// * `bitrate_kbps` - Constant bitrate (64, 96, 112, 128, 160, 192, 224, 256 or 320)
    pub fn new(sample_rate: u32, bitrate_kbps: u32) -> Result<Self> {
        let mut builder = Builder::new()
            .ok_or_else(|| Error::Encode("Failed to allocate LAME encoder".to_string()))?;

        builder
            .set_num_channels(2)
            .map_err(|e| Error::Encode(format!("Failed to set channel count: {:?}", e)))?;
        builder
            .set_sample_rate(sample_rate)
            .map_err(|e| Error::Encode(format!("Failed to set sample rate {}: {:?}", sample_rate, e)))?;
        builder
            .set_brate(bitrate(bitrate_kbps)?)
            .map_err(|e| Error::Encode(format!("Failed to set bitrate: {:?}", e)))?;
        builder
            .set_quality(Quality::Good)
            .map_err(|e| Error::Encode(format!("Failed to set quality: {:?}", e)))?;

        let encoder = builder
            .build()
            .map_err(|e| Error::Encode(format!("Failed to initialize LAME: {:?}", e)))?;

        debug!(
            "MP3 encoder ready: {}Hz stereo, {}kbps CBR",
            sample_rate, bitrate_kbps
        );

        Ok(Self {
            encoder,
            output: Vec::new(),
            pending_left: Vec::with_capacity(MP3_FRAME_SAMPLES),
            pending_right: Vec::with_capacity(MP3_FRAME_SAMPLES),
            frames_in: 0,
            bitrate_kbps,
        })
    }

    /// Queue PCM for encoding; whole MPEG frames are encoded immediately.
    pub fn push(&mut self, pcm: &PcmBuffer) -> Result<()> {
        self.frames_in += pcm.frames();
        self.pending_left.extend(pcm.left.iter().map(|&s| to_i16(s)));
        self.pending_right.extend(pcm.right.iter().map(|&s| to_i16(s)));

        let whole = self.pending_left.len() / MP3_FRAME_SAMPLES * MP3_FRAME_SAMPLES;
        if whole == 0 {
            return Ok(());
        }

        let left: Vec<i16> = self.pending_left.drain(..whole).collect();
        let right: Vec<i16> = self.pending_right.drain(..whole).collect();
        for (l, r) in left
            .chunks(MP3_FRAME_SAMPLES)
            .zip(right.chunks(MP3_FRAME_SAMPLES))
        {
            self.encode_frame(l, r)?;
        }

        Ok(())
    }

    /// Frames pushed so far
    pub fn frames_in(&self) -> usize {
        self.frames_in
    }

    /// Encode the remainder, flush and validate.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if self.frames_in == 0 {
            return Err(Error::Encode("No audio to encode".to_string()));
        }

        if !self.pending_left.is_empty() {
            let left = std::mem::take(&mut self.pending_left);
            let right = std::mem::take(&mut self.pending_right);
            self.encode_frame(&left, &right)?;
        }

        self.output
            .reserve(mp3lame_encoder::max_required_buffer_size(MP3_FRAME_SAMPLES));
        self.encoder
            .flush_to_vec::<FlushNoGap>(&mut self.output)
            .map_err(|e| Error::Encode(format!("LAME flush failed: {:?}", e)))?;

        validate_mp3(&self.output, self.frames_in)?;

        debug!(
            "Encoded {} frames to {} bytes at {}kbps",
            self.frames_in,
            self.output.len(),
            self.bitrate_kbps
        );

        Ok(self.output)
    }

    fn encode_frame(&mut self, left: &[i16], right: &[i16]) -> Result<()> {
        self.output
            .reserve(mp3lame_encoder::max_required_buffer_size(left.len()));
        self.encoder
            .encode_to_vec(DualPcm { left, right }, &mut self.output)
            .map_err(|e| Error::Encode(format!("LAME encode failed: {:?}", e)))?;
        Ok(())
    }
}

/// Encode a whole buffer in one call
pub fn encode_pcm(pcm: &PcmBuffer, bitrate_kbps: u32) -> Result<Vec<u8>> {
    let mut encoder = Mp3Encoder::new(pcm.sample_rate, bitrate_kbps)?;
    encoder.push(pcm)?;
    encoder.finish()
}

/// Check encoder output against the invariants in the module docs.
///
/// # Arguments
/// * `bytes` - Encoded MP3
/// * `frames` - Stereo frames that went in
pub fn validate_mp3(bytes: &[u8], frames: usize) -> Result<()> {
    if bytes.is_empty() {
        return Err(Error::Encode(format!(
            "Encoder produced no output for {} frames",
            frames
        )));
    }

    if !starts_with_sync_or_id3(bytes) {
        return Err(Error::Encode(format!(
            "Output does not start with an MP3 sync word or ID3 tag (first bytes {:02X?})",
            &bytes[..bytes.len().min(4)]
        )));
    }

    if frames >= COMPRESSION_CHECK_MIN_FRAMES {
        let raw_bytes = frames * 4;
        let ratio = raw_bytes as f64 / bytes.len() as f64;
        if ratio < MIN_COMPRESSION_RATIO {
            return Err(Error::Encode(format!(
                "Compression ratio {:.2} below {:.1} ({} raw bytes -> {} encoded)",
                ratio,
                MIN_COMPRESSION_RATIO,
                raw_bytes,
                bytes.len()
            )));
        }
    }

    Ok(())
}

fn starts_with_sync_or_id3(bytes: &[u8]) -> bool {
    bytes.starts_with(b"ID3") || (bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] & 0xE0 == 0xE0)
}

/// Clamp and scale one sample to 16-bit
fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

fn bitrate(kbps: u32) -> Result<Bitrate> {
    Ok(match kbps {
        64 => Bitrate::Kbps64,
        96 => Bitrate::Kbps96,
        112 => Bitrate::Kbps112,
        128 => Bitrate::Kbps128,
        160 => Bitrate::Kbps160,
        192 => Bitrate::Kbps192,
        224 => Bitrate::Kbps224,
        256 => Bitrate::Kbps256,
        320 => Bitrate::Kbps320,
        other => {
            return Err(Error::Config(format!(
                "Unsupported MP3 bitrate: {}kbps",
                other
            )))
        }
    })
}
