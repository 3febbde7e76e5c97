//! Format-agnostic decoding of encoded speech and music buffers
//!
//! Format is detected from magic bytes: a `RIFF` header selects the WAV
//! path (hound), anything else is treated as MP3 (symphonia).
//!
//! Every decoded buffer leaves here as two channels at the working rate:
//! mono sources are duplicated, sources with more than two channels keep
//! their first two, and other rates are resampled.

use crate::audio::resampler::Resampler;
use crate::audio::types::PcmBuffer;
use crate::config::MixConfig;
use crate::error::{Error, Result};
use hound::{SampleFormat, WavReader};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Container format detected from the leading bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Mp3,
}

impl AudioFormat {
    /// `RIFF....WAVE` is WAV; everything else is handed to the MP3 path.
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.len() >= 4 && &bytes[0..4] == b"RIFF" {
            AudioFormat::Wav
        } else {
            AudioFormat::Mp3
        }
    }
}

/// Decode an encoded buffer to stereo PCM at the configured working rate.
pub fn decode_audio(bytes: &[u8], config: &MixConfig) -> Result<PcmBuffer> {
    if bytes.is_empty() {
        return Err(Error::Decode("Empty audio buffer".to_string()));
    }

    let format = AudioFormat::detect(bytes);
    let native = match format {
        AudioFormat::Wav => SimpleDecoder::decode_wav(bytes)?,
        AudioFormat::Mp3 => SimpleDecoder::decode_mp3(bytes)?,
    };

    debug!(
        "Decoded {:?}: {} frames at {}Hz",
        format,
        native.frames(),
        native.sample_rate
    );

    Resampler::resample(native, config.sample_rate, config.resample)
}

/// Audio decoder for in-memory buffers.
pub struct SimpleDecoder;

impl SimpleDecoder {
    /// Decode a RIFF/WAVE buffer at its native rate.
    ///
    /// Supported sample formats: 16-bit and 24-bit integer PCM, 32-bit float.
    /// Anything else is a fatal decode error.
    pub fn decode_wav(bytes: &[u8]) -> Result<PcmBuffer> {
        let mut reader = WavReader::new(Cursor::new(bytes))
            .map_err(|e| Error::Decode(format!("Malformed WAV container: {}", e)))?;

        let spec = reader.spec();
        let channels = spec.channels as usize;
        debug!(
            "WAV format: sample_rate={}, channels={}, bits={}, format={:?}",
            spec.sample_rate, channels, spec.bits_per_sample, spec.sample_format
        );

        if channels == 0 {
            return Err(Error::Decode("WAV declares zero channels".to_string()));
        }

        let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Int, 16) => reader
                .samples::<i16>()
                .map(|s| s.map(|v| v as f32 / 32768.0))
                .collect::<std::result::Result<_, _>>(),
            (SampleFormat::Int, 24) => reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / 8_388_608.0))
                .collect::<std::result::Result<_, _>>(),
            (SampleFormat::Float, 32) => reader
                .samples::<f32>()
                .collect::<std::result::Result<_, _>>(),
            (format, bits) => {
                return Err(Error::Decode(format!(
                    "Unsupported WAV sample format: {}-bit {:?}",
                    bits, format
                )))
            }
        }
        .map_err(|e| Error::Decode(format!("Failed to read WAV samples: {}", e)))?;

        Ok(Self::to_stereo(&interleaved, channels, spec.sample_rate))
    }

    /// Decode an MP3 buffer at its native rate.
    pub fn decode_mp3(bytes: &[u8]) -> Result<PcmBuffer> {
        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

        let mut hint = Hint::new();
        hint.with_extension("mp3");

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| Error::Decode(format!("Failed to probe format: {}", e)))?;

        let mut format = probed.format;

        // Get the default audio track
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::Decode("No audio track found".to_string()))?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let sample_rate = codec_params
            .sample_rate
            .ok_or_else(|| Error::Decode("Sample rate not found".to_string()))?;

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| Error::Decode(format!("Failed to create decoder: {}", e)))?;

        let mut planar: Vec<Vec<f32>> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    debug!("Reached end of stream");
                    break;
                }
                Err(e) => {
                    return Err(Error::Decode(format!("Error reading packet: {}", e)));
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    let channels = spec.channels.count();
                    let frames = decoded.frames();
                    if channels == 0 || frames == 0 {
                        continue;
                    }
                    if planar.len() < channels {
                        planar.resize_with(channels, Vec::new);
                    }

                    let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                    sample_buf.copy_planar_ref(decoded);
                    let samples = sample_buf.samples();
                    for (ch, channel) in planar.iter_mut().enumerate().take(channels) {
                        channel.extend_from_slice(&samples[ch * frames..(ch + 1) * frames]);
                    }
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    // A single corrupt frame is skipped; an undecodable stream is caught below
                    warn!("Skipping undecodable MP3 frame: {}", e);
                    continue;
                }
                Err(e) => return Err(Error::Decode(format!("MP3 decode failed: {}", e))),
            }
        }

        let mut channels = planar.into_iter();
        let left = channels.next().unwrap_or_default();
        if left.is_empty() {
            return Err(Error::Decode("MP3 stream contained no audio frames".to_string()));
        }

        let buffer = match channels.next() {
            Some(right) => PcmBuffer::new(left, right, sample_rate),
            None => PcmBuffer::from_mono(left, sample_rate),
        };

        debug!(
            "Decoded MP3: {} frames at {}Hz",
            buffer.frames(),
            sample_rate
        );
        Ok(buffer)
    }

    /// Convert interleaved samples to a stereo pair.
    ///
    /// Mono is duplicated; extra channels beyond the first two are dropped.
    fn to_stereo(interleaved: &[f32], channels: usize, sample_rate: u32) -> PcmBuffer {
        if channels == 1 {
            return PcmBuffer::from_mono(interleaved.to_vec(), sample_rate);
        }

        let frames = interleaved.len() / channels;
        let mut left = Vec::with_capacity(frames);
        let mut right = Vec::with_capacity(frames);
        for frame in interleaved.chunks_exact(channels) {
            left.push(frame[0]);
            right.push(frame[1]);
        }
        PcmBuffer::new(left, right, sample_rate)
    }
}
