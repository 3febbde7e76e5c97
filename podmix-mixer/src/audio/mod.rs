//! Decoding, resampling and the PCM buffer type

pub mod decoder;
pub mod resampler;
pub mod types;

pub use decoder::{decode_audio, AudioFormat};
pub use types::PcmBuffer;
