//! Test helper modules for podmix-mixer integration tests
//!
//! - `audio_generator`: deterministic in-memory WAV clips
//! - `asset_server`: local HTTP host for intro/outro music

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod asset_server;
pub mod audio_generator;

pub use asset_server::AssetServer;
pub use audio_generator::{
    frames_for, padded_sine_wav, rms, silent_wav, sine_wav, sine_wav_at, square_wav, TEST_SAMPLE_RATE,
};
