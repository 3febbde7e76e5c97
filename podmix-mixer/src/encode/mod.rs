//! Output encoding

pub mod mp3;

pub use mp3::{encode_pcm, Mp3Encoder, MP3_FRAME_SAMPLES};
