//! podmix mixer library
//!
//! Assembles a two-speaker podcast episode from independently synthesized
//! per-line clips: decode, text-driven turn-taking overlaps, stereo
//! placement, crossfades, intro/outro music and MP3 encoding.

pub mod analysis;
pub mod assets;
pub mod audio;
pub mod config;
pub mod encode;
pub mod error;
pub mod mix;
pub mod pipeline;
pub mod script;

pub use analysis::{AudioSegment, Speaker};
pub use config::MixConfig;
pub use error::{Error, Phase, Result};
pub use pipeline::{AssembledEpisode, AssemblyPath, AssemblyReport, EpisodeAssembler};
pub use script::Script;
