//! In-memory assembly for regular-length episodes
//!
//! The whole dialogue track is built first, then intro and outro music are
//! composited over its edges and the result is encoded in one go.

use super::{AssemblyPath, AssemblyReport, EpisodeMusic};
use crate::analysis::{AnalyzedSegment, AudioSegment};
use crate::audio::types::PcmBuffer;
use crate::config::MixConfig;
use crate::encode::mp3::encode_pcm;
use crate::error::{Phase, PhaseContext, Result};
use crate::mix::intro_outro::{apply_intro, apply_outro};
use crate::pipeline::stitch::DialogueStitcher;
use tracing::debug;

pub(crate) fn assemble(
    segments: Vec<AudioSegment>,
    music: EpisodeMusic<'_>,
    config: &MixConfig,
) -> Result<(Vec<u8>, AssemblyReport)> {
    let count = segments.len();
    let mut stitcher = DialogueStitcher::new(config);
    let mut track = PcmBuffer::empty(config.sample_rate);

    for (index, segment) in segments.into_iter().enumerate() {
        let analyzed = AnalyzedSegment::analyze(segment, index, config)?;
        track.append(&stitcher.push(analyzed));
    }
    let (rest, summary) = stitcher.finish();
    track.append(&rest);

    debug!(
        "Dialogue track: {} frames from {} raw",
        track.frames(),
        summary.raw_frames
    );

    if let Some((strategy, bed)) = &music.intro {
        track = apply_intro(bed, &track, strategy);
    }

    let mut outro_start = None;
    if let Some((strategy, bed)) = &music.outro {
        let window = strategy.dialogue_window_frames(config.sample_rate);
        outro_start = Some(track.frames().saturating_sub(window));
        track = apply_outro(bed, &track, strategy);
    }

    let total = track.frames();
    let mp3 = encode_pcm(&track, config.bitrate_kbps).in_phase(Phase::Encode, "episode")?;

    let report = AssemblyReport::new(
        AssemblyPath::InMemory,
        count,
        summary,
        total,
        outro_start,
        config,
    );
    Ok((mp3, report))
}
