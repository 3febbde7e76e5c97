//! Edge silence measurement and trimming
//!
//! Silence is measured from each end of a buffer: frames are counted while
//! the louder of the two channels stays strictly below the threshold.

use crate::audio::types::PcmBuffer;

/// Count of silent frames at the start of the buffer
pub fn leading_silent_frames(pcm: &PcmBuffer, threshold: f32) -> usize {
    (0..pcm.frames())
        .take_while(|&i| pcm.frame_peak(i) < threshold)
        .count()
}

/// Count of silent frames at the end of the buffer
pub fn trailing_silent_frames(pcm: &PcmBuffer, threshold: f32) -> usize {
    (0..pcm.frames())
        .rev()
        .take_while(|&i| pcm.frame_peak(i) < threshold)
        .count()
}

/// Leading silence in milliseconds
pub fn leading_silence_ms(pcm: &PcmBuffer, threshold: f32) -> f64 {
    frames_ms(leading_silent_frames(pcm, threshold), pcm.sample_rate)
}

/// Trailing silence in milliseconds
pub fn trailing_silence_ms(pcm: &PcmBuffer, threshold: f32) -> f64 {
    frames_ms(trailing_silent_frames(pcm, threshold), pcm.sample_rate)
}

/// Trim edge silence so that at most `keep_ms` remains at either end.
///
/// A buffer that is silent throughout is left untouched; dropping a whole
/// line would change the script.
///
/// # Returns
/// Frames removed from the (start, end)
pub fn trim_edges(pcm: &mut PcmBuffer, threshold: f32, keep_ms: u32) -> (usize, usize) {
    let leading = leading_silent_frames(pcm, threshold);
    if leading == pcm.frames() {
        return (0, 0);
    }
    let trailing = trailing_silent_frames(pcm, threshold);

    let keep = (keep_ms as u64 * pcm.sample_rate as u64 / 1000) as usize;
    let cut_start = leading.saturating_sub(keep);
    let cut_end = trailing.saturating_sub(keep);

    if cut_start > 0 || cut_end > 0 {
        let end = pcm.frames() - cut_end;
        pcm.retain_range(cut_start, end);
    }

    (cut_start, cut_end)
}

fn frames_ms(frames: usize, sample_rate: u32) -> f64 {
    frames as f64 * 1000.0 / sample_rate as f64
}
