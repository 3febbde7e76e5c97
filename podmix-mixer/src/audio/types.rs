//! Core audio data types
//!
//! **Format:**
//! - Samples are f32 (floating point -1.0 to 1.0)
//! - Always two planar channels (left, right) of equal length
//! - Sample rate is the episode's working rate once decoded

/// Decoded stereo PCM owned by exactly one pipeline stage at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    /// Left channel samples
    pub left: Vec<f32>,

    /// Right channel samples
    pub right: Vec<f32>,

    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl PcmBuffer {
    /// Create a buffer from two channels.
    ///
    /// If the channels differ in length, the longer one is truncated so the
    /// stereo pair always has equal length.
    pub fn new(mut left: Vec<f32>, mut right: Vec<f32>, sample_rate: u32) -> Self {
        let frames = left.len().min(right.len());
        left.truncate(frames);
        right.truncate(frames);
        Self {
            left,
            right,
            sample_rate,
        }
    }

    /// Duplicate a mono channel into an identical stereo pair
    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        let right = samples.clone();
        Self {
            left: samples,
            right,
            sample_rate,
        }
    }

    /// Create a silent buffer of `frames` stereo frames
    pub fn silence(frames: usize, sample_rate: u32) -> Self {
        Self {
            left: vec![0.0; frames],
            right: vec![0.0; frames],
            sample_rate,
        }
    }

    /// Empty buffer at the given rate
    pub fn empty(sample_rate: u32) -> Self {
        Self::silence(0, sample_rate)
    }

    /// Number of stereo frames
    pub fn frames(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Duration in milliseconds
    pub fn duration_ms(&self) -> f64 {
        self.frames() as f64 * 1000.0 / self.sample_rate as f64
    }

    /// Largest absolute sample over both channels at a frame
    pub fn frame_peak(&self, index: usize) -> f32 {
        self.left[index].abs().max(self.right[index].abs())
    }

    /// Largest absolute sample in the buffer
    pub fn peak(&self) -> f32 {
        self.left
            .iter()
            .chain(self.right.iter())
            .fold(0.0f32, |acc, s| acc.max(s.abs()))
    }

    /// Append another buffer's frames
    pub fn append(&mut self, other: &PcmBuffer) {
        self.left.extend_from_slice(&other.left);
        self.right.extend_from_slice(&other.right);
    }

    /// Append frames `from..` of another buffer
    pub fn append_from(&mut self, other: &PcmBuffer, from: usize) {
        let from = from.min(other.frames());
        self.left.extend_from_slice(&other.left[from..]);
        self.right.extend_from_slice(&other.right[from..]);
    }

    /// Copy of frames `start..end`
    pub fn slice(&self, start: usize, end: usize) -> PcmBuffer {
        let end = end.min(self.frames());
        let start = start.min(end);
        PcmBuffer {
            left: self.left[start..end].to_vec(),
            right: self.right[start..end].to_vec(),
            sample_rate: self.sample_rate,
        }
    }

    /// Remove frames `start..end` in place, keeping only that range
    pub fn retain_range(&mut self, start: usize, end: usize) {
        let end = end.min(self.frames());
        let start = start.min(end);
        self.left.truncate(end);
        self.right.truncate(end);
        self.left.drain(..start);
        self.right.drain(..start);
    }

    /// Split at `at`, leaving frames `..at` in self and returning `at..`
    pub fn split_off(&mut self, at: usize) -> PcmBuffer {
        let at = at.min(self.frames());
        PcmBuffer {
            left: self.left.split_off(at),
            right: self.right.split_off(at),
            sample_rate: self.sample_rate,
        }
    }

    /// Sample pair at `index`, or silence beyond the end
    pub fn frame_or_silence(&self, index: usize) -> (f32, f32) {
        if index < self.frames() {
            (self.left[index], self.right[index])
        } else {
            (0.0, 0.0)
        }
    }
}
