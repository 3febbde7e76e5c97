//! Error types for podmix-mixer
//!
//! Every failure is fatal for the episode: nothing here degrades into
//! partial or silently altered audio. Errors raised inside the pipeline
//! are wrapped with the phase and location they occurred in.

use thiserror::Error;

/// Pipeline phase an error occurred in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Fetch,
    Decode,
    Analyze,
    Mix,
    Encode,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Fetch => "fetch",
            Phase::Decode => "decode",
            Phase::Analyze => "analyze",
            Phase::Mix => "mix",
            Phase::Encode => "encode",
        };
        f.write_str(name)
    }
}

/// Main error type for podmix-mixer
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed container, unsupported bit depth or sample format
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Intro/outro asset unreachable or non-success response
    #[error("Asset fetch error: {0}")]
    Fetch(String),

    /// Encoder invariant violated (empty output, poor compression, no sync word)
    #[error("Audio encode error: {0}")]
    Encode(String),

    /// Settings out of range or inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// Envelope breakpoints or segments invalid
    #[error("Invalid envelope: {0}")]
    Envelope(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings loading errors from podmix-common
    #[error(transparent)]
    Settings(#[from] podmix_common::Error),

    /// Error annotated with the phase and location it came from
    #[error("{phase} phase failed at {location}: {source}")]
    Phase {
        phase: Phase,
        location: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// The innermost error, with any phase wrappers removed
    pub fn root(&self) -> &Error {
        match self {
            Error::Phase { source, .. } => source.root(),
            other => other,
        }
    }

    /// Phase recorded by the outermost wrapper, if any
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Error::Phase { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}

/// Convenience Result type using podmix-mixer Error
pub type Result<T> = std::result::Result<T, Error>;

/// Attach phase context to a fallible result
pub trait PhaseContext<T> {
    fn in_phase(self, phase: Phase, location: impl Into<String>) -> Result<T>;
}

impl<T> PhaseContext<T> for Result<T> {
    fn in_phase(self, phase: Phase, location: impl Into<String>) -> Result<T> {
        self.map_err(|source| Error::Phase {
            phase,
            location: location.into(),
            source: Box::new(source),
        })
    }
}
