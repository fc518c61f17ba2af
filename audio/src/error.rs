use thiserror::Error;

/// Errors returned by audio operations.
#[derive(Debug, Error)]
pub enum AudioError {
    /// Malformed or truncated audio data.
    #[error("audio: {0}")]
    Format(String),

    /// Well-formed data that this crate does not handle.
    #[error("audio: unsupported: {0}")]
    Unsupported(String),

    #[error("audio: resample: {0}")]
    Resample(String),

    #[error("audio: io: {0}")]
    Io(#[from] std::io::Error),
}
