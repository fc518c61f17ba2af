use thiserror::Error;

/// Errors returned by the denoise pipeline.
#[derive(Debug, Error)]
pub enum DenoiseError {
    #[error("config: {0}")]
    Config(String),

    #[error("processing: {0}")]
    Processing(String),

    #[error(transparent)]
    Audio(#[from] clearwave_audio::AudioError),

    #[error(transparent)]
    Onnx(#[from] clearwave_onnx::OnnxError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DenoiseError>;
