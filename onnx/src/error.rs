use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by ONNX Runtime operations.
#[derive(Debug, Error)]
pub enum OnnxError {
    /// The onnxruntime shared library could not be loaded, or is
    /// missing a required symbol.
    #[error("onnx: runtime library unavailable: {0}")]
    Library(String),

    /// An operation inside the runtime failed. The message is whatever
    /// the engine reported; no structured taxonomy exists at this layer.
    #[error("onnx: {0}")]
    Runtime(String),

    #[error("onnx: model not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    #[error("onnx: empty data")]
    EmptyData,

    #[error("onnx: io: {0}")]
    Io(#[from] std::io::Error),
}
