//! Rust bindings for the ONNX Runtime C API.
//!
//! ONNX Runtime is a cross-platform inference engine for ONNX models.
//! This crate wraps its C API, providing safe Rust types for
//! Environment, Session, and Tensor.
//!
//! # Usage
//!
//! ```no_run
//! use clearwave_onnx::{Env, LoggingLevel, Session, SessionOptions, Tensor};
//!
//! let env = Env::new("myapp", LoggingLevel::Warning).unwrap();
//! let mut opts = SessionOptions::new().unwrap();
//! opts.set_intra_threads(2).unwrap();
//! let session = Session::new(&env, "denoiser.onnx".as_ref(), &opts).unwrap();
//!
//! let input = Tensor::from_f32(&[1, 1, 16000], vec![0.0; 16000]).unwrap();
//! let outputs = session.run(&["input"], &[&input], &["output"]).unwrap();
//! let enhanced = outputs[0].float_data().unwrap();
//! ```
//!
//! # Dynamic Loading
//!
//! The onnxruntime shared library is resolved at load time, not link
//! time. Set `ORT_DYLIB_PATH` to point at the library explicitly;
//! otherwise the platform-default name (`libonnxruntime.so` /
//! `libonnxruntime.dylib`) is looked up on the standard loader path.
//! When the library is absent every runtime operation returns
//! [`OnnxError::Library`].

mod error;
pub mod ffi;
pub mod model;
mod onnx;

pub use error::OnnxError;
pub use model::{find_models, ModelMetadata, ModelValidation};
pub use onnx::{ElementType, Env, LoggingLevel, Session, SessionOptions, Tensor};
