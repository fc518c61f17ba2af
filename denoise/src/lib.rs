//! Speech denoising over ONNX Runtime inference.
//!
//! The pipeline reads a WAV file, downmixes and resamples it to the
//! model's rate, splits it into overlapping segments, runs each
//! segment through the denoising model, and stitches the enhanced
//! segments back together with an overlap-add crossfade:
//!
//! ```no_run
//! use clearwave_denoise::{DenoiseConfig, Pipeline};
//!
//! let mut config = DenoiseConfig::default();
//! config.model.path = "denoiser.onnx".into();
//!
//! let mut pipeline = Pipeline::new(config).unwrap();
//! pipeline.warm_up().unwrap();
//! let report = pipeline
//!     .process_file("noisy.wav".as_ref(), "clean.wav".as_ref())
//!     .unwrap();
//! println!("RTF {:.3}", report.real_time_factor);
//! ```
//!
//! [`ParallelPipeline`] does the same with one session per worker
//! thread for long recordings.

pub mod config;
pub mod engine;
mod error;
pub mod level;
mod parallel;
mod pipeline;
pub mod reconstruct;
pub mod segment;

pub use config::{AudioConfig, DenoiseConfig, ModelConfig, ProcessingConfig};
pub use engine::{InferenceEngine, InferenceResult, InferenceStats};
pub use error::{DenoiseError, Result};
pub use parallel::ParallelPipeline;
pub use pipeline::{Pipeline, Report};
pub use reconstruct::Reconstructor;
pub use segment::{Segment, Segmenter};
