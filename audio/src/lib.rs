//! Audio processing utilities.
//!
//! This crate provides the audio plumbing for the denoise pipeline:
//!
//! - `wav`: RIFF/WAVE file reading and writing (PCM16 / IEEE float32)
//! - `sample`: sample-level helpers (i16↔f32, RMS, peak, gain)
//! - `resample`: mono sample-rate conversion
//!
//! # Example
//!
//! ```no_run
//! use clearwave_audio::wav::Wav;
//! use clearwave_audio::resample::resample;
//!
//! let wav = Wav::read("input.wav").unwrap();
//! let mono = wav.to_mono();
//! let at_16k = resample(&mono, wav.spec.sample_rate, 16000).unwrap();
//! ```

mod error;
pub mod resample;
pub mod sample;
pub mod wav;

pub use error::AudioError;
pub use wav::{SampleFormat, Wav, WavSpec};
