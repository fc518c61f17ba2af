//! Pipeline configuration.
//!
//! Settings load from a YAML file, with CLI flags layered on top by
//! the binary. Every consumer goes through [`DenoiseConfig::validate`]
//! before building a pipeline.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DenoiseError, Result};

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DenoiseConfig {
    pub model: ModelConfig,
    pub audio: AudioConfig,
    pub processing: ProcessingConfig,
}

/// Model and inference settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// ONNX model file path.
    pub path: PathBuf,
    /// Name of the model's input tensor.
    pub input_name: String,
    /// Name of the model's output tensor.
    pub output_name: String,
    /// Retries per segment before the run is abandoned.
    pub max_retries: u32,
    /// Delay between retries.
    pub retry_delay_ms: u64,
    /// Intra-op thread count per session.
    pub intra_threads: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("model/denoiser.onnx"),
            input_name: "input".to_string(),
            output_name: "output".to_string(),
            max_retries: 3,
            retry_delay_ms: 100,
            intra_threads: 4,
        }
    }
}

/// Segmentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Sample rate the model expects; input audio is converted to it.
    pub sample_rate: u32,
    /// Segment length in samples.
    pub segment_size: usize,
    /// Inter-segment overlap ratio in [0, 1).
    pub overlap_ratio: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            segment_size: 16000,
            overlap_ratio: 0.1,
        }
    }
}

/// Post-inference level management.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Per-segment automatic gain control.
    pub enable_agc: bool,
    /// Final output normalization.
    pub normalize_output: bool,
    /// Worker count for the parallel pipeline.
    pub workers: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            enable_agc: true,
            normalize_output: true,
            workers: 4,
        }
    }
}

impl DenoiseConfig {
    /// Loads configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| DenoiseError::Config(format!("read config: {e}")))?;
        serde_yaml::from_str(&content)
            .map_err(|e| DenoiseError::Config(format!("parse config: {e}")))
    }

    /// Writes configuration to a YAML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| DenoiseError::Config(format!("serialize config: {e}")))?;
        std::fs::write(path.as_ref(), content)
            .map_err(|e| DenoiseError::Config(format!("write config: {e}")))
    }

    /// Checks parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate == 0 {
            return Err(DenoiseError::Config("sample rate must be nonzero".into()));
        }
        if self.audio.sample_rate > 192_000 {
            return Err(DenoiseError::Config("sample rate exceeds 192 kHz".into()));
        }
        if !(0.0..1.0).contains(&self.audio.overlap_ratio) {
            return Err(DenoiseError::Config(
                "overlap ratio must be in [0.0, 1.0)".into(),
            ));
        }
        if self.audio.segment_size == 0 {
            return Err(DenoiseError::Config("segment size must be nonzero".into()));
        }
        if self.audio.segment_size % 2 != 0 {
            return Err(DenoiseError::Config("segment size must be even".into()));
        }
        if self.model.max_retries > 10 {
            return Err(DenoiseError::Config("max retries capped at 10".into()));
        }
        if self.model.intra_threads == 0 || self.model.intra_threads > 128 {
            return Err(DenoiseError::Config(
                "intra-op thread count must be in 1..=128".into(),
            ));
        }
        if self.processing.workers == 0 || self.processing.workers > 64 {
            return Err(DenoiseError::Config("worker count must be in 1..=64".into()));
        }
        Ok(())
    }

    /// Samples shared between adjacent segments.
    pub fn overlap_samples(&self) -> usize {
        (self.audio.segment_size as f32 * self.audio.overlap_ratio) as usize
    }

    /// Step between segment starts.
    pub fn hop_size(&self) -> usize {
        self.audio.segment_size - self.overlap_samples()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_valid() {
        let config = DenoiseConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.audio.sample_rate, 16000);
        assert_eq!(config.audio.segment_size, 16000);
        assert_eq!(config.model.max_retries, 3);
    }

    #[test]
    fn validation_rejects_bad_ranges() {
        let mut config = DenoiseConfig::default();

        config.audio.sample_rate = 0;
        assert!(config.validate().is_err());
        config.audio.sample_rate = 16000;

        config.audio.overlap_ratio = 1.0;
        assert!(config.validate().is_err());
        config.audio.overlap_ratio = 0.1;

        config.audio.segment_size = 3;
        assert!(config.validate().is_err());
        config.audio.segment_size = 16000;

        config.model.intra_threads = 0;
        assert!(config.validate().is_err());
        config.model.intra_threads = 4;

        assert!(config.validate().is_ok());
    }

    #[test]
    fn overlap_and_hop() {
        let config = DenoiseConfig::default();
        assert_eq!(config.overlap_samples(), 1600);
        assert_eq!(config.hop_size(), 14400);
    }

    #[test]
    fn yaml_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("denoise.yaml");

        let mut config = DenoiseConfig::default();
        config.model.input_name = "noisy".to_string();
        config.audio.overlap_ratio = 0.2;
        config.save_to_file(&path).unwrap();

        let loaded = DenoiseConfig::from_file(&path).unwrap();
        assert_eq!(loaded.model.input_name, "noisy");
        assert!((loaded.audio.overlap_ratio - 0.2).abs() < 1e-6);
    }

    #[test]
    fn partial_yaml_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.yaml");
        std::fs::write(&path, "audio:\n  sample_rate: 8000\n").unwrap();

        let loaded = DenoiseConfig::from_file(&path).unwrap();
        assert_eq!(loaded.audio.sample_rate, 8000);
        assert_eq!(loaded.audio.segment_size, 16000);
        assert_eq!(loaded.model.input_name, "input");
    }
}
