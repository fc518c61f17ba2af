//! Inference engine: a session plus retry policy and run statistics.

use std::sync::Arc;
use std::time::{Duration, Instant};

use clearwave_onnx::{Env, OnnxError, Session, SessionOptions, Tensor};

use crate::config::ModelConfig;
use crate::error::{DenoiseError, Result};

/// Accumulated run statistics.
#[derive(Debug, Clone, Default)]
pub struct InferenceStats {
    pub total: u64,
    pub success: u64,
    pub failed: u64,
    pub total_time_ms: u64,
}

impl InferenceStats {
    pub fn record(&mut self, time_ms: u64, success: bool) {
        self.total += 1;
        if success {
            self.success += 1;
            self.total_time_ms += time_ms;
        } else {
            self.failed += 1;
        }
    }

    pub fn avg_time_ms(&self) -> f64 {
        if self.success > 0 {
            self.total_time_ms as f64 / self.success as f64
        } else {
            0.0
        }
    }
}

/// One successful inference.
#[derive(Debug)]
pub struct InferenceResult {
    /// Enhanced samples in [-1, 1].
    pub output: Vec<f32>,
    pub time_ms: u64,
}

/// Wraps a [`Session`] with named I/O, bounded retry, and stats.
pub struct InferenceEngine {
    session: Session,
    input_name: String,
    output_name: String,
    max_retries: u32,
    retry_delay: Duration,
    stats: InferenceStats,
}

impl InferenceEngine {
    /// Loads the model and builds a session under `env`.
    pub fn new(env: &Arc<Env>, config: &ModelConfig) -> Result<Self> {
        let mut options = SessionOptions::new()?;
        options.set_intra_threads(config.intra_threads)?;
        let session = Session::new(env, &config.path, &options)?;

        tracing::info!(
            model = %config.path.display(),
            threads = config.intra_threads,
            "session created"
        );

        Ok(Self {
            session,
            input_name: config.input_name.clone(),
            output_name: config.output_name.clone(),
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            stats: InferenceStats::default(),
        })
    }

    /// Runs one segment through the model, retrying on failure.
    pub fn run(&mut self, input: &Tensor) -> Result<InferenceResult> {
        let start = Instant::now();
        let mut last_err: Option<OnnxError> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                std::thread::sleep(self.retry_delay);
                tracing::warn!(attempt, max = self.max_retries, "retrying inference");
            }

            match run_once(
                &self.session,
                &self.input_name,
                input,
                &self.output_name,
            ) {
                Ok(output) => {
                    let time_ms = start.elapsed().as_millis() as u64;
                    self.stats.record(time_ms, true);
                    return Ok(InferenceResult { output, time_ms });
                }
                Err(e) => {
                    tracing::error!(attempt = attempt + 1, error = %e, "inference failed");
                    last_err = Some(e);
                }
            }
        }

        self.stats
            .record(start.elapsed().as_millis() as u64, false);
        Err(last_err
            .map(DenoiseError::from)
            .unwrap_or_else(|| DenoiseError::Processing("inference failed".into())))
    }

    /// Runs one zero-filled segment so model initialization cost does
    /// not land on the first real segment.
    pub fn warm_up(&mut self, segment_size: usize) -> Result<()> {
        tracing::info!("warming up");
        let dummy = input_tensor(&vec![0.0; segment_size], segment_size)?;
        self.run(&dummy)?;
        tracing::info!("warm-up complete");
        Ok(())
    }

    pub fn stats(&self) -> &InferenceStats {
        &self.stats
    }
}

/// One uninstrumented run against a session. Shared with the parallel
/// workers, which manage their own timing.
pub(crate) fn run_once(
    session: &Session,
    input_name: &str,
    input: &Tensor,
    output_name: &str,
) -> std::result::Result<Vec<f32>, OnnxError> {
    let outputs = session.run(&[input_name], &[input], &[output_name])?;
    outputs
        .first()
        .ok_or_else(|| OnnxError::Runtime("no output produced".into()))?
        .float_data()
}

/// Builds the model input tensor for one segment: zero-padded to the
/// segment size, scaled to PCM16, shaped `[1, 1, N]`.
pub(crate) fn input_tensor(samples: &[f32], segment_size: usize) -> Result<Tensor> {
    let padded = crate::segment::pad_to(samples, segment_size);
    let pcm: Vec<i16> = padded
        .iter()
        .map(|&v| (v.clamp(-1.0, 1.0) * 32767.0) as i16)
        .collect();
    Ok(Tensor::from_i16(&[1, 1, segment_size as i64], pcm)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_average() {
        let mut s = InferenceStats::default();
        s.record(100, true);
        s.record(200, true);
        s.record(50, false);
        assert_eq!(s.total, 3);
        assert_eq!(s.success, 2);
        assert_eq!(s.failed, 1);
        assert_eq!(s.avg_time_ms(), 150.0);
    }

    #[test]
    fn stats_average_without_successes() {
        let mut s = InferenceStats::default();
        s.record(100, false);
        assert_eq!(s.avg_time_ms(), 0.0);
    }
}
