//! Serial denoise pipeline: one session, segments processed in order.

use std::path::Path;
use std::time::Instant;

use clearwave_audio::wav::{SampleFormat, Wav};
use clearwave_audio::resample;
use clearwave_onnx::{Env, LoggingLevel};

use crate::config::DenoiseConfig;
use crate::engine::{input_tensor, InferenceEngine};
use crate::error::Result;
use crate::level;
use crate::reconstruct::Reconstructor;
use crate::segment::{Segment, Segmenter};

/// Summary of one processed file.
#[derive(Debug, Clone)]
pub struct Report {
    pub input_duration_secs: f64,
    pub processing_time_secs: f64,
    /// Processing time divided by audio duration; under 1.0 means
    /// faster than real time.
    pub real_time_factor: f64,
    pub segment_count: usize,
    pub avg_inference_ms: f64,
    pub workers: usize,
}

impl Report {
    pub(crate) fn new(
        input_duration_secs: f64,
        processing_time_secs: f64,
        segment_count: usize,
        avg_inference_ms: f64,
        workers: usize,
    ) -> Self {
        let real_time_factor = if input_duration_secs > 0.0 {
            processing_time_secs / input_duration_secs
        } else {
            0.0
        };
        Self {
            input_duration_secs,
            processing_time_secs,
            real_time_factor,
            segment_count,
            avg_inference_ms,
            workers,
        }
    }
}

/// Downmixes to mono and converts to the target sample rate.
pub(crate) fn prepare(wav: &Wav, target_rate: u32) -> Result<Vec<f32>> {
    let mono = wav.to_mono();
    if wav.spec.sample_rate == target_rate {
        return Ok(mono);
    }
    tracing::debug!(
        from_hz = wav.spec.sample_rate,
        to_hz = target_rate,
        "resampling input"
    );
    Ok(resample::resample(&mono, wav.spec.sample_rate, target_rate)?)
}

/// Re-tags processed samples with the source segment's position.
pub(crate) fn processed_segment(original: &Segment, samples: Vec<f32>) -> Segment {
    Segment {
        index: original.index,
        samples,
        start: original.start,
        end: original.end,
        complete: original.complete,
    }
}

/// Writes the final mix as PCM16 WAV.
pub(crate) fn write_output(path: &Path, sample_rate: u32, samples: Vec<f32>) -> Result<()> {
    Wav::new_mono(sample_rate, SampleFormat::Int16, samples).write(path)?;
    Ok(())
}

pub struct Pipeline {
    config: DenoiseConfig,
    engine: InferenceEngine,
    segmenter: Segmenter,
    reconstructor: Reconstructor,
}

impl Pipeline {
    pub fn new(config: DenoiseConfig) -> Result<Self> {
        config.validate()?;

        let env = Env::new("clearwave", LoggingLevel::Warning)?;
        let engine = InferenceEngine::new(&env, &config.model)?;
        let segmenter = Segmenter::new(config.audio.segment_size, config.audio.overlap_ratio)?;
        let reconstructor = Reconstructor::new(config.audio.overlap_ratio)?;

        Ok(Self {
            config,
            engine,
            segmenter,
            reconstructor,
        })
    }

    pub fn warm_up(&mut self) -> Result<()> {
        self.engine.warm_up(self.config.audio.segment_size)
    }

    /// Denoises one file end to end.
    pub fn process_file(&mut self, input: &Path, output: &Path) -> Result<Report> {
        let start = Instant::now();

        let wav = Wav::read(input)?;
        let duration = wav.duration_secs();
        tracing::info!(
            input = %input.display(),
            duration_secs = duration,
            sample_rate = wav.spec.sample_rate,
            "processing"
        );

        let samples = prepare(&wav, self.config.audio.sample_rate)?;
        let segments = self.segmenter.split(&samples);
        tracing::debug!(segments = segments.len(), "segmented");

        let mut total_inference_ms = 0u64;
        let mut processed = Vec::with_capacity(segments.len());
        for seg in &segments {
            let tensor = input_tensor(&seg.samples, self.config.audio.segment_size)?;
            let result = self.engine.run(&tensor)?;
            total_inference_ms += result.time_ms;

            let mut data = result.output;
            if self.config.processing.enable_agc {
                level::apply_agc(&mut data);
            }
            processed.push(processed_segment(seg, data));
        }

        let mut mix = self.reconstructor.overlap_add(&processed)?;
        if self.config.processing.normalize_output {
            level::normalize_output(&mut mix);
        }
        write_output(output, self.config.audio.sample_rate, mix)?;

        let elapsed = start.elapsed().as_secs_f64();
        let avg = if segments.is_empty() {
            0.0
        } else {
            total_inference_ms as f64 / segments.len() as f64
        };
        tracing::info!(
            output = %output.display(),
            elapsed_secs = elapsed,
            "complete"
        );

        Ok(Report::new(duration, elapsed, segments.len(), avg, 1))
    }

    pub fn stats(&self) -> &crate::engine::InferenceStats {
        self.engine.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clearwave_audio::wav::WavSpec;

    #[test]
    fn report_computes_rtf() {
        let r = Report::new(10.0, 5.0, 12, 40.0, 1);
        assert!((r.real_time_factor - 0.5).abs() < 1e-9);

        let zero = Report::new(0.0, 5.0, 0, 0.0, 1);
        assert_eq!(zero.real_time_factor, 0.0);
    }

    #[test]
    fn prepare_passes_through_matching_rate() {
        let wav = Wav::new_mono(16000, SampleFormat::Float32, vec![0.1, 0.2]);
        let out = prepare(&wav, 16000).unwrap();
        assert_eq!(out, vec![0.1, 0.2]);
    }

    #[test]
    fn prepare_downmixes_stereo() {
        let wav = Wav {
            spec: WavSpec {
                sample_rate: 16000,
                channels: 2,
                format: SampleFormat::Float32,
            },
            samples: vec![0.0, 1.0, 1.0, 0.0],
        };
        let out = prepare(&wav, 16000).unwrap();
        assert_eq!(out.len(), 2);
        assert!((out[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn prepare_resamples() {
        let wav = Wav::new_mono(32000, SampleFormat::Float32, vec![0.25; 32000]);
        let out = prepare(&wav, 16000).unwrap();
        assert_eq!(out.len(), 16000);
    }

    #[test]
    fn processed_segment_keeps_position() {
        let seg = Segment {
            index: 3,
            samples: vec![0.0; 10],
            start: 30,
            end: 40,
            complete: true,
        };
        let out = processed_segment(&seg, vec![1.0; 16]);
        assert_eq!(out.index, 3);
        assert_eq!(out.start, 30);
        assert_eq!(out.end, 40);
        assert_eq!(out.samples.len(), 16);
    }
}
