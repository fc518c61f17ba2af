//! Parallel denoise pipeline: one session per worker thread.
//!
//! Segments are dispatched round-robin over mpsc channels. Each worker
//! owns its own session, so inference runs concurrently without any
//! shared-session assumptions about the engine.

use std::path::Path;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use clearwave_audio::wav::Wav;
use clearwave_onnx::{Env, LoggingLevel, Session, SessionOptions};

use crate::config::DenoiseConfig;
use crate::engine::{input_tensor, run_once};
use crate::error::{DenoiseError, Result};
use crate::level;
use crate::pipeline::{prepare, processed_segment, write_output, Report};
use crate::reconstruct::Reconstructor;
use crate::segment::Segmenter;

struct Task {
    index: usize,
    samples: Vec<f32>,
}

struct Output {
    index: usize,
    data: Result<Vec<f32>>,
    time_ms: u64,
}

struct Worker {
    tx: Sender<Option<Task>>,
    rx: Receiver<Output>,
    handle: JoinHandle<()>,
}

impl Worker {
    /// Builds the session up front so model errors surface here rather
    /// than inside the thread.
    fn spawn(env: &Arc<Env>, config: &DenoiseConfig, threads: usize) -> Result<Self> {
        let mut options = SessionOptions::new()?;
        options.set_intra_threads(threads)?;
        let session = Session::new(env, &config.model.path, &options)?;

        let input_name = config.model.input_name.clone();
        let output_name = config.model.output_name.clone();
        let segment_size = config.audio.segment_size;

        let (task_tx, task_rx) = channel::<Option<Task>>();
        let (out_tx, out_rx) = channel::<Output>();

        let handle = std::thread::spawn(move || {
            while let Ok(Some(task)) = task_rx.recv() {
                let start = Instant::now();
                let data = input_tensor(&task.samples, segment_size)
                    .and_then(|tensor| {
                        run_once(&session, &input_name, &tensor, &output_name)
                            .map_err(DenoiseError::from)
                    });
                let sent = out_tx.send(Output {
                    index: task.index,
                    data,
                    time_ms: start.elapsed().as_millis() as u64,
                });
                if sent.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            tx: task_tx,
            rx: out_rx,
            handle,
        })
    }
}

pub struct ParallelPipeline {
    config: DenoiseConfig,
    workers: Vec<Worker>,
    segmenter: Segmenter,
    reconstructor: Reconstructor,
}

impl ParallelPipeline {
    pub fn new(config: DenoiseConfig) -> Result<Self> {
        config.validate()?;

        let num_workers = config.processing.workers.max(1);
        let threads_per = (config.model.intra_threads / num_workers).max(1);

        let env = Env::new("clearwave", LoggingLevel::Warning)?;
        let workers: Result<Vec<_>> = (0..num_workers)
            .map(|_| Worker::spawn(&env, &config, threads_per))
            .collect();
        let workers = workers?;

        tracing::info!(
            workers = workers.len(),
            threads_per_worker = threads_per,
            "parallel pipeline ready"
        );

        Ok(Self {
            segmenter: Segmenter::new(config.audio.segment_size, config.audio.overlap_ratio)?,
            reconstructor: Reconstructor::new(config.audio.overlap_ratio)?,
            config,
            workers,
        })
    }

    /// Denoises one file, fanning segments out across the workers.
    pub fn process_file(&mut self, input: &Path, output: &Path) -> Result<Report> {
        let start = Instant::now();

        let wav = Wav::read(input)?;
        let duration = wav.duration_secs();
        let samples = prepare(&wav, self.config.audio.sample_rate)?;
        let segments = self.segmenter.split(&samples);

        let mut tasks_per_worker = vec![0usize; self.workers.len()];
        for (i, seg) in segments.iter().enumerate() {
            let worker = i % self.workers.len();
            self.workers[worker]
                .tx
                .send(Some(Task {
                    index: i,
                    samples: seg.samples.clone(),
                }))
                .map_err(|_| DenoiseError::Processing("worker hung up".into()))?;
            tasks_per_worker[worker] += 1;
        }

        let mut results: Vec<(usize, Vec<f32>, u64)> = Vec::with_capacity(segments.len());
        for (worker, &count) in tasks_per_worker.iter().enumerate() {
            for _ in 0..count {
                let out = self.workers[worker]
                    .rx
                    .recv()
                    .map_err(|_| DenoiseError::Processing("worker hung up".into()))?;
                results.push((out.index, out.data?, out.time_ms));
            }
        }
        results.sort_by_key(|(index, _, _)| *index);

        let total_inference_ms: u64 = results.iter().map(|(_, _, t)| t).sum();
        let processed: Vec<_> = results
            .into_iter()
            .map(|(index, mut data, _)| {
                if self.config.processing.enable_agc {
                    level::apply_agc(&mut data);
                }
                processed_segment(&segments[index], data)
            })
            .collect();

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

        Ok(Report::new(
            duration,
            elapsed,
            segments.len(),
            avg,
            self.workers.len(),
        ))
    }
}

impl Drop for ParallelPipeline {
    fn drop(&mut self) {
        for worker in self.workers.drain(..) {
            let _ = worker.tx.send(None);
            let _ = worker.handle.join();
        }
    }
}
