//! denoise - speech denoising CLI over ONNX Runtime.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use clearwave_denoise::{DenoiseConfig, ParallelPipeline, Pipeline, Report};

/// Speech denoising over ONNX Runtime.
#[derive(Parser, Debug)]
#[command(name = "denoise")]
#[command(about = "Speech denoising over ONNX Runtime", version)]
struct Args {
    /// Input audio file (WAV)
    #[arg(short, long)]
    input: PathBuf,

    /// Output audio file
    #[arg(short, long, default_value = "output.wav")]
    output: PathBuf,

    /// ONNX model file path
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Config file (YAML); flags override file settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Target sample rate in Hz
    #[arg(short = 'r', long)]
    sample_rate: Option<u32>,

    /// Inter-segment overlap ratio (0.0 - 1.0)
    #[arg(short = 'l', long)]
    overlap: Option<f32>,

    /// Segment size in samples
    #[arg(short = 's', long)]
    segment_size: Option<usize>,

    /// Max inference retries per segment
    #[arg(long)]
    max_retries: Option<u32>,

    /// Intra-op inference threads
    #[arg(long)]
    threads: Option<usize>,

    /// Worker count for parallel mode
    #[arg(short = 'w', long)]
    workers: Option<usize>,

    /// Process with a single session instead of the worker pool
    #[arg(long)]
    serial: bool,

    /// Run one warm-up inference before processing (serial mode)
    #[arg(long)]
    warm_up: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn build_config(&self) -> Result<DenoiseConfig> {
        let mut config = match &self.config {
            Some(path) => DenoiseConfig::from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => DenoiseConfig::default(),
        };

        if let Some(model) = &self.model {
            config.model.path = model.clone();
        }
        if let Some(rate) = self.sample_rate {
            config.audio.sample_rate = rate;
        }
        if let Some(overlap) = self.overlap {
            config.audio.overlap_ratio = overlap;
        }
        if let Some(size) = self.segment_size {
            config.audio.segment_size = size;
        }
        if let Some(retries) = self.max_retries {
            config.model.max_retries = retries;
        }
        if let Some(threads) = self.threads {
            config.model.intra_threads = threads;
        }
        if let Some(workers) = self.workers {
            config.processing.workers = workers;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = args.build_config()?;

    let report = if args.serial {
        let mut pipeline = Pipeline::new(config).context("building pipeline")?;
        if args.warm_up {
            pipeline.warm_up().context("warm-up")?;
        }
        pipeline
            .process_file(&args.input, &args.output)
            .context("processing")?
    } else {
        let mut pipeline = ParallelPipeline::new(config).context("building pipeline")?;
        pipeline
            .process_file(&args.input, &args.output)
            .context("processing")?
    };

    print_summary(&args, &report);
    Ok(())
}

fn print_summary(args: &Args, report: &Report) {
    println!("wrote {}", args.output.display());
    println!(
        "audio {:.2}s, processed in {:.2}s (RTF {:.3})",
        report.input_duration_secs, report.processing_time_secs, report.real_time_factor
    );
    if args.verbose {
        println!(
            "{} segments, avg inference {:.2}ms, {} worker(s)",
            report.segment_count, report.avg_inference_ms, report.workers
        );
    }
}
