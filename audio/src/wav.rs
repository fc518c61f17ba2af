//! WAV (RIFF/WAVE) file reading and writing.
//!
//! Supports the two encodings the pipeline needs: 16-bit signed PCM
//! and 32-bit IEEE float, mono or stereo. Sample data is surfaced as
//! interleaved f32 in [-1, 1] regardless of the on-disk encoding.

use std::path::Path;

use crate::error::AudioError;
use crate::sample;

const FORMAT_PCM: u16 = 1;
const FORMAT_IEEE_FLOAT: u16 = 3;

/// On-disk sample encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    Int16,
    Float32,
}

impl SampleFormat {
    pub fn bits_per_sample(&self) -> u16 {
        match self {
            SampleFormat::Int16 => 16,
            SampleFormat::Float32 => 32,
        }
    }

    pub fn bytes_per_sample(&self) -> u16 {
        self.bits_per_sample() / 8
    }

    fn format_tag(&self) -> u16 {
        match self {
            SampleFormat::Int16 => FORMAT_PCM,
            SampleFormat::Float32 => FORMAT_IEEE_FLOAT,
        }
    }
}

/// Stream parameters from the `fmt ` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    pub sample_rate: u32,
    pub channels: u16,
    pub format: SampleFormat,
}

/// A decoded WAV file: spec plus interleaved f32 samples.
#[derive(Debug, Clone)]
pub struct Wav {
    pub spec: WavSpec,
    pub samples: Vec<f32>,
}

impl Wav {
    /// Creates a mono file from samples in [-1, 1].
    pub fn new_mono(sample_rate: u32, format: SampleFormat, samples: Vec<f32>) -> Self {
        Self {
            spec: WavSpec {
                sample_rate,
                channels: 1,
                format,
            },
            samples,
        }
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.spec.channels.max(1) as usize
    }

    pub fn duration_secs(&self) -> f64 {
        if self.spec.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.spec.sample_rate as f64
    }

    /// Averages channels down to a single mono signal.
    pub fn to_mono(&self) -> Vec<f32> {
        let ch = self.spec.channels as usize;
        if ch <= 1 {
            return self.samples.clone();
        }
        self.samples
            .chunks_exact(ch)
            .map(|frame| frame.iter().sum::<f32>() / ch as f32)
            .collect()
    }

    /// Reads and decodes a WAV file.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, AudioError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::decode(&bytes)
    }

    /// Decodes a WAV byte stream.
    pub fn decode(bytes: &[u8]) -> Result<Self, AudioError> {
        if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
            return Err(AudioError::Format("not a RIFF/WAVE stream".into()));
        }

        let mut fmt: Option<(u16, u16, u32, u16)> = None; // tag, channels, rate, bits
        let mut data: Option<&[u8]> = None;

        let mut pos = 12;
        while pos + 8 <= bytes.len() {
            let id = &bytes[pos..pos + 4];
            let size = u32::from_le_bytes(bytes[pos + 4..pos + 8].try_into().unwrap()) as usize;
            let body_start = pos + 8;
            let body_end = body_start
                .checked_add(size)
                .filter(|&e| e <= bytes.len())
                .ok_or_else(|| AudioError::Format("truncated chunk".into()))?;
            let body = &bytes[body_start..body_end];

            match id {
                b"fmt " => {
                    if body.len() < 16 {
                        return Err(AudioError::Format("fmt chunk too short".into()));
                    }
                    let tag = u16::from_le_bytes(body[0..2].try_into().unwrap());
                    let channels = u16::from_le_bytes(body[2..4].try_into().unwrap());
                    let rate = u32::from_le_bytes(body[4..8].try_into().unwrap());
                    let bits = u16::from_le_bytes(body[14..16].try_into().unwrap());
                    fmt = Some((tag, channels, rate, bits));
                }
                b"data" => data = Some(body),
                _ => {}
            }

            // Chunks are word-aligned; odd sizes carry a pad byte.
            pos = body_end + (size & 1);
        }

        let (tag, channels, sample_rate, bits) =
            fmt.ok_or_else(|| AudioError::Format("missing fmt chunk".into()))?;
        let data = data.ok_or_else(|| AudioError::Format("missing data chunk".into()))?;

        if sample_rate == 0 {
            return Err(AudioError::Format("zero sample rate".into()));
        }
        if channels == 0 || channels > 2 {
            return Err(AudioError::Unsupported(format!("{channels} channels")));
        }

        let (format, samples) = match (tag, bits) {
            (FORMAT_PCM, 16) => {
                if data.len() % 2 != 0 {
                    return Err(AudioError::Format("odd PCM16 data length".into()));
                }
                let pcm: Vec<i16> = data
                    .chunks_exact(2)
                    .map(|b| i16::from_le_bytes([b[0], b[1]]))
                    .collect();
                (SampleFormat::Int16, sample::i16_to_f32(&pcm))
            }
            (FORMAT_IEEE_FLOAT, 32) => {
                if data.len() % 4 != 0 {
                    return Err(AudioError::Format("odd float32 data length".into()));
                }
                let samples = data
                    .chunks_exact(4)
                    .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                    .collect();
                (SampleFormat::Float32, samples)
            }
            _ => {
                return Err(AudioError::Unsupported(format!(
                    "format tag {tag}, {bits} bits per sample"
                )));
            }
        };

        Ok(Self {
            spec: WavSpec {
                sample_rate,
                channels,
                format,
            },
            samples,
        })
    }

    /// Encodes and writes the file, creating parent directories.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), AudioError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.encode()?)?;
        Ok(())
    }

    /// Encodes the file into a WAV byte stream.
    pub fn encode(&self) -> Result<Vec<u8>, AudioError> {
        let spec = self.spec;
        if spec.sample_rate == 0 {
            return Err(AudioError::Format("zero sample rate".into()));
        }
        if spec.channels == 0 || spec.channels > 2 {
            return Err(AudioError::Unsupported(format!("{} channels", spec.channels)));
        }
        if self.samples.len() % spec.channels as usize != 0 {
            return Err(AudioError::Format(
                "sample count not a multiple of channel count".into(),
            ));
        }

        let bytes_per_sample = spec.format.bytes_per_sample() as u32;
        let block_align = spec.channels as u32 * bytes_per_sample;
        let byte_rate = spec.sample_rate * block_align;
        let data_len = self.samples.len() as u32 * bytes_per_sample;

        let mut out = Vec::with_capacity(44 + data_len as usize);
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");

        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&spec.format.format_tag().to_le_bytes());
        out.extend_from_slice(&spec.channels.to_le_bytes());
        out.extend_from_slice(&spec.sample_rate.to_le_bytes());
        out.extend_from_slice(&byte_rate.to_le_bytes());
        out.extend_from_slice(&(block_align as u16).to_le_bytes());
        out.extend_from_slice(&spec.format.bits_per_sample().to_le_bytes());

        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        match spec.format {
            SampleFormat::Int16 => {
                for &s in &self.samples {
                    out.extend_from_slice(&sample::f32_to_i16_one(s).to_le_bytes());
                }
            }
            SampleFormat::Float32 => {
                for &s in &self.samples {
                    out.extend_from_slice(&s.to_le_bytes());
                }
            }
        }

        Ok(out)
    }
}
