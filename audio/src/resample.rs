//! Mono sample-rate conversion.
//!
//! Uses rubato's FFT fixed-in/out resampler. The input is processed in
//! fixed-size blocks with a zero-padded tail, the resampler latency is
//! skipped from the front, and the output is trimmed to the exact
//! ratio-implied length.

use rubato::{FftFixedInOut, Resampler};

use crate::error::AudioError;

const CHUNK_FRAMES: usize = 1024;

/// Resamples a mono f32 signal from `from_hz` to `to_hz`.
pub fn resample(input: &[f32], from_hz: u32, to_hz: u32) -> Result<Vec<f32>, AudioError> {
    if from_hz == 0 || to_hz == 0 {
        return Err(AudioError::Resample("zero sample rate".into()));
    }
    if from_hz == to_hz {
        return Ok(input.to_vec());
    }
    if input.is_empty() {
        return Ok(Vec::new());
    }

    let mut rs = FftFixedInOut::<f32>::new(from_hz as usize, to_hz as usize, CHUNK_FRAMES, 1)
        .map_err(|e| AudioError::Resample(e.to_string()))?;
    let delay = rs.output_delay();

    let expected = (input.len() as f64 * to_hz as f64 / from_hz as f64).round() as usize;
    let mut out: Vec<f32> = Vec::with_capacity(expected + delay);

    let mut in_buf: Vec<Vec<f32>> = vec![Vec::new()];
    let mut out_buf: Vec<Vec<f32>> = vec![vec![0.0; rs.output_frames_max()]];

    // Each block yields a fixed amount of output, so silent blocks past
    // the end of the input eventually push the delayed tail through.
    let mut pos = 0;
    while out.len() < expected + delay {
        let need = rs.input_frames_next();
        in_buf[0].clear();
        if pos < input.len() {
            let take = need.min(input.len() - pos);
            in_buf[0].extend_from_slice(&input[pos..pos + take]);
            pos += take;
        }
        in_buf[0].resize(need, 0.0);

        let next = rs.output_frames_next();
        if out_buf[0].len() < next {
            out_buf[0].resize(next, 0.0);
        }
        let (_, written) = rs
            .process_into_buffer(&in_buf, &mut out_buf, None)
            .map_err(|e| AudioError::Resample(e.to_string()))?;
        out.extend_from_slice(&out_buf[0][..written]);
    }

    out.drain(..delay.min(out.len()));
    out.truncate(expected);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_when_rates_match() {
        let input = vec![0.1, 0.2, 0.3];
        assert_eq!(resample(&input, 16000, 16000).unwrap(), input);
    }

    #[test]
    fn rejects_zero_rate() {
        assert!(resample(&[0.0], 0, 16000).is_err());
        assert!(resample(&[0.0], 16000, 0).is_err());
    }

    #[test]
    fn empty_input_stays_empty() {
        assert!(resample(&[], 48000, 16000).unwrap().is_empty());
    }

    #[test]
    fn downsample_halves_length() {
        let input = vec![0.5; 16000];
        let out = resample(&input, 16000, 8000).unwrap();
        assert_eq!(out.len(), 8000);
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn dc_level_survives_conversion() {
        let input = vec![0.5; 48000];
        let out = resample(&input, 48000, 16000).unwrap();
        assert_eq!(out.len(), 16000);
        // Ignore edge transients; the steady-state level should hold.
        let mid = &out[out.len() / 4..out.len() * 3 / 4];
        let avg: f32 = mid.iter().sum::<f32>() / mid.len() as f32;
        assert!((avg - 0.5).abs() < 0.05, "avg {avg}");
    }

    #[test]
    fn upsample_doubles_length() {
        let input = vec![0.25; 8000];
        let out = resample(&input, 8000, 16000).unwrap();
        assert_eq!(out.len(), 16000);
    }
}
