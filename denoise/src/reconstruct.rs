//! Overlap-add reconstruction.
//!
//! Processed segments are stitched back together with a raised-cosine
//! crossfade over each overlap region, then the tail is faded out to
//! suppress the padding artifacts of the final partial segment.

use crate::error::{DenoiseError, Result};
use crate::segment::Segment;

#[derive(Debug, Clone)]
pub struct Reconstructor {
    overlap_ratio: f32,
}

impl Reconstructor {
    pub fn new(overlap_ratio: f32) -> Result<Self> {
        if !(0.0..1.0).contains(&overlap_ratio) {
            return Err(DenoiseError::Config(
                "overlap ratio must be in [0.0, 1.0)".into(),
            ));
        }
        Ok(Self { overlap_ratio })
    }

    /// Rebuilds the full signal from processed segments.
    ///
    /// Segment positions come from their `start`/`end` fields; the
    /// output length is the last segment's end. Sample data longer
    /// than the segment span (inference padding) is clipped.
    pub fn overlap_add(&self, segments: &[Segment]) -> Result<Vec<f32>> {
        if segments.is_empty() {
            return Ok(Vec::new());
        }

        let segment_size = segments[0].len();
        let overlap = (segment_size as f32 * self.overlap_ratio) as usize;
        let hop = segment_size - overlap;
        if hop == 0 {
            return Err(DenoiseError::Processing("hop size is zero".into()));
        }

        let total = segments.last().map(|s| s.end).unwrap_or(0);
        let mut out = vec![0.0f32; total];
        let fade = crossfade(overlap);

        for seg in segments {
            if seg.index == 0 {
                for (i, &sample) in seg.samples.iter().enumerate() {
                    if seg.start + i < out.len() {
                        out[seg.start + i] = sample;
                    }
                }
                continue;
            }

            let overlap_start = seg.index * hop;
            for i in 0..overlap {
                let pos = overlap_start + i;
                if pos < out.len() && i < seg.samples.len() && i < fade.len() {
                    let fade_out = fade[i];
                    out[pos] = out[pos] * fade_out + seg.samples[i] * (1.0 - fade_out);
                }
            }

            let rest_start = overlap_start + overlap;
            for (i, &sample) in seg.samples.iter().skip(overlap).enumerate() {
                if rest_start + i < out.len() {
                    out[rest_start + i] = sample;
                }
            }
        }

        end_fadeout(&mut out, segment_size);
        Ok(out)
    }
}

/// Raised-cosine fade from 1.0 down to 0.0 over `size` samples.
fn crossfade(size: usize) -> Vec<f32> {
    if size == 0 {
        return Vec::new();
    }
    (0..size)
        .map(|i| {
            let progress = i as f32 / (size - 1).max(1) as f32;
            0.5 * (1.0 + (std::f32::consts::PI * progress).cos())
        })
        .collect()
}

/// Fades the trailing region to zero and forces the last few samples
/// silent so truncated-segment padding cannot click.
fn end_fadeout(out: &mut [f32], segment_size: usize) {
    let fade_size = (segment_size as f32 * 0.15) as usize;
    if fade_size == 0 || out.len() <= fade_size {
        return;
    }

    let start = out.len() - fade_size;
    for i in 0..fade_size {
        let progress = i as f32 / fade_size as f32;
        let mut factor = (1.0 - progress * progress * std::f32::consts::PI / 2.0).cos();
        if progress > 0.8 {
            factor *= (-(progress - 0.8) / 0.2 * 4.0).exp();
        }
        out[start + i] *= factor;
    }

    let n = out.len();
    for v in out[n.saturating_sub(5)..].iter_mut() {
        *v = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(index: usize, samples: Vec<f32>, start: usize, end: usize) -> Segment {
        let complete = end - start == samples.len();
        Segment {
            index,
            samples,
            start,
            end,
            complete,
        }
    }

    #[test]
    fn crossfade_endpoints() {
        let fade = crossfade(5);
        assert_eq!(fade.len(), 5);
        assert!((fade[0] - 1.0).abs() < 0.01);
        assert!(fade[4].abs() < 0.01);
        assert!(crossfade(0).is_empty());
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let r = Reconstructor::new(0.1).unwrap();
        assert!(r.overlap_add(&[]).unwrap().is_empty());
    }

    #[test]
    fn single_segment_passes_through_head() {
        let r = Reconstructor::new(0.0).unwrap();
        let out = r
            .overlap_add(&[seg(0, vec![0.5; 100], 0, 100)])
            .unwrap();
        assert_eq!(out.len(), 100);
        // The head is untouched; only the tail fade modifies samples.
        assert!(out[..80].iter().all(|&v| v == 0.5));
        assert!(out[99].abs() < 1e-6);
    }

    #[test]
    fn two_segments_cover_full_length() {
        let r = Reconstructor::new(0.5).unwrap();
        let segments = vec![
            seg(0, vec![1.0; 8], 0, 8),
            seg(1, vec![1.0; 8], 4, 12),
        ];
        let out = r.overlap_add(&segments).unwrap();
        assert_eq!(out.len(), 12);
        // Crossfading two equal signals keeps the level.
        assert!((out[5] - 1.0).abs() < 0.01);
    }

    #[test]
    fn near_full_overlap_rounds_down() {
        let r = Reconstructor::new(0.999).unwrap();
        let segments = vec![seg(0, vec![0.0; 2], 0, 2)];
        // 2 * 0.999 rounds to an overlap of 1, leaving hop 1.
        assert!(r.overlap_add(&segments).is_ok());
    }
}
