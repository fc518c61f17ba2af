//! Overlapping audio segmentation.

use crate::error::{DenoiseError, Result};

/// A slice of the input signal, tagged with its position.
#[derive(Debug, Clone)]
pub struct Segment {
    pub index: usize,
    pub samples: Vec<f32>,
    /// Start offset in the full signal, in samples.
    pub start: usize,
    /// End offset (exclusive) in the full signal.
    pub end: usize,
    /// False for the trailing partial segment.
    pub complete: bool,
}

impl Segment {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Splits a signal into fixed-size segments with a configurable overlap.
#[derive(Debug, Clone)]
pub struct Segmenter {
    segment_size: usize,
    hop: usize,
}

impl Segmenter {
    pub fn new(segment_size: usize, overlap_ratio: f32) -> Result<Self> {
        if segment_size == 0 {
            return Err(DenoiseError::Config("segment size must be nonzero".into()));
        }
        if !(0.0..1.0).contains(&overlap_ratio) {
            return Err(DenoiseError::Config(
                "overlap ratio must be in [0.0, 1.0)".into(),
            ));
        }
        let hop = (segment_size as f32 * (1.0 - overlap_ratio)) as usize;
        if hop == 0 {
            return Err(DenoiseError::Config("hop size rounds to zero".into()));
        }
        Ok(Self { segment_size, hop })
    }

    pub fn segment_size(&self) -> usize {
        self.segment_size
    }

    pub fn hop(&self) -> usize {
        self.hop
    }

    /// Splits the signal. The final segment may be shorter than the
    /// segment size and is marked incomplete.
    pub fn split(&self, samples: &[f32]) -> Vec<Segment> {
        let mut segments = Vec::new();
        for (index, start) in (0..samples.len()).step_by(self.hop).enumerate() {
            let end = (start + self.segment_size).min(samples.len());
            segments.push(Segment {
                index,
                samples: samples[start..end].to_vec(),
                start,
                end,
                complete: end - start == self.segment_size,
            });
        }
        segments
    }
}

/// Zero-pads or truncates to an exact length.
pub fn pad_to(samples: &[f32], len: usize) -> Vec<f32> {
    let mut out = vec![0.0; len];
    let n = samples.len().min(len);
    out[..n].copy_from_slice(&samples[..n]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_degenerate_parameters() {
        assert!(Segmenter::new(0, 0.1).is_err());
        assert!(Segmenter::new(4, 1.0).is_err());
        assert!(Segmenter::new(1, 0.5).is_err());
    }

    #[test]
    fn split_with_overlap() {
        let seg = Segmenter::new(4, 0.5).unwrap();
        assert_eq!(seg.hop(), 2);

        let samples = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let segments = seg.split(&samples);

        assert_eq!(segments[0].samples, vec![1.0, 2.0, 3.0, 4.0]);
        assert!(segments[0].complete);
        assert_eq!(segments[1].start, 2);
        assert_eq!(segments[1].samples, vec![3.0, 4.0, 5.0, 6.0]);

        let last = segments.last().unwrap();
        assert!(!last.complete);
        assert_eq!(last.end, 7);
    }

    #[test]
    fn split_without_overlap() {
        let seg = Segmenter::new(4, 0.0).unwrap();
        let segments = seg.split(&[0.0; 8]);
        assert_eq!(segments.len(), 2);
        assert!(segments.iter().all(|s| s.complete));
    }

    #[test]
    fn split_empty_signal() {
        let seg = Segmenter::new(4, 0.1).unwrap();
        assert!(seg.split(&[]).is_empty());
    }

    #[test]
    fn pad_to_length() {
        assert_eq!(pad_to(&[1.0, 2.0], 4), vec![1.0, 2.0, 0.0, 0.0]);
        assert_eq!(pad_to(&[1.0, 2.0, 3.0], 2), vec![1.0, 2.0]);
    }
}
