//! Sample-level utilities for f32 audio in [-1, 1].

/// Converts PCM16 samples to f32.
pub fn i16_to_f32(pcm: &[i16]) -> Vec<f32> {
    pcm.iter().map(|&v| v as f32 / 32768.0).collect()
}

/// Converts f32 samples to PCM16, clamping out-of-range values.
pub fn f32_to_i16(samples: &[f32]) -> Vec<i16> {
    samples.iter().map(|&v| f32_to_i16_one(v)).collect()
}

pub(crate) fn f32_to_i16_one(v: f32) -> i16 {
    (v * 32767.0).clamp(-32768.0, 32767.0) as i16
}

/// Root-mean-square level of a signal.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|&v| v * v).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Largest absolute sample value.
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().map(|v| v.abs()).fold(0.0, f32::max)
}

/// True when the peak stays under the threshold.
pub fn is_silent(samples: &[f32], threshold: f32) -> bool {
    peak(samples) < threshold
}

/// Applies a gain given in decibels, in place.
pub fn apply_gain_db(samples: &mut [f32], gain_db: f32) {
    let gain = 10.0_f32.powf(gain_db / 20.0);
    for s in samples.iter_mut() {
        *s *= gain;
    }
}

/// Scales the signal so its peak hits 1.0. Silence is left untouched.
pub fn normalize_peak(samples: &mut [f32]) {
    let p = peak(samples);
    if p > 0.0 {
        for s in samples.iter_mut() {
            *s /= p;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn i16_conversion_bounds() {
        let f = i16_to_f32(&[i16::MIN, 0, i16::MAX]);
        assert_eq!(f[0], -1.0);
        assert_eq!(f[1], 0.0);
        assert!((f[2] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn f32_conversion_clamps() {
        let pcm = f32_to_i16(&[2.0, -2.0, 0.0]);
        assert_eq!(pcm[0], 32767);
        assert_eq!(pcm[1], -32767);
        assert_eq!(pcm[2], 0);
    }

    #[test]
    fn rms_and_peak() {
        let s = [0.5, -0.5, 0.8, -0.8];
        let expected = ((0.25f32 + 0.25 + 0.64 + 0.64) / 4.0).sqrt();
        assert!((rms(&s) - expected).abs() < 1e-6);
        assert_eq!(peak(&s), 0.8);
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn silence_detection() {
        assert!(is_silent(&[0.0, 0.001, -0.002], 0.01));
        assert!(!is_silent(&[0.0, 0.5], 0.01));
    }

    #[test]
    fn gain_six_db_doubles() {
        let mut s = [0.25, -0.25];
        apply_gain_db(&mut s, 6.0);
        assert!((s[0] - 0.499).abs() < 0.01);
        assert!((s[1] + 0.499).abs() < 0.01);
    }

    #[test]
    fn normalize_reaches_unity_peak() {
        let mut s = [0.5, -1.0, 0.8].to_vec();
        normalize_peak(&mut s);
        assert!((peak(&s) - 1.0).abs() < 1e-6);

        let mut silent = vec![0.0; 4];
        normalize_peak(&mut silent);
        assert!(silent.iter().all(|&v| v == 0.0));
    }
}
