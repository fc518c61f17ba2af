//! Level management: per-segment AGC and final output normalization.

use clearwave_audio::sample;

/// Cleans up a processed segment in place: non-finite samples become
/// silence, everything is clamped to [-1, 1], and quiet-but-not-silent
/// segments get a bounded gain boost.
pub fn apply_agc(data: &mut [f32]) {
    for s in data.iter_mut() {
        *s = if s.is_finite() { s.clamp(-1.0, 1.0) } else { 0.0 };
    }

    let max = sample::peak(data);
    if max < 0.3 && max > 0.001 {
        let gain = (1.0 / max).clamp(3.0, 10.0);
        for s in data.iter_mut() {
            *s = (*s * gain).clamp(-1.0, 1.0);
        }
    }
}

/// Brings a quiet final mix up to a usable level. Gain is chosen from
/// the RMS target, bounded by the peak headroom, and clamped so a
/// near-silent recording is not blown up into noise.
pub fn normalize_output(data: &mut [f32]) {
    if data.is_empty() {
        return;
    }

    let rms = sample::rms(data);
    let peak = sample::peak(data);

    if rms < 0.1 && peak > 0.001 {
        let rms_gain = 0.2 / rms;
        let peak_gain = if peak > 0.0 { 0.95 / peak } else { 1.0 };
        let gain = rms_gain.min(peak_gain).clamp(1.5, 8.0);

        tracing::debug!(rms, peak, gain, "normalizing output");

        for s in data.iter_mut() {
            *s = (*s * gain).clamp(-1.0, 1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agc_replaces_non_finite() {
        let mut data = vec![f32::NAN, f32::INFINITY, 0.5, -2.0];
        apply_agc(&mut data);
        assert_eq!(data[0], 0.0);
        assert_eq!(data[1], 0.0);
        assert!(data.iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn agc_boosts_quiet_segment() {
        let mut data = vec![0.05, -0.05, 0.02];
        apply_agc(&mut data);
        assert!(data[0] > 0.1, "expected boost, got {}", data[0]);
    }

    #[test]
    fn agc_leaves_loud_segment_alone() {
        let mut data = vec![0.8, -0.7];
        apply_agc(&mut data);
        assert_eq!(data, vec![0.8, -0.7]);
    }

    #[test]
    fn normalize_boosts_quiet_mix() {
        let mut data = vec![0.01f32; 1000];
        let before = sample::rms(&data);
        normalize_output(&mut data);
        assert!(sample::rms(&data) > before);
    }

    #[test]
    fn normalize_skips_loud_mix() {
        let mut data = vec![0.5f32; 100];
        normalize_output(&mut data);
        assert_eq!(data, vec![0.5f32; 100]);
    }

    #[test]
    fn normalize_skips_silence() {
        let mut data = vec![0.0f32; 100];
        normalize_output(&mut data);
        assert!(data.iter().all(|&v| v == 0.0));
    }
}
