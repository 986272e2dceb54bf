//! Loudness measurement and gain adjustment
//!
//! Loudness is measured as RMS level in dBFS over the whole sample
//! buffer: `20 * log10(rms / full_scale)`. Normalization applies a single
//! uniform gain so the measured level matches a target, scaling every
//! sample linearly by `10^(gain/20)` with clamping at the i16 range.

/// Full scale amplitude for signed 16-bit samples
const FULL_SCALE: f64 = 32768.0;

/// Measure the RMS level of a sample buffer in dBFS.
///
/// Returns negative infinity for an empty or all-zero buffer, which has
/// no measurable level.
pub fn dbfs(samples: &[i16]) -> f64 {
    if samples.is_empty() {
        return f64::NEG_INFINITY;
    }

    let sum_squares: f64 = samples
        .iter()
        .map(|&s| {
            let v = s as f64;
            v * v
        })
        .sum();
    let rms = (sum_squares / samples.len() as f64).sqrt();

    if rms <= 0.0 {
        f64::NEG_INFINITY
    } else {
        20.0 * (rms / FULL_SCALE).log10()
    }
}

/// Apply a uniform gain in dB to every sample, clamping at full scale
pub fn apply_gain(samples: &mut [i16], gain_db: f64) {
    let scale = 10f64.powf(gain_db / 20.0);
    for sample in samples.iter_mut() {
        let scaled = (*sample as f64 * scale).round();
        *sample = scaled.clamp(i16::MIN as f64, i16::MAX as f64) as i16;
    }
}
