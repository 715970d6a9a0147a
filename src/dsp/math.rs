//! Numeric helpers shared by the synthesis units.

use std::f64::consts::{PI, SQRT_2};

pub fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Map a unary value in [0, 1] onto `lo..hi`.
pub fn lerp(value: f64, lo: f64, hi: f64) -> f64 {
    value * (hi - lo) + lo
}

/// Map a unary value onto the integer range `lo..=hi`.
pub fn lerp_int(value: f64, lo: i32, hi: i32) -> i32 {
    lo + (value * (hi - lo) as f64).round() as i32
}

/// Inverse of [`lerp`]. Returns `lo` for an empty range.
pub fn unlerp(value: f64, lo: f64, hi: f64) -> f64 {
    if hi == lo {
        return lo;
    }
    (value - lo) / (hi - lo)
}

/// Linear remap of `value` from `s0..s1` onto `d0..d1`.
pub fn remap(value: f64, s0: f64, s1: f64, d0: f64, d1: f64) -> f64 {
    (value - s0) / (s1 - s0) * (d1 - d0) + d0
}

pub fn mix(a: f64, b: f64, amount: f64) -> f64 {
    (1.0 - amount) * a + amount * b
}

pub fn power2(x: f64) -> f64 {
    x * x
}

pub fn power3(x: f64) -> f64 {
    x * x * x
}

/// Ease-out square: `1 - (1 - x)^2`.
pub fn inv_power2(x: f64) -> f64 {
    1.0 - (1.0 - x) * (1.0 - x)
}

/// Sigmoid shaper for `x` in [-1, 1]. Positive `k` bends toward zero,
/// negative `k` toward the rails, `k = 0` is identity.
pub fn tunable_sigmoid(x: f64, k: f64) -> f64 {
    (x - k * x) / (k - 2.0 * k * x.abs() + 1.0)
}

/// Cubic soft clip with the input clamped to ±√2 (output within ±0.943).
pub fn soft_clip(x: f64) -> f64 {
    let x = x.clamp(-SQRT_2, SQRT_2);
    x - x * x * x / 6.0
}

/// [`soft_clip`] scaled so the knee sits around `amplitude`.
pub fn soft_clip_at(x: f64, amplitude: f64) -> f64 {
    soft_clip(x / amplitude) * amplitude
}

/// Exponential segment curve: 0 → 0, 1 → 1, steeper with larger `scaler`.
pub fn exp_curve(x: f64, scaler: f64) -> f64 {
    ((x * scaler).exp2() - 1.0) / (scaler.exp2() - 1.0)
}

/// Mirror of [`exp_curve`]: fast start, slow finish.
pub fn inv_exp_curve(x: f64, scaler: f64) -> f64 {
    1.0 - exp_curve(1.0 - x, scaler)
}

/// Raised half cosine rising from 0 at `x = 0` to 1 at `x = 1`.
pub fn rise_inv_cosine(x: f64) -> f64 {
    0.5 - 0.5 * (x * PI).cos()
}

/// Equal-tempered pitch with A4 (MIDI 69) at 440 Hz. Fractional notes allowed.
pub fn midi_to_frequency(note: f64) -> f64 {
    440.0 * ((note - 69.0) / 12.0).exp2()
}
