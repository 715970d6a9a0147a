//! Resonant lowpass: a cookbook biquad with an external soft-clipped feedback
//! path that gives the filter its squelch at high peak / low cutoff.

use std::f64::consts::PI;

use super::interpolator::Interpolator;
use super::math::{inv_power2, lerp, midi_to_frequency, soft_clip_at};

const MIN_Q: f64 = 0.5;
const MAX_Q: f64 = 20.0;
const MIN_NORMALIZED_CUTOFF: f64 = 0.0001;
const MAX_NORMALIZED_CUTOFF: f64 = 0.49;
const FEEDBACK_HIGHPASS_HZ: f64 = 40.0;
const CLIP_AMPLITUDE: f64 = 2.0;

/// Cutoff as a fraction of the sample rate. The unary cutoff sweeps from six
/// semitones below the played note up to MIDI note 124.
pub fn normalized_cutoff(note: u8, cutoff_param: f64, sample_rate: f64) -> f64 {
    let pitch = lerp(inv_power2(cutoff_param), note as f64 - 6.0, 124.0);
    (midi_to_frequency(pitch) / sample_rate).clamp(MIN_NORMALIZED_CUTOFF, MAX_NORMALIZED_CUTOFF)
}

/// Q for a unary peak control.
pub fn resonance_q(peak_param: f64) -> f64 {
    (MIN_Q + peak_param * 0.4 * (MAX_Q - MIN_Q)).clamp(MIN_Q, MAX_Q)
}

/// Normalized (a0 = 1) biquad coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoefficients {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoefficients {
    /// Lowpass from the Audio EQ Cookbook (Robert Bristow-Johnson).
    pub fn lowpass(normalized_cutoff: f64, q: f64) -> Self {
        let freq = normalized_cutoff.clamp(MIN_NORMALIZED_CUTOFF, MAX_NORMALIZED_CUTOFF);
        let w0 = 2.0 * PI * freq;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);

        let b1 = 1.0 - cos_w0;
        let b0 = b1 / 2.0;
        let b2 = b0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha;

        // Normalize by a0
        BiquadCoefficients {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Both poles strictly inside the unit circle.
    pub fn is_stable(&self) -> bool {
        self.a2.abs() < 1.0 && self.a1.abs() < 1.0 + self.a2
    }
}

/// Fixed-cutoff one-pole highpass used to keep DC out of the feedback loop.
#[derive(Debug, Clone)]
pub struct OnePoleHighpass {
    cutoff_hz: f64,
    a1: f64,
    b0: f64,
    b1: f64,
    x1: f64,
    y1: f64,
    prepared: bool,
}

impl OnePoleHighpass {
    pub fn new(cutoff_hz: f64) -> Self {
        OnePoleHighpass {
            cutoff_hz,
            a1: 0.0,
            b0: 1.0,
            b1: 0.0,
            x1: 0.0,
            y1: 0.0,
            prepared: false,
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.a1 = (-2.0 * PI * self.cutoff_hz / sample_rate).exp();
        self.b0 = 0.5 * (1.0 + self.a1);
        self.b1 = -self.b0;
        self.prepared = true;
    }

    pub fn process(&mut self, x: f64) -> f64 {
        if !self.prepared {
            return x;
        }
        // The tiny offset keeps the recursion out of denormals.
        self.y1 = self.b0 * x + self.b1 * self.x1 + self.a1 * self.y1 + 1e-32;
        self.x1 = x;
        self.y1
    }

    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.y1 = 0.0;
    }
}

/// Per-voice resonant lowpass.
///
/// Direct Form II biquad. Before each input sample enters the biquad, the
/// previous (soft-clipped) output is clipped again, highpassed and subtracted,
/// scaled by `peak * (1 - cutoff) * 0.9`. Coefficients and controls ramp
/// linearly across each processed block.
#[derive(Debug, Clone)]
pub struct ResonantFilter {
    z1: f64,
    z2: f64,
    feedback_y: f64,
    ramp: Interpolator<7>,
    highpass: OnePoleHighpass,
}

impl Default for ResonantFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResonantFilter {
    pub fn new() -> Self {
        ResonantFilter {
            z1: 0.0,
            z2: 0.0,
            feedback_y: 0.0,
            ramp: Interpolator::new(),
            highpass: OnePoleHighpass::new(FEEDBACK_HIGHPASS_HZ),
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.highpass.set_sample_rate(sample_rate);
    }

    /// Zero the biquad, feedback and ramp state.
    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
        self.feedback_y = 0.0;
        self.ramp.reset();
        self.highpass.reset();
    }

    /// Filter `buffer` in place.
    pub fn process(
        &mut self,
        buffer: &mut [f64],
        normalized_cutoff: f64,
        cutoff_param: f64,
        peak_param: f64,
    ) {
        if buffer.is_empty() {
            return;
        }
        let c = BiquadCoefficients::lowpass(normalized_cutoff, resonance_q(peak_param));
        let peak = peak_param * 0.4;
        self.ramp
            .feed([cutoff_param, peak, c.b0, c.b1, c.b2, c.a1, c.a2], buffer.len());

        for sample in buffer.iter_mut() {
            let [cutoff, peak, b0, b1, b2, a1, a2] = self.ramp.advance();

            let feedback_amount = peak * (1.0 - cutoff) * 0.9;
            let feedback = self
                .highpass
                .process(soft_clip_at(self.feedback_y, CLIP_AMPLITUDE) * feedback_amount);

            let w = (*sample - feedback) - a1 * self.z1 - a2 * self.z2;
            let y = b0 * w + b1 * self.z1 + b2 * self.z2;
            self.z2 = self.z1;
            self.z1 = w;

            let y = soft_clip_at(y, CLIP_AMPLITUDE);
            self.feedback_y = y;
            *sample = y;
        }
    }
}
