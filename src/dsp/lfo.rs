//! Free-running low-frequency oscillator, advanced once per render chunk.

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::math::lerp;
use crate::params::{LfoWave, ParameterSet};

/// LFO rate in Hz for a unary rate control.
pub fn lfo_frequency(rate_param: f64) -> f64 {
    lerp(rate_param, 0.01, 10.0)
}

/// Bipolar value of a periodic LFO shape at `phase`.
pub fn lfo_waveform(wave: LfoWave, phase: f64) -> f64 {
    match wave {
        LfoWave::Sine => (phase * 2.0 * PI).sin(),
        LfoWave::Tri => {
            if phase < 0.5 {
                2.0 * phase - 1.0
            } else {
                2.0 * (1.0 - phase) - 1.0
            }
        }
        LfoWave::Rect => {
            if phase < 0.5 {
                1.0
            } else {
                -1.0
            }
        }
        LfoWave::Saw => (1.0 - phase) * 2.0 - 1.0,
        LfoWave::SampleHold => 0.0,
    }
}

#[derive(Debug, Clone)]
pub struct Lfo {
    phase: f64,
    sample_hold: f64,
    rng: StdRng,
}

impl Default for Lfo {
    fn default() -> Self {
        Self::new()
    }
}

impl Lfo {
    pub fn new() -> Self {
        Lfo {
            phase: 0.0,
            sample_hold: 0.0,
            rng: StdRng::seed_from_u64(0),
        }
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Step the phase by `frames` samples worth of time and return the new output.
    pub fn advance(&mut self, params: &ParameterSet, sample_rate: f64, frames: usize) -> f64 {
        self.phase += lfo_frequency(params.lfo_rate) / sample_rate * frames as f64;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
            self.sample_hold = self.rng.gen_range(-1.0..1.0);
        }
        match params.lfo_wave {
            LfoWave::SampleHold => self.sample_hold,
            wave => lfo_waveform(wave, self.phase),
        }
    }
}
