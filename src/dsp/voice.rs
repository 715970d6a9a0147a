//! One note slot: two oscillators into a resonant filter, gated by the
//! amp envelope, with a mod envelope and LFO feeding the modulation router.

use super::envelope::{EnvelopeGenerator, EnvelopeKind, click_suppressing_gain};
use super::filter::{ResonantFilter, normalized_cutoff};
use super::lfo::Lfo;
use super::math::{clamp01, power2};
use super::modulation::{ModulationSnapshot, modulate_unary};
use super::oscillator::{OscSlot, Oscillator};
use crate::params::{ModTarget, ParameterSet};

/// Mutable per-voice state. Uptimes are in seconds and only the one matching
/// the current gate advances.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoiceState {
    pub note: u8,
    pub gate_on: bool,
    pub gate_on_uptime: f64,
    pub gate_off_uptime: f64,
    pub random_seed: u64,
    /// Modulation sources as of the last rendered chunk.
    pub modulation: ModulationSnapshot,
}

#[derive(Debug, Clone)]
pub struct Voice {
    state: VoiceState,
    sample_rate: f64,
    osc1: Oscillator,
    osc2: Oscillator,
    filter: ResonantFilter,
    amp_eg: EnvelopeGenerator,
    mod_eg: EnvelopeGenerator,
    lfo: Lfo,
    scratch: Vec<f64>,
}

impl Default for Voice {
    fn default() -> Self {
        Self::new()
    }
}

impl Voice {
    pub fn new() -> Self {
        Voice {
            state: VoiceState {
                note: 60,
                ..Default::default()
            },
            sample_rate: 0.0,
            osc1: Oscillator::new(OscSlot::Osc1),
            osc2: Oscillator::new(OscSlot::Osc2),
            filter: ResonantFilter::new(),
            amp_eg: EnvelopeGenerator::new(EnvelopeKind::Amp),
            mod_eg: EnvelopeGenerator::new(EnvelopeKind::Mod),
            lfo: Lfo::new(),
            scratch: Vec::new(),
        }
    }

    /// Set the sample rate and size the scratch buffer for chunks of up to
    /// `max_chunk` frames. Allocates; call outside the render path.
    pub fn prepare(&mut self, sample_rate: f64, max_chunk: usize) {
        self.sample_rate = sample_rate;
        self.filter.set_sample_rate(sample_rate);
        self.scratch.clear();
        self.scratch.resize(max_chunk, 0.0);
    }

    pub fn state(&self) -> &VoiceState {
        &self.state
    }

    pub fn is_prepared(&self) -> bool {
        self.sample_rate > 0.0
    }

    /// Start a note. Envelopes restart implicitly because their level is a
    /// function of the zeroed gate-on uptime.
    pub fn note_on(&mut self, note: u8, seed: u64) {
        self.state.note = note;
        self.state.gate_on = true;
        self.state.gate_on_uptime = 0.0;
        self.state.gate_off_uptime = 0.0;
        self.state.random_seed = seed;
        self.osc1.reset();
        self.osc2.reset();
        self.osc1.reseed(seed);
        self.osc2.reseed(seed.rotate_left(21) ^ 0x9e37_79b9_7f4a_7c15);
        self.filter.reset();
        self.lfo.reset();
        self.lfo.reseed(seed.rotate_left(42));
    }

    /// Release the note. A voice that is already released keeps its release
    /// position.
    pub fn note_off(&mut self) {
        if !self.state.gate_on {
            return;
        }
        self.state.gate_on = false;
        self.state.gate_off_uptime = 0.0;
    }

    /// Render one chunk and add it into `out`. `out` must not be longer than
    /// the chunk size passed to [`prepare`](Self::prepare).
    pub fn render(&mut self, params: &ParameterSet, out: &mut [f64]) {
        if !self.is_prepared() {
            return;
        }
        let len = out.len().min(self.scratch.len());

        self.state.modulation = ModulationSnapshot {
            amp_eg_level: self.amp_eg.advance(params, &self.state),
            click_suppressing_gain: click_suppressing_gain(&self.state),
            mod_eg_level: self.mod_eg.advance(params, &self.state),
            lfo_output: self.lfo.advance(params, self.sample_rate, len),
        };
        let modulation = self.state.modulation;

        let amp_mod = 2.0 * modulate_unary(params, &modulation, 0.5, Some(ModTarget::AmpVolume));
        let gain = modulation.amp_eg_level * modulation.click_suppressing_gain * amp_mod;

        // Render at zero gain too: oscillator phase and filter state stay continuous.
        let buffer = &mut self.scratch[..len];
        buffer.fill(0.0);
        self.osc1.render(buffer, &self.state, self.sample_rate, params);
        self.osc2.render(buffer, &self.state, self.sample_rate, params);
        for s in buffer.iter_mut() {
            *s *= 0.5;
        }

        if params.filter_on {
            let mut cutoff = modulate_unary(
                params,
                &modulation,
                params.filter_cutoff,
                Some(ModTarget::FilterCutoff),
            );
            if params.eg_on {
                cutoff = clamp01(cutoff + power2(params.filter_env_mod) * modulation.mod_eg_level);
            }
            let normalized = normalized_cutoff(self.state.note, cutoff, self.sample_rate);
            self.filter.process(buffer, normalized, cutoff, params.filter_peak);
        }

        for (o, s) in out[..len].iter_mut().zip(buffer.iter()) {
            *o += s * gain;
        }

        let elapsed = len as f64 / self.sample_rate;
        if self.state.gate_on {
            self.state.gate_on_uptime += elapsed;
        } else {
            self.state.gate_off_uptime += elapsed;
        }
    }
}
