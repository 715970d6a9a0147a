//! Phase-accumulator oscillators with PolyBLEP antialiasing.

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::interpolator::Interpolator;
use super::math::{inv_power2, lerp_int, midi_to_frequency, mix, power2, remap, tunable_sigmoid};
use super::modulation::{modulate_unary, pitch_mod_semitones};
use super::voice::VoiceState;
use crate::params::{ModTarget, OscWave, ParameterSet};

/// Which of the two per-voice oscillators a unit reads its controls from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OscSlot {
    Osc1,
    Osc2,
}

/// Controls of one slot, resolved from the shared parameter set.
#[derive(Debug, Clone, Copy)]
struct OscSettings {
    on: bool,
    wave: OscWave,
    octave: f64,
    pw_mix: f64,
    volume: f64,
    detune_semitones: f64,
    pitch_target: ModTarget,
    pw_target: Option<ModTarget>,
    volume_target: ModTarget,
}

impl OscSlot {
    fn settings(self, params: &ParameterSet) -> OscSettings {
        match self {
            OscSlot::Osc1 => OscSettings {
                on: params.osc1_on,
                wave: params.osc1_wave,
                octave: params.osc1_octave,
                pw_mix: params.osc1_pw_mix,
                volume: params.osc1_volume,
                detune_semitones: 0.0,
                pitch_target: ModTarget::Osc1Pitch,
                pw_target: Some(ModTarget::Osc1PwMix),
                volume_target: ModTarget::Osc1Volume,
            },
            OscSlot::Osc2 => OscSettings {
                on: params.osc2_on,
                wave: params.osc2_wave,
                octave: params.osc2_octave,
                pw_mix: 0.5,
                volume: params.osc2_volume,
                detune_semitones: power2(params.osc2_detune),
                pitch_target: ModTarget::Osc2Pitch,
                pw_target: None,
                volume_target: ModTarget::Osc2Volume,
            },
        }
    }
}

/// Oscillator frequency in Hz. `octave_param` is unary and maps to a whole
/// number of octaves in -2..=2.
pub fn oscillator_frequency(
    note: u8,
    octave_param: f64,
    detune_semitones: f64,
    mod_semitones: f64,
) -> f64 {
    let octave = lerp_int(octave_param, -2, 2) as f64;
    midi_to_frequency(note as f64 + octave * 12.0 + detune_semitones + mod_semitones)
}

/// One band-limited oscillator.
#[derive(Debug, Clone)]
pub struct Oscillator {
    slot: OscSlot,
    phase: f64,
    sample_hold: f64,
    pw_ramp: Interpolator<1>,
    rng: StdRng,
}

impl Oscillator {
    pub fn new(slot: OscSlot) -> Self {
        Oscillator {
            slot,
            phase: 0.0,
            sample_hold: 0.0,
            pw_ramp: Interpolator::new(),
            rng: StdRng::seed_from_u64(0),
        }
    }

    pub fn slot(&self) -> OscSlot {
        self.slot
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Reset oscillator phase and forget the pulse-width ramp.
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.pw_ramp.reset();
    }

    /// Restart the noise source from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Add this oscillator's signal into `buffer`.
    pub fn render(
        &mut self,
        buffer: &mut [f64],
        voice: &VoiceState,
        sample_rate: f64,
        params: &ParameterSet,
    ) {
        let s = self.slot.settings(params);
        if !s.on || buffer.is_empty() {
            return;
        }
        let modulation = &voice.modulation;

        let mod_semitones = pitch_mod_semitones(params, modulation, s.pitch_target);
        let freq = oscillator_frequency(voice.note, s.octave, s.detune_semitones, mod_semitones);
        let inc = freq / sample_rate;

        let pw_mix = modulate_unary(params, modulation, s.pw_mix, s.pw_target);
        let volume = modulate_unary(params, modulation, s.volume, Some(s.volume_target));
        self.pw_ramp.feed([pw_mix], buffer.len());

        for out in buffer.iter_mut() {
            self.phase += inc;
            if self.phase >= 1.0 {
                self.phase -= self.phase.floor();
                self.sample_hold = self.rng.gen_range(0.0..1.0);
            }
            let [pw] = self.pw_ramp.advance();
            let y = match s.wave {
                OscWave::Noise => {
                    let white = self.rng.gen_range(0.0..1.0);
                    mix(white, self.sample_hold, pw) * 2.0 - 1.0
                }
                wave => waveform(wave, self.phase, inc, pw),
            };
            *out += y * volume;
        }
    }
}

/// Band-limited waveform value at `phase` for the pitched shapes.
/// `pw` is the unary pulse-width/mix control.
pub fn waveform(wave: OscWave, phase: f64, inc: f64, pw: f64) -> f64 {
    match wave {
        OscWave::Saw => {
            // Held at -1 up to the breakpoint, then a ramp to +1.
            let bp = inv_power2(pw) * 0.95;
            let naive = if phase < bp { -1.0 } else { remap(phase, bp, 1.0, -1.0, 1.0) };
            naive - poly_blep(phase, inc)
        }
        OscWave::Rect => {
            let bp = 0.5 - pw * 0.4;
            let mut value = if phase < bp { 1.0 } else { -1.0 };
            value += poly_blep_at(phase, inc, 0.0);
            value -= poly_blep_at(phase, inc, bp);
            value
        }
        OscWave::Tri => tunable_sigmoid(4.0 * (phase - 0.5).abs() - 1.0, pw * 0.9),
        OscWave::Sine => tunable_sigmoid((2.0 * PI * phase).sin(), pw * 0.9),
        OscWave::Noise => 0.0,
    }
}

/// PolyBLEP (Polynomial Band-Limited Step) anti-aliasing correction.
///
/// `t` is the phase [0, 1), `dt` is the phase increment per sample.
/// Returns a correction value to subtract from the naive waveform
/// at discontinuities.
fn poly_blep(t: f64, dt: f64) -> f64 {
    if t < dt {
        // Just after the discontinuity
        let t = t / dt;
        2.0 * t - t * t - 1.0
    } else if t > 1.0 - dt {
        // Just before the next discontinuity
        let t = (t - 1.0) / dt;
        t * t + 2.0 * t + 1.0
    } else {
        0.0
    }
}

/// [`poly_blep`] for a discontinuity located at `offset` instead of 0.
fn poly_blep_at(t: f64, dt: f64, offset: f64) -> f64 {
    let shifted = t - offset;
    poly_blep(shifted - shifted.floor(), dt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice_at(note: u8) -> VoiceState {
        VoiceState {
            note,
            ..Default::default()
        }
    }

    fn render(osc: &mut Oscillator, params: &ParameterSet, note: u8, samples: usize) -> Vec<f64> {
        let mut buf = vec![0.0; samples];
        let voice = voice_at(note);
        for chunk in buf.chunks_mut(32) {
            osc.render(chunk, &voice, 48000.0, params);
        }
        buf
    }

    #[test]
    fn frequency_follows_note_octave_and_detune() {
        assert!((oscillator_frequency(69, 0.5, 0.0, 0.0) - 440.0).abs() < 1e-9);
        assert!((oscillator_frequency(69, 1.0, 0.0, 0.0) - 1760.0).abs() < 1e-9);
        assert!((oscillator_frequency(69, 0.0, 0.0, 0.0) - 110.0).abs() < 1e-9);
        // 0.6 rounds to the same octave as 0.5.
        assert!((oscillator_frequency(69, 0.6, 0.0, 0.0) - 440.0).abs() < 1e-9);
        let semitone_up = oscillator_frequency(69, 0.5, 1.0, 0.0);
        assert!((semitone_up - 440.0 * 2f64.powf(1.0 / 12.0)).abs() < 1e-9);
        assert!((oscillator_frequency(57, 0.5, 0.0, 12.0) - 440.0).abs() < 1e-9);
    }

    #[test]
    fn sine_cycle_count_matches_pitch() {
        let params = ParameterSet {
            osc1_wave: OscWave::Sine,
            ..Default::default()
        };
        let mut osc = Oscillator::new(OscSlot::Osc1);
        let buf = render(&mut osc, &params, 69, 48000);
        let rising = buf.windows(2).filter(|w| w[0] < 0.0 && w[1] >= 0.0).count();
        assert!((439..=441).contains(&rising), "expected ~440 cycles, got {rising}");
    }

    #[test]
    fn all_waves_stay_in_range() {
        for &wave in OscWave::ALL {
            for pw in [0.0, 0.5, 1.0] {
                let params = ParameterSet {
                    osc1_wave: wave,
                    osc1_pw_mix: pw,
                    ..Default::default()
                };
                let mut osc = Oscillator::new(OscSlot::Osc1);
                osc.reseed(7);
                for s in render(&mut osc, &params, 84, 4800) {
                    assert!(s.is_finite() && s.abs() <= 2.0, "{wave:?} pw {pw}: {s}");
                }
            }
        }
    }

    #[test]
    fn disabled_oscillator_adds_nothing() {
        let params = ParameterSet::default();
        let mut osc = Oscillator::new(OscSlot::Osc2);
        assert!(!params.osc2_on);
        let mut buf = vec![0.25; 64];
        osc.render(&mut buf, &voice_at(60), 48000.0, &params);
        assert!(buf.iter().all(|&s| s == 0.25));
    }

    #[test]
    fn render_is_additive() {
        let params = ParameterSet {
            osc1_wave: OscWave::Tri,
            ..Default::default()
        };
        let mut a = Oscillator::new(OscSlot::Osc1);
        let mut b = Oscillator::new(OscSlot::Osc1);
        let mut dry = vec![0.0; 32];
        let mut offset = vec![0.5; 32];
        a.render(&mut dry, &voice_at(60), 48000.0, &params);
        b.render(&mut offset, &voice_at(60), 48000.0, &params);
        for (d, o) in dry.iter().zip(&offset) {
            assert!((o - d - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn volume_scales_output() {
        let params = ParameterSet {
            osc1_wave: OscWave::Rect,
            osc1_volume: 0.25,
            ..Default::default()
        };
        let mut osc = Oscillator::new(OscSlot::Osc1);
        let peak = render(&mut osc, &params, 48, 4800)
            .iter()
            .fold(0.0f64, |m, s| m.max(s.abs()));
        assert!(peak <= 0.25 * 1.01 && peak > 0.2, "peak {peak}");
    }

    #[test]
    fn white_noise_spans_both_polarities() {
        let params = ParameterSet {
            osc1_wave: OscWave::Noise,
            ..Default::default()
        };
        let mut osc = Oscillator::new(OscSlot::Osc1);
        osc.reseed(42);
        let buf = render(&mut osc, &params, 60, 4096);
        assert!(buf.iter().all(|s| (-1.0..=1.0).contains(s)));
        assert!(buf.iter().any(|&s| s > 0.5) && buf.iter().any(|&s| s < -0.5));
    }

    #[test]
    fn reset_restarts_phase() {
        let params = ParameterSet {
            osc1_wave: OscWave::Sine,
            ..Default::default()
        };
        let mut osc = Oscillator::new(OscSlot::Osc1);
        let first = render(&mut osc, &params, 60, 100);
        osc.reset();
        let again = render(&mut osc, &params, 60, 100);
        assert_eq!(first, again);
    }

    #[test]
    fn poly_blep_is_zero_away_from_edges() {
        assert_eq!(poly_blep(0.5, 0.01), 0.0);
        assert!((poly_blep(0.0, 0.01) + 1.0).abs() < 1e-12);
        assert!(poly_blep_at(0.3, 0.01, 0.3).abs() > 0.5);
    }
}
