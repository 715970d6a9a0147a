//! Curve-shaped envelope generators.
//!
//! Levels are a pure function of the voice's gate state: while the gate is on
//! the attack/decay/sustain shape is evaluated at `gate_on_uptime`; once it is
//! off the release segment is evaluated at `gate_off_uptime`, starting from the
//! last level reached while gated. There is no idle stage; a voice that was
//! never triggered simply sits at the end of its release.

use super::math::{clamp01, inv_exp_curve, lerp, power2, rise_inv_cosine, unlerp};
use super::voice::VoiceState;
use crate::params::ParameterSet;

/// Longest attack, decay and release in seconds (at a control value of 1).
pub const MAX_SEGMENT_SECONDS: f64 = 3.0;

/// Length of the anti-click fade-in applied after note-on.
pub const CLICK_SUPPRESS_SECONDS: f64 = 0.002;

const CURVE_PARAM: f64 = 0.5;

/// Segment times in seconds plus the sustain level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeShape {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,
}

impl EnvelopeShape {
    /// Map unary controls to times; each time grows with the square of its control.
    pub fn from_controls(attack: f64, decay: f64, sustain: f64, release: f64) -> Self {
        EnvelopeShape {
            attack: power2(attack) * MAX_SEGMENT_SECONDS,
            decay: power2(decay) * MAX_SEGMENT_SECONDS,
            sustain: clamp01(sustain),
            release: power2(release) * MAX_SEGMENT_SECONDS,
        }
    }
}

/// Interpolate a segment from `from` to `to` through the inverse exponential ease.
fn segment(u: f64, from: f64, to: f64) -> f64 {
    let scaler = 1.0 + power2(CURVE_PARAM) * 32.0;
    lerp(inv_exp_curve(u, scaler), from, to)
}

/// Level while the gate is held, `t` seconds after note-on.
pub fn gate_on_level(t: f64, shape: &EnvelopeShape) -> f64 {
    if t < shape.attack {
        segment(t / shape.attack, 0.0, 1.0)
    } else if t < shape.attack + shape.decay {
        segment(unlerp(t, shape.attack, shape.attack + shape.decay), 1.0, shape.sustain)
    } else {
        shape.sustain
    }
}

/// Level `t` seconds after note-off, releasing from `from_level`.
pub fn gate_off_level(t: f64, shape: &EnvelopeShape, from_level: f64) -> f64 {
    if t < shape.release {
        segment(t / shape.release, from_level, 0.0)
    } else {
        0.0
    }
}

/// Short raised-cosine fade-in over the first 2 ms of a note.
pub fn click_suppressing_gain(voice: &VoiceState) -> f64 {
    if voice.gate_on && voice.gate_on_uptime < CLICK_SUPPRESS_SECONDS {
        rise_inv_cosine(clamp01(voice.gate_on_uptime / CLICK_SUPPRESS_SECONDS))
    } else {
        1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeKind {
    /// Full ADSR, gates the voice output.
    Amp,
    /// Attack/decay only; sustain is 0 and release reuses the decay time.
    Mod,
}

/// One envelope generator. Holds only the level reached while gated, which
/// seeds the release segment.
#[derive(Debug, Clone)]
pub struct EnvelopeGenerator {
    kind: EnvelopeKind,
    gate_on_latest_level: f64,
}

impl EnvelopeGenerator {
    pub fn new(kind: EnvelopeKind) -> Self {
        EnvelopeGenerator {
            kind,
            gate_on_latest_level: 0.0,
        }
    }

    pub fn kind(&self) -> EnvelopeKind {
        self.kind
    }

    fn enabled_and_shape(&self, params: &ParameterSet) -> (bool, EnvelopeShape) {
        match self.kind {
            EnvelopeKind::Amp => (
                params.amp_on,
                EnvelopeShape::from_controls(
                    params.amp_attack,
                    params.amp_decay,
                    params.amp_sustain,
                    params.amp_release,
                ),
            ),
            EnvelopeKind::Mod => (
                params.eg_on,
                EnvelopeShape::from_controls(
                    params.eg_attack,
                    params.eg_decay,
                    0.0,
                    params.eg_decay,
                ),
            ),
        }
    }

    /// Evaluate the level for the voice's current gate state.
    ///
    /// A disabled envelope acts as a plain gate: 1 while held, 0 otherwise.
    pub fn advance(&mut self, params: &ParameterSet, voice: &VoiceState) -> f64 {
        let (enabled, shape) = self.enabled_and_shape(params);
        let level = if !enabled {
            if voice.gate_on { 1.0 } else { 0.0 }
        } else if voice.gate_on {
            gate_on_level(voice.gate_on_uptime, &shape)
        } else {
            gate_off_level(voice.gate_off_uptime, &shape, self.gate_on_latest_level)
        };
        if voice.gate_on {
            self.gate_on_latest_level = level;
        }
        level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gated(on: bool, uptime: f64) -> VoiceState {
        VoiceState {
            gate_on: on,
            gate_on_uptime: if on { uptime } else { 0.0 },
            gate_off_uptime: if on { 0.0 } else { uptime },
            ..Default::default()
        }
    }

    fn amp_params(a: f64, d: f64, s: f64, r: f64) -> ParameterSet {
        ParameterSet {
            amp_attack: a,
            amp_decay: d,
            amp_sustain: s,
            amp_release: r,
            ..Default::default()
        }
    }

    #[test]
    fn starts_at_zero_and_settles_at_sustain() {
        let params = amp_params(0.3, 0.4, 0.6, 0.5);
        let shape = EnvelopeShape::from_controls(0.3, 0.4, 0.6, 0.5);
        let mut env = EnvelopeGenerator::new(EnvelopeKind::Amp);

        assert!(env.advance(&params, &gated(true, 0.0)).abs() < 1e-12);
        let settled = env.advance(&params, &gated(true, shape.attack + shape.decay + 1e-6));
        assert!((settled - 0.6).abs() < 1e-9, "Should sustain at 0.6, got {settled}");
    }

    #[test]
    fn attack_reaches_one() {
        let shape = EnvelopeShape::from_controls(0.2, 0.5, 0.3, 0.0);
        let peak = gate_on_level(shape.attack, &shape);
        assert!((peak - 1.0).abs() < 1e-9, "Attack should reach 1.0, got {peak}");
        let early = gate_on_level(shape.attack * 0.5, &shape);
        assert!(early > 0.5 && early < 1.0, "ease-out attack at half time: {early}");
    }

    #[test]
    fn levels_stay_in_unit_range() {
        let shape = EnvelopeShape::from_controls(0.1, 0.2, 0.5, 0.3);
        for i in 0..4000 {
            let t = i as f64 * 0.0005;
            let on = gate_on_level(t, &shape);
            let off = gate_off_level(t, &shape, 0.5);
            assert!((0.0..=1.0).contains(&on), "Envelope out of range: {on}");
            assert!((0.0..=0.5).contains(&off), "Envelope out of range after release: {off}");
        }
    }

    #[test]
    fn release_starts_from_last_gated_level_and_ends_at_zero() {
        let params = amp_params(0.0, 0.0, 0.7, 0.5);
        let shape = EnvelopeShape::from_controls(0.0, 0.0, 0.7, 0.5);
        let mut env = EnvelopeGenerator::new(EnvelopeKind::Amp);
        assert!((env.advance(&params, &gated(true, 0.5)) - 0.7).abs() < 1e-12);

        let start = env.advance(&params, &gated(false, 0.0));
        assert!((start - 0.7).abs() < 1e-12, "release should start at 0.7, got {start}");
        let end = env.advance(&params, &gated(false, shape.release));
        assert_eq!(end, 0.0);
    }

    #[test]
    fn zero_times_jump_straight_to_sustain() {
        let shape = EnvelopeShape::from_controls(0.0, 0.0, 0.4, 0.0);
        assert_eq!(gate_on_level(0.0, &shape), 0.4);
        assert_eq!(gate_off_level(0.0, &shape, 0.4), 0.0);
    }

    #[test]
    fn disabled_envelope_is_a_gate() {
        let params = ParameterSet {
            amp_on: false,
            ..amp_params(0.5, 0.5, 0.2, 0.5)
        };
        let mut env = EnvelopeGenerator::new(EnvelopeKind::Amp);
        assert_eq!(env.advance(&params, &gated(true, 0.0)), 1.0);
        assert_eq!(env.advance(&params, &gated(false, 0.001)), 0.0);
    }

    #[test]
    fn mod_envelope_decays_to_zero_and_uses_its_own_switch() {
        let params = ParameterSet {
            eg_on: true,
            eg_attack: 0.0,
            eg_decay: 0.2,
            amp_on: false,
            ..Default::default()
        };
        let decay = EnvelopeShape::from_controls(0.0, 0.2, 0.0, 0.2).decay;
        let mut env = EnvelopeGenerator::new(EnvelopeKind::Mod);
        assert!((env.advance(&params, &gated(true, 0.0)) - 1.0).abs() < 1e-12);
        assert_eq!(env.advance(&params, &gated(true, decay + 1e-6)), 0.0);
    }

    #[test]
    fn click_gain_ramps_over_two_milliseconds() {
        assert_eq!(click_suppressing_gain(&gated(true, 0.0)), 0.0);
        assert!((click_suppressing_gain(&gated(true, 0.001)) - 0.5).abs() < 1e-9);
        assert_eq!(click_suppressing_gain(&gated(true, 0.002)), 1.0);
        assert_eq!(click_suppressing_gain(&gated(false, 0.0)), 1.0);
    }
}
