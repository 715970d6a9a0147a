//! Modulation routing: LFO and mod-envelope contributions to a destination.

use crate::dsp::math::{clamp01, power2, power3};
use crate::params::{ModTarget, ParameterSet};

/// Per-voice modulation sources, recomputed together once per render chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ModulationSnapshot {
    pub amp_eg_level: f64,
    pub click_suppressing_gain: f64,
    pub mod_eg_level: f64,
    pub lfo_output: f64,
}

fn routed(enabled: bool, routed_to: ModTarget, target: Option<ModTarget>) -> bool {
    enabled && routed_to != ModTarget::None && Some(routed_to) == target
}

/// Add routed modulation to a unary control and clamp the result to [0, 1].
///
/// `target` is `None` for controls no source can reach (osc2 has no
/// pulse-width destination).
pub fn modulate_unary(
    params: &ParameterSet,
    snapshot: &ModulationSnapshot,
    base: f64,
    target: Option<ModTarget>,
) -> f64 {
    let mut amount = 0.0;
    if routed(params.lfo_on, params.lfo_target, target) {
        amount += snapshot.lfo_output * power2(params.lfo_depth);
    }
    if routed(params.eg_on, params.eg_target, target) {
        amount += snapshot.mod_eg_level * power2(params.eg_amount);
    }
    clamp01(base + amount)
}

/// Pitch offset in semitones for a pitch destination. LFO depth is cubed and
/// spans ±4 semitones; the envelope reaches one octave.
pub fn pitch_mod_semitones(
    params: &ParameterSet,
    snapshot: &ModulationSnapshot,
    target: ModTarget,
) -> f64 {
    let mut semitones = 0.0;
    if routed(params.lfo_on, params.lfo_target, Some(target)) {
        semitones += snapshot.lfo_output * power3(params.lfo_depth) * 4.0;
    }
    if routed(params.eg_on, params.eg_target, Some(target)) {
        semitones += snapshot.mod_eg_level * power2(params.eg_amount) * 12.0;
    }
    semitones
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(lfo: f64, eg: f64) -> ModulationSnapshot {
        ModulationSnapshot {
            lfo_output: lfo,
            mod_eg_level: eg,
            ..Default::default()
        }
    }

    #[test]
    fn unrouted_controls_pass_through() {
        let params = ParameterSet::default();
        let s = snapshot(1.0, 1.0);
        assert_eq!(modulate_unary(&params, &s, 0.3, Some(ModTarget::Osc1Volume)), 0.3);
        assert_eq!(pitch_mod_semitones(&params, &s, ModTarget::Osc2Pitch), 0.0);
    }

    #[test]
    fn lfo_depth_is_squared_for_unary_targets() {
        let params = ParameterSet {
            lfo_on: true,
            lfo_depth: 0.5,
            lfo_target: ModTarget::Osc1PwMix,
            ..Default::default()
        };
        let s = snapshot(-1.0, 0.0);
        let got = modulate_unary(&params, &s, 0.5, Some(ModTarget::Osc1PwMix));
        assert!((got - 0.25).abs() < 1e-12, "got {got}");
        assert_eq!(modulate_unary(&params, &s, 0.1, Some(ModTarget::Osc1PwMix)), 0.0);
    }

    #[test]
    fn envelope_and_lfo_sum_then_clamp() {
        let params = ParameterSet {
            lfo_on: true,
            lfo_depth: 1.0,
            lfo_target: ModTarget::FilterCutoff,
            eg_on: true,
            eg_amount: 1.0,
            eg_target: ModTarget::FilterCutoff,
            ..Default::default()
        };
        let s = snapshot(0.5, 0.75);
        assert_eq!(modulate_unary(&params, &s, 0.2, Some(ModTarget::FilterCutoff)), 1.0);
    }

    #[test]
    fn pitch_scaling() {
        let params = ParameterSet {
            lfo_on: true,
            lfo_depth: 0.5,
            lfo_target: ModTarget::Osc1Pitch,
            eg_on: true,
            eg_amount: 0.5,
            eg_target: ModTarget::Osc1Pitch,
            ..Default::default()
        };
        let s = snapshot(1.0, 1.0);
        let got = pitch_mod_semitones(&params, &s, ModTarget::Osc1Pitch);
        assert!((got - (0.125 * 4.0 + 0.25 * 12.0)).abs() < 1e-12, "got {got}");
    }

    #[test]
    fn none_target_never_routes() {
        let params = ParameterSet {
            lfo_on: true,
            lfo_depth: 1.0,
            lfo_target: ModTarget::None,
            ..Default::default()
        };
        let s = snapshot(1.0, 0.0);
        assert_eq!(modulate_unary(&params, &s, 0.0, Some(ModTarget::None)), 0.0);
        assert_eq!(modulate_unary(&params, &s, 0.4, None), 0.4);
    }
}
