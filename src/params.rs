//! Synthesis parameter schema.
//!
//! Hosts address parameters by a [`ParameterKey`]: the 32-bit FNV-1a hash of
//! the parameter's string identifier (`"osc1Wave"`, `"filterCutoff"`, ...).
//! The hash is pure, so keys survive across sessions and never depend on a
//! host-assigned address space. Every identifier in the schema is checked for
//! collisions at compile time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dsp::math::clamp01;

// ── Keys ────────────────────────────────────────────────────

/// Stable integer key derived from a parameter identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterKey(pub u32);

impl From<u32> for ParameterKey {
    fn from(raw: u32) -> Self {
        ParameterKey(raw)
    }
}

impl From<ParameterKey> for u32 {
    fn from(key: ParameterKey) -> Self {
        key.0
    }
}

/// 32-bit FNV-1a over the identifier's bytes.
pub const fn fnv1a(identifier: &str) -> u32 {
    let bytes = identifier.as_bytes();
    let mut hash: u32 = 0x811c_9dc5;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u32;
        hash = hash.wrapping_mul(0x0100_0193);
        i += 1;
    }
    hash
}

/// Map any identifier to its key. Identifiers outside the schema still get a
/// key; the engine simply ignores it.
pub const fn map_parameter_key(identifier: &str) -> ParameterKey {
    ParameterKey(fnv1a(identifier))
}

macro_rules! parameter_table {
    ($($variant:ident => $identifier:literal),+ $(,)?) => {
        /// Every parameter the engine understands.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ParameterId {
            $($variant),+
        }

        impl ParameterId {
            pub const ALL: &'static [ParameterId] = &[$(ParameterId::$variant),+];

            pub const fn identifier(self) -> &'static str {
                match self {
                    $(ParameterId::$variant => $identifier),+
                }
            }

            pub fn from_identifier(identifier: &str) -> Option<Self> {
                match identifier {
                    $($identifier => Some(ParameterId::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

parameter_table! {
    Osc1On => "osc1On",
    Osc1Wave => "osc1Wave",
    Osc1Octave => "osc1Octave",
    Osc1PwMix => "osc1PwMix",
    Osc1Volume => "osc1Volume",
    Osc2On => "osc2On",
    Osc2Wave => "osc2Wave",
    Osc2Octave => "osc2Octave",
    Osc2Detune => "osc2Detune",
    Osc2Volume => "osc2Volume",
    FilterOn => "filterOn",
    FilterType => "filterType",
    FilterCutoff => "filterCutoff",
    FilterPeak => "filterPeak",
    FilterEnvMod => "filterEnvMod",
    AmpOn => "ampOn",
    AmpAttack => "ampAttack",
    AmpDecay => "ampDecay",
    AmpSustain => "ampSustain",
    AmpRelease => "ampRelease",
    LfoOn => "lfoOn",
    LfoWave => "lfoWave",
    LfoRate => "lfoRate",
    LfoDepth => "lfoDepth",
    LfoTarget => "lfoTarget",
    EgOn => "egOn",
    EgAttack => "egAttack",
    EgDecay => "egDecay",
    EgAmount => "egAmount",
    EgTarget => "egTarget",
    Glide => "glide",
    VoicingMode => "voicingMode",
    MasterVolume => "masterVolume",
}

impl ParameterId {
    pub const fn key(self) -> ParameterKey {
        map_parameter_key(self.identifier())
    }

    /// Reverse lookup. The schema is small and fixed, so this is a bounded scan.
    pub fn from_key(key: ParameterKey) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| id.key() == key)
    }
}

const fn keys_are_unique() -> bool {
    let all = ParameterId::ALL;
    let mut i = 0;
    while i < all.len() {
        let mut j = i + 1;
        while j < all.len() {
            if all[i].key().0 == all[j].key().0 {
                return false;
            }
            j += 1;
        }
        i += 1;
    }
    true
}

const _: () = assert!(keys_are_unique(), "parameter identifiers hash to colliding keys");

// ── Choice parameters ───────────────────────────────────────

macro_rules! choice_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Decode a host float: rounded, then clamped into the variant range.
            pub fn from_value(value: f64) -> Self {
                let last = (Self::ALL.len() - 1) as f64;
                Self::ALL[value.round().clamp(0.0, last) as usize]
            }

            pub fn index(self) -> usize {
                self as usize
            }
        }
    };
}

choice_enum! {
    /// Oscillator waveform.
    OscWave { Saw, Rect, Tri, Sine, Noise }
}

choice_enum! {
    /// LFO waveform.
    LfoWave { Sine, Tri, Rect, Saw, SampleHold }
}

choice_enum! {
    /// Filter response. Only the lowpass path is implemented; the value is
    /// carried for hosts that display it.
    FilterType { Lpf, Bpf, Hpf }
}

choice_enum! {
    /// Destination of the LFO or the modulation envelope.
    ModTarget {
        None,
        Osc1Pitch,
        Osc1PwMix,
        Osc1Volume,
        Osc2Pitch,
        Osc2Volume,
        FilterCutoff,
        AmpVolume,
    }
}

choice_enum! {
    /// Voice assignment mode. Stored only; rendering is always polyphonic.
    VoicingMode { Poly, Mono }
}

// ── Parameter set ───────────────────────────────────────────

/// The full set of synthesis controls shared by every voice.
///
/// Unary fields live in [0, 1]; the mapping to physical units happens in the
/// unit that consumes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParameterSet {
    pub osc1_on: bool,
    pub osc1_wave: OscWave,
    pub osc1_octave: f64,
    pub osc1_pw_mix: f64,
    pub osc1_volume: f64,

    pub osc2_on: bool,
    pub osc2_wave: OscWave,
    pub osc2_octave: f64,
    pub osc2_detune: f64,
    pub osc2_volume: f64,

    pub filter_on: bool,
    pub filter_type: FilterType,
    pub filter_cutoff: f64,
    pub filter_peak: f64,
    pub filter_env_mod: f64,

    pub amp_on: bool,
    pub amp_attack: f64,
    pub amp_decay: f64,
    pub amp_sustain: f64,
    pub amp_release: f64,

    pub lfo_on: bool,
    pub lfo_wave: LfoWave,
    pub lfo_rate: f64,
    pub lfo_depth: f64,
    pub lfo_target: ModTarget,

    pub eg_on: bool,
    pub eg_attack: f64,
    pub eg_decay: f64,
    pub eg_amount: f64,
    pub eg_target: ModTarget,

    pub glide: f64,
    pub voicing_mode: VoicingMode,
    pub master_volume: f64,
}

impl Default for ParameterSet {
    fn default() -> Self {
        ParameterSet {
            osc1_on: true,
            osc1_wave: OscWave::Saw,
            osc1_octave: 0.5,
            osc1_pw_mix: 0.0,
            osc1_volume: 1.0,

            osc2_on: false,
            osc2_wave: OscWave::Saw,
            osc2_octave: 0.5,
            osc2_detune: 0.5,
            osc2_volume: 1.0,

            filter_on: true,
            filter_type: FilterType::Lpf,
            filter_cutoff: 1.0,
            filter_peak: 0.0,
            filter_env_mod: 0.0,

            amp_on: true,
            amp_attack: 0.0,
            amp_decay: 0.0,
            amp_sustain: 1.0,
            amp_release: 0.0,

            lfo_on: false,
            lfo_wave: LfoWave::Sine,
            lfo_rate: 0.5,
            lfo_depth: 0.5,
            lfo_target: ModTarget::Osc1Pitch,

            eg_on: false,
            eg_attack: 0.0,
            eg_decay: 0.5,
            eg_amount: 0.5,
            eg_target: ModTarget::FilterCutoff,

            glide: 0.0,
            voicing_mode: VoicingMode::Poly,
            master_volume: 0.5,
        }
    }
}

fn to_bool(value: f64) -> bool {
    value > 0.5
}

fn from_bool(flag: bool) -> f64 {
    if flag { 1.0 } else { 0.0 }
}

impl ParameterSet {
    /// Assign a host value to the field behind `key`.
    ///
    /// Returns `false` (and changes nothing) for keys outside the schema.
    pub fn set(&mut self, key: ParameterKey, value: f64) -> bool {
        match ParameterId::from_key(key) {
            Some(id) => {
                self.apply(id, value);
                true
            }
            None => false,
        }
    }

    /// Assign a host value to a field, clamping per field type. Non-finite
    /// values are dropped.
    pub fn apply(&mut self, id: ParameterId, value: f64) {
        if !value.is_finite() {
            return;
        }
        use ParameterId as P;
        match id {
            P::Osc1On => self.osc1_on = to_bool(value),
            P::Osc1Wave => self.osc1_wave = OscWave::from_value(value),
            P::Osc1Octave => self.osc1_octave = clamp01(value),
            P::Osc1PwMix => self.osc1_pw_mix = clamp01(value),
            P::Osc1Volume => self.osc1_volume = clamp01(value),
            P::Osc2On => self.osc2_on = to_bool(value),
            P::Osc2Wave => self.osc2_wave = OscWave::from_value(value),
            P::Osc2Octave => self.osc2_octave = clamp01(value),
            P::Osc2Detune => self.osc2_detune = clamp01(value),
            P::Osc2Volume => self.osc2_volume = clamp01(value),
            P::FilterOn => self.filter_on = to_bool(value),
            P::FilterType => self.filter_type = FilterType::from_value(value),
            P::FilterCutoff => self.filter_cutoff = clamp01(value),
            P::FilterPeak => self.filter_peak = clamp01(value),
            P::FilterEnvMod => self.filter_env_mod = clamp01(value),
            P::AmpOn => self.amp_on = to_bool(value),
            P::AmpAttack => self.amp_attack = clamp01(value),
            P::AmpDecay => self.amp_decay = clamp01(value),
            P::AmpSustain => self.amp_sustain = clamp01(value),
            P::AmpRelease => self.amp_release = clamp01(value),
            P::LfoOn => self.lfo_on = to_bool(value),
            P::LfoWave => self.lfo_wave = LfoWave::from_value(value),
            P::LfoRate => self.lfo_rate = clamp01(value),
            P::LfoDepth => self.lfo_depth = clamp01(value),
            P::LfoTarget => self.lfo_target = ModTarget::from_value(value),
            P::EgOn => self.eg_on = to_bool(value),
            P::EgAttack => self.eg_attack = clamp01(value),
            P::EgDecay => self.eg_decay = clamp01(value),
            P::EgAmount => self.eg_amount = clamp01(value),
            P::EgTarget => self.eg_target = ModTarget::from_value(value),
            P::Glide => self.glide = clamp01(value),
            P::VoicingMode => self.voicing_mode = VoicingMode::from_value(value),
            P::MasterVolume => self.master_volume = clamp01(value),
        }
    }

    /// Float encoding of a field, as a host would store it.
    pub fn get(&self, id: ParameterId) -> f64 {
        use ParameterId as P;
        match id {
            P::Osc1On => from_bool(self.osc1_on),
            P::Osc1Wave => self.osc1_wave.index() as f64,
            P::Osc1Octave => self.osc1_octave,
            P::Osc1PwMix => self.osc1_pw_mix,
            P::Osc1Volume => self.osc1_volume,
            P::Osc2On => from_bool(self.osc2_on),
            P::Osc2Wave => self.osc2_wave.index() as f64,
            P::Osc2Octave => self.osc2_octave,
            P::Osc2Detune => self.osc2_detune,
            P::Osc2Volume => self.osc2_volume,
            P::FilterOn => from_bool(self.filter_on),
            P::FilterType => self.filter_type.index() as f64,
            P::FilterCutoff => self.filter_cutoff,
            P::FilterPeak => self.filter_peak,
            P::FilterEnvMod => self.filter_env_mod,
            P::AmpOn => from_bool(self.amp_on),
            P::AmpAttack => self.amp_attack,
            P::AmpDecay => self.amp_decay,
            P::AmpSustain => self.amp_sustain,
            P::AmpRelease => self.amp_release,
            P::LfoOn => from_bool(self.lfo_on),
            P::LfoWave => self.lfo_wave.index() as f64,
            P::LfoRate => self.lfo_rate,
            P::LfoDepth => self.lfo_depth,
            P::LfoTarget => self.lfo_target.index() as f64,
            P::EgOn => from_bool(self.eg_on),
            P::EgAttack => self.eg_attack,
            P::EgDecay => self.eg_decay,
            P::EgAmount => self.eg_amount,
            P::EgTarget => self.eg_target.index() as f64,
            P::Glide => self.glide,
            P::VoicingMode => self.voicing_mode.index() as f64,
            P::MasterVolume => self.master_volume,
        }
    }

    /// Identifier → float map of every field, the form preset storage uses.
    pub fn to_dictionary(&self) -> BTreeMap<&'static str, f64> {
        ParameterId::ALL
            .iter()
            .map(|&id| (id.identifier(), self.get(id)))
            .collect()
    }
}
