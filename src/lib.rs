pub mod command;
pub mod dsp;
pub mod error;
pub mod params;
pub mod wasm;

pub use crate::command::{EngineCommand, EngineHandle};
pub use crate::dsp::engine::{EngineConfig, VoiceEngine};
pub use crate::error::EngineError;
pub use crate::params::{
    FilterType, LfoWave, ModTarget, OscWave, ParameterId, ParameterKey, ParameterSet, VoicingMode,
    map_parameter_key,
};

use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the polysynth-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}
