//! AudioWorklet bindings. The worklet owns one [`WasmSynth`] and calls
//! `process` from its render callback; control messages from the main thread
//! are forwarded to the setters.

use wasm_bindgen::prelude::*;

use crate::dsp::engine::{EngineConfig, VoiceEngine};
use crate::error::EngineError;

fn to_js(e: EngineError) -> JsValue {
    JsValue::from_str(&format!("{e}"))
}

#[wasm_bindgen]
pub struct WasmSynth {
    engine: VoiceEngine,
}

#[wasm_bindgen]
impl WasmSynth {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<WasmSynth, JsValue> {
        let engine = VoiceEngine::new(EngineConfig::default()).map_err(to_js)?;
        Ok(WasmSynth { engine })
    }

    /// Build from a config object; missing fields take their defaults.
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(config: JsValue) -> Result<WasmSynth, JsValue> {
        let config: EngineConfig =
            serde_wasm_bindgen::from_value(config).map_err(|e| JsValue::from_str(&format!("{e}")))?;
        let engine = VoiceEngine::new(config).map_err(to_js)?;
        Ok(WasmSynth { engine })
    }

    pub fn prepare(&mut self, sample_rate: f64, max_block_frames: usize) -> Result<(), JsValue> {
        self.engine.prepare(sample_rate, max_block_frames).map_err(to_js)
    }

    #[wasm_bindgen(js_name = mapParameterKey)]
    pub fn map_parameter_key(identifier: &str) -> u32 {
        VoiceEngine::map_parameter_key(identifier).into()
    }

    #[wasm_bindgen(js_name = setParameter)]
    pub fn set_parameter(&mut self, key: u32, value: f64) {
        self.engine.set_parameter(key.into(), value);
    }

    #[wasm_bindgen(js_name = noteOn)]
    pub fn note_on(&mut self, note: u8, velocity: f32) {
        self.engine.note_on(note, velocity as f64);
    }

    #[wasm_bindgen(js_name = noteOff)]
    pub fn note_off(&mut self, note: u8) {
        self.engine.note_off(note);
    }

    pub fn process(&mut self, left: &mut [f32], right: &mut [f32], frame_count: usize) {
        self.engine.process(left, right, frame_count);
    }

    /// Current parameters as an `identifier → value` object.
    pub fn parameters(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.engine.parameters().to_dictionary())
            .map_err(|e| JsValue::from_str(&format!("{e}")))
    }
}
