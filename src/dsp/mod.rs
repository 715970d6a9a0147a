//! DSP Engine: pure Rust subtractive synthesis.
//!
//! Everything below [`engine`] is allocation-free once prepared. The same code
//! runs natively and inside an AudioWorklet via WASM.

pub mod engine;
pub mod envelope;
pub mod filter;
pub mod interpolator;
pub mod lfo;
pub mod math;
pub mod mixer;
pub mod modulation;
pub mod oscillator;
pub mod voice;
