use thiserror::Error;

/// Errors surfaced by engine construction, preparation and the control handle.
///
/// The render path itself never fails: unknown parameter keys are ignored and
/// out-of-range values are clamped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid engine config: {0}")]
    InvalidConfig(String),
    #[error("invalid sample rate {0}")]
    InvalidSampleRate(f64),
    #[error("command queue is full")]
    QueueFull,
    #[error("engine has been dropped")]
    Disconnected,
}
