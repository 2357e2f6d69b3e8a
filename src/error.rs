//! Error types surfaced by the engine's control path.
//!
//! Continuous musical controls never fail: out-of-range values are clamped.
//! Only structural problems (unknown parameter paths, unparsable choices or
//! note labels, a full command ring, missing audio hardware) become errors.
//! The render path has no error channel at all.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The host audio device or stream could not be acquired. Fatal to
    /// engine start-up; never retried internally.
    #[error("audio resource unavailable: {0}")]
    ResourceExhaustion(String),

    #[error("unknown parameter path `{0}`")]
    UnknownParameter(String),

    #[error("invalid value `{value}` for parameter `{path}`")]
    InvalidValue { path: String, value: String },

    #[error("invalid note label `{0}`")]
    InvalidNote(String),

    /// The control → render command ring is full. The render side drains it
    /// once per quantum, so retrying after the next callback succeeds.
    #[error("command queue full")]
    QueueFull,

    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
}

/// A choice-valued setting (waveform, noise color, filter type, ...) was
/// given a name it does not recognize.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized choice `{0}`")]
pub struct ParseChoiceError(pub String);

pub type Result<T> = std::result::Result<T, EngineError>;
