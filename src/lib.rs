pub mod config;
pub mod dsp; // Allocation-free signal primitives
pub mod engine; // Control handle, render half, master bus
pub mod error;
pub mod graph; // Per-voice signal graph
pub mod io; // Host audio output
pub mod patch; // Settings snapshot, parameter paths, presets
pub mod synth; // Voice lifecycle and polyphony

pub use config::EngineConfig;
pub use engine::{EngineRenderer, SynthEngine};
pub use error::{EngineError, Result};
pub use patch::Settings;
pub use synth::note::NoteId;

/// Largest block the renderer processes in one pass. Larger host buffers are
/// split into chunks of this size.
pub const MAX_BLOCK_SIZE: usize = 2048;

/// Shortest envelope segment, in seconds. Zero-length ramps click.
pub(crate) const MIN_SEGMENT: f32 = 0.001;
