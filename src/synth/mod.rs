// Purpose: Voice lifecycle and polyphony
// This layer sits above the voice graph and below the engine

pub mod factory;
pub mod message;
pub mod note;
pub mod poly;
pub mod voice;

pub use factory::{GraphFactory, VoiceFactory};
pub use message::{RenderNotice, RetireReason, SynthMessage};
pub use note::NoteId;
pub use poly::PolyphonyManager;
pub use voice::{Voice, VoiceState};
