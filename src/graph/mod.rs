//! Per-voice signal graphs.
//!
//! A graph is built on the control path, shipped to the renderer inside a
//! [`Voice`](crate::synth::voice::Voice), and from then on only rendered.

/// Core trait shared by all graph nodes.
pub mod node;
/// Oscillators, noise and FM routing for one note.
pub mod voice_graph;

pub use node::{GraphNode, RenderCtx};
pub use voice_graph::VoiceGraph;
