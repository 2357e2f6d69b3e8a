use crate::synth::note::NoteId;

/// Context passed to graph nodes during rendering
///
/// Contains information about what to render:
/// - sample_rate: Audio sample rate (e.g., 48000.0)
/// - frequency: Pitch to render (Hz)
/// - velocity: Intensity/loudness (0.0-127.0, MIDI-style)
/// - time: Seconds since the voice started
#[derive(Debug, Clone, Copy)]
pub struct RenderCtx {
    pub sample_rate: f32,
    pub frequency: f32,
    pub velocity: f32,
    pub time: f64,
}

impl RenderCtx {
    /// Create context from a note label's equal-tempered pitch
    pub fn from_note(sample_rate: f32, note: NoteId, velocity: f32) -> Self {
        Self::from_freq(sample_rate, note.frequency(), velocity)
    }

    /// Create context from a direct frequency
    pub fn from_freq(sample_rate: f32, frequency: f32, velocity: f32) -> Self {
        Self {
            sample_rate,
            frequency,
            velocity,
            time: 0.0,
        }
    }

    pub fn at_time(mut self, time: f64) -> Self {
        self.time = time;
        self
    }
}

/// Core trait for audio processing graph nodes
///
/// Nodes render a stereo block and respond to note events. `render_block`
/// overwrites both buffers; the caller sums voices.
pub trait GraphNode: Send {
    fn render_block(&mut self, left: &mut [f32], right: &mut [f32], ctx: &RenderCtx);

    /// Triggered when a note starts
    ///
    /// Default implementation does nothing (passthrough nodes).
    fn note_on(&mut self, _ctx: &RenderCtx) {
        // Default: do nothing
    }

    /// Triggered when a note is released
    ///
    /// Default implementation does nothing (passthrough nodes).
    fn note_off(&mut self, _ctx: &RenderCtx) {
        // Default: do nothing
    }

    fn get_envelope_level(&self) -> Option<f32> {
        None
    }

    /// Seconds between `note_off` and silence.
    fn release_time(&self) -> f32 {
        0.0
    }

    /// Check if this node is still producing sound
    ///
    /// Used by voice management to know when a voice can be freed.
    fn is_active(&self) -> bool {
        true
    }
}

/// Allow boxed graph nodes to be used as graph nodes (for dynamic dispatch)
impl GraphNode for Box<dyn GraphNode> {
    fn render_block(&mut self, left: &mut [f32], right: &mut [f32], ctx: &RenderCtx) {
        (**self).render_block(left, right, ctx)
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        (**self).note_on(ctx)
    }

    fn note_off(&mut self, ctx: &RenderCtx) {
        (**self).note_off(ctx)
    }

    fn get_envelope_level(&self) -> Option<f32> {
        (**self).get_envelope_level()
    }

    fn release_time(&self) -> f32 {
        (**self).release_time()
    }

    fn is_active(&self) -> bool {
        (**self).is_active()
    }
}
