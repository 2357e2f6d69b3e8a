use crate::{
    graph::{
        node::{GraphNode, RenderCtx},
        voice_graph::VoiceGraph,
    },
    synth::note::NoteId,
};

/// Notes have no velocity control; every voice plays at full intensity.
const FULL_VELOCITY: f32 = 127.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Pending,   // Built on the control path, not started yet
    Active,    // Playing, envelope in attack/decay/sustain
    Releasing, // Key released, envelope in release phase
    Finished,  // Release ramp done, waiting for teardown
}

/// One sounding note: its identity, pitch and signal graph.
pub struct Voice<G: GraphNode = VoiceGraph> {
    id: u64,
    note: NoteId,
    frequency: f32,
    state: VoiceState,
    age: u64,
    rendered: u64,
    sample_rate: f32,
    graph: G,
}

impl<G: GraphNode> Voice<G> {
    /// `id` must be unique per engine; deadlines are keyed by it so a stale
    /// timer never hits a later voice for the same note.
    pub fn new(id: u64, note: NoteId, frequency: f32, graph: G, sample_rate: f32) -> Self {
        Self {
            id,
            note,
            frequency,
            state: VoiceState::Pending,
            age: 0,
            rendered: 0,
            sample_rate,
            graph,
        }
    }

    fn ctx(&self) -> RenderCtx {
        RenderCtx::from_freq(self.sample_rate, self.frequency, FULL_VELOCITY)
            .at_time(self.rendered as f64 / self.sample_rate as f64)
    }

    /// Trigger the graph. `now` is the renderer's frame counter and becomes
    /// the voice's age for stealing decisions.
    pub fn start(&mut self, now: u64) {
        self.state = VoiceState::Active;
        self.age = now;
        self.rendered = 0;

        let ctx = self.ctx();
        self.graph.note_on(&ctx);
    }

    /// Move into release. Returns false if the voice was not active.
    pub fn release(&mut self) -> bool {
        if self.state != VoiceState::Active {
            return false;
        }
        self.state = VoiceState::Releasing;

        let ctx = self.ctx();
        self.graph.note_off(&ctx);
        true
    }

    /// Render this voice into `left`/`right`, overwriting them.
    ///
    /// Returns false if the graph produced a non-finite sample. The block is
    /// silenced in that case and the caller should retire the voice.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) -> bool {
        if !self.is_sounding() {
            left.fill(0.0);
            right.fill(0.0);
            return true;
        }

        let ctx = self.ctx();
        self.graph.render_block(left, right, &ctx);
        self.rendered += left.len() as u64;

        let healthy = left.iter().chain(right.iter()).all(|s| s.is_finite());
        if !healthy {
            left.fill(0.0);
            right.fill(0.0);
            self.state = VoiceState::Finished;
            return false;
        }

        if self.state == VoiceState::Releasing && !self.graph.is_active() {
            self.state = VoiceState::Finished;
        }
        true
    }

    pub fn is_sounding(&self) -> bool {
        matches!(self.state, VoiceState::Active | VoiceState::Releasing)
    }

    pub fn get_envelope_level(&self) -> Option<f32> {
        self.graph.get_envelope_level()
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn note(&self) -> NoteId {
        self.note
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Seconds from release until the graph falls silent.
    pub fn release_time(&self) -> f32 {
        self.graph.release_time()
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }
}
