use rtrb::{Consumer, Producer};

use crate::{
    dsp::reverb::ConvolutionKernel,
    graph::{node::GraphNode, voice_graph::VoiceGraph},
    patch::Settings,
    synth::{note::NoteId, voice::Voice},
};

/// Control → render commands.
///
/// Everything that allocates (voice graphs, reverb kernels) is built before
/// it is sent, so handling a message on the audio thread is just moving a
/// pointer into place.
pub enum SynthMessage<G: GraphNode = VoiceGraph> {
    Start(Box<Voice<G>>),
    Stop(NoteId),
    StopAll,
    Settings(Settings),
    ReverbKernel(Box<ConvolutionKernel>),
}

/// Why a voice left the voice table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetireReason {
    /// Its release ramp and safety margin elapsed.
    Teardown,
    /// The same note was started again.
    Retrigger,
    /// The voice table was full.
    Stolen,
    /// No stop arrived before the watchdog deadline.
    Watchdog,
    /// The graph produced a non-finite sample.
    Fault,
}

/// Render → control notices.
///
/// Boxes travel back this way so they are freed off the audio thread.
pub enum RenderNotice<G: GraphNode = VoiceGraph> {
    Retired {
        note: NoteId,
        reason: RetireReason,
        voice: Box<Voice<G>>,
    },
    Kernel(Box<ConvolutionKernel>),
}

pub trait MessageReceiver<G: GraphNode> {
    fn pop(&mut self) -> Option<SynthMessage<G>>;
}

impl<G: GraphNode> MessageReceiver<G> for Consumer<SynthMessage<G>> {
    fn pop(&mut self) -> Option<SynthMessage<G>> {
        Consumer::pop(self).ok()
    }
}

/// Where the renderer reports retired voices and spent kernels.
pub trait NoticeSink<G: GraphNode> {
    fn notify(&mut self, notice: RenderNotice<G>);
}

impl<G: GraphNode> NoticeSink<G> for Producer<RenderNotice<G>> {
    fn notify(&mut self, notice: RenderNotice<G>) {
        // Full ring: the notice (and its box) is dropped right here. That
        // frees on the audio thread, which beats blocking it.
        let _ = self.push(notice);
    }
}

impl<G: GraphNode> NoticeSink<G> for Vec<RenderNotice<G>> {
    fn notify(&mut self, notice: RenderNotice<G>) {
        self.push(notice);
    }
}
