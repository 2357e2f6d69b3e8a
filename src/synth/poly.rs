use crate::{
    dsp::mix::sum_in_place,
    graph::{node::GraphNode, voice_graph::VoiceGraph},
    synth::{
        message::{NoticeSink, RenderNotice, RetireReason},
        note::NoteId,
        voice::{Voice, VoiceState},
    },
    MAX_BLOCK_SIZE,
};

/*
Polyphony
=========

The voice table lives on the audio thread. It is a fixed array of slots
sized once at start-up; voices arrive fully built and leave as boxes sent
back to the control thread, so nothing here allocates or frees.

Rules
-----

  one voice per note   Starting a note that is already sounding retires
                       the old voice on the spot. No fade, it just stops.

  stealing             With every slot taken, a new voice replaces
                       (in order of preference)
                         1. the oldest voice whose release has finished
                         2. the oldest releasing voice
                         3. the oldest voice, period

  faults               A voice whose output goes non-finite is silenced
                       and retired; the rest of the block is unaffected.
*/

pub struct PolyphonyManager<G: GraphNode = VoiceGraph> {
    slots: Vec<Option<Box<Voice<G>>>>,
    scratch_left: Vec<f32>,
    scratch_right: Vec<f32>,
}

impl<G: GraphNode> PolyphonyManager<G> {
    pub fn new(max_voices: usize) -> Self {
        Self {
            slots: (0..max_voices).map(|_| None).collect(),
            scratch_left: vec![0.0; MAX_BLOCK_SIZE],
            scratch_right: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of voices in the table, including ones still releasing.
    pub fn active_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn contains(&self, note: NoteId) -> bool {
        self.voice(note).is_some()
    }

    pub fn voice(&self, note: NoteId) -> Option<&Voice<G>> {
        self.voices().find(|v| v.note() == note)
    }

    pub fn voices(&self) -> impl Iterator<Item = &Voice<G>> {
        self.slots.iter().flatten().map(|v| &**v)
    }

    pub fn contains_id(&self, id: u64) -> bool {
        self.voices().any(|v| v.id() == id)
    }

    fn slot_of_note(&self, note: NoteId) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|v| v.note() == note))
    }

    fn slot_of_id(&self, id: u64) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|v| v.id() == id))
    }

    fn retire_slot(
        &mut self,
        index: usize,
        reason: RetireReason,
        sink: &mut impl NoticeSink<G>,
    ) -> Option<u64> {
        let voice = self.slots[index].take()?;
        let id = voice.id();
        sink.notify(RenderNotice::Retired {
            note: voice.note(),
            reason,
            voice,
        });
        Some(id)
    }

    fn steal_candidate(&self) -> Option<usize> {
        let rank = |state: VoiceState| match state {
            VoiceState::Finished => 0,
            VoiceState::Releasing => 1,
            VoiceState::Active | VoiceState::Pending => 2,
        };

        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|v| (i, (rank(v.state()), v.age()))))
            .min_by_key(|&(_, key)| key)
            .map(|(i, _)| i)
    }

    /// Start `voice` at frame `now`.
    ///
    /// Returns the id of the voice it displaced, either an earlier voice for
    /// the same note or one stolen to make room.
    pub fn start(
        &mut self,
        mut voice: Box<Voice<G>>,
        now: u64,
        sink: &mut impl NoticeSink<G>,
    ) -> Option<u64> {
        let mut displaced = None;

        let index = if let Some(index) = self.slot_of_note(voice.note()) {
            displaced = self.retire_slot(index, RetireReason::Retrigger, sink);
            index
        } else if let Some(index) = self.slots.iter().position(Option::is_none) {
            index
        } else {
            // A zero-capacity table is rejected by config validation
            let index = self.steal_candidate()?;
            displaced = self.retire_slot(index, RetireReason::Stolen, sink);
            index
        };

        voice.start(now);
        self.slots[index] = Some(voice);
        displaced
    }

    /// Release the voice for `note`.
    ///
    /// Returns its id and release time, or `None` if the note isn't sounding
    /// or is already releasing.
    pub fn release(&mut self, note: NoteId) -> Option<(u64, f32)> {
        let index = self.slot_of_note(note)?;
        let voice = self.slots[index].as_mut()?;
        voice.release().then(|| (voice.id(), voice.release_time()))
    }

    /// Release every active voice, reporting each through `released`.
    pub fn release_all(&mut self, mut released: impl FnMut(u64, f32)) {
        for voice in self.slots.iter_mut().flatten() {
            if voice.release() {
                released(voice.id(), voice.release_time());
            }
        }
    }

    /// Retire a voice by id. No-op if it has already left the table.
    pub fn retire_id(
        &mut self,
        id: u64,
        reason: RetireReason,
        sink: &mut impl NoticeSink<G>,
    ) -> bool {
        match self.slot_of_id(id) {
            Some(index) => self.retire_slot(index, reason, sink).is_some(),
            None => false,
        }
    }

    /// Sum every sounding voice into `left`/`right` (overwritten).
    ///
    /// Returns how many voices faulted and were retired during this block.
    pub fn render(
        &mut self,
        left: &mut [f32],
        right: &mut [f32],
        sink: &mut impl NoticeSink<G>,
    ) -> usize {
        let frames = left.len().min(right.len()).min(MAX_BLOCK_SIZE);
        left.fill(0.0);
        right.fill(0.0);

        let scratch_l = &mut self.scratch_left[..frames];
        let scratch_r = &mut self.scratch_right[..frames];
        let mut faults = 0;

        for slot in self.slots.iter_mut() {
            let healthy = match slot.as_mut() {
                Some(voice) if voice.is_sounding() => voice.render(scratch_l, scratch_r),
                _ => continue,
            };

            if healthy {
                sum_in_place(&mut left[..frames], scratch_l);
                sum_in_place(&mut right[..frames], scratch_r);
            } else if let Some(voice) = slot.take() {
                faults += 1;
                sink.notify(RenderNotice::Retired {
                    note: voice.note(),
                    reason: RetireReason::Fault,
                    voice,
                });
            }
        }

        faults
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::RenderCtx;

    const SR: f32 = 1_000.0;

    struct Tone {
        value: f32,
        released: bool,
    }

    impl GraphNode for Tone {
        fn render_block(&mut self, left: &mut [f32], right: &mut [f32], _ctx: &RenderCtx) {
            left.fill(self.value);
            right.fill(self.value);
        }

        fn note_off(&mut self, _ctx: &RenderCtx) {
            self.released = true;
        }

        fn get_envelope_level(&self) -> Option<f32> {
            Some(if self.released { 0.5 } else { 1.0 })
        }
    }

    fn note(s: &str) -> NoteId {
        s.parse().unwrap()
    }

    fn voice(id: u64, label: &str, value: f32) -> Box<Voice<Tone>> {
        let tone = Tone {
            value,
            released: false,
        };
        Box::new(Voice::new(id, note(label), 440.0, tone, SR))
    }

    fn retired(notices: &[RenderNotice<Tone>]) -> Vec<(NoteId, RetireReason, u64)> {
        notices
            .iter()
            .filter_map(|n| match n {
                RenderNotice::Retired { note, reason, voice } => Some((*note, *reason, voice.id())),
                RenderNotice::Kernel(_) => None,
            })
            .collect()
    }

    #[test]
    fn retrigger_keeps_one_voice_per_note() {
        let mut poly = PolyphonyManager::new(4);
        let mut sink = Vec::new();

        assert_eq!(poly.start(voice(1, "C4", 0.1), 0, &mut sink), None);
        assert_eq!(poly.start(voice(2, "C4", 0.1), 10, &mut sink), Some(1));

        assert_eq!(poly.active_count(), 1);
        assert_eq!(poly.voice(note("C4")).map(|v| v.id()), Some(2));
        assert_eq!(retired(&sink), vec![(note("C4"), RetireReason::Retrigger, 1)]);
    }

    #[test]
    fn release_is_idempotent_and_ignores_unknown_notes() {
        let mut poly = PolyphonyManager::new(2);
        let mut sink = Vec::new();
        poly.start(voice(1, "A4", 0.1), 0, &mut sink);

        assert!(poly.release(note("A4")).is_some());
        assert!(poly.release(note("A4")).is_none());
        assert!(poly.release(note("B2")).is_none());
        assert!(poly.contains(note("A4")), "release does not remove the voice");
    }

    #[test]
    fn steals_oldest_releasing_before_active() {
        let mut poly = PolyphonyManager::new(3);
        let mut sink = Vec::new();
        poly.start(voice(1, "C4", 0.1), 0, &mut sink);
        poly.start(voice(2, "D4", 0.1), 1, &mut sink);
        poly.start(voice(3, "E4", 0.1), 2, &mut sink);
        poly.release(note("E4"));
        poly.release(note("D4"));

        // D4 is the oldest releasing voice even though C4 is older overall
        assert_eq!(poly.start(voice(4, "F4", 0.1), 3, &mut sink), Some(2));
        assert!(!poly.contains(note("D4")));
        assert_eq!(retired(&sink), vec![(note("D4"), RetireReason::Stolen, 2)]);

        // E4 next
        assert_eq!(poly.start(voice(5, "G4", 0.1), 4, &mut sink), Some(3));
        // nothing releasing: oldest overall
        assert_eq!(poly.start(voice(6, "A4", 0.1), 5, &mut sink), Some(1));
        assert_eq!(poly.active_count(), 3);
    }

    #[test]
    fn render_sums_voices_and_retires_faults() {
        let mut poly = PolyphonyManager::new(4);
        let mut sink = Vec::new();
        poly.start(voice(1, "C4", 0.25), 0, &mut sink);
        poly.start(voice(2, "E4", 0.5), 0, &mut sink);
        poly.start(voice(3, "G4", f32::INFINITY), 0, &mut sink);

        let mut left = vec![0.0; 64];
        let mut right = vec![0.0; 64];
        assert_eq!(poly.render(&mut left, &mut right, &mut sink), 1);

        assert!(left.iter().all(|&s| (s - 0.75).abs() < 1e-6));
        assert!(right.iter().all(|&s| (s - 0.75).abs() < 1e-6));
        assert!(!poly.contains(note("G4")));
        assert_eq!(retired(&sink), vec![(note("G4"), RetireReason::Fault, 3)]);
    }

    #[test]
    fn retire_by_id() {
        let mut poly = PolyphonyManager::new(2);
        let mut sink = Vec::new();
        poly.start(voice(7, "C2", 0.1), 0, &mut sink);

        assert!(poly.retire_id(7, RetireReason::Watchdog, &mut sink));
        assert!(!poly.retire_id(7, RetireReason::Watchdog, &mut sink));
        assert_eq!(poly.active_count(), 0);
    }

    #[test]
    fn release_all_reports_each_voice() {
        let mut poly = PolyphonyManager::new(4);
        let mut sink = Vec::new();
        poly.start(voice(1, "C4", 0.1), 0, &mut sink);
        poly.start(voice(2, "D4", 0.1), 0, &mut sink);
        poly.release(note("D4"));

        let mut ids = Vec::new();
        poly.release_all(|id, _| ids.push(id));
        assert_eq!(ids, vec![1]);
    }
}
