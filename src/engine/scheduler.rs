/*
Deadline Scheduler
==================

Voices don't tear themselves down on a timer. Instead the renderer keeps a
small list of deadlines and checks it once per block:

  teardown   stop + release time + margin. The release ramp has had time to
             reach zero, so the voice can go.

  watchdog   start + 30 s (configurable). If a voice never received a stop,
             it is force-retired here so a lost note-off can't leak a voice
             forever.

Entries are keyed by voice id, not note. A fresh voice for the same note
gets a new id, so a stale deadline from the previous voice finds nothing to
retire.

The list is kept sorted latest-first, so the next due deadline is always at
the end and popping it is O(1). Insertion is O(n) but n is at most two per
voice.

  [ t=900 W#3 | t=480 T#1 | t=300 T#2 ]  ← pop end while at <= now
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineKind {
    Teardown,
    Watchdog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    /// Frame at which the deadline fires.
    pub at: u64,
    pub voice: u64,
    pub kind: DeadlineKind,
}

pub struct Scheduler {
    // Sorted by `at`, latest first
    pending: Vec<Deadline>,
}

impl Scheduler {
    pub fn new(capacity: usize) -> Self {
        Self {
            pending: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Add a deadline. Returns false, without allocating, if the queue is at
    /// capacity.
    pub fn enqueue(&mut self, deadline: Deadline) -> bool {
        if self.pending.len() == self.pending.capacity() {
            return false;
        }
        let index = self.pending.partition_point(|d| d.at > deadline.at);
        self.pending.insert(index, deadline);
        true
    }

    /// Drop the `kind` deadline for `voice`, if any.
    pub fn cancel(&mut self, voice: u64, kind: DeadlineKind) {
        self.pending.retain(|d| !(d.voice == voice && d.kind == kind));
    }

    /// Queue `deadline` in place of the voice's `previous` deadline. The old
    /// one is only dropped once the new one is queued, so a full queue never
    /// leaves the voice without any deadline.
    pub fn supersede(&mut self, deadline: Deadline, previous: DeadlineKind) -> bool {
        debug_assert_ne!(deadline.kind, previous);
        if !self.enqueue(deadline) {
            return false;
        }
        self.cancel(deadline.voice, previous);
        true
    }

    /// Drop every deadline for `voice`.
    pub fn cancel_voice(&mut self, voice: u64) {
        self.pending.retain(|d| d.voice != voice);
    }

    /// Keep only deadlines whose voice passes `live`.
    pub fn retain_voices(&mut self, mut live: impl FnMut(u64) -> bool) {
        self.pending.retain(|d| live(d.voice));
    }

    /// Pop the earliest deadline if it is due at frame `now`.
    pub fn pop_due(&mut self, now: u64) -> Option<Deadline> {
        match self.pending.last() {
            Some(d) if d.at <= now => self.pending.pop(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teardown(at: u64, voice: u64) -> Deadline {
        Deadline {
            at,
            voice,
            kind: DeadlineKind::Teardown,
        }
    }

    fn watchdog(at: u64, voice: u64) -> Deadline {
        Deadline {
            at,
            voice,
            kind: DeadlineKind::Watchdog,
        }
    }

    #[test]
    fn pops_in_time_order() {
        let mut s = Scheduler::new(8);
        s.enqueue(teardown(300, 1));
        s.enqueue(watchdog(100, 2));
        s.enqueue(teardown(200, 3));

        assert_eq!(s.pop_due(99), None);
        assert_eq!(s.pop_due(250), Some(watchdog(100, 2)));
        assert_eq!(s.pop_due(250), Some(teardown(200, 3)));
        assert_eq!(s.pop_due(250), None);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn cancel_supersedes_pending_deadline() {
        let mut s = Scheduler::new(8);
        s.enqueue(watchdog(1_000, 1));
        s.enqueue(teardown(50, 1));
        s.enqueue(teardown(60, 2));

        s.cancel(1, DeadlineKind::Watchdog);
        assert_eq!(s.len(), 2);

        s.cancel_voice(1);
        assert_eq!(s.pop_due(u64::MAX), Some(teardown(60, 2)));
        assert!(s.is_empty());
    }

    #[test]
    fn full_queue_rejects_without_growing() {
        let mut s = Scheduler::new(2);
        let capacity = s.pending.capacity();
        for i in 0..capacity as u64 {
            assert!(s.enqueue(teardown(i, i)));
        }
        assert!(!s.enqueue(teardown(0, 99)));
        assert_eq!(s.pending.capacity(), capacity);
    }

    #[test]
    fn retain_drops_dead_voices() {
        let mut s = Scheduler::new(4);
        s.enqueue(teardown(10, 1));
        s.enqueue(watchdog(20, 2));
        s.retain_voices(|id| id == 2);
        assert_eq!(s.pop_due(u64::MAX), Some(watchdog(20, 2)));
        assert!(s.is_empty());
    }

    #[test]
    fn supersede_keeps_the_old_deadline_when_full() {
        let mut s = Scheduler::new(1);
        let capacity = s.pending.capacity() as u64;
        for voice in 0..capacity {
            assert!(s.enqueue(watchdog(1_000 + voice, voice)));
        }

        assert!(!s.supersede(teardown(10, 0), DeadlineKind::Watchdog));
        assert_eq!(s.len(), capacity as usize);
        assert_eq!(s.pop_due(u64::MAX), Some(watchdog(1_000, 0)));

        // room again: the teardown replaces the watchdog
        assert!(s.supersede(teardown(10, 1), DeadlineKind::Watchdog));
        assert_eq!(s.pop_due(u64::MAX), Some(teardown(10, 1)));
        assert!(s.pending.iter().all(|d| d.voice != 1));
    }
}
