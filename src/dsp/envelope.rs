use crate::{graph::node::RenderCtx, MIN_SEGMENT};

/*
ADSR Envelope
=============

The envelope is the per-voice gain trajectory: it multiplies the voice's
mixed oscillators so a note fades in, settles, and fades out.

Vocabulary
----------

  level       Current output gain (0.0 to 1.0).

  stage       Attack, Decay, Sustain, Release or Done.

  segment     One linear ramp. Each ramp is measured in whole samples and
              the level is interpolated from the elapsed sample count, so a
              ramp lands exactly on its target after `time * sample_rate`
              samples instead of drifting from accumulated increments.


The Shape
---------

  Level
    1.0 ┐     ╱╲
        │    ╱  ╲___________
    S   │   ╱               ╲
        │  ╱                 ╲
    0.0 └─╱───────────────────╲──→ Time
         t0   +A   +D        tr   tr+R

  attack   0 → 1      over [t0, t0 + A]
  decay    1 → S      over [t0 + A, t0 + A + D]
  sustain  hold S     until stop
  release  level → 0  over [tr, tr + R], starting from wherever we are


Transitions
-----------

    ┌──────┐ trigger ┌────────┐ elapsed=A ┌───────┐ elapsed=D ┌─────────┐
    │ Done │ ──────→ │ Attack │ ────────→ │ Decay │ ────────→ │ Sustain │
    └──────┘         └────────┘           └───────┘           └─────────┘
        ↑                 │ stop              │ stop               │ stop
        │                 ↓                   ↓                    ↓
        │            ┌───────────────────────────────────────────────┐
        └─────────── │                    Release                     │
          elapsed=R  └───────────────────────────────────────────────┘

Everything is time driven except the move into Release, which needs an
explicit stop. Every segment is at least 1 ms long so a zero setting still
produces a (very short) ramp rather than a click.
*/

/// The current stage of the envelope state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Attack,
    Decay,
    Sustain,
    Release,
    Done,
}

pub struct Envelope {
    attack_time: f32,
    decay_time: f32,
    sustain_level: f32,
    release_time: f32,

    stage: EnvelopeState,
    level: f32,

    // Samples elapsed in the current segment, and its total length
    elapsed: u32,
    segment_samples: u32,

    // Level at the moment release began
    release_start_level: f32,
}

impl Envelope {
    pub fn adsr(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack_time: attack.max(MIN_SEGMENT),
            decay_time: decay.max(MIN_SEGMENT),
            sustain_level: sustain.clamp(0.0, 1.0),
            release_time: release.max(MIN_SEGMENT),

            stage: EnvelopeState::Done,
            level: 0.0,
            elapsed: 0,
            segment_samples: 1,
            release_start_level: 0.0,
        }
    }

    fn segment_length(seconds: f32, sample_rate: f32) -> u32 {
        (seconds * sample_rate).round().max(1.0) as u32
    }

    /// Start the attack ramp from zero.
    pub fn note_on(&mut self, ctx: &RenderCtx) {
        self.level = 0.0;
        self.stage = EnvelopeState::Attack;
        self.elapsed = 0;
        self.segment_samples = Self::segment_length(self.attack_time, ctx.sample_rate);
    }

    /// Begin the release ramp from the current level. No-op once done or
    /// already releasing.
    pub fn note_off(&mut self, ctx: &RenderCtx) {
        if matches!(self.stage, EnvelopeState::Done | EnvelopeState::Release) {
            return;
        }

        self.release_start_level = self.level;
        self.elapsed = 0;
        self.segment_samples = Self::segment_length(self.release_time, ctx.sample_rate);
        self.stage = EnvelopeState::Release;
    }

    /// Emit the level for the current sample, then advance one sample.
    pub fn next_sample(&mut self, ctx: &RenderCtx) -> f32 {
        let progress = self.elapsed as f32 / self.segment_samples as f32;

        self.level = match self.stage {
            EnvelopeState::Attack => progress,
            EnvelopeState::Decay => 1.0 - (1.0 - self.sustain_level) * progress,
            EnvelopeState::Sustain => self.sustain_level,
            EnvelopeState::Release => self.release_start_level * (1.0 - progress),
            EnvelopeState::Done => 0.0,
        };

        if matches!(
            self.stage,
            EnvelopeState::Attack | EnvelopeState::Decay | EnvelopeState::Release
        ) {
            self.elapsed += 1;
            if self.elapsed >= self.segment_samples {
                self.advance_stage(ctx);
            }
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
        self.level
    }

    fn advance_stage(&mut self, ctx: &RenderCtx) {
        self.elapsed = 0;
        match self.stage {
            EnvelopeState::Attack => {
                self.stage = EnvelopeState::Decay;
                self.segment_samples = Self::segment_length(self.decay_time, ctx.sample_rate);
            }
            EnvelopeState::Decay => {
                self.stage = EnvelopeState::Sustain;
            }
            EnvelopeState::Release => {
                self.stage = EnvelopeState::Done;
            }
            EnvelopeState::Sustain | EnvelopeState::Done => {}
        }
    }

    /// Render a block of envelope values into the buffer.
    pub fn render(&mut self, buffer: &mut [f32], ctx: &RenderCtx) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(ctx);
        }
    }

    /// True until the release ramp has finished.
    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeState::Done
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn state(&self) -> EnvelopeState {
        self.stage
    }

    pub fn release_time(&self) -> f32 {
        self.release_time
    }
}
