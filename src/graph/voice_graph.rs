use crate::{
    dsp::{
        envelope::Envelope,
        mix::pan_gains,
        noise::{NoiseGenerator, NoiseLoop},
        oscillator::Oscillator,
    },
    graph::node::{GraphNode, RenderCtx},
    patch::{Settings, OSCILLATORS},
};

/*
Voice Graph
===========

Everything one sounding note needs, wired up once on the control thread and
then only rendered on the audio thread.

Topology
--------

                     ┌──────────────┐
                     │ FM modulator │  freq = note × ratio
                     │ (optional)   │  waveform copied from the source osc
                     └──────┬───────┘
                            │ × amount (Hz of deviation)
             ┌──────────────┼──────────────┐
             ↓ if targeted  ↓ if targeted  ↓ if targeted
         ┌───────┐      ┌───────┐      ┌───────┐      ┌───────┐
         │ osc 1 │      │ osc 2 │      │ osc 3 │      │ noise │  never FM'd
         └───┬───┘      └───┬───┘      └───┬───┘      └───┬───┘
          level,pan      level,pan      level,pan      level,pan
             └──────────────┴──────┬───────┴──────────────┘
                                   ↓
                              ┌──────────┐
                              │ envelope │
                              └────┬─────┘
                                   ↓
                               left, right

Branches are only built for oscillators whose level is above zero, so a
patch with one audible oscillator costs one oscillator.

Frequency Modulation
--------------------

The modulator's output (-1..1) times `amount` is added straight to the
carrier's frequency in Hz, sample by sample:

  f_inst(n) = f_carrier + amount × m(n)

So with amount = 200 a 440 Hz carrier sweeps between 240 Hz and 640 Hz at
the modulator's rate. Branches that aren't targeted render at their nominal
frequency no matter how deep the modulation is.
*/

struct Branch {
    index: usize,
    osc: Oscillator,
    level: f32,
    gain_l: f32,
    gain_r: f32,
    modulated: bool,
}

struct NoiseBranch {
    source: NoiseLoop,
    level: f32,
    gain_l: f32,
    gain_r: f32,
}

struct Modulator {
    osc: Oscillator,
    amount: f32,
}

pub struct VoiceGraph {
    branches: Vec<Branch>,
    noise: Option<NoiseBranch>,
    modulator: Option<Modulator>,
    envelope: Envelope,
}

impl VoiceGraph {
    /// Build the graph for a note at `frequency` Hz.
    ///
    /// Allocates (branch list, noise buffer). Call from the control path only.
    pub fn build(
        settings: &Settings,
        frequency: f32,
        noise: &mut NoiseGenerator,
        noise_seconds: f32,
        sample_rate: f32,
    ) -> Self {
        let fm = &settings.fm;
        let fm_active = fm.is_active();

        let branches = settings
            .oscillators
            .iter()
            .enumerate()
            .filter(|(_, osc)| osc.level > 0.0)
            .map(|(index, osc)| {
                let (gain_l, gain_r) = pan_gains(osc.pan);
                Branch {
                    index,
                    osc: Oscillator::new(osc.waveform, osc.frequency(frequency)),
                    level: osc.level,
                    gain_l,
                    gain_r,
                    modulated: fm_active && fm.target.includes(index),
                }
            })
            .collect();

        let noise = (settings.noise.level > 0.0).then(|| {
            let (gain_l, gain_r) = pan_gains(settings.noise.pan);
            let buffer = noise.generate(settings.noise.kind, noise_seconds, sample_rate);
            NoiseBranch {
                source: NoiseLoop::new(buffer),
                level: settings.noise.level,
                gain_l,
                gain_r,
            }
        });

        let modulator = fm
            .source
            .oscillator()
            .filter(|_| fm_active)
            .map(|source| Modulator {
                osc: Oscillator::new(
                    settings.oscillators[source].waveform,
                    frequency * fm.ratio,
                ),
                amount: fm.amount,
            });

        let env = &settings.envelope;
        Self {
            branches,
            noise,
            modulator,
            envelope: Envelope::adsr(env.attack, env.decay, env.sustain, env.release),
        }
    }

    /// Number of pitched oscillators actually built.
    pub fn oscillator_count(&self) -> usize {
        self.branches.len()
    }

    pub fn has_noise(&self) -> bool {
        self.noise.is_some()
    }

    /// Nominal frequency of the FM modulator, if there is one.
    pub fn modulator_frequency(&self) -> Option<f32> {
        self.modulator.as_ref().map(|m| m.osc.frequency())
    }

    fn branch(&self, oscillator: usize) -> Option<&Branch> {
        debug_assert!(oscillator < OSCILLATORS);
        self.branches.iter().find(|b| b.index == oscillator)
    }

    /// Instantaneous frequency of oscillator `oscillator` (0-based) for the
    /// last rendered sample, including FM deviation.
    pub fn branch_frequency(&self, oscillator: usize) -> Option<f32> {
        self.branch(oscillator).map(|b| b.osc.last_frequency())
    }

    pub fn branch_nominal_frequency(&self, oscillator: usize) -> Option<f32> {
        self.branch(oscillator).map(|b| b.osc.frequency())
    }
}

impl GraphNode for VoiceGraph {
    fn render_block(&mut self, left: &mut [f32], right: &mut [f32], ctx: &RenderCtx) {
        debug_assert_eq!(left.len(), right.len());
        let sr = ctx.sample_rate;

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let deviation = match &mut self.modulator {
                Some(m) => m.osc.next_sample(0.0, sr) * m.amount,
                None => 0.0,
            };

            let mut sum_l = 0.0;
            let mut sum_r = 0.0;
            for branch in &mut self.branches {
                let fm = if branch.modulated { deviation } else { 0.0 };
                let s = branch.osc.next_sample(fm, sr) * branch.level;
                sum_l += s * branch.gain_l;
                sum_r += s * branch.gain_r;
            }

            if let Some(noise) = &mut self.noise {
                let s = noise.source.next_sample() * noise.level;
                sum_l += s * noise.gain_l;
                sum_r += s * noise.gain_r;
            }

            let gain = self.envelope.next_sample(ctx);
            *l = sum_l * gain;
            *r = sum_r * gain;
        }
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        self.envelope.note_on(ctx);
    }

    fn note_off(&mut self, ctx: &RenderCtx) {
        self.envelope.note_off(ctx);
    }

    fn get_envelope_level(&self) -> Option<f32> {
        Some(self.envelope.level())
    }

    fn release_time(&self) -> f32 {
        self.envelope.release_time()
    }

    fn is_active(&self) -> bool {
        self.envelope.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::{NoiseType, Waveform};
    use crate::patch::{FmSource, FmTarget, OscillatorSettings};

    const SR: f32 = 48_000.0;

    fn build(settings: &Settings, frequency: f32) -> VoiceGraph {
        let mut noise = NoiseGenerator::seeded(7);
        VoiceGraph::build(settings, frequency, &mut noise, 0.1, SR)
    }

    fn silent_settings() -> Settings {
        let mut settings = Settings::default();
        for osc in &mut settings.oscillators {
            osc.level = 0.0;
        }
        settings
    }

    #[test]
    fn only_audible_oscillators_are_built() {
        let settings = Settings::default();
        let graph = build(&settings, 440.0);
        // default patch: osc3 has level 0
        assert_eq!(graph.oscillator_count(), 2);
        assert!(graph.branch_frequency(2).is_none());
        assert!(!graph.has_noise());
        assert!(graph.modulator_frequency().is_none());
    }

    #[test]
    fn branch_frequency_applies_octave_and_detune() {
        let mut settings = silent_settings();
        settings.oscillators[2] = OscillatorSettings::new(Waveform::Square, -1, 0.5, 1200.0, 0.0);
        let graph = build(&settings, 440.0);
        let f = graph.branch_nominal_frequency(2).unwrap();
        assert!((f - 440.0).abs() < 1e-2, "got {}", f);
    }

    #[test]
    fn noise_branch_is_built_from_level() {
        let mut settings = silent_settings();
        settings.noise.kind = NoiseType::Pink;
        settings.noise.level = 0.5;
        let mut graph = build(&settings, 440.0);
        assert!(graph.has_noise());
        assert_eq!(graph.oscillator_count(), 0);

        let ctx = RenderCtx::from_freq(SR, 440.0, 100.0);
        graph.note_on(&ctx);
        let mut left = vec![0.0; 4_800];
        let mut right = vec![0.0; 4_800];
        graph.render_block(&mut left, &mut right, &ctx);
        assert!(left.iter().any(|s| s.abs() > 1e-4));
    }

    #[test]
    fn fm_deviates_only_the_target() {
        let mut settings = silent_settings();
        settings.oscillators[0] = OscillatorSettings::new(Waveform::Sine, 0, 0.5, 0.0, 0.0);
        settings.oscillators[1] = OscillatorSettings::new(Waveform::Triangle, 0, 0.5, 0.0, 0.0);
        settings.fm.source = FmSource::Osc2;
        settings.fm.target = FmTarget::Osc1;
        settings.fm.amount = 200.0;
        settings.fm.ratio = 2.0;

        let mut graph = build(&settings, 440.0);
        assert_eq!(graph.modulator_frequency(), Some(880.0));

        let ctx = RenderCtx::from_freq(SR, 440.0, 100.0);
        graph.note_on(&ctx);

        let (mut lo, mut hi) = (f32::MAX, f32::MIN);
        let mut l = [0.0f32; 1];
        let mut r = [0.0f32; 1];
        for _ in 0..4_800 {
            graph.render_block(&mut l, &mut r, &ctx);
            let f1 = graph.branch_frequency(0).unwrap();
            lo = lo.min(f1);
            hi = hi.max(f1);
            assert_eq!(graph.branch_frequency(1), Some(440.0));
        }

        assert!(lo >= 240.0 - 0.5 && hi <= 640.0 + 0.5, "range {}..{}", lo, hi);
        assert!(hi - lo > 350.0, "modulation too shallow: {}..{}", lo, hi);
    }

    #[test]
    fn fm_to_all_reaches_every_built_oscillator() {
        let mut settings = Settings::default();
        settings.oscillators[2].level = 0.3;
        settings.fm.source = FmSource::Osc1;
        settings.fm.target = FmTarget::All;
        settings.fm.amount = 50.0;

        let mut graph = build(&settings, 220.0);
        let ctx = RenderCtx::from_freq(SR, 220.0, 100.0);
        graph.note_on(&ctx);

        let mut deviated = [false; 3];
        let mut l = [0.0f32; 1];
        let mut r = [0.0f32; 1];
        for _ in 0..480 {
            graph.render_block(&mut l, &mut r, &ctx);
            for (i, d) in deviated.iter_mut().enumerate() {
                let diff = graph.branch_frequency(i).unwrap() - graph.branch_nominal_frequency(i).unwrap();
                *d |= diff.abs() > 1.0;
            }
        }
        assert_eq!(deviated, [true; 3]);
    }

    #[test]
    fn inactive_fm_builds_no_modulator() {
        let mut settings = Settings::default();
        settings.fm.amount = 300.0;
        settings.fm.source = FmSource::None;
        assert!(build(&settings, 440.0).modulator_frequency().is_none());

        settings.fm.source = FmSource::Osc3;
        settings.fm.amount = 0.0;
        assert!(build(&settings, 440.0).modulator_frequency().is_none());
    }

    #[test]
    fn envelope_gates_the_output() {
        let settings = Settings::default();
        let mut graph = build(&settings, 440.0);
        let ctx = RenderCtx::from_freq(SR, 440.0, 100.0);

        // never triggered: silent and inactive
        let mut left = vec![1.0; 256];
        let mut right = vec![1.0; 256];
        graph.render_block(&mut left, &mut right, &ctx);
        assert!(left.iter().chain(right.iter()).all(|&s| s == 0.0));
        assert!(!graph.is_active());

        graph.note_on(&ctx);
        assert!(graph.is_active());
        graph.render_block(&mut left, &mut right, &ctx);
        assert!(graph.get_envelope_level().unwrap() > 0.0);
    }
}
