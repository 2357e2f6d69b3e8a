use std::fmt;
use std::str::FromStr;

use rand::{rngs::SmallRng, Rng, SeedableRng};

use crate::error::ParseChoiceError;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Colored Noise
=============

Every color starts from the same raw material - white noise, uniform samples
in [-1, 1] - and then shapes its spectrum with a tiny recursive filter or a
slow amplitude modulation.

  color     recipe                                     spectrum
  -------   ----------------------------------------   ---------------
  white     raw uniform samples                        flat
  pink      6 leaky integrators + raw term (Kellet)    -3 dB / octave
  brown     1 leaky integrator, x3.5 makeup            -6 dB / octave
  blue      first difference, x0.5                     +3 dB / octave-ish
  violet    second difference, x0.25                   +6 dB / octave
  grey      4 weighted leaky integrators, x0.15        loudness-flat
  crackle   sparse pops + faint hiss                   impulsive
  digital   1/32 quantizer + 0.3 feedback              aliased, gritty
  wind      3 cascaded heavy low-passes + slow LFO     rumble
  ocean     band-pass + two-sine swell envelope        surf


Leaky Integrators
-----------------

A leaky integrator is the simplest low-pass there is:

    b = pole * b + gain * white

With pole close to 1 it remembers a long history (deep bass); with a small
pole it forgets quickly (only smooths the top octave). Pink and grey sum
several of these with staggered poles so each one covers a band of octaves;
the sum tilts the spectrum by roughly -3 dB per octave.


Differencing
------------

Subtracting the previous white sample from the current one cancels the slow
content and keeps the fast content - the mirror image of integration:

    blue[n]   = w[n] - w[n-1]
    violet[n] = w[n] - 2 w[n-1] + w[n-2]


Output Range
------------

The makeup gains (x3.5, x8, x3) bring the quiet filtered colors back up to
a useful level. They can overshoot on unlucky runs, and digital feedback can
reach 1.3, so every sample is clamped to [-1, 1] on the way out.
*/

/// The ten noise colors.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NoiseType {
    #[default]
    White,
    Pink,
    Brown,
    Blue,
    Violet,
    Grey,
    Crackle,
    Digital,
    Wind,
    Ocean,
}

impl NoiseType {
    pub const ALL: [NoiseType; 10] = [
        NoiseType::White,
        NoiseType::Pink,
        NoiseType::Brown,
        NoiseType::Blue,
        NoiseType::Violet,
        NoiseType::Grey,
        NoiseType::Crackle,
        NoiseType::Digital,
        NoiseType::Wind,
        NoiseType::Ocean,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NoiseType::White => "white",
            NoiseType::Pink => "pink",
            NoiseType::Brown => "brown",
            NoiseType::Blue => "blue",
            NoiseType::Violet => "violet",
            NoiseType::Grey => "grey",
            NoiseType::Crackle => "crackle",
            NoiseType::Digital => "digital",
            NoiseType::Wind => "wind",
            NoiseType::Ocean => "ocean",
        }
    }
}

impl fmt::Display for NoiseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NoiseType {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NoiseType::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseChoiceError(s.to_string()))
    }
}

/// Filter memory for one noise instance.
///
/// `b` holds the leaky-integrator accumulators (pink uses seven slots, grey
/// four, wind and ocean three), `prev`/`prev2` the differencing history or
/// the digital feedback sample, and `phase` the wind/ocean modulator.
#[derive(Debug, Clone, Default)]
pub struct NoiseState {
    b: [f32; 7],
    prev: f32,
    prev2: f32,
    phase: f32,
}

impl NoiseState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Produce the next sample of `kind`, drawing fresh randomness from `rng`.
    pub fn next_sample<R: Rng>(&mut self, kind: NoiseType, rng: &mut R) -> f32 {
        let b = &mut self.b;

        let sample = match kind {
            NoiseType::White => white(rng),

            NoiseType::Pink => {
                let w = white(rng);
                b[0] = 0.99886 * b[0] + w * 0.0555179;
                b[1] = 0.99332 * b[1] + w * 0.0750759;
                b[2] = 0.96900 * b[2] + w * 0.1538520;
                b[3] = 0.86650 * b[3] + w * 0.3104856;
                b[4] = 0.55000 * b[4] + w * 0.5329522;
                b[5] = -0.7616 * b[5] - w * 0.0168980;
                // b[6] is the previous sample's raw term, one sample late.
                let out = (b[0] + b[1] + b[2] + b[3] + b[4] + b[5] + b[6] + w * 0.5362) * 0.11;
                b[6] = w * 0.115926;
                out
            }

            NoiseType::Brown => {
                let w = white(rng);
                let out = (self.prev + 0.02 * w) / 1.02;
                self.prev = out;
                out * 3.5
            }

            NoiseType::Blue => {
                let w = white(rng);
                let out = w - self.prev;
                self.prev = w;
                out * 0.5
            }

            NoiseType::Violet => {
                let w = white(rng);
                let out = w - 2.0 * self.prev + self.prev2;
                self.prev2 = self.prev;
                self.prev = w;
                out * 0.25
            }

            NoiseType::Grey => {
                let w = white(rng);
                b[0] = 0.99765 * b[0] + w * 0.0990460;
                b[1] = 0.96300 * b[1] + w * 0.2965164;
                b[2] = 0.57000 * b[2] + w * 1.0526913;
                b[3] = 0.14001 * b[3] + w * 0.1848;
                (b[0] + b[1] + b[2] + b[3] + w * 0.0362) * 0.15
            }

            NoiseType::Crackle => {
                if rng.gen::<f32>() < 0.002 {
                    // A pop: random sign and a random (usually small) size
                    white(rng) * rng.gen::<f32>()
                } else if rng.gen::<f32>() < 0.01 {
                    white(rng) * 0.1
                } else {
                    0.0
                }
            }

            NoiseType::Digital => {
                let quantized = (white(rng) * 32.0).floor() / 32.0;
                let out = (quantized + self.prev * 0.3).clamp(-1.0, 1.0);
                self.prev = out;
                out
            }

            NoiseType::Wind => {
                let w = white(rng);
                b[0] = 0.999 * b[0] + w * 0.001;
                b[1] = 0.995 * b[1] + b[0] * 0.005;
                b[2] = 0.99 * b[2] + b[1] * 0.01;

                self.phase += 0.0001;
                let gust = self.phase.sin() * 0.3;

                b[2] * (1.0 + gust) * 8.0
            }

            NoiseType::Ocean => {
                let w = white(rng);
                b[0] = 0.995 * b[0] + w * 0.005;
                b[1] = 0.98 * b[1] + (b[0] - b[2]) * 0.02;
                b[2] = 0.99 * b[2] + b[1] * 0.01;

                // Slow, slightly irregular swell; only the positive lobes count
                self.phase += 0.00005 + rng.gen::<f32>() * 0.00002;
                let swell = (self.phase.sin() + (self.phase * 2.3).sin() * 0.5).max(0.0);

                b[1] * (0.3 + swell * 0.7) * 3.0
            }
        };

        sample.clamp(-1.0, 1.0)
    }
}

#[inline]
fn white<R: Rng>(rng: &mut R) -> f32 {
    rng.gen_range(-1.0f32..=1.0)
}

/// Renders colored-noise buffers from a free-running random source.
///
/// Output is only reproducible when the generator is [`seeded`](Self::seeded);
/// the engine seeds it from its configuration or from entropy.
pub struct NoiseGenerator {
    rng: SmallRng,
}

impl NoiseGenerator {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Number of samples a buffer of `duration_seconds` holds.
    pub fn frame_count(duration_seconds: f32, sample_rate: f32) -> usize {
        (duration_seconds.max(0.0) * sample_rate).round() as usize
    }

    /// Generate `duration_seconds` of `kind` noise, mono, in [-1, 1].
    ///
    /// Allocates. Call from the control path only.
    pub fn generate(&mut self, kind: NoiseType, duration_seconds: f32, sample_rate: f32) -> Vec<f32> {
        let frames = Self::frame_count(duration_seconds, sample_rate);
        let mut state = NoiseState::new();
        (0..frames)
            .map(|_| state.next_sample(kind, &mut self.rng))
            .collect()
    }
}

impl Default for NoiseGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Plays a pre-generated noise buffer on a loop.
///
/// Regenerating noise on the audio thread would allocate, so each voice gets
/// a buffer up front and wraps around when it runs out.
pub struct NoiseLoop {
    buffer: Vec<f32>,
    position: usize,
}

impl NoiseLoop {
    pub fn new(buffer: Vec<f32>) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        if self.buffer.is_empty() {
            return 0.0;
        }
        let sample = self.buffer[self.position];
        self.position += 1;
        if self.position == self.buffer.len() {
            self.position = 0;
        }
        sample
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
