use std::{f32::consts::TAU, fmt, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ParseChoiceError;

/*
Oscillator
==========

A phase accumulator read through one of four waveform shapes.

  phase       Position within one cycle, kept in [0, 1).

  increment   How far the phase moves per sample: frequency / sample_rate.

  deviation   Extra Hz added to the nominal frequency for one sample. This
              is how frequency modulation reaches the oscillator: the
              modulator's output, scaled by the FM amount, becomes the
              deviation, so the instantaneous frequency is

                  f(n) = f0 + amount * m(n)


Band limiting
-------------

Saw and square jump instantly from one value to another. Sampled naively
those jumps alias. PolyBLEP subtracts a two-sample polynomial residual at
each discontinuity which removes most of the aliasing for a few flops:

      naive saw          residual            corrected
        ╱│ ╱│              │                   ╱╲ ╱╲
       ╱ │╱ │      -      ─┼╮╭─        =      ╱  ╳  ╲
      ╱  │  │              ╰╯                ╱       ╲

Sine and triangle have no jumps and are computed directly.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Sawtooth,
        Waveform::Triangle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Sawtooth => "sawtooth",
            Waveform::Triangle => "triangle",
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Waveform {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Waveform::ALL
            .into_iter()
            .find(|w| w.name() == s)
            .ok_or_else(|| ParseChoiceError(s.to_string()))
    }
}

#[inline]
fn poly_blep(t: f32, dt: f32) -> f32 {
    if t < dt {
        let n = t / dt;
        n + n - n * n - 1.0
    } else if t > 1.0 - dt {
        let n = (t - 1.0) / dt;
        n * n + n + n + 1.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone)]
pub struct Oscillator {
    waveform: Waveform,
    frequency: f32,
    phase: f32,
    last_frequency: f32,
}

impl Oscillator {
    pub fn new(waveform: Waveform, frequency: f32) -> Self {
        Self {
            waveform,
            frequency,
            phase: 0.0,
            last_frequency: frequency,
        }
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Nominal frequency, before any modulation.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency;
    }

    /// Frequency used for the most recently rendered sample.
    pub fn last_frequency(&self) -> f32 {
        self.last_frequency
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Produce one sample at `frequency + deviation_hz`, then advance.
    #[inline]
    pub fn next_sample(&mut self, deviation_hz: f32, sample_rate: f32) -> f32 {
        let frequency = self.frequency + deviation_hz;
        self.last_frequency = frequency;

        let increment = frequency / sample_rate;
        let dt = increment.abs().min(0.5);
        let p = self.phase;

        let value = match self.waveform {
            Waveform::Sine => (TAU * p).sin(),
            Waveform::Sawtooth => 2.0 * p - 1.0 - poly_blep(p, dt),
            Waveform::Square => {
                let naive = if p < 0.5 { 1.0 } else { -1.0 };
                naive + poly_blep(p, dt) - poly_blep((p + 0.5).fract(), dt)
            }
            Waveform::Triangle => 1.0 - 4.0 * ((p + 0.25).fract() - 0.5).abs(),
        };

        self.phase = (p + increment).rem_euclid(1.0);
        // rem_euclid can round up to exactly 1.0 for tiny negative inputs
        if self.phase >= 1.0 {
            self.phase = 0.0;
        }

        value
    }

    pub fn render(&mut self, buffer: &mut [f32], sample_rate: f32) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(0.0, sample_rate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48_000.0;

    fn rising_zero_crossings(buffer: &[f32]) -> usize {
        buffer
            .windows(2)
            .filter(|w| w[0] < 0.0 && w[1] >= 0.0)
            .count()
    }

    #[test]
    fn every_waveform_stays_in_range() {
        for waveform in Waveform::ALL {
            let mut osc = Oscillator::new(waveform, 1_234.5);
            let mut buffer = vec![0.0f32; 4_800];
            osc.render(&mut buffer, SR);
            let peak = buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
            assert!(peak <= 1.1, "{} peaked at {}", waveform, peak);
            assert!(peak > 0.5, "{} is nearly silent", waveform);
        }
    }

    #[test]
    fn one_second_holds_the_expected_cycle_count() {
        for waveform in Waveform::ALL {
            let mut osc = Oscillator::new(waveform, 100.0);
            let mut buffer = vec![0.0f32; SR as usize];
            osc.render(&mut buffer, SR);
            let cycles = rising_zero_crossings(&buffer);
            assert!(
                (99..=101).contains(&cycles),
                "{} produced {} cycles",
                waveform,
                cycles
            );
        }
    }

    #[test]
    fn deviation_shifts_instantaneous_frequency() {
        let mut osc = Oscillator::new(Waveform::Sine, 440.0);
        osc.next_sample(200.0, SR);
        assert!((osc.last_frequency() - 640.0).abs() < 1e-3);
        osc.next_sample(-200.0, SR);
        assert!((osc.last_frequency() - 240.0).abs() < 1e-3);
        assert_eq!(osc.frequency(), 440.0);
    }

    #[test]
    fn negative_frequency_keeps_phase_wrapped() {
        let mut osc = Oscillator::new(Waveform::Sawtooth, 100.0);
        for _ in 0..1_000 {
            let s = osc.next_sample(-900.0, SR);
            assert!(s.is_finite());
            assert!((0.0..1.0).contains(&osc.phase));
        }
    }

    #[test]
    fn waveform_names_round_trip() {
        for waveform in Waveform::ALL {
            assert_eq!(waveform.to_string().parse::<Waveform>(), Ok(waveform));
        }
        assert!("saw".parse::<Waveform>().is_err());
    }
}
