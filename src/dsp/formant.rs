use std::{fmt, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::filter::{FilterType, SVFilter, SvfCoefficients};
use crate::error::ParseChoiceError;

/*
Formant Bank
============

A vowel is recognizable by the resonances of the vocal tract, the
formants. Three of them (F1, F2, F3) are enough to tell the basic vowels
apart, so the bank runs three bandpass filters in parallel and sums them:

                ┌── BP(F1, 90 Hz wide)  × 1.0 ──┐
    input ──────┼── BP(F2, 120 Hz wide) × 0.7 ──┼──→ output
                └── BP(F3, 150 Hz wide) × 0.3 ──┘

Each resonator has Q = center / bandwidth and unity gain at its center.

| vowel | F1  | F2   | F3   |
| ----- | --- | ---- | ---- |
| a     | 730 | 1090 | 2440 |
| e     | 270 | 2290 | 3010 |
| i     | 390 | 1990 | 2550 |
| o     | 570 | 840  | 2410 |
| u     | 440 | 1020 | 2240 |
| ae    | 660 | 1720 | 2410 |
| aw    | 610 | 900  | 2150 |
| er    | 490 | 1350 | 1690 |
*/

pub const FORMANT_BANDWIDTHS: [f32; 3] = [90.0, 120.0, 150.0];
pub const FORMANT_GAINS: [f32; 3] = [1.0, 0.7, 0.3];

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Vowel {
    #[default]
    A,
    E,
    I,
    O,
    U,
    Ae,
    Aw,
    Er,
}

impl Vowel {
    pub const ALL: [Vowel; 8] = [
        Vowel::A,
        Vowel::E,
        Vowel::I,
        Vowel::O,
        Vowel::U,
        Vowel::Ae,
        Vowel::Aw,
        Vowel::Er,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Vowel::A => "a",
            Vowel::E => "e",
            Vowel::I => "i",
            Vowel::O => "o",
            Vowel::U => "u",
            Vowel::Ae => "ae",
            Vowel::Aw => "aw",
            Vowel::Er => "er",
        }
    }

    /// Center frequencies of F1, F2 and F3 in Hz.
    pub fn formants(self) -> [f32; 3] {
        match self {
            Vowel::A => [730.0, 1090.0, 2440.0],
            Vowel::E => [270.0, 2290.0, 3010.0],
            Vowel::I => [390.0, 1990.0, 2550.0],
            Vowel::O => [570.0, 840.0, 2410.0],
            Vowel::U => [440.0, 1020.0, 2240.0],
            Vowel::Ae => [660.0, 1720.0, 2410.0],
            Vowel::Aw => [610.0, 900.0, 2150.0],
            Vowel::Er => [490.0, 1350.0, 1690.0],
        }
    }
}

impl fmt::Display for Vowel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Vowel {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Vowel::ALL
            .into_iter()
            .find(|v| v.name() == s)
            .ok_or_else(|| ParseChoiceError(s.to_string()))
    }
}

/// Three parallel resonators per channel.
pub struct FormantBank {
    vowel: Vowel,
    coeffs: [SvfCoefficients; 3],
    filters: [[SVFilter; 3]; 2],
}

impl FormantBank {
    pub fn new(vowel: Vowel, sample_rate: f32) -> Self {
        Self {
            vowel,
            coeffs: Self::coefficients(vowel, sample_rate),
            filters: Default::default(),
        }
    }

    fn coefficients(vowel: Vowel, sample_rate: f32) -> [SvfCoefficients; 3] {
        let centers = vowel.formants();
        std::array::from_fn(|i| {
            let q = centers[i] / FORMANT_BANDWIDTHS[i];
            SvfCoefficients::new(FilterType::Bandpass, centers[i], q, 0.0, sample_rate)
        })
    }

    pub fn vowel(&self) -> Vowel {
        self.vowel
    }

    /// Retune the resonators. Filter memory is kept so a switch does not click.
    pub fn set_vowel(&mut self, vowel: Vowel, sample_rate: f32) {
        if vowel != self.vowel {
            self.vowel = vowel;
            self.coeffs = Self::coefficients(vowel, sample_rate);
        }
    }

    #[inline]
    pub fn process(&mut self, channel: usize, sample: f32) -> f32 {
        let mut out = 0.0;
        for (i, filter) in self.filters[channel].iter_mut().enumerate() {
            out += FORMANT_GAINS[i] * filter.process(sample, &self.coeffs[i]);
        }
        out
    }

    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        for sample in left.iter_mut() {
            *sample = self.process(0, *sample);
        }
        for sample in right.iter_mut() {
            *sample = self.process(1, *sample);
        }
    }

    pub fn reset(&mut self) {
        for channel in self.filters.iter_mut() {
            channel.iter_mut().for_each(SVFilter::reset);
        }
    }
}
