use std::{
    f32::consts::{FRAC_1_SQRT_2, PI},
    fmt,
    str::FromStr,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ParseChoiceError;

/*
State Variable Filter
=====================

One topology-preserving-transform SVF (Andrew Simper's form) produces a
lowpass, a bandpass and a highpass tap from the same two integrators. Every
other response is a linear mix of the input and those taps:

    y = m0 * x + m1 * band + m2 * low

| type      | g              | k          | m0  | m1          | m2     |
| --------- | -------------- | ---------- | --- | ----------- | ------ |
| lowpass   | tan(πfc/fs)    | 1/Q        | 0   | 0           | 1      |
| highpass  | tan(πfc/fs)    | 1/Q        | 1   | -k          | -1     |
| bandpass  | tan(πfc/fs)    | 1/Q        | 0   | k           | 0      |
| notch     | tan(πfc/fs)    | 1/Q        | 1   | -k          | 0      |
| allpass   | tan(πfc/fs)    | 1/Q        | 1   | -2k         | 0      |
| peaking   | tan(πfc/fs)    | 1/(Q·A)    | 1   | k(A²-1)     | 0      |
| lowshelf  | tan(πfc/fs)/√A | √2         | 1   | k(A-1)      | A²-1   |
| highshelf | tan(πfc/fs)·√A | √2         | A²  | k(1-A)A     | 1-A²   |

with A = 10^(gain_db / 40). The bandpass is normalized to unity gain at the
center frequency. Shelves ignore Q and use a Butterworth slope.

Cutoff is clamped to [20 Hz, 0.45·fs] and Q never drops below 0.1, so any
parameter value produces a stable filter.
*/

pub const MIN_CUTOFF: f32 = 20.0;
pub const MIN_Q: f32 = 0.1;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterType {
    #[default]
    Lowpass,
    Highpass,
    Bandpass,
    Notch,
    Allpass,
    Lowshelf,
    Highshelf,
    Peaking,
    /// Routes the master bus through the vowel formant bank instead.
    Formant,
}

impl FilterType {
    pub const ALL: [FilterType; 9] = [
        FilterType::Lowpass,
        FilterType::Highpass,
        FilterType::Bandpass,
        FilterType::Notch,
        FilterType::Allpass,
        FilterType::Lowshelf,
        FilterType::Highshelf,
        FilterType::Peaking,
        FilterType::Formant,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FilterType::Lowpass => "lowpass",
            FilterType::Highpass => "highpass",
            FilterType::Bandpass => "bandpass",
            FilterType::Notch => "notch",
            FilterType::Allpass => "allpass",
            FilterType::Lowshelf => "lowshelf",
            FilterType::Highshelf => "highshelf",
            FilterType::Peaking => "peaking",
            FilterType::Formant => "formant",
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterType {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterType::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| ParseChoiceError(s.to_string()))
    }
}

pub struct FilterOutputs {
    pub lowpass: f32,
    pub bandpass: f32,
    pub highpass: f32,
}

/// Per-response mixing coefficients for [`SVFilter::process`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvfCoefficients {
    pub g: f32,
    pub k: f32,
    pub m0: f32,
    pub m1: f32,
    pub m2: f32,
}

impl SvfCoefficients {
    pub fn new(
        filter_type: FilterType,
        cutoff_hz: f32,
        q: f32,
        gain_db: f32,
        sample_rate: f32,
    ) -> Self {
        let cutoff = cutoff_hz.clamp(MIN_CUTOFF, 0.45 * sample_rate);
        let q = q.max(MIN_Q);
        let g = (PI * cutoff / sample_rate).tan();
        let k = 1.0 / q;
        let a = 10f32.powf(gain_db / 40.0);

        let (g, k, m0, m1, m2) = match filter_type {
            FilterType::Lowpass => (g, k, 0.0, 0.0, 1.0),
            FilterType::Highpass => (g, k, 1.0, -k, -1.0),
            FilterType::Bandpass => (g, k, 0.0, k, 0.0),
            FilterType::Notch => (g, k, 1.0, -k, 0.0),
            FilterType::Allpass => (g, k, 1.0, -2.0 * k, 0.0),
            FilterType::Peaking => {
                let k = 1.0 / (q * a);
                (g, k, 1.0, k * (a * a - 1.0), 0.0)
            }
            FilterType::Lowshelf => {
                let k = 2.0 * FRAC_1_SQRT_2;
                (g / a.sqrt(), k, 1.0, k * (a - 1.0), a * a - 1.0)
            }
            FilterType::Highshelf => {
                let k = 2.0 * FRAC_1_SQRT_2;
                (g * a.sqrt(), k, a * a, k * (1.0 - a) * a, 1.0 - a * a)
            }
            // Not an SVF response; pass through untouched.
            FilterType::Formant => (g, k, 1.0, 0.0, 0.0),
        };

        Self { g, k, m0, m1, m2 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SVFilter {
    ic1eq: f32, // First integrator's memory
    ic2eq: f32, // Second integrator's memory
}

impl SVFilter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn next_sample(&mut self, sample: f32, k: f32, g: f32) -> FilterOutputs {
        let h = 1.0 / (1.0 + g * (g + k));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        FilterOutputs {
            lowpass: v2,
            bandpass: v1,
            highpass: sample - k * v1 - v2,
        }
    }

    #[inline]
    pub fn process(&mut self, sample: f32, c: &SvfCoefficients) -> f32 {
        let taps = self.next_sample(sample, c.k, c.g);
        c.m0 * sample + c.m1 * taps.bandpass + c.m2 * taps.lowpass
    }

    pub fn render(&mut self, buffer: &mut [f32], c: &SvfCoefficients) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample, c);
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }
}
