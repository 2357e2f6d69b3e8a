//! The complete set of synthesis parameters.
//!
//! [`Settings`] is a plain `Copy` snapshot. The control side mutates its own
//! copy and ships whole snapshots to the render side, so the renderer never
//! sees a half-applied change.

use std::{fmt, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::{FilterType, NoiseType, Vowel, Waveform};
use crate::error::ParseChoiceError;

pub mod param;
pub mod presets;

pub use param::ParamValue;

/// Number of pitched oscillators per voice.
pub const OSCILLATORS: usize = 3;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OscillatorSettings {
    pub waveform: Waveform,
    /// Octave shift relative to the played note.
    pub octave: i32,
    pub level: f32,
    /// Detune in cents.
    pub detune: f32,
    pub pan: f32,
}

impl Default for OscillatorSettings {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            octave: 0,
            level: 0.0,
            detune: 0.0,
            pan: 0.0,
        }
    }
}

impl OscillatorSettings {
    pub fn new(waveform: Waveform, octave: i32, level: f32, detune: f32, pan: f32) -> Self {
        Self {
            waveform,
            octave,
            level,
            detune,
            pan,
        }
    }

    /// Frequency this oscillator plays for a note at `base_hz`.
    pub fn frequency(&self, base_hz: f32) -> f32 {
        base_hz * 2f32.powi(self.octave) * 2f32.powf(self.detune / 1200.0)
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NoiseSettings {
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: NoiseType,
    pub level: f32,
    pub pan: f32,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeSettings {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Default for EnvelopeSettings {
    fn default() -> Self {
        Self {
            attack: 0.1,
            decay: 0.3,
            sustain: 0.6,
            release: 0.5,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSettings {
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: FilterType,
    pub cutoff: f32,
    /// Resonance as Q.
    pub resonance: f32,
    /// Shelf/peak gain in dB.
    pub gain: f32,
    pub vowel: Vowel,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            kind: FilterType::Lowpass,
            cutoff: 2_000.0,
            resonance: 1.0,
            gain: 0.0,
            vowel: Vowel::A,
        }
    }
}

/// Which oscillator's waveform drives the FM modulator.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FmSource {
    #[default]
    None,
    Osc1,
    Osc2,
    Osc3,
}

impl FmSource {
    pub const ALL: [FmSource; 4] = [FmSource::None, FmSource::Osc1, FmSource::Osc2, FmSource::Osc3];

    pub fn name(self) -> &'static str {
        match self {
            FmSource::None => "none",
            FmSource::Osc1 => "osc1",
            FmSource::Osc2 => "osc2",
            FmSource::Osc3 => "osc3",
        }
    }

    /// Index of the source oscillator, if any.
    pub fn oscillator(self) -> Option<usize> {
        match self {
            FmSource::None => None,
            FmSource::Osc1 => Some(0),
            FmSource::Osc2 => Some(1),
            FmSource::Osc3 => Some(2),
        }
    }
}

/// Which oscillators receive the modulator's output as frequency deviation.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FmTarget {
    #[default]
    Osc1,
    Osc2,
    Osc3,
    All,
}

impl FmTarget {
    pub const ALL: [FmTarget; 4] = [FmTarget::Osc1, FmTarget::Osc2, FmTarget::Osc3, FmTarget::All];

    pub fn name(self) -> &'static str {
        match self {
            FmTarget::Osc1 => "osc1",
            FmTarget::Osc2 => "osc2",
            FmTarget::Osc3 => "osc3",
            FmTarget::All => "all",
        }
    }

    pub fn includes(self, oscillator: usize) -> bool {
        match self {
            FmTarget::Osc1 => oscillator == 0,
            FmTarget::Osc2 => oscillator == 1,
            FmTarget::Osc3 => oscillator == 2,
            FmTarget::All => oscillator < OSCILLATORS,
        }
    }
}

macro_rules! choice_names {
    ($($ty:ty),*) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $ty {
            type Err = ParseChoiceError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty>::ALL
                    .into_iter()
                    .find(|c| c.name() == s)
                    .ok_or_else(|| ParseChoiceError(s.to_string()))
            }
        }
    )*};
}

choice_names!(FmSource, FmTarget);

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FmSettings {
    /// Peak frequency deviation in Hz.
    pub amount: f32,
    pub source: FmSource,
    pub target: FmTarget,
    /// Modulator frequency as a multiple of the note frequency.
    pub ratio: f32,
}

impl Default for FmSettings {
    fn default() -> Self {
        Self {
            amount: 0.0,
            source: FmSource::None,
            target: FmTarget::Osc1,
            ratio: 1.0,
        }
    }
}

impl FmSettings {
    pub fn is_active(&self) -> bool {
        self.amount > 0.0 && self.source != FmSource::None
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressorSettings {
    /// dBFS
    pub threshold: f32,
    pub ratio: f32,
    /// Seconds
    pub attack: f32,
    /// Seconds
    pub release: f32,
}

impl Default for CompressorSettings {
    fn default() -> Self {
        Self {
            threshold: -12.0,
            ratio: 4.0,
            attack: 0.003,
            release: 0.25,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimiterSettings {
    pub threshold: f32,
    pub release: f32,
}

impl Default for LimiterSettings {
    fn default() -> Self {
        Self {
            threshold: -3.0,
            release: 0.01,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbSettings {
    pub room_size: f32,
    pub wet: f32,
}

impl Default for ReverbSettings {
    fn default() -> Self {
        Self {
            room_size: 0.5,
            wet: 0.2,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    pub oscillators: [OscillatorSettings; OSCILLATORS],
    pub noise: NoiseSettings,
    pub envelope: EnvelopeSettings,
    pub filter: FilterSettings,
    pub fm: FmSettings,
    pub compressor: CompressorSettings,
    pub limiter: LimiterSettings,
    pub reverb: ReverbSettings,
    /// Master volume, applied before the filter.
    pub volume: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            oscillators: [
                OscillatorSettings::new(Waveform::Sine, 0, 0.8, 0.0, 0.0),
                OscillatorSettings::new(Waveform::Sawtooth, 0, 0.4, -7.0, -0.3),
                OscillatorSettings::new(Waveform::Square, -1, 0.0, 12.0, 0.3),
            ],
            noise: NoiseSettings::default(),
            envelope: EnvelopeSettings::default(),
            filter: FilterSettings::default(),
            fm: FmSettings::default(),
            compressor: CompressorSettings::default(),
            limiter: LimiterSettings::default(),
            reverb: ReverbSettings::default(),
            volume: 0.3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oscillator_frequency_applies_octave_and_detune() {
        let osc = OscillatorSettings::new(Waveform::Sine, -1, 1.0, 1200.0, 0.0);
        assert!((osc.frequency(440.0) - 440.0).abs() < 1e-3);

        let up = OscillatorSettings::new(Waveform::Sine, 1, 1.0, 0.0, 0.0);
        assert!((up.frequency(440.0) - 880.0).abs() < 1e-3);
    }

    #[test]
    fn fm_target_membership() {
        assert!(FmTarget::Osc2.includes(1));
        assert!(!FmTarget::Osc2.includes(0));
        assert!((0..OSCILLATORS).all(|i| FmTarget::All.includes(i)));
    }

    #[test]
    fn fm_needs_amount_and_source() {
        let mut fm = FmSettings {
            amount: 100.0,
            ..FmSettings::default()
        };
        assert!(!fm.is_active());
        fm.source = FmSource::Osc2;
        assert!(fm.is_active());
        fm.amount = 0.0;
        assert!(!fm.is_active());
    }

    #[test]
    fn choice_names_parse() {
        assert_eq!("osc3".parse::<FmSource>(), Ok(FmSource::Osc3));
        assert_eq!("all".parse::<FmTarget>(), Ok(FmTarget::All));
        assert!("none".parse::<FmTarget>().is_err());
        assert_eq!(FmSource::None.to_string(), "none");
    }
}
