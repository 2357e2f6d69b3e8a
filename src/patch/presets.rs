//! Factory presets.
//!
//! Each preset is a complete [`Settings`] snapshot; loading one replaces
//! every field.

use super::{
    CompressorSettings, EnvelopeSettings, FilterSettings, FmSettings, FmSource, FmTarget,
    LimiterSettings, NoiseSettings, OscillatorSettings, ReverbSettings, Settings,
};
use crate::dsp::{FilterType, NoiseType, Vowel, Waveform};

use Waveform::{Sawtooth, Sine, Square, Triangle};

pub const NAMES: [&str; 15] = [
    "classic-lead",
    "warm-pad",
    "vintage-bass",
    "bell-pad",
    "fm-electric",
    "analog-strings",
    "retro-pluck",
    "dreamy-choir",
    "punchy-saw",
    "ambient-texture",
    "vinyl-lo-fi",
    "digital-glitch",
    "ocean-pad",
    "wind-ambient",
    "chant",
];

fn osc(waveform: Waveform, octave: i32, level: f32, detune: f32, pan: f32) -> OscillatorSettings {
    OscillatorSettings::new(waveform, octave, level, detune, pan)
}

fn noise(kind: NoiseType, level: f32) -> NoiseSettings {
    NoiseSettings {
        kind,
        level,
        pan: 0.0,
    }
}

fn env(attack: f32, decay: f32, sustain: f32, release: f32) -> EnvelopeSettings {
    EnvelopeSettings {
        attack,
        decay,
        sustain,
        release,
    }
}

fn filter(kind: FilterType, cutoff: f32, resonance: f32, gain: f32) -> FilterSettings {
    FilterSettings {
        kind,
        cutoff,
        resonance,
        gain,
        vowel: Vowel::A,
    }
}

fn fm(amount: f32, source: FmSource, target: FmTarget, ratio: f32) -> FmSettings {
    FmSettings {
        amount,
        source,
        target,
        ratio,
    }
}

fn dynamics(
    comp: (f32, f32, f32, f32),
    limiter: (f32, f32),
) -> (CompressorSettings, LimiterSettings) {
    (
        CompressorSettings {
            threshold: comp.0,
            ratio: comp.1,
            attack: comp.2,
            release: comp.3,
        },
        LimiterSettings {
            threshold: limiter.0,
            release: limiter.1,
        },
    )
}

#[allow(clippy::too_many_arguments)]
fn preset(
    oscillators: [OscillatorSettings; 3],
    noise: NoiseSettings,
    volume: f32,
    envelope: EnvelopeSettings,
    filter: FilterSettings,
    fm: FmSettings,
    (compressor, limiter): (CompressorSettings, LimiterSettings),
    (room_size, wet): (f32, f32),
) -> Settings {
    Settings {
        oscillators,
        noise,
        envelope,
        filter,
        fm,
        compressor,
        limiter,
        reverb: ReverbSettings { room_size, wet },
        volume,
    }
}

fn no_fm() -> FmSettings {
    FmSettings::default()
}

/// Look up a factory preset by name.
pub fn by_name(name: &str) -> Option<Settings> {
    let settings = match name {
        "classic-lead" => preset(
            [
                osc(Sawtooth, 0, 0.8, 0.0, 0.0),
                osc(Sawtooth, 0, 0.6, -7.0, 0.2),
                osc(Sine, 1, 0.3, 0.0, -0.2),
            ],
            noise(NoiseType::White, 0.0),
            0.4,
            env(0.05, 0.2, 0.7, 0.3),
            filter(FilterType::Lowpass, 3_500.0, 8.0, 0.0),
            no_fm(),
            dynamics((-12.0, 4.0, 0.003, 0.25), (-3.0, 0.01)),
            (0.3, 0.15),
        ),
        "warm-pad" => preset(
            [
                osc(Triangle, 0, 0.7, 0.0, -0.3),
                osc(Triangle, 0, 0.7, 5.0, 0.3),
                osc(Sine, -1, 0.4, 0.0, 0.0),
            ],
            noise(NoiseType::Pink, 0.02),
            0.3,
            env(0.8, 0.5, 0.8, 1.2),
            filter(FilterType::Lowpass, 1_500.0, 2.0, 0.0),
            no_fm(),
            dynamics((-18.0, 3.0, 0.01, 0.3), (-6.0, 0.02)),
            (0.7, 0.35),
        ),
        "vintage-bass" => preset(
            [
                osc(Sawtooth, -1, 1.0, 0.0, 0.0),
                osc(Square, -1, 0.6, -12.0, 0.0),
                osc(Sine, -2, 0.3, 0.0, 0.0),
            ],
            noise(NoiseType::Brown, 0.05),
            0.5,
            env(0.01, 0.4, 0.3, 0.2),
            filter(FilterType::Lowpass, 800.0, 12.0, 0.0),
            no_fm(),
            dynamics((-8.0, 6.0, 0.001, 0.1), (-2.0, 0.005)),
            (0.1, 0.05),
        ),
        "bell-pad" => preset(
            [
                osc(Sine, 0, 0.8, 0.0, 0.0),
                osc(Sine, 1, 0.6, 0.0, -0.4),
                osc(Sine, 2, 0.4, 0.0, 0.4),
            ],
            noise(NoiseType::White, 0.0),
            0.35,
            env(0.3, 0.8, 0.6, 2.0),
            filter(FilterType::Lowpass, 4_000.0, 3.0, 0.0),
            no_fm(),
            dynamics((-15.0, 3.0, 0.005, 0.4), (-4.0, 0.015)),
            (0.8, 0.4),
        ),
        "fm-electric" => preset(
            [
                osc(Sine, 0, 0.9, 0.0, 0.0),
                osc(Sine, 1, 0.5, 0.0, 0.3),
                osc(Sine, 0, 0.3, 7.0, -0.3),
            ],
            noise(NoiseType::White, 0.0),
            0.4,
            env(0.02, 0.6, 0.4, 0.8),
            filter(FilterType::Bandpass, 3_000.0, 4.0, 0.0),
            fm(200.0, FmSource::Osc2, FmTarget::Osc1, 2.0),
            dynamics((-10.0, 5.0, 0.002, 0.15), (-3.0, 0.008)),
            (0.4, 0.25),
        ),
        "analog-strings" => preset(
            [
                osc(Sawtooth, 0, 0.7, -5.0, -0.2),
                osc(Sawtooth, 0, 0.7, 5.0, 0.2),
                osc(Square, -1, 0.4, 0.0, 0.0),
            ],
            noise(NoiseType::White, 0.0),
            0.3,
            env(0.6, 0.4, 0.9, 1.5),
            filter(FilterType::Highshelf, 2_200.0, 6.0, 3.0),
            no_fm(),
            dynamics((-16.0, 4.0, 0.01, 0.35), (-5.0, 0.02)),
            (0.6, 0.3),
        ),
        "retro-pluck" => preset(
            [
                osc(Square, 0, 0.8, 0.0, 0.0),
                osc(Square, 1, 0.4, -12.0, 0.0),
                osc(Triangle, 0, 0.0, 0.0, 0.0),
            ],
            noise(NoiseType::Pink, 0.08),
            0.45,
            env(0.01, 0.3, 0.1, 0.4),
            filter(FilterType::Peaking, 4_500.0, 15.0, 8.0),
            no_fm(),
            dynamics((-8.0, 8.0, 0.001, 0.08), (-2.0, 0.003)),
            (0.2, 0.1),
        ),
        "dreamy-choir" => preset(
            [
                osc(Triangle, 0, 0.6, -3.0, -0.4),
                osc(Triangle, 0, 0.6, 3.0, 0.4),
                osc(Sine, 1, 0.4, 0.0, 0.0),
            ],
            noise(NoiseType::White, 0.0),
            0.25,
            env(1.2, 0.6, 0.8, 2.5),
            filter(FilterType::Lowpass, 1_800.0, 1.0, 0.0),
            no_fm(),
            dynamics((-20.0, 2.0, 0.02, 0.5), (-8.0, 0.03)),
            (0.9, 0.5),
        ),
        "punchy-saw" => preset(
            [
                osc(Sawtooth, 0, 1.0, 0.0, 0.0),
                osc(Sawtooth, 0, 0.8, -7.0, 0.0),
                osc(Square, -1, 0.2, 0.0, 0.0),
            ],
            noise(NoiseType::White, 0.0),
            0.4,
            env(0.001, 0.15, 0.6, 0.25),
            filter(FilterType::Highpass, 5_000.0, 10.0, 0.0),
            no_fm(),
            dynamics((-6.0, 10.0, 0.0005, 0.05), (-1.0, 0.002)),
            (0.1, 0.08),
        ),
        "ambient-texture" => preset(
            [
                osc(Triangle, 0, 0.5, -8.0, -0.6),
                osc(Sine, 1, 0.4, 8.0, 0.6),
                osc(Triangle, -1, 0.6, 0.0, 0.0),
            ],
            noise(NoiseType::Pink, 0.15),
            0.2,
            env(2.0, 1.5, 0.9, 3.0),
            filter(FilterType::Notch, 1_200.0, 3.0, 0.0),
            fm(50.0, FmSource::Osc3, FmTarget::All, 0.5),
            dynamics((-22.0, 2.0, 0.05, 0.8), (-10.0, 0.05)),
            (1.0, 0.6),
        ),
        "vinyl-lo-fi" => preset(
            [
                osc(Triangle, 0, 0.7, 0.0, 0.0),
                osc(Sine, 0, 0.5, -3.0, -0.2),
                osc(Sine, 1, 0.3, 3.0, 0.2),
            ],
            noise(NoiseType::Crackle, 0.25),
            0.4,
            env(0.3, 0.4, 0.7, 0.8),
            filter(FilterType::Lowshelf, 1_800.0, 4.0, -3.0),
            no_fm(),
            dynamics((-15.0, 6.0, 0.01, 0.2), (-4.0, 0.01)),
            (0.4, 0.2),
        ),
        "digital-glitch" => preset(
            [
                osc(Square, 0, 0.6, 0.0, -0.3),
                osc(Sawtooth, 0, 0.4, -12.0, 0.3),
                osc(Triangle, 1, 0.2, 7.0, 0.0),
            ],
            noise(NoiseType::Digital, 0.4),
            0.45,
            env(0.001, 0.2, 0.4, 0.3),
            filter(FilterType::Bandpass, 3_500.0, 12.0, 0.0),
            no_fm(),
            dynamics((-8.0, 8.0, 0.0005, 0.05), (-2.0, 0.002)),
            (0.1, 0.05),
        ),
        "ocean-pad" => preset(
            [
                osc(Sine, 0, 0.5, 0.0, -0.4),
                osc(Triangle, 0, 0.4, 5.0, 0.4),
                osc(Sine, -1, 0.3, 0.0, 0.0),
            ],
            noise(NoiseType::Ocean, 0.6),
            0.25,
            env(1.5, 1.0, 0.8, 2.5),
            filter(FilterType::Lowpass, 1_500.0, 2.0, 0.0),
            no_fm(),
            dynamics((-20.0, 3.0, 0.02, 0.4), (-8.0, 0.03)),
            (0.8, 0.4),
        ),
        "wind-ambient" => preset(
            [
                osc(Triangle, 0, 0.3, -5.0, -0.6),
                osc(Sine, 1, 0.2, 5.0, 0.6),
                osc(Triangle, -1, 0.4, 0.0, 0.0),
            ],
            noise(NoiseType::Wind, 0.8),
            0.2,
            env(2.5, 2.0, 0.9, 4.0),
            filter(FilterType::Allpass, 800.0, 1.0, 0.0),
            fm(30.0, FmSource::Osc3, FmTarget::All, 0.3),
            dynamics((-25.0, 2.0, 0.05, 1.0), (-12.0, 0.05)),
            (1.0, 0.7),
        ),
        "chant" | "dalai-lama-chant" => {
            let mut chant = preset(
                [
                    osc(Sawtooth, 0, 0.8, 0.0, 0.0),
                    osc(Sawtooth, -1, 0.6, -3.0, 0.0),
                    osc(Triangle, 1, 0.3, 2.0, 0.0),
                ],
                noise(NoiseType::Pink, 0.05),
                0.35,
                env(0.8, 0.4, 0.9, 1.5),
                filter(FilterType::Formant, 2_000.0, 1.0, 0.0),
                no_fm(),
                dynamics((-18.0, 4.0, 0.01, 0.3), (-6.0, 0.02)),
                (0.8, 0.4),
            );
            chant.filter.vowel = Vowel::O;
            chant
        }
        _ => return None,
    };

    Some(settings)
}

/// Every factory preset, in menu order.
pub fn all() -> impl Iterator<Item = (&'static str, Settings)> {
    NAMES
        .into_iter()
        .filter_map(|name| by_name(name).map(|settings| (name, settings)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_name_resolves() {
        assert_eq!(all().count(), NAMES.len());
        assert!(by_name("no-such-preset").is_none());
    }

    #[test]
    fn presets_are_within_documented_ranges() {
        for (name, settings) in all() {
            let mut repaired = settings;
            super::super::param::sanitize(&mut repaired);
            assert_eq!(repaired, settings, "{} has out-of-range fields", name);
        }
    }

    #[test]
    fn fm_electric_routes_osc2_into_osc1() {
        let s = by_name("fm-electric").unwrap();
        assert_eq!(s.fm.source, FmSource::Osc2);
        assert_eq!(s.fm.target, FmTarget::Osc1);
        assert_eq!(s.fm.amount, 200.0);
        assert_eq!(s.fm.ratio, 2.0);
    }

    #[test]
    fn chant_uses_formant_o() {
        let s = by_name("chant").unwrap();
        assert_eq!(s.filter.kind, FilterType::Formant);
        assert_eq!(s.filter.vowel, Vowel::O);
        assert_eq!(by_name("dalai-lama-chant"), Some(s));
    }
}
