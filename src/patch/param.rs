//! Generic `set_parameter(path, value)` dispatch over the [`Settings`] schema.
//!
//! Paths are `group.field`, e.g. `osc2.detune`, `filter.type`,
//! `reverb.room_size`. Continuous values outside their documented range are
//! clamped, never rejected; only unknown paths, non-finite numbers and
//! unrecognized choice names are errors.

use std::ops::RangeInclusive;
use std::str::FromStr;

use tracing::debug;

use super::{Settings, OSCILLATORS};
use crate::error::{EngineError, Result};

pub const LEVEL: RangeInclusive<f32> = 0.0..=1.0;
pub const PAN: RangeInclusive<f32> = -1.0..=1.0;
pub const OCTAVE: RangeInclusive<i32> = -3..=3;
pub const SEGMENT_SECONDS: RangeInclusive<f32> = 0.001..=10.0;
pub const CUTOFF_HZ: RangeInclusive<f32> = 20.0..=20_000.0;
pub const RESONANCE_Q: RangeInclusive<f32> = 0.1..=30.0;
pub const FILTER_GAIN_DB: RangeInclusive<f32> = -40.0..=40.0;
pub const FM_AMOUNT_HZ: RangeInclusive<f32> = 0.0..=2_000.0;
pub const FM_RATIO: RangeInclusive<f32> = 0.1..=16.0;
pub const THRESHOLD_DB: RangeInclusive<f32> = -100.0..=0.0;
pub const COMP_RATIO: RangeInclusive<f32> = 1.0..=20.0;
pub const DYNAMICS_SECONDS: RangeInclusive<f32> = 0.0..=1.0;

/// A value for [`apply`]: numeric controls take numbers, choice controls
/// take names.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue<'a> {
    Number(f32),
    Choice(&'a str),
}

impl From<f32> for ParamValue<'_> {
    fn from(v: f32) -> Self {
        ParamValue::Number(v)
    }
}

impl From<f64> for ParamValue<'_> {
    fn from(v: f64) -> Self {
        ParamValue::Number(v as f32)
    }
}

impl From<i32> for ParamValue<'_> {
    fn from(v: i32) -> Self {
        ParamValue::Number(v as f32)
    }
}

impl<'a> From<&'a str> for ParamValue<'a> {
    fn from(v: &'a str) -> Self {
        ParamValue::Choice(v)
    }
}

impl ParamValue<'_> {
    fn describe(&self) -> String {
        match self {
            ParamValue::Number(v) => v.to_string(),
            ParamValue::Choice(s) => s.to_string(),
        }
    }
}

/// What a successful change touches, so the engine knows what to rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamScope {
    /// Read when the next note is built.
    Voice,
    /// Read by the master bus on the next render quantum.
    Bus,
    /// Needs a new impulse response.
    Room,
}

fn invalid(path: &str, value: &ParamValue<'_>) -> EngineError {
    EngineError::InvalidValue {
        path: path.to_string(),
        value: value.describe(),
    }
}

fn number(path: &str, value: ParamValue<'_>) -> Result<f32> {
    match value {
        ParamValue::Number(v) if v.is_finite() => Ok(v),
        // Numeric text is accepted so string-only front ends work unchanged
        ParamValue::Choice(s) => s
            .trim()
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| invalid(path, &value)),
        ParamValue::Number(_) => Err(invalid(path, &value)),
    }
}

fn choice<T: FromStr>(path: &str, value: ParamValue<'_>) -> Result<T> {
    match value {
        ParamValue::Choice(s) => s.trim().parse().map_err(|_| invalid(path, &value)),
        ParamValue::Number(_) => Err(invalid(path, &value)),
    }
}

pub(crate) fn clamp_logged(path: &str, value: f32, range: &RangeInclusive<f32>) -> f32 {
    let clamped = value.clamp(*range.start(), *range.end());
    if clamped != value {
        debug!(path, requested = value, applied = clamped, "parameter clamped");
    }
    clamped
}

fn clamped(path: &str, value: ParamValue<'_>, range: &RangeInclusive<f32>) -> Result<f32> {
    Ok(clamp_logged(path, number(path, value)?, range))
}

fn octave(path: &str, value: ParamValue<'_>) -> Result<i32> {
    let v = number(path, value)?.round();
    let clamped = v.clamp(*OCTAVE.start() as f32, *OCTAVE.end() as f32) as i32;
    if clamped as f32 != v {
        debug!(path, requested = v, applied = clamped, "parameter clamped");
    }
    Ok(clamped)
}

fn oscillator_index(group: &str) -> Option<usize> {
    let n: usize = group.strip_prefix("osc")?.parse().ok()?;
    (1..=OSCILLATORS).contains(&n).then(|| n - 1)
}

/// Apply one change to `settings`.
pub fn apply(settings: &mut Settings, path: &str, value: ParamValue<'_>) -> Result<ParamScope> {
    let unknown = || EngineError::UnknownParameter(path.to_string());
    let (group, field) = match path.split_once('.') {
        Some(parts) => parts,
        None if path == "volume" => ("master", "volume"),
        None => return Err(unknown()),
    };

    if let Some(i) = oscillator_index(group) {
        let osc = &mut settings.oscillators[i];
        match field {
            "waveform" => osc.waveform = choice(path, value)?,
            "octave" => osc.octave = octave(path, value)?,
            "level" => osc.level = clamped(path, value, &LEVEL)?,
            "detune" => osc.detune = number(path, value)?,
            "pan" => osc.pan = clamped(path, value, &PAN)?,
            _ => return Err(unknown()),
        }
        return Ok(ParamScope::Voice);
    }

    let scope = match (group, field) {
        ("noise", "type") => {
            settings.noise.kind = choice(path, value)?;
            ParamScope::Voice
        }
        ("noise", "level") => {
            settings.noise.level = clamped(path, value, &LEVEL)?;
            ParamScope::Voice
        }
        ("noise", "pan") => {
            settings.noise.pan = clamped(path, value, &PAN)?;
            ParamScope::Voice
        }

        ("envelope", "attack") => {
            settings.envelope.attack = clamped(path, value, &SEGMENT_SECONDS)?;
            ParamScope::Voice
        }
        ("envelope", "decay") => {
            settings.envelope.decay = clamped(path, value, &SEGMENT_SECONDS)?;
            ParamScope::Voice
        }
        ("envelope", "sustain") => {
            settings.envelope.sustain = clamped(path, value, &LEVEL)?;
            ParamScope::Voice
        }
        ("envelope", "release") => {
            settings.envelope.release = clamped(path, value, &SEGMENT_SECONDS)?;
            ParamScope::Voice
        }

        ("fm", "amount") => {
            settings.fm.amount = clamped(path, value, &FM_AMOUNT_HZ)?;
            ParamScope::Voice
        }
        ("fm", "source") => {
            settings.fm.source = choice(path, value)?;
            ParamScope::Voice
        }
        ("fm", "target") => {
            settings.fm.target = choice(path, value)?;
            ParamScope::Voice
        }
        ("fm", "ratio") => {
            settings.fm.ratio = clamped(path, value, &FM_RATIO)?;
            ParamScope::Voice
        }

        ("master", "volume") => {
            settings.volume = clamped(path, value, &LEVEL)?;
            ParamScope::Bus
        }

        ("filter", "type") => {
            settings.filter.kind = choice(path, value)?;
            ParamScope::Bus
        }
        ("filter", "cutoff") => {
            settings.filter.cutoff = clamped(path, value, &CUTOFF_HZ)?;
            ParamScope::Bus
        }
        ("filter", "resonance") => {
            settings.filter.resonance = clamped(path, value, &RESONANCE_Q)?;
            ParamScope::Bus
        }
        ("filter", "gain") => {
            settings.filter.gain = clamped(path, value, &FILTER_GAIN_DB)?;
            ParamScope::Bus
        }
        ("filter", "vowel") => {
            settings.filter.vowel = choice(path, value)?;
            ParamScope::Bus
        }

        ("compressor", "threshold") => {
            settings.compressor.threshold = clamped(path, value, &THRESHOLD_DB)?;
            ParamScope::Bus
        }
        ("compressor", "ratio") => {
            settings.compressor.ratio = clamped(path, value, &COMP_RATIO)?;
            ParamScope::Bus
        }
        ("compressor", "attack") => {
            settings.compressor.attack = clamped(path, value, &DYNAMICS_SECONDS)?;
            ParamScope::Bus
        }
        ("compressor", "release") => {
            settings.compressor.release = clamped(path, value, &DYNAMICS_SECONDS)?;
            ParamScope::Bus
        }
        ("limiter", "threshold") => {
            settings.limiter.threshold = clamped(path, value, &THRESHOLD_DB)?;
            ParamScope::Bus
        }
        ("limiter", "release") => {
            settings.limiter.release = clamped(path, value, &DYNAMICS_SECONDS)?;
            ParamScope::Bus
        }

        ("reverb", "room_size") => {
            settings.reverb.room_size = clamped(path, value, &LEVEL)?;
            ParamScope::Room
        }
        ("reverb", "wet") => {
            settings.reverb.wet = clamped(path, value, &LEVEL)?;
            ParamScope::Bus
        }

        _ => return Err(unknown()),
    };

    Ok(scope)
}

/// Clamp every continuous field of a whole snapshot into range. Non-finite
/// values fall back to the default for that field.
pub fn sanitize(settings: &mut Settings) {
    let defaults = Settings::default();

    fn fix(path: &str, value: &mut f32, fallback: f32, range: &RangeInclusive<f32>) {
        if !value.is_finite() {
            debug!(path, applied = fallback, "non-finite parameter replaced");
            *value = fallback;
        }
        *value = clamp_logged(path, *value, range);
    }

    for (osc, default) in settings.oscillators.iter_mut().zip(defaults.oscillators) {
        fix("osc.level", &mut osc.level, default.level, &LEVEL);
        fix("osc.pan", &mut osc.pan, default.pan, &PAN);
        if !osc.detune.is_finite() {
            osc.detune = 0.0;
        }
        osc.octave = osc.octave.clamp(*OCTAVE.start(), *OCTAVE.end());
    }

    fix("noise.level", &mut settings.noise.level, 0.0, &LEVEL);
    fix("noise.pan", &mut settings.noise.pan, 0.0, &PAN);

    let env = &mut settings.envelope;
    fix("envelope.attack", &mut env.attack, defaults.envelope.attack, &SEGMENT_SECONDS);
    fix("envelope.decay", &mut env.decay, defaults.envelope.decay, &SEGMENT_SECONDS);
    fix("envelope.sustain", &mut env.sustain, defaults.envelope.sustain, &LEVEL);
    fix("envelope.release", &mut env.release, defaults.envelope.release, &SEGMENT_SECONDS);

    let filter = &mut settings.filter;
    fix("filter.cutoff", &mut filter.cutoff, defaults.filter.cutoff, &CUTOFF_HZ);
    fix("filter.resonance", &mut filter.resonance, defaults.filter.resonance, &RESONANCE_Q);
    fix("filter.gain", &mut filter.gain, 0.0, &FILTER_GAIN_DB);

    fix("fm.amount", &mut settings.fm.amount, 0.0, &FM_AMOUNT_HZ);
    fix("fm.ratio", &mut settings.fm.ratio, 1.0, &FM_RATIO);

    let comp = &mut settings.compressor;
    let comp_defaults = defaults.compressor;
    fix("compressor.threshold", &mut comp.threshold, comp_defaults.threshold, &THRESHOLD_DB);
    fix("compressor.ratio", &mut comp.ratio, comp_defaults.ratio, &COMP_RATIO);
    fix("compressor.attack", &mut comp.attack, comp_defaults.attack, &DYNAMICS_SECONDS);
    fix("compressor.release", &mut comp.release, comp_defaults.release, &DYNAMICS_SECONDS);

    let lim = &mut settings.limiter;
    fix("limiter.threshold", &mut lim.threshold, defaults.limiter.threshold, &THRESHOLD_DB);
    fix("limiter.release", &mut lim.release, defaults.limiter.release, &DYNAMICS_SECONDS);

    fix("reverb.room_size", &mut settings.reverb.room_size, 0.5, &LEVEL);
    fix("reverb.wet", &mut settings.reverb.wet, 0.2, &LEVEL);
    fix("volume", &mut settings.volume, defaults.volume, &LEVEL);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::{FilterType, NoiseType, Vowel, Waveform};
    use crate::patch::FmTarget;

    #[test]
    fn sets_oscillator_fields() {
        let mut s = Settings::default();
        assert_eq!(
            apply(&mut s, "osc3.waveform", "triangle".into()).unwrap(),
            ParamScope::Voice
        );
        apply(&mut s, "osc3.octave", ParamValue::Number(2.0)).unwrap();
        apply(&mut s, "osc3.detune", ParamValue::Number(-2400.0)).unwrap();

        assert_eq!(s.oscillators[2].waveform, Waveform::Triangle);
        assert_eq!(s.oscillators[2].octave, 2);
        assert_eq!(s.oscillators[2].detune, -2400.0);
    }

    #[test]
    fn continuous_values_are_clamped() {
        let mut s = Settings::default();
        apply(&mut s, "osc1.level", ParamValue::Number(3.0)).unwrap();
        apply(&mut s, "reverb.wet", ParamValue::Number(-1.0)).unwrap();
        apply(&mut s, "filter.cutoff", ParamValue::Number(1e6)).unwrap();
        apply(&mut s, "osc2.octave", ParamValue::Number(9.0)).unwrap();

        assert_eq!(s.oscillators[0].level, 1.0);
        assert_eq!(s.reverb.wet, 0.0);
        assert_eq!(s.filter.cutoff, 20_000.0);
        assert_eq!(s.oscillators[1].octave, 3);
    }

    #[test]
    fn choices_parse_by_name() {
        let mut s = Settings::default();
        apply(&mut s, "noise.type", "violet".into()).unwrap();
        apply(&mut s, "filter.type", "formant".into()).unwrap();
        apply(&mut s, "filter.vowel", "er".into()).unwrap();
        apply(&mut s, "fm.target", "all".into()).unwrap();

        assert_eq!(s.noise.kind, NoiseType::Violet);
        assert_eq!(s.filter.kind, FilterType::Formant);
        assert_eq!(s.filter.vowel, Vowel::Er);
        assert_eq!(s.fm.target, FmTarget::All);
    }

    #[test]
    fn scopes_route_rebuilds() {
        let mut s = Settings::default();
        assert_eq!(apply(&mut s, "volume", ParamValue::Number(0.5)).unwrap(), ParamScope::Bus);
        assert_eq!(apply(&mut s, "master.volume", ParamValue::Number(0.5)).unwrap(), ParamScope::Bus);
        assert_eq!(apply(&mut s, "reverb.room_size", ParamValue::Number(0.9)).unwrap(), ParamScope::Room);
        assert_eq!(apply(&mut s, "envelope.attack", ParamValue::Number(0.5)).unwrap(), ParamScope::Voice);
    }

    #[test]
    fn rejects_bad_paths_and_values() {
        let mut s = Settings::default();
        let before = s;

        assert!(matches!(
            apply(&mut s, "osc4.level", ParamValue::Number(0.5)),
            Err(EngineError::UnknownParameter(_))
        ));
        assert!(matches!(
            apply(&mut s, "filter.q", ParamValue::Number(0.5)),
            Err(EngineError::UnknownParameter(_))
        ));
        assert!(matches!(
            apply(&mut s, "osc1.waveform", "saw".into()),
            Err(EngineError::InvalidValue { .. })
        ));
        assert!(matches!(
            apply(&mut s, "osc1.level", ParamValue::Number(f32::NAN)),
            Err(EngineError::InvalidValue { .. })
        ));
        assert_eq!(s, before);
    }

    #[test]
    fn numeric_text_is_accepted() {
        let mut s = Settings::default();
        apply(&mut s, "envelope.release", "1.25".into()).unwrap();
        assert_eq!(s.envelope.release, 1.25);
    }

    #[test]
    fn sanitize_repairs_snapshot() {
        let mut s = Settings::default();
        s.volume = 4.0;
        s.envelope.attack = f32::NAN;
        s.oscillators[1].octave = -12;
        sanitize(&mut s);

        assert_eq!(s.volume, 1.0);
        assert_eq!(s.envelope.attack, Settings::default().envelope.attack);
        assert_eq!(s.oscillators[1].octave, -3);
    }
}
