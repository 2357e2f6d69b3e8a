/*
Dynamics
========

Feed-forward compressor with a stereo-linked peak detector:

    in ──┬──────────────────────────────────(×)──→ out
         │                                   ↑
         └─→ max(|L|,|R|) → dB → gain curve → smooth (attack/release)


Gain curve (dB in, dB of reduction out), with overshoot o = x - T and knee W:

    o <= -W/2        0
    |o| < W/2        (1/R - 1) * (o + W/2)² / 2W
    o >= W/2         (1/R - 1) * o

    out dB
      │             ╱  1:1
      │           ╱
      │         ╱ ____----  1:R
      │       ╱.-‾
      │     ╱╱   ← knee
      │   ╱
      └──────────────── in dB
            T

The reduction is smoothed in the dB domain: it moves toward a deeper value
with the attack time constant and recovers with the release time constant.

The limiter is the same machine pinned to a hard knee, 20:1 and a 0.1 ms
attack, followed by a hard clip at ±1 so nothing past it can exceed full
scale.
*/

pub const COMPRESSOR_KNEE_DB: f32 = 30.0;
pub const LIMITER_RATIO: f32 = 20.0;
pub const LIMITER_ATTACK: f32 = 0.0001;
pub const OUTPUT_CEILING: f32 = 1.0;

#[inline]
fn lin_to_db(x: f32) -> f32 {
    20.0 * x.max(1e-9).log10()
}

#[inline]
fn db_to_lin(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

#[inline]
fn time_coeff(seconds: f32, sample_rate: f32) -> f32 {
    if seconds <= 0.0 {
        0.0
    } else {
        (-1.0 / (seconds * sample_rate)).exp()
    }
}

#[derive(Debug, Clone)]
pub struct Compressor {
    threshold_db: f32,
    ratio: f32,
    knee_db: f32,
    attack_coeff: f32,
    release_coeff: f32,
    sample_rate: f32,
    // Current smoothed gain reduction, always <= 0
    reduction_db: f32,
}

impl Compressor {
    pub fn new(sample_rate: f32) -> Self {
        let mut comp = Self {
            threshold_db: -12.0,
            ratio: 4.0,
            knee_db: COMPRESSOR_KNEE_DB,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            sample_rate,
            reduction_db: 0.0,
        };
        comp.set_params(-12.0, 4.0, 0.003, 0.25);
        comp
    }

    pub fn with_knee(mut self, knee_db: f32) -> Self {
        self.knee_db = knee_db.max(0.0);
        self
    }

    pub fn set_params(&mut self, threshold_db: f32, ratio: f32, attack: f32, release: f32) {
        self.threshold_db = threshold_db;
        self.ratio = ratio.max(1.0);
        self.attack_coeff = time_coeff(attack, self.sample_rate);
        self.release_coeff = time_coeff(release, self.sample_rate);
    }

    /// Static curve: gain change in dB for a detector level in dB.
    pub fn gain_db(&self, input_db: f32) -> f32 {
        let overshoot = input_db - self.threshold_db;
        let slope = 1.0 / self.ratio - 1.0;
        let half_knee = self.knee_db / 2.0;

        if overshoot <= -half_knee {
            0.0
        } else if overshoot < half_knee {
            let x = overshoot + half_knee;
            slope * x * x / (2.0 * self.knee_db)
        } else {
            slope * overshoot
        }
    }

    /// Current gain reduction in dB (non-positive).
    pub fn reduction_db(&self) -> f32 {
        self.reduction_db
    }

    #[inline]
    pub fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        let level = lin_to_db(left.abs().max(right.abs()));
        let target = self.gain_db(level);

        let coeff = if target < self.reduction_db {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.reduction_db = target + coeff * (self.reduction_db - target);

        let gain = db_to_lin(self.reduction_db);
        (left * gain, right * gain)
    }

    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            (*l, *r) = self.process(*l, *r);
        }
    }

    pub fn reset(&mut self) {
        self.reduction_db = 0.0;
    }
}

/// Brick-wall safety stage at the end of the dynamics chain.
#[derive(Debug, Clone)]
pub struct Limiter {
    inner: Compressor,
}

impl Limiter {
    pub fn new(sample_rate: f32) -> Self {
        let mut limiter = Self {
            inner: Compressor::new(sample_rate).with_knee(0.0),
        };
        limiter.set_params(-3.0, 0.01);
        limiter
    }

    pub fn set_params(&mut self, threshold_db: f32, release: f32) {
        self.inner
            .set_params(threshold_db, LIMITER_RATIO, LIMITER_ATTACK, release);
    }

    pub fn reduction_db(&self) -> f32 {
        self.inner.reduction_db()
    }

    #[inline]
    pub fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        let (l, r) = self.inner.process(left, right);
        (
            l.clamp(-OUTPUT_CEILING, OUTPUT_CEILING),
            r.clamp(-OUTPUT_CEILING, OUTPUT_CEILING),
        )
    }

    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            (*l, *r) = self.process(*l, *r);
        }
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48_000.0;

    #[test]
    fn quiet_signal_is_untouched() {
        let mut comp = Compressor::new(SR);
        // -60 dBFS, far below threshold minus half the knee
        for _ in 0..1_000 {
            let (l, r) = comp.process(0.001, -0.001);
            assert_eq!(l, 0.001);
            assert_eq!(r, -0.001);
        }
    }

    #[test]
    fn knee_curve_is_continuous() {
        let comp = Compressor::new(SR);
        let edge = -12.0 + COMPRESSOR_KNEE_DB / 2.0;
        let inside = comp.gain_db(edge - 1e-3);
        let outside = comp.gain_db(edge + 1e-3);
        assert!((inside - outside).abs() < 1e-2);
        assert_eq!(comp.gain_db(-12.0 - COMPRESSOR_KNEE_DB / 2.0), 0.0);
    }

    #[test]
    fn steady_level_settles_on_curve() {
        let mut comp = Compressor::new(SR);
        let mut out = 0.0;
        for _ in 0..(SR as usize) {
            out = comp.process(1.0, 1.0).0;
        }
        // 0 dBFS input, 12 dB over threshold, inside the 30 dB knee
        let expected = db_to_lin(-0.75 * 27.0 * 27.0 / 60.0);
        assert!((out - expected).abs() < 1e-3, "got {} want {}", out, expected);
    }

    #[test]
    fn channels_share_one_detector() {
        let mut comp = Compressor::new(SR);
        let mut last = (0.0, 0.0);
        for _ in 0..(SR as usize) {
            last = comp.process(1.0, 0.1);
        }
        // The quiet channel gets the same reduction as the loud one
        assert!((last.1 / 0.1 - last.0 / 1.0).abs() < 1e-5);
        assert!(last.1 < 0.1);
    }

    #[test]
    fn limiter_never_exceeds_ceiling() {
        let mut limiter = Limiter::new(SR);
        for n in 0..4_800 {
            let x = 4.0 * (n as f32 * 0.05).sin();
            let (l, r) = limiter.process(x, -x);
            assert!(l.abs() <= OUTPUT_CEILING && r.abs() <= OUTPUT_CEILING);
        }
        assert!(limiter.reduction_db() < -6.0);
    }

    #[test]
    fn limiter_is_near_transparent_below_threshold() {
        let mut limiter = Limiter::new(SR);
        let (l, _) = limiter.process(0.5, 0.5);
        assert_eq!(l, 0.5);
    }
}
