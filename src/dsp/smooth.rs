/// Linear ramp toward a target over a fixed number of samples.
///
/// Control changes land on the render thread once per block; ramping them
/// over about 10 ms keeps a moderate tweak from clicking.
#[derive(Debug, Clone)]
pub struct Smoothed {
    current: f32,
    target: f32,
    step: f32,
    remaining: u32,
    ramp_samples: u32,
}

pub const SMOOTHING_SECONDS: f32 = 0.01;

impl Smoothed {
    pub fn new(initial: f32, sample_rate: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            step: 0.0,
            remaining: 0,
            ramp_samples: (SMOOTHING_SECONDS * sample_rate).round().max(1.0) as u32,
        }
    }

    #[inline]
    pub fn set_target(&mut self, target: f32) {
        if target == self.target {
            return;
        }
        self.target = target;
        self.remaining = self.ramp_samples;
        self.step = (target - self.current) / self.ramp_samples as f32;
    }

    /// Jump straight to `value` with no ramp.
    pub fn set_immediate(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.remaining = 0;
    }

    #[inline]
    pub fn next(&mut self) -> f32 {
        if self.remaining > 0 {
            self.remaining -= 1;
            self.current = if self.remaining == 0 {
                self.target
            } else {
                self.current + self.step
            };
        }
        self.current
    }

    pub fn is_smoothing(&self) -> bool {
        self.remaining > 0
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaches_target_after_ramp() {
        let mut p = Smoothed::new(0.0, 1_000.0);
        p.set_target(1.0);
        assert!(p.is_smoothing());

        let first = p.next();
        assert!((first - 0.1).abs() < 1e-6);
        for _ in 0..9 {
            p.next();
        }
        assert_eq!(p.current(), 1.0);
        assert!(!p.is_smoothing());
    }

    #[test]
    fn retarget_mid_ramp_continues_from_current() {
        let mut p = Smoothed::new(0.0, 1_000.0);
        p.set_target(1.0);
        for _ in 0..5 {
            p.next();
        }
        let midway = p.current();
        p.set_target(0.0);
        assert!(p.next() < midway);
    }

    #[test]
    fn immediate_skips_ramp() {
        let mut p = Smoothed::new(0.0, 48_000.0);
        p.set_immediate(0.7);
        assert_eq!(p.next(), 0.7);
    }
}
