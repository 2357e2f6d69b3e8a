use crate::{
    dsp::{
        dynamics::{Compressor, Limiter},
        filter::{FilterType, SVFilter, SvfCoefficients},
        formant::FormantBank,
        mix::blend_dry_wet,
        reverb::{ConvolutionKernel, ConvolutionReverb},
        smooth::Smoothed,
    },
    patch::Settings,
};

/*
Master Bus
==========

The fixed chain every voice sum goes through, in this order and no other:

  voices ─→ volume ─→ ┌ standard filter ┐ ─→ compressor ─→ limiter ─┬─ dry ──(+)─→ out
                      └ formant bank    ┘                            └→ reverb ┘
                        (one or the other,
                         never both)

Volume, cutoff, Q, shelf gain and reverb wet glide to new values over about
10 ms. Filter coefficients are recomputed per sample only while one of
those glides is running.

Switching the filter type clears both filter paths so the new path starts
from silence instead of the other path's stale state. While the formant bank
is in use, cutoff, Q and gain jump straight to their new values.
*/

pub struct MasterBus {
    sample_rate: f32,
    volume: Smoothed,

    filter_kind: FilterType,
    cutoff: Smoothed,
    resonance: Smoothed,
    gain: Smoothed,
    coeffs: SvfCoefficients,
    filters: [SVFilter; 2],
    formant: FormantBank,

    compressor: Compressor,
    limiter: Limiter,

    reverb: ConvolutionReverb,
    wet: Smoothed,
}

impl MasterBus {
    pub fn new(settings: &Settings, kernel: Box<ConvolutionKernel>, sample_rate: f32) -> Self {
        let f = &settings.filter;
        let mut bus = Self {
            sample_rate,
            volume: Smoothed::new(settings.volume, sample_rate),
            filter_kind: f.kind,
            cutoff: Smoothed::new(f.cutoff, sample_rate),
            resonance: Smoothed::new(f.resonance, sample_rate),
            gain: Smoothed::new(f.gain, sample_rate),
            coeffs: SvfCoefficients::new(f.kind, f.cutoff, f.resonance, f.gain, sample_rate),
            filters: Default::default(),
            formant: FormantBank::new(f.vowel, sample_rate),
            compressor: Compressor::new(sample_rate),
            limiter: Limiter::new(sample_rate),
            reverb: ConvolutionReverb::new(kernel, sample_rate),
            wet: Smoothed::new(settings.reverb.wet, sample_rate),
        };
        bus.apply_dynamics(settings);
        bus
    }

    fn apply_dynamics(&mut self, settings: &Settings) {
        let c = &settings.compressor;
        self.compressor
            .set_params(c.threshold, c.ratio, c.attack, c.release);
        let l = &settings.limiter;
        self.limiter.set_params(l.threshold, l.release);
    }

    /// Take on a new settings snapshot. Continuous values glide; the filter
    /// type switches at once.
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.volume.set_target(settings.volume);

        let f = &settings.filter;
        if f.kind != self.filter_kind {
            self.filter_kind = f.kind;
            self.filters.iter_mut().for_each(SVFilter::reset);
            self.formant.reset();
            self.coeffs = SvfCoefficients::new(
                f.kind,
                self.cutoff.current(),
                self.resonance.current(),
                self.gain.current(),
                self.sample_rate,
            );
        }
        if self.filter_kind == FilterType::Formant {
            // the bank ignores these, so there is nothing to glide
            self.cutoff.set_immediate(f.cutoff);
            self.resonance.set_immediate(f.resonance);
            self.gain.set_immediate(f.gain);
            self.coeffs = SvfCoefficients::new(f.kind, f.cutoff, f.resonance, f.gain, self.sample_rate);
        } else {
            self.cutoff.set_target(f.cutoff);
            self.resonance.set_target(f.resonance);
            self.gain.set_target(f.gain);
        }
        self.formant.set_vowel(f.vowel, self.sample_rate);

        self.apply_dynamics(settings);
        self.wet.set_target(settings.reverb.wet);
    }

    /// Start crossfading to a new reverb kernel. Returns a kernel the reverb
    /// no longer needs, if any.
    pub fn replace_kernel(&mut self, kernel: Box<ConvolutionKernel>) -> Option<Box<ConvolutionKernel>> {
        self.reverb.replace(kernel)
    }

    /// A kernel that finished fading out, ready to be freed elsewhere.
    pub fn take_retired_kernel(&mut self) -> Option<Box<ConvolutionKernel>> {
        self.reverb.take_retired()
    }

    pub fn filter_kind(&self) -> FilterType {
        self.filter_kind
    }

    /// Run the chain over a block in place.
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let volume = self.volume.next();
            let (mut x_l, mut x_r) = (*l * volume, *r * volume);

            if self.filter_kind == FilterType::Formant {
                x_l = self.formant.process(0, x_l);
                x_r = self.formant.process(1, x_r);
            } else {
                let gliding = self.cutoff.is_smoothing()
                    || self.resonance.is_smoothing()
                    || self.gain.is_smoothing();
                if gliding {
                    self.coeffs = SvfCoefficients::new(
                        self.filter_kind,
                        self.cutoff.next(),
                        self.resonance.next(),
                        self.gain.next(),
                        self.sample_rate,
                    );
                }
                x_l = self.filters[0].process(x_l, &self.coeffs);
                x_r = self.filters[1].process(x_r, &self.coeffs);
            }

            let (x_l, x_r) = self.compressor.process(x_l, x_r);
            let (x_l, x_r) = self.limiter.process(x_l, x_r);

            let (wet_l, wet_r) = self.reverb.process(x_l, x_r);
            let wet = self.wet.next();
            *l = blend_dry_wet(x_l, wet_l, wet);
            *r = blend_dry_wet(x_r, wet_r, wet);
        }
    }
}
