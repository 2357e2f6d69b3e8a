//! Summing, wet/dry blending and stereo placement.

use std::f32::consts::FRAC_PI_2;

/*
Mixing and Panning
==================

Vocabulary
----------

  summing       Adding signals at their own levels. Voices are summed onto
                the master bus; nothing stops the sum from passing ±1.0,
                which is what the dynamics stages downstream are for.

  wet/dry       dry = untouched signal, wet = effect output. The blend is a
                linear crossfade whose two weights always sum to 1.0:

                    dry_gain = 1 - wet
                    wet_gain = wet

  pan           Placement of a mono branch in the stereo field,
                -1.0 = hard left, 0.0 = center, +1.0 = hard right.


Equal-Power Panning
-------------------

A linear pan law (L = 1-x, R = x) makes a centered source sound quieter
than a hard-panned one, because two half-amplitude copies carry only half
the power. The equal-power law keeps L² + R² = 1 across the whole sweep:

    x = (pan + 1) / 2
    L = cos(x · π/2)
    R = sin(x · π/2)

    gain
      1.0 ─╮                  ╭─
           │ ╲ L          R ╱ │
     .707  │      ╲    ╱      │   ← both at √½ in the center
           │      ╱    ╲      │
      0.0 ─╯ ╱              ╲ ╰─
          -1.0      0.0      +1.0   pan
*/

/// Left/right gains for an equal-power pan position in [-1, 1].
#[inline]
pub fn pan_gains(pan: f32) -> (f32, f32) {
    let x = (pan.clamp(-1.0, 1.0) + 1.0) * 0.5;
    let angle = x * FRAC_PI_2;
    (angle.cos(), angle.sin())
}

/// Dry and wet gains for a wet mix in [0, 1]. They always sum to 1.
#[inline]
pub fn wet_dry_gains(wet: f32) -> (f32, f32) {
    let wet = wet.clamp(0.0, 1.0);
    (1.0 - wet, wet)
}

/// `dry` and `wet` crossfaded by `mix`, see [`wet_dry_gains`].
#[inline]
pub fn blend_dry_wet(dry: f32, wet: f32, mix: f32) -> f32 {
    let (dry_gain, wet_gain) = wet_dry_gains(mix);
    dry * dry_gain + wet * wet_gain
}

/// Add `b` into `a`, sample by sample.
#[inline]
pub fn sum_in_place(a: &mut [f32], b: &[f32]) {
    debug_assert_eq!(a.len(), b.len());

    for (sa, &sb) in a.iter_mut().zip(b.iter()) {
        *sa += sb;
    }
}
