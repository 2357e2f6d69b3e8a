//! Low-level DSP primitives used by the voice graph and the master bus.
//!
//! Everything here is allocation-free once constructed, so it can live inside
//! voices and the render-side bus. The one exception is building things:
//! noise buffers, impulse responses and convolution kernels allocate and
//! belong on the control thread.

/// Compressor and brick-wall limiter.
pub mod dynamics;
/// Attack/decay/sustain/release envelope generator.
pub mod envelope;
/// State-variable filter implementation with multiple responses.
pub mod filter;
/// Vowel formant resonator bank.
pub mod formant;
/// Summing, wet/dry blending and equal-power panning.
pub mod mix;
/// Ten colors of noise.
pub mod noise;
/// Band-limited oscillator waveforms.
pub mod oscillator;
/// Synthesized impulse responses and partitioned convolution.
pub mod reverb;
/// Click-free parameter ramps.
pub mod smooth;

pub use envelope::EnvelopeState;
pub use filter::FilterType;
pub use formant::Vowel;
pub use noise::NoiseType;
pub use oscillator::Waveform;
