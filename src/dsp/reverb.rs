//! Reverb - Room Simulation via Convolution
//!
//! A room is characterized by its impulse response: what comes back when you
//! clap once. Convolving any signal with that response places the signal in
//! the room. No recorded rooms are used here; the response is synthesized as
//! a burst of noise with a decaying envelope.
//!
//! # Synthesized Impulse
//!
//! ```text
//! h[n] = u[n] * (1 - n/L)^decay        u[n] uniform in [-1, 1], 0 <= n < L
//!
//!  amp
//!   │▌▌
//!   │▌▌▌▌▖
//!   │▌▌▌▌▌▌▌▖▖
//!   │▌▌▌▌▌▌▌▌▌▌▌▖▖▖▖
//!   └────────────────────────→ n
//!   0                        L
//! ```
//!
//! Each channel draws its own noise so the tail is decorrelated left/right.
//! Room size (0 to 1) sets both length and steepness:
//!
//! ```text
//! duration = 0.5 + 3 * room   seconds   (0.5 .. 3.5)
//! decay    = 2   + 3 * room             (2 .. 5)
//! ```
//!
//! # Partitioned Convolution
//!
//! A multi-second response is far too long to convolve sample by sample.
//! The kernel is cut into partitions of B samples, each transformed once
//! into a 2B-point spectrum. The input is processed one block of B samples
//! at a time (overlap-save):
//!
//! ```text
//!  input block j ──→ FFT(prev B ++ current B) ──→ X_j ──┐
//!                                                       ↓
//!    frequency-domain delay line:  X_j  X_j-1  X_j-2 ... X_j-P+1
//!                                   ×     ×      ×          ×
//!    kernel partitions:            H_0   H_1    H_2  ...  H_P-1
//!                                   └─────┴──────┴─── Σ ────┘
//!                                                   ↓
//!                                  IFFT, keep last B samples ──→ output
//! ```
//!
//! Output lags input by one block. Everything a kernel needs (spectra, delay
//! line, FFT plans, scratch) is allocated when it is built, so it can be
//! built on the control thread and handed to the render thread whole.
//!
//! # Normalization
//!
//! Random impulses vary in energy, so the kernel is scaled by the inverse of
//! its RMS power with a fixed calibration:
//!
//! ```text
//! power = sqrt(Σ h² / (channels * L))      (floored at 0.000125)
//! scale = 0.00125 / power * 44100 / sample_rate
//! ```

use std::sync::Arc;

use rand::Rng;
use rustfft::{num_complex::Complex, Fft, FftPlanner};

const GAIN_CALIBRATION: f32 = 0.00125;
const GAIN_CALIBRATION_SAMPLE_RATE: f32 = 44_100.0;
const MIN_POWER: f32 = 0.000125;

/// Length of the fade from an outgoing kernel to its replacement.
pub const KERNEL_CROSSFADE_SECONDS: f32 = 0.05;

/// A synthesized stereo room response.
#[derive(Debug, Clone)]
pub struct ImpulseResponse {
    channels: [Vec<f32>; 2],
    duration: f32,
    decay: f32,
    sample_rate: f32,
}

impl ImpulseResponse {
    /// Duration in seconds and decay exponent for a room size in [0, 1].
    pub fn room_params(room_size: f32) -> (f32, f32) {
        let room = room_size.clamp(0.0, 1.0);
        (0.5 + room * 3.0, 2.0 + room * 3.0)
    }

    pub fn generate<R: Rng>(duration: f32, decay: f32, sample_rate: f32, rng: &mut R) -> Self {
        let len = (duration * sample_rate).round().max(1.0) as usize;

        let mut channel = || -> Vec<f32> {
            (0..len)
                .map(|n| {
                    let envelope = (1.0 - n as f32 / len as f32).powf(decay);
                    rng.gen_range(-1.0f32..=1.0) * envelope
                })
                .collect()
        };
        let left = channel();
        let right = channel();

        Self {
            channels: [left, right],
            duration,
            decay,
            sample_rate,
        }
    }

    pub fn for_room<R: Rng>(room_size: f32, sample_rate: f32, rng: &mut R) -> Self {
        let (duration, decay) = Self::room_params(room_size);
        Self::generate(duration, decay, sample_rate, rng)
    }

    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels[0].is_empty()
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn decay(&self) -> f32 {
        self.decay
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    /// Gain that brings this response to the calibrated loudness.
    pub fn normalization_scale(&self) -> f32 {
        let energy: f32 = self.channels.iter().flatten().map(|x| x * x).sum();
        let mut power = (energy / (2 * self.len()) as f32).sqrt();
        if !power.is_finite() || power < MIN_POWER {
            power = MIN_POWER;
        }
        GAIN_CALIBRATION / power * GAIN_CALIBRATION_SAMPLE_RATE / self.sample_rate
    }
}

/// Stereo uniformly-partitioned convolution kernel with its own running state.
pub struct ConvolutionKernel {
    block: usize,
    partitions: usize,
    spectra: [Vec<Complex<f32>>; 2],
    delay_line: [Vec<Complex<f32>>; 2],
    head: usize,
    history: [Vec<f32>; 2],
    output: [Vec<f32>; 2],
    work: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    scale: f32,
}

impl ConvolutionKernel {
    /// Build a normalized kernel from a synthesized response.
    pub fn new(ir: &ImpulseResponse, block: usize) -> Self {
        Self::from_channels([ir.channel(0), ir.channel(1)], block, ir.normalization_scale())
    }

    pub fn from_channels(channels: [&[f32]; 2], block: usize, scale: f32) -> Self {
        let block = block.max(1);
        let fft_len = 2 * block;
        let len = channels[0].len().max(channels[1].len());
        let partitions = len.div_ceil(block).max(1);

        let mut planner = FftPlanner::<f32>::new();
        let forward = planner.plan_fft_forward(fft_len);
        let inverse = planner.plan_fft_inverse(fft_len);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());
        let mut scratch = vec![Complex::default(); scratch_len];

        let spectra = channels.map(|h| {
            let mut spectrum = vec![Complex::default(); partitions * fft_len];
            for (p, bins) in spectrum.chunks_exact_mut(fft_len).enumerate() {
                let start = (p * block).min(h.len());
                let end = (start + block).min(h.len());
                for (bin, &x) in bins.iter_mut().zip(&h[start..end]) {
                    *bin = Complex::new(x * scale, 0.0);
                }
                forward.process_with_scratch(bins, &mut scratch);
            }
            spectrum
        });

        Self {
            block,
            partitions,
            spectra,
            delay_line: std::array::from_fn(|_| vec![Complex::default(); partitions * fft_len]),
            head: 0,
            history: std::array::from_fn(|_| vec![0.0; fft_len]),
            output: std::array::from_fn(|_| vec![0.0; block]),
            work: vec![Complex::default(); fft_len],
            scratch,
            forward,
            inverse,
            scale,
        }
    }

    pub fn block_size(&self) -> usize {
        self.block
    }

    pub fn partitions(&self) -> usize {
        self.partitions
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    #[inline]
    fn output_at(&self, pos: usize) -> (f32, f32) {
        (self.output[0][pos], self.output[1][pos])
    }

    /// Convolve one full block per channel. The result is read back during
    /// the following block.
    pub fn process_block(&mut self, input: [&[f32]; 2]) {
        let block = self.block;
        let fft_len = 2 * block;
        let norm = 1.0 / fft_len as f32;

        for ch in 0..2 {
            let history = &mut self.history[ch];
            history.copy_within(block.., 0);
            history[block..].copy_from_slice(&input[ch][..block]);

            for (w, &x) in self.work.iter_mut().zip(history.iter()) {
                *w = Complex::new(x, 0.0);
            }
            self.forward
                .process_with_scratch(&mut self.work, &mut self.scratch);

            let slot = self.head * fft_len;
            self.delay_line[ch][slot..slot + fft_len].copy_from_slice(&self.work);

            self.work.fill(Complex::default());
            for k in 0..self.partitions {
                let age = (self.head + self.partitions - k) % self.partitions;
                let x = &self.delay_line[ch][age * fft_len..(age + 1) * fft_len];
                let h = &self.spectra[ch][k * fft_len..(k + 1) * fft_len];
                for ((acc, &xi), &hi) in self.work.iter_mut().zip(x).zip(h) {
                    *acc += xi * hi;
                }
            }
            self.inverse
                .process_with_scratch(&mut self.work, &mut self.scratch);

            for (out, w) in self.output[ch].iter_mut().zip(&self.work[block..]) {
                *out = w.re * norm;
            }
        }

        self.head = (self.head + 1) % self.partitions;
    }
}

/// Streaming stereo convolution reverb that can swap kernels without a click.
pub struct ConvolutionReverb {
    block: usize,
    pos: usize,
    input: [Vec<f32>; 2],
    current: Box<ConvolutionKernel>,
    incoming: Option<Box<ConvolutionKernel>>,
    retired: Option<Box<ConvolutionKernel>>,
    fade: u32,
    fade_len: u32,
}

impl ConvolutionReverb {
    pub fn new(kernel: Box<ConvolutionKernel>, sample_rate: f32) -> Self {
        let block = kernel.block_size();
        Self {
            block,
            pos: 0,
            input: std::array::from_fn(|_| vec![0.0; block]),
            current: kernel,
            incoming: None,
            retired: None,
            fade: 0,
            fade_len: (KERNEL_CROSSFADE_SECONDS * sample_rate).round().max(1.0) as u32,
        }
    }

    pub fn block_size(&self) -> usize {
        self.block
    }

    pub fn is_crossfading(&self) -> bool {
        self.incoming.is_some()
    }

    /// Start fading to `kernel`. Returns whatever kernel this displaces (a
    /// mismatched kernel, or a replacement that had not finished fading in)
    /// so the caller can free it elsewhere.
    pub fn replace(&mut self, kernel: Box<ConvolutionKernel>) -> Option<Box<ConvolutionKernel>> {
        if kernel.block_size() != self.block {
            return Some(kernel);
        }
        self.fade = 0;
        self.incoming.replace(kernel)
    }

    /// The outgoing kernel once a crossfade completes.
    pub fn take_retired(&mut self) -> Option<Box<ConvolutionKernel>> {
        self.retired.take()
    }

    /// Feed one stereo sample, get one fully-wet stereo sample back.
    #[inline]
    pub fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        self.input[0][self.pos] = left;
        self.input[1][self.pos] = right;

        let (mut out_l, mut out_r) = self.current.output_at(self.pos);
        if let Some(incoming) = &self.incoming {
            let t = self.fade as f32 / self.fade_len as f32;
            let (in_l, in_r) = incoming.output_at(self.pos);
            out_l = out_l * (1.0 - t) + in_l * t;
            out_r = out_r * (1.0 - t) + in_r * t;
            self.fade = (self.fade + 1).min(self.fade_len);
        }

        self.pos += 1;
        if self.pos == self.block {
            self.pos = 0;
            self.advance_block();
        }

        (out_l, out_r)
    }

    fn advance_block(&mut self) {
        let input = [self.input[0].as_slice(), self.input[1].as_slice()];
        self.current.process_block(input);
        if let Some(incoming) = self.incoming.as_mut() {
            incoming.process_block(input);
        }

        if self.fade >= self.fade_len && self.retired.is_none() {
            if let Some(incoming) = self.incoming.take() {
                self.retired = Some(std::mem::replace(&mut self.current, incoming));
                self.fade = 0;
            }
        }
    }
}
