//! Benchmarks for oscillator waveform generation.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_synth::dsp::{oscillator::Oscillator, Waveform};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for waveform in [Waveform::Sine, Waveform::Sawtooth, Waveform::Square, Waveform::Triangle] {
            let mut osc = Oscillator::new(waveform, 440.0);
            group.bench_with_input(BenchmarkId::new(waveform.name(), size), &size, |b, _| {
                b.iter(|| {
                    osc.render(black_box(&mut buffer), SAMPLE_RATE);
                })
            });
        }

        // Per-sample frequency deviation, as the FM path drives it
        let mut carrier = Oscillator::new(Waveform::Sine, 440.0);
        let mut modulator = Oscillator::new(Waveform::Sine, 880.0);
        group.bench_with_input(BenchmarkId::new("fm_pair", size), &size, |b, _| {
            b.iter(|| {
                for sample in buffer.iter_mut() {
                    let deviation = modulator.next_sample(0.0, SAMPLE_RATE) * 200.0;
                    *sample = carrier.next_sample(black_box(deviation), SAMPLE_RATE);
                }
            })
        });
    }

    group.finish();
}
