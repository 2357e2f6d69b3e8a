//! Benchmarks for the state-variable filter and the formant bank.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_synth::dsp::{
    filter::{SVFilter, SvfCoefficients},
    formant::FormantBank,
    FilterType, Vowel,
};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    for &size in BLOCK_SIZES {
        // Sawtooth-like ramp
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();
        let mut buffer = input.clone();

        for kind in [FilterType::Lowpass, FilterType::Bandpass, FilterType::Peaking] {
            let coeffs = SvfCoefficients::new(kind, 1_000.0, 2.0, 6.0, SAMPLE_RATE);
            let mut filter = SVFilter::new();
            group.bench_with_input(BenchmarkId::new(kind.name(), size), &size, |b, _| {
                b.iter(|| {
                    buffer.copy_from_slice(&input);
                    filter.render(black_box(&mut buffer), black_box(&coeffs));
                })
            });
        }

        // Gliding cutoff recomputes coefficients every sample
        let mut filter = SVFilter::new();
        group.bench_with_input(BenchmarkId::new("lowpass_sweep", size), &size, |b, _| {
            b.iter(|| {
                for (i, sample) in buffer.iter_mut().enumerate() {
                    let cutoff = 200.0 + i as f32 * 10.0;
                    let coeffs =
                        SvfCoefficients::new(FilterType::Lowpass, cutoff, 0.707, 0.0, SAMPLE_RATE);
                    *sample = filter.process(input[i], &coeffs);
                }
                black_box(&buffer);
            })
        });

        let mut formant = FormantBank::new(Vowel::O, SAMPLE_RATE);
        let mut right = input.clone();
        group.bench_with_input(BenchmarkId::new("formant", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                right.copy_from_slice(&input);
                formant.render(black_box(&mut buffer), black_box(&mut right));
            })
        });
    }

    group.finish();
}
