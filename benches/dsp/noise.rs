//! Benchmarks for colored-noise buffer generation.
//!
//! Noise buffers are built on the control path when a note starts, so the
//! interesting number is the cost of one voice's loop, not a block.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_synth::dsp::noise::{NoiseGenerator, NoiseLoop, NoiseType};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_noise(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/noise");
    group.sample_size(20);

    let mut noise = NoiseGenerator::seeded(1);
    for kind in NoiseType::ALL {
        group.bench_with_input(BenchmarkId::new("generate_2s", kind.name()), &kind, |b, &kind| {
            b.iter(|| noise.generate(black_box(kind), 2.0, SAMPLE_RATE))
        });
    }

    // Reading the pre-rendered loop is what the render thread pays
    for &size in BLOCK_SIZES {
        let mut looped = NoiseLoop::new(noise.generate(NoiseType::Pink, 0.1, SAMPLE_RATE));
        let mut buffer = vec![0.0f32; size];
        group.bench_with_input(BenchmarkId::new("loop_read", size), &size, |b, _| {
            b.iter(|| {
                for sample in buffer.iter_mut() {
                    *sample = looped.next_sample();
                }
                black_box(&buffer);
            })
        });
    }

    group.finish();
}
