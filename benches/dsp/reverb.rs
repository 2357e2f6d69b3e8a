//! Benchmarks for the partitioned convolution reverb.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use rand::{rngs::SmallRng, SeedableRng};
use saavy_synth::dsp::reverb::{ConvolutionKernel, ConvolutionReverb, ImpulseResponse};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

fn reverb(room_size: f32) -> ConvolutionReverb {
    let mut rng = SmallRng::seed_from_u64(7);
    let ir = ImpulseResponse::for_room(room_size, SAMPLE_RATE, &mut rng);
    ConvolutionReverb::new(Box::new(ConvolutionKernel::new(&ir, 256)), SAMPLE_RATE)
}

pub fn bench_reverb(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/reverb");

    for &size in BLOCK_SIZES {
        // Impulse-like attack with a quiet tail
        let input: Vec<f32> = (0..size)
            .map(|i| {
                if i < 10 {
                    1.0 - (i as f32 / 10.0)
                } else {
                    (i as f32 * 0.05).sin() * 0.1
                }
            })
            .collect();

        for (label, room) in [("small_room", 0.0), ("large_room", 1.0)] {
            let mut reverb = reverb(room);
            group.bench_with_input(BenchmarkId::new(label, size), &size, |b, _| {
                b.iter(|| {
                    let mut sum = 0.0f32;
                    for &sample in &input {
                        let (l, r) = reverb.process(black_box(sample), black_box(sample));
                        sum += l + r;
                    }
                    sum
                })
            });
        }
    }

    // Kernel construction happens on the control path on room-size changes
    group.sample_size(10);
    let mut rng = SmallRng::seed_from_u64(7);
    group.bench_function("build_kernel_large_room", |b| {
        b.iter(|| {
            let ir = ImpulseResponse::for_room(black_box(1.0), SAMPLE_RATE, &mut rng);
            ConvolutionKernel::new(&ir, 256)
        })
    });

    group.finish();
}
