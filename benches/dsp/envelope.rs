//! Benchmarks for the ADSR envelope generator.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_synth::dsp::envelope::Envelope;
use saavy_synth::graph::RenderCtx;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");
    let ctx = RenderCtx::from_freq(SAMPLE_RATE, 440.0, 100.0);

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Ramping stages: retrigger so every block stays in attack
        let mut env = Envelope::adsr(1.0, 0.3, 0.6, 0.5);
        group.bench_with_input(BenchmarkId::new("attack", size), &size, |b, _| {
            b.iter(|| {
                env.note_on(&ctx);
                env.render(black_box(&mut buffer), black_box(&ctx));
            })
        });

        let mut env = Envelope::adsr(0.001, 0.001, 0.6, 0.5);
        env.note_on(&ctx);
        for _ in 0..200 {
            env.next_sample(&ctx);
        }
        group.bench_with_input(BenchmarkId::new("sustain", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer), black_box(&ctx));
            })
        });

        let mut env = Envelope::adsr(0.001, 0.001, 0.6, 1.0);
        group.bench_with_input(BenchmarkId::new("release", size), &size, |b, _| {
            b.iter(|| {
                env.note_on(&ctx);
                env.next_sample(&ctx);
                env.note_off(&ctx);
                env.render(black_box(&mut buffer), black_box(&ctx));
            })
        });
    }

    group.finish();
}
