//! Benchmarks for the whole render path: command drain, voices, master bus.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_synth::{EngineConfig, NoteId, SynthEngine};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/engine");

    for voices in [1usize, 8, 32] {
        for &size in BLOCK_SIZES {
            let config = EngineConfig::default()
                .with_sample_rate(SAMPLE_RATE)
                .with_seed(9)
                .with_watchdog(3_600.0);
            let Ok((mut engine, mut renderer)) = SynthEngine::new(config) else {
                return;
            };
            for i in 0..voices {
                let _ = engine.play(NoteId::from_midi(36 + i as u8 * 2));
            }

            let mut left = vec![0.0f32; size];
            let mut right = vec![0.0f32; size];
            let id = format!("{}_voices", voices);
            group.bench_with_input(BenchmarkId::new(id, size), &size, |b, _| {
                b.iter(|| {
                    renderer.render(black_box(&mut left), black_box(&mut right));
                })
            });
        }
    }

    group.finish();
}
