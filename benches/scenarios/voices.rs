//! Benchmarks for a single voice graph, built the way the engine builds one.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_synth::{
    dsp::noise::NoiseGenerator,
    graph::{GraphNode, RenderCtx, VoiceGraph},
    patch::presets,
};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");
    let ctx = RenderCtx::from_freq(SAMPLE_RATE, 110.0, 127.0);
    let mut noise = NoiseGenerator::seeded(3);

    // Plain detuned oscillators, FM, and a noise-heavy texture
    for name in ["classic-lead", "fm-electric", "ocean-pad"] {
        let Some(settings) = presets::by_name(name) else {
            continue;
        };

        for &size in BLOCK_SIZES {
            let mut left = vec![0.0f32; size];
            let mut right = vec![0.0f32; size];
            let mut graph = VoiceGraph::build(&settings, 110.0, &mut noise, 0.5, SAMPLE_RATE);
            graph.note_on(&ctx);

            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    graph.render_block(black_box(&mut left), black_box(&mut right), &ctx);
                })
            });
        }
    }

    group.finish();
}
