//! Real-world scenario benchmarks: a single voice graph built from presets,
//! and the engine rendering a held chord through the master bus.

mod engine;
mod voices;

pub use engine::bench_engine;
pub use voices::bench_voices;
