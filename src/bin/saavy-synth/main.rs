//! saavy-synth - play a chord through the default audio device
//!
//! Run with: cargo run -- --preset warm-pad --seconds 4

use std::{thread, time::Duration};

use clap::Parser;
use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use tracing::info;
use tracing_subscriber::EnvFilter;

use saavy_synth::{io::AudioHost, patch::presets, EngineConfig, NoteId, SynthEngine};

#[derive(Parser, Debug)]
#[command(name = "saavy-synth")]
#[command(about = "Polyphonic synthesizer engine demo")]
#[command(version)]
struct Args {
    /// Factory preset to load before playing
    #[arg(long)]
    preset: Option<String>,

    /// How long to hold the chord, in seconds
    #[arg(long, default_value_t = 3.0)]
    seconds: f32,

    /// Notes to play
    #[arg(long, num_args = 1.., default_values = ["C4", "E4", "G4"])]
    notes: Vec<String>,

    /// Parameter overrides applied after the preset, e.g. `filter.cutoff=800`
    #[arg(long = "set", value_name = "PATH=VALUE")]
    overrides: Vec<String>,

    /// List the factory presets and exit
    #[arg(long)]
    list_presets: bool,
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    if args.list_presets {
        for name in presets::NAMES {
            println!("{name}");
        }
        return Ok(());
    }

    let notes = args
        .notes
        .iter()
        .map(|n| n.parse::<NoteId>())
        .collect::<Result<Vec<_>, _>>()?;

    let host = AudioHost::open_default()?;
    let config = EngineConfig::default().with_sample_rate(host.sample_rate());
    let (mut engine, renderer) = SynthEngine::new(config)?;

    if let Some(name) = &args.preset {
        engine
            .load_factory_preset(name)
            .wrap_err_with(|| format!("unknown preset `{name}`, try --list-presets"))?;
    }

    for item in &args.overrides {
        let (path, value) = item
            .split_once('=')
            .ok_or_else(|| eyre!("override `{item}` is not PATH=VALUE"))?;
        engine.set_parameter(path.trim(), value.trim())?;
    }

    let _stream = host.start(renderer)?;

    for &note in &notes {
        engine.play(note)?;
    }
    info!(notes = ?notes, seconds = args.seconds, "playing");

    let hold = Duration::from_secs_f32(args.seconds.max(0.0));
    let tick = Duration::from_millis(50);
    let mut held = Duration::ZERO;
    while held < hold {
        thread::sleep(tick);
        held += tick;
        engine.collect();
    }

    engine.stop_all_notes()?;
    let tail = engine.settings().envelope.release + engine.config().release_margin + 0.5;
    thread::sleep(Duration::from_secs_f32(tail));
    engine.collect();

    info!("done");
    Ok(())
}
