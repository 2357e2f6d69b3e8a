use crate::{
    config::EngineConfig,
    dsp::noise::NoiseGenerator,
    graph::{node::GraphNode, voice_graph::VoiceGraph},
    patch::Settings,
};

/// Builds the signal graph for one note from the current settings.
///
/// This is the "instrument design" layer: the engine calls it on the control
/// path for every note-on and ships the finished graph to the renderer.
pub trait VoiceFactory: Send {
    type Voice: GraphNode;

    fn create_voice(&mut self, settings: &Settings, frequency: f32) -> Self::Voice;
}

impl<F, T> VoiceFactory for F
where
    F: FnMut(&Settings, f32) -> T + Send,
    T: GraphNode,
{
    type Voice = T;

    fn create_voice(&mut self, settings: &Settings, frequency: f32) -> Self::Voice {
        self(settings, frequency)
    }
}

/// The standard factory: oscillators, looped noise and FM per [`Settings`].
pub struct GraphFactory {
    noise: NoiseGenerator,
    sample_rate: f32,
    noise_seconds: f32,
}

impl GraphFactory {
    pub fn new(config: &EngineConfig) -> Self {
        let noise = match config.seed {
            Some(seed) => NoiseGenerator::seeded(seed),
            None => NoiseGenerator::new(),
        };
        Self {
            noise,
            sample_rate: config.sample_rate,
            noise_seconds: config.noise_seconds,
        }
    }
}

impl VoiceFactory for GraphFactory {
    type Voice = VoiceGraph;

    fn create_voice(&mut self, settings: &Settings, frequency: f32) -> VoiceGraph {
        VoiceGraph::build(
            settings,
            frequency,
            &mut self.noise,
            self.noise_seconds,
            self.sample_rate,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::RenderCtx;

    struct Silence;

    impl GraphNode for Silence {
        fn render_block(&mut self, left: &mut [f32], right: &mut [f32], _ctx: &RenderCtx) {
            left.fill(0.0);
            right.fill(0.0);
        }
    }

    #[test]
    fn closures_are_factories() {
        let mut built = 0;
        let mut factory = |_: &Settings, _: f32| {
            built += 1;
            Silence
        };
        factory.create_voice(&Settings::default(), 440.0);
        factory.create_voice(&Settings::default(), 220.0);
        drop(factory);
        assert_eq!(built, 2);
    }

    #[test]
    fn graph_factory_tracks_settings() {
        let mut factory = GraphFactory::new(&EngineConfig::default().with_seed(1));
        let mut settings = Settings::default();
        assert_eq!(factory.create_voice(&settings, 440.0).oscillator_count(), 2);

        settings.oscillators[2].level = 0.5;
        settings.noise.level = 0.2;
        let graph = factory.create_voice(&settings, 440.0);
        assert_eq!(graph.oscillator_count(), 3);
        assert!(graph.has_noise());
    }
}
