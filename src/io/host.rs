//! cpal output stream wrapper.
//!
//! Opens the platform's default output device and drives an
//! [`EngineRenderer`] from its callback. Any failure to find a device or to
//! build or start a stream is fatal to start-up and surfaces as
//! [`EngineError::ResourceExhaustion`]; nothing here retries.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{error, info};

use crate::{
    engine::EngineRenderer,
    error::{EngineError, Result},
};

fn unavailable(context: &str, err: impl std::fmt::Display) -> EngineError {
    EngineError::ResourceExhaustion(format!("{context}: {err}"))
}

/// The default output device and the stream configuration it asked for.
pub struct AudioHost {
    device: cpal::Device,
    config: cpal::StreamConfig,
}

impl AudioHost {
    pub fn open_default() -> Result<Self> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or_else(|| {
            EngineError::ResourceExhaustion("no default output device available".into())
        })?;
        let supported = device
            .default_output_config()
            .map_err(|e| unavailable("failed to fetch default output config", e))?;

        let config: cpal::StreamConfig = supported.into();
        let name = device.name().unwrap_or_else(|_| "<unnamed>".into());
        info!(
            host = host.id().name(),
            device = %name,
            sample_rate = config.sample_rate.0,
            channels = config.channels,
            "audio device opened"
        );

        Ok(Self { device, config })
    }

    /// The rate the engine must be configured with.
    pub fn sample_rate(&self) -> f32 {
        self.config.sample_rate.0 as f32
    }

    pub fn channels(&self) -> usize {
        self.config.channels as usize
    }

    /// Move `renderer` into the device callback and start playing.
    pub fn start(&self, mut renderer: EngineRenderer) -> Result<OutputStream> {
        let channels = self.channels();

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    renderer.render_interleaved(data, channels);
                },
                |err| error!(%err, "audio stream error"),
                None,
            )
            .map_err(|e| unavailable("failed to build output stream", e))?;

        stream
            .play()
            .map_err(|e| unavailable("failed to start output stream", e))?;
        info!(channels, "output stream started");

        Ok(OutputStream { _stream: stream })
    }
}

/// A running output stream. Audio stops when this is dropped.
pub struct OutputStream {
    _stream: cpal::Stream,
}
