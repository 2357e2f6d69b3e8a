//! Static engine configuration, fixed for the lifetime of an engine instance.
//!
//! Musical parameters live in [`Settings`](crate::patch::Settings) and can
//! change at any time; everything here sizes buffers and queues up front so
//! the render path never has to allocate.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Output sample rate in Hz. Must match the host stream.
    pub sample_rate: f32,
    /// Size of the renderer's voice table. When full, the oldest releasing
    /// voice is stolen.
    pub max_voices: usize,
    /// Capacity of the control → render command ring.
    pub command_capacity: usize,
    /// Length of the looping noise buffer generated for each voice.
    pub noise_seconds: f32,
    /// Extra time after the release ramp before a voice is torn down.
    pub release_margin: f32,
    /// A voice that never receives a stop is force-retired after this long.
    pub watchdog_seconds: f32,
    /// Partition length of the convolution reverb (power of two).
    pub reverb_partition: usize,
    /// Seed for the noise and impulse generators. `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            max_voices: 32,
            command_capacity: 256,
            noise_seconds: 2.0,
            release_margin: 0.1,
            watchdog_seconds: 30.0,
            reverb_partition: 256,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_max_voices(mut self, max_voices: usize) -> Self {
        self.max_voices = max_voices;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_watchdog(mut self, seconds: f32) -> Self {
        self.watchdog_seconds = seconds;
        self
    }

    /// Convert a duration in seconds to a whole number of frames.
    pub fn frames(&self, seconds: f32) -> u64 {
        (seconds.max(0.0) as f64 * self.sample_rate as f64).round() as u64
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.sample_rate.is_finite() && self.sample_rate >= 8_000.0) {
            return Err(EngineError::InvalidConfig(format!(
                "sample rate {} Hz is not usable",
                self.sample_rate
            )));
        }
        if self.max_voices == 0 {
            return Err(EngineError::InvalidConfig("max_voices must be at least 1".into()));
        }
        if self.command_capacity < 4 {
            return Err(EngineError::InvalidConfig(
                "command_capacity must be at least 4".into(),
            ));
        }
        if !(self.noise_seconds > 0.0) {
            return Err(EngineError::InvalidConfig("noise_seconds must be positive".into()));
        }
        if !(self.watchdog_seconds > 0.0) {
            return Err(EngineError::InvalidConfig(
                "watchdog_seconds must be positive".into(),
            ));
        }
        if !self.reverb_partition.is_power_of_two() || self.reverb_partition < 32 {
            return Err(EngineError::InvalidConfig(format!(
                "reverb partition {} must be a power of two >= 32",
                self.reverb_partition
            )));
        }
        Ok(())
    }
}
