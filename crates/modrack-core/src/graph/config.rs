//! Engine sizing and startup parameters.

use crate::error::{EngineError, Result};

/// Largest block size the engine accepts.
pub const MAX_BLOCK_SIZE: usize = 8192;

/// Startup configuration of an [`Engine`](super::Engine).
///
/// Every table the real-time thread touches is allocated from these limits
/// when the engine is created; nothing grows afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Initial sample rate in Hz.
    pub sample_rate: f32,
    /// Initial block size in frames.
    pub block_size: usize,
    /// Maximum number of registered modules.
    pub max_modules: usize,
    /// Maximum number of registered cables.
    pub max_cables: usize,
    /// Capacity of the command queue.
    pub command_capacity: usize,
    /// Capacity of the event queue (real-time → non-real-time).
    pub event_capacity: usize,
    /// Capacity of the deferred-drop queue.
    pub garbage_capacity: usize,
    /// Number of params that may be smoothed at once.
    pub max_smoothing: usize,
    /// Measure per-module processing time.
    pub cpu_meter: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            block_size: 256,
            max_modules: 256,
            max_cables: 1024,
            command_capacity: 4096,
            event_capacity: 256,
            garbage_capacity: 1024,
            max_smoothing: 16,
            cpu_meter: false,
        }
    }
}

impl EngineConfig {
    /// Sets the initial sample rate.
    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Sets the initial block size.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Sets the module and cable limits.
    pub fn with_limits(mut self, max_modules: usize, max_cables: usize) -> Self {
        self.max_modules = max_modules;
        self.max_cables = max_cables;
        self
    }

    /// Sets the command queue capacity.
    pub fn with_command_capacity(mut self, capacity: usize) -> Self {
        self.command_capacity = capacity;
        self
    }

    /// Enables or disables the CPU meter.
    pub fn with_cpu_meter(mut self, enabled: bool) -> Self {
        self.cpu_meter = enabled;
        self
    }

    /// Checks the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(EngineError::InvalidSampleRate(self.sample_rate));
        }
        if self.block_size == 0 || self.block_size > MAX_BLOCK_SIZE {
            return Err(EngineError::InvalidBlockSize(self.block_size));
        }
        if self.max_modules == 0 {
            return Err(EngineError::InvalidConfig("max_modules must be positive"));
        }
        if self.command_capacity == 0 || self.event_capacity == 0 || self.garbage_capacity == 0 {
            return Err(EngineError::InvalidConfig("queue capacities must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_sample_rate() {
        let config = EngineConfig::default().with_sample_rate(0.0);
        assert_eq!(config.validate(), Err(EngineError::InvalidSampleRate(0.0)));
        let config = EngineConfig::default().with_sample_rate(f32::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_bad_block_size() {
        let config = EngineConfig::default().with_block_size(0);
        assert_eq!(config.validate(), Err(EngineError::InvalidBlockSize(0)));
        let config = EngineConfig::default().with_block_size(MAX_BLOCK_SIZE + 1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_queue() {
        let config = EngineConfig::default().with_command_capacity(0);
        assert!(matches!(config.validate(), Err(EngineError::InvalidConfig(_))));
    }
}
