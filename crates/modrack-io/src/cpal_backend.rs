//! cpal-based audio backend.
//!
//! [`CpalBackend`] wraps [cpal](https://crates.io/crates/cpal) for
//! cross-platform device I/O: ALSA on Linux, CoreAudio on macOS, WASAPI on
//! Windows.

use crate::backend::{
    AudioBackend, BackendStreamConfig, ErrorCallback, InputCallback, OutputCallback, StreamHandle,
};
use crate::devices::device_name;
use crate::{AudioDevice, Error, Result};
use cpal::Host;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

/// cpal-based audio backend.
///
/// Holds the platform's default cpal [`Host`].
pub struct CpalBackend {
    host: Host,
}

impl CpalBackend {
    /// Create a backend on the platform's default audio host.
    pub fn new() -> Self {
        let host = cpal::default_host();
        tracing::info!(host = host.id().name(), "cpal backend initialized");
        Self { host }
    }

    /// Find a device whose name contains `search` (case-insensitive), or
    /// the default device when `search` is `None`.
    fn find_device(&self, search: Option<&str>, output: bool) -> Result<cpal::Device> {
        let direction = if output { "output" } else { "input" };
        let Some(search) = search else {
            let device = if output {
                self.host.default_output_device()
            } else {
                self.host.default_input_device()
            };
            return device.ok_or(Error::NoDevice);
        };

        let search_lower = search.to_lowercase();
        let devices: Vec<cpal::Device> = if output {
            self.host
                .output_devices()
                .map_err(|e| Error::Stream(e.to_string()))?
                .collect()
        } else {
            self.host
                .input_devices()
                .map_err(|e| Error::Stream(e.to_string()))?
                .collect()
        };

        devices
            .into_iter()
            .find(|device| {
                device_name(device).is_ok_and(|name| name.to_lowercase().contains(&search_lower))
            })
            .ok_or_else(|| {
                Error::DeviceNotFound(format!("no {direction} device matching '{search}'"))
            })
    }

    fn stream_config(config: &BackendStreamConfig) -> Result<cpal::StreamConfig> {
        if config.channels == 0 {
            return Err(Error::InvalidChannels(0));
        }
        Ok(cpal::StreamConfig {
            channels: config.channels,
            sample_rate: config.sample_rate,
            buffer_size: config
                .buffer_size
                .map_or(cpal::BufferSize::Default, cpal::BufferSize::Fixed),
        })
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for CpalBackend {
    fn name(&self) -> &'static str {
        "cpal"
    }

    fn list_devices(&self) -> Result<Vec<AudioDevice>> {
        crate::devices::list_devices()
    }

    fn default_output_device(&self) -> Result<Option<AudioDevice>> {
        let (_, output) = crate::devices::default_device()?;
        Ok(output)
    }

    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        mut callback: OutputCallback,
        mut error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        let device = self.find_device(config.device_name.as_deref(), true)?;
        let stream_config = Self::stream_config(config)?;

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    callback(data);
                },
                move |err| {
                    error_callback(&err.to_string());
                },
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;

        stream.play().map_err(|e| Error::Stream(e.to_string()))?;
        tracing::info!(
            channels = config.channels,
            sample_rate = config.sample_rate,
            "output stream started"
        );

        Ok(StreamHandle::new(stream))
    }

    fn build_input_stream(
        &self,
        config: &BackendStreamConfig,
        mut callback: InputCallback,
        mut error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        let device = self.find_device(config.device_name.as_deref(), false)?;
        let stream_config = Self::stream_config(config)?;

        let stream = device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    callback(data);
                },
                move |err| {
                    error_callback(&err.to_string());
                },
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;

        stream.play().map_err(|e| Error::Stream(e.to_string()))?;
        tracing::info!(
            channels = config.channels,
            sample_rate = config.sample_rate,
            "input stream started"
        );

        Ok(StreamHandle::new(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpal_backend_name() {
        assert_eq!(CpalBackend::new().name(), "cpal");
    }

    #[test]
    fn test_zero_channels_rejected() {
        let config = BackendStreamConfig {
            channels: 0,
            ..BackendStreamConfig::default()
        };
        assert!(matches!(
            CpalBackend::stream_config(&config),
            Err(Error::InvalidChannels(0))
        ));
    }

    #[test]
    fn test_stream_config_buffer_size() {
        let config = BackendStreamConfig {
            buffer_size: Some(128),
            ..BackendStreamConfig::default()
        };
        let stream_config = CpalBackend::stream_config(&config).unwrap();
        assert_eq!(stream_config.buffer_size, cpal::BufferSize::Fixed(128));
        assert_eq!(stream_config.channels, 2);
    }
}
