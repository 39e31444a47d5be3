//! Audio device enumeration via cpal.

use crate::Result;
use cpal::Device;
use cpal::traits::{DeviceTrait, HostTrait};

/// Extract device name via `description()` (cpal 0.17+).
pub(crate) fn device_name(device: &Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// Audio device information.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioDevice {
    /// Human-readable device name.
    pub name: String,
    /// Whether the device supports audio input.
    pub is_input: bool,
    /// Whether the device supports audio output.
    pub is_output: bool,
    /// Default sample rate in Hz.
    pub default_sample_rate: u32,
    /// Default channel count of the device's preferred configuration.
    pub channels: u16,
}

fn describe_output(device: &Device, name: String) -> AudioDevice {
    let config = device.default_output_config().ok();
    AudioDevice {
        name,
        is_input: device.default_input_config().is_ok(),
        is_output: true,
        default_sample_rate: config.as_ref().map_or(48000, |c| c.sample_rate()),
        channels: config.as_ref().map_or(2, |c| c.channels()),
    }
}

fn describe_input(device: &Device, name: String) -> AudioDevice {
    let config = device.default_input_config().ok();
    AudioDevice {
        name,
        is_input: true,
        is_output: device.default_output_config().is_ok(),
        default_sample_rate: config.as_ref().map_or(48000, |c| c.sample_rate()),
        channels: config.as_ref().map_or(2, |c| c.channels()),
    }
}

/// List all available audio devices of the default host.
pub fn list_devices() -> Result<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let mut devices: Vec<AudioDevice> = Vec::new();

    if let Ok(outputs) = host.output_devices() {
        for device in outputs {
            if let Ok(name) = device_name(&device) {
                devices.push(describe_output(&device, name));
            }
        }
    }

    // Input-only devices
    if let Ok(inputs) = host.input_devices() {
        for device in inputs {
            if let Ok(name) = device_name(&device) {
                if devices.iter().any(|d| d.name == name) {
                    continue;
                }
                devices.push(describe_input(&device, name));
            }
        }
    }

    Ok(devices)
}

/// Get the default input and output devices of the default host.
pub fn default_device() -> Result<(Option<AudioDevice>, Option<AudioDevice>)> {
    let host = cpal::default_host();

    let input = host
        .default_input_device()
        .and_then(|d| device_name(&d).ok().map(|name| describe_input(&d, name)));
    let output = host
        .default_output_device()
        .and_then(|d| device_name(&d).ok().map(|name| describe_output(&d, name)));

    Ok((input, output))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_devices_does_not_fail() {
        // Device availability depends on the system; enumeration must not error.
        let devices = list_devices().unwrap();
        for device in devices {
            assert!(device.is_input || device.is_output);
        }
    }
}
