//! Merge: sixteen mono inputs into one polyphonic output.
//!
//! Input `n` feeds channel `n` of the output. In automatic mode the output
//! carries as many channels as the highest connected input; a fixed channel
//! count can be stored with the module's private data.

use modrack_core::{LightDescriptor, Module, ModuleIo, PORT_MAX_CHANNELS, PortDescriptor, ProcessArgs};
use serde_json::{Value, json};

const INPUTS: &[PortDescriptor] = &[
    PortDescriptor::new("1"),
    PortDescriptor::new("2"),
    PortDescriptor::new("3"),
    PortDescriptor::new("4"),
    PortDescriptor::new("5"),
    PortDescriptor::new("6"),
    PortDescriptor::new("7"),
    PortDescriptor::new("8"),
    PortDescriptor::new("9"),
    PortDescriptor::new("10"),
    PortDescriptor::new("11"),
    PortDescriptor::new("12"),
    PortDescriptor::new("13"),
    PortDescriptor::new("14"),
    PortDescriptor::new("15"),
    PortDescriptor::new("16"),
];

const OUTPUTS: &[PortDescriptor] = &[PortDescriptor::new("Poly")];

/// One light per output channel.
pub(crate) const CHANNEL_LIGHTS: &[LightDescriptor] = &[
    LightDescriptor::new("Channel 1"),
    LightDescriptor::new("Channel 2"),
    LightDescriptor::new("Channel 3"),
    LightDescriptor::new("Channel 4"),
    LightDescriptor::new("Channel 5"),
    LightDescriptor::new("Channel 6"),
    LightDescriptor::new("Channel 7"),
    LightDescriptor::new("Channel 8"),
    LightDescriptor::new("Channel 9"),
    LightDescriptor::new("Channel 10"),
    LightDescriptor::new("Channel 11"),
    LightDescriptor::new("Channel 12"),
    LightDescriptor::new("Channel 13"),
    LightDescriptor::new("Channel 14"),
    LightDescriptor::new("Channel 15"),
    LightDescriptor::new("Channel 16"),
];

/// Sixteen-to-one polyphonic merge.
#[derive(Debug, Clone, Default)]
pub struct Merge {
    /// Fixed output channel count; `None` follows the connected inputs.
    channels: Option<usize>,
}

impl Merge {
    /// Creates a merge in automatic mode.
    pub fn new() -> Self {
        Self { channels: None }
    }

    /// Fixes the output channel count (clamped to 1..=16), or restores
    /// automatic mode with `None`.
    pub fn set_channels(&mut self, channels: Option<usize>) {
        self.channels = channels.map(|n| n.clamp(1, PORT_MAX_CHANNELS));
    }

    /// Returns the fixed channel count, if any.
    pub fn channels(&self) -> Option<usize> {
        self.channels
    }
}

impl Module for Merge {
    fn inputs(&self) -> &'static [PortDescriptor] {
        INPUTS
    }

    fn outputs(&self) -> &'static [PortDescriptor] {
        OUTPUTS
    }

    fn lights(&self) -> &'static [LightDescriptor] {
        CHANNEL_LIGHTS
    }

    fn process(&mut self, _args: &mut ProcessArgs<'_>, io: &mut ModuleIo) {
        let channels = match self.channels {
            Some(n) => n,
            None => io
                .inputs
                .iter()
                .rposition(|port| port.is_connected())
                .map_or(1, |last| last + 1),
        };
        for c in 0..channels {
            let v = io.inputs[c].normal_voltage(0.0, 0);
            io.outputs[0].set_voltage(v, c);
        }
        io.outputs[0].set_channels(channels);
        for (c, light) in io.lights.iter_mut().enumerate() {
            light.set_brightness(if c < channels { 1.0 } else { 0.0 });
        }
    }

    fn on_reset(&mut self) {
        self.channels = None;
    }

    fn data_to_json(&self) -> Option<Value> {
        let channels = self.channels.map_or(-1, |n| n as i64);
        Some(json!({ "channels": channels }))
    }

    fn data_from_json(&mut self, data: &Value) {
        if let Some(n) = data.get("channels").and_then(Value::as_i64) {
            self.channels = if n < 1 {
                None
            } else {
                Some((n as usize).min(PORT_MAX_CHANNELS))
            };
        }
    }
}
