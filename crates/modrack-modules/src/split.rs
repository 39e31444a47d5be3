//! Split: one polyphonic input into sixteen mono outputs.

use modrack_core::{LightDescriptor, Module, ModuleIo, PortDescriptor, ProcessArgs};

use crate::merge::CHANNEL_LIGHTS;

const INPUTS: &[PortDescriptor] = &[PortDescriptor::new("Poly")];

const OUTPUTS: &[PortDescriptor] = &[
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

/// One-to-sixteen polyphonic split.
///
/// Output `n` carries channel `n` of the input, or 0 V when the input has
/// fewer channels.
#[derive(Debug, Clone, Default)]
pub struct Split;

impl Split {
    /// Creates a split.
    pub fn new() -> Self {
        Self
    }
}

impl Module for Split {
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
        let input = &io.inputs[0];
        let channels = input.channels();
        for (c, out) in io.outputs.iter_mut().enumerate() {
            let v = if c < channels { input.voltage(c) } else { 0.0 };
            out.set_voltage(v, 0);
        }
        for (c, light) in io.lights.iter_mut().enumerate() {
            light.set_brightness(if c < channels { 1.0 } else { 0.0 });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modrack_core::AudioFrame;

    fn run(io: &mut ModuleIo) {
        let mut audio = AudioFrame::default();
        let mut args = ProcessArgs {
            sample_rate: 48000.0,
            sample_time: 1.0 / 48000.0,
            frame: 0,
            audio: &mut audio,
        };
        Split::new().process(&mut args, io);
    }

    #[test]
    fn spreads_channels_to_outputs() {
        let mut io = ModuleIo::for_module(&Split::new());
        io.inputs[0].set_channels(3);
        io.inputs[0].set_voltages(&[1.0, -2.0, 3.0]);
        run(&mut io);
        assert_eq!(io.outputs[0].voltage(0), 1.0);
        assert_eq!(io.outputs[1].voltage(0), -2.0);
        assert_eq!(io.outputs[2].voltage(0), 3.0);
        assert_eq!(io.outputs[3].voltage(0), 0.0);
        assert!(io.outputs.iter().all(|o| o.channels() == 1));
        assert_eq!(io.lights[2].brightness(), 1.0);
        assert_eq!(io.lights[3].brightness(), 0.0);
    }

    #[test]
    fn disconnected_input_zeroes_outputs() {
        let mut io = ModuleIo::for_module(&Split::new());
        io.outputs[0].set_voltage(4.0, 0);
        run(&mut io);
        assert_eq!(io.outputs[0].voltage(0), 0.0);
    }
}
