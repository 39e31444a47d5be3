//! Polyphonic VCA-style gain.
//!
//! ## Signal Flow
//!
//! ```text
//! In × (Gain + CV / 10) → Out
//! ```
//!
//! The CV input is normalled to 0 V. Output polyphony follows the input.

use modrack_core::{Module, ModuleIo, ParamDescriptor, ParamUnit, PortDescriptor, ProcessArgs};

/// Param indices.
pub mod param {
    /// Gain factor.
    pub const GAIN: usize = 0;
}

/// Input indices.
pub mod input {
    /// Signal input.
    pub const IN: usize = 0;
    /// Gain CV, 10 V adds one unit of gain.
    pub const CV: usize = 1;
}

const PARAMS: &[ParamDescriptor] =
    &[ParamDescriptor::new("Gain", -4.0, 4.0, 1.0).with_unit(ParamUnit::Ratio)];

const INPUTS: &[PortDescriptor] = &[
    PortDescriptor::new("In"),
    PortDescriptor::new("CV").with_description("Adds CV / 10 to the gain"),
];

const OUTPUTS: &[PortDescriptor] = &[PortDescriptor::new("Out")];

/// Polyphonic gain.
///
/// ## Parameters
///
/// | Index | Name | Range | Default |
/// |-------|------|-------|---------|
/// | 0 | Gain | -4-4 x | 1.0 x |
#[derive(Debug, Clone, Default)]
pub struct Gain;

impl Gain {
    /// Creates a unity gain.
    pub fn new() -> Self {
        Self
    }
}

impl Module for Gain {
    fn inputs(&self) -> &'static [PortDescriptor] {
        INPUTS
    }

    fn outputs(&self) -> &'static [PortDescriptor] {
        OUTPUTS
    }

    fn params(&self) -> &'static [ParamDescriptor] {
        PARAMS
    }

    fn process(&mut self, _args: &mut ProcessArgs<'_>, io: &mut ModuleIo) {
        let gain = io.param(param::GAIN);
        let channels = io.inputs[input::IN].channels().max(1);
        for c in 0..channels {
            let cv = io.inputs[input::CV].normal_poly_voltage(0.0, c);
            let v = io.inputs[input::IN].normal_voltage(0.0, c) * (gain + cv / 10.0);
            io.outputs[0].set_voltage(v, c);
        }
        io.outputs[0].set_channels(channels);
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
        Gain::new().process(&mut args, io);
    }

    #[test]
    fn scales_input() {
        let mut io = ModuleIo::for_module(&Gain::new());
        io.inputs[input::IN].set_channels(1);
        io.inputs[input::IN].set_voltage(5.0, 0);
        io.params[param::GAIN].set_value(2.0);
        run(&mut io);
        assert_eq!(io.outputs[0].voltage(0), 10.0);
    }

    #[test]
    fn follows_input_polyphony() {
        let mut io = ModuleIo::for_module(&Gain::new());
        io.inputs[input::IN].set_channels(3);
        io.inputs[input::IN].set_voltages(&[1.0, 2.0, 3.0]);
        io.params[param::GAIN].set_value(-1.0);
        run(&mut io);
        assert_eq!(io.outputs[0].voltages(), &[-1.0, -2.0, -3.0]);
    }

    #[test]
    fn cv_adds_to_gain() {
        let mut io = ModuleIo::for_module(&Gain::new());
        io.inputs[input::IN].set_channels(1);
        io.inputs[input::IN].set_voltage(1.0, 0);
        io.inputs[input::CV].set_channels(1);
        io.inputs[input::CV].set_voltage(10.0, 0);
        run(&mut io);
        assert_eq!(io.outputs[0].voltage(0), 2.0);
    }

    #[test]
    fn disconnected_input_outputs_silence() {
        let mut io = ModuleIo::for_module(&Gain::new());
        run(&mut io);
        assert_eq!(io.outputs[0].channels(), 1);
        assert_eq!(io.outputs[0].voltage(0), 0.0);
    }
}
