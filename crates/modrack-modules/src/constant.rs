//! Constant voltage source.
//!
//! Emits the Voltage param on every channel of its output. The Channels
//! param sets the polyphony, so a single Constant can feed a poly input.

use modrack_core::{
    Module, ModuleIo, ParamDescriptor, ParamFlags, ParamUnit, PortDescriptor, ProcessArgs,
};

/// Param indices.
pub mod param {
    /// Output voltage.
    pub const VOLTAGE: usize = 0;
    /// Output channel count.
    pub const CHANNELS: usize = 1;
}

const PARAMS: &[ParamDescriptor] = &[
    ParamDescriptor::new("Voltage", -10.0, 10.0, 0.0).with_unit(ParamUnit::Volts),
    ParamDescriptor::new("Channels", 1.0, 16.0, 1.0).with_flags(ParamFlags::STEPPED),
];

const OUTPUTS: &[PortDescriptor] =
    &[PortDescriptor::new("Out").with_description("Constant voltage, one value per channel")];

/// Constant voltage source.
///
/// ## Parameters
///
/// | Index | Name | Range | Default |
/// |-------|------|-------|---------|
/// | 0 | Voltage | -10-10 V | 0.0 V |
/// | 1 | Channels | 1-16 | 1 |
///
/// # Example
///
/// ```rust
/// use modrack_core::{Engine, EngineConfig, ModuleInstance};
/// use modrack_modules::{Constant, constant};
///
/// let (mut engine, handle) = Engine::new(EngineConfig::default()).unwrap();
/// let (id, _) = handle.add_module(ModuleInstance::new(Box::new(Constant::new()))).unwrap();
/// handle.set_param(id, constant::param::VOLTAGE, 5.0).unwrap();
/// engine.step_block(1);
/// assert_eq!(engine.module(id).unwrap().output(0).unwrap().voltage(0), 5.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Constant;

impl Constant {
    /// Creates a constant source.
    pub fn new() -> Self {
        Self
    }
}

impl Module for Constant {
    fn outputs(&self) -> &'static [PortDescriptor] {
        OUTPUTS
    }

    fn params(&self) -> &'static [ParamDescriptor] {
        PARAMS
    }

    fn process(&mut self, _args: &mut ProcessArgs<'_>, io: &mut ModuleIo) {
        let voltage = io.param(param::VOLTAGE);
        let channels = io.param(param::CHANNELS) as usize;
        let out = &mut io.outputs[0];
        out.set_channels(channels);
        for c in 0..out.channels() {
            out.set_voltage(voltage, c);
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
        Constant::new().process(&mut args, io);
    }

    #[test]
    fn defaults_to_mono_zero() {
        let module = Constant::new();
        let mut io = ModuleIo::for_module(&module);
        run(&mut io);
        assert_eq!(io.outputs[0].channels(), 1);
        assert_eq!(io.outputs[0].voltage(0), 0.0);
    }

    #[test]
    fn fills_every_channel() {
        let module = Constant::new();
        let mut io = ModuleIo::for_module(&module);
        io.params[param::VOLTAGE].set_value(-3.5);
        io.params[param::CHANNELS].set_value(6.0);
        run(&mut io);
        assert_eq!(io.outputs[0].channels(), 6);
        assert!(io.outputs[0].voltages().iter().all(|&v| v == -3.5));
        assert_eq!(io.outputs[0].voltage(6), 0.0);
    }
}
