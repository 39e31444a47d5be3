//! Four-channel polyphonic mixer.
//!
//! ## Signal Flow
//!
//! ```text
//! (In1 × Level1 + In2 × Level2 + In3 × Level3 + In4 × Level4) × Master → Mix
//! ```
//!
//! Each channel of the mix sums the same channel of every connected input;
//! mono inputs are not broadcast. The mix carries as many channels as the
//! widest input.

use modrack_core::{Module, ModuleIo, ParamDescriptor, ParamUnit, PortDescriptor, ProcessArgs};

/// Number of mixer strips.
pub const STRIPS: usize = 4;

/// Param indices.
pub mod param {
    /// First strip level; strip `n` is at `LEVEL + n`.
    pub const LEVEL: usize = 0;
    /// Master level.
    pub const MASTER: usize = 4;
}

const PARAMS: &[ParamDescriptor] = &[
    ParamDescriptor::new("Level 1", 0.0, 1.0, 1.0).with_unit(ParamUnit::Percent),
    ParamDescriptor::new("Level 2", 0.0, 1.0, 1.0).with_unit(ParamUnit::Percent),
    ParamDescriptor::new("Level 3", 0.0, 1.0, 1.0).with_unit(ParamUnit::Percent),
    ParamDescriptor::new("Level 4", 0.0, 1.0, 1.0).with_unit(ParamUnit::Percent),
    ParamDescriptor::new("Master", 0.0, 1.0, 1.0).with_unit(ParamUnit::Percent),
];

const INPUTS: &[PortDescriptor] = &[
    PortDescriptor::new("In 1"),
    PortDescriptor::new("In 2"),
    PortDescriptor::new("In 3"),
    PortDescriptor::new("In 4"),
];

const OUTPUTS: &[PortDescriptor] = &[PortDescriptor::new("Mix")];

/// Four-strip mixer with master level.
///
/// ## Parameters
///
/// | Index | Name | Range | Default |
/// |-------|------|-------|---------|
/// | 0-3 | Level 1-4 | 0-100% | 100% |
/// | 4 | Master | 0-100% | 100% |
#[derive(Debug, Clone, Default)]
pub struct Mixer;

impl Mixer {
    /// Creates a mixer with every level at unity.
    pub fn new() -> Self {
        Self
    }
}

impl Module for Mixer {
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
        let channels = io.poly_channels(&[0, 1, 2, 3]);
        let master = io.param(param::MASTER);
        let mut mix = [0.0f32; modrack_core::PORT_MAX_CHANNELS];
        for strip in 0..STRIPS {
            let port = &io.inputs[strip];
            if !port.is_connected() {
                continue;
            }
            let level = io.param(param::LEVEL + strip);
            for (acc, v) in mix.iter_mut().zip(port.voltages()) {
                *acc += v * level;
            }
        }
        let out = &mut io.outputs[0];
        out.set_channels(channels);
        for (c, v) in mix.iter().take(channels).enumerate() {
            out.set_voltage(v * master, c);
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
        Mixer::new().process(&mut args, io);
    }

    fn feed(io: &mut ModuleIo, strip: usize, values: &[f32]) {
        io.inputs[strip].set_channels(values.len());
        io.inputs[strip].set_voltages(values);
    }

    #[test]
    fn sums_strips_with_levels() {
        let mut io = ModuleIo::for_module(&Mixer::new());
        feed(&mut io, 0, &[2.0]);
        feed(&mut io, 2, &[4.0]);
        io.params[param::LEVEL + 2].set_value(0.5);
        run(&mut io);
        assert_eq!(io.outputs[0].voltage(0), 4.0);
    }

    #[test]
    fn master_scales_mix() {
        let mut io = ModuleIo::for_module(&Mixer::new());
        feed(&mut io, 1, &[8.0]);
        io.params[param::MASTER].set_value(0.25);
        run(&mut io);
        assert_eq!(io.outputs[0].voltage(0), 2.0);
    }

    #[test]
    fn widest_input_sets_polyphony() {
        let mut io = ModuleIo::for_module(&Mixer::new());
        feed(&mut io, 0, &[1.0]);
        feed(&mut io, 3, &[1.0, 2.0, 3.0]);
        run(&mut io);
        assert_eq!(io.outputs[0].voltages(), &[2.0, 2.0, 3.0]);
    }

    #[test]
    fn silent_when_unpatched() {
        let mut io = ModuleIo::for_module(&Mixer::new());
        run(&mut io);
        assert_eq!(io.outputs[0].channels(), 1);
        assert_eq!(io.outputs[0].voltage(0), 0.0);
    }
}
