//! Polyphonic sine oscillator.
//!
//! ## Signal Flow
//!
//! ```text
//! f = Frequency × 2^(V/Oct + FM × FM Amount)
//! phase += f × sample_time
//! Out = Level × sin(2π × phase)
//! ```
//!
//! One phase accumulator per channel; polyphony follows the V/Oct input.
//! Frequencies are capped just under Nyquist, recomputed whenever the
//! sample rate changes.

use core::f32::consts::TAU;

use libm::{exp2f, sinf};
use modrack_core::{
    LightDescriptor, Module, ModuleIo, PORT_MAX_CHANNELS, ParamDescriptor, ParamScale, ParamUnit,
    PortDescriptor, ProcessArgs,
};

/// Param indices.
pub mod param {
    /// Base frequency in Hz (at 0 V on V/Oct).
    pub const FREQUENCY: usize = 0;
    /// Exponential FM depth in octaves per volt.
    pub const FM_AMOUNT: usize = 1;
    /// Peak output voltage.
    pub const LEVEL: usize = 2;
}

/// Input indices.
pub mod input {
    /// 1 V/octave pitch.
    pub const VOCT: usize = 0;
    /// Exponential frequency modulation.
    pub const FM: usize = 1;
}

/// C4.
const DEFAULT_FREQUENCY: f32 = 261.625_58;

/// Fraction of the sample rate the oscillator may reach.
const NYQUIST_GUARD: f32 = 0.45;

const PARAMS: &[ParamDescriptor] = &[
    ParamDescriptor::new("Frequency", 0.1, 20_000.0, DEFAULT_FREQUENCY)
        .with_unit(ParamUnit::Hertz)
        .with_scale(ParamScale::Logarithmic),
    ParamDescriptor::new("FM Amount", -1.0, 1.0, 0.0),
    ParamDescriptor::new("Level", 0.0, 10.0, 5.0).with_unit(ParamUnit::Volts),
];

const INPUTS: &[PortDescriptor] = &[
    PortDescriptor::new("V/Oct").with_description("1 V/octave pitch, sets polyphony"),
    PortDescriptor::new("FM"),
];

const OUTPUTS: &[PortDescriptor] = &[PortDescriptor::new("Out")];

const LIGHTS: &[LightDescriptor] = &[LightDescriptor::new("Phase")];

/// Sine oscillator with 1 V/oct tracking and exponential FM.
///
/// ## Parameters
///
/// | Index | Name | Range | Default |
/// |-------|------|-------|---------|
/// | 0 | Frequency | 0.1-20000 Hz | 261.63 Hz |
/// | 1 | FM Amount | -1-1 oct/V | 0.0 |
/// | 2 | Level | 0-10 V | 5.0 V |
#[derive(Debug, Clone)]
pub struct SineOsc {
    /// Phase accumulators in [0.0, 1.0), one per channel.
    phases: [f32; PORT_MAX_CHANNELS],
    /// Highest frequency allowed at the current sample rate.
    max_frequency: f32,
}

impl Default for SineOsc {
    fn default() -> Self {
        Self::new()
    }
}

impl SineOsc {
    /// Creates an oscillator with every phase at zero.
    pub fn new() -> Self {
        Self {
            phases: [0.0; PORT_MAX_CHANNELS],
            max_frequency: 48_000.0 * NYQUIST_GUARD,
        }
    }

    /// Current phase of a channel, in [0.0, 1.0).
    pub fn phase(&self, channel: usize) -> f32 {
        self.phases.get(channel).copied().unwrap_or(0.0)
    }
}

impl Module for SineOsc {
    fn inputs(&self) -> &'static [PortDescriptor] {
        INPUTS
    }

    fn outputs(&self) -> &'static [PortDescriptor] {
        OUTPUTS
    }

    fn params(&self) -> &'static [ParamDescriptor] {
        PARAMS
    }

    fn lights(&self) -> &'static [LightDescriptor] {
        LIGHTS
    }

    fn process(&mut self, args: &mut ProcessArgs<'_>, io: &mut ModuleIo) {
        let base = io.param(param::FREQUENCY);
        let fm_amount = io.param(param::FM_AMOUNT);
        let level = io.param(param::LEVEL);
        let channels = io.poly_channels(&[input::VOCT]);

        for c in 0..channels {
            let pitch = io.inputs[input::VOCT].normal_voltage(0.0, c)
                + io.inputs[input::FM].normal_poly_voltage(0.0, c) * fm_amount;
            let freq = (base * exp2f(pitch)).clamp(0.0, self.max_frequency);
            let phase = &mut self.phases[c];
            *phase += freq * args.sample_time;
            *phase -= libm::floorf(*phase);
            io.outputs[0].set_voltage(level * sinf(TAU * *phase), c);
        }
        io.outputs[0].set_channels(channels);

        let brightness = if self.phases[0] < 0.5 { 1.0 } else { 0.0 };
        io.lights[0].set_brightness(brightness);
    }

    fn on_sample_rate_change(&mut self, sample_rate: f32) {
        self.max_frequency = sample_rate * NYQUIST_GUARD;
    }

    fn on_reset(&mut self) {
        self.phases = [0.0; PORT_MAX_CHANNELS];
    }
}
