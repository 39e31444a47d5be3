//! Bridge between the rack and the audio device.
//!
//! Each frame the driver fills the shared [`AudioFrame`](modrack_core::AudioFrame)
//! with device input samples and reads the device output samples back after
//! every module has run.
//!
//! ## Scaling
//!
//! ```text
//! device input sample × 10           → Output n   (±1.0 full scale = ±10 V)
//! clamp(Input n / 10, -1.0, 1.0)     → device output sample
//! ```
//!
//! Polyphonic inputs are summed before scaling. Several interface modules add
//! their contributions to the same device output channel.

use modrack_core::{
    AUDIO_FRAME_CHANNELS, LightDescriptor, Module, ModuleIo, PortDescriptor, ProcessArgs,
};

/// Volts per unit of device full scale.
pub const VOLTS_PER_UNIT: f32 = 10.0;

/// Number of stereo pairs shown by the activity lights.
pub const LIGHT_PAIRS: usize = AUDIO_FRAME_CHANNELS / 2;

/// Light indices.
pub mod light {
    /// First "to device" pair light; pair `n` is at `TO_DEVICE + n`.
    pub const TO_DEVICE: usize = 0;
    /// First "from device" pair light; pair `n` is at `FROM_DEVICE + n`.
    pub const FROM_DEVICE: usize = 4;
}

const INPUTS: &[PortDescriptor] = &[
    PortDescriptor::new("To device 1"),
    PortDescriptor::new("To device 2"),
    PortDescriptor::new("To device 3"),
    PortDescriptor::new("To device 4"),
    PortDescriptor::new("To device 5"),
    PortDescriptor::new("To device 6"),
    PortDescriptor::new("To device 7"),
    PortDescriptor::new("To device 8"),
];

const OUTPUTS: &[PortDescriptor] = &[
    PortDescriptor::new("From device 1"),
    PortDescriptor::new("From device 2"),
    PortDescriptor::new("From device 3"),
    PortDescriptor::new("From device 4"),
    PortDescriptor::new("From device 5"),
    PortDescriptor::new("From device 6"),
    PortDescriptor::new("From device 7"),
    PortDescriptor::new("From device 8"),
];

const LIGHTS: &[LightDescriptor] = &[
    LightDescriptor::new("To device 1-2"),
    LightDescriptor::new("To device 3-4"),
    LightDescriptor::new("To device 5-6"),
    LightDescriptor::new("To device 7-8"),
    LightDescriptor::new("From device 1-2"),
    LightDescriptor::new("From device 3-4"),
    LightDescriptor::new("From device 5-6"),
    LightDescriptor::new("From device 7-8"),
];

/// Eight-in, eight-out audio device interface.
///
/// A pair light is lit while the device exposes that pair and, for the
/// "to device" side, at least one of its inputs is patched.
#[derive(Debug, Clone, Default)]
pub struct AudioInterface;

impl AudioInterface {
    /// Creates an interface.
    pub fn new() -> Self {
        Self
    }
}

impl Module for AudioInterface {
    fn inputs(&self) -> &'static [PortDescriptor] {
        INPUTS
    }

    fn outputs(&self) -> &'static [PortDescriptor] {
        OUTPUTS
    }

    fn lights(&self) -> &'static [LightDescriptor] {
        LIGHTS
    }

    fn process(&mut self, args: &mut ProcessArgs<'_>, io: &mut ModuleIo) {
        let audio = &mut *args.audio;
        let from_device = audio.input_channels.min(AUDIO_FRAME_CHANNELS);
        let to_device = audio.output_channels.min(AUDIO_FRAME_CHANNELS);

        for (c, out) in io.outputs.iter_mut().enumerate() {
            let v = if c < from_device {
                audio.inputs[c] * VOLTS_PER_UNIT
            } else {
                0.0
            };
            out.set_voltage(v, 0);
        }

        for (c, port) in io.inputs.iter().enumerate().take(to_device) {
            if port.is_connected() {
                let sample = (port.voltage_sum() / VOLTS_PER_UNIT).clamp(-1.0, 1.0);
                audio.outputs[c] += sample;
            }
        }

        for pair in 0..LIGHT_PAIRS {
            let (l, r) = (pair * 2, pair * 2 + 1);
            let patched = io.inputs[l].is_connected() || io.inputs[r].is_connected();
            let to = if l < to_device && patched { 1.0 } else { 0.0 };
            let from = if l < from_device { 1.0 } else { 0.0 };
            io.lights[light::TO_DEVICE + pair].set_brightness(to);
            io.lights[light::FROM_DEVICE + pair].set_brightness(from);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modrack_core::AudioFrame;

    fn frame(inputs: &[f32], output_channels: usize) -> AudioFrame {
        let mut audio = AudioFrame::default();
        audio.inputs[..inputs.len()].copy_from_slice(inputs);
        audio.input_channels = inputs.len();
        audio.output_channels = output_channels;
        audio
    }

    fn run(io: &mut ModuleIo, audio: &mut AudioFrame) {
        let mut args = ProcessArgs {
            sample_rate: 48000.0,
            sample_time: 1.0 / 48000.0,
            frame: 0,
            audio,
        };
        AudioInterface::new().process(&mut args, io);
    }

    #[test]
    fn device_input_becomes_volts() {
        let mut io = ModuleIo::for_module(&AudioInterface::new());
        let mut audio = frame(&[0.5, -0.25], 2);
        run(&mut io, &mut audio);
        assert_eq!(io.outputs[0].voltage(0), 5.0);
        assert_eq!(io.outputs[1].voltage(0), -2.5);
        assert_eq!(io.outputs[2].voltage(0), 0.0);
        assert_eq!(io.lights[light::FROM_DEVICE].brightness(), 1.0);
        assert_eq!(io.lights[light::FROM_DEVICE + 1].brightness(), 0.0);
    }

    #[test]
    fn volts_become_clamped_device_output() {
        let mut io = ModuleIo::for_module(&AudioInterface::new());
        io.inputs[0].set_channels(1);
        io.inputs[0].set_voltage(5.0, 0);
        io.inputs[1].set_channels(1);
        io.inputs[1].set_voltage(-15.0, 0);
        let mut audio = frame(&[], 2);
        run(&mut io, &mut audio);
        assert_eq!(audio.outputs[0], 0.5);
        assert_eq!(audio.outputs[1], -1.0);
        assert_eq!(io.lights[light::TO_DEVICE].brightness(), 1.0);
    }

    #[test]
    fn poly_inputs_are_summed() {
        let mut io = ModuleIo::for_module(&AudioInterface::new());
        io.inputs[0].set_channels(3);
        io.inputs[0].set_voltages(&[1.0, 1.0, 1.0]);
        let mut audio = frame(&[], 1);
        run(&mut io, &mut audio);
        assert!((audio.outputs[0] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn channels_beyond_device_are_ignored() {
        let mut io = ModuleIo::for_module(&AudioInterface::new());
        io.inputs[3].set_channels(1);
        io.inputs[3].set_voltage(5.0, 0);
        let mut audio = frame(&[], 2);
        run(&mut io, &mut audio);
        assert_eq!(audio.outputs[3], 0.0);
        assert_eq!(io.lights[light::TO_DEVICE + 1].brightness(), 0.0);
    }

    #[test]
    fn two_interfaces_sum_into_device() {
        let mut first = ModuleIo::for_module(&AudioInterface::new());
        let mut second = ModuleIo::for_module(&AudioInterface::new());
        for io in [&mut first, &mut second] {
            io.inputs[0].set_channels(1);
            io.inputs[0].set_voltage(2.0, 0);
        }
        let mut audio = frame(&[], 2);
        run(&mut first, &mut audio);
        run(&mut second, &mut audio);
        assert!((audio.outputs[0] - 0.4).abs() < 1e-6);
    }
}
