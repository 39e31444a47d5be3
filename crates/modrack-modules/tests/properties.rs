//! Property-based tests for the built-in modules.
//!
//! Tests output bounds, polyphony rules and device scaling using proptest
//! for randomized input generation.

use modrack_core::{AudioFrame, Module, ModuleIo, PORT_MAX_CHANNELS, ProcessArgs};
use modrack_modules::{AudioInterface, Gain, Mixer, SineOsc, Split, gain, mixer, sine_osc};
use proptest::prelude::*;

fn step(module: &mut dyn Module, io: &mut ModuleIo, audio: &mut AudioFrame) {
    let mut args = ProcessArgs {
        sample_rate: 48000.0,
        sample_time: 1.0 / 48000.0,
        frame: 0,
        audio,
    };
    module.process(&mut args, io);
}

fn feed(io: &mut ModuleIo, input: usize, values: &[f32]) {
    io.inputs[input].set_channels(values.len());
    io.inputs[input].set_voltages(values);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// For any level, pitch and FM, the oscillator stays within ±Level and
    /// produces finite output.
    #[test]
    fn sine_osc_output_bounded(
        level in 0.0f32..10.0,
        freq in 0.1f32..20000.0,
        pitch in prop::collection::vec(-10.0f32..10.0, 1..=PORT_MAX_CHANNELS),
        fm in -10.0f32..10.0,
        fm_amount in -1.0f32..1.0,
    ) {
        let mut osc = SineOsc::new();
        let mut io = ModuleIo::for_module(&osc);
        io.params[sine_osc::param::LEVEL].set_value(level);
        io.params[sine_osc::param::FREQUENCY].set_value(freq);
        io.params[sine_osc::param::FM_AMOUNT].set_value(fm_amount);
        feed(&mut io, sine_osc::input::VOCT, &pitch);
        feed(&mut io, sine_osc::input::FM, &[fm]);
        let mut audio = AudioFrame::default();
        for _ in 0..64 {
            step(&mut osc, &mut io, &mut audio);
            for &v in io.outputs[0].voltages() {
                prop_assert!(v.is_finite());
                prop_assert!(v.abs() <= level + 1e-3, "{v} exceeds level {level}");
            }
        }
        prop_assert_eq!(io.outputs[0].channels(), pitch.len());
    }

    /// Gain output polyphony always matches its input.
    #[test]
    fn gain_preserves_polyphony(
        values in prop::collection::vec(-10.0f32..10.0, 1..=PORT_MAX_CHANNELS),
        g in -4.0f32..4.0,
    ) {
        let mut module = Gain::new();
        let mut io = ModuleIo::for_module(&module);
        feed(&mut io, gain::input::IN, &values);
        io.params[gain::param::GAIN].set_value(g);
        step(&mut module, &mut io, &mut AudioFrame::default());
        prop_assert_eq!(io.outputs[0].channels(), values.len());
        for (out, v) in io.outputs[0].voltages().iter().zip(&values) {
            prop_assert!((out - v * g).abs() < 1e-4);
        }
    }

    /// With unity levels the mixer output is the channel-wise input sum.
    #[test]
    fn mixer_is_channel_wise_sum(
        strips in prop::collection::vec(
            prop::collection::vec(-5.0f32..5.0, 1..=4), mixer::STRIPS..=mixer::STRIPS),
    ) {
        let mut module = Mixer::new();
        let mut io = ModuleIo::for_module(&module);
        for (i, values) in strips.iter().enumerate() {
            feed(&mut io, i, values);
        }
        step(&mut module, &mut io, &mut AudioFrame::default());
        let widest = strips.iter().map(Vec::len).max().unwrap_or(1);
        prop_assert_eq!(io.outputs[0].channels(), widest);
        for c in 0..widest {
            let expected: f32 = strips.iter().filter_map(|s| s.get(c)).sum();
            prop_assert!((io.outputs[0].voltage(c) - expected).abs() < 1e-4);
        }
    }

    /// Split never leaks channels beyond the input's count.
    #[test]
    fn split_zeroes_missing_channels(
        values in prop::collection::vec(-10.0f32..10.0, 1..=PORT_MAX_CHANNELS),
    ) {
        let mut module = Split::new();
        let mut io = ModuleIo::for_module(&module);
        feed(&mut io, 0, &values);
        step(&mut module, &mut io, &mut AudioFrame::default());
        for (c, out) in io.outputs.iter().enumerate() {
            let expected = values.get(c).copied().unwrap_or(0.0);
            prop_assert_eq!(out.voltage(0), expected);
        }
    }

    /// Device output samples stay in [-1, 1] for any voltage.
    #[test]
    fn audio_interface_clamps_device_output(volts in prop::collection::vec(-100.0f32..100.0, 8)) {
        let mut module = AudioInterface::new();
        let mut io = ModuleIo::for_module(&module);
        for (i, v) in volts.iter().enumerate() {
            feed(&mut io, i, &[*v]);
        }
        let mut audio = AudioFrame { output_channels: 8, ..AudioFrame::default() };
        step(&mut module, &mut io, &mut audio);
        for (sample, v) in audio.outputs.iter().zip(&volts) {
            prop_assert!((-1.0..=1.0).contains(sample));
            prop_assert!((sample - (v / 10.0).clamp(-1.0, 1.0)).abs() < 1e-6);
        }
    }
}
