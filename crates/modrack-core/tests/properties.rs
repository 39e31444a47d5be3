//! Property-based tests for modrack-core.
//!
//! Tests port channel bounds, param clamping, cable summation and
//! deterministic stepping using proptest for randomized input generation.

use proptest::prelude::*;
use modrack_core::{
    CableSpec, Engine, EngineConfig, Module, ModuleId, ModuleInstance, ModuleIo, PORT_MAX_CHANNELS,
    Param, ParamDescriptor, Port, PortDescriptor, ProcessArgs,
};

const IN: &[PortDescriptor] = &[PortDescriptor::new("In")];
const OUT: &[PortDescriptor] = &[PortDescriptor::new("Out")];
const LEVEL: &[ParamDescriptor] = &[ParamDescriptor::new("Level", -10.0, 10.0, 0.0)];

/// Emits `Level + c` on each of its channels.
struct PolySource {
    channels: usize,
}

impl Module for PolySource {
    fn outputs(&self) -> &'static [PortDescriptor] {
        OUT
    }

    fn params(&self) -> &'static [ParamDescriptor] {
        LEVEL
    }

    fn process(&mut self, _args: &mut ProcessArgs<'_>, io: &mut ModuleIo) {
        let level = io.param(0);
        io.outputs[0].set_channels(self.channels);
        for c in 0..self.channels {
            io.outputs[0].set_voltage(level + c as f32, c);
        }
    }
}

/// Copies its input to its output and adds one, creating feedback state.
struct Accumulate;

impl Module for Accumulate {
    fn inputs(&self) -> &'static [PortDescriptor] {
        IN
    }

    fn outputs(&self) -> &'static [PortDescriptor] {
        OUT
    }

    fn params(&self) -> &'static [ParamDescriptor] {
        LEVEL
    }

    fn process(&mut self, _args: &mut ProcessArgs<'_>, io: &mut ModuleIo) {
        let v = io.inputs[0].normal_voltage(0.0, 0) * 0.5 + io.param(0);
        io.outputs[0].set_voltage(v, 0);
    }
}

/// Builds a ring of `n` accumulators with the given levels and runs it.
fn run_ring(levels: &[f32], frames: usize) -> Vec<f32> {
    let (mut engine, handle) = Engine::new(EngineConfig::default()).unwrap();
    let ids: Vec<ModuleId> = levels
        .iter()
        .map(|&level| {
            let (id, _) = handle
                .add_module(ModuleInstance::new(Box::new(Accumulate)))
                .unwrap();
            handle.set_param(id, 0, level).unwrap();
            id
        })
        .collect();
    for (i, &id) in ids.iter().enumerate() {
        let next = ids[(i + 1) % ids.len()];
        handle.add_cable(CableSpec::new(id, 0, next, 0)).unwrap();
    }
    engine.step_block(frames);
    ids.iter()
        .map(|&id| engine.module(id).unwrap().output(0).unwrap().voltage(0))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// For any requested channel count, an output port carries 1..=16
    /// channels and reads zero above its count.
    #[test]
    fn output_channels_stay_in_bounds(requested in 0usize..64, fill in -10.0f32..10.0) {
        let mut port = Port::new_output();
        for c in 0..PORT_MAX_CHANNELS {
            port.set_voltage(fill, c);
        }
        port.set_channels(requested);
        let channels = port.channels();
        prop_assert!((1..=PORT_MAX_CHANNELS).contains(&channels));
        for c in channels..PORT_MAX_CHANNELS {
            prop_assert_eq!(port.voltage(c), 0.0);
        }
    }

    /// A disconnected input always yields the normal value, on every channel.
    #[test]
    fn disconnected_input_yields_normal(normal in -100.0f32..100.0, channel in 0usize..16) {
        let port = Port::new();
        prop_assert_eq!(port.normal_voltage(normal, channel), normal);
        prop_assert_eq!(port.normal_poly_voltage(normal, channel), normal);
    }

    /// Param values never leave their range, whatever is written.
    #[test]
    fn param_value_stays_in_range(
        min in -100.0f32..100.0,
        span in 0.0f32..200.0,
        writes in prop::collection::vec(prop::num::f32::ANY, 1..32),
    ) {
        let desc = ParamDescriptor::new("P", min, min + span, min);
        let mut param = Param::new(&desc);
        for w in writes {
            param.set_value(w);
            let v = param.value();
            prop_assert!(v >= param.min() && v <= param.max(), "{v} outside [{}, {}]", param.min(), param.max());
        }
    }

    /// Smoothing converges to any in-range target and lands on it exactly.
    #[test]
    fn smoothing_lands_on_target(start in -10.0f32..10.0, target in -10.0f32..10.0) {
        let desc = ParamDescriptor::new("P", -10.0, 10.0, start);
        let mut param = Param::new(&desc);
        let coeff = 60.0 / 48000.0;
        let mut done = false;
        for _ in 0..200_000 {
            if param.advance_toward(target, coeff) {
                done = true;
                break;
            }
        }
        prop_assert!(done);
        prop_assert_eq!(param.value(), target);
    }

    /// An input fed by several cables reads the per-channel sum, with the
    /// channel count of the widest source.
    #[test]
    fn fan_in_is_channel_wise_sum(
        sources in prop::collection::vec((1usize..=16, -5.0f32..5.0), 1..6),
    ) {
        let (mut engine, handle) = Engine::new(EngineConfig::default()).unwrap();
        let (dest, _) = handle
            .add_module(ModuleInstance::new(Box::new(Accumulate)))
            .unwrap();
        for &(channels, level) in &sources {
            let (id, _) = handle
                .add_module(ModuleInstance::new(Box::new(PolySource { channels })))
                .unwrap();
            handle.set_param(id, 0, level).unwrap();
            handle.add_cable(CableSpec::new(id, 0, dest, 0)).unwrap();
        }
        // Sources run after the destination: values arrive one frame late.
        engine.step_block(2);

        let widest = sources.iter().map(|&(n, _)| n).max().unwrap_or(0);
        let input = engine.module(dest).unwrap().input(0).unwrap();
        prop_assert_eq!(input.channels(), widest);
        for c in 0..widest {
            let expected: f32 = sources
                .iter()
                .filter(|&&(n, _)| c < n)
                .map(|&(_, level)| level + c as f32)
                .sum();
            prop_assert!((input.voltage(c) - expected).abs() < 1e-4);
        }
    }

    /// Identical racks produce identical voltages, feedback included.
    #[test]
    fn stepping_is_deterministic(
        levels in prop::collection::vec(-5.0f32..5.0, 1..8),
        frames in 1usize..256,
    ) {
        let first = run_ring(&levels, frames);
        let second = run_ring(&levels, frames);
        prop_assert_eq!(first, second);
    }

    /// Output voltages of a damped feedback ring stay finite.
    #[test]
    fn feedback_ring_stays_finite(levels in prop::collection::vec(-10.0f32..10.0, 2..8)) {
        for v in run_ring(&levels, 4096) {
            prop_assert!(v.is_finite());
        }
    }
}
