//! Criterion benchmarks for the real-time engine (`modrack-core::graph`).
//!
//! Measures per-frame engine overhead using a trivial `Gain` module. Three
//! axes:
//!
//! - **Chain** - `step_block()` throughput for linear chains of growing length
//! - **Fan-in** - summing many cables into one input
//! - **Commands** - draining a burst of param changes at block start
//!
//! Run with: `cargo bench -p modrack-core -- engine/`
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use modrack_core::{
    AudioBlock, CableSpec, Engine, EngineConfig, EngineHandle, Module, ModuleId, ModuleInstance,
    ModuleIo, ParamDescriptor, PortDescriptor, ProcessArgs,
};

const BLOCK_SIZE: usize = 256;
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512, 1024];

// ---------------------------------------------------------------------------
// Trivial modules
// ---------------------------------------------------------------------------

const IN: &[PortDescriptor] = &[PortDescriptor::new("In")];
const OUT: &[PortDescriptor] = &[PortDescriptor::new("Out")];
const GAIN: &[ParamDescriptor] = &[ParamDescriptor::new("Gain", -2.0, 2.0, 0.9)];

/// Polyphonic gain: the cheapest module that still reads and writes ports.
struct Gain;

impl Module for Gain {
    fn inputs(&self) -> &'static [PortDescriptor] {
        IN
    }

    fn outputs(&self) -> &'static [PortDescriptor] {
        OUT
    }

    fn params(&self) -> &'static [ParamDescriptor] {
        GAIN
    }

    fn process(&mut self, _args: &mut ProcessArgs<'_>, io: &mut ModuleIo) {
        let gain = io.param(0);
        let channels = io.inputs[0].channels().max(1);
        io.outputs[0].set_channels(channels);
        for c in 0..channels {
            let v = io.inputs[0].normal_voltage(1.0, c) * gain;
            io.outputs[0].set_voltage(v, c);
        }
    }
}

/// Writes its first input to device output 0.
struct Sink;

impl Module for Sink {
    fn inputs(&self) -> &'static [PortDescriptor] {
        IN
    }

    fn process(&mut self, args: &mut ProcessArgs<'_>, io: &mut ModuleIo) {
        args.audio.outputs[0] = io.inputs[0].voltage(0) / 10.0;
    }
}

// ---------------------------------------------------------------------------
// Rack constructors
// ---------------------------------------------------------------------------

fn make_chain(n: usize, block_size: usize) -> (Engine, EngineHandle, Vec<ModuleId>) {
    let config = EngineConfig::default().with_block_size(block_size);
    let (mut engine, handle) = Engine::new(config).unwrap();
    let mut ids = Vec::with_capacity(n);
    for _ in 0..n {
        let (id, _) = handle.add_module(ModuleInstance::new(Box::new(Gain))).unwrap();
        if let Some(&prev) = ids.last() {
            handle.add_cable(CableSpec::new(prev, 0, id, 0)).unwrap();
        }
        ids.push(id);
    }
    let (sink, _) = handle.add_module(ModuleInstance::new(Box::new(Sink))).unwrap();
    if let Some(&last) = ids.last() {
        handle.add_cable(CableSpec::new(last, 0, sink, 0)).unwrap();
    }
    engine.step_block(1);
    (engine, handle, ids)
}

fn make_fan_in(sources: usize) -> Engine {
    let (mut engine, handle) = Engine::new(EngineConfig::default()).unwrap();
    let (dest, _) = handle.add_module(ModuleInstance::new(Box::new(Gain))).unwrap();
    for _ in 0..sources {
        let (src, _) = handle.add_module(ModuleInstance::new(Box::new(Gain))).unwrap();
        handle.add_cable(CableSpec::new(src, 0, dest, 0)).unwrap();
    }
    engine.step_block(1);
    engine
}

// ---------------------------------------------------------------------------
// Chain benchmarks - fixed block size 256
// ---------------------------------------------------------------------------

fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/chain");

    for &n in &[1usize, 8, 32, 128] {
        let (mut engine, _handle, _) = make_chain(n, BLOCK_SIZE);
        let mut output = vec![0.0f32; BLOCK_SIZE * 2];
        group.bench_with_input(BenchmarkId::new("modules", n), &n, |b, _| {
            b.iter(|| {
                let mut block = AudioBlock::output_only(&mut output, 2);
                black_box(engine.process_block(&mut block));
            });
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Fan-in
// ---------------------------------------------------------------------------

fn bench_fan_in(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/fan_in");

    for &sources in &[2usize, 16, 64] {
        let mut engine = make_fan_in(sources);
        group.bench_with_input(BenchmarkId::new("cables", sources), &sources, |b, _| {
            b.iter(|| black_box(engine.step_block(BLOCK_SIZE)));
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Command drain - 64 param changes per block
// ---------------------------------------------------------------------------

fn bench_commands(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/commands");

    let (mut engine, handle, ids) = make_chain(16, BLOCK_SIZE);
    group.bench_function("set_param_64", |b| {
        b.iter(|| {
            for i in 0..64 {
                let id = ids[i % ids.len()];
                handle.set_param(id, 0, (i as f32) / 64.0).unwrap();
            }
            black_box(engine.step_block(BLOCK_SIZE));
        });
    });

    group.bench_function("set_smooth_param_16", |b| {
        b.iter(|| {
            for (i, &id) in ids.iter().enumerate() {
                handle.set_smooth_param(id, 0, (i as f32) / 16.0).unwrap();
            }
            black_box(engine.step_block(BLOCK_SIZE));
        });
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Block size sweep - 8-module chain across all standard block sizes
// ---------------------------------------------------------------------------

fn bench_block_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/block_sweep");

    for &block_size in BLOCK_SIZES {
        let (mut engine, _handle, _) = make_chain(8, block_size);
        let input = vec![0.5f32; block_size * 2];
        let mut output = vec![0.0f32; block_size * 2];

        group.bench_with_input(
            BenchmarkId::new("chain_8", block_size),
            &block_size,
            |b, _| {
                b.iter(|| {
                    let mut block = AudioBlock::new(black_box(&input), 2, &mut output, 2);
                    black_box(engine.process_block(&mut block));
                });
            },
        );
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

criterion_group!(
    benches,
    bench_chain,
    bench_fan_in,
    bench_commands,
    bench_block_sweep
);
criterion_main!(benches);
