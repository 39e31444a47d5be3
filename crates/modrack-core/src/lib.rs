//! modrack core - the real-time engine of a modular synthesizer rack
//!
//! This crate provides the data model and the engine that advances a patch of
//! interconnected modules one sample frame at a time, with zero allocation on
//! the audio thread.
//!
//! # Core Abstractions
//!
//! ## Signal Data
//!
//! - [`Port`] - Up to 16 polyphonic voltages with connection state
//! - [`Param`] - Bounded control value, with engine-side smoothing
//! - [`Light`] - Indicator brightness
//!
//! ## Modules
//!
//! - [`Module`] - Object-safe trait every processing unit implements
//! - [`ModuleIo`] - Port, param and light storage lent to `process`
//! - [`ParamDescriptor`], [`PortDescriptor`], [`LightDescriptor`] - Static shape
//!
//! ## Engine
//!
//! - [`Engine`] - Owns modules and cables, steps blocks on the audio thread
//! - [`EngineHandle`] - Thread-safe command interface for everything else
//! - [`RackGate`] - Coarse gate for whole-rack operations
//!
//! # Threading Model
//!
//! One real-time thread owns the [`Engine`] and calls
//! [`Engine::process_block`] (or [`Engine::step_block`]). Any number of other
//! threads hold clones of the [`EngineHandle`]. Commands are applied at the
//! top of the next block in FIFO order; removed modules are dropped by
//! [`EngineHandle::collect_garbage`] on the calling thread.
//!
//! # Logging
//!
//! Enable the `tracing` feature to log handle operations. Nothing is logged
//! from the real-time thread.
//!
//! # Example
//!
//! ```rust
//! use modrack_core::{CableSpec, Engine, EngineConfig, Module, ModuleInstance, ModuleIo,
//!     ParamDescriptor, PortDescriptor, ProcessArgs};
//!
//! struct Constant;
//! struct Gain;
//!
//! const OUT: &[PortDescriptor] = &[PortDescriptor::new("Out")];
//! const IN: &[PortDescriptor] = &[PortDescriptor::new("In")];
//! const GAIN: &[ParamDescriptor] = &[ParamDescriptor::new("Gain", -10.0, 10.0, 1.0)];
//!
//! impl Module for Constant {
//!     fn outputs(&self) -> &'static [PortDescriptor] { OUT }
//!     fn process(&mut self, _: &mut ProcessArgs<'_>, io: &mut ModuleIo) {
//!         io.outputs[0].set_voltage(5.0, 0);
//!     }
//! }
//!
//! impl Module for Gain {
//!     fn inputs(&self) -> &'static [PortDescriptor] { IN }
//!     fn outputs(&self) -> &'static [PortDescriptor] { OUT }
//!     fn params(&self) -> &'static [ParamDescriptor] { GAIN }
//!     fn process(&mut self, _: &mut ProcessArgs<'_>, io: &mut ModuleIo) {
//!         let v = io.inputs[0].normal_voltage(0.0, 0) * io.param(0);
//!         io.outputs[0].set_voltage(v, 0);
//!     }
//! }
//!
//! let (mut engine, handle) = Engine::new(EngineConfig::default()).unwrap();
//! let (a, _) = handle.add_module(ModuleInstance::new(Box::new(Constant))).unwrap();
//! let (b, _) = handle.add_module(ModuleInstance::new(Box::new(Gain))).unwrap();
//! handle.set_param(b, 0, 2.0).unwrap();
//! handle.add_cable(CableSpec::new(a, 0, b, 0)).unwrap();
//!
//! engine.step_block(1);
//! assert_eq!(engine.module(b).unwrap().output(0).unwrap().voltage(0), 10.0);
//! ```

pub mod descriptor;
pub mod error;
pub mod graph;
pub mod light;
pub mod module;
pub mod param;
pub mod port;

pub use descriptor::{
    LightDescriptor, ParamDescriptor, ParamFlags, ParamScale, ParamUnit, PortDescriptor,
};
pub use error::{EngineError, Result};
pub use graph::{
    AudioBlock, BlockOutcome, BulkGuard, Cable, CableId, CableSpec, Engine, EngineConfig,
    EngineEvent, EngineHandle, EngineState, EngineStatus, Garbage, MAX_BLOCK_SIZE, ModelKey,
    ModuleId, ModuleInstance, ModuleShape, RackGate, Receipt, RejectReason, StatusSnapshot,
};
pub use light::Light;
pub use module::{AUDIO_FRAME_CHANNELS, AudioFrame, Module, ModuleIo, ProcessArgs};
pub use param::{Param, SMOOTHING_LAMBDA};
pub use port::{Input, Output, PORT_MAX_CHANNELS, Port};
