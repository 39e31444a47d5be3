//! modrack modules - the built-in module set
//!
//! This crate provides the modules every rack starts with, built on
//! modrack-core:
//!
//! - [`Constant`] - Polyphonic constant voltage
//! - [`Gain`] - Polyphonic gain with CV
//! - [`Mixer`] - Four strips and a master level
//! - [`SineOsc`] - 1 V/oct sine oscillator with exponential FM
//! - [`Merge`] / [`Split`] - Mono ↔ polyphonic conversion
//! - [`AudioInterface`] - Device inputs and outputs as rack ports
//!
//! Port, param and light indices are exported as constants from each
//! module's `param`, `input` and `light` submodules.
//!
//! ## Example
//!
//! ```rust
//! use modrack_core::{CableSpec, Engine, EngineConfig, ModuleInstance};
//! use modrack_modules::{Constant, Gain, constant, gain};
//!
//! let (mut engine, handle) = Engine::new(EngineConfig::default()).unwrap();
//! let (src, _) = handle.add_module(ModuleInstance::new(Box::new(Constant::new()))).unwrap();
//! let (amp, _) = handle.add_module(ModuleInstance::new(Box::new(Gain::new()))).unwrap();
//! handle.set_param(src, constant::param::VOLTAGE, 5.0).unwrap();
//! handle.set_param(amp, gain::param::GAIN, 2.0).unwrap();
//! handle.add_cable(CableSpec::new(src, 0, amp, gain::input::IN)).unwrap();
//!
//! engine.step_block(1);
//! assert_eq!(engine.module(amp).unwrap().output(0).unwrap().voltage(0), 10.0);
//! ```

pub mod audio_interface;
pub mod constant;
pub mod gain;
pub mod merge;
pub mod mixer;
pub mod sine_osc;
pub mod split;

// Re-export main types at crate root
pub use audio_interface::AudioInterface;
pub use constant::Constant;
pub use gain::Gain;
pub use merge::Merge;
pub use mixer::Mixer;
pub use sine_osc::SineOsc;
pub use split::Split;
