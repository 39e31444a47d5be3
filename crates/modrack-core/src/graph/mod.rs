//! The rack graph and its real-time engine.
//!
//! # Architecture
//!
//! The system uses a **two-object split**:
//!
//! - [`Engine`]: owned by the audio thread. Holds module instances in
//!   registration order, the cable list and a route table resolved to slot
//!   indices. Steps frames, applies commands between blocks.
//! - [`EngineHandle`]: shared by any number of non-real-time threads.
//!   Validates requests against a shadow of the intended graph and sends
//!   them as small commands over a lock-free SPSC queue.
//!
//! Removed modules travel back on a garbage queue and are dropped by
//! [`EngineHandle::collect_garbage`]. Whole-rack operations take the
//! [`RackGate`] so the engine never applies half of a patch.
//!
//! # Feedback
//!
//! The graph may contain cycles. Modules run in registration order; a cable
//! whose source runs later than its destination delivers the previous
//! frame's voltage. There is no topological sort and no latency
//! compensation.
//!
//! # Example
//!
//! ```rust
//! use modrack_core::graph::{CableSpec, Engine, EngineConfig};
//! use modrack_core::{Module, ModuleInstance, ModuleIo, PortDescriptor, ProcessArgs};
//!
//! struct Five;
//! const OUT: &[PortDescriptor] = &[PortDescriptor::new("Out")];
//! impl Module for Five {
//!     fn outputs(&self) -> &'static [PortDescriptor] { OUT }
//!     fn process(&mut self, _: &mut ProcessArgs<'_>, io: &mut ModuleIo) {
//!         io.outputs[0].set_voltage(5.0, 0);
//!     }
//! }
//!
//! let (mut engine, handle) = Engine::new(EngineConfig::default()).unwrap();
//! let (id, _) = handle.add_module(ModuleInstance::new(Box::new(Five))).unwrap();
//! engine.step_block(4);
//! assert_eq!(engine.module(id).unwrap().output(0).unwrap().voltage(0), 5.0);
//! ```

pub mod command;
pub mod config;
pub mod edge;
pub mod engine;
pub mod gate;
pub mod handle;
pub mod node;
pub mod status;

pub use command::{EngineEvent, Garbage, Receipt, RejectReason};
pub use config::{EngineConfig, MAX_BLOCK_SIZE};
pub use edge::{Cable, CableId, CableSpec};
pub use engine::{AudioBlock, BlockOutcome, Engine, EngineState};
pub use gate::RackGate;
pub use handle::{BulkGuard, EngineHandle};
pub use node::{ModelKey, ModuleId, ModuleInstance, ModuleShape};
pub use status::{EngineStatus, StatusSnapshot};
