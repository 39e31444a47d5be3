//! Messages exchanged between [`EngineHandle`](super::EngineHandle) and the
//! real-time thread.
//!
//! Three SPSC queues connect the two sides:
//!
//! | Queue | Direction | Payload |
//! |---|---|---|
//! | commands | handle → engine | [`Envelope`] |
//! | events | engine → handle | [`EngineEvent`] |
//! | garbage | engine → handle | [`Garbage`] |
//!
//! Commands carry ids and plain values. The only owned payload is the boxed
//! [`ModuleInstance`] of `AddModule`, whose ownership moves with the message.

use std::fmt;

use super::edge::{Cable, CableId};
use super::node::{ModuleId, ModuleInstance};

/// A structural or param mutation, applied between blocks.
pub(crate) enum Command {
    AddModule(Box<ModuleInstance>),
    RemoveModule(ModuleId),
    AddCable(Cable),
    RemoveCable(CableId),
    SetParam {
        module: ModuleId,
        param: usize,
        value: f32,
    },
    SetSmoothParam {
        module: ModuleId,
        param: usize,
        value: f32,
    },
    SetBypass {
        module: ModuleId,
        bypassed: bool,
    },
    ResetModule(ModuleId),
    SetSampleRate(f32),
    SetBlockSize(usize),
    SetPaused(bool),
    ClearRack,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::AddModule(instance) => write!(f, "AddModule({})", instance.id()),
            Command::RemoveModule(id) => write!(f, "RemoveModule({id})"),
            Command::AddCable(cable) => write!(f, "AddCable({}, {})", cable.id, cable.spec),
            Command::RemoveCable(id) => write!(f, "RemoveCable({id})"),
            Command::SetParam {
                module,
                param,
                value,
            } => write!(f, "SetParam({module}, {param}, {value})"),
            Command::SetSmoothParam {
                module,
                param,
                value,
            } => write!(f, "SetSmoothParam({module}, {param}, {value})"),
            Command::SetBypass { module, bypassed } => write!(f, "SetBypass({module}, {bypassed})"),
            Command::ResetModule(id) => write!(f, "ResetModule({id})"),
            Command::SetSampleRate(rate) => write!(f, "SetSampleRate({rate})"),
            Command::SetBlockSize(size) => write!(f, "SetBlockSize({size})"),
            Command::SetPaused(paused) => write!(f, "SetPaused({paused})"),
            Command::ClearRack => f.write_str("ClearRack"),
        }
    }
}

/// A command tagged with its sequence number.
#[derive(Debug)]
pub(crate) struct Envelope {
    pub seq: u64,
    pub command: Command,
}

/// Acknowledgment token for an enqueued command.
///
/// Sequence numbers increase in queue order; a command has taken effect once
/// the engine's applied sequence reaches its receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Receipt(pub(crate) u64);

impl Receipt {
    /// Returns the sequence number.
    #[inline]
    pub fn seq(self) -> u64 {
        self.0
    }
}

/// Why the real-time thread dropped a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The module id was not registered.
    UnknownModule(ModuleId),
    /// The cable id was not registered.
    UnknownCable(CableId),
    /// The module id was already registered.
    DuplicateModule(ModuleId),
    /// The cable id was already registered.
    DuplicateCable(CableId),
    /// A cable endpoint referenced a missing port.
    PortOutOfRange,
    /// A param index was out of range.
    ParamOutOfRange,
    /// The module table was full.
    ModuleLimit,
    /// The cable table was full.
    CableLimit,
    /// The sample rate or block size was invalid.
    InvalidTiming,
}

/// Notifications from the real-time thread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineEvent {
    /// A command was dropped without effect.
    Rejected {
        /// Sequence number of the dropped command.
        seq: u64,
        /// Cause.
        reason: RejectReason,
    },
    /// The sample rate changed and every module was notified.
    SampleRateChanged(f32),
    /// The block size changed.
    BlockSizeChanged(usize),
    /// Every module and cable was removed.
    RackCleared,
}

/// Objects detached on the real-time thread, awaiting their final drop.
pub enum Garbage {
    /// A removed (or rejected) module instance.
    Module(Box<ModuleInstance>),
}

impl fmt::Debug for Garbage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Garbage::Module(instance) => write!(f, "Garbage::Module({})", instance.id()),
        }
    }
}
