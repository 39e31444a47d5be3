//! Errors returned to non-real-time callers.

use crate::graph::{CableId, CableSpec, ModuleId};

/// Errors reported by [`EngineHandle`](crate::EngineHandle) operations and
/// engine construction.
///
/// These never reach the real-time thread: anything that becomes invalid
/// only after enqueueing is dropped there and reported as an
/// [`EngineEvent::Rejected`](crate::EngineEvent::Rejected) instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// The command queue has no free slot.
    #[error("command queue is full")]
    QueueFull,

    /// The engine has been dropped.
    #[error("engine is no longer running")]
    Disconnected,

    /// No module with this id is registered.
    #[error("unknown {0}")]
    UnknownModule(ModuleId),

    /// No cable with this id is registered.
    #[error("unknown {0}")]
    UnknownCable(CableId),

    /// The module id is already taken, or is the reserved id 0.
    #[error("{0} is already in use")]
    DuplicateModule(ModuleId),

    /// The cable id is already taken, or is the reserved id 0.
    #[error("{0} is already in use")]
    DuplicateCable(CableId),

    /// The same output is already patched to the same input.
    #[error("connection {0} already exists")]
    DuplicateConnection(CableSpec),

    /// Input port index out of range.
    #[error("{module} has no input {port}")]
    InputOutOfRange {
        /// Module addressed.
        module: ModuleId,
        /// Requested input index.
        port: usize,
    },

    /// Output port index out of range.
    #[error("{module} has no output {port}")]
    OutputOutOfRange {
        /// Module addressed.
        module: ModuleId,
        /// Requested output index.
        port: usize,
    },

    /// Param index out of range.
    #[error("{module} has no param {param}")]
    ParamOutOfRange {
        /// Module addressed.
        module: ModuleId,
        /// Requested param index.
        param: usize,
    },

    /// The pre-sized module table is full.
    #[error("module limit of {0} reached")]
    ModuleLimit(usize),

    /// The pre-sized cable table is full.
    #[error("cable limit of {0} reached")]
    CableLimit(usize),

    /// Sample rate not finite and positive.
    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(f32),

    /// Block size zero or above the supported maximum.
    #[error("invalid block size: {0}")]
    InvalidBlockSize(usize),

    /// Engine configuration rejected.
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
