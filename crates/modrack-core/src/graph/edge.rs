//! Cables and the engine's resolved route table.

use std::fmt;

use super::node::ModuleId;

/// Stable identifier of a cable within a patch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CableId(pub u64);

impl CableId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cable#{}", self.0)
    }
}

/// Endpoints of a cable: one module output to one module input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CableSpec {
    /// Source module.
    pub output_module: ModuleId,
    /// Output port index on the source module.
    pub output_id: usize,
    /// Destination module.
    pub input_module: ModuleId,
    /// Input port index on the destination module.
    pub input_id: usize,
}

impl CableSpec {
    /// Creates a cable description.
    pub fn new(
        output_module: ModuleId,
        output_id: usize,
        input_module: ModuleId,
        input_id: usize,
    ) -> Self {
        Self {
            output_module,
            output_id,
            input_module,
            input_id,
        }
    }

    /// Returns `true` if either endpoint is on `module`.
    #[inline]
    pub fn touches(&self, module: ModuleId) -> bool {
        self.output_module == module || self.input_module == module
    }
}

impl fmt::Display for CableSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:out{} → {}:in{}",
            self.output_module, self.output_id, self.input_module, self.input_id
        )
    }
}

/// A registered cable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cable {
    /// Cable id.
    pub id: CableId,
    /// Endpoints.
    pub spec: CableSpec,
    /// Channel count carried on the most recent frame.
    pub(crate) channels: u8,
}

impl Cable {
    /// Creates a cable that has not carried any signal yet.
    pub fn new(id: CableId, spec: CableSpec) -> Self {
        Self {
            id,
            spec,
            channels: 0,
        }
    }

    /// Channel count carried on the most recent frame.
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels as usize
    }
}

/// A cable resolved to module slot indices.
///
/// Routes are kept sorted by `(in_slot, in_port)` so that each module's
/// incoming cables form one contiguous run, and the cables feeding one
/// input port are adjacent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Route {
    pub out_slot: usize,
    pub out_port: usize,
    pub in_slot: usize,
    pub in_port: usize,
    /// Index into the engine's cable list.
    pub cable: usize,
}
