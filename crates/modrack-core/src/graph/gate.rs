//! Coarse lock for whole-rack operations.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Read-write gate between the audio thread and bulk rebuilds.
///
/// The audio thread takes the read side with `try_read` once per block and
/// skips the block when it is unavailable. Bulk operations (patch load,
/// clearing the rack) hold the write side while they enqueue, so the engine
/// never starts a block with half of a patch in its queue.
#[derive(Debug, Default)]
pub struct RackGate {
    lock: RwLock<()>,
}

impl RackGate {
    /// Creates an open gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` while a bulk operation holds the gate.
    pub fn is_locked(&self) -> bool {
        self.lock.is_locked_exclusive()
    }

    /// Non-blocking reader acquisition for the audio thread.
    #[inline]
    pub(crate) fn try_enter(&self) -> Option<RwLockReadGuard<'_, ()>> {
        self.lock.try_read()
    }

    /// Blocking writer acquisition for bulk operations.
    pub(crate) fn lock_bulk(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_fails_while_bulk_held() {
        let gate = RackGate::new();
        assert!(gate.try_enter().is_some());
        let guard = gate.lock_bulk();
        assert!(gate.is_locked());
        assert!(gate.try_enter().is_none());
        drop(guard);
        assert!(gate.try_enter().is_some());
    }
}
