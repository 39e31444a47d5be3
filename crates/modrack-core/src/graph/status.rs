//! Engine state published by the real-time thread.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};

/// Atomics written by the engine and read by any thread.
///
/// Only the real-time thread stores into these fields.
#[derive(Debug, Default)]
pub struct EngineStatus {
    applied_seq: AtomicU64,
    sample_rate: AtomicU32,
    block_size: AtomicUsize,
    frames: AtomicU64,
    blocks: AtomicU64,
    skipped_blocks: AtomicU64,
    modules: AtomicUsize,
    cables: AtomicUsize,
    rejected: AtomicU64,
    garbage_overflow: AtomicU64,
    paused: AtomicBool,
}

/// A point-in-time copy of [`EngineStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StatusSnapshot {
    /// Sequence number of the last command applied.
    pub applied_seq: u64,
    /// Current sample rate.
    pub sample_rate: f32,
    /// Current block size.
    pub block_size: usize,
    /// Frames processed since creation.
    pub frames: u64,
    /// Blocks processed.
    pub blocks: u64,
    /// Blocks skipped while a bulk operation held the gate.
    pub skipped_blocks: u64,
    /// Registered modules.
    pub modules: usize,
    /// Registered cables.
    pub cables: usize,
    /// Commands rejected on the real-time thread.
    pub rejected: u64,
    /// Removed objects dropped inline because the garbage queue was full.
    pub garbage_overflow: u64,
    /// Whether the engine is paused.
    pub paused: bool,
}

impl EngineStatus {
    pub(crate) fn new(sample_rate: f32, block_size: usize) -> Self {
        let status = Self::default();
        status.set_sample_rate(sample_rate);
        status.block_size.store(block_size, Ordering::Relaxed);
        status
    }

    /// Sequence number of the last command applied.
    #[inline]
    pub fn applied_seq(&self) -> u64 {
        self.applied_seq.load(Ordering::Acquire)
    }

    /// Current sample rate.
    #[inline]
    pub fn sample_rate(&self) -> f32 {
        f32::from_bits(self.sample_rate.load(Ordering::Relaxed))
    }

    /// Current block size.
    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size.load(Ordering::Relaxed)
    }

    /// Copies every field.
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            applied_seq: self.applied_seq(),
            sample_rate: self.sample_rate(),
            block_size: self.block_size(),
            frames: self.frames.load(Ordering::Relaxed),
            blocks: self.blocks.load(Ordering::Relaxed),
            skipped_blocks: self.skipped_blocks.load(Ordering::Relaxed),
            modules: self.modules.load(Ordering::Relaxed),
            cables: self.cables.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            garbage_overflow: self.garbage_overflow.load(Ordering::Relaxed),
            paused: self.paused.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn set_applied_seq(&self, seq: u64) {
        self.applied_seq.store(seq, Ordering::Release);
    }

    pub(crate) fn set_sample_rate(&self, sample_rate: f32) {
        self.sample_rate.store(sample_rate.to_bits(), Ordering::Relaxed);
    }

    pub(crate) fn set_block_size(&self, block_size: usize) {
        self.block_size.store(block_size, Ordering::Relaxed);
    }

    pub(crate) fn set_counts(&self, modules: usize, cables: usize) {
        self.modules.store(modules, Ordering::Relaxed);
        self.cables.store(cables, Ordering::Relaxed);
    }

    pub(crate) fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Relaxed);
    }

    pub(crate) fn finish_block(&self, frames: u64) {
        self.frames.store(frames, Ordering::Relaxed);
        self.blocks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn skip_block(&self) {
        self.skipped_blocks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn count_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn count_garbage_overflow(&self) {
        self.garbage_overflow.fetch_add(1, Ordering::Relaxed);
    }
}
