//! The real-time engine: applies queued commands and steps the rack.
//!
//! # Block lifecycle
//!
//! ```text
//! Idle ──process_block──▶ try gate ──busy──▶ silence, Skipped
//!                            │
//!                            ▼
//!                   Stepping: drain commands (FIFO, once)
//!                            │ rebuild routes if the graph changed
//!                            ▼
//!                   for each frame:
//!                     for each module (registration order):
//!                       pull cables into its inputs, then process
//!                     refresh plug lights (every 32 frames)
//!                     advance param smoothing
//!                            │
//!                            ▼
//!                          Idle
//! ```
//!
//! Modules are never topologically sorted. Inputs are pulled just before
//! their module runs, so a cable from an earlier module arrives in the same
//! frame, and a cable from a later module (a back-edge) carries the value
//! that module produced one frame earlier.
//!
//! # Real-time discipline
//!
//! Every table is allocated from [`EngineConfig`] in [`Engine::new`]. Command
//! application stays within those capacities, removed modules are handed to
//! the garbage queue, and the only lock touched is the gate's `try_read`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use rtrb::{Consumer, Producer, RingBuffer};

use super::command::{Command, EngineEvent, Envelope, Garbage, RejectReason};
use super::config::{EngineConfig, MAX_BLOCK_SIZE};
use super::edge::{Cable, CableId, Route};
use super::gate::RackGate;
use super::handle::{EngineEndpoints, EngineHandle, HandleParts};
use super::node::{ModuleId, ModuleInstance};
use super::status::EngineStatus;
use crate::error::Result;
use crate::module::{AUDIO_FRAME_CHANNELS, AudioFrame, ProcessArgs};
use crate::param::smoothing_coeff;
use crate::port::PORT_MAX_CHANNELS;

/// Frames between plug-light refreshes.
const LIGHT_DIVIDER: u32 = 32;

/// Where the engine is in its block cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No block in flight.
    Idle,
    /// Draining commands or stepping frames.
    Stepping,
}

/// Result of one block request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockOutcome {
    /// Commands applied and frames stepped.
    Processed,
    /// A bulk operation held the gate; nothing was applied or stepped.
    Skipped,
    /// Commands applied; the engine is paused so no frames were stepped.
    Paused,
}

/// Interleaved device buffers for one block.
#[derive(Debug)]
pub struct AudioBlock<'a> {
    input: &'a [f32],
    input_channels: usize,
    output: &'a mut [f32],
    output_channels: usize,
}

impl<'a> AudioBlock<'a> {
    /// Wraps interleaved input and output buffers.
    ///
    /// The frame count is taken from the output buffer; input frames beyond
    /// the end of `input` read as silence.
    pub fn new(
        input: &'a [f32],
        input_channels: usize,
        output: &'a mut [f32],
        output_channels: usize,
    ) -> Self {
        Self {
            input,
            input_channels,
            output,
            output_channels,
        }
    }

    /// Wraps an output buffer with no device input.
    pub fn output_only(output: &'a mut [f32], output_channels: usize) -> Self {
        Self::new(&[], 0, output, output_channels)
    }

    /// Number of frames in the block.
    pub fn frames(&self) -> usize {
        if self.output_channels == 0 {
            0
        } else {
            self.output.len() / self.output_channels
        }
    }

    fn read_frame(&self, frame: usize, audio: &mut AudioFrame) {
        let channels = self.input_channels.min(AUDIO_FRAME_CHANNELS);
        audio.inputs = [0.0; AUDIO_FRAME_CHANNELS];
        audio.input_channels = channels;
        audio.output_channels = self.output_channels.min(AUDIO_FRAME_CHANNELS);
        let base = frame * self.input_channels;
        for c in 0..channels {
            if let Some(&sample) = self.input.get(base + c) {
                audio.inputs[c] = sample;
            }
        }
    }

    fn write_frame(&mut self, frame: usize, audio: &AudioFrame) {
        let base = frame * self.output_channels;
        let out = &mut self.output[base..base + self.output_channels];
        for (c, sample) in out.iter_mut().enumerate() {
            *sample = if c < AUDIO_FRAME_CHANNELS {
                audio.outputs[c]
            } else {
                0.0
            };
        }
    }
}

/// A param moving toward a target.
#[derive(Debug, Clone, Copy)]
struct Smoothing {
    module: ModuleId,
    slot: usize,
    param: usize,
    target: f32,
}

/// The rack: modules, cables and the per-frame stepping loop.
///
/// Owned by exactly one thread at a time (normally the audio callback);
/// everything else goes through the [`EngineHandle`] returned by
/// [`Engine::new`].
pub struct Engine {
    config: EngineConfig,
    slots: Vec<Box<ModuleInstance>>,
    index: HashMap<ModuleId, usize>,
    cables: Vec<Cable>,
    routes: Vec<Route>,
    slot_routes: Vec<(usize, usize)>,
    smoothing: Vec<Smoothing>,
    commands: Consumer<Envelope>,
    events: Producer<EngineEvent>,
    garbage: Producer<Garbage>,
    status: Arc<EngineStatus>,
    gate: Arc<RackGate>,
    sample_rate: f32,
    sample_time: f32,
    block_size: usize,
    frame: u64,
    paused: bool,
    state: EngineState,
    audio: AudioFrame,
    light_counter: u32,
    topology_dirty: bool,
}

impl Engine {
    /// Creates an engine and the handle that controls it.
    pub fn new(config: EngineConfig) -> Result<(Self, EngineHandle)> {
        config.validate()?;
        let (command_tx, command_rx) = RingBuffer::new(config.command_capacity);
        let (event_tx, event_rx) = RingBuffer::new(config.event_capacity);
        let (garbage_tx, garbage_rx) = RingBuffer::new(config.garbage_capacity);
        let status = Arc::new(EngineStatus::new(config.sample_rate, config.block_size));
        let gate = Arc::new(RackGate::new());

        let handle = EngineHandle::new(HandleParts {
            commands: command_tx,
            events: event_rx,
            garbage: garbage_rx,
            status: Arc::clone(&status),
            gate: Arc::clone(&gate),
            max_modules: config.max_modules,
            max_cables: config.max_cables,
        });
        let endpoints = EngineEndpoints {
            commands: command_rx,
            events: event_tx,
            garbage: garbage_tx,
        };

        let engine = Self {
            slots: Vec::with_capacity(config.max_modules),
            index: HashMap::with_capacity(config.max_modules),
            cables: Vec::with_capacity(config.max_cables),
            routes: Vec::with_capacity(config.max_cables),
            slot_routes: Vec::with_capacity(config.max_modules),
            smoothing: Vec::with_capacity(config.max_smoothing.max(1)),
            commands: endpoints.commands,
            events: endpoints.events,
            garbage: endpoints.garbage,
            status,
            gate,
            sample_rate: config.sample_rate,
            sample_time: 1.0 / config.sample_rate,
            block_size: config.block_size,
            frame: 0,
            paused: false,
            state: EngineState::Idle,
            audio: AudioFrame::default(),
            light_counter: 0,
            topology_dirty: false,
            config,
        };
        Ok((engine, handle))
    }

    /// Applies pending commands and steps `frames` frames with silent
    /// device input, discarding device output.
    pub fn step_block(&mut self, frames: usize) -> BlockOutcome {
        self.run_block(frames, None)
    }

    /// Applies pending commands and steps one block of device audio.
    pub fn process_block(&mut self, block: &mut AudioBlock<'_>) -> BlockOutcome {
        let frames = block.frames();
        self.run_block(frames, Some(block))
    }

    fn run_block(&mut self, frames: usize, mut block: Option<&mut AudioBlock<'_>>) -> BlockOutcome {
        let gate = Arc::clone(&self.gate);
        let Some(_reader) = gate.try_enter() else {
            if let Some(block) = block {
                block.output.fill(0.0);
            }
            self.status.skip_block();
            return BlockOutcome::Skipped;
        };

        self.state = EngineState::Stepping;
        self.drain_commands();

        if self.paused {
            if let Some(block) = block {
                block.output.fill(0.0);
            }
            self.state = EngineState::Idle;
            return BlockOutcome::Paused;
        }

        for f in 0..frames {
            match block.as_deref_mut() {
                Some(block) => {
                    block.read_frame(f, &mut self.audio);
                    self.audio.outputs = [0.0; AUDIO_FRAME_CHANNELS];
                    self.step_frame();
                    block.write_frame(f, &self.audio);
                }
                None => {
                    self.audio = AudioFrame::default();
                    self.step_frame();
                }
            }
        }

        self.state = EngineState::Idle;
        self.status.finish_block(self.frame);
        BlockOutcome::Processed
    }

    // ------------------------------------------------------------------
    // Command application
    // ------------------------------------------------------------------

    fn drain_commands(&mut self) {
        let mut last_seq = None;
        while let Ok(envelope) = self.commands.pop() {
            last_seq = Some(envelope.seq);
            self.apply(envelope);
        }
        if self.topology_dirty {
            self.rebuild_routes();
            self.topology_dirty = false;
        }
        if let Some(seq) = last_seq {
            self.status.set_counts(self.slots.len(), self.cables.len());
            self.status.set_applied_seq(seq);
        }
    }

    fn apply(&mut self, envelope: Envelope) {
        let seq = envelope.seq;
        let outcome = match envelope.command {
            Command::AddModule(instance) => self.add_module(instance),
            Command::RemoveModule(id) => self.remove_module(id),
            Command::AddCable(cable) => self.add_cable(cable),
            Command::RemoveCable(id) => self.remove_cable(id),
            Command::SetParam {
                module,
                param,
                value,
            } => self.set_param(module, param, value),
            Command::SetSmoothParam {
                module,
                param,
                value,
            } => self.set_smooth_param(module, param, value),
            Command::SetBypass { module, bypassed } => self.set_bypass(module, bypassed),
            Command::ResetModule(id) => self.reset_module(id),
            Command::SetSampleRate(rate) => self.set_sample_rate(rate),
            Command::SetBlockSize(size) => self.set_block_size(size),
            Command::SetPaused(paused) => {
                self.paused = paused;
                self.status.set_paused(paused);
                Ok(())
            }
            Command::ClearRack => {
                self.clear_rack();
                Ok(())
            }
        };
        if let Err(reason) = outcome {
            self.status.count_rejected();
            let _ = self.events.push(EngineEvent::Rejected { seq, reason });
        }
    }

    fn discard(&mut self, instance: Box<ModuleInstance>) {
        if let Err(rtrb::PushError::Full(item)) = self.garbage.push(Garbage::Module(instance)) {
            // Queue full: drop inline rather than block.
            self.status.count_garbage_overflow();
            drop(item);
        }
    }

    fn slot_of(&self, id: ModuleId) -> std::result::Result<usize, RejectReason> {
        self.index
            .get(&id)
            .copied()
            .ok_or(RejectReason::UnknownModule(id))
    }

    fn add_module(&mut self, mut instance: Box<ModuleInstance>) -> std::result::Result<(), RejectReason> {
        let id = instance.id;
        let reason = if self.index.contains_key(&id) {
            Some(RejectReason::DuplicateModule(id))
        } else if self.slots.len() >= self.config.max_modules {
            Some(RejectReason::ModuleLimit)
        } else {
            None
        };
        if let Some(reason) = reason {
            self.discard(instance);
            return Err(reason);
        }
        if instance.prepared_rate != self.sample_rate {
            instance.module.on_sample_rate_change(self.sample_rate);
            instance.prepared_rate = self.sample_rate;
        }
        for input in &mut instance.io.inputs {
            input.disconnect();
            input.set_active(false);
        }
        self.index.insert(id, self.slots.len());
        self.slots.push(instance);
        self.topology_dirty = true;
        Ok(())
    }

    fn remove_module(&mut self, id: ModuleId) -> std::result::Result<(), RejectReason> {
        let slot = self.slot_of(id)?;
        self.cables.retain(|cable| !cable.spec.touches(id));
        self.smoothing.retain(|s| s.module != id);
        let instance = self.slots.remove(slot);
        self.reindex();
        self.topology_dirty = true;
        self.discard(instance);
        Ok(())
    }

    fn add_cable(&mut self, cable: Cable) -> std::result::Result<(), RejectReason> {
        if self.cables.iter().any(|c| c.id == cable.id) {
            return Err(RejectReason::DuplicateCable(cable.id));
        }
        if self.cables.len() >= self.config.max_cables {
            return Err(RejectReason::CableLimit);
        }
        let out_slot = self.slot_of(cable.spec.output_module)?;
        let in_slot = self.slot_of(cable.spec.input_module)?;
        if cable.spec.output_id >= self.slots[out_slot].io.outputs.len()
            || cable.spec.input_id >= self.slots[in_slot].io.inputs.len()
        {
            return Err(RejectReason::PortOutOfRange);
        }
        self.cables.push(cable);
        self.topology_dirty = true;
        Ok(())
    }

    fn remove_cable(&mut self, id: CableId) -> std::result::Result<(), RejectReason> {
        let position = self
            .cables
            .iter()
            .position(|c| c.id == id)
            .ok_or(RejectReason::UnknownCable(id))?;
        self.cables.remove(position);
        self.topology_dirty = true;
        Ok(())
    }

    fn set_param(
        &mut self,
        module: ModuleId,
        param: usize,
        value: f32,
    ) -> std::result::Result<(), RejectReason> {
        let slot = self.slot_of(module)?;
        let target = self.slots[slot]
            .io
            .params
            .get_mut(param)
            .ok_or(RejectReason::ParamOutOfRange)?;
        target.set_value(value);
        self.smoothing.retain(|s| !(s.module == module && s.param == param));
        Ok(())
    }

    fn set_smooth_param(
        &mut self,
        module: ModuleId,
        param: usize,
        value: f32,
    ) -> std::result::Result<(), RejectReason> {
        let slot = self.slot_of(module)?;
        let Some(current) = self.slots[slot].io.params.get(param) else {
            return Err(RejectReason::ParamOutOfRange);
        };
        if value.is_nan() {
            return Ok(());
        }
        let target = current.clamp(value);
        if let Some(existing) = self
            .smoothing
            .iter_mut()
            .find(|s| s.module == module && s.param == param)
        {
            existing.target = target;
            return Ok(());
        }
        if self.smoothing.len() >= self.config.max_smoothing.max(1) {
            // Oldest smoothing jumps to its target to make room.
            let oldest = self.smoothing.remove(0);
            self.slots[oldest.slot].io.params[oldest.param].set_value(oldest.target);
        }
        self.smoothing.push(Smoothing {
            module,
            slot,
            param,
            target,
        });
        Ok(())
    }

    fn set_bypass(&mut self, module: ModuleId, bypassed: bool) -> std::result::Result<(), RejectReason> {
        let slot = self.slot_of(module)?;
        let instance = &mut self.slots[slot];
        instance.bypassed = bypassed;
        if bypassed {
            instance.silence_outputs();
        }
        Ok(())
    }

    fn reset_module(&mut self, module: ModuleId) -> std::result::Result<(), RejectReason> {
        let slot = self.slot_of(module)?;
        self.smoothing.retain(|s| s.module != module);
        self.slots[slot].reset();
        Ok(())
    }

    fn set_sample_rate(&mut self, sample_rate: f32) -> std::result::Result<(), RejectReason> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(RejectReason::InvalidTiming);
        }
        if sample_rate == self.sample_rate {
            return Ok(());
        }
        self.sample_rate = sample_rate;
        self.sample_time = 1.0 / sample_rate;
        for instance in &mut self.slots {
            instance.module.on_sample_rate_change(sample_rate);
            instance.prepared_rate = sample_rate;
        }
        self.status.set_sample_rate(sample_rate);
        let _ = self.events.push(EngineEvent::SampleRateChanged(sample_rate));
        Ok(())
    }

    fn set_block_size(&mut self, block_size: usize) -> std::result::Result<(), RejectReason> {
        if block_size == 0 || block_size > MAX_BLOCK_SIZE {
            return Err(RejectReason::InvalidTiming);
        }
        self.block_size = block_size;
        self.status.set_block_size(block_size);
        let _ = self.events.push(EngineEvent::BlockSizeChanged(block_size));
        Ok(())
    }

    fn clear_rack(&mut self) {
        self.cables.clear();
        self.smoothing.clear();
        self.index.clear();
        while let Some(instance) = self.slots.pop() {
            self.discard(instance);
        }
        self.topology_dirty = true;
        let _ = self.events.push(EngineEvent::RackCleared);
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (slot, instance) in self.slots.iter().enumerate() {
            self.index.insert(instance.id, slot);
        }
        for smoothing in &mut self.smoothing {
            if let Some(&slot) = self.index.get(&smoothing.module) {
                smoothing.slot = slot;
            }
        }
    }

    /// Resolves cables to slot indices and recomputes port activity.
    fn rebuild_routes(&mut self) {
        self.routes.clear();
        for (cable_index, cable) in self.cables.iter().enumerate() {
            let (Some(&out_slot), Some(&in_slot)) = (
                self.index.get(&cable.spec.output_module),
                self.index.get(&cable.spec.input_module),
            ) else {
                continue;
            };
            self.routes.push(Route {
                out_slot,
                out_port: cable.spec.output_id,
                in_slot,
                in_port: cable.spec.input_id,
                cable: cable_index,
            });
        }
        self.routes.sort_unstable_by_key(|r| (r.in_slot, r.in_port, r.cable));

        self.slot_routes.clear();
        self.slot_routes.resize(self.slots.len(), (0, 0));
        let mut start = 0;
        while start < self.routes.len() {
            let slot = self.routes[start].in_slot;
            let mut end = start;
            while end < self.routes.len() && self.routes[end].in_slot == slot {
                end += 1;
            }
            self.slot_routes[slot] = (start, end);
            start = end;
        }

        for instance in &mut self.slots {
            for port in instance.io.inputs.iter_mut().chain(instance.io.outputs.iter_mut()) {
                port.set_active(false);
            }
        }
        for route in &self.routes {
            self.slots[route.out_slot].io.outputs[route.out_port].set_active(true);
            self.slots[route.in_slot].io.inputs[route.in_port].set_active(true);
        }
        for instance in &mut self.slots {
            for input in &mut instance.io.inputs {
                if !input.is_active() && input.channels() > 0 {
                    input.disconnect();
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Stepping
    // ------------------------------------------------------------------

    fn step_frame(&mut self) {
        let sample_rate = self.sample_rate;
        let sample_time = self.sample_time;
        let frame = self.frame;
        let Self {
            slots,
            routes,
            slot_routes,
            cables,
            audio,
            config,
            ..
        } = self;

        for slot in 0..slots.len() {
            let (start, end) = slot_routes[slot];
            let mut r = start;
            while r < end {
                let port = routes[r].in_port;
                let mut sum = [0.0f32; PORT_MAX_CHANNELS];
                let mut channels = 0usize;
                while r < end && routes[r].in_port == port {
                    let route = routes[r];
                    let source = &slots[route.out_slot].io.outputs[route.out_port];
                    let n = source.channels();
                    for (acc, v) in sum.iter_mut().zip(&source.raw()[..n]) {
                        *acc += *v;
                    }
                    channels = channels.max(n);
                    cables[route.cable].channels = n as u8;
                    r += 1;
                }
                slots[slot].io.inputs[port].load(&sum, channels);
            }

            let instance = &mut slots[slot];
            if instance.bypassed {
                instance.silence_outputs();
                continue;
            }
            let mut args = ProcessArgs {
                sample_rate,
                sample_time,
                frame,
                audio: &mut *audio,
            };
            if config.cpu_meter {
                let start = Instant::now();
                instance.module.process(&mut args, &mut instance.io);
                let elapsed = start.elapsed().as_secs_f32();
                instance.cpu_time += (elapsed - instance.cpu_time) * (sample_time / 2.0);
            } else {
                instance.module.process(&mut args, &mut instance.io);
            }
        }

        self.light_counter += 1;
        if self.light_counter >= LIGHT_DIVIDER {
            self.light_counter = 0;
            let delta = sample_time * LIGHT_DIVIDER as f32;
            for instance in &mut self.slots {
                instance.update_plug_lights(delta);
            }
        }

        self.advance_smoothing();
        self.frame += 1;
    }

    fn advance_smoothing(&mut self) {
        if self.smoothing.is_empty() {
            return;
        }
        let coeff = smoothing_coeff(self.sample_time);
        let slots = &mut self.slots;
        self.smoothing.retain(|s| {
            let param = &mut slots[s.slot].io.params[s.param];
            !param.advance_toward(s.target, coeff)
        });
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Current sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Duration of one frame in seconds.
    pub fn sample_time(&self) -> f32 {
        self.sample_time
    }

    /// Block size requested for device callbacks.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Frames stepped since creation.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Whether the engine is paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Current block-cycle state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Startup configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Shared status published to handles.
    pub fn status(&self) -> &Arc<EngineStatus> {
        &self.status
    }

    /// Looks up a registered module.
    pub fn module(&self, id: ModuleId) -> Option<&ModuleInstance> {
        self.index.get(&id).map(|&slot| self.slots[slot].as_ref())
    }

    /// Registered modules in processing order.
    pub fn modules(&self) -> impl Iterator<Item = &ModuleInstance> {
        self.slots.iter().map(AsRef::as_ref)
    }

    /// Registered cables in connection order.
    pub fn cables(&self) -> &[Cable] {
        &self.cables
    }

    /// Number of registered modules.
    pub fn module_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of registered cables.
    pub fn cable_count(&self) -> usize {
        self.cables.len()
    }

    /// Current value of a param.
    pub fn param(&self, module: ModuleId, param: usize) -> Option<f32> {
        self.module(module)?.param(param).map(|p| p.value())
    }

    /// Target of a param being smoothed, else its current value.
    pub fn smooth_param(&self, module: ModuleId, param: usize) -> Option<f32> {
        if let Some(s) = self
            .smoothing
            .iter()
            .find(|s| s.module == module && s.param == param)
        {
            return Some(s.target);
        }
        self.param(module, param)
    }

    /// Number of params currently being smoothed.
    pub fn smoothing_count(&self) -> usize {
        self.smoothing.len()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("sample_rate", &self.sample_rate)
            .field("block_size", &self.block_size)
            .field("frame", &self.frame)
            .field("modules", &self.slots.len())
            .field("cables", &self.cables.len())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
