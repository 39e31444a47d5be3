//! Non-real-time access to a running engine.
//!
//! [`EngineHandle`] is the only way to mutate an [`Engine`](super::Engine)
//! once it has been handed to the audio thread. Every mutation is validated
//! against a shadow copy of the intended graph, enqueued as a small command,
//! and applied by the engine at the top of its next block.
//!
//! ```rust
//! use modrack_core::{Engine, EngineConfig};
//!
//! let (mut engine, handle) = Engine::new(EngineConfig::default()).unwrap();
//! let receipt = handle.set_sample_rate(44100.0).unwrap();
//! assert!(!handle.is_applied(receipt));
//! engine.step_block(1);
//! assert!(handle.is_applied(receipt));
//! assert_eq!(engine.sample_rate(), 44100.0);
//! ```

use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLockWriteGuard};
use rtrb::{Consumer, Producer, PushError};

use super::command::{Command, EngineEvent, Envelope, Garbage, Receipt};
use super::config::MAX_BLOCK_SIZE;
use super::edge::{Cable, CableId, CableSpec};
use super::gate::RackGate;
use super::node::{ModuleId, ModuleInstance, ModuleShape};
use super::status::{EngineStatus, StatusSnapshot};
use crate::error::{EngineError, Result};

/// The graph as the non-real-time side intends it to be.
#[derive(Debug, Default)]
struct Shadow {
    modules: HashMap<ModuleId, ModuleShape>,
    cables: HashMap<CableId, CableSpec>,
    next_module_id: u64,
    next_cable_id: u64,
}

impl Shadow {
    fn shape(&self, id: ModuleId) -> Result<ModuleShape> {
        self.modules
            .get(&id)
            .copied()
            .ok_or(EngineError::UnknownModule(id))
    }

    fn check_param(&self, module: ModuleId, param: usize) -> Result<()> {
        if param < self.shape(module)?.params {
            Ok(())
        } else {
            Err(EngineError::ParamOutOfRange { module, param })
        }
    }

    fn check_cable(&self, spec: &CableSpec) -> Result<()> {
        let source = self.shape(spec.output_module)?;
        let dest = self.shape(spec.input_module)?;
        if spec.output_id >= source.outputs {
            return Err(EngineError::OutputOutOfRange {
                module: spec.output_module,
                port: spec.output_id,
            });
        }
        if spec.input_id >= dest.inputs {
            return Err(EngineError::InputOutOfRange {
                module: spec.input_module,
                port: spec.input_id,
            });
        }
        if self.cables.values().any(|c| c == spec) {
            return Err(EngineError::DuplicateConnection(*spec));
        }
        Ok(())
    }
}

struct Shared {
    commands: Mutex<Producer<Envelope>>,
    next_seq: Mutex<u64>,
    events: Mutex<Consumer<EngineEvent>>,
    garbage: Mutex<Consumer<Garbage>>,
    shadow: Mutex<Shadow>,
    status: Arc<EngineStatus>,
    gate: Arc<RackGate>,
    max_modules: usize,
    max_cables: usize,
}

/// Cloneable, thread-safe command interface to an engine.
#[derive(Clone)]
pub struct EngineHandle {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

/// Queue endpoints handed to the engine.
pub(crate) struct EngineEndpoints {
    pub commands: Consumer<Envelope>,
    pub events: Producer<EngineEvent>,
    pub garbage: Producer<Garbage>,
}

pub(crate) struct HandleParts {
    pub commands: Producer<Envelope>,
    pub events: Consumer<EngineEvent>,
    pub garbage: Consumer<Garbage>,
    pub status: Arc<EngineStatus>,
    pub gate: Arc<RackGate>,
    pub max_modules: usize,
    pub max_cables: usize,
}

impl EngineHandle {
    pub(crate) fn new(parts: HandleParts) -> Self {
        let shadow = Shadow {
            next_module_id: 1,
            next_cable_id: 1,
            ..Shadow::default()
        };
        Self {
            shared: Arc::new(Shared {
                commands: Mutex::new(parts.commands),
                next_seq: Mutex::new(0),
                events: Mutex::new(parts.events),
                garbage: Mutex::new(parts.garbage),
                shadow: Mutex::new(shadow),
                status: parts.status,
                gate: parts.gate,
                max_modules: parts.max_modules,
                max_cables: parts.max_cables,
            }),
        }
    }

    /// Enqueues a batch atomically: either every command fits or none is
    /// pushed.
    fn push_all(&self, commands: Vec<Command>) -> Result<Receipt> {
        let mut producer = self.shared.commands.lock();
        if producer.is_abandoned() {
            return Err(EngineError::Disconnected);
        }
        if producer.slots() < commands.len() {
            return Err(EngineError::QueueFull);
        }
        let mut seq = self.shared.next_seq.lock();
        for command in commands {
            *seq += 1;
            if let Err(PushError::Full(_)) = producer.push(Envelope {
                seq: *seq,
                command,
            }) {
                return Err(EngineError::QueueFull);
            }
        }
        Ok(Receipt(*seq))
    }

    fn push(&self, command: Command) -> Result<Receipt> {
        #[cfg(feature = "tracing")]
        tracing::trace!("enqueue {command:?}");
        self.push_all(vec![command])
    }

    /// Registers a module under the next automatic id.
    ///
    /// The module is told the current sample rate before it is enqueued.
    pub fn add_module(&self, instance: ModuleInstance) -> Result<(ModuleId, Receipt)> {
        let mut shadow = self.shared.shadow.lock();
        let id = ModuleId(shadow.next_module_id);
        let receipt = self.enqueue_module(&mut shadow, id, instance)?;
        Ok((id, receipt))
    }

    /// Registers a module under an explicit id (patch loading).
    ///
    /// Id 0 is reserved. Later automatic ids continue above the largest id
    /// seen.
    pub fn add_module_with_id(&self, id: ModuleId, instance: ModuleInstance) -> Result<Receipt> {
        let mut shadow = self.shared.shadow.lock();
        if id == ModuleId::sentinel() || shadow.modules.contains_key(&id) {
            return Err(EngineError::DuplicateModule(id));
        }
        self.enqueue_module(&mut shadow, id, instance)
    }

    fn enqueue_module(
        &self,
        shadow: &mut Shadow,
        id: ModuleId,
        mut instance: ModuleInstance,
    ) -> Result<Receipt> {
        if shadow.modules.len() >= self.shared.max_modules {
            return Err(EngineError::ModuleLimit(self.shared.max_modules));
        }
        let sample_rate = self.shared.status.sample_rate();
        instance.module.on_sample_rate_change(sample_rate);
        instance.prepared_rate = sample_rate;
        instance.id = id;
        let shape = instance.shape();
        let receipt = self.push(Command::AddModule(Box::new(instance)))?;
        shadow.modules.insert(id, shape);
        shadow.next_module_id = shadow.next_module_id.max(id.0 + 1);
        #[cfg(feature = "tracing")]
        tracing::debug!("add_module: {id} ({shape:?})");
        Ok(receipt)
    }

    /// Unregisters a module, first removing every cable attached to it.
    pub fn remove_module(&self, id: ModuleId) -> Result<Receipt> {
        let mut shadow = self.shared.shadow.lock();
        shadow.shape(id)?;
        let mut attached: Vec<CableId> = shadow
            .cables
            .iter()
            .filter(|(_, spec)| spec.touches(id))
            .map(|(cable, _)| *cable)
            .collect();
        attached.sort_unstable();
        let mut commands: Vec<Command> =
            attached.iter().map(|&c| Command::RemoveCable(c)).collect();
        commands.push(Command::RemoveModule(id));
        let receipt = self.push_all(commands)?;
        for cable in &attached {
            shadow.cables.remove(cable);
        }
        shadow.modules.remove(&id);
        #[cfg(feature = "tracing")]
        tracing::debug!("remove_module: {id} ({} cables detached)", attached.len());
        Ok(receipt)
    }

    /// Connects an output to an input under the next automatic cable id.
    pub fn add_cable(&self, spec: CableSpec) -> Result<(CableId, Receipt)> {
        let mut shadow = self.shared.shadow.lock();
        let id = CableId(shadow.next_cable_id);
        let receipt = self.enqueue_cable(&mut shadow, id, spec)?;
        Ok((id, receipt))
    }

    /// Connects an output to an input under an explicit cable id.
    pub fn add_cable_with_id(&self, id: CableId, spec: CableSpec) -> Result<Receipt> {
        let mut shadow = self.shared.shadow.lock();
        if id.0 == 0 || shadow.cables.contains_key(&id) {
            return Err(EngineError::DuplicateCable(id));
        }
        self.enqueue_cable(&mut shadow, id, spec)
    }

    fn enqueue_cable(&self, shadow: &mut Shadow, id: CableId, spec: CableSpec) -> Result<Receipt> {
        shadow.check_cable(&spec)?;
        if shadow.cables.len() >= self.shared.max_cables {
            return Err(EngineError::CableLimit(self.shared.max_cables));
        }
        let receipt = self.push(Command::AddCable(Cable::new(id, spec)))?;
        shadow.cables.insert(id, spec);
        shadow.next_cable_id = shadow.next_cable_id.max(id.0 + 1);
        #[cfg(feature = "tracing")]
        tracing::debug!("add_cable: {id} {spec}");
        Ok(receipt)
    }

    /// Disconnects a cable.
    pub fn remove_cable(&self, id: CableId) -> Result<Receipt> {
        let mut shadow = self.shared.shadow.lock();
        if !shadow.cables.contains_key(&id) {
            return Err(EngineError::UnknownCable(id));
        }
        let receipt = self.push(Command::RemoveCable(id))?;
        shadow.cables.remove(&id);
        #[cfg(feature = "tracing")]
        tracing::debug!("remove_cable: {id}");
        Ok(receipt)
    }

    /// Sets a param immediately (clamped by the engine).
    pub fn set_param(&self, module: ModuleId, param: usize, value: f32) -> Result<Receipt> {
        self.shared.shadow.lock().check_param(module, param)?;
        self.push(Command::SetParam {
            module,
            param,
            value,
        })
    }

    /// Moves a param smoothly toward a value.
    pub fn set_smooth_param(&self, module: ModuleId, param: usize, value: f32) -> Result<Receipt> {
        self.shared.shadow.lock().check_param(module, param)?;
        self.push(Command::SetSmoothParam {
            module,
            param,
            value,
        })
    }

    /// Enables or disables bypass on a module.
    pub fn set_bypass(&self, module: ModuleId, bypassed: bool) -> Result<Receipt> {
        self.shared.shadow.lock().shape(module)?;
        self.push(Command::SetBypass { module, bypassed })
    }

    /// Restores a module's params to defaults and calls its reset hook.
    pub fn reset_module(&self, module: ModuleId) -> Result<Receipt> {
        self.shared.shadow.lock().shape(module)?;
        self.push(Command::ResetModule(module))
    }

    /// Requests a sample-rate change, applied between blocks.
    pub fn set_sample_rate(&self, sample_rate: f32) -> Result<Receipt> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(EngineError::InvalidSampleRate(sample_rate));
        }
        self.push(Command::SetSampleRate(sample_rate))
    }

    /// Requests a block-size change, applied between blocks.
    pub fn set_block_size(&self, block_size: usize) -> Result<Receipt> {
        if block_size == 0 || block_size > MAX_BLOCK_SIZE {
            return Err(EngineError::InvalidBlockSize(block_size));
        }
        self.push(Command::SetBlockSize(block_size))
    }

    /// Pauses or resumes processing. A paused engine outputs silence.
    pub fn set_paused(&self, paused: bool) -> Result<Receipt> {
        self.push(Command::SetPaused(paused))
    }

    /// Removes every module and cable.
    pub fn clear_rack(&self) -> Result<Receipt> {
        let mut shadow = self.shared.shadow.lock();
        let receipt = self.push(Command::ClearRack)?;
        shadow.modules.clear();
        shadow.cables.clear();
        #[cfg(feature = "tracing")]
        tracing::debug!("clear_rack");
        Ok(receipt)
    }

    /// Replaces the whole rack with `modules` and `cables` in one batch.
    ///
    /// The clear, every module and every cable are pushed under a single
    /// queue lock, so either all `1 + modules + cables` commands are
    /// enqueued or none is and the intended graph is left as it was.
    /// Automatic ids continue above the largest id seen.
    pub fn replace_rack(
        &self,
        modules: Vec<(ModuleId, ModuleInstance)>,
        cables: Vec<(CableId, CableSpec)>,
    ) -> Result<Receipt> {
        let mut shadow = self.shared.shadow.lock();
        if modules.len() > self.shared.max_modules {
            return Err(EngineError::ModuleLimit(self.shared.max_modules));
        }
        if cables.len() > self.shared.max_cables {
            return Err(EngineError::CableLimit(self.shared.max_cables));
        }

        let mut next = Shadow {
            next_module_id: shadow.next_module_id,
            next_cable_id: shadow.next_cable_id,
            ..Shadow::default()
        };
        let sample_rate = self.shared.status.sample_rate();
        let mut commands = Vec::with_capacity(1 + modules.len() + cables.len());
        commands.push(Command::ClearRack);
        for (id, mut instance) in modules {
            if id == ModuleId::sentinel() || next.modules.contains_key(&id) {
                return Err(EngineError::DuplicateModule(id));
            }
            instance.module.on_sample_rate_change(sample_rate);
            instance.prepared_rate = sample_rate;
            instance.id = id;
            next.modules.insert(id, instance.shape());
            next.next_module_id = next.next_module_id.max(id.0 + 1);
            commands.push(Command::AddModule(Box::new(instance)));
        }
        for (id, spec) in cables {
            if id.0 == 0 || next.cables.contains_key(&id) {
                return Err(EngineError::DuplicateCable(id));
            }
            next.check_cable(&spec)?;
            next.cables.insert(id, spec);
            next.next_cable_id = next.next_cable_id.max(id.0 + 1);
            commands.push(Command::AddCable(Cable::new(id, spec)));
        }

        let receipt = self.push_all(commands)?;
        #[cfg(feature = "tracing")]
        tracing::debug!(
            "replace_rack: {} modules, {} cables",
            next.modules.len(),
            next.cables.len()
        );
        *shadow = next;
        Ok(receipt)
    }

    /// Takes the bulk gate for a whole-rack operation.
    ///
    /// While the returned guard lives the engine skips every block, so a
    /// patch enqueued through the guard is applied in one piece. Expect an
    /// audible gap.
    pub fn begin_bulk(&self) -> BulkGuard<'_> {
        #[cfg(feature = "tracing")]
        tracing::debug!("begin_bulk");
        BulkGuard {
            _guard: self.shared.gate.lock_bulk(),
            handle: self,
        }
    }

    /// Drains pending engine events.
    pub fn poll_events(&self) -> Vec<EngineEvent> {
        let mut events = self.shared.events.lock();
        let mut out = Vec::new();
        while let Ok(event) = events.pop() {
            out.push(event);
        }
        out
    }

    /// Drops every object the engine has detached. Returns how many.
    pub fn collect_garbage(&self) -> usize {
        let mut garbage = self.shared.garbage.lock();
        let mut count = 0;
        while let Ok(item) = garbage.pop() {
            drop(item);
            count += 1;
        }
        count
    }

    /// Returns a copy of the engine's published state.
    pub fn status(&self) -> StatusSnapshot {
        self.shared.status.snapshot()
    }

    /// Returns `true` once the engine has applied the command.
    pub fn is_applied(&self, receipt: Receipt) -> bool {
        self.shared.status.applied_seq() >= receipt.0
    }

    /// Polls until the command is applied or the timeout expires.
    pub fn wait_applied(&self, receipt: Receipt, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.is_applied(receipt) {
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        true
    }

    /// Free command slots. A batch larger than this fails with
    /// [`EngineError::QueueFull`] until the engine drains the queue.
    pub fn free_slots(&self) -> usize {
        self.shared.commands.lock().slots()
    }

    /// Module limit of the engine.
    pub fn max_modules(&self) -> usize {
        self.shared.max_modules
    }

    /// Cable limit of the engine.
    pub fn max_cables(&self) -> usize {
        self.shared.max_cables
    }

    /// Returns `true` if the module is part of the intended graph.
    pub fn contains_module(&self, id: ModuleId) -> bool {
        self.shared.shadow.lock().modules.contains_key(&id)
    }

    /// Ids of the intended modules, ascending.
    pub fn module_ids(&self) -> Vec<ModuleId> {
        let mut ids: Vec<ModuleId> = self.shared.shadow.lock().modules.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// The intended cables, ascending by id.
    pub fn cables(&self) -> Vec<(CableId, CableSpec)> {
        let mut cables: Vec<(CableId, CableSpec)> = self
            .shared
            .shadow
            .lock()
            .cables
            .iter()
            .map(|(id, spec)| (*id, *spec))
            .collect();
        cables.sort_unstable_by_key(|(id, _)| *id);
        cables
    }

    /// Shape of an intended module.
    pub fn module_shape(&self, id: ModuleId) -> Option<ModuleShape> {
        self.shared.shadow.lock().modules.get(&id).copied()
    }
}

/// Holds the bulk gate; derefs to the handle for enqueueing.
#[must_use = "the gate is released when the guard is dropped"]
pub struct BulkGuard<'a> {
    _guard: RwLockWriteGuard<'a, ()>,
    handle: &'a EngineHandle,
}

impl Deref for BulkGuard<'_> {
    type Target = EngineHandle;

    fn deref(&self) -> &EngineHandle {
        self.handle
    }
}
