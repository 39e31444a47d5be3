//! Module instances: a boxed [`Module`] plus its engine-owned storage.

use std::fmt;

use crate::light::Light;
use crate::module::{Module, ModuleIo};
use crate::param::Param;
use crate::port::{Input, Output};

/// Stable identifier of a module within a patch.
///
/// Automatically assigned ids start at 1 and are never reused by the
/// allocator; patch loading may supply explicit ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub u64);

impl ModuleId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u64 {
        self.0
    }

    /// Returns the placeholder carried by instances not yet registered.
    #[inline]
    pub fn sentinel() -> Self {
        Self(0)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module#{}", self.0)
    }
}

/// Identifies the model a module was created from (plugin and slug).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ModelKey {
    /// Plugin slug, e.g. `"Core"`.
    pub plugin: &'static str,
    /// Model slug within the plugin, e.g. `"Gain"`.
    pub slug: &'static str,
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.plugin, self.slug)
    }
}

/// Port, param and light counts of a module.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ModuleShape {
    /// Number of inputs.
    pub inputs: usize,
    /// Number of outputs.
    pub outputs: usize,
    /// Number of params.
    pub params: usize,
    /// Number of lights.
    pub lights: usize,
}

/// A module together with the ports, params and lights the engine drives.
///
/// Built on a non-real-time thread, configured (params, private data),
/// then moved into the engine through the command queue.
pub struct ModuleInstance {
    pub(crate) id: ModuleId,
    pub(crate) model: Option<ModelKey>,
    pub(crate) module: Box<dyn Module>,
    pub(crate) io: ModuleIo,
    pub(crate) bypassed: bool,
    pub(crate) cpu_time: f32,
    /// Sample rate last passed to `on_sample_rate_change`.
    pub(crate) prepared_rate: f32,
}

impl ModuleInstance {
    /// Wraps a module and allocates its storage from its descriptors.
    pub fn new(module: Box<dyn Module>) -> Self {
        let io = ModuleIo::for_module(module.as_ref());
        Self {
            id: ModuleId::sentinel(),
            model: None,
            module,
            io,
            bypassed: false,
            cpu_time: 0.0,
            prepared_rate: 0.0,
        }
    }

    /// Tags the instance with the model it was created from.
    pub fn with_model(mut self, model: ModelKey) -> Self {
        self.model = Some(model);
        self
    }

    /// Returns the id, or [`ModuleId::sentinel`] before registration.
    #[inline]
    pub fn id(&self) -> ModuleId {
        self.id
    }

    /// Returns the model key, if the instance came from a registry.
    #[inline]
    pub fn model(&self) -> Option<ModelKey> {
        self.model
    }

    /// Returns the port, param and light counts.
    pub fn shape(&self) -> ModuleShape {
        ModuleShape {
            inputs: self.io.inputs.len(),
            outputs: self.io.outputs.len(),
            params: self.io.params.len(),
            lights: self.io.lights.len(),
        }
    }

    /// Returns the wrapped module.
    pub fn module(&self) -> &dyn Module {
        self.module.as_ref()
    }

    /// Returns the wrapped module mutably.
    pub fn module_mut(&mut self) -> &mut dyn Module {
        self.module.as_mut()
    }

    /// Returns the port, param and light storage.
    pub fn io(&self) -> &ModuleIo {
        &self.io
    }

    /// Returns an input port.
    pub fn input(&self, index: usize) -> Option<&Input> {
        self.io.inputs.get(index)
    }

    /// Returns an output port.
    pub fn output(&self, index: usize) -> Option<&Output> {
        self.io.outputs.get(index)
    }

    /// Returns a param.
    pub fn param(&self, index: usize) -> Option<&Param> {
        self.io.params.get(index)
    }

    /// Returns a light.
    pub fn light(&self, index: usize) -> Option<&Light> {
        self.io.lights.get(index)
    }

    /// Sets a param value (clamped). Returns `false` for an unknown index.
    pub fn set_param(&mut self, index: usize, value: f32) -> bool {
        match self.io.params.get_mut(index) {
            Some(param) => {
                param.set_value(value);
                true
            }
            None => false,
        }
    }

    /// Returns `true` while the module is bypassed.
    #[inline]
    pub fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    /// Sets the bypass flag before registration.
    pub fn set_bypassed(&mut self, bypassed: bool) {
        self.bypassed = bypassed;
    }

    /// Smoothed `process` duration in seconds (zero unless the CPU meter is on).
    #[inline]
    pub fn cpu_time(&self) -> f32 {
        self.cpu_time
    }

    /// Restores every param to its default and notifies the module.
    pub fn reset(&mut self) {
        for param in &mut self.io.params {
            param.reset();
        }
        self.module.on_reset();
    }

    /// Zeroes the outputs of a bypassed module.
    pub(crate) fn silence_outputs(&mut self) {
        for output in &mut self.io.outputs {
            output.silence();
        }
        self.cpu_time = 0.0;
    }

    pub(crate) fn update_plug_lights(&mut self, delta_time: f32) {
        for port in self.io.inputs.iter_mut().chain(self.io.outputs.iter_mut()) {
            port.update_plug_lights(delta_time);
        }
    }
}

impl fmt::Debug for ModuleInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleInstance")
            .field("id", &self.id)
            .field("model", &self.model)
            .field("shape", &self.shape())
            .field("bypassed", &self.bypassed)
            .finish_non_exhaustive()
    }
}
