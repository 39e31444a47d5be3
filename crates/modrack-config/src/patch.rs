//! Patch document format and operations.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use modrack_core::{CableId, CableSpec, ModuleId};

/// Version written into new patch documents.
pub const PATCH_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A saved rack: modules with their params and private data, and the cables
/// between them.
///
/// # JSON Format
///
/// ```json
/// {
///   "version": "0.1.0",
///   "modules": [
///     { "id": 1, "plugin": "Core", "model": "Constant",
///       "params": [{ "id": 0, "value": 5.0 }] },
///     { "id": 2, "plugin": "Core", "model": "Gain",
///       "params": [{ "id": 0, "value": 2.0 }], "bypass": true }
///   ],
///   "cables": [
///     { "id": 1, "outputModuleId": 1, "outputId": 0,
///       "inputModuleId": 2, "inputId": 0 }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patch {
    /// Version of the application that wrote the patch.
    #[serde(default = "default_version")]
    pub version: String,

    /// Modules in registration order.
    #[serde(default)]
    pub modules: Vec<PatchModule>,

    /// Cables in registration order.
    #[serde(default)]
    pub cables: Vec<PatchCable>,
}

fn default_version() -> String {
    PATCH_VERSION.to_string()
}

impl Default for Patch {
    fn default() -> Self {
        Self::new()
    }
}

/// One module of a patch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatchModule {
    /// Module id, unique within the patch and never zero.
    pub id: u64,
    /// Plugin slug, e.g. `"Core"`.
    pub plugin: String,
    /// Model slug within the plugin.
    pub model: String,
    /// Param values by index. Params not listed keep their defaults.
    #[serde(default)]
    pub params: Vec<PatchParam>,
    /// Module-private state as produced by `Module::data_to_json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Whether the module is bypassed.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bypass: bool,
}

/// A param value inside a [`PatchModule`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PatchParam {
    /// Param index.
    pub id: usize,
    /// Param value in the param's own units.
    pub value: f32,
}

/// One cable of a patch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PatchCable {
    /// Cable id, unique within the patch and never zero.
    pub id: u64,
    /// Source module id.
    pub output_module_id: u64,
    /// Output port index on the source module.
    pub output_id: usize,
    /// Destination module id.
    pub input_module_id: u64,
    /// Input port index on the destination module.
    pub input_id: usize,
}

impl PatchModule {
    /// Create a module entry with no params set.
    pub fn new(id: u64, plugin: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id,
            plugin: plugin.into(),
            model: model.into(),
            params: Vec::new(),
            data: None,
            bypass: false,
        }
    }

    /// Set a param value.
    pub fn with_param(mut self, id: usize, value: f32) -> Self {
        self.params.push(PatchParam { id, value });
        self
    }

    /// Attach private module data.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Mark the module bypassed.
    pub fn bypassed(mut self) -> Self {
        self.bypass = true;
        self
    }

    /// Engine id of the module.
    pub fn module_id(&self) -> ModuleId {
        ModuleId(self.id)
    }
}

impl PatchCable {
    /// Create a cable entry.
    pub fn new(
        id: u64,
        output_module_id: u64,
        output_id: usize,
        input_module_id: u64,
        input_id: usize,
    ) -> Self {
        Self {
            id,
            output_module_id,
            output_id,
            input_module_id,
            input_id,
        }
    }

    /// Build a patch entry from an engine cable.
    pub fn from_spec(id: CableId, spec: CableSpec) -> Self {
        Self::new(
            id.0,
            spec.output_module.0,
            spec.output_id,
            spec.input_module.0,
            spec.input_id,
        )
    }

    /// Engine id of the cable.
    pub fn cable_id(&self) -> CableId {
        CableId(self.id)
    }

    /// Engine description of the cable.
    pub fn spec(&self) -> CableSpec {
        CableSpec::new(
            ModuleId(self.output_module_id),
            self.output_id,
            ModuleId(self.input_module_id),
            self.input_id,
        )
    }
}

impl Patch {
    /// Create an empty patch.
    pub fn new() -> Self {
        Self {
            version: default_version(),
            modules: Vec::new(),
            cables: Vec::new(),
        }
    }

    /// Add a module to the patch.
    pub fn with_module(mut self, module: PatchModule) -> Self {
        self.modules.push(module);
        self
    }

    /// Add a cable to the patch.
    pub fn with_cable(mut self, cable: PatchCable) -> Self {
        self.cables.push(cable);
        self
    }

    /// Load a patch from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_json(&content)
    }

    /// Load a patch from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Save the patch to a JSON file, creating the parent directory.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_json()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the patch to a pretty-printed JSON string.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Find a module entry by id.
    pub fn module(&self, id: u64) -> Option<&PatchModule> {
        self.modules.iter().find(|m| m.id == id)
    }

    /// Number of commands needed to load this patch onto a cleared rack.
    pub fn command_count(&self) -> usize {
        1 + self.modules.len() + self.cables.len()
    }

    /// Check if the patch has no modules.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
