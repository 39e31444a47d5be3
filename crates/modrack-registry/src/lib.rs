//! Module registry and factory for modrack.
//!
//! This crate provides a centralized registry for discovering and
//! instantiating modules. Patches refer to modules by plugin and model slug;
//! the registry turns those names back into ready-to-register
//! [`ModuleInstance`]s tagged with their [`ModelKey`].
//!
//! # Features
//!
//! - **Module Discovery**: List all available models with metadata
//! - **Factory Pattern**: Create modules by plugin and slug at runtime
//! - **Category System**: Models organized by role (sources, routing, ...)
//! - **Parameter Info**: Look up param indices by name for scripting
//!
//! # Example
//!
//! ```rust
//! use modrack_registry::{ModuleCategory, ModuleRegistry, CORE_PLUGIN};
//!
//! let registry = ModuleRegistry::new();
//!
//! for model in registry.all_models() {
//!     println!("{}/{}: {}", model.plugin, model.slug, model.description);
//! }
//!
//! let gain = registry.create(CORE_PLUGIN, "Gain").unwrap();
//! assert_eq!(gain.model().unwrap().slug, "Gain");
//!
//! for model in registry.models_in_category(ModuleCategory::Routing) {
//!     println!("Routing: {}", model.name);
//! }
//! ```

use modrack_core::{ModelKey, Module, ModuleInstance, ModuleShape};
use modrack_modules::{AudioInterface, Constant, Gain, Merge, Mixer, SineOsc, Split};

/// Plugin slug of the built-in modules.
pub const CORE_PLUGIN: &str = "Core";

/// Category of module for organization and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleCategory {
    /// Oscillators and constant sources
    Source,
    /// Gain stages and other single-signal processors
    Utility,
    /// Mixers
    Mixing,
    /// Polyphonic merge and split
    Routing,
    /// Audio device interfaces
    Io,
}

impl ModuleCategory {
    /// Returns a human-readable name for the category.
    pub const fn name(&self) -> &'static str {
        match self {
            ModuleCategory::Source => "Source",
            ModuleCategory::Utility => "Utility",
            ModuleCategory::Mixing => "Mixing",
            ModuleCategory::Routing => "Routing",
            ModuleCategory::Io => "I/O",
        }
    }

    /// Returns a description of the category.
    pub const fn description(&self) -> &'static str {
        match self {
            ModuleCategory::Source => "Oscillators, constants, and other signal sources",
            ModuleCategory::Utility => "Gain stages and single-signal utilities",
            ModuleCategory::Mixing => "Mixers and summing modules",
            ModuleCategory::Routing => "Polyphonic merge, split, and channel routing",
            ModuleCategory::Io => "Bridges between the rack and audio hardware",
        }
    }
}

/// Describes a model in the registry.
#[derive(Debug, Clone)]
pub struct ModuleModel {
    /// Plugin slug.
    pub plugin: &'static str,
    /// Model slug, unique within the plugin.
    pub slug: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Brief description of the module.
    pub description: &'static str,
    /// Category for organization.
    pub category: ModuleCategory,
}

impl ModuleModel {
    /// Returns the key stamped on instances of this model.
    pub fn key(&self) -> ModelKey {
        ModelKey {
            plugin: self.plugin,
            slug: self.slug,
        }
    }
}

/// Factory function type for creating modules.
pub type ModuleFactory = fn() -> Box<dyn Module>;

/// Internal entry in the registry.
struct RegistryEntry {
    model: ModuleModel,
    factory: ModuleFactory,
}

/// Registry of all available modules.
///
/// All built-in modules are registered by [`ModuleRegistry::new`]; hosts may
/// add their own with [`ModuleRegistry::register`].
pub struct ModuleRegistry {
    entries: Vec<RegistryEntry>,
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| e.model.key()))
            .finish()
    }
}

impl ModuleRegistry {
    /// Create a new registry with all built-in modules registered.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_builtin_modules();
        registry
    }

    /// Create a registry with nothing registered.
    pub fn empty() -> Self {
        Self {
            entries: Vec::with_capacity(8),
        }
    }

    /// Register all built-in modules.
    fn register_builtin_modules(&mut self) {
        self.register(
            ModuleModel {
                plugin: CORE_PLUGIN,
                slug: "Constant",
                name: "Constant",
                description: "Polyphonic constant voltage",
                category: ModuleCategory::Source,
            },
            || Box::new(Constant::new()),
        );

        self.register(
            ModuleModel {
                plugin: CORE_PLUGIN,
                slug: "SineOsc",
                name: "Sine Oscillator",
                description: "1 V/oct sine oscillator with exponential FM",
                category: ModuleCategory::Source,
            },
            || Box::new(SineOsc::new()),
        );

        self.register(
            ModuleModel {
                plugin: CORE_PLUGIN,
                slug: "Gain",
                name: "Gain",
                description: "Polyphonic gain with CV",
                category: ModuleCategory::Utility,
            },
            || Box::new(Gain::new()),
        );

        self.register(
            ModuleModel {
                plugin: CORE_PLUGIN,
                slug: "Mixer",
                name: "Mixer",
                description: "Four-strip polyphonic mixer with master level",
                category: ModuleCategory::Mixing,
            },
            || Box::new(Mixer::new()),
        );

        self.register(
            ModuleModel {
                plugin: CORE_PLUGIN,
                slug: "Merge",
                name: "Merge",
                description: "Sixteen mono inputs to one polyphonic output",
                category: ModuleCategory::Routing,
            },
            || Box::new(Merge::new()),
        );

        self.register(
            ModuleModel {
                plugin: CORE_PLUGIN,
                slug: "Split",
                name: "Split",
                description: "One polyphonic input to sixteen mono outputs",
                category: ModuleCategory::Routing,
            },
            || Box::new(Split::new()),
        );

        self.register(
            ModuleModel {
                plugin: CORE_PLUGIN,
                slug: "AudioInterface",
                name: "Audio Interface",
                description: "Eight device inputs and outputs as rack ports",
                category: ModuleCategory::Io,
            },
            || Box::new(AudioInterface::new()),
        );
    }

    /// Register a model. A later registration with the same plugin and slug
    /// replaces the earlier one.
    pub fn register(&mut self, model: ModuleModel, factory: ModuleFactory) {
        let entry = RegistryEntry { model, factory };
        match self
            .entries
            .iter_mut()
            .find(|e| e.model.plugin == entry.model.plugin && e.model.slug == entry.model.slug)
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    fn entry(&self, plugin: &str, slug: &str) -> Option<&RegistryEntry> {
        self.entries
            .iter()
            .find(|e| e.model.plugin == plugin && e.model.slug == slug)
    }

    /// Returns descriptors for all registered models.
    pub fn all_models(&self) -> Vec<&ModuleModel> {
        self.entries.iter().map(|e| &e.model).collect()
    }

    /// Returns descriptors for models in a specific category.
    pub fn models_in_category(&self, category: ModuleCategory) -> Vec<&ModuleModel> {
        self.entries
            .iter()
            .filter(|e| e.model.category == category)
            .map(|e| &e.model)
            .collect()
    }

    /// Get a descriptor by plugin and slug.
    pub fn get(&self, plugin: &str, slug: &str) -> Option<&ModuleModel> {
        self.entry(plugin, slug).map(|e| &e.model)
    }

    /// Find a model by slug alone, case-insensitively, across plugins.
    ///
    /// Convenient for command-line use; patches always name the plugin.
    pub fn find(&self, slug: &str) -> Option<&ModuleModel> {
        self.entries
            .iter()
            .find(|e| e.model.slug.eq_ignore_ascii_case(slug))
            .map(|e| &e.model)
    }

    /// Create a module instance by plugin and slug.
    ///
    /// Returns `None` if the model is not registered. The instance carries
    /// the model key and default param values.
    pub fn create(&self, plugin: &str, slug: &str) -> Option<ModuleInstance> {
        self.entry(plugin, slug)
            .map(|e| ModuleInstance::new((e.factory)()).with_model(e.model.key()))
    }

    /// Port, param and light counts of a model.
    ///
    /// Creates a temporary instance to read its descriptors.
    pub fn shape(&self, plugin: &str, slug: &str) -> Option<ModuleShape> {
        self.create(plugin, slug).map(|instance| instance.shape())
    }

    /// Find a parameter index by name for a given model.
    ///
    /// Creates a temporary instance to scan parameter descriptors. Returns
    /// `None` if the model or parameter name is not found.
    pub fn param_index_by_name(&self, plugin: &str, slug: &str, param_name: &str) -> Option<usize> {
        let entry = self.entry(plugin, slug)?;
        let module = (entry.factory)();
        module
            .params()
            .iter()
            .position(|desc| desc.name.eq_ignore_ascii_case(param_name))
    }

    /// Returns the number of registered models.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no models are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
