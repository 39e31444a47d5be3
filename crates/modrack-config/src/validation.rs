//! Patch validation.
//!
//! Checks a [`Patch`] against a [`ModuleRegistry`] before it is loaded:
//! every model must exist, ids must be unique and non-zero, cables must
//! reference modules and ports that exist, and no output may be connected
//! to the same input twice. Param problems are warnings; the loader clamps
//! or skips them.
//!
//! # Example
//!
//! ```rust
//! use modrack_config::{Patch, PatchModule, validate_patch};
//! use modrack_registry::ModuleRegistry;
//!
//! let registry = ModuleRegistry::new();
//! let patch = Patch::new().with_module(PatchModule::new(1, "Core", "Gain"));
//! assert!(validate_patch(&patch, &registry).is_ok());
//! ```

use std::collections::{HashMap, HashSet};

use modrack_core::ModuleShape;
use modrack_registry::ModuleRegistry;
use thiserror::Error;

use crate::patch::Patch;

/// Patch errors that prevent loading.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// No registered model matches.
    #[error("unknown model '{plugin}/{model}' for module {module}")]
    UnknownModel {
        /// Module id in the patch.
        module: u64,
        /// Plugin slug.
        plugin: String,
        /// Model slug.
        model: String,
    },

    /// Module id 0 is reserved.
    #[error("module id 0 is reserved")]
    ZeroModuleId,

    /// Two modules share an id.
    #[error("duplicate module id {0}")]
    DuplicateModule(u64),

    /// Cable id 0 is reserved.
    #[error("cable id 0 is reserved")]
    ZeroCableId,

    /// Two cables share an id.
    #[error("duplicate cable id {0}")]
    DuplicateCable(u64),

    /// A cable references a module not in the patch.
    #[error("cable {cable} references missing module {module}")]
    MissingModule {
        /// Cable id.
        cable: u64,
        /// Referenced module id.
        module: u64,
    },

    /// A cable starts at an output the module does not have.
    #[error("cable {cable}: module {module} has no output {port}")]
    OutputOutOfRange {
        /// Cable id.
        cable: u64,
        /// Source module id.
        module: u64,
        /// Output index.
        port: usize,
    },

    /// A cable ends at an input the module does not have.
    #[error("cable {cable}: module {module} has no input {port}")]
    InputOutOfRange {
        /// Cable id.
        cable: u64,
        /// Destination module id.
        module: u64,
        /// Input index.
        port: usize,
    },

    /// A cable repeats the endpoints of an earlier cable.
    #[error("cable {cable} duplicates cable {original}")]
    DuplicateConnection {
        /// Cable id.
        cable: u64,
        /// Id of the earlier cable with the same endpoints.
        original: u64,
    },

    /// More modules than the engine allows.
    #[error("patch has {count} modules, limit is {max}")]
    TooManyModules {
        /// Modules in the patch.
        count: usize,
        /// Engine limit.
        max: usize,
    },

    /// More cables than the engine allows.
    #[error("patch has {count} cables, limit is {max}")]
    TooManyCables {
        /// Cables in the patch.
        count: usize,
        /// Engine limit.
        max: usize,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Param problems the loader tolerates.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationWarning {
    /// The param index does not exist on the model; the entry is skipped.
    UnknownParam {
        /// Module id.
        module: u64,
        /// Param index.
        param: usize,
    },
    /// The value is outside the param range and will be clamped.
    OutOfRange {
        /// Module id.
        module: u64,
        /// Param index.
        param: usize,
        /// Value in the patch.
        value: f32,
        /// Value after clamping.
        clamped: f32,
    },
    /// The value is NaN or infinite; the entry is skipped.
    NotFinite {
        /// Module id.
        module: u64,
        /// Param index.
        param: usize,
    },
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownParam { module, param } => {
                write!(f, "module {module} has no param {param}")
            }
            Self::OutOfRange {
                module,
                param,
                value,
                clamped,
            } => write!(
                f,
                "module {module} param {param}: {value} out of range, clamped to {clamped}"
            ),
            Self::NotFinite { module, param } => {
                write!(f, "module {module} param {param} is not a finite number")
            }
        }
    }
}

/// Outcome of validating a patch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    /// Problems that prevent loading.
    pub errors: Vec<ValidationError>,
    /// Problems the loader works around.
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// `true` if the patch can be loaded.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Converts to a `Result`, folding several errors into
    /// [`ValidationError::Multiple`].
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ValidationError> {
        let mut errors = self.errors;
        match errors.len() {
            0 => Ok(self.warnings),
            1 => Err(errors.remove(0)),
            _ => Err(ValidationError::Multiple(errors)),
        }
    }
}

/// Param ranges of one model, read from a probe instance.
#[derive(Debug, Clone)]
struct ModelInfo {
    shape: ModuleShape,
    ranges: Vec<(f32, f32)>,
}

/// Validator for patches.
///
/// Caches model shapes and param ranges so that repeated modules of the
/// same model are only instantiated once.
pub struct PatchValidator<'a> {
    registry: &'a ModuleRegistry,
    limits: Option<(usize, usize)>,
    cache: HashMap<(String, String), Option<ModelInfo>>,
}

impl<'a> PatchValidator<'a> {
    /// Create a validator over a registry.
    pub fn new(registry: &'a ModuleRegistry) -> Self {
        Self {
            registry,
            limits: None,
            cache: HashMap::new(),
        }
    }

    /// Also check module and cable counts against engine limits.
    pub fn with_limits(mut self, max_modules: usize, max_cables: usize) -> Self {
        self.limits = Some((max_modules, max_cables));
        self
    }

    fn model(&mut self, plugin: &str, model: &str) -> Option<&ModelInfo> {
        let registry = self.registry;
        self.cache
            .entry((plugin.to_string(), model.to_string()))
            .or_insert_with(|| {
                let instance = registry.create(plugin, model)?;
                let shape = instance.shape();
                let ranges = (0..shape.params)
                    .filter_map(|i| instance.param(i).map(|p| (p.min(), p.max())))
                    .collect();
                Some(ModelInfo { shape, ranges })
            })
            .as_ref()
    }

    /// Validate a patch.
    pub fn validate(&mut self, patch: &Patch) -> ValidationResult {
        let mut result = ValidationResult::default();

        if let Some((max_modules, max_cables)) = self.limits {
            if patch.modules.len() > max_modules {
                result.errors.push(ValidationError::TooManyModules {
                    count: patch.modules.len(),
                    max: max_modules,
                });
            }
            if patch.cables.len() > max_cables {
                result.errors.push(ValidationError::TooManyCables {
                    count: patch.cables.len(),
                    max: max_cables,
                });
            }
        }

        let mut shapes: HashMap<u64, Option<ModuleShape>> = HashMap::new();
        for module in &patch.modules {
            if module.id == 0 {
                result.errors.push(ValidationError::ZeroModuleId);
                continue;
            }
            if shapes.contains_key(&module.id) {
                result
                    .errors
                    .push(ValidationError::DuplicateModule(module.id));
                continue;
            }

            let Some(info) = self.model(&module.plugin, &module.model).cloned() else {
                result.errors.push(ValidationError::UnknownModel {
                    module: module.id,
                    plugin: module.plugin.clone(),
                    model: module.model.clone(),
                });
                // Cables to this module are reported once, as the unknown model.
                shapes.insert(module.id, None);
                continue;
            };
            shapes.insert(module.id, Some(info.shape));

            for param in &module.params {
                let Some(&(min, max)) = info.ranges.get(param.id) else {
                    result.warnings.push(ValidationWarning::UnknownParam {
                        module: module.id,
                        param: param.id,
                    });
                    continue;
                };
                if !param.value.is_finite() {
                    result.warnings.push(ValidationWarning::NotFinite {
                        module: module.id,
                        param: param.id,
                    });
                } else if param.value < min || param.value > max {
                    result.warnings.push(ValidationWarning::OutOfRange {
                        module: module.id,
                        param: param.id,
                        value: param.value,
                        clamped: param.value.clamp(min, max),
                    });
                }
            }
        }

        let mut cable_ids = HashSet::new();
        let mut connections: HashMap<(u64, usize, u64, usize), u64> = HashMap::new();
        for cable in &patch.cables {
            if cable.id == 0 {
                result.errors.push(ValidationError::ZeroCableId);
                continue;
            }
            if !cable_ids.insert(cable.id) {
                result.errors.push(ValidationError::DuplicateCable(cable.id));
                continue;
            }

            let (Some(source), Some(dest)) = (
                shapes.get(&cable.output_module_id),
                shapes.get(&cable.input_module_id),
            ) else {
                let module = if shapes.contains_key(&cable.output_module_id) {
                    cable.input_module_id
                } else {
                    cable.output_module_id
                };
                result.errors.push(ValidationError::MissingModule {
                    cable: cable.id,
                    module,
                });
                continue;
            };

            if let Some(source) = source
                && cable.output_id >= source.outputs
            {
                result.errors.push(ValidationError::OutputOutOfRange {
                    cable: cable.id,
                    module: cable.output_module_id,
                    port: cable.output_id,
                });
                continue;
            }
            if let Some(dest) = dest
                && cable.input_id >= dest.inputs
            {
                result.errors.push(ValidationError::InputOutOfRange {
                    cable: cable.id,
                    module: cable.input_module_id,
                    port: cable.input_id,
                });
                continue;
            }

            let key = (
                cable.output_module_id,
                cable.output_id,
                cable.input_module_id,
                cable.input_id,
            );
            if let Some(&original) = connections.get(&key) {
                result.errors.push(ValidationError::DuplicateConnection {
                    cable: cable.id,
                    original,
                });
            } else {
                connections.insert(key, cable.id);
            }
        }

        result
    }
}

/// Validate a patch against a registry, without engine limits.
pub fn validate_patch(patch: &Patch, registry: &ModuleRegistry) -> ValidationResult {
    PatchValidator::new(registry).validate(patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::{PatchCable, PatchModule};

    fn registry() -> ModuleRegistry {
        ModuleRegistry::new()
    }

    fn two_module_patch() -> Patch {
        Patch::new()
            .with_module(PatchModule::new(1, "Core", "Constant"))
            .with_module(PatchModule::new(2, "Core", "Gain"))
    }

    #[test]
    fn test_valid_patch() {
        let patch = two_module_patch().with_cable(PatchCable::new(1, 1, 0, 2, 0));
        let result = validate_patch(&patch, &registry());
        assert!(result.is_ok(), "{:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_empty_patch_is_valid() {
        assert!(validate_patch(&Patch::new(), &registry()).is_ok());
    }

    #[test]
    fn test_unknown_model() {
        let patch = Patch::new().with_module(PatchModule::new(1, "Core", "Theremin"));
        let result = validate_patch(&patch, &registry());
        assert_eq!(
            result.errors,
            vec![ValidationError::UnknownModel {
                module: 1,
                plugin: "Core".to_string(),
                model: "Theremin".to_string(),
            }]
        );
    }

    #[test]
    fn test_cables_to_unknown_model_are_not_reported_twice() {
        let patch = Patch::new()
            .with_module(PatchModule::new(1, "Core", "Constant"))
            .with_module(PatchModule::new(2, "Other", "Filter"))
            .with_cable(PatchCable::new(1, 1, 0, 2, 5));
        let result = validate_patch(&patch, &registry());
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_zero_and_duplicate_module_ids() {
        let patch = Patch::new()
            .with_module(PatchModule::new(0, "Core", "Gain"))
            .with_module(PatchModule::new(3, "Core", "Gain"))
            .with_module(PatchModule::new(3, "Core", "Gain"));
        let result = validate_patch(&patch, &registry());
        assert_eq!(
            result.errors,
            vec![
                ValidationError::ZeroModuleId,
                ValidationError::DuplicateModule(3)
            ]
        );
    }

    #[test]
    fn test_cable_errors() {
        let patch = two_module_patch()
            .with_cable(PatchCable::new(0, 1, 0, 2, 0))
            .with_cable(PatchCable::new(1, 1, 0, 9, 0))
            .with_cable(PatchCable::new(2, 1, 4, 2, 0))
            .with_cable(PatchCable::new(3, 1, 0, 2, 7))
            .with_cable(PatchCable::new(4, 1, 0, 2, 0))
            .with_cable(PatchCable::new(4, 1, 0, 2, 1))
            .with_cable(PatchCable::new(5, 1, 0, 2, 0));
        let result = validate_patch(&patch, &registry());
        assert_eq!(
            result.errors,
            vec![
                ValidationError::ZeroCableId,
                ValidationError::MissingModule { cable: 1, module: 9 },
                ValidationError::OutputOutOfRange {
                    cable: 2,
                    module: 1,
                    port: 4
                },
                ValidationError::InputOutOfRange {
                    cable: 3,
                    module: 2,
                    port: 7
                },
                ValidationError::DuplicateCable(4),
                ValidationError::DuplicateConnection {
                    cable: 5,
                    original: 4
                },
            ]
        );
    }

    #[test]
    fn test_param_warnings() {
        let patch = Patch::new().with_module(
            PatchModule::new(1, "Core", "Constant")
                .with_param(0, 25.0)
                .with_param(0, f32::NAN)
                .with_param(42, 1.0),
        );
        let result = validate_patch(&patch, &registry());
        assert!(result.is_ok());
        assert_eq!(
            result.warnings,
            vec![
                ValidationWarning::OutOfRange {
                    module: 1,
                    param: 0,
                    value: 25.0,
                    clamped: 10.0
                },
                ValidationWarning::NotFinite { module: 1, param: 0 },
                ValidationWarning::UnknownParam { module: 1, param: 42 },
            ]
        );
    }

    #[test]
    fn test_limits() {
        let patch = two_module_patch().with_cable(PatchCable::new(1, 1, 0, 2, 0));
        let reg = registry();
        let result = PatchValidator::new(&reg).with_limits(1, 0).validate(&patch);
        assert_eq!(
            result.errors,
            vec![
                ValidationError::TooManyModules { count: 2, max: 1 },
                ValidationError::TooManyCables { count: 1, max: 0 },
            ]
        );
    }

    #[test]
    fn test_into_result_folds_errors() {
        let single = ValidationResult {
            errors: vec![ValidationError::ZeroModuleId],
            warnings: Vec::new(),
        };
        assert_eq!(single.into_result(), Err(ValidationError::ZeroModuleId));

        let many = ValidationResult {
            errors: vec![ValidationError::ZeroModuleId, ValidationError::ZeroCableId],
            warnings: Vec::new(),
        };
        let err = many.into_result().unwrap_err();
        assert!(matches!(err, ValidationError::Multiple(ref v) if v.len() == 2));
        assert!(err.to_string().contains("; "));
    }

    #[test]
    fn test_validator_caches_models() {
        let reg = registry();
        let mut validator = PatchValidator::new(&reg);
        let patch = (1..=5).fold(Patch::new(), |p, id| {
            p.with_module(PatchModule::new(id, "Core", "Gain"))
        });
        assert!(validator.validate(&patch).is_ok());
        assert_eq!(validator.cache.len(), 1);
    }
}
