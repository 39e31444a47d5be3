//! Moving patches into and out of a running engine.
//!
//! [`load_patch`] builds every module off the real-time thread, then
//! replaces the rack under the bulk gate so the engine applies the whole
//! patch in a single block. [`capture_patch`] reads a stopped engine back
//! into a [`Patch`].

use modrack_core::{Engine, EngineError, EngineHandle, ModuleId, ModuleInstance, Receipt};
use modrack_registry::ModuleRegistry;
use thiserror::Error;

use crate::patch::{Patch, PatchCable, PatchModule, PatchParam};
use crate::validation::{PatchValidator, ValidationError, ValidationWarning};

/// Errors from [`load_patch`].
#[derive(Debug, Error)]
pub enum LoadError {
    /// The patch failed validation; nothing was enqueued.
    #[error("invalid patch: {0}")]
    Validation(#[from] ValidationError),

    /// The engine refused a command.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// The command queue cannot hold the whole patch; nothing was enqueued.
    #[error("patch needs {needed} commands, queue has room for {available}")]
    TooLarge {
        /// Commands the patch needs.
        needed: usize,
        /// Free command slots.
        available: usize,
    },
}

/// Summary of a successful [`load_patch`].
#[derive(Debug, Clone)]
pub struct LoadReport {
    /// Modules enqueued.
    pub modules: usize,
    /// Cables enqueued.
    pub cables: usize,
    /// Param problems that were clamped or skipped.
    pub warnings: Vec<ValidationWarning>,
    /// Receipt of the last command; the patch is live once it is applied.
    pub receipt: Receipt,
}

/// Instantiates and configures one module from its patch entry.
fn build_module(
    registry: &ModuleRegistry,
    entry: &PatchModule,
) -> Result<ModuleInstance, ValidationError> {
    let mut instance = registry
        .create(&entry.plugin, &entry.model)
        .ok_or_else(|| ValidationError::UnknownModel {
            module: entry.id,
            plugin: entry.plugin.clone(),
            model: entry.model.clone(),
        })?;
    for param in &entry.params {
        if param.value.is_finite() {
            instance.set_param(param.id, param.value);
        }
    }
    if let Some(data) = &entry.data {
        instance.module_mut().data_from_json(data);
    }
    instance.set_bypassed(entry.bypass);
    Ok(instance)
}

/// Replace the engine's rack with `patch`.
///
/// The patch is validated against the registry and the engine limits, every
/// module is created and configured on the calling thread, and then the
/// clear, module and cable commands are enqueued as one batch while holding
/// the bulk gate. Either the whole patch is enqueued or nothing is, even
/// when other handle clones are sending commands at the same time.
///
/// # Errors
///
/// - [`LoadError::Validation`] if the patch is invalid.
/// - [`LoadError::TooLarge`] if the command queue cannot hold the patch.
/// - [`LoadError::Engine`] if the engine is gone.
pub fn load_patch(
    handle: &EngineHandle,
    registry: &ModuleRegistry,
    patch: &Patch,
) -> Result<LoadReport, LoadError> {
    let warnings = PatchValidator::new(registry)
        .with_limits(handle.max_modules(), handle.max_cables())
        .validate(patch)
        .into_result()?;
    for warning in &warnings {
        tracing::warn!("{warning}");
    }

    let instances = patch
        .modules
        .iter()
        .map(|entry| Ok((entry.module_id(), build_module(registry, entry)?)))
        .collect::<Result<Vec<(ModuleId, ModuleInstance)>, ValidationError>>()?;

    let bulk = handle.begin_bulk();
    let needed = patch.command_count();
    let available = bulk.free_slots();
    if needed > available {
        return Err(LoadError::TooLarge { needed, available });
    }
    let cables = patch
        .cables
        .iter()
        .map(|cable| (cable.cable_id(), cable.spec()))
        .collect();
    // Another handle clone may have taken slots since the check above.
    let receipt = match bulk.replace_rack(instances, cables) {
        Ok(receipt) => receipt,
        Err(EngineError::QueueFull) => {
            return Err(LoadError::TooLarge {
                needed,
                available: bulk.free_slots(),
            });
        }
        Err(e) => return Err(e.into()),
    };
    drop(bulk);

    tracing::info!(
        modules = patch.modules.len(),
        cables = patch.cables.len(),
        "patch loaded"
    );
    Ok(LoadReport {
        modules: patch.modules.len(),
        cables: patch.cables.len(),
        warnings,
        receipt,
    })
}

/// Read the engine's rack into a patch.
///
/// Modules created without a registry model cannot be saved and are
/// skipped, along with their cables.
pub fn capture_patch(engine: &Engine) -> Patch {
    let mut patch = Patch::new();
    for instance in engine.modules() {
        let Some(model) = instance.model() else {
            tracing::warn!(module = %instance.id(), "module has no model, not saved");
            continue;
        };
        let params = (0..instance.shape().params)
            .filter_map(|i| {
                instance.param(i).map(|p| PatchParam {
                    id: i,
                    value: p.value(),
                })
            })
            .collect();
        patch.modules.push(PatchModule {
            id: instance.id().0,
            plugin: model.plugin.to_string(),
            model: model.slug.to_string(),
            params,
            data: instance.module().data_to_json(),
            bypass: instance.is_bypassed(),
        });
    }

    for cable in engine.cables() {
        let saved = |id: ModuleId| patch.module(id.0).is_some();
        if saved(cable.spec.output_module) && saved(cable.spec.input_module) {
            patch.cables.push(PatchCable::from_spec(cable.id, cable.spec));
        }
    }
    patch
}

#[cfg(test)]
mod tests {
    use super::*;
    use modrack_core::EngineConfig;

    fn drone() -> Patch {
        Patch::new()
            .with_module(PatchModule::new(4, "Core", "Constant").with_param(0, 5.0))
            .with_module(PatchModule::new(9, "Core", "Gain").with_param(0, 2.0))
            .with_cable(PatchCable::new(3, 4, 0, 9, 0))
    }

    #[test]
    fn test_load_then_capture() {
        let registry = ModuleRegistry::new();
        let (mut engine, handle) = Engine::new(EngineConfig::default()).unwrap();
        let report = load_patch(&handle, &registry, &drone()).unwrap();
        assert_eq!((report.modules, report.cables), (2, 1));

        engine.step_block(1);
        assert!(handle.is_applied(report.receipt));
        let gain = engine.module(ModuleId(9)).unwrap();
        assert_eq!(gain.output(0).unwrap().voltage(0), 10.0);

        assert_eq!(capture_patch(&engine), drone_with_all_params(&engine));
    }

    /// The captured patch lists every param, not only the ones set.
    fn drone_with_all_params(engine: &Engine) -> Patch {
        let mut expected = drone();
        for module in &mut expected.modules {
            let instance = engine.module(ModuleId(module.id)).unwrap();
            module.params = (0..instance.shape().params)
                .map(|i| PatchParam {
                    id: i,
                    value: instance.param(i).unwrap().value(),
                })
                .collect();
        }
        expected
    }

    #[test]
    fn test_load_replaces_existing_rack() {
        let registry = ModuleRegistry::new();
        let (mut engine, handle) = Engine::new(EngineConfig::default()).unwrap();
        let (old, _) = handle
            .add_module(registry.create("Core", "Mixer").unwrap())
            .unwrap();
        engine.step_block(1);

        load_patch(&handle, &registry, &drone()).unwrap();
        engine.step_block(1);
        assert!(engine.module(old).is_none());
        assert_eq!(engine.module_count(), 2);
        assert_eq!(handle.collect_garbage(), 1);
    }

    #[test]
    fn test_invalid_patch_enqueues_nothing() {
        let registry = ModuleRegistry::new();
        let (_engine, handle) = Engine::new(EngineConfig::default()).unwrap();
        let before = handle.free_slots();
        let patch = drone().with_cable(PatchCable::new(5, 4, 0, 77, 0));
        assert!(matches!(
            load_patch(&handle, &registry, &patch),
            Err(LoadError::Validation(ValidationError::MissingModule { .. }))
        ));
        assert_eq!(handle.free_slots(), before);
    }

    #[test]
    fn test_patch_larger_than_queue() {
        let registry = ModuleRegistry::new();
        let config = EngineConfig::default().with_command_capacity(2);
        let (_engine, handle) = Engine::new(config).unwrap();
        assert!(matches!(
            load_patch(&handle, &registry, &drone()),
            Err(LoadError::TooLarge {
                needed: 4,
                available: 2
            })
        ));
    }

    #[test]
    fn test_queue_taken_by_other_clone_leaves_rack_intact() {
        let registry = ModuleRegistry::new();
        let config = EngineConfig::default().with_command_capacity(4);
        let (mut engine, handle) = Engine::new(config).unwrap();
        let (old, _) = handle
            .add_module(registry.create("Core", "Mixer").unwrap())
            .unwrap();
        engine.step_block(1);

        // Another clone queues one command: the 4-command patch no longer fits.
        handle.clone().set_param(old, 0, 0.5).unwrap();
        assert!(matches!(
            load_patch(&handle, &registry, &drone()),
            Err(LoadError::TooLarge { needed: 4, .. })
        ));
        assert_eq!(handle.module_ids(), vec![old]);

        engine.step_block(1);
        assert!(engine.module(old).is_some());
        assert_eq!(engine.module_count(), 1);
        assert_eq!(handle.collect_garbage(), 0);
    }

    #[test]
    fn test_load_races_with_param_writer() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::thread;
        use std::time::Duration;

        let registry = ModuleRegistry::new();
        let config = EngineConfig::default().with_command_capacity(8);
        let (mut engine, handle) = Engine::new(config).unwrap();
        let stop = Arc::new(AtomicBool::new(false));
        let writer = {
            let handle = handle.clone();
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                while !stop.load(Ordering::Acquire) {
                    // Unknown-module and full-queue errors are expected here.
                    let _ = handle.set_param(ModuleId(9), 0, 1.5);
                    thread::yield_now();
                }
            })
        };

        let mut loaded = 0;
        for _ in 0..200 {
            match load_patch(&handle, &registry, &drone()) {
                Ok(_) => loaded += 1,
                Err(LoadError::TooLarge { .. }) => {}
                Err(e) => panic!("unexpected load error: {e}"),
            }
            let expected = handle.module_ids();
            engine.step_block(1);
            // The engine always holds exactly what the handle intends.
            let actual: Vec<ModuleId> = engine.modules().map(|m| m.id()).collect();
            assert_eq!(actual, expected);
            assert_eq!(engine.cables().len(), handle.cables().len());
            handle.collect_garbage();
            thread::sleep(Duration::from_micros(50));
        }
        stop.store(true, Ordering::Release);
        writer.join().unwrap();
        assert!(loaded > 0);
    }

    #[test]
    fn test_patch_over_module_limit() {
        let registry = ModuleRegistry::new();
        let config = EngineConfig::default().with_limits(1, 8);
        let (_engine, handle) = Engine::new(config).unwrap();
        assert!(matches!(
            load_patch(&handle, &registry, &drone()),
            Err(LoadError::Validation(ValidationError::TooManyModules { count: 2, max: 1 }))
        ));
    }

    #[test]
    fn test_load_clamps_and_bypasses() {
        let registry = ModuleRegistry::new();
        let (mut engine, handle) = Engine::new(EngineConfig::default()).unwrap();
        let patch = Patch::new().with_module(
            PatchModule::new(1, "Core", "Constant")
                .with_param(0, 40.0)
                .bypassed(),
        );
        let report = load_patch(&handle, &registry, &patch).unwrap();
        assert_eq!(report.warnings.len(), 1);

        engine.step_block(1);
        let module = engine.module(ModuleId(1)).unwrap();
        assert_eq!(module.param(0).unwrap().value(), 10.0);
        assert!(module.is_bypassed());
        assert_eq!(module.output(0).unwrap().voltage(0), 0.0);
    }

    #[test]
    fn test_capture_skips_unmodeled_modules() {
        let registry = ModuleRegistry::new();
        let (mut engine, handle) = Engine::new(EngineConfig::default()).unwrap();
        load_patch(&handle, &registry, &drone()).unwrap();
        let bare = ModuleInstance::new(Box::new(modrack_modules::Gain::new()));
        let (id, _) = handle.add_module(bare).unwrap();
        handle
            .add_cable(modrack_core::CableSpec::new(ModuleId(4), 0, id, 0))
            .unwrap();
        engine.step_block(1);

        let patch = capture_patch(&engine);
        assert_eq!(patch.modules.len(), 2);
        assert_eq!(patch.cables.len(), 1);
    }
}
