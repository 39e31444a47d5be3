//! Shared CLI helpers used across multiple commands.

use std::path::{Path, PathBuf};

use anyhow::Context;
use modrack_config::{Patch, Settings, find_patch, load_patch, settings_path};
use modrack_core::{Engine, EngineHandle, ModuleId};
use modrack_registry::ModuleRegistry;

/// A param override from the command line: `MODULE.PARAM=VALUE`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamOverride {
    /// Module id.
    pub module: u64,
    /// Param index.
    pub param: usize,
    /// New value.
    pub value: f32,
}

/// Parse a `MODULE.PARAM=VALUE` string for clap's `value_parser`.
pub fn parse_param_override(s: &str) -> Result<ParamOverride, String> {
    let err = || format!("Invalid parameter format: '{s}' (expected MODULE.PARAM=VALUE)");
    let (target, value) = s.split_once('=').ok_or_else(err)?;
    let (module, param) = target.split_once('.').ok_or_else(err)?;
    Ok(ParamOverride {
        module: module.trim().parse().map_err(|_| err())?,
        param: param.trim().parse().map_err(|_| err())?,
        value: value.trim().parse().map_err(|_| err())?,
    })
}

/// Resolve the settings file: the explicit path, or the platform default.
pub fn resolve_settings_path(explicit: Option<&Path>) -> PathBuf {
    explicit.map_or_else(settings_path, Path::to_path_buf)
}

/// Load settings. An explicit path must exist; the default path falls back
/// to built-in defaults.
pub fn load_settings(explicit: Option<&Path>) -> anyhow::Result<Settings> {
    match explicit {
        Some(path) => Settings::load(path).with_context(|| "failed to load settings"),
        None => Ok(Settings::load_or_default(settings_path())?),
    }
}

/// Load a patch by name or path.
///
/// Searches in this order:
/// 1. File path
/// 2. User patches directory (by name, `.json` optional)
pub fn load_patch_file(name: &str) -> anyhow::Result<(PathBuf, Patch)> {
    let Some(path) = find_patch(name) else {
        anyhow::bail!("Patch '{name}' not found (looked for a file and in the user patches directory)");
    };
    let patch = Patch::load(&path)?;
    Ok((path, patch))
}

/// Create an engine from settings, load the patch and apply overrides.
///
/// The commands are queued; they take effect at the engine's next block.
pub fn build_rack(
    settings: &Settings,
    patch: Option<&Patch>,
    overrides: &[ParamOverride],
) -> anyhow::Result<(Engine, EngineHandle)> {
    let config = settings.to_engine_config()?;
    let (engine, handle) = Engine::new(config)?;
    let registry = ModuleRegistry::new();

    if let Some(patch) = patch {
        let report = load_patch(&handle, &registry, patch)?;
        tracing::info!(
            modules = report.modules,
            cables = report.cables,
            warnings = report.warnings.len(),
            "patch queued"
        );
    }
    for o in overrides {
        handle
            .set_param(ModuleId(o.module), o.param, o.value)
            .with_context(|| format!("cannot set {}.{}", o.module, o.param))?;
    }
    Ok((engine, handle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_override() {
        assert_eq!(
            parse_param_override("2.0=0.5"),
            Ok(ParamOverride {
                module: 2,
                param: 0,
                value: 0.5
            })
        );
        assert!(parse_param_override("2=0.5").is_err());
        assert!(parse_param_override("a.0=1").is_err());
        assert!(parse_param_override("2.0").is_err());
    }
}
