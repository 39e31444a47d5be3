//! Patches, settings and patch loading for the modrack engine.
//!
//! # Features
//!
//! - **Patches**: JSON documents listing modules, their params and private
//!   data, and the cables between them
//! - **Settings**: TOML engine and audio device settings
//! - **Validation**: check a patch against the module registry before loading
//! - **Loading**: replace a running engine's rack atomically, or capture it
//! - **Paths**: platform-specific settings and patch directories
//!
//! # Example
//!
//! ```rust
//! use modrack_config::{Patch, PatchCable, PatchModule, capture_patch, load_patch};
//! use modrack_core::{Engine, EngineConfig};
//! use modrack_registry::ModuleRegistry;
//!
//! let registry = ModuleRegistry::new();
//! let (mut engine, handle) = Engine::new(EngineConfig::default()).unwrap();
//!
//! let patch = Patch::new()
//!     .with_module(PatchModule::new(1, "Core", "Constant").with_param(0, 5.0))
//!     .with_module(PatchModule::new(2, "Core", "Gain").with_param(0, 2.0))
//!     .with_cable(PatchCable::new(1, 1, 0, 2, 0));
//!
//! load_patch(&handle, &registry, &patch).unwrap();
//! engine.step_block(1);
//! assert_eq!(capture_patch(&engine).modules.len(), 2);
//! ```

mod error;
mod loader;
mod patch;
mod settings;

/// Platform-specific paths for patches and settings.
pub mod paths;

/// Patch validation.
pub mod validation;

pub use error::ConfigError;
pub use loader::{LoadError, LoadReport, capture_patch, load_patch};
pub use patch::{PATCH_VERSION, Patch, PatchCable, PatchModule, PatchParam};
pub use paths::{find_patch, settings_path, user_config_dir, user_patches_dir};
pub use settings::{AudioSettings, Settings};
pub use validation::{
    PatchValidator, ValidationError, ValidationResult, ValidationWarning, validate_patch,
};
