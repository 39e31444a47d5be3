//! Platform-specific paths for patches and settings.
//!
//! # Directory Structure
//!
//! - **User config**: `~/.config/modrack/` (Linux), `~/Library/Application Support/modrack/` (macOS), `%APPDATA%\modrack\` (Windows)
//! - **User patches**: `<user config>/patches/`
//! - **Settings file**: `<user config>/settings.toml`
//!
//! # Example
//!
//! ```rust,no_run
//! use modrack_config::paths;
//!
//! println!("Settings: {:?}", paths::settings_path());
//!
//! // Find a patch by name (current directory, then user patches)
//! if let Some(path) = paths::find_patch("drone") {
//!     println!("Found patch at: {:?}", path);
//! }
//! ```

use std::path::{Path, PathBuf};

/// Application name used for directory paths.
const APP_NAME: &str = "modrack";

/// Subdirectory name for patches.
const PATCHES_SUBDIR: &str = "patches";

/// File name of the settings file.
const SETTINGS_FILE: &str = "settings.toml";

/// File extension of patch documents.
pub const PATCH_EXTENSION: &str = "json";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the user-specific patches directory.
pub fn user_patches_dir() -> PathBuf {
    user_config_dir().join(PATCHES_SUBDIR)
}

/// Returns the path of the settings file.
pub fn settings_path() -> PathBuf {
    user_config_dir().join(SETTINGS_FILE)
}

/// Find a patch file by name.
///
/// Searches in the following order:
/// 1. The name as a path (absolute or relative)
/// 2. User patches directory
///
/// The name may omit the `.json` extension.
pub fn find_patch(name: &str) -> Option<PathBuf> {
    find_patch_in(name, &user_patches_dir())
}

fn find_patch_in(name: &str, patches_dir: &Path) -> Option<PathBuf> {
    let path = PathBuf::from(name);
    if path.is_file() {
        return Some(path);
    }

    let filename = if name.ends_with(".json") {
        name.to_string()
    } else {
        format!("{name}.{PATCH_EXTENSION}")
    };

    let user_path = patches_dir.join(filename);
    user_path.is_file().then_some(user_path)
}

/// Ensure the user patches directory exists.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_user_patches_dir() -> Result<PathBuf, crate::ConfigError> {
    ensure_dir(user_patches_dir())
}

/// Ensure the user config directory exists.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_user_config_dir() -> Result<PathBuf, crate::ConfigError> {
    ensure_dir(user_config_dir())
}

fn ensure_dir(dir: PathBuf) -> Result<PathBuf, crate::ConfigError> {
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| crate::ConfigError::create_dir(&dir, e))?;
    }
    Ok(dir)
}

/// List all patch files in the user patches directory.
///
/// Returns an empty vector if the directory doesn't exist or can't be read.
pub fn list_user_patches() -> Vec<PathBuf> {
    list_patches_in_dir(&user_patches_dir())
}

/// Helper to list patch files in a directory, sorted by path.
fn list_patches_in_dir(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut patches: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == PATCH_EXTENSION))
        .collect();
    patches.sort();
    patches
}

/// Get the patch name from a file path (the file stem).
///
/// # Example
///
/// ```rust
/// use modrack_config::paths::patch_name_from_path;
/// use std::path::Path;
///
/// let name = patch_name_from_path(Path::new("/path/to/drone.json"));
/// assert_eq!(name, Some("drone".to_string()));
/// ```
pub fn patch_name_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}
