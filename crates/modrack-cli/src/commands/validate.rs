//! Patch validation command.

use std::path::Path;

use clap::Args;
use modrack_config::PatchValidator;
use modrack_registry::ModuleRegistry;

use super::common::{load_patch_file, load_settings};

#[derive(Args)]
pub struct ValidateArgs {
    /// Patch files or names to check
    #[arg(required = true)]
    patches: Vec<String>,
}

pub fn run(args: ValidateArgs, settings_path: Option<&Path>) -> anyhow::Result<()> {
    let settings = load_settings(settings_path)?;
    let registry = ModuleRegistry::new();
    let mut validator =
        PatchValidator::new(&registry).with_limits(settings.max_modules, settings.max_cables);

    let mut failed = 0;
    for name in &args.patches {
        let (path, patch) = match load_patch_file(name) {
            Ok(loaded) => loaded,
            Err(e) => {
                println!("{name}: {e}");
                failed += 1;
                continue;
            }
        };
        let result = validator.validate(&patch);

        if result.is_ok() {
            println!(
                "{}: OK ({} modules, {} cables)",
                path.display(),
                patch.modules.len(),
                patch.cables.len()
            );
        } else {
            println!("{}: {} error(s)", path.display(), result.errors.len());
            failed += 1;
        }
        for error in &result.errors {
            println!("  error: {error}");
        }
        for warning in &result.warnings {
            println!("  warning: {warning}");
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} patch(es) failed validation");
    }
    Ok(())
}
