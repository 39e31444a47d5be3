//! Engine settings command.

use std::path::Path;

use clap::{Args, Subcommand};
use modrack_config::Settings;

use super::common::resolve_settings_path;

#[derive(Args)]
pub struct SettingsArgs {
    #[command(subcommand)]
    command: Option<SettingsCommand>,
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Print the effective settings as TOML
    Show,

    /// Print the settings file location
    Path,

    /// Write default settings to the settings file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn run(args: SettingsArgs, explicit: Option<&Path>) -> anyhow::Result<()> {
    let path = resolve_settings_path(explicit);

    match args.command.unwrap_or(SettingsCommand::Show) {
        SettingsCommand::Show => {
            let settings = Settings::load_or_default(&path)?;
            if path.exists() {
                println!("# {}", path.display());
            } else {
                println!("# {} (not found, showing defaults)", path.display());
            }
            print!("{}", settings.to_toml()?);
        }

        SettingsCommand::Path => {
            println!("{}", path.display());
        }

        SettingsCommand::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            Settings::default().save(&path)?;
            println!("Wrote default settings to {}", path.display());
        }
    }

    Ok(())
}
