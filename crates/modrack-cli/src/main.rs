//! modrack CLI - command-line host for the modrack modular audio engine.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "modrack")]
#[command(author, version, about = "Modular audio rack host", long_about = None)]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "PATH")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a patch on the audio device
    Run(commands::run::RunArgs),

    /// Render a patch offline to a WAV file
    Render(commands::render::RenderArgs),

    /// List audio devices
    Devices(commands::devices::DevicesArgs),

    /// List available modules and their ports and params
    Modules(commands::modules::ModulesArgs),

    /// Check a patch file against the module registry
    Validate(commands::validate::ValidateArgs),

    /// Show or initialize engine settings
    Settings(commands::settings::SettingsArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();
    tracing_log::LogTracer::init().ok();

    let cli = Cli::parse();
    let settings = cli.settings.as_deref();

    match cli.command {
        Commands::Run(args) => commands::run::run(args, settings),
        Commands::Render(args) => commands::render::run(args, settings),
        Commands::Devices(args) => commands::devices::run(args),
        Commands::Modules(args) => commands::modules::run(args),
        Commands::Validate(args) => commands::validate::run(args, settings),
        Commands::Settings(args) => commands::settings::run(args, settings),
    }
}
