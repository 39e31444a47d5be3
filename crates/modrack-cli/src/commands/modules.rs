//! Module listing and information command.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use clap::Args;
use modrack_core::ParamFlags;
use modrack_registry::{ModuleCategory, ModuleModel, ModuleRegistry};

#[derive(Args)]
pub struct ModulesArgs {
    /// Show ports and params of a specific module
    #[arg(value_name = "MODULE")]
    module: Option<String>,
}

pub fn run(args: ModulesArgs) -> anyhow::Result<()> {
    let registry = ModuleRegistry::new();

    match &args.module {
        Some(slug) => {
            let model = registry
                .find(slug)
                .ok_or_else(|| anyhow::anyhow!("Unknown module: {slug}"))?;
            print_details(&registry, model)
        }
        None => {
            print_list(&registry);
            Ok(())
        }
    }
}

fn print_list(registry: &ModuleRegistry) {
    println!("Available Modules");
    println!("=================");

    let mut categories: Vec<ModuleCategory> = Vec::new();
    for model in registry.all_models() {
        if !categories.contains(&model.category) {
            categories.push(model.category);
        }
    }

    for category in categories {
        println!();
        println!("{} - {}", category.name(), category.description());
        for model in registry.models_in_category(category) {
            println!("  {:16} {}", model.slug, model.description);
        }
    }

    println!();
    println!("Use 'modrack modules <MODULE>' to see ports and params.");
}

fn print_details(registry: &ModuleRegistry, model: &ModuleModel) -> anyhow::Result<()> {
    let instance = registry
        .create(model.plugin, model.slug)
        .ok_or_else(|| anyhow::anyhow!("Cannot create module: {}", model.slug))?;
    let module = instance.module();

    let title = format!("{} ({}/{})", model.name, model.plugin, model.slug);
    println!("{title}");
    println!("{}", "=".repeat(title.len()));
    println!();
    println!("{}", model.description);

    for (heading, ports) in [("Inputs", module.inputs()), ("Outputs", module.outputs())] {
        if ports.is_empty() {
            continue;
        }
        println!();
        println!("{heading}:");
        for (i, port) in ports.iter().enumerate() {
            if port.description.is_empty() {
                println!("  [{i:2}] {}", port.name);
            } else {
                println!("  [{i:2}] {:20} {}", port.name, port.description);
            }
        }
    }

    let params = module.params();
    if !params.is_empty() {
        println!();
        println!("Params:");
        println!();
        println!("  {:4}  {:14}  {:14}  {}", "Id", "Name", "Default", "Range");
        println!("  {:4}  {:14}  {:14}  {}", "--", "----", "-------", "-----");
        for (i, param) in params.iter().enumerate() {
            if param.flags.contains(ParamFlags::HIDDEN) {
                continue;
            }
            println!(
                "  {:4}  {:14}  {:14}  {} .. {}",
                i,
                param.name,
                param.format_value(param.default),
                param.format_value(param.min),
                param.format_value(param.max),
            );
        }
    }

    let lights = module.lights();
    if !lights.is_empty() {
        println!();
        println!("Lights: {}", lights.len());
    }

    Ok(())
}
