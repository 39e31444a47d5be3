//! Audio device listing command.

use clap::{Args, Subcommand};
use modrack_io::{AudioBackend, CpalBackend, default_device};

#[derive(Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    command: Option<DevicesCommand>,
}

#[derive(Subcommand)]
enum DevicesCommand {
    /// List all available audio devices
    List,

    /// Show default device information
    Info,
}

pub fn run(args: DevicesArgs) -> anyhow::Result<()> {
    match args.command.unwrap_or(DevicesCommand::List) {
        DevicesCommand::List => {
            let backend = CpalBackend::new();
            let devices = backend.list_devices()?;

            if devices.is_empty() {
                println!("No audio devices found.");
                return Ok(());
            }

            println!("Available Audio Devices ({})", backend.name());
            println!("=======================\n");

            let outputs: Vec<_> = devices.iter().filter(|d| d.is_output).collect();
            if !outputs.is_empty() {
                println!("Output Devices:");
                for (idx, device) in outputs.iter().enumerate() {
                    let also_input = if device.is_input { " (also input)" } else { "" };
                    println!(
                        "  [{}] {} ({} Hz, {} ch){}",
                        idx, device.name, device.default_sample_rate, device.channels, also_input
                    );
                }
                println!();
            }

            let inputs: Vec<_> = devices.iter().filter(|d| d.is_input).collect();
            if !inputs.is_empty() {
                println!("Input Devices:");
                for (idx, device) in inputs.iter().enumerate() {
                    println!(
                        "  [{}] {} ({} Hz, {} ch)",
                        idx, device.name, device.default_sample_rate, device.channels
                    );
                }
                println!();
            }

            println!(
                "Total: {} output(s), {} input(s)",
                outputs.len(),
                inputs.len()
            );
            println!();
            println!("Tip: Use a partial device name with --output-device/--input-device:");
            println!("  modrack run drone --output-device \"USB\"");
        }

        DevicesCommand::Info => {
            let (input, output) = default_device()?;

            println!("Default Audio Devices");
            println!("=====================\n");

            match output {
                Some(device) => {
                    println!("Default Output:");
                    println!("  Name: {}", device.name);
                    println!("  Sample Rate: {} Hz", device.default_sample_rate);
                    println!("  Channels: {}", device.channels);
                    println!();
                }
                None => println!("Default Output: None\n"),
            }

            match input {
                Some(device) => {
                    println!("Default Input:");
                    println!("  Name: {}", device.name);
                    println!("  Sample Rate: {} Hz", device.default_sample_rate);
                    println!("  Channels: {}", device.channels);
                }
                None => println!("Default Input: None"),
            }
        }
    }

    Ok(())
}
