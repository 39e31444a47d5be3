//! Real-time patch playback command.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use clap::Args;
use modrack_config::capture_patch;
use modrack_core::EngineEvent;
use modrack_io::{CpalBackend, DriverConfig, RunningDriver};

use super::common::{ParamOverride, build_rack, load_patch_file, load_settings, parse_param_override};

#[derive(Args)]
pub struct RunArgs {
    /// Patch file or name in the user patches directory
    patch: Option<String>,

    /// Param override (repeatable), e.g. "2.0=0.5" sets param 0 of module 2
    #[arg(long = "set", value_parser = parse_param_override, number_of_values = 1)]
    overrides: Vec<ParamOverride>,

    /// Output device name (overrides settings)
    #[arg(long)]
    output_device: Option<String>,

    /// Input device name (opens an input stream)
    #[arg(long)]
    input_device: Option<String>,

    /// Open the default input device
    #[arg(long)]
    input: bool,

    /// Device buffer size in frames (overrides settings)
    #[arg(long)]
    buffer_size: Option<u32>,

    /// Stop after this many seconds
    #[arg(long)]
    duration: Option<f32>,

    /// Save the rack to this patch file when stopping
    #[arg(long, value_name = "PATH")]
    save_on_exit: Option<PathBuf>,
}

pub fn run(args: RunArgs, settings_path: Option<&Path>) -> anyhow::Result<()> {
    let settings = load_settings(settings_path)?;
    let patch = match &args.patch {
        Some(name) => {
            let (path, patch) = load_patch_file(name)?;
            println!("Loading patch: {}", path.display());
            Some(patch)
        }
        None => None,
    };
    let (engine, handle) = build_rack(&settings, patch.as_ref(), &args.overrides)?;

    let input_device = args.input_device.or(settings.audio.input_device.clone());
    let config = DriverConfig {
        output_device: args.output_device.or(settings.audio.output_device.clone()),
        enable_input: args.input || input_device.is_some(),
        input_device,
        channels: settings.audio.channels,
        buffer_size: args.buffer_size.or(settings.audio.buffer_size),
        ..DriverConfig::default()
    };

    let backend = CpalBackend::new();
    let driver = RunningDriver::start(&backend, engine, &handle, config.clone())?;

    println!("Running rack with {} module(s)", patch.as_ref().map_or(0, |p| p.modules.len()));
    println!(
        "  Output: {}",
        config.output_device.as_deref().unwrap_or("default")
    );
    if config.enable_input {
        println!(
            "  Input:  {}",
            config.input_device.as_deref().unwrap_or("default")
        );
    }
    println!("  Sample rate: {} Hz", driver.sample_rate());
    println!("  Block size: {} frames", settings.block_size);
    println!("\nPress Ctrl+C to stop...\n");

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        println!("\nStopping...");
        r.store(false, Ordering::SeqCst);
    })?;

    let started = Instant::now();
    let limit = args.duration.map(Duration::from_secs_f32);
    while running.load(Ordering::SeqCst) && limit.is_none_or(|limit| started.elapsed() < limit) {
        std::thread::sleep(Duration::from_millis(100));
        handle.collect_garbage();
        for event in handle.poll_events() {
            match event {
                EngineEvent::Rejected { .. } => tracing::warn!("{event:?}"),
                _ => tracing::debug!("{event:?}"),
            }
        }
    }

    let engine = driver.stop()?;
    handle.collect_garbage();
    let status = handle.status();
    println!(
        "Processed {} frames in {} blocks ({} skipped)",
        status.frames, status.blocks, status.skipped_blocks
    );

    if let Some(path) = args.save_on_exit {
        capture_patch(&engine).save(&path)?;
        println!("Saved patch: {}", path.display());
    }

    println!("Done!");
    Ok(())
}
