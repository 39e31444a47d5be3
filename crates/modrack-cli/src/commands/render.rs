//! Offline rendering command.

use std::path::{Path, PathBuf};

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use modrack_io::{WavSpec, render_to_wav_with_progress};

use super::common::{ParamOverride, build_rack, load_patch_file, load_settings, parse_param_override};

#[derive(Args)]
pub struct RenderArgs {
    /// Patch file or name in the user patches directory
    patch: String,

    /// Output WAV file
    output: PathBuf,

    /// Length in seconds
    #[arg(short, long, default_value = "5.0")]
    seconds: f32,

    /// Output channels
    #[arg(short, long, default_value = "2")]
    channels: u16,

    /// Bit depth (16, 24 or 32 float)
    #[arg(long, default_value = "32", value_parser = clap::builder::PossibleValuesParser::new(["16", "24", "32"]))]
    bits: String,

    /// Sample rate (overrides settings)
    #[arg(long)]
    sample_rate: Option<f32>,

    /// Param override (repeatable), e.g. "2.0=0.5" sets param 0 of module 2
    #[arg(long = "set", value_parser = parse_param_override, number_of_values = 1)]
    overrides: Vec<ParamOverride>,
}

pub fn run(args: RenderArgs, settings_path: Option<&Path>) -> anyhow::Result<()> {
    if !(args.seconds.is_finite() && args.seconds > 0.0) {
        anyhow::bail!("--seconds must be positive");
    }
    let mut settings = load_settings(settings_path)?;
    if let Some(rate) = args.sample_rate {
        settings.sample_rate = rate;
    }
    let (path, patch) = load_patch_file(&args.patch)?;
    let (mut engine, _handle) = build_rack(&settings, Some(&patch), &args.overrides)?;

    let spec = WavSpec {
        channels: args.channels,
        bits_per_sample: args.bits.parse()?,
    };
    println!("Rendering: {}", path.display());
    println!("  Modules: {}", patch.modules.len());
    println!("  Sample rate: {} Hz", engine.sample_rate());
    println!("  Length: {:.2}s, {} channel(s), {}-bit", args.seconds, spec.channels, spec.bits_per_sample);

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    let frames = render_to_wav_with_progress(
        &mut engine,
        &args.output,
        args.seconds,
        spec,
        |done, total| {
            pb.set_length(total);
            pb.set_position(done);
        },
    )?;
    pb.finish_with_message("done");

    println!("Wrote {} frames to {}", frames, args.output.display());
    Ok(())
}
