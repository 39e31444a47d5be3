//! Offline rendering: step an engine faster than real time and collect or
//! write its device output.

use std::path::Path;

use hound::{SampleFormat, WavWriter};
use modrack_core::{AudioBlock, Engine};

use crate::{Error, Result};

/// Output format of [`render_to_wav`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// Number of interleaved channels.
    pub channels: u16,
    /// 16 or 24 for integer PCM, 32 for float.
    pub bits_per_sample: u16,
}

impl Default for WavSpec {
    fn default() -> Self {
        Self {
            channels: 2,
            bits_per_sample: 32,
        }
    }
}

impl WavSpec {
    fn to_hound(self, sample_rate: u32) -> hound::WavSpec {
        hound::WavSpec {
            channels: self.channels,
            sample_rate,
            bits_per_sample: self.bits_per_sample,
            sample_format: if self.bits_per_sample == 32 {
                SampleFormat::Float
            } else {
                SampleFormat::Int
            },
        }
    }
}

/// Steps `engine` for `frames` frames and returns its interleaved device
/// output with `channels` channels.
///
/// Frames are processed in chunks of the engine's block size.
pub fn render_frames(engine: &mut Engine, frames: usize, channels: usize) -> Vec<f32> {
    let mut out = vec![0.0; frames * channels];
    if channels == 0 {
        return out;
    }
    let mut offset = 0;
    while offset < frames {
        let n = (frames - offset).min(engine.block_size());
        let mut block =
            AudioBlock::output_only(&mut out[offset * channels..(offset + n) * channels], channels);
        engine.process_block(&mut block);
        offset += n;
    }
    out
}

/// Renders `seconds` of device output to a 32-bit float WAV file.
///
/// Returns the number of frames written.
pub fn render_to_wav(
    engine: &mut Engine,
    path: impl AsRef<Path>,
    seconds: f32,
    channels: u16,
) -> Result<u64> {
    let spec = WavSpec {
        channels,
        ..WavSpec::default()
    };
    render_to_wav_with_progress(engine, path, seconds, spec, |_, _| {})
}

/// Renders `seconds` of device output to a WAV file, reporting progress
/// as `(frames_done, frames_total)` after every block.
///
/// Returns the number of frames written.
pub fn render_to_wav_with_progress(
    engine: &mut Engine,
    path: impl AsRef<Path>,
    seconds: f32,
    spec: WavSpec,
    mut progress: impl FnMut(u64, u64),
) -> Result<u64> {
    if spec.channels == 0 {
        return Err(Error::InvalidChannels(0));
    }
    let sample_rate = engine.sample_rate().round() as u32;
    let total = (f64::from(seconds.max(0.0)) * f64::from(sample_rate)).round() as u64;
    let channels = usize::from(spec.channels);
    let mut writer = WavWriter::create(path.as_ref(), spec.to_hound(sample_rate))?;
    let max_int = if spec.bits_per_sample == 32 {
        0.0
    } else {
        (1i32 << (spec.bits_per_sample - 1)) as f32
    };

    let mut buffer = vec![0.0f32; engine.block_size() * channels];
    let mut done = 0u64;
    while done < total {
        let n = ((total - done) as usize).min(engine.block_size());
        buffer.resize(n * channels, 0.0);
        let mut block = AudioBlock::output_only(&mut buffer, channels);
        engine.process_block(&mut block);

        for &sample in &buffer {
            if spec.bits_per_sample == 32 {
                writer.write_sample(sample)?;
            } else {
                let int_sample = (sample * max_int).clamp(-max_int, max_int - 1.0) as i32;
                writer.write_sample(int_sample)?;
            }
        }
        done += n as u64;
        progress(done, total);
    }

    writer.finalize()?;
    tracing::debug!(frames = total, path = %path.as_ref().display(), "render complete");
    Ok(total)
}
