//! Pluggable audio backend abstraction.
//!
//! The [`AudioBackend`] trait decouples the real-time driver from any
//! specific platform audio API. Two implementations ship with the crate:
//!
//! - [`CpalBackend`](crate::CpalBackend): ALSA, CoreAudio, WASAPI through cpal
//! - [`ManualBackend`](crate::ManualBackend): callbacks are pumped by the
//!   caller, giving deterministic tests without audio hardware
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────┐
//! │     RunningDriver (engine)       │
//! └──────────────┬───────────────────┘
//!                │ uses AudioBackend trait
//!                ▼
//! ┌──────────────────────────────────┐
//! │        AudioBackend trait        │
//! │  list_devices / build_streams    │
//! └──────────────┬───────────────────┘
//!                │ implemented by
//!        ┌───────┴────────┐
//!        ▼                ▼
//! ┌─────────────┐  ┌──────────────┐
//! │ CpalBackend │  │ ManualBackend│
//! └─────────────┘  └──────────────┘
//! ```
//!
//! Callbacks are boxed closures, so the trait is object-safe and the
//! backend can be chosen at runtime. Streams come back as a type-erased
//! [`StreamHandle`] that stops the stream when dropped.

use crate::{AudioDevice, Result};

/// Configuration for building an audio stream.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendStreamConfig {
    /// Requested sample rate in Hz.
    pub sample_rate: u32,
    /// Preferred buffer size in frames; the device default when `None`.
    pub buffer_size: Option<u32>,
    /// Number of interleaved channels.
    pub channels: u16,
    /// Device name filter (uses the system default if `None`).
    pub device_name: Option<String>,
}

impl Default for BackendStreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            buffer_size: None,
            channels: 2,
            device_name: None,
        }
    }
}

/// Type-erased audio stream handle.
///
/// The stream is active while this handle exists; dropping it stops
/// playback or capture.
pub struct StreamHandle {
    _inner: Box<dyn Send>,
}

impl StreamHandle {
    /// Wraps a backend-specific stream object, keeping it alive until the
    /// handle is dropped.
    pub fn new<T: Send + 'static>(stream: T) -> Self {
        Self {
            _inner: Box::new(stream),
        }
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle").finish_non_exhaustive()
    }
}

/// Audio output callback.
///
/// Runs on the real-time thread and fills interleaved `f32` samples:
/// `[L0, R0, L1, R1, ...]`, `frames * channels` long. Must not allocate,
/// lock or block.
pub type OutputCallback = Box<dyn FnMut(&mut [f32]) + Send>;

/// Audio input callback, receiving interleaved captured samples.
pub type InputCallback = Box<dyn FnMut(&[f32]) + Send>;

/// Called with a message when the backend reports a stream error.
pub type ErrorCallback = Box<dyn FnMut(&str) + Send>;

/// Pluggable audio backend.
pub trait AudioBackend: Send {
    /// Short backend name (e.g. `"cpal"`, `"manual"`).
    fn name(&self) -> &str;

    /// List all available audio devices.
    fn list_devices(&self) -> Result<Vec<AudioDevice>>;

    /// Get the default output device, if any.
    fn default_output_device(&self) -> Result<Option<AudioDevice>>;

    /// Build and start an output stream.
    ///
    /// The returned [`StreamHandle`] keeps the stream alive.
    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        callback: OutputCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle>;

    /// Build and start an input stream.
    fn build_input_stream(
        &self,
        config: &BackendStreamConfig,
        callback: InputCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle>;

    /// The sample rate the backend will actually run `config` at.
    ///
    /// Defaults to the requested rate.
    fn actual_sample_rate(&self, config: &BackendStreamConfig) -> u32 {
        config.sample_rate
    }
}
