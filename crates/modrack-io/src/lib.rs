//! Audio I/O layer for the modrack engine.
//!
//! This crate provides:
//!
//! - **Backends**: the [`AudioBackend`] trait, implemented by
//!   [`CpalBackend`] for real devices and [`ManualBackend`] for tests
//! - **Real-time driver**: [`RunningDriver`] moves an [`Engine`] onto the
//!   device callback and hands it back on stop
//! - **Offline rendering**: [`render_frames`] and [`render_to_wav`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use modrack_core::{Engine, EngineConfig};
//! use modrack_io::{CpalBackend, DriverConfig, RunningDriver};
//!
//! let (engine, handle) = Engine::new(EngineConfig::default())?;
//! let backend = CpalBackend::new();
//! let driver = RunningDriver::start(&backend, engine, &handle, DriverConfig::default())?;
//! // ... patch the rack through `handle` ...
//! let engine = driver.stop()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! [`Engine`]: modrack_core::Engine

pub mod backend;
pub mod cpal_backend;
mod devices;
mod driver;
pub mod manual_backend;
mod render;

pub use backend::{AudioBackend, BackendStreamConfig, StreamHandle};
pub use cpal_backend::CpalBackend;
pub use devices::{AudioDevice, default_device, list_devices};
pub use driver::{DriverConfig, RunningDriver};
pub use manual_backend::ManualBackend;
pub use render::{WavSpec, render_frames, render_to_wav, render_to_wav_with_progress};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// A stream was requested with zero channels.
    #[error("Invalid channel count: {0}")]
    InvalidChannels(u16),

    /// The engine refused a command.
    #[error("Engine error: {0}")]
    Engine(#[from] modrack_core::EngineError),

    /// The audio callback did not hand the engine back in time.
    #[error("Engine was not returned by the audio callback")]
    EngineNotReturned,

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
