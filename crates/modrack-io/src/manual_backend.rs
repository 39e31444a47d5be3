//! Deterministic backend driven by the caller.
//!
//! [`ManualBackend`] never starts a thread. Streams built on it store their
//! callbacks; the test then calls [`ManualBackend::pump`] to run the output
//! callback for a given number of frames and
//! [`ManualBackend::feed_input`] to deliver captured samples.
//!
//! ```rust
//! use modrack_io::{AudioBackend, BackendStreamConfig, ManualBackend};
//!
//! let backend = ManualBackend::new(48000);
//! let _stream = backend
//!     .build_output_stream(
//!         &BackendStreamConfig::default(),
//!         Box::new(|buffer: &mut [f32]| buffer.fill(0.25)),
//!         Box::new(|_| {}),
//!     )
//!     .unwrap();
//! assert_eq!(backend.pump(4), vec![0.25; 8]);
//! ```

use std::sync::Arc;

use parking_lot::Mutex;

use crate::backend::{
    AudioBackend, BackendStreamConfig, ErrorCallback, InputCallback, OutputCallback, StreamHandle,
};
use crate::{AudioDevice, Result};

const DEVICE_NAME: &str = "Manual";

#[derive(Default)]
struct ManualState {
    output: Option<(u16, OutputCallback)>,
    input: Option<InputCallback>,
    output_errors: Option<ErrorCallback>,
}

/// Caller-pumped audio backend for tests and offline use.
#[derive(Clone)]
pub struct ManualBackend {
    sample_rate: u32,
    state: Arc<Mutex<ManualState>>,
}

/// Clears its stream's callback when dropped.
struct ManualStream {
    state: Arc<Mutex<ManualState>>,
    output: bool,
}

impl Drop for ManualStream {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if self.output {
            state.output = None;
            state.output_errors = None;
        } else {
            state.input = None;
        }
    }
}

impl ManualBackend {
    /// Create a backend that reports `sample_rate` as its actual rate.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            state: Arc::new(Mutex::new(ManualState::default())),
        }
    }

    /// Runs the output callback for `frames` frames and returns the
    /// interleaved buffer it filled. Returns an empty vector when no output
    /// stream is open.
    pub fn pump(&self, frames: usize) -> Vec<f32> {
        let mut state = self.state.lock();
        let Some((channels, callback)) = state.output.as_mut() else {
            return Vec::new();
        };
        let mut buffer = vec![0.0; frames * usize::from(*channels)];
        callback(&mut buffer);
        buffer
    }

    /// Delivers interleaved samples to the input callback. Returns `false`
    /// when no input stream is open.
    pub fn feed_input(&self, samples: &[f32]) -> bool {
        let mut state = self.state.lock();
        match state.input.as_mut() {
            Some(callback) => {
                callback(samples);
                true
            }
            None => false,
        }
    }

    /// Reports a stream error to the output stream's error callback.
    pub fn raise_error(&self, message: &str) {
        if let Some(callback) = self.state.lock().output_errors.as_mut() {
            callback(message);
        }
    }

    /// Whether an output stream is open.
    pub fn has_output_stream(&self) -> bool {
        self.state.lock().output.is_some()
    }

    /// Whether an input stream is open.
    pub fn has_input_stream(&self) -> bool {
        self.state.lock().input.is_some()
    }

    fn device(&self) -> AudioDevice {
        AudioDevice {
            name: DEVICE_NAME.to_string(),
            is_input: true,
            is_output: true,
            default_sample_rate: self.sample_rate,
            channels: 2,
        }
    }
}

impl AudioBackend for ManualBackend {
    fn name(&self) -> &'static str {
        "manual"
    }

    fn list_devices(&self) -> Result<Vec<AudioDevice>> {
        Ok(vec![self.device()])
    }

    fn default_output_device(&self) -> Result<Option<AudioDevice>> {
        Ok(Some(self.device()))
    }

    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        callback: OutputCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        if config.channels == 0 {
            return Err(crate::Error::InvalidChannels(0));
        }
        let mut state = self.state.lock();
        state.output = Some((config.channels, callback));
        state.output_errors = Some(error_callback);
        Ok(StreamHandle::new(ManualStream {
            state: Arc::clone(&self.state),
            output: true,
        }))
    }

    fn build_input_stream(
        &self,
        config: &BackendStreamConfig,
        callback: InputCallback,
        _error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        if config.channels == 0 {
            return Err(crate::Error::InvalidChannels(0));
        }
        self.state.lock().input = Some(callback);
        Ok(StreamHandle::new(ManualStream {
            state: Arc::clone(&self.state),
            output: false,
        }))
    }

    fn actual_sample_rate(&self, _config: &BackendStreamConfig) -> u32 {
        self.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pump_without_stream_is_empty() {
        assert!(ManualBackend::new(48000).pump(16).is_empty());
    }

    #[test]
    fn test_dropping_handle_closes_stream() {
        let backend = ManualBackend::new(48000);
        let stream = backend
            .build_output_stream(
                &BackendStreamConfig::default(),
                Box::new(|buffer: &mut [f32]| buffer.fill(1.0)),
                Box::new(|_| {}),
            )
            .unwrap();
        assert!(backend.has_output_stream());
        assert_eq!(backend.pump(2), vec![1.0; 4]);
        drop(stream);
        assert!(!backend.has_output_stream());
    }

    #[test]
    fn test_feed_input_reaches_callback() {
        let backend = ManualBackend::new(48000);
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let _stream = backend
            .build_input_stream(
                &BackendStreamConfig::default(),
                Box::new(move |data: &[f32]| sink.lock().extend_from_slice(data)),
                Box::new(|_| {}),
            )
            .unwrap();
        assert!(backend.feed_input(&[0.5, -0.5]));
        assert_eq!(*received.lock(), vec![0.5, -0.5]);
    }

    #[test]
    fn test_reports_fixed_sample_rate() {
        let backend = ManualBackend::new(44100);
        assert_eq!(
            backend.actual_sample_rate(&BackendStreamConfig::default()),
            44100
        );
        assert_eq!(backend.list_devices().unwrap()[0].default_sample_rate, 44100);
    }
}
