//! Real-time driver: runs an [`Engine`] inside the device callback.
//!
//! The output callback owns the engine. Each device buffer is split into
//! chunks of at most the engine's block size and every chunk is one
//! [`Engine::process_block`] call. Captured input travels from the input
//! stream to the output callback through an SPSC ring. Both sides move
//! whole frames only, so channels never slip; missing input reads as
//! silence and a buffer that does not fit the ring is dropped whole.
//!
//! Stopping sets a flag the callback checks at its next invocation. The
//! callback then pushes the engine into a one-slot queue and outputs
//! silence from then on, so an in-flight block always completes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use modrack_core::{AudioBlock, Engine, EngineHandle, MAX_BLOCK_SIZE};
use rtrb::{Consumer, Producer, PushError, RingBuffer};

use crate::backend::{AudioBackend, BackendStreamConfig, StreamHandle};
use crate::{Error, Result};

/// Frames of device input buffered between the input and output streams.
const INPUT_RING_FRAMES: usize = 8192;

/// Device selection and stream shape for [`RunningDriver::start`].
#[derive(Debug, Clone, PartialEq)]
pub struct DriverConfig {
    /// Output device name filter; the default device when `None`.
    pub output_device: Option<String>,
    /// Input device name filter; the default device when `None`.
    pub input_device: Option<String>,
    /// Open an input stream.
    pub enable_input: bool,
    /// Output channel count.
    pub channels: u16,
    /// Input channel count.
    pub input_channels: u16,
    /// Device buffer size in frames; the device default when `None`.
    pub buffer_size: Option<u32>,
    /// How long [`RunningDriver::stop`] waits for the engine.
    pub stop_timeout: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            output_device: None,
            input_device: None,
            enable_input: false,
            channels: 2,
            input_channels: 2,
            buffer_size: None,
            stop_timeout: Duration::from_secs(2),
        }
    }
}

/// State moved into the output callback.
struct EngineCallback {
    engine: Option<Engine>,
    hand_back: Producer<Engine>,
    stop: Arc<AtomicBool>,
    input: Option<Consumer<f32>>,
    scratch: Vec<f32>,
    input_channels: usize,
    output_channels: usize,
}

impl EngineCallback {
    fn run(&mut self, data: &mut [f32]) {
        if self.stop.load(Ordering::Acquire) {
            if let Some(engine) = self.engine.take()
                && let Err(PushError::Full(engine)) = self.hand_back.push(engine)
            {
                self.engine = Some(engine);
            }
            data.fill(0.0);
            return;
        }
        let Some(engine) = self.engine.as_mut() else {
            data.fill(0.0);
            return;
        };

        let frames = data.len() / self.output_channels;
        let mut offset = 0;
        while offset < frames {
            let n = (frames - offset).min(engine.block_size());
            let input = &mut self.scratch[..n * self.input_channels];
            match self.input.as_mut() {
                Some(ring) => {
                    // Whole frames only; a frame still being written stays queued.
                    let available = ring.slots() / self.input_channels * self.input_channels;
                    let take = input.len().min(available);
                    let read = match ring.read_chunk(take) {
                        Ok(chunk) => {
                            let (first, second) = chunk.as_slices();
                            input[..first.len()].copy_from_slice(first);
                            input[first.len()..take].copy_from_slice(second);
                            chunk.commit_all();
                            take
                        }
                        Err(_) => 0,
                    };
                    input[read..].fill(0.0);
                }
                None => input.fill(0.0),
            }
            let output = &mut data[offset * self.output_channels..(offset + n) * self.output_channels];
            let mut block = AudioBlock::new(input, self.input_channels, output, self.output_channels);
            engine.process_block(&mut block);
            offset += n;
        }
        // Trailing samples of a buffer that is not a whole number of frames.
        data[frames * self.output_channels..].fill(0.0);
    }
}

/// An engine running on a device callback.
///
/// Dropping a running driver closes its streams and drops the engine with
/// them; call [`stop`](Self::stop) to get the engine back.
pub struct RunningDriver {
    stop: Arc<AtomicBool>,
    returned: Consumer<Engine>,
    stream_errors: Arc<AtomicU64>,
    input_overruns: Arc<AtomicU64>,
    output: Option<StreamHandle>,
    input: Option<StreamHandle>,
    sample_rate: u32,
    stop_timeout: Duration,
}

impl std::fmt::Debug for RunningDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunningDriver")
            .field("sample_rate", &self.sample_rate)
            .field("input", &self.input.is_some())
            .field("stream_errors", &self.stream_errors())
            .finish_non_exhaustive()
    }
}

impl RunningDriver {
    /// Open the streams described by `config` and move `engine` into the
    /// output callback.
    ///
    /// If the device runs at a different rate than the engine, a sample
    /// rate change is sent through `handle`; it is applied before the first
    /// block.
    ///
    /// # Errors
    ///
    /// Returns an error if a stream cannot be built or the sample rate
    /// command cannot be enqueued.
    pub fn start(
        backend: &dyn AudioBackend,
        engine: Engine,
        handle: &EngineHandle,
        config: DriverConfig,
    ) -> Result<Self> {
        if config.channels == 0 {
            return Err(Error::InvalidChannels(0));
        }
        let output_config = BackendStreamConfig {
            sample_rate: engine.sample_rate().round() as u32,
            buffer_size: config.buffer_size,
            channels: config.channels,
            device_name: config.output_device.clone(),
        };
        let actual = backend.actual_sample_rate(&output_config);
        if actual != output_config.sample_rate {
            tracing::info!(
                requested = output_config.sample_rate,
                actual,
                "device sample rate differs, retuning engine"
            );
            handle.set_sample_rate(actual as f32)?;
        }

        let stream_errors = Arc::new(AtomicU64::new(0));
        let error_callback = |stream: &'static str| {
            let errors = Arc::clone(&stream_errors);
            Box::new(move |message: &str| {
                errors.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(stream, "audio stream error: {message}");
            })
        };

        let input_channels = if config.enable_input {
            usize::from(config.input_channels)
        } else {
            0
        };
        let input_overruns = Arc::new(AtomicU64::new(0));
        let (input, ring) = if input_channels > 0 {
            let overruns = Arc::clone(&input_overruns);
            let (mut producer, consumer) = RingBuffer::<f32>::new(INPUT_RING_FRAMES * input_channels);
            let input_config = BackendStreamConfig {
                sample_rate: actual,
                buffer_size: config.buffer_size,
                channels: config.input_channels,
                device_name: config.input_device.clone(),
            };
            let stream = backend.build_input_stream(
                &input_config,
                Box::new(move |data: &[f32]| {
                    let whole = data.len() / input_channels * input_channels;
                    match producer.write_chunk_uninit(whole) {
                        Ok(chunk) => {
                            chunk.fill_from_iter(data[..whole].iter().copied());
                        }
                        // The output side has fallen behind; drop the whole buffer.
                        Err(_) => {
                            overruns.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }),
                error_callback("input"),
            )?;
            (Some(stream), Some(consumer))
        } else {
            (None, None)
        };

        let stop = Arc::new(AtomicBool::new(false));
        let (hand_back, returned) = RingBuffer::new(1);
        let mut callback = EngineCallback {
            engine: Some(engine),
            hand_back,
            stop: Arc::clone(&stop),
            input: ring,
            scratch: vec![0.0; MAX_BLOCK_SIZE * input_channels],
            input_channels,
            output_channels: usize::from(config.channels),
        };
        let output = backend.build_output_stream(
            &output_config,
            Box::new(move |data: &mut [f32]| callback.run(data)),
            error_callback("output"),
        )?;

        tracing::info!(
            backend = backend.name(),
            sample_rate = actual,
            channels = config.channels,
            input_channels,
            "audio driver started"
        );
        Ok(Self {
            stop,
            returned,
            stream_errors,
            input_overruns,
            output: Some(output),
            input,
            sample_rate: actual,
            stop_timeout: config.stop_timeout,
        })
    }

    /// Ask the callback to hand the engine back at its next invocation.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Whether a stop has been requested.
    pub fn is_stopping(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// Sample rate the device runs at.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Stream errors reported by the backend so far.
    pub fn stream_errors(&self) -> u64 {
        self.stream_errors.load(Ordering::Relaxed)
    }

    /// Input buffers dropped because the ring was full.
    pub fn input_overruns(&self) -> u64 {
        self.input_overruns.load(Ordering::Relaxed)
    }

    /// Stop processing, close the streams and return the engine.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EngineNotReturned`] if the callback does not run
    /// within the configured timeout. The engine is dropped with the
    /// streams in that case.
    pub fn stop(mut self) -> Result<Engine> {
        self.request_stop();
        let deadline = Instant::now() + self.stop_timeout;
        let engine = loop {
            if let Ok(engine) = self.returned.pop() {
                break Some(engine);
            }
            if Instant::now() >= deadline {
                break None;
            }
            std::thread::sleep(Duration::from_millis(1));
        };
        self.output.take();
        self.input.take();
        match engine {
            Some(engine) => {
                tracing::info!("audio driver stopped");
                Ok(engine)
            }
            None => Err(Error::EngineNotReturned),
        }
    }
}
