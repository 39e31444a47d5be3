//! The `Module` trait and the per-frame processing context.
//!
//! A [`Module`] is an opaque unit of computation: on every sample frame it
//! reads its inputs and params and writes its outputs and lights. The engine
//! owns the port, param and light storage in a [`ModuleIo`] next to the
//! module and lends it to [`Module::process`], so module authors only keep
//! their private DSP state.
//!
//! ## Design Decisions
//!
//! - **Open set**: modules are dispatched through `Box<dyn Module>`, so any
//!   crate can add module types without touching the engine.
//! - **Static shape**: port, param and light counts come from `'static`
//!   descriptor slices and never change while a module is registered.
//! - **No allocation in `process`**: the callback runs on the real-time
//!   thread inside the audio deadline.
//! - **No unwinding**: a panic in `process` aborts the process.

use crate::descriptor::{LightDescriptor, ParamDescriptor, PortDescriptor};
use crate::light::Light;
use crate::param::Param;
use crate::port::{Input, Output, Port};

/// Number of device channels exchanged with audio-interface modules.
pub const AUDIO_FRAME_CHANNELS: usize = 8;

/// One frame of device audio, shared by all modules during a sample.
///
/// The engine fills `inputs` from the device buffer before the modules run
/// and writes `outputs` back afterwards. Modules that bridge to the device
/// read `inputs` and accumulate into `outputs`; the engine clears `outputs`
/// at the start of every frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AudioFrame {
    /// Device input samples, nominally in `[-1, 1]`.
    pub inputs: [f32; AUDIO_FRAME_CHANNELS],
    /// Device output samples accumulated by the modules.
    pub outputs: [f32; AUDIO_FRAME_CHANNELS],
    /// Number of device input channels carrying data.
    pub input_channels: usize,
    /// Number of device output channels that will be written back.
    pub output_channels: usize,
}

/// Per-frame context passed to [`Module::process`].
#[derive(Debug)]
pub struct ProcessArgs<'a> {
    /// Engine sample rate in Hz.
    pub sample_rate: f32,
    /// Duration of one frame in seconds (`1 / sample_rate`).
    pub sample_time: f32,
    /// Index of the frame since the engine was created.
    pub frame: u64,
    /// Device audio for this frame.
    pub audio: &'a mut AudioFrame,
}

/// Port, param and light storage of one module.
#[derive(Debug, Clone)]
pub struct ModuleIo {
    /// Input ports, one per input descriptor.
    pub inputs: Vec<Input>,
    /// Output ports, one per output descriptor.
    pub outputs: Vec<Output>,
    /// Params, one per param descriptor.
    pub params: Vec<Param>,
    /// Lights, one per light descriptor.
    pub lights: Vec<Light>,
}

impl ModuleIo {
    /// Builds the storage described by a module's descriptors.
    pub fn for_module(module: &dyn Module) -> Self {
        Self {
            inputs: module.inputs().iter().map(|_| Port::new()).collect(),
            outputs: module.outputs().iter().map(|_| Port::new_output()).collect(),
            params: module.params().iter().map(Param::new).collect(),
            lights: module.lights().iter().map(|_| Light::new()).collect(),
        }
    }

    /// Reads a param value, or `0.0` for an unknown index.
    #[inline]
    pub fn param(&self, index: usize) -> f32 {
        self.params.get(index).map_or(0.0, Param::value)
    }

    /// Returns the number of output channels a polyphonic module should
    /// produce from a set of inputs: the widest input, at least one.
    pub fn poly_channels(&self, inputs: &[usize]) -> usize {
        inputs
            .iter()
            .filter_map(|&i| self.inputs.get(i))
            .map(Port::channels)
            .max()
            .unwrap_or(0)
            .max(1)
    }
}

/// A signal-processing unit hosted by the engine.
///
/// # Example
///
/// ```rust
/// use modrack_core::{Module, ModuleIo, ParamDescriptor, PortDescriptor, ProcessArgs};
///
/// struct Offset;
///
/// const INPUTS: &[PortDescriptor] = &[PortDescriptor::new("In")];
/// const OUTPUTS: &[PortDescriptor] = &[PortDescriptor::new("Out")];
/// const PARAMS: &[ParamDescriptor] = &[ParamDescriptor::new("Offset", -5.0, 5.0, 0.0)];
///
/// impl Module for Offset {
///     fn inputs(&self) -> &'static [PortDescriptor] { INPUTS }
///     fn outputs(&self) -> &'static [PortDescriptor] { OUTPUTS }
///     fn params(&self) -> &'static [ParamDescriptor] { PARAMS }
///
///     fn process(&mut self, _args: &mut ProcessArgs<'_>, io: &mut ModuleIo) {
///         let v = io.inputs[0].normal_voltage(0.0, 0) + io.param(0);
///         io.outputs[0].set_voltage(v, 0);
///     }
/// }
/// ```
pub trait Module: Send {
    /// Input port descriptors.
    fn inputs(&self) -> &'static [PortDescriptor] {
        &[]
    }

    /// Output port descriptors.
    fn outputs(&self) -> &'static [PortDescriptor] {
        &[]
    }

    /// Param descriptors.
    fn params(&self) -> &'static [ParamDescriptor] {
        &[]
    }

    /// Light descriptors.
    fn lights(&self) -> &'static [LightDescriptor] {
        &[]
    }

    /// Processes one sample frame.
    ///
    /// Inputs already hold this frame's cable-propagated voltages. Outputs
    /// keep whatever the module wrote on the previous frame until
    /// overwritten.
    fn process(&mut self, args: &mut ProcessArgs<'_>, io: &mut ModuleIo);

    /// Called once per engine sample-rate change, between blocks.
    fn on_sample_rate_change(&mut self, _sample_rate: f32) {}

    /// Called after the engine restores the module's params to defaults.
    fn on_reset(&mut self) {}

    /// Serializes private state for patch storage.
    fn data_to_json(&self) -> Option<serde_json::Value> {
        None
    }

    /// Restores private state from patch storage.
    ///
    /// Called on the loading thread before the module is registered.
    fn data_from_json(&mut self, _data: &serde_json::Value) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ParamDescriptor;

    struct Shape;

    const INPUTS: &[PortDescriptor] = &[PortDescriptor::new("A"), PortDescriptor::new("B")];
    const OUTPUTS: &[PortDescriptor] = &[PortDescriptor::new("Out")];
    const PARAMS: &[ParamDescriptor] = &[ParamDescriptor::new("Level", 0.0, 2.0, 1.5)];
    const LIGHTS: &[LightDescriptor] = &[LightDescriptor::new("Clip")];

    impl Module for Shape {
        fn inputs(&self) -> &'static [PortDescriptor] {
            INPUTS
        }
        fn outputs(&self) -> &'static [PortDescriptor] {
            OUTPUTS
        }
        fn params(&self) -> &'static [ParamDescriptor] {
            PARAMS
        }
        fn lights(&self) -> &'static [LightDescriptor] {
            LIGHTS
        }
        fn process(&mut self, _args: &mut ProcessArgs<'_>, _io: &mut ModuleIo) {}
    }

    #[test]
    fn io_matches_descriptors() {
        let io = ModuleIo::for_module(&Shape);
        assert_eq!(io.inputs.len(), 2);
        assert_eq!(io.outputs.len(), 1);
        assert_eq!(io.params.len(), 1);
        assert_eq!(io.lights.len(), 1);
        assert!(!io.inputs[0].is_connected());
        assert!(io.outputs[0].is_mono());
        assert_eq!(io.param(0), 1.5);
        assert_eq!(io.param(9), 0.0);
    }

    #[test]
    fn poly_channels_takes_widest_input() {
        let mut io = ModuleIo::for_module(&Shape);
        assert_eq!(io.poly_channels(&[0, 1]), 1);
        io.inputs[1].set_channels(5);
        assert_eq!(io.poly_channels(&[0, 1]), 5);
        assert_eq!(io.poly_channels(&[0]), 1);
    }
}
