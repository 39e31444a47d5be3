//! Polyphonic voltage ports.
//!
//! A [`Port`] is the data carried over one jack: up to [`PORT_MAX_CHANNELS`]
//! voltages plus a channel count. Inputs and outputs share the same layout;
//! the [`Input`] and [`Output`] aliases only document intent at call sites.
//!
//! ## Channel semantics
//!
//! - `channels == 0`: disconnected. Only the engine's cable logic produces
//!   this state, and only for inputs.
//! - `channels == 1`: monophonic. [`Port::poly_voltage`] broadcasts channel 0.
//! - `channels > 1`: polyphonic.
//!
//! Voltages at indices `>= channels` always read `0.0`.
//!
//! ```rust
//! use modrack_core::Port;
//!
//! let mut port = Port::new();
//! port.set_channels(4);
//! port.set_voltage(2.5, 3);
//! port.set_channels(2);
//! assert_eq!(port.voltage(3), 0.0);
//! ```

use crate::light::Light;

/// Maximum number of polyphonic channels carried by one port.
pub const PORT_MAX_CHANNELS: usize = 16;

/// Index of the plug light driven by positive voltage.
pub const PLUG_LIGHT_POSITIVE: usize = 0;
/// Index of the plug light driven by negative voltage.
pub const PLUG_LIGHT_NEGATIVE: usize = 1;
/// Index of the plug light lit while the port is polyphonic.
pub const PLUG_LIGHT_POLY: usize = 2;

/// Voltage scale mapped to full plug-light brightness.
const PLUG_LIGHT_FULL_SCALE: f32 = 5.0;

/// A fixed-size bus of polyphonic voltages.
#[derive(Debug, Clone)]
pub struct Port {
    voltages: [f32; PORT_MAX_CHANNELS],
    channels: u8,
    active: bool,
    plug_lights: [Light; 3],
}

/// A module input port.
pub type Input = Port;

/// A module output port.
pub type Output = Port;

impl Port {
    /// Creates a disconnected port with all voltages at 0 V.
    pub fn new() -> Self {
        Self {
            voltages: [0.0; PORT_MAX_CHANNELS],
            channels: 0,
            active: false,
            plug_lights: [Light::new(); 3],
        }
    }

    /// Creates a monophonic output port.
    ///
    /// Outputs always carry at least one channel so that modules can write
    /// channel 0 without first negotiating polyphony.
    pub fn new_output() -> Self {
        let mut port = Self::new();
        port.channels = 1;
        port
    }

    /// Writes the voltage of a channel.
    ///
    /// Callers keep `channel < channels()`; any index below
    /// [`PORT_MAX_CHANNELS`] is memory-safe.
    #[inline]
    pub fn set_voltage(&mut self, value: f32, channel: usize) {
        self.voltages[channel] = value;
    }

    /// Reads the voltage of a channel.
    #[inline]
    pub fn voltage(&self, channel: usize) -> f32 {
        self.voltages[channel]
    }

    /// Reads a channel, broadcasting channel 0 when the port is monophonic.
    #[inline]
    pub fn poly_voltage(&self, channel: usize) -> f32 {
        if self.channels == 1 {
            self.voltages[0]
        } else {
            self.voltages[channel]
        }
    }

    /// Reads a channel, or `normal` when the port is disconnected.
    ///
    /// Stale contents of a disconnected port are never observed.
    #[inline]
    pub fn normal_voltage(&self, normal: f32, channel: usize) -> f32 {
        if self.channels == 0 {
            normal
        } else {
            self.voltages[channel]
        }
    }

    /// Like [`normal_voltage`](Self::normal_voltage) with monophonic broadcast.
    #[inline]
    pub fn normal_poly_voltage(&self, normal: f32, channel: usize) -> f32 {
        match self.channels {
            0 => normal,
            1 => self.voltages[0],
            _ => self.voltages[channel],
        }
    }

    /// Sets the polyphony of the port.
    ///
    /// Channels at or above the new count are zeroed. A request for zero
    /// channels is treated as one: only cable disconnection may mark a port
    /// as disconnected. Counts above [`PORT_MAX_CHANNELS`] are clamped.
    pub fn set_channels(&mut self, channels: usize) {
        let channels = channels.clamp(1, PORT_MAX_CHANNELS);
        self.voltages[channels..].fill(0.0);
        self.channels = channels as u8;
    }

    /// Returns the number of active channels (0 when disconnected).
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels as usize
    }

    /// Returns `true` when at least one channel is present.
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.channels > 0
    }

    /// Returns `true` for exactly one channel.
    #[inline]
    pub fn is_mono(&self) -> bool {
        self.channels == 1
    }

    /// Returns `true` for more than one channel.
    #[inline]
    pub fn is_poly(&self) -> bool {
        self.channels > 1
    }

    /// Returns `true` when a cable touches this port.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the voltages of the active channels.
    #[inline]
    pub fn voltages(&self) -> &[f32] {
        &self.voltages[..self.channels as usize]
    }

    /// Copies `values` into the leading channels.
    ///
    /// At most [`PORT_MAX_CHANNELS`] values are read; the channel count is
    /// left unchanged.
    pub fn set_voltages(&mut self, values: &[f32]) {
        let n = values.len().min(PORT_MAX_CHANNELS);
        self.voltages[..n].copy_from_slice(&values[..n]);
    }

    /// Sums the voltages of all active channels.
    pub fn voltage_sum(&self) -> f32 {
        self.voltages().iter().sum()
    }

    /// Zeroes every channel without touching the channel count.
    pub fn clear_voltages(&mut self) {
        self.voltages = [0.0; PORT_MAX_CHANNELS];
    }

    /// Returns the plug lights (positive, negative, polyphonic).
    #[inline]
    pub fn plug_lights(&self) -> &[Light; 3] {
        &self.plug_lights
    }

    /// Loads a propagated signal into an input port.
    pub(crate) fn load(&mut self, voltages: &[f32; PORT_MAX_CHANNELS], channels: usize) {
        self.voltages = *voltages;
        self.channels = channels.min(PORT_MAX_CHANNELS) as u8;
        self.voltages[self.channels as usize..].fill(0.0);
    }

    /// Returns the raw voltage array, including inactive channels.
    #[inline]
    pub(crate) fn raw(&self) -> &[f32; PORT_MAX_CHANNELS] {
        &self.voltages
    }

    /// Marks an input as disconnected and zeroes its voltages.
    pub(crate) fn disconnect(&mut self) {
        self.voltages = [0.0; PORT_MAX_CHANNELS];
        self.channels = 0;
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Forces a mono 0 V output (bypass).
    pub(crate) fn silence(&mut self) {
        self.voltages = [0.0; PORT_MAX_CHANNELS];
        self.channels = 1;
    }

    /// Refreshes the plug lights from the current voltage.
    pub(crate) fn update_plug_lights(&mut self, delta_time: f32) {
        if !self.active {
            for light in &mut self.plug_lights {
                light.set_brightness(0.0);
            }
            return;
        }
        let value = if self.channels == 1 {
            self.voltages[0] / PLUG_LIGHT_FULL_SCALE
        } else {
            let n = self.channels.max(1) as f32;
            let sum_sq: f32 = self.voltages().iter().map(|v| v * v).sum();
            libm::sqrtf(sum_sq / n) / PLUG_LIGHT_FULL_SCALE
        };
        let poly = if self.channels > 1 { 1.0 } else { 0.0 };
        self.plug_lights[PLUG_LIGHT_POSITIVE].set_brightness_smooth(value, delta_time);
        self.plug_lights[PLUG_LIGHT_NEGATIVE].set_brightness_smooth(-value, delta_time);
        self.plug_lights[PLUG_LIGHT_POLY].set_brightness_smooth(poly, delta_time);
    }
}

impl Default for Port {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_port_is_disconnected() {
        let port = Port::new();
        assert_eq!(port.channels(), 0);
        assert!(!port.is_connected());
        assert_eq!(port.voltages(), &[] as &[f32]);
    }

    #[test]
    fn output_starts_mono() {
        let port = Port::new_output();
        assert!(port.is_mono());
        assert_eq!(port.voltage(0), 0.0);
    }

    #[test]
    fn set_channels_zero_means_one() {
        let mut port = Port::new_output();
        port.set_channels(0);
        assert_eq!(port.channels(), 1);
    }

    #[test]
    fn set_channels_clamps_to_max() {
        let mut port = Port::new_output();
        port.set_channels(40);
        assert_eq!(port.channels(), PORT_MAX_CHANNELS);
    }

    #[test]
    fn shrinking_zeroes_dropped_channels() {
        let mut port = Port::new_output();
        port.set_channels(8);
        for c in 0..8 {
            port.set_voltage(c as f32 + 1.0, c);
        }
        port.set_channels(3);
        assert_eq!(port.voltages(), &[1.0, 2.0, 3.0]);
        for c in 3..PORT_MAX_CHANNELS {
            assert_eq!(port.voltage(c), 0.0);
        }
        port.set_channels(8);
        assert_eq!(port.voltage(5), 0.0);
    }

    #[test]
    fn poly_voltage_broadcasts_mono() {
        let mut port = Port::new_output();
        port.set_voltage(3.0, 0);
        assert_eq!(port.poly_voltage(7), 3.0);
        port.set_channels(2);
        port.set_voltage(-1.0, 1);
        assert_eq!(port.poly_voltage(1), -1.0);
        assert_eq!(port.poly_voltage(7), 0.0);
    }

    #[test]
    fn normal_voltage_ignores_stale_contents() {
        let mut port = Port::new();
        port.set_voltage(9.0, 0);
        assert_eq!(port.normal_voltage(1.5, 0), 1.5);
        assert_eq!(port.normal_poly_voltage(-2.0, 4), -2.0);
    }

    #[test]
    fn load_and_disconnect() {
        let mut port = Port::new();
        let mut bus = [0.0; PORT_MAX_CHANNELS];
        bus[0] = 1.0;
        bus[1] = 2.0;
        bus[2] = 3.0;
        port.load(&bus, 2);
        assert_eq!(port.voltages(), &[1.0, 2.0]);
        assert_eq!(port.voltage(2), 0.0);
        port.disconnect();
        assert_eq!(port.channels(), 0);
        assert_eq!(port.voltage(0), 0.0);
    }

    #[test]
    fn voltage_sum_covers_active_channels() {
        let mut port = Port::new_output();
        port.set_channels(3);
        port.set_voltages(&[1.0, 2.0, 3.0]);
        assert_eq!(port.voltage_sum(), 6.0);
    }

    #[test]
    fn plug_lights_follow_sign() {
        let mut port = Port::new_output();
        port.set_active(true);
        port.set_voltage(5.0, 0);
        port.update_plug_lights(0.001);
        assert_eq!(port.plug_lights()[PLUG_LIGHT_POSITIVE].brightness(), 1.0);
        assert_eq!(port.plug_lights()[PLUG_LIGHT_NEGATIVE].brightness(), 0.0);
        assert_eq!(port.plug_lights()[PLUG_LIGHT_POLY].brightness(), 0.0);
    }

    #[test]
    fn inactive_port_lights_are_dark() {
        let mut port = Port::new_output();
        port.set_voltage(5.0, 0);
        port.update_plug_lights(0.001);
        assert_eq!(port.plug_lights()[PLUG_LIGHT_POSITIVE].brightness(), 0.0);
    }
}
