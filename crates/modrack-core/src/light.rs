//! Indicator lights.

/// Decay rate of [`Light::set_brightness_smooth`], in 1/seconds.
const LIGHT_DECAY_LAMBDA: f32 = 30.0;

/// An indicator light with brightness in `[0, 1]`.
///
/// Modules write lights from their `process` callback; readers (a UI, a
/// meter) only ever observe the stored value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Light {
    value: f32,
}

impl Light {
    /// Creates a dark light.
    pub const fn new() -> Self {
        Self { value: 0.0 }
    }

    /// Returns the current brightness.
    #[inline]
    pub fn brightness(&self) -> f32 {
        self.value
    }

    /// Sets the brightness immediately, clamped to `[0, 1]`.
    #[inline]
    pub fn set_brightness(&mut self, brightness: f32) {
        self.value = brightness.clamp(0.0, 1.0);
    }

    /// Sets the brightness with a perceptual response.
    ///
    /// Rises are followed immediately and falls decay exponentially, so
    /// short pulses stay visible. The input is squared before clamping.
    pub fn set_brightness_smooth(&mut self, brightness: f32, delta_time: f32) {
        let v = if brightness > 0.0 {
            (brightness * brightness).min(1.0)
        } else {
            0.0
        };
        if v < self.value {
            let step = (LIGHT_DECAY_LAMBDA * delta_time).min(1.0);
            self.value += (v - self.value) * step;
        } else {
            self.value = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brightness_is_clamped() {
        let mut light = Light::new();
        light.set_brightness(3.0);
        assert_eq!(light.brightness(), 1.0);
        light.set_brightness(-1.0);
        assert_eq!(light.brightness(), 0.0);
    }

    #[test]
    fn smooth_rises_instantly_and_decays() {
        let mut light = Light::new();
        light.set_brightness_smooth(0.5, 0.001);
        assert_eq!(light.brightness(), 0.25);

        light.set_brightness_smooth(0.0, 0.001);
        let after = light.brightness();
        assert!(after < 0.25 && after > 0.0);

        for _ in 0..10_000 {
            light.set_brightness_smooth(0.0, 0.001);
        }
        assert!(light.brightness() < 1e-6);
    }
}
