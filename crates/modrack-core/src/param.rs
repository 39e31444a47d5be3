//! Module params and engine-side param smoothing.
//!
//! A [`Param`] stores one control value clamped to the range of its
//! [`ParamDescriptor`]. Params change through three paths, all on the
//! real-time thread: queued `SetParam` commands, patch load (before the module
//! is registered), and smoothing.
//!
//! ## Smoothing
//!
//! Smoothed params follow a one-pole approach toward their target:
//!
//! ```text
//! value[n] = value[n-1] + (target - value[n-1]) * coeff
//! coeff    = min(SMOOTHING_LAMBDA * sample_time, 1)
//! ```
//!
//! Once a step no longer changes the stored float the param snaps to the
//! exact target and smoothing ends.
//!
//! ```rust
//! use modrack_core::{Param, ParamDescriptor, param::smoothing_coeff};
//!
//! let mut param = Param::new(&ParamDescriptor::new("Level", 0.0, 10.0, 0.0));
//! let coeff = smoothing_coeff(1.0 / 48000.0);
//! let mut steps = 0;
//! while !param.advance_toward(10.0, coeff) {
//!     steps += 1;
//! }
//! assert_eq!(param.value(), 10.0);
//! assert!(steps > 100);
//! ```

use crate::descriptor::{ParamDescriptor, ParamFlags};

/// Approach rate of param smoothing, in 1/seconds (about one UI frame).
pub const SMOOTHING_LAMBDA: f32 = 60.0;

/// Returns the per-sample smoothing coefficient for a sample period.
#[inline]
pub fn smoothing_coeff(sample_time: f32) -> f32 {
    (SMOOTHING_LAMBDA * sample_time).clamp(0.0, 1.0)
}

/// A bounded control value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Param {
    value: f32,
    min: f32,
    max: f32,
    default: f32,
    stepped: bool,
}

impl Param {
    /// Creates a param at its default value.
    pub fn new(desc: &ParamDescriptor) -> Self {
        let (min, max) = if desc.min <= desc.max {
            (desc.min, desc.max)
        } else {
            (desc.max, desc.min)
        };
        let mut param = Self {
            value: min,
            min,
            max,
            default: desc.default,
            stepped: desc.flags.contains(ParamFlags::STEPPED),
        };
        param.default = param.clamp(desc.default);
        param.value = param.default;
        param
    }

    /// Returns the current value.
    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Sets the value, clamped to the param range.
    ///
    /// NaN is ignored and leaves the value unchanged.
    #[inline]
    pub fn set_value(&mut self, value: f32) {
        if !value.is_nan() {
            self.value = self.clamp(value);
        }
    }

    /// Clamps a candidate value to this param's range.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        let value = if self.stepped {
            libm::roundf(value)
        } else {
            value
        };
        value.clamp(self.min, self.max)
    }

    /// Returns the lower bound.
    #[inline]
    pub fn min(&self) -> f32 {
        self.min
    }

    /// Returns the upper bound.
    #[inline]
    pub fn max(&self) -> f32 {
        self.max
    }

    /// Returns the default value.
    #[inline]
    pub fn default_value(&self) -> f32 {
        self.default
    }

    /// Returns `true` for whole-number params.
    #[inline]
    pub fn is_stepped(&self) -> bool {
        self.stepped
    }

    /// Restores the default value.
    pub fn reset(&mut self) {
        self.value = self.default;
    }

    /// Moves one smoothing step toward `target`.
    ///
    /// Returns `true` once the value has snapped to `target`. Stepped params
    /// jump immediately.
    #[inline]
    pub fn advance_toward(&mut self, target: f32, coeff: f32) -> bool {
        let target = self.clamp(target);
        if self.stepped {
            self.value = target;
            return true;
        }
        let next = self.value + (target - self.value) * coeff;
        if next == self.value || next.is_nan() {
            self.value = target;
            true
        } else {
            self.value = next.clamp(self.min, self.max);
            false
        }
    }
}
