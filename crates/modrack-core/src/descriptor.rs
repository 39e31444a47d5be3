//! Static descriptors for module ports, params and lights.
//!
//! Every [`Module`](crate::Module) publishes its shape as `'static` slices of
//! descriptors. The engine sizes a module's port, param and light arrays from
//! them when the module is instantiated, and patch tooling uses them to
//! validate cable endpoints and param values without touching the module.
//!
//! Descriptors are plain `Copy` data built with `const fn` so that modules can
//! declare them as constants:
//!
//! ```rust
//! use modrack_core::{ParamDescriptor, ParamUnit, PortDescriptor};
//!
//! const INPUTS: &[PortDescriptor] = &[PortDescriptor::new("In")];
//! const PARAMS: &[ParamDescriptor] =
//!     &[ParamDescriptor::new("Gain", -10.0, 10.0, 1.0).with_unit(ParamUnit::Ratio)];
//!
//! assert_eq!(PARAMS[0].clamp(20.0), 10.0);
//! assert_eq!(INPUTS[0].name, "In");
//! ```

/// Scaling curve used when mapping a param to a normalized knob position.
///
/// - **Linear**: `normalized = (value - min) / (max - min)`
/// - **Logarithmic**: `normalized = ln(value/min) / ln(max/min)`, requires `min > 0`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamScale {
    /// Equal resolution across the range.
    #[default]
    Linear,
    /// More resolution at low values.
    Logarithmic,
}

/// Unit used when formatting a param value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParamUnit {
    /// Volts, for offsets and CV levels.
    Volts,
    /// Hertz, for frequencies.
    Hertz,
    /// Percent.
    Percent,
    /// Decibels.
    Decibels,
    /// Seconds.
    Seconds,
    /// Plain multiplier.
    Ratio,
    /// Dimensionless.
    #[default]
    None,
}

impl ParamUnit {
    /// Returns the unit suffix for display.
    pub const fn suffix(&self) -> &'static str {
        match self {
            ParamUnit::Volts => " V",
            ParamUnit::Hertz => " Hz",
            ParamUnit::Percent => "%",
            ParamUnit::Decibels => " dB",
            ParamUnit::Seconds => " s",
            ParamUnit::Ratio => "x",
            ParamUnit::None => "",
        }
    }
}

/// Param capability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParamFlags(u8);

impl ParamFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// Values snap to whole numbers (switches, channel counts).
    pub const STEPPED: Self = Self(1 << 0);
    /// Not shown in generic parameter listings.
    pub const HIDDEN: Self = Self(1 << 1);

    /// Returns `true` if all bits in `other` are set in `self`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the union of two flag sets.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// Metadata for one module param.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    /// Display name.
    pub name: &'static str,
    /// Unit used for formatting.
    pub unit: ParamUnit,
    /// Minimum value.
    pub min: f32,
    /// Maximum value.
    pub max: f32,
    /// Value after instantiation and reset.
    pub default: f32,
    /// Normalization curve.
    pub scale: ParamScale,
    /// Capability flags.
    pub flags: ParamFlags,
}

impl ParamDescriptor {
    /// Creates a linear, unitless param.
    pub const fn new(name: &'static str, min: f32, max: f32, default: f32) -> Self {
        Self {
            name,
            unit: ParamUnit::None,
            min,
            max,
            default,
            scale: ParamScale::Linear,
            flags: ParamFlags::NONE,
        }
    }

    /// Sets the unit.
    pub const fn with_unit(mut self, unit: ParamUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Sets the normalization scale.
    pub const fn with_scale(mut self, scale: ParamScale) -> Self {
        self.scale = scale;
        self
    }

    /// Sets the flags.
    pub const fn with_flags(mut self, flags: ParamFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Clamps a value to the param range, rounding stepped params.
    ///
    /// ```rust
    /// use modrack_core::{ParamDescriptor, ParamFlags};
    ///
    /// let desc = ParamDescriptor::new("Channels", 1.0, 16.0, 1.0)
    ///     .with_flags(ParamFlags::STEPPED);
    /// assert_eq!(desc.clamp(3.4), 3.0);
    /// assert_eq!(desc.clamp(99.0), 16.0);
    /// ```
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        let value = if self.flags.contains(ParamFlags::STEPPED) {
            libm::roundf(value)
        } else {
            value
        };
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }

    /// Converts a plain value to a normalized position in `[0, 1]`.
    pub fn normalize(&self, value: f32) -> f32 {
        let range = self.max - self.min;
        if range == 0.0 {
            return 0.0;
        }
        match self.scale {
            ParamScale::Linear => (value - self.min) / range,
            ParamScale::Logarithmic => {
                if self.min <= 0.0 || value <= 0.0 {
                    return 0.0;
                }
                libm::logf(value / self.min) / libm::logf(self.max / self.min)
            }
        }
    }

    /// Converts a normalized position back to a plain value.
    pub fn denormalize(&self, normalized: f32) -> f32 {
        match self.scale {
            ParamScale::Linear => self.min + normalized * (self.max - self.min),
            ParamScale::Logarithmic => {
                if self.min <= 0.0 {
                    return self.min;
                }
                self.min * libm::powf(self.max / self.min, normalized)
            }
        }
    }

    /// Formats a value with the unit suffix.
    pub fn format_value(&self, value: f32) -> String {
        if self.flags.contains(ParamFlags::STEPPED) {
            format!("{value:.0}{}", self.unit.suffix())
        } else {
            format!("{value:.2}{}", self.unit.suffix())
        }
    }
}

/// Metadata for one input or output port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortDescriptor {
    /// Display name.
    pub name: &'static str,
    /// Optional longer description.
    pub description: &'static str,
}

impl PortDescriptor {
    /// Creates a port descriptor.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            description: "",
        }
    }

    /// Sets the description.
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }
}

/// Metadata for one light.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightDescriptor {
    /// Display name.
    pub name: &'static str,
}

impl LightDescriptor {
    /// Creates a light descriptor.
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }
}
