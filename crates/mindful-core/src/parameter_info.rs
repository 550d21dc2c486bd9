//! Parameter metadata.
//!
//! A [`ParameterInfo`] describes one host-exposed parameter. Descriptors are
//! built once from the manifest; their position in the list is the host
//! parameter index and the readout index.

/// Metadata describing a single parameter.
///
/// Values are plain (not normalized): `min..=max` is the range the host
/// and the state map both see.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterInfo {
    /// String identifier, also the key in the state map.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Lower bound of the range.
    pub min: f32,
    /// Upper bound of the range.
    pub max: f32,
    /// Value before any change arrives.
    pub default_value: f32,
}

impl ParameterInfo {
    /// Create a `0..=1` parameter defaulting to `0`.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            min: 0.0,
            max: 1.0,
            default_value: 0.0,
        }
    }

    /// Set the value range.
    pub fn with_range(mut self, min: f32, max: f32) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Set the default value.
    pub fn with_default(mut self, default_value: f32) -> Self {
        self.default_value = default_value;
        self
    }

    /// Clamp `value` into the parameter's range.
    ///
    /// Inverted ranges are tolerated by ordering the bounds first. NaN maps
    /// to the default value.
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.default_value;
        }
        let (lo, hi) = if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        };
        value.clamp(lo, hi)
    }
}
