//! Authoritative plugin state owned by the control thread.
//!
//! The state is a flat JSON object: one entry per parameter keyed by its id,
//! plus derived fields such as `sampleRate`. It is what the UI and script
//! receive on every dispatch and what the host persists.
//!
//! Restoring is conservative: only keys that already exist are overwritten,
//! so a blob from another build can neither add parameters nor remove them.
//! A blob that is not a JSON object is ignored entirely.

use serde_json::{Map, Number, Value};

use crate::parameter_info::ParameterInfo;

/// Key under which the current sample rate is published.
pub const SAMPLE_RATE_KEY: &str = "sampleRate";

/// Flat key/value state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateMap {
    entries: Map<String, Value>,
}

impl StateMap {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the state with each parameter's default value.
    pub fn from_parameters(parameters: &[ParameterInfo]) -> Self {
        let mut state = Self::new();
        for info in parameters {
            state.set_parameter(&info.id, info.default_value);
        }
        state
    }

    /// Insert or overwrite a numeric entry.
    ///
    /// Returns `false` (and leaves the state untouched) for NaN or infinite
    /// values, which JSON cannot represent.
    pub fn set_number(&mut self, key: &str, value: f64) -> bool {
        match Number::from_f64(value) {
            Some(number) => {
                self.entries.insert(key.to_string(), Value::Number(number));
                true
            }
            None => false,
        }
    }

    /// Fold a parameter value into the state.
    ///
    /// The `f32` is widened through its shortest decimal representation so
    /// that `0.8f32` is stored as `0.8`, not `0.800000011920929`.
    pub fn set_parameter(&mut self, key: &str, value: f32) -> bool {
        let widened = value.to_string().parse::<f64>().unwrap_or(f64::from(value));
        self.set_number(key, widened)
    }

    /// Look up an entry.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Look up an entry as a number.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.entries.get(key).and_then(Value::as_f64)
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the state has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.entries
    }

    /// Serialize to the persisted byte form (compact JSON).
    pub fn save(&self) -> Vec<u8> {
        match serde_json::to_vec(&self.entries) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::error!("Failed to serialize plugin state: {e}");
                b"{}".to_vec()
            }
        }
    }

    /// Restore from a persisted blob, returning the number of keys updated.
    ///
    /// Keys not already present are ignored. Malformed or non-object input
    /// changes nothing.
    pub fn restore(&mut self, bytes: &[u8]) -> usize {
        let parsed: Value = match serde_json::from_slice(bytes) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Ignoring malformed plugin state: {e}");
                return 0;
            }
        };
        let Value::Object(restored) = parsed else {
            log::warn!("Ignoring plugin state that is not a JSON object");
            return 0;
        };

        let mut updated = 0;
        for (key, value) in restored {
            if let Some(slot) = self.entries.get_mut(&key) {
                *slot = value;
                updated += 1;
            }
        }
        updated
    }
}
