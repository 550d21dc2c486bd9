//! Parameter manifest parsing.
//!
//! The manifest is a JSON document listing the parameters the plugin
//! exposes to the host:
//!
//! ```json
//! { "parameters": [
//!     { "paramId": "gain", "name": "Gain", "min": 0, "max": 1, "defaultValue": 0.5 }
//! ] }
//! ```
//!
//! Missing fields fall back to `"unknown"`, `"Unknown"`, `0`, `1` and `0`.
//! Entries that are not objects, or whose fields have the wrong type, are
//! skipped with a warning. Parameter order is preserved and defines the host
//! parameter index.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{ConfigError, Result};
use crate::parameter_info::ParameterInfo;

fn default_id() -> String {
    "unknown".to_string()
}

fn default_name() -> String {
    "Unknown".to_string()
}

fn default_max() -> f32 {
    1.0
}

/// A single `parameters[]` entry as written in the manifest.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParameterEntry {
    #[serde(default = "default_id")]
    param_id: String,
    #[serde(default = "default_name")]
    name: String,
    #[serde(default)]
    min: f32,
    #[serde(default = "default_max")]
    max: f32,
    #[serde(default)]
    default_value: f32,
}

impl From<ParameterEntry> for ParameterInfo {
    fn from(entry: ParameterEntry) -> Self {
        ParameterInfo::new(entry.param_id, entry.name)
            .with_range(entry.min, entry.max)
            .with_default(entry.default_value)
    }
}

/// The parameters declared by a manifest, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    /// Parameter descriptors. Index equals host parameter index.
    pub parameters: Vec<ParameterInfo>,
}

impl Manifest {
    /// Build a manifest directly from descriptors.
    pub fn new(parameters: Vec<ParameterInfo>) -> Self {
        Self { parameters }
    }

    /// Parse manifest JSON text.
    ///
    /// Only unparseable JSON is an error. A document that is not an object,
    /// or has no `parameters` array, yields an empty manifest.
    pub fn parse(text: &str) -> Result<Self> {
        let document: Value =
            serde_json::from_str(text).map_err(|e| ConfigError::InvalidManifest(e.to_string()))?;

        let Value::Object(mut root) = document else {
            log::warn!("Parameter manifest is not a JSON object; no parameters exposed");
            return Ok(Self::default());
        };

        let entries = match root.remove("parameters") {
            Some(Value::Array(entries)) => entries,
            Some(_) => {
                log::warn!("Manifest \"parameters\" is not an array; no parameters exposed");
                return Ok(Self::default());
            }
            None => return Ok(Self::default()),
        };

        let mut seen = HashSet::new();
        let mut parameters = Vec::with_capacity(entries.len());

        for (position, entry) in entries.into_iter().enumerate() {
            if !entry.is_object() {
                log::warn!("Skipping manifest parameter #{position}: not an object");
                continue;
            }
            let entry: ParameterEntry = match serde_json::from_value(entry) {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Skipping manifest parameter #{position}: {e}");
                    continue;
                }
            };
            if !seen.insert(entry.param_id.clone()) {
                log::warn!(
                    "Skipping manifest parameter #{position}: duplicate paramId {:?}",
                    entry.param_id
                );
                continue;
            }
            parameters.push(entry.into());
        }

        Ok(Self { parameters })
    }

    /// Number of declared parameters.
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Whether no parameters are declared.
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}
