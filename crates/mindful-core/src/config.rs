//! Plugin configuration.
//!
//! [`Config`] holds the plugin's name, its category (which decides whether
//! MIDI flows in and out) and the sizes of its real-time buffers. It can be written in code or loaded from a `Config.toml`
//! through [`ConfigFile`].
//!
//! # Example
//!
//! ```ignore
//! use mindful_core::config::{Category, Config};
//!
//! let config = Config::new("Mindful", Category::MidiEffect)
//!     .with_fifo_capacity(256);
//! ```

use std::borrow::Cow;

use serde::Deserialize;

use crate::error::{ConfigError, Result};
use crate::fifo::DEFAULT_FIFO_CAPACITY;
use crate::midi_output::MidiOutputBuffer;

/// Largest accepted FIFO capacity or output slot count.
pub const MAX_QUEUE_CAPACITY: usize = 1 << 16;

/// Plugin type - determines how hosts categorize and use the plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Audio effect (EQ, compressor, reverb, delay)
    Effect,
    /// Virtual instrument (synth, sampler, drum machine)
    Instrument,
    /// MIDI processor (arpeggiator, chord generator)
    MidiEffect,
    /// Audio generator (test tones, noise, file player)
    Generator,
}

impl Category {
    /// Check if this type accepts MIDI input.
    ///
    /// Host MIDI sent to other categories is ignored by the processor.
    pub const fn accepts_midi(&self) -> bool {
        matches!(self, Category::Instrument | Category::MidiEffect)
    }

    /// Check if this type can produce MIDI output.
    ///
    /// Outbound MIDI queued by other categories is discarded, not emitted.
    pub const fn produces_midi(&self) -> bool {
        matches!(self, Category::Instrument | Category::MidiEffect)
    }
}

/// Plugin configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Plugin name displayed in the DAW.
    pub name: Cow<'static, str>,

    /// Plugin category (effect, instrument, etc.)
    pub category: Category,

    /// Capacity of each MIDI FIFO (inbound and outbound).
    pub fifo_capacity: usize,

    /// Number of outbound MIDI events emitted per audio callback.
    pub midi_output_slots: usize,
}

impl Config {
    /// Create a configuration with default buffer sizes.
    pub const fn new(name: &'static str, category: Category) -> Self {
        Self {
            name: Cow::Borrowed(name),
            category,
            fifo_capacity: DEFAULT_FIFO_CAPACITY,
            midi_output_slots: MidiOutputBuffer::DEFAULT_SLOTS,
        }
    }

    /// Set the MIDI FIFO capacity.
    pub fn with_fifo_capacity(mut self, capacity: usize) -> Self {
        self.fifo_capacity = capacity;
        self
    }

    /// Set the number of outbound MIDI events per callback.
    pub fn with_midi_output_slots(mut self, slots: usize) -> Self {
        self.midi_output_slots = slots;
        self
    }

    /// Check buffer sizes.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ConfigError::Invalid("name must not be empty".to_string()));
        }
        if !(1..=MAX_QUEUE_CAPACITY).contains(&self.fifo_capacity) {
            return Err(ConfigError::Invalid(format!(
                "fifo_capacity must be between 1 and {MAX_QUEUE_CAPACITY}, got {}",
                self.fifo_capacity
            )));
        }
        if !(1..=MAX_QUEUE_CAPACITY).contains(&self.midi_output_slots) {
            return Err(ConfigError::Invalid(format!(
                "midi_output_slots must be between 1 and {MAX_QUEUE_CAPACITY}, got {}",
                self.midi_output_slots
            )));
        }
        Ok(())
    }
}

/// Plugin configuration from Config.toml.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Plugin display name.
    pub name: String,
    /// Plugin category: "effect", "instrument", "midi_effect", "generator".
    pub category: Category,
    /// MIDI FIFO capacity (default: 100).
    #[serde(default)]
    pub fifo_capacity: Option<usize>,
    /// Outbound MIDI events per callback (default: 128).
    #[serde(default)]
    pub midi_output_slots: Option<usize>,
}

impl ConfigFile {
    /// Parse Config.toml text.
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ConfigError::InvalidToml(e.to_string()))
    }

    /// Validate the config file contents.
    pub fn validate(&self) -> Result<()> {
        self.to_config().validate()
    }

    /// Convert to a validated runtime configuration.
    pub fn into_config(self) -> Result<Config> {
        let config = self.to_config();
        config.validate()?;
        Ok(config)
    }

    fn to_config(&self) -> Config {
        let defaults = Config::new("", self.category);
        Config {
            name: Cow::Owned(self.name.clone()),
            fifo_capacity: self.fifo_capacity.unwrap_or(defaults.fifo_capacity),
            midi_output_slots: self.midi_output_slots.unwrap_or(defaults.midi_output_slots),
            category: self.category,
        }
    }
}
