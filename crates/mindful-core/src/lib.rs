//! # Mindful Core
//!
//! Real-time primitives and data model for the Mindful MIDI plugin.
//!
//! This crate holds everything that crosses the boundary between the audio
//! callback and the control thread, plus the plain data the control thread
//! owns. It has no notion of a host or plugin format.
//!
//! ## Threading
//!
//! ```text
//!  audio callback (real-time)            control thread
//!  ─────────────────────────             ──────────────
//!  ShortMessage ──▶ Fifo<Incoming> ────▶ hex strings ──▶ Script / Ui
//!  param change ──▶ ParameterReadouts ─▶ StateMap ────▶ Script / Ui
//!  new rate/size ─▶ Lifecycle ─────────▶ rebuild Engine + Script
//!  MidiOutputBuffer ◀── Fifo<Outgoing> ◀ parse_hex_message ◀── Ui / Script
//!          └────────── AsyncUpdater::trigger() ──▶ one coalesced dispatch
//! ```
//!
//! Everything on the left is wait-free and allocation free.

pub mod bridge;
pub mod config;
pub mod error;
pub mod fifo;
pub mod host;
pub mod lifecycle;
pub mod manifest;
pub mod midi;
pub mod midi_output;
pub mod parameter_info;
pub mod readout;
pub mod state;
pub mod ui;
pub mod updater;

pub use bridge::{
    BridgeEvent, Engine, EngineFactory, ReturnCode, Script, ScriptFactory, ScriptRequest, Ui,
    UiMessage,
};
pub use config::{Category, Config, ConfigFile};
pub use error::{ConfigError, Result};
pub use fifo::{Fifo, DEFAULT_FIFO_CAPACITY};
pub use host::HostParameters;
pub use lifecycle::{CallbackScope, Environment, Lifecycle};
pub use manifest::Manifest;
pub use midi::{parse_hex_message, IncomingMidiEvent, MidiParseError, OutgoingMidiEvent, ShortMessage};
pub use midi_output::MidiOutputBuffer;
pub use parameter_info::ParameterInfo;
pub use readout::{ParameterReadout, ParameterReadouts};
pub use state::{StateMap, SAMPLE_RATE_KEY};
pub use ui::ScriptUi;
pub use updater::AsyncUpdater;
