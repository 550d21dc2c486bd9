//! # Mindful
//!
//! Real-time-safe MIDI and parameter plumbing for a scriptable MIDI plugin.
//!
//! An [`Instance`] splits into two halves:
//!
//! - [`Processor`] runs on the host's audio thread. It queues host MIDI,
//!   marks changed parameters, emits outbound MIDI and raises rebuild
//!   requests. It never blocks or allocates.
//! - [`Controller`] runs on the control thread. It builds the engine and
//!   script context, keeps the authoritative state map and dispatches state
//!   and MIDI to the script and UI.
//!
//! ## Architecture
//!
//! ```text
//! host audio thread           host / UI
//!        ↓                        ↓
//!    Processor ── queues ──▶ Controller ──▶ Engine, Script, Ui
//!        ↑                        │
//!        └── AsyncUpdater ────────┘ (MessageThread or host message loop)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mindful::prelude::*;
//!
//! let config = Config::new("Mindful", Category::MidiEffect);
//! let manifest = Manifest::parse(include_str!("manifest.json"))?;
//! let (mut processor, controller) =
//!     Instance::new(&config, manifest, MyEngine::new, MyScript::load)?.into_parts();
//! let message_thread = MessageThread::spawn(controller)?;
//!
//! // audio thread
//! processor.prepare(48000.0, 512);
//! let output = processor.process(host_midi.iter().map(|m| m.bytes()));
//! ```

// Re-export sub-crates
pub use mindful_core as core;

mod controller;
mod instance;
mod message_thread;
mod parameters;
mod processor;
mod runtime;
mod shared;

#[cfg(test)]
mod testing;

pub use controller::{Controller, RUNTIME_ERROR};
pub use instance::Instance;
pub use message_thread::MessageThread;
pub use parameters::ParameterBank;
pub use processor::Processor;
pub use shared::ParameterListener;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use mindful::prelude::*;
/// ```
pub mod prelude {
    pub use mindful_core::{
        // Collaborators
        BridgeEvent, Engine, EngineFactory, ReturnCode, Script, ScriptFactory, ScriptRequest, Ui,
        UiMessage,
        // Configuration
        Category, Config, ConfigError, ConfigFile, Manifest, ParameterInfo,
        // Host interface
        Environment, HostParameters,
        // MIDI
        MidiOutputBuffer, MidiParseError, OutgoingMidiEvent, ShortMessage,
        // UI
        ScriptUi,
        // State
        StateMap,
    };

    pub use crate::{
        Controller, Instance, MessageThread, ParameterBank, ParameterListener, Processor,
    };
}
