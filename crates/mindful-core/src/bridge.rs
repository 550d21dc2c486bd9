//! Events and capability traits at the scripting and UI boundary.
//!
//! The control thread talks to three collaborators:
//!
//! - an [`Engine`] that consumes render instruction batches and can snapshot
//!   its graph for rehydration,
//! - a [`Script`] context that receives [`BridgeEvent`]s and answers with
//!   [`ScriptRequest`]s,
//! - an optional [`Ui`] that receives the same events, best effort.
//!
//! Engines and scripts are rebuilt on every reinitialization through an
//! [`EngineFactory`] and a [`ScriptFactory`]. Closures implement both.
//!
//! Script and webview hosts evaluate events as JavaScript. Each hook is
//! guarded so an undefined receiver is a no-op:
//!
//! ```text
//! (function() {
//!   if (typeof globalThis.__receiveStateChange__ !== 'function')
//!     return false;
//!
//!   globalThis.__receiveStateChange__("{\"gain\":0.8}");
//!   return true;
//! })();
//! ```
//!
//! State, MIDI and hydration payloads are serialized twice: the receiver
//! gets a JSON string and calls `JSON.parse` on it.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::lifecycle::Environment;

/// A message from the control thread to the script and UI.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    /// The full state map, including `sampleRate`.
    StateChange(Map<String, Value>),
    /// Inbound MIDI as lowercase hex strings, oldest first.
    Midi(Vec<String>),
    /// Engine graph snapshot for a freshly created script context.
    Hydrate(Value),
    /// A named error, e.g. `"Runtime Error"`.
    Error {
        /// Error name.
        name: String,
        /// Human readable description.
        message: String,
    },
    /// A line for the UI console.
    Log(String),
    /// Console arguments forwarded from the script context.
    Console(Vec<Value>),
}

fn guarded_call(hook: &str, argument: &str) -> String {
    format!(
        "(function() {{\n  if (typeof globalThis.{hook} !== 'function')\n    return false;\n\n  globalThis.{hook}({argument});\n  return true;\n}})();\n"
    )
}

fn double_serialize(payload: &Value) -> String {
    Value::String(payload.to_string()).to_string()
}

impl BridgeEvent {
    /// Short event name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::StateChange(_) => "stateChange",
            Self::Midi(_) => "midi",
            Self::Hydrate(_) => "hydrate",
            Self::Error { .. } => "error",
            Self::Log(_) => "log",
            Self::Console(_) => "console",
        }
    }

    /// The payload as plain JSON, without the script wrapping.
    pub fn payload(&self) -> Value {
        match self {
            Self::StateChange(state) => Value::Object(state.clone()),
            Self::Midi(messages) => {
                Value::Array(messages.iter().cloned().map(Value::String).collect())
            }
            Self::Hydrate(snapshot) => snapshot.clone(),
            Self::Error { name, message } => {
                let mut error = Map::new();
                error.insert("name".to_string(), Value::String(name.clone()));
                error.insert("message".to_string(), Value::String(message.clone()));
                Value::Object(error)
            }
            Self::Log(text) => Value::String(text.clone()),
            Self::Console(args) => Value::Array(args.clone()),
        }
    }

    /// Render the JavaScript expression that delivers this event.
    pub fn to_script(&self) -> String {
        match self {
            Self::StateChange(_) => {
                guarded_call("__receiveStateChange__", &double_serialize(&self.payload()))
            }
            Self::Midi(_) => guarded_call("__receiveMIDI__", &double_serialize(&self.payload())),
            Self::Hydrate(snapshot) => {
                guarded_call("__receiveHydrationData__", &double_serialize(snapshot))
            }
            Self::Error { name, message } => format!(
                "(function() {{\n  if (typeof globalThis.__receiveError__ !== 'function')\n    return false;\n\n  let e = new Error({});\n  e.name = {};\n\n  globalThis.__receiveError__(e);\n  return true;\n}})();\n",
                Value::String(message.clone()),
                Value::String(name.clone()),
            ),
            Self::Log(text) => guarded_call("__receiveLog__", &Value::String(text.clone()).to_string()),
            Self::Console(_) => format!(
                "(function() {{\n  console.log(...JSON.parse({}));\n  return true;\n}})();\n",
                double_serialize(&self.payload())
            ),
        }
    }
}

/// Result of applying an instruction batch to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnCode {
    /// The batch was applied.
    Ok,
    /// An instruction named an unknown node type.
    UnknownNodeType,
    /// An instruction referenced a node that does not exist.
    NodeNotFound,
    /// An instruction created a node that already exists.
    NodeAlreadyExists,
    /// An instruction re-created a node with a different type.
    NodeTypeChanged,
    /// A property had the wrong type.
    InvalidPropertyType,
    /// A property value was out of range.
    InvalidPropertyValue,
    /// The engine detected an internal inconsistency.
    InvariantViolation,
    /// The batch was not a well-formed instruction list.
    InvalidInstructionFormat,
}

impl ReturnCode {
    /// Whether the batch was applied.
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Human readable description.
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Ok => "Ok",
            Self::UnknownNodeType => "Node type not recognized",
            Self::NodeNotFound => "Node not found",
            Self::NodeAlreadyExists => "Attempting to create a node that already exists",
            Self::NodeTypeChanged => "Attempting to create a node with a different type",
            Self::InvalidPropertyType => "Invalid property type",
            Self::InvalidPropertyValue => "Invalid property value",
            Self::InvariantViolation => "Invariant violation",
            Self::InvalidInstructionFormat => "Invalid instruction format",
        }
    }
}

impl std::fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.describe())
    }
}

/// Something the script context asks the control thread to do.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptRequest {
    /// Apply an instruction batch to the engine.
    Render(Value),
    /// Forward console output to the UI.
    Log(Vec<Value>),
    /// Queue an outbound MIDI message given as hex text.
    SendMidi {
        /// Hex text, e.g. `"90 3C 64"`.
        message: String,
        /// Destination index.
        index: i32,
    },
}

/// The audio graph engine driven by instruction batches.
pub trait Engine: Send {
    /// Apply a batch of render instructions.
    fn apply_instructions(&mut self, batch: &Value) -> ReturnCode;

    /// Snapshot the current graph for rehydrating a new script context.
    fn snapshot(&self) -> Value;
}

/// Builds an [`Engine`] for a host environment.
pub trait EngineFactory: Send {
    /// The engine type produced.
    type Engine: Engine;

    /// Build an engine for the given sample rate and block size.
    fn create_engine(&mut self, environment: Environment) -> Self::Engine;
}

impl<F, E> EngineFactory for F
where
    F: FnMut(Environment) -> E + Send,
    E: Engine,
{
    type Engine = E;

    fn create_engine(&mut self, environment: Environment) -> E {
        self(environment)
    }
}

/// A scripting context living on the control thread.
pub trait Script: Send {
    /// Deliver an event and collect the requests it produced.
    fn receive(&mut self, event: &BridgeEvent) -> Vec<ScriptRequest>;
}

/// Builds a fresh [`Script`] context.
pub trait ScriptFactory: Send {
    /// The script type produced.
    type Script: Script;

    /// Create and load a new script context.
    fn create_script(&mut self) -> Self::Script;
}

impl<F, S> ScriptFactory for F
where
    F: FnMut() -> S + Send,
    S: Script,
{
    type Script = S;

    fn create_script(&mut self) -> S {
        self()
    }
}

/// An attached user interface.
///
/// Delivery is best effort and must not block the control thread.
pub trait Ui: Send {
    /// Deliver an event to the UI.
    fn emit(&self, event: &BridgeEvent);
}

/// A message posted by the UI, tagged by `"type"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum UiMessage {
    /// Ask the host to change a parameter.
    #[serde(rename = "setParameterValue", rename_all = "camelCase")]
    SetParameterValue {
        /// Parameter id.
        param_id: String,
        /// Plain value.
        value: f32,
    },
    /// Queue an outbound MIDI message.
    #[serde(rename = "sendMIDI")]
    SendMidi {
        /// Hex text.
        message: String,
        /// Destination index.
        #[serde(default)]
        index: i32,
    },
    /// The UI finished loading and wants the current state.
    #[serde(rename = "ready")]
    Ready,
    /// Rebuild the script context (development hot reload).
    #[serde(rename = "reload")]
    Reload,
}

impl UiMessage {
    /// Parse a UI message from JSON text.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
