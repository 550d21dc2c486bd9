//! Control-thread half of a plugin instance.
//!
//! The [`Controller`] owns the engine, the script context and the
//! authoritative state map. All of its methods run on the control (message)
//! thread. One dispatch, [`Controller::handle_async_update`], does:
//!
//! 1. rebuild engine and script if a rebuild was requested,
//! 2. fold dirty parameter readouts into the state map,
//! 3. send the state (plus `sampleRate`) to the UI, then the script,
//! 4. send queued inbound MIDI as hex strings to the UI, then the script.
//!
//! Requests the script answers with (render batches, console output,
//! outbound MIDI) are handled as soon as each delivery returns.

use std::collections::HashMap;
use std::sync::Arc;

use mindful_core::{
    parse_hex_message, BridgeEvent, Engine, EngineFactory, HostParameters, MidiParseError,
    OutgoingMidiEvent, ParameterInfo, Script, ScriptFactory, ScriptRequest, StateMap, Ui,
    UiMessage, SAMPLE_RATE_KEY,
};

use crate::runtime::RuntimeState;
use crate::shared::Shared;

/// Name under which engine failures are reported.
pub const RUNTIME_ERROR: &str = "Runtime Error";

/// The control-thread side of an instance.
pub struct Controller<E: EngineFactory, S: ScriptFactory> {
    shared: Arc<Shared>,
    engines: E,
    scripts: S,
    runtime: RuntimeState<E::Engine, S::Script>,
    parameters: Vec<ParameterInfo>,
    parameter_indices: HashMap<String, usize>,
    state: StateMap,
    host: Arc<dyn HostParameters>,
    ui: Option<Box<dyn Ui>>,
    reporting_error: bool,
}

impl<E: EngineFactory, S: ScriptFactory> Controller<E, S> {
    pub(crate) fn new(
        shared: Arc<Shared>,
        engines: E,
        scripts: S,
        parameters: Vec<ParameterInfo>,
        host: Arc<dyn HostParameters>,
    ) -> Self {
        let parameter_indices = parameters
            .iter()
            .enumerate()
            .map(|(index, info)| (info.id.clone(), index))
            .collect();
        let state = StateMap::from_parameters(&parameters);

        Self {
            shared,
            engines,
            scripts,
            runtime: RuntimeState::Unprepared,
            parameters,
            parameter_indices,
            state,
            host,
            ui: None,
            reporting_error: false,
        }
    }

    // =====================================================================
    // Dispatch
    // =====================================================================

    /// Run a dispatch if one was triggered. Returns whether it ran.
    pub fn handle_update_now_if_needed(&mut self) -> bool {
        if !self.shared.updater.take_pending() {
            return false;
        }
        self.handle_async_update();
        true
    }

    /// Run one full dispatch cycle unconditionally.
    pub fn handle_async_update(&mut self) {
        if self.shared.lifecycle.take_initialize() {
            self.initialize();
        }

        let changed = self.fold_parameter_readouts();
        log::debug!("Dispatching state ({changed} parameter change(s))");

        self.dispatch_state_change();
        self.dispatch_midi_in();
    }

    /// Whether a dispatch has been triggered and not yet run.
    pub fn is_update_pending(&self) -> bool {
        self.shared.updater.is_pending()
    }

    fn initialize(&mut self) {
        let lifecycle = &self.shared.lifecycle;
        if !lifecycle.begin_swap() {
            log::debug!("Audio callback in flight; deferring engine rebuild");
            lifecycle.request_initialize();
            self.shared.updater.trigger();
            return;
        }

        // No callback touches the queues until finish_swap().
        let discarded = self.shared.midi_in.reset() + self.shared.midi_out.reset();
        if discarded > 0 {
            log::debug!("Discarded {discarded} queued MIDI event(s) on rebuild");
        }

        let environment = lifecycle.environment();
        log::debug!(
            "Building engine for {} Hz, block size {}",
            environment.sample_rate,
            environment.block_size
        );
        let engine = self.engines.create_engine(environment);
        let script = self.scripts.create_script();
        let snapshot = engine.snapshot();
        self.runtime.prepare(engine, script, environment);

        self.send_to_script(&BridgeEvent::Hydrate(snapshot));
        self.shared.lifecycle.finish_swap(environment);
    }

    fn fold_parameter_readouts(&mut self) -> usize {
        let mut changed = 0;
        for (index, value) in self.shared.readouts.drain_dirty() {
            let Some(info) = self.parameters.get(index) else {
                continue;
            };
            if self.state.set_parameter(&info.id, value) {
                changed += 1;
            }
        }
        changed
    }

    /// Send the full state, including `sampleRate`, to the UI then the script.
    pub fn dispatch_state_change(&mut self) {
        let sample_rate = self.shared.lifecycle.environment().sample_rate;
        self.state.set_number(SAMPLE_RATE_KEY, sample_rate);

        let event = BridgeEvent::StateChange(self.state.as_map().clone());
        self.emit_to_ui(&event);
        self.send_to_script(&event);
    }

    fn dispatch_midi_in(&mut self) {
        if self.shared.midi_in.is_empty() {
            return;
        }
        let mut messages = Vec::with_capacity(self.shared.midi_in.used_slots());
        while let Some(event) = self.shared.midi_in.pop() {
            messages.push(event.message.to_hex_string());
        }

        let event = BridgeEvent::Midi(messages);
        self.emit_to_ui(&event);
        self.send_to_script(&event);
    }

    /// Report a named error to the UI, then the script.
    pub fn dispatch_error(&mut self, name: &str, message: &str) {
        let event = BridgeEvent::Error {
            name: name.to_string(),
            message: message.to_string(),
        };
        self.emit_to_ui(&event);

        // An error raised while the script handles an error is only shown.
        if self.reporting_error {
            return;
        }
        self.reporting_error = true;
        self.send_to_script(&event);
        self.reporting_error = false;
    }

    /// Show a line in the UI console.
    pub fn dispatch_log(&mut self, text: impl Into<String>) {
        self.emit_to_ui(&BridgeEvent::Log(text.into()));
    }

    fn emit_to_ui(&self, event: &BridgeEvent) {
        if let Some(ui) = &self.ui {
            ui.emit(event);
            return;
        }
        match event {
            BridgeEvent::Log(text) => log::info!("{text}"),
            BridgeEvent::Error { name, message } => log::error!("{name}: {message}"),
            BridgeEvent::Console(_) => log::info!("{}", event.payload()),
            other => log::trace!("No UI attached; dropped {} event", other.name()),
        }
    }

    fn send_to_script(&mut self, event: &BridgeEvent) {
        let Some(script) = self.runtime.script_mut() else {
            return;
        };
        let requests = script.receive(event);
        self.run_requests(requests);
    }

    fn run_requests(&mut self, requests: Vec<ScriptRequest>) {
        for request in requests {
            match request {
                ScriptRequest::Render(batch) => self.render(&batch),
                ScriptRequest::Log(args) => self.emit_to_ui(&BridgeEvent::Console(args)),
                ScriptRequest::SendMidi { message, index } => {
                    // Failures are already reported to the UI.
                    let _ = self.handle_midi_out(&message, index);
                }
            }
        }
    }

    fn render(&mut self, batch: &serde_json::Value) {
        let Some(engine) = self.runtime.engine_mut() else {
            log::warn!("Dropping render batch: engine not built yet");
            return;
        };
        let rc = engine.apply_instructions(batch);
        if !rc.is_ok() {
            log::error!("Engine rejected instruction batch: {rc}");
            self.dispatch_error(RUNTIME_ERROR, rc.describe());
        }
    }

    // =====================================================================
    // MIDI out
    // =====================================================================

    /// Parse hex MIDI text and queue it for the next audio callback.
    ///
    /// Success is logged to the UI as `MIDI Out > [ a,b,c ]`; a parse
    /// failure is logged as `MIDI Error: ...` and nothing is queued. A full
    /// queue drops the message silently.
    pub fn handle_midi_out(&mut self, text: &str, index: i32) -> Result<(), MidiParseError> {
        let message = match parse_hex_message(text) {
            Ok(message) => message,
            Err(e) => {
                log::warn!("Rejected outbound MIDI {text:?}: {e}");
                self.dispatch_log(format!("MIDI Error: {e}"));
                return Err(e);
            }
        };

        if self.shared.midi_out.push(OutgoingMidiEvent { message, index }) {
            self.dispatch_log(format!("MIDI Out > {message}"));
        } else {
            log::debug!("Outbound MIDI queue full; dropped {message}");
        }
        Ok(())
    }

    // =====================================================================
    // UI
    // =====================================================================

    /// Attach a UI. Replaces any previous one.
    pub fn attach_ui(&mut self, ui: impl Ui + 'static) {
        self.ui = Some(Box::new(ui));
    }

    /// Detach the UI. Later events fall back to the log.
    pub fn detach_ui(&mut self) {
        self.ui = None;
    }

    /// Whether a UI is attached.
    pub fn has_ui(&self) -> bool {
        self.ui.is_some()
    }

    /// Handle a JSON message posted by the UI.
    ///
    /// Returns `false` for messages that could not be understood.
    pub fn handle_ui_message(&mut self, text: &str) -> bool {
        let message = match UiMessage::parse(text) {
            Ok(message) => message,
            Err(e) => {
                log::warn!("Ignoring UI message {text:?}: {e}");
                return false;
            }
        };

        match message {
            UiMessage::SetParameterValue { param_id, value } => {
                self.set_parameter_value(&param_id, value)
            }
            UiMessage::SendMidi { message, index } => self.handle_midi_out(&message, index).is_ok(),
            UiMessage::Ready => {
                self.dispatch_state_change();
                true
            }
            UiMessage::Reload => {
                self.reload_script();
                true
            }
        }
    }

    /// Ask the host to change a parameter by id.
    ///
    /// The state map is updated once the host's change notification comes
    /// back through the dirty-list. Returns `false` for unknown ids.
    pub fn set_parameter_value(&mut self, id: &str, value: f32) -> bool {
        let Some(&index) = self.parameter_indices.get(id) else {
            log::warn!("Ignoring value for unknown parameter {id:?}");
            return false;
        };
        self.host.set_value_notifying_host(index, value);
        true
    }

    /// Re-create the script context, keeping the engine.
    ///
    /// The new context is rehydrated and receives the current state.
    pub fn reload_script(&mut self) {
        if !self.runtime.is_prepared() {
            log::debug!("Ignoring script reload: engine not built yet");
            return;
        }
        let script = self.scripts.create_script();
        self.runtime.replace_script(script);
        log::debug!("Reloaded script context");

        if let Some(snapshot) = self.runtime.engine().map(Engine::snapshot) {
            self.send_to_script(&BridgeEvent::Hydrate(snapshot));
        }
        self.dispatch_state_change();
    }

    // =====================================================================
    // State
    // =====================================================================

    /// The authoritative state map.
    pub fn state(&self) -> &StateMap {
        &self.state
    }

    /// Parameter descriptors, in host index order.
    pub fn parameters(&self) -> &[ParameterInfo] {
        &self.parameters
    }

    /// Serialize the state for the host.
    pub fn save_state(&self) -> Vec<u8> {
        self.state.save()
    }

    /// Restore state saved by [`save_state`](Self::save_state).
    ///
    /// Only keys already present are overwritten; malformed blobs are
    /// ignored. A dispatch is scheduled so the UI and script see the result.
    pub fn load_state(&mut self, bytes: &[u8]) -> usize {
        let updated = self.state.restore(bytes);
        log::debug!("Restored {updated} state entries");
        if updated > 0 {
            self.shared.updater.trigger();
        }
        updated
    }

    // =====================================================================
    // Diagnostics
    // =====================================================================

    /// Whether an engine is built.
    pub fn is_prepared(&self) -> bool {
        self.runtime.is_prepared()
    }

    /// The engine, once built.
    pub fn engine(&self) -> Option<&E::Engine> {
        self.runtime.engine()
    }

    /// Inbound MIDI messages dropped because the queue was full.
    pub fn dropped_midi_in(&self) -> usize {
        self.shared.midi_in.dropped()
    }

    /// Outbound MIDI messages dropped because the queue was full.
    pub fn dropped_midi_out(&self) -> usize {
        self.shared.midi_out.dropped()
    }

    pub(crate) fn shared(&self) -> &Arc<Shared> {
        &self.shared
    }
}

impl<E: EngineFactory, S: ScriptFactory> std::fmt::Debug for Controller<E, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("prepared", &self.runtime.is_prepared())
            .field("environment", &self.runtime.environment())
            .field("parameters", &self.parameters.len())
            .field("has_ui", &self.ui.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Instance;
    use crate::processor::Processor;
    use crate::testing::{
        engine_factory, responding_script_factory, script_factory, RecordingEngine, ScriptLog,
    };
    use crossbeam_channel::Receiver;
    use mindful_core::{
        Category, Config, Manifest, OutgoingMidiEvent, ReturnCode, ScriptUi, ShortMessage,
    };
    use serde_json::json;

    const NO_MIDI: [&[u8]; 0] = [];

    fn manifest() -> Manifest {
        Manifest::new(vec![
            ParameterInfo::new("gain", "Gain").with_default(0.5),
            ParameterInfo::new("cutoff", "Cutoff")
                .with_range(20.0, 20000.0)
                .with_default(1000.0),
        ])
    }

    fn build<S: ScriptFactory>(
        config: Config,
        scripts: S,
        fail_with: Option<ReturnCode>,
    ) -> (Processor, Controller<impl EngineFactory<Engine = RecordingEngine>, S>) {
        Instance::new(&config, manifest(), engine_factory(fail_with), scripts)
            .unwrap()
            .into_parts()
    }

    fn prepared<S: ScriptFactory>(
        scripts: S,
        fail_with: Option<ReturnCode>,
    ) -> (Processor, Controller<impl EngineFactory<Engine = RecordingEngine>, S>) {
        let config = Config::new("Mindful", Category::MidiEffect);
        let (mut processor, mut controller) = build(config, scripts, fail_with);
        processor.prepare(48000.0, 512);
        assert!(controller.handle_update_now_if_needed());
        assert!(controller.is_prepared());
        (processor, controller)
    }

    fn attach_ui<E: EngineFactory, S: ScriptFactory>(
        controller: &mut Controller<E, S>,
    ) -> Receiver<String> {
        let (ui, scripts) = ScriptUi::channel();
        controller.attach_ui(ui);
        scripts
    }

    #[test]
    fn test_parameter_change_reaches_state_in_one_dispatch() {
        let log = ScriptLog::default();
        let (processor, mut controller) = prepared(script_factory(log.clone()), None);
        assert_eq!(controller.state().get_f64("gain"), Some(0.5));

        processor.parameter_value_changed(0, 0.8);
        assert!(controller.handle_update_now_if_needed());
        assert!(!controller.handle_update_now_if_needed());

        assert_eq!(controller.state().get_f64("gain"), Some(0.8));
        assert_eq!(controller.state().get_f64("cutoff"), Some(1000.0));
        let last = log.states().pop().unwrap();
        assert_eq!(last.get("gain"), Some(&json!(0.8)));
        assert_eq!(last.get("sampleRate"), Some(&json!(48000.0)));
    }

    #[test]
    fn test_ui_parameter_change_goes_through_host() {
        let (_processor, mut controller) = prepared(script_factory(ScriptLog::default()), None);

        assert!(controller.handle_ui_message(
            r#"{"type":"setParameterValue","paramId":"gain","value":0.8}"#
        ));
        // The host echo has not been dispatched yet.
        assert_eq!(controller.state().get_f64("gain"), Some(0.5));

        assert!(controller.handle_update_now_if_needed());
        assert_eq!(controller.state().get_f64("gain"), Some(0.8));
        assert_eq!(controller.host.value(0), Some(0.8));
    }

    #[test]
    fn test_unknown_parameter_and_bad_messages_rejected() {
        let (_processor, mut controller) = prepared(script_factory(ScriptLog::default()), None);
        assert!(!controller.set_parameter_value("volume", 1.0));
        assert!(!controller.handle_ui_message("not json"));
        assert!(!controller.handle_ui_message(r#"{"type":"explode"}"#));
        assert!(!controller.is_update_pending());
    }

    #[test]
    fn test_engine_built_once_per_environment() {
        let log = ScriptLog::default();
        let config = Config::new("Mindful", Category::MidiEffect);
        let (mut processor, mut controller) = build(config, script_factory(log.clone()), None);

        processor.prepare(48000.0, 512);
        controller.handle_update_now_if_needed();
        assert_eq!(log.created(), 1);
        assert!(matches!(
            log.events().first(),
            Some(BridgeEvent::Hydrate(snapshot)) if *snapshot == json!({ "batches": 0 })
        ));
        let engine = controller.engine().unwrap();
        assert_eq!(engine.environment.sample_rate, 48000.0);
        assert_eq!(engine.environment.block_size, 512);

        processor.prepare(48000.0, 512);
        controller.handle_update_now_if_needed();
        assert_eq!(log.created(), 1);

        processor.prepare(44100.0, 512);
        controller.handle_update_now_if_needed();
        assert_eq!(log.created(), 2);
        assert_eq!(controller.engine().unwrap().environment.sample_rate, 44100.0);
        assert_eq!(controller.state().get_f64("sampleRate"), Some(44100.0));
    }

    #[test]
    fn test_rebuild_deferred_while_callback_in_flight() {
        let config = Config::new("Mindful", Category::MidiEffect);
        let (mut processor, mut controller) =
            build(config, script_factory(ScriptLog::default()), None);
        let shared = Arc::clone(controller.shared());

        processor.prepare(48000.0, 512);
        let scope = shared.lifecycle.enter_callback();
        assert!(controller.handle_update_now_if_needed());
        assert!(!controller.is_prepared());
        assert!(shared.lifecycle.runtime_swap_required());
        assert!(controller.is_update_pending());
        drop(scope);

        // Callbacks in the meantime skip all exchange and re-request.
        let messages: [&[u8]; 1] = [&[0x90, 60, 100]];
        assert!(processor.process(messages).is_empty());

        assert!(controller.handle_update_now_if_needed());
        assert!(controller.is_prepared());
        assert!(!shared.lifecycle.runtime_swap_required());
        assert!(!shared.lifecycle.should_initialize());
    }

    #[test]
    fn test_rebuilds_race_audio_callbacks() {
        use std::thread;

        const CALLBACKS: usize = 20_000;
        let config = Config::new("Mindful", Category::MidiEffect).with_fifo_capacity(8);
        let (mut processor, mut controller) =
            build(config, script_factory(ScriptLog::default()), None);
        let shared = Arc::clone(controller.shared());

        let audio = thread::spawn(move || {
            let rates = [44100.0, 48000.0, 96000.0];
            let notes: [&[u8]; 1] = [&[0x90, 0x3C, 0x40]];
            for i in 0..CALLBACKS {
                processor.prepare(rates[i % rates.len()], 256);
                processor.process(notes);
                processor.parameter_value_changed(0, (i % 100) as f32 / 100.0);
            }
            processor.prepare(96000.0, 256);
            processor
        });

        let mut dispatches = 0;
        while !audio.is_finished() {
            if controller.handle_update_now_if_needed() {
                dispatches += 1;
            }
            controller.handle_midi_out("90 3c 40", 0).unwrap();
        }
        let mut processor = audio.join().unwrap();

        for _ in 0..4 {
            processor.process(NO_MIDI);
            if controller.handle_update_now_if_needed() {
                dispatches += 1;
            }
        }

        assert!(dispatches > 0);
        let environment = controller.engine().unwrap().environment;
        assert_eq!(environment.sample_rate, 96000.0);
        assert_eq!(environment.block_size, 256);
        assert_eq!(shared.lifecycle.environment(), environment);
        assert!(!shared.lifecycle.runtime_swap_required());
        assert!(!shared.lifecycle.should_initialize());
        assert_eq!(controller.state().get_f64("sampleRate"), Some(96000.0));
    }

    #[test]
    fn test_effect_category_drops_midi() {
        let log = ScriptLog::default();
        let config = Config::new("Mindful", Category::Effect);
        let (mut processor, mut controller) = build(config, script_factory(log.clone()), None);
        processor.prepare(48000.0, 512);
        controller.handle_update_now_if_needed();

        let messages: [&[u8]; 1] = [&[0x90, 0x3C, 0x01]];
        processor.process(messages);
        controller.handle_midi_out("90 3c 01", 0).unwrap();
        controller.handle_update_now_if_needed();

        assert!(log.midi().is_empty());
        assert!(processor.process(NO_MIDI).is_empty());
        assert_eq!(controller.dropped_midi_in(), 0);
    }

    #[test]
    fn test_engine_error_reported_as_runtime_error() {
        let log = ScriptLog::default();
        let scripts = responding_script_factory(log.clone(), |event| match event {
            BridgeEvent::StateChange(_) => vec![ScriptRequest::Render(json!([[0, 1, "sine"]]))],
            _ => Vec::new(),
        });
        let (processor, mut controller) = prepared(scripts, Some(ReturnCode::NodeNotFound));
        let ui = attach_ui(&mut controller);
        log.clear();

        processor.parameter_value_changed(0, 0.3);
        controller.handle_update_now_if_needed();

        let expected = BridgeEvent::Error {
            name: "Runtime Error".to_string(),
            message: "Node not found".to_string(),
        };
        assert!(log.events().contains(&expected));
        let scripts: Vec<String> = ui.try_iter().collect();
        assert!(scripts.iter().any(|s| s.contains(r#"new Error("Node not found")"#)
            && s.contains(r#"e.name = "Runtime Error""#)));

        // Processing continues with the new state.
        assert_eq!(controller.state().get_f64("gain"), Some(0.3));
    }

    #[test]
    fn test_error_handler_failures_do_not_recurse() {
        let log = ScriptLog::default();
        let scripts = responding_script_factory(log.clone(), |event| match event {
            BridgeEvent::StateChange(_) | BridgeEvent::Error { .. } => {
                vec![ScriptRequest::Render(json!([]))]
            }
            _ => Vec::new(),
        });
        let (_processor, mut controller) = prepared(scripts, Some(ReturnCode::InvariantViolation));
        log.clear();

        controller.dispatch_state_change();
        let errors = log
            .events()
            .into_iter()
            .filter(|event| matches!(event, BridgeEvent::Error { .. }))
            .count();
        assert_eq!(errors, 1);
    }

    #[test]
    fn test_render_batches_reach_engine() {
        let scripts = responding_script_factory(ScriptLog::default(), |event| match event {
            BridgeEvent::StateChange(_) => vec![ScriptRequest::Render(json!([[3, 7]]))],
            _ => Vec::new(),
        });
        let (_processor, controller) = prepared(scripts, None);
        assert_eq!(controller.engine().unwrap().batches, vec![json!([[3, 7]])]);
    }

    #[test]
    fn test_outbound_midi_reaches_callback() {
        let (mut processor, mut controller) = prepared(script_factory(ScriptLog::default()), None);
        let ui = attach_ui(&mut controller);

        assert!(controller.handle_midi_out("90 3C 3C", 0).is_ok());
        assert_eq!(
            processor.process(NO_MIDI).events(),
            &[OutgoingMidiEvent {
                message: ShortMessage::new(0x90, 0x3C, 0x3C),
                index: 0,
            }]
        );
        let scripts: Vec<String> = ui.try_iter().collect();
        assert!(scripts.iter().any(|s| s.contains("MIDI Out > [ 144,60,60 ]")));
    }

    #[test]
    fn test_malformed_midi_rejected() {
        let (mut processor, mut controller) = prepared(script_factory(ScriptLog::default()), None);
        let ui = attach_ui(&mut controller);

        assert_eq!(
            controller.handle_midi_out("90 3C", 0),
            Err(MidiParseError::WrongTokenCount(2))
        );
        assert!(!controller.handle_ui_message(r#"{"type":"sendMIDI","message":"zz 3C 3C"}"#));
        assert!(processor.process(NO_MIDI).is_empty());

        let scripts: Vec<String> = ui.try_iter().collect();
        assert!(scripts
            .iter()
            .any(|s| s.contains("MIDI Error: Message was not a 3 byte message")));
    }

    #[test]
    fn test_inbound_midi_dispatched_as_hex() {
        let log = ScriptLog::default();
        let (mut processor, mut controller) = prepared(script_factory(log.clone()), None);
        assert!(log.midi().is_empty());

        let messages: [&[u8]; 2] = [&[0x90, 0x3C, 0x64], &[0x80, 0x3C, 0x00]];
        processor.process(messages);
        assert!(controller.handle_update_now_if_needed());

        assert_eq!(
            log.midi(),
            vec![vec!["90 3c 64".to_string(), "80 3c 00".to_string()]]
        );
    }

    #[test]
    fn test_script_midi_request_queued() {
        let scripts = responding_script_factory(ScriptLog::default(), |event| match event {
            BridgeEvent::Midi(_) => vec![ScriptRequest::SendMidi {
                message: "80 3c 00".to_string(),
                index: 1,
            }],
            _ => Vec::new(),
        });
        let (mut processor, mut controller) = prepared(scripts, None);

        let messages: [&[u8]; 1] = [&[0x90, 0x3C, 0x64]];
        processor.process(messages);
        controller.handle_update_now_if_needed();

        assert_eq!(
            processor.process(NO_MIDI).events(),
            &[OutgoingMidiEvent {
                message: ShortMessage::new(0x80, 0x3C, 0x00),
                index: 1,
            }]
        );
    }

    #[test]
    fn test_inbound_overflow_counted() {
        let config = Config::new("Mindful", Category::MidiEffect).with_fifo_capacity(2);
        let (mut processor, mut controller) =
            build(config, script_factory(ScriptLog::default()), None);
        processor.prepare(48000.0, 512);
        controller.handle_update_now_if_needed();

        let notes: Vec<[u8; 3]> = (1..=5).map(|pitch| [0x90, pitch, 1]).collect();
        processor.process(notes.iter().map(|note| &note[..]));
        assert_eq!(controller.dropped_midi_in(), 3);
        assert_eq!(controller.dropped_midi_out(), 0);
    }

    #[test]
    fn test_state_save_load_roundtrip() {
        let (processor, mut controller) = prepared(script_factory(ScriptLog::default()), None);
        processor.parameter_value_changed(0, 0.8);
        controller.handle_update_now_if_needed();
        let blob = controller.save_state();

        let config = Config::new("Mindful", Category::MidiEffect);
        let (_processor, mut restored) = build(config, script_factory(ScriptLog::default()), None);
        // sampleRate is not a key of a fresh instance and is skipped.
        assert_eq!(restored.load_state(&blob), 2);
        assert_eq!(restored.state().get_f64("gain"), Some(0.8));
        assert_eq!(restored.state().get_f64("cutoff"), Some(1000.0));
        assert!(restored.is_update_pending());
    }

    #[test]
    fn test_malformed_state_ignored() {
        let (_processor, mut controller) = prepared(script_factory(ScriptLog::default()), None);
        let before = controller.state().clone();

        assert_eq!(controller.load_state(b"{\"gain\": "), 0);
        assert_eq!(controller.load_state(b"[0.1]"), 0);
        assert_eq!(controller.state(), &before);
        assert!(!controller.is_update_pending());
    }

    #[test]
    fn test_reload_rehydrates_new_script() {
        let log = ScriptLog::default();
        let (_processor, mut controller) = prepared(script_factory(log.clone()), None);
        log.clear();

        assert!(controller.handle_ui_message(r#"{"type":"reload"}"#));
        assert_eq!(log.created(), 2);
        let events = log.events();
        assert!(matches!(events.first(), Some(BridgeEvent::Hydrate(_))));
        assert!(matches!(events.last(), Some(BridgeEvent::StateChange(_))));
    }

    #[test]
    fn test_ready_sends_state_to_ui() {
        let (_processor, mut controller) = prepared(script_factory(ScriptLog::default()), None);
        let ui = attach_ui(&mut controller);

        assert!(controller.handle_ui_message(r#"{"type":"ready"}"#));
        let scripts: Vec<String> = ui.try_iter().collect();
        assert_eq!(scripts.len(), 1);
        assert!(scripts[0].contains("__receiveStateChange__"));

        controller.detach_ui();
        assert!(!controller.has_ui());
    }
}
