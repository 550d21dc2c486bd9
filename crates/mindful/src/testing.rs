//! Recording engine and script used by the tests.

use std::sync::{Arc, Mutex};

use mindful_core::{
    BridgeEvent, Engine, EngineFactory, Environment, ReturnCode, Script, ScriptFactory,
    ScriptRequest,
};
use serde_json::{json, Value};

/// Engine that records batches and answers with a fixed return code.
pub(crate) struct RecordingEngine {
    pub environment: Environment,
    pub batches: Vec<Value>,
    pub fail_with: Option<ReturnCode>,
}

impl Engine for RecordingEngine {
    fn apply_instructions(&mut self, batch: &Value) -> ReturnCode {
        if let Some(rc) = self.fail_with {
            return rc;
        }
        self.batches.push(batch.clone());
        ReturnCode::Ok
    }

    fn snapshot(&self) -> Value {
        json!({ "batches": self.batches.len() })
    }
}

pub(crate) fn engine_factory(
    fail_with: Option<ReturnCode>,
) -> impl EngineFactory<Engine = RecordingEngine> {
    move |environment: Environment| RecordingEngine {
        environment,
        batches: Vec::new(),
        fail_with,
    }
}

type Responder = dyn Fn(&BridgeEvent) -> Vec<ScriptRequest> + Send + Sync;

/// Events received by every script a factory created, in order.
#[derive(Clone, Default)]
pub(crate) struct ScriptLog {
    events: Arc<Mutex<Vec<BridgeEvent>>>,
    created: Arc<Mutex<usize>>,
}

impl ScriptLog {
    pub fn events(&self) -> Vec<BridgeEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn created(&self) -> usize {
        *self.created.lock().unwrap()
    }

    pub fn states(&self) -> Vec<serde_json::Map<String, Value>> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                BridgeEvent::StateChange(state) => Some(state),
                _ => None,
            })
            .collect()
    }

    pub fn midi(&self) -> Vec<Vec<String>> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                BridgeEvent::Midi(messages) => Some(messages),
                _ => None,
            })
            .collect()
    }
}

pub(crate) struct RecordingScript {
    log: ScriptLog,
    respond: Arc<Responder>,
}

impl Script for RecordingScript {
    fn receive(&mut self, event: &BridgeEvent) -> Vec<ScriptRequest> {
        self.log.events.lock().unwrap().push(event.clone());
        (self.respond)(event)
    }
}

pub(crate) fn script_factory(log: ScriptLog) -> impl ScriptFactory<Script = RecordingScript> {
    responding_script_factory(log, |_| Vec::new())
}

pub(crate) fn responding_script_factory(
    log: ScriptLog,
    respond: impl Fn(&BridgeEvent) -> Vec<ScriptRequest> + Send + Sync + 'static,
) -> impl ScriptFactory<Script = RecordingScript> {
    let respond: Arc<Responder> = Arc::new(respond);
    move || {
        *log.created.lock().unwrap() += 1;
        RecordingScript {
            log: log.clone(),
            respond: Arc::clone(&respond),
        }
    }
}
