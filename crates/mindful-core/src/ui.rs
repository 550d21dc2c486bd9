//! Handle for sending events from Rust to a script-evaluating UI.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver};

use crate::bridge::{BridgeEvent, Ui};

/// Callback that evaluates a JavaScript expression in the UI.
///
/// Must not block. Implementations typically post the script to the UI
/// thread.
pub type EvalScriptFn = dyn Fn(&str) + Send + Sync;

/// [`Ui`] implementation that renders each event with
/// [`BridgeEvent::to_script`] and hands it to an eval callback.
///
/// The handle is cheap to clone; clones share the attached flag, so
/// [`invalidate`](Self::invalidate) on any clone detaches all of them.
///
/// **Not audio-thread safe.** Rendering allocates.
#[derive(Clone)]
pub struct ScriptUi {
    eval: Arc<EvalScriptFn>,
    attached: Arc<AtomicBool>,
}

impl ScriptUi {
    /// Create a handle around an eval callback.
    pub fn new(eval: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self {
            eval: Arc::new(eval),
            attached: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Create a handle that queues scripts on a channel.
    ///
    /// The UI thread drains the receiver and evaluates each script in order.
    pub fn channel() -> (Self, Receiver<String>) {
        let (tx, rx) = unbounded();
        let ui = Self::new(move |script: &str| {
            // A dropped receiver means the view is gone.
            let _ = tx.send(script.to_string());
        });
        (ui, rx)
    }

    /// Whether the UI is still attached.
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    /// Invalidate the handle, preventing further calls.
    ///
    /// Called when the view is closed. After this, `emit()` becomes a no-op.
    pub fn invalidate(&self) {
        self.attached.store(false, Ordering::Release);
    }
}

impl Ui for ScriptUi {
    fn emit(&self, event: &BridgeEvent) {
        if !self.is_attached() {
            return;
        }
        (self.eval)(&event.to_script());
    }
}
