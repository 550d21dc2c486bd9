//! Dedicated control thread driving a [`Controller`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use mindful_core::{EngineFactory, ScriptFactory};

use crate::controller::Controller;
use crate::shared::Shared;

/// Upper bound on how long the thread sleeps between stop-flag checks.
const IDLE_TIMEOUT: Duration = Duration::from_millis(100);

/// Runs dispatches on a background thread whenever the processor triggers.
///
/// Hosts that already own a message thread can call
/// [`Controller::handle_update_now_if_needed`] from it instead.
pub struct MessageThread<E, S>
where
    E: EngineFactory + 'static,
    S: ScriptFactory + 'static,
{
    shared: Arc<Shared>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<Controller<E, S>>>,
}

impl<E, S> MessageThread<E, S>
where
    E: EngineFactory + 'static,
    S: ScriptFactory + 'static,
{
    /// Move `controller` onto a new thread and start dispatching.
    pub fn spawn(controller: Controller<E, S>) -> std::io::Result<Self> {
        let shared = Arc::clone(controller.shared());
        let stop = Arc::new(AtomicBool::new(false));

        let handle = {
            let stop = Arc::clone(&stop);
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("mindful-message".to_string())
                .spawn(move || {
                    let mut controller = controller;
                    log::debug!("Message thread started");
                    while !stop.load(Ordering::Acquire) {
                        shared.updater.wait(IDLE_TIMEOUT);
                        controller.handle_update_now_if_needed();
                    }
                    log::debug!("Message thread stopped");
                    controller
                })?
        };

        Ok(Self {
            shared,
            stop,
            handle: Some(handle),
        })
    }

    /// Stop the thread and take the controller back.
    ///
    /// Returns `None` if the thread panicked.
    pub fn stop(mut self) -> Option<Controller<E, S>> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Option<Controller<E, S>> {
        let handle = self.handle.take()?;
        self.stop.store(true, Ordering::Release);
        self.shared.updater.wake();
        match handle.join() {
            Ok(controller) => Some(controller),
            Err(_) => {
                log::error!("Message thread panicked");
                None
            }
        }
    }
}

impl<E, S> Drop for MessageThread<E, S>
where
    E: EngineFactory + 'static,
    S: ScriptFactory + 'static,
{
    fn drop(&mut self) {
        self.shutdown();
    }
}
