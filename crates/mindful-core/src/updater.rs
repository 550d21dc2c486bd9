//! Single-flight asynchronous update trigger.
//!
//! [`AsyncUpdater`] coalesces any number of "something changed" signals from
//! the real-time thread into one execution of a handler on the control
//! thread. A pending flag guards a bounded wake channel of size one:
//!
//! - `trigger()` sets the flag; only the caller that flips it from `false`
//!   to `true` posts a wake token. Both steps are wait-free and allocation
//!   free.
//! - The control thread clears the flag *before* running the handler, so a
//!   trigger that lands while the handler runs schedules another run.
//!
//! Execution is at-least-once per trigger, not exactly-once. A stale wake
//! token only causes a spurious wake-up that finds nothing pending.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

/// Coalescing trigger for control-thread updates.
pub struct AsyncUpdater {
    pending: AtomicBool,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
}

impl AsyncUpdater {
    /// Create an updater with nothing pending.
    pub fn new() -> Self {
        let (wake_tx, wake_rx) = bounded(1);
        Self {
            pending: AtomicBool::new(false),
            wake_tx,
            wake_rx,
        }
    }

    /// Request a future handler run. Callable from any thread.
    #[inline]
    pub fn trigger(&self) {
        if !self.pending.swap(true, Ordering::AcqRel) {
            // A full channel already holds a token that will wake the
            // control thread, so the error case needs no handling.
            let _ = self.wake_tx.try_send(());
        }
    }

    /// Whether a handler run is pending.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Clear the pending flag, returning whether it was set.
    ///
    /// Control thread only. Call this immediately before running the handler.
    #[inline]
    pub fn take_pending(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    /// Block until a trigger arrives or `timeout` elapses.
    ///
    /// Returns `true` if woken by a trigger (or an earlier stale token).
    pub fn wait(&self, timeout: Duration) -> bool {
        match self.wake_rx.recv_timeout(timeout) {
            Ok(()) => true,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Post a wake token without marking an update pending.
    ///
    /// Used to unblock a waiting control thread, e.g. on shutdown.
    pub fn wake(&self) {
        let _ = self.wake_tx.try_send(());
    }
}

impl Default for AsyncUpdater {
    fn default() -> Self {
        Self::new()
    }
}
