//! Deferred reinitialization flags shared by the audio and control threads.
//!
//! The engine is only ever (re)built on the control thread. The real-time
//! thread cannot do that work itself, so it raises flags and leaves the
//! rebuild to the next dispatch:
//!
//! ```text
//!                 prepare() sees new rate/size
//!   should_initialize: false ───────────────────────▶ true
//!                      ◀───────────────────────────
//!                 take_initialize() on control thread
//!
//!                 begin_swap() on control thread
//!   runtime_swap_required: false ───────────────────▶ true
//!                          ◀───────────────────────
//!                 finish_swap() on control thread
//! ```
//!
//! # Ownership rule
//!
//! `should_initialize` is set by the real-time thread and cleared only by
//! the control thread. `runtime_swap_required` is raised and cleared by the
//! control thread around an engine swap and only read by the real-time
//! thread. Redundant sets are harmless; neither flag has a third state.
//!
//! # Quiescence
//!
//! A swap empties the MIDI FIFOs for the new engine, so no callback may
//! push to or drain them meanwhile. Each callback publishes `in_callback`
//! before it reads `runtime_swap_required`, and a swap publishes
//! `runtime_swap_required` before it reads `in_callback`. With sequentially consistent ordering at
//! least one side sees the other: either the swap is deferred, or the
//! callback skips all cross-thread work.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// Sample rate and block size the engine is built for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Environment {
    /// Sample rate in Hz.
    pub sample_rate: f64,
    /// Maximum block size in samples.
    pub block_size: usize,
}

/// Per-instance reinitialization state.
pub struct Lifecycle {
    should_initialize: AtomicBool,
    runtime_swap_required: AtomicBool,
    in_callback: AtomicBool,
    sample_rate: AtomicU64,
    block_size: AtomicUsize,
}

impl Lifecycle {
    /// Create lifecycle state with no known environment.
    pub fn new() -> Self {
        Self {
            should_initialize: AtomicBool::new(false),
            runtime_swap_required: AtomicBool::new(false),
            in_callback: AtomicBool::new(false),
            sample_rate: AtomicU64::new(0.0f64.to_bits()),
            block_size: AtomicUsize::new(0),
        }
    }

    /// Record the host environment and flag a rebuild if it changed.
    ///
    /// Real-time (or host setup) thread. Returns `true` when either value
    /// differs from the last known one. Unchanged values never set the flag.
    pub fn observe_environment(&self, sample_rate: f64, block_size: usize) -> bool {
        let known = self.environment();
        if known.sample_rate == sample_rate && known.block_size == block_size {
            return false;
        }

        self.sample_rate.store(sample_rate.to_bits(), Ordering::SeqCst);
        self.block_size.store(block_size, Ordering::SeqCst);
        self.should_initialize.store(true, Ordering::SeqCst);
        true
    }

    /// Last environment recorded by [`observe_environment`](Self::observe_environment).
    pub fn environment(&self) -> Environment {
        Environment {
            sample_rate: f64::from_bits(self.sample_rate.load(Ordering::SeqCst)),
            block_size: self.block_size.load(Ordering::SeqCst),
        }
    }

    /// Raise `should_initialize`. Idempotent.
    #[inline]
    pub fn request_initialize(&self) {
        self.should_initialize.store(true, Ordering::SeqCst);
    }

    /// Whether a rebuild is pending.
    #[inline]
    pub fn should_initialize(&self) -> bool {
        self.should_initialize.load(Ordering::SeqCst)
    }

    /// Consume `should_initialize`. Control thread only.
    #[inline]
    pub fn take_initialize(&self) -> bool {
        self.should_initialize.swap(false, Ordering::SeqCst)
    }

    /// Whether an engine swap is in progress or pending.
    #[inline]
    pub fn runtime_swap_required(&self) -> bool {
        self.runtime_swap_required.load(Ordering::SeqCst)
    }

    /// Mark the start of an audio callback. Real-time thread only.
    ///
    /// The returned scope clears the in-callback marker when dropped.
    #[inline]
    pub fn enter_callback(&self) -> CallbackScope<'_> {
        self.in_callback.store(true, Ordering::SeqCst);
        let swap_required = self.runtime_swap_required.load(Ordering::SeqCst);
        CallbackScope {
            lifecycle: self,
            swap_required,
        }
    }

    /// Start an engine swap. Control thread only.
    ///
    /// Raises `runtime_swap_required` and returns `true` when no callback is
    /// in flight, meaning shared queues may be reset until
    /// [`finish_swap`](Self::finish_swap). Returns `false` when a callback is
    /// running; the flag stays raised and the caller must retry later.
    pub fn begin_swap(&self) -> bool {
        self.runtime_swap_required.store(true, Ordering::SeqCst);
        !self.in_callback.load(Ordering::SeqCst)
    }

    /// Finish an engine swap built for `built`. Control thread only.
    ///
    /// Rebuild requests raised by callbacks that ran during the swap refer to
    /// this same swap and are dropped, unless the environment moved on while
    /// the engine was being built.
    pub fn finish_swap(&self, built: Environment) {
        self.should_initialize.store(false, Ordering::SeqCst);
        if self.environment() != built {
            self.should_initialize.store(true, Ordering::SeqCst);
        }
        self.runtime_swap_required.store(false, Ordering::SeqCst);
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Marks an audio callback as in flight for the lifetime of the scope.
pub struct CallbackScope<'a> {
    lifecycle: &'a Lifecycle,
    swap_required: bool,
}

impl CallbackScope<'_> {
    /// Whether an engine swap was pending when the callback started.
    ///
    /// When `true`, the callback must not touch the shared queues.
    #[inline]
    pub fn swap_required(&self) -> bool {
        self.swap_required
    }
}

impl Drop for CallbackScope<'_> {
    fn drop(&mut self) {
        self.lifecycle.in_callback.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unchanged_environment_never_flags() {
        let lifecycle = Lifecycle::new();
        assert!(lifecycle.observe_environment(48000.0, 512));
        assert!(lifecycle.take_initialize());

        for _ in 0..3 {
            assert!(!lifecycle.observe_environment(48000.0, 512));
        }
        assert!(!lifecycle.should_initialize());
    }

    #[test]
    fn test_change_sets_flag_once_until_consumed() {
        let lifecycle = Lifecycle::new();
        lifecycle.observe_environment(44100.0, 256);
        lifecycle.take_initialize();

        assert!(lifecycle.observe_environment(44100.0, 512));
        assert!(lifecycle.should_initialize());
        assert!(lifecycle.take_initialize());
        assert!(!lifecycle.take_initialize());

        assert!(lifecycle.observe_environment(96000.0, 512));
        assert_eq!(
            lifecycle.environment(),
            Environment { sample_rate: 96000.0, block_size: 512 }
        );
    }

    #[test]
    fn test_swap_deferred_while_in_callback() {
        let lifecycle = Lifecycle::new();
        let scope = lifecycle.enter_callback();
        assert!(!scope.swap_required());

        assert!(!lifecycle.begin_swap());
        assert!(lifecycle.runtime_swap_required());
        drop(scope);

        assert!(lifecycle.begin_swap());
        lifecycle.finish_swap(lifecycle.environment());
        assert!(!lifecycle.runtime_swap_required());
    }

    #[test]
    fn test_callback_sees_pending_swap() {
        let lifecycle = Lifecycle::new();
        assert!(lifecycle.begin_swap());

        let scope = lifecycle.enter_callback();
        assert!(scope.swap_required());
    }

    #[test]
    fn test_finish_swap_keeps_request_for_new_environment() {
        let lifecycle = Lifecycle::new();
        lifecycle.observe_environment(44100.0, 512);
        assert!(lifecycle.take_initialize());
        let built = lifecycle.environment();

        assert!(lifecycle.begin_swap());
        // Redundant request raised by a callback during the swap.
        lifecycle.request_initialize();
        lifecycle.finish_swap(built);
        assert!(!lifecycle.should_initialize());

        assert!(lifecycle.begin_swap());
        lifecycle.observe_environment(48000.0, 512);
        lifecycle.finish_swap(built);
        assert!(lifecycle.should_initialize());
    }
}
