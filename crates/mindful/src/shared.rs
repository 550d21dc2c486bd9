//! State shared between the processor and the controller.

use std::sync::Arc;

use mindful_core::{
    AsyncUpdater, Fifo, IncomingMidiEvent, Lifecycle, OutgoingMidiEvent, ParameterReadouts,
};

/// Everything both threads touch. Lives behind an `Arc`.
pub(crate) struct Shared {
    /// Host MIDI, real-time thread to control thread.
    pub midi_in: Fifo<IncomingMidiEvent>,
    /// Script and UI MIDI, control thread to real-time thread.
    pub midi_out: Fifo<OutgoingMidiEvent>,
    /// One cell per host parameter.
    pub readouts: ParameterReadouts,
    /// Reinitialization flags and last known environment.
    pub lifecycle: Lifecycle,
    /// Coalescing dispatch trigger.
    pub updater: AsyncUpdater,
}

impl Shared {
    pub fn new(fifo_capacity: usize, defaults: impl IntoIterator<Item = f32>) -> Self {
        Self {
            midi_in: Fifo::new(fifo_capacity),
            midi_out: Fifo::new(fifo_capacity),
            readouts: ParameterReadouts::new(defaults),
            lifecycle: Lifecycle::new(),
            updater: AsyncUpdater::new(),
        }
    }

    #[inline]
    pub fn parameter_value_changed(&self, index: usize, value: f32) {
        self.readouts.publish(index, value);
        self.updater.trigger();
    }
}

/// Receiver for the host's parameter change notifications.
///
/// Wait-free; callable from the audio thread or any host thread. Each call
/// marks the parameter dirty and schedules a dispatch.
#[derive(Clone)]
pub struct ParameterListener {
    shared: Arc<Shared>,
}

impl ParameterListener {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Report that the host parameter at `index` now holds `value`.
    #[inline]
    pub fn parameter_value_changed(&self, index: usize, value: f32) {
        self.shared.parameter_value_changed(index, value);
    }
}
