//! Real-time half of a plugin instance.

use std::sync::Arc;
use std::time::Instant;

use mindful_core::{Category, IncomingMidiEvent, MidiOutputBuffer, ShortMessage};

use crate::shared::{ParameterListener, Shared};

/// The audio-thread side of an instance.
///
/// Every method is wait-free and allocation free. Owned by the host's audio
/// thread; `prepare` may also be called from the host's main thread.
pub struct Processor {
    shared: Arc<Shared>,
    output: MidiOutputBuffer,
    accepts_midi: bool,
    produces_midi: bool,
}

impl Processor {
    pub(crate) fn new(shared: Arc<Shared>, category: Category, midi_output_slots: usize) -> Self {
        Self {
            shared,
            output: MidiOutputBuffer::with_capacity(midi_output_slots),
            accepts_midi: category.accepts_midi(),
            produces_midi: category.produces_midi(),
        }
    }

    /// Record the host's sample rate and maximum block size.
    ///
    /// A change from the last known values schedules an engine rebuild.
    /// Always schedules a dispatch so the current state is pushed.
    pub fn prepare(&mut self, sample_rate: f64, block_size: usize) {
        self.shared.lifecycle.observe_environment(sample_rate, block_size);
        self.shared.updater.trigger();
    }

    /// Host notification that a parameter changed.
    #[inline]
    pub fn parameter_value_changed(&self, index: usize, value: f32) {
        self.shared.parameter_value_changed(index, value);
    }

    /// A listener for host threads other than the audio thread.
    pub fn listener(&self) -> ParameterListener {
        ParameterListener::new(Arc::clone(&self.shared))
    }

    /// Run one audio callback's worth of MIDI plumbing.
    ///
    /// Queues each host message for the control thread, then fills and
    /// returns the output buffer with queued outbound MIDI. Outbound events
    /// that do not fit stay queued for the next callback. While an engine
    /// swap is pending nothing is exchanged and the output is empty.
    ///
    /// Categories that do not accept MIDI ignore `midi_in`; categories that
    /// do not produce MIDI discard queued outbound events.
    pub fn process<'a, I>(&mut self, midi_in: I) -> &MidiOutputBuffer
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let shared = &*self.shared;
        self.output.clear();

        let scope = shared.lifecycle.enter_callback();
        if scope.swap_required() {
            shared.lifecycle.request_initialize();
            shared.updater.trigger();
            return &self.output;
        }

        if self.accepts_midi {
            let now = Instant::now();
            let mut received = false;
            for bytes in midi_in {
                if let Some(message) = ShortMessage::from_slice(bytes) {
                    shared.midi_in.push(IncomingMidiEvent { time: now, message });
                    received = true;
                }
            }
            if received {
                shared.updater.trigger();
            }
        }

        if self.produces_midi {
            while !self.output.is_full() {
                match shared.midi_out.pop() {
                    Some(event) => {
                        self.output.push(event);
                    }
                    None => break,
                }
            }
        } else {
            while shared.midi_out.pop().is_some() {}
        }

        drop(scope);
        &self.output
    }
}
