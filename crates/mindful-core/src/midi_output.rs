//! Pre-allocated MIDI output buffer for the audio callback.
//!
//! This module provides `MidiOutputBuffer`, which pre-allocates its event
//! slots so that draining outbound MIDI never allocates during processing.

use crate::midi::OutgoingMidiEvent;

/// Pre-allocated per-callback buffer of outbound MIDI events.
///
/// The callback clears it, fills it from the outbound queue until it is
/// full, and hands it to the host. Events that do not fit stay queued for
/// the next callback.
pub struct MidiOutputBuffer {
    /// Event storage, capacity reserved up front.
    events: Vec<OutgoingMidiEvent>,
    /// Maximum number of events per callback
    max_slots: usize,
}

impl MidiOutputBuffer {
    /// Default number of event slots per callback.
    pub const DEFAULT_SLOTS: usize = 128;

    /// Create a buffer with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_SLOTS)
    }

    /// Create a buffer with the specified capacity.
    ///
    /// Pre-allocates all slots to avoid heap allocation during processing.
    pub fn with_capacity(slots: usize) -> Self {
        Self {
            events: Vec::with_capacity(slots),
            max_slots: slots,
        }
    }

    /// Clear the buffer for reuse. O(1) operation.
    #[inline]
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Append an event.
    ///
    /// Returns `false` and leaves the buffer unchanged when it is full.
    #[inline]
    pub fn push(&mut self, event: OutgoingMidiEvent) -> bool {
        if self.is_full() {
            return false;
        }
        self.events.push(event);
        true
    }

    /// Whether another event fits.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.events.len() >= self.max_slots
    }

    /// Get the buffer's slot capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.max_slots
    }

    /// Get number of events currently held.
    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the buffer holds no events.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events in emission order.
    #[inline]
    pub fn events(&self) -> &[OutgoingMidiEvent] {
        &self.events
    }
}

impl Default for MidiOutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}
