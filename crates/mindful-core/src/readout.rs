//! Parameter dirty-list for propagating real-time parameter changes.
//!
//! Every exposed parameter owns one [`ParameterReadout`] cell. The real-time
//! thread publishes `{value, dirty = true}` into the cell; the control thread
//! later exchanges it with `{0.0, dirty = false}` and keeps the previous
//! readout only if it was dirty. A readout that comes back clean carries an
//! arbitrary value and must be ignored.
//!
//! The value and the dirty flag are packed into one `AtomicU64`, so a reader
//! can never observe one half of the pair without the other:
//!
//! ```text
//! bit 63 ........ 33 | 32    | 31 ........ 0
//!       unused       | dirty | f32 bits
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

const DIRTY_BIT: u64 = 1 << 32;
const VALUE_MASK: u64 = 0xFFFF_FFFF;

/// A parameter value together with its dirty flag.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ParameterReadout {
    /// Latest value written by the real-time thread.
    pub value: f32,
    /// Whether the value was written since the last drain.
    pub dirty: bool,
}

impl ParameterReadout {
    /// A clean readout with the given value.
    pub const fn clean(value: f32) -> Self {
        Self { value, dirty: false }
    }

    #[inline]
    fn pack(self) -> u64 {
        let bits = u64::from(self.value.to_bits());
        if self.dirty {
            bits | DIRTY_BIT
        } else {
            bits
        }
    }

    #[inline]
    fn unpack(raw: u64) -> Self {
        Self {
            value: f32::from_bits((raw & VALUE_MASK) as u32),
            dirty: raw & DIRTY_BIT != 0,
        }
    }
}

/// Fixed-size list of readout cells, indexed like the host's parameters.
pub struct ParameterReadouts {
    cells: Box<[AtomicU64]>,
}

impl ParameterReadouts {
    /// Create one cell per initial value. All cells start clean.
    pub fn new(initial: impl IntoIterator<Item = f32>) -> Self {
        let cells = initial
            .into_iter()
            .map(|value| AtomicU64::new(ParameterReadout::clean(value).pack()))
            .collect();
        Self { cells }
    }

    /// Number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the list has no cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Store `{value, dirty = true}` at `index`, replacing the cell wholesale.
    ///
    /// Real-time thread only. Wait-free. Out-of-range indices are ignored.
    #[inline]
    pub fn publish(&self, index: usize, value: f32) {
        if let Some(cell) = self.cells.get(index) {
            let readout = ParameterReadout { value, dirty: true };
            cell.store(readout.pack(), Ordering::Release);
        }
    }

    /// Exchange the cell at `index` with a clean zero and return what it held.
    ///
    /// Control thread only. Returns `None` for out-of-range indices.
    pub fn drain(&self, index: usize) -> Option<ParameterReadout> {
        let cell = self.cells.get(index)?;
        let previous = cell.swap(ParameterReadout::clean(0.0).pack(), Ordering::AcqRel);
        Some(ParameterReadout::unpack(previous))
    }

    /// Drain every cell in index order, yielding what each one held.
    ///
    /// Control thread only. Clean readouts carry no meaningful value.
    pub fn drain_all(&self) -> impl Iterator<Item = (usize, ParameterReadout)> + '_ {
        (0..self.cells.len()).filter_map(move |index| self.drain(index).map(|r| (index, r)))
    }

    /// Drain every cell, yielding `(index, value)` for the dirty ones only.
    ///
    /// Control thread only.
    pub fn drain_dirty(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.drain_all()
            .filter(|(_, readout)| readout.dirty)
            .map(|(index, readout)| (index, readout.value))
    }
}
