//! In-process host parameter store.

use std::sync::atomic::{AtomicU32, Ordering};

use mindful_core::{HostParameters, ParameterInfo};

use crate::shared::ParameterListener;

/// Parameter values as a host would hold them.
///
/// Stores one atomic value per [`ParameterInfo`] and echoes every change
/// back through a [`ParameterListener`], the way a host broadcasts
/// `setValueNotifyingHost` to its listeners. Format wrappers that own real
/// host parameters implement [`HostParameters`] themselves instead.
pub struct ParameterBank {
    infos: Vec<ParameterInfo>,
    values: Box<[AtomicU32]>,
    listener: ParameterListener,
}

impl ParameterBank {
    /// Create a bank holding each parameter's default value.
    pub fn new(infos: Vec<ParameterInfo>, listener: ParameterListener) -> Self {
        let values = infos
            .iter()
            .map(|info| AtomicU32::new(info.default_value.to_bits()))
            .collect();
        Self {
            infos,
            values,
            listener,
        }
    }

    /// Parameter descriptors, in index order.
    pub fn infos(&self) -> &[ParameterInfo] {
        &self.infos
    }

    /// Find a parameter's index by id.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.infos.iter().position(|info| info.id == id)
    }

    /// Apply a host-side change (automation, generic editor).
    ///
    /// Same path as [`set_value_notifying_host`](HostParameters::set_value_notifying_host).
    pub fn set_value_from_host(&self, index: usize, value: f32) {
        self.set_value_notifying_host(index, value);
    }
}

impl HostParameters for ParameterBank {
    fn count(&self) -> usize {
        self.infos.len()
    }

    fn value(&self, index: usize) -> Option<f32> {
        self.values
            .get(index)
            .map(|value| f32::from_bits(value.load(Ordering::Acquire)))
    }

    fn set_value_notifying_host(&self, index: usize, value: f32) {
        let (Some(info), Some(slot)) = (self.infos.get(index), self.values.get(index)) else {
            log::warn!("Ignoring value for unknown parameter index {index}");
            return;
        };
        let value = info.clamp(value);
        slot.store(value.to_bits(), Ordering::Release);
        self.listener.parameter_value_changed(index, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::Shared;
    use std::sync::Arc;

    fn bank() -> (ParameterBank, Arc<Shared>) {
        let infos = vec![
            ParameterInfo::new("gain", "Gain").with_default(0.5),
            ParameterInfo::new("cutoff", "Cutoff").with_range(20.0, 20000.0).with_default(1000.0),
        ];
        let shared = Arc::new(Shared::new(8, infos.iter().map(|i| i.default_value)));
        let bank = ParameterBank::new(infos, ParameterListener::new(Arc::clone(&shared)));
        (bank, shared)
    }

    #[test]
    fn test_defaults() {
        let (bank, _) = bank();
        assert_eq!(bank.count(), 2);
        assert_eq!(bank.value(0), Some(0.5));
        assert_eq!(bank.value(1), Some(1000.0));
        assert_eq!(bank.value(2), None);
        assert_eq!(bank.index_of("cutoff"), Some(1));
    }

    #[test]
    fn test_set_value_notifies_listener() {
        let (bank, shared) = bank();
        bank.set_value_notifying_host(0, 0.8);

        assert_eq!(bank.value(0), Some(0.8));
        assert!(shared.updater.is_pending());
        assert_eq!(shared.readouts.drain_dirty().collect::<Vec<_>>(), vec![(0, 0.8)]);
    }

    #[test]
    fn test_values_are_clamped() {
        let (bank, shared) = bank();
        bank.set_value_from_host(1, 5.0);
        assert_eq!(bank.value(1), Some(20.0));
        assert_eq!(shared.readouts.drain_dirty().collect::<Vec<_>>(), vec![(1, 20.0)]);
    }

    #[test]
    fn test_unknown_index_ignored() {
        let (bank, shared) = bank();
        bank.set_value_notifying_host(9, 1.0);
        assert!(!shared.updater.is_pending());
    }
}
