//! Host parameter interface.

/// Parameters as the host sees them, addressed by index.
///
/// Changes made through [`set_value_notifying_host`](Self::set_value_notifying_host)
/// come back to the plugin through the host's change notification, which
/// is what feeds the parameter dirty-list. The control thread never writes
/// the state map for a UI-originated change directly.
pub trait HostParameters: Send + Sync {
    /// Number of parameters.
    fn count(&self) -> usize;

    /// Current plain value, or `None` for an out-of-range index.
    fn value(&self, index: usize) -> Option<f32>;

    /// Set a plain value and let the host broadcast the change.
    fn set_value_notifying_host(&self, index: usize, value: f32);
}
