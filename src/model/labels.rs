//! Label registry for multinomial targets.
//!
//! Tracks the ordered set of distinct labels seen during training and maps
//! each to its weight-column slot. Insertion order is the persisted schema:
//! slots are never re-sorted or re-keyed.

use std::collections::HashMap;

/// The implicit catch-all class, always registered first at slot 0.
pub const NEGATIVE_LABEL: &str = "_negative";

/// Insertion-ordered label -> slot map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelRegistry {
    labels: Vec<String>,
    slots: HashMap<String, usize>,
}

impl LabelRegistry {
    /// Registry for a categorical target, seeded with [`NEGATIVE_LABEL`]
    /// at slot 0.
    pub fn categorical() -> Self {
        let mut registry = Self::default();
        registry.register(NEGATIVE_LABEL);
        registry
    }

    /// Rebuild from a persisted label sequence.
    pub(crate) fn from_labels(labels: Vec<String>) -> Self {
        let slots = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), i))
            .collect();
        Self { labels, slots }
    }

    /// Slot of `label`, registering it at the next index if unseen.
    ///
    /// Returns `(slot, newly_added)`; a newly added label requires the
    /// weight store to grow by one slot pair.
    pub fn register(&mut self, label: &str) -> (usize, bool) {
        if let Some(&slot) = self.slots.get(label) {
            return (slot, false);
        }
        let slot = self.labels.len();
        self.labels.push(label.to_owned());
        self.slots.insert(label.to_owned(), slot);
        (slot, true)
    }

    /// Slot of `label`, if registered.
    pub fn slot_of(&self, label: &str) -> Option<usize> {
        self.slots.get(label).copied()
    }

    /// Registered labels in slot order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Number of registered labels (including [`NEGATIVE_LABEL`]).
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns `true` when no labels are registered.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_is_first() {
        let registry = LabelRegistry::categorical();
        assert_eq!(registry.labels(), [NEGATIVE_LABEL]);
        assert_eq!(registry.slot_of(NEGATIVE_LABEL), Some(0));
    }

    #[test]
    fn registration_is_insertion_ordered() {
        let mut registry = LabelRegistry::categorical();
        assert_eq!(registry.register("green"), (1, true));
        assert_eq!(registry.register("red"), (2, true));
        assert_eq!(registry.register("green"), (1, false));
        assert_eq!(registry.labels(), [NEGATIVE_LABEL, "green", "red"]);
    }

    #[test]
    fn lookup_of_unseen_label() {
        let registry = LabelRegistry::categorical();
        assert_eq!(registry.slot_of("blue"), None);
    }

    #[test]
    fn rebuild_preserves_order() {
        let mut registry = LabelRegistry::categorical();
        registry.register("b");
        registry.register("a");
        let restored = LabelRegistry::from_labels(registry.labels().to_vec());
        assert_eq!(restored.labels(), registry.labels());
        assert_eq!(restored.slot_of("a"), Some(2));
    }
}
