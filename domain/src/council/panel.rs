//! Anonymization panel: the label ↔ backend bijection for one run
//!
//! Built once per council run with a shuffled order, then passed by value
//! through the critique and consensus steps. Critics only ever see labels,
//! so scoring cannot be biased by model identity or presentation order.

use crate::core::backend::BackendId;
use rand::seq::SliceRandom;

/// Immutable mapping between anonymous labels ("A", "B", ...) and backends
#[derive(Debug, Clone)]
pub struct Panel {
    // Shuffled order; index i carries label ('A' + i)
    entries: Vec<BackendId>,
}

impl Panel {
    /// Build a panel with a randomly shuffled label assignment
    pub fn shuffled(mut backends: Vec<BackendId>) -> Self {
        backends.shuffle(&mut rand::rng());
        Self { entries: backends }
    }

    /// Build a panel preserving the given order (deterministic, for tests)
    pub fn ordered(backends: Vec<BackendId>) -> Self {
        Self { entries: backends }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Label assigned to the given backend, if it is on the panel
    pub fn label_of(&self, backend: &BackendId) -> Option<String> {
        self.entries
            .iter()
            .position(|b| b == backend)
            .map(Self::label_for_index)
    }

    /// Backend behind the given label
    pub fn backend_of(&self, label: &str) -> Option<&BackendId> {
        let index = Self::index_for_label(label)?;
        self.entries.get(index)
    }

    /// All (label, backend) pairs in label order
    pub fn labeled(&self) -> impl Iterator<Item = (String, &BackendId)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, b)| (Self::label_for_index(i), b))
    }

    /// Labels in order, useful for deterministic tie-breaking
    pub fn labels(&self) -> Vec<String> {
        (0..self.entries.len()).map(Self::label_for_index).collect()
    }

    fn label_for_index(index: usize) -> String {
        // 26 participants is far beyond any configured council size
        ((b'A' + (index % 26) as u8) as char).to_string()
    }

    fn index_for_label(label: &str) -> Option<usize> {
        let c = label.chars().next()?;
        if label.len() == 1 && c.is_ascii_uppercase() {
            Some((c as u8 - b'A') as usize)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::backend::Provider;

    fn backends(n: usize) -> Vec<BackendId> {
        (0..n)
            .map(|i| BackendId::new(Provider::Groq, format!("model-{i}"), format!("Model {i}")))
            .collect()
    }

    #[test]
    fn test_bijection() {
        let panel = Panel::ordered(backends(3));
        for (label, backend) in panel.labeled() {
            assert_eq!(panel.label_of(backend), Some(label.clone()));
            assert_eq!(panel.backend_of(&label), Some(backend));
        }
    }

    #[test]
    fn test_labels_sequential() {
        let panel = Panel::ordered(backends(4));
        assert_eq!(panel.labels(), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_shuffled_preserves_membership() {
        let original = backends(5);
        let panel = Panel::shuffled(original.clone());
        assert_eq!(panel.len(), 5);
        for backend in &original {
            assert!(panel.label_of(backend).is_some());
        }
    }

    #[test]
    fn test_unknown_label() {
        let panel = Panel::ordered(backends(2));
        assert!(panel.backend_of("Z").is_none());
        assert!(panel.backend_of("AA").is_none());
    }
}
