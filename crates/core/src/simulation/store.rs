//! Individuals of the parental generation, grouped by deme.
//!
//! The engine never owns individuals. It reads deme membership through
//! [`IndividualStore`] and hands back parent indices into the same store.

use crate::errors::IndexError;
use crate::events::DemeId;
use crate::simulation::GenerationOutcome;

/// Read access to the current generation's deme labels.
pub trait IndividualStore {
    /// Total number of individuals.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One more than the largest deme id with a slot in the store.
    fn deme_count(&self) -> usize;

    /// Indices of the individuals living in `deme`, in ascending order.
    ///
    /// Demes the store has never seen are empty.
    fn individuals(&self, deme: DemeId) -> &[usize];

    /// Deme of individual `index`.
    fn deme_of(&self, index: usize) -> Result<DemeId, IndexError>;

    /// Number of individuals in each deme.
    fn deme_sizes(&self) -> Vec<usize> {
        (0..self.deme_count())
            .map(|d| self.individuals(d).len())
            .collect()
    }
}

/// Vector-backed [`IndividualStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemeAssignment {
    labels: Vec<DemeId>,
    by_deme: Vec<Vec<usize>>,
}

impl DemeAssignment {
    /// Store with `labels[i]` the deme of individual `i`.
    pub fn from_labels(labels: Vec<DemeId>) -> Self {
        let deme_count = labels.iter().max().map_or(0, |&d| d + 1);
        let mut by_deme = vec![Vec::new(); deme_count];
        for (index, &deme) in labels.iter().enumerate() {
            by_deme[deme].push(index);
        }
        Self { labels, by_deme }
    }

    /// `size` individuals, all in deme 0.
    pub fn uniform(size: usize) -> Self {
        Self::from_labels(vec![0; size])
    }

    /// Contiguous blocks: the first `sizes[0]` individuals in deme 0, and so on.
    pub fn from_sizes(sizes: &[usize]) -> Self {
        let labels = sizes
            .iter()
            .enumerate()
            .flat_map(|(deme, &n)| std::iter::repeat_n(deme, n))
            .collect();
        let mut store = Self::from_labels(labels);
        // Keep trailing empty demes.
        store.by_deme.resize(store.by_deme.len().max(sizes.len()), Vec::new());
        store
    }

    /// Offspring of `outcome`, labelled by the deme each was born into.
    pub fn from_outcome(outcome: &GenerationOutcome) -> Self {
        let labels = outcome.matings.iter().map(|m| m.offspring_deme).collect();
        let mut store = Self::from_labels(labels);
        store
            .by_deme
            .resize(store.by_deme.len().max(outcome.deme_sizes.len()), Vec::new());
        store
    }

    /// Move individual `index` to `deme`.
    pub fn set_deme(&mut self, index: usize, deme: DemeId) -> Result<(), IndexError> {
        let old = self.deme_of(index)?;
        if old == deme {
            return Ok(());
        }
        if let Ok(pos) = self.by_deme[old].binary_search(&index) {
            self.by_deme[old].remove(pos);
        }
        if deme >= self.by_deme.len() {
            self.by_deme.resize(deme + 1, Vec::new());
        }
        let slot = &mut self.by_deme[deme];
        let pos = slot.binary_search(&index).unwrap_or_else(|p| p);
        slot.insert(pos, index);
        self.labels[index] = deme;
        Ok(())
    }

    pub fn labels(&self) -> &[DemeId] {
        &self.labels
    }
}

impl IndividualStore for DemeAssignment {
    fn len(&self) -> usize {
        self.labels.len()
    }

    fn deme_count(&self) -> usize {
        self.by_deme.len()
    }

    fn individuals(&self, deme: DemeId) -> &[usize] {
        self.by_deme.get(deme).map(Vec::as_slice).unwrap_or(&[])
    }

    fn deme_of(&self, index: usize) -> Result<DemeId, IndexError> {
        self.labels.get(index).copied().ok_or(IndexError {
            index,
            len: self.labels.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_labels() {
        let store = DemeAssignment::from_labels(vec![1, 0, 1, 2]);
        assert_eq!(store.len(), 4);
        assert_eq!(store.deme_count(), 3);
        assert_eq!(store.individuals(1), &[0, 2]);
        assert_eq!(store.deme_sizes(), vec![1, 2, 1]);
        assert!(store.individuals(7).is_empty());
    }

    #[test]
    fn test_from_sizes_keeps_empty_demes() {
        let store = DemeAssignment::from_sizes(&[2, 0, 1, 0]);
        assert_eq!(store.deme_sizes(), vec![2, 0, 1, 0]);
        assert_eq!(store.deme_of(2), Ok(2));
    }

    #[test]
    fn test_deme_of_out_of_range() {
        let store = DemeAssignment::uniform(3);
        assert_eq!(store.deme_of(3), Err(IndexError { index: 3, len: 3 }));
    }

    #[test]
    fn test_set_deme() {
        let mut store = DemeAssignment::uniform(4);
        store.set_deme(2, 1).unwrap();
        store.set_deme(0, 1).unwrap();
        assert_eq!(store.individuals(0), &[1, 3]);
        assert_eq!(store.individuals(1), &[0, 2]);
        assert_eq!(store.labels(), &[1, 0, 1, 0]);
        assert!(store.set_deme(9, 0).is_err());
    }
}
