//! Per-offspring parentage records produced by one generation.

use crate::events::DemeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the two parents of an offspring relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatingType {
    /// Both parents are the same individual.
    Selfing,
    /// Two independently drawn parents.
    Outcrossing,
}

impl fmt::Display for MatingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Selfing => write!(f, "selfing"),
            Self::Outcrossing => write!(f, "outcrossing"),
        }
    }
}

/// Parentage of one offspring.
///
/// `parent1` and `parent2` index into the parental [`IndividualStore`](super::IndividualStore).
/// Parent demes are the demes the parents were drawn from, after any mass
/// migration of the generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatingEvent {
    pub offspring_deme: DemeId,
    pub parent1_deme: DemeId,
    pub parent2_deme: DemeId,
    pub mating_type: MatingType,
    pub parent1: usize,
    pub parent2: usize,
}

impl MatingEvent {
    pub fn is_selfing(&self) -> bool {
        self.mating_type == MatingType::Selfing
    }

    /// True if either parent came from outside the offspring's deme.
    pub fn is_migrant(&self) -> bool {
        self.parent1_deme != self.offspring_deme || self.parent2_deme != self.offspring_deme
    }
}

/// Everything one generation produces.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GenerationOutcome {
    /// Generation the events were applied in.
    pub generation: usize,
    /// Finalized size of every deme, including empty ones.
    pub deme_sizes: Vec<usize>,
    /// One record per offspring, grouped by offspring deme in ascending order.
    pub matings: Vec<MatingEvent>,
}

impl GenerationOutcome {
    pub fn total_size(&self) -> usize {
        self.deme_sizes.iter().sum()
    }

    /// Number of parents drawn from outside the offspring's deme.
    pub fn migrant_parent_count(&self) -> usize {
        self.matings
            .iter()
            .map(|m| {
                usize::from(m.parent1_deme != m.offspring_deme)
                    + usize::from(m.parent2_deme != m.offspring_deme)
            })
            .sum()
    }

    pub fn selfing_count(&self) -> usize {
        self.matings.iter().filter(|m| m.is_selfing()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mating(offspring: DemeId, p1: DemeId, p2: DemeId) -> MatingEvent {
        MatingEvent {
            offspring_deme: offspring,
            parent1_deme: p1,
            parent2_deme: p2,
            mating_type: MatingType::Outcrossing,
            parent1: 0,
            parent2: 1,
        }
    }

    #[test]
    fn test_migrant_counts() {
        let outcome = GenerationOutcome {
            generation: 0,
            deme_sizes: vec![1, 2],
            matings: vec![mating(0, 0, 0), mating(1, 0, 1), mating(1, 0, 0)],
        };
        assert_eq!(outcome.total_size(), 3);
        assert_eq!(outcome.migrant_parent_count(), 3);
        assert!(!outcome.matings[0].is_migrant());
        assert!(outcome.matings[1].is_migrant());
        assert_eq!(outcome.selfing_count(), 0);
    }

    #[test]
    fn test_json_round_trip() {
        let m = MatingEvent {
            mating_type: MatingType::Selfing,
            parent2: 0,
            ..mating(2, 2, 2)
        };
        let json = serde_json::to_string(&m).unwrap();
        let back: MatingEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
        assert!(back.is_selfing());
    }
}
