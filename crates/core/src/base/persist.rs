//! Binary persistence for events, matrices and mating records.

use crate::demography::{DiscreteDemography, MigrationMatrix};
use crate::errors::PersistError;
use crate::events::{
    DemographicEvent, MassMigration, SetDemeSize, SetExponentialGrowth, SetMigrationRates,
    SetSelfingRate,
};
use crate::simulation::{GenerationOutcome, MatingEvent};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Reversible encoding to bytes.
///
/// Types that validate on construction validate again when decoded, so a
/// corrupted or hand-edited buffer cannot produce an invalid value.
pub trait Persist: Serialize + DeserializeOwned {
    fn to_bytes(&self) -> Result<Vec<u8>, PersistError> {
        bincode::serialize(self).map_err(|e| PersistError::Encode(e.to_string()))
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, PersistError> {
        bincode::deserialize(bytes).map_err(|e| PersistError::Decode(e.to_string()))
    }
}

impl Persist for SetDemeSize {}
impl Persist for SetExponentialGrowth {}
impl Persist for SetSelfingRate {}
impl Persist for SetMigrationRates {}
impl Persist for MassMigration {}
impl Persist for DemographicEvent {}
impl Persist for MigrationMatrix {}
impl Persist for DiscreteDemography {}
impl Persist for MatingEvent {}
impl Persist for GenerationOutcome {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mass_migration_keeps_flags() {
        let m = MassMigration::copy_number(4, 2, 0, 17)
            .unwrap()
            .with_growth_reset(false);
        let back = MassMigration::from_bytes(&m.to_bytes().unwrap()).unwrap();
        assert_eq!(back, m);
        assert!(!back.is_move());
        assert!(!back.resets_growth_rate());
        assert_eq!(back.number(), 17);
    }

    #[test]
    fn test_matrix_keeps_scaling() {
        let m = MigrationMatrix::with_scaling(vec![vec![2.0, 0.0], vec![0.5, 1.0]], true).unwrap();
        let back = MigrationMatrix::from_bytes(&m.to_bytes().unwrap()).unwrap();
        assert_eq!(back, m);
        assert!(back.is_scaled());
    }

    #[test]
    fn test_truncated_bytes_fail() {
        let m = MigrationMatrix::identity(3).unwrap();
        let bytes = m.to_bytes().unwrap();
        let result = MigrationMatrix::from_bytes(&bytes[..bytes.len() / 2]);
        assert!(matches!(result, Err(PersistError::Decode(_))));
    }

    #[test]
    fn test_decoding_revalidates_matrix() {
        let m = MigrationMatrix::identity(2).unwrap();
        let mut bytes = m.to_bytes().unwrap();
        // Zero every weight; the trailing byte is the scaled flag.
        let weights_end = bytes.len() - 1;
        for b in &mut bytes[weights_end - 32..weights_end] {
            *b = 0;
        }
        assert!(MigrationMatrix::from_bytes(&bytes).is_err());
    }
}
