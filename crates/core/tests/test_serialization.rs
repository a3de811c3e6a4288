//! Integration tests for JSON configuration files and binary persistence.

use demesim_core::demography::{DemographyParts, MigrationMatrixInput};
use demesim_core::prelude::*;
use std::io::Write;

fn sample_demography() -> DiscreteDemography {
    DiscreteDemography::builder()
        .migration_matrix(
            MigrationMatrix::with_scaling(
                vec![
                    vec![0.9, 0.1, 0.0],
                    vec![0.1, 0.9, 0.0],
                    vec![0.0, 0.0, 1.0],
                ],
                true,
            )
            .unwrap(),
        )
        .deme_size(SetDemeSize::new(3, 2, 40).with_growth_reset(false))
        .growth_rate(SetExponentialGrowth::new(1, 0, 1.05).unwrap())
        .selfing_rate(SetSelfingRate::new(2, 1, 0.25).unwrap())
        .migration_rates(SetMigrationRates::row(4, 2, vec![0.5, 0.0, 0.5]).unwrap())
        .mass_migration(MassMigration::move_individuals(5, 0, 2, 0.2).unwrap())
        .mass_migration(
            MassMigration::copy_number(5, 1, 2, 7)
                .unwrap()
                .with_growth_reset(false),
        )
        .build()
        .unwrap()
}

#[test]
fn test_event_round_trips() {
    let events: Vec<DemographicEvent> = sample_demography().events().collect();
    assert_eq!(events.len(), 6);
    for event in events {
        let back = DemographicEvent::from_bytes(&event.to_bytes().unwrap()).unwrap();
        assert_eq!(back, event);
        assert_eq!(back.category(), event.category());
    }
}

#[test]
fn test_demography_bincode_round_trip() {
    let d = sample_demography();
    let back = DiscreteDemography::from_bytes(&d.to_bytes().unwrap()).unwrap();
    assert_eq!(back, d);
    assert!(back.migmatrix().unwrap().is_scaled());
    // Copies still precede moves.
    assert!(!back.mass_migrations()[0].is_move());
    assert!(!back.mass_migrations()[0].resets_growth_rate());
}

#[test]
fn test_demography_json_round_trip() {
    let d = sample_demography();
    let json = serde_json::to_string(&d).unwrap();
    let back: DiscreteDemography = serde_json::from_str(&json).unwrap();
    assert_eq!(back, d);
}

#[test]
fn test_decoding_revalidates_event_set() {
    let g = SetExponentialGrowth::new(0, 0, 1.1).unwrap();
    let parts = DemographyParts {
        set_growth_rates: vec![g, g],
        ..Default::default()
    };
    let bytes = bincode::serialize(&parts).unwrap();
    assert!(matches!(
        DiscreteDemography::from_bytes(&bytes),
        Err(PersistError::Decode(_))
    ));
}

#[test]
fn test_mating_event_round_trip() {
    let store = DemeAssignment::uniform(20);
    let mut engine =
        DemographyEngine::new(DiscreteDemography::empty(), &store, RngContext::new(5)).unwrap();
    let outcome = engine.advance(&store).unwrap();
    for m in &outcome.matings {
        assert_eq!(MatingEvent::from_bytes(&m.to_bytes().unwrap()).unwrap(), *m);
    }
    let back = GenerationOutcome::from_bytes(&outcome.to_bytes().unwrap()).unwrap();
    assert_eq!(back, outcome);
}

#[test]
fn test_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("demography.json");
    let d = sample_demography();
    DemographyConfig::from(&d).to_file(&path).unwrap();

    let config = DemographyConfig::from_file(&path).unwrap();
    assert!(matches!(config.migmatrix, Some(MigrationMatrixInput::Scaled(_, true))));
    assert_eq!(config.build().unwrap(), d);
}

#[test]
fn test_config_file_handwritten() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "migmatrix": [[0.0, 1.0], [1.0, 0.0]],
            "mass_migrations": [
                {{"when": 0, "source": 0, "destination": 1, "fraction": 0.5, "kind": "Move"}}
            ],
            "set_selfing_rates": [{{"when": 0, "deme": 1, "rate": 0.5}}]
        }}"#
    )
    .unwrap();

    let d = DemographyConfig::from_file(file.path()).unwrap().build().unwrap();
    assert!(!d.migmatrix().unwrap().is_scaled());

    let store = DemeAssignment::uniform(100);
    let mut engine = DemographyEngine::new(d, &store, RngContext::new(11)).unwrap();
    let outcome = engine.advance(&store).unwrap();
    assert_eq!(outcome.deme_sizes, vec![50, 50]);
}

#[test]
fn test_config_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    let err = DemographyConfig::from_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, DemographyError::Io(_)));
    assert!(err.is_configuration());
}
