//! Integration tests for size changes and exponential growth.

use demesim_core::prelude::*;

/// Iterated growth with rounding after every generation.
fn grow(mut n: usize, g: f64, generations: usize) -> usize {
    for _ in 0..generations {
        n = (n as f64 * g).round() as usize;
    }
    n
}

fn sizes_after(
    demography: DiscreteDemography,
    store: DemeAssignment,
    generations: usize,
) -> Vec<usize> {
    let mut engine = DemographyEngine::new(demography, &store, RngContext::new(42)).unwrap();
    let mut sizes = Vec::new();
    engine
        .run(store, generations, |o| sizes = o.deme_sizes.clone())
        .unwrap();
    sizes
}

#[test]
fn test_single_deme_growth() {
    let g = 1.03;
    let d = DiscreteDemography::builder()
        .growth_rate(SetExponentialGrowth::new(16, 0, g).unwrap())
        .build()
        .unwrap();
    let t = 40;
    let sizes = sizes_after(d, DemeAssignment::uniform(100), 16 + t);
    assert_eq!(sizes, vec![grow(100, g, t)]);
}

#[test]
fn test_two_deme_growth() {
    let (g0, g1) = (1.2, 1.1);
    let d = DiscreteDemography::builder()
        .growth_rate(SetExponentialGrowth::new(7, 0, g0).unwrap())
        .growth_rate(SetExponentialGrowth::new(21, 0, NOGROWTH).unwrap())
        .growth_rate(SetExponentialGrowth::new(33, 1, g1).unwrap())
        .growth_rate(SetExponentialGrowth::new(56, 1, NOGROWTH).unwrap())
        .build()
        .unwrap();
    let sizes = sizes_after(d, DemeAssignment::from_sizes(&[90, 10]), 100);
    assert_eq!(sizes, vec![grow(90, g0, 14), grow(10, g1, 23)]);
}

#[test]
fn test_two_deme_growth_with_hard_reset() {
    let (g0, g1) = (1.2, 1.1);
    let d = DiscreteDemography::builder()
        .growth_rate(SetExponentialGrowth::new(7, 0, g0).unwrap())
        .growth_rate(SetExponentialGrowth::new(33, 1, g1).unwrap())
        .growth_rate(SetExponentialGrowth::new(56, 1, NOGROWTH).unwrap())
        .deme_size(SetDemeSize::new(11, 0, 100))
        .build()
        .unwrap();
    let sizes = sizes_after(d, DemeAssignment::from_sizes(&[90, 10]), 100);
    assert_eq!(sizes, vec![100, grow(10, g1, 23)]);
}

#[test]
fn test_two_deme_growth_without_hard_reset() {
    let (g0, g1) = (1.2, 1.1);
    let d = DiscreteDemography::builder()
        .growth_rate(SetExponentialGrowth::new(7, 0, g0).unwrap())
        .growth_rate(SetExponentialGrowth::new(21, 0, NOGROWTH).unwrap())
        .growth_rate(SetExponentialGrowth::new(33, 1, g1).unwrap())
        .growth_rate(SetExponentialGrowth::new(56, 1, NOGROWTH).unwrap())
        .deme_size(SetDemeSize::new(11, 0, 100).with_growth_reset(false))
        .build()
        .unwrap();
    let sizes = sizes_after(d, DemeAssignment::from_sizes(&[90, 10]), 100);
    // Overridden at 11, then grows in generations 12 to 20.
    assert_eq!(sizes, vec![grow(100, g0, 21 - 12), grow(10, g1, 23)]);
}

#[test]
fn test_deme_can_shrink_to_zero_and_recover() {
    // Deme 1 is refilled from deme 0 after being emptied.
    let d = DiscreteDemography::builder()
        .migration_matrix(MigrationMatrix::new(vec![vec![1.0, 1.0], vec![0.0, 0.0]]).unwrap())
        .deme_size(SetDemeSize::new(2, 1, 0))
        .deme_size(SetDemeSize::new(4, 1, 30))
        .build()
        .unwrap();
    let store = DemeAssignment::from_sizes(&[50, 50]);
    let mut engine = DemographyEngine::new(d, &store, RngContext::new(9)).unwrap();
    let mut history = Vec::new();
    engine
        .run(store, 6, |o| history.push(o.deme_sizes.clone()))
        .unwrap();
    assert_eq!(history[2], vec![50, 0]);
    assert_eq!(history[3], vec![50, 0]);
    assert_eq!(history[4], vec![50, 30]);
    assert_eq!(engine.state().deme_count(), 2);
}

#[test]
fn test_population_size_history() {
    let mut history = vec![50; 5];
    history.extend(vec![20; 3]);
    history.extend(vec![80; 2]);
    let d = DiscreteDemography::from_population_sizes(&history);
    assert_eq!(d.set_deme_sizes().len(), 3);

    let store = DemeAssignment::uniform(50);
    let mut engine = DemographyEngine::new(d, &store, RngContext::new(1)).unwrap();
    let mut sizes = Vec::new();
    engine
        .run(store, history.len(), |o| sizes.push(o.deme_sizes[0]))
        .unwrap();
    assert_eq!(sizes, history);
}
