//! Generation advance: apply due events, resolve sizes, sample parents.
//!
//! One call to [`DemographyEngine::advance`] performs, in order:
//!
//! 1. size overrides
//! 2. growth rate changes
//! 3. selfing rate changes
//! 4. migration weight changes
//! 5. exponential growth of every deme not overridden in step 1
//! 6. mass migrations, copies before moves
//! 7. parent sampling for every offspring slot
//!
//! Steps 1 to 6 run on the caller's thread. Step 7 runs on the rayon pool;
//! each slot draws from its own keyed stream, so the result does not depend
//! on the number of threads.

use crate::base::RngContext;
use crate::demography::event_set::FRACTION_TOLERANCE;
use crate::demography::{DiscreteDemography, EventSchedule};
use crate::errors::{ConfigurationError, DemographyError, MigrationError};
use crate::events::{DemeId, MassMigration};
use crate::simulation::{
    DemeAssignment, DemographicState, GenerationOutcome, IndividualStore, MatingEvent, MatingType,
};
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Drives a [`DiscreteDemography`] forward one generation at a time.
#[derive(Debug, Clone)]
pub struct DemographyEngine {
    /// Events not yet applied
    schedule: EventSchedule,
    /// Current deme table and migration weights
    state: DemographicState,
    /// Seed and stream derivation
    rng: RngContext,
    /// Generation the next call to `advance` simulates
    generation: usize,
    /// Per-deme counts the next parental store must have
    expected_sizes: Vec<usize>,
}

impl DemographyEngine {
    /// Create an engine whose first generation is 0.
    pub fn new<S>(
        demography: DiscreteDemography,
        store: &S,
        rng: RngContext,
    ) -> Result<Self, ConfigurationError>
    where
        S: IndividualStore + ?Sized,
    {
        Self::starting_at(demography, store, rng, 0)
    }

    /// Create an engine whose first generation is `start`.
    ///
    /// Fails if an event is scheduled before `start`, or if `store` places
    /// individuals in a deme outside the migration matrix.
    pub fn starting_at<S>(
        demography: DiscreteDemography,
        store: &S,
        rng: RngContext,
        start: usize,
    ) -> Result<Self, ConfigurationError>
    where
        S: IndividualStore + ?Sized,
    {
        if let Some(when) = demography.first_event_generation().filter(|&w| w < start) {
            return Err(ConfigurationError::EventBeforeStart { when, start });
        }

        let occupied = (0..store.deme_count())
            .rev()
            .find(|&d| !store.individuals(d).is_empty());
        let deme_count = match demography.migmatrix() {
            Some(matrix) => {
                if let Some(deme) = occupied.filter(|&d| d >= matrix.dimension()) {
                    return Err(ConfigurationError::MigrationMatrixTooSmall {
                        deme,
                        dimension: matrix.dimension(),
                    });
                }
                matrix.dimension()
            }
            None => {
                let from_store = occupied.map_or(0, |d| d + 1);
                let from_events = demography.max_deme().map_or(0, |d| d + 1);
                from_store.max(from_events).max(1)
            }
        };

        let sizes: Vec<usize> = (0..deme_count)
            .map(|d| store.individuals(d).len())
            .collect();
        let state = DemographicState::new(&sizes, deme_count, demography.migmatrix().cloned());
        debug!(
            seed = rng.seed(),
            start,
            demes = deme_count,
            "demography engine created"
        );

        Ok(Self {
            schedule: demography.schedule(),
            state,
            rng,
            generation: start,
            expected_sizes: sizes,
        })
    }

    /// Generation the next [`advance`](Self::advance) will simulate.
    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn state(&self) -> &DemographicState {
        &self.state
    }

    pub fn rng(&self) -> &RngContext {
        &self.rng
    }

    /// Number of future generations that still have events.
    pub fn pending_generations(&self) -> usize {
        self.schedule.len()
    }

    /// Simulate one generation with `store` as the parental population.
    pub fn advance<S>(&mut self, store: &S) -> Result<GenerationOutcome, DemographyError>
    where
        S: IndividualStore + ?Sized,
    {
        let generation = self.generation;
        self.check_store(store)?;

        let start_sizes = self.state.sizes();
        let mut pool = ParentalPool::from_store(store, self.state.deme_count());

        if let Some(events) = self.schedule.take(generation) {
            trace!(generation, "applying demographic events");
            check_move_commitments(generation, &events.mass_migrations, &start_sizes)?;
            let overridden = self.state.apply_deme_sizes(&events.deme_sizes);
            self.state.apply_growth_rates(&events.growth_rates);
            self.state.apply_selfing_rates(&events.selfing_rates);
            self.state.apply_migration_rates(&events.migration_rates)?;
            self.state.apply_growth(&overridden);

            let mut rng = self.rng.generation_rng(generation);
            for event in &events.mass_migrations {
                let start = start_sizes.get(event.source()).copied().unwrap_or(0);
                let requested = event.transfer_count(start);
                self.state.apply_mass_migration(event, requested);
                pool.transfer(event, requested, &mut rng);
            }
        } else {
            self.state.apply_growth(&[]);
        }

        let deme_sizes = self.state.sizes();
        debug!(generation, sizes = ?deme_sizes, "deme sizes finalized");

        let matings = self.sample_parents(generation, &pool)?;

        self.expected_sizes = deme_sizes.clone();
        self.generation += 1;
        Ok(GenerationOutcome {
            generation,
            deme_sizes,
            matings,
        })
    }

    /// Advance `generations` times, relabelling offspring into a fresh store
    /// after each generation. `observe` sees every outcome.
    pub fn run<F>(
        &mut self,
        mut store: DemeAssignment,
        generations: usize,
        mut observe: F,
    ) -> Result<DemeAssignment, DemographyError>
    where
        F: FnMut(&GenerationOutcome),
    {
        for _ in 0..generations {
            let outcome = self.advance(&store)?;
            observe(&outcome);
            store = DemeAssignment::from_outcome(&outcome);
        }
        Ok(store)
    }

    fn check_store<S>(&self, store: &S) -> Result<(), DemographyError>
    where
        S: IndividualStore + ?Sized,
    {
        let demes = self.expected_sizes.len().max(store.deme_count());
        for deme in 0..demes {
            let expected = self.expected_sizes.get(deme).copied().unwrap_or(0);
            let found = store.individuals(deme).len();
            if expected != found {
                return Err(DemographyError::PopulationMismatch {
                    generation: self.generation,
                    deme,
                    expected,
                    found,
                });
            }
        }
        Ok(())
    }

    fn sample_parents(
        &self,
        generation: usize,
        pool: &ParentalPool,
    ) -> Result<Vec<MatingEvent>, MigrationError> {
        let mut samplers = Vec::new();
        let mut ends = Vec::new();
        let mut total = 0;
        for deme in self.state.demes().iter().filter(|d| d.size > 0) {
            let sampler =
                DemeSampler::new(generation, deme.id, deme.selfing_rate, &self.state, pool)?;
            samplers.push(sampler);
            total += deme.size;
            ends.push(total);
        }

        let matings = (0..total)
            .into_par_iter()
            .map(|slot| {
                let i = ends.partition_point(|&end| end <= slot);
                let mut rng = self.rng.offspring_rng(generation, slot);
                samplers[i].sample(pool, &mut rng)
            })
            .collect();
        Ok(matings)
    }
}

/// Fails if the moves out of any source need more individuals than it held
/// at the start of the generation. Rounding fractions up may still ask for
/// one or two extra; those moves are clamped when applied.
fn check_move_commitments(
    generation: usize,
    events: &[MassMigration],
    start_sizes: &[usize],
) -> Result<(), MigrationError> {
    let mut demand: BTreeMap<DemeId, (usize, f64)> = BTreeMap::new();
    for event in events.iter().filter(|e| e.is_move()) {
        let start = start_sizes.get(event.source()).copied().unwrap_or(0);
        let (requested, exact) = demand.entry(event.source()).or_default();
        *requested += event.transfer_count(start);
        *exact += if event.number() > 0 {
            event.number() as f64
        } else {
            event.fraction() * start as f64
        };
    }
    for (source_deme, (requested, exact)) in demand {
        let available = start_sizes.get(source_deme).copied().unwrap_or(0);
        if exact > available as f64 * (1.0 + FRACTION_TOLERANCE) {
            return Err(MigrationError::OvercommittedMoves {
                generation,
                source_deme,
                requested,
                available,
            });
        }
    }
    Ok(())
}

/// Parents available to each deme after mass migration.
#[derive(Debug, Clone)]
struct ParentalPool {
    by_deme: Vec<Vec<usize>>,
}

impl ParentalPool {
    fn from_store<S>(store: &S, deme_count: usize) -> Self
    where
        S: IndividualStore + ?Sized,
    {
        let count = deme_count.max(store.deme_count());
        Self {
            by_deme: (0..count).map(|d| store.individuals(d).to_vec()).collect(),
        }
    }

    fn members(&self, deme: DemeId) -> &[usize] {
        self.by_deme.get(deme).map(Vec::as_slice).unwrap_or(&[])
    }

    fn counts(&self, deme_count: usize) -> Vec<usize> {
        (0..deme_count).map(|d| self.members(d).len()).collect()
    }

    /// Relabel up to `count` randomly chosen parents of the source deme.
    fn transfer(&mut self, event: &MassMigration, count: usize, rng: &mut Xoshiro256PlusPlus) {
        let needed = event.source().max(event.destination()) + 1;
        if self.by_deme.len() < needed {
            self.by_deme.resize(needed, Vec::new());
        }

        let source = &mut self.by_deme[event.source()];
        let amount = count.min(source.len());
        let mut picked = rand::seq::index::sample(rng, source.len(), amount).into_vec();
        picked.sort_unstable();
        let chosen: Vec<usize> = picked.iter().map(|&i| source[i]).collect();

        if event.is_move() {
            let mut keep = vec![true; source.len()];
            for &i in &picked {
                keep[i] = false;
            }
            let mut flags = keep.into_iter();
            source.retain(|_| flags.next().unwrap_or(true));
        }
        self.by_deme[event.destination()].extend(chosen);
    }
}

/// Precomputed parent-drawing rule for one offspring deme.
#[derive(Debug, Clone)]
struct DemeSampler {
    deme: DemeId,
    selfing_rate: f64,
    /// Source demes with positive probability
    sources: Vec<DemeId>,
    weights: WeightedIndex<f64>,
}

impl DemeSampler {
    /// Sources without parents in `pool` get weight zero. Fails if no
    /// source is left: `NoSourceDemes` when the row has no positive weight
    /// at all, `EmptyParentalPool` when every weighted source is out of
    /// parents.
    fn new(
        generation: usize,
        deme: DemeId,
        selfing_rate: f64,
        state: &DemographicState,
        pool: &ParentalPool,
    ) -> Result<Self, MigrationError> {
        let no_sources = MigrationError::NoSourceDemes { generation, deme };
        let parents = pool.counts(state.deme_count());
        let Some(probabilities) = state.parental_source_probabilities(deme, &parents) else {
            let unmasked = state.source_probabilities(deme).ok_or(no_sources)?;
            let source_deme = unmasked.iter().position(|&p| p > 0.0).unwrap_or(deme);
            return Err(MigrationError::EmptyParentalPool {
                generation,
                deme,
                source_deme,
            });
        };

        let (sources, weights): (Vec<DemeId>, Vec<f64>) = probabilities
            .into_iter()
            .enumerate()
            .filter(|&(_, p)| p > 0.0)
            .unzip();
        let weights = WeightedIndex::new(&weights).map_err(|_| no_sources)?;
        Ok(Self {
            deme,
            selfing_rate,
            sources,
            weights,
        })
    }

    fn draw(&self, pool: &ParentalPool, rng: &mut Xoshiro256PlusPlus) -> (DemeId, usize) {
        let source = self.sources[self.weights.sample(rng)];
        let members = pool.members(source);
        (source, members[rng.random_range(0..members.len())])
    }

    fn sample(&self, pool: &ParentalPool, rng: &mut Xoshiro256PlusPlus) -> MatingEvent {
        let (parent1_deme, parent1) = self.draw(pool, rng);
        if parent1_deme == self.deme
            && self.selfing_rate > 0.0
            && rng.random::<f64>() < self.selfing_rate
        {
            return MatingEvent {
                offspring_deme: self.deme,
                parent1_deme,
                parent2_deme: parent1_deme,
                mating_type: MatingType::Selfing,
                parent1,
                parent2: parent1,
            };
        }
        let (parent2_deme, parent2) = self.draw(pool, rng);
        let mating_type = if parent2 == parent1 {
            MatingType::Selfing
        } else {
            MatingType::Outcrossing
        };
        MatingEvent {
            offspring_deme: self.deme,
            parent1_deme,
            parent2_deme,
            mating_type,
            parent1,
            parent2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demography::MigrationMatrix;
    use crate::events::{SetDemeSize, SetSelfingRate};
    use rand::SeedableRng;

    fn engine(demography: DiscreteDemography, store: &DemeAssignment) -> DemographyEngine {
        DemographyEngine::new(demography, store, RngContext::new(42)).unwrap()
    }

    #[test]
    fn test_constant_size_single_deme() {
        let store = DemeAssignment::uniform(50);
        let mut e = engine(DiscreteDemography::empty(), &store);
        let out = e.advance(&store).unwrap();
        assert_eq!(out.generation, 0);
        assert_eq!(out.deme_sizes, vec![50]);
        assert_eq!(out.matings.len(), 50);
        assert!(out.matings.iter().all(|m| m.parent1 < 50 && m.parent2 < 50));
        assert_eq!(e.generation(), 1);
    }

    #[test]
    fn test_store_mismatch_detected() {
        let store = DemeAssignment::uniform(10);
        let mut e = engine(
            DiscreteDemography::builder()
                .deme_size(SetDemeSize::new(0, 0, 20))
                .build()
                .unwrap(),
            &store,
        );
        e.advance(&store).unwrap();
        let err = e.advance(&store).unwrap_err();
        assert!(matches!(
            err,
            DemographyError::PopulationMismatch {
                generation: 1,
                deme: 0,
                expected: 20,
                found: 10
            }
        ));
    }

    #[test]
    fn test_event_before_start() {
        let store = DemeAssignment::uniform(10);
        let d = DiscreteDemography::builder()
            .deme_size(SetDemeSize::new(3, 0, 20))
            .build()
            .unwrap();
        let err = DemographyEngine::starting_at(d, &store, RngContext::new(1), 4).unwrap_err();
        assert_eq!(err, ConfigurationError::EventBeforeStart { when: 3, start: 4 });
    }

    #[test]
    fn test_store_outside_matrix() {
        let store = DemeAssignment::from_labels(vec![0, 1, 2]);
        let d = DiscreteDemography::builder()
            .migration_matrix(MigrationMatrix::identity(2).unwrap())
            .build()
            .unwrap();
        let err = DemographyEngine::new(d, &store, RngContext::new(1)).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::MigrationMatrixTooSmall {
                deme: 2,
                dimension: 2
            }
        );
    }

    #[test]
    fn test_full_selfing() {
        let store = DemeAssignment::uniform(20);
        let d = DiscreteDemography::builder()
            .selfing_rate(SetSelfingRate::new(0, 0, 1.0).unwrap())
            .build()
            .unwrap();
        let mut e = engine(d, &store);
        let out = e.advance(&store).unwrap();
        assert!(
            out.matings
                .iter()
                .all(|m| m.is_selfing() && m.parent1 == m.parent2)
        );
    }

    #[test]
    fn test_no_selfing_with_migrant_first_parent() {
        // Every parent of deme 1 comes from deme 0, so selfing in deme 1 can
        // only arise from drawing the same individual twice.
        let store = DemeAssignment::from_sizes(&[500, 500]);
        let d = DiscreteDemography::builder()
            .migration_matrix(MigrationMatrix::new(vec![vec![1.0, 1.0], vec![0.0, 0.0]]).unwrap())
            .selfing_rate(SetSelfingRate::new(0, 1, 1.0).unwrap())
            .build()
            .unwrap();
        let mut e = engine(d, &store);
        let out = e.advance(&store).unwrap();
        let deme1: Vec<_> = out.matings.iter().filter(|m| m.offspring_deme == 1).collect();
        assert_eq!(deme1.len(), 500);
        assert!(deme1.iter().all(|m| m.parent1_deme == 0 && m.parent2_deme == 0));
        assert!(deme1.iter().filter(|m| m.is_selfing()).count() < 50);
    }

    #[test]
    fn test_move_commitments() {
        let halves = [
            MassMigration::move_individuals(0, 0, 1, 0.5).unwrap(),
            MassMigration::move_individuals(0, 0, 2, 0.5).unwrap(),
        ];
        assert_eq!(check_move_commitments(0, &halves, &[101]), Ok(()));

        let copies_ignored = [
            MassMigration::copy_number(4, 0, 1, 90).unwrap(),
            MassMigration::move_number(4, 0, 2, 90).unwrap(),
        ];
        assert_eq!(check_move_commitments(4, &copies_ignored, &[100]), Ok(()));

        let too_many = [MassMigration::move_number(4, 1, 0, 11).unwrap()];
        assert_eq!(
            check_move_commitments(4, &too_many, &[100, 10]),
            Err(MigrationError::OvercommittedMoves {
                generation: 4,
                source_deme: 1,
                requested: 11,
                available: 10,
            })
        );
    }

    #[test]
    fn test_parental_pool_move() {
        let store = DemeAssignment::uniform(10);
        let mut pool = ParentalPool::from_store(&store, 1);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let mv = MassMigration::move_individuals(0, 0, 1, 0.3).unwrap();
        pool.transfer(&mv, 3, &mut rng);
        assert_eq!(pool.members(0).len(), 7);
        assert_eq!(pool.members(1).len(), 3);
        let mut all: Vec<usize> = pool.members(0).iter().chain(pool.members(1)).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_parental_pool_copy() {
        let store = DemeAssignment::uniform(10);
        let mut pool = ParentalPool::from_store(&store, 1);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let cp = MassMigration::copy_individuals(0, 0, 2, 0.5).unwrap();
        pool.transfer(&cp, 5, &mut rng);
        assert_eq!(pool.members(0).len(), 10);
        assert!(pool.members(1).is_empty());
        assert_eq!(pool.members(2).len(), 5);
        assert!(pool.members(2).iter().all(|i| pool.members(0).contains(i)));
    }

    #[test]
    fn test_parental_pool_transfer_clamped() {
        let store = DemeAssignment::uniform(4);
        let mut pool = ParentalPool::from_store(&store, 2);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let mv = MassMigration::move_number(0, 0, 1, 10).unwrap();
        pool.transfer(&mv, 10, &mut rng);
        assert!(pool.members(0).is_empty());
        assert_eq!(pool.members(1).len(), 4);
    }
}
