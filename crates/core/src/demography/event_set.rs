//! Validated, sorted collection of demographic events.
//!
//! [`DiscreteDemography`] is built once, before any generation is simulated.
//! Construction rejects every configuration problem that can be detected
//! without running the model, and sorts events into the order in which they
//! are applied. [`DiscreteDemography::schedule`] then compiles the events into
//! an [`EventSchedule`] keyed by generation, which the engine drains one
//! generation at a time.

use super::MigrationMatrix;
use crate::errors::ConfigurationError;
use crate::events::{
    DemeId, DemographicEvent, EventCategory, MassMigration, MassMigrationKind, SetDemeSize,
    SetExponentialGrowth, SetMigrationRates, SetSelfingRate,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Numerical slack when summing move fractions from one source.
pub(crate) const FRACTION_TOLERANCE: f64 = 1e-9;

/// A validated demographic model.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "DemographyParts", into = "DemographyParts")]
pub struct DiscreteDemography {
    mass_migrations: Vec<MassMigration>,
    set_growth_rates: Vec<SetExponentialGrowth>,
    set_deme_sizes: Vec<SetDemeSize>,
    set_selfing_rates: Vec<SetSelfingRate>,
    set_migration_rates: Vec<SetMigrationRates>,
    migmatrix: Option<MigrationMatrix>,
}

/// Unvalidated contents of a [`DiscreteDemography`].
///
/// This is the serialized form; deserializing goes back through validation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DemographyParts {
    pub mass_migrations: Vec<MassMigration>,
    pub set_growth_rates: Vec<SetExponentialGrowth>,
    pub set_deme_sizes: Vec<SetDemeSize>,
    pub set_selfing_rates: Vec<SetSelfingRate>,
    pub set_migration_rates: Vec<SetMigrationRates>,
    pub migmatrix: Option<MigrationMatrix>,
}

impl TryFrom<DemographyParts> for DiscreteDemography {
    type Error = ConfigurationError;

    fn try_from(parts: DemographyParts) -> Result<Self, Self::Error> {
        Self::new(parts)
    }
}

impl From<DiscreteDemography> for DemographyParts {
    fn from(d: DiscreteDemography) -> Self {
        Self {
            mass_migrations: d.mass_migrations,
            set_growth_rates: d.set_growth_rates,
            set_deme_sizes: d.set_deme_sizes,
            set_selfing_rates: d.set_selfing_rates,
            set_migration_rates: d.set_migration_rates,
            migmatrix: d.migmatrix,
        }
    }
}

impl DiscreteDemography {
    /// Validate and sort `parts`.
    pub fn new(parts: DemographyParts) -> Result<Self, ConfigurationError> {
        let DemographyParts {
            mut mass_migrations,
            mut set_growth_rates,
            mut set_deme_sizes,
            mut set_selfing_rates,
            mut set_migration_rates,
            migmatrix,
        } = parts;

        // Stable sorts keep input order among ties.
        mass_migrations.sort_by_key(|m| (m.when(), m.kind()));
        set_growth_rates.sort_by_key(SetExponentialGrowth::when);
        set_deme_sizes.sort_by_key(SetDemeSize::when);
        set_selfing_rates.sort_by_key(SetSelfingRate::when);
        set_migration_rates.sort_by_key(SetMigrationRates::when);

        let demography = Self {
            mass_migrations,
            set_growth_rates,
            set_deme_sizes,
            set_selfing_rates,
            set_migration_rates,
            migmatrix,
        };
        demography.validate()?;
        Ok(demography)
    }

    /// A model with no events and no migration.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Single-deme size history.
    ///
    /// `sizes[g]` is the size of deme 0 in generation `g`. An event is emitted
    /// for generation 0 and for every generation whose size differs from the
    /// one before it.
    pub fn from_population_sizes(sizes: &[usize]) -> Self {
        let set_deme_sizes = sizes
            .iter()
            .enumerate()
            .filter(|&(g, &n)| g == 0 || sizes[g - 1] != n)
            .map(|(g, &n)| SetDemeSize::new(g, 0, n))
            .collect();
        Self {
            set_deme_sizes,
            ..Self::default()
        }
    }

    /// Start a [`DiscreteDemographyBuilder`](super::DiscreteDemographyBuilder).
    pub fn builder() -> super::DiscreteDemographyBuilder {
        super::DiscreteDemographyBuilder::new()
    }

    /// Mass migrations, copies before moves within each generation.
    pub fn mass_migrations(&self) -> &[MassMigration] {
        &self.mass_migrations
    }

    pub fn set_growth_rates(&self) -> &[SetExponentialGrowth] {
        &self.set_growth_rates
    }

    pub fn set_deme_sizes(&self) -> &[SetDemeSize] {
        &self.set_deme_sizes
    }

    pub fn set_selfing_rates(&self) -> &[SetSelfingRate] {
        &self.set_selfing_rates
    }

    pub fn set_migration_rates(&self) -> &[SetMigrationRates] {
        &self.set_migration_rates
    }

    pub fn migmatrix(&self) -> Option<&MigrationMatrix> {
        self.migmatrix.as_ref()
    }

    /// Every event, in category order and sorted within each category.
    pub fn events(&self) -> impl Iterator<Item = DemographicEvent> + '_ {
        let sizes = self.set_deme_sizes.iter().copied().map(DemographicEvent::from);
        let growth = self.set_growth_rates.iter().copied().map(DemographicEvent::from);
        let selfing = self.set_selfing_rates.iter().copied().map(DemographicEvent::from);
        let rates = self.set_migration_rates.iter().cloned().map(DemographicEvent::from);
        let mass = self.mass_migrations.iter().cloned().map(DemographicEvent::from);
        sizes.chain(growth).chain(selfing).chain(rates).chain(mass)
    }

    pub fn is_empty(&self) -> bool {
        self.mass_migrations.is_empty()
            && self.set_growth_rates.is_empty()
            && self.set_deme_sizes.is_empty()
            && self.set_selfing_rates.is_empty()
            && self.set_migration_rates.is_empty()
    }

    /// Largest deme id referenced by any event or by the migration matrix.
    pub fn max_deme(&self) -> Option<DemeId> {
        let from_matrix = self.migmatrix.as_ref().map(|m| m.dimension() - 1);
        self.events()
            .filter_map(|e| e.max_deme())
            .chain(from_matrix)
            .max()
    }

    /// Generation of the earliest event.
    pub fn first_event_generation(&self) -> Option<usize> {
        self.events().map(|e| e.when()).min()
    }

    /// Compile the events into a per-generation schedule.
    pub fn schedule(&self) -> EventSchedule {
        let mut by_generation: BTreeMap<usize, GenerationEvents> = BTreeMap::new();
        for e in &self.set_deme_sizes {
            by_generation.entry(e.when()).or_default().deme_sizes.push(*e);
        }
        for e in &self.set_growth_rates {
            by_generation.entry(e.when()).or_default().growth_rates.push(*e);
        }
        for e in &self.set_selfing_rates {
            by_generation.entry(e.when()).or_default().selfing_rates.push(*e);
        }
        for e in &self.set_migration_rates {
            by_generation.entry(e.when()).or_default().migration_rates.push(e.clone());
        }
        for e in &self.mass_migrations {
            by_generation.entry(e.when()).or_default().mass_migrations.push(e.clone());
        }
        EventSchedule { by_generation }
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        for event in self.events() {
            event.validate()?;
        }
        self.check_duplicates()?;
        self.check_mass_migrations()?;
        self.check_migration_matrix()
    }

    fn check_duplicates(&self) -> Result<(), ConfigurationError> {
        let mut seen: HashSet<(usize, DemeId, EventCategory)> = HashSet::new();
        let keyed = self
            .set_deme_sizes
            .iter()
            .map(|e| (e.when(), e.deme(), EventCategory::DemeSize))
            .chain(
                self.set_growth_rates
                    .iter()
                    .map(|e| (e.when(), e.deme(), EventCategory::GrowthRate)),
            )
            .chain(
                self.set_selfing_rates
                    .iter()
                    .map(|e| (e.when(), e.deme(), EventCategory::SelfingRate)),
            )
            .chain(
                self.set_migration_rates
                    .iter()
                    .filter_map(|e| e.deme().map(|d| (e.when(), d, EventCategory::MigrationRates))),
            );
        for key in keyed {
            if !seen.insert(key) {
                let (when, deme, category) = key;
                return Err(ConfigurationError::DuplicateEvent {
                    when,
                    deme,
                    category,
                });
            }
        }

        // A full matrix replacement must be the only rate change of its generation.
        let mut per_generation: HashMap<usize, (usize, bool)> = HashMap::new();
        for e in &self.set_migration_rates {
            let entry = per_generation.entry(e.when()).or_insert((0, false));
            entry.0 += 1;
            entry.1 |= e.deme().is_none();
        }
        let mut conflicting: Vec<usize> = per_generation
            .into_iter()
            .filter(|(_, (count, full))| *full && *count > 1)
            .map(|(when, _)| when)
            .collect();
        conflicting.sort_unstable();
        if let Some(&when) = conflicting.first() {
            return Err(ConfigurationError::ConflictingMigrationRates { when });
        }
        Ok(())
    }

    /// Reject duplicated mass migrations and over-committed sources.
    ///
    /// Only moves deplete a source, so only moves count toward the fraction
    /// taken from it. All fractions refer to the source size at the start of
    /// the generation.
    fn check_mass_migrations(&self) -> Result<(), ConfigurationError> {
        let mut seen: HashSet<(usize, DemeId, DemeId, MassMigrationKind)> = HashSet::new();
        let mut taken: BTreeMap<(usize, DemeId), f64> = BTreeMap::new();
        for m in &self.mass_migrations {
            let key = (m.when(), m.source(), m.destination(), m.kind());
            if !seen.insert(key) {
                return Err(ConfigurationError::DuplicateMassMigration {
                    when: m.when(),
                    source_deme: m.source(),
                    destination: m.destination(),
                    kind: m.kind(),
                });
            }
            if m.is_move() && m.number() == 0 {
                *taken.entry((m.when(), m.source())).or_insert(0.0) += m.fraction();
            }
        }
        for ((when, source), fraction) in taken {
            if fraction > 1.0 + FRACTION_TOLERANCE {
                return Err(ConfigurationError::OvercommittedSource {
                    when,
                    source_deme: source,
                    fraction,
                });
            }
        }
        Ok(())
    }

    fn check_migration_matrix(&self) -> Result<(), ConfigurationError> {
        let Some(matrix) = &self.migmatrix else {
            return match self.set_migration_rates.first() {
                Some(e) => Err(ConfigurationError::MissingMigrationMatrix { when: e.when() }),
                None => Ok(()),
            };
        };

        let dimension = matrix.dimension();
        if let Some(deme) = self.events().filter_map(|e| e.max_deme()).find(|&d| d >= dimension) {
            return Err(ConfigurationError::MigrationMatrixTooSmall { deme, dimension });
        }

        // Replay rate changes on a scratch copy to catch shape errors now
        // rather than mid-run.
        let mut probe = matrix.clone();
        for e in &self.set_migration_rates {
            probe.apply(e)?;
        }
        Ok(())
    }
}

/// Events due in one generation, in the order they are applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationEvents {
    pub deme_sizes: Vec<SetDemeSize>,
    pub growth_rates: Vec<SetExponentialGrowth>,
    pub selfing_rates: Vec<SetSelfingRate>,
    pub migration_rates: Vec<SetMigrationRates>,
    pub mass_migrations: Vec<MassMigration>,
}

impl GenerationEvents {
    pub fn is_empty(&self) -> bool {
        self.deme_sizes.is_empty()
            && self.growth_rates.is_empty()
            && self.selfing_rates.is_empty()
            && self.migration_rates.is_empty()
            && self.mass_migrations.is_empty()
    }
}

/// Pending events keyed by generation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventSchedule {
    by_generation: BTreeMap<usize, GenerationEvents>,
}

impl EventSchedule {
    /// Remove and return the events due in `generation`.
    pub fn take(&mut self, generation: usize) -> Option<GenerationEvents> {
        self.by_generation.remove(&generation)
    }

    /// Generation of the next pending event.
    pub fn next_generation(&self) -> Option<usize> {
        self.by_generation.keys().next().copied()
    }

    /// Number of generations with pending events.
    pub fn len(&self) -> usize {
        self.by_generation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_generation.is_empty()
    }
}
