//! Live per-deme table and the deterministic part of a generation advance.
//!
//! Everything here runs before parents are sampled: size overrides, rate
//! changes, growth and the size bookkeeping of mass migrations.

use crate::demography::{MigrationMatrix, isolated_source_probabilities};
use crate::errors::ConfigurationError;
use crate::events::{
    DemeId, MassMigration, NOGROWTH, SetDemeSize, SetExponentialGrowth, SetMigrationRates,
    SetSelfingRate,
};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

/// Current parameters of one deme.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Deme {
    pub id: DemeId,
    pub size: usize,
    pub growth_rate: f64,
    pub selfing_rate: f64,
}

impl Deme {
    pub fn new(id: DemeId, size: usize) -> Self {
        Self {
            id,
            size,
            growth_rate: NOGROWTH,
            selfing_rate: 0.0,
        }
    }

    pub fn is_growing(&self) -> bool {
        self.growth_rate != NOGROWTH
    }
}

/// Sizes, rates and migration weights of every deme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemographicState {
    demes: Vec<Deme>,
    migmatrix: Option<MigrationMatrix>,
}

impl DemographicState {
    /// `deme_count` demes, sized from `sizes` (missing entries are empty).
    pub fn new(sizes: &[usize], deme_count: usize, migmatrix: Option<MigrationMatrix>) -> Self {
        let count = deme_count.max(sizes.len());
        let demes = (0..count)
            .map(|id| Deme::new(id, sizes.get(id).copied().unwrap_or(0)))
            .collect();
        Self { demes, migmatrix }
    }

    pub fn demes(&self) -> &[Deme] {
        &self.demes
    }

    pub fn deme(&self, id: DemeId) -> Option<&Deme> {
        self.demes.get(id)
    }

    pub fn deme_count(&self) -> usize {
        self.demes.len()
    }

    pub fn sizes(&self) -> Vec<usize> {
        self.demes.iter().map(|d| d.size).collect()
    }

    pub fn total_size(&self) -> usize {
        self.demes.iter().map(|d| d.size).sum()
    }

    pub fn migmatrix(&self) -> Option<&MigrationMatrix> {
        self.migmatrix.as_ref()
    }

    fn deme_mut(&mut self, id: DemeId) -> &mut Deme {
        if id >= self.demes.len() {
            let start = self.demes.len();
            self.demes.extend((start..=id).map(|i| Deme::new(i, 0)));
        }
        &mut self.demes[id]
    }

    /// Apply size overrides. Returns a flag per deme, set where the size was
    /// overridden; those demes skip growth this generation.
    pub fn apply_deme_sizes(&mut self, events: &[SetDemeSize]) -> Vec<bool> {
        let mut touched = vec![false; self.demes.len()];
        for e in events {
            trace!(deme = e.deme(), new_size = e.new_size(), "set deme size");
            let deme = self.deme_mut(e.deme());
            deme.size = e.new_size();
            if e.resets_growth_rate() {
                deme.growth_rate = NOGROWTH;
            }
            if e.deme() >= touched.len() {
                touched.resize(e.deme() + 1, false);
            }
            touched[e.deme()] = true;
        }
        touched
    }

    pub fn apply_growth_rates(&mut self, events: &[SetExponentialGrowth]) {
        for e in events {
            trace!(deme = e.deme(), growth_rate = e.growth_rate(), "set growth rate");
            self.deme_mut(e.deme()).growth_rate = e.growth_rate();
        }
    }

    pub fn apply_selfing_rates(&mut self, events: &[SetSelfingRate]) {
        for e in events {
            trace!(deme = e.deme(), rate = e.rate(), "set selfing rate");
            self.deme_mut(e.deme()).selfing_rate = e.rate();
        }
    }

    /// Apply migration weight changes, full replacements first.
    pub fn apply_migration_rates(
        &mut self,
        events: &[SetMigrationRates],
    ) -> Result<(), ConfigurationError> {
        let ordered = events
            .iter()
            .filter(|e| e.deme().is_none())
            .chain(events.iter().filter(|e| e.deme().is_some()));
        for e in ordered {
            let Some(matrix) = self.migmatrix.as_mut() else {
                return Err(ConfigurationError::MissingMigrationMatrix { when: e.when() });
            };
            trace!(row = ?e.deme(), "set migration rates");
            matrix.apply(e)?;
        }
        Ok(())
    }

    /// Grow every deme whose size was not overridden this generation.
    pub fn apply_growth(&mut self, overridden: &[bool]) {
        for deme in &mut self.demes {
            if overridden.get(deme.id).copied().unwrap_or(false) || !deme.is_growing() {
                continue;
            }
            deme.size = (deme.size as f64 * deme.growth_rate).round() as usize;
        }
    }

    /// Update sizes for one mass migration.
    ///
    /// `transferred` is the number of individuals the event asks for. A move
    /// takes at most what is left in the source. Returns the number actually
    /// added to the destination.
    pub fn apply_mass_migration(&mut self, event: &MassMigration, transferred: usize) -> usize {
        let source = event.source();
        let destination = event.destination();
        let mut added = transferred;
        if event.is_move() {
            let available = self.deme_mut(source).size;
            if transferred > available {
                warn!(
                    source,
                    destination,
                    requested = transferred,
                    available,
                    "mass migration clamped to remaining source size"
                );
                added = available;
            }
            let src = self.deme_mut(source);
            src.size -= added;
            if event.resets_growth_rate() && added > 0 {
                src.growth_rate = NOGROWTH;
            }
        }
        let dst = self.deme_mut(destination);
        dst.size += added;
        if event.resets_growth_rate() && added > 0 {
            dst.growth_rate = NOGROWTH;
        }
        trace!(
            source,
            destination,
            kind = %event.kind(),
            count = added,
            "mass migration"
        );
        added
    }

    /// Distribution of parental demes for offspring born in `destination`.
    pub fn source_probabilities(&self, destination: DemeId) -> Option<Vec<f64>> {
        self.resolve_sources(destination, &self.sizes())
    }

    /// Like [`source_probabilities`](Self::source_probabilities), but a
    /// source with no parents left (`parents[s] == 0`) gets weight zero.
    pub fn parental_source_probabilities(
        &self,
        destination: DemeId,
        parents: &[usize],
    ) -> Option<Vec<f64>> {
        let sizes: Vec<usize> = self
            .demes
            .iter()
            .map(|d| {
                if parents.get(d.id).copied().unwrap_or(0) == 0 {
                    0
                } else {
                    d.size
                }
            })
            .collect();
        self.resolve_sources(destination, &sizes)
    }

    fn resolve_sources(&self, destination: DemeId, sizes: &[usize]) -> Option<Vec<f64>> {
        match &self.migmatrix {
            Some(m) => m.source_probabilities(destination, sizes),
            None => isolated_source_probabilities(destination, sizes),
        }
    }
}
