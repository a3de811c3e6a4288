//! Builder pattern for assembling a demographic model.
//!
//! Provides a fluent API for collecting events one at a time; all
//! validation happens once, in [`DiscreteDemographyBuilder::build`].

use super::{DemographyParts, DiscreteDemography, MigrationMatrix};
use crate::errors::ConfigurationError;
use crate::events::{
    DemographicEvent, MassMigration, SetDemeSize, SetExponentialGrowth, SetMigrationRates,
    SetSelfingRate,
};

/// Builder for [`DiscreteDemography`].
///
/// # Examples
///
/// ```
/// use demesim_core::demography::{DiscreteDemographyBuilder, MigrationMatrix};
/// use demesim_core::events::{MassMigration, SetExponentialGrowth};
///
/// let demography = DiscreteDemographyBuilder::new()
///     .migration_matrix(MigrationMatrix::identity(2).unwrap())
///     .growth_rate(SetExponentialGrowth::new(0, 0, 1.1).unwrap())
///     .mass_migration(MassMigration::move_individuals(5, 0, 1, 0.5).unwrap())
///     .build()
///     .unwrap();
///
/// assert_eq!(demography.mass_migrations().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DiscreteDemographyBuilder {
    parts: DemographyParts,
}

impl DiscreteDemographyBuilder {
    /// Create an empty builder: one deme, no events, no migration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deme_size(mut self, event: SetDemeSize) -> Self {
        self.parts.set_deme_sizes.push(event);
        self
    }

    pub fn growth_rate(mut self, event: SetExponentialGrowth) -> Self {
        self.parts.set_growth_rates.push(event);
        self
    }

    pub fn selfing_rate(mut self, event: SetSelfingRate) -> Self {
        self.parts.set_selfing_rates.push(event);
        self
    }

    pub fn migration_rates(mut self, event: SetMigrationRates) -> Self {
        self.parts.set_migration_rates.push(event);
        self
    }

    pub fn mass_migration(mut self, event: MassMigration) -> Self {
        self.parts.mass_migrations.push(event);
        self
    }

    /// Add an event of any kind.
    pub fn event(self, event: impl Into<DemographicEvent>) -> Self {
        match event.into() {
            DemographicEvent::DemeSize(e) => self.deme_size(e),
            DemographicEvent::GrowthRate(e) => self.growth_rate(e),
            DemographicEvent::SelfingRate(e) => self.selfing_rate(e),
            DemographicEvent::MigrationRates(e) => self.migration_rates(e),
            DemographicEvent::MassMigration(e) => self.mass_migration(e),
        }
    }

    /// Add several events of any kind.
    pub fn events<I, E>(self, events: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<DemographicEvent>,
    {
        events.into_iter().fold(self, |builder, e| builder.event(e))
    }

    /// Set the initial migration matrix.
    pub fn migration_matrix(mut self, matrix: MigrationMatrix) -> Self {
        self.parts.migmatrix = Some(matrix);
        self
    }

    /// Validate and build the model.
    pub fn build(self) -> Result<DiscreteDemography, ConfigurationError> {
        DiscreteDemography::new(self.parts)
    }
}
