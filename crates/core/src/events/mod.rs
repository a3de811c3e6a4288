//! Typed records for scheduled demographic changes.
//!
//! Every change to the demographic history is one of five event kinds:
//!
//! - [`SetDemeSize`]: override the size of a deme
//! - [`SetExponentialGrowth`]: change a deme's per-generation growth factor
//! - [`SetSelfingRate`]: change a deme's selfing probability
//! - [`SetMigrationRates`]: replace one row, or all, of the migration matrix
//! - [`MassMigration`]: move or copy a share of one deme into another
//!
//! [`DemographicEvent`] wraps them in a closed sum type so that scheduling code
//! can dispatch on [`EventCategory`] instead of inspecting concrete types.

mod deme_changes;
mod mass_migration;
mod migration_rates;

pub use deme_changes::{SetDemeSize, SetExponentialGrowth, SetSelfingRate};
pub use mass_migration::{MassMigration, MassMigrationKind};
pub use migration_rates::{MigrationRateUpdate, SetMigrationRates};

pub(crate) use migration_rates::{check_weights, flatten_square};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Deme identifier. Demes are numbered from zero.
pub type DemeId = usize;

/// Growth factor meaning "size stays constant".
pub const NOGROWTH: f64 = 1.0;

fn default_true() -> bool {
    true
}

/// Discriminant of a [`DemographicEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventCategory {
    DemeSize,
    GrowthRate,
    SelfingRate,
    MigrationRates,
    MassMigration,
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DemeSize => write!(f, "deme size"),
            Self::GrowthRate => write!(f, "growth rate"),
            Self::SelfingRate => write!(f, "selfing rate"),
            Self::MigrationRates => write!(f, "migration rate"),
            Self::MassMigration => write!(f, "mass migration"),
        }
    }
}

/// Any scheduled demographic change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DemographicEvent {
    DemeSize(SetDemeSize),
    GrowthRate(SetExponentialGrowth),
    SelfingRate(SetSelfingRate),
    MigrationRates(SetMigrationRates),
    MassMigration(MassMigration),
}

impl DemographicEvent {
    /// Generation in which the event fires.
    pub fn when(&self) -> usize {
        match self {
            Self::DemeSize(e) => e.when(),
            Self::GrowthRate(e) => e.when(),
            Self::SelfingRate(e) => e.when(),
            Self::MigrationRates(e) => e.when(),
            Self::MassMigration(e) => e.when(),
        }
    }

    pub fn category(&self) -> EventCategory {
        match self {
            Self::DemeSize(_) => EventCategory::DemeSize,
            Self::GrowthRate(_) => EventCategory::GrowthRate,
            Self::SelfingRate(_) => EventCategory::SelfingRate,
            Self::MigrationRates(_) => EventCategory::MigrationRates,
            Self::MassMigration(_) => EventCategory::MassMigration,
        }
    }

    /// Largest deme id the event refers to, if any.
    ///
    /// A full migration matrix replacement refers to no particular deme.
    pub fn max_deme(&self) -> Option<DemeId> {
        match self {
            Self::DemeSize(e) => Some(e.deme()),
            Self::GrowthRate(e) => Some(e.deme()),
            Self::SelfingRate(e) => Some(e.deme()),
            Self::MigrationRates(e) => e.deme(),
            Self::MassMigration(e) => Some(e.source().max(e.destination())),
        }
    }

    /// Re-check the field values of the wrapped event.
    pub fn validate(&self) -> Result<(), crate::errors::ConfigurationError> {
        match self {
            Self::DemeSize(_) => Ok(()),
            Self::GrowthRate(e) => e.validate(),
            Self::SelfingRate(e) => e.validate(),
            Self::MigrationRates(e) => e.validate(),
            Self::MassMigration(e) => e.validate(),
        }
    }
}

impl From<SetDemeSize> for DemographicEvent {
    fn from(e: SetDemeSize) -> Self {
        Self::DemeSize(e)
    }
}

impl From<SetExponentialGrowth> for DemographicEvent {
    fn from(e: SetExponentialGrowth) -> Self {
        Self::GrowthRate(e)
    }
}

impl From<SetSelfingRate> for DemographicEvent {
    fn from(e: SetSelfingRate) -> Self {
        Self::SelfingRate(e)
    }
}

impl From<SetMigrationRates> for DemographicEvent {
    fn from(e: SetMigrationRates) -> Self {
        Self::MigrationRates(e)
    }
}

impl From<MassMigration> for DemographicEvent {
    fn from(e: MassMigration) -> Self {
        Self::MassMigration(e)
    }
}
