//! Commonly used imports for convenience.
//!
//! # Example
//!
//! ```
//! use demesim_core::prelude::*;
//!
//! let store = DemeAssignment::uniform(100);
//! let demography = DiscreteDemography::builder()
//!     .mass_migration(MassMigration::move_individuals(0, 0, 1, 0.5).unwrap())
//!     .build()
//!     .unwrap();
//! let mut engine = DemographyEngine::new(demography, &store, RngContext::new(42)).unwrap();
//! let outcome = engine.advance(&store).unwrap();
//! assert_eq!(outcome.deme_sizes, vec![50, 50]);
//! ```

pub use crate::base::{Persist, RngContext};
pub use crate::demography::{
    DemographyConfig, DiscreteDemography, DiscreteDemographyBuilder, MigrationMatrix,
};
pub use crate::errors::{
    ConfigurationError, DemographyError, IndexError, MigrationError, PersistError,
};
pub use crate::events::{
    DemeId, DemographicEvent, EventCategory, MassMigration, MassMigrationKind, NOGROWTH,
    SetDemeSize, SetExponentialGrowth, SetMigrationRates, SetSelfingRate,
};
pub use crate::simulation::{
    DemeAssignment, DemographicState, DemographyEngine, GenerationOutcome, IndividualStore,
    MatingEvent, MatingType,
};
