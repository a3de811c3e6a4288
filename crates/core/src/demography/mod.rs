//! Demographic model: migration matrix, validated event set and its
//! configuration forms.

pub mod builder;
pub mod config;
pub mod event_set;
pub mod migration_matrix;

pub use builder::DiscreteDemographyBuilder;
pub use config::{DemographyConfig, MigrationMatrixInput};
pub use event_set::{DemographyParts, DiscreteDemography, EventSchedule, GenerationEvents};
pub use migration_matrix::{MigrationMatrix, isolated_source_probabilities};
