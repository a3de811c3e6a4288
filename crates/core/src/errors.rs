//! Error types for demographic configuration and generation advance.
//!
//! Configuration problems are detected once, when a [`DiscreteDemography`] or a
//! [`DemographyEngine`] is built. Everything that can only be known while a
//! generation is being advanced is reported as a [`MigrationError`].
//!
//! [`DiscreteDemography`]: crate::demography::DiscreteDemography
//! [`DemographyEngine`]: crate::simulation::DemographyEngine

use crate::events::{DemeId, EventCategory, MassMigrationKind};
use thiserror::Error;

/// Invalid or conflicting demographic configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("Invalid growth rate {rate} for deme {deme} at generation {when} (must be finite and > 0)")]
    InvalidGrowthRate { when: usize, deme: DemeId, rate: f64 },

    #[error("Invalid selfing rate {rate} for deme {deme} at generation {when} (must be in [0, 1])")]
    InvalidSelfingRate { when: usize, deme: DemeId, rate: f64 },

    #[error("Invalid mass migration fraction {fraction} from deme {source_deme} at generation {when} (must be in [0, 1])")]
    InvalidFraction {
        when: usize,
        source_deme: DemeId,
        fraction: f64,
    },

    #[error("Mass migration at generation {when} has deme {deme} as both source and destination")]
    SelfMigration { when: usize, deme: DemeId },

    #[error("Duplicate {category} events for deme {deme} at generation {when}")]
    DuplicateEvent {
        when: usize,
        deme: DemeId,
        category: EventCategory,
    },

    #[error("Duplicate mass {kind} from deme {source_deme} to deme {destination} at generation {when}")]
    DuplicateMassMigration {
        when: usize,
        source_deme: DemeId,
        destination: DemeId,
        kind: MassMigrationKind,
    },

    #[error("Mass moves at generation {when} take a combined fraction {fraction} of deme {source_deme} (at most 1 allowed)")]
    OvercommittedSource {
        when: usize,
        source_deme: DemeId,
        fraction: f64,
    },

    #[error("Full migration matrix replacement at generation {when} conflicts with another migration rate change")]
    ConflictingMigrationRates { when: usize },

    #[error("Migration matrix must be square: row {row} has {found} entries, expected {expected}")]
    NonSquareMatrix {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Migration matrix must not be empty")]
    EmptyMatrix,

    #[error("Invalid migration weight {weight} at ({row}, {column}) (must be finite and >= 0)")]
    InvalidWeight {
        row: usize,
        column: usize,
        weight: f64,
    },

    #[error("Migration matrix weights are all zero")]
    DegenerateMatrix,

    #[error("Deme {deme} is outside the {dimension}x{dimension} migration matrix")]
    MigrationMatrixTooSmall { deme: DemeId, dimension: usize },

    #[error("Migration rate row for deme {deme} has {found} entries, expected {expected}")]
    RowLengthMismatch {
        deme: DemeId,
        expected: usize,
        found: usize,
    },

    #[error("Migration matrix replacement at generation {when} is {found}x{found}, expected {expected}x{expected}")]
    DimensionMismatch {
        when: usize,
        expected: usize,
        found: usize,
    },

    #[error("Migration rates changed at generation {when} but no migration matrix was given")]
    MissingMigrationMatrix { when: usize },

    #[error("Event scheduled at generation {when} precedes the starting generation {start}")]
    EventBeforeStart { when: usize, start: usize },
}

/// Failure to move individuals or find parents while advancing a generation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MigrationError {
    /// Moves out of one deme ask for more individuals than it held at the
    /// start of the generation.
    #[error("Generation {generation}: moves take {requested} individuals from deme {source_deme}, which has {available}")]
    OvercommittedMoves {
        generation: usize,
        source_deme: DemeId,
        requested: usize,
        available: usize,
    },

    /// No source deme has both positive weight and positive size.
    #[error("Generation {generation}: deme {deme} has no source demes with positive weight and size")]
    NoSourceDemes { generation: usize, deme: DemeId },

    /// Every source deme with positive weight holds no parents.
    #[error("Generation {generation}: deme {deme} draws parents from deme {source_deme}, which has none")]
    EmptyParentalPool {
        generation: usize,
        deme: DemeId,
        source_deme: DemeId,
    },
}

/// Returned when an individual index is outside the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Individual index {index} out of bounds (len = {len})")]
pub struct IndexError {
    /// The index that was requested
    pub index: usize,

    /// Number of individuals in the store
    pub len: usize,
}

/// Byte encoding failures.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Encoding error: {0}")]
    Encode(String),
    #[error("Decoding error: {0}")]
    Decode(String),
}

/// Umbrella error for a simulation run.
#[derive(Debug, Error)]
pub enum DemographyError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Migration(#[from] MigrationError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error("Generation {generation}: deme {deme} holds {found} individuals, expected {expected}")]
    PopulationMismatch {
        generation: usize,
        deme: DemeId,
        expected: usize,
        found: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl DemographyError {
    /// Whether the error was raised before any generation was simulated.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Io(_) | Self::Parse(_))
    }
}
