//! Serializable description of a demographic model.
//!
//! [`DemographyConfig`] is the user-facing form: every field is optional and
//! the migration matrix may be given either as a bare square matrix or as a
//! `(matrix, scaled)` pair. Converting it into a [`DiscreteDemography`] runs
//! the full validation.

use super::{DemographyParts, DiscreteDemography, MigrationMatrix};
use crate::errors::{ConfigurationError, DemographyError};
use crate::events::{
    MassMigration, SetDemeSize, SetExponentialGrowth, SetMigrationRates, SetSelfingRate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Migration matrix as written in a configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MigrationMatrixInput {
    /// Square matrix of weights, scaled by source deme size.
    Weights(Vec<Vec<f64>>),
    /// Square matrix of weights plus the `scaled` flag.
    Scaled(Vec<Vec<f64>>, bool),
}

impl MigrationMatrixInput {
    pub fn into_matrix(self) -> Result<MigrationMatrix, ConfigurationError> {
        match self {
            Self::Weights(rows) => MigrationMatrix::new(rows),
            Self::Scaled(rows, scaled) => MigrationMatrix::with_scaling(rows, scaled),
        }
    }
}

impl From<&MigrationMatrix> for MigrationMatrixInput {
    fn from(m: &MigrationMatrix) -> Self {
        if m.is_scaled() {
            Self::Scaled(m.rows(), true)
        } else {
            Self::Weights(m.rows())
        }
    }
}

/// Complete demographic model as read from or written to JSON.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DemographyConfig {
    pub mass_migrations: Vec<MassMigration>,
    pub set_growth_rates: Vec<SetExponentialGrowth>,
    pub set_deme_sizes: Vec<SetDemeSize>,
    pub set_selfing_rates: Vec<SetSelfingRate>,
    pub set_migration_rates: Vec<SetMigrationRates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migmatrix: Option<MigrationMatrixInput>,
}

impl DemographyConfig {
    /// Parse a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, DemographyError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DemographyError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, DemographyError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write pretty-printed JSON to `path`.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), DemographyError> {
        std::fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    /// Validate into a [`DiscreteDemography`].
    pub fn build(self) -> Result<DiscreteDemography, ConfigurationError> {
        DiscreteDemography::try_from(self)
    }
}

impl TryFrom<DemographyConfig> for DiscreteDemography {
    type Error = ConfigurationError;

    fn try_from(config: DemographyConfig) -> Result<Self, Self::Error> {
        let migmatrix = config
            .migmatrix
            .map(MigrationMatrixInput::into_matrix)
            .transpose()?;
        DiscreteDemography::new(DemographyParts {
            mass_migrations: config.mass_migrations,
            set_growth_rates: config.set_growth_rates,
            set_deme_sizes: config.set_deme_sizes,
            set_selfing_rates: config.set_selfing_rates,
            set_migration_rates: config.set_migration_rates,
            migmatrix,
        })
    }
}

impl From<&DiscreteDemography> for DemographyConfig {
    fn from(d: &DiscreteDemography) -> Self {
        Self {
            mass_migrations: d.mass_migrations().to_vec(),
            set_growth_rates: d.set_growth_rates().to_vec(),
            set_deme_sizes: d.set_deme_sizes().to_vec(),
            set_selfing_rates: d.set_selfing_rates().to_vec(),
            set_migration_rates: d.set_migration_rates().to_vec(),
            migmatrix: d.migmatrix().map(MigrationMatrixInput::from),
        }
    }
}
