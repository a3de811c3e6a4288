//! Scheduled changes to the migration matrix.

use super::DemeId;
use crate::errors::ConfigurationError;
use serde::{Deserialize, Serialize};

/// Replacement applied to the migration matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MigrationRateUpdate {
    /// Replace the weights of source deme `deme` toward every destination.
    Row { deme: DemeId, weights: Vec<f64> },
    /// Replace the whole matrix. `weights` is row-major.
    Matrix { dimension: usize, weights: Vec<f64> },
}

/// Change migration weights at the start of generation `when`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetMigrationRates {
    when: usize,
    update: MigrationRateUpdate,
}

impl SetMigrationRates {
    /// Replace one row of the matrix.
    pub fn row(
        when: usize,
        deme: DemeId,
        weights: impl Into<Vec<f64>>,
    ) -> Result<Self, ConfigurationError> {
        let event = Self {
            when,
            update: MigrationRateUpdate::Row {
                deme,
                weights: weights.into(),
            },
        };
        event.validate()?;
        Ok(event)
    }

    /// Replace the whole matrix with `rows`.
    pub fn matrix(when: usize, rows: Vec<Vec<f64>>) -> Result<Self, ConfigurationError> {
        let (dimension, weights) = flatten_square(rows)?;
        let event = Self {
            when,
            update: MigrationRateUpdate::Matrix { dimension, weights },
        };
        event.validate()?;
        Ok(event)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match &self.update {
            MigrationRateUpdate::Row { deme, weights } => {
                check_weights(weights, weights.len().max(1)).map_err(|e| match e {
                    ConfigurationError::InvalidWeight { column, weight, .. } => {
                        ConfigurationError::InvalidWeight {
                            row: *deme,
                            column,
                            weight,
                        }
                    }
                    other => other,
                })
            }
            MigrationRateUpdate::Matrix { dimension, weights } => {
                if weights.len() != dimension * dimension {
                    return Err(ConfigurationError::NonSquareMatrix {
                        row: 0,
                        expected: dimension * dimension,
                        found: weights.len(),
                    });
                }
                check_weights(weights, *dimension)
            }
        }
    }

    pub fn when(&self) -> usize {
        self.when
    }

    pub fn update(&self) -> &MigrationRateUpdate {
        &self.update
    }

    /// The row being replaced, or `None` for a full matrix replacement.
    pub fn deme(&self) -> Option<DemeId> {
        match &self.update {
            MigrationRateUpdate::Row { deme, .. } => Some(*deme),
            MigrationRateUpdate::Matrix { .. } => None,
        }
    }

    /// Weights of the replacement, row-major for a full matrix.
    pub fn weights(&self) -> &[f64] {
        match &self.update {
            MigrationRateUpdate::Row { weights, .. } => weights,
            MigrationRateUpdate::Matrix { weights, .. } => weights,
        }
    }
}

/// Flatten a square matrix given as rows into row-major storage.
pub(crate) fn flatten_square(rows: Vec<Vec<f64>>) -> Result<(usize, Vec<f64>), ConfigurationError> {
    let dimension = rows.len();
    if dimension == 0 {
        return Err(ConfigurationError::EmptyMatrix);
    }
    let mut weights = Vec::with_capacity(dimension * dimension);
    for (row, values) in rows.into_iter().enumerate() {
        if values.len() != dimension {
            return Err(ConfigurationError::NonSquareMatrix {
                row,
                expected: dimension,
                found: values.len(),
            });
        }
        weights.extend(values);
    }
    Ok((dimension, weights))
}

/// Check that row-major `weights` are finite and non-negative.
pub(crate) fn check_weights(weights: &[f64], dimension: usize) -> Result<(), ConfigurationError> {
    for (i, &weight) in weights.iter().enumerate() {
        if !weight.is_finite() || weight < 0.0 {
            return Err(ConfigurationError::InvalidWeight {
                row: i / dimension,
                column: i % dimension,
                weight,
            });
        }
    }
    Ok(())
}
