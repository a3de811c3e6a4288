//! Dense migration weight matrix.
//!
//! Element `(i, j)` is the relative weight with which source deme `i`
//! contributes parents to offspring born in destination deme `j`. The
//! distribution of parental demes for destination `d` is therefore read from
//! column `d`. Weights are not probabilities: they are normalized each
//! generation, after masking out empty sources and, for unscaled matrices,
//! multiplying by source deme sizes.

use crate::errors::ConfigurationError;
use crate::events::{
    DemeId, MigrationRateUpdate, SetMigrationRates, check_weights, flatten_square,
};
use serde::{Deserialize, Serialize};

/// Square matrix of non-negative migration weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMigrationMatrix", into = "RawMigrationMatrix")]
pub struct MigrationMatrix {
    dimension: usize,
    /// Row-major weights
    weights: Vec<f64>,
    /// If false, weights are multiplied by source deme sizes before normalizing
    scaled: bool,
}

#[derive(Serialize, Deserialize)]
struct RawMigrationMatrix {
    dimension: usize,
    weights: Vec<f64>,
    scaled: bool,
}

impl TryFrom<RawMigrationMatrix> for MigrationMatrix {
    type Error = ConfigurationError;

    fn try_from(raw: RawMigrationMatrix) -> Result<Self, Self::Error> {
        if raw.dimension == 0 {
            return Err(ConfigurationError::EmptyMatrix);
        }
        if raw.weights.len() != raw.dimension * raw.dimension {
            return Err(ConfigurationError::NonSquareMatrix {
                row: 0,
                expected: raw.dimension * raw.dimension,
                found: raw.weights.len(),
            });
        }
        check_weights(&raw.weights, raw.dimension)?;
        check_not_degenerate(&raw.weights)?;
        Ok(Self {
            dimension: raw.dimension,
            weights: raw.weights,
            scaled: raw.scaled,
        })
    }
}

impl From<MigrationMatrix> for RawMigrationMatrix {
    fn from(m: MigrationMatrix) -> Self {
        Self {
            dimension: m.dimension,
            weights: m.weights,
            scaled: m.scaled,
        }
    }
}

fn check_not_degenerate(weights: &[f64]) -> Result<(), ConfigurationError> {
    if weights.iter().all(|&w| w == 0.0) {
        return Err(ConfigurationError::DegenerateMatrix);
    }
    Ok(())
}

impl MigrationMatrix {
    /// Create an unscaled (size-weighted) matrix from rows.
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self, ConfigurationError> {
        Self::with_scaling(rows, false)
    }

    /// Create a matrix with an explicit `scaled` flag.
    pub fn with_scaling(rows: Vec<Vec<f64>>, scaled: bool) -> Result<Self, ConfigurationError> {
        let (dimension, weights) = flatten_square(rows)?;
        Self::try_from(RawMigrationMatrix {
            dimension,
            weights,
            scaled,
        })
    }

    /// Identity matrix: every deme draws parents only from itself.
    pub fn identity(dimension: usize) -> Result<Self, ConfigurationError> {
        let rows = (0..dimension)
            .map(|i| (0..dimension).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
            .collect();
        Self::new(rows)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Shape as `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.dimension, self.dimension)
    }

    pub fn is_scaled(&self) -> bool {
        self.scaled
    }

    /// Row-major weights.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Weight of `source` toward `destination`.
    pub fn weight(&self, source: DemeId, destination: DemeId) -> Option<f64> {
        if source >= self.dimension || destination >= self.dimension {
            return None;
        }
        Some(self.weights[source * self.dimension + destination])
    }

    /// Weights as a vector of rows.
    pub fn rows(&self) -> Vec<Vec<f64>> {
        self.weights
            .chunks(self.dimension)
            .map(<[f64]>::to_vec)
            .collect()
    }

    /// Replace row `deme`. The dimension never changes.
    pub fn set_row(&mut self, deme: DemeId, weights: &[f64]) -> Result<(), ConfigurationError> {
        if deme >= self.dimension {
            return Err(ConfigurationError::MigrationMatrixTooSmall {
                deme,
                dimension: self.dimension,
            });
        }
        if weights.len() != self.dimension {
            return Err(ConfigurationError::RowLengthMismatch {
                deme,
                expected: self.dimension,
                found: weights.len(),
            });
        }
        check_weights(weights, self.dimension)?;
        let start = deme * self.dimension;
        self.weights[start..start + self.dimension].copy_from_slice(weights);
        Ok(())
    }

    /// Replace every weight. `weights` is row-major and must keep the dimension.
    pub fn set_matrix(&mut self, when: usize, weights: &[f64]) -> Result<(), ConfigurationError> {
        if weights.len() != self.weights.len() {
            return Err(ConfigurationError::DimensionMismatch {
                when,
                expected: self.dimension,
                found: (weights.len() as f64).sqrt() as usize,
            });
        }
        check_weights(weights, self.dimension)?;
        check_not_degenerate(weights)?;
        self.weights.copy_from_slice(weights);
        Ok(())
    }

    /// Apply a scheduled change.
    pub fn apply(&mut self, event: &SetMigrationRates) -> Result<(), ConfigurationError> {
        match event.update() {
            MigrationRateUpdate::Row { deme, weights } => self.set_row(*deme, weights),
            MigrationRateUpdate::Matrix { dimension, weights } => {
                if *dimension != self.dimension {
                    return Err(ConfigurationError::DimensionMismatch {
                        when: event.when(),
                        expected: self.dimension,
                        found: *dimension,
                    });
                }
                self.set_matrix(event.when(), weights)
            }
        }
    }

    /// Probability that a parent of an offspring in `destination` comes from
    /// each source deme, given the current deme `sizes`.
    ///
    /// Sources of size zero never contribute. Returns `None` when no source
    /// has both positive weight and positive size.
    pub fn source_probabilities(&self, destination: DemeId, sizes: &[usize]) -> Option<Vec<f64>> {
        if destination >= self.dimension {
            return None;
        }
        let mut column: Vec<f64> = (0..self.dimension)
            .map(|source| {
                let size = sizes.get(source).copied().unwrap_or(0);
                if size == 0 {
                    return 0.0;
                }
                let w = self.weights[source * self.dimension + destination];
                if self.scaled { w } else { w * size as f64 }
            })
            .collect();
        normalize(&mut column).then_some(column)
    }
}

/// Probabilities for a model without a migration matrix: parents come from
/// the offspring's own deme.
pub fn isolated_source_probabilities(destination: DemeId, sizes: &[usize]) -> Option<Vec<f64>> {
    if sizes.get(destination).copied().unwrap_or(0) == 0 {
        return None;
    }
    let mut p = vec![0.0; sizes.len()];
    p[destination] = 1.0;
    Some(p)
}

/// Divide by the sum in place. Returns false if the sum is not positive.
fn normalize(values: &mut [f64]) -> bool {
    let total: f64 = values.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return false;
    }
    for v in values.iter_mut() {
        *v /= total;
    }
    true
}
