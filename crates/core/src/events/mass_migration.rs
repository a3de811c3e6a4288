//! Mass migration (move or copy) between demes.

use super::DemeId;
use crate::errors::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether individuals leave the source deme or are duplicated.
///
/// The derived ordering places `Copy` before `Move`, which is the order in
/// which same-generation mass migrations are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MassMigrationKind {
    Copy,
    Move,
}

impl fmt::Display for MassMigrationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copy => write!(f, "copy"),
            Self::Move => write!(f, "move"),
        }
    }
}

/// A scheduled bulk transfer of individuals from `source` to `destination`.
///
/// The amount is either an absolute `number` of individuals or a `fraction`
/// of the source deme's size at the start of the generation. A `number` of
/// zero means the fraction is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MassMigration {
    when: usize,
    source: DemeId,
    destination: DemeId,
    #[serde(default)]
    number: usize,
    #[serde(default)]
    fraction: f64,
    kind: MassMigrationKind,
    #[serde(default = "super::default_true")]
    resets_growth_rate: bool,
}

impl MassMigration {
    fn build(
        when: usize,
        source: DemeId,
        destination: DemeId,
        number: usize,
        fraction: f64,
        kind: MassMigrationKind,
    ) -> Result<Self, ConfigurationError> {
        let event = Self {
            when,
            source,
            destination,
            number,
            fraction,
            kind,
            resets_growth_rate: true,
        };
        event.validate()?;
        Ok(event)
    }

    /// Move `fraction` of the source deme into the destination.
    pub fn move_individuals(
        when: usize,
        source: DemeId,
        destination: DemeId,
        fraction: f64,
    ) -> Result<Self, ConfigurationError> {
        Self::build(when, source, destination, 0, fraction, MassMigrationKind::Move)
    }

    /// Copy `fraction` of the source deme into the destination.
    pub fn copy_individuals(
        when: usize,
        source: DemeId,
        destination: DemeId,
        fraction: f64,
    ) -> Result<Self, ConfigurationError> {
        Self::build(when, source, destination, 0, fraction, MassMigrationKind::Copy)
    }

    /// Move exactly `number` individuals.
    pub fn move_number(
        when: usize,
        source: DemeId,
        destination: DemeId,
        number: usize,
    ) -> Result<Self, ConfigurationError> {
        Self::build(when, source, destination, number, 0.0, MassMigrationKind::Move)
    }

    /// Copy exactly `number` individuals.
    pub fn copy_number(
        when: usize,
        source: DemeId,
        destination: DemeId,
        number: usize,
    ) -> Result<Self, ConfigurationError> {
        Self::build(when, source, destination, number, 0.0, MassMigrationKind::Copy)
    }

    /// Choose whether demes changed by this event return to no growth.
    pub fn with_growth_reset(mut self, resets_growth_rate: bool) -> Self {
        self.resets_growth_rate = resets_growth_rate;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(0.0..=1.0).contains(&self.fraction) {
            return Err(ConfigurationError::InvalidFraction {
                when: self.when,
                source_deme: self.source,
                fraction: self.fraction,
            });
        }
        if self.source == self.destination {
            return Err(ConfigurationError::SelfMigration {
                when: self.when,
                deme: self.source,
            });
        }
        Ok(())
    }

    /// Number of individuals transferred out of a source of `source_size`.
    pub fn transfer_count(&self, source_size: usize) -> usize {
        if self.number > 0 {
            self.number
        } else {
            (self.fraction * source_size as f64).round() as usize
        }
    }

    pub fn when(&self) -> usize {
        self.when
    }

    pub fn source(&self) -> DemeId {
        self.source
    }

    pub fn destination(&self) -> DemeId {
        self.destination
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    pub fn kind(&self) -> MassMigrationKind {
        self.kind
    }

    pub fn is_move(&self) -> bool {
        self.kind == MassMigrationKind::Move
    }

    pub fn resets_growth_rate(&self) -> bool {
        self.resets_growth_rate
    }
}
