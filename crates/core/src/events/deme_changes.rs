//! Per-deme size, growth and selfing changes.

use super::DemeId;
use crate::errors::ConfigurationError;
use serde::{Deserialize, Serialize};

/// Set the size of a deme at the start of a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetDemeSize {
    when: usize,
    deme: DemeId,
    new_size: usize,
    #[serde(default = "super::default_true")]
    resets_growth_rate: bool,
}

impl SetDemeSize {
    /// Create a size change that also resets the deme's growth rate.
    pub fn new(when: usize, deme: DemeId, new_size: usize) -> Self {
        Self {
            when,
            deme,
            new_size,
            resets_growth_rate: true,
        }
    }

    /// Choose whether the deme's growth rate returns to [`NOGROWTH`](super::NOGROWTH).
    pub fn with_growth_reset(mut self, resets_growth_rate: bool) -> Self {
        self.resets_growth_rate = resets_growth_rate;
        self
    }

    pub fn when(&self) -> usize {
        self.when
    }

    pub fn deme(&self) -> DemeId {
        self.deme
    }

    pub fn new_size(&self) -> usize {
        self.new_size
    }

    pub fn resets_growth_rate(&self) -> bool {
        self.resets_growth_rate
    }
}

/// Change the per-generation growth factor of a deme.
///
/// The new rate is used from the generation it is set in; setting it does
/// not change the deme's size by itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetExponentialGrowth {
    when: usize,
    deme: DemeId,
    growth_rate: f64,
}

impl SetExponentialGrowth {
    pub fn new(when: usize, deme: DemeId, growth_rate: f64) -> Result<Self, ConfigurationError> {
        let event = Self {
            when,
            deme,
            growth_rate,
        };
        event.validate()?;
        Ok(event)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.growth_rate.is_finite() || self.growth_rate <= 0.0 {
            return Err(ConfigurationError::InvalidGrowthRate {
                when: self.when,
                deme: self.deme,
                rate: self.growth_rate,
            });
        }
        Ok(())
    }

    pub fn when(&self) -> usize {
        self.when
    }

    pub fn deme(&self) -> DemeId {
        self.deme
    }

    pub fn growth_rate(&self) -> f64 {
        self.growth_rate
    }
}

/// Change the probability that an offspring is produced by selfing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetSelfingRate {
    when: usize,
    deme: DemeId,
    rate: f64,
}

impl SetSelfingRate {
    pub fn new(when: usize, deme: DemeId, rate: f64) -> Result<Self, ConfigurationError> {
        let event = Self { when, deme, rate };
        event.validate()?;
        Ok(event)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(0.0..=1.0).contains(&self.rate) {
            return Err(ConfigurationError::InvalidSelfingRate {
                when: self.when,
                deme: self.deme,
                rate: self.rate,
            });
        }
        Ok(())
    }

    pub fn when(&self) -> usize {
        self.when
    }

    pub fn deme(&self) -> DemeId {
        self.deme
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }
}
