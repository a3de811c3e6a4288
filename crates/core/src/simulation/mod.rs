//! Demographic state and the generation-advance engine.
//!
//! Re-exports
//!
//! - `DemographyEngine`: applies due events each generation and samples
//!   parents for every offspring.
//! - `DemographicState`: live per-deme sizes, growth and selfing rates.
//! - `IndividualStore`: read access to the parental generation's deme labels,
//!   with `DemeAssignment` as the in-memory implementation.
//! - `GenerationOutcome`, `MatingEvent`: what one generation produces.

pub mod engine;
pub mod mating;
pub mod state;
pub mod store;

pub use engine::DemographyEngine;
pub use mating::{GenerationOutcome, MatingEvent, MatingType};
pub use state::{Deme, DemographicState};
pub use store::{DemeAssignment, IndividualStore};
