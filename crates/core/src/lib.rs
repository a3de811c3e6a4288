//! # Demography Core
//!
//! The `demesim-core` crate schedules discrete demographic events and
//! advances a structured population one generation at a time. It validates
//! a declarative demographic history (deme sizes, exponential growth,
//! selfing, migration weights, mass migrations), resolves per-deme sizes
//! each generation, and samples parents for every offspring.
//!
//! Building offspring genomes is left to the caller: the engine produces
//! parent indices, deme labels and mating records.

pub mod base;
pub mod demography;
pub mod errors;
pub mod events;
pub mod prelude;
pub mod simulation;

pub use demography::DiscreteDemography;
pub use simulation::DemographyEngine;
