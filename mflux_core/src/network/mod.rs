//! Module describing the central carbon network: flux and substrate indexing, and the fixed
//! stoichiometric topology the reconciliation is constrained by.

pub mod flux;
pub mod substrate;
pub mod topology;

use thiserror::Error;

pub use flux::{FluxId, FluxVector, NUM_FLUXES};
pub use substrate::{Substrate, SubstrateRatios, NUM_SUBSTRATES};

/// Multiplier turning a substrate ratio into a flux relative to 100 units of carbon uptake
pub const UPTAKE_SCALE: f64 = 100.0;

/// Errors raised while validating flux and substrate data
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    /// A flux vector was built without one of the 29 required fluxes
    #[error("Flux vector is missing required flux index {0}")]
    MissingFluxIndex(usize),
    /// Substrate ratios were built without one of the 14 required substrates
    #[error("Substrate ratios are missing required substrate index {0}")]
    MissingSubstrateIndex(usize),
    /// A flux index outside of 1..=29
    #[error("Flux index {0} is outside of 1..=29")]
    UnknownFluxIndex(usize),
    /// A substrate index outside of 1..=14
    #[error("Substrate index {0} is outside of 1..=14")]
    UnknownSubstrateIndex(usize),
    /// A flux value which is NaN or infinite
    #[error("Value for flux v{0} is not finite")]
    NonFiniteFlux(usize),
    /// A substrate ratio outside of [0, 1]
    #[error("Ratio {ratio} for substrate {index} is outside of [0, 1]")]
    RatioOutOfRange { index: usize, ratio: f64 },
    /// A label scale that is not a positive finite number
    #[error("Scale for flux v{index} must be positive and finite, got {scale}")]
    InvalidScale { index: usize, scale: f64 },
    /// A dense vector of the wrong length
    #[error("Expected {expected} values, got {found}")]
    LengthMismatch { expected: usize, found: usize },
}
