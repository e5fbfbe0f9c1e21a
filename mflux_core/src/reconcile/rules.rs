//! Post solve overrides for fluxes fixed by measured substrate uptake
use log::debug;

use crate::network::{FluxId, FluxVector, Substrate, SubstrateRatios, UPTAKE_SCALE};

/// A flux which equals the negated, scaled uptake of a single substrate
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UptakeRule {
    /// Substrate whose ratio fixes the flux
    pub substrate: Substrate,
    /// Flux fixed by the substrate
    pub flux: FluxId,
}

impl UptakeRule {
    /// Value the flux takes when the substrate ratio is non-zero
    pub fn value(&self, substrates: &SubstrateRatios) -> Option<f64> {
        let ratio = substrates.get(self.substrate);
        if ratio != 0.0 {
            Some(-UPTAKE_SCALE * ratio)
        } else {
            None
        }
    }
}

/// Acetate uptake fixes v9, lactate uptake fixes v27
pub static UPTAKE_RULES: [UptakeRule; 2] = [
    UptakeRule {
        substrate: Substrate::Acetate,
        flux: FluxId::of(9),
    },
    UptakeRule {
        substrate: Substrate::Lactate,
        flux: FluxId::of(27),
    },
];

/// Applies [`UPTAKE_RULES`] to a solved flux vector
pub struct RuleAdjuster;

impl RuleAdjuster {
    /// Overwrite every flux whose substrate ratio is non-zero with its exact uptake value
    ///
    /// Entries not named by a rule are returned untouched.
    pub fn apply(mut fluxes: FluxVector, substrates: &SubstrateRatios) -> FluxVector {
        for rule in UPTAKE_RULES.iter() {
            if let Some(value) = rule.value(substrates) {
                debug!(
                    "Overriding {} from {:.4} to {:.4} ({} uptake)",
                    rule.flux,
                    fluxes.get(rule.flux),
                    value,
                    rule.substrate
                );
                fluxes.set(rule.flux, value);
            }
        }
        fluxes
    }
}
