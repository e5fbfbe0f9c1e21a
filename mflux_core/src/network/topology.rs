//! Fixed stoichiometric topology of the central carbon network
//!
//! The network is compiled into two static tables. [`EQUALITY_ROWS`] are mass balances
//! around shared intermediates. [`INEQUALITY_ROWS`] are pathway ordering relations, written
//! the way the network is usually stated (`terms >= rhs`). The substrate ratios of a request
//! only change the right hand sides and whether the gated row is populated.
use log::debug;

use crate::network::flux::FluxId;
use crate::network::substrate::{Substrate, SubstrateRatios};
use crate::network::UPTAKE_SCALE;
use crate::optimize::constraint::{ConstraintRow, ConstraintSystem};

/// Whether a network row takes part in a given request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowActivation {
    /// The row is always populated
    Always,
    /// The row is populated only when the summed ratio of `substrates` reaches `threshold`,
    /// otherwise it is replaced by a zero row of the same shape
    WhenUptakeAtLeast {
        substrates: &'static [Substrate],
        threshold: f64,
    },
}

/// One row of the network tables
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetworkRow {
    /// Short name used in logs and tests
    pub id: &'static str,
    /// (flux, coefficient) pairs of the row
    pub terms: &'static [(FluxId, f64)],
    /// Substrate ratios, with sign, whose sum times [`UPTAKE_SCALE`] is the right hand side
    pub rhs: &'static [(Substrate, f64)],
    /// When the row is populated
    pub activation: RowActivation,
}

impl NetworkRow {
    /// Right hand side of the row for the given substrate ratios
    pub fn rhs_value(&self, substrates: &SubstrateRatios) -> f64 {
        if self.rhs.is_empty() {
            return 0.0;
        }
        UPTAKE_SCALE
            * self
                .rhs
                .iter()
                .fold(0.0, |sum, (s, sign)| sum + sign * substrates.get(*s))
    }

    /// Whether the row is populated for the given substrate ratios
    pub fn is_active(&self, substrates: &SubstrateRatios) -> bool {
        match self.activation {
            RowActivation::Always => true,
            RowActivation::WhenUptakeAtLeast {
                substrates: gate,
                threshold,
            } => {
                let uptake = substrates.sum_of(gate);
                debug!(
                    "Row {} gated on uptake {} >= {}: {}",
                    self.id,
                    uptake,
                    threshold,
                    uptake >= threshold
                );
                uptake >= threshold
            }
        }
    }
}

const fn v(index: u8) -> FluxId {
    FluxId::of(index)
}

/// Substrates whose combined uptake switches on the pentose phosphate ordering row
pub const PPP_GATE_SUBSTRATES: [Substrate; 5] = [
    Substrate::Lactate,
    Substrate::Glutamate,
    Substrate::Acetate,
    Substrate::Citrate,
    Substrate::Pyruvate,
];

/// Combined uptake of [`PPP_GATE_SUBSTRATES`] from which the gated row is populated
pub const PPP_GATE_THRESHOLD: f64 = 0.5;

/// Mass balances, read as `terms = rhs`
pub static EQUALITY_ROWS: [NetworkRow; 10] = [
    NetworkRow {
        id: "eq01",
        terms: &[(v(1), 1.0)],
        rhs: &[(Substrate::Glucose, 1.0), (Substrate::Galactose, 1.0)],
        activation: RowActivation::Always,
    },
    NetworkRow {
        id: "eq02",
        terms: &[(v(3), 1.0), (v(4), -1.0)],
        rhs: &[(Substrate::Glycerol, -1.0)],
        activation: RowActivation::Always,
    },
    NetworkRow {
        id: "eq03",
        terms: &[(v(11), 1.0), (v(12), -1.0), (v(13), -1.0)],
        rhs: &[],
        activation: RowActivation::Always,
    },
    NetworkRow {
        id: "eq04",
        terms: &[(v(14), 1.0), (v(16), -1.0)],
        rhs: &[],
        activation: RowActivation::Always,
    },
    NetworkRow {
        id: "eq05",
        terms: &[(v(10), 1.0), (v(11), -1.0), (v(25), -1.0)],
        rhs: &[(Substrate::Gluconate, -1.0)],
        activation: RowActivation::Always,
    },
    NetworkRow {
        id: "eq06",
        terms: &[(v(18), 1.0), (v(17), -1.0)],
        rhs: &[(Substrate::Citrate, 1.0)],
        activation: RowActivation::Always,
    },
    NetworkRow {
        id: "eq07",
        terms: &[(v(15), 1.0), (v(12), -1.0), (v(14), 1.0)],
        rhs: &[(Substrate::Xylose, 1.0)],
        activation: RowActivation::Always,
    },
    NetworkRow {
        id: "eq08",
        terms: &[(v(24), 1.0), (v(18), -1.0), (v(19), 1.0)],
        rhs: &[],
        activation: RowActivation::Always,
    },
    NetworkRow {
        id: "eq09",
        terms: &[(v(22), -1.0), (v(23), 1.0), (v(24), -1.0), (v(29), 1.0)],
        rhs: &[(Substrate::Malate, 1.0)],
        activation: RowActivation::Always,
    },
    NetworkRow {
        id: "eq10",
        terms: &[(v(20), 1.0), (v(24), 1.0), (v(21), -1.0)],
        rhs: &[(Substrate::Succinate, -1.0)],
        activation: RowActivation::Always,
    },
];

/// Pathway ordering relations, read as `terms >= rhs` before conversion
pub static INEQUALITY_ROWS: [NetworkRow; 12] = [
    NetworkRow {
        id: "ge01",
        terms: &[(v(1), 1.0), (v(2), -1.0), (v(10), -1.0)],
        rhs: &[],
        activation: RowActivation::Always,
    },
    NetworkRow {
        id: "ge02",
        terms: &[(v(2), 1.0), (v(3), -1.0), (v(16), 2.0)],
        rhs: &[(Substrate::Fructose, 1.0)],
        activation: RowActivation::Always,
    },
    NetworkRow {
        id: "ge03",
        terms: &[
            (v(3), 1.0),
            (v(4), 1.0),
            (v(5), -1.0),
            (v(14), 1.0),
            (v(25), 1.0),
        ],
        rhs: &[],
        activation: RowActivation::Always,
    },
    NetworkRow {
        id: "ge04",
        terms: &[(v(5), 1.0), (v(6), -1.0)],
        rhs: &[],
        activation: RowActivation::Always,
    },
    NetworkRow {
        id: "ge05",
        terms: &[(v(6), 1.0), (v(7), -1.0), (v(28), -1.0)],
        rhs: &[],
        activation: RowActivation::WhenUptakeAtLeast {
            substrates: &PPP_GATE_SUBSTRATES,
            threshold: PPP_GATE_THRESHOLD,
        },
    },
    NetworkRow {
        id: "ge06",
        terms: &[
            (v(7), 1.0),
            (v(8), -1.0),
            (v(25), 1.0),
            (v(27), -1.0),
            (v(29), 1.0),
        ],
        rhs: &[(Substrate::Pyruvate, 1.0)],
        activation: RowActivation::Always,
    },
    NetworkRow {
        id: "ge07",
        terms: &[
            (v(8), 1.0),
            (v(9), -1.0),
            (v(17), -1.0),
            (v(24), -1.0),
            (v(26), -1.0),
        ],
        rhs: &[],
        activation: RowActivation::Always,
    },
    NetworkRow {
        id: "ge08",
        terms: &[(v(13), 1.0), (v(14), -1.0)],
        rhs: &[],
        activation: RowActivation::Always,
    },
    NetworkRow {
        id: "ge09",
        terms: &[(v(16), 1.0), (v(15), -1.0)],
        rhs: &[],
        activation: RowActivation::Always,
    },
    NetworkRow {
        id: "ge10",
        terms: &[(v(19), 1.0), (v(20), -1.0)],
        rhs: &[(Substrate::Glutamate, 1.0)],
        activation: RowActivation::Always,
    },
    NetworkRow {
        id: "ge11",
        terms: &[(v(23), 1.0), (v(17), -1.0), (v(28), 1.0)],
        rhs: &[],
        activation: RowActivation::Always,
    },
    NetworkRow {
        id: "ge12",
        terms: &[(v(21), -1.0), (v(22), 1.0)],
        rhs: &[],
        activation: RowActivation::Always,
    },
];

/// Builds the base [`ConstraintSystem`] of the network for one set of substrate ratios
pub struct NetworkConstraintBuilder<'a> {
    substrates: &'a SubstrateRatios,
}

impl<'a> NetworkConstraintBuilder<'a> {
    /// Create a new builder for the given substrate ratios
    pub fn new(substrates: &'a SubstrateRatios) -> Self {
        NetworkConstraintBuilder { substrates }
    }

    /// Build the 10 equality rows and 12 inequality rows, with inequalities in `<=` form
    pub fn build(&self) -> ConstraintSystem {
        let equalities = EQUALITY_ROWS
            .iter()
            .map(|row| ConstraintRow::new(row.terms, row.rhs_value(self.substrates)))
            .collect::<Vec<_>>();
        let inequalities = INEQUALITY_ROWS
            .iter()
            .map(|row| self.inequality_row(row))
            .collect::<Vec<_>>();
        debug!(
            "Built network constraints: {} equalities, {} inequalities",
            equalities.len(),
            inequalities.len()
        );
        ConstraintSystem {
            equalities,
            inequalities,
        }
    }

    /// Convert a `>=` network row into its `<=` solver row
    ///
    /// Coefficients are negated, the right hand side is carried over unchanged.
    fn inequality_row(&self, row: &NetworkRow) -> ConstraintRow {
        if row.is_active(self.substrates) {
            let negated = row
                .terms
                .iter()
                .map(|(flux, coefficient)| (*flux, -coefficient))
                .collect::<Vec<_>>();
            ConstraintRow::new(&negated, row.rhs_value(self.substrates))
        } else {
            ConstraintRow::zero()
        }
    }
}
