//! Provides the quadratic objective anchoring the reconciled fluxes to the prediction
use indexmap::IndexMap;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::network::{FluxId, FluxVector, IndexError, NUM_FLUXES};

/// Objective `minimize 1/2 x^T P x + q^T x`
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    /// Diagonal positive definite weight matrix
    pub p: DMatrix<f64>,
    /// Linear term
    pub q: DVector<f64>,
}

impl Objective {
    /// The diagonal of `P`
    pub fn weights(&self) -> DVector<f64> {
        self.p.diagonal()
    }

    /// Objective value at the given flux values
    pub fn value(&self, fluxes: &[f64]) -> f64 {
        let x = DVector::from_column_slice(fluxes);
        0.5 * (x.transpose() * &self.p * &x)[(0, 0)] + self.q.dot(&x)
    }
}

/// Per-flux scale factors from the label scaling stage of the prediction models
///
/// Loaded once and shared read-only between reconciliations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IndexMap<usize, f64>", into = "IndexMap<usize, f64>")]
pub struct LabelScales {
    scales: [f64; NUM_FLUXES],
}

impl LabelScales {
    /// Create label scales from (1 based flux index, scale) pairs
    ///
    /// Every flux needs a positive, finite scale.
    pub fn from_entries<I>(entries: I) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = (usize, f64)>,
    {
        let mut scales = [None; NUM_FLUXES];
        for (index, scale) in entries {
            let id = FluxId::try_from(index)?;
            if !(scale.is_finite() && scale > 0.0) {
                return Err(IndexError::InvalidScale { index, scale });
            }
            scales[id.offset()] = Some(scale);
        }
        let mut label_scales = LabelScales {
            scales: [1.0; NUM_FLUXES],
        };
        for id in FluxId::all() {
            match scales[id.offset()] {
                Some(scale) => label_scales.scales[id.offset()] = scale,
                None => return Err(IndexError::MissingFluxIndex(id.get())),
            }
        }
        Ok(label_scales)
    }

    /// Scale of a single flux
    pub fn get(&self, id: FluxId) -> f64 {
        self.scales[id.offset()]
    }
}

impl TryFrom<IndexMap<usize, f64>> for LabelScales {
    type Error = IndexError;

    fn try_from(value: IndexMap<usize, f64>) -> Result<Self, Self::Error> {
        LabelScales::from_entries(value)
    }
}

impl From<LabelScales> for IndexMap<usize, f64> {
    fn from(value: LabelScales) -> Self {
        FluxId::all().map(|id| (id.get(), value.get(id))).collect()
    }
}

/// Builds the [`Objective`] for a predicted flux vector
///
/// # Examples
/// ```rust
/// use mflux_core::network::FluxVector;
/// use mflux_core::optimize::objective::ObjectiveBuilder;
/// let predicted = FluxVector::from_slice(&[2.0; 29]).unwrap();
/// let objective = ObjectiveBuilder::new(&predicted).build();
/// assert_eq!(objective.q[0], -2.0);
/// ```
pub struct ObjectiveBuilder<'a> {
    predicted: &'a FluxVector,
    scales: Option<&'a LabelScales>,
}

impl<'a> ObjectiveBuilder<'a> {
    /// Create a new builder anchored at `predicted`
    pub fn new(predicted: &'a FluxVector) -> Self {
        ObjectiveBuilder {
            predicted,
            scales: None,
        }
    }

    /// Weight the deviation of each flux by its squared label scale
    pub fn with_scales(mut self, scales: Option<&'a LabelScales>) -> Self {
        self.scales = scales;
        self
    }

    /// Build `P = diag(s^2)` and `q = -diag(s^2) * predicted`, with `s = 1` when unscaled
    pub fn build(&self) -> Objective {
        let weights = DVector::from_iterator(
            NUM_FLUXES,
            FluxId::all().map(|id| match self.scales {
                Some(scales) => scales.get(id) * scales.get(id),
                None => 1.0,
            }),
        );
        let q = DVector::from_iterator(
            NUM_FLUXES,
            FluxId::all().map(|id| -(weights[id.offset()] * self.predicted.get(id))),
        );
        Objective {
            p: DMatrix::from_diagonal(&weights),
            q,
        }
    }
}
