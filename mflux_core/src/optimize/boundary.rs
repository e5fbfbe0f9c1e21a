//! User supplied bounds on individual fluxes, and their conversion into inequality rows
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use indexmap::IndexMap;
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::network::{FluxId, SubstrateRatios};
use crate::optimize::constraint::ConstraintRow;
use crate::reconcile::rules::UPTAKE_RULES;

/// Side of a flux which a bound limits
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BoundDirection {
    /// The flux must be at least the bound
    Lower,
    /// The flux must be at most the bound
    Upper,
}

impl BoundDirection {
    /// The token prefix used for this direction
    pub fn token(self) -> &'static str {
        match self {
            BoundDirection::Lower => "lb",
            BoundDirection::Upper => "ub",
        }
    }
}

impl FromStr for BoundDirection {
    type Err = BoundaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lb" => Ok(BoundDirection::Lower),
            "ub" => Ok(BoundDirection::Upper),
            _ => Err(BoundaryError::InvalidBoundarySpec(s.to_string())),
        }
    }
}

/// A (direction, flux) pair such as `ub8`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoundKey {
    pub direction: BoundDirection,
    pub flux: FluxId,
}

impl FromStr for BoundKey {
    type Err = BoundaryError;

    /// Parse a token made of a two letter direction followed by a 1 based flux index
    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let (direction, index) = match (token.get(..2), token.get(2..)) {
            (Some(direction), Some(index)) => (direction, index),
            _ => return Err(BoundaryError::InvalidBoundarySpec(token.to_string())),
        };
        let direction = match direction.parse::<BoundDirection>() {
            Ok(direction) => direction,
            Err(_) => return Err(BoundaryError::InvalidBoundarySpec(token.to_string())),
        };
        let flux = index
            .parse::<usize>()
            .ok()
            .and_then(FluxId::new)
            .ok_or_else(|| BoundaryError::InvalidFluxIndex(token.to_string()))?;
        Ok(BoundKey { direction, flux })
    }
}

impl Display for BoundKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.direction.token(), self.flux.get())
    }
}

/// Sparse set of bounds requested for individual fluxes
///
/// Lower bounds are stored as the value the flux must reach, `lb9 = 5` meaning `v9 >= 5`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IndexMap<String, f64>", into = "IndexMap<String, f64>")]
pub struct BoundaryRequest {
    bounds: IndexMap<BoundKey, f64>,
}

impl BoundaryRequest {
    /// Create a request without any bounds
    pub fn new() -> Self {
        BoundaryRequest::default()
    }

    /// Create a request from token keyed values such as `[("lb29", 999.), ("ub8", 50.)]`
    ///
    /// # Returns
    /// - `Ok`: the request
    /// - `Err`: [`BoundaryError::InvalidBoundarySpec`] for the first token with an unknown
    ///     direction, [`BoundaryError::InvalidFluxIndex`] for a token naming no flux, or
    ///     [`BoundaryError::NonFiniteBound`] for a NaN or infinite value
    ///
    /// # Examples
    /// ```rust
    /// use mflux_core::optimize::boundary::BoundaryRequest;
    /// let request = BoundaryRequest::from_tokens([("lb29", 999.), ("ub8", 50.)]).unwrap();
    /// assert_eq!(request.len(), 2);
    /// assert!(BoundaryRequest::from_tokens([("xb8", 50.)]).is_err());
    /// ```
    pub fn from_tokens<I, K>(tokens: I) -> Result<Self, BoundaryError>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let mut request = BoundaryRequest::new();
        for (token, value) in tokens {
            let key = token.as_ref().parse::<BoundKey>()?;
            request.insert(key, value)?;
        }
        Ok(request)
    }

    /// Create a request from raw form values, skipping blank entries
    ///
    /// Values are trimmed before parsing, so `" 50 "` is accepted and `""` is skipped.
    /// A value of `"0"` is a real bound and is kept.
    pub fn from_form_values<I, K, V>(values: I) -> Result<Self, BoundaryError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut request = BoundaryRequest::new();
        for (token, raw) in values {
            let raw = raw.as_ref().trim();
            if raw.is_empty() {
                continue;
            }
            let key = token.as_ref().parse::<BoundKey>()?;
            let value = raw
                .parse::<f64>()
                .map_err(|_| BoundaryError::UnparsableValue {
                    token: token.as_ref().to_string(),
                    value: raw.to_string(),
                })?;
            request.insert(key, value)?;
        }
        Ok(request)
    }

    /// Add or replace a bound, returning the previous value if there was one
    pub fn insert(&mut self, key: BoundKey, value: f64) -> Result<Option<f64>, BoundaryError> {
        if !value.is_finite() {
            return Err(BoundaryError::NonFiniteBound(key.to_string()));
        }
        Ok(self.bounds.insert(key, value))
    }

    /// Require `flux >= value`
    pub fn set_lower(&mut self, flux: FluxId, value: f64) -> Result<Option<f64>, BoundaryError> {
        self.insert(
            BoundKey {
                direction: BoundDirection::Lower,
                flux,
            },
            value,
        )
    }

    /// Require `flux <= value`
    pub fn set_upper(&mut self, flux: FluxId, value: f64) -> Result<Option<f64>, BoundaryError> {
        self.insert(
            BoundKey {
                direction: BoundDirection::Upper,
                flux,
            },
            value,
        )
    }

    /// The requested bound for a key, if any
    pub fn get(&self, key: &BoundKey) -> Option<f64> {
        self.bounds.get(key).copied()
    }

    /// Number of requested bounds
    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    /// True if no bounds were requested
    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Iterate over the bounds in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&BoundKey, &f64)> {
        self.bounds.iter()
    }

    /// Pin fluxes fed by an absent substrate at a lower bound of zero
    ///
    /// For every uptake rule whose substrate has a ratio of exactly zero, the lower bound of
    /// the rule's flux is set to zero, replacing any user value for that token.
    pub fn with_uptake_defaults(mut self, substrates: &SubstrateRatios) -> Self {
        for rule in UPTAKE_RULES.iter() {
            if substrates.get(rule.substrate) == 0.0 {
                self.bounds.insert(
                    BoundKey {
                        direction: BoundDirection::Lower,
                        flux: rule.flux,
                    },
                    0.0,
                );
            }
        }
        self
    }
}

impl TryFrom<IndexMap<String, f64>> for BoundaryRequest {
    type Error = BoundaryError;

    fn try_from(value: IndexMap<String, f64>) -> Result<Self, Self::Error> {
        BoundaryRequest::from_tokens(value)
    }
}

impl From<BoundaryRequest> for IndexMap<String, f64> {
    fn from(value: BoundaryRequest) -> Self {
        value
            .bounds
            .into_iter()
            .map(|(key, bound)| (key.to_string(), bound))
            .collect()
    }
}

/// Turns a [`BoundaryRequest`] into inequality rows in `<=` form
pub struct BoundaryConstraintBuilder<'a> {
    request: &'a BoundaryRequest,
}

impl<'a> BoundaryConstraintBuilder<'a> {
    /// Create a new builder for the given request
    pub fn new(request: &'a BoundaryRequest) -> Self {
        BoundaryConstraintBuilder { request }
    }

    /// One row per requested bound, in request order
    ///
    /// `ub k = v` becomes `v_k <= v`, `lb k = v` becomes `-v_k <= -v`.
    pub fn build(&self) -> Vec<ConstraintRow> {
        self.request
            .iter()
            .map(|(key, value)| match key.direction {
                BoundDirection::Upper => ConstraintRow::new(&[(key.flux, 1.0)], *value),
                BoundDirection::Lower => {
                    if *value < 0.0 {
                        warn!(
                            "Lower bound {} = {} is negative, applying it as {} >= {}",
                            key, value, key.flux, value
                        );
                    }
                    ConstraintRow::new(&[(key.flux, -1.0)], -*value)
                }
            })
            .collect()
    }
}

/// Errors raised while reading boundary requests
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundaryError {
    /// Token whose direction is neither `lb` nor `ub`
    #[error("Boundary token {0:?} does not start with a known direction (lb or ub)")]
    InvalidBoundarySpec(String),
    /// Token whose flux index is not within 1..=29
    #[error("Boundary token {0:?} does not name a flux in 1..=29")]
    InvalidFluxIndex(String),
    /// Value that can't be read as a number
    #[error("Value {value:?} for boundary token {token:?} is not a number")]
    UnparsableValue { token: String, value: String },
    /// Value that is NaN or infinite
    #[error("Value for boundary token {0:?} is not finite")]
    NonFiniteBound(String),
}
