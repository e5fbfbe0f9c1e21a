//! Strongly typed flux indices and the flux vector
//!
//! Fluxes are numbered 1 through 29 in the domain, and stored 0 based internally.
//! [`FluxId`] is the only place where that translation happens.
use std::fmt::{Display, Formatter};
use std::ops::Index;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::network::IndexError;

/// Number of fluxes tracked in the central carbon network
pub const NUM_FLUXES: usize = 29;

/// Index of one of the 29 tracked fluxes, always within 1..=29
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FluxId(u8);

impl FluxId {
    /// Create a new flux id from its 1 based index, or None if it is out of range
    pub const fn new(index: usize) -> Option<FluxId> {
        if index >= 1 && index <= NUM_FLUXES {
            Some(FluxId(index as u8))
        } else {
            None
        }
    }

    /// Flux id for use in static tables, fails at compile time when out of range
    pub(crate) const fn of(index: u8) -> FluxId {
        assert!(index >= 1 && index as usize <= NUM_FLUXES);
        FluxId(index)
    }

    /// The 1 based domain index
    pub const fn get(self) -> usize {
        self.0 as usize
    }

    /// The 0 based storage offset
    pub const fn offset(self) -> usize {
        self.0 as usize - 1
    }

    /// Flux id for a 0 based storage offset
    pub(crate) const fn from_offset(offset: usize) -> FluxId {
        FluxId::of(offset as u8 + 1)
    }

    /// Iterate over all flux ids in ascending order
    pub fn all() -> impl Iterator<Item = FluxId> {
        (1..=NUM_FLUXES as u8).map(FluxId)
    }

    /// Physiologically plausible range `(lower, upper)` of this flux, relative to 100 units of
    /// carbon uptake
    pub fn physiological_range(self) -> (f64, f64) {
        PHYSIOLOGICAL_RANGES[self.offset()]
    }
}

impl TryFrom<usize> for FluxId {
    type Error = IndexError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        FluxId::new(value).ok_or(IndexError::UnknownFluxIndex(value))
    }
}

impl Display for FluxId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Lower and upper flux values observed across the training data, by flux offset
const PHYSIOLOGICAL_RANGES: [(f64, f64); NUM_FLUXES] = [
    (0.0, 100.0),
    (-99.9, 99.5),
    (-51.5, 99.3),
    (-51.5, 99.3),
    (-13.5, 216.6),
    (-23.3, 196.2),
    (-36.0, 232.0),
    (-7.9, 213.1),
    (-144.0, 135.0),
    (0.0, 151.4),
    (0.0, 113.7),
    (-33.0, 94.1),
    (-94.4, 41.2),
    (-2.0, 47.5),
    (-6.6, 71.0),
    (-2.0, 47.5),
    (0.0, 189.0),
    (-0.1, 189.0),
    (-0.1, 189.0),
    (0.0, 194.0),
    (-105.0, 194.0),
    (-106.0, 194.0),
    (-144.3, 181.5),
    (0.0, 55.0),
    (0.0, 148.0),
    (0.0, 193.2),
    (-100.0, 151.0),
    (-67.60986805, 149.8),
    (-13.5, 104.2043714),
];

/// Values for all 29 fluxes, either an ML prediction or a reconciled solution
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IndexMap<usize, f64>", into = "IndexMap<usize, f64>")]
pub struct FluxVector {
    values: [f64; NUM_FLUXES],
}

impl FluxVector {
    /// Flux vector with every flux set to zero
    pub fn zeros() -> Self {
        FluxVector {
            values: [0.0; NUM_FLUXES],
        }
    }

    /// Create a flux vector from values ordered by flux index (v1 first)
    ///
    /// # Returns
    /// - `Ok`: the flux vector
    /// - `Err`: [`IndexError::LengthMismatch`] if there are not exactly 29 values, or
    ///     [`IndexError::NonFiniteFlux`] for the first NaN or infinite value
    pub fn from_slice(values: &[f64]) -> Result<Self, IndexError> {
        if values.len() != NUM_FLUXES {
            return Err(IndexError::LengthMismatch {
                expected: NUM_FLUXES,
                found: values.len(),
            });
        }
        let mut fluxes = FluxVector::zeros();
        for (offset, value) in values.iter().enumerate() {
            if !value.is_finite() {
                return Err(IndexError::NonFiniteFlux(offset + 1));
            }
            fluxes.values[offset] = *value;
        }
        Ok(fluxes)
    }

    /// Create a flux vector from (1 based index, value) pairs
    ///
    /// Every index in 1..=29 must be present. Later duplicates replace earlier ones.
    ///
    /// # Examples
    /// ```rust
    /// use mflux_core::network::FluxVector;
    /// let fluxes = FluxVector::from_entries((1..=29).map(|i| (i, 1.0))).unwrap();
    /// assert_eq!(fluxes.as_slice().len(), 29);
    /// ```
    pub fn from_entries<I>(entries: I) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = (usize, f64)>,
    {
        let mut values = [None; NUM_FLUXES];
        for (index, value) in entries {
            let id = FluxId::try_from(index)?;
            if !value.is_finite() {
                return Err(IndexError::NonFiniteFlux(index));
            }
            values[id.offset()] = Some(value);
        }
        let mut fluxes = FluxVector::zeros();
        for id in FluxId::all() {
            match values[id.offset()] {
                Some(value) => fluxes.values[id.offset()] = value,
                None => return Err(IndexError::MissingFluxIndex(id.get())),
            }
        }
        Ok(fluxes)
    }

    /// Value of a single flux
    pub fn get(&self, id: FluxId) -> f64 {
        self.values[id.offset()]
    }

    /// Overwrite the value of a single flux
    pub fn set(&mut self, id: FluxId, value: f64) {
        self.values[id.offset()] = value;
    }

    /// Iterate over (flux id, value) pairs in ascending flux order
    pub fn iter(&self) -> impl Iterator<Item = (FluxId, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(offset, value)| (FluxId::from_offset(offset), *value))
    }

    /// The values ordered by flux index
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Convert into a map keyed by 1 based flux index
    pub fn to_index_map(&self) -> IndexMap<usize, f64> {
        self.iter().map(|(id, value)| (id.get(), value)).collect()
    }
}

impl Index<FluxId> for FluxVector {
    type Output = f64;

    fn index(&self, id: FluxId) -> &Self::Output {
        &self.values[id.offset()]
    }
}

impl TryFrom<IndexMap<usize, f64>> for FluxVector {
    type Error = IndexError;

    fn try_from(value: IndexMap<usize, f64>) -> Result<Self, Self::Error> {
        FluxVector::from_entries(value)
    }
}

impl From<FluxVector> for IndexMap<usize, f64> {
    fn from(value: FluxVector) -> Self {
        value.to_index_map()
    }
}

impl Display for FluxVector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (id, value) in self.iter() {
            writeln!(f, "{} = {:.4},", id, value)?;
        }
        Ok(())
    }
}
