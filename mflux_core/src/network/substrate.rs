//! Carbon substrates and their uptake ratios
use std::fmt::{Display, Formatter};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::network::IndexError;

/// Number of tracked carbon substrates
pub const NUM_SUBSTRATES: usize = 14;

/// The 14 carbon substrates, numbered the way the prediction models encode them
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Substrate {
    Glucose = 1,
    Fructose = 2,
    Galactose = 3,
    Gluconate = 4,
    Glutamate = 5,
    Citrate = 6,
    Xylose = 7,
    Succinate = 8,
    Malate = 9,
    Lactate = 10,
    Pyruvate = 11,
    Glycerol = 12,
    Acetate = 13,
    /// NaHCO3
    Bicarbonate = 14,
}

impl Substrate {
    /// All substrates in index order
    pub const ALL: [Substrate; NUM_SUBSTRATES] = [
        Substrate::Glucose,
        Substrate::Fructose,
        Substrate::Galactose,
        Substrate::Gluconate,
        Substrate::Glutamate,
        Substrate::Citrate,
        Substrate::Xylose,
        Substrate::Succinate,
        Substrate::Malate,
        Substrate::Lactate,
        Substrate::Pyruvate,
        Substrate::Glycerol,
        Substrate::Acetate,
        Substrate::Bicarbonate,
    ];

    /// The 1 based substrate index
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The 0 based storage offset
    pub const fn offset(self) -> usize {
        self as usize - 1
    }

    /// Common name of the substrate
    pub fn name(self) -> &'static str {
        match self {
            Substrate::Glucose => "glucose",
            Substrate::Fructose => "fructose",
            Substrate::Galactose => "galactose",
            Substrate::Gluconate => "gluconate",
            Substrate::Glutamate => "glutamate",
            Substrate::Citrate => "citrate",
            Substrate::Xylose => "xylose",
            Substrate::Succinate => "succinate",
            Substrate::Malate => "malate",
            Substrate::Lactate => "lactate",
            Substrate::Pyruvate => "pyruvate",
            Substrate::Glycerol => "glycerol",
            Substrate::Acetate => "acetate",
            Substrate::Bicarbonate => "NaHCO3",
        }
    }
}

impl TryFrom<usize> for Substrate {
    type Error = IndexError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        if (1..=NUM_SUBSTRATES).contains(&value) {
            Ok(Substrate::ALL[value - 1])
        } else {
            Err(IndexError::UnknownSubstrateIndex(value))
        }
    }
}

impl Display for Substrate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Fraction of carbon uptake attributed to each substrate
///
/// Every ratio lies in [0, 1]. Carbon from sources outside the 14 tracked substrates is not
/// part of this map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IndexMap<usize, f64>", into = "IndexMap<usize, f64>")]
pub struct SubstrateRatios {
    ratios: [f64; NUM_SUBSTRATES],
}

impl SubstrateRatios {
    /// Ratios with no uptake of any tracked substrate
    pub fn zeros() -> Self {
        SubstrateRatios {
            ratios: [0.0; NUM_SUBSTRATES],
        }
    }

    /// Create substrate ratios from (1 based index, ratio) pairs, all 14 indices are required
    pub fn from_entries<I>(entries: I) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = (usize, f64)>,
    {
        let mut ratios = [None; NUM_SUBSTRATES];
        for (index, ratio) in entries {
            let substrate = Substrate::try_from(index)?;
            check_ratio(substrate, ratio)?;
            ratios[substrate.offset()] = Some(ratio);
        }
        let mut substrates = SubstrateRatios::zeros();
        for substrate in Substrate::ALL {
            match ratios[substrate.offset()] {
                Some(ratio) => substrates.ratios[substrate.offset()] = ratio,
                None => return Err(IndexError::MissingSubstrateIndex(substrate.index())),
            }
        }
        Ok(substrates)
    }

    /// Create substrate ratios from the primary and secondary carbon source of a culture
    ///
    /// Both sources may name the same substrate, in which case their ratios are added.
    ///
    /// # Examples
    /// ```rust
    /// use mflux_core::network::{Substrate, SubstrateRatios};
    /// let substrates = SubstrateRatios::from_carbon_sources(
    ///     (Substrate::Glucose, 0.7),
    ///     (Substrate::Acetate, 0.3),
    /// ).unwrap();
    /// assert_eq!(substrates.get(Substrate::Acetate), 0.3);
    /// ```
    pub fn from_carbon_sources(
        primary: (Substrate, f64),
        secondary: (Substrate, f64),
    ) -> Result<Self, IndexError> {
        let mut ratios = [0.0; NUM_SUBSTRATES];
        ratios[primary.0.offset()] += primary.1;
        ratios[secondary.0.offset()] += secondary.1;
        let substrates = SubstrateRatios { ratios };
        for (substrate, ratio) in substrates.iter() {
            check_ratio(substrate, ratio)?;
        }
        Ok(substrates)
    }

    /// Ratio of a single substrate
    pub fn get(&self, substrate: Substrate) -> f64 {
        self.ratios[substrate.offset()]
    }

    /// Sum of the ratios of the given substrates, added in the given order
    pub fn sum_of(&self, substrates: &[Substrate]) -> f64 {
        substrates.iter().fold(0.0, |sum, s| sum + self.get(*s))
    }

    /// Iterate over (substrate, ratio) pairs in index order
    pub fn iter(&self) -> impl Iterator<Item = (Substrate, f64)> + '_ {
        Substrate::ALL.iter().map(|s| (*s, self.get(*s)))
    }

    /// Convert into a map keyed by 1 based substrate index
    pub fn to_index_map(&self) -> IndexMap<usize, f64> {
        self.iter().map(|(s, ratio)| (s.index(), ratio)).collect()
    }
}

fn check_ratio(substrate: Substrate, ratio: f64) -> Result<(), IndexError> {
    if (0.0..=1.0).contains(&ratio) {
        Ok(())
    } else {
        Err(IndexError::RatioOutOfRange {
            index: substrate.index(),
            ratio,
        })
    }
}

impl TryFrom<IndexMap<usize, f64>> for SubstrateRatios {
    type Error = IndexError;

    fn try_from(value: IndexMap<usize, f64>) -> Result<Self, Self::Error> {
        SubstrateRatios::from_entries(value)
    }
}

impl From<SubstrateRatios> for IndexMap<usize, f64> {
    fn from(value: SubstrateRatios) -> Self {
        value.to_index_map()
    }
}
