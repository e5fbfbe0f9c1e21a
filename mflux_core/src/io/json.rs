//! Module providing JSON input for flux vectors, substrate ratios, boundaries and label scales
//!
//! Flux vectors, substrate ratios and label scales are objects keyed by their 1 based index,
//! e.g. `{"1": 100.0, "2": -2.7, ...}`. Boundary requests are keyed by their bound token,
//! e.g. `{"lb29": 999.0, "ub8": 50.0}`.
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::network::{FluxVector, SubstrateRatios};
use crate::optimize::boundary::BoundaryRequest;
use crate::optimize::objective::LabelScales;

/// Read and validate any of the JSON inputs
pub fn read_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, JsonError> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) => return Err(JsonError::UnableToRead(format!("{:?}", err))),
    };
    match serde_json::from_str::<T>(&data) {
        Ok(value) => Ok(value),
        Err(err) => Err(JsonError::UnableToParse(err.to_string())),
    }
}

impl FluxVector {
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<FluxVector, JsonError> {
        read_json(path)
    }

    /// Serialize to an index keyed JSON object
    pub fn to_json_string(&self) -> Result<String, JsonError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl SubstrateRatios {
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<SubstrateRatios, JsonError> {
        read_json(path)
    }
}

impl BoundaryRequest {
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<BoundaryRequest, JsonError> {
        read_json(path)
    }
}

impl LabelScales {
    /// Read label scales, usually once at startup before wrapping them in an `Arc`
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<LabelScales, JsonError> {
        read_json(path)
    }
}

#[derive(Error, Debug)]
pub enum JsonError {
    #[error("Unable to read file due to {0}")]
    UnableToRead(String),
    #[error("Unable to parse json due to {0}")]
    UnableToParse(String),
    #[error("Serde json error")]
    SerdeJsonError(#[from] serde_json::Error),
}

#[cfg(test)]
mod json_tests {
    use std::path::PathBuf;

    use super::*;
    use crate::network::{FluxId, Substrate};
    use crate::optimize::boundary::{BoundDirection, BoundKey, BoundaryError};

    fn data_path(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("test_data")
            .join(name)
    }

    #[test]
    fn read_predicted_fluxes() {
        let fluxes = FluxVector::read_json(data_path("predicted_glucose.json")).unwrap();
        assert!((fluxes.get(FluxId::of(1)) - 100.0).abs() < 1e-25);
        assert!((fluxes.get(FluxId::of(26)) + 1.2424).abs() < 1e-12);
        assert!((fluxes.get(FluxId::of(29)) - 26.7451).abs() < 1e-12);
    }

    #[test]
    fn read_substrates() {
        let substrates = SubstrateRatios::read_json(data_path("substrates_glucose.json")).unwrap();
        assert_eq!(substrates.get(Substrate::Glucose), 1.0);
        assert_eq!(substrates.sum_of(&Substrate::ALL), 1.0);
    }

    #[test]
    fn read_scales() {
        let scales = LabelScales::read_json(data_path("label_scales.json")).unwrap();
        assert!((scales.get(FluxId::of(5)) - 0.25).abs() < 1e-25);
    }

    #[test]
    fn read_boundaries() {
        let boundaries = BoundaryRequest::read_json(data_path("boundaries.json")).unwrap();
        assert_eq!(boundaries.len(), 2);
        let key = BoundKey {
            direction: BoundDirection::Upper,
            flux: FluxId::of(7),
        };
        assert_eq!(boundaries.get(&key), Some(120.0));
    }

    #[test]
    fn missing_file() {
        let res = FluxVector::read_json(data_path("no_such_file.json"));
        assert!(matches!(res, Err(JsonError::UnableToRead(_))));
    }

    #[test]
    fn invalid_contents() {
        // Missing v2 onwards
        let res = serde_json::from_str::<FluxVector>(r#"{"1": 100.0}"#);
        assert!(res.is_err());

        let res = serde_json::from_str::<BoundaryRequest>(r#"{"xb3": 1.0}"#);
        assert!(res.is_err());
        assert_eq!(
            BoundaryRequest::from_tokens([("xb3", 1.0)]),
            Err(BoundaryError::InvalidBoundarySpec(String::from("xb3")))
        );

        let res = serde_json::from_str::<SubstrateRatios>(r#"{"1": 1.5}"#);
        assert!(res.is_err());
    }

    #[test]
    fn flux_vector_round_trip() {
        let fluxes = FluxVector::from_entries((1..=29).map(|i| (i, i as f64 / 4.0))).unwrap();
        let json = fluxes.to_json_string().unwrap();
        assert!(json.starts_with(r#"{"1":0.25,"2":0.5"#));
        let parsed: FluxVector = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, fluxes);
    }
}
