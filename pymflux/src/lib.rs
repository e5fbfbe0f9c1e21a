use std::collections::HashMap;

use mflux_core::network::{FluxVector, SubstrateRatios};
use mflux_core::optimize::boundary::BoundaryRequest;
use mflux_core::optimize::objective::LabelScales;
use mflux_core::workflow;
use mflux_core::ReconcileError;

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

fn to_py_err(err: ReconcileError) -> PyErr {
    match err {
        ReconcileError::Solver(_) => PyRuntimeError::new_err(err.to_string()),
        _ => PyValueError::new_err(err.to_string()),
    }
}

/// Reconcile predicted fluxes with the network for the given substrate ratios
///
/// `predicted` and `scales` are keyed by flux index 1..=29, `substrates` by substrate index
/// 1..=14, and `boundaries` by tokens such as "lb29" or "ub8".
#[pyfunction]
#[pyo3(signature = (predicted, substrates, boundaries=None, scales=None))]
fn reconcile(
    predicted: HashMap<usize, f64>,
    substrates: HashMap<usize, f64>,
    boundaries: Option<HashMap<String, f64>>,
    scales: Option<HashMap<usize, f64>>,
) -> PyResult<HashMap<usize, f64>> {
    let predicted = FluxVector::from_entries(predicted)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    let substrates = SubstrateRatios::from_entries(substrates)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    let boundaries = match boundaries {
        Some(tokens) => BoundaryRequest::from_tokens(tokens)
            .map_err(|e| PyValueError::new_err(e.to_string()))?,
        None => BoundaryRequest::new(),
    };
    let scales = match scales {
        Some(scales) => Some(
            LabelScales::from_entries(scales).map_err(|e| PyValueError::new_err(e.to_string()))?,
        ),
        None => None,
    };
    let fluxes = mflux_core::reconcile(&predicted, &substrates, &boundaries, scales.as_ref())
        .map_err(to_py_err)?;
    Ok(fluxes.to_index_map().into_iter().collect())
}

/// Whether a species id is special, in which case fluxes must not be reconciled
#[pyfunction]
fn is_special_species(species: u32) -> bool {
    workflow::special_species(species).is_some()
}

/// Name of a special species, None if the id is not special or has no description
#[pyfunction]
fn special_species_name(species: u32) -> Option<&'static str> {
    workflow::special_species(species).and_then(|s| s.name)
}

/// A Python module implemented in Rust. The name of this function must match
/// the `lib.name` setting in the `Cargo.toml`, else Python will not be able to
/// import the module.
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(reconcile, m)?)?;
    m.add_function(wrap_pyfunction!(is_special_species, m)?)?;
    m.add_function(wrap_pyfunction!(special_species_name, m)?)?;
    Ok(())
}
