//! Integration tests for flux reconciliation against the Clarabel backend.
//!
//! Tests verify:
//! - Network structure for any substrate mix
//! - End to end reconciliation of the documented glucose prediction
//! - Infeasibility reporting, boundary monotonicity, rule precedence and idempotence

use std::path::PathBuf;
use std::sync::Arc;

use mflux_core::configuration::Configuration;
use mflux_core::network::topology::NetworkConstraintBuilder;
use mflux_core::network::{FluxId, FluxVector, IndexError, Substrate, SubstrateRatios};
use mflux_core::optimize::boundary::BoundaryRequest;
use mflux_core::optimize::objective::LabelScales;
use mflux_core::optimize::solvers::SolverError;
use mflux_core::{reconcile, FluxReconciler, ReconcileError};

const PREDICTED_GLUCOSE: [(usize, f64); 29] = [
    (1, 100.0),
    (2, -2.7159),
    (3, 15.2254),
    (4, 17.7016),
    (5, 110.9973),
    (6, 91.8578),
    (7, 137.7961),
    (8, 91.1558),
    (9, -0.7373),
    (10, 94.1518),
    (11, 24.1126),
    (12, 21.231),
    (13, 2.8816),
    (14, 11.0324),
    (15, 10.1986),
    (16, 11.0324),
    (17, 79.4203),
    (18, 79.4203),
    (19, 67.9442),
    (20, 67.8806),
    (21, 79.3567),
    (22, 79.3567),
    (23, 64.0876),
    (24, 11.4761),
    (25, 70.0392),
    (26, -1.2424),
    (27, 0.0059),
    (28, 23.2159),
    (29, 26.7451),
];

/// Satisfies every equality for 100 units of carbon uptake, with every inequality strictly
const INTERIOR_POINT: [f64; 29] = [
    100.0, 60.0, 50.0, 50.0, 100.0, 90.0, 60.0, 70.0, 1.0, 30.0, 25.0, 6.0, 19.0, 5.0, 1.0, 5.0,
    40.0, 40.0, 30.0, 20.0, 30.0, 35.0, 30.0, 10.0, 5.0, 2.0, 3.0, 20.0, 15.0,
];

fn flux(index: usize) -> FluxId {
    FluxId::new(index).unwrap()
}

fn predicted_glucose() -> FluxVector {
    FluxVector::from_entries(PREDICTED_GLUCOSE).unwrap()
}

fn substrates(entries: &[(Substrate, f64)]) -> SubstrateRatios {
    let mut ratios = SubstrateRatios::zeros().to_index_map();
    for (substrate, ratio) in entries {
        ratios.insert(substrate.index(), *ratio);
    }
    SubstrateRatios::from_entries(ratios).unwrap()
}

fn glucose() -> SubstrateRatios {
    substrates(&[(Substrate::Glucose, 1.0)])
}

fn scaled_point(scale: f64) -> FluxVector {
    let values = INTERIOR_POINT.iter().map(|v| v * scale).collect::<Vec<_>>();
    FluxVector::from_slice(&values).unwrap()
}

// ============================================================================
// Network structure
// ============================================================================

#[test]
fn test_row_counts_for_any_substrates() {
    for entries in [
        vec![(Substrate::Glucose, 1.0)],
        vec![(Substrate::Acetate, 0.6), (Substrate::Xylose, 0.4)],
        vec![(Substrate::Pyruvate, 0.2), (Substrate::Bicarbonate, 0.1)],
    ] {
        let system = NetworkConstraintBuilder::new(&substrates(&entries)).build();
        assert_eq!(system.num_equalities(), 10);
        assert_eq!(system.num_inequalities(), 12);
    }
}

#[test]
fn test_interior_point_is_feasible() {
    let system = NetworkConstraintBuilder::new(&glucose()).build();
    assert!(system.max_violation(&INTERIOR_POINT) < 1e-12);
}

// ============================================================================
// End to end
// ============================================================================

#[test]
fn test_glucose_fixture() {
    let fluxes = reconcile(
        &predicted_glucose(),
        &glucose(),
        &BoundaryRequest::new(),
        None,
    )
    .unwrap();
    assert!(
        (fluxes.get(flux(1)) - 100.0).abs() < 1e-6,
        "Glucose uptake should be fixed at 100, got {:.6}",
        fluxes.get(flux(1))
    );
    let system = NetworkConstraintBuilder::new(&glucose()).build();
    assert!(system.max_violation(fluxes.as_slice()) < 1e-6);
}

#[test]
fn test_glucose_fixture_with_scales() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_data")
        .join("label_scales.json");
    let scales = Arc::new(LabelScales::read_json(path).unwrap());
    let fluxes = FluxReconciler::new()
        .unwrap()
        .reconcile(
            &predicted_glucose(),
            &glucose(),
            &BoundaryRequest::new(),
            Some(&*scales),
        )
        .unwrap();
    assert!((fluxes.get(flux(1)) - 100.0).abs() < 1e-6);
    let system = NetworkConstraintBuilder::new(&glucose()).build();
    assert!(system.max_violation(fluxes.as_slice()) < 1e-6);
}

#[test]
fn test_contradicting_upper_bound_is_infeasible() {
    let boundaries = BoundaryRequest::from_tokens([("ub1", 50.0)]).unwrap();
    let res = reconcile(&predicted_glucose(), &glucose(), &boundaries, None);
    assert_eq!(
        res,
        Err(ReconcileError::Solver(SolverError::InfeasibleConstraints))
    );
}

#[test]
fn test_iteration_limit_is_reported_without_retry() {
    let config = Configuration {
        max_iterations: 1,
        ..Configuration::default()
    };
    let reconciler = FluxReconciler::from_configuration(&config).unwrap();
    let ratios = substrates(&[(Substrate::Glucose, 0.7), (Substrate::Acetate, 0.3)]);
    let res = reconciler.reconcile(&predicted_glucose(), &ratios, &BoundaryRequest::new(), None);
    assert!(
        matches!(
            res,
            Err(ReconcileError::Solver(SolverError::SolverNonconvergence { .. }))
        ),
        "Expected nonconvergence, got {:?}",
        res
    );
}

#[test]
fn test_missing_prediction_index() {
    let res = FluxVector::from_entries(PREDICTED_GLUCOSE.into_iter().filter(|(i, _)| *i != 17));
    let err: ReconcileError = res.unwrap_err().into();
    assert_eq!(err, ReconcileError::Index(IndexError::MissingFluxIndex(17)));
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_upper_bound_monotonicity() {
    let predicted = predicted_glucose();
    let reconciler = FluxReconciler::new().unwrap();

    let loose = BoundaryRequest::from_tokens([("ub7", 100.0)]).unwrap();
    let loose = reconciler
        .reconcile(&predicted, &glucose(), &loose, None)
        .unwrap();
    assert!(loose.get(flux(7)) <= 100.0 + 1e-6);

    let tight = BoundaryRequest::from_tokens([("ub7", 80.0)]).unwrap();
    let tight = reconciler
        .reconcile(&predicted, &glucose(), &tight, None)
        .unwrap();
    assert!(tight.get(flux(7)) <= 80.0 + 1e-6);
    assert!(tight.get(flux(7)) <= loose.get(flux(7)) + 1e-6);
}

#[test]
fn test_lower_bound_is_respected() {
    let boundaries = BoundaryRequest::from_tokens([("lb26", 5.0)]).unwrap();
    let fluxes = reconcile(&predicted_glucose(), &glucose(), &boundaries, None).unwrap();
    assert!(fluxes.get(flux(26)) >= 5.0 - 1e-6);
}

#[test]
fn test_acetate_rule_is_exact() {
    let ratios = substrates(&[(Substrate::Glucose, 0.7), (Substrate::Acetate, 0.3)]);
    let fluxes = reconcile(&scaled_point(0.7), &ratios, &BoundaryRequest::new(), None).unwrap();
    assert_eq!(fluxes.get(flux(9)), -100.0 * 0.3);
    assert!((fluxes.get(flux(1)) - 70.0).abs() < 1e-6);
}

#[test]
fn test_lactate_rule_is_exact() {
    // Lactate above 0.5 also activates the pentose phosphate ordering row
    let ratios = substrates(&[(Substrate::Glucose, 0.4), (Substrate::Lactate, 0.6)]);
    let fluxes = reconcile(&predicted_glucose(), &ratios, &BoundaryRequest::new(), None).unwrap();
    assert_eq!(fluxes.get(flux(27)), -100.0 * 0.6);
    assert!(fluxes.get(flux(6)) - fluxes.get(flux(7)) - fluxes.get(flux(28)) >= -1e-6);
}

#[test]
fn test_feasible_prediction_is_unchanged() {
    let predicted = FluxVector::from_slice(&INTERIOR_POINT).unwrap();
    let fluxes = reconcile(&predicted, &glucose(), &BoundaryRequest::new(), None).unwrap();
    for (id, value) in fluxes.iter() {
        assert!(
            (value - predicted.get(id)).abs() < 1e-6,
            "{} moved from {} to {}",
            id,
            predicted.get(id),
            value
        );
    }
}

#[test]
fn test_uptake_defaults_hold_acetate_flux() {
    let boundaries = BoundaryRequest::new().with_uptake_defaults(&glucose());
    assert_eq!(boundaries.len(), 2);
    let fluxes = reconcile(&predicted_glucose(), &glucose(), &boundaries, None).unwrap();
    // The prediction has v9 < 0, which the default lower bound rules out
    assert!(fluxes.get(flux(9)) >= -1e-6);
    assert!(fluxes.get(flux(27)) >= -1e-6);
}

#[test]
fn test_shared_reconciler_across_threads() {
    let reconciler = FluxReconciler::new().unwrap();
    let predicted = predicted_glucose();
    let ratios = glucose();
    let results = std::thread::scope(|scope| {
        let handles = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    reconciler
                        .reconcile(&predicted, &ratios, &BoundaryRequest::new(), None)
                        .unwrap()
                })
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect::<Vec<_>>()
    });
    for fluxes in &results[1..] {
        for (id, value) in fluxes.iter() {
            assert!((value - results[0].get(id)).abs() < 1e-9);
        }
    }
}
