//! Reconciliation of predicted fluxes with the network stoichiometry and user bounds
//!
//! The [`FluxReconciler`] finds the flux vector closest to a prediction which satisfies the
//! network constraints for the given substrates, plus any user supplied bounds, and then fixes
//! the uptake determined fluxes exactly.
//!
//! # Examples
//! ```rust
//! use mflux_core::network::{FluxVector, Substrate, SubstrateRatios};
//! use mflux_core::optimize::boundary::BoundaryRequest;
//! use mflux_core::reconcile::FluxReconciler;
//!
//! let substrates = SubstrateRatios::from_carbon_sources(
//!     (Substrate::Glucose, 1.0),
//!     (Substrate::Glucose, 0.0),
//! ).unwrap();
//! let predicted = FluxVector::from_slice(&[50.0; 29]).unwrap();
//! let reconciler = FluxReconciler::new().unwrap();
//! let fluxes = reconciler
//!     .reconcile(&predicted, &substrates, &BoundaryRequest::new(), None)
//!     .unwrap();
//! assert!((fluxes.as_slice()[0] - 100.0).abs() < 1e-6);
//! ```
pub mod report;
pub mod rules;

use std::time::Instant;

use log::{debug, info};
use thiserror::Error;

use crate::configuration::{self, Configuration};
use crate::network::topology::NetworkConstraintBuilder;
use crate::network::{FluxVector, IndexError, SubstrateRatios};
use crate::optimize::boundary::{BoundaryConstraintBuilder, BoundaryError, BoundaryRequest};
use crate::optimize::objective::{LabelScales, ObjectiveBuilder};
use crate::optimize::problem::QpProblem;
use crate::optimize::solvers::{new_solver, QpSettingsBuilder, QpSolver, SolverError};
use crate::reconcile::report::DiffReport;
use crate::reconcile::rules::RuleAdjuster;

/// Runs the full reconciliation pipeline with a fixed QP backend
///
/// A reconciler holds no per call state, so a single instance can serve concurrent requests.
pub struct FluxReconciler {
    solver: Box<dyn QpSolver>,
    diff_report: bool,
}

impl FluxReconciler {
    /// Create a reconciler from the current [`configuration::CONFIGURATION`]
    ///
    /// Later configuration changes do not affect the returned reconciler.
    pub fn new() -> Result<Self, ReconcileError> {
        FluxReconciler::from_configuration(&configuration::current())
    }

    /// Create a reconciler from an explicit configuration
    ///
    /// # Returns
    /// - `Ok`: the reconciler
    /// - `Err`: [`SolverError::InvalidSettings`] for a non-positive tolerance or an iteration
    ///     limit of zero
    pub fn from_configuration(config: &Configuration) -> Result<Self, ReconcileError> {
        let settings = QpSettingsBuilder::default()
            .tolerance(config.tolerance)
            .max_iterations(config.max_iterations)
            .verbose(config.verbose)
            .build()
            .map_err(|e| SolverError::InvalidSettings(e.to_string()))?;
        Ok(FluxReconciler {
            solver: new_solver(config.solver, settings),
            diff_report: config.diff_report,
        })
    }

    /// Replace the QP backend
    pub fn with_solver(mut self, solver: Box<dyn QpSolver>) -> Self {
        self.solver = solver;
        self
    }

    /// Enable or disable the per flux diff report logged after each reconciliation
    pub fn diff_report(mut self, enabled: bool) -> Self {
        self.diff_report = enabled;
        self
    }

    /// Name of the QP backend in use
    pub fn solver_name(&self) -> &'static str {
        self.solver.name()
    }

    /// Build the QP for a reconciliation without solving it
    pub fn build_problem(
        &self,
        predicted: &FluxVector,
        substrates: &SubstrateRatios,
        boundaries: &BoundaryRequest,
        scales: Option<&LabelScales>,
    ) -> Result<QpProblem, ReconcileError> {
        let mut constraints = NetworkConstraintBuilder::new(substrates).build();
        constraints.extend_inequalities(BoundaryConstraintBuilder::new(boundaries).build());
        let objective = ObjectiveBuilder::new(predicted).with_scales(scales).build();
        Ok(QpProblem::new(objective, &constraints)?)
    }

    /// Reconcile a predicted flux vector
    ///
    /// # Parameters
    /// - `predicted`: prediction the result should stay close to
    /// - `substrates`: substrate ratios, which fix the network right hand sides
    /// - `boundaries`: user bounds, may be empty
    /// - `scales`: optional per flux label scales weighting the distance to `predicted`
    ///
    /// # Returns
    /// - `Ok`: the reconciled flux vector, with uptake determined fluxes set exactly
    /// - `Err`: [`ReconcileError::Solver`] when no feasible vector exists or the backend fails.
    ///     No partial result is returned.
    pub fn reconcile(
        &self,
        predicted: &FluxVector,
        substrates: &SubstrateRatios,
        boundaries: &BoundaryRequest,
        scales: Option<&LabelScales>,
    ) -> Result<FluxVector, ReconcileError> {
        let start = Instant::now();
        let problem = self.build_problem(predicted, substrates, boundaries, scales)?;
        let solution = self.solver.solve(&problem)?;
        debug!(
            "{} finished with status {:?} after {} iterations",
            self.solver.name(),
            solution.status,
            solution.iterations
        );
        let solved = FluxVector::from_slice(&solution.x)?;
        let adjusted = RuleAdjuster::apply(solved, substrates);

        if self.diff_report {
            debug!("\n{}", DiffReport::new(&adjusted, predicted));
        }
        info!(
            "Reconciled fluxes in {:.3} ms",
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(adjusted)
    }
}

/// Reconcile `predicted` with a reconciler built from the current configuration
///
/// See [`FluxReconciler::reconcile`].
pub fn reconcile(
    predicted: &FluxVector,
    substrates: &SubstrateRatios,
    boundaries: &BoundaryRequest,
    scales: Option<&LabelScales>,
) -> Result<FluxVector, ReconcileError> {
    FluxReconciler::new()?.reconcile(predicted, substrates, boundaries, scales)
}

/// Errors which prevent a reconciled flux vector from being returned
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReconcileError {
    #[error("Invalid flux or substrate data: {0}")]
    Index(#[from] IndexError),
    #[error("Invalid boundary: {0}")]
    Boundary(#[from] BoundaryError),
    #[error(transparent)]
    Solver(#[from] SolverError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{FluxId, Substrate};

    fn glucose() -> SubstrateRatios {
        SubstrateRatios::from_carbon_sources((Substrate::Glucose, 1.0), (Substrate::Glucose, 0.0))
            .unwrap()
    }

    #[test]
    fn problem_dimensions() {
        let mut boundaries = BoundaryRequest::new();
        boundaries.set_upper(FluxId::of(7), 80.0).unwrap();
        boundaries.set_lower(FluxId::of(29), 1.0).unwrap();
        let problem = FluxReconciler::new()
            .unwrap()
            .build_problem(&FluxVector::zeros(), &glucose(), &boundaries, None)
            .unwrap();
        assert_eq!(problem.num_variables(), 29);
        assert_eq!(problem.a_eq.nrows(), 10);
        assert_eq!(problem.a_ineq.nrows(), 14);
    }

    #[test]
    fn infeasible_upper_bound() {
        let mut boundaries = BoundaryRequest::new();
        boundaries.set_upper(FluxId::of(1), 50.0).unwrap();
        let res = FluxReconciler::new().unwrap().reconcile(
            &FluxVector::from_slice(&[10.0; 29]).unwrap(),
            &glucose(),
            &boundaries,
            None,
        );
        assert_eq!(
            res,
            Err(ReconcileError::Solver(SolverError::InfeasibleConstraints))
        );
    }

    #[test]
    fn settings_snapshot() {
        let config = Configuration {
            diff_report: true,
            ..Configuration::default()
        };
        let reconciler = FluxReconciler::from_configuration(&config).unwrap();
        assert!(reconciler.diff_report);
        assert_eq!(reconciler.solver_name(), "clarabel");
        assert!(!reconciler.diff_report(false).diff_report);
    }

    #[test]
    fn invalid_configuration() {
        let config = Configuration {
            tolerance: -1.0,
            ..Configuration::default()
        };
        let res = FluxReconciler::from_configuration(&config);
        assert!(matches!(
            res,
            Err(ReconcileError::Solver(SolverError::InvalidSettings(_)))
        ));
    }

    #[test]
    fn diff_report_leaves_result_unchanged() {
        let predicted = FluxVector::from_slice(&[35.0; 29]).unwrap();
        let substrates = SubstrateRatios::from_carbon_sources(
            (Substrate::Glucose, 0.8),
            (Substrate::Lactate, 0.2),
        )
        .unwrap();
        let mut boundaries = BoundaryRequest::new();
        boundaries.set_upper(FluxId::of(7), 60.0).unwrap();

        let quiet = FluxReconciler::new()
            .unwrap()
            .diff_report(false)
            .reconcile(&predicted, &substrates, &boundaries, None)
            .unwrap();
        let reported = FluxReconciler::new()
            .unwrap()
            .diff_report(true)
            .reconcile(&predicted, &substrates, &boundaries, None)
            .unwrap();
        assert_eq!(quiet, reported);
    }
}
