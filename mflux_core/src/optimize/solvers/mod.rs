//! QP solver backends
//!
//! Every backend implements [`QpSolver`]. A backend solves exactly the problem it is given, it
//! never retries, relaxes constraints or perturbs its inputs.
use derive_builder::Builder;
use log::warn;
use nalgebra::DMatrix;
use thiserror::Error;

use crate::configuration::{self, Solver};
use crate::optimize::problem::QpProblem;
use crate::optimize::{OptimizationStatus, QpSolution};

pub mod clarabel;
#[cfg(feature = "osqp")]
pub mod osqp;

/// A convex QP solver
pub trait QpSolver: Send + Sync {
    /// Short name of the backend, used in logs
    fn name(&self) -> &'static str;

    /// Solve `problem` to optimality
    ///
    /// # Returns
    /// - `Ok`: the optimal point, see [`QpSolution`]
    /// - `Err`: [`SolverError::InfeasibleConstraints`] if no point satisfies the
    ///     constraints, [`SolverError::SolverNonconvergence`] or
    ///     [`SolverError::NumericalError`] if the backend gave up
    fn solve(&self, problem: &QpProblem) -> Result<QpSolution, SolverError>;
}

/// Settings shared by every backend
#[derive(Builder, Clone, Debug, PartialEq)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct QpSettings {
    /// Feasibility and duality gap tolerance
    #[builder(default = "configuration::current().tolerance")]
    pub tolerance: f64,
    /// Iteration limit
    #[builder(default = "configuration::current().max_iterations")]
    pub max_iterations: u32,
    /// Print solver progress
    #[builder(default = "configuration::current().verbose")]
    pub verbose: bool,
}

impl Default for QpSettings {
    fn default() -> Self {
        let config = configuration::current();
        QpSettings {
            tolerance: config.tolerance,
            max_iterations: config.max_iterations,
            verbose: config.verbose,
        }
    }
}

impl QpSettingsBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(tolerance) = self.tolerance {
            if !(tolerance.is_finite() && tolerance > 0.0) {
                return Err(format!("tolerance must be positive, got {}", tolerance));
            }
        }
        if let Some(0) = self.max_iterations {
            return Err(String::from("max_iterations must be at least 1"));
        }
        Ok(())
    }
}

/// Create the backend selected by `solver`
///
/// Falls back to Clarabel when the selected backend was not compiled in.
pub fn new_solver(solver: Solver, settings: QpSettings) -> Box<dyn QpSolver> {
    match solver {
        Solver::Clarabel => Box::new(clarabel::ClarabelSolver::new(settings)),
        Solver::Osqp => {
            cfg_if::cfg_if! {
                if #[cfg(feature = "osqp")] {
                    Box::new(osqp::OsqpSolver::new(settings))
                } else {
                    warn!("OSQP requested but the osqp feature is not enabled, using Clarabel");
                    Box::new(clarabel::ClarabelSolver::new(settings))
                }
            }
        }
    }
}

/// Compressed sparse column arrays `(column offsets, row indices, values)` of a dense matrix,
/// explicit zeros dropped
pub(crate) fn csc_parts(matrix: &DMatrix<f64>) -> (Vec<usize>, Vec<usize>, Vec<f64>) {
    nalgebra_sparse::CscMatrix::from(matrix).disassemble()
}

/// Check a solution returned by a backend before handing it on
pub(crate) fn checked_solution(
    x: Vec<f64>,
    problem: &QpProblem,
    status: OptimizationStatus,
    iterations: u32,
) -> Result<QpSolution, SolverError> {
    if x.len() != problem.num_variables() {
        return Err(SolverError::NumericalError(format!(
            "solver returned {} values for {} variables",
            x.len(),
            problem.num_variables()
        )));
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(SolverError::NumericalError(String::from(
            "solver returned a non-finite value",
        )));
    }
    Ok(QpSolution {
        status,
        x,
        iterations,
    })
}

/// Errors associated with solving the QP
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// No point satisfies both the network and the boundary constraints
    #[error("No flux vector satisfies the network and boundary constraints")]
    InfeasibleConstraints,
    /// The backend stopped before reaching the requested accuracy
    #[error("QP solver did not converge (status {status})")]
    SolverNonconvergence { status: String },
    /// The backend ran into a numerical problem
    #[error("QP solver hit a numerical error: {0}")]
    NumericalError(String),
    /// The QP matrices have inconsistent shapes
    #[error("QP dimensions are inconsistent: {0}")]
    DimensionMismatch(String),
    /// The quadratic term is not a symmetric matrix
    #[error("Objective matrix P is not symmetric")]
    NonSymmetricObjective,
    /// The backend rejected its settings
    #[error("Invalid solver settings: {0}")]
    InvalidSettings(String),
}
