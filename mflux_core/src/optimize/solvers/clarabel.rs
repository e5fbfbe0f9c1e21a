//! Implements a solver interface for Clarabel
//!
//! Clarabel solves `min 1/2 x^T P x + q^T x` subject to `A x + s = b`, `s` in a product of
//! cones. Equalities go into a zero cone, inequalities into a nonnegative cone, so `s = b - A x`
//! encodes `A_eq x = b_eq` and `A_ineq x <= b_ineq`.
use ::clarabel::algebra::CscMatrix;
use ::clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
};
use log::{debug, warn};

use crate::optimize::problem::QpProblem;
use crate::optimize::solvers::{checked_solution, csc_parts, QpSettings, QpSolver, SolverError};
use crate::optimize::{OptimizationStatus, QpSolution};

/// Clarabel interior point backend
#[derive(Clone, Debug)]
pub struct ClarabelSolver {
    settings: QpSettings,
}

impl ClarabelSolver {
    pub fn new(settings: QpSettings) -> Self {
        ClarabelSolver { settings }
    }
}

impl QpSolver for ClarabelSolver {
    fn name(&self) -> &'static str {
        "clarabel"
    }

    fn solve(&self, problem: &QpProblem) -> Result<QpSolution, SolverError> {
        let n = problem.num_variables();
        let stacked = problem.stacked_constraints()?;
        debug!(
            "Clarabel: {} variables, {} equalities, {} inequalities",
            n, stacked.num_equalities, stacked.num_inequalities
        );

        // P only needs its upper triangle
        let (colptr, rowval, nzval) = csc_parts(&problem.p.upper_triangle());
        let p = CscMatrix::new(n, n, colptr, rowval, nzval);
        let (colptr, rowval, nzval) = csc_parts(&stacked.a);
        let a = CscMatrix::new(stacked.a.nrows(), n, colptr, rowval, nzval);

        let mut cones = Vec::new();
        if stacked.num_equalities > 0 {
            cones.push(SupportedConeT::ZeroConeT(stacked.num_equalities));
        }
        if stacked.num_inequalities > 0 {
            cones.push(SupportedConeT::NonnegativeConeT(stacked.num_inequalities));
        }

        let tolerance = self.settings.tolerance;
        let settings = DefaultSettingsBuilder::default()
            .verbose(self.settings.verbose)
            .max_iter(self.settings.max_iterations)
            .tol_gap_abs(tolerance)
            .tol_gap_rel(tolerance)
            .tol_feas(tolerance)
            .build()
            .map_err(|e| SolverError::InvalidSettings(e.to_string()))?;

        let q = problem.q.as_slice().to_vec();
        let mut solver = DefaultSolver::new(&p, &q, &a, &stacked.b, &cones, settings);
        solver.solve();

        let status = solver.solution.status;
        let iterations = solver.solution.iterations;
        match status {
            SolverStatus::Solved => checked_solution(
                solver.solution.x.clone(),
                problem,
                OptimizationStatus::Optimal,
                iterations,
            ),
            SolverStatus::AlmostSolved => {
                warn!(
                    "Clarabel reached only reduced accuracy after {} iterations",
                    iterations
                );
                checked_solution(
                    solver.solution.x.clone(),
                    problem,
                    OptimizationStatus::AlmostOptimal,
                    iterations,
                )
            }
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                Err(SolverError::InfeasibleConstraints)
            }
            SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
                Err(SolverError::NumericalError(format!(
                    "objective reported unbounded ({:?})",
                    status
                )))
            }
            _ => Err(SolverError::SolverNonconvergence {
                status: format!("{:?}", status),
            }),
        }
    }
}
