//! Solver interface for OSQP solver
//!
//! OSQP takes constraints as `l <= A x <= u`. Equalities use `l = u = b_eq`, inequalities use
//! `l = -inf`, `u = b_ineq`.
use std::borrow::Cow;

use ::osqp::{CscMatrix, Problem, Settings, Status};
use log::{debug, warn};
use nalgebra::DMatrix;

use crate::optimize::problem::QpProblem;
use crate::optimize::solvers::{checked_solution, csc_parts, QpSettings, QpSolver, SolverError};
use crate::optimize::{OptimizationStatus, QpSolution};

/// OSQP operator splitting backend
#[derive(Clone, Debug)]
pub struct OsqpSolver {
    settings: QpSettings,
}

impl OsqpSolver {
    pub fn new(settings: QpSettings) -> Self {
        OsqpSolver { settings }
    }
}

fn to_osqp_csc(matrix: &DMatrix<f64>) -> CscMatrix<'static> {
    let (indptr, indices, data) = csc_parts(matrix);
    CscMatrix {
        nrows: matrix.nrows(),
        ncols: matrix.ncols(),
        indptr: Cow::Owned(indptr),
        indices: Cow::Owned(indices),
        data: Cow::Owned(data),
    }
}

impl QpSolver for OsqpSolver {
    fn name(&self) -> &'static str {
        "osqp"
    }

    fn solve(&self, problem: &QpProblem) -> Result<QpSolution, SolverError> {
        let stacked = problem.stacked_constraints()?;
        debug!(
            "OSQP: {} variables, {} equalities, {} inequalities",
            problem.num_variables(),
            stacked.num_equalities,
            stacked.num_inequalities
        );

        let p = to_osqp_csc(&problem.p.upper_triangle());
        let a = to_osqp_csc(&stacked.a);
        let lower = stacked
            .b
            .iter()
            .enumerate()
            .map(|(r, b)| {
                if r < stacked.num_equalities {
                    *b
                } else {
                    -f64::INFINITY
                }
            })
            .collect::<Vec<_>>();

        let settings = Settings::default()
            .verbose(self.settings.verbose)
            .eps_abs(self.settings.tolerance)
            .eps_rel(self.settings.tolerance)
            .max_iter(self.settings.max_iterations)
            .polish(true);
        let mut osqp_problem = Problem::new(
            p,
            problem.q.as_slice(),
            a,
            &lower,
            &stacked.b,
            &settings,
        )
        .map_err(|e| SolverError::InvalidSettings(format!("{:?}", e)))?;

        match osqp_problem.solve() {
            Status::Solved(solution) => checked_solution(
                solution.x().to_vec(),
                problem,
                OptimizationStatus::Optimal,
                solution.iter(),
            ),
            Status::SolvedInaccurate(solution) => {
                warn!("OSQP reached only reduced accuracy");
                checked_solution(
                    solution.x().to_vec(),
                    problem,
                    OptimizationStatus::AlmostOptimal,
                    solution.iter(),
                )
            }
            Status::PrimalInfeasible(_) | Status::PrimalInfeasibleInaccurate(_) => {
                Err(SolverError::InfeasibleConstraints)
            }
            Status::MaxIterationsReached(_) => Err(SolverError::SolverNonconvergence {
                status: String::from("MaxIterationsReached"),
            }),
            Status::TimeLimitReached(_) => Err(SolverError::SolverNonconvergence {
                status: String::from("TimeLimitReached"),
            }),
            _ => Err(SolverError::NumericalError(String::from(
                "OSQP reported a dual infeasible or non convex problem",
            ))),
        }
    }
}

#[cfg(all(test, feature = "osqp"))]
mod tests {
    use super::*;
    use crate::optimize::solvers::QpSettingsBuilder;
    use nalgebra::DVector;

    fn solver() -> OsqpSolver {
        // Operator splitting needs more iterations than an interior point method
        let settings = QpSettingsBuilder::default()
            .tolerance(1e-7)
            .max_iterations(10_000)
            .verbose(false)
            .build()
            .unwrap();
        OsqpSolver::new(settings)
    }

    #[test]
    fn projection_onto_halfspace() {
        // Project (2, 2) onto x + y = 1, x <= 0.25
        let problem = QpProblem::from_parts(
            DMatrix::identity(2, 2),
            DVector::from_vec(vec![-2.0, -2.0]),
            DMatrix::from_row_slice(1, 2, &[1.0, 1.0]),
            DVector::from_vec(vec![1.0]),
            DMatrix::from_row_slice(1, 2, &[1.0, 0.0]),
            DVector::from_vec(vec![0.25]),
        )
        .unwrap();
        let solution = solver().solve(&problem).unwrap();
        assert!((solution.x[0] - 0.25).abs() < 1e-4);
        assert!((solution.x[1] - 0.75).abs() < 1e-4);
    }

    #[test]
    fn unconstrained_optimum_is_kept() {
        let problem = QpProblem::from_parts(
            DMatrix::identity(2, 2),
            DVector::from_vec(vec![-3.0, 4.0]),
            DMatrix::zeros(0, 2),
            DVector::zeros(0),
            DMatrix::from_row_slice(1, 2, &[1.0, 0.0]),
            DVector::from_vec(vec![10.0]),
        )
        .unwrap();
        let solution = solver().solve(&problem).unwrap();
        assert!((solution.x[0] - 3.0).abs() < 1e-4);
        assert!((solution.x[1] + 4.0).abs() < 1e-4);
    }

    #[test]
    fn infeasible() {
        // x = 2 and x <= 1
        let problem = QpProblem::from_parts(
            DMatrix::identity(1, 1),
            DVector::from_vec(vec![0.0]),
            DMatrix::from_row_slice(1, 1, &[1.0]),
            DVector::from_vec(vec![2.0]),
            DMatrix::from_row_slice(1, 1, &[1.0]),
            DVector::from_vec(vec![1.0]),
        )
        .unwrap();
        assert_eq!(
            solver().solve(&problem).unwrap_err(),
            SolverError::InfeasibleConstraints
        );
    }

    #[test]
    fn backend_selection() {
        let solver = crate::optimize::solvers::new_solver(
            crate::configuration::Solver::Osqp,
            QpSettings::default(),
        );
        assert_eq!(solver.name(), "osqp");
    }
}
