//! Provides the numeric QP handed to a solver backend
use nalgebra::{DMatrix, DVector};

use crate::optimize::constraint::ConstraintSystem;
use crate::optimize::objective::Objective;
use crate::optimize::solvers::SolverError;

/// A convex QP
///
/// `minimize 1/2 x^T P x + q^T x` subject to `A_ineq x <= b_ineq` and `A_eq x = b_eq`
#[derive(Debug, Clone, PartialEq)]
pub struct QpProblem {
    pub p: DMatrix<f64>,
    pub q: DVector<f64>,
    pub a_eq: DMatrix<f64>,
    pub b_eq: DVector<f64>,
    pub a_ineq: DMatrix<f64>,
    pub b_ineq: DVector<f64>,
}

/// Constraints of a [`QpProblem`] stacked as `[A_eq; A_ineq]`, with always satisfied rows
/// removed
#[derive(Debug, Clone, PartialEq)]
pub struct StackedConstraints {
    /// Stacked coefficient matrix, equality rows first
    pub a: DMatrix<f64>,
    /// Stacked right hand side
    pub b: Vec<f64>,
    /// Number of leading equality rows in `a`
    pub num_equalities: usize,
    /// Number of trailing inequality rows in `a`
    pub num_inequalities: usize,
}

impl QpProblem {
    /// Assemble a QP from an objective and a constraint system
    pub fn new(objective: Objective, constraints: &ConstraintSystem) -> Result<Self, SolverError> {
        QpProblem::from_parts(
            objective.p,
            objective.q,
            constraints.a_eq(),
            constraints.b_eq(),
            constraints.a_ineq(),
            constraints.b_ineq(),
        )
    }

    /// Assemble a QP from its matrices, checking that the dimensions agree
    pub fn from_parts(
        p: DMatrix<f64>,
        q: DVector<f64>,
        a_eq: DMatrix<f64>,
        b_eq: DVector<f64>,
        a_ineq: DMatrix<f64>,
        b_ineq: DVector<f64>,
    ) -> Result<Self, SolverError> {
        let n = q.len();
        if p.shape() != (n, n) {
            return Err(SolverError::DimensionMismatch(format!(
                "P is {:?}, expected ({}, {})",
                p.shape(),
                n,
                n
            )));
        }
        if a_eq.ncols() != n || a_eq.nrows() != b_eq.len() {
            return Err(SolverError::DimensionMismatch(format!(
                "A_eq is {:?} with {} right hand sides over {} variables",
                a_eq.shape(),
                b_eq.len(),
                n
            )));
        }
        if a_ineq.ncols() != n || a_ineq.nrows() != b_ineq.len() {
            return Err(SolverError::DimensionMismatch(format!(
                "A_ineq is {:?} with {} right hand sides over {} variables",
                a_ineq.shape(),
                b_ineq.len(),
                n
            )));
        }
        if p != p.transpose() {
            return Err(SolverError::NonSymmetricObjective);
        }
        Ok(QpProblem {
            p,
            q,
            a_eq,
            b_eq,
            a_ineq,
            b_ineq,
        })
    }

    /// Number of variables
    pub fn num_variables(&self) -> usize {
        self.q.len()
    }

    /// Stack the constraints for a backend
    ///
    /// Rows without any nonzero coefficient never reach the backend. Such a row either holds
    /// for every `x` and is dropped, or holds for none and the problem is reported infeasible
    /// right away.
    pub fn stacked_constraints(&self) -> Result<StackedConstraints, SolverError> {
        let n = self.num_variables();
        let mut rows: Vec<usize> = Vec::new();
        let mut b = Vec::new();

        for (r, rhs) in self.b_eq.iter().enumerate() {
            if self.a_eq.row(r).iter().all(|c| *c == 0.0) {
                if *rhs != 0.0 {
                    return Err(SolverError::InfeasibleConstraints);
                }
                continue;
            }
            rows.push(r);
            b.push(*rhs);
        }
        let num_equalities = rows.len();

        let mut ineq_rows: Vec<usize> = Vec::new();
        for (r, rhs) in self.b_ineq.iter().enumerate() {
            if self.a_ineq.row(r).iter().all(|c| *c == 0.0) {
                if *rhs < 0.0 {
                    return Err(SolverError::InfeasibleConstraints);
                }
                continue;
            }
            ineq_rows.push(r);
            b.push(*rhs);
        }
        let num_inequalities = ineq_rows.len();

        let a = DMatrix::from_fn(num_equalities + num_inequalities, n, |r, c| {
            if r < num_equalities {
                self.a_eq[(rows[r], c)]
            } else {
                self.a_ineq[(ineq_rows[r - num_equalities], c)]
            }
        });
        Ok(StackedConstraints {
            a,
            b,
            num_equalities,
            num_inequalities,
        })
    }
}
