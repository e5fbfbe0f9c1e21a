//! Module for constructing and solving the reconciliation QP

pub mod boundary;
pub mod constraint;
pub mod objective;
pub mod problem;
pub mod solvers;

/// Struct representing the solution to a QP
#[derive(Clone, Debug, PartialEq)]
pub struct QpSolution {
    /// How accurately the backend solved the problem
    pub status: OptimizationStatus,
    /// Values of the variables at the optimum, in variable order
    pub x: Vec<f64>,
    /// Number of iterations the backend used
    pub iterations: u32,
}

/// Status of a solved optimization problem
///
/// Failures are reported as [`solvers::SolverError`] instead of a status.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum OptimizationStatus {
    /// Problem has been optimized
    Optimal,
    /// An approximate solution has been found
    AlmostOptimal,
}
