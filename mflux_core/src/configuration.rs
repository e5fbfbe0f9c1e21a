//! Process wide defaults for flux reconciliation
use std::sync::{LazyLock, RwLock};

pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

/// Defaults read when a [`crate::reconcile::FluxReconciler`] or
/// [`crate::optimize::solvers::QpSettings`] is created
#[derive(Clone, Debug, PartialEq)]
pub struct Configuration {
    /// Feasibility and duality gap tolerance handed to the QP backend
    pub tolerance: f64,
    /// Iteration limit for the QP backend
    pub max_iterations: u32,
    /// Which QP backend to use
    pub solver: Solver,
    /// Print solver progress
    pub verbose: bool,
    /// Compute and log a per-flux diff report after every reconciliation
    pub diff_report: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            tolerance: 1e-09,
            max_iterations: 200,
            solver: Solver::Clarabel,
            verbose: false,
            diff_report: false,
        }
    }
}

/// Enum used to specify the default solver to use
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Solver {
    /// Use the Clarabel interior point solver
    Clarabel,
    /// Use the OSQP Quadratic Program Solver, requires the osqp feature to be enabled
    Osqp,
}

/// Snapshot of the current configuration
///
/// A poisoned lock still holds a usable configuration, so it is read through rather than
/// reported.
pub fn current() -> Configuration {
    match CONFIGURATION.read() {
        Ok(config) => config.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Replace the process wide configuration
pub fn set(configuration: Configuration) {
    match CONFIGURATION.write() {
        Ok(mut config) => *config = configuration,
        Err(poisoned) => *poisoned.into_inner() = configuration,
    }
}
