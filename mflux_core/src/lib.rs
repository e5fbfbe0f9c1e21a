//! Core rust implementation of MFlux flux reconciliation.
//!
//! Predicted central carbon fluxes are adjusted to the closest flux vector that respects the
//! network stoichiometry for the given substrates, plus any user supplied bounds.
pub mod configuration;
pub mod io;
pub mod network;
pub mod optimize;
pub mod reconcile;
pub mod workflow;

pub use reconcile::{reconcile, FluxReconciler, ReconcileError};
