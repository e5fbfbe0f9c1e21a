//! Calling workflow around the reconciler: species screening, prediction and reconciliation
//!
//! The flux prediction itself is done by an external model, represented here by the
//! [`FluxPredictor`] trait.
use std::error::Error;
use std::sync::Arc;
use std::time::Instant;

use log::info;
use thiserror::Error;

use crate::network::{FluxVector, SubstrateRatios};
use crate::optimize::boundary::BoundaryRequest;
use crate::optimize::objective::LabelScales;
use crate::reconcile::{FluxReconciler, ReconcileError};

/// Species ids above this value are special species, which are never reconciled
pub const SPECIAL_SPECIES_THRESHOLD: u32 = 200;

/// Produces a raw flux prediction for a culture
pub trait FluxPredictor {
    fn predict(&self, request: &PredictionRequest) -> Result<FluxVector, Box<dyn Error + Send + Sync>>;
}

/// A culture to predict fluxes for
#[derive(Clone, Debug, PartialEq)]
pub struct PredictionRequest {
    /// Species id, as used by the prediction models
    pub species: u32,
    pub substrates: SubstrateRatios,
    pub boundaries: BoundaryRequest,
}

/// A species whose metabolism the prediction models don't cover
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SpecialSpecies {
    /// Requested species id
    pub id: u32,
    /// Name of the species, None for ids without a description
    pub name: Option<&'static str>,
    /// Literature describing the fluxes of the species
    pub references: &'static [&'static str],
}

static SPECIAL_SPECIES: [(u32, &str, &[&str]); 6] = [
    (
        201,
        "Cyanothece 51142",
        &["http://link.springer.com/article/10.1007%2Fs11120-013-9911-5"],
    ),
    (
        202,
        "Chlorobaculum tepidum",
        &["http://www.jbc.org/content/285/50/39544.short"],
    ),
    (
        203,
        "Synechocystis 6803",
        &[
            "http://pcp.oxfordjournals.org/content/55/9/1605.long",
            "http://www.sciencedirect.com/science/article/pii/S1096717611000887",
            "http://www.nature.com/articles/nplants201553",
            "http://jb.asm.org/content/197/5/943.long",
        ],
    ),
    (
        204,
        "Rhodopseudomonas palustris",
        &[
            "http://www.pnas.org/content/107/26/11669.full",
            "http://www.jbc.org/content/289/4/1960.full",
        ],
    ),
    (
        205,
        "Dinoroseobacter shibae",
        &["http://bmcmicrobiol.biomedcentral.com/articles/10.1186/1471-2180-9-209"],
    ),
    (
        206,
        "Rhodobacter sphaeroides",
        &[
            "http://jb.asm.org/content/194/2/274.full.pdf",
            "http://jb.asm.org/content/187/5/1581.full",
        ],
    ),
];

/// Look up a species id, returning Some for every special species
///
/// Id 207 describes the same species as 205.
pub fn special_species(id: u32) -> Option<SpecialSpecies> {
    if id <= SPECIAL_SPECIES_THRESHOLD {
        return None;
    }
    let lookup = if id == 207 { 205 } else { id };
    let entry = SPECIAL_SPECIES.iter().find(|(known, _, _)| *known == lookup);
    Some(SpecialSpecies {
        id,
        name: entry.map(|(_, name, _)| *name),
        references: entry.map(|(_, _, references)| *references).unwrap_or(&[]),
    })
}

/// Result of [`Workflow::predict_fluxes`]
#[derive(Clone, Debug, PartialEq)]
pub enum PredictionOutcome {
    /// The species is special, nothing was predicted
    SpecialSpecies(SpecialSpecies),
    /// Reconciled fluxes
    Reconciled(FluxVector),
}

/// Predicts and reconciles fluxes for culture requests
///
/// The label scales are shared read only, so clones of the `Arc` can be handed to workflows
/// on other threads.
pub struct Workflow<P: FluxPredictor> {
    predictor: P,
    reconciler: FluxReconciler,
    scales: Option<Arc<LabelScales>>,
}

impl<P: FluxPredictor> Workflow<P> {
    pub fn new(predictor: P, reconciler: FluxReconciler) -> Self {
        Workflow {
            predictor,
            reconciler,
            scales: None,
        }
    }

    /// Weight the reconciliation with shared label scales
    pub fn with_scales(mut self, scales: Arc<LabelScales>) -> Self {
        self.scales = Some(scales);
        self
    }

    /// Predict and reconcile the fluxes of a culture
    ///
    /// Special species return immediately, without calling the predictor or the reconciler.
    /// Otherwise the uptake derived lower bounds are added to the request's boundaries before
    /// reconciling.
    pub fn predict_fluxes(
        &self,
        request: &PredictionRequest,
    ) -> Result<PredictionOutcome, WorkflowError> {
        if let Some(species) = special_species(request.species) {
            info!(
                "Species {} is special ({}), skipping prediction",
                species.id,
                species.name.unwrap_or("unknown")
            );
            return Ok(PredictionOutcome::SpecialSpecies(species));
        }

        let start = Instant::now();
        let predicted = self
            .predictor
            .predict(request)
            .map_err(WorkflowError::Prediction)?;
        let boundaries = request
            .boundaries
            .clone()
            .with_uptake_defaults(&request.substrates);
        let fluxes = self.reconciler.reconcile(
            &predicted,
            &request.substrates,
            &boundaries,
            self.scales.as_deref(),
        )?;
        info!(
            "Prediction and reconciliation done in {:.5} seconds",
            start.elapsed().as_secs_f64()
        );
        Ok(PredictionOutcome::Reconciled(fluxes))
    }
}

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Flux prediction failed: {0}")]
    Prediction(Box<dyn Error + Send + Sync>),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}
