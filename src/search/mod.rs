//! Exhaustive grid search over pipeline hyperparameters
//!
//! Every combination in the declared grid is scored by k-fold
//! cross-validation. Enumeration order is fixed by the declaration order
//! of the parameters (the last declared parameter varies fastest), and the
//! best candidate is the first one reaching the maximum mean score, so the
//! selection does not depend on the degree of parallelism used.

use crate::error::{MbtiError, Result};
use crate::eval::cross_validation::{cross_validate, CvResults};
use crate::features::pipeline::TextPipeline;
use crate::models::{Classifier, ParamValue};
use crate::parallel::WorkerPool;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Ordered mapping from parameter name to candidate values.
#[derive(Debug, Clone, Default)]
pub struct ParameterGrid {
    entries: Vec<(String, Vec<ParamValue>)>,
}

impl ParameterGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a parameter and its candidates. Redeclaring a name replaces
    /// its previous candidates, keeping its original position.
    pub fn add(mut self, name: impl Into<String>, values: Vec<ParamValue>) -> Self {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = values,
            None => self.entries.push((name, values)),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Declared parameter names, in declaration order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Product of per-parameter candidate counts.
    pub fn n_combinations(&self) -> usize {
        self.entries.iter().map(|(_, values)| values.len()).product()
    }

    /// Every combination, odometer-style: the last declared parameter
    /// varies fastest.
    pub fn combinations(&self) -> Vec<Vec<(String, ParamValue)>> {
        let mut combos = vec![Vec::new()];
        for (name, values) in &self.entries {
            let mut next = Vec::with_capacity(combos.len() * values.len());
            for combo in &combos {
                for value in values {
                    let mut extended = combo.clone();
                    extended.push((name.clone(), value.clone()));
                    next.push(extended);
                }
            }
            combos = next;
        }
        combos
    }
}

/// Cross-validated outcome of one parameter combination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateResult {
    pub params: Vec<(String, ParamValue)>,
    pub cv: CvResults,
}

/// Outcome of a full grid search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSearchResult {
    /// The winning combination, in grid declaration order
    pub best_params: Vec<(String, ParamValue)>,
    /// Mean cross-validation score of the winner
    pub best_score: f64,
    /// Every candidate, in enumeration order
    pub results: Vec<CandidateResult>,
}

impl GridSearchResult {
    /// One line per parameter of the winning combination.
    pub fn describe_best(&self) -> String {
        let mut lines: Vec<String> = self
            .best_params
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value))
            .collect();
        lines.push(format!("score: {:.4}", self.best_score));
        lines.join("\n")
    }
}

/// Exhaustively evaluate `grid` against `pipeline` with k-fold
/// cross-validation, dispatching candidates onto the worker pool.
///
/// Parameter names are validated against the pipeline before any fitting
/// work starts. Ties on mean score go to the first combination in
/// enumeration order; sequential and parallel runs select the same winner.
pub fn grid_search<C>(
    pipeline: &TextPipeline<C>,
    grid: &ParameterGrid,
    docs: &[Vec<String>],
    labels: &[String],
    folds: usize,
    pool: &WorkerPool,
) -> Result<GridSearchResult>
where
    C: Classifier + Clone,
{
    if grid.is_empty() {
        return Err(MbtiError::Config(
            "parameter grid declares no parameters".to_string(),
        ));
    }
    for (name, values) in &grid.entries {
        if values.is_empty() {
            return Err(MbtiError::Config(format!(
                "parameter {:?} has no candidate values",
                name
            )));
        }
        if !pipeline.supports_param(name) {
            return Err(MbtiError::Config(format!(
                "parameter {:?} is not recognized by any pipeline stage",
                name
            )));
        }
    }

    let combos = grid.combinations();
    tracing::info!(
        candidates = combos.len(),
        folds,
        workers = pool.degree(),
        "starting grid search"
    );

    let outcomes: Vec<Result<CandidateResult>> = pool.install(|| {
        combos
            .into_par_iter()
            .map(|combo| {
                let mut candidate = pipeline.clone();
                for (name, value) in &combo {
                    candidate.set_param(name, value)?;
                }
                let cv = cross_validate(&candidate, docs, labels, folds)?;
                tracing::debug!(mean = cv.mean_score, "candidate scored");
                Ok(CandidateResult { params: combo, cv })
            })
            .collect()
    });

    let results: Vec<CandidateResult> = outcomes.into_iter().collect::<Result<_>>()?;

    // First strict maximum in enumeration order wins
    let mut best_idx = 0;
    for (idx, candidate) in results.iter().enumerate() {
        if candidate.cv.mean_score > results[best_idx].cv.mean_score {
            best_idx = idx;
        }
    }

    Ok(GridSearchResult {
        best_params: results[best_idx].params.clone(),
        best_score: results[best_idx].cv.mean_score,
        results,
    })
}
