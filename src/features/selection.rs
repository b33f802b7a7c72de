//! Chi-squared feature selection

use crate::error::{MbtiError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// How many features to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectK {
    /// Keep every feature (selection becomes a pass-through).
    All,
    /// Keep the top k features by score.
    K(usize),
}

/// Selects the features most associated with the label by a chi-squared
/// score over non-negative feature values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectKBest {
    k: SelectK,
    scores: Option<Vec<f64>>,
    selected: Option<Vec<usize>>,
}

impl Default for SelectKBest {
    fn default() -> Self {
        Self::all()
    }
}

impl SelectKBest {
    /// Pass-through selector keeping every feature.
    pub fn all() -> Self {
        Self {
            k: SelectK::All,
            scores: None,
            selected: None,
        }
    }

    /// Selector keeping the top `k` features; `k` must be at least 1.
    pub fn top_k(k: usize) -> Result<Self> {
        if k == 0 {
            return Err(MbtiError::Config(
                "k must be at least 1 (use SelectK::All to keep everything)".to_string(),
            ));
        }
        Ok(Self {
            k: SelectK::K(k),
            scores: None,
            selected: None,
        })
    }

    /// Change k, discarding any fitted selection.
    pub fn set_k(&mut self, k: SelectK) -> Result<()> {
        if k == SelectK::K(0) {
            return Err(MbtiError::Config(
                "k must be at least 1 (use SelectK::All to keep everything)".to_string(),
            ));
        }
        self.k = k;
        self.scores = None;
        self.selected = None;
        Ok(())
    }

    pub fn k(&self) -> SelectK {
        self.k
    }

    /// Chi-squared scores from the last fit, in original column order.
    pub fn scores(&self) -> Option<&[f64]> {
        self.scores.as_deref()
    }

    /// Indices of the retained columns, ascending.
    pub fn selected_indices(&self) -> Option<&[usize]> {
        self.selected.as_deref()
    }

    /// Score every feature against the class labels and record the top-k
    /// column set. `y` holds class indices.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(MbtiError::Validation(format!(
                "feature matrix has {} rows but {} labels given",
                x.nrows(),
                y.len()
            )));
        }
        let scores = chi2_scores(x, y)?;

        let selected = match self.k {
            SelectK::All => (0..x.ncols()).collect(),
            SelectK::K(k) => {
                let mut ranked: Vec<usize> = (0..x.ncols()).collect();
                // Highest score first; equal scores keep the lower index.
                ranked.sort_by(|&a, &b| {
                    scores[b]
                        .partial_cmp(&scores[a])
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then(a.cmp(&b))
                });
                let mut kept: Vec<usize> = ranked.into_iter().take(k.min(x.ncols())).collect();
                kept.sort_unstable();
                kept
            }
        };

        self.scores = Some(scores);
        self.selected = Some(selected);
        Ok(())
    }

    /// Project a matrix onto the retained columns.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let selected = self.selected.as_ref().ok_or_else(|| {
            MbtiError::Unfitted("feature selector not fitted; call fit first".to_string())
        })?;

        let mut out = Array2::zeros((x.nrows(), selected.len()));
        for (new_col, &old_col) in selected.iter().enumerate() {
            if old_col >= x.ncols() {
                return Err(MbtiError::Validation(format!(
                    "selected column {} out of bounds for matrix with {} columns",
                    old_col,
                    x.ncols()
                )));
            }
            out.column_mut(new_col).assign(&x.column(old_col));
        }
        Ok(out)
    }

    pub fn fit_transform(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Array2<f64>> {
        self.fit(x, y)?;
        self.transform(x)
    }
}

/// Chi-squared association score per feature, for non-negative features
/// and categorical labels: compares observed per-class feature mass
/// against the mass expected from class frequencies alone.
fn chi2_scores(x: &Array2<f64>, y: &Array1<f64>) -> Result<Vec<f64>> {
    let n_samples = x.nrows();
    let n_features = x.ncols();
    if n_samples == 0 {
        return Err(MbtiError::Validation(
            "cannot score features on an empty matrix".to_string(),
        ));
    }
    if let Some(v) = x.iter().find(|&&v| v < 0.0) {
        return Err(MbtiError::Validation(format!(
            "chi-squared scoring requires non-negative features, found {}",
            v
        )));
    }

    let mut classes: Vec<i64> = y.iter().map(|&v| v as i64).collect();
    classes.sort_unstable();
    classes.dedup();

    // Per-class observed mass for each feature.
    let mut observed = vec![vec![0.0; n_features]; classes.len()];
    let mut class_counts = vec![0usize; classes.len()];
    for (row, &label) in x.rows().into_iter().zip(y.iter()) {
        let class_idx = classes
            .binary_search(&(label as i64))
            .map_err(|_| MbtiError::Validation("label missing from class set".to_string()))?;
        class_counts[class_idx] += 1;
        for (j, &v) in row.iter().enumerate() {
            observed[class_idx][j] += v;
        }
    }

    let feature_totals: Vec<f64> = (0..n_features)
        .map(|j| observed.iter().map(|per_class| per_class[j]).sum())
        .collect();

    let mut scores = vec![0.0; n_features];
    for (class_idx, per_class) in observed.iter().enumerate() {
        let class_prob = class_counts[class_idx] as f64 / n_samples as f64;
        for j in 0..n_features {
            let expected = class_prob * feature_totals[j];
            if expected > 0.0 {
                let diff = per_class[j] - expected;
                scores[j] += diff * diff / expected;
            }
        }
    }
    Ok(scores)
}
