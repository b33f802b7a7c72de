//! Inverse-document-frequency weighting transform

use crate::error::{MbtiError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Reweights a term-count matrix by smoothed inverse document frequency
/// and L2-normalizes each row. With `use_idf` off only the normalization
/// is applied, which keeps the switch grid-searchable without changing
/// the pipeline shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfTransformer {
    use_idf: bool,
    idf: Option<Array1<f64>>,
}

impl Default for TfidfTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl TfidfTransformer {
    pub fn new() -> Self {
        Self {
            use_idf: true,
            idf: None,
        }
    }

    pub fn with_use_idf(use_idf: bool) -> Self {
        Self {
            use_idf,
            idf: None,
        }
    }

    /// Toggle IDF weighting, discarding fitted statistics.
    pub fn set_use_idf(&mut self, use_idf: bool) {
        self.use_idf = use_idf;
        self.idf = None;
    }

    pub fn use_idf(&self) -> bool {
        self.use_idf
    }

    /// Compute document frequencies and the smoothed IDF vector:
    /// `idf = ln((1 + n) / (1 + df)) + 1`.
    pub fn fit(&mut self, counts: &Array2<f64>) -> Result<()> {
        let n_docs = counts.nrows() as f64;
        let idf = counts
            .columns()
            .into_iter()
            .map(|col| {
                let df = col.iter().filter(|&&v| v > 0.0).count() as f64;
                ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0
            })
            .collect();
        self.idf = Some(idf);
        Ok(())
    }

    /// Apply IDF weighting (when enabled) and L2-normalize each row.
    /// All-zero rows stay all-zero.
    pub fn transform(&self, counts: &Array2<f64>) -> Result<Array2<f64>> {
        let idf = self.idf.as_ref().ok_or_else(|| {
            MbtiError::Unfitted("IDF statistics missing; call fit first".to_string())
        })?;
        if counts.ncols() != idf.len() {
            return Err(MbtiError::Validation(format!(
                "expected {} feature columns, got {}",
                idf.len(),
                counts.ncols()
            )));
        }

        let mut weighted = if self.use_idf {
            counts * idf
        } else {
            counts.clone()
        };

        for mut row in weighted.rows_mut() {
            let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                row.mapv_inplace(|v| v / norm);
            }
        }
        Ok(weighted)
    }

    pub fn fit_transform(&mut self, counts: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(counts)?;
        self.transform(counts)
    }
}
