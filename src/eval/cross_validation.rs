//! K-fold cross-validation

use crate::error::{MbtiError, Result};
use crate::features::pipeline::TextPipeline;
use crate::models::Classifier;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Cross-validation strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CvStrategy {
    /// K-Fold cross-validation
    KFold { n_splits: usize, shuffle: bool },
    /// Stratified K-Fold (maintains class distribution per fold)
    StratifiedKFold { n_splits: usize, shuffle: bool },
}

impl Default for CvStrategy {
    fn default() -> Self {
        CvStrategy::KFold {
            n_splits: 5,
            shuffle: false,
        }
    }
}

/// A single train/test split
#[derive(Debug, Clone)]
pub struct CvSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Cross-validation splitter
pub struct CrossValidator {
    strategy: CvStrategy,
    random_state: Option<u64>,
}

impl CrossValidator {
    pub fn new(strategy: CvStrategy) -> Self {
        Self {
            strategy,
            random_state: None,
        }
    }

    /// Set random state for reproducible shuffling
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Generate train/test splits. Stratified splitting needs the label of
    /// each sample as a class index.
    pub fn split(&self, n_samples: usize, y: Option<&[usize]>) -> Result<Vec<CvSplit>> {
        match &self.strategy {
            CvStrategy::KFold { n_splits, shuffle } => {
                self.k_fold_split(n_samples, *n_splits, *shuffle)
            }
            CvStrategy::StratifiedKFold { n_splits, shuffle } => {
                let y = y.ok_or_else(|| {
                    MbtiError::Validation(
                        "stratified k-fold requires the label array".to_string(),
                    )
                })?;
                self.stratified_k_fold_split(y, *n_splits, *shuffle)
            }
        }
    }

    fn rng(&self) -> ChaCha8Rng {
        match self.random_state {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    fn k_fold_split(&self, n_samples: usize, n_splits: usize, shuffle: bool) -> Result<Vec<CvSplit>> {
        if n_splits < 2 {
            return Err(MbtiError::Validation(
                "n_splits must be at least 2".to_string(),
            ));
        }
        if n_samples < n_splits {
            return Err(MbtiError::Validation(format!(
                "n_samples ({}) must be >= n_splits ({})",
                n_samples, n_splits
            )));
        }

        let mut indices: Vec<usize> = (0..n_samples).collect();
        if shuffle {
            indices.shuffle(&mut self.rng());
        }

        // Leading folds absorb the remainder, so sizes differ by at most one
        let fold_sizes: Vec<usize> = (0..n_splits)
            .map(|i| {
                let base = n_samples / n_splits;
                let remainder = n_samples % n_splits;
                if i < remainder {
                    base + 1
                } else {
                    base
                }
            })
            .collect();

        let mut splits = Vec::with_capacity(n_splits);
        let mut current = 0;

        for (fold_idx, &fold_size) in fold_sizes.iter().enumerate() {
            let test_indices: Vec<usize> = indices[current..current + fold_size].to_vec();
            let train_indices: Vec<usize> = indices[..current]
                .iter()
                .chain(indices[current + fold_size..].iter())
                .copied()
                .collect();

            splits.push(CvSplit {
                train_indices,
                test_indices,
                fold_idx,
            });
            current += fold_size;
        }

        Ok(splits)
    }

    fn stratified_k_fold_split(
        &self,
        y: &[usize],
        n_splits: usize,
        shuffle: bool,
    ) -> Result<Vec<CvSplit>> {
        if n_splits < 2 {
            return Err(MbtiError::Validation(
                "n_splits must be at least 2".to_string(),
            ));
        }

        // Group sample indices by class, in first-seen class order
        let mut class_order: Vec<usize> = Vec::new();
        let mut class_indices: Vec<Vec<usize>> = Vec::new();
        for (idx, &class) in y.iter().enumerate() {
            match class_order.iter().position(|&c| c == class) {
                Some(pos) => class_indices[pos].push(idx),
                None => {
                    class_order.push(class);
                    class_indices.push(vec![idx]);
                }
            }
        }

        if shuffle {
            let mut rng = self.rng();
            for indices in class_indices.iter_mut() {
                indices.shuffle(&mut rng);
            }
        }

        // Deal each class round-robin across the folds
        let mut folds: Vec<Vec<usize>> = vec![Vec::new(); n_splits];
        for indices in &class_indices {
            for (i, &idx) in indices.iter().enumerate() {
                folds[i % n_splits].push(idx);
            }
        }

        let mut splits = Vec::with_capacity(n_splits);
        for fold_idx in 0..n_splits {
            let test_indices = folds[fold_idx].clone();
            let train_indices: Vec<usize> = folds
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != fold_idx)
                .flat_map(|(_, fold)| fold.iter().copied())
                .collect();

            splits.push(CvSplit {
                train_indices,
                test_indices,
                fold_idx,
            });
        }

        Ok(splits)
    }
}

/// Cross-validation results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvResults {
    /// Accuracy for each fold
    pub scores: Vec<f64>,
    /// Mean accuracy across folds
    pub mean_score: f64,
    /// Standard deviation of fold accuracies
    pub std_score: f64,
    /// Number of folds
    pub n_folds: usize,
}

impl CvResults {
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n_folds = scores.len();
        let mean_score = scores.iter().sum::<f64>() / n_folds as f64;
        let variance = scores
            .iter()
            .map(|s| (s - mean_score).powi(2))
            .sum::<f64>()
            / n_folds as f64;
        let std_score = variance.sqrt();

        Self {
            scores,
            mean_score,
            std_score,
            n_folds,
        }
    }

    /// The conventional "mean ± two standard deviations" report line.
    pub fn summary(&self) -> String {
        format!(
            "Accuracy: {:.2} (+/- {:.2})",
            self.mean_score,
            self.std_score * 2.0
        )
    }
}

/// K-fold cross-validate a pipeline: for each fold, refit a clone on the
/// training portion and score it on the held-out portion. The input
/// pipeline itself is never mutated.
pub fn cross_validate<C>(
    pipeline: &TextPipeline<C>,
    docs: &[Vec<String>],
    labels: &[String],
    folds: usize,
) -> Result<CvResults>
where
    C: Classifier + Clone,
{
    if docs.len() != labels.len() {
        return Err(MbtiError::Validation(format!(
            "{} documents with {} labels",
            docs.len(),
            labels.len()
        )));
    }

    let splitter = CrossValidator::new(CvStrategy::KFold {
        n_splits: folds,
        shuffle: false,
    });
    let splits = splitter.split(docs.len(), None)?;

    let mut scores = Vec::with_capacity(splits.len());
    for split in splits {
        let train_docs: Vec<Vec<String>> = split
            .train_indices
            .iter()
            .map(|&i| docs[i].clone())
            .collect();
        let train_labels: Vec<String> = split
            .train_indices
            .iter()
            .map(|&i| labels[i].clone())
            .collect();
        let test_docs: Vec<Vec<String>> = split
            .test_indices
            .iter()
            .map(|&i| docs[i].clone())
            .collect();
        let test_labels: Vec<String> = split
            .test_indices
            .iter()
            .map(|&i| labels[i].clone())
            .collect();

        let mut fold_pipeline = pipeline.clone();
        fold_pipeline.fit(&train_docs, &train_labels)?;
        let score = fold_pipeline.score(&test_docs, &test_labels)?;
        tracing::debug!(fold = split.fold_idx, score, "cross-validation fold scored");
        scores.push(score);
    }

    Ok(CvResults::from_scores(scores))
}
