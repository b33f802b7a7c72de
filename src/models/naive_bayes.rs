//! Multinomial naive Bayes for count-like features

use crate::error::{MbtiError, Result};
use crate::models::{bad_param_value, unknown_param, Classifier, ParamValue};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Multinomial naive Bayes with Laplace smoothing.
///
/// Feature values are treated as (possibly fractional) term counts; they
/// must be non-negative. With `fit_prior` off, a uniform class prior is
/// used instead of the empirical one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultinomialNb {
    alpha: f64,
    fit_prior: bool,
    classes: Vec<i64>,
    class_log_priors: Vec<f64>,
    feature_log_probs: Vec<Vec<f64>>,
}

impl Default for MultinomialNb {
    fn default() -> Self {
        Self::new(1.0, true)
    }
}

impl MultinomialNb {
    pub fn new(alpha: f64, fit_prior: bool) -> Self {
        Self {
            alpha,
            fit_prior,
            classes: Vec::new(),
            class_log_priors: Vec::new(),
            feature_log_probs: Vec::new(),
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn fit_prior(&self) -> bool {
        self.fit_prior
    }

    fn clear_fitted_state(&mut self) {
        self.classes.clear();
        self.class_log_priors.clear();
        self.feature_log_probs.clear();
    }

    /// Joint log-likelihood of each row under each class.
    fn joint_log_likelihood(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.classes.is_empty() {
            return Err(MbtiError::Unfitted(
                "naive Bayes model not fitted; call fit first".to_string(),
            ));
        }
        let n_features = self.feature_log_probs[0].len();
        if x.ncols() != n_features {
            return Err(MbtiError::Validation(format!(
                "expected {} features, got {}",
                n_features,
                x.ncols()
            )));
        }

        let mut scores = Array2::zeros((x.nrows(), self.classes.len()));
        for (i, row) in x.rows().into_iter().enumerate() {
            for (c, log_probs) in self.feature_log_probs.iter().enumerate() {
                let likelihood: f64 = row
                    .iter()
                    .zip(log_probs.iter())
                    .map(|(&count, &log_p)| count * log_p)
                    .sum();
                scores[[i, c]] = self.class_log_priors[c] + likelihood;
            }
        }
        Ok(scores)
    }
}

impl Classifier for MultinomialNb {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if x.nrows() == 0 || x.nrows() != y.len() {
            return Err(MbtiError::Training(format!(
                "cannot fit on {} rows with {} labels",
                x.nrows(),
                y.len()
            )));
        }
        if x.iter().any(|&v| v < 0.0) {
            return Err(MbtiError::Training(
                "multinomial naive Bayes requires non-negative features".to_string(),
            ));
        }
        self.clear_fitted_state();

        let n_samples = x.nrows();
        let n_features = x.ncols();

        let mut classes: Vec<i64> = y.iter().map(|&v| v as i64).collect();
        classes.sort_unstable();
        classes.dedup();

        let mut class_counts = vec![0usize; classes.len()];
        let mut feature_counts = vec![vec![self.alpha; n_features]; classes.len()];
        for (row, &label) in x.rows().into_iter().zip(y.iter()) {
            let c = classes
                .binary_search(&(label as i64))
                .map_err(|_| MbtiError::Training("label missing from class set".to_string()))?;
            class_counts[c] += 1;
            for (j, &v) in row.iter().enumerate() {
                feature_counts[c][j] += v;
            }
        }

        self.class_log_priors = if self.fit_prior {
            class_counts
                .iter()
                .map(|&count| (count as f64 / n_samples as f64).ln())
                .collect()
        } else {
            vec![(1.0 / classes.len() as f64).ln(); classes.len()]
        };

        self.feature_log_probs = feature_counts
            .into_iter()
            .map(|counts| {
                let total: f64 = counts.iter().sum();
                counts.into_iter().map(|c| (c / total).ln()).collect()
            })
            .collect();

        self.classes = classes;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let scores = self.joint_log_likelihood(x)?;
        Ok(scores
            .rows()
            .into_iter()
            .map(|row| {
                let best = row
                    .iter()
                    .enumerate()
                    .max_by(|(_, a), (_, b)| {
                        a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal)
                    })
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                self.classes[best] as f64
            })
            .collect())
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        match (name, value) {
            ("alpha", ParamValue::Float(v)) if *v > 0.0 => self.alpha = *v,
            ("alpha", _) => return Err(bad_param_value("naive Bayes", name, value)),
            ("fit_prior", ParamValue::Bool(v)) => self.fit_prior = *v,
            ("fit_prior", _) => return Err(bad_param_value("naive Bayes", name, value)),
            _ => return Err(unknown_param("naive Bayes", name)),
        }
        self.clear_fitted_state();
        Ok(())
    }

    fn supports_param(&self, name: &str) -> bool {
        matches!(name, "alpha" | "fit_prior")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn count_data() -> (Array2<f64>, Array1<f64>) {
        // Class 0 concentrates mass in the first two features, class 1 in
        // the last two.
        let x = array![
            [5.0, 3.0, 1.0, 0.0],
            [4.0, 4.0, 0.0, 1.0],
            [6.0, 2.0, 1.0, 0.0],
            [0.0, 1.0, 5.0, 4.0],
            [1.0, 0.0, 4.0, 5.0],
            [0.0, 0.0, 6.0, 3.0],
        ];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_separable_counts_classified() {
        let (x, y) = count_data();
        let mut nb = MultinomialNb::default();
        nb.fit(&x, &y).unwrap();

        let accuracy = nb.score(&x, &y).unwrap();
        assert!(accuracy > 0.8, "accuracy too low: {}", accuracy);
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let nb = MultinomialNb::default();
        let err = nb.predict(&array![[1.0]]).unwrap_err();
        assert!(matches!(err, MbtiError::Unfitted(_)));
    }

    #[test]
    fn test_negative_features_rejected() {
        let mut nb = MultinomialNb::default();
        let err = nb.fit(&array![[-1.0]], &array![0.0]).unwrap_err();
        assert!(matches!(err, MbtiError::Training(_)));
    }

    #[test]
    fn test_set_param() {
        let mut nb = MultinomialNb::default();
        nb.set_param("alpha", &ParamValue::Float(0.01)).unwrap();
        assert_eq!(nb.alpha(), 0.01);
        nb.set_param("fit_prior", &ParamValue::Bool(false)).unwrap();
        assert!(!nb.fit_prior());

        assert!(nb.set_param("alpha", &ParamValue::Float(0.0)).is_err());
        assert!(nb.set_param("gamma", &ParamValue::Float(1.0)).is_err());
        assert!(nb.supports_param("alpha"));
        assert!(!nb.supports_param("gamma"));
    }

    #[test]
    fn test_set_param_invalidates_fit() {
        let (x, y) = count_data();
        let mut nb = MultinomialNb::default();
        nb.fit(&x, &y).unwrap();
        nb.set_param("alpha", &ParamValue::Float(0.1)).unwrap();
        assert!(matches!(nb.predict(&x), Err(MbtiError::Unfitted(_))));
    }
}
