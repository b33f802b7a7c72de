//! Linear-margin classifier trained with stochastic gradient descent
//!
//! Hinge loss with a configurable penalty makes this a linear SVM;
//! multiclass problems are handled one-vs-rest with one binary machine per
//! class.

use crate::error::{MbtiError, Result};
use crate::models::{bad_param_value, unknown_param, Classifier, ParamValue};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

/// Regularization penalty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Penalty {
    L2,
    L1,
    ElasticNet,
}

/// Learning-rate schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LearningRate {
    Constant,
    /// `1 / (alpha * (t + t0))`
    Optimal,
    /// `eta0 / t^power_t`
    InvScaling,
}

/// SGD hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SgdConfig {
    pub penalty: Penalty,
    /// Regularization strength
    pub alpha: f64,
    /// ElasticNet mixing (0 = pure L2, 1 = pure L1); only used with
    /// `Penalty::ElasticNet`
    pub l1_ratio: f64,
    pub max_iter: usize,
    pub tol: f64,
    pub learning_rate: LearningRate,
    pub eta0: f64,
    pub power_t: f64,
    pub random_state: Option<u64>,
}

impl Default for SgdConfig {
    fn default() -> Self {
        Self {
            penalty: Penalty::L2,
            alpha: 1e-4,
            l1_ratio: 0.15,
            max_iter: 1000,
            tol: 1e-3,
            learning_rate: LearningRate::Optimal,
            eta0: 0.01,
            power_t: 0.25,
            random_state: Some(42),
        }
    }
}

impl SgdConfig {
    fn learning_rate_at(&self, t: usize) -> f64 {
        match self.learning_rate {
            LearningRate::Constant => self.eta0,
            LearningRate::Optimal => {
                let t0 = 1.0 / (self.alpha * self.eta0);
                1.0 / (self.alpha * (t as f64 + t0))
            }
            LearningRate::InvScaling => self.eta0 / (t as f64 + 1.0).powf(self.power_t),
        }
    }

    fn l1_l2_coefficients(&self) -> (f64, f64) {
        let l1_ratio = match self.penalty {
            Penalty::L2 => 0.0,
            Penalty::L1 => 1.0,
            Penalty::ElasticNet => self.l1_ratio,
        };
        (self.alpha * l1_ratio, self.alpha * (1.0 - l1_ratio))
    }
}

fn soft_threshold(val: f64, threshold: f64) -> f64 {
    if val > threshold {
        val - threshold
    } else if val < -threshold {
        val + threshold
    } else {
        0.0
    }
}

/// One-vs-rest linear classifier with hinge loss.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SgdClassifier {
    config: SgdConfig,
    /// One weight row per class, in `classes` order
    weights: Option<Array2<f64>>,
    biases: Vec<f64>,
    classes: Vec<i64>,
}

impl Default for SgdClassifier {
    fn default() -> Self {
        Self::new(SgdConfig::default())
    }
}

impl SgdClassifier {
    pub fn new(config: SgdConfig) -> Self {
        Self {
            config,
            weights: None,
            biases: Vec::new(),
            classes: Vec::new(),
        }
    }

    pub fn config(&self) -> &SgdConfig {
        &self.config
    }

    fn clear_fitted_state(&mut self) {
        self.weights = None;
        self.biases.clear();
        self.classes.clear();
    }

    /// Train one binary hinge machine: +1 for the target class, -1 for the
    /// rest.
    fn fit_binary(
        &self,
        x: &Array2<f64>,
        y_signed: &[f64],
        seed: u64,
    ) -> (Array1<f64>, f64) {
        let n = x.nrows();
        let p = x.ncols();
        let (l1_coeff, l2_coeff) = self.config.l1_l2_coefficients();

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let mut w = Array1::zeros(p);
        let mut b = 0.0;
        let mut indices: Vec<usize> = (0..n).collect();
        let mut prev_loss = f64::MAX;
        let mut t = 1usize;

        for epoch in 0..self.config.max_iter {
            indices.shuffle(&mut rng);
            let mut epoch_loss = 0.0;

            for &i in &indices {
                let xi = x.row(i);
                let yi = y_signed[i];
                let margin = xi.dot(&w) + b;
                let lr = self.config.learning_rate_at(t);

                let dloss = if yi * margin < 1.0 {
                    epoch_loss += 1.0 - yi * margin;
                    -yi
                } else {
                    0.0
                };

                for j in 0..p {
                    let grad = dloss * xi[j] + l2_coeff * w[j];
                    w[j] -= lr * grad;
                    if l1_coeff > 0.0 {
                        w[j] = soft_threshold(w[j], lr * l1_coeff);
                    }
                }
                b -= lr * dloss;
                t += 1;
            }

            epoch_loss /= n as f64;
            if epoch > 0 && (prev_loss - epoch_loss).abs() < self.config.tol {
                break;
            }
            prev_loss = epoch_loss;
        }

        (w, b)
    }

    /// Per-class margins for each row.
    fn decision_function(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let weights = self.weights.as_ref().ok_or_else(|| {
            MbtiError::Unfitted("SGD model not fitted; call fit first".to_string())
        })?;
        if x.ncols() != weights.ncols() {
            return Err(MbtiError::Validation(format!(
                "expected {} features, got {}",
                weights.ncols(),
                x.ncols()
            )));
        }

        let mut margins = Array2::zeros((x.nrows(), self.classes.len()));
        for (i, row) in x.rows().into_iter().enumerate() {
            for (c, w) in weights.rows().into_iter().enumerate() {
                margins[[i, c]] = row.dot(&w) + self.biases[c];
            }
        }
        Ok(margins)
    }
}

impl Classifier for SgdClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if x.nrows() == 0 || x.nrows() != y.len() {
            return Err(MbtiError::Training(format!(
                "cannot fit on {} rows with {} labels",
                x.nrows(),
                y.len()
            )));
        }
        self.clear_fitted_state();

        let mut classes: Vec<i64> = y.iter().map(|&v| v as i64).collect();
        classes.sort_unstable();
        classes.dedup();
        if classes.len() < 2 {
            return Err(MbtiError::Training(
                "need at least two classes to fit a classifier".to_string(),
            ));
        }

        let base_seed = self.config.random_state.unwrap_or(42);
        let mut weights = Array2::zeros((classes.len(), x.ncols()));
        let mut biases = Vec::with_capacity(classes.len());

        for (c, &class) in classes.iter().enumerate() {
            let y_signed: Vec<f64> = y
                .iter()
                .map(|&v| if v as i64 == class { 1.0 } else { -1.0 })
                .collect();
            // Distinct deterministic seed per one-vs-rest machine
            let (w, b) = self.fit_binary(x, &y_signed, base_seed.wrapping_add(c as u64));
            weights.row_mut(c).assign(&w);
            biases.push(b);
        }

        self.weights = Some(weights);
        self.biases = biases;
        self.classes = classes;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let margins = self.decision_function(x)?;
        Ok(margins
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
            ("alpha", ParamValue::Float(v)) if *v > 0.0 => self.config.alpha = *v,
            ("l1_ratio", ParamValue::Float(v)) if (0.0..=1.0).contains(v) => {
                self.config.l1_ratio = *v
            }
            ("eta0", ParamValue::Float(v)) if *v > 0.0 => self.config.eta0 = *v,
            ("tol", ParamValue::Float(v)) if *v > 0.0 => self.config.tol = *v,
            ("max_iter", ParamValue::Int(v)) if *v >= 1 => {
                self.config.max_iter = *v as usize
            }
            ("penalty", ParamValue::Text(v)) => {
                self.config.penalty = match v.as_str() {
                    "l2" => Penalty::L2,
                    "l1" => Penalty::L1,
                    "elasticnet" => Penalty::ElasticNet,
                    _ => return Err(bad_param_value("SGD classifier", name, value)),
                }
            }
            ("learning_rate", ParamValue::Text(v)) => {
                self.config.learning_rate = match v.as_str() {
                    "constant" => LearningRate::Constant,
                    "optimal" => LearningRate::Optimal,
                    "invscaling" => LearningRate::InvScaling,
                    _ => return Err(bad_param_value("SGD classifier", name, value)),
                }
            }
            (
                "alpha" | "l1_ratio" | "eta0" | "tol" | "max_iter" | "penalty" | "learning_rate",
                _,
            ) => return Err(bad_param_value("SGD classifier", name, value)),
            _ => return Err(unknown_param("SGD classifier", name)),
        }
        self.clear_fitted_state();
        Ok(())
    }

    fn supports_param(&self, name: &str) -> bool {
        matches!(
            name,
            "alpha" | "l1_ratio" | "eta0" | "tol" | "max_iter" | "penalty" | "learning_rate"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable_data() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [2.0, 0.1],
            [1.8, 0.0],
            [2.2, 0.2],
            [1.9, 0.1],
            [0.1, 2.0],
            [0.0, 1.8],
            [0.2, 2.2],
            [0.1, 1.9],
        ];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_separable_data_classified() {
        let (x, y) = separable_data();
        let config = SgdConfig {
            max_iter: 50,
            alpha: 1e-3,
            ..Default::default()
        };
        let mut svm = SgdClassifier::new(config);
        svm.fit(&x, &y).unwrap();

        let accuracy = svm.score(&x, &y).unwrap();
        assert!(accuracy > 0.9, "accuracy too low: {}", accuracy);
    }

    #[test]
    fn test_three_class_one_vs_rest() {
        let x = array![
            [3.0, 0.0, 0.0],
            [2.8, 0.1, 0.0],
            [0.0, 3.0, 0.0],
            [0.1, 2.9, 0.0],
            [0.0, 0.0, 3.0],
            [0.0, 0.1, 2.8],
        ];
        let y = array![0.0, 0.0, 1.0, 1.0, 2.0, 2.0];

        let mut svm = SgdClassifier::new(SgdConfig {
            max_iter: 100,
            ..Default::default()
        });
        svm.fit(&x, &y).unwrap();
        let preds = svm.predict(&x).unwrap();
        assert_eq!(preds, y);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (x, y) = separable_data();
        let mut a = SgdClassifier::default();
        let mut b = SgdClassifier::default();
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let svm = SgdClassifier::default();
        let err = svm.predict(&array![[1.0]]).unwrap_err();
        assert!(matches!(err, MbtiError::Unfitted(_)));
    }

    #[test]
    fn test_single_class_rejected() {
        let mut svm = SgdClassifier::default();
        let err = svm
            .fit(&array![[1.0], [2.0]], &array![0.0, 0.0])
            .unwrap_err();
        assert!(matches!(err, MbtiError::Training(_)));
    }

    #[test]
    fn test_set_param() {
        let mut svm = SgdClassifier::default();
        svm.set_param("penalty", &ParamValue::Text("elasticnet".to_string()))
            .unwrap();
        assert_eq!(svm.config().penalty, Penalty::ElasticNet);
        svm.set_param("learning_rate", &ParamValue::Text("constant".to_string()))
            .unwrap();
        assert_eq!(svm.config().learning_rate, LearningRate::Constant);

        assert!(svm
            .set_param("penalty", &ParamValue::Text("l3".to_string()))
            .is_err());
        assert!(svm.set_param("l1_ratio", &ParamValue::Float(1.5)).is_err());
        assert!(svm.set_param("nope", &ParamValue::Int(1)).is_err());
    }
}
