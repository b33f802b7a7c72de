//! Feed-forward neural network classifier
//!
//! Multi-layer perceptron with softmax output and cross-entropy loss,
//! trained by minibatch gradient descent with momentum.

use crate::error::{MbtiError, Result};
use crate::models::{bad_param_value, unknown_param, Classifier, ParamValue};
use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

/// Hidden-layer activation function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    Identity,
    Logistic,
    Tanh,
    Relu,
}

impl Default for Activation {
    fn default() -> Self {
        Self::Relu
    }
}

/// MLP hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpConfig {
    pub hidden_layers: Vec<usize>,
    pub activation: Activation,
    pub learning_rate_init: f64,
    pub max_iter: usize,
    pub batch_size: usize,
    /// L2 regularization strength
    pub alpha: f64,
    /// Stop when the epoch loss improves by less than this
    pub tol: f64,
    pub momentum: f64,
    pub random_state: Option<u64>,
}

impl Default for MlpConfig {
    fn default() -> Self {
        Self {
            hidden_layers: vec![100],
            activation: Activation::Relu,
            learning_rate_init: 0.001,
            max_iter: 200,
            batch_size: 32,
            alpha: 1e-4,
            tol: 1e-4,
            momentum: 0.9,
            random_state: Some(42),
        }
    }
}

/// Multi-layer perceptron classifier with a softmax output layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpClassifier {
    config: MlpConfig,
    weights: Vec<Array2<f64>>,
    biases: Vec<Array1<f64>>,
    classes: Vec<i64>,
    n_features: usize,
}

impl Default for MlpClassifier {
    fn default() -> Self {
        Self::new(MlpConfig::default())
    }
}

impl MlpClassifier {
    pub fn new(config: MlpConfig) -> Self {
        Self {
            config,
            weights: Vec::new(),
            biases: Vec::new(),
            classes: Vec::new(),
            n_features: 0,
        }
    }

    pub fn config(&self) -> &MlpConfig {
        &self.config
    }

    fn clear_fitted_state(&mut self) {
        self.weights.clear();
        self.biases.clear();
        self.classes.clear();
        self.n_features = 0;
    }

    fn initialize_weights(&mut self, rng: &mut Xoshiro256PlusPlus) {
        let mut layer_sizes = vec![self.n_features];
        layer_sizes.extend(&self.config.hidden_layers);
        layer_sizes.push(self.classes.len());

        for pair in layer_sizes.windows(2) {
            let (n_in, n_out) = (pair[0], pair[1]);
            let scale = (2.0 / (n_in + n_out) as f64).sqrt();
            let weights =
                Array2::from_shape_fn((n_in, n_out), |_| rng.gen::<f64>() * 2.0 * scale - scale);
            self.weights.push(weights);
            self.biases.push(Array1::zeros(n_out));
        }
    }

    /// Forward pass; returns the activations of every layer and the
    /// pre-activation values of every non-input layer.
    fn forward(&self, x: &Array2<f64>) -> (Vec<Array2<f64>>, Vec<Array2<f64>>) {
        let mut activations = vec![x.clone()];
        let mut z_values = Vec::new();

        let last = self.weights.len() - 1;
        for (i, (w, b)) in self.weights.iter().zip(self.biases.iter()).enumerate() {
            let z = activations[activations.len() - 1].dot(w) + b;
            let a = if i < last {
                apply_activation(&z, self.config.activation)
            } else {
                softmax(&z)
            };
            z_values.push(z);
            activations.push(a);
        }

        (activations, z_values)
    }

    fn backward(
        &self,
        y_onehot: &Array2<f64>,
        activations: &[Array2<f64>],
        z_values: &[Array2<f64>],
    ) -> Vec<(Array2<f64>, Array1<f64>)> {
        let n = y_onehot.nrows() as f64;
        let mut gradients = Vec::with_capacity(self.weights.len());

        // Softmax + cross-entropy collapse to this output delta
        let output = &activations[activations.len() - 1];
        let mut delta = (output - y_onehot) / n;

        for i in (0..self.weights.len()).rev() {
            let grad_w = activations[i].t().dot(&delta);
            let grad_b = delta.sum_axis(Axis(0));
            gradients.push((grad_w, grad_b));

            if i > 0 {
                delta = delta.dot(&self.weights[i].t())
                    * activation_derivative(&z_values[i - 1], self.config.activation);
            }
        }

        gradients.reverse();
        gradients
    }

    fn to_onehot(&self, y: &Array1<f64>) -> Array2<f64> {
        let mut onehot = Array2::zeros((y.len(), self.classes.len()));
        for (i, &label) in y.iter().enumerate() {
            if let Ok(c) = self.classes.binary_search(&(label as i64)) {
                onehot[[i, c]] = 1.0;
            }
        }
        onehot
    }

    fn gather_rows(x: &Array2<f64>, indices: &[usize]) -> Array2<f64> {
        let mut out = Array2::zeros((indices.len(), x.ncols()));
        for (new_row, &old_row) in indices.iter().enumerate() {
            out.row_mut(new_row).assign(&x.row(old_row));
        }
        out
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.weights.is_empty() {
            return Err(MbtiError::Unfitted(
                "MLP model not fitted; call fit first".to_string(),
            ));
        }
        if x.ncols() != self.n_features {
            return Err(MbtiError::Validation(format!(
                "expected {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }
        let (activations, _) = self.forward(x);
        Ok(activations[activations.len() - 1].clone())
    }
}

impl Classifier for MlpClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if x.nrows() == 0 || x.nrows() != y.len() {
            return Err(MbtiError::Training(format!(
                "cannot fit on {} rows with {} labels",
                x.nrows(),
                y.len()
            )));
        }
        if self.config.hidden_layers.iter().any(|&n| n == 0) {
            return Err(MbtiError::Config(
                "hidden layers must have at least one unit".to_string(),
            ));
        }
        self.clear_fitted_state();
        self.n_features = x.ncols();

        let mut classes: Vec<i64> = y.iter().map(|&v| v as i64).collect();
        classes.sort_unstable();
        classes.dedup();
        if classes.len() < 2 {
            return Err(MbtiError::Training(
                "need at least two classes to fit a classifier".to_string(),
            ));
        }
        self.classes = classes;

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.random_state.unwrap_or(42));
        self.initialize_weights(&mut rng);

        let n_samples = x.nrows();
        let y_onehot = self.to_onehot(y);
        let batch_size = self.config.batch_size.clamp(1, n_samples);

        let mut velocities_w: Vec<Array2<f64>> = self
            .weights
            .iter()
            .map(|w| Array2::zeros(w.raw_dim()))
            .collect();
        let mut velocities_b: Vec<Array1<f64>> = self
            .biases
            .iter()
            .map(|b| Array1::zeros(b.len()))
            .collect();

        let mut indices: Vec<usize> = (0..n_samples).collect();
        let mut prev_loss = f64::MAX;

        for epoch in 0..self.config.max_iter {
            indices.shuffle(&mut rng);

            for batch_start in (0..n_samples).step_by(batch_size) {
                let batch_end = (batch_start + batch_size).min(n_samples);
                let batch = &indices[batch_start..batch_end];

                let x_batch = Self::gather_rows(x, batch);
                let y_batch = Self::gather_rows(&y_onehot, batch);

                let (activations, z_values) = self.forward(&x_batch);
                let gradients = self.backward(&y_batch, &activations, &z_values);

                for (i, (grad_w, grad_b)) in gradients.into_iter().enumerate() {
                    velocities_w[i] = &velocities_w[i] * self.config.momentum
                        - &grad_w * self.config.learning_rate_init;
                    velocities_b[i] = &velocities_b[i] * self.config.momentum
                        - &grad_b * self.config.learning_rate_init;

                    self.weights[i] = &self.weights[i] + &velocities_w[i];
                    self.biases[i] = &self.biases[i] + &velocities_b[i];

                    // L2 weight decay
                    self.weights[i] = &self.weights[i]
                        * (1.0 - self.config.alpha * self.config.learning_rate_init);
                }
            }

            // Epoch loss for tol-based early stopping
            let (activations, _) = self.forward(x);
            let output = &activations[activations.len() - 1];
            let loss = cross_entropy(output, &y_onehot);
            if epoch > 0 && (prev_loss - loss).abs() < self.config.tol {
                tracing::debug!(epoch, loss, "MLP converged");
                break;
            }
            prev_loss = loss;
        }

        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba
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
            ("learning_rate_init", ParamValue::Float(v)) if *v > 0.0 => {
                self.config.learning_rate_init = *v
            }
            ("alpha", ParamValue::Float(v)) if *v > 0.0 => self.config.alpha = *v,
            ("max_iter", ParamValue::Int(v)) if *v >= 1 => self.config.max_iter = *v as usize,
            ("hidden_layer_sizes", ParamValue::Int(v)) if *v >= 1 => {
                self.config.hidden_layers = vec![*v as usize]
            }
            ("activation", ParamValue::Text(v)) => {
                self.config.activation = match v.as_str() {
                    "identity" => Activation::Identity,
                    "logistic" => Activation::Logistic,
                    "tanh" => Activation::Tanh,
                    "relu" => Activation::Relu,
                    _ => return Err(bad_param_value("MLP classifier", name, value)),
                }
            }
            (
                "learning_rate_init" | "alpha" | "max_iter" | "hidden_layer_sizes" | "activation",
                _,
            ) => return Err(bad_param_value("MLP classifier", name, value)),
            _ => return Err(unknown_param("MLP classifier", name)),
        }
        self.clear_fitted_state();
        Ok(())
    }

    fn supports_param(&self, name: &str) -> bool {
        matches!(
            name,
            "learning_rate_init" | "alpha" | "max_iter" | "hidden_layer_sizes" | "activation"
        )
    }
}

fn apply_activation(z: &Array2<f64>, activation: Activation) -> Array2<f64> {
    match activation {
        Activation::Identity => z.clone(),
        Activation::Logistic => z.mapv(|v| 1.0 / (1.0 + (-v).exp())),
        Activation::Tanh => z.mapv(f64::tanh),
        Activation::Relu => z.mapv(|v| v.max(0.0)),
    }
}

fn activation_derivative(z: &Array2<f64>, activation: Activation) -> Array2<f64> {
    match activation {
        Activation::Identity => Array2::ones(z.raw_dim()),
        Activation::Logistic => {
            let sig = apply_activation(z, Activation::Logistic);
            &sig * &(1.0 - &sig)
        }
        Activation::Tanh => {
            let t = z.mapv(f64::tanh);
            1.0 - &t * &t
        }
        Activation::Relu => z.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 }),
    }
}

fn softmax(z: &Array2<f64>) -> Array2<f64> {
    let mut result = z.clone();
    for mut row in result.rows_mut() {
        let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exp_sum: f64 = row.iter().map(|&v| (v - max).exp()).sum();
        for v in row.iter_mut() {
            *v = (*v - max).exp() / exp_sum;
        }
    }
    result
}

fn cross_entropy(proba: &Array2<f64>, y_onehot: &Array2<f64>) -> f64 {
    let n = proba.nrows() as f64;
    -proba
        .iter()
        .zip(y_onehot.iter())
        .map(|(&p, &t)| t * p.max(1e-15).ln())
        .sum::<f64>()
        / n
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable_data() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [0.0, 0.1],
            [0.1, 0.0],
            [0.2, 0.1],
            [0.1, 0.2],
            [2.0, 2.1],
            [2.1, 2.0],
            [1.9, 2.0],
            [2.0, 1.9],
        ];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_separable_data_classified() {
        let (x, y) = separable_data();
        let config = MlpConfig {
            hidden_layers: vec![16],
            max_iter: 300,
            learning_rate_init: 0.05,
            ..Default::default()
        };
        let mut mlp = MlpClassifier::new(config);
        mlp.fit(&x, &y).unwrap();

        let accuracy = mlp.score(&x, &y).unwrap();
        assert!(accuracy > 0.8, "accuracy too low: {}", accuracy);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let (x, y) = separable_data();
        let mut mlp = MlpClassifier::new(MlpConfig {
            max_iter: 20,
            ..Default::default()
        });
        mlp.fit(&x, &y).unwrap();

        let proba = mlp.predict_proba(&x).unwrap();
        for row in proba.rows() {
            let sum: f64 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_identity_activation_trains() {
        let (x, y) = separable_data();
        let mut mlp = MlpClassifier::new(MlpConfig {
            activation: Activation::Identity,
            hidden_layers: vec![8],
            max_iter: 200,
            learning_rate_init: 0.05,
            ..Default::default()
        });
        mlp.fit(&x, &y).unwrap();
        assert!(mlp.score(&x, &y).unwrap() > 0.7);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (x, y) = separable_data();
        let mut a = MlpClassifier::default();
        let mut b = MlpClassifier::default();
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let mlp = MlpClassifier::default();
        let err = mlp.predict(&array![[1.0]]).unwrap_err();
        assert!(matches!(err, MbtiError::Unfitted(_)));
    }

    #[test]
    fn test_set_param() {
        let mut mlp = MlpClassifier::default();
        mlp.set_param("hidden_layer_sizes", &ParamValue::Int(50))
            .unwrap();
        assert_eq!(mlp.config().hidden_layers, vec![50]);
        mlp.set_param("activation", &ParamValue::Text("tanh".to_string()))
            .unwrap();
        assert_eq!(mlp.config().activation, Activation::Tanh);

        assert!(mlp
            .set_param("activation", &ParamValue::Text("softplus".to_string()))
            .is_err());
        assert!(mlp.set_param("nope", &ParamValue::Int(1)).is_err());
    }
}
