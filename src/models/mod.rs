//! Classifier capability contract and the concrete model families
//!
//! Every model family implements [`Classifier`]; the feature pipeline and
//! the search harness depend only on this trait, never on a concrete type.

pub mod mlp;
pub mod naive_bayes;
pub mod sgd;

pub use mlp::{Activation, MlpClassifier, MlpConfig};
pub use naive_bayes::MultinomialNb;
pub use sgd::{LearningRate, Penalty, SgdClassifier, SgdConfig};

use crate::error::{MbtiError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single hyperparameter value, as declared in a parameter grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// An inclusive pair, e.g. an n-gram range.
    Pair(usize, usize),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Text(v) => write!(f, "{}", v),
            ParamValue::Pair(lo, hi) => write!(f, "({}, {})", lo, hi),
        }
    }
}

/// Capability contract for classifiers.
///
/// `x` is a feature matrix (rows = examples); `y` holds class indices as
/// floats. Models must replace all fitted state on re-fit and refuse to
/// predict before a successful fit.
pub trait Classifier: Send + Sync {
    /// Fit the model, replacing any prior fitted state.
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Predict a class index for each row.
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Mean accuracy against the given class indices.
    fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let predictions = self.predict(x)?;
        if predictions.len() != y.len() || y.is_empty() {
            return Err(MbtiError::Validation(format!(
                "cannot score {} predictions against {} labels",
                predictions.len(),
                y.len()
            )));
        }
        let correct = predictions
            .iter()
            .zip(y.iter())
            .filter(|(p, t)| (**p - **t).abs() < 0.5)
            .count();
        Ok(correct as f64 / y.len() as f64)
    }

    /// Assign a named hyperparameter; unknown names or mismatched value
    /// types are configuration errors. Invalidates fitted state.
    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()>;

    /// Whether `set_param` would recognize this name.
    fn supports_param(&self, name: &str) -> bool;
}

/// Standard rejection for a parameter name a model does not recognize.
pub(crate) fn unknown_param(model: &str, name: &str) -> MbtiError {
    MbtiError::Config(format!("{} has no parameter named {:?}", model, name))
}

/// Standard rejection for a recognized name given the wrong value type.
pub(crate) fn bad_param_value(model: &str, name: &str, value: &ParamValue) -> MbtiError {
    MbtiError::Config(format!(
        "invalid value {} for parameter {:?} of {}",
        value, name, model
    ))
}
