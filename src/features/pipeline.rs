//! The composed text-classification pipeline
//!
//! Chains count vectorization, IDF weighting, chi-squared selection, and a
//! classifier into one fit/predict unit. The four stage states travel
//! together: fitting replaces all of them, and predict refuses to run
//! until a fit has succeeded.
//!
//! Stages are addressed by grid-search parameter names with a
//! double-underscore separator: `vect__ngram_range`, `tfidf__use_idf`,
//! `chi2__k`, and `clf__<param>` for whatever the classifier accepts.

use crate::error::{MbtiError, Result};
use crate::features::selection::{SelectK, SelectKBest};
use crate::features::tfidf::TfidfTransformer;
use crate::features::vectorizer::CountVectorizer;
use crate::models::Classifier;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

pub use crate::models::ParamValue;

/// Vectorizer → IDF weighting → feature selection → classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextPipeline<C> {
    vectorizer: CountVectorizer,
    tfidf: TfidfTransformer,
    selector: SelectKBest,
    classifier: C,
    classes: Vec<String>,
    fitted: bool,
}

/// Pipeline with default stages: unigram counts, IDF weighting on, all
/// features kept.
pub fn build_pipeline<C: Classifier>(classifier: C) -> TextPipeline<C> {
    TextPipeline::new(
        CountVectorizer::new(),
        TfidfTransformer::new(),
        SelectKBest::all(),
        classifier,
    )
}

impl<C: Classifier> TextPipeline<C> {
    pub fn new(
        vectorizer: CountVectorizer,
        tfidf: TfidfTransformer,
        selector: SelectKBest,
        classifier: C,
    ) -> Self {
        Self {
            vectorizer,
            tfidf,
            selector,
            classifier,
            classes: Vec::new(),
            fitted: false,
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    /// Label set seen at fit time, sorted.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Fit every stage in order, feeding each stage's output to the next.
    /// Re-fitting replaces all prior state.
    pub fn fit(&mut self, docs: &[Vec<String>], labels: &[String]) -> Result<()> {
        if docs.len() != labels.len() {
            return Err(MbtiError::Validation(format!(
                "{} documents with {} labels",
                docs.len(),
                labels.len()
            )));
        }
        if docs.is_empty() {
            return Err(MbtiError::Validation(
                "cannot fit a pipeline on zero documents".to_string(),
            ));
        }
        self.fitted = false;

        let mut classes: Vec<String> = labels.to_vec();
        classes.sort_unstable();
        classes.dedup();
        let y: Array1<f64> = labels
            .iter()
            .map(|label| {
                classes
                    .binary_search(label)
                    .map(|idx| idx as f64)
                    .map_err(|_| MbtiError::Validation("label missing from class set".to_string()))
            })
            .collect::<Result<Vec<f64>>>()?
            .into();

        let counts = self.vectorizer.fit_transform(docs)?;
        let weighted = self.tfidf.fit_transform(&counts)?;
        let selected = self.selector.fit_transform(&weighted, &y)?;
        self.classifier.fit(&selected, &y)?;

        self.classes = classes;
        self.fitted = true;
        tracing::debug!(
            documents = docs.len(),
            features = selected.ncols(),
            classes = self.classes.len(),
            "pipeline fitted"
        );
        Ok(())
    }

    /// Run the three feature stages on new documents.
    pub fn transform(&self, docs: &[Vec<String>]) -> Result<Array2<f64>> {
        self.check_fitted()?;
        let counts = self.vectorizer.transform(docs)?;
        let weighted = self.tfidf.transform(&counts)?;
        self.selector.transform(&weighted)
    }

    /// Predict a label for each document.
    pub fn predict(&self, docs: &[Vec<String>]) -> Result<Vec<String>> {
        let features = self.transform(docs)?;
        let indices = self.classifier.predict(&features)?;
        indices
            .iter()
            .map(|&idx| {
                let idx = idx.round();
                if idx < 0.0 || idx as usize >= self.classes.len() {
                    return Err(MbtiError::Validation(format!(
                        "classifier produced class index {} outside the {} known classes",
                        idx,
                        self.classes.len()
                    )));
                }
                Ok(self.classes[idx as usize].clone())
            })
            .collect()
    }

    /// Mean accuracy of `predict` against the given labels.
    pub fn score(&self, docs: &[Vec<String>], labels: &[String]) -> Result<f64> {
        let predicted = self.predict(docs)?;
        crate::eval::metrics::accuracy(&predicted, labels)
    }

    fn check_fitted(&self) -> Result<()> {
        if self.fitted {
            Ok(())
        } else {
            Err(MbtiError::Unfitted(
                "pipeline used before fit (or after a parameter change)".to_string(),
            ))
        }
    }

    /// Assign a stage parameter by its grid-search name. Any assignment
    /// invalidates fitted state.
    pub fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        let (stage, param) = name.split_once("__").ok_or_else(|| {
            MbtiError::Config(format!(
                "parameter {:?} is not of the form stage__name",
                name
            ))
        })?;

        match (stage, param, value) {
            ("vect", "ngram_range", ParamValue::Pair(lo, hi)) => {
                self.vectorizer.set_ngram_range(*lo, *hi)?
            }
            ("vect", "ngram_range", _) => {
                return Err(MbtiError::Config(format!(
                    "vect__ngram_range expects a pair, got {}",
                    value
                )))
            }
            ("tfidf", "use_idf", ParamValue::Bool(v)) => self.tfidf.set_use_idf(*v),
            ("tfidf", "use_idf", _) => {
                return Err(MbtiError::Config(format!(
                    "tfidf__use_idf expects a bool, got {}",
                    value
                )))
            }
            ("chi2", "k", ParamValue::Int(v)) if *v >= 1 => {
                self.selector.set_k(SelectK::K(*v as usize))?
            }
            ("chi2", "k", ParamValue::Text(v)) if v == "all" => {
                self.selector.set_k(SelectK::All)?
            }
            ("chi2", "k", _) => {
                return Err(MbtiError::Config(format!(
                    "chi2__k expects a positive integer or \"all\", got {}",
                    value
                )))
            }
            ("clf", _, _) => self.classifier.set_param(param, value)?,
            _ => {
                return Err(MbtiError::Config(format!(
                    "pipeline has no parameter named {:?}",
                    name
                )))
            }
        }

        self.fitted = false;
        self.classes.clear();
        Ok(())
    }

    /// Whether `set_param` would recognize this name (ignoring the value).
    pub fn supports_param(&self, name: &str) -> bool {
        match name.split_once("__") {
            Some(("vect", "ngram_range")) => true,
            Some(("tfidf", "use_idf")) => true,
            Some(("chi2", "k")) => true,
            Some(("clf", param)) => self.classifier.supports_param(param),
            _ => false,
        }
    }
}
