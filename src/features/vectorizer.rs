//! N-gram count vectorizer over token documents

use crate::error::{MbtiError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Converts token documents into a term-count matrix.
///
/// Terms are n-grams (joined by a single space) for every n in the
/// configured range. Vocabulary indices are assigned in sorted term order,
/// so column layout is deterministic across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountVectorizer {
    ngram_range: (usize, usize),
    vocabulary: BTreeMap<String, usize>,
    fitted: bool,
}

impl Default for CountVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

impl CountVectorizer {
    /// Unigram vectorizer.
    pub fn new() -> Self {
        Self {
            ngram_range: (1, 1),
            vocabulary: BTreeMap::new(),
            fitted: false,
        }
    }

    /// Vectorizer extracting every n-gram length in `lo..=hi`.
    pub fn with_ngram_range(lo: usize, hi: usize) -> Result<Self> {
        let mut v = Self::new();
        v.set_ngram_range(lo, hi)?;
        Ok(v)
    }

    /// Change the n-gram range, discarding any fitted vocabulary.
    pub fn set_ngram_range(&mut self, lo: usize, hi: usize) -> Result<()> {
        if lo == 0 || lo > hi {
            return Err(MbtiError::Config(format!(
                "invalid ngram_range ({}, {}): need 1 <= lo <= hi",
                lo, hi
            )));
        }
        self.ngram_range = (lo, hi);
        self.vocabulary.clear();
        self.fitted = false;
        Ok(())
    }

    pub fn ngram_range(&self) -> (usize, usize) {
        self.ngram_range
    }

    /// Number of vocabulary terms (columns). Zero before fitting.
    pub fn n_features(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }

    fn ngrams(&self, doc: &[String]) -> Vec<String> {
        let (lo, hi) = self.ngram_range;
        let mut grams = Vec::new();
        for n in lo..=hi {
            for window in doc.windows(n) {
                grams.push(window.join(" "));
            }
        }
        grams
    }

    /// Build the vocabulary from the given documents, replacing any prior
    /// fitted state.
    pub fn fit(&mut self, docs: &[Vec<String>]) -> Result<()> {
        if docs.is_empty() {
            return Err(MbtiError::Validation(
                "cannot fit vectorizer on an empty corpus".to_string(),
            ));
        }

        let mut terms = BTreeSet::new();
        for doc in docs {
            for gram in self.ngrams(doc) {
                terms.insert(gram);
            }
        }
        if terms.is_empty() {
            return Err(MbtiError::Validation(
                "corpus produced an empty vocabulary".to_string(),
            ));
        }

        self.vocabulary = terms
            .into_iter()
            .enumerate()
            .map(|(idx, term)| (term, idx))
            .collect();
        self.fitted = true;
        Ok(())
    }

    /// Count vocabulary terms in each document. Terms outside the fitted
    /// vocabulary are ignored.
    pub fn transform(&self, docs: &[Vec<String>]) -> Result<Array2<f64>> {
        if !self.fitted {
            return Err(MbtiError::Unfitted(
                "vectorizer has no vocabulary; call fit first".to_string(),
            ));
        }

        let mut counts = Array2::zeros((docs.len(), self.vocabulary.len()));
        for (row, doc) in docs.iter().enumerate() {
            for gram in self.ngrams(doc) {
                if let Some(&col) = self.vocabulary.get(&gram) {
                    counts[[row, col]] += 1.0;
                }
            }
        }
        Ok(counts)
    }

    pub fn fit_transform(&mut self, docs: &[Vec<String>]) -> Result<Array2<f64>> {
        self.fit(docs)?;
        self.transform(docs)
    }
}
