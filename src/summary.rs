//! Corpus summaries consumed by external visualization
//!
//! Computes the label counts, word frequencies, and flat token multiset
//! that bar-chart and word-cloud consumers take as input. No plotting
//! happens here.

use crate::data::CleanedRecord;
use std::collections::{BTreeMap, HashMap};

/// Occurrences of each label, in label order.
pub fn label_counts<'a>(labels: impl IntoIterator<Item = &'a str>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for label in labels {
        *counts.entry(label.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Flatten a cleaned corpus into one token multiset, in corpus order.
/// This is the word-cloud input.
pub fn gather_words(records: &[CleanedRecord]) -> Vec<String> {
    records
        .iter()
        .flat_map(|record| record.tokens.iter().cloned())
        .collect()
}

/// Occurrences of each distinct token across the corpus.
pub fn word_frequencies(records: &[CleanedRecord]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for record in records {
        for token in &record.tokens {
            *counts.entry(token.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// The `n` most frequent tokens with their counts, most frequent first.
/// Equal counts order alphabetically so reports are stable.
pub fn top_words(records: &[CleanedRecord], n: usize) -> Vec<(String, usize)> {
    let mut entries: Vec<(String, usize)> = word_frequencies(records).into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    entries.truncate(n);
    entries
}
