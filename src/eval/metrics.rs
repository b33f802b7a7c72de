//! Classification metrics over label sequences
//!
//! All functions are read-only over their inputs and use ordered maps so
//! reports print in a stable order.

use crate::error::{MbtiError, Result};
use std::collections::BTreeMap;

fn check_lengths(predicted: &[String], actual: &[String]) -> Result<()> {
    if predicted.len() != actual.len() {
        return Err(MbtiError::Validation(format!(
            "got {} predictions for {} actual labels",
            predicted.len(),
            actual.len()
        )));
    }
    if predicted.is_empty() {
        return Err(MbtiError::Validation(
            "cannot compute metrics over zero examples".to_string(),
        ));
    }
    Ok(())
}

/// Fraction of elementwise-equal predictions, in [0, 1].
pub fn accuracy(predicted: &[String], actual: &[String]) -> Result<f64> {
    check_lengths(predicted, actual)?;
    let correct = predicted
        .iter()
        .zip(actual.iter())
        .filter(|(p, a)| p == a)
        .count();
    Ok(correct as f64 / actual.len() as f64)
}

/// `1 - accuracy`.
pub fn error_rate(predicted: &[String], actual: &[String]) -> Result<f64> {
    Ok(1.0 - accuracy(predicted, actual)?)
}

/// Count of every observed (actual, predicted) label pair.
pub fn confusion_counts(
    actual: &[String],
    predicted: &[String],
) -> Result<BTreeMap<(String, String), usize>> {
    check_lengths(predicted, actual)?;
    let mut counts = BTreeMap::new();
    for (a, p) in actual.iter().zip(predicted.iter()) {
        *counts.entry((a.clone(), p.clone())).or_insert(0) += 1;
    }
    Ok(counts)
}

/// Fraction of correct predictions among the records with each actual
/// label. A label with no occurrences in `actual` has no entry — its
/// success rate is undefined, not zero.
pub fn per_label_success_rate(
    actual: &[String],
    predicted: &[String],
) -> Result<BTreeMap<String, f64>> {
    check_lengths(predicted, actual)?;

    let mut totals: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for (a, p) in actual.iter().zip(predicted.iter()) {
        let entry = totals.entry(a.as_str()).or_insert((0, 0));
        entry.0 += 1;
        if a == p {
            entry.1 += 1;
        }
    }

    Ok(totals
        .into_iter()
        .map(|(label, (total, correct))| (label.to_string(), correct as f64 / total as f64))
        .collect())
}

/// The most frequent label in a training set; ties go to the
/// lexicographically smallest label so the baseline is deterministic.
pub fn majority_class_baseline(labels: &[String]) -> Result<String> {
    if labels.is_empty() {
        return Err(MbtiError::Validation(
            "cannot compute a baseline over zero labels".to_string(),
        ));
    }
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for label in labels {
        *counts.entry(label.as_str()).or_insert(0) += 1;
    }
    let (label, _) = counts
        .into_iter()
        .max_by(|(la, ca), (lb, cb)| ca.cmp(cb).then(lb.cmp(la)))
        .ok_or_else(|| MbtiError::Validation("no labels".to_string()))?;
    Ok(label.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_accuracy_and_error_rate() {
        let actual = labels(&["INTJ", "ENFP", "INTJ", "ISTP"]);
        let predicted = labels(&["INTJ", "INTJ", "INTJ", "ISTP"]);

        assert_eq!(accuracy(&predicted, &actual).unwrap(), 0.75);
        assert!((error_rate(&predicted, &actual).unwrap() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let a = labels(&["INTJ"]);
        let b = labels(&["INTJ", "ENFP"]);
        assert!(accuracy(&a, &b).is_err());
        assert!(accuracy(&[], &[]).is_err());
    }

    #[test]
    fn test_confusion_counts() {
        let actual = labels(&["INTJ", "INTJ", "ENFP"]);
        let predicted = labels(&["INTJ", "ENFP", "ENFP"]);
        let counts = confusion_counts(&actual, &predicted).unwrap();

        assert_eq!(counts[&("INTJ".to_string(), "INTJ".to_string())], 1);
        assert_eq!(counts[&("INTJ".to_string(), "ENFP".to_string())], 1);
        assert_eq!(counts[&("ENFP".to_string(), "ENFP".to_string())], 1);
        assert_eq!(counts.len(), 3);
    }

    #[test]
    fn test_per_label_success_rate() {
        let actual = labels(&["INTJ", "INTJ", "ENFP", "ENFP"]);
        let predicted = labels(&["INTJ", "ENFP", "ENFP", "ENFP"]);
        let rates = per_label_success_rate(&actual, &predicted).unwrap();

        assert_eq!(rates["INTJ"], 0.5);
        assert_eq!(rates["ENFP"], 1.0);
    }

    #[test]
    fn test_absent_label_is_undefined() {
        let actual = labels(&["INTJ", "INTJ"]);
        let predicted = labels(&["INTJ", "INTJ"]);
        let rates = per_label_success_rate(&actual, &predicted).unwrap();

        // ISTP never occurs, so it has no defined rate.
        assert!(rates.get("ISTP").is_none());
    }

    #[test]
    fn test_majority_class_baseline() {
        let train = labels(&["ENFP", "INTJ", "ENFP", "ISTP"]);
        assert_eq!(majority_class_baseline(&train).unwrap(), "ENFP");

        // Tie between ENFP and INTJ resolves to the smaller label.
        let tied = labels(&["INTJ", "ENFP"]);
        assert_eq!(majority_class_baseline(&tied).unwrap(), "ENFP");
    }
}
