//! Dataset records and CSV I/O
//!
//! The raw dataset is a headerless two-column table: a personality-type
//! label and a single string of posts joined by [`POST_DELIMITER`]. The
//! cleaned dataset keeps the same shape, with the posts column holding a
//! JSON-serialized token list per record.

use crate::error::{MbtiError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The 16 personality-type codes (4 binary axes).
pub const MBTI_TYPES: [&str; 16] = [
    "ENFJ", "ENFP", "ENTJ", "ENTP", "ESFJ", "ESFP", "ESTJ", "ESTP",
    "INFJ", "INFP", "INTJ", "INTP", "ISFJ", "ISFP", "ISTJ", "ISTP",
];

/// Separator between individual posts inside one record's `posts` field.
pub const POST_DELIMITER: &str = "|||";

/// One subject's labeled, aggregated posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Personality-type code, one of [`MBTI_TYPES`]
    pub label: String,
    /// All posts for this subject, joined by [`POST_DELIMITER`]
    pub posts: String,
}

/// One tokenized post paired with its subject's label.
///
/// A multi-post [`Record`] expands into one `CleanedRecord` per post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanedRecord {
    pub label: String,
    pub tokens: Vec<String>,
}

/// Check a label against the fixed 16-code set.
pub fn validate_label(label: &str) -> Result<()> {
    if MBTI_TYPES.contains(&label) {
        Ok(())
    } else {
        Err(MbtiError::DataIntegrity(format!(
            "label {:?} is not one of the 16 personality-type codes",
            label
        )))
    }
}

/// Load the raw dataset from a headerless two-column CSV file.
///
/// Every row must have exactly two columns and a label from the fixed
/// 16-code set; the first offending row fails the whole load.
pub fn load_dataset(path: impl AsRef<Path>) -> Result<Vec<Record>> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut records = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        let row = row?;
        if row.len() != 2 {
            return Err(MbtiError::DataIntegrity(format!(
                "{}: row {} has {} columns, expected 2",
                path.display(),
                idx + 1,
                row.len()
            )));
        }
        let label = row[0].trim().to_string();
        validate_label(&label).map_err(|_| {
            MbtiError::DataIntegrity(format!(
                "{}: row {} has label {:?}, not one of the 16 personality-type codes",
                path.display(),
                idx + 1,
                &row[0]
            ))
        })?;
        records.push(Record {
            label,
            posts: row[1].to_string(),
        });
    }

    tracing::info!(path = %path.display(), rows = records.len(), "loaded dataset");
    Ok(records)
}

/// Write a cleaned dataset: same two-column shape, with the posts column
/// holding a JSON-serialized token list per record.
pub fn save_cleaned(path: impl AsRef<Path>, records: &[CleanedRecord]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut writer = csv::WriterBuilder::new().from_path(path)?;
    for record in records {
        let tokens = serde_json::to_string(&record.tokens)?;
        writer.write_record([record.label.as_str(), tokens.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a cleaned dataset written by [`save_cleaned`].
///
/// The posts column is already tokenized; it is parsed, never re-tokenized.
pub fn load_cleaned(path: impl AsRef<Path>) -> Result<Vec<CleanedRecord>> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut records = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        let row = row?;
        if row.len() != 2 {
            return Err(MbtiError::DataIntegrity(format!(
                "{}: row {} has {} columns, expected 2",
                path.display(),
                idx + 1,
                row.len()
            )));
        }
        let label = row[0].trim().to_string();
        validate_label(&label)?;
        let tokens: Vec<String> = serde_json::from_str(&row[1]).map_err(|e| {
            MbtiError::DataIntegrity(format!(
                "{}: row {} token list is not valid JSON: {}",
                path.display(),
                idx + 1,
                e
            ))
        })?;
        records.push(CleanedRecord { label, tokens });
    }
    Ok(records)
}

/// Shuffled train/test split with a fixed seed.
pub fn train_test_split<T: Clone>(
    items: &[T],
    test_size: f64,
    seed: u64,
) -> Result<(Vec<T>, Vec<T>)> {
    if !(0.0..1.0).contains(&test_size) || test_size == 0.0 {
        return Err(MbtiError::Validation(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }
    if items.len() < 2 {
        return Err(MbtiError::Validation(
            "need at least two records to split into train and test".to_string(),
        ));
    }

    let mut indices: Vec<usize> = (0..items.len()).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = ((items.len() as f64) * test_size).round() as usize;
    let n_test = n_test.clamp(1, items.len() - 1);

    let test = indices[..n_test].iter().map(|&i| items[i].clone()).collect();
    let train = indices[n_test..].iter().map(|&i| items[i].clone()).collect();
    Ok((train, test))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_validate_label() {
        assert!(validate_label("INTJ").is_ok());
        assert!(validate_label("ENFP").is_ok());
        assert!(validate_label("ZZZZ").is_err());
        assert!(validate_label("intj").is_err());
        assert!(validate_label("").is_err());
    }

    #[test]
    fn test_load_dataset_rejects_unknown_label() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "INTJ,hello world|||second post").unwrap();
        writeln!(file, "ZZZZ,some posts").unwrap();
        file.flush().unwrap();

        let err = load_dataset(file.path()).unwrap_err();
        assert!(matches!(err, MbtiError::DataIntegrity(_)));
        assert!(err.to_string().contains("ZZZZ"));
    }

    #[test]
    fn test_load_dataset_rejects_wrong_column_count() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "INTJ,post one,extra").unwrap();
        file.flush().unwrap();

        let err = load_dataset(file.path()).unwrap_err();
        assert!(matches!(err, MbtiError::DataIntegrity(_)));
    }

    #[test]
    fn test_cleaned_round_trip() {
        let records = vec![
            CleanedRecord {
                label: "INTJ".to_string(),
                tokens: vec!["hello".to_string(), ":)".to_string()],
            },
            CleanedRecord {
                label: "ENFP".to_string(),
                tokens: vec![],
            },
        ];

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cleaned.csv");
        save_cleaned(&path, &records).unwrap();
        let loaded = load_cleaned(&path).unwrap();
        assert_eq!(loaded, records);
    }

    #[test]
    fn test_train_test_split_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let (train, test) = train_test_split(&items, 0.33, 42).unwrap();
        assert_eq!(test.len(), 33);
        assert_eq!(train.len(), 67);

        // Deterministic for a fixed seed
        let (train2, test2) = train_test_split(&items, 0.33, 42).unwrap();
        assert_eq!(train, train2);
        assert_eq!(test, test2);

        // All items covered exactly once
        let mut all: Vec<usize> = train.iter().chain(test.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, items);
    }

    #[test]
    fn test_train_test_split_rejects_bad_fraction() {
        let items: Vec<usize> = (0..10).collect();
        assert!(train_test_split(&items, 0.0, 42).is_err());
        assert!(train_test_split(&items, 1.0, 42).is_err());
    }
}
