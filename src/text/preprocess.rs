//! Corpus preprocessing: raw records to cleaned, tokenized records
//!
//! Each record's posts string is split on the post delimiter, every post is
//! tokenized, stopwords are optionally removed, and one [`CleanedRecord`]
//! is emitted per post — a multi-post record becomes multiple training
//! examples. The record list is processed in disjoint contiguous partitions
//! (one per pool worker) and the partition outputs are concatenated in
//! order, so the result is identical at any degree of parallelism.

use crate::data::{CleanedRecord, Record, POST_DELIMITER};
use crate::parallel::{split_partitions, WorkerPool};
use crate::text::stopwords::filter_tokens;
use crate::text::tokenizer::Tokenizer;
use rayon::prelude::*;
use std::collections::HashSet;

/// Records processed between progress log lines.
const PROGRESS_EVERY: usize = 100;

/// Clean a whole dataset. Pass `Some(stopwords)` to filter stopwords and
/// punctuation out of every post, `None` to keep all tokens.
pub fn preprocess(
    records: &[Record],
    stopwords: Option<&HashSet<String>>,
    pool: &WorkerPool,
) -> Vec<CleanedRecord> {
    let tokenizer = Tokenizer::shared();
    let partitions = split_partitions(records, pool.degree());

    let results: Vec<Vec<CleanedRecord>> = pool.install(|| {
        partitions
            .par_iter()
            .enumerate()
            .map(|(part_idx, partition)| {
                preprocess_partition(part_idx, partition, stopwords, tokenizer)
            })
            .collect()
    });

    results.into_iter().flatten().collect()
}

fn preprocess_partition(
    part_idx: usize,
    records: &[Record],
    stopwords: Option<&HashSet<String>>,
    tokenizer: &Tokenizer,
) -> Vec<CleanedRecord> {
    let mut cleaned = Vec::new();

    for (idx, record) in records.iter().enumerate() {
        for post in record.posts.split(POST_DELIMITER) {
            // An empty posts string (or empty segment) yields no cleaned
            // record at all, not an empty one.
            if post.is_empty() {
                continue;
            }
            let mut tokens = tokenizer.tokenize(post);
            if let Some(stop) = stopwords {
                tokens = filter_tokens(&tokens, stop);
            }
            cleaned.push(CleanedRecord {
                label: record.label.clone(),
                tokens,
            });
        }

        if (idx + 1) % PROGRESS_EVERY == 0 {
            tracing::debug!(
                partition = part_idx,
                done = idx + 1,
                total = records.len(),
                "preprocessing progress"
            );
        }
    }

    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(label: &str, posts: &str) -> Record {
        Record {
            label: label.to_string(),
            posts: posts.to_string(),
        }
    }

    #[test]
    fn test_multi_post_record_expands() {
        let pool = WorkerPool::sequential().unwrap();
        let records = vec![record("INTJ", "first post|||second post|||third")];
        let cleaned = preprocess(&records, None, &pool);

        assert_eq!(cleaned.len(), 3);
        assert!(cleaned.iter().all(|c| c.label == "INTJ"));
        assert_eq!(cleaned[0].tokens, vec!["first", "post"]);
        assert_eq!(cleaned[2].tokens, vec!["third"]);
    }

    #[test]
    fn test_empty_posts_yields_nothing() {
        let pool = WorkerPool::sequential().unwrap();
        let records = vec![record("ENFP", "")];
        let cleaned = preprocess(&records, None, &pool);
        assert!(cleaned.is_empty());
    }

    #[test]
    fn test_stopword_filtering_applied() {
        let pool = WorkerPool::sequential().unwrap();
        let stopwords: HashSet<String> =
            ["the".to_string(), "a".to_string(), "!".to_string()].into();
        let records = vec![record("ISTP", "the cat sat!")];

        let cleaned = preprocess(&records, Some(&stopwords), &pool);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].tokens, vec!["cat", "sat"]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let records: Vec<Record> = (0..53)
            .map(|i| {
                record(
                    if i % 2 == 0 { "INTJ" } else { "ENFP" },
                    &format!("post number {}|||and another {} :)", i, i),
                )
            })
            .collect();

        let sequential = preprocess(&records, None, &WorkerPool::sequential().unwrap());
        let parallel = preprocess(&records, None, &WorkerPool::new(8).unwrap());
        assert_eq!(sequential, parallel);
    }
}
