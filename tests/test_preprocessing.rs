//! Integration tests for tokenization and corpus preprocessing

use mbti_nlp::prelude::*;
use std::io::Write;

fn record(label: &str, posts: &str) -> Record {
    Record {
        label: label.to_string(),
        posts: posts.to_string(),
    }
}

#[test]
fn test_social_text_tokenization_end_to_end() {
    let records = vec![record("INTJ", "I luv :) this!!! http://x.co #mbti @bob")];
    let pool = WorkerPool::sequential().unwrap();
    let cleaned = preprocess(&records, None, &pool);

    assert_eq!(cleaned.len(), 1);
    let tokens = &cleaned[0].tokens;
    assert!(tokens.contains(&":)".to_string()));
    assert!(tokens.contains(&"http://x.co".to_string()));
    assert!(tokens.contains(&"#mbti".to_string()));
    assert!(tokens.contains(&"@bob".to_string()));
    assert!(tokens.contains(&"luv".to_string()));
    assert!(tokens.contains(&"this".to_string()));
}

#[test]
fn test_partition_count_does_not_change_output() {
    let records: Vec<Record> = (0..101)
        .map(|i| {
            record(
                MBTI_TYPES[i % 16],
                &format!("post {} about things|||more {} text here :P|||and a third", i, i),
            )
        })
        .collect();

    let one = preprocess(&records, None, &WorkerPool::new(1).unwrap());
    let eight = preprocess(&records, None, &WorkerPool::new(8).unwrap());
    assert_eq!(one, eight);

    // Three posts per record
    assert_eq!(one.len(), records.len() * 3);
}

#[test]
fn test_empty_posts_yield_no_cleaned_records() {
    let records = vec![record("ENFP", ""), record("INTJ", "something")];
    let pool = WorkerPool::sequential().unwrap();
    let cleaned = preprocess(&records, None, &pool);

    assert_eq!(cleaned.len(), 1);
    assert_eq!(cleaned[0].label, "INTJ");
}

#[test]
fn test_stopword_filter_is_a_fixed_point() {
    let dir = tempfile::tempdir().unwrap();
    let stopword_path = dir.path().join("stopwords.txt");
    let mut file = std::fs::File::create(&stopword_path).unwrap();
    writeln!(file, "the\nand\nto\na").unwrap();
    drop(file);

    let source = StopwordSource {
        cache_path: stopword_path,
        remote_url: "http://127.0.0.1:1/unused".to_string(),
    };
    let stopwords = mbti_nlp::text::stopwords::load(&source).unwrap();

    let tokens = Tokenizer::shared().tokenize("the quick fox and a dog, running to town!");
    let once = filter_tokens(&tokens, &stopwords);
    let twice = filter_tokens(&once, &stopwords);

    assert_eq!(once, twice);
    assert!(!once.contains(&"the".to_string()));
    assert!(!once.contains(&",".to_string()));
    assert!(once.contains(&"fox".to_string()));
}

#[test]
fn test_out_of_set_label_fails_at_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("raw.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "INTJ,first|||second").unwrap();
    writeln!(file, "ZZZZ,these posts have a bad label").unwrap();
    drop(file);

    let err = load_dataset(&path).unwrap_err();
    assert!(matches!(err, MbtiError::DataIntegrity(_)));
    assert!(err.to_string().contains("ZZZZ"));
}

#[test]
fn test_cleaned_file_round_trip_preserves_tokens() {
    let records = vec![record("ISTP", "hello world :)|||second post")];
    let pool = WorkerPool::sequential().unwrap();
    let cleaned = preprocess(&records, None, &pool);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cleaned.csv");
    save_cleaned(&path, &cleaned).unwrap();

    let reloaded = load_cleaned(&path).unwrap();
    assert_eq!(reloaded, cleaned);
}
