//! Stopword set: load-once cache with local-then-remote resolution
//!
//! The combined set is the English stopword list plus ASCII punctuation as
//! single-character stopwords. It is resolved once per process: from the
//! local cache file when present, otherwise fetched from the remote list
//! (one retry) and written back to the cache. Both paths failing is an
//! error — silently proceeding with an empty set would change results.

use crate::error::{MbtiError, Result};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::OnceLock;

const DEFAULT_CACHE_PATH: &str = "data/stopwords_en.txt";
const DEFAULT_REMOTE_URL: &str =
    "https://raw.githubusercontent.com/stopwords-iso/stopwords-en/master/stopwords-en.txt";

const PUNCTUATION: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Where the stopword list lives: a local cache file and a remote fallback.
#[derive(Debug, Clone)]
pub struct StopwordSource {
    pub cache_path: PathBuf,
    pub remote_url: String,
}

impl Default for StopwordSource {
    fn default() -> Self {
        Self {
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            remote_url: DEFAULT_REMOTE_URL.to_string(),
        }
    }
}

static SHARED: OnceLock<HashSet<String>> = OnceLock::new();

/// Process-wide stopword set, resolved from the default source on first
/// use and reused afterwards. Safe under concurrent first access: losers
/// of the initialization race discard their copy.
pub fn shared() -> Result<&'static HashSet<String>> {
    if let Some(set) = SHARED.get() {
        return Ok(set);
    }
    let loaded = load(&StopwordSource::default())?;
    Ok(SHARED.get_or_init(|| loaded))
}

/// Load the combined stopword set from an explicit source, bypassing the
/// process-wide cache. Used directly by tests and anywhere the default
/// paths are wrong.
pub fn load(source: &StopwordSource) -> Result<HashSet<String>> {
    let body = if source.cache_path.exists() {
        tracing::debug!(path = %source.cache_path.display(), "reading cached stopword list");
        std::fs::read_to_string(&source.cache_path)?
    } else {
        let body = fetch_with_retry(&source.remote_url)?;
        if let Some(parent) = source.cache_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&source.cache_path, &body)?;
        tracing::info!(
            url = %source.remote_url,
            cache = %source.cache_path.display(),
            "fetched stopword list and wrote cache"
        );
        body
    };

    let mut set: HashSet<String> = body
        .lines()
        .map(|line| line.trim().to_lowercase())
        .filter(|word| !word.is_empty())
        .collect();

    if set.is_empty() {
        return Err(MbtiError::ResourceUnavailable(format!(
            "stopword list at {} is empty",
            source.cache_path.display()
        )));
    }

    for ch in PUNCTUATION.chars() {
        set.insert(ch.to_string());
    }
    Ok(set)
}

/// Remove stopwords and punctuation from a token sequence.
///
/// Order-preserving, no deduplication; applying it twice is a no-op.
pub fn filter_tokens(tokens: &[String], stopwords: &HashSet<String>) -> Vec<String> {
    tokens
        .iter()
        .filter(|token| !stopwords.contains(token.as_str()))
        .cloned()
        .collect()
}

// The fetch is the one retryable operation in the crate: it is a network
// call, so a single retry is worth it before giving up.
fn fetch_with_retry(url: &str) -> Result<String> {
    match fetch(url) {
        Ok(body) => Ok(body),
        Err(first) => {
            tracing::warn!(url, error = %first, "stopword fetch failed, retrying once");
            fetch(url).map_err(|second| {
                MbtiError::ResourceUnavailable(format!(
                    "{}: {} (retry also failed: {})",
                    url, first, second
                ))
            })
        }
    }
}

fn fetch(url: &str) -> std::result::Result<String, String> {
    ureq::get(url)
        .call()
        .map_err(|e| e.to_string())?
        .into_string()
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn local_source(words: &str) -> (tempfile::TempDir, StopwordSource) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stopwords.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{}", words).unwrap();
        let source = StopwordSource {
            cache_path: path,
            remote_url: "http://127.0.0.1:1/unreachable".to_string(),
        };
        (dir, source)
    }

    #[test]
    fn test_load_from_local_cache() {
        let (_dir, source) = local_source("the\nand\nof\n");
        let set = load(&source).unwrap();
        assert!(set.contains("the"));
        assert!(set.contains("and"));
        assert!(set.contains("!"));
        assert!(set.contains(","));
        assert!(!set.contains("hello"));
    }

    #[test]
    fn test_empty_list_is_an_error() {
        let (_dir, source) = local_source("\n\n");
        let err = load(&source).unwrap_err();
        assert!(matches!(err, MbtiError::ResourceUnavailable(_)));
    }

    #[test]
    fn test_unreachable_remote_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = StopwordSource {
            cache_path: dir.path().join("missing.txt"),
            remote_url: "http://127.0.0.1:1/unreachable".to_string(),
        };
        let err = load(&source).unwrap_err();
        assert!(matches!(err, MbtiError::ResourceUnavailable(_)));
    }

    #[test]
    fn test_filter_is_order_preserving_and_idempotent() {
        let (_dir, source) = local_source("the\na\n");
        let set = load(&source).unwrap();

        let tokens: Vec<String> = ["the", "cat", "!", "sat", "cat", "a"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let once = filter_tokens(&tokens, &set);
        assert_eq!(once, vec!["cat", "sat", "cat"]);

        let twice = filter_tokens(&once, &set);
        assert_eq!(twice, once);
    }
}
