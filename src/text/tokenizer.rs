//! Pattern tokenizer for noisy social-media text
//!
//! Splits text using an ordered list of alternatives with first-match-wins
//! semantics at each position: emoticons, HTML-style tags, @-mentions,
//! hashtags, URLs, numbers, words with hyphens or apostrophes, generic
//! words, and finally any single non-whitespace character. Matching is
//! case-insensitive. Tokens that are exactly an emoticon keep their case
//! (`:D` and `:d` are different faces); every other token is lowercased.

use regex::Regex;
use std::sync::OnceLock;

/// Emoticon: eyes, optional nose, mouth.
const EMOTICON_PATTERN: &str = r"[:=;][oO\-]?[D\)\]\(/\\OpPd]";

/// Ordered alternatives; earlier patterns win at equal positions.
const TOKEN_PATTERNS: [&str; 9] = [
    EMOTICON_PATTERN,
    r"<[^>]+>",                                       // HTML-style tags
    r"@[\w_]+",                                       // @-mentions
    r"\#+[\w_]+[\w'_\-]*[\w_]+",                      // hashtags
    r"https?://(?:[a-z0-9$\-_@.&+!*\(\),/:?=#~]|%[0-9a-f]{2})+", // URLs
    r"(?:\d+,?)+(?:\.?\d+)?",                         // numbers
    r"[a-z][a-z'\-_]+[a-z]",                          // words with - and '
    r"[\w_]+",                                        // other words
    r"\S",                                            // anything else
];

/// Tokenizer with the compiled pattern set.
#[derive(Debug)]
pub struct Tokenizer {
    token_re: Regex,
    emoticon_re: Regex,
}

static SHARED: OnceLock<Tokenizer> = OnceLock::new();

impl Tokenizer {
    fn compile() -> Self {
        let alternation = TOKEN_PATTERNS.join("|");
        let token_re =
            Regex::new(&format!("(?i){}", alternation)).expect("token patterns are valid");
        let emoticon_re =
            Regex::new(&format!("(?i)^{}$", EMOTICON_PATTERN)).expect("emoticon pattern is valid");
        Self {
            token_re,
            emoticon_re,
        }
    }

    /// Process-wide tokenizer, compiled once on first use.
    pub fn shared() -> &'static Tokenizer {
        SHARED.get_or_init(Self::compile)
    }

    /// Tokenize one post into an ordered sequence of normalized tokens.
    ///
    /// Empty input yields an empty sequence.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.token_re
            .find_iter(text)
            .map(|m| {
                let token = m.as_str();
                if self.emoticon_re.is_match(token) {
                    token.to_string()
                } else {
                    token.to_lowercase()
                }
            })
            .collect()
    }
}
