//! Text processing: tokenization, stopword filtering, corpus preprocessing

pub mod preprocess;
pub mod stopwords;
pub mod tokenizer;

pub use preprocess::preprocess;
pub use stopwords::{filter_tokens, StopwordSource};
pub use tokenizer::Tokenizer;
