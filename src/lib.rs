//! mbti-nlp - Personality-type text classification
//!
//! Predicts one of the 16 Myers-Briggs personality-type codes from a
//! subject's aggregated social-media posts. The crate covers the whole
//! analysis workflow:
//!
//! - Tokenization of noisy social text (emoticons, mentions, hashtags,
//!   URLs) with stopword and punctuation removal
//! - Partitioned, order-stable corpus preprocessing
//! - A composed feature pipeline: n-gram counts, IDF weighting,
//!   chi-squared feature selection, and a pluggable classifier
//! - Three classifier families: multinomial naive Bayes, linear-margin
//!   SGD, and a feed-forward neural network
//! - Evaluation: accuracy, confusion counts, per-label success rates,
//!   k-fold cross-validation
//! - Exhaustive, deterministic grid search over pipeline hyperparameters
//! - Pipeline persistence as a single JSON artifact
//!
//! # Modules
//!
//! - [`data`] - Dataset records, label validation, CSV I/O, splits
//! - [`text`] - Tokenizer, stopword filter, corpus preprocessor
//! - [`features`] - Vectorizer, IDF transform, selection, pipeline
//! - [`models`] - Classifier trait and the concrete model families
//! - [`eval`] - Metrics and cross-validation
//! - [`search`] - Parameter grids and grid search
//! - [`parallel`] - Explicit worker pool
//! - [`persist`] - Pipeline save/load
//! - [`summary`] - Label counts, word frequencies, token multisets
//! - [`cli`] - Command-line interface

pub mod error;

pub mod cli;
pub mod data;
pub mod eval;
pub mod features;
pub mod models;
pub mod parallel;
pub mod persist;
pub mod search;
pub mod summary;
pub mod text;

pub use error::{MbtiError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{MbtiError, Result};

    pub use crate::data::{
        load_cleaned, load_dataset, save_cleaned, train_test_split, CleanedRecord, Record,
        MBTI_TYPES, POST_DELIMITER,
    };

    pub use crate::text::{filter_tokens, preprocess, StopwordSource, Tokenizer};

    pub use crate::features::{
        build_pipeline, CountVectorizer, ParamValue, SelectK, SelectKBest, TextPipeline,
        TfidfTransformer,
    };

    pub use crate::models::{
        Classifier, MlpClassifier, MlpConfig, MultinomialNb, SgdClassifier, SgdConfig,
    };

    pub use crate::eval::{
        accuracy, confusion_counts, cross_validate, error_rate, majority_class_baseline,
        per_label_success_rate, CvResults,
    };

    pub use crate::search::{grid_search, GridSearchResult, ParameterGrid};

    pub use crate::parallel::WorkerPool;

    pub use crate::persist::{load_pipeline, save_pipeline};
}
