//! Feature extraction: count vectorization, IDF weighting, chi-squared
//! selection, and the composed text pipeline

pub mod pipeline;
pub mod selection;
pub mod tfidf;
pub mod vectorizer;

pub use pipeline::{build_pipeline, ParamValue, TextPipeline};
pub use selection::{SelectK, SelectKBest};
pub use tfidf::TfidfTransformer;
pub use vectorizer::CountVectorizer;
