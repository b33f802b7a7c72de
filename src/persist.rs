//! Pipeline persistence
//!
//! A fitted pipeline is one artifact: vectorizer vocabulary, IDF
//! statistics, selected-feature indices, and classifier parameters are
//! serialized together so the reloaded model predicts without retraining.

use crate::error::{MbtiError, Result};
use crate::features::pipeline::TextPipeline;
use crate::models::Classifier;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Serialize a fitted pipeline to a JSON file, creating intermediate
/// directories as needed. Refuses to save an unfitted pipeline.
pub fn save_pipeline<C>(pipeline: &TextPipeline<C>, path: impl AsRef<Path>) -> Result<()>
where
    C: Classifier + Serialize,
{
    if !pipeline.is_fitted() {
        return Err(MbtiError::Unfitted(
            "refusing to save an unfitted pipeline".to_string(),
        ));
    }

    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(pipeline)?;
    std::fs::write(path, json)?;
    tracing::info!(path = %path.display(), "saved pipeline");
    Ok(())
}

/// Load a pipeline saved by [`save_pipeline`].
pub fn load_pipeline<C>(path: impl AsRef<Path>) -> Result<TextPipeline<C>>
where
    C: Classifier + DeserializeOwned,
{
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)?;
    let pipeline = serde_json::from_str(&json)?;
    Ok(pipeline)
}
