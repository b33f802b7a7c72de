//! Model evaluation: metrics and cross-validation

pub mod cross_validation;
pub mod metrics;

pub use cross_validation::{cross_validate, CrossValidator, CvResults, CvSplit, CvStrategy};
pub use metrics::{
    accuracy, confusion_counts, error_rate, majority_class_baseline, per_label_success_rate,
};
