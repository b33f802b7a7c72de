//! End-to-end tests: preprocessing into pipelines, evaluation, search,
//! and persistence

use mbti_nlp::prelude::*;

/// Synthetic corpus with class-specific vocabulary plus shared filler.
fn synthetic_corpus() -> (Vec<Vec<String>>, Vec<String>) {
    let mut docs = Vec::new();
    let mut labels = Vec::new();
    let profiles: [(&str, [&str; 3]); 4] = [
        ("INTJ", ["logic", "systems", "plan"]),
        ("ENFP", ["party", "people", "fun"]),
        ("ISTP", ["tools", "fix", "machines"]),
        ("ESFJ", ["host", "care", "community"]),
    ];

    for i in 0..40 {
        let (label, words) = profiles[i % profiles.len()];
        let mut doc: Vec<String> = words.iter().map(|w| w.to_string()).collect();
        doc.push("the".to_string());
        doc.push(format!("filler{}", i));
        docs.push(doc);
        labels.push(label.to_string());
    }
    (docs, labels)
}

#[test]
fn test_fitted_pipeline_beats_majority_baseline() {
    let (docs, labels) = synthetic_corpus();
    let mut pipeline = build_pipeline(MultinomialNb::default());
    pipeline.fit(&docs, &labels).unwrap();

    let predicted = pipeline.predict(&docs).unwrap();
    let model_accuracy = accuracy(&predicted, &labels).unwrap();

    let majority = majority_class_baseline(&labels).unwrap();
    let baseline_predictions: Vec<String> = vec![majority; labels.len()];
    let baseline_accuracy = accuracy(&baseline_predictions, &labels).unwrap();

    assert!(
        model_accuracy >= baseline_accuracy,
        "model {} below baseline {}",
        model_accuracy,
        baseline_accuracy
    );
}

#[test]
fn test_grid_search_parallelism_determinism() {
    let (docs, labels) = synthetic_corpus();
    let pipeline = build_pipeline(MultinomialNb::default());
    let grid = ParameterGrid::new().add(
        "clf__alpha",
        vec![ParamValue::Float(0.1), ParamValue::Float(0.01)],
    );

    let sequential = grid_search(
        &pipeline,
        &grid,
        &docs,
        &labels,
        5,
        &WorkerPool::new(1).unwrap(),
    )
    .unwrap();
    let parallel = grid_search(
        &pipeline,
        &grid,
        &docs,
        &labels,
        5,
        &WorkerPool::new(4).unwrap(),
    )
    .unwrap();

    assert_eq!(sequential.best_params, parallel.best_params);
    assert_eq!(sequential.best_score, parallel.best_score);
}

#[test]
fn test_unknown_grid_parameter_fails_before_fitting() {
    let (docs, labels) = synthetic_corpus();
    let pipeline = build_pipeline(MultinomialNb::default());
    let grid = ParameterGrid::new()
        .add("clf__alpha", vec![ParamValue::Float(0.1)])
        .add("clf__not_a_param", vec![ParamValue::Int(3)]);

    let err = grid_search(
        &pipeline,
        &grid,
        &docs,
        &labels,
        5,
        &WorkerPool::sequential().unwrap(),
    )
    .unwrap_err();
    assert!(matches!(err, MbtiError::Config(_)));
}

#[test]
fn test_cross_validation_report() {
    let (docs, labels) = synthetic_corpus();
    let pipeline = build_pipeline(MultinomialNb::default());
    let results = cross_validate(&pipeline, &docs, &labels, 5).unwrap();

    assert_eq!(results.n_folds, 5);
    assert!(results.mean_score > 0.5);
    assert!(results.summary().contains("+/-"));
}

#[test]
fn test_linear_svm_pipeline_end_to_end() {
    let (docs, labels) = synthetic_corpus();
    let mut pipeline = build_pipeline(SgdClassifier::default());
    pipeline.fit(&docs, &labels).unwrap();
    let score = pipeline.score(&docs, &labels).unwrap();
    assert!(score > 0.5, "training accuracy too low: {}", score);
}

#[test]
fn test_mlp_pipeline_with_selection() {
    let (docs, labels) = synthetic_corpus();
    let mut pipeline = TextPipeline::new(
        CountVectorizer::new(),
        TfidfTransformer::new(),
        SelectKBest::top_k(12).unwrap(),
        MlpClassifier::new(MlpConfig {
            hidden_layers: vec![16],
            max_iter: 150,
            learning_rate_init: 0.05,
            ..Default::default()
        }),
    );
    pipeline.fit(&docs, &labels).unwrap();
    let score = pipeline.score(&docs, &labels).unwrap();
    assert!(score > 0.5, "training accuracy too low: {}", score);
}

#[test]
fn test_persisted_pipeline_predicts_without_retraining() {
    let (docs, labels) = synthetic_corpus();
    let mut pipeline = build_pipeline(MultinomialNb::default());
    pipeline.fit(&docs, &labels).unwrap();
    let expected = pipeline.predict(&docs).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("models/pipeline.json");
    save_pipeline(&pipeline, &path).unwrap();

    let loaded: TextPipeline<MultinomialNb> = load_pipeline(&path).unwrap();
    assert_eq!(loaded.predict(&docs).unwrap(), expected);
}

#[test]
fn test_success_rate_undefined_for_absent_label() {
    let actual: Vec<String> = vec!["INTJ".to_string(), "ENFP".to_string()];
    let predicted: Vec<String> = vec!["INTJ".to_string(), "ENFP".to_string()];
    let rates = per_label_success_rate(&actual, &predicted).unwrap();

    assert_eq!(rates["INTJ"], 1.0);
    assert!(rates.get("ISTP").is_none());
}
