//! Command-line interface
//!
//! One keyword per action, mirroring the analysis workflow: inspect the
//! raw data, tokenize it once into a cleaned file, then run summaries and
//! model evaluations against the cleaned file.

use crate::data::{self, CleanedRecord};
use crate::error::Result;
use crate::eval::cross_validation::cross_validate;
use crate::eval::metrics;
use crate::features::pipeline::{build_pipeline, ParamValue, TextPipeline};
use crate::models::{
    Classifier, LearningRate, MlpClassifier, MlpConfig, MultinomialNb, Penalty, SgdClassifier,
    SgdConfig,
};
use crate::parallel::WorkerPool;
use crate::persist::save_pipeline;
use crate::search::{grid_search, ParameterGrid};
use crate::summary;
use crate::text::stopwords;
use crate::text::tokenizer::Tokenizer;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

const TEST_FRACTION: f64 = 0.33;
const SPLIT_SEED: u64 = 42;
const CV_FOLDS: usize = 5;

#[derive(Parser)]
#[command(
    name = "mbti-nlp",
    version,
    about = "Personality-type prediction from social-media posts"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print a basic summary of the raw dataset
    Basic {
        #[arg(long, default_value = "data/mbti_1.csv")]
        data: PathBuf,
    },
    /// Tokenize the corpus and write the cleaned dataset
    Tokenize {
        #[arg(long, default_value = "data/mbti_1.csv")]
        data: PathBuf,
        #[arg(long, default_value = "data/mbti_2.csv")]
        output: PathBuf,
        /// Skip stopword and punctuation removal
        #[arg(long)]
        keep_stopwords: bool,
        /// Worker count; defaults to all available
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Report label frequencies and the most frequent words
    Freq {
        #[arg(long, default_value = "data/mbti_2.csv")]
        cleaned: PathBuf,
        #[arg(long, default_value_t = 25)]
        top: usize,
    },
    /// Emit the flat token multiset used for word-cloud generation
    Cloud {
        #[arg(long, default_value = "data/mbti_2.csv")]
        cleaned: PathBuf,
        /// Write the tokens here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Train naive Bayes on a split and predict two example sentences
    Initial {
        #[arg(long, default_value = "data/mbti_2.csv")]
        cleaned: PathBuf,
    },
    /// Naive Bayes: test evaluation, cross-validation, and grid search
    Nb {
        #[arg(long, default_value = "data/mbti_2.csv")]
        cleaned: PathBuf,
        /// Worker count for the grid search
        #[arg(long, default_value_t = 1)]
        workers: usize,
        /// Save the fitted pipeline here
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Linear SVM: test evaluation and cross-validation
    Svm {
        #[arg(long, default_value = "data/mbti_2.csv")]
        cleaned: PathBuf,
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Neural network: test evaluation and cross-validation
    Nn {
        #[arg(long, default_value = "data/mbti_2.csv")]
        cleaned: PathBuf,
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Basic { data } => cmd_basic(&data),
        Commands::Tokenize {
            data,
            output,
            keep_stopwords,
            workers,
        } => cmd_tokenize(&data, &output, keep_stopwords, workers),
        Commands::Freq { cleaned, top } => cmd_freq(&cleaned, top),
        Commands::Cloud { cleaned, output } => cmd_cloud(&cleaned, output.as_deref()),
        Commands::Initial { cleaned } => cmd_initial(&cleaned),
        Commands::Nb {
            cleaned,
            workers,
            save,
        } => cmd_nb(&cleaned, workers, save.as_deref()),
        Commands::Svm { cleaned, save } => cmd_svm(&cleaned, save.as_deref()),
        Commands::Nn { cleaned, save } => cmd_nn(&cleaned, save.as_deref()),
    }
}

fn cmd_basic(data: &std::path::Path) -> Result<()> {
    let records = data::load_dataset(data)?;
    println!("columns: type, posts");
    println!("shape: ({}, 2)", records.len());

    let preview = |record: &data::Record| {
        let posts: String = record.posts.chars().take(60).collect();
        println!("  {}  {}...", record.label, posts);
    };
    println!("head:");
    records.iter().take(5).for_each(preview);
    println!("tail:");
    records.iter().rev().take(5).rev().for_each(preview);
    Ok(())
}

fn cmd_tokenize(
    data: &std::path::Path,
    output: &std::path::Path,
    keep_stopwords: bool,
    workers: Option<usize>,
) -> Result<()> {
    let records = data::load_dataset(data)?;
    let pool = match workers {
        Some(n) => WorkerPool::new(n)?,
        None => WorkerPool::all()?,
    };

    let cleaned = if keep_stopwords {
        crate::text::preprocess(&records, None, &pool)
    } else {
        let stopword_set = stopwords::shared()?;
        crate::text::preprocess(&records, Some(stopword_set), &pool)
    };

    data::save_cleaned(output, &cleaned)?;
    println!(
        "tokenized {} records into {} cleaned posts -> {}",
        records.len(),
        cleaned.len(),
        output.display()
    );
    Ok(())
}

fn cmd_freq(cleaned: &std::path::Path, top: usize) -> Result<()> {
    let records = data::load_cleaned(cleaned)?;

    println!("personality type frequencies:");
    let labels: Vec<&str> = records.iter().map(|r| r.label.as_str()).collect();
    for (label, count) in summary::label_counts(labels.iter().copied()) {
        println!("  {}: {}", label, count);
    }

    println!("top {} words:", top);
    for (word, count) in summary::top_words(&records, top) {
        println!("  {}: {}", word, count);
    }
    Ok(())
}

fn cmd_cloud(cleaned: &std::path::Path, output: Option<&std::path::Path>) -> Result<()> {
    let records = data::load_cleaned(cleaned)?;
    let words = summary::gather_words(&records);
    let joined = words.join(" ");

    match output {
        Some(path) => {
            std::fs::write(path, joined)?;
            println!("wrote {} tokens to {}", words.len(), path.display());
        }
        None => println!("{}", joined),
    }
    Ok(())
}

fn cmd_initial(cleaned: &std::path::Path) -> Result<()> {
    let (train, _test) = load_split(cleaned)?;
    let (train_docs, train_labels) = unzip_records(&train);

    let mut pipeline = build_pipeline(MultinomialNb::default());
    pipeline.fit(&train_docs, &train_labels)?;

    let samples = [
        "Writing college essays is stressful because I have to give a stranger \
         a piece of myself and that piece has to incorporate all of who I am",
        "Our favorite friendships are the ones where you can go from talking about \
         the latest episode of the Bachelorette to the meaning of life",
    ];
    let tokenizer = Tokenizer::shared();
    for sentence in samples {
        let doc = vec![tokenizer.tokenize(sentence)];
        let predicted = pipeline.predict(&doc)?;
        println!("{:?} => {}", sentence, predicted[0]);
    }
    Ok(())
}

fn cmd_nb(cleaned: &std::path::Path, workers: usize, save: Option<&std::path::Path>) -> Result<()> {
    let pipeline = build_pipeline(MultinomialNb::default());
    let fitted = run_model("Naive Bayes", pipeline, cleaned, save)?;

    // Parameter tuning over the canonical naive Bayes grid
    let grid = ParameterGrid::new()
        .add(
            "vect__ngram_range",
            vec![ParamValue::Pair(1, 1), ParamValue::Pair(1, 2)],
        )
        .add(
            "tfidf__use_idf",
            vec![ParamValue::Bool(true), ParamValue::Bool(false)],
        )
        .add(
            "clf__alpha",
            vec![
                ParamValue::Float(0.1),
                ParamValue::Float(0.01),
                ParamValue::Float(0.001),
            ],
        )
        .add(
            "clf__fit_prior",
            vec![ParamValue::Bool(true), ParamValue::Bool(false)],
        );

    let (train, _test) = load_split(cleaned)?;
    let (train_docs, train_labels) = unzip_records(&train);
    let pool = WorkerPool::new(workers)?;
    let result = grid_search(&fitted, &grid, &train_docs, &train_labels, CV_FOLDS, &pool)?;

    println!("grid search best parameters:");
    println!("{}", result.describe_best());
    Ok(())
}

fn cmd_svm(cleaned: &std::path::Path, save: Option<&std::path::Path>) -> Result<()> {
    let config = SgdConfig {
        penalty: Penalty::L2,
        alpha: 1e-3,
        max_iter: 5,
        learning_rate: LearningRate::Optimal,
        random_state: Some(42),
        ..Default::default()
    };
    let pipeline = build_pipeline(SgdClassifier::new(config));
    run_model("Linear SVM", pipeline, cleaned, save)?;
    Ok(())
}

fn cmd_nn(cleaned: &std::path::Path, save: Option<&std::path::Path>) -> Result<()> {
    let config = MlpConfig {
        hidden_layers: vec![50],
        max_iter: 50,
        alpha: 1e-4,
        tol: 1e-4,
        learning_rate_init: 0.1,
        random_state: Some(1),
        ..Default::default()
    };
    let pipeline = build_pipeline(MlpClassifier::new(config));
    let fitted = run_model("Neural Network", pipeline, cleaned, save)?;

    // Per-type success rates on the held-out split
    let (_train, test) = load_split(cleaned)?;
    let (test_docs, test_labels) = unzip_records(&test);
    let predicted = fitted.predict(&test_docs)?;
    println!("success rate per personality type:");
    for (label, rate) in metrics::per_label_success_rate(&test_labels, &predicted)? {
        println!("  {}: {:.4}", label, rate);
    }
    Ok(())
}

/// Fit a pipeline on the canonical split, report test metrics and
/// cross-validation, optionally persist it, and hand back the fitted
/// pipeline.
fn run_model<C>(
    name: &str,
    mut pipeline: TextPipeline<C>,
    cleaned: &std::path::Path,
    save: Option<&std::path::Path>,
) -> Result<TextPipeline<C>>
where
    C: Classifier + Clone + Serialize,
{
    let (train, test) = load_split(cleaned)?;
    let (train_docs, train_labels) = unzip_records(&train);
    let (test_docs, test_labels) = unzip_records(&test);

    pipeline.fit(&train_docs, &train_labels)?;
    let predicted = pipeline.predict(&test_docs)?;

    let accuracy = metrics::accuracy(&predicted, &test_labels)?;
    let mislabeled = predicted
        .iter()
        .zip(test_labels.iter())
        .filter(|(p, a)| p != a)
        .count();
    println!("The accuracy of the {} algorithm is: {:.4}", name, accuracy);
    println!(
        "The test error rate of the {} algorithm is: {:.4}",
        name,
        metrics::error_rate(&predicted, &test_labels)?
    );
    println!(
        "Number of mislabeled points out of a total {} points: {}",
        test_labels.len(),
        mislabeled
    );

    // Cross-validation over the whole cleaned corpus
    let mut all = train;
    all.extend(test);
    let (all_docs, all_labels) = unzip_records(&all);
    let cv = cross_validate(&pipeline, &all_docs, &all_labels, CV_FOLDS)?;
    println!("{}", cv.summary());

    if let Some(path) = save {
        save_pipeline(&pipeline, path)?;
        println!("saved pipeline to {}", path.display());
    }
    Ok(pipeline)
}

fn load_split(cleaned: &std::path::Path) -> Result<(Vec<CleanedRecord>, Vec<CleanedRecord>)> {
    let records = data::load_cleaned(cleaned)?;
    data::train_test_split(&records, TEST_FRACTION, SPLIT_SEED)
}

fn unzip_records(records: &[CleanedRecord]) -> (Vec<Vec<String>>, Vec<String>) {
    let docs = records.iter().map(|r| r.tokens.clone()).collect();
    let labels = records.iter().map(|r| r.label.clone()).collect();
    (docs, labels)
}
