//! multisvm Command Line Interface
//!
//! Train, evaluate and apply multi-class SVM models on LibSVM and CSV data.

use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::{error, info};
use multisvm::core::{Dataset, Result};
use multisvm::data::{load_dataset, DataFormat};
use multisvm::kernel::Gamma;
use multisvm::multiclass::{
    BinaryClassifierFactory, KernelParams, LinearParams, ModelOf, NuParams, SvcKind,
};
use multisvm::persistence::{ModelMetadata, SavedModel};
use multisvm::MultiClassSvc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "multisvm")]
#[command(about = "Multi-class Support Vector Machines (one-vs-one / one-vs-rest)")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a new multi-class model
    Train(TrainArgs),
    /// Make predictions using a trained model
    Predict(PredictArgs),
    /// Evaluate a model on labelled test data
    Evaluate(EvaluateArgs),
    /// Display model information
    Info(InfoArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliModel {
    /// Linear C-SVC
    Linear,
    /// Kernel C-SVC
    Kernel,
    /// Kernel nu-SVC
    Nu,
}

#[derive(Args)]
struct TrainArgs {
    /// Training data file (LibSVM or CSV format)
    #[arg(long)]
    data: PathBuf,

    /// Output model file
    #[arg(short, long)]
    output: PathBuf,

    /// Data format: auto, libsvm, or csv
    #[arg(short, long, default_value = "auto")]
    format: String,

    /// Binary classifier formulation
    #[arg(long, value_enum, default_value = "kernel")]
    model: CliModel,

    /// Decomposition method: ovo or ovr
    #[arg(long, default_value = "ovo")]
    method: String,

    /// Regularization parameter C (linear and kernel models)
    #[arg(short = 'C', long, default_value = "1.0")]
    c: f64,

    /// nu parameter in (0, 1] (nu model)
    #[arg(long, default_value = "0.5")]
    nu: f64,

    /// Kernel: linear, rbf, poly or sigmoid
    #[arg(long, default_value = "rbf")]
    kernel: String,

    /// Polynomial degree
    #[arg(long, default_value = "3")]
    degree: u32,

    /// Kernel coefficient: scale, auto or a positive number
    #[arg(long, default_value = "scale", allow_negative_numbers = true)]
    gamma: String,

    /// Independent term of the poly and sigmoid kernels
    #[arg(long, default_value = "0.0", allow_negative_numbers = true)]
    coef0: f64,

    /// Convergence tolerance
    #[arg(long, default_value = "0.001")]
    tol: f64,

    /// Maximum solver iterations per binary problem
    #[arg(long, default_value = "1000")]
    max_iter: usize,

    /// Worker hint: 1 sequential, n threads, -1 all cores
    #[arg(long, allow_negative_numbers = true)]
    n_jobs: Option<i32>,
}

#[derive(Args)]
struct PredictArgs {
    /// Trained model file
    #[arg(short, long)]
    model: PathBuf,

    /// Input data file
    #[arg(long)]
    data: PathBuf,

    /// Output predictions file (prints to stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Data format: auto, libsvm, or csv
    #[arg(short, long, default_value = "auto")]
    format: String,
}

#[derive(Args)]
struct EvaluateArgs {
    /// Trained model file
    #[arg(short, long)]
    model: PathBuf,

    /// Test data file
    #[arg(long)]
    data: PathBuf,

    /// Data format: auto, libsvm, or csv
    #[arg(short, long, default_value = "auto")]
    format: String,

    /// Show the per-class report
    #[arg(long)]
    detailed: bool,
}

#[derive(Args)]
struct InfoArgs {
    /// Model file
    model: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Train(args) => train_command(args),
        Commands::Predict(args) => predict_command(args),
        Commands::Evaluate(args) => evaluate_command(args),
        Commands::Info(args) => info_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Bounds every persisted hyperparameter set satisfies
trait PersistedParams: BinaryClassifierFactory + Clone + Debug + Serialize + DeserializeOwned {}

impl PersistedParams for LinearParams {}
impl PersistedParams for KernelParams {}
impl PersistedParams for NuParams {}

fn train_command(args: TrainArgs) -> Result<()> {
    let format: DataFormat = args.format.parse()?;
    let gamma: Gamma = args.gamma.parse()?;

    info!("Loading training data from: {:?}", args.data);
    let dataset = load_dataset(&args.data, format)?;
    info!(
        "Loaded {} samples with {} dimensions",
        dataset.len(),
        dataset.dim()
    );

    match args.model {
        CliModel::Linear => {
            let params = LinearParams::default()
                .with_c(args.c)
                .with_tol(args.tol)
                .with_max_iter(args.max_iter);
            train_and_save(params, &args, &*dataset)
        }
        CliModel::Kernel => {
            let params = KernelParams::default()
                .with_c(args.c)
                .with_kernel(&args.kernel)
                .with_degree(args.degree)
                .with_gamma(gamma)
                .with_coef0(args.coef0)
                .with_tol(args.tol)
                .with_max_iter(args.max_iter);
            train_and_save(params, &args, &*dataset)
        }
        CliModel::Nu => {
            let params = NuParams::default()
                .with_nu(args.nu)
                .with_kernel(&args.kernel)
                .with_degree(args.degree)
                .with_gamma(gamma)
                .with_coef0(args.coef0)
                .with_tol(args.tol)
                .with_max_iter(args.max_iter);
            train_and_save(params, &args, &*dataset)
        }
    }
}

fn train_and_save<F>(params: F, args: &TrainArgs, dataset: &dyn Dataset<Label = i64>) -> Result<()>
where
    F: PersistedParams,
    ModelOf<F>: Clone + Serialize + DeserializeOwned,
{
    info!("Training {} model ({}) with {:?}", F::KIND, args.method, params);

    let mut svc = MultiClassSvc::new(params).with_method(&args.method);
    if let Some(n_jobs) = args.n_jobs {
        svc = svc.with_n_jobs(n_jobs);
    }
    svc.fit_dataset(dataset)?;

    let saved = SavedModel::from_estimator(&svc)?;
    info!(
        "Trained {} binary classifiers for {} classes",
        saved.metadata.n_estimators, saved.metadata.n_classes
    );
    saved.save_to_file(&args.output)?;
    info!("Model saved to: {:?}", args.output);

    let accuracy = svc.score_dataset(dataset)?;
    info!("Training accuracy: {:.2}%", accuracy * 100.0);

    Ok(())
}

fn load_model<F>(path: &Path) -> Result<MultiClassSvc<F, i64>>
where
    F: PersistedParams,
    ModelOf<F>: Clone + Serialize + DeserializeOwned,
{
    info!("Loading model from: {path:?}");
    Ok(SavedModel::<F, ModelOf<F>, i64>::load_from_file(path)?.into_estimator())
}

fn predict_command(args: PredictArgs) -> Result<()> {
    match ModelMetadata::peek(&args.model)?.kind {
        SvcKind::Linear => predict_with::<LinearParams>(&args),
        SvcKind::Kernel => predict_with::<KernelParams>(&args),
        SvcKind::Nu => predict_with::<NuParams>(&args),
    }
}

fn predict_with<F>(args: &PredictArgs) -> Result<()>
where
    F: PersistedParams,
    ModelOf<F>: Clone + Serialize + DeserializeOwned,
{
    let svc = load_model::<F>(&args.model)?;
    let dataset = load_dataset(&args.data, args.format.parse()?)?;
    let predictions = svc.predict(dataset.features())?;

    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };

    writeln!(writer, "# Predictions for {} samples", predictions.len())?;
    writeln!(writer, "# Format: sample_index predicted_label")?;
    for (i, label) in predictions.iter().enumerate() {
        writeln!(writer, "{i} {label}")?;
    }
    writer.flush()?;

    if let Some(path) = &args.output {
        info!("Predictions saved to: {path:?}");
    }
    Ok(())
}

fn evaluate_command(args: EvaluateArgs) -> Result<()> {
    match ModelMetadata::peek(&args.model)?.kind {
        SvcKind::Linear => evaluate_with::<LinearParams>(&args),
        SvcKind::Kernel => evaluate_with::<KernelParams>(&args),
        SvcKind::Nu => evaluate_with::<NuParams>(&args),
    }
}

fn evaluate_with<F>(args: &EvaluateArgs) -> Result<()>
where
    F: PersistedParams,
    ModelOf<F>: Clone + Serialize + DeserializeOwned,
{
    let svc = load_model::<F>(&args.model)?;
    let dataset = load_dataset(&args.data, args.format.parse()?)?;
    let matrix = svc.evaluate(dataset.features(), dataset.labels())?;

    println!("=== Model Evaluation ===");
    println!("Classifier: {} ({})", F::KIND, svc.method());
    println!("Samples: {}", matrix.total());
    println!("Accuracy: {:.2}%", matrix.accuracy() * 100.0);

    if args.detailed {
        println!();
        print!("{}", matrix.report());
    }

    Ok(())
}

fn info_command(args: InfoArgs) -> Result<()> {
    match ModelMetadata::peek(&args.model)?.kind {
        SvcKind::Linear => info_with::<LinearParams>(&args),
        SvcKind::Kernel => info_with::<KernelParams>(&args),
        SvcKind::Nu => info_with::<NuParams>(&args),
    }
}

fn info_with<F>(args: &InfoArgs) -> Result<()>
where
    F: PersistedParams,
    ModelOf<F>: Clone + Serialize + DeserializeOwned,
{
    let saved = SavedModel::<F, ModelOf<F>, i64>::load_from_file(&args.model)?;
    saved.print_summary();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_train_args_parse() {
        let cli = Cli::try_parse_from([
            "multisvm", "train", "--data", "d.libsvm", "-o", "m.json", "--model", "nu",
            "--method", "ovr", "--n-jobs", "-1", "--gamma", "0.5",
        ])
        .unwrap();

        match cli.command {
            Commands::Train(args) => {
                assert!(matches!(args.model, CliModel::Nu));
                assert_eq!(args.method, "ovr");
                assert_eq!(args.n_jobs, Some(-1));
                assert_eq!(args.gamma, "0.5");
                assert_eq!(args.max_iter, 1000);
            }
            _ => panic!("expected train"),
        }
    }
}
