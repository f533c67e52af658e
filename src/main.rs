//! # caruana
//!
//! Command-line front end: tune and evaluate a Caruana ensemble for one
//! registered dataset.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use caruana_forecast::data::{load_inputs, JsonPredictionStore, Registry};
use caruana_forecast::pipeline::{run, PipelineConfig};
use caruana_forecast::tuning::SearchStrategy;
use caruana_forecast::{EnsembleError, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "caruana")]
#[command(about = "Greedy ensemble selection over precomputed forecasts", long_about = None)]
struct Cli {
    /// Log at debug level (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tune the ensemble size, fit, and compare against the base models
    Run {
        /// Registry file (TOML)
        #[arg(short, long)]
        registry: PathBuf,

        /// Dataset name
        #[arg(short, long)]
        dataset: String,

        /// Comma-separated base model names
        #[arg(short, long, value_delimiter = ',')]
        models: Vec<String>,

        /// Number of search trials
        #[arg(short, long)]
        trials: Option<usize>,

        /// Random seed for the search
        #[arg(long)]
        seed: Option<u64>,

        /// Search strategy (random, bayesian)
        #[arg(long)]
        strategy: Option<SearchStrategy>,

        /// Evaluate the random design in parallel
        #[arg(long)]
        parallel: bool,

        /// Write the full report as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List registered datasets and models
    Datasets {
        /// Registry file (TOML)
        #[arg(short, long)]
        registry: PathBuf,
    },
}

struct RunArgs {
    registry: PathBuf,
    dataset: String,
    models: Vec<String>,
    overrides: SearchOverrides,
    output: Option<PathBuf>,
}

/// Search settings given on the command line.
#[derive(Debug, Clone, Default, PartialEq)]
struct SearchOverrides {
    trials: Option<usize>,
    seed: Option<u64>,
    strategy: Option<SearchStrategy>,
    parallel: bool,
}

impl SearchOverrides {
    /// Layer the command-line settings over the registry's pipeline config.
    /// `--parallel` can switch parallelism on but never off.
    fn apply(&self, mut config: PipelineConfig) -> PipelineConfig {
        if let Some(trials) = self.trials {
            config.search.trials = trials;
        }
        if let Some(seed) = self.seed {
            config.search.seed = Some(seed);
        }
        if let Some(strategy) = self.strategy {
            config.search.strategy = strategy;
        }
        config.search.parallel |= self.parallel;
        config
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_ensemble(args: RunArgs) -> Result<()> {
    let registry = Registry::load(&args.registry)?;

    let config = args.overrides.apply(registry.pipeline.clone());

    let store = JsonPredictionStore::new(registry.storage.clone());
    let inputs = load_inputs(&registry, &args.dataset, &args.models, &store)?;
    let report = run(&inputs, &config)?;

    println!("Dataset: {}", args.dataset);
    print!("{report}");

    if let Some(path) = args.output {
        let file = File::create(&path).map_err(|e| EnsembleError::io(&path, e))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &report)
            .map_err(|e| EnsembleError::io(&path, e))?;
        info!(path = %path.display(), "report written");
    }
    Ok(())
}

fn list_datasets(registry: PathBuf) -> Result<()> {
    let registry = Registry::load(registry)?;

    println!("Datasets:");
    for dataset in &registry.datasets {
        println!(
            "  {:<12} {} [{}]",
            dataset.name, dataset.path, dataset.target_column
        );
    }
    println!("Models:");
    for model in &registry.models {
        match &model.description {
            Some(description) => println!("  {:<12} {}", model.name, description),
            None => println!("  {}", model.name),
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            registry,
            dataset,
            models,
            trials,
            seed,
            strategy,
            parallel,
            output,
        } => run_ensemble(RunArgs {
            registry,
            dataset,
            models,
            overrides: SearchOverrides {
                trials,
                seed,
                strategy,
                parallel,
            },
            output,
        }),
        Commands::Datasets { registry } => list_datasets(registry),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
