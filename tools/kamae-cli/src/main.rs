//! Kamae command-line driver
//!
//! Reshapes annotated tables, fine-tunes and queries stance classifiers, and
//! runs zero-shot stance prediction over JSON-lines posts.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kamae_core::dataset::{WideTable, reshape};
use kamae_core::io::{read_text_records, write_csv};
use kamae_core::zero_shot::{DEFAULT_BATCH_SIZE, NliScorer, ZeroShotRunner, expand_texts};
use kamae_core::{
    EntityCatalog, EntityResolver, Markers, Stance, StanceClassifier, StancePrediction,
    TextAnnotator,
};
use kamae_trainer::{TrainingConfig, run_training};
use tracing::{Level, info};

/// CLI arguments
#[derive(Parser)]
#[command(name = "kamae")]
#[command(about = "Entity-conditioned stance detection")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Entity catalog JSON (defaults to the built-in catalog)
    #[arg(short, long, global = true, env = "KAMAE_CATALOG")]
    catalog: Option<PathBuf>,

    /// Marker inserted before the entity mention
    #[arg(long, global = true, default_value = "<entity>")]
    open_marker: String,

    /// Marker inserted after the entity mention
    #[arg(long, global = true, default_value = "</entity>")]
    close_marker: String,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert the wide annotation CSV into one row per (text, entity)
    Reshape {
        /// Annotated CSV with a `text` column and one stance column per entity
        input: PathBuf,
        /// Output CSV
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Fine-tune a DistilBERT checkpoint on the annotated CSV
    FineTune {
        /// Annotated CSV with a `text` column and one stance column per entity
        input: PathBuf,
        /// Base model directory (config.json, tokenizer.json, model.safetensors)
        #[arg(short, long)]
        base_model: PathBuf,
        /// Where the fine-tuned model is written
        #[arg(short, long)]
        output_dir: PathBuf,
        #[command(flatten)]
        training: TrainingConfig,
    },
    /// Classify one text toward one entity with a fine-tuned model
    Predict {
        /// Fine-tuned model directory
        #[arg(short, long)]
        model_dir: PathBuf,
        /// Target entity
        #[arg(short, long)]
        entity: String,
        /// Text to classify
        text: String,
    },
    /// Zero-shot stance for every entity detected in JSON-lines posts
    ZeroShot {
        /// JSON-lines file with a `text` field per line
        input: PathBuf,
        /// Output CSV
        #[arg(short, long)]
        output: PathBuf,
        /// NLI model directory
        #[arg(short, long, env = "KAMAE_NLI_MODEL")]
        model_dir: PathBuf,
        /// Rows scored per model call
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },
}

fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn load_catalog(path: Option<&PathBuf>) -> Result<EntityCatalog> {
    match path {
        Some(path) => EntityCatalog::from_json_file(path)
            .with_context(|| format!("failed to load catalog {}", path.display())),
        None => Ok(EntityCatalog::default()),
    }
}

fn format_prediction(entity: &str, prediction: &StancePrediction) -> String {
    let dist: Vec<String> = Stance::all()
        .iter()
        .map(|s| format!("{s}={:.4}", prediction.probability(*s)))
        .collect();
    format!("{entity}: {} ({})", prediction.stance, dist.join(", "))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(log_level(cli.verbose))
        .with_writer(std::io::stderr)
        .init();

    let catalog = load_catalog(cli.catalog.as_ref())?;
    let annotator = TextAnnotator::new(Markers::new(cli.open_marker, cli.close_marker));

    match cli.command {
        Commands::Reshape { input, output } => {
            let table = WideTable::from_csv_path(&input)?;
            let reshaped = reshape(&table, &catalog, &annotator)?;
            write_csv(&output, &reshaped.records)?;
            info!(
                records = reshaped.records.len(),
                dropped = reshaped.drops.total(),
                output = %output.display(),
                "reshape complete"
            );
        }
        Commands::FineTune {
            input,
            base_model,
            output_dir,
            training,
        } => {
            let report = run_training(&input, &base_model, &output_dir, &catalog, &annotator, training)
                .context("fine-tuning failed")?;
            if let Some(validation) = report.final_validation() {
                info!(
                    accuracy = validation.accuracy,
                    macro_f1 = validation.macro_f1,
                    output = %output_dir.display(),
                    "fine-tuning complete"
                );
            }
        }
        Commands::Predict {
            model_dir,
            entity,
            text,
        } => {
            let classifier = StanceClassifier::load(&model_dir)
                .with_context(|| format!("failed to load model from {}", model_dir.display()))?;
            let prediction = classifier.predict(&text, &entity, &annotator)?;
            println!("{}", format_prediction(&entity, &prediction));
        }
        Commands::ZeroShot {
            input,
            output,
            model_dir,
            batch_size,
        } => {
            let texts = read_text_records(&input)?;
            let resolver = EntityResolver::from_catalog(&catalog)?;
            let rows = expand_texts(&texts, &resolver, &annotator)?;

            let scorer = NliScorer::load(&model_dir)
                .with_context(|| format!("failed to load NLI model from {}", model_dir.display()))?;
            let rows = ZeroShotRunner::new(scorer)
                .with_batch_size(batch_size)
                .predict(rows)
                .context("zero-shot prediction failed")?;

            write_csv(&output, &rows)?;
            info!(rows = rows.len(), output = %output.display(), "zero-shot complete");
        }
    }

    Ok(())
}
