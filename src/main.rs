//! Person Discovery Eval CLI
//!
//! Average precision at rank K and submission validation

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use person_discovery_eval::{
    load_queries, AveragePrecision, Denominator, EvalConfig, OutputFormat, ReportBuilder, Subset,
    Validator,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "person-discovery-eval")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show progress
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute average precision at rank K for each query
    Metric {
        /// Path to reference file
        reference: PathBuf,

        /// Path to hypothesis file
        hypothesis: PathBuf,

        /// Path to list of queries (defaults to every person in the reference)
        #[arg(long)]
        queries: Option<PathBuf>,

        /// Path to test subset ("corpus_id video_id" per line)
        #[arg(long)]
        subset: Option<PathBuf>,

        /// YAML evaluation configuration
        #[arg(long)]
        config: Option<PathBuf>,

        /// Rank cutoffs (overrides configuration)
        #[arg(long, value_delimiter = ',')]
        cutoffs: Vec<usize>,

        /// AP denominator: returned | relevant-capped (overrides configuration)
        #[arg(long)]
        denominator: Option<Denominator>,

        /// Output format: text | json | markdown
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Validate a submission and, optionally, its evidence
    Validate {
        /// Path to submission file
        submission: PathBuf,

        /// Path to list of shots
        #[arg(long)]
        shots: Option<PathBuf>,

        /// Path to evidence file
        #[arg(long)]
        evidence: Option<PathBuf>,
    },
}

struct MetricArgs {
    reference: PathBuf,
    hypothesis: PathBuf,
    queries: Option<PathBuf>,
    subset: Option<PathBuf>,
    config: Option<PathBuf>,
    cutoffs: Vec<usize>,
    denominator: Option<Denominator>,
    format: OutputFormat,
}

fn run_metric(args: MetricArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => EvalConfig::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => EvalConfig::default(),
    };
    config = config.with_cutoffs(args.cutoffs);
    if let Some(denominator) = args.denominator {
        config = config.with_denominator(denominator);
    }

    let subset = args
        .subset
        .as_ref()
        .map(|path| {
            Subset::load(path)
                .with_context(|| format!("Failed to load subset {}", path.display()))
        })
        .transpose()?;

    let evaluator = AveragePrecision::from_file(&args.reference, subset, config)
        .with_context(|| format!("Failed to load reference {}", args.reference.display()))?;

    let queries = match &args.queries {
        Some(path) => load_queries(path)
            .with_context(|| format!("Failed to load queries {}", path.display()))?,
        None => evaluator.queries(),
    };

    let mut session = evaluator
        .open_file(&args.hypothesis)
        .with_context(|| format!("Failed to load hypothesis {}", args.hypothesis.display()))?;

    let mut builder = ReportBuilder::new(evaluator.config()).with_inputs(
        &args.reference.display().to_string(),
        &args.hypothesis.display().to_string(),
    );

    let total = queries.len();
    for (i, query) in queries.iter().enumerate() {
        tracing::info!("Querying \"{query}\"... ({}/{total})", i + 1);
        let result = session.query(query);
        builder.add(query, result);
    }
    session.close();

    let report = builder.build();
    match args.format {
        OutputFormat::Text => print!("{}", report.to_text()),
        OutputFormat::Markdown => print!("{}", report.to_markdown()),
        OutputFormat::Json => println!(
            "{}",
            report.to_json().context("Failed to serialize report")?
        ),
    }

    Ok(())
}

fn run_validate(submission: &Path, shots: Option<&Path>, evidence: Option<&Path>) -> Result<()> {
    let validator = match shots {
        Some(path) => Validator::from_shots_file(path)
            .with_context(|| format!("Failed to load shots {}", path.display()))?,
        None => Validator::default(),
    };

    validator.validate_files(submission, evidence)?;

    println!("Submission is valid: {}", submission.display());
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the report
    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let outcome = match cli.command {
        Commands::Metric {
            reference,
            hypothesis,
            queries,
            subset,
            config,
            cutoffs,
            denominator,
            format,
        } => {
            tracing::info!(
                reference = %reference.display(),
                hypothesis = %hypothesis.display(),
                queries = ?queries,
                subset = ?subset,
                "Starting evaluation"
            );
            run_metric(MetricArgs {
                reference,
                hypothesis,
                queries,
                subset,
                config,
                cutoffs,
                denominator,
                format,
            })
        }
        Commands::Validate {
            submission,
            shots,
            evidence,
        } => {
            tracing::info!(
                submission = %submission.display(),
                shots = ?shots,
                evidence = ?evidence,
                "Validating submission"
            );
            run_validate(&submission, shots.as_deref(), evidence.as_deref())
        }
    };

    if let Err(e) = outcome {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
