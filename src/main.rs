//! Rubric grading CLI entrypoint.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use tracing::{info, warn};

use rubric::config::GraderConfig;
use rubric::embedding::SharedEmbedder;
use rubric::evaluation::Evaluator;
use rubric::grading::{BatchGrader, CancelHandle};
use rubric::marking::{MarkingEngine, Thresholds};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Short-answer grading by semantic similarity to rubric points
#[derive(Parser, Debug)]
#[command(name = "rubric")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory with model_answers.json, student_answers.json and teacher_labels.json
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Sentence-embedding model directory (stub embedder when unset)
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,

    /// Comma-separated similarity thresholds, highest first
    #[arg(long, global = true)]
    thresholds: Option<Thresholds>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Grade every student answer and print the results as JSON
    Grade,
    /// Compare awarded marks with teacher labels
    Evaluate,
}

impl Cli {
    fn apply(&self, mut config: GraderConfig) -> GraderConfig {
        if let Some(ref dir) = self.data_dir {
            config = config.with_data_dir(dir);
        }
        if let Some(ref dir) = self.model_dir {
            config = config.with_model_dir(dir);
        }
        if let Some(ref thresholds) = self.thresholds {
            config = config.with_thresholds(thresholds.clone());
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = cli.apply(GraderConfig::from_env()?);
    config.validate()?;

    info!(
        data_dir = %config.data_dir.display(),
        thresholds = %config.thresholds,
        timeout = ?config.embed_timeout,
        "Rubric starting"
    );

    let data = config.data();
    let rubrics = data.rubrics()?;
    let submissions = data.submissions()?;

    let embedder = SharedEmbedder::new(config.embedder_config());
    let engine = MarkingEngine::new(embedder).with_timeout(config.embed_timeout);

    let cancel = CancelHandle::new();
    spawn_interrupt_listener(cancel.clone());

    match cli.command {
        Command::Grade => {
            let run = BatchGrader::new(engine)
                .with_max_concurrent_batches(config.max_concurrent_batches)
                .grade_all_with_cancel(&rubrics, &submissions, &config.thresholds, &cancel)
                .await?;

            if !run.is_clean() {
                warn!(failed = run.failed(), "Some submissions could not be graded");
            }
            println!("{}", serde_json::to_string_pretty(&run)?);
        }
        Command::Evaluate => {
            let labels = data.teacher_labels()?;

            let report = Evaluator::new(engine)
                .with_sample_limit(config.sample_limit)
                .with_max_concurrent_batches(config.max_concurrent_batches)
                .evaluate_with_cancel(
                    &rubrics,
                    &submissions,
                    &labels,
                    &config.thresholds,
                    &cancel,
                )
                .await?;

            println!("{}", report.summary());
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

/// Cancels the run on Ctrl-C; batches already embedding are allowed to finish.
fn spawn_interrupt_listener(cancel: CancelHandle) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling after the current question batches");
            cancel.cancel();
        }
    });
}
