mod config;
mod display;
mod review;

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use dialogue_review_core::screen::screen_raw;
use dialogue_review_core::{Corpus, ExportReport, FormState, LabelSummary, ReviewSession};
use dialogue_review_store::{SnapshotStore, write_export};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{DEFAULT_DIALOGUES, Settings};

#[derive(Parser)]
#[command(name = "dialogue-review")]
#[command(about = "Review labelled medical dialogues and export the judgments")]
#[command(version)]
struct Cli {
    /// Labelled dialogue corpus (JSON array)
    #[arg(long, global = true, env = "DIALOGUE_REVIEW_DIALOGUES", default_value = DEFAULT_DIALOGUES)]
    dialogues: PathBuf,

    /// Directory holding the saved evaluation snapshot
    #[arg(long, global = true, env = "DIALOGUE_REVIEW_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// Directory export files are written to
    #[arg(long, global = true, env = "DIALOGUE_REVIEW_EXPORT_DIR", default_value = ".")]
    export_dir: PathBuf,

    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Page through dialogues and record judgments interactively
    Review,
    /// Print one dialogue with its labels and saved judgments
    Show {
        /// 1-based dialogue number
        number: usize,
    },
    /// Write an export file from the saved evaluations
    Export,
    /// Summarise corpus and review progress
    Status,
    /// Drop dialogues that refer to attachments lost from the transcript
    Screen {
        /// Where to write the cleaned corpus
        #[arg(long)]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    info!("dialogue-review v{}", env!("CARGO_PKG_VERSION"));

    let settings = Settings::resolve(cli.dialogues, cli.state_dir, cli.export_dir);
    let snapshots = SnapshotStore::open(&settings.state_dir);

    match cli.command {
        Commands::Review => {
            let corpus = load_corpus(&settings.dialogues).await?;
            let mut session = ReviewSession::new(corpus, snapshots.load());
            let targets = review::SaveTargets {
                snapshots: &snapshots,
                export_dir: &settings.export_dir,
            };
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            review::run(&mut session, &targets, stdin.lock(), &mut stdout)?;
        }
        Commands::Show { number } => {
            let corpus = load_corpus(&settings.dialogues).await?;
            let index = number
                .checked_sub(1)
                .filter(|i| *i < corpus.len())
                .with_context(|| format!("dialogue {number} out of range 1..={}", corpus.len()))?;
            let store = snapshots.load();
            let form = FormState::load(&store, index);
            let item = corpus
                .get(index)
                .context("dialogue index out of range")?;
            let mut out = BufWriter::new(io::stdout());
            display::print_dialogue_card(&mut out, index, item, Some(&form), None)?;
            out.flush()?;
        }
        Commands::Export => {
            let corpus = load_corpus(&settings.dialogues).await?;
            let store = snapshots.load();
            let report = ExportReport::build(&store, &corpus, Utc::now());
            let path = write_export(&settings.export_dir, &report)?;
            println!(
                "Exported {} of {} dialogues to {}",
                report.export_info.evaluated_dialogues,
                report.export_info.total_dialogues,
                path.display()
            );
        }
        Commands::Status => {
            let corpus = load_corpus(&settings.dialogues).await?;
            print_status(&corpus, &snapshots)?;
        }
        Commands::Screen { out } => {
            screen_corpus(&settings.dialogues, &out).await?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Read and parse the corpus. This is the only asynchronous step.
async fn load_corpus(path: &Path) -> anyhow::Result<Corpus> {
    let text = tokio::fs::read_to_string(path).await.with_context(|| {
        format!(
            "Error loading dialogue data from {}. Please ensure the JSON file is in the correct location.",
            path.display()
        )
    })?;
    Corpus::from_json_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn print_status(corpus: &Corpus, snapshots: &SnapshotStore) -> anyhow::Result<()> {
    let store = snapshots.load();
    let labels = LabelSummary::collect(corpus.iter().map(|item| &item.description_labels));
    let counts = store.judgment_counts();

    println!("Corpus");
    println!("  {:<26} {}", "dialogues", labels.total_dialogues);
    println!("  {:<26} {}", "with active labels", labels.with_active_labels);
    for (name, count) in &labels.per_label {
        println!("  {:<26} {}", name, count);
    }
    println!();

    println!("Review");
    println!("  {:<26} {}", "snapshot", snapshots.path().display());
    println!("  {:<26} {}", "evaluated dialogues", store.evaluated_count());
    println!("  {:<26} {}", "correct", counts.correct);
    println!("  {:<26} {}", "incorrect", counts.incorrect);
    println!("  {:<26} {}", "unsure", counts.unsure);
    println!("  {:<26} {}", "unset", counts.unset);
    if !corpus.is_empty() {
        let in_range = store.indices().filter(|i| *i < corpus.len()).count();
        let coverage = in_range as f64 / corpus.len() as f64 * 100.0;
        println!("  {:<26} {:.1}%", "coverage", coverage);
    }
    Ok(())
}

async fn screen_corpus(input: &Path, output: &Path) -> anyhow::Result<()> {
    let text = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("reading {}", input.display()))?;
    let items: Vec<serde_json::Value> =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", input.display()))?;
    let outcome = screen_raw(items)?;

    let ids: Vec<String> = outcome.suspect_ids.iter().map(|id| id.to_string()).collect();
    println!("Dialogues that probably referenced images, voice or video:");
    println!("[{}]", ids.join(", "));

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    outcome.kept.serialize(&mut ser)?;
    tokio::fs::write(output, buf)
        .await
        .with_context(|| format!("writing {}", output.display()))?;
    println!("Saved cleaned corpus: {} records -> {}", outcome.kept.len(), output.display());
    Ok(())
}
