use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use glossa_core::config::{DEFAULT_TIMEOUT, DevicePreference, EngineConfig};
use glossa_core::record::TaskKind;
use glossa_engine::TextProcessor;

mod display;

/// Texts exercised by the `demo` subcommand.
const DEMO_TEXTS: &[&str] = &[
    "The economy is growing rapidly.",
    "La economía está creciendo rápidamente.",
    "I love this new technology!",
    "¡Me encanta esta nueva tecnología!",
];

const DEMO_LABELS: &[&str] = &["economy", "sports", "technology", "politics"];

#[derive(Parser)]
#[command(name = "glossa", version, about = "Multilingual text processing pipeline")]
struct Cli {
    /// Backing document for the record store.
    #[arg(long, default_value = "glossa_db.json")]
    db: PathBuf,

    /// Compute device preference: auto, cpu, or accelerator.
    #[arg(long, default_value = "auto")]
    device: String,

    /// Directory holding ONNX model subdirectories; omit to run on the
    /// built-in heuristic backends.
    #[arg(long, env = "GLOSSA_MODEL_DIR")]
    model_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify text against candidate labels.
    Classify {
        text: String,
        /// Candidate label; repeat for each label.
        #[arg(long = "label", required = true)]
        labels: Vec<String>,
    },
    /// Analyze the sentiment of a text.
    Sentiment { text: String },
    /// Extract named entities from a text.
    Entities { text: String },
    /// Ingest a text sample into the record store.
    AddSample {
        text: String,
        #[arg(long, default_value = "auto-detected")]
        language: String,
        #[arg(long, default_value = "general")]
        category: String,
    },
    /// List stored text samples.
    Samples {
        /// Exact language-code filter.
        #[arg(long)]
        language: Option<String>,
    },
    /// List stored processing results.
    Results {
        /// Task filter: classification, sentiment, or ner.
        #[arg(long)]
        task: Option<String>,
    },
    /// Show record store statistics.
    Stats,
    /// Show supported languages.
    Languages,
    /// Seed sample data and run every task once.
    Demo,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    tracing::info!("glossa v{}", env!("CARGO_PKG_VERSION"));
    let cli = Cli::parse();

    let config = EngineConfig {
        db_path: cli.db,
        device: parse_device(&cli.device)?,
        model_dir: cli.model_dir,
        timeout: DEFAULT_TIMEOUT,
    };
    let mut processor = TextProcessor::initialize(&config)
        .with_context(|| format!("initializing processor on {}", config.db_path.display()))?;

    match cli.command {
        Command::Classify { text, labels } => {
            let result = processor.classify(&text, &labels)?;
            display::print_result(&result);
        }
        Command::Sentiment { text } => {
            let result = processor.analyze_sentiment(&text)?;
            display::print_result(&result);
        }
        Command::Entities { text } => {
            let result = processor.extract_entities(&text)?;
            display::print_result(&result);
        }
        Command::AddSample {
            text,
            language,
            category,
        } => {
            let id = processor.add_text_sample(&text, &language, &category)?;
            println!("stored sample {id}");
        }
        Command::Samples { language } => {
            display::print_samples(&processor.text_samples(language.as_deref()));
        }
        Command::Results { task } => {
            let task = task
                .as_deref()
                .map(str::parse::<TaskKind>)
                .transpose()?;
            display::print_stored_results(&processor.processing_results(task));
        }
        Command::Stats => display::print_stats(&processor.database_stats()),
        Command::Languages => display::print_languages(processor.available_languages()),
        Command::Demo => run_demo(&mut processor)?,
    }

    Ok(())
}

fn run_demo(processor: &mut TextProcessor) -> anyhow::Result<()> {
    if processor.database_stats().total_samples == 0 {
        let added = processor.seed_samples()?;
        println!("seeded {added} sample texts");
    }

    let labels: Vec<String> = DEMO_LABELS.iter().map(|l| l.to_string()).collect();

    println!("\nText classification:");
    for text in DEMO_TEXTS {
        match processor.classify(text, &labels) {
            Ok(result) => display::print_result(&result),
            Err(err) => eprintln!("error processing {text:?}: {err}"),
        }
    }

    println!("\nSentiment analysis:");
    for text in &DEMO_TEXTS[..2] {
        match processor.analyze_sentiment(text) {
            Ok(result) => display::print_result(&result),
            Err(err) => eprintln!("error processing {text:?}: {err}"),
        }
    }

    println!("\nDatabase statistics:");
    display::print_stats(&processor.database_stats());
    Ok(())
}

fn parse_device(raw: &str) -> anyhow::Result<DevicePreference> {
    match raw {
        "auto" => Ok(DevicePreference::Auto),
        "cpu" => Ok(DevicePreference::Cpu),
        "accelerator" => Ok(DevicePreference::Accelerator),
        other => anyhow::bail!("unknown device preference {other:?} (expected auto, cpu, or accelerator)"),
    }
}
