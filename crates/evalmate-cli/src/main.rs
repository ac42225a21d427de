//! The evalmate command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

use commands::evaluate::EvaluateArgs;
use commands::parse::DocumentKind;

#[derive(Parser)]
#[command(name = "evalmate", version, about = "Exam answer evaluation engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a student submission against a question paper and model answers
    Evaluate(EvaluateArgs),

    /// Load both documents and report problems
    Validate {
        /// Question paper JSON (default: from config)
        #[arg(long)]
        questions: Option<PathBuf>,

        /// Model answer JSON (default: from config)
        #[arg(long)]
        answers: Option<PathBuf>,

        /// Treat invalid questions (empty or duplicate ids, bad marks) as errors
        #[arg(long)]
        strict: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Turn a raw question paper or model answer into canonical JSON
    Parse {
        /// Which kind of document the input is
        #[arg(long, value_enum)]
        kind: DocumentKind,

        /// Input file (plain text, or a scanned document with --document)
        #[arg(long)]
        input: PathBuf,

        /// Run the input through the OCR service first
        #[arg(long)]
        document: bool,

        /// Write the JSON here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the agent tool catalog as JSON
    Tools,

    /// Create a starter config and sample documents
    Init,
}

#[tokio::main]
async fn main() {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("evalmate=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Evaluate(args) => commands::evaluate::execute(args).await,
        Commands::Validate {
            questions,
            answers,
            strict,
            config,
        } => commands::validate::execute(questions, answers, strict, config),
        Commands::Parse {
            kind,
            input,
            document,
            output,
            config,
        } => commands::parse::execute(kind, input, document, output, config).await,
        Commands::Tools => commands::tools::execute(),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
