#![forbid(unsafe_code)]
//! Thrive Command Line Interface

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use thrive::commands::{
    execute_answer, execute_flow, execute_init, execute_next, execute_reset, execute_score,
    execute_start, execute_status, AnswerOptions, FlowSubcommand, InitOptions, NextOptions,
    ResetOptions, ScoreOptions, StartOptions, StatusOptions,
};
use thrive::score::ReportFormat;
use thrive::Config;

#[derive(Parser)]
#[command(name = "thrive")]
#[command(about = "ThriveScore onboarding - resumable questionnaire and wellness score")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true, default_value = ".thrive.config.json")]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,

        /// Session storage directory
        #[arg(long)]
        storage_dir: Option<PathBuf>,

        /// Custom flow file (JSON or YAML)
        #[arg(long)]
        flow: Option<PathBuf>,

        /// Skip interactive prompts (use defaults + CLI args)
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Run the onboarding questionnaire, resuming any saved session
    Start {
        /// Discard the saved session and start over
        #[arg(long)]
        restart: bool,
    },

    /// Show the next unanswered question
    Next {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record an answer without the interactive wizard
    Answer {
        /// Question key (e.g. vision) or node id (e.g. mobility-aids)
        question: String,

        /// Zero-based option index
        option: usize,

        /// Record even if the flow does not know the question or option
        #[arg(long)]
        force: bool,
    },

    /// Show session progress
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the ThriveScore with its deductions
    Score {
        /// Report format (defaults to the configured one)
        #[arg(short, long, value_enum)]
        format: Option<ReportFormatArg>,
    },

    /// Discard the saved session
    Reset {
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Inspect or lint the onboarding flow
    Flow {
        #[command(subcommand)]
        cmd: FlowCommands,
    },
}

#[derive(Subcommand)]
enum FlowCommands {
    /// List nodes and transitions
    Show {
        /// Output the compiled definition as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report missing and unreachable nodes
    Validate {
        /// Flow file (defaults to the configured flow)
        file: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormatArg {
    Text,
    Markdown,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "thrive=debug" } else { "thrive=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    // Load config
    let config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        tracing::debug!("No config at {:?}, using defaults", cli.config);
        Config::default()
    };

    match cli.command {
        Commands::Init { force, storage_dir, flow, yes } => {
            let options = InitOptions {
                config_path: Some(cli.config),
                force,
                storage_dir,
                flow,
                yes,
            };
            execute_init(options)?;
        }

        Commands::Start { restart } => {
            execute_start(StartOptions { restart }, config)?;
        }

        Commands::Next { json } => {
            execute_next(NextOptions { json }, config)?;
        }

        Commands::Answer { question, option, force } => {
            let options = AnswerOptions { question, option, force };
            execute_answer(options, config)?;
        }

        Commands::Status { json } => {
            execute_status(StatusOptions { json }, config)?;
        }

        Commands::Score { format } => {
            let format = format.map(|f| match f {
                ReportFormatArg::Text => ReportFormat::Text,
                ReportFormatArg::Markdown => ReportFormat::Markdown,
                ReportFormatArg::Json => ReportFormat::Json,
            });
            execute_score(ScoreOptions { format }, config)?;
        }

        Commands::Reset { yes } => {
            execute_reset(ResetOptions { yes }, config)?;
        }

        Commands::Flow { cmd } => {
            let subcommand = match cmd {
                FlowCommands::Show { json } => FlowSubcommand::Show { json },
                FlowCommands::Validate { file, json } => FlowSubcommand::Validate { file, json },
            };
            execute_flow(subcommand, config)?;
        }
    }

    Ok(())
}
