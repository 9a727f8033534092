//! AcademAide CLI, the main entry point.
//!
//! Commands:
//! - `serve`          Start the HTTP gateway
//! - `chat`           Single-message or interactive chat as a given user
//! - `clear-history`  Delete a user's turn log and rolling context
//! - `quiz`           Generate a quiz from course materials
//! - `migrate`        Apply the PostgreSQL schema
//! - `doctor`         Check config and backend reachability

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod runtime;

use runtime::{StoreMode, init_logging, load_config};

#[derive(Parser)]
#[command(
    name = "academaide",
    about = "AcademAide: retrieval-grounded academic advising chat",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json: bool,

    /// Config file (defaults to ~/.academaide/config.toml)
    #[arg(short, long, global = true, env = "ACADEMAIDE_CONFIG")]
    config: Option<PathBuf>,

    /// Use in-memory stores instead of Postgres and Redis
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Seed the in-memory stores from a JSON fixture (implies --ephemeral)
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Chat as a user
    Chat {
        /// User id to chat as
        #[arg(short, long)]
        user: String,

        /// student or faculty
        #[arg(short, long, default_value = "student")]
        role: String,

        /// Persona id (socratic, code_reviewer, research, exam, motivational, teaching_assistant)
        #[arg(short, long, default_value = "")]
        agent: String,

        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Delete a user's chat history and rolling context
    ClearHistory {
        #[arg(short, long)]
        user: String,
    },

    /// Generate a quiz for a course
    Quiz {
        #[arg(short, long)]
        course: String,

        /// Unit number; omit or 0 for the whole course
        #[arg(long)]
        unit: Option<u32>,

        #[arg(short = 'n', long)]
        questions: Option<usize>,
    },

    /// Apply database migrations
    Migrate,

    /// Diagnose config and backend health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_logging(&config, cli.verbose, cli.json);

    let mode = StoreMode::from_flags(cli.ephemeral, cli.fixture);

    match cli.command {
        Commands::Serve { port } => commands::serve::run(config, mode, port).await?,
        Commands::Chat {
            user,
            role,
            agent,
            message,
        } => commands::chat::run(config, mode, user, role, agent, message).await?,
        Commands::ClearHistory { user } => commands::history::run(config, mode, user).await?,
        Commands::Quiz {
            course,
            unit,
            questions,
        } => commands::quiz::run(config, mode, course, unit, questions).await?,
        Commands::Migrate => commands::migrate::run(config, mode).await?,
        Commands::Doctor => commands::doctor::run(config, mode).await?,
    }

    Ok(())
}
