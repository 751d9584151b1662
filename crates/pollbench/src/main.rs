//! pollbench — entry point.

use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use pollbench::cli::{self, run_cmd::RunArgs};

#[derive(Parser)]
#[command(
    name = "pollbench",
    about = "pollbench — synthetic voter load against a local mock poll service",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the mock service, the dashboard and the simulation.
    Run(RunArgs),

    /// Serve only the mock poll service.
    Mock {
        /// Port on 127.0.0.1.
        #[arg(long, default_value = "8100")]
        port: u16,

        #[arg(long, default_value = "1")]
        poll_id: u32,

        /// Candidate ids (comma separated).
        #[arg(long, default_value = "1,2")]
        candidates: String,

        #[arg(long)]
        max_votes_per_sec: Option<u32>,
    },

    /// Name-list utilities.
    Roster {
        #[command(subcommand)]
        action: RosterAction,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum RosterAction {
    /// Keep only `results` from a generator dump and drop each record's `profile`.
    Clean {
        #[arg(default_value = "input.json")]
        input: PathBuf,
        #[arg(default_value = "output.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run(args) => cli::run_cmd::run(args).await,
        Commands::Mock {
            port,
            poll_id,
            candidates,
            max_votes_per_sec,
        } => {
            let candidates = cli::parse_candidates(&candidates).map_err(anyhow::Error::msg)?;
            cli::mock_cmd::run(port, poll_id, candidates, max_votes_per_sec).await
        }
        Commands::Roster { action } => match action {
            RosterAction::Clean { input, output } => cli::roster_cmd::clean(&input, &output),
        },
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "pollbench", &mut std::io::stdout());
            Ok(())
        }
    }
}
