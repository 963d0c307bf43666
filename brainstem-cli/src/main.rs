use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use brainstem::RuntimeSettings;

mod agents;
mod error;
mod group;
mod inspect;

use agents::{run_approval_agent, run_echo_agent};
use error::CliError;
use group::run_group_demo;
use inspect::inspect_state;

#[derive(Parser, Debug)]
#[command(name = "brainstem", version)]
#[command(about = "Brainstem CLI - run demo agents and inspect persisted sessions")]
struct Cli {
    /// Settings file (TOML). Falls back to BRAINSTEM_* environment variables.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a demo agent until it finishes
    Agent {
        /// Agent name (echo, approval)
        #[arg(long)]
        name: String,
        /// First user message
        #[arg(long, default_value = "hello from brainstem")]
        input: String,
        /// Write the final state as JSON to this file
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Run a demo group orchestration
    Group {
        #[arg(long, default_value = "demo-group")]
        group_id: String,
        /// Group members, called in turn
        #[arg(long, value_delimiter = ',', default_value = "alice,bob")]
        members: Vec<String>,
    },
    /// Summarize a persisted agent state
    Inspect {
        /// State file written by `agent --save`
        state: PathBuf,
    },
    /// Print the effective settings
    Settings,
}

fn load_settings(config: Option<&Path>) -> Result<RuntimeSettings, CliError> {
    let settings = match config {
        Some(path) => RuntimeSettings::from_file(path)?,
        None => RuntimeSettings::from_env()?,
    };
    Ok(settings)
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Commands::Agent { name, input, save } => {
            let state = match name.as_str() {
                "echo" => run_echo_agent(&settings, &input).await,
                "approval" => run_approval_agent(&settings, &input).await,
                _ => return Err(CliError::UnknownAgent(name)),
            };
            if let Some(path) = save {
                let raw = serde_json::to_string_pretty(&state)?;
                std::fs::write(&path, raw).map_err(|source| CliError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                println!("State saved to {}", path.display());
            }
        }
        Commands::Group { group_id, members } => {
            run_group_demo(&settings, &group_id, members).await?;
        }
        Commands::Inspect { state } => {
            inspect_state(&state)?;
        }
        Commands::Settings => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    // Initialize JSON logging once.
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();
    let env_filter = match "info".parse() {
        Ok(directive) => env_filter.add_directive(directive),
        Err(_) => env_filter,
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .json()
        .try_init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, code = e.code(), "command failed");
        std::process::exit(1);
    }
}
