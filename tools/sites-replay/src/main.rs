//! Replay harness for the sites reducer.
//!
//! ## Usage
//!
//! ```bash
//! # Replay a scenario and print the resulting state
//! sites-replay replay scenario.json
//!
//! # Write the state to a file and fail if anything was rejected
//! sites-replay replay scenario.json --output state.json --strict
//!
//! # List the records of a saved state with their keys
//! sites-replay keys state.json
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sites_core::{init_logging, LogConfig, SitesConfig};
use sites_reducer::{AppState, RecordingHistory, SitesReducer};
use std::path::PathBuf;
use std::sync::Arc;

mod scenario;

use scenario::Scenario;

#[derive(Parser)]
#[command(name = "sites-replay")]
#[command(about = "Replay site actions through the sites reducer")]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level, overrides the config file
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply the actions of a scenario file to its starting state
    Replay {
        /// Scenario JSON file
        scenario: PathBuf,
        /// Write the resulting state here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Exit with an error when any action element was rejected
        #[arg(long)]
        strict: bool,
    },

    /// List the sites of a state file in order, with their keys
    Keys {
        /// State JSON file
        state: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(SitesConfig::default_path);
    let config = SitesConfig::load(&config_path)?;
    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    init_logging(LogConfig::from_level_name(level, config.log_format)?)?;

    match cli.command {
        Commands::Replay {
            scenario,
            output,
            strict,
        } => {
            let scenario = Scenario::load(&scenario)?;
            let history = Arc::new(RecordingHistory::new());
            let reducer = SitesReducer::new(history.clone(), config.reducer.clone());

            let (state, summary) = scenario.replay(&reducer);
            log::info!(
                "Replayed {} action(s): {} ignored, {} rejected, {} history clear(s), {} site(s)",
                summary.actions,
                summary.ignored,
                summary.rejected.len(),
                history.clear_count(),
                state.sites().len()
            );

            let json = state.to_json()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    log::info!("State written to {}", path.display());
                }
                None => println!("{}", json),
            }

            if strict && !summary.rejected.is_empty() {
                anyhow::bail!("{} action element(s) rejected", summary.rejected.len());
            }
        }

        Commands::Keys { state } => {
            let contents = std::fs::read_to_string(&state)
                .with_context(|| format!("Failed to read {}", state.display()))?;
            let state = AppState::from_json(&contents)?;
            for (key, record) in state.sites().iter() {
                let tag = record
                    .tag
                    .map(|tag| format!("{:?}", tag))
                    .unwrap_or_else(|| "history".to_string());
                println!("{:>4}  {:<14}  {}", record.order, tag, key);
            }
        }
    }

    Ok(())
}
