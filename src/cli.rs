use std::path::PathBuf;

use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::info;

use crate::config::{Config, ConfigError, Storage};
use crate::error::AppError;
use crate::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "canteen-connect", version, about = "Campus canteen ordering backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API
    Serve {
        #[arg(long)]
        port: Option<u16>,
        /// SQLite database file
        #[arg(long, conflicts_with = "in_memory")]
        database: Option<PathBuf>,
        /// Keep everything in memory and start with demo data
        #[arg(long)]
        in_memory: bool,
        /// Load the demo user and default menu if missing
        #[arg(long)]
        seed_demo: bool,
    },
    /// Load the demo user and default menu into a database file
    Seed {
        #[arg(long)]
        database: Option<PathBuf>,
    },
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    App(#[from] AppError),
}

impl Command {
    /// Applies command-line overrides on top of the environment config.
    pub fn configure(&self, mut config: Config) -> Config {
        match self {
            Command::Serve {
                port,
                database,
                in_memory,
                seed_demo,
            } => {
                if let Some(port) = port {
                    config.port = *port;
                }
                if *in_memory {
                    config.storage = Storage::Memory;
                } else if let Some(path) = database {
                    config.storage = Storage::File(path.clone());
                }
                config.seed_demo |= *seed_demo;
            }
            Command::Seed { database } => {
                if let Some(path) = database {
                    config.storage = Storage::File(path.clone());
                }
                config.seed_demo = true;
            }
        }
        config
    }
}

pub async fn run(cli: Cli) -> Result<(), CliError> {
    let config = cli.command.configure(Config::load()?);
    let state = AppState::new(config)?;

    match cli.command {
        Command::Serve { .. } => crate::serve(state).await?,
        Command::Seed { .. } => info!("Demo data loaded"),
    }

    Ok(())
}
