//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod db;
mod ranges;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "rolleilookup")]
#[command(about = "Rolleiflex serial number lookup service")]
#[command(version)]
pub struct Cli {
    /// Data directory or SQLite database file (overrides config file)
    #[arg(long, short = 'd', global = true)]
    data: Option<PathBuf>,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Start the lookup API server
    Serve {
        /// Address to bind to: PORT, HOST, or HOST:PORT (default: HOST/PORT settings)
        bind: Option<String>,

        /// Skip creating the camera range table on startup
        #[arg(long)]
        no_init: bool,
    },

    /// Database management
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },

    /// List every camera range
    List,

    /// Show one camera range by id
    Show {
        /// Range id
        id: String,
    },

    /// Find the camera range containing a serial number
    Lookup {
        /// Serial number
        serial: String,
    },
}

#[derive(Subcommand)]
enum DbCommands {
    /// Create the camera range table if it doesn't exist
    Init,

    /// Load camera ranges from a JSON file, replacing rows with the same id
    Import {
        /// JSON file: an array of ranges or a `{"data": [...]}` export
        file: PathBuf,
    },
}

/// Parse arguments, load settings and run the selected command.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        data: cli.data,
    };
    let settings = load_settings_with_options(options).await?;

    match cli.command {
        Commands::Serve { bind, no_init } => {
            serve::cmd_serve(&settings, bind.as_deref(), no_init).await
        }
        Commands::Db { command } => match command {
            DbCommands::Init => db::cmd_init(&settings).await,
            DbCommands::Import { file } => db::cmd_import(&settings, &file).await,
        },
        Commands::List => ranges::cmd_list(&settings).await,
        Commands::Show { id } => ranges::cmd_show(&settings, &id).await,
        Commands::Lookup { serial } => ranges::cmd_lookup(&settings, &serial).await,
    }
}
