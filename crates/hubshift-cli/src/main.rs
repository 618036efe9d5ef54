//! Hubshift CLI
//!
//! Validates exported entities against a schema and maps them into hub records.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// Hubshift - convert CMS exports into the hub schema
#[derive(Parser)]
#[command(name = "hubshift")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file or project directory
    #[arg(short, long, default_value = "hubshift.yaml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new Hubshift project
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,

        /// Project name (defaults to directory name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Report entities missing required fields
    Validate {
        /// Exit with an error if any entity is missing required fields
        #[arg(long)]
        strict: bool,
    },

    /// Map entities through the profile and write hub records
    Extract,

    /// List the fields present in the input
    Fields,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Init { path, name } => {
            commands::init::run(&path, name.as_deref()).await?;
        }
        Commands::Validate { strict } => {
            commands::validate::run(&cli.config, strict).await?;
        }
        Commands::Extract => {
            commands::extract::run(&cli.config).await?;
        }
        Commands::Fields => {
            commands::fields::run(&cli.config).await?;
        }
    }

    Ok(())
}
