//! foodscrape CLI - load scraped restaurant records into SQLite

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use foodscrape::config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "foodscrape")]
#[command(version)]
#[command(about = "Normalize scraped restaurant and menu records into SQLite")]
#[command(long_about = r#"
foodscrape persists crawler output into a relational schema:
  • restaurants, menu categories and items
  • shared tag types and tags, linked to restaurants
  • customer postcode to restaurant links

Input is one JSON record per line, either {"restaurants": {...}} or {"menu": {...}}.

Example usage:
  foodscrape init
  foodscrape seed --postcodes postcodes.txt
  foodscrape ingest --input items.jl --workers 8
  foodscrape stats
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file and create the database schema
    Init {
        /// Path to the database file
        #[arg(short, long, default_value = config::DEFAULT_DATABASE)]
        database: PathBuf,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Seed customer postcodes, one per line
    Seed {
        /// File with one postcode per line
        #[arg(short, long)]
        postcodes: PathBuf,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Ingest JSON-lines records
    Ingest {
        /// Input file, or "-" for stdin
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Number of parallel store workers
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Show row counts for every table
    Stats {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config_path = cli.config.unwrap_or_else(config::default_config_path);
    let settings = config::load_config(Some(&config_path))?.unwrap_or_default();

    match cli.command {
        Commands::Init { database, force } => {
            commands::run_init(&config_path, database, force)?;
        }

        Commands::Seed { postcodes, database } => {
            let database = settings.database_path(database);
            commands::run_seed(&settings, database, &postcodes)?;
        }

        Commands::Ingest { input, database, workers } => {
            let database = settings.database_path(database);
            commands::run_ingest(&settings, database, &input, workers)?;
        }

        Commands::Stats { database } => {
            let database = settings.database_path(database);
            commands::run_stats(&database)?;
        }
    }

    Ok(())
}
