//! Harvest CLI - collect museum artifacts into SQLite and query them

mod commands;

use clap::{Parser, Subcommand};
use commands::Context;
use harvest::config;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "harvest")]
#[command(version = "0.1.0")]
#[command(about = "Harvest museum collection records into SQLite and explore them")]
#[command(long_about = r#"
Harvest pages through a museum collection API, flattens each artifact into
metadata, media and color rows, and stores them in a local SQLite database.

Example usage:
  harvest init --api-key <KEY>
  harvest collect --category Coins --migrate
  harvest query 7
  harvest shell
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides the config)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file and create the database
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,

        /// API key to store in the config
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Fetch every page of a category
    Collect {
        /// Category (classification) to collect, e.g. Coins
        #[arg(long)]
        category: String,

        /// Persist the collected batch right away
        #[arg(short, long)]
        migrate: bool,
    },

    /// List the catalog of analytical questions
    Queries {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a catalog question by number or key
    Query {
        /// Question number (1-25) or key
        key: String,

        /// Output rows as JSON
        #[arg(long)]
        json: bool,
    },

    /// Preview rows of one table
    Show {
        /// metadata, media or colors
        table: String,

        /// Maximum number of rows
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Output rows as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show database statistics
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete all persisted data
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Interactive session that keeps the staged batch between commands
    Shell,

    /// Serve the session over HTTP
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
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
        .with(fmt::layer())
        .with(filter)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let loaded = config::load_config(Some(&config_path))?;
    let database = loaded.database_path(cli.database.as_deref());
    tracing::debug!("Config {:?}, database {:?}", config_path, database);

    let ctx = Context {
        config: loaded,
        config_path,
        database,
    };

    match cli.command {
        Commands::Init { force, api_key } => commands::run_init(&ctx, force, api_key),
        Commands::Collect { category, migrate } => commands::run_collect(&ctx, &category, migrate),
        Commands::Queries { json } => commands::run_queries(json),
        Commands::Query { key, json } => commands::run_query(&ctx, &key, json),
        Commands::Show { table, limit, json } => commands::run_show(&ctx, &table, limit, json),
        Commands::Stats { json } => commands::run_stats(&ctx, json),
        Commands::Clear { yes } => commands::run_clear(&ctx, yes),
        Commands::Shell => commands::run_shell(&ctx),
        Commands::Serve { port } => commands::run_serve(&ctx, port),
    }
}
