mod commands;
mod http;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_DB_NAME: &str = "lexirec.db";

#[derive(Parser)]
#[command(name = "lexirec")]
#[command(author, version, about = "Embedding-based exercise recommendations for language learning")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Path to the database file (default: lexirec.db in the current directory)
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Port to listen on
        #[arg(short, long, default_value = "8787")]
        port: u16,

        /// Allowed CORS origin (default: allow all)
        #[arg(long)]
        cors_origin: Option<String>,
    },

    /// Load a JSON catalog file and index its exercises
    Seed {
        /// Path to the catalog file
        catalog: PathBuf,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Rebuild embeddings for the full exercise catalog
    Reindex {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Show store statistics
    Stats {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// List exercises similar to a base exercise (for testing)
    Similar {
        /// Base exercise id
        exercise_id: i64,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Maximum results
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Similarity floor
        #[arg(long, default_value = "0.5")]
        min_sim: f32,

        /// Relevance/diversity trade-off
        #[arg(long, default_value = "0.7")]
        lambda: f32,

        /// Free-text query overriding the exercise's own embedding
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Show the due-for-review list for a user (for testing)
    Due {
        /// User id
        user_id: i64,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Maximum results
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Serve {
            database,
            port,
            cors_origin,
        } => commands::serve(database, port, cors_origin).await,
        Commands::Seed { catalog, database } => commands::seed(&catalog, database).await,
        Commands::Reindex { database } => commands::reindex(database).await,
        Commands::Stats { database } => commands::stats(database).await,
        Commands::Similar {
            exercise_id,
            database,
            limit,
            min_sim,
            lambda,
            query,
        } => commands::similar(exercise_id, database, limit, min_sim, lambda, query).await,
        Commands::Due {
            user_id,
            database,
            limit,
        } => commands::due(user_id, database, limit).await,
    }
}
