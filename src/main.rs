//! # Kaori CLI
//!
//! The `kaori` binary drives the perfume search engine: catalog
//! preparation, ranked search with facets, nearest-neighbor lookup, note
//! comparison, and the JSON API server.
//!
//! ## Usage
//!
//! ```bash
//! kaori --config ./config/kaori.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `kaori catalog prepare <raw.json>` | Convert raw records into the processed catalog |
//! | `kaori catalog list` | List all catalog entries |
//! | `kaori search "<query>"` | Rank the catalog against a query with facets |
//! | `kaori similar <id>` | Nearest neighbors of an entry |
//! | `kaori notes <id>` | Note overlap between an entry and its neighbors |
//! | `kaori serve` | Start the JSON HTTP API |
//!
//! ## Examples
//!
//! ```bash
//! # Build the processed catalog from curated raw data
//! kaori catalog prepare data/raw_perfumes.json
//!
//! # Faceted semantic search
//! kaori search "爽やかな柑橘系" --sex レディース --season 夏 --scene office
//!
//! # What does this perfume share with its closest relatives?
//! kaori notes dior-sauvage-eau-de-toilette
//! ```

mod catalog;
mod compose;
mod config;
mod embedding;
mod fields;
mod index;
mod models;
mod notes;
mod reason;
mod search;
mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Kaori — a weighted field-embedding search engine for a perfume catalog.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/kaori.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "kaori",
    about = "Kaori — weighted field-embedding search over a perfume catalog",
    version,
    long_about = "Kaori embeds each semantic field of a catalog document separately, \
    combines the field vectors under a tunable weight table, and ranks the catalog \
    against queries with cosine similarity and hard demographic/season filters."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/kaori.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Search the catalog.
    ///
    /// Composes the query text and facets into a single vector and ranks
    /// every catalog entry by cosine similarity. The sex facet filters by
    /// exact match; season facets require the entry to support every
    /// requested season.
    Search {
        /// Free-text query (Japanese).
        query: String,

        /// Sex facet: レディース, メンズ, or ユニセックス (exact match).
        #[arg(long)]
        sex: Option<String>,

        /// Season facet, repeatable: 春, 夏, 秋, 冬 (entry must match all).
        #[arg(long = "season")]
        seasons: Vec<String>,

        /// Usage-scene facet, repeatable: office, date, daily, party, relax.
        #[arg(long = "scene")]
        scenes: Vec<String>,

        /// Maximum number of results.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Find the nearest neighbors of a catalog entry.
    ///
    /// Uses the entry's own stored vector as the query; the entry itself
    /// is excluded from the results.
    Similar {
        /// Catalog id (e.g. `shiro-savon`).
        id: String,

        /// Number of neighbors to return.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Compare an entry's fragrance notes against its nearest neighbors.
    ///
    /// Prints the notes shared with the neighbor pool and the notes unique
    /// to the entry — the raw material for recommendation text.
    Notes {
        /// Catalog id.
        id: String,

        /// Number of neighbors to pool.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Manage the catalog file.
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },

    /// Start the JSON HTTP API server.
    ///
    /// Exposes POST /search, POST /neighbors, and GET /health on the
    /// configured bind address.
    Serve,
}

/// Catalog management subcommands.
#[derive(Subcommand)]
enum CatalogAction {
    /// List all catalog entries with id, sex, and rating.
    List,

    /// Convert raw perfume records into the processed catalog format.
    ///
    /// Reads a JSON array of raw records and writes `{text, metadata}`
    /// entries to the configured catalog path (or `--output`).
    Prepare {
        /// Path to the raw JSON file.
        input: PathBuf,

        /// Output path; defaults to the configured catalog path.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("kaori=info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Search {
            query,
            sex,
            seasons,
            scenes,
            limit,
        } => {
            search::run_search(&cfg, &query, sex, seasons, scenes, limit).await?;
        }
        Commands::Similar { id, limit } => {
            search::run_similar(&cfg, &id, limit).await?;
        }
        Commands::Notes { id, limit } => {
            search::run_notes(&cfg, &id, limit).await?;
        }
        Commands::Catalog { action } => match action {
            CatalogAction::List => {
                search::run_catalog_list(&cfg)?;
            }
            CatalogAction::Prepare { input, output } => {
                let output = output.unwrap_or_else(|| cfg.catalog.path.clone());
                let count = catalog::prepare_catalog(&input, &output)?;
                println!("Processed {} perfumes into {}", count, output.display());
            }
        },
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
