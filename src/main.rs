//! # wpsearch CLI (`wps`)
//!
//! Commands for creating the database, importing a dump, looking articles
//! up, and starting the HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! wps --config ./config/wps.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `wps init` | Create the SQLite database and schema |
//! | `wps import <dump>` | Import a gzip paired-record dump |
//! | `wps get <title>` | Print an article by exact title |
//! | `wps find <prefix>` | Print the first article whose title starts with a prefix |
//! | `wps redirect <title>` | Print a redirect's destination |
//! | `wps stats` | Article and redirect counts |
//! | `wps export` | Every article as JSON Lines |
//! | `wps serve` | Start the HTTP server |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use wpsearch::get::ArticleField;
use wpsearch::progress::ProgressMode;
use wpsearch::{config, export, get, import, migrate, server, stats};

/// wpsearch CLI — import an encyclopedia dump into SQLite and serve articles.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file.
#[derive(Parser)]
#[command(
    name = "wps",
    about = "wpsearch — import an encyclopedia dump into SQLite and serve articles over HTTP",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/wps.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the `articles` and `redirects`
    /// tables. Running it multiple times is safe.
    Init,

    /// Import a gzip-compressed paired-record dump.
    ///
    /// Filters restricted and unpopular articles, writes the rest in
    /// batches, prunes redirects without a destination, and compacts the
    /// database.
    Import {
        /// Path to the `.json.gz` dump.
        dump: PathBuf,

        /// Expected number of record pairs, for progress display.
        #[arg(long)]
        expected: Option<u64>,

        /// Progress output on stderr. Defaults to `human` on a TTY, `off` otherwise.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,

        /// Skip the final VACUUM.
        #[arg(long)]
        no_compact: bool,
    },

    /// Print an article by its exact title.
    Get {
        title: String,

        /// Which part of the article to print.
        #[arg(long, value_enum, default_value = "all")]
        field: ArticleField,
    },

    /// Print the first article (by title order) whose title starts with a prefix.
    Find { prefix: String },

    /// Print the canonical title a redirect points to.
    Redirect { title: String },

    /// Show article and redirect counts.
    Stats,

    /// Export every article as JSON Lines.
    Export {
        /// Output file. Defaults to stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Start the HTTP server.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Import {
            dump,
            expected,
            progress,
            no_compact,
        } => {
            let progress = progress.unwrap_or_else(ProgressMode::default_for_tty);
            import::run_import(&cfg, &dump, expected, progress, no_compact).await?;
        }
        Commands::Get { title, field } => {
            get::run_get(&cfg, &title, field).await?;
        }
        Commands::Find { prefix } => {
            get::run_find(&cfg, &prefix).await?;
        }
        Commands::Redirect { title } => {
            get::run_redirect(&cfg, &title).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Export { output } => {
            export::run_export(&cfg, output.as_deref()).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
