//! # Site Search CLI (`sitesearch`)
//!
//! ## Usage
//!
//! ```bash
//! sitesearch --config ./config/sitesearch.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `sitesearch init` | Create the SQLite database and run schema migrations |
//! | `sitesearch import <file>` | Load a site snapshot (JSON) into the database |
//! | `sitesearch search` | Run an advanced search |
//! | `sitesearch query` | Show the query a submission produces, without searching |
//! | `sitesearch permissions` | List permission codes and labels |
//! | `sitesearch serve` | Start the HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! sitesearch init
//! sitesearch import ./site.json
//! sitesearch search --all "managed hosting" --without legacy --sort LastUpdated
//! sitesearch search --any "pricing plans" --only-show services --from 2024-01-01
//! sitesearch serve
//! ```
//!
//! Logging goes to stderr; set `RUST_LOG` (e.g. `RUST_LOG=sitesearch=debug`)
//! to change the level.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sitesearch::{config, ingest, migrate, search, server};
use sitesearch_core::form::SearchForm;

/// Site Search: advanced search over a site's pages and files.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/sitesearch.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "sitesearch",
    about = "Site Search: advanced full-text search over a site tree and its files",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/sitesearch.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Safe to run more than once.
    Init,

    /// Import a site snapshot.
    ///
    /// The file is a JSON object with `pages`, `files`, `tracking` and
    /// `permissions` arrays. Rows are upserted by id.
    Import {
        /// Path to the snapshot JSON file.
        file: PathBuf,
    },

    /// Run an advanced search.
    Search(SearchArgs),

    /// Print the current query and the engine query for a submission.
    Query(SearchArgs),

    /// List permission codes, hidden ones included.
    Permissions,

    /// Start the HTTP server.
    ///
    /// Binds to `[server].bind` from the config file.
    Serve,
}

/// The advanced search form, as flags.
#[derive(Args, Debug)]
struct SearchArgs {
    /// All words (`+`).
    #[arg(long)]
    all: Option<String>,

    /// Exact phrase (`quote`).
    #[arg(long)]
    phrase: Option<String>,

    /// At least one of the words (`any`).
    #[arg(long)]
    any: Option<String>,

    /// Without the words (`-`).
    #[arg(long)]
    without: Option<String>,

    /// Sort key: Relevance, LastUpdated or PageTitle.
    #[arg(long)]
    sort: Option<String>,

    /// Last updated on or after (YYYY-MM-DD).
    #[arg(long)]
    from: Option<String>,

    /// Last updated on or before (YYYY-MM-DD).
    #[arg(long)]
    to: Option<String>,

    /// Restrict to a section and its descendants, by URL segment.
    /// Repeatable; comma-joined groups are accepted.
    #[arg(long = "only-show")]
    only_show: Vec<String>,

    /// Offset of the first result.
    #[arg(long)]
    start: Option<usize>,

    /// Results per page (overrides `[search].page_size`).
    #[arg(long)]
    page_size: Option<usize>,
}

impl SearchArgs {
    /// Submit the flags the same way the HTML form would.
    fn to_form(&self) -> anyhow::Result<SearchForm> {
        let mut pairs: Vec<(String, String)> = Vec::new();
        let fields = [
            ("+", &self.all),
            ("quote", &self.phrase),
            ("any", &self.any),
            ("-", &self.without),
            ("sortby", &self.sort),
            ("From", &self.from),
            ("To", &self.to),
        ];
        for (name, value) in fields {
            if let Some(value) = value {
                pairs.push((name.to_string(), value.clone()));
            }
        }
        for section in &self.only_show {
            pairs.push(("OnlyShow[]".to_string(), section.clone()));
        }
        if let Some(start) = self.start {
            pairs.push(("start".to_string(), start.to_string()));
        }
        Ok(SearchForm::from_pairs(pairs)?)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Import { file } => {
            ingest::run_import(&cfg, &file).await?;
        }
        Commands::Search(args) => {
            let form = args.to_form()?;
            search::run_search(&cfg, &form, args.page_size).await?;
        }
        Commands::Query(args) => {
            let form = args.to_form()?;
            search::run_query(&cfg, &form);
        }
        Commands::Permissions => {
            search::run_permissions(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
