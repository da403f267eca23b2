//! Book Triage CLI
//!
//! Local entry point for scanning, editing, and inspecting a book file.

use std::path::PathBuf;

use book_triage::{
    engine,
    error::{AppError, Result},
    models::Config,
    pipeline::{self, RecordEdit},
    services::{Enricher, OpenAiEnricher},
    storage::BookStore,
};
use clap::{Args, Parser, Subcommand};

/// Book Triage - sell, digitize, or keep
#[derive(Parser, Debug)]
#[command(
    name = "book-triage",
    version,
    about = "Decide whether to sell, digitize, or keep each book"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "book-triage.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Override the digitization cost (0-5)
    #[arg(short, long, global = true)]
    scan_cost: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Look up missing data and recompute every decision
    Scan {
        /// Path to the book CSV
        csv: PathBuf,

        /// Skip marketplace lookups
        #[arg(long)]
        offline: bool,
    },

    /// Add a book by title and optional ISBN
    Add {
        /// Path to the book CSV
        csv: PathBuf,

        #[arg(long)]
        title: String,

        /// 13-digit ISBN
        #[arg(long, default_value = "")]
        isbn: String,

        /// Skip marketplace lookups
        #[arg(long)]
        offline: bool,
    },

    /// Change fields of one book and recompute its decision
    Edit {
        /// Path to the book CSV
        csv: PathBuf,

        /// Record id
        id: String,

        #[command(flatten)]
        fields: EditArgs,

        /// Skip marketplace lookups
        #[arg(long)]
        offline: bool,
    },

    /// Print one book with its utilities
    Show {
        /// Path to the book CSV
        csv: PathBuf,

        /// Record id
        id: String,
    },

    /// Show decision and missing-field counts
    Info {
        /// Path to the book CSV
        csv: PathBuf,
    },

    /// Create a new book CSV with the full header
    Create {
        /// Path to the book CSV
        csv: PathBuf,

        /// Add two sample books
        #[arg(long)]
        sample: bool,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate the configuration file
    Validate,
}

/// Fields accepted by `edit`. Omitted flags leave the field unchanged.
#[derive(Args, Debug)]
struct EditArgs {
    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    isbn: Option<String>,

    /// Primary marketplace URL
    #[arg(long)]
    url: Option<String>,

    /// Secondary marketplace URL
    #[arg(long)]
    url_com: Option<String>,

    #[arg(long)]
    purchase_price: Option<f64>,

    #[arg(long)]
    used_price: Option<f64>,

    /// F: frequency of use (1-5)
    #[arg(long)]
    frequency: Option<i32>,

    /// R: rarity (1-5)
    #[arg(long)]
    rarity: Option<i32>,

    /// A: annotation need (1-5)
    #[arg(long)]
    annotation: Option<i32>,

    /// V: resale value (0-5)
    #[arg(long)]
    resale: Option<i32>,

    /// S: sentimental value (1-5)
    #[arg(long)]
    sentiment: Option<i32>,

    /// P: scannability (1-5)
    #[arg(long)]
    scannability: Option<i32>,
}

impl From<EditArgs> for RecordEdit {
    fn from(args: EditArgs) -> Self {
        Self {
            title: args.title,
            isbn: args.isbn,
            primary_url: args.url,
            secondary_url: args.url_com,
            purchase_price: args.purchase_price,
            used_price: args.used_price,
            f: args.frequency,
            r: args.rarity,
            a: args.annotation,
            v: args.resale,
            s: args.sentiment,
            p: args.scannability,
        }
    }
}

/// Initialize logging based on verbosity flag and configured level.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Build the lookup client unless lookups are off or unavailable.
fn build_enricher(config: &Config, offline: bool) -> Option<OpenAiEnricher> {
    if offline || !config.enrichment.enabled {
        log::info!("Marketplace lookups disabled");
        return None;
    }
    match OpenAiEnricher::new(&config.enrichment) {
        Ok(enricher) => Some(enricher),
        Err(e) => {
            log::warn!("Marketplace lookups unavailable: {}. Continuing offline.", e);
            None
        }
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = Config::load(&cli.config);
    let mut config = loaded.as_ref().cloned().unwrap_or_default();
    init_logging(cli.verbose, &config.logging.level);

    match &loaded {
        Ok(_) => log::info!("Loaded configuration from {}", cli.config.display()),
        Err(_) if !cli.config.exists() => {
            log::debug!("No config file at {}, using defaults", cli.config.display())
        }
        Err(e) => log::warn!(
            "Config load failed from {}: {}. Using defaults.",
            cli.config.display(),
            e
        ),
    }

    if let Some(scan_cost) = cli.scan_cost {
        config.store.scan_cost = scan_cost;
    }

    if matches!(cli.command, Command::Validate) {
        return pipeline::run_validate(&config);
    }
    config.validate()?;
    let scan_cost = config.store.scan_cost;

    match cli.command {
        Command::Scan { csv, offline } => {
            let mut store = BookStore::open(&csv, scan_cost)?;
            let enricher = build_enricher(&config, offline);
            let enricher = enricher.as_ref().map(|e| e as &dyn Enricher);
            pipeline::run_scan(&mut store, enricher).await?;
        }

        Command::Add {
            csv,
            title,
            isbn,
            offline,
        } => {
            let mut store = BookStore::open(&csv, scan_cost)?;
            let enricher = build_enricher(&config, offline);
            let enricher = enricher.as_ref().map(|e| e as &dyn Enricher);
            let record = pipeline::run_add(&mut store, &title, &isbn, enricher).await?;
            println!("{}", record.id);
        }

        Command::Edit {
            csv,
            id,
            fields,
            offline,
        } => {
            let edit = RecordEdit::from(fields);
            if edit.is_empty() {
                return Err(AppError::validation("Nothing to change. Pass at least one field."));
            }
            let mut store = BookStore::open(&csv, scan_cost)?;
            let enricher = build_enricher(&config, offline);
            let enricher = enricher.as_ref().map(|e| e as &dyn Enricher);
            let record = pipeline::run_edit(&mut store, &id, &edit, enricher).await?;
            println!("{}: {}", record.id, record.decision);
        }

        Command::Show { csv, id } => {
            let store = BookStore::open(&csv, scan_cost)?;
            let record = store
                .get_by_id(&id)
                .ok_or_else(|| AppError::NotFound(id.clone()))?;
            let assessment = engine::recompute(record, scan_cost);
            let output = serde_json::json!({
                "record": record,
                "assessment": assessment,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Info { csv } => {
            if !csv.exists() {
                log::error!("Book file not found: {}", csv.display());
                return Err(AppError::config("Book file not found"));
            }
            let store = BookStore::open(&csv, scan_cost)?;
            pipeline::run_info(&store);
        }

        Command::Create { csv, sample, force } => {
            pipeline::run_create(&csv, sample, force)?;
        }

        Command::Validate => {}
    }

    log::info!("Done!");

    Ok(())
}
