//! Listing pipeline CLI
//!
//! Local execution entry point for crawling portals and loading periods.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use listings::{
    error::Result,
    models::{Config, Period, Site, TableRef},
    pipeline::{self, LoadInput},
    storage::RecordSetStorage,
};

/// Real-estate listing pipeline: crawl, normalize, load
#[derive(Parser, Debug)]
#[command(
    name = "listings",
    version,
    about = "Real-estate listing crawler and period loader"
)]
struct Cli {
    /// Path to storage directory containing config.toml, record sets and store files
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl listing pages and write one record set per site
    Crawl {
        /// Reference period, YYYY-MM (default: current month)
        #[arg(long)]
        period: Option<String>,

        /// Restrict the crawl to these sites (chaves, olx, vivareal, zap)
        #[arg(long = "site", value_parser = parse_site)]
        sites: Vec<Site>,
    },

    /// Replace a period table with a period's record sets
    Load {
        /// Reference period, YYYY-MM; selects {raw_dir}/{period} without --manifest or --dir
        #[arg(long)]
        period: Option<String>,

        /// TOML manifest of (path, origin, period) sources
        #[arg(long, conflicts_with = "dir")]
        manifest: Option<PathBuf>,

        /// Directory of record sets; origins are inferred from filenames
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Target schema (default: {schema_prefix}_{YYYY})
        #[arg(long, requires = "table")]
        schema: Option<String>,

        /// Target table (default: the period's month name)
        #[arg(long, requires = "schema")]
        table: Option<String>,
    },

    /// Run full pipeline: Crawl → Load
    Pipeline {
        /// Reference period, YYYY-MM (default: current month)
        #[arg(long)]
        period: Option<String>,

        /// Restrict the crawl to these sites
        #[arg(long = "site", value_parser = parse_site)]
        sites: Vec<Site>,
    },

    /// Validate configuration file
    Validate,

    /// Show record sets and loaded rows for a period
    Info {
        /// Reference period, YYYY-MM (default: current month)
        #[arg(long)]
        period: Option<String>,
    },
}

fn parse_site(s: &str) -> std::result::Result<Site, String> {
    Site::from_slug(s).ok_or_else(|| format!("unknown site '{s}'"))
}

fn parse_period(period: Option<&str>) -> Result<Period> {
    match period {
        Some(p) => Period::parse(p),
        None => Ok(Period::current()),
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.storage_dir.join("config.toml");
    let load_config = || {
        let config = Config::load_or_default(&config_path);
        log::info!("Loaded configuration from {}", cli.storage_dir.display());
        config
    };

    match cli.command {
        Command::Crawl { period, sites } => {
            let config = load_config();
            let period = parse_period(period.as_deref())?;
            let storage = RecordSetStorage::new(config.paths.raw_dir(&cli.storage_dir));
            let report = pipeline::run_crawler(&config, &storage, &period, &sites).await?;

            for (site, path, count) in &report.files {
                log::info!("{}: {count} records -> {}", site.label(), path.display());
            }
            log::info!("Crawl complete!");
        }

        Command::Load {
            period,
            manifest,
            dir,
            schema,
            table,
        } => {
            let config = load_config();
            let input = match (manifest, dir) {
                (Some(manifest), _) => LoadInput::Manifest(manifest),
                (None, Some(dir)) => LoadInput::Directory {
                    dir,
                    period: parse_period(period.as_deref())?,
                },
                (None, None) => {
                    let period = parse_period(period.as_deref())?;
                    LoadInput::Directory {
                        dir: config
                            .paths
                            .raw_dir(&cli.storage_dir)
                            .join(period.to_string()),
                        period,
                    }
                }
            };
            let table = match (schema, table) {
                (Some(schema), Some(table)) => Some(TableRef::new(schema, table)?),
                _ => None,
            };

            let summary = pipeline::run_load(&config, &cli.storage_dir, input, table)?;
            log::info!("Load complete! Digest {}", summary.digest);
        }

        Command::Pipeline { period, sites } => {
            let config = load_config();
            let period = parse_period(period.as_deref())?;
            let summary = pipeline::run_pipeline(&config, &cli.storage_dir, &period, &sites).await?;
            log::info!("{} rows now in {}", summary.rows, summary.table);
        }

        Command::Validate => {
            pipeline::run_validate(&config_path)?;
            log::info!("All validations passed!");
        }

        Command::Info { period } => {
            let config = load_config();
            let period = parse_period(period.as_deref())?;
            log::info!("Storage directory: {}", cli.storage_dir.display());
            pipeline::run_info(&config, &cli.storage_dir, &period)?;
        }
    }

    log::info!("Done!");

    Ok(())
}
