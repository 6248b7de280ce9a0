//! cafe-crawler - Korean café chain menu crawler and catalog uploader
//!
//! Crawls café menu sites through a WebDriver session, writes dated batch
//! files, and reconciles them into a catalog store.

use anyhow::Result;
use cafe_crawler::commands::{CrawlCommand, StatsCommand, UploadArgs, UploadCommand};
use cafe_crawler::config::Config;
use cafe_crawler::sites::{self, SiteId};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "cafe-crawler",
    version,
    about = "Korean café chain menu crawler and catalog uploader",
    long_about = "Crawls café chain menu sites with a real browser, extracts product \
                  listings, and reconciles the results into a catalog store."
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Catalog store base URL
    #[arg(long, global = true, env = "CAFE_STORE_URL")]
    store_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Upload flags used when no subcommand is given
    #[command(flatten)]
    upload: UploadArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl café menu sites and write batch files
    #[command(alias = "c")]
    Crawl {
        /// Site to crawl, or "all"
        #[arg(short, long, default_value = "all")]
        site: String,

        /// Directory for batch files (defaults to the configured one)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Upload a crawl batch to the catalog store (the default command)
    #[command(alias = "u")]
    Upload(UploadArgs),

    /// Show per-café catalog counts
    Stats {
        /// Only this café
        #[arg(long)]
        cafe_slug: Option<String>,
    },

    /// List registered site profiles
    Sites,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    config.verbose = cli.verbose;
    if let Some(url) = cli.store_url {
        config.store_url = Some(url);
    }

    match cli.command {
        Some(Commands::Crawl { site, output }) => {
            let cmd = CrawlCommand::new(config);
            let summary = cmd.execute(&site, output.as_deref()).await?;
            println!("{}", summary);
        }

        Some(Commands::Stats { cafe_slug }) => {
            let cmd = StatsCommand::new(config);
            let table = cmd.execute(cafe_slug.as_deref()).await?;
            println!("{}", table);
        }

        Some(Commands::Sites) => {
            println!("Registered site profiles:\n");
            println!("{:<12} {:<14} {}", "Slug", "Café", "Entry URL");
            println!("{:-<12} {:-<14} {:-<44}", "", "", "");

            for site in SiteId::all() {
                println!(
                    "{:<12} {:<14} {}",
                    site.slug(),
                    site.cafe_name(),
                    sites::profile(*site).entry_url
                );
            }
        }

        Some(Commands::Upload(args)) => run_upload(config, &args).await?,

        // Bare invocation uploads, matching the most common workflow
        None => run_upload(config, &cli.upload).await?,
    }

    Ok(())
}

async fn run_upload(config: Config, args: &UploadArgs) -> Result<()> {
    let cmd = UploadCommand::new(config);
    let outcome = cmd.execute(args).await?;
    println!("{}", outcome.summary);

    if !outcome.clean {
        std::process::exit(1);
    }
    Ok(())
}
