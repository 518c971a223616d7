use anyhow::{Context, Result};
use blogfeed::crawl::CrawlCoordinator;
use blogfeed::{Config, Orchestrator};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "blogfeed",
    about = "Generate RSS and JSON feeds from a paginated blog listing"
)]
struct Args {
    /// Configuration file (missing file means built-in defaults)
    #[arg(long, value_name = "FILE", default_value = "blogfeed.toml")]
    config: PathBuf,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    config.validate().context("Invalid configuration")?;

    if args.print_config {
        println!("{:#?}", config);
        return Ok(());
    }

    let coordinator = CrawlCoordinator::new(&config).context("Failed to set up crawler")?;
    let orchestrator = Orchestrator::new(coordinator, config.sources.clone());

    let summary = match orchestrator.run().await {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Fatal: {}", e);
            std::process::exit(1);
        }
    };

    for report in &summary.reports {
        println!(
            "{}: {} entries from {} pages, {} feeds written",
            report.name,
            report.entries,
            report.pages,
            report.feeds.len()
        );
        if !report.failed_pages.is_empty() {
            println!("  pages that failed to load: {:?}", report.failed_pages);
        }
    }

    for error in &summary.errors {
        eprintln!("Error: {}", error);
    }

    Ok(())
}
