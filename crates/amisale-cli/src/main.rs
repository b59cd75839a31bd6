mod crawl;
mod export;
mod preview;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::crawl::{run_crawl_command, CrawlArgs};

#[derive(Debug, Parser)]
#[command(name = "amisale")]
#[command(about = "Crawl AmiAmi sale listings and export the discounted items")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Crawl every listing page and write CSV, Markdown and XLSX exports
    Crawl(CrawlArgs),
    /// Print the resolved configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = amisale_core::load_crawl_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Commands::Crawl(args) => run_crawl_command(config, &args).await,
        Commands::Config => {
            println!("{config:#?}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests;
