//! The `crawl` command: browser session, crawl, exports.

use std::path::PathBuf;
use std::time::Duration;

use amisale_core::CrawlConfig;
use amisale_scraper::{
    run_crawl, BrowserOptions, BrowserPageSource, CrawlOptions, ExtractorSelectors, FetchSettings,
    ItemExtractor, PaginationDiscoverer, WebDriverSession,
};
use anyhow::Context as _;
use clap::Args;

use crate::export;
use crate::preview::format_preview;

#[derive(Debug, Args)]
pub struct CrawlArgs {
    /// Visit at most this many listing pages
    #[arg(long)]
    pub max_pages: Option<u32>,

    /// Directory the CSV, Markdown and XLSX files are written to
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Keep only the first record per product link
    #[arg(long)]
    pub dedupe: bool,

    /// Skip the spreadsheet export
    #[arg(long)]
    pub no_xlsx: bool,

    /// Print every record to stdout after the crawl
    #[arg(long)]
    pub preview: bool,
}

impl CrawlArgs {
    /// Layers command-line flags over the environment configuration.
    pub(crate) fn apply(&self, config: &mut CrawlConfig) -> anyhow::Result<()> {
        if let Some(max_pages) = self.max_pages {
            if max_pages == 0 {
                anyhow::bail!("--max-pages must be at least 1");
            }
            config.max_pages = max_pages;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir.clone_from(dir);
        }
        if self.dedupe {
            config.dedupe_links = true;
        }
        Ok(())
    }
}

/// Runs one full crawl and writes every export.
///
/// The browser session is closed before exporting, whatever the crawl outcome.
/// A crawl with zero records is an error and nothing is exported.
pub(crate) async fn run_crawl_command(mut config: CrawlConfig, args: &CrawlArgs) -> anyhow::Result<()> {
    args.apply(&mut config)?;
    tracing::debug!(?config, "resolved configuration");

    let extractor = ItemExtractor::new(&ExtractorSelectors::default())?;
    let pager = PaginationDiscoverer::default();
    let settings = FetchSettings::from_config(&config, extractor.marker_selector());
    let options = CrawlOptions::from_config(&config);

    let session = WebDriverSession::start(&BrowserOptions {
        webdriver_url: config.webdriver_url.clone(),
        headless: config.headless,
        page_load_timeout: Duration::from_secs(config.page_load_timeout_secs),
    })
    .await
    .with_context(|| format!("failed to start browser session at {}", config.webdriver_url))?;

    let mut source = BrowserPageSource::new(session, settings)?;
    let outcome = run_crawl(&mut source, &extractor, &pager, &options).await;
    let attempts = source.attempts_made();
    if let Err(e) = source.into_browser().close().await {
        tracing::warn!(error = %e, "failed to close browser session");
    }

    let report = outcome.context("crawl aborted")?;
    tracing::info!(
        attempts,
        pages_loaded = report.stats.pages_loaded,
        pages_failed = report.stats.pages_failed,
        records = report.records.len(),
        "crawl complete"
    );

    if args.preview {
        for record in &report.records {
            println!("{}", format_preview(&record.to_report_row()));
        }
    }

    let written = export::export_all(&report.records, &config.output_dir, !args.no_xlsx)?;
    println!(
        "Finished: {} discounted item(s) from {} of {} page(s).",
        report.records.len(),
        report.stats.pages_loaded,
        report.stats.pages_total
    );
    for path in written {
        println!("  wrote {}", path.display());
    }
    Ok(())
}
