//! Sequential crawl over every listing page.
//!
//! Page 1 is fetched once and used both to learn the page count and as the
//! first page of items. Pages are then fetched strictly one after another
//! with a jittered pause in between. A page that fails after its retries is
//! counted and skipped; only a run that produces no records at all is an
//! error.

use std::ops::RangeInclusive;

use amisale_core::{CrawlConfig, NormalizedRecord};

use crate::aggregate::ResultAggregator;
use crate::error::ScraperError;
use crate::extract::{ExtractedPage, ItemExtractor};
use crate::normalize::normalize;
use crate::page_source::{PageFetchOutcome, PageSource};
use crate::pagination::PaginationDiscoverer;
use crate::retry::jitter_delay;

#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Upper bound on pages visited, whatever the pager advertises.
    pub max_pages: u32,
    pub inter_page_delay_ms: RangeInclusive<u64>,
    /// Keep only the first record per detail link.
    pub dedupe: bool,
}

impl CrawlOptions {
    #[must_use]
    pub fn from_config(config: &CrawlConfig) -> Self {
        Self {
            max_pages: config.max_pages,
            inter_page_delay_ms: config.inter_page_delay_ms(),
            dedupe: config.dedupe_links,
        }
    }
}

/// Run counters, logged at the end and returned with the records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Pages the run planned to visit (after the `max_pages` cap).
    pub pages_total: u32,
    pub pages_loaded: u32,
    pub pages_failed: u32,
    pub items_extracted: usize,
    pub items_rejected: usize,
    /// Records whose detail link was already seen earlier in the run.
    pub duplicate_links: usize,
    /// Records in the final output.
    pub records: usize,
}

#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Sorted by discount, largest first.
    pub records: Vec<NormalizedRecord>,
    pub stats: CrawlStats,
}

#[derive(Debug, Clone, Copy, Default)]
struct PageTally {
    extracted: usize,
    accepted: usize,
    rejected: usize,
}

/// Crawls every listing page reachable from page 1.
///
/// # Errors
///
/// Returns [`ScraperError::ZeroResults`] when no page yielded a single valid
/// record, which usually means the session was blocked or the markup changed.
pub async fn run_crawl<S>(
    source: &mut S,
    extractor: &ItemExtractor,
    pager: &PaginationDiscoverer,
    options: &CrawlOptions,
) -> Result<CrawlReport, ScraperError>
where
    S: PageSource + ?Sized,
{
    let mut stats = CrawlStats::default();
    let mut aggregator = ResultAggregator::new();

    match source.fetch(1).await {
        PageFetchOutcome::Loaded(html) => {
            let (advertised, tally) = ingest_first_page(&html, extractor, pager, &mut aggregator);
            let total = advertised.min(options.max_pages).max(1);
            if total < advertised {
                tracing::warn!(
                    advertised,
                    max_pages = options.max_pages,
                    "pager advertises more pages than allowed, capping"
                );
            }
            tracing::info!(pages = total, "discovered listing size");

            stats.pages_total = total;
            record_page(&mut stats, 1, tally);

            for page in 2..=total {
                tokio::time::sleep(jitter_delay(&options.inter_page_delay_ms)).await;
                match source.fetch(page).await {
                    PageFetchOutcome::Loaded(html) => {
                        let tally = ingest_page(&html, extractor, &mut aggregator);
                        record_page(&mut stats, page, tally);
                    }
                    PageFetchOutcome::Failed(_) => stats.pages_failed += 1,
                }
            }
        }
        PageFetchOutcome::Failed(reason) => {
            tracing::error!(reason = %reason, "first page failed, page count unknown");
            stats.pages_total = 1;
            stats.pages_failed = 1;
        }
    }

    if aggregator.is_empty() {
        tracing::error!(
            pages_total = stats.pages_total,
            pages_failed = stats.pages_failed,
            items_rejected = stats.items_rejected,
            "crawl produced no records"
        );
        return Err(ScraperError::ZeroResults {
            pages_total: stats.pages_total,
            pages_failed: stats.pages_failed,
        });
    }

    stats.duplicate_links = aggregator.duplicate_links();
    if stats.duplicate_links > 0 {
        tracing::warn!(
            duplicates = stats.duplicate_links,
            dedupe = options.dedupe,
            "same detail link seen on more than one page"
        );
    }

    let records = aggregator.finish(options.dedupe);
    stats.records = records.len();
    tracing::info!(
        pages_loaded = stats.pages_loaded,
        pages_failed = stats.pages_failed,
        items_extracted = stats.items_extracted,
        items_rejected = stats.items_rejected,
        records = stats.records,
        "crawl finished"
    );

    Ok(CrawlReport { records, stats })
}

fn record_page(stats: &mut CrawlStats, page: u32, tally: PageTally) {
    stats.pages_loaded += 1;
    stats.items_extracted += tally.extracted;
    stats.items_rejected += tally.rejected;
    if tally.extracted == 0 {
        tracing::warn!(page, "page loaded but no discounted items found");
    } else {
        tracing::info!(
            page,
            extracted = tally.extracted,
            accepted = tally.accepted,
            rejected = tally.rejected,
            "page processed"
        );
    }
}

// The parsed DOM is not `Send`; both helpers are synchronous so it is
// dropped before the next await.

fn ingest_first_page(
    html: &str,
    extractor: &ItemExtractor,
    pager: &PaginationDiscoverer,
    aggregator: &mut ResultAggregator,
) -> (u32, PageTally) {
    let page = extractor.parse(html);
    let advertised = pager.discover_in(page.document());
    (advertised, ingest(&page, aggregator))
}

fn ingest_page(html: &str, extractor: &ItemExtractor, aggregator: &mut ResultAggregator) -> PageTally {
    ingest(&extractor.parse(html), aggregator)
}

fn ingest(page: &ExtractedPage<'_>, aggregator: &mut ResultAggregator) -> PageTally {
    let mut tally = PageTally::default();
    for raw in page.items() {
        tally.extracted += 1;
        let title = raw.title.clone();
        match normalize(raw) {
            Ok(record) => {
                tally.accepted += 1;
                aggregator.push(record);
            }
            Err(rejection) => {
                tally.rejected += 1;
                aggregator.record_rejection(&title, &rejection);
            }
        }
    }
    tally
}
