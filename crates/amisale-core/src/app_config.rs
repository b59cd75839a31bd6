use std::ops::RangeInclusive;
use std::path::PathBuf;

/// Default listing: AmiAmi's English search results filtered to sale items.
pub const DEFAULT_LISTING_URL: &str =
    "https://www.amiami.com/eng/search/list/?s_st_saleitem=1&pagemax=60";

pub const DEFAULT_PAGE_PARAM: &str = "pagecnt";

pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

/// Fewest attempts per page the crawler accepts.
pub const MIN_ATTEMPTS: u32 = 2;

#[derive(Clone)]
pub struct CrawlConfig {
    pub listing_url: String,
    pub page_param: String,
    pub webdriver_url: String,
    pub headless: bool,
    /// Attempts per page, including the first one.
    pub max_attempts: u32,
    pub retry_delay_min_ms: u64,
    pub retry_delay_max_ms: u64,
    pub inter_page_delay_min_ms: u64,
    pub inter_page_delay_max_ms: u64,
    pub page_load_timeout_secs: u64,
    pub scroll_to_bottom: bool,
    pub max_pages: u32,
    pub dedupe_links: bool,
    pub output_dir: PathBuf,
    pub log_level: String,
}

impl CrawlConfig {
    /// Jitter window slept between attempts on the same page.
    #[must_use]
    pub fn retry_delay_ms(&self) -> RangeInclusive<u64> {
        self.retry_delay_min_ms..=self.retry_delay_max_ms
    }

    /// Jitter window slept between two successive pages.
    #[must_use]
    pub fn inter_page_delay_ms(&self) -> RangeInclusive<u64> {
        self.inter_page_delay_min_ms..=self.inter_page_delay_max_ms
    }
}

impl std::fmt::Debug for CrawlConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrawlConfig")
            .field("listing_url", &self.listing_url)
            .field("page_param", &self.page_param)
            .field("webdriver_url", &self.webdriver_url)
            .field("headless", &self.headless)
            .field("max_attempts", &self.max_attempts)
            .field(
                "retry_delay_ms",
                &format_args!("{}..={}", self.retry_delay_min_ms, self.retry_delay_max_ms),
            )
            .field(
                "inter_page_delay_ms",
                &format_args!(
                    "{}..={}",
                    self.inter_page_delay_min_ms, self.inter_page_delay_max_ms
                ),
            )
            .field("page_load_timeout_secs", &self.page_load_timeout_secs)
            .field("scroll_to_bottom", &self.scroll_to_bottom)
            .field("max_pages", &self.max_pages)
            .field("dedupe_links", &self.dedupe_links)
            .field("output_dir", &self.output_dir)
            .field("log_level", &self.log_level)
            .finish()
    }
}
