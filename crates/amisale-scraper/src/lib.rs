pub mod aggregate;
pub mod browser;
pub mod crawl;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod page_source;
pub mod pagination;
pub(crate) mod parse_helpers;
pub(crate) mod retry;
pub mod webdriver;

pub use aggregate::ResultAggregator;
pub use browser::Browser;
pub use crawl::{run_crawl, CrawlOptions, CrawlReport, CrawlStats};
pub use error::ScraperError;
pub use extract::{ExtractorSelectors, ItemExtractor};
pub use normalize::{normalize, Rejection};
pub use page_source::{page_url, BrowserPageSource, FetchSettings, PageFetchOutcome, PageSource};
pub use pagination::{PaginationDiscoverer, DEFAULT_PAGER_SELECTOR};
pub use webdriver::{BrowserOptions, WebDriverSession};
