//! Retrieval of rendered listing pages.
//!
//! A [`PageSource`] never fails: every fetch ends as either loaded markup or
//! a failure reason, and the crawl loop decides what to do with either.

use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use amisale_core::CrawlConfig;
use async_trait::async_trait;
use reqwest::Url;

use crate::browser::Browser;
use crate::error::ScraperError;
use crate::retry::retry_with_jitter;

/// Result of fetching one listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageFetchOutcome {
    /// Rendered markup.
    Loaded(String),
    /// Every attempt failed; carries the last error message.
    Failed(String),
}

impl PageFetchOutcome {
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    #[must_use]
    pub fn into_html(self) -> Option<String> {
        match self {
            Self::Loaded(html) => Some(html),
            Self::Failed(_) => None,
        }
    }
}

#[async_trait]
pub trait PageSource: Send {
    /// Fetches listing page `page_index` (1-based).
    async fn fetch(&mut self, page_index: u32) -> PageFetchOutcome;
}

/// Builds the URL of page `index` by setting `param` on `template`.
///
/// An existing `param` is overwritten in place; every other query pair is kept.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidListingUrl`] if `template` is not an
/// absolute URL.
pub fn page_url(template: &str, param: &str, index: u32) -> Result<String, ScraperError> {
    let mut url = Url::parse(template).map_err(|e| ScraperError::InvalidListingUrl {
        url: template.to_owned(),
        reason: e.to_string(),
    })?;
    let index = index.to_string();

    let mut replaced = false;
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            if k == param {
                replaced = true;
                (k.into_owned(), index.clone())
            } else {
                (k.into_owned(), v.into_owned())
            }
        })
        .collect();

    {
        let mut query = url.query_pairs_mut();
        query.clear();
        query.extend_pairs(&pairs);
        if !replaced {
            query.append_pair(param, &index);
        }
    }
    Ok(url.into())
}

/// Per-page fetch behaviour, resolved once from configuration.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub listing_url: String,
    pub page_param: String,
    /// CSS whose presence means the listing has rendered.
    pub marker_selector: String,
    pub page_load_timeout: Duration,
    pub scroll_to_bottom: bool,
    pub max_attempts: u32,
    pub retry_delay_ms: RangeInclusive<u64>,
}

impl FetchSettings {
    #[must_use]
    pub fn from_config(config: &CrawlConfig, marker_selector: &str) -> Self {
        Self {
            listing_url: config.listing_url.clone(),
            page_param: config.page_param.clone(),
            marker_selector: marker_selector.to_owned(),
            page_load_timeout: Duration::from_secs(config.page_load_timeout_secs),
            scroll_to_bottom: config.scroll_to_bottom,
            max_attempts: config.max_attempts,
            retry_delay_ms: config.retry_delay_ms(),
        }
    }
}

/// [`PageSource`] backed by a live [`Browser`].
pub struct BrowserPageSource<B> {
    browser: B,
    settings: FetchSettings,
    attempts: AtomicU32,
}

impl<B: Browser> BrowserPageSource<B> {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidListingUrl`] if the listing URL cannot
    /// be turned into page URLs.
    pub fn new(browser: B, settings: FetchSettings) -> Result<Self, ScraperError> {
        page_url(&settings.listing_url, &settings.page_param, 1)?;
        Ok(Self {
            browser,
            settings,
            attempts: AtomicU32::new(0),
        })
    }

    /// Total attempts made across every page so far.
    #[must_use]
    pub fn attempts_made(&self) -> u32 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Hands the browser back so the caller can release it.
    pub fn into_browser(self) -> B {
        self.browser
    }

    async fn load_once(&self, url: &str, page: u32, attempt: u32) -> Result<String, ScraperError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(page, attempt, url, "loading listing page");

        self.browser.navigate(url).await?;

        let timeout = self.settings.page_load_timeout;
        if !self
            .browser
            .wait_for_element(&self.settings.marker_selector, timeout)
            .await?
        {
            return Err(ScraperError::MarkerTimeout {
                selector: self.settings.marker_selector.clone(),
                timeout_secs: timeout.as_secs(),
                url: url.to_owned(),
            });
        }

        if self.settings.scroll_to_bottom {
            if let Err(e) = self.browser.scroll_to_bottom().await {
                tracing::warn!(page, error = %e, "scroll failed, reading page as rendered");
            }
        }

        self.browser.page_source().await
    }
}

#[async_trait]
impl<B: Browser> PageSource for BrowserPageSource<B> {
    async fn fetch(&mut self, page_index: u32) -> PageFetchOutcome {
        let url = match page_url(
            &self.settings.listing_url,
            &self.settings.page_param,
            page_index,
        ) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!(page = page_index, error = %e, "cannot build page URL");
                return PageFetchOutcome::Failed(e.to_string());
            }
        };

        let this = &*self;
        let target = url.as_str();
        let result = retry_with_jitter(
            this.settings.max_attempts,
            this.settings.retry_delay_ms.clone(),
            move |attempt| this.load_once(target, page_index, attempt),
        )
        .await;

        match result {
            Ok(html) => {
                tracing::info!(page = page_index, bytes = html.len(), "page loaded");
                PageFetchOutcome::Loaded(html)
            }
            Err(e) => {
                tracing::error!(
                    page = page_index,
                    url = %url,
                    error = %e,
                    "page failed after all attempts, skipping"
                );
                PageFetchOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // -----------------------------------------------------------------------
    // page_url
    // -----------------------------------------------------------------------

    #[test]
    fn page_url_appends_param() {
        let url = page_url(
            "https://www.amiami.com/eng/search/list/?s_st_saleitem=1&pagemax=60",
            "pagecnt",
            3,
        )
        .unwrap();
        assert_eq!(
            url,
            "https://www.amiami.com/eng/search/list/?s_st_saleitem=1&pagemax=60&pagecnt=3"
        );
    }

    #[test]
    fn page_url_replaces_existing_param_in_place() {
        let url = page_url(
            "https://www.amiami.com/eng/search/list/?pagecnt=1&s_st_saleitem=1",
            "pagecnt",
            12,
        )
        .unwrap();
        assert_eq!(
            url,
            "https://www.amiami.com/eng/search/list/?pagecnt=12&s_st_saleitem=1"
        );
    }

    #[test]
    fn page_url_without_query() {
        let url = page_url("https://example.com/list", "page", 2).unwrap();
        assert_eq!(url, "https://example.com/list?page=2");
    }

    #[test]
    fn page_url_rejects_relative_template() {
        assert!(matches!(
            page_url("/eng/search/list/", "pagecnt", 1),
            Err(ScraperError::InvalidListingUrl { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // BrowserPageSource
    // -----------------------------------------------------------------------

    /// Scripted browser: the first `failures` navigations error out.
    struct FakeBrowser {
        failures: AtomicU32,
        marker_present: bool,
        scroll_fails: bool,
        html: String,
        visited: Mutex<Vec<String>>,
    }

    impl FakeBrowser {
        fn new(failures: u32) -> Self {
            Self {
                failures: AtomicU32::new(failures),
                marker_present: true,
                scroll_fails: false,
                html: "<html><p class=\"name\">ok</p></html>".to_owned(),
                visited: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Browser for FakeBrowser {
        async fn navigate(&self, url: &str) -> Result<(), ScraperError> {
            self.visited.lock().unwrap().push(url.to_owned());
            let left = self.failures.load(Ordering::SeqCst);
            if left > 0 {
                self.failures.store(left - 1, Ordering::SeqCst);
                return Err(ScraperError::WebDriver {
                    command: "navigate".to_owned(),
                    message: "unknown error: net::ERR_CONNECTION_RESET".to_owned(),
                });
            }
            Ok(())
        }

        async fn wait_for_element(&self, _css: &str, _timeout: Duration) -> Result<bool, ScraperError> {
            Ok(self.marker_present)
        }

        async fn scroll_to_bottom(&self) -> Result<(), ScraperError> {
            if self.scroll_fails {
                return Err(ScraperError::WebDriver {
                    command: "scroll".to_owned(),
                    message: "javascript error".to_owned(),
                });
            }
            Ok(())
        }

        async fn page_source(&self) -> Result<String, ScraperError> {
            Ok(self.html.clone())
        }
    }

    fn settings(max_attempts: u32) -> FetchSettings {
        FetchSettings {
            listing_url: "https://www.amiami.com/eng/search/list/?s_st_saleitem=1".to_owned(),
            page_param: "pagecnt".to_owned(),
            marker_selector: ".name".to_owned(),
            page_load_timeout: Duration::from_secs(1),
            scroll_to_bottom: true,
            max_attempts,
            retry_delay_ms: 0..=0,
        }
    }

    #[tokio::test]
    async fn loads_on_first_attempt() {
        let mut source = BrowserPageSource::new(FakeBrowser::new(0), settings(3)).unwrap();
        let outcome = source.fetch(2).await;
        assert!(outcome.is_loaded());
        assert_eq!(source.attempts_made(), 1);
        let browser = source.into_browser();
        assert_eq!(
            browser.visited.lock().unwrap().as_slice(),
            ["https://www.amiami.com/eng/search/list/?s_st_saleitem=1&pagecnt=2"]
        );
    }

    #[tokio::test]
    async fn recovers_after_transient_failure() {
        let mut source = BrowserPageSource::new(FakeBrowser::new(2), settings(3)).unwrap();
        let outcome = source.fetch(1).await;
        assert_eq!(
            outcome.into_html().as_deref(),
            Some("<html><p class=\"name\">ok</p></html>")
        );
        assert_eq!(source.attempts_made(), 3);
    }

    #[tokio::test]
    async fn always_failing_page_uses_exactly_max_attempts() {
        let mut source = BrowserPageSource::new(FakeBrowser::new(u32::MAX), settings(4)).unwrap();
        let outcome = source.fetch(5).await;
        assert!(matches!(outcome, PageFetchOutcome::Failed(ref reason) if reason.contains("ERR_CONNECTION_RESET")));
        assert_eq!(source.attempts_made(), 4);
    }

    #[tokio::test]
    async fn missing_marker_counts_as_failed_attempt() {
        let mut browser = FakeBrowser::new(0);
        browser.marker_present = false;
        let mut source = BrowserPageSource::new(browser, settings(2)).unwrap();
        let outcome = source.fetch(1).await;
        assert!(matches!(outcome, PageFetchOutcome::Failed(ref reason) if reason.contains(".name")));
        assert_eq!(source.attempts_made(), 2);
    }

    #[tokio::test]
    async fn scroll_failure_does_not_fail_the_page() {
        let mut browser = FakeBrowser::new(0);
        browser.scroll_fails = true;
        let mut source = BrowserPageSource::new(browser, settings(2)).unwrap();
        assert!(source.fetch(1).await.is_loaded());
        assert_eq!(source.attempts_made(), 1);
    }

    #[test]
    fn new_rejects_bad_listing_url() {
        let mut bad = settings(2);
        bad.listing_url = "not a url".to_owned();
        assert!(BrowserPageSource::new(FakeBrowser::new(0), bad).is_err());
    }
}
