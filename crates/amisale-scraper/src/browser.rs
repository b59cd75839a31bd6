//! Capability interface over a rendering browser.
//!
//! The crawl pipeline only ever talks to a [`Browser`]; the production
//! implementation is [`crate::webdriver::WebDriverSession`], tests plug in
//! scripted fakes.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ScraperError;

#[async_trait]
pub trait Browser: Send + Sync {
    /// Loads `url` in the current tab.
    async fn navigate(&self, url: &str) -> Result<(), ScraperError>;

    /// Polls for an element matching `css` until it appears or `timeout`
    /// elapses. `Ok(false)` means the timeout was reached.
    async fn wait_for_element(&self, css: &str, timeout: Duration) -> Result<bool, ScraperError>;

    /// Scrolls down in small randomized steps until the document bottom,
    /// giving lazy-loaded content a chance to render.
    async fn scroll_to_bottom(&self) -> Result<(), ScraperError>;

    /// Returns the rendered markup of the current document.
    async fn page_source(&self) -> Result<String, ScraperError>;
}
