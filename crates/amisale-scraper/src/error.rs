use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WebDriver {command} failed: {message}")]
    WebDriver { command: String, message: String },

    #[error("unexpected HTTP status {status} from WebDriver {command}")]
    UnexpectedStatus { status: u16, command: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("marker element \"{selector}\" did not appear within {timeout_secs}s on {url}")]
    MarkerTimeout {
        selector: String,
        timeout_secs: u64,
        url: String,
    },

    #[error("invalid CSS selector \"{selector}\": {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("invalid listing URL \"{url}\": {reason}")]
    InvalidListingUrl { url: String, reason: String },

    #[error(
        "crawl produced zero records across {pages_total} page(s) ({pages_failed} failed); \
         the site likely blocked the session or changed its markup"
    )]
    ZeroResults { pages_total: u32, pages_failed: u32 },
}
