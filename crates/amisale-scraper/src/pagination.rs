//! Page-count discovery from the listing's pager control.
//!
//! The pager on the first rendered page lists page-number links (plus
//! "next"/"prev" arrows and ellipses). The largest numeric label is the
//! last page. A listing with a single page renders no pager at all, which
//! is reported as one page rather than an error.

use scraper::{Html, Selector};

use crate::error::ScraperError;

/// Default pager selector for the AmiAmi listing.
pub const DEFAULT_PAGER_SELECTOR: &str = ".pager-list li a, .pager-list li span";

#[derive(Debug, Clone)]
pub struct PaginationDiscoverer {
    pager: Selector,
}

impl PaginationDiscoverer {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidSelector`] if `pager_css` does not parse.
    pub fn new(pager_css: &str) -> Result<Self, ScraperError> {
        let pager = Selector::parse(pager_css).map_err(|e| ScraperError::InvalidSelector {
            selector: pager_css.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self { pager })
    }

    /// Total page count advertised by `html`; never less than 1.
    #[must_use]
    pub fn discover(&self, html: &str) -> u32 {
        self.discover_in(&Html::parse_document(html))
    }

    /// Same as [`Self::discover`] on an already parsed document.
    #[must_use]
    pub fn discover_in(&self, document: &Html) -> u32 {
        document
            .select(&self.pager)
            .filter_map(|el| {
                let label = el.text().collect::<String>();
                parse_page_label(label.trim())
            })
            .max()
            .unwrap_or(1)
    }
}

impl Default for PaginationDiscoverer {
    fn default() -> Self {
        Self {
            pager: Selector::parse(DEFAULT_PAGER_SELECTOR).expect("default pager selector is valid"),
        }
    }
}

/// Accepts only plain decimal labels: `"7"` yes, `"…"`, `"Next"`, `"0"` no.
fn parse_page_label(label: &str) -> Option<u32> {
    if label.is_empty() || !label.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    label.parse::<u32>().ok().filter(|&n| n > 0)
}
