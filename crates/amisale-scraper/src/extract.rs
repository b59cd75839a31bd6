//! Structural extraction of discounted items from a rendered listing page.
//!
//! Every anchor pointing at a product detail page is a candidate. For each
//! one the title, current price and original price are looked up first
//! inside the anchor and then inside the nearest enclosing item block.
//! A candidate without an original-price node is simply not on sale and is
//! skipped; so is one missing a title, a usable price or an absolute image
//! URL. None of these gaps is an error.

use std::collections::HashSet;

use amisale_core::records::{RawItem, DEFAULT_CONDITION};
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use crate::error::ScraperError;
use crate::parse_helpers::{collapse_whitespace, first_price_run, is_absolute_http_url, style_hides};

/// CSS selectors and link rules for one listing layout. Defaults match the
/// AmiAmi English storefront.
#[derive(Debug, Clone)]
pub struct ExtractorSelectors {
    pub item_block: String,
    pub detail_anchor: String,
    pub title: String,
    pub current_price: String,
    pub original_price: String,
    /// Individual status tags; the first visible one is the condition.
    pub status_tag: String,
    pub image: String,
    /// Absolute prefix every detail link must start with.
    pub detail_prefix: String,
    /// Query keys that carry the item code, e.g. `gcode=FIGURE-123456`.
    pub item_code_keys: Vec<String>,
}

impl Default for ExtractorSelectors {
    fn default() -> Self {
        Self {
            item_block: "li.newly-added-items__item".to_owned(),
            detail_anchor: "a[href]".to_owned(),
            title: ".newly-added-items__item__name".to_owned(),
            current_price: ".newly-added-items__item__price".to_owned(),
            original_price: ".newly-added-items__item__price_original".to_owned(),
            status_tag: ".newly-added-items__item__tag-list li".to_owned(),
            image: "img".to_owned(),
            detail_prefix: "https://www.amiami.com/eng/detail/".to_owned(),
            item_code_keys: vec!["gcode".to_owned(), "scode".to_owned()],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ItemExtractor {
    item_block: Selector,
    detail_anchor: Selector,
    title: Selector,
    current_price: Selector,
    original_price: Selector,
    status_tag: Selector,
    image: Selector,
    title_css: String,
    detail_base: Url,
    detail_prefix: String,
    item_code_keys: Vec<String>,
}

impl ItemExtractor {
    /// Compiles `selectors` once for reuse across pages.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidSelector`] if any CSS selector fails to parse.
    /// - [`ScraperError::InvalidListingUrl`] if `detail_prefix` is not an absolute URL.
    pub fn new(selectors: &ExtractorSelectors) -> Result<Self, ScraperError> {
        let detail_base =
            Url::parse(&selectors.detail_prefix).map_err(|e| ScraperError::InvalidListingUrl {
                url: selectors.detail_prefix.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            item_block: compile(&selectors.item_block)?,
            detail_anchor: compile(&selectors.detail_anchor)?,
            title: compile(&selectors.title)?,
            current_price: compile(&selectors.current_price)?,
            original_price: compile(&selectors.original_price)?,
            status_tag: compile(&selectors.status_tag)?,
            image: compile(&selectors.image)?,
            title_css: selectors.title.clone(),
            detail_base,
            detail_prefix: selectors.detail_prefix.clone(),
            item_code_keys: selectors.item_code_keys.clone(),
        })
    }

    /// CSS of the item-name node; its presence marks a rendered listing.
    #[must_use]
    pub fn marker_selector(&self) -> &str {
        &self.title_css
    }

    /// Parses one page of markup for lazy extraction.
    #[must_use]
    pub fn parse(&self, html: &str) -> ExtractedPage<'_> {
        ExtractedPage {
            extractor: self,
            document: Html::parse_document(html),
        }
    }

    /// Convenience wrapper collecting every item on the page.
    #[must_use]
    pub fn extract(&self, html: &str) -> Vec<RawItem> {
        self.parse(html).items().collect()
    }

    /// Resolves `href` and keeps it only if it is a detail link with an item code.
    fn detail_link(&self, href: &str) -> Option<String> {
        let url = self.detail_base.join(href.trim()).ok()?;
        let link = url.to_string();
        if !link.starts_with(&self.detail_prefix) {
            return None;
        }
        let has_code = url.query_pairs().any(|(k, v)| {
            self.item_code_keys.iter().any(|key| key == k.as_ref()) && !v.trim().is_empty()
        });
        has_code.then_some(link)
    }

    fn enclosing_block<'a>(&self, anchor: ElementRef<'a>) -> Option<ElementRef<'a>> {
        if self.item_block.matches(&anchor) {
            return Some(anchor);
        }
        anchor
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| self.item_block.matches(el))
    }

    fn raw_item<'a>(
        &self,
        anchor: ElementRef<'a>,
        block: Option<ElementRef<'a>>,
        link: String,
    ) -> Option<RawItem> {
        let find = |sel: &Selector| {
            anchor
                .select(sel)
                .next()
                .or_else(|| block.and_then(|b| b.select(sel).next()))
        };

        let original_node = find(&self.original_price)?;
        let original_price_text = first_price_run(&text_of(original_node))?.to_owned();
        let discounted_price_text =
            first_price_run(&text_of(find(&self.current_price)?))?.to_owned();

        let title = collapse_whitespace(&words_of(find(&self.title)?));
        if title.is_empty() {
            return None;
        }

        let image_url = self.image_url(block.unwrap_or(anchor))?;
        let condition = self.condition(block.unwrap_or(anchor));

        Some(RawItem {
            condition,
            title,
            detail_link: link,
            image_url,
            discounted_price_text,
            original_price_text,
        })
    }

    fn condition(&self, scope: ElementRef<'_>) -> String {
        scope
            .select(&self.status_tag)
            .filter(|tag| !is_hidden(*tag))
            .map(|tag| collapse_whitespace(&words_of(tag)))
            .find(|label| !label.is_empty())
            .unwrap_or_else(|| DEFAULT_CONDITION.to_owned())
    }

    fn image_url(&self, scope: ElementRef<'_>) -> Option<String> {
        let img = scope.select(&self.image).next()?;
        ["src", "data-src"]
            .into_iter()
            .filter_map(|attr| img.value().attr(attr))
            .map(str::trim)
            .find(|src| is_absolute_http_url(src))
            .map(str::to_owned)
    }
}

/// One parsed listing page. Holds a DOM that is not `Send`, so keep it out
/// of `.await` points.
pub struct ExtractedPage<'e> {
    extractor: &'e ItemExtractor,
    document: Html,
}

impl ExtractedPage<'_> {
    #[must_use]
    pub fn document(&self) -> &Html {
        &self.document
    }

    /// Discounted items in document order, produced lazily.
    ///
    /// An item block yields at most one item even if it holds several
    /// anchors to the same product.
    pub fn items(&self) -> impl Iterator<Item = RawItem> + '_ {
        let extractor = self.extractor;
        let mut seen_blocks = HashSet::new();
        self.document
            .select(&extractor.detail_anchor)
            .filter_map(move |anchor| {
                let link = extractor.detail_link(anchor.value().attr("href")?)?;
                let block = extractor.enclosing_block(anchor);
                if let Some(b) = block {
                    if seen_blocks.contains(&b.id()) {
                        return None;
                    }
                }
                let item = extractor.raw_item(anchor, block, link)?;
                if let Some(b) = block {
                    seen_blocks.insert(b.id());
                }
                Some(item)
            })
    }
}

fn compile(css: &str) -> Result<Selector, ScraperError> {
    Selector::parse(css).map_err(|e| ScraperError::InvalidSelector {
        selector: css.to_owned(),
        reason: e.to_string(),
    })
}

/// Text nodes concatenated as-is, so split digits stay together.
fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect()
}

/// Text nodes joined by spaces, for labels broken up by inline markup.
fn words_of(el: ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join(" ")
}

fn is_hidden(el: ElementRef<'_>) -> bool {
    let value = el.value();
    value.attr("hidden").is_some()
        || value.attr("aria-hidden") == Some("true")
        || value.attr("style").is_some_and(style_hides)
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
