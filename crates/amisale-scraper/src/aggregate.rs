//! Cross-page accumulation of normalized records.

use std::collections::HashSet;

use amisale_core::NormalizedRecord;

use crate::normalize::Rejection;

/// Append-only collector for one crawl run.
///
/// Records are kept in arrival order; [`ResultAggregator::finish`] sorts them
/// by discount, largest first, with ties left in arrival order.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    records: Vec<NormalizedRecord>,
    rejected: usize,
}

impl ResultAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: NormalizedRecord) {
        self.records.push(record);
    }

    pub fn record_rejection(&mut self, title: &str, rejection: &Rejection) {
        self.rejected += 1;
        tracing::warn!(title, reason = %rejection, "item rejected");
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Records whose detail link already appeared earlier in the run.
    #[must_use]
    pub fn duplicate_links(&self) -> usize {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter(|r| !seen.insert(r.detail_link.as_str()))
            .count()
    }

    /// Consumes the collector and returns the final ordering.
    ///
    /// With `dedupe` set, only the first record per detail link survives.
    #[must_use]
    pub fn finish(self, dedupe: bool) -> Vec<NormalizedRecord> {
        let mut records = self.records;
        if dedupe {
            let mut seen = HashSet::new();
            records.retain(|r| seen.insert(r.detail_link.clone()));
        }
        records.sort_by(|a, b| b.discount_percent.total_cmp(&a.discount_percent));
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(link: &str, percent: f64) -> NormalizedRecord {
        NormalizedRecord {
            condition: "New".to_owned(),
            title: format!("Item {link}"),
            detail_link: format!("https://www.amiami.com/eng/detail/?gcode={link}"),
            image_url: "https://img.amiami.com/x.jpg".to_owned(),
            discounted_price: 1000,
            original_price: 2000,
            discount_percent: percent,
        }
    }

    fn links(records: &[NormalizedRecord]) -> Vec<&str> {
        records
            .iter()
            .map(|r| r.detail_link.rsplit('=').next().unwrap_or_default())
            .collect()
    }

    #[test]
    fn finish_sorts_descending() {
        let mut agg = ResultAggregator::new();
        agg.push(record("A", 10.0));
        agg.push(record("B", 55.5));
        agg.push(record("C", 30.25));
        let out = agg.finish(false);
        assert_eq!(links(&out), vec!["B", "C", "A"]);
    }

    #[test]
    fn ties_keep_arrival_order() {
        let mut agg = ResultAggregator::new();
        agg.push(record("first", 20.0));
        agg.push(record("top", 40.0));
        agg.push(record("second", 20.0));
        agg.push(record("third", 20.0));
        let out = agg.finish(false);
        assert_eq!(links(&out), vec!["top", "first", "second", "third"]);
    }

    #[test]
    fn output_is_non_increasing() {
        let mut agg = ResultAggregator::new();
        for (i, p) in [3.5, 99.0, 0.0, 42.42, 42.42, 17.0, 100.0, 0.01].into_iter().enumerate() {
            agg.push(record(&i.to_string(), p));
        }
        let out = agg.finish(false);
        assert_eq!(out.len(), 8);
        assert!(out
            .windows(2)
            .all(|w| w[0].discount_percent >= w[1].discount_percent));
    }

    #[test]
    fn duplicates_kept_by_default() {
        let mut agg = ResultAggregator::new();
        agg.push(record("SAME", 25.0));
        agg.push(record("OTHER", 10.0));
        agg.push(record("SAME", 25.0));
        assert_eq!(agg.duplicate_links(), 1);
        assert_eq!(agg.finish(false).len(), 3);
    }

    #[test]
    fn dedupe_keeps_first_occurrence() {
        let mut agg = ResultAggregator::new();
        let mut first = record("SAME", 25.0);
        first.title = "first seen".to_owned();
        agg.push(first);
        agg.push(record("OTHER", 10.0));
        agg.push(record("SAME", 25.0));
        let out = agg.finish(true);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].title, "first seen");
    }

    #[test]
    fn counts_rejections_separately() {
        let mut agg = ResultAggregator::new();
        agg.record_rejection("bad item", &Rejection::ZeroOriginalPrice);
        assert!(agg.is_empty());
        assert_eq!(agg.len(), 0);
        assert_eq!(agg.rejected(), 1);
    }
}
