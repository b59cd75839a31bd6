use serde::{Deserialize, Serialize};

/// Condition label used when a listing shows no visible status tag.
pub const DEFAULT_CONDITION: &str = "New";

/// One discounted listing entry as it appears in the page markup.
///
/// Only built for entries that show an original (pre-discount) price; the
/// price fields still hold display text such as `"1,980"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawItem {
    pub condition: String,
    pub title: String,
    /// Absolute URL of the product detail page.
    pub detail_link: String,
    pub image_url: String,
    pub discounted_price_text: String,
    pub original_price_text: String,
}

/// A validated discounted product, ready for export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub condition: String,
    pub title: String,
    pub detail_link: String,
    pub image_url: String,
    /// Whole yen.
    pub discounted_price: u64,
    /// Whole yen, never zero.
    pub original_price: u64,
    /// Percentage off the original price, rounded to 2 decimal places.
    pub discount_percent: f64,
}

impl NormalizedRecord {
    #[must_use]
    pub fn discounted_price_display(&self) -> String {
        format_jpy(self.discounted_price)
    }

    #[must_use]
    pub fn original_price_display(&self) -> String {
        format_jpy(self.original_price)
    }

    #[must_use]
    pub fn discount_percent_display(&self) -> String {
        format_percent(self.discount_percent)
    }

    /// Projects the record onto the seven exported columns.
    #[must_use]
    pub fn to_report_row(&self) -> ReportRow {
        ReportRow {
            condition: self.condition.clone(),
            title: self.title.clone(),
            link: self.detail_link.clone(),
            image: self.image_url.clone(),
            discounted_price: self.discounted_price_display(),
            original_price: self.original_price_display(),
            discount: self.discount_percent_display(),
        }
    }
}

/// Export projection shared by every output sink. Field order is column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    #[serde(rename = "Condition")]
    pub condition: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Link")]
    pub link: String,
    #[serde(rename = "Image")]
    pub image: String,
    #[serde(rename = "Discounted Price")]
    pub discounted_price: String,
    #[serde(rename = "Original Price")]
    pub original_price: String,
    #[serde(rename = "Discount %")]
    pub discount: String,
}

impl ReportRow {
    pub const HEADERS: [&'static str; 7] = [
        "Condition",
        "Title",
        "Link",
        "Image",
        "Discounted Price",
        "Original Price",
        "Discount %",
    ];

    /// Cell values in [`Self::HEADERS`] order.
    #[must_use]
    pub fn cells(&self) -> [&str; 7] {
        [
            &self.condition,
            &self.title,
            &self.link,
            &self.image,
            &self.discounted_price,
            &self.original_price,
            &self.discount,
        ]
    }
}

/// Formats `n` with `,` every three digits: `1234567` → `"1,234,567"`.
#[must_use]
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `1000` → `"1,000 JPY"`.
#[must_use]
pub fn format_jpy(n: u64) -> String {
    format!("{} JPY", format_thousands(n))
}

/// `50.0` → `"50.00%"`.
#[must_use]
pub fn format_percent(p: f64) -> String {
    format!("{p:.2}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> NormalizedRecord {
        NormalizedRecord {
            condition: "PRE-OWNED".to_owned(),
            title: "Nendoroid Hatsune Miku".to_owned(),
            detail_link: "https://www.amiami.com/eng/detail/?gcode=FIGURE-012345".to_owned(),
            image_url: "https://img.amiami.com/images/product/main/123/FIGURE-012345.jpg"
                .to_owned(),
            discounted_price: 1_000,
            original_price: 12_500,
            discount_percent: 92.0,
        }
    }

    #[test]
    fn format_thousands_groups_digits() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1_000), "1,000");
        assert_eq!(format_thousands(12_345), "12,345");
        assert_eq!(format_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn format_jpy_appends_currency() {
        assert_eq!(format_jpy(1_980), "1,980 JPY");
    }

    #[test]
    fn format_percent_always_has_two_decimals() {
        assert_eq!(format_percent(50.0), "50.00%");
        assert_eq!(format_percent(33.33), "33.33%");
        assert_eq!(format_percent(0.0), "0.00%");
        assert_eq!(format_percent(100.0), "100.00%");
    }

    #[test]
    fn report_row_uses_display_strings() {
        let row = sample_record().to_report_row();
        assert_eq!(row.discounted_price, "1,000 JPY");
        assert_eq!(row.original_price, "12,500 JPY");
        assert_eq!(row.discount, "92.00%");
        assert_eq!(row.cells()[2], row.link);
    }

    #[test]
    fn report_row_serializes_with_column_headers_in_order() {
        let row = sample_record().to_report_row();
        let json = serde_json::to_string(&row).unwrap();
        let mut last = 0;
        for header in ReportRow::HEADERS {
            let pos = json
                .find(&format!("\"{header}\""))
                .unwrap_or_else(|| panic!("missing header {header} in {json}"));
            assert!(pos >= last, "header {header} out of order in {json}");
            last = pos;
        }
    }
}
