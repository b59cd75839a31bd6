use amisale_core::ReportRow;

/// One record as a labelled block, for `crawl --preview`.
pub(crate) fn format_preview(row: &ReportRow) -> String {
    ReportRow::HEADERS
        .iter()
        .zip(row.cells())
        .map(|(label, value)| {
            let label = format!("{label}:");
            format!("{label:<17} {value}\n")
        })
        .collect()
}
