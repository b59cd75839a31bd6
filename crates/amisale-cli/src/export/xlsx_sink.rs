use std::path::Path;

use amisale_core::ReportRow;
use rust_xlsxwriter::{Format, Workbook};

pub(crate) const SHEET_NAME: &str = "Sales";

const TITLE_COLUMN: u16 = 1;
const TITLE_WIDTH: f64 = 50.0;

/// Single-sheet workbook with a bold, filterable header row.
pub(crate) fn write_xlsx(path: &Path, rows: &[ReportRow]) -> anyhow::Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    let bold = Format::new().set_bold();
    let wrap = Format::new().set_text_wrap();

    for (col, header) in (0u16..).zip(ReportRow::HEADERS) {
        sheet.write_string_with_format(0, col, header, &bold)?;
    }
    for (row_idx, row) in (1u32..).zip(rows) {
        for (col, cell) in (0u16..).zip(row.cells()) {
            if col == TITLE_COLUMN {
                sheet.write_string_with_format(row_idx, col, cell, &wrap)?;
            } else {
                sheet.write_string(row_idx, col, cell)?;
            }
        }
    }

    for (col, width) in (0u16..).zip(column_widths(rows)) {
        sheet.set_column_width(col, width)?;
    }

    let last_row = u32::try_from(rows.len())?;
    let last_col = u16::try_from(ReportRow::HEADERS.len() - 1)?;
    sheet.autofilter(0, 0, last_row, last_col)?;

    workbook.save(path)?;
    Ok(())
}

/// Title gets a fixed width; every other column fits its longest cell plus 2.
pub(crate) fn column_widths(rows: &[ReportRow]) -> Vec<f64> {
    (0..ReportRow::HEADERS.len())
        .map(|col| {
            if col == usize::from(TITLE_COLUMN) {
                return TITLE_WIDTH;
            }
            let longest = rows
                .iter()
                .map(|r| r.cells()[col].chars().count())
                .chain(std::iter::once(ReportRow::HEADERS[col].chars().count()))
                .max()
                .unwrap_or(0);
            f64::from(u32::try_from(longest).unwrap_or(u32::MAX)) + 2.0
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::test_support::record;

    #[test]
    fn widths_fit_content_except_title() {
        let rows = vec![record("An extremely long figure title that wraps", 1_000, 20_000, 95.0).to_report_row()];

        let widths = column_widths(&rows);

        assert_eq!(widths.len(), 7);
        // "Condition" header is longer than "New".
        assert!((widths[0] - 11.0).abs() < f64::EPSILON);
        assert!((widths[1] - TITLE_WIDTH).abs() < f64::EPSILON);
        // "20,000 JPY" is shorter than the "Original Price" header.
        assert!((widths[5] - 16.0).abs() < f64::EPSILON);
        let link_len = "https://www.amiami.com/eng/detail/?gcode=FIGURE-158000".len();
        assert!((widths[2] - (f64::from(u32::try_from(link_len).unwrap()) + 2.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn writes_workbook_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("sales.xlsx");
        let rows = vec![
            record("Nendoroid Frieren", 1_000, 2_000, 50.0).to_report_row(),
            record("figma Fern", 9_900, 11_000, 10.0).to_report_row(),
        ];

        write_xlsx(&path, &rows).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"PK"), "xlsx is a zip container");
    }

    #[test]
    fn writes_header_only_workbook() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("empty.xlsx");
        write_xlsx(&path, &[]).unwrap();
        assert!(path.is_file());
    }
}
