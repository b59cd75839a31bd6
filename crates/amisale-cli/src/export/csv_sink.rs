use std::path::Path;

use amisale_core::ReportRow;

/// Pipe-delimited CSV with a header row.
pub(crate) fn write_csv(path: &Path, rows: &[ReportRow]) -> anyhow::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'|')
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(ReportRow::HEADERS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::test_support::record;

    #[test]
    fn writes_header_and_rows() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("sales.csv");
        let rows = vec![
            record("Nendoroid Frieren", 1_000, 2_000, 50.0).to_report_row(),
            record("figma Fern", 9_900, 11_000, 10.0).to_report_row(),
        ];

        write_csv(&path, &rows).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "Condition|Title|Link|Image|Discounted Price|Original Price|Discount %"
        );
        assert_eq!(
            lines[1],
            "New|Nendoroid Frieren|https://www.amiami.com/eng/detail/?gcode=FIGURE-158000|\
             https://img.amiami.com/images/product/thumb300/FIGURE-158000.jpg|\
             1,000 JPY|2,000 JPY|50.00%"
        );
    }

    #[test]
    fn header_only_when_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("empty.csv");

        write_csv(&path, &[]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn pipe_in_title_survives_a_read_back() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("pipes.csv");
        let rows = vec![record("Figure | Limited Edition", 500, 1_000, 50.0).to_report_row()];

        write_csv(&path, &rows).unwrap();

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'|')
            .from_path(&path)
            .unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), ReportRow::HEADERS);
        let first = reader.records().next().unwrap().unwrap();
        assert_eq!(&first[1], "Figure | Limited Edition");
        assert_eq!(&first[6], "50.00%");
    }
}
