use std::fmt::Write as _;
use std::path::Path;

use amisale_core::ReportRow;

pub(crate) const HEADING: &str = "### AmiAmi Discounted Figures";

/// Markdown table; the image column renders the picture, the link column a
/// `[Link](..)` anchor.
pub(crate) fn write_markdown(path: &Path, rows: &[ReportRow]) -> anyhow::Result<()> {
    std::fs::write(path, render_markdown(rows))?;
    Ok(())
}

pub(crate) fn render_markdown(rows: &[ReportRow]) -> String {
    let mut out = String::new();
    out.push_str(HEADING);
    out.push_str("\n\n");
    push_row(&mut out, ReportRow::HEADERS.iter().map(|h| (*h).to_owned()));
    push_row(&mut out, ReportRow::HEADERS.iter().map(|_| "---".to_owned()));

    for row in rows {
        push_row(
            &mut out,
            [
                escape_cell(&row.condition),
                escape_cell(&row.title),
                format!("[Link]({})", escape_url(&row.link)),
                format!("![]({})", escape_url(&row.image)),
                escape_cell(&row.discounted_price),
                escape_cell(&row.original_price),
                escape_cell(&row.discount),
            ],
        );
    }
    out
}

fn push_row(out: &mut String, cells: impl IntoIterator<Item = String>) {
    out.push('|');
    for cell in cells {
        let _ = write!(out, " {cell} |");
    }
    out.push('\n');
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Percent-encodes the characters that end a table cell or a link target.
fn escape_url(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for c in url.chars() {
        match c {
            '|' => out.push_str("%7C"),
            '(' => out.push_str("%28"),
            ')' => out.push_str("%29"),
            ' ' => out.push_str("%20"),
            '<' => out.push_str("%3C"),
            '>' => out.push_str("%3E"),
            _ => out.push(c),
        }
    }
    out
}
