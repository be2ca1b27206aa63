//! Plain-text table rendering for list and detail output.

use crate::models::Listing;
use crate::paging::CollectionSource;
use crate::resolve::ReferenceLookup;
use crate::view::ListView;
use std::io::{self, Write};
use yansi::Paint;

const GAP: &str = "  ";

/// Terminal column width of `s`. Wide (CJK) characters take two cells.
pub fn display_width(s: &str) -> usize {
    s.chars().map(char_width).sum()
}

fn char_width(c: char) -> usize {
    match c as u32 {
        0x1100..=0x115F
        | 0x2E80..=0x303E
        | 0x3041..=0x33FF
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xA000..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6 => 2,
        _ => 1,
    }
}

fn pad(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(display_width(s));
    format!("{s}{}", " ".repeat(fill))
}

fn join_cells<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, &width)| pad(cell, width))
        .collect::<Vec<_>>()
        .join(GAP)
        .trim_end()
        .to_owned()
}

/// Lay out a header line plus one line per row, columns left-aligned.
/// Trailing whitespace is trimmed from every line.
pub fn layout_table(headers: &[&str], rows: &[Vec<String>]) -> (String, Vec<String>) {
    let mut widths: Vec<usize> = headers.iter().map(|h| display_width(h)).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(display_width(cell));
        }
    }

    let header = join_cells(headers.iter().copied(), &widths);
    let body = rows
        .iter()
        .map(|row| join_cells(row.iter().map(String::as_str), &widths))
        .collect();
    (header, body)
}

/// Color only when stdout and stderr are terminals and `NO_COLOR`/`CLICOLOR`
/// allow it.
pub fn init_colors() {
    yansi::whenever(yansi::Condition::TTY_AND_COLOR);
}

/// Print the current state of a list view: optional error banner, the
/// table, and a status line.
pub fn print_view<T, S, L>(view: &ListView<T, S, L>) -> io::Result<()>
where
    T: Listing,
    S: CollectionSource<T>,
    L: ReferenceLookup,
{
    let mut out = io::stdout().lock();
    if let Some(error) = view.error_banner() {
        writeln!(out, "{}", format!("error: {error}").red().bold())?;
    }

    let rows = view.rows();
    let (header, body) = layout_table(&view.headers(), &rows);
    writeln!(out, "{}", header.bold())?;
    if body.is_empty() {
        writeln!(out, "{}", "(no rows)".dim())?;
    }
    for line in body {
        writeln!(out, "{line}")?;
    }
    writeln!(out, "{}", view.status_line().dim())?;
    Ok(())
}

/// Print a single entity as aligned `key: value` lines.
pub fn print_entity(value: &serde_json::Value) -> io::Result<()> {
    let mut out = io::stdout().lock();
    let Some(fields) = value.as_object() else {
        writeln!(out, "{value}")?;
        return Ok(());
    };
    let width = fields.keys().map(|k| display_width(k)).max().unwrap_or(0);
    for (key, field) in fields {
        let text = match field {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => "-".to_owned(),
            other => other.to_string(),
        };
        writeln!(out, "{}  {text}", pad(key, width).bold())?;
    }
    Ok(())
}
