//! Plain-text table rendering.
//!
//! Cells are padded to the widest value in their column; numeric cells are
//! right-aligned so amounts line up on the decimal point.

use std::borrow::Cow;
use std::fmt::Write as _;

use crate::{data::Value, frame::Frame};

/// A record type that knows how to lay itself out as one table row.
pub trait Tabular {
    fn headers() -> Vec<&'static str>;
    fn cells(&self) -> Vec<String>;
}

pub fn render_records<T: Tabular>(records: &[T]) -> String {
    let headers = T::headers().into_iter().map(str::to_string).collect::<Vec<_>>();
    let rows = records.iter().map(Tabular::cells).collect::<Vec<_>>();
    render_table(&headers, &rows)
}

pub fn render_frame(frame: &Frame) -> String {
    let rows = frame
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| cell.as_ref().map(format_value).unwrap_or_default())
                .collect()
        })
        .collect::<Vec<Vec<String>>>();
    render_table(frame.columns(), &rows)
}

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();
    let mut numeric = vec![!rows.is_empty(); column_count];

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(cell));
            numeric[idx] &= cell.is_empty() || looks_numeric(cell);
        }
    }

    let mut output = String::new();
    let header_line = format_row(headers, &widths, &vec![false; column_count]);
    let _ = writeln!(output, "{header_line}");

    let separator_cells = widths.iter().map(|w| "-".repeat((*w).max(3))).collect::<Vec<_>>();
    let separator_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<_>>();
    let separator_line = format_row(&separator_cells, &separator_widths, &vec![false; column_count]);
    let _ = writeln!(output, "{separator_line}");

    for row in rows {
        let row_line = format_row(row, &widths, &numeric);
        let _ = writeln!(output, "{row_line}");
    }
    output
}

/// Two-column `label  value` listing used for scalar summaries.
pub fn render_pairs(pairs: &[(&str, String)]) -> String {
    let width = pairs.iter().map(|(label, _)| display_width(label)).max().unwrap_or(0);
    let mut output = String::new();
    for (label, value) in pairs {
        let padding = width.saturating_sub(display_width(label));
        let _ = writeln!(output, "{label}{}  {value}", " ".repeat(padding));
    }
    output
}

pub fn format_value(value: &Value) -> String {
    match value {
        Value::Float(f) => format_number(*f),
        other => other.as_display(),
    }
}

/// Integral values without decimals, everything else with two.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

/// Fixed two decimals with thousands separators, e.g. `12,345.60`.
pub fn format_amount(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (idx, ch) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{fraction}")
}

fn looks_numeric(cell: &str) -> bool {
    let stripped: String = cell.chars().filter(|c| *c != ',' && *c != '%').collect();
    !stripped.is_empty() && stripped.parse::<f64>().is_ok()
}

fn format_row(values: &[String], widths: &[usize], right_align: &[bool]) -> String {
    let mut cells = Vec::with_capacity(values.len());
    for (idx, value) in values.iter().enumerate() {
        if idx >= widths.len() {
            break;
        }
        let sanitized = sanitize_cell(value);
        let padding = widths[idx].saturating_sub(display_width(sanitized.as_ref()));
        let cell = if right_align.get(idx).copied().unwrap_or(false) {
            format!("{}{}", " ".repeat(padding), sanitized)
        } else {
            format!("{}{}", sanitized, " ".repeat(padding))
        };
        cells.push(cell);
    }
    let mut line = cells.join("  ");
    while line.ends_with(' ') {
        line.pop();
    }
    line
}

fn display_width(value: &str) -> usize {
    let mut width = 0usize;
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            // Skip ANSI escape sequence (e.g. \x1b[31m)
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            width += 1;
        }
    }
    width
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
