use std::fmt::Write;

use crate::engine::{Binding, Term};

const MAX_CELL_WIDTH: usize = 50;

/// Text shown for a bound term in a result table.
pub fn cell_text(term: &Term) -> String {
    match term {
        Term::Uri { value } => format!("<{}>", value),
        Term::Bnode { value } => format!("_:{}", value),
        Term::Literal {
            value,
            lang: Some(lang),
            ..
        } => format!("\"{}\"@{}", value, lang),
        Term::Literal { value, .. } => value.clone(),
    }
}

/// Cell values for `row` in column order. Unbound variables render empty.
pub fn row_cells(columns: &[String], row: &Binding) -> Vec<String> {
    columns
        .iter()
        .map(|column| row.get(column).map(cell_text).unwrap_or_default())
        .collect()
}

/// Box-drawn table of `rows`. Cells wider than 50 characters are truncated.
pub fn render_table(columns: &[String], rows: &[Vec<String>]) -> String {
    let mut col_widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();

    for row in rows {
        for (col_idx, value) in row.iter().enumerate() {
            if col_idx < col_widths.len() {
                let display_len = value.chars().count().min(MAX_CELL_WIDTH);
                if display_len > col_widths[col_idx] {
                    col_widths[col_idx] = display_len;
                }
            }
        }
    }

    let mut out = String::new();
    border(&mut out, &col_widths, '┌', '┬', '┐');

    out.push('│');
    for (i, (col_name, width)) in columns.iter().zip(col_widths.iter()).enumerate() {
        if i > 0 {
            out.push('│');
        }
        let _ = write!(out, " {:<width$} ", col_name, width = *width);
    }
    out.push_str("│\n");

    border(&mut out, &col_widths, '├', '┼', '┤');

    for row in rows {
        out.push('│');
        for (col_idx, width) in col_widths.iter().enumerate() {
            if col_idx > 0 {
                out.push('│');
            }
            let value = match row.get(col_idx) {
                Some(val) if val.chars().count() > *width => {
                    format!("{}...", val.chars().take(width.saturating_sub(3)).collect::<String>())
                }
                Some(val) => val.clone(),
                None => String::new(),
            };
            let _ = write!(out, " {:<width$} ", value, width = *width);
        }
        out.push_str("│\n");
    }

    border(&mut out, &col_widths, '└', '┴', '┘');
    out
}

fn border(out: &mut String, widths: &[usize], left: char, joint: char, right: char) {
    out.push(left);
    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            out.push(joint);
        }
        out.push_str(&"─".repeat(width + 2));
    }
    out.push(right);
    out.push('\n');
}
