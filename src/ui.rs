//! Terminal output helpers.
//!
//! - `Table` - boxed table sized to its content, cells may carry colors
//! - `warn` / `success` - one-line status messages with a marker glyph

use colored::*;
use console::{Alignment, measure_text_width, pad_str, truncate_str};

/// Cells wider than this are truncated with an ellipsis.
const MAX_CELL_WIDTH: usize = 60;

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Rows with the wrong number of cells are ignored.
    pub fn add_row(&mut self, row: Vec<String>) {
        if row.len() == self.headers.len() {
            self.rows.push(row);
        }
    }

    pub fn render(&self) -> String {
        if self.headers.is_empty() {
            return String::new();
        }

        let widths: Vec<usize> = (0..self.headers.len())
            .map(|i| {
                self.rows
                    .iter()
                    .map(|r| measure_text_width(&r[i]))
                    .chain(std::iter::once(measure_text_width(&self.headers[i])))
                    .max()
                    .unwrap_or(0)
                    .min(MAX_CELL_WIDTH)
            })
            .collect();

        let border = |left: &str, mid: &str, right: &str| -> String {
            let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("  {}{}{}", left, segments.join(mid), right)
        };
        let line = |cells: &[String], bold: bool| -> String {
            let padded: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(cell, &w)| {
                    let clean = cell.replace(['\n', '\r', '\t'], " ");
                    let cut = truncate_str(&clean, w, "...");
                    let text = pad_str(&cut, w, Alignment::Left, None).to_string();
                    if bold { text.bold().to_string() } else { text }
                })
                .collect();
            format!("  │ {} │", padded.join(" │ "))
        };

        let mut out = vec![border("┌", "┬", "┐"), line(&self.headers, true)];
        out.push(border("├", "┼", "┤"));
        out.extend(self.rows.iter().map(|r| line(r, false)));
        out.push(border("└", "┴", "┘"));
        out.join("\n")
    }

    pub fn print(&self) {
        println!("{}", self.render());
    }
}

pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn warn(msg: &str) {
    println!("{} {}", "!".yellow(), msg);
}
