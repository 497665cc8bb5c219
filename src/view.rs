//! Output side of the page: everything the user sees goes through `View`

use std::path::Path;

use crate::services::convert_service::{ConverterDisplay, CACHE_MARK};
use crate::services::hover_service::HoverOutcome;
use crate::services::table_service::TableSnapshot;
use crate::utils::table::{Align, Table};
use crate::utils::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Error,
}

/// A transient notification, replaced by the next one
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub level: ToastLevel,
    pub message: String,
}

/// Where the chart ended up after a draw
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSummary<'a> {
    pub caption: &'a str,
    pub points: usize,
    pub file: Option<&'a Path>,
}

pub trait View {
    fn show_table(&mut self, snapshot: &TableSnapshot);
    fn show_converter(&mut self, display: &ConverterDisplay);
    fn show_toast(&mut self, toast: &Toast);
    fn hide_toast(&mut self, id: u64);
    fn show_chart(&mut self, chart: &ChartSummary<'_>);
    fn show_hover(&mut self, outcome: &HoverOutcome);
    fn show_theme(&mut self, theme: Theme);
    /// Free-form output: help, quotes, links, suggestions
    fn show_text(&mut self, text: &str);
}

const COLUMN_ALIGNS: [Align; 7] = [
    Align::Right,
    Align::Left,
    Align::Left,
    Align::Left,
    Align::Right,
    Align::Right,
    Align::Right,
];

/// Table body plus the count line
pub fn render_table(snapshot: &TableSnapshot) -> String {
    let mut table = Table::new(snapshot.headers.as_slice()).with_aligns(&COLUMN_ALIGNS);
    for row in &snapshot.rows {
        table.add_row(row.as_slice());
    }

    let mut out = table.render();
    out.push_str(&format!("Shown {} of {}", snapshot.shown, snapshot.total));
    if snapshot.cached {
        out.push_str(CACHE_MARK);
    }
    out
}

/// Prints to stdout; logs stay on stderr
#[derive(Debug, Default)]
pub struct TerminalView;

impl View for TerminalView {
    fn show_table(&mut self, snapshot: &TableSnapshot) {
        println!("{}", render_table(snapshot));
    }

    fn show_converter(&mut self, display: &ConverterDisplay) {
        match display {
            ConverterDisplay::Idle => {}
            ConverterDisplay::Pending => println!("Converting..."),
            ConverterDisplay::Success(line) => println!("{}", line),
            ConverterDisplay::Error(line) => println!("[error] {}", line),
        }
    }

    fn show_toast(&mut self, toast: &Toast) {
        match toast.level {
            ToastLevel::Info => println!("{}", toast.message),
            ToastLevel::Error => println!("[error] {}", toast.message),
        }
    }

    // Terminal lines cannot be taken back
    fn hide_toast(&mut self, _id: u64) {}

    fn show_chart(&mut self, chart: &ChartSummary<'_>) {
        match chart.file {
            Some(file) => println!("📈 {} ({} points) -> {}", chart.caption, chart.points, file.display()),
            None => println!("📈 {} ({} points)", chart.caption, chart.points),
        }
    }

    fn show_hover(&mut self, outcome: &HoverOutcome) {
        if let HoverOutcome::Point { tooltip, .. } = outcome {
            println!(
                "{} @ ({:.0}, {:.0})",
                tooltip.text.replace('\n', "  "),
                tooltip.left,
                tooltip.top
            );
        }
    }

    fn show_theme(&mut self, theme: Theme) {
        println!("Theme: {}", if theme.is_dark() { "dark" } else { "light" });
    }

    fn show_text(&mut self, text: &str) {
        println!("{}", text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_table_with_count_line() {
        let snapshot = TableSnapshot {
            headers: vec!["#".to_string(), "id".to_string()],
            rows: vec![vec!["1".to_string(), "bitcoin".to_string()]],
            shown: 1,
            total: 3,
            cached: true,
            csv_link: None,
        };
        let out = render_table(&snapshot);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].contains("bitcoin"));
        assert_eq!(lines[3], "Shown 1 of 3 · кэш");
    }
}
