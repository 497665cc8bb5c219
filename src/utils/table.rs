/// Column alignment inside a rendered table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// A simple text-based table generator for terminal output
pub struct Table {
    headers: Vec<String>,
    aligns: Vec<Align>,
    rows: Vec<Vec<String>>,
    col_widths: Vec<usize>,
}

impl Table {
    /// Create a new table with the given headers, all left aligned
    pub fn new<S: AsRef<str>>(headers: &[S]) -> Self {
        let headers: Vec<String> = headers.iter().map(|h| h.as_ref().to_string()).collect();
        let col_widths = headers.iter().map(|h| h.chars().count()).collect();
        Table {
            aligns: vec![Align::Left; headers.len()],
            headers,
            rows: Vec::new(),
            col_widths,
        }
    }

    /// Override alignment per column
    pub fn with_aligns(mut self, aligns: &[Align]) -> Self {
        for (i, align) in aligns.iter().enumerate().take(self.aligns.len()) {
            self.aligns[i] = *align;
        }
        self
    }

    /// Add a row to the table
    pub fn add_row<S: AsRef<str>>(&mut self, row: &[S]) {
        let row_strings: Vec<String> = row.iter().map(|s| s.as_ref().to_string()).collect();

        // Widths are in chars, placeholders and arrows are multi-byte
        for (i, col) in row_strings.iter().enumerate() {
            if i < self.col_widths.len() {
                self.col_widths[i] = self.col_widths[i].max(col.chars().count());
            }
        }

        self.rows.push(row_strings);
    }

    /// Render the table as a formatted string
    pub fn render(&self) -> String {
        let mut output = String::new();

        output.push_str(&self.render_row(&self.headers));
        output.push('\n');

        output.push_str(&self.render_separator());
        output.push('\n');

        for row in &self.rows {
            output.push_str(&self.render_row(row));
            output.push('\n');
        }

        output
    }

    /// Render a single row with proper spacing
    fn render_row(&self, row: &[String]) -> String {
        let mut line = String::new();
        for (i, col) in row.iter().enumerate() {
            if i < self.col_widths.len() {
                let width = self.col_widths[i];
                match self.aligns[i] {
                    Align::Left => line.push_str(&format!("{:<width$}", col, width = width)),
                    Align::Right => line.push_str(&format!("{:>width$}", col, width = width)),
                }
                if i < row.len() - 1 {
                    line.push_str(" | ");
                }
            }
        }
        line.trim_end().to_string()
    }

    /// Render a separator line
    fn render_separator(&self) -> String {
        let mut line = String::new();
        for (i, &width) in self.col_widths.iter().enumerate() {
            line.push_str(&"-".repeat(width));
            if i < self.col_widths.len() - 1 {
                line.push_str("-+-");
            }
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_table() {
        let mut table = Table::new(&["#", "Name", "Price"]).with_aligns(&[Align::Right, Align::Left, Align::Right]);
        table.add_row(&["1", "Bitcoin", "65000.123400"]);
        table.add_row(&["2", "Ethereum", "—"]);

        let rendered = table.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("# | Name"));
        assert!(lines[2].contains("Bitcoin"));
        assert!(lines[3].ends_with(&format!("{}—", " ".repeat(11))));
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn test_widths_count_chars() {
        let mut table = Table::new(&["Rank ▲"]);
        table.add_row(&["—"]);
        let rendered = table.render();
        assert_eq!(rendered.lines().nth(1), Some("------"));
    }
}
