use std::fmt::{self, Write};

/// Cells wider than this are cut short and end with `...`.
const MAX_CELL_WIDTH: usize = 60;

pub(crate) struct Row {
    cells: Vec<String>,
}

impl Row {
    fn is_awk_safe(&self) -> bool {
        self.cells
            .iter()
            .all(|cell| !cell.contains(|c: char| c.is_whitespace()))
    }

    fn columns(&self) -> usize {
        self.cells.len()
    }
}

pub(crate) trait IntoRow: Into<Row> + Sized {
    fn into_row(self) -> Row {
        self.into()
    }
}

impl<T> IntoRow for T where T: Into<Row> + Sized {}

impl From<Vec<String>> for Row {
    fn from(value: Vec<String>) -> Self {
        Row { cells: value }
    }
}

impl From<Vec<&str>> for Row {
    fn from(value: Vec<&str>) -> Self {
        let value: Vec<String> = value.into_iter().map(|s| s.to_owned()).collect();

        value.into()
    }
}

fn width(cell: &str) -> usize {
    cell.chars().count()
}

/// Newlines and tabs would break the layout, banners are full of them.
fn clean_cell(cell: &str) -> String {
    let flat: String = cell
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();

    if width(&flat) <= MAX_CELL_WIDTH {
        return flat;
    }

    let mut cut: String = flat.chars().take(MAX_CELL_WIDTH - 3).collect();
    cut.push_str("...");
    cut
}

/// A whitespace-aligned table. Rows shorter than the header are padded with
/// empty cells, longer rows are cut.
pub(crate) struct Table {
    body: Vec<Row>,
    header: Row,
    print_header: bool,
}

impl Table {
    pub(crate) fn new<S: IntoRow>(header: S) -> Table {
        let header = header.into_row();

        debug_assert!(header.is_awk_safe(), "table header contains whitespace");

        Table {
            body: Vec::new(),
            header,
            print_header: true,
        }
    }

    pub(crate) fn print_header(&mut self, print_header: bool) {
        self.print_header = print_header;
    }

    pub(crate) fn add_row<S: IntoRow>(&mut self, row: S) {
        let mut row = row.into_row();

        row.cells.resize(self.header.columns(), String::new());

        for cell in row.cells.iter_mut() {
            *cell = clean_cell(cell);
        }

        self.body.push(row);
    }

    fn visible_rows(&self) -> impl Iterator<Item = &Row> {
        let header = if self.print_header {
            Some(&self.header)
        } else {
            None
        };

        header.into_iter().chain(self.body.iter())
    }

    fn column_widths(&self) -> Vec<usize> {
        let mut widths = vec![0usize; self.header.columns()];

        for row in self.visible_rows() {
            for (i, cell) in row.cells.iter().enumerate() {
                widths[i] = widths[i].max(width(cell));
            }
        }

        widths
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let widths = self.column_widths();

        for row in self.visible_rows() {
            let last = row.cells.len().saturating_sub(1);

            for (i, cell) in row.cells.iter().enumerate() {
                if i == last {
                    // no trailing padding
                    f.write_str(cell)?;
                } else {
                    f.write_fmt(format_args!("{:<width$}  ", cell, width = widths[i]))?;
                }
            }

            f.write_char('\n')?;
        }

        Ok(())
    }
}

pub(crate) trait IntoTable: Into<Table> + Sized {
    fn into_table(self) -> Table {
        self.into()
    }
}

impl<T> IntoTable for T where T: Into<Table> + Sized {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment() {
        let mut tab = Table::new(vec!["IP", "PORT", "ORG"]);
        tab.add_row(vec!["192.0.2.1", "22", "Example Org"]);
        tab.add_row(vec!["10.0.0.1", "8080", "Other"]);

        assert_eq!(
            tab.to_string(),
            "IP         PORT  ORG\n\
             192.0.2.1  22    Example Org\n\
             10.0.0.1   8080  Other\n"
        );
    }

    #[test]
    fn test_headerless() {
        let mut tab = Table::new(vec!["PORT"]);
        tab.add_row(vec!["443"]);
        tab.print_header(false);

        assert_eq!(tab.to_string(), "443\n");
    }

    #[test]
    fn test_short_rows_are_padded_and_cells_cleaned() {
        let mut tab = Table::new(vec!["A", "B"]);
        tab.add_row(vec!["x\r\ny"]);
        tab.add_row(vec!["z".repeat(100)]);

        let out = tab.to_string();
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[1].trim_end(), "x  y");
        assert!(lines[2].contains("..."));
        assert_eq!(lines[2].trim_end().chars().count(), MAX_CELL_WIDTH);
    }
}
