//! Pipe-table rendering. The first row is the header, a dash separator
//! row is synthesized beneath it, and every row is padded to the column
//! count of the widest row.

use crate::blocks::{Block, BlockKind};

use super::inline::render_runs;

pub fn render(rows: &[Block]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .filter_map(|b| match &b.kind {
            BlockKind::TableRow { table_row } => Some(
                table_row
                    .cells
                    .iter()
                    .map(|cell| render_runs(cell).trim().to_string())
                    .collect(),
            ),
            _ => None,
        })
        .collect();

    let Some(width) = cells.iter().map(Vec::len).max() else {
        return String::new();
    };

    let mut rows = cells.into_iter();
    let header = rows.next().unwrap_or_default();

    let mut out = String::new();
    out.push_str(&line(&pad(header, width)));
    out.push_str(&line(&vec!["---".to_string(); width]));
    for row in rows {
        out.push_str(&line(&pad(row, width)));
    }
    out.push('\n');
    out
}

fn pad(mut row: Vec<String>, width: usize) -> Vec<String> {
    row.resize(width, String::new());
    row
}

fn line(cells: &[String]) -> String {
    format!("| {} |\n", cells.join(" | "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::make;

    #[test]
    fn header_separator_and_rows() {
        let out = render(&[
            make::row("r1", &["Name", "Role"]),
            make::row("r2", &["Ada", "Engineer"]),
        ]);
        assert_eq!(
            out,
            "| Name | Role |\n| --- | --- |\n| Ada | Engineer |\n\n"
        );
    }

    #[test]
    fn rows_pad_to_the_widest() {
        let out = render(&[
            make::row("r1", &["a"]),
            make::row("r2", &["b", "c", "d"]),
        ]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "| a |  |  |");
        assert_eq!(lines[1], "| --- | --- | --- |");
        assert_eq!(lines[2], "| b | c | d |");
        // One dash group per column of the widest row.
        assert_eq!(lines[1].matches("---").count(), 3);
    }

    #[test]
    fn cells_are_trimmed() {
        let out = render(&[make::row("r1", &["  padded  ", "x"])]);
        assert!(out.starts_with("| padded | x |\n"));
    }

    #[test]
    fn no_rows_renders_nothing() {
        assert_eq!(render(&[]), "");
        assert_eq!(render(&[make::para("p", "not a row")]), "");
    }
}
