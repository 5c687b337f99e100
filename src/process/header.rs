// src/process/header.rs
use crate::decode::Cell;
use tracing::{trace, warn};

/// How many leading rows are considered when looking for the header.
pub const HEADER_SCAN_ROWS: usize = 20;

const ENTRY_DATE_KEYWORD: &str = "data_entrada";
const HEADER_KEYWORDS: [&str; 6] = ["data_entrada", "data", "placa", "cliente", "valor", "tipo"];
const MIN_KEYWORD_HITS: usize = 2;

/// Index of the first row (within the first [`HEADER_SCAN_ROWS`]) that looks like a header,
/// or `None` when nothing qualifies.
///
/// A row qualifies if its lower-cased cells mention `data_entrada`, or at least two of
/// the known column keywords.
pub fn locate_header_row(grid: &[Vec<Cell>]) -> Option<usize> {
    grid.iter()
        .take(HEADER_SCAN_ROWS)
        .position(|row| looks_like_header(row))
}

/// Where the data starts, and whether a header was actually recognised there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderRow {
    pub index: usize,
    pub detected: bool,
}

/// [`locate_header_row`], falling back to row 0.
pub fn header_row_or_default(grid: &[Vec<Cell>]) -> HeaderRow {
    match locate_header_row(grid) {
        Some(index) => {
            trace!(row = index, "header row located");
            HeaderRow {
                index,
                detected: true,
            }
        }
        None => {
            warn!(
                scanned = grid.len().min(HEADER_SCAN_ROWS),
                "no header row recognised; using row 0"
            );
            HeaderRow {
                index: 0,
                detected: false,
            }
        }
    }
}

fn looks_like_header(row: &[Cell]) -> bool {
    let haystack = row
        .iter()
        .map(|c| c.as_text().trim().to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");

    if haystack.contains(ENTRY_DATE_KEYWORD) {
        return true;
    }
    HEADER_KEYWORDS
        .iter()
        .filter(|k| haystack.contains(*k))
        .count()
        >= MIN_KEYWORD_HITS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<Cell> {
        cells.iter().map(|s| Cell::Text(s.to_string())).collect()
    }

    #[test]
    fn skips_banner_row() {
        let grid = vec![
            row(&["Relatório Mensal"]),
            row(&["Data_Entrada", "Placa", "Cliente", "Valor"]),
        ];
        assert_eq!(locate_header_row(&grid), Some(1));
    }

    #[test]
    fn two_keywords_are_enough() {
        let grid = vec![
            row(&["Despachante Silva"]),
            vec![],
            row(&["  PLACA ", "Modelo", "VALOR"]),
            row(&["ABC1234", "Gol", "100"]),
        ];
        assert_eq!(locate_header_row(&grid), Some(2));
        assert_eq!(
            header_row_or_default(&grid),
            HeaderRow {
                index: 2,
                detected: true
            }
        );
    }

    #[test]
    fn single_keyword_is_not() {
        let grid = vec![row(&["Placa", "Modelo", "Proprietário"])];
        assert_eq!(locate_header_row(&grid), None);
        assert_eq!(
            header_row_or_default(&grid),
            HeaderRow {
                index: 0,
                detected: false
            }
        );
    }

    #[test]
    fn only_scans_leading_rows() {
        let mut grid: Vec<Vec<Cell>> = (0..HEADER_SCAN_ROWS).map(|_| row(&["x"])).collect();
        grid.push(row(&["data_entrada", "placa"]));
        assert_eq!(locate_header_row(&grid), None);

        grid.remove(0);
        assert_eq!(locate_header_row(&grid), Some(HEADER_SCAN_ROWS - 1));
    }

    #[test]
    fn empty_grid_defaults_to_zero() {
        assert_eq!(header_row_or_default(&[]).index, 0);
        assert!(!header_row_or_default(&[]).detected);
    }
}
