use super::Cell;
use std::collections::HashMap;

const EMPTY_HEADER: &str = "__EMPTY";

/// One data row keyed by the header text of its column.
///
/// Keys keep the exact spelling of the header row (no trimming or case folding)
/// and are unique within a row. Empty cells are not stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: Vec<(String, Cell)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, header: impl Into<String>, cell: Cell) {
        self.cells.push((header.into(), cell));
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Headers in column order.
    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(h, _)| h.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.cells.iter().map(|(h, c)| (h.as_str(), c))
    }

    /// Exact-match lookup on the raw header text.
    pub fn get(&self, header: &str) -> Option<&Cell> {
        self.cells.iter().find(|(h, _)| h == header).map(|(_, c)| c)
    }
}

impl<K: Into<String>> FromIterator<(K, Cell)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, Cell)>>(iter: I) -> Self {
        let mut row = RawRow::new();
        for (k, c) in iter {
            if !c.is_empty() {
                row.push(k, c);
            }
        }
        row
    }
}

/// Use `grid[start]` as the header row and turn every later row into a [`RawRow`].
///
/// Rows without a single non-empty cell are dropped. An out-of-range `start`
/// yields no rows.
pub fn project(grid: &[Vec<Cell>], start: usize) -> Vec<RawRow> {
    let Some(header_row) = grid.get(start) else {
        return Vec::new();
    };
    let width = grid[start..].iter().map(Vec::len).max().unwrap_or(0);
    let headers = header_names(header_row, width);

    grid[start + 1..]
        .iter()
        .map(|row| {
            headers
                .iter()
                .zip(row.iter())
                .map(|(h, c)| (h.clone(), c.clone()))
                .collect::<RawRow>()
        })
        .filter(|row| !row.is_empty())
        .collect()
}

/// Header names for `width` columns: blanks become `__EMPTY`, and repeats get
/// a `_1`, `_2`, … suffix so that every key stays unique.
fn header_names(row: &[Cell], width: usize) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    (0..width)
        .map(|i| {
            let base = match row.get(i).map(Cell::as_text) {
                Some(t) if !t.trim().is_empty() => t,
                _ => EMPTY_HEADER.to_string(),
            };
            let n = seen.entry(base.clone()).or_insert(0);
            let name = if *n == 0 {
                base
            } else {
                format!("{}_{}", base, n)
            };
            *n += 1;
            name
        })
        .collect()
}
