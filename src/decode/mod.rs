// src/decode/mod.rs
use anyhow::{Context, Result};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use csv::ReaderBuilder;
use encoding_rs::WINDOWS_1252;
use once_cell::sync::Lazy;
use regex::Regex;
use std::{borrow::Cow, fs, io::Cursor, path::Path};
use tracing::{debug, instrument, trace};

pub mod project;

pub use project::{project, RawRow};

/// A single decoded spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

/// Ordered rows of ordered cells, exactly as they appear in the first sheet.
pub type Grid = Vec<Vec<Cell>>;

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Render the cell the way it reads in the spreadsheet.
    /// Integral numbers drop their fractional part (`1234`, not `1234.0`).
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
        }
    }
}

static PLAIN_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?[0-9]+(\.[0-9]+)?$").expect("plain number regex is valid"));

const DELIMITER_CANDIDATES: [u8; 3] = [b',', b';', b'\t'];
const DELIMITER_SNIFF_LINES: usize = 20;

/// Read `path` fully into memory and decode it.
pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<Grid> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    decode(&bytes, &name)
}

/// Decode an uploaded file into a [`Grid`].
///
/// Workbooks (xlsx/xls/xlsb/ods) go through calamine and only the first sheet is read.
/// Anything else is treated as delimited text.
#[instrument(level = "debug", skip(bytes), fields(file = %file_name, len = bytes.len()))]
pub fn decode(bytes: &[u8], file_name: &str) -> Result<Grid> {
    let grid = if is_workbook(bytes, file_name) {
        decode_workbook(bytes)?
    } else {
        decode_csv(bytes)?
    };
    debug!(rows = grid.len(), "decoded grid");
    Ok(grid)
}

fn is_workbook(bytes: &[u8], file_name: &str) -> bool {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("xlsx" | "xlsm" | "xls" | "xlsb" | "ods") => true,
        Some("csv" | "txt") => false,
        // zip container (xlsx/ods) or OLE compound file (xls)
        _ => bytes.starts_with(b"PK\x03\x04") || bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0]),
    }
}

fn decode_workbook(bytes: &[u8]) -> Result<Grid> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).context("opening workbook")?;
    let range = workbook
        .worksheet_range_at(0)
        .context("workbook has no sheets")?
        .context("reading first sheet")?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(workbook_cell).collect())
        .collect())
}

fn workbook_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        // keep date cells as serials so they flow through the same path as numeric dates
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

fn decode_csv(bytes: &[u8]) -> Result<Grid> {
    let text = decode_text(bytes);
    let delimiter = sniff_delimiter(&text);
    trace!(delimiter = ?(delimiter as char), "sniffed delimiter");

    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut grid = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("CSV parse error at record {}", idx))?;
        grid.push(record.iter().map(csv_cell).collect());
    }
    Ok(grid)
}

/// UTF-8 when valid (minus any BOM), otherwise Windows-1252, which is what
/// Excel on Windows writes for "CSV (separado por vírgulas)".
fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => {
            let (cow, _, _) = WINDOWS_1252.decode(bytes);
            cow
        }
    }
}

/// Pick the candidate delimiter seen most often (outside quotes) in the leading lines.
fn sniff_delimiter(text: &str) -> u8 {
    let mut counts = [0usize; DELIMITER_CANDIDATES.len()];
    for line in text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(DELIMITER_SNIFF_LINES)
    {
        let mut in_quotes = false;
        for b in line.bytes() {
            if b == b'"' {
                in_quotes = !in_quotes;
            } else if !in_quotes {
                if let Some(i) = DELIMITER_CANDIDATES.iter().position(|&d| d == b) {
                    counts[i] += 1;
                }
            }
        }
    }

    let mut best = 0;
    for i in 1..counts.len() {
        if counts[i] > counts[best] {
            best = i;
        }
    }
    DELIMITER_CANDIDATES[best]
}

fn csv_cell(field: &str) -> Cell {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Cell::Empty;
    }
    if PLAIN_NUMBER.is_match(trimmed) {
        if let Ok(n) = trimmed.parse::<f64>() {
            return Cell::Number(n);
        }
    }
    Cell::Text(field.to_string())
}
