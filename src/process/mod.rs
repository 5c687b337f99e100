// src/process/mod.rs
//! Turning decoded spreadsheet rows into service records: header detection,
//! column mapping, and date/currency normalisation.

pub mod currency;
pub mod date_parser;
pub mod fields;
pub mod header;
pub mod record;

pub use currency::parse_currency;
pub use date_parser::{parse_date, CanonicalDate};
pub use header::{header_row_or_default, locate_header_row, HeaderRow};
pub use record::{normalize_row, ServiceFields, ServiceRecord, DEFAULT_SERVICE_TYPE};
