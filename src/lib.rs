//! Spreadsheet import for the despachante service log: decode an uploaded CSV or
//! workbook, find its header row, map localised columns onto service records and
//! insert them in batches.

pub mod config;
pub mod decode;
pub mod identity;
pub mod import;
pub mod process;
pub mod sink;

#[cfg(test)]
pub(crate) mod test_support;
