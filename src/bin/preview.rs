// src/bin/preview.rs
// Print the first rows of a spreadsheet as they would be imported, without touching the backend.

use anyhow::{Context, Result};
use chrono::Local;
use despachante_import::import::{ImportSession, StatusMessage};
use serde_json::json;
use std::{env, fs, path::PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: preview <planilha.csv|.xlsx>")?;
    let bytes = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let out = match ImportSession::from_bytes(&bytes, &name) {
        Ok(session) => json!({
            "rows": session.row_count(),
            "header_row": session.header_row(),
            "header_detected": session.header_detected(),
            "warning": session.warning(),
            "preview": session.preview(Local::now().date_naive()),
        }),
        Err(e) => json!({ "status": StatusMessage::from(&e), "error": e.to_string() }),
    };

    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
