// src/sink/mod.rs
use crate::process::ServiceRecord;
use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

pub mod rest;

pub use rest::RestSink;

/// Where imported services end up. One call per batch; an `Err` fails the whole batch.
#[async_trait]
pub trait ServiceSink: Send + Sync {
    async fn insert_batch(&self, records: &[ServiceRecord]) -> Result<()>;
}

/// Accepts every batch and only logs it.
#[derive(Debug, Default)]
pub struct DryRunSink;

#[async_trait]
impl ServiceSink for DryRunSink {
    async fn insert_batch(&self, records: &[ServiceRecord]) -> Result<()> {
        let first = records.first().map(|r| r.fields.date.as_str()).unwrap_or("-");
        info!(rows = records.len(), first_date = first, "dry run: batch accepted");
        Ok(())
    }
}
