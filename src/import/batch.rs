use super::StatusMessage;
use crate::{process::ServiceRecord, sink::ServiceSink};
use anyhow::Result;
use serde::Serialize;
use tracing::{info, warn};

/// Rows per insert call.
pub const BATCH_SIZE: usize = 50;

/// Running totals, reported after every batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
    pub success: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    /// Zero-based batch number.
    pub batch: usize,
    pub rows: usize,
    pub reason: String,
}

/// Final accounting of an import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub total: usize,
    pub success: usize,
    pub errors: usize,
    pub batches: usize,
    pub failed_batches: Vec<BatchFailure>,
}

impl ImportReport {
    pub fn is_complete_success(&self) -> bool {
        self.errors == 0
    }

    pub fn status(&self) -> StatusMessage {
        if self.is_complete_success() {
            StatusMessage::success(format!(
                "{} serviços importados com sucesso!",
                self.success
            ))
        } else {
            StatusMessage::warning(format!(
                "Importação concluída. {} sucessos, {} erros.",
                self.success, self.errors
            ))
        }
    }
}

/// Accumulates per-batch outcomes into [`Progress`] and, at the end, an [`ImportReport`].
///
/// Feeding outcomes in is decoupled from talking to the sink so the accounting can be
/// exercised on its own.
#[derive(Debug)]
pub struct BatchImporter {
    batch_size: usize,
    progress: Progress,
    batch_index: usize,
    failed: Vec<BatchFailure>,
}

impl BatchImporter {
    pub fn new(total: usize) -> Self {
        Self::with_batch_size(total, BATCH_SIZE)
    }

    pub fn with_batch_size(total: usize, batch_size: usize) -> Self {
        BatchImporter {
            batch_size: batch_size.max(1),
            progress: Progress {
                total,
                ..Progress::default()
            },
            batch_index: 0,
            failed: Vec::new(),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    /// Count one batch of `rows` records. A failed batch counts all of its rows as errors.
    pub fn record_batch(&mut self, rows: usize, outcome: Result<()>) -> Progress {
        match outcome {
            Ok(()) => {
                self.progress.success += rows;
                info!(batch = self.batch_index, rows, "batch imported");
            }
            Err(e) => {
                self.progress.errors += rows;
                warn!(batch = self.batch_index, rows, error = %format!("{:#}", e), "batch failed");
                self.failed.push(BatchFailure {
                    batch: self.batch_index,
                    rows,
                    reason: format!("{:#}", e),
                });
            }
        }
        self.progress.processed = (self.progress.processed + self.batch_size).min(self.progress.total);
        self.batch_index += 1;
        self.progress
    }

    pub fn finish(self) -> ImportReport {
        ImportReport {
            total: self.progress.total,
            success: self.progress.success,
            errors: self.progress.errors,
            batches: self.batch_index,
            failed_batches: self.failed,
        }
    }
}

/// Send `records` to `sink` in consecutive batches of [`BATCH_SIZE`].
///
/// Each batch is awaited before the next one starts. A failed batch is counted and
/// skipped; nothing is retried and earlier batches stay committed.
pub async fn import_records<S, F>(records: &[ServiceRecord], sink: &S, mut on_progress: F) -> ImportReport
where
    S: ServiceSink + ?Sized,
    F: FnMut(&Progress),
{
    let mut importer = BatchImporter::new(records.len());
    for chunk in records.chunks(importer.batch_size()) {
        let outcome = sink.insert_batch(chunk).await;
        let progress = importer.record_batch(chunk.len(), outcome);
        on_progress(&progress);
    }
    importer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::StatusKind;
    use anyhow::anyhow;

    #[test]
    fn progress_advances_by_batch_and_caps_at_total() {
        let mut importer = BatchImporter::new(120);
        assert_eq!(importer.record_batch(50, Ok(())).processed, 50);
        assert_eq!(importer.record_batch(50, Err(anyhow!("boom"))).processed, 100);

        let last = importer.record_batch(20, Ok(()));
        assert_eq!(
            last,
            Progress {
                processed: 120,
                total: 120,
                success: 70,
                errors: 50
            }
        );

        let report = importer.finish();
        assert_eq!(report.batches, 3);
        assert_eq!(report.failed_batches.len(), 1);
        assert_eq!(report.failed_batches[0].batch, 1);
        assert_eq!(report.failed_batches[0].reason, "boom");
    }

    #[test]
    fn status_messages() {
        let ok = BatchImporter::new(0).finish();
        assert_eq!(ok.status().kind, StatusKind::Success);
        assert_eq!(ok.status().text, "0 serviços importados com sucesso!");

        let mut importer = BatchImporter::new(3);
        importer.record_batch(3, Err(anyhow!("rls violation")));
        let status = importer.finish().status();
        assert_eq!(status.kind, StatusKind::Warning);
        assert_eq!(status.text, "Importação concluída. 0 sucessos, 3 erros.");
    }

    #[test]
    fn zero_batch_size_is_clamped() {
        assert_eq!(BatchImporter::with_batch_size(10, 0).batch_size(), 1);
    }
}
