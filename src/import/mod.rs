// src/import/mod.rs
use crate::{
    config::Config,
    decode::{self, Cell, RawRow},
    identity::{resolve_identity, Identity},
    process::{self, normalize_row, ServiceFields, ServiceRecord},
    sink::{RestSink, ServiceSink},
};
use chrono::NaiveDate;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

pub mod batch;

pub use batch::{import_records, BatchFailure, BatchImporter, ImportReport, Progress, BATCH_SIZE};

/// Rows shown to the user before confirming.
pub const PREVIEW_ROWS: usize = 5;

const DECODE_FAILURE_TEXT: &str =
    "Erro ao ler o arquivo. Certifique-se que é um CSV ou Excel válido.";
const NO_DATA_TEXT: &str = "Nenhum dado encontrado no arquivo.";
const AUTH_MISSING_TEXT: &str = "Usuário não autenticado. Faça login para importar.";
const CONFIGURATION_TEXT: &str =
    "Servidor não configurado. Defina SUPABASE_URL e SUPABASE_ANON_KEY.";
const SEPARATOR_WARNING_TEXT: &str = "Detectado possível problema com separador (ponto e vírgula). Tentando processar, mas verifique a pré-visualização.";

/// Failures that stop an import before any row is written.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("could not decode the file: {reason}")]
    DecodeFailure { reason: String },
    #[error("no data rows found")]
    NoDataFound,
    #[error("no authenticated user")]
    AuthenticationMissing,
    #[error("backend is not configured: {reason}")]
    Configuration { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Success,
    Warning,
    Error,
}

/// A dismissable message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }
}

impl From<&ImportError> for StatusMessage {
    fn from(err: &ImportError) -> Self {
        match err {
            ImportError::DecodeFailure { .. } => StatusMessage::error(DECODE_FAILURE_TEXT),
            ImportError::NoDataFound => StatusMessage::error(NO_DATA_TEXT),
            ImportError::AuthenticationMissing => StatusMessage::error(AUTH_MISSING_TEXT),
            ImportError::Configuration { .. } => StatusMessage::error(CONFIGURATION_TEXT),
        }
    }
}

/// One uploaded file, decoded and projected, waiting for confirmation.
#[derive(Debug)]
pub struct ImportSession {
    rows: Vec<RawRow>,
    header_row: usize,
    header_detected: bool,
    warning: Option<StatusMessage>,
}

impl ImportSession {
    /// Decode `bytes` and locate its data rows.
    #[instrument(level = "info", skip(bytes), fields(file = %file_name, len = bytes.len()))]
    pub fn from_bytes(bytes: &[u8], file_name: &str) -> Result<Self, ImportError> {
        let grid = decode::decode(bytes, file_name).map_err(|e| {
            warn!(error = %format!("{:#}", e), "decode failed");
            ImportError::DecodeFailure {
                reason: format!("{:#}", e),
            }
        })?;
        Self::from_grid(&grid)
    }

    pub fn from_grid(grid: &[Vec<Cell>]) -> Result<Self, ImportError> {
        let header = process::header_row_or_default(grid);
        let rows = decode::project(grid, header.index);
        if rows.is_empty() {
            return Err(ImportError::NoDataFound);
        }

        let warning = separator_warning(&rows[0]);
        if warning.is_some() {
            warn!("single semicolon-joined column; the separator was probably not recognised");
        }
        info!(header_row = header.index, rows = rows.len(), "file ready for import");

        Ok(ImportSession {
            rows,
            header_row: header.index,
            header_detected: header.detected,
            warning,
        })
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn header_row(&self) -> usize {
        self.header_row
    }

    /// `false` when no row looked like a header and row 0 was used.
    pub fn header_detected(&self) -> bool {
        self.header_detected
    }

    pub fn warning(&self) -> Option<&StatusMessage> {
        self.warning.as_ref()
    }

    /// The first [`PREVIEW_ROWS`] rows as they would be imported.
    pub fn preview(&self, today: NaiveDate) -> Vec<ServiceFields> {
        self.rows
            .iter()
            .take(PREVIEW_ROWS)
            .map(|r| normalize_row(r, today))
            .collect()
    }

    pub async fn import<S, F>(
        &self,
        identity: Option<&Identity>,
        sink: &S,
        today: NaiveDate,
        on_progress: F,
    ) -> Result<ImportReport, ImportError>
    where
        S: ServiceSink + ?Sized,
        F: FnMut(&Progress),
    {
        run_import(&self.rows, identity, sink, today, on_progress).await
    }
}

fn separator_warning(first: &RawRow) -> Option<StatusMessage> {
    let mut headers = first.headers();
    match (headers.next(), headers.next()) {
        (Some(only), None) if only.contains(';') => {
            Some(StatusMessage::warning(SEPARATOR_WARNING_TEXT))
        }
        _ => None,
    }
}

/// Build the REST sink and work out who is importing.
///
/// Missing credentials are a [`ImportError::Configuration`]. Any failed identity lookup,
/// including an unreachable auth service, is reported as [`ImportError::AuthenticationMissing`].
pub async fn connect(client: &Client, config: &Config) -> Result<(RestSink, Identity), ImportError> {
    let sink = RestSink::from_config(client.clone(), config).map_err(|e| {
        error!(error = %format!("{:#}", e), "cannot build REST sink");
        ImportError::Configuration {
            reason: format!("{:#}", e),
        }
    })?;

    match resolve_identity(client, config).await {
        Ok(Some(identity)) => Ok((sink, identity)),
        Ok(None) => Err(ImportError::AuthenticationMissing),
        Err(e) => {
            error!(error = %format!("{:#}", e), "identity lookup failed");
            Err(ImportError::AuthenticationMissing)
        }
    }
}

/// Normalise `rows`, tag them with the importing user and insert them batch by batch.
///
/// Fails up front when there is nothing to import or nobody to import as; after that
/// batch failures only show up in the returned report.
#[instrument(level = "info", skip_all, fields(rows = rows.len()))]
pub async fn run_import<S, F>(
    rows: &[RawRow],
    identity: Option<&Identity>,
    sink: &S,
    today: NaiveDate,
    on_progress: F,
) -> Result<ImportReport, ImportError>
where
    S: ServiceSink + ?Sized,
    F: FnMut(&Progress),
{
    if rows.is_empty() {
        return Err(ImportError::NoDataFound);
    }
    let identity = identity.ok_or(ImportError::AuthenticationMissing)?;

    let records: Vec<ServiceRecord> = rows
        .iter()
        .map(|r| normalize_row(r, today).owned_by(identity.user_id.as_str()))
        .collect();

    let report = import_records(&records, sink, on_progress).await;
    info!(
        success = report.success,
        errors = report.errors,
        batches = report.batches,
        "import finished"
    );
    Ok(report)
}
