use anyhow::Result;
use chrono::Local;
use clap::Parser;
use despachante_import::{
    config::Config,
    identity::Identity,
    import::{connect, ImportError, ImportSession, Progress, StatusKind, StatusMessage},
    process::ServiceFields,
    sink::{DryRunSink, ServiceSink},
};
use reqwest::Client;
use std::{
    fs,
    io::{self, BufRead, Write},
    path::PathBuf,
    process::ExitCode,
};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(author, version, about = "Importa uma planilha de serviços (CSV ou Excel)")]
struct Args {
    /// Spreadsheet to import (.csv, .xlsx, .xls, .ods)
    file: PathBuf,
    /// Log batches instead of sending them to the backend
    #[arg(long)]
    dry_run: bool,
    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    yes: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    // ─── 2) args + config ────────────────────────────────────────────
    let args = Args::parse();
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            return fail(ImportError::Configuration {
                reason: format!("{:#}", e),
            })
        }
    };
    let today = Local::now().date_naive();

    // ─── 3) decode + locate rows ─────────────────────────────────────
    let bytes = match fs::read(&args.file) {
        Ok(b) => b,
        Err(e) => {
            return fail(ImportError::DecodeFailure {
                reason: format!("reading {}: {}", args.file.display(), e),
            })
        }
    };
    let file_name = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let session = match ImportSession::from_bytes(&bytes, &file_name) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    if let Some(w) = session.warning() {
        print_status(w);
    }

    // ─── 4) preview + confirm ────────────────────────────────────────
    println!("{} registros encontrados.", session.row_count());
    print_preview(&session.preview(today));

    if !args.yes && !confirm(session.row_count())? {
        info!("import cancelled");
        return Ok(ExitCode::SUCCESS);
    }

    // ─── 5) sink + identity ──────────────────────────────────────────
    let (sink, identity): (Box<dyn ServiceSink>, Identity) = if args.dry_run {
        let id = config.user_id.clone().unwrap_or_else(|| "dry-run".to_string());
        (Box::new(DryRunSink), Identity::new(id))
    } else {
        match connect(&Client::new(), &config).await {
            Ok((sink, identity)) => {
                info!(endpoint = %sink.endpoint(), "inserting via REST");
                (Box::new(sink), identity)
            }
            Err(e) => return fail(e),
        }
    };

    // ─── 6) import ───────────────────────────────────────────────────
    let outcome = session
        .import(Some(&identity), sink.as_ref(), today, print_progress)
        .await;

    let status = match &outcome {
        Ok(report) => report.status(),
        Err(e) => {
            error!("{}", e);
            StatusMessage::from(e)
        }
    };
    print_status(&status);

    Ok(if status.kind == StatusKind::Error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Report an error that ends the run before anything was imported.
fn fail(e: ImportError) -> Result<ExitCode> {
    error!("{}", e);
    print_status(&StatusMessage::from(&e));
    Ok(ExitCode::FAILURE)
}

fn confirm(rows: usize) -> Result<bool> {
    print!(
        "Importar {} registros para o sistema? Esta ação adicionará todos os serviços da planilha à sua conta. [s/N] ",
        rows
    );
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "s" | "sim" | "y" | "yes"
    ))
}

fn print_progress(p: &Progress) {
    println!(
        "Importando... {} de {} ({} ok, {} erros)",
        p.processed, p.total, p.success, p.errors
    );
}

fn print_status(status: &StatusMessage) {
    let tag = match status.kind {
        StatusKind::Success => "OK",
        StatusKind::Warning => "AVISO",
        StatusKind::Error => "ERRO",
    };
    println!("[{}] {}", tag, status.text);
}

fn print_preview(rows: &[ServiceFields]) {
    println!("Pré-visualização (primeiros {} registros)", rows.len());
    println!(
        "{:<10}  {:<10}  {:<16}  {:>10}  {:<8}  {:<14}  {:<16}  {:<16}  {}",
        "data", "fim", "tipo", "valor", "placa", "modelo", "proprietário", "cliente", "despachante"
    );
    for r in rows {
        println!(
            "{:<10}  {:<10}  {:<16}  {:>10.2}  {:<8}  {:<14}  {:<16}  {:<16}  {}",
            r.date.as_str(),
            r.completion_date.as_ref().map(|d| d.as_str()).unwrap_or("-"),
            r.service_type,
            r.value,
            r.plate,
            r.model,
            r.owner,
            r.client,
            r.dispatcher
        );
    }
}
