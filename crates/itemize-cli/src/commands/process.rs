//! Process command - extract line items from a single document.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use serde::Serialize;
use tracing::{debug, info, warn};

use itemize_core::{
    process_path, AuditRecord, CanonicalColumn, CanonicalRow, ExtractionContext, ItemizeConfig,
    ProcessedDocument, PureOcrEngine, TextRecognizer,
};

use super::config::load_config;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input document (PDF, or pre-extracted JSON)
    #[arg(required = true)]
    input: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Skip OCR for pages without native text
    #[arg(long)]
    no_ocr: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON with rows and audit
    Json,
    /// CSV of the canonical rows
    Csv,
    /// Plain text summary
    Text,
}

#[derive(Serialize)]
struct Report<'a> {
    rows: &'a [CanonicalRow],
    audit: &'a AuditRecord,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if args.no_ocr {
        config.ocr.enabled = false;
    }
    if let Some(model_dir) = &args.model_dir {
        config.models.model_dir = model_dir.clone();
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let input = args.input.clone();
    let processed = tokio::task::spawn_blocking(move || extract(&input, &config)).await??;

    for warning in &processed.audit.warnings {
        eprintln!("{} {}", style("⚠").yellow(), warning);
    }

    println!("{}", format_document(&processed, args.format)?);

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn extract(input: &Path, config: &ItemizeConfig) -> anyhow::Result<ProcessedDocument> {
    let engine = load_engine(config);
    let recognizer = engine.as_ref().map(|e| e as &dyn TextRecognizer);
    let ctx = ExtractionContext::from_config(&config.ocr, recognizer);

    Ok(process_path(input, &ctx)?)
}

/// Load the OCR engine, or run without OCR when it is disabled or unavailable.
fn load_engine(config: &ItemizeConfig) -> Option<PureOcrEngine> {
    if !config.ocr.enabled {
        debug!("OCR disabled");
        return None;
    }

    if !config.models.is_complete() {
        warn!(
            "OCR models not found at {}, continuing without OCR",
            config.models.model_dir.display()
        );
        return None;
    }

    match PureOcrEngine::from_config(config) {
        Ok(engine) => Some(engine),
        Err(e) => {
            warn!("Failed to load OCR models: {}, continuing without OCR", e);
            None
        }
    }
}

fn format_document(processed: &ProcessedDocument, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => {
            let report = Report {
                rows: &processed.dataset.rows,
                audit: &processed.audit,
            };
            Ok(serde_json::to_string_pretty(&report)?)
        }
        OutputFormat::Csv => format_csv(processed),
        OutputFormat::Text => Ok(format_text(&processed.audit)),
    }
}

fn format_csv(processed: &ProcessedDocument) -> anyhow::Result<String> {
    let columns: Vec<CanonicalColumn> = processed.dataset.columns.iter().copied().collect();
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header: Vec<&str> = columns.iter().map(|c| c.name()).collect();
    header.push("page_number");
    wtr.write_record(&header)?;

    for row in &processed.dataset.rows {
        let mut record: Vec<String> = columns
            .iter()
            .map(|&column| match column {
                CanonicalColumn::Description => row.description.clone().unwrap_or_default(),
                number => row.value(number).map(|v| v.to_string()).unwrap_or_default(),
            })
            .collect();
        record.push(row.page_number.to_string());
        wtr.write_record(&record)?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(audit: &AuditRecord) -> String {
    let mut output = String::new();
    let or_dash = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());

    output.push_str(&format!("File: {}\n", audit.file));
    output.push_str(&format!("Invoice: {}\n", or_dash(&audit.metadata.invoice_no)));
    output.push_str(&format!("Date: {}\n", or_dash(&audit.metadata.date)));
    output.push_str(&format!("Total: {}\n", or_dash(&audit.metadata.total)));
    output.push('\n');

    output.push_str(&format!("Pages with items: {}\n", audit.pages));
    output.push_str(&format!("Tables found: {}\n", audit.tables_found));
    if let Some(line_sum) = audit.line_sum {
        output.push_str(&format!("Line sum: {:.2}\n", line_sum));
    }

    let status = match audit.invoice_total_matches {
        Some(true) => "matches".to_string(),
        Some(false) => match audit.mismatch_amount {
            Some(amount) => format!("mismatch ({:+.2})", amount),
            None => "mismatch".to_string(),
        },
        None => "not reconciled".to_string(),
    };
    output.push_str(&format!("Reconciliation: {}\n", status));

    output
}
