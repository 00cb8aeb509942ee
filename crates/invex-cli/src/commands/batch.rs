//! Batch processing command for multiple documents.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use invex_core::models::config::InvexConfig;
use invex_core::models::invoice::ExtractedInvoice;

use super::extract::{self, OutputFormat};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Ignore token geometry and extract from raw text only
    #[arg(long)]
    text_only: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    invoice: Option<ExtractedInvoice>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    // Load configuration
    let config = if let Some(path) = config_path {
        InvexConfig::from_file(std::path::Path::new(path))?
    } else {
        InvexConfig::default()
    };

    // Expand glob pattern
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            matches!(
                ext.to_lowercase().as_str(),
                "png" | "jpg" | "jpeg" | "tiff" | "tif" | "bmp" | "json" | "txt"
            )
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    // Create output directory if specified
    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    // Extraction is stateless per document, so the files fan out across
    // worker threads with no shared mutable state beyond the result sink.
    let results = process_files(&files, &config, &args, &progress);
    progress.finish_with_message("Complete");

    // Abort on the first error unless told otherwise.
    if !args.continue_on_error {
        if let Some(failed) = results.iter().find(|r| r.error.is_some()) {
            let message = failed.error.as_deref().unwrap_or("unknown error");
            error!("Failed to process {}: {}", failed.path.display(), message);
            anyhow::bail!("Processing failed: {}", message);
        }
    }

    // Write outputs
    let successful: Vec<&ProcessResult> = results.iter().filter(|r| r.invoice.is_some()).collect();
    let failed: Vec<&ProcessResult> = results.iter().filter(|r| r.error.is_some()).collect();

    for result in &successful {
        if let (Some(invoice), Some(output_dir)) = (&result.invoice, &args.output_dir) {
            let output_name = result
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("invoice");

            let extension = match args.format {
                OutputFormat::Json => "json",
                OutputFormat::Csv => "csv",
                OutputFormat::Text => "txt",
            };

            let output_path = output_dir.join(format!("{}.{}", output_name, extension));
            let content = extract::format_invoice(invoice, args.format)?;

            fs::write(&output_path, content)?;
            debug!("Wrote output to {}", output_path.display());
        }
    }

    // Generate summary if requested
    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    // Print summary
    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

/// Fan the files out over `jobs` worker threads; results come back in input
/// order.
fn process_files(
    files: &[PathBuf],
    config: &InvexConfig,
    args: &BatchArgs,
    progress: &ProgressBar,
) -> Vec<ProcessResult> {
    let next_index = AtomicUsize::new(0);
    let sink: Mutex<Vec<(usize, ProcessResult)>> = Mutex::new(Vec::with_capacity(files.len()));
    let workers = args.jobs.max(1).min(files.len());

    std::thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| {
                loop {
                    let index = next_index.fetch_add(1, Ordering::Relaxed);
                    let Some(path) = files.get(index) else {
                        break;
                    };

                    let file_start = Instant::now();
                    let outcome = extract::process_file(path, config, args.text_only);
                    let processing_time_ms = file_start.elapsed().as_millis() as u64;

                    let result = match outcome {
                        Ok(invoice) => ProcessResult {
                            path: path.clone(),
                            invoice: Some(invoice),
                            error: None,
                            processing_time_ms,
                        },
                        Err(e) => {
                            warn!("Failed to process {}: {}", path.display(), e);
                            ProcessResult {
                                path: path.clone(),
                                invoice: None,
                                error: Some(e.to_string()),
                                processing_time_ms,
                            }
                        }
                    };

                    sink.lock()
                        .unwrap_or_else(|e| e.into_inner())
                        .push((index, result));
                    progress.inc(1);
                }
            });
        }
    });

    let mut indexed = sink.into_inner().unwrap_or_else(|e| e.into_inner());
    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, result)| result).collect()
}

fn write_summary(path: &PathBuf, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    let processed_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

    wtr.write_record([
        "filename",
        "status",
        "invoice_number",
        "invoice_date",
        "vendor",
        "total",
        "currency",
        "item_count",
        "processing_time_ms",
        "processed_at",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        if let Some(invoice) = &result.invoice {
            wtr.write_record([
                filename.to_string(),
                "success".to_string(),
                invoice.invoice_number.clone().unwrap_or_default(),
                invoice.invoice_date.clone().unwrap_or_default(),
                invoice.vendor.clone().unwrap_or_default(),
                invoice
                    .total
                    .map(|t| format!("{:.2}", t))
                    .unwrap_or_default(),
                invoice.currency.clone(),
                invoice.items.len().to_string(),
                result.processing_time_ms.to_string(),
                processed_at.clone(),
                String::new(),
            ])?;
        } else {
            wtr.write_record([
                filename.to_string(),
                "error".to_string(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                result.processing_time_ms.to_string(),
                processed_at.clone(),
                result.error.clone().unwrap_or_default(),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
