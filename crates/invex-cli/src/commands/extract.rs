//! Extract command - pull structured fields from a single document.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use invex_core::models::config::InvexConfig;
use invex_core::models::invoice::ExtractedInvoice;
use invex_core::ocr::{OcrCapture, OcrProvider, TesseractOcr};
use invex_core::invoice::extract_invoice;

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input file: an image (runs OCR), a capture dump (.json), or raw text (.txt)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Ignore token geometry and extract from raw text only
    #[arg(long)]
    text_only: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    // Load configuration
    let config = if let Some(path) = config_path {
        InvexConfig::from_file(Path::new(path))?
    } else {
        InvexConfig::default()
    };

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );

    spinner.set_message("Extracting...");
    let invoice = process_file(&args.input, &config, args.text_only)?;
    spinner.finish_and_clear();

    let output = format_invoice(&invoice, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Load a capture for `path` and run the extraction engine over it.
pub fn process_file(
    path: &Path,
    config: &InvexConfig,
    text_only: bool,
) -> anyhow::Result<ExtractedInvoice> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let mut capture = match extension.as_str() {
        // A previously captured token dump.
        "json" => {
            let content = fs::read_to_string(path)?;
            serde_json::from_str::<OcrCapture>(&content)
                .map_err(|e| anyhow::anyhow!("invalid capture dump: {}", e))?
        }
        // Raw transcription only: the fallback path.
        "txt" => OcrCapture::from_text(fs::read_to_string(path)?),
        "png" | "jpg" | "jpeg" | "tiff" | "tif" | "bmp" => {
            let provider = TesseractOcr::new(config.ocr.clone());
            provider.capture(path)?
        }
        _ => anyhow::bail!("Unsupported file format: {}", extension),
    };

    if text_only {
        capture.tokens.clear();
    }

    debug!(
        "capture: {} tokens, {} chars of text",
        capture.tokens.len(),
        capture.text.len()
    );

    Ok(extract_invoice(&capture, &config.extraction))
}

pub fn format_invoice(invoice: &ExtractedInvoice, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(invoice)?),
        OutputFormat::Csv => format_csv(invoice),
        OutputFormat::Text => Ok(format_text(invoice)),
    }
}

fn format_csv(invoice: &ExtractedInvoice) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    // Write header
    wtr.write_record([
        "invoice_number",
        "invoice_date",
        "due_date",
        "vendor",
        "bill_to_name",
        "purchase_order",
        "subtotal",
        "tax",
        "discount",
        "total",
        "currency",
        "item_count",
    ])?;

    // Write data
    wtr.write_record([
        invoice.invoice_number.clone().unwrap_or_default(),
        invoice.invoice_date.clone().unwrap_or_default(),
        invoice.due_date.clone().unwrap_or_default(),
        invoice.vendor.clone().unwrap_or_default(),
        invoice.bill_to_name.clone().unwrap_or_default(),
        invoice.purchase_order.clone().unwrap_or_default(),
        amount_cell(invoice.subtotal),
        amount_cell(invoice.tax),
        amount_cell(invoice.discount),
        amount_cell(invoice.total),
        invoice.currency.clone(),
        invoice.items.len().to_string(),
    ])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn amount_cell(amount: Option<f64>) -> String {
    amount.map(|a| format!("{:.2}", a)).unwrap_or_default()
}

fn format_text(invoice: &ExtractedInvoice) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Invoice: {}\n",
        invoice.invoice_number.as_deref().unwrap_or("-")
    ));
    output.push_str(&format!(
        "Date: {}\n",
        invoice.invoice_date.as_deref().unwrap_or("-")
    ));
    if let Some(due_date) = &invoice.due_date {
        output.push_str(&format!("Due: {}\n", due_date));
    }
    output.push('\n');

    output.push_str("Vendor:\n");
    output.push_str(&format!(
        "  {}\n",
        invoice.vendor.as_deref().unwrap_or("-")
    ));
    if let Some(address) = &invoice.vendor_address {
        output.push_str(&format!("  {}\n", address));
    }
    if let Some(email) = &invoice.vendor_email {
        output.push_str(&format!("  {}\n", email));
    }
    if let Some(phone) = &invoice.vendor_phone {
        output.push_str(&format!("  {}\n", phone));
    }
    output.push('\n');

    if invoice.bill_to_name.is_some() || invoice.bill_to_address.is_some() {
        output.push_str("Bill to:\n");
        if let Some(name) = &invoice.bill_to_name {
            output.push_str(&format!("  {}\n", name));
        }
        if let Some(address) = &invoice.bill_to_address {
            output.push_str(&format!("  {}\n", address));
        }
        output.push('\n');
    }

    if !invoice.items.is_empty() {
        output.push_str("Items:\n");
        for item in &invoice.items {
            output.push_str(&format!(
                "  {} x{} @ {} = {}\n",
                item.description,
                item.quantity.map(|q| q.to_string()).unwrap_or_else(|| "-".to_string()),
                amount_cell(item.unit_price),
                amount_cell(item.total_price),
            ));
        }
        output.push('\n');
    }

    output.push_str("Summary:\n");
    output.push_str(&format!(
        "  Subtotal: {} {}\n",
        amount_cell(invoice.subtotal),
        invoice.currency
    ));
    output.push_str(&format!(
        "  Tax:      {} {}\n",
        amount_cell(invoice.tax),
        invoice.currency
    ));
    output.push_str(&format!(
        "  Total:    {} {}\n",
        amount_cell(invoice.total),
        invoice.currency
    ));

    output
}
