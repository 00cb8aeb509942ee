//! Tesseract subprocess provider.
//!
//! Shells out to the `tesseract` binary twice per document: once for
//! word-level TSV (geometry and confidence) and once for the flattened
//! transcription. Both invocations run under a hard timeout so a hung
//! engine cannot block the caller.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use super::{OcrCapture, OcrProvider, Token};
use crate::error::OcrError;
use crate::models::config::OcrConfig;

/// OCR provider backed by the `tesseract` command-line binary.
pub struct TesseractOcr {
    config: OcrConfig,
}

impl TesseractOcr {
    /// Create a provider with the given configuration.
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }

    fn command_path(&self) -> String {
        self.config
            .command
            .clone()
            .or_else(|| std::env::var("TESSERACT_CMD").ok())
            .unwrap_or_else(|| "tesseract".to_string())
    }

    /// Run one tesseract pass and return its stdout.
    fn run(&self, path: &Path, tsv: bool) -> Result<String, OcrError> {
        let program = self.command_path();
        let mut command = Command::new(&program);
        command
            .arg(path)
            .arg("stdout")
            .arg("--oem")
            .arg(self.config.oem.to_string())
            .arg("--psm")
            .arg(self.config.psm.to_string());
        if let Some(language) = &self.config.language {
            command.arg("-l").arg(language);
        }
        if tsv {
            command.arg("tsv");
        }
        command.stdout(Stdio::piped()).stderr(Stdio::piped());

        let mut child = command
            .spawn()
            .map_err(|e| OcrError::Unavailable(format!("cannot start {program}: {e}")))?;

        // Drain the pipes off-thread so a chatty child never deadlocks
        // against the timeout poll below.
        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();
        let stdout_reader = thread::spawn(move || read_lossy(stdout_pipe));
        let stderr_reader = thread::spawn(move || read_lossy(stderr_pipe));

        let status = self.wait_bounded(&mut child)?;

        let stdout = stdout_reader.join().unwrap_or_default();
        let stderr = stderr_reader.join().unwrap_or_default();

        if !status.success() {
            let detail = stderr.trim();
            return Err(OcrError::Failed(if detail.is_empty() {
                format!("{program} exited with {status}")
            } else {
                detail.to_string()
            }));
        }
        Ok(stdout)
    }

    fn wait_bounded(&self, child: &mut Child) -> Result<std::process::ExitStatus, OcrError> {
        let deadline = Instant::now() + Duration::from_secs(self.config.timeout_secs);
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(OcrError::Timeout(self.config.timeout_secs));
                    }
                    thread::sleep(Duration::from_millis(50));
                }
                Err(e) => return Err(OcrError::Failed(format!("wait failed: {e}"))),
            }
        }
    }
}

impl OcrProvider for TesseractOcr {
    fn capture(&self, path: &Path) -> Result<OcrCapture, OcrError> {
        let tsv = self.run(path, true)?;
        let (tokens, width, height) = parse_tsv(&tsv)?;
        let text = self.run(path, false)?.trim().to_string();
        debug!(
            "OCR produced {} tokens over a {}x{} page",
            tokens.len(),
            width,
            height
        );
        Ok(OcrCapture {
            tokens,
            text,
            width,
            height,
        })
    }
}

fn read_lossy(pipe: Option<impl Read>) -> String {
    let mut buffer = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buffer);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Parse tesseract's word-level TSV output into tokens plus page dimensions.
///
/// Word rows (level 5) become tokens; the page row (level 1) supplies the
/// image dimensions. Rows with confidence <= 0 or blank text are dropped
/// here per the provider contract - the extraction engine never sees them.
pub fn parse_tsv(tsv: &str) -> Result<(Vec<Token>, u32, u32), OcrError> {
    let mut lines = tsv.lines();
    let header = lines
        .next()
        .ok_or_else(|| OcrError::MalformedOutput("empty TSV".to_string()))?;
    if !header.starts_with("level") {
        return Err(OcrError::MalformedOutput(
            "missing TSV header row".to_string(),
        ));
    }

    let mut tokens = Vec::new();
    let mut width = 0u32;
    let mut height = 0u32;

    for line in lines {
        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() < 12 {
            continue;
        }
        let level: u32 = columns[0].parse().unwrap_or(0);
        match level {
            // Page row carries the image dimensions.
            1 => {
                width = columns[8].parse().unwrap_or(0);
                height = columns[9].parse().unwrap_or(0);
            }
            // Word row.
            5 => {
                let confidence: f32 = columns[10].parse().unwrap_or(-1.0);
                let text = columns[11].trim();
                if confidence <= 0.0 || text.is_empty() {
                    continue;
                }
                tokens.push(Token {
                    text: text.to_string(),
                    left: columns[6].parse().unwrap_or(0),
                    top: columns[7].parse().unwrap_or(0),
                    width: columns[8].parse().unwrap_or(0),
                    height: columns[9].parse().unwrap_or(0),
                    confidence,
                });
            }
            _ => {}
        }
    }

    Ok((tokens, width, height))
}
