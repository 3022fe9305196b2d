//! Result export to CSV, JSON or plain text

use crate::output::CrawlResults;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur while exporting results
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown export format '{0}' (expected csv, json or txt)")]
    UnknownFormat(String),
}

/// Output file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// `url,status` rows, visited first then failed
    Csv,

    /// Full results document with a generation timestamp
    Json,

    /// Visited URLs, one per line
    #[serde(rename = "txt", alias = "text")]
    Text,
}

impl ExportFormat {
    /// Infers the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Text => "txt",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "txt" | "text" => Ok(Self::Text),
            _ => Err(ExportError::UnknownFormat(s.to_string())),
        }
    }
}

#[derive(Serialize)]
struct JsonExport<'a> {
    generated_at: DateTime<Utc>,

    #[serde(flatten)]
    results: &'a CrawlResults,
}

/// Writes results in the given format
pub fn write_results<W: Write>(
    results: &CrawlResults,
    format: ExportFormat,
    mut writer: W,
) -> Result<(), ExportError> {
    match format {
        ExportFormat::Csv => {
            let mut csv = csv::Writer::from_writer(writer);
            csv.write_record(["url", "status"])?;
            for url in &results.urls {
                csv.write_record([url.as_str(), "visited"])?;
            }
            for url in &results.failed_urls {
                csv.write_record([url.as_str(), "failed"])?;
            }
            csv.flush()?;
        }
        ExportFormat::Json => {
            let document = JsonExport {
                generated_at: Utc::now(),
                results,
            };
            serde_json::to_writer_pretty(&mut writer, &document)?;
            writeln!(writer)?;
            writer.flush()?;
        }
        ExportFormat::Text => {
            for url in &results.urls {
                writeln!(writer, "{}", url)?;
            }
            writer.flush()?;
        }
    }

    Ok(())
}

/// Writes results to a file, replacing it if it exists
pub fn export_results(
    results: &CrawlResults,
    format: ExportFormat,
    path: &Path,
) -> Result<(), ExportError> {
    let file = File::create(path)?;
    write_results(results, format, BufWriter::new(file))?;
    tracing::info!(
        "Exported {} URLs to {} ({})",
        results.total_pages,
        path.display(),
        format.extension()
    );
    Ok(())
}
