//! Dataset serialization and artifact delivery.
//!
//! Serializes an ordered record sequence to CSV or JSON and wraps the
//! result in a named [`Artifact`]. Actually saving the artifact is an
//! external concern behind [`ArtifactSink`]; a filesystem sink is
//! provided.
//!
//! # CSV shape
//!
//! The header is the key sequence of the FIRST record, in that record's
//! order. Later records are projected onto this header: keys the first
//! record lacks are dropped for every row, keys a later row lacks render
//! as empty. Every data field is double-quoted with embedded quotes
//! doubled; nothing else is escaped. This is a deliberate schema-drift
//! limitation, not a union-of-keys scheme.

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::debug;

use crate::error::{Error, Result};
use crate::scrape::Record;

// ============================================================================
// Constants
// ============================================================================

/// Artifact filename stem.
const FILENAME_PREFIX: &str = "booking_data";

// ============================================================================
// ExportFormat
// ============================================================================

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Quoted CSV projected onto the first record's header.
    Csv,
    /// Pretty-printed structural JSON dump.
    Json,
}

impl ExportFormat {
    /// Canonical lower-case name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    /// File extension (same as the name).
    #[inline]
    #[must_use]
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    /// MIME type for delivery.
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Json => "application/json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    /// Parses a caller-supplied format name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] for anything but
    /// `csv`/`json` (case-insensitive).
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(Error::unsupported_format(s)),
        }
    }
}

// ============================================================================
// Artifact
// ============================================================================

/// A named, ready-to-deliver export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Timestamped filename, `booking_data_<sanitized ISO-8601>.<ext>`.
    pub filename: String,
    /// MIME type of the body.
    pub content_type: &'static str,
    /// Serialized dataset.
    pub body: String,
}

// ============================================================================
// Serialization
// ============================================================================

/// Serializes records to CSV (see module docs for the header rule).
///
/// The header line is unquoted; data fields are always quoted.
#[must_use]
pub fn to_csv(records: &[Record]) -> String {
    let Some(first) = records.first() else {
        return String::new();
    };

    let headers = first.keys();
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(headers.join(","));

    for record in records {
        let fields: Vec<String> = headers
            .iter()
            .map(|&key| {
                let value = record.field(key).unwrap_or_default();
                format!("\"{}\"", value.replace('"', "\"\""))
            })
            .collect();
        lines.push(fields.join(","));
    }

    lines.join("\n")
}

/// Serializes records to pretty-printed JSON, preserving field order.
///
/// # Errors
///
/// Returns [`Error::Json`] if serialization fails.
pub fn to_json(records: &[Record]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Builds the export artifact for a dataset.
///
/// # Errors
///
/// Returns [`Error::EmptyDataset`] when there is nothing to export, or
/// [`Error::Json`] on serialization failure.
pub fn artifact(
    records: &[Record],
    format: ExportFormat,
    timestamp: DateTime<Utc>,
) -> Result<Artifact> {
    if records.is_empty() {
        return Err(Error::EmptyDataset);
    }

    let body = match format {
        ExportFormat::Csv => to_csv(records),
        ExportFormat::Json => to_json(records)?,
    };

    Ok(Artifact {
        filename: artifact_filename(format, timestamp),
        content_type: format.content_type(),
        body,
    })
}

/// Local export path: format comes in as a string from the caller.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] for an unknown format name and
/// [`Error::EmptyDataset`] for an empty dataset — both synchronously,
/// unlike the remote `EXPORT` command which degrades to a warning.
pub fn artifact_named(
    records: &[Record],
    format_name: &str,
    timestamp: DateTime<Utc>,
) -> Result<Artifact> {
    let format = format_name.parse::<ExportFormat>()?;
    artifact(records, format, timestamp)
}

/// Timestamped artifact filename.
///
/// The ISO-8601 timestamp has `:` and `.` replaced with `-` so the name
/// is safe on every filesystem.
#[must_use]
pub fn artifact_filename(format: ExportFormat, timestamp: DateTime<Utc>) -> String {
    let stamp = timestamp
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{FILENAME_PREFIX}_{stamp}.{}", format.extension())
}

// ============================================================================
// ArtifactSink
// ============================================================================

/// Delivery seam for finished artifacts.
///
/// File saving (or uploading, or handing to a browser download API) is
/// an external collaborator; the exporter only produces named values.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Delivers one artifact.
    async fn deliver(&self, artifact: Artifact) -> Result<()>;
}

/// Sink that writes artifacts into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Creates a sink rooted at `dir`. The directory is created on
    /// first delivery.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target directory.
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

#[async_trait]
impl ArtifactSink for DirectorySink {
    async fn deliver(&self, artifact: Artifact) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(&artifact.filename);
        tokio::fs::write(&path, artifact.body.as_bytes()).await?;
        debug!(path = %path.display(), "artifact written");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
