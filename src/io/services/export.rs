//! Snapshot export service.
//!
//! Picks the encoder for a format and writes the encoded snapshot to a
//! string, a writer, or a file.

use crate::io::formats::{ExportFormat, create_encoder};
use crate::models::GraphSnapshot;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::Path;
use tracing::{info, instrument};

/// Result of an export operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResult {
    /// Format used for export.
    pub format: ExportFormat,
    /// People in the exported snapshot.
    pub people: usize,
    /// Relationships in the exported snapshot.
    pub relationships: usize,
    /// Events in the exported snapshot.
    pub events: usize,
    /// Media in the exported snapshot.
    pub media: usize,
    /// Bytes written.
    pub bytes: usize,
    /// Output path (if file export).
    pub output_path: Option<String>,
}

impl ExportResult {
    fn new(format: ExportFormat, snapshot: &GraphSnapshot, bytes: usize) -> Self {
        Self {
            format,
            people: snapshot.people.len(),
            relationships: snapshot.relationships.len(),
            events: snapshot.events.len(),
            media: snapshot.media.len(),
            bytes,
            output_path: None,
        }
    }
}

/// Service for exporting snapshots to external formats.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportService {
    /// Fixed export date; the current time when unset.
    exported_at: Option<DateTime<Utc>>,
}

impl ExportService {
    /// Creates an export service stamping the current time.
    #[must_use]
    pub const fn new() -> Self {
        Self { exported_at: None }
    }

    /// Pins the export date, making output fully deterministic.
    #[must_use]
    pub const fn at(mut self, exported_at: DateTime<Utc>) -> Self {
        self.exported_at = Some(exported_at);
        self
    }

    /// Exports a snapshot to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot is malformed or encoding fails.
    pub fn export(&self, snapshot: &GraphSnapshot, format: ExportFormat) -> Result<String> {
        let mut buf = Vec::new();
        self.export_to_writer(snapshot, format, &mut buf)?;
        String::from_utf8(buf).map_err(|e| Error::OperationFailed {
            operation: "export".to_string(),
            cause: e.to_string(),
        })
    }

    /// Exports a snapshot to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot is malformed or writing fails.
    #[instrument(skip_all, fields(format = %format, people = snapshot.people.len()))]
    pub fn export_to_writer(
        &self,
        snapshot: &GraphSnapshot,
        format: ExportFormat,
        writer: &mut dyn Write,
    ) -> Result<ExportResult> {
        let exported_at = self.exported_at.unwrap_or_else(Utc::now);
        let mut counting = CountingWriter {
            inner: writer,
            bytes: 0,
        };
        create_encoder(format, exported_at).encode(snapshot, &mut counting)?;

        metrics::counter!("famgraph_exports_total", "format" => format.as_str()).increment(1);
        info!(bytes = counting.bytes, "Exported snapshot");
        Ok(ExportResult::new(format, snapshot, counting.bytes))
    }

    /// Exports a snapshot to a file.
    ///
    /// The format is detected from the file extension unless given.
    ///
    /// # Errors
    ///
    /// Returns an error if the format cannot be determined, the file cannot be
    /// written, or encoding fails.
    pub fn export_to_path(
        &self,
        snapshot: &GraphSnapshot,
        path: &Path,
        format: Option<ExportFormat>,
    ) -> Result<ExportResult> {
        let format = match format {
            Some(format) => format,
            None => ExportFormat::from_path(path)?,
        };

        let file = std::fs::File::create(path).map_err(|e| Error::OperationFailed {
            operation: "create_export_file".to_string(),
            cause: e.to_string(),
        })?;
        let mut writer = std::io::BufWriter::new(file);

        let mut result = self.export_to_writer(snapshot, format, &mut writer)?;
        writer.flush().map_err(|e| Error::OperationFailed {
            operation: "flush_export_file".to_string(),
            cause: e.to_string(),
        })?;
        result.output_path = Some(path.display().to_string());
        Ok(result)
    }
}

struct CountingWriter<'w> {
    inner: &'w mut dyn Write,
    bytes: usize,
}

impl Write for CountingWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.bytes += n;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Person, PersonData, TreeId};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn snapshot() -> GraphSnapshot {
        let mut snapshot = GraphSnapshot::empty();
        snapshot.people.push(Person::new(
            TreeId::new("t"),
            PersonData::named("Ann", "Smith"),
        ));
        snapshot
    }

    #[test]
    fn test_export_is_deterministic_with_fixed_date() {
        let service = ExportService::new().at(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        for format in ExportFormat::all() {
            let first = service.export(&snapshot(), *format).unwrap();
            let second = service.export(&snapshot(), *format).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_export_to_writer_counts() {
        let mut buf = Vec::new();
        let result = ExportService::new()
            .export_to_writer(&snapshot(), ExportFormat::Table, &mut buf)
            .unwrap();
        assert_eq!(result.people, 1);
        assert_eq!(result.bytes, buf.len());
        assert!(result.output_path.is_none());
    }

    #[test]
    fn test_export_to_path_detects_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tree.ged");
        let result = ExportService::new()
            .export_to_path(&snapshot(), &path, None)
            .unwrap();
        assert_eq!(result.format, ExportFormat::GenealogyText);
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("0 HEAD"));
        assert_eq!(result.bytes, written.len());
    }

    #[test]
    fn test_export_to_path_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let err = ExportService::new()
            .export_to_path(&snapshot(), &dir.path().join("tree.xlsx"), None)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
