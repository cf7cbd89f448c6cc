//! Export format encoders.
//!
//! Each format implements [`SnapshotEncoder`].

pub mod csv;
pub mod document;
pub mod gedcom;

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::str::FromStr;

use super::traits::SnapshotEncoder;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// Lossless structured JSON document.
    Document,
    /// GEDCOM 5.5.1 lineage-linked subset.
    GenealogyText,
    /// One CSV row per person.
    Table,
}

impl ExportFormat {
    /// Returns all export formats.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Document, Self::GenealogyText, Self::Table]
    }

    /// Returns the canonical name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::GenealogyText => "genealogy-text",
            Self::Table => "table",
        }
    }

    /// Returns the file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Document => "json",
            Self::GenealogyText => "ged",
            Self::Table => "csv",
        }
    }

    /// Returns the MIME type for this format.
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Document => "application/json",
            Self::GenealogyText => "application/x-gedcom",
            Self::Table => "text/csv",
        }
    }

    /// Returns whether a file in this format can be imported back.
    #[must_use]
    pub const fn supports_import(&self) -> bool {
        matches!(self, Self::Document)
    }

    /// Detects format from file extension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the extension is missing or unknown.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match ext.as_deref() {
            Some("json") => Ok(Self::Document),
            Some("ged" | "gedcom") => Ok(Self::GenealogyText),
            Some("csv") => Ok(Self::Table),
            Some(ext) => Err(Error::Validation(format!(
                "unsupported file extension: .{ext}"
            ))),
            None => Err(Error::Validation(
                "cannot determine format: file has no extension".to_string(),
            )),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "document" | "json" => Ok(Self::Document),
            "genealogy-text" | "genealogy_text" | "gedcom" | "ged" => Ok(Self::GenealogyText),
            "table" | "csv" => Ok(Self::Table),
            _ => Err(Error::Validation(format!("unknown export format: {s}"))),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Creates the encoder for a format.
///
/// `exported_at` is stamped into formats that carry an export date.
#[must_use]
pub fn create_encoder(format: ExportFormat, exported_at: DateTime<Utc>) -> Box<dyn SnapshotEncoder> {
    match format {
        ExportFormat::Document => Box::new(document::DocumentEncoder::new(exported_at)),
        ExportFormat::GenealogyText => Box::new(gedcom::GedcomEncoder::new(exported_at)),
        ExportFormat::Table => Box::new(csv::CsvEncoder),
    }
}
