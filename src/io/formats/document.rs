//! Structured document export and re-import.
//!
//! The document is pretty-printed JSON:
//!
//! ```json
//! {
//!   "exportInfo": { "date": "...", "format": "famgraph-document", "version": "1.0" },
//!   "tree": { ... },
//!   "people": [ ... ],
//!   "relationships": [ ... ],
//!   "events": [ ... ],
//!   "media": [ ... ]
//! }
//! ```
//!
//! Entities are written with their own serde shape, so the document is
//! lossless and [`from_document`] restores the snapshot field for field.

use crate::io::formats::ExportFormat;
use crate::io::traits::{SnapshotEncoder, write_failed};
use crate::io::validation::validate_snapshot;
use crate::models::{Event, GraphSnapshot, Media, Person, Relationship, Tree};
use crate::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use tracing::warn;

/// Format marker written to `exportInfo.format`.
pub const DOCUMENT_FORMAT: &str = "famgraph-document";

/// Schema version written to `exportInfo.version`.
pub const DOCUMENT_VERSION: &str = "1.0";

const SUPPORTED_MAJOR: &str = "1";

/// Export metadata block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportInfo {
    /// RFC 3339 export date.
    pub date: String,
    /// Format marker.
    pub format: String,
    /// Schema version (`major.minor`).
    pub version: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentRef<'a> {
    export_info: ExportInfo,
    tree: Option<&'a Tree>,
    people: &'a [Person],
    relationships: &'a [Relationship],
    events: &'a [Event],
    media: &'a [Media],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    export_info: ExportInfo,
    #[serde(default)]
    tree: Option<Tree>,
    #[serde(default)]
    people: Vec<Person>,
    #[serde(default)]
    relationships: Vec<Relationship>,
    #[serde(default)]
    events: Vec<Event>,
    #[serde(default)]
    media: Vec<Media>,
}

/// Structured JSON document encoder.
#[derive(Debug, Clone, Copy)]
pub struct DocumentEncoder {
    exported_at: DateTime<Utc>,
}

impl DocumentEncoder {
    /// Creates an encoder that stamps `exported_at` into the metadata.
    #[must_use]
    pub const fn new(exported_at: DateTime<Utc>) -> Self {
        Self { exported_at }
    }
}

impl SnapshotEncoder for DocumentEncoder {
    fn format(&self) -> ExportFormat {
        ExportFormat::Document
    }

    fn encode(&self, snapshot: &GraphSnapshot, out: &mut dyn Write) -> Result<()> {
        let document = DocumentRef {
            export_info: ExportInfo {
                date: self.exported_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                format: DOCUMENT_FORMAT.to_string(),
                version: DOCUMENT_VERSION.to_string(),
            },
            tree: snapshot.tree.as_ref(),
            people: &snapshot.people,
            relationships: &snapshot.relationships,
            events: &snapshot.events,
            media: &snapshot.media,
        };

        serde_json::to_writer_pretty(&mut *out, &document)
            .map_err(|e| write_failed("serialize_document", e))?;
        out.write_all(b"\n")
            .map_err(|e| write_failed("write_document", e))?;
        Ok(())
    }
}

/// Parses a structured document back into a snapshot.
///
/// # Errors
///
/// Returns [`Error::Validation`] if the text is not a famgraph document, its
/// major version is unsupported, or it references missing records.
pub fn from_document(text: &str) -> Result<GraphSnapshot> {
    let document: Document = serde_json::from_str(text)
        .map_err(|e| Error::Validation(format!("malformed document: {e}")))?;

    let info = &document.export_info;
    if info.format != DOCUMENT_FORMAT {
        return Err(Error::Validation(format!(
            "unexpected document format: {}",
            info.format
        )));
    }
    let major = info.version.split('.').next().unwrap_or_default();
    if major != SUPPORTED_MAJOR {
        return Err(Error::Validation(format!(
            "unsupported document version: {}",
            info.version
        )));
    }

    let snapshot = GraphSnapshot {
        tree: document.tree,
        people: document.people,
        relationships: document.relationships,
        events: document.events,
        media: document.media,
    };

    for issue in validate_snapshot(&snapshot)? {
        warn!(entity = issue.entity, id = %issue.id, "Document issue: {}", issue.message);
    }
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, PersonData, RelationshipType, TreeId};
    use chrono::TimeZone;

    fn fixed_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn encode(snapshot: &GraphSnapshot) -> String {
        let mut buf = Vec::new();
        DocumentEncoder::new(fixed_date())
            .encode(snapshot, &mut buf)
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn sample() -> GraphSnapshot {
        let tree = Tree::new("Smiths", "owner").with_id(TreeId::new("t"));
        let mother = Person::new(
            tree.id.clone(),
            PersonData::named("Ann", "Smith")
                .with_gender(Gender::Female)
                .born("1950-04-01", Some("Leeds")),
        );
        let son = Person::new(tree.id.clone(), PersonData::named("Ben", "Smith"));
        let edge = Relationship::new(
            tree.id.clone(),
            mother.id.clone(),
            son.id.clone(),
            RelationshipType::ParentChild,
        );
        GraphSnapshot {
            tree: Some(tree),
            people: vec![mother, son],
            relationships: vec![edge],
            events: Vec::new(),
            media: Vec::new(),
        }
    }

    #[test]
    fn test_export_info_block() {
        let json: serde_json::Value = serde_json::from_str(&encode(&sample())).unwrap();
        assert_eq!(json["exportInfo"]["format"], "famgraph-document");
        assert_eq!(json["exportInfo"]["version"], "1.0");
        assert_eq!(json["exportInfo"]["date"], "2024-03-01T12:00:00Z");
        assert_eq!(json["people"].as_array().unwrap().len(), 2);
        assert_eq!(json["relationships"][0]["type"], "parent-child");
    }

    #[test]
    fn test_round_trip_preserves_snapshot() {
        let snapshot = sample();
        let restored = from_document(&encode(&snapshot)).unwrap();
        assert_eq!(restored, snapshot);
    }

    #[test]
    fn test_empty_snapshot_is_valid_document() {
        let text = encode(&GraphSnapshot::empty());
        let restored = from_document(&text).unwrap();
        assert!(restored.is_empty());
        assert!(restored.tree.is_none());
    }

    #[test]
    fn test_rejects_unknown_major_version() {
        let text = encode(&sample()).replace("\"version\": \"1.0\"", "\"version\": \"2.0\"");
        let err = from_document(&text).unwrap_err();
        assert!(err.to_string().contains("unsupported document version"));
    }

    #[test]
    fn test_accepts_newer_minor_version() {
        let text = encode(&sample()).replace("\"version\": \"1.0\"", "\"version\": \"1.3\"");
        assert!(from_document(&text).is_ok());
    }

    #[test]
    fn test_rejects_foreign_format_and_garbage() {
        let text = encode(&sample()).replace("famgraph-document", "other");
        assert!(matches!(from_document(&text), Err(Error::Validation(_))));
        assert!(matches!(from_document("not json"), Err(Error::Validation(_))));
    }

    #[test]
    fn test_rejects_dangling_relationship() {
        let mut snapshot = sample();
        snapshot.people.pop();
        let err = from_document(&encode(&snapshot)).unwrap_err();
        assert!(err.to_string().contains("references missing person"));
    }
}
