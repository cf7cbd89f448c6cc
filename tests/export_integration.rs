//! Export and import integration tests.
//!
//! Exercises the full path from a populated store to each export format and
//! back through the document importer:
//! - Document export round-trips through import, then rebuilds the store
//! - Genealogy text links individuals and families consistently
//! - Every format handles an empty tree
//! - File export picks the format from the extension

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use chrono::{TimeZone, Utc};
use famgraph::io::{ExportFormat, ExportService, ImportService};
use famgraph::models::{
    EventData, Gender, GraphSnapshot, MediaData, MediaType, PersonData, RelationshipType, Tree,
    TreeData,
};
use famgraph::{Error, GraphStore};
use tempfile::TempDir;

fn service() -> ExportService {
    ExportService::new().at(Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap())
}

/// Parents with two children, one event and one photo.
fn populated() -> GraphSnapshot {
    let tree = Tree::new("Novak", "owner");
    let mut store = GraphStore::from_tree_data(TreeData::empty(tree)).unwrap();

    let jan = store
        .add_person(
            PersonData::named("Jan", "Novak")
                .with_gender(Gender::Male)
                .born("1950-04-12", Some("Brno"))
                .died("2010-11", None),
        )
        .unwrap();
    let eva = store
        .add_person(
            PersonData::named("Eva", "Novak")
                .with_gender(Gender::Female)
                .with_maiden_name("Kral")
                .with_biography("Nurse.\nLoved gardening."),
        )
        .unwrap();
    let petr = store
        .add_person(PersonData::named("Petr", "Novak").with_gender(Gender::Male))
        .unwrap();
    let jana = store
        .add_person(PersonData::named("Jana", "Novak").with_gender(Gender::Female))
        .unwrap();

    store.add_relationship(&jan, &eva, RelationshipType::Spouse).unwrap();
    for child in [&petr, &jana] {
        store
            .add_relationship(&jan, child, RelationshipType::ParentChild)
            .unwrap();
        store
            .add_relationship(&eva, child, RelationshipType::ParentChild)
            .unwrap();
    }

    let photo = store
        .add_media(MediaData::new("https://img/wedding.jpg", MediaType::Image).for_person(eva.clone()))
        .unwrap();
    store
        .add_event(
            EventData::new("Wedding", "marriage")
                .for_person(jan)
                .on("1975-06-01")
                .with_media(photo),
        )
        .unwrap();

    store.snapshot()
}

// ============================================================================
// Document
// ============================================================================

#[test]
fn test_document_round_trip_rebuilds_store() {
    let snapshot = populated();
    let text = service().export(&snapshot, ExportFormat::Document).unwrap();

    assert!(text.contains("\"format\": \"famgraph-document\""));
    assert!(text.contains("\"date\": \"2024-03-09T12:00:00Z\""));

    let imported = ImportService::new().import_document(&text).unwrap();
    assert_eq!(imported, snapshot);

    let tree = snapshot.tree.clone().unwrap();
    let data = ImportService::new().into_tree_data(imported, tree);
    let store = GraphStore::from_tree_data(data).unwrap();
    assert_eq!(store.snapshot(), snapshot);
}

#[test]
fn test_fresh_ids_import_into_new_tree() {
    let snapshot = populated();
    let text = service().export(&snapshot, ExportFormat::Document).unwrap();

    let target = Tree::new("Copy", "someone-else");
    let importer = ImportService::new().with_fresh_ids(true);
    let data = importer.into_tree_data(importer.import_document(&text).unwrap(), target.clone());

    assert!(data.people.iter().all(|p| p.tree_id == target.id));
    assert!(
        data.people
            .iter()
            .all(|p| snapshot.people.iter().all(|old| old.id != p.id))
    );

    // References follow the new ids, so the store accepts the copy.
    let store = GraphStore::from_tree_data(data).unwrap();
    let stats = store.stats();
    assert_eq!(stats.person_count, 4);
    assert_eq!(stats.parent_child_count, 4);
    assert_eq!(stats.spouse_count, 1);
    assert_eq!(stats.event_count, 1);
    assert_eq!(stats.media_count, 1);
}

#[test]
fn test_foreign_document_is_rejected() {
    let err = ImportService::new()
        .import_document(r#"{"exportInfo": {"date": "x", "format": "other", "version": "1.0"}}"#)
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let err = ImportService::new().import_document("not json").unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

// ============================================================================
// Genealogy text
// ============================================================================

#[test]
fn test_genealogy_text_structure() {
    let text = service()
        .export(&populated(), ExportFormat::GenealogyText)
        .unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], "0 HEAD");
    assert!(lines.contains(&"1 DATE 09 MAR 2024"));
    assert!(lines.contains(&"2 VERS 5.5.1"));
    assert_eq!(lines.last(), Some(&"0 TRLR"));

    assert_eq!(lines.iter().filter(|l| l.ends_with(" INDI")).count(), 4);
    assert_eq!(lines.iter().filter(|l| l.ends_with(" FAM")).count(), 1);

    // Jan
    assert!(lines.contains(&"0 @I1@ INDI"));
    assert!(lines.contains(&"1 NAME Jan /Novak/"));
    assert!(lines.contains(&"2 DATE 12 APR 1950"));
    assert!(lines.contains(&"2 PLAC Brno"));
    assert!(lines.contains(&"2 DATE NOV 2010"));
    assert!(lines.contains(&"1 EVEN Wedding"));
    assert!(lines.contains(&"2 DATE 01 JUN 1975"));

    // Eva
    assert!(lines.contains(&"1 NAME Eva /Kral/"));
    assert!(lines.contains(&"2 TYPE birth"));
    assert!(lines.contains(&"1 NOTE Nurse."));
    assert!(lines.contains(&"2 CONT Loved gardening."));

    let fam = lines.iter().position(|l| *l == "0 @F1@ FAM").unwrap();
    assert_eq!(&lines[fam + 1..fam + 5], &[
        "1 HUSB @I1@",
        "1 WIFE @I2@",
        "1 CHIL @I3@",
        "1 CHIL @I4@"
    ]);
    assert_eq!(lines.iter().filter(|l| **l == "1 FAMS @F1@").count(), 2);
    assert_eq!(lines.iter().filter(|l| **l == "1 FAMC @F1@").count(), 2);
}

#[test]
fn test_genealogy_text_rejects_dangling_relationship() {
    let mut snapshot = populated();
    snapshot.people.remove(3);
    let err = service()
        .export(&snapshot, ExportFormat::GenealogyText)
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

// ============================================================================
// Empty trees and files
// ============================================================================

#[test]
fn test_every_format_handles_empty_tree() {
    let empty = GraphSnapshot::empty();
    for &format in ExportFormat::all() {
        let text = service().export(&empty, format).unwrap();
        assert!(!text.is_empty(), "{format} produced no output");
    }

    let csv = service().export(&empty, ExportFormat::Table).unwrap();
    assert_eq!(csv, "firstName,lastName,birthDate,deathDate,gender\n");

    let ged = service().export(&empty, ExportFormat::GenealogyText).unwrap();
    assert!(ged.starts_with("0 HEAD\n"));
    assert!(ged.ends_with("0 TRLR\n"));
    assert!(!ged.contains("INDI"));

    let doc = service().export(&empty, ExportFormat::Document).unwrap();
    let imported = ImportService::new().import_document(&doc).unwrap();
    assert!(imported.is_empty());
}

#[test]
fn test_export_to_path_detects_format() {
    let dir = TempDir::new().unwrap();
    let snapshot = populated();

    let csv_path = dir.path().join("people.csv");
    let result = service().export_to_path(&snapshot, &csv_path, None).unwrap();
    assert_eq!(result.format, ExportFormat::Table);
    assert_eq!(result.people, 4);
    let written = std::fs::read_to_string(&csv_path).unwrap();
    assert_eq!(written.len(), result.bytes);
    assert_eq!(written.lines().count(), 5);

    let doc_path = dir.path().join("tree.json");
    service().export_to_path(&snapshot, &doc_path, None).unwrap();
    let imported = ImportService::new().import_from_path(&doc_path).unwrap();
    assert_eq!(imported.people.len(), 4);

    let err = ImportService::new().import_from_path(&csv_path).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let err = service()
        .export_to_path(&snapshot, &dir.path().join("tree.xyz"), None)
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}
