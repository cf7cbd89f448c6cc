//! Structural validation of snapshots.
//!
//! Exporters and the document importer check a snapshot before trusting it.
//! Errors make a snapshot unusable; warnings describe data that is odd but
//! can still be encoded.
//!
//! | Check | Severity |
//! |-------|----------|
//! | duplicate id within a collection | error |
//! | relationship endpoint missing | error |
//! | event or media owner missing | error |
//! | event media reference missing | error |
//! | self-referential relationship | warning |
//! | record scoped to a different tree | warning |

use crate::models::GraphSnapshot;
use crate::{Error, Result};
use std::collections::HashSet;
use std::fmt;

/// Severity of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationSeverity {
    /// Noted; the snapshot is still usable.
    Warning,
    /// The snapshot is structurally malformed.
    Error,
}

/// A problem found in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Kind of record with the issue.
    pub entity: &'static str,
    /// Id of the record.
    pub id: String,
    /// Description of the issue.
    pub message: String,
    /// Severity of the issue.
    pub severity: ValidationSeverity,
}

impl ValidationIssue {
    /// Creates a warning issue.
    #[must_use]
    pub fn warning(entity: &'static str, id: impl fmt::Display, message: impl Into<String>) -> Self {
        Self {
            entity,
            id: id.to_string(),
            message: message.into(),
            severity: ValidationSeverity::Warning,
        }
    }

    /// Creates an error issue.
    #[must_use]
    pub fn error(entity: &'static str, id: impl fmt::Display, message: impl Into<String>) -> Self {
        Self {
            entity,
            id: id.to_string(),
            message: message.into(),
            severity: ValidationSeverity::Error,
        }
    }

    /// Returns true for error-severity issues.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == ValidationSeverity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.entity, self.id, self.message)
    }
}

/// Lists every structural issue in a snapshot.
#[must_use]
pub fn check_snapshot(snapshot: &GraphSnapshot) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let mut people = HashSet::new();
    for person in &snapshot.people {
        if !people.insert(&person.id) {
            issues.push(ValidationIssue::error("person", &person.id, "duplicate id"));
        }
    }

    let mut media = HashSet::new();
    for item in &snapshot.media {
        if !media.insert(&item.id) {
            issues.push(ValidationIssue::error("media", &item.id, "duplicate id"));
        }
        if let Some(owner) = &item.data.person_id {
            if !people.contains(owner) {
                issues.push(ValidationIssue::error(
                    "media",
                    &item.id,
                    format!("references missing person {owner}"),
                ));
            }
        }
    }

    let mut relationships = HashSet::new();
    for rel in &snapshot.relationships {
        if !relationships.insert(&rel.id) {
            issues.push(ValidationIssue::error("relationship", &rel.id, "duplicate id"));
        }
        for endpoint in [&rel.person_a, &rel.person_b] {
            if !people.contains(endpoint) {
                issues.push(ValidationIssue::error(
                    "relationship",
                    &rel.id,
                    format!("references missing person {endpoint}"),
                ));
            }
        }
        if rel.person_a == rel.person_b {
            issues.push(ValidationIssue::warning(
                "relationship",
                &rel.id,
                "relates a person to themselves",
            ));
        }
    }

    let mut events = HashSet::new();
    for event in &snapshot.events {
        if !events.insert(&event.id) {
            issues.push(ValidationIssue::error("event", &event.id, "duplicate id"));
        }
        if let Some(owner) = &event.data.person_id {
            if !people.contains(owner) {
                issues.push(ValidationIssue::error(
                    "event",
                    &event.id,
                    format!("references missing person {owner}"),
                ));
            }
        }
        if let Some(media_id) = &event.data.media_id {
            if !media.contains(media_id) {
                issues.push(ValidationIssue::error(
                    "event",
                    &event.id,
                    format!("references missing media {media_id}"),
                ));
            }
        }
    }

    if let Some(tree) = &snapshot.tree {
        let foreign = snapshot
            .people
            .iter()
            .filter(|p| p.tree_id != tree.id)
            .map(|p| ("person", p.id.to_string()))
            .chain(
                snapshot
                    .relationships
                    .iter()
                    .filter(|r| r.tree_id != tree.id)
                    .map(|r| ("relationship", r.id.to_string())),
            );
        for (entity, id) in foreign {
            issues.push(ValidationIssue::warning(
                entity,
                id,
                format!("belongs to a tree other than {}", tree.id),
            ));
        }
    }

    issues
}

/// Validates a snapshot, returning its warnings.
///
/// # Errors
///
/// Returns [`Error::Validation`] listing every error-severity issue.
pub fn validate_snapshot(snapshot: &GraphSnapshot) -> Result<Vec<ValidationIssue>> {
    let (errors, warnings): (Vec<_>, Vec<_>) = check_snapshot(snapshot)
        .into_iter()
        .partition(ValidationIssue::is_error);

    if errors.is_empty() {
        Ok(warnings)
    } else {
        let detail: Vec<String> = errors.iter().map(ToString::to_string).collect();
        Err(Error::Validation(format!(
            "malformed snapshot: {}",
            detail.join("; ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Event, EventData, MediaId, Person, PersonData, PersonId, Relationship, RelationshipType,
        TreeId,
    };

    fn tree_id() -> TreeId {
        TreeId::new("t")
    }

    #[test]
    fn test_clean_snapshot_has_no_issues() {
        let mut snapshot = GraphSnapshot::empty();
        let a = Person::new(tree_id(), PersonData::named("A", "X"));
        let b = Person::new(tree_id(), PersonData::named("B", "X"));
        snapshot.relationships.push(Relationship::new(
            tree_id(),
            a.id.clone(),
            b.id.clone(),
            RelationshipType::Spouse,
        ));
        snapshot.people = vec![a, b];
        assert!(check_snapshot(&snapshot).is_empty());
        assert!(validate_snapshot(&snapshot).unwrap().is_empty());
    }

    #[test]
    fn test_dangling_references_are_errors() {
        let mut snapshot = GraphSnapshot::empty();
        snapshot.relationships.push(Relationship::new(
            tree_id(),
            PersonId::new("x"),
            PersonId::new("y"),
            RelationshipType::ParentChild,
        ));
        snapshot.events.push(Event::new(
            tree_id(),
            EventData::new("E", "misc").with_media(MediaId::new("m")),
        ));
        let issues = check_snapshot(&snapshot);
        assert_eq!(issues.iter().filter(|i| i.is_error()).count(), 3);

        let err = validate_snapshot(&snapshot).unwrap_err();
        assert!(err.to_string().contains("references missing person x"));
    }

    #[test]
    fn test_self_edge_is_warning() {
        let mut snapshot = GraphSnapshot::empty();
        let a = Person::new(tree_id(), PersonData::named("A", "X"));
        snapshot.relationships.push(Relationship::new(
            tree_id(),
            a.id.clone(),
            a.id.clone(),
            RelationshipType::ParentChild,
        ));
        snapshot.people.push(a);
        let warnings = validate_snapshot(&snapshot).unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].severity, ValidationSeverity::Warning);
    }
}
