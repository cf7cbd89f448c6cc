//! Document import service.
//!
//! Only the structured document format can be read back; the genealogy text
//! and table exports are one-way.

use crate::io::formats::{ExportFormat, document};
use crate::models::{EventId, GraphSnapshot, MediaId, PersonId, RelationshipId, Tree, TreeData};
use crate::storage::persistence::MAX_FILE_SIZE;
use crate::{Error, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, instrument};

/// Service for importing structured documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportService {
    /// Assign new ids to every imported record.
    fresh_ids: bool,
}

impl ImportService {
    /// Creates an import service that keeps the document's ids.
    #[must_use]
    pub const fn new() -> Self {
        Self { fresh_ids: false }
    }

    /// Regenerates every record id on import, remapping references.
    ///
    /// Needed when the same document is imported more than once.
    #[must_use]
    pub const fn with_fresh_ids(mut self, fresh_ids: bool) -> Self {
        self.fresh_ids = fresh_ids;
        self
    }

    /// Parses a structured document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the document is malformed.
    pub fn import_document(&self, text: &str) -> Result<GraphSnapshot> {
        let snapshot = document::from_document(text)?;
        info!(
            people = snapshot.people.len(),
            relationships = snapshot.relationships.len(),
            "Imported document"
        );
        Ok(snapshot)
    }

    /// Reads and parses a structured document from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is not a document, is too large, cannot be
    /// read, or is malformed.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn import_from_path(&self, path: &Path) -> Result<GraphSnapshot> {
        let format = ExportFormat::from_path(path)?;
        if !format.supports_import() {
            return Err(Error::Validation(format!(
                "format {format} does not support import"
            )));
        }

        let read_failed = |e: std::io::Error| Error::OperationFailed {
            operation: "read_import_file".to_string(),
            cause: e.to_string(),
        };
        let size = std::fs::metadata(path).map_err(read_failed)?.len();
        if size > MAX_FILE_SIZE {
            return Err(Error::Validation(format!(
                "import file too large: {size} bytes (max {MAX_FILE_SIZE})"
            )));
        }
        let text = std::fs::read_to_string(path).map_err(read_failed)?;
        self.import_document(&text)
    }

    /// Re-scopes an imported snapshot into `tree`.
    ///
    /// Every record takes the target tree id. With fresh ids enabled, record
    /// ids are regenerated and all references follow them.
    #[must_use]
    pub fn into_tree_data(&self, snapshot: GraphSnapshot, tree: Tree) -> TreeData {
        let mut data = TreeData {
            people: snapshot.people,
            relationships: snapshot.relationships,
            events: snapshot.events,
            media: snapshot.media,
            tree,
        };
        let tree_id = data.tree.id.clone();

        let mut people: HashMap<PersonId, PersonId> = HashMap::new();
        let mut media: HashMap<MediaId, MediaId> = HashMap::new();

        for person in &mut data.people {
            person.tree_id = tree_id.clone();
            if self.fresh_ids {
                let id = PersonId::generate();
                people.insert(std::mem::replace(&mut person.id, id.clone()), id);
            }
        }
        for item in &mut data.media {
            item.tree_id = tree_id.clone();
            if self.fresh_ids {
                let id = MediaId::generate();
                media.insert(std::mem::replace(&mut item.id, id.clone()), id);
                remap(&mut item.data.person_id, &people);
            }
        }
        for rel in &mut data.relationships {
            rel.tree_id = tree_id.clone();
            if self.fresh_ids {
                rel.id = RelationshipId::generate();
                if let Some(id) = people.get(&rel.person_a) {
                    rel.person_a = id.clone();
                }
                if let Some(id) = people.get(&rel.person_b) {
                    rel.person_b = id.clone();
                }
            }
        }
        for event in &mut data.events {
            event.tree_id = tree_id.clone();
            if self.fresh_ids {
                event.id = EventId::generate();
                remap(&mut event.data.person_id, &people);
                remap(&mut event.data.media_id, &media);
            }
        }
        data
    }
}

fn remap<K: Eq + std::hash::Hash + Clone>(slot: &mut Option<K>, ids: &HashMap<K, K>) {
    if let Some(id) = slot.as_ref().and_then(|old| ids.get(old)) {
        *slot = Some(id.clone());
    }
}
