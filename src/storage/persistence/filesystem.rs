//! Filesystem-based persistence client.
//!
//! Stores each tree as one pretty-printed JSON [`TreeData`] file:
//!
//! ```text
//! <data_dir>/trees/<tree_id>.json
//! ```
//!
//! Writes are read-modify-write under an async lock and land through a
//! temporary file plus rename, so a crash never leaves a half-written tree.
//!
//! # Security
//!
//! - **Path traversal**: tree ids are validated before they become file names
//! - **File size limits**: files above [`MAX_FILE_SIZE`] are refused

use super::records;
use crate::models::{
    Event, EventId, Media, MediaId, Person, PersonId, Relationship, RelationshipId, Tree,
    TreeData, TreeId,
};
use crate::storage::traits::PersistenceClient;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

/// Maximum size of a tree file (32MB).
pub const MAX_FILE_SIZE: u64 = 32 * 1024 * 1024;

fn transport(operation: &str, e: impl std::fmt::Display) -> Error {
    Error::Transport {
        operation: operation.to_string(),
        cause: e.to_string(),
    }
}

/// Persistence client backed by JSON files.
#[derive(Debug)]
pub struct FilesystemPersistence {
    trees_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FilesystemPersistence {
    /// Creates a client rooted at a data directory.
    ///
    /// The `trees/` subdirectory is created lazily on first write.
    #[must_use]
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            trees_dir: data_dir.as_ref().join("trees"),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the directory holding tree files.
    #[must_use]
    pub fn trees_dir(&self) -> &Path {
        &self.trees_dir
    }

    /// Returns the file path for a tree.
    ///
    /// # Security
    ///
    /// Only alphanumeric characters, dashes and underscores are allowed so an
    /// id can never escape the trees directory.
    fn tree_path(&self, tree_id: &TreeId) -> Result<PathBuf> {
        let id = tree_id.as_str();
        if !is_safe_filename(id) {
            return Err(Error::Validation(format!(
                "tree id contains invalid characters: {id}"
            )));
        }
        Ok(self.trees_dir.join(format!("{id}.json")))
    }

    async fn read_tree(&self, tree_id: &TreeId) -> Result<TreeData> {
        let path = self.tree_path(tree_id)?;
        read_tree_file(&path)
            .await?
            .ok_or_else(|| Error::not_found("tree", tree_id))
    }

    async fn write_tree(&self, data: &TreeData) -> Result<()> {
        let path = self.tree_path(&data.tree.id)?;
        tokio::fs::create_dir_all(&self.trees_dir)
            .await
            .map_err(|e| transport("create_trees_dir", e))?;

        let json = serde_json::to_vec_pretty(data).map_err(|e| Error::OperationFailed {
            operation: "serialize_tree".to_string(),
            cause: e.to_string(),
        })?;

        let tmp = path.with_extension("json.tmp");
        let written = match tokio::fs::write(&tmp, json).await {
            Ok(()) => tokio::fs::rename(&tmp, &path)
                .await
                .map_err(|e| transport("rename_tree_file", e)),
            Err(e) => Err(transport("write_tree_file", e)),
        };
        if written.is_err()
            && let Err(e) = tokio::fs::remove_file(&tmp).await
        {
            debug!(path = %tmp.display(), error = %e, "Could not remove temporary tree file");
        }
        written
    }

    /// Writes whole tree contents, replacing any stored copy.
    ///
    /// Used for bulk import, where per-record calls would rewrite the file
    /// once per record.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree id is unsafe or the file cannot be written.
    pub async fn save_tree(&self, data: &TreeData) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write_tree(data).await
    }

    /// Applies an edit to a stored tree under the write lock.
    async fn modify<T>(
        &self,
        tree_id: &TreeId,
        edit: impl FnOnce(&mut TreeData) -> Result<T> + Send,
    ) -> Result<T> {
        let _guard = self.write_lock.lock().await;
        let mut data = self.read_tree(tree_id).await?;
        let out = edit(&mut data)?;
        self.write_tree(&data).await?;
        Ok(out)
    }
}

async fn read_tree_file(path: &Path) -> Result<Option<TreeData>> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(transport("read_tree_metadata", e)),
    };
    if metadata.len() > MAX_FILE_SIZE {
        return Err(Error::Validation(format!(
            "tree file exceeds maximum size of {MAX_FILE_SIZE} bytes: {}",
            path.display()
        )));
    }
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| transport("read_tree_file", e))?;
    let data = serde_json::from_slice(&bytes).map_err(|e| Error::OperationFailed {
        operation: "deserialize_tree".to_string(),
        cause: format!("{}: {e}", path.display()),
    })?;
    Ok(Some(data))
}

/// Checks if a file name is safe (no path traversal).
fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 255
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl PersistenceClient for FilesystemPersistence {
    #[instrument(skip_all, fields(tree_id = %tree_id))]
    async fn load_tree(&self, tree_id: &TreeId) -> Result<TreeData> {
        let data = self.read_tree(tree_id).await?;
        debug!(people = data.people.len(), "Read tree file");
        Ok(data)
    }

    async fn create_tree(&self, tree: &Tree) -> Result<Tree> {
        let _guard = self.write_lock.lock().await;
        let path = self.tree_path(&tree.id)?;
        if read_tree_file(&path).await?.is_some() {
            return Err(Error::Validation(format!("tree {} already exists", tree.id)));
        }
        self.write_tree(&TreeData::empty(tree.clone())).await?;
        Ok(tree.clone())
    }

    async fn list_trees(&self) -> Result<Vec<Tree>> {
        let mut entries = match tokio::fs::read_dir(&self.trees_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(transport("list_trees", e)),
        };

        let mut trees = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| transport("list_trees", e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(data) = read_tree_file(&path).await? {
                trees.push(data.tree);
            }
        }
        trees.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(trees)
    }

    async fn create_person(&self, person: &Person) -> Result<Person> {
        self.modify(&person.tree_id, |data| records::create_person(data, person))
            .await
    }

    async fn update_person(&self, person: &Person) -> Result<Person> {
        self.modify(&person.tree_id, |data| records::update_person(data, person))
            .await
    }

    async fn delete_person(&self, tree_id: &TreeId, id: &PersonId) -> Result<()> {
        self.modify(tree_id, |data| records::delete_person(data, id))
            .await
    }

    async fn create_relationship(&self, relationship: &Relationship) -> Result<Relationship> {
        self.modify(&relationship.tree_id, |data| {
            records::create_relationship(data, relationship)
        })
        .await
    }

    async fn delete_relationship(&self, tree_id: &TreeId, id: &RelationshipId) -> Result<()> {
        self.modify(tree_id, |data| records::delete_relationship(data, id))
            .await
    }

    async fn create_event(&self, event: &Event) -> Result<Event> {
        self.modify(&event.tree_id, |data| records::create_event(data, event))
            .await
    }

    async fn delete_event(&self, tree_id: &TreeId, id: &EventId) -> Result<()> {
        self.modify(tree_id, |data| records::delete_event(data, id))
            .await
    }

    async fn create_media(&self, media: &Media) -> Result<Media> {
        self.modify(&media.tree_id, |data| records::create_media(data, media))
            .await
    }

    async fn delete_media(&self, tree_id: &TreeId, id: &MediaId) -> Result<()> {
        self.modify(tree_id, |data| records::delete_media(data, id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PersonData;
    use tempfile::TempDir;

    #[test]
    fn test_safe_filename() {
        assert!(is_safe_filename("tree_0190abc"));
        assert!(is_safe_filename("family-1"));
        assert!(!is_safe_filename("../etc/passwd"));
        assert!(!is_safe_filename("a/b"));
        assert!(!is_safe_filename(""));
    }

    #[tokio::test]
    async fn test_round_trip_tree() {
        let dir = TempDir::new().unwrap();
        let client = FilesystemPersistence::new(dir.path());

        let tree = Tree::new("Lees", "owner_1");
        client.create_tree(&tree).await.unwrap();

        let person = Person::new(tree.id.clone(), PersonData::named("Ann", "Lee"));
        client.create_person(&person).await.unwrap();

        let data = client.load_tree(&tree.id).await.unwrap();
        assert_eq!(data.tree, tree);
        assert_eq!(data.people, vec![person]);

        let trees = client.list_trees().await.unwrap();
        assert_eq!(trees.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_tree_is_not_found() {
        let dir = TempDir::new().unwrap();
        let client = FilesystemPersistence::new(dir.path());
        let err = client.load_tree(&TreeId::new("nope")).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "tree", .. }));
        assert!(client.list_trees().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_traversal_id_rejected() {
        let dir = TempDir::new().unwrap();
        let client = FilesystemPersistence::new(dir.path());
        let err = client
            .load_tree(&TreeId::new("../../secrets"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_duplicate_tree_rejected() {
        let dir = TempDir::new().unwrap();
        let client = FilesystemPersistence::new(dir.path());
        let tree = Tree::new("Twice", "owner");
        client.create_tree(&tree).await.unwrap();
        assert!(client.create_tree(&tree).await.is_err());
    }

    #[tokio::test]
    async fn test_failed_rename_removes_temporary_file() {
        let dir = TempDir::new().unwrap();
        let client = FilesystemPersistence::new(dir.path());
        let tree = Tree::new("Blocked", "owner");

        // A non-empty directory where the tree file belongs makes the rename fail.
        let target = client.trees_dir().join(format!("{}.json", tree.id));
        std::fs::create_dir_all(&target).unwrap();
        std::fs::write(target.join("keep"), b"x").unwrap();

        let err = client.save_tree(&TreeData::empty(tree)).await.unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
        assert!(!target.with_extension("json.tmp").exists());
        assert!(target.join("keep").exists());
    }

    #[tokio::test]
    async fn test_save_tree_replaces_contents() {
        let dir = TempDir::new().unwrap();
        let client = FilesystemPersistence::new(dir.path());
        let tree = Tree::new("Bulk", "owner");
        client.create_tree(&tree).await.unwrap();

        let mut data = TreeData::empty(tree.clone());
        data.people
            .push(Person::new(tree.id.clone(), PersonData::named("Ann", "Lee")));
        client.save_tree(&data).await.unwrap();

        assert_eq!(client.load_tree(&tree.id).await.unwrap(), data);
    }
}
