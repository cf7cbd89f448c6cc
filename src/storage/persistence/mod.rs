//! Persistence client implementations.

mod filesystem;
mod memory;
mod records;

pub use filesystem::{FilesystemPersistence, MAX_FILE_SIZE};
pub use memory::InMemoryPersistence;
