//! Core trait for export formats.

use super::formats::ExportFormat;
use crate::Result;
use crate::models::GraphSnapshot;
use std::io::Write;

/// Encodes a snapshot into one export format.
///
/// Encoders are pure: the same snapshot (and export date) always yields the
/// same bytes. An empty snapshot must encode to a minimal valid document
/// rather than fail.
pub trait SnapshotEncoder: Send + Sync {
    /// The format this encoder produces.
    fn format(&self) -> ExportFormat;

    /// Writes the encoded snapshot to `out`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`](crate::Error::OperationFailed) if
    /// writing or serialization fails.
    fn encode(&self, snapshot: &GraphSnapshot, out: &mut dyn Write) -> Result<()>;
}

pub(crate) fn write_failed(operation: &str, e: impl std::fmt::Display) -> crate::Error {
    crate::Error::OperationFailed {
        operation: operation.to_string(),
        cause: e.to_string(),
    }
}
