//! Import and export service implementations.

pub mod export;
pub mod import;

pub use export::{ExportResult, ExportService};
pub use import::ImportService;
